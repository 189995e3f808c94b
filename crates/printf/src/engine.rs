//! The template interpreter.
//!
//! Templates are scanned byte by byte; everything outside a `%` directive is
//! copied through verbatim. Each directive is parsed as flags, field width,
//! precision, length qualifier, and conversion character, then dispatched to
//! the numeric converters or handled inline.

use core::mem::size_of;

use crate::args::{Arg, Args, Qualifier};
use crate::flags::FormatFlags;
use crate::num::{write_float, write_number};
use crate::writer::ByteWriter;
use crate::FormatError;

/// Width or precision "unspecified" sentinel.
const UNSPECIFIED: i32 = -1;

/// Formats `template` with `args` into `buf`.
///
/// The result is always NUL-terminated; the returned length excludes the
/// terminator. If the buffer fills up, the surviving prefix is kept (still
/// NUL-terminated) and `FormatError::Truncated` reports how much was written.
pub fn format_into(buf: &mut [u8], template: &str, args: &[Arg<'_>]) -> Result<usize, FormatError> {
    if buf.is_empty() {
        return Err(FormatError::Truncated { written: 0 });
    }

    // Reserve one byte so the terminator always fits.
    let last = buf.len() - 1;
    let mut out = ByteWriter::new(&mut buf[..last]);
    let mut args = Args::new(args);

    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'%' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        i = format_directive(&mut out, bytes, i + 1, &mut args)?;
    }

    let written = out.written();
    let truncated = out.truncated();
    buf[written] = 0;
    if truncated {
        Err(FormatError::Truncated { written })
    } else {
        Ok(written)
    }
}

/// Parses and emits one directive starting just past the `%`. Returns the
/// index of the first byte after the directive.
fn format_directive(
    out: &mut ByteWriter<'_>,
    bytes: &[u8],
    mut i: usize,
    args: &mut Args<'_>,
) -> Result<usize, FormatError> {
    let mut flags = FormatFlags::empty();

    // Flags, in any order and repetition.
    while i < bytes.len() {
        match bytes[i] {
            b'-' => flags.insert(FormatFlags::LEFT_ALIGN),
            b'+' => flags.insert(FormatFlags::FORCE_SIGN),
            b' ' => flags.insert(FormatFlags::SPACE_SIGN),
            b'#' => flags.insert(FormatFlags::ALTERNATE),
            b'0' => flags.insert(FormatFlags::ZERO_PAD),
            _ => break,
        }
        i += 1;
    }

    // Field width: literal digits or `*`. A negative `*` width means
    // left-aligned with the absolute value.
    let mut field_width = UNSPECIFIED;
    if i < bytes.len() {
        if bytes[i] == b'*' {
            i += 1;
            field_width = args.next_width();
            if field_width < 0 {
                field_width = field_width.saturating_abs();
                flags.insert(FormatFlags::LEFT_ALIGN);
            }
        } else if bytes[i].is_ascii_digit() {
            field_width = parse_decimal(bytes, &mut i);
        }
    }

    // Precision: a bare `.` means zero, no `.` means unspecified.
    let mut precision = UNSPECIFIED;
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        precision = 0;
        if i < bytes.len() {
            if bytes[i] == b'*' {
                i += 1;
                precision = args.next_width();
            } else if bytes[i].is_ascii_digit() {
                precision = parse_decimal(bytes, &mut i);
            }
        }
    }

    // Length qualifier; `ll` collapses into a single long-long.
    let mut qualifier = Qualifier::None;
    if i < bytes.len() {
        qualifier = match bytes[i] {
            b'h' => Qualifier::Short,
            b'l' => Qualifier::Long,
            b'L' => Qualifier::LongLong,
            b'Z' => Qualifier::Size,
            _ => Qualifier::None,
        };
        if qualifier != Qualifier::None {
            i += 1;
            if qualifier == Qualifier::Long && i < bytes.len() && bytes[i] == b'l' {
                qualifier = Qualifier::LongLong;
                i += 1;
            }
        }
    }

    // A template that ends mid-directive emits the bare '%'.
    let Some(&conversion) = bytes.get(i) else {
        out.push(b'%');
        return Ok(i);
    };
    i += 1;

    match conversion {
        b'%' => out.push(b'%'),
        b'c' => {
            let ch = args.next_char();
            let padding = if field_width > 0 {
                (field_width - 1) as usize
            } else {
                0
            };
            if !flags.contains(FormatFlags::LEFT_ALIGN) {
                out.fill(b' ', padding);
            }
            out.push(ch);
            if flags.contains(FormatFlags::LEFT_ALIGN) {
                out.fill(b' ', padding);
            }
        }
        b's' => {
            let s = args.next_str().unwrap_or("");
            let mut len = s.len();
            if precision >= 0 {
                len = len.min(precision as usize);
            }
            let padding = if field_width > 0 {
                (field_width as usize).saturating_sub(len)
            } else {
                0
            };
            if !flags.contains(FormatFlags::LEFT_ALIGN) {
                out.fill(b' ', padding);
            }
            out.push_bytes(&s.as_bytes()[..len]);
            if flags.contains(FormatFlags::LEFT_ALIGN) {
                out.fill(b' ', padding);
            }
        }
        b'o' | b'O' => {
            flags.insert(FormatFlags::ALTERNATE);
            if conversion == b'o' {
                flags.insert(FormatFlags::LOWERCASE);
            }
            let value = args.next_uint(qualifier) as i64;
            write_number(out, value, 8, field_width, precision, flags)?;
        }
        b'p' => {
            let mut field_width = field_width;
            if field_width < 0 {
                field_width = 2 * size_of::<usize>() as i32;
                flags.insert(FormatFlags::ZERO_PAD);
            }
            let value = args.next_ptr() as i64;
            write_number(out, value, 16, field_width, precision, flags)?;
        }
        b'x' | b'X' => {
            if conversion == b'x' {
                flags.insert(FormatFlags::LOWERCASE);
            }
            let value = args.next_uint(qualifier) as i64;
            write_number(out, value, 16, field_width, precision, flags)?;
        }
        b'd' | b'i' => {
            flags.insert(FormatFlags::SIGNED);
            let value = args.next_int(qualifier);
            write_number(out, value, 10, field_width, precision, flags)?;
        }
        b'u' => {
            let value = args.next_uint(qualifier) as i64;
            write_number(out, value, 10, field_width, precision, flags)?;
        }
        b'n' => args.store_count(out.written()),
        b'f' => {
            if precision < 0 {
                precision = 3;
            }
            flags.insert(FormatFlags::SIGNED);
            write_float(out, args.next_float(), field_width, precision, flags);
        }
        // Unrecognized directives pass through verbatim.
        other => {
            out.push(b'%');
            out.push(other);
        }
    }

    Ok(i)
}

/// Parses a run of ASCII digits at `*i`, advancing past them. Saturates at
/// `i32::MAX`.
fn parse_decimal(bytes: &[u8], i: &mut usize) -> i32 {
    let mut value: i64 = 0;
    while *i < bytes.len() && bytes[*i].is_ascii_digit() {
        value = (value * 10 + i64::from(bytes[*i] - b'0')).min(i64::from(i32::MAX));
        *i += 1;
    }
    value as i32
}
