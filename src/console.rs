//! The cursor-based console writer.
//!
//! A [`Console`] owns the screen geometry and the current cursor cell, and
//! turns bytes into glyph draws. Control characters move the cursor: newline,
//! tab (8-cell stops), and backspace are understood; everything else renders
//! through the font. When the cursor runs past the right edge it wraps to the
//! next line, and when it runs past the bottom it starts overwriting row 0.
//! There is no scrollback; this is the dumb early-boot output path.

use core::fmt;

use bitvec::order::Msb0;
use bitvec::view::BitView;
use spin::Mutex;

use printf::{format_into, Arg, FormatError};

use crate::font::Font;
use crate::framebuffer::{Argb32, PixelBuffer, ARGB_BLACK, ARGB_WHITE};

/// Tab stops sit every 8 cells.
const TAB_STOP: usize = 8;

/// Scratch capacity for one formatted write. The scratch region lives inside
/// the console and is reused by every call; formatting is not reentrant.
const FORMAT_BUF_LEN: usize = 1024;

/// Errors from console operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleError {
    /// The requested cursor position is outside the character grid. The
    /// cursor is left where it was.
    PositionOverflow,
    /// The formatted text did not fit the scratch buffer. The first
    /// `rendered` characters were still drawn.
    Truncated { rendered: usize },
}

impl fmt::Display for ConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PositionOverflow => write!(f, "cursor position outside the grid"),
            Self::Truncated { rendered } => {
                write!(f, "formatted text truncated after {rendered} characters")
            }
        }
    }
}

/// A monospaced text console over a pixel framebuffer.
///
/// The character grid is `max_x` by `max_y` cells. Both cursor coordinates
/// may transiently sit at the bound itself: column `max_x` is the overflow
/// column, where a glyph clips at the right screen edge and the cursor wraps
/// right afterwards. The wrap logic keeps `0 <= x <= max_x` and
/// `0 <= y <= max_y` after every operation.
pub struct Console<'a> {
    framebuffer: PixelBuffer<'a>,
    font: Font<'a>,
    max_x: usize,
    max_y: usize,
    x: usize,
    y: usize,
    scratch: [u8; FORMAT_BUF_LEN],
}

impl<'a> Console<'a> {
    /// Sets up a console over `framebuffer` with the cursor at the origin.
    pub fn new(framebuffer: PixelBuffer<'a>, font: Font<'a>) -> Self {
        let max_x = framebuffer.width() / font.glyph_width();
        let max_y = framebuffer.height() / font.glyph_height();
        Self {
            framebuffer,
            font,
            max_x,
            max_y,
            x: 0,
            y: 0,
            scratch: [0; FORMAT_BUF_LEN],
        }
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.x, self.y)
    }

    pub fn max_x(&self) -> usize {
        self.max_x
    }

    pub fn max_y(&self) -> usize {
        self.max_y
    }

    pub fn framebuffer(&self) -> &PixelBuffer<'a> {
        &self.framebuffer
    }

    /// Moves the cursor. Positions outside the grid (the bounds themselves
    /// are allowed) are rejected without moving anything.
    pub fn set_cursor(&mut self, x: usize, y: usize) -> Result<(), ConsoleError> {
        if x > self.max_x || y > self.max_y {
            return Err(ConsoleError::PositionOverflow);
        }
        self.x = x;
        self.y = y;
        Ok(())
    }

    /// Formats `template` with `args` and renders the result in the given
    /// colors. Returns the number of characters processed, control characters
    /// included.
    ///
    /// A result too long for the scratch buffer is rendered up to the
    /// truncation point and reported as [`ConsoleError::Truncated`].
    pub fn write_formatted(
        &mut self,
        foreground: Argb32,
        background: Argb32,
        template: &str,
        args: &[Arg<'_>],
    ) -> Result<usize, ConsoleError> {
        let (len, truncated) = match format_into(&mut self.scratch, template, args) {
            Ok(len) => (len, false),
            Err(FormatError::Truncated { written }) => (written, true),
            // The engine only ever asks for bases 8, 10 and 16.
            Err(FormatError::InvalidBase) => (0, false),
        };

        for i in 0..len {
            let byte = self.scratch[i];
            self.put_byte(byte, foreground, background);
        }

        if truncated {
            log::warn!("console: formatted write truncated at {len} bytes");
            return Err(ConsoleError::Truncated { rendered: len });
        }
        Ok(len)
    }

    /// Renders a plain string in the given colors. Returns the number of
    /// characters processed.
    pub fn write_colored(&mut self, foreground: Argb32, background: Argb32, text: &str) -> usize {
        for &byte in text.as_bytes() {
            self.put_byte(byte, foreground, background);
        }
        text.len()
    }

    /// One step of the character state machine.
    fn put_byte(&mut self, byte: u8, foreground: Argb32, background: Argb32) {
        match byte {
            b'\n' => {
                self.x = 0;
                self.y += 1;
                self.wrap_cursor();
            }
            b'\t' => {
                // Advance to the next multiple-of-8 column, blanking the
                // cells we skip over. A tab on a stop advances a full stop.
                let advance = TAB_STOP - self.x % TAB_STOP;
                for _ in 0..advance {
                    self.draw_glyph(b' ', background, background);
                    self.x += 1;
                    self.wrap_cursor();
                }
            }
            // Backspace: step back one cell (to the end of the previous row
            // from column 0; row 0 pins to the origin) and blank it.
            0x08 => {
                if self.x == 0 {
                    if self.y > 0 {
                        self.y -= 1;
                        self.x = self.max_x;
                    }
                } else {
                    self.x -= 1;
                }
                self.draw_glyph(b' ', foreground, background);
                self.x += 1;
                self.wrap_cursor();
            }
            _ => {
                self.draw_glyph(byte, foreground, background);
                self.x += 1;
                self.wrap_cursor();
            }
        }
    }

    /// Applied after every cursor advance. Past the right edge the cursor
    /// moves to the next row; past the bottom it returns to row 0, which gets
    /// overwritten in place of scrolling.
    fn wrap_cursor(&mut self) {
        if self.x > self.max_x {
            self.x = 0;
            self.y += 1;
        }
        if self.y > self.max_y {
            self.y = 0;
        }
    }

    /// Draws the glyph for `code` at the current cursor cell. A glyph in the
    /// overflow column clips at the right edge of the screen.
    fn draw_glyph(&mut self, code: u8, foreground: Argb32, background: Argb32) {
        let glyph = self.font.glyph(code);
        self.framebuffer.draw_bitmap(
            self.x * self.font.glyph_width(),
            self.y * self.font.glyph_height(),
            glyph.view_bits::<Msb0>(),
            self.font.row_bits(),
            self.font.glyph_width(),
            foreground,
            background,
        );
    }
}

impl fmt::Write for Console<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_colored(ARGB_WHITE, ARGB_BLACK, s);
        Ok(())
    }
}

static CONSOLE: Mutex<Option<Console<'static>>> = Mutex::new(None);

/// Installs the process-wide console used by [`printk`] and the `kprint!`
/// macros. The lock around it is the mutual exclusion for the whole
/// format-and-render path, so concurrent writers serialize per call.
pub fn init(framebuffer: PixelBuffer<'static>, font: Font<'static>) {
    let console = Console::new(framebuffer, font);
    log::info!(
        "console initialized: {}x{} cells over {}x{} px",
        console.max_x,
        console.max_y,
        console.framebuffer.width(),
        console.framebuffer.height()
    );
    CONSOLE.lock().replace(console);
}

/// Runs `f` on the global console under its lock. Returns `None` if [`init`]
/// has not run yet.
pub fn with_console<R>(f: impl FnOnce(&mut Console<'static>) -> R) -> Option<R> {
    CONSOLE.lock().as_mut().map(f)
}

/// Formatted write to the global console. Quietly writes nothing before
/// [`init`].
pub fn printk(
    foreground: Argb32,
    background: Argb32,
    template: &str,
    args: &[Arg<'_>],
) -> Result<usize, ConsoleError> {
    with_console(|console| console.write_formatted(foreground, background, template, args))
        .unwrap_or(Ok(0))
}

#[doc(hidden)]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;
    let _ = with_console(|console| console.write_fmt(args));
}

/// Prints to the global framebuffer console.
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => ($crate::console::_print(format_args!($($arg)*)));
}

/// Prints to the global framebuffer console, appending a newline.
#[macro_export]
macro_rules! kprintln {
    () => ($crate::kprint!("\n"));
    ($($arg:tt)*) => ($crate::kprint!("{}\n", format_args!($($arg)*)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::ARGB_GREEN;

    const GLYPH_W: usize = 4;
    const GLYPH_H: usize = 4;

    // Minimal test font: space is blank, 'A' has only its top row set, and
    // every other code is a solid block.
    fn font_data() -> Vec<u8> {
        let mut data = vec![0xF0u8; 256 * GLYPH_H];
        for row in 0..GLYPH_H {
            data[usize::from(b' ') * GLYPH_H + row] = 0x00;
            if row > 0 {
                data[usize::from(b'A') * GLYPH_H + row] = 0x00;
            }
        }
        data
    }

    // 18x12 px with 4x4 glyphs: cells 0..=3 fully visible, column 4 is the
    // overflow column with 2 visible pixel columns, max_x = 4, max_y = 3.
    fn pixels() -> Vec<Argb32> {
        vec![ARGB_BLACK; 18 * 12]
    }

    fn console<'a>(pixels: &'a mut [Argb32], font_data: &'a [u8]) -> Console<'a> {
        let fb = PixelBuffer::new(pixels, 18, 12, 18).unwrap();
        let font = Font::new(font_data, GLYPH_W, GLYPH_H).unwrap();
        Console::new(fb, font)
    }

    fn cell_is(console: &Console, cx: usize, cy: usize, color: Argb32) -> bool {
        (0..GLYPH_H).all(|dy| {
            (0..GLYPH_W).all(|dx| {
                console.framebuffer().pixel(cx * GLYPH_W + dx, cy * GLYPH_H + dy) == Some(color)
            })
        })
    }

    #[test]
    fn starts_at_the_origin_with_derived_bounds() {
        let (mut pixels, data) = (pixels(), font_data());
        let console = console(&mut pixels, &data);
        assert_eq!(console.cursor(), (0, 0));
        assert_eq!(console.max_x(), 4);
        assert_eq!(console.max_y(), 3);
    }

    #[test]
    fn printable_characters_render_and_advance() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "B");
        assert!(cell_is(&console, 0, 0, ARGB_WHITE));
        assert_eq!(console.cursor(), (1, 0));
    }

    #[test]
    fn set_cursor_validates_inclusively() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        assert_eq!(console.set_cursor(4, 3), Ok(()));
        assert_eq!(
            console.set_cursor(5, 0),
            Err(ConsoleError::PositionOverflow)
        );
        assert_eq!(
            console.set_cursor(0, 4),
            Err(ConsoleError::PositionOverflow)
        );
        // The failed calls left the cursor alone.
        assert_eq!(console.cursor(), (4, 3));
    }

    #[test]
    fn overflow_column_clips_and_wraps() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.set_cursor(4, 1).unwrap();
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "B");
        // Two pixel columns of the glyph are visible at the right edge.
        assert_eq!(console.framebuffer().pixel(16, 4), Some(ARGB_WHITE));
        assert_eq!(console.framebuffer().pixel(17, 7), Some(ARGB_WHITE));
        assert_eq!(console.cursor(), (0, 2));
    }

    #[test]
    fn vertical_wrap_overwrites_row_zero() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "A");
        assert!(!cell_is(&console, 0, 0, ARGB_WHITE)); // top row only

        console.set_cursor(4, 3).unwrap();
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "BB");
        // The first B clipped off the bottom-right corner and wrapped the
        // cursor to the origin; the second B overwrote the A there.
        assert!(cell_is(&console, 0, 0, ARGB_WHITE));
        assert_eq!(console.cursor(), (1, 0));
    }

    #[test]
    fn newline_resets_the_column() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "BB\nB");
        assert_eq!(console.cursor(), (1, 1));
        assert!(cell_is(&console, 0, 1, ARGB_WHITE));
    }

    #[test]
    fn newline_at_the_bottom_wraps_to_row_zero() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.set_cursor(1, 3).unwrap();
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "\n");
        assert_eq!(console.cursor(), (0, 0));
    }

    #[test]
    fn tab_advances_to_the_next_stop() {
        // A wider screen so a full tab stop fits: 64x8 px, 16x2 cells.
        let mut pixels = vec![ARGB_BLACK; 64 * 8];
        let data = font_data();
        let fb = PixelBuffer::new(&mut pixels, 64, 8, 64).unwrap();
        let font = Font::new(&data, GLYPH_W, GLYPH_H).unwrap();
        let mut console = Console::new(fb, font);

        console.set_cursor(3, 0).unwrap();
        console.write_colored(ARGB_WHITE, ARGB_GREEN, "\t");
        assert_eq!(console.cursor(), (8, 0));
        // The skipped cells were blanked in the background color.
        assert!(cell_is(&console, 3, 0, ARGB_GREEN));
        assert!(cell_is(&console, 7, 0, ARGB_GREEN));

        // On a stop, a tab advances one full stop.
        console.write_colored(ARGB_WHITE, ARGB_GREEN, "\t");
        assert_eq!(console.cursor(), (16, 0));
    }

    #[test]
    fn backspace_blanks_the_previous_cell() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "BB");
        assert_eq!(console.cursor(), (2, 0));
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "\u{8}");
        assert!(cell_is(&console, 1, 0, ARGB_BLACK));
        assert_eq!(console.cursor(), (2, 0));
    }

    #[test]
    fn backspace_at_the_origin_stays_put() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "\u{8}");
        assert_eq!(console.cursor(), (1, 0));
        assert!(cell_is(&console, 0, 0, ARGB_BLACK));
    }

    #[test]
    fn backspace_from_column_zero_reaches_the_previous_row() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        console.set_cursor(0, 2).unwrap();
        // Steps to the overflow column of row 1, blanks it, and the advance
        // wraps straight back to where it started.
        console.write_colored(ARGB_WHITE, ARGB_BLACK, "\u{8}");
        assert_eq!(console.cursor(), (0, 2));
    }

    #[test]
    fn write_formatted_renders_and_counts() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        let count = console
            .write_formatted(ARGB_WHITE, ARGB_BLACK, "%d!", &[7.into()])
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(console.cursor(), (2, 0));
        assert!(cell_is(&console, 0, 0, ARGB_WHITE));
    }

    #[test]
    fn write_formatted_reports_truncation_after_rendering() {
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        let result = console.write_formatted(ARGB_WHITE, ARGB_BLACK, "%2000d", &[7.into()]);
        assert_eq!(
            result,
            Err(ConsoleError::Truncated {
                rendered: FORMAT_BUF_LEN - 1
            })
        );
        // The prefix still went to the screen and moved the cursor.
        assert_ne!(console.cursor(), (0, 0));
    }

    // No test calls `init`, so the global stays empty for the whole run.
    #[test]
    fn global_console_is_a_noop_before_init() {
        assert_eq!(printk(ARGB_WHITE, ARGB_BLACK, "%d", &[1.into()]), Ok(0));
        crate::kprintln!("dropped");
    }

    #[test]
    fn works_as_a_fmt_write_sink() {
        use core::fmt::Write;
        let (mut pixels, data) = (pixels(), font_data());
        let mut console = console(&mut pixels, &data);
        write!(console, "{}-{}", 1, 2).unwrap();
        assert_eq!(console.cursor(), (3, 0));
    }
}
