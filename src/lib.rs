//! A monospaced text console rendered directly onto a pixel framebuffer.
//!
//! The crate is split along the data flow: `printf` (a sibling crate) turns a
//! template plus arguments into bytes, and the modules here map those bytes
//! onto a character grid over the framebuffer (glyph lookup, per-pixel
//! drawing, cursor movement, and line wrap).
//!
//! Everything is `no_std` and allocation-free; the framebuffer memory and the
//! bitmap font are supplied by the platform. A process-wide console instance
//! lives behind a spin lock (see [`console::init`]) for use from logging
//! macros, but [`console::Console`] itself is an ordinary owned value, so
//! independent consoles (and host-side tests) work too.

#![cfg_attr(not(test), no_std)]

pub mod console;
pub mod font;
pub mod framebuffer;

pub use console::{init, printk, with_console, Console, ConsoleError};
pub use font::Font;
pub use framebuffer::{
    Argb32, PixelBuffer, ARGB_BLACK, ARGB_BLUE, ARGB_GREEN, ARGB_RED, ARGB_WHITE,
};
pub use printf::{Arg, FormatError};
