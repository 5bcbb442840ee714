//! Text emission buffer for decompiled source.
//!
//! [`TextBuffer`] is appended to top-down by the emitter. Long expressions mark optional line
//! breaks inside newline groups; a single [`TextBuffer::reformat`] at the end decides which
//! groups to break and keeps bytecode offset mappings pointing at the right lines.

#![forbid(unsafe_code)]

mod buffer;
mod group;

pub use crate::buffer::{TextBuffer, TextConfig, TextError};
