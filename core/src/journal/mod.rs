//! Journal line format: one JSON object per line, discriminated by `event`.

pub mod decoder;
pub mod event;

pub use decoder::{DecodeError, decode_line};
pub use event::RawEvent;
