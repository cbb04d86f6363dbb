//! Note naming and the equal-tempered frequency table for the keyboard.

/// Pitch classes, notes, and the semitone formula.
pub mod notes;
/// Key ranges and per-key lookup.
pub mod range;

pub use notes::{equal_tempered, Note, NoteName};
pub use range::{KeyRange, C3_HZ};
