//! Computer keyboard → piano key mapping
//!
//! Two rows of a QWERTY keyboard laid out like piano keys, one octave each,
//! with Shift on the bottom row for the third octave:
//!
//! ```text
//!   2 3   5 6 7          s d   g h j          S D   G H J
//!  q w e r t y u        z x c v b n m        Z X C V B N M
//!  └ middle octave ┘    └ lower octave ┘     └ upper octave ┘
//! ```

const LOWER: [char; 12] = ['z', 's', 'x', 'd', 'c', 'v', 'g', 'b', 'h', 'n', 'j', 'm'];
const MIDDLE: [char; 12] = ['q', '2', 'w', '3', 'e', 'r', '5', 't', '6', 'y', '7', 'u'];

/// Key index (0 = lowest C) played by `c`, if any.
pub fn key_index(c: char) -> Option<usize> {
    if let Some(i) = LOWER.iter().position(|&k| k == c) {
        return Some(i);
    }
    if let Some(i) = MIDDLE.iter().position(|&k| k == c) {
        return Some(12 + i);
    }
    if c.is_ascii_uppercase() {
        let lower = c.to_ascii_lowercase();
        return LOWER.iter().position(|&k| k == lower).map(|i| 24 + i);
    }
    None
}

/// Label drawn on key `index`.
pub fn label(index: usize) -> Option<char> {
    match index {
        0..=11 => Some(LOWER[index]),
        12..=23 => Some(MIDDLE[index - 12]),
        24..=35 => Some(LOWER[index - 24].to_ascii_uppercase()),
        _ => None,
    }
}

/// Characters whose press may still be held when `c` is released.
///
/// Letting go of Shift before the letter turns an `Z` release into a `z`
/// release, so both cases are released together.
pub fn release_aliases(c: char) -> [char; 2] {
    [c.to_ascii_lowercase(), c.to_ascii_uppercase()]
}
