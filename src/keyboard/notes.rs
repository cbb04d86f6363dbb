use std::{fmt, str::FromStr};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ParseNoteError;

/*
Equal Temperament
=================

Every key on the keyboard is one semitone above its left neighbour, and every
semitone multiplies the frequency by the twelfth root of two:

    f = f0 * 2^(n / 12)

where `f0` is the frequency of the lowest key and `n` is how many semitones
the key sits above it. Twelve semitones make an octave, so the same note one
octave up has exactly twice the frequency.

Semitone order inside an octave (C is always index 0):

    index:  0   1   2   3   4   5   6   7   8   9   10  11
    name:   C   C#  D   D#  E   F   F#  G   G#  A   A#  B
    key:    w   b   w   b   w   w   b   w   b   w   b   w

The "b" keys are accidentals (sharps); they are drawn as the short dark keys.
A name is accidental iff it carries the sharp marker `#`.

For a key at (name, octave) on a keyboard whose lowest C sits in
`lowest_octave`:

    n = (octave - lowest_octave) * 12 + name.semitone()

Reference: A4 = 440 Hz puts C3 at ~130.81 Hz and C4 (middle C) at ~261.63 Hz.
*/

/// Pitch class names in chromatic order, sharps only.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NoteName {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl NoteName {
    /// The 12-tone chromatic ordering starting from C.
    pub const ALL: [NoteName; 12] = [
        NoteName::C,
        NoteName::Cs,
        NoteName::D,
        NoteName::Ds,
        NoteName::E,
        NoteName::F,
        NoteName::Fs,
        NoteName::G,
        NoteName::Gs,
        NoteName::A,
        NoteName::As,
        NoteName::B,
    ];

    /// Position inside the octave (C = 0, B = 11).
    pub fn semitone(self) -> u8 {
        self as u8
    }

    pub fn from_semitone(semitone: u8) -> Self {
        Self::ALL[(semitone % 12) as usize]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NoteName::C => "C",
            NoteName::Cs => "C#",
            NoteName::D => "D",
            NoteName::Ds => "D#",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::Fs => "F#",
            NoteName::G => "G",
            NoteName::Gs => "G#",
            NoteName::A => "A",
            NoteName::As => "A#",
            NoteName::B => "B",
        }
    }

    /// Sharps are drawn as the short dark keys.
    pub fn is_accidental(self) -> bool {
        self.as_str().contains('#')
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NoteName {
    type Err = ParseNoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        NoteName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| ParseNoteError(s.to_string()))
    }
}

/// One key of the keyboard. Built once per key range and never mutated.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Note {
    pub name: NoteName,
    pub octave: i32,
    /// Fundamental frequency in Hz
    pub frequency: f64,
    pub is_accidental: bool,
}

impl Note {
    pub fn new(name: NoteName, octave: i32, frequency: f64) -> Self {
        Self {
            name,
            octave,
            frequency,
            is_accidental: name.is_accidental(),
        }
    }

    /// Same pitch class and octave, ignoring frequency.
    pub fn same_key(&self, other: &Note) -> bool {
        self.name == other.name && self.octave == other.octave
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name, self.octave)
    }
}

/// Frequency of a key `semitones` above a reference frequency.
#[inline]
pub fn equal_tempered(reference_hz: f64, semitones: i32) -> f64 {
    reference_hz * 2.0_f64.powf(semitones as f64 / 12.0)
}
