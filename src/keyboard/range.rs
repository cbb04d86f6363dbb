#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::notes::{equal_tempered, Note, NoteName};

/// C3 under A4 = 440 Hz tuning
pub const C3_HZ: f64 = 130.812_782_650_299_3;

/// The span of keys the piano exposes.
///
/// Keys run chromatically upward from C of `lowest_octave`. The frequency of
/// that first C is `base_frequency`; every other key is derived from it.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeyRange {
    pub lowest_octave: i32,
    pub key_count: usize,
    pub base_frequency: f64,
}

impl KeyRange {
    /// Three octaves from C3: 36 keys.
    pub const THREE_OCTAVES: KeyRange = KeyRange {
        lowest_octave: 3,
        key_count: 36,
        base_frequency: C3_HZ,
    };

    pub fn new(lowest_octave: i32, key_count: usize, base_frequency: f64) -> Self {
        Self {
            lowest_octave,
            key_count,
            base_frequency,
        }
    }

    /// Whole octaves starting at C of `lowest_octave`, tuned to A4 = 440 Hz.
    pub fn octaves(lowest_octave: i32, octaves: usize) -> Self {
        let semitones_from_c3 = (lowest_octave - 3) * 12;
        Self {
            lowest_octave,
            key_count: octaves * 12,
            base_frequency: equal_tempered(C3_HZ, semitones_from_c3),
        }
    }

    /// Equal-tempered frequency of `(name, octave)` relative to this range's
    /// lowest C. Total: octaves outside the range still get a frequency.
    pub fn frequency_of(&self, name: NoteName, octave: i32) -> f64 {
        let offset = (octave - self.lowest_octave) * 12 + name.semitone() as i32;
        equal_tempered(self.base_frequency, offset)
    }

    /// Key at `index` counted from the lowest key.
    pub fn note_at(&self, index: usize) -> Option<Note> {
        if index >= self.key_count {
            return None;
        }
        let name = NoteName::from_semitone((index % 12) as u8);
        let octave = self.lowest_octave + (index / 12) as i32;
        Some(Note::new(name, octave, self.frequency_of(name, octave)))
    }

    /// Index of `(name, octave)` if it lies on this keyboard.
    pub fn index_of(&self, name: NoteName, octave: i32) -> Option<usize> {
        let offset = (octave - self.lowest_octave) * 12 + name.semitone() as i32;
        usize::try_from(offset)
            .ok()
            .filter(|&index| index < self.key_count)
    }

    pub fn find(&self, name: NoteName, octave: i32) -> Option<Note> {
        self.index_of(name, octave).and_then(|index| self.note_at(index))
    }

    /// Every key, lowest first.
    pub fn notes(&self) -> Vec<Note> {
        (0..self.key_count).filter_map(|i| self.note_at(i)).collect()
    }
}

impl Default for KeyRange {
    fn default() -> Self {
        Self::THREE_OCTAVES
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_range_has_36_keys() {
        let range = KeyRange::default();
        let notes = range.notes();

        assert_eq!(notes.len(), 36);
        assert_eq!(notes[0].to_string(), "C3");
        assert_eq!(notes[35].to_string(), "B5");
        assert_eq!(notes.iter().filter(|n| n.is_accidental).count(), 15);
    }

    #[test]
    fn frequency_is_monotonic_across_range() {
        let range = KeyRange::default();
        let notes = range.notes();

        for pair in notes.windows(2) {
            assert!(
                pair[1].frequency > pair[0].frequency,
                "{} should be above {}",
                pair[1],
                pair[0]
            );
        }
    }

    #[test]
    fn octave_doubles_c() {
        let range = KeyRange::default();
        for octave in 3..5 {
            let low = range.frequency_of(NoteName::C, octave);
            let high = range.frequency_of(NoteName::C, octave + 1);
            assert!((high - 2.0 * low).abs() < 1e-9);
        }
    }

    #[test]
    fn a4_is_440() {
        let range = KeyRange::default();
        let a4 = range.find(NoteName::A, 4).expect("A4 is on a C3-B5 keyboard");
        assert!((a4.frequency - 440.0).abs() < 1e-6);
    }

    #[test]
    fn lookups_outside_range_are_none() {
        let range = KeyRange::default();
        assert!(range.note_at(36).is_none());
        assert!(range.find(NoteName::B, 2).is_none());
        assert!(range.find(NoteName::C, 6).is_none());
    }

    #[test]
    fn octaves_constructor_keeps_a440_tuning() {
        let range = KeyRange::octaves(4, 2);
        assert_eq!(range.key_count, 24);
        let a4 = range.find(NoteName::A, 4).expect("A4 in range");
        assert!((a4.frequency - 440.0).abs() < 1e-6);
    }
}
