#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{dsp::oscillator::OscillatorWaveform, keyboard::KeyRange, synth::timbre::Timbre};

/// Release used when a voice is evicted to make room for a new one (seconds).
pub const DEFAULT_RELEASE_TIME: f32 = 0.3;

/// Extra time after a release tail before the voice is torn down (seconds).
pub const TEARDOWN_MARGIN: f32 = 0.1;

/// How long a replayed note holds at its sustain level before releasing (seconds).
pub const PLAYBACK_HOLD: f32 = 0.3;

/// Engine tunables. Everything here is a plain value; there is no config file.
///
/// ```
/// use saavy_piano::PianoConfig;
///
/// let config = PianoConfig::default()
///     .with_max_voices(16)
///     .with_volume(0.8)
///     .with_adsr(0.005, 0.3, 0.4, 0.8);
/// assert_eq!(config.max_voices, 16);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PianoConfig {
    pub sample_rate: f32,
    pub range: KeyRange,
    /// Oscillator family for presets that don't pick their own
    pub waveform: OscillatorWaveform,
    pub attack: f32,
    pub decay: f32,
    /// Fraction of peak held while a key is down (0.0 - 1.0)
    pub sustain: f32,
    pub release: f32,
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    /// Polyphony cap of the voice pool
    pub max_voices: usize,
    pub timbre: Timbre,
}

impl Default for PianoConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48_000.0,
            range: KeyRange::THREE_OCTAVES,
            waveform: OscillatorWaveform::Triangle,
            attack: 0.005,
            decay: 0.35,
            sustain: 0.4,
            release: 0.5,
            volume: 0.5,
            max_voices: 10,
            timbre: Timbre::Classic,
        }
    }
}

impl PianoConfig {
    pub fn with_sample_rate(mut self, sample_rate: f32) -> Self {
        self.sample_rate = sample_rate.max(1.0);
        self
    }

    pub fn with_range(mut self, range: KeyRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_waveform(mut self, waveform: OscillatorWaveform) -> Self {
        self.waveform = waveform;
        self
    }

    pub fn with_adsr(mut self, attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        self.attack = attack.max(0.0);
        self.decay = decay.max(0.0);
        self.sustain = sustain.clamp(0.0, 1.0);
        self.release = release.max(0.0);
        self
    }

    pub fn with_volume(mut self, volume: f32) -> Self {
        self.volume = volume.clamp(0.0, 1.0);
        self
    }

    /// Polyphony cap; at least one voice is always allowed.
    pub fn with_max_voices(mut self, max_voices: usize) -> Self {
        self.max_voices = max_voices.max(1);
        self
    }

    pub fn with_timbre(mut self, timbre: Timbre) -> Self {
        self.timbre = timbre;
        self
    }
}
