//! Timbre presets - the sound of a key, bundled as plain parameters.
//!
//! Every preset builds the same chain, only the numbers change:
//!
//! 1. A stack of harmonic partials (one oscillator per harmonic)
//! 2. An optional noise burst mixed on top for the hammer strike
//! 3. A key-tracking filter: cutoff = key frequency × multiplier
//!
//! The amplitude envelope is not part of the chain; the voice owns it so it
//! can capture the level at release. Presets may override any ADSR stage;
//! stages they leave as `None` come from the engine config.
//!
//! # Presets
//!
//! - Classic: one oscillator of the configured waveform, gentle filter. The
//!   simplest possible voice.
//! - Grand: sine partials falling off with harmonic number, hammer noise,
//!   long ring.
//! - Electric: sine with a strong second partial, bell-like and bright.
//! - Organ: drawbar-like partials with full sustain and no hammer.
//! - Harpsichord: sawtooth through a resonant filter, plucked with no sustain.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    dsp::{filter::FilterType, oscillator::OscillatorWaveform},
    graph::{
        envelope::EnvNode, extensions::NodeExt, filter::FilterNode, oscillator::OscNode,
        partials::Partials, GraphNode,
    },
};

/// Length of the hammer noise burst (seconds).
const HAMMER_DECAY: f32 = 0.03;

/// Parameter bundle behind a [`Timbre`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimbreParams {
    /// `None` uses the engine's configured waveform
    pub waveform: Option<OscillatorWaveform>,
    /// Gain of harmonic n+1 at index n
    pub partials: &'static [f32],
    pub filter_type: FilterType,
    pub cutoff_multiplier: f32,
    pub resonance: f32,
    /// Noise burst share of the mix (0.0 = none)
    pub noise_level: f32,
    pub attack: Option<f32>,
    pub decay: Option<f32>,
    pub sustain: Option<f32>,
    pub release: Option<f32>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Timbre {
    #[default]
    Classic,
    Grand,
    Electric,
    Organ,
    Harpsichord,
}

impl Timbre {
    pub const ALL: [Timbre; 5] = [
        Timbre::Classic,
        Timbre::Grand,
        Timbre::Electric,
        Timbre::Organ,
        Timbre::Harpsichord,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Timbre::Classic => "classic",
            Timbre::Grand => "grand",
            Timbre::Electric => "electric",
            Timbre::Organ => "organ",
            Timbre::Harpsichord => "harpsichord",
        }
    }

    /// Next preset in [`Timbre::ALL`], wrapping around.
    pub fn next(self) -> Timbre {
        let idx = Self::ALL.iter().position(|t| *t == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn params(self) -> TimbreParams {
        match self {
            Timbre::Classic => TimbreParams {
                waveform: None,
                partials: &[1.0],
                filter_type: FilterType::LowPass,
                cutoff_multiplier: 8.0,
                resonance: 0.0,
                noise_level: 0.0,
                attack: None,
                decay: None,
                sustain: None,
                release: None,
            },
            Timbre::Grand => TimbreParams {
                waveform: Some(OscillatorWaveform::Sine),
                partials: &[1.0, 0.5, 0.3, 0.2, 0.12, 0.08],
                filter_type: FilterType::LowPass,
                cutoff_multiplier: 6.0,
                resonance: 0.1,
                noise_level: 0.08,
                attack: Some(0.002),
                decay: Some(0.8),
                sustain: Some(0.25),
                release: Some(0.9),
            },
            Timbre::Electric => TimbreParams {
                waveform: Some(OscillatorWaveform::Sine),
                partials: &[1.0, 0.8, 0.0, 0.25],
                filter_type: FilterType::LowPass,
                cutoff_multiplier: 10.0,
                resonance: 0.3,
                noise_level: 0.03,
                attack: Some(0.003),
                decay: Some(0.5),
                sustain: Some(0.45),
                release: Some(0.4),
            },
            Timbre::Organ => TimbreParams {
                waveform: Some(OscillatorWaveform::Sine),
                partials: &[1.0, 0.7, 0.5, 0.6, 0.0, 0.3, 0.0, 0.4],
                filter_type: FilterType::LowPass,
                cutoff_multiplier: 12.0,
                resonance: 0.0,
                noise_level: 0.0,
                attack: Some(0.02),
                decay: Some(0.05),
                sustain: Some(1.0),
                release: Some(0.12),
            },
            Timbre::Harpsichord => TimbreParams {
                waveform: Some(OscillatorWaveform::Saw),
                partials: &[1.0],
                filter_type: FilterType::LowPass,
                cutoff_multiplier: 5.0,
                resonance: 0.6,
                noise_level: 0.05,
                attack: Some(0.001),
                decay: Some(0.6),
                sustain: Some(0.0),
                release: Some(0.25),
            },
        }
    }

    /// Build the signal chain for one voice of this preset.
    ///
    /// `seed` varies the hammer noise between voices.
    pub fn graph(self, fallback: OscillatorWaveform, seed: u64) -> Box<dyn GraphNode> {
        let params = self.params();
        let waveform = params.waveform.unwrap_or(fallback);
        let filter = FilterNode::tracking(params.filter_type, params.cutoff_multiplier)
            .with_resonance(params.resonance);
        let tone = Partials::new(waveform, params.partials);

        if params.noise_level > 0.0 {
            let hammer = OscNode::noise()
                .with_seed(seed)
                .amplify(EnvNode::burst(HAMMER_DECAY, 1.0));
            tone.mix(hammer, params.noise_level).through(filter).boxed()
        } else {
            tone.through(filter).boxed()
        }
    }
}

impl fmt::Display for Timbre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
