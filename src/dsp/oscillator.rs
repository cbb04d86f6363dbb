use std::f32::consts::TAU;

use rand::{rngs::SmallRng, Rng, SeedableRng};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::graph::node::RenderCtx;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscillatorWaveform {
    Sine,
    Saw,
    Square,
    Triangle,
    Noise,
}

/// Phase-accumulating oscillator. Naive (non-band-limited) shapes: fine for
/// the filtered, mostly-sine piano voices this crate builds.
pub struct OscillatorBlock {
    waveform: OscillatorWaveform,
    phase: f32, // 0.0 - 1.0, fraction of a cycle
    rng: SmallRng,
}

impl OscillatorBlock {
    pub fn new(waveform: OscillatorWaveform) -> Self {
        Self {
            waveform,
            phase: 0.0,
            rng: SmallRng::seed_from_u64(0x5eed),
        }
    }

    pub fn sine() -> Self {
        Self::new(OscillatorWaveform::Sine)
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorWaveform::Saw)
    }

    pub fn square() -> Self {
        Self::new(OscillatorWaveform::Square)
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorWaveform::Triangle)
    }

    pub fn noise() -> Self {
        Self::new(OscillatorWaveform::Noise)
    }

    /// Reseed the noise source (per-voice variation, reproducible in tests).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn waveform(&self) -> OscillatorWaveform {
        self.waveform
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    #[inline]
    fn shape(&mut self) -> f32 {
        let p = self.phase;
        match self.waveform {
            OscillatorWaveform::Sine => (TAU * p).sin(),
            OscillatorWaveform::Saw => 2.0 * p - 1.0,
            OscillatorWaveform::Square => {
                if p < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            OscillatorWaveform::Triangle => 1.0 - 4.0 * (p - 0.5).abs(),
            OscillatorWaveform::Noise => self.rng.random_range(-1.0..=1.0),
        }
    }

    pub fn render(&mut self, destination: &mut [f32], ctx: &RenderCtx) {
        let increment = ctx.frequency / ctx.sample_rate;
        for sample in destination.iter_mut() {
            *sample = self.shape();
            self.phase += increment;
            if self.phase >= 1.0 {
                self.phase -= self.phase.floor();
            }
        }
    }
}
