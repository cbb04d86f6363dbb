use crate::dsp::oscillator::{OscillatorBlock, OscillatorWaveform};
use crate::graph::node::{GraphNode, RenderCtx};

/*
Audio Oscillator
================

The oscillator is the raw sound source of every voice. It repeats a waveform
at the key's frequency; the filter and envelope downstream shape it into
something piano-like.

Waveform Types and Their Character:
-----------------------------------

Sine:     Fundamental only. Pure, flute-like. The piano presets start here
          and add partials explicitly.
Sawtooth: All harmonics falling off as 1/n. Bright, brassy.
Square:   Odd harmonics, 1/n. Hollow, woody.
Triangle: Odd harmonics, 1/n². Soft, between sine and square.
Noise:    No pitch. Used for the hammer "thunk" at the start of a note.

Example usage:
  let osc = OscNode::sine();                     // follows the key pitch
  let thunk = OscNode::noise();                  // unpitched
  let fifth = OscNode::sine().with_ratio(1.5);   // a fifth above the key
*/

pub struct OscNode {
    osc: OscillatorBlock,
    /// Multiple of the key frequency to play at (1.0 = the key itself)
    ratio: f32,
    /// Detune in cents. 100 cents = 1 semitone.
    detune_cents: f32,
}

impl OscNode {
    fn new(osc: OscillatorBlock) -> Self {
        Self {
            osc,
            ratio: 1.0,
            detune_cents: 0.0,
        }
    }

    pub fn waveform(waveform: OscillatorWaveform) -> Self {
        Self::new(OscillatorBlock::new(waveform))
    }

    pub fn sine() -> Self {
        Self::new(OscillatorBlock::sine())
    }

    pub fn sawtooth() -> Self {
        Self::new(OscillatorBlock::sawtooth())
    }

    pub fn square() -> Self {
        Self::new(OscillatorBlock::square())
    }

    pub fn triangle() -> Self {
        Self::new(OscillatorBlock::triangle())
    }

    pub fn noise() -> Self {
        Self::new(OscillatorBlock::noise())
    }

    /// Play at `ratio` times the key frequency (2.0 = octave, 3.0 = twelfth).
    pub fn with_ratio(mut self, ratio: f32) -> Self {
        self.ratio = ratio;
        self
    }

    /// Set detune in cents. Typical values: ±2-8 cents for a chorused,
    /// slightly out-of-tune string pair.
    pub fn with_detune(mut self, cents: f32) -> Self {
        self.detune_cents = cents;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.osc = self.osc.with_seed(seed);
        self
    }
}

impl GraphNode for OscNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let mut frequency = ctx.frequency * self.ratio;

        // Apply detune: frequency * 2^(cents/1200)
        if self.detune_cents != 0.0 {
            frequency *= 2.0_f32.powf(self.detune_cents / 1200.0);
        }

        let modified_ctx = RenderCtx { frequency, ..*ctx };
        self.osc.render(out, &modified_ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        // Every strike starts at phase zero so repeated notes sound alike
        self.osc.reset();
    }
}
