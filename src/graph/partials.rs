use crate::{
    dsp::oscillator::OscillatorWaveform,
    graph::{
        node::{GraphNode, RenderCtx},
        oscillator::OscNode,
    },
    MAX_BLOCK_SIZE,
};

/*
Harmonic Partials
=================

A struck string vibrates at its fundamental and at whole-number multiples of
it at the same time. Partials models that with one oscillator per harmonic:

    out = Σ gain[n] × osc(freq × (n + 1))  /  Σ gain[n]

  gains = [1.0]                 bare oscillator
  gains = [1.0, 0.5, 0.25]      fundamental, octave, twelfth

The sum is normalised by the total gain so the output keeps the [-1, 1] range
of a single oscillator whatever the preset.
*/

pub struct Partials {
    harmonics: Vec<(OscNode, f32)>,
    norm: f32,
    temp_buffer: Vec<f32>,
}

impl Partials {
    /// One oscillator per non-zero entry of `gains`; entry `n` plays at
    /// `(n + 1)` times the key frequency.
    pub fn new(waveform: OscillatorWaveform, gains: &[f32]) -> Self {
        let harmonics: Vec<(OscNode, f32)> = gains
            .iter()
            .enumerate()
            .filter(|(_, gain)| **gain > 0.0)
            .map(|(n, &gain)| (OscNode::waveform(waveform).with_ratio((n + 1) as f32), gain))
            .collect();

        let total: f32 = harmonics.iter().map(|(_, gain)| gain).sum();
        Self {
            harmonics,
            norm: if total > 0.0 { 1.0 / total } else { 0.0 },
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }

    pub fn len(&self) -> usize {
        self.harmonics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.harmonics.is_empty()
    }
}

impl GraphNode for Partials {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        out.fill(0.0);
        let frames = &mut self.temp_buffer[..out.len()];

        for (osc, gain) in self.harmonics.iter_mut() {
            osc.render_block(frames, ctx);
            for (o, s) in out.iter_mut().zip(frames.iter()) {
                *o += *s * *gain;
            }
        }

        for o in out.iter_mut() {
            *o *= self.norm;
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        for (osc, _) in self.harmonics.iter_mut() {
            osc.note_on(ctx);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_partial_matches_plain_oscillator() {
        let ctx = RenderCtx::from_freq(48_000.0, 261.63, 1.0);
        let mut partials = Partials::new(OscillatorWaveform::Sine, &[1.0]);
        let mut plain = OscNode::sine();

        let mut a = vec![0.0f32; 256];
        let mut b = vec![0.0f32; 256];
        partials.render_block(&mut a, &ctx);
        plain.render_block(&mut b, &ctx);

        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-6);
        }
    }

    #[test]
    fn stacked_partials_stay_in_range() {
        let ctx = RenderCtx::from_freq(48_000.0, 130.81, 1.0);
        let mut partials = Partials::new(OscillatorWaveform::Sine, &[1.0, 0.6, 0.0, 0.3]);
        assert_eq!(partials.len(), 3);

        let mut buffer = vec![0.0f32; 2048];
        partials.render_block(&mut buffer, &ctx);
        assert!(buffer.iter().all(|s| s.abs() <= 1.0 + 1e-6));
        assert!(buffer.iter().any(|s| s.abs() > 0.3));
    }

    #[test]
    fn all_zero_gains_render_silence() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);
        let mut partials = Partials::new(OscillatorWaveform::Sine, &[0.0, 0.0]);
        assert!(partials.is_empty());

        let mut buffer = vec![1.0f32; 32];
        partials.render_block(&mut buffer, &ctx);
        assert!(buffer.iter().all(|&s| s == 0.0));
    }
}
