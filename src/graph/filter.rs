use crate::{
    dsp::filter::{FilterType, SVFilter},
    graph::node::{GraphNode, RenderCtx},
};

/*
State-Variable Filter (SVF)
===========================

Every voice runs through one filter that rounds off the top of its spectrum.
Piano strings lose their upper harmonics quickly, so a lowpass that sits a few
multiples above the fundamental sounds more like a struck string than a bare
oscillator does.

Cutoff Modes:
-------------

Fixed:     Cutoff in Hz, the same for every key.
Tracking:  Cutoff = key frequency × multiplier. Low keys get a dark filter,
           high keys a bright one, and every key keeps the same number of
           audible harmonics. This is what the timbre presets use.

Resonance:
----------
  0.0:  No emphasis (gentle rolloff)
  0.5:  Slight peak at the cutoff (adds "body")
  0.9+: Strong peak, ringing; clamped below self-oscillation

Example usage:
  // Mellow piano: keep about the first four harmonics
  let tone = OscNode::sine().through(FilterNode::tracking(FilterType::LowPass, 4.0));

  // Fixed 800 Hz lowpass
  let dark = OscNode::sawtooth().through(FilterNode::lowpass(800.0));
*/

#[derive(Clone, Copy, Debug, PartialEq)]
enum Cutoff {
    Fixed(f32),
    Tracking(f32),
}

pub struct FilterNode {
    filter: SVFilter,
    cutoff: Cutoff,
}

impl FilterNode {
    pub fn lowpass(cutoff_hz: f32) -> Self {
        Self {
            filter: SVFilter::lowpass(cutoff_hz),
            cutoff: Cutoff::Fixed(cutoff_hz),
        }
    }

    /// Cutoff follows the key: `ctx.frequency * multiplier`.
    pub fn tracking(filter_type: FilterType, multiplier: f32) -> Self {
        Self {
            filter: SVFilter::new(filter_type),
            cutoff: Cutoff::Tracking(multiplier),
        }
    }

    pub fn with_resonance(mut self, resonance: f32) -> Self {
        self.filter.set_resonance(resonance);
        self
    }

    /// Cutoff in Hz this node would use for `ctx`.
    pub fn cutoff_for(&self, ctx: &RenderCtx) -> f32 {
        match self.cutoff {
            Cutoff::Fixed(hz) => hz,
            Cutoff::Tracking(multiplier) => ctx.frequency * multiplier,
        }
    }
}

impl GraphNode for FilterNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        let cutoff = self.cutoff_for(ctx).clamp(20.0, 20_000.0);
        self.filter.set_cutoff(cutoff);
        self.filter.render(out, ctx);
    }

    fn note_on(&mut self, _ctx: &RenderCtx) {
        self.filter.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracking_cutoff_follows_key() {
        let node = FilterNode::tracking(FilterType::LowPass, 3.0);
        let low = RenderCtx::from_freq(48_000.0, 110.0, 1.0);
        let high = RenderCtx::from_freq(48_000.0, 880.0, 1.0);

        assert!((node.cutoff_for(&low) - 330.0).abs() < 1e-3);
        assert!((node.cutoff_for(&high) - 2_640.0).abs() < 1e-3);
    }

    #[test]
    fn fixed_cutoff_ignores_key() {
        let node = FilterNode::lowpass(800.0);
        let ctx = RenderCtx::from_freq(48_000.0, 1_760.0, 1.0);
        assert_eq!(node.cutoff_for(&ctx), 800.0);
    }
}
