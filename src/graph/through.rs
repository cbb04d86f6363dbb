use crate::graph::node::{GraphNode, RenderCtx};

/*
Serial Signal Chain (Through)
=============================

Through connects two nodes in series: the source renders into the buffer,
then the effect processes that buffer in place.

  Through: [Source] ──→ [Effect] ──→ output

  Amplify: [Signal] ──┬──→ (×) ──→ output
           [Mod]    ──┘

  Mix:     [Dry] ────┬──→ (+) ──→ output
           [Wet] ────┘

The voice chain is the classic one:

    tone (+ partials, + hammer noise)
        .through(FilterNode::tracking(FilterType::LowPass, cutoff_multiplier))

with the amplitude envelope applied by the voice itself.
*/

pub struct Through<S, F> {
    source: S,
    filter: F,
}

impl<S, F> Through<S, F> {
    pub fn new(source: S, filter: F) -> Self {
        Self { source, filter }
    }
}

impl<S: GraphNode, F: GraphNode> GraphNode for Through<S, F> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source.render_block(out, ctx);
        self.filter.render_block(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source.note_on(ctx);
        self.filter.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source.note_off(ctx);
        self.filter.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.source.is_active() || self.filter.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dsp::filter::FilterType,
        graph::{extensions::NodeExt, filter::FilterNode, oscillator::OscNode},
    };

    #[test]
    fn renders_source_then_filter() {
        let ctx = RenderCtx::from_freq(48_000.0, 4_000.0, 1.0);
        let mut dry = OscNode::sawtooth();
        let mut wet = OscNode::sawtooth().through(FilterNode::tracking(FilterType::LowPass, 0.1));

        let mut dry_buf = vec![0.0f32; 512];
        let mut wet_buf = vec![0.0f32; 512];
        dry.render_block(&mut dry_buf, &ctx);
        wet.render_block(&mut wet_buf, &ctx);

        let energy = |b: &[f32]| b.iter().map(|s| s * s).sum::<f32>();
        assert!(energy(&wet_buf) < energy(&dry_buf));
        assert!(wet_buf.iter().all(|s| s.is_finite()));
    }
}
