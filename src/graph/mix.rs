use crate::{
    graph::node::{GraphNode, RenderCtx},
    MAX_BLOCK_SIZE,
};

/*
Parallel Signal Mixing
======================

Mix combines two signals with a linear crossfade:

    output = (A × (1 - balance)) + (B × balance)

  balance = 0.0 → 100% A
  balance = 0.5 → 50% A, 50% B
  balance = 1.0 → 100% B

The voices use it to lay a short noise "hammer" burst over the pitched tone:

  tone.mix(OscNode::noise().amplify(EnvNode::burst(0.03, 1.0)), 0.12)

Both sources receive note_on/note_off. Gate both with one envelope by
amplifying AFTER mixing:

  osc1.mix(osc2, 0.5).amplify(env)  // ✓ Envelope gates both

  osc1.amplify(env).mix(osc2, 0.5)  // ✗ Only osc1 is gated, osc2 drones
*/

pub struct Mix<A, B> {
    pub source_a: A,
    pub source_b: B,
    pub balance: f32, // 0.0 = all A, 1.0 = all B, 0.5 = equal mix
    temp_buffer: Vec<f32>,
}

impl<A, B> Mix<A, B> {
    pub fn new(source_a: A, source_b: B, balance: f32) -> Self {
        Mix {
            source_a,
            source_b,
            balance: balance.clamp(0.0, 1.0),
            temp_buffer: vec![0.0; MAX_BLOCK_SIZE],
        }
    }
}

impl<S: GraphNode, M: GraphNode> GraphNode for Mix<S, M> {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.source_a.render_block(out, ctx);

        let frames = &mut self.temp_buffer[..out.len()];
        frames.fill(0.0);

        self.source_b.render_block(frames, ctx);

        let weight_a = 1.0 - self.balance;
        let weight_b = self.balance;
        for (o, b) in out.iter_mut().zip(frames.iter()) {
            *o = (*o * weight_a) + (*b * weight_b);
        }
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.source_a.note_on(ctx);
        self.source_b.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.source_a.note_off(ctx);
        self.source_b.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.source_a.is_active() || self.source_b.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{extensions::NodeExt, oscillator::OscNode};

    #[test]
    fn test_mix_balance_extremes() {
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        let mut all_a = OscNode::sine().mix(OscNode::square(), 0.0);
        let mut reference = OscNode::sine();
        let mut mixed = vec![0.0f32; 64];
        let mut expected = vec![0.0f32; 64];
        all_a.render_block(&mut mixed, &ctx);
        reference.render_block(&mut expected, &ctx);
        assert_eq!(mixed, expected);

        let mut all_b = OscNode::sine().mix(OscNode::square(), 1.0);
        all_b.render_block(&mut mixed, &ctx);
        assert!(mixed.iter().all(|s| s.abs() == 1.0));
    }

    #[test]
    fn test_mix_output_range() {
        let mut mixed = OscNode::sine().mix(OscNode::sawtooth(), 0.5);

        let mut buffer = vec![0.0; 1024];
        let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

        mixed.render_block(&mut buffer, &ctx);

        for &sample in &buffer {
            assert!(sample.abs() <= 1.0, "Mixed sample out of range: {}", sample);
            assert!(sample.is_finite(), "Sample should be finite");
        }
    }
}
