use crate::{
    dsp::envelope::Envelope,
    graph::node::{GraphNode, RenderCtx},
};

/// Envelope as a graph node: renders its level curve as a control signal,
/// usually fed into `.amplify()`.
pub struct EnvNode {
    env: Envelope,
}

impl EnvNode {
    pub fn new() -> Self {
        Self {
            env: Envelope::new(),
        }
    }

    pub fn adsr(attack: f32, decay: f32, sustain: f32, release: f32) -> Self {
        Self {
            env: Envelope::adsr(attack, decay, sustain, release),
        }
    }

    /// Percussive one-shot: instant attack, falls to silence over `decay`.
    pub fn burst(decay: f32, peak: f32) -> Self {
        Self {
            env: Envelope::adsr(0.001, decay, 0.0, decay).with_peak(peak),
        }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.env
    }
}

impl Default for EnvNode {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphNode for EnvNode {
    fn render_block(&mut self, out: &mut [f32], ctx: &RenderCtx) {
        self.env.render(out, ctx);
    }

    fn note_on(&mut self, ctx: &RenderCtx) {
        self.env.note_on(ctx);
    }

    fn note_off(&mut self, ctx: &RenderCtx) {
        self.env.note_off(ctx);
    }

    fn is_active(&self) -> bool {
        self.env.is_active()
    }
}
