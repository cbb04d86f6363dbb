//! Composable building blocks for constructing audio-processing graphs.
//!
//! Graph nodes wrap the low-level DSP primitives with ergonomics needed for
//! instrument design: note events and block-based rendering. The
//! `extensions` module adds fluent helpers so voice graphs can be authored
//! with a clear, chainable API.

/// Multiply two signals together (signal × envelope).
pub mod amplify;
/// Envelope generator node exposing ADSR state.
pub mod envelope;
/// Fluent combinators (`.amplify()`, `.mix()`, etc.).
pub mod extensions;
/// State-variable filter node with fixed or key-tracking cutoff.
pub mod filter;
/// Linear crossfade of two parallel graphs.
pub mod mix;
/// Core traits shared by all graph nodes.
pub mod node;
/// Audio-band oscillators and noise sources.
pub mod oscillator;
/// Harmonic stack of oscillators at integer ratios.
pub mod partials;
/// Serial chaining of two nodes (source → effect).
pub mod through;

pub use extensions::NodeExt;
pub use node::{GraphNode, RenderCtx};
