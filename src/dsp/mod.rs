//! Low-level DSP primitives used by the higher level graph nodes.
//!
//! These stay focused on the signal-processing math; graph nodes layer note
//! events and composition on top, and voices layer lifecycle on top of that.

/// Attack/decay/sustain/release envelope evaluated on a time axis.
pub mod envelope;
/// State-variable filter implementation with multiple responses.
pub mod filter;
/// Oscillator waveforms and noise sources.
pub mod oscillator;

pub use envelope::{Envelope, EnvelopeState};
pub use filter::{FilterType, SVFilter};
pub use oscillator::{OscillatorBlock, OscillatorWaveform};
