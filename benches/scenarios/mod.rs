//! Real-world scenario benchmarks.
//!
//! Whole voices as the engine builds them, and the engine itself under a
//! chord and under rapid key churn.

mod engine;
mod voices;

pub use engine::bench_engine;
pub use voices::bench_voices;
