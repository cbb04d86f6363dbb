//! Benchmarks for low-level DSP primitives.

mod envelope;
mod filter;
mod partials;

pub use envelope::bench_envelope;
pub use filter::bench_filter;
pub use partials::bench_partials;
