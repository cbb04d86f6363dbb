//! Benchmarks for the key-tracking state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_piano::dsp::filter::FilterType;
use saavy_piano::graph::{
    extensions::NodeExt,
    filter::FilterNode,
    node::{GraphNode, RenderCtx},
    oscillator::OscNode,
};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");
    let ctx = RenderCtx::from_freq(48_000.0, 261.63, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        let mut tracking = OscNode::sawtooth().through(FilterNode::tracking(FilterType::LowPass, 6.0));
        group.bench_with_input(BenchmarkId::new("tracking_lowpass", size), &size, |b, _| {
            b.iter(|| {
                tracking.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });

        let mut resonant = OscNode::sawtooth()
            .through(FilterNode::tracking(FilterType::LowPass, 5.0).with_resonance(0.6));
        group.bench_with_input(BenchmarkId::new("resonant", size), &size, |b, _| {
            b.iter(|| {
                resonant.render_block(black_box(&mut buffer), black_box(&ctx));
            })
        });
    }

    group.finish();
}
