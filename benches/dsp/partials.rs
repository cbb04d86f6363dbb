//! Benchmarks for harmonic partial stacks.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_piano::dsp::oscillator::OscillatorWaveform;
use saavy_piano::graph::{
    node::{GraphNode, RenderCtx},
    partials::Partials,
};

use crate::BLOCK_SIZES;

pub fn bench_partials(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/partials");
    let ctx = RenderCtx::from_freq(48_000.0, 130.81, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for count in [1usize, 4, 8] {
            let gains: Vec<f32> = (0..count).map(|n| 1.0 / (n + 1) as f32).collect();
            let mut partials = Partials::new(OscillatorWaveform::Sine, &gains);
            group.bench_with_input(
                BenchmarkId::new(format!("sine_x{count}"), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        partials.render_block(black_box(&mut buffer), black_box(&ctx));
                    })
                },
            );
        }
    }

    group.finish();
}
