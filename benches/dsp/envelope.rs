//! Benchmarks for the time-axis ADSR envelope.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_piano::dsp::envelope::Envelope;
use saavy_piano::graph::node::RenderCtx;

use crate::BLOCK_SIZES;

pub fn bench_envelope(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/envelope");
    let ctx = RenderCtx::from_freq(48_000.0, 440.0, 1.0);

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Attack phase (linear ramp)
        let mut env = Envelope::adsr(0.1, 0.1, 0.7, 0.3);
        env.note_on(&ctx);
        group.bench_with_input(BenchmarkId::new("attack", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&ctx));
            })
        });

        // Decay phase (exponential ramp)
        let decay_ctx = ctx.at(0.15);
        group.bench_with_input(BenchmarkId::new("decay", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&decay_ctx));
            })
        });

        // Release phase from a captured level
        let mut env = Envelope::adsr(0.001, 0.001, 0.7, 0.5);
        env.note_on(&ctx);
        env.release_at(0.01, 0.5);
        let release_ctx = ctx.at(0.02);
        group.bench_with_input(BenchmarkId::new("release", size), &size, |b, _| {
            b.iter(|| {
                env.render(black_box(&mut buffer), black_box(&release_ctx));
            })
        });
    }

    group.finish();
}
