//! Benchmarks for the engine: a sustained chord and pool churn.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_piano::{InputId, KeyRange, PianoConfig, PianoEngine, Timbre};

use crate::BLOCK_SIZES;

pub fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/engine");
    let range = KeyRange::THREE_OCTAVES;
    let notes = range.notes();

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // Ten held keys, the polyphony cap, on the richest preset
        let mut chord = PianoEngine::new(PianoConfig::default().with_timbre(Timbre::Grand), ());
        for note in notes.iter().step_by(3).take(10) {
            chord.note_on(InputId::mouse(note), *note);
        }
        group.bench_with_input(BenchmarkId::new("chord_10", size), &size, |b, _| {
            b.iter(|| {
                chord.render_block(black_box(&mut buffer));
            })
        });

        // Press and release a new key every block: eviction, tails, teardown
        let mut churn = PianoEngine::new(PianoConfig::default(), ());
        let mut key = 0usize;
        group.bench_with_input(BenchmarkId::new("churn", size), &size, |b, _| {
            b.iter(|| {
                let note = notes[key % notes.len()];
                let id = InputId::mouse(&note);
                churn.note_on(id.clone(), note);
                churn.render_block(black_box(&mut buffer));
                churn.note_off(&id);
                key += 7;
            })
        });
    }

    group.finish();
}
