//! Benchmarks for one complete voice per timbre preset.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use saavy_piano::{
    synth::{Timbre, Voice, VoiceId, VoiceSettings},
    KeyRange, NoteName, PianoConfig,
};

use crate::BLOCK_SIZES;

pub fn bench_voices(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/voices");
    let config = PianoConfig::default();
    let Some(note) = KeyRange::THREE_OCTAVES.find(NoteName::A, 4) else {
        return;
    };

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        for timbre in Timbre::ALL {
            let settings = VoiceSettings::resolve(&config, timbre);
            let mut voice = Voice::new(VoiceId(1), note);
            voice.start(&settings, 0.0);

            group.bench_with_input(BenchmarkId::new(timbre.name(), size), &size, |b, _| {
                b.iter(|| {
                    buffer.fill(0.0);
                    voice.render(black_box(&mut buffer), black_box(0.1));
                })
            });
        }
    }

    group.finish();
}
