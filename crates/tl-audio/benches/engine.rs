use criterion::{Criterion, black_box, criterion_group, criterion_main};
use tl_audio::engine::AnalysisEngine;
use tl_audio::fft::ByteSpectrum;
use tl_core::config::SpectrumConfig;

fn bench_analyze(c: &mut Criterion) {
    let mut engine = AnalysisEngine::new();
    if engine.configure(1024, 44100).is_err() {
        return;
    }
    let quiet = vec![12u8; 1024];
    let loud = vec![210u8; 1024];
    let time = vec![128u8; 1024];
    let mut tick = 0u32;

    c.bench_function("engine_analyze_1024", |b| {
        b.iter(|| {
            let freq = if tick % 40 == 0 { &loud } else { &quiet };
            let ts = f64::from(tick) * 16.0;
            tick = tick.wrapping_add(1);
            let is_beat = engine
                .analyze(black_box(freq), black_box(&time), ts)
                .is_ok_and(|r| r.is_beat);
            black_box(is_beat)
        });
    });
}

fn bench_spectrum(c: &mut Criterion) {
    let Ok(mut spectrum) = ByteSpectrum::new(&SpectrumConfig::default()) else {
        return;
    };
    let samples: Vec<f32> = (0..2048)
        .map(|i| (i as f32 * 0.05).sin() * 0.5)
        .collect();
    let mut freq = vec![0u8; 1024];
    let mut time = vec![0u8; 1024];

    c.bench_function("byte_spectrum_2048", |b| {
        b.iter(|| {
            let ok = spectrum
                .process(black_box(&samples), &mut freq, &mut time)
                .is_ok();
            black_box(ok)
        });
    });
}

criterion_group!(benches, bench_analyze, bench_spectrum);
criterion_main!(benches);
