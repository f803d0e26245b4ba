use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spectrum_visualizer::audio::{
    AudioChunk, FrequencyBandMapper, SpectrumAnalyzer, SpectrumConfig, SpectrumFrame,
    SyntheticSource, DEFAULT_GAIN,
};

fn analyze_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("analyze_into");

    for &(label, sample_rate, high_hz, bands) in &[
        ("default_100_bands", 44100.0, 20000.0, 100),
        ("fine_400_bands", 48000.0, 8000.0, 400),
    ] {
        let mapper =
            FrequencyBandMapper::new(SpectrumConfig::new(sample_rate, 0.0, high_hz, bands))
                .unwrap();
        let mut analyzer = SpectrumAnalyzer::new(mapper, DEFAULT_GAIN);
        let chunk = SyntheticSource::for_interval(sample_rate, 30.0).next_chunk();
        let mut frame = SpectrumFrame::zeroed(bands);

        group.bench_function(label, |b| {
            b.iter(|| {
                analyzer
                    .analyze_into(black_box(&AudioChunk::new(&chunk)), &mut frame)
                    .unwrap();
            })
        });
    }

    group.finish();
}

criterion_group!(benches, analyze_benchmark);
criterion_main!(benches);
