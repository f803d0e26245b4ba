use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

use super::{AnalysisError, AudioChunk, FrequencyBandMapper, SpectrumFrame};

pub const DEFAULT_GAIN: f32 = 10.0;

/// Turns raw sample chunks into per-band magnitude frames.
///
/// All transform buffers are allocated up front, so `analyze_into` is safe to
/// call from an audio callback.
pub struct SpectrumAnalyzer {
    mapper: FrequencyBandMapper,
    gain: f32,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(mapper: FrequencyBandMapper, gain: f32) -> Self {
        let fft_size = mapper.fft_size();
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        let mut analyzer = Self {
            mapper,
            gain: DEFAULT_GAIN,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
        };
        analyzer.set_gain(gain);
        analyzer
    }

    pub fn mapper(&self) -> &FrequencyBandMapper {
        &self.mapper
    }

    pub fn band_count(&self) -> usize {
        self.mapper.band_count()
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Negative or NaN gains collapse to 0 so magnitudes stay non-negative.
    pub fn set_gain(&mut self, gain: f32) {
        self.gain = gain.max(0.0);
    }

    pub fn analyze(&mut self, chunk: &AudioChunk) -> Result<SpectrumFrame, AnalysisError> {
        let mut frame = SpectrumFrame::zeroed(self.band_count());
        self.analyze_into(chunk, &mut frame)?;
        Ok(frame)
    }

    /// Analyze `chunk` into an existing frame, resizing it to the band count if needed.
    pub fn analyze_into(
        &mut self,
        chunk: &AudioChunk,
        frame: &mut SpectrumFrame,
    ) -> Result<(), AnalysisError> {
        if chunk.is_empty() {
            return Err(AnalysisError::EmptyChunk);
        }

        let band_count = self.band_count();
        if frame.len() != band_count {
            *frame = SpectrumFrame::zeroed(band_count);
        }
        let out = frame.magnitudes_mut();

        if chunk.is_silent() {
            out.fill(0.0);
            return Ok(());
        }

        self.compute_fft(chunk.samples());

        let scale = self.gain / self.mapper.fft_size() as f32;
        let bins = &self.buffer[self.mapper.bin_range()];
        for (i, magnitude) in out.iter_mut().enumerate() {
            *magnitude = bins.get(i).map_or(0.0, |c| c.norm() * scale);
        }

        Ok(())
    }

    fn compute_fft(&mut self, samples: &[f32]) {
        let len = self.buffer.len().min(samples.len());

        for (slot, &sample) in self.buffer.iter_mut().zip(&samples[..len]) {
            *slot = Complex::new(sample, 0.0);
        }
        self.buffer[len..].fill(Complex::new(0.0, 0.0));

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::SpectrumConfig;
    use std::f32::consts::PI;

    fn analyzer(sample_rate: f32, low: f32, high: f32, bands: usize) -> SpectrumAnalyzer {
        let mapper =
            FrequencyBandMapper::new(SpectrumConfig::new(sample_rate, low, high, bands)).unwrap();
        SpectrumAnalyzer::new(mapper, DEFAULT_GAIN)
    }

    fn tone(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    #[test]
    fn test_pure_tone_peaks_at_expected_band() {
        let mut analyzer = analyzer(44100.0, 0.0, 20000.0, 100);
        let samples = tone(1000.0, 44100.0, 1470);

        let frame = analyzer.analyze(&AudioChunk::new(&samples)).unwrap();
        assert_eq!(frame.len(), 100);

        let peak = frame.peak_band().unwrap();
        assert!((peak as i32 - 5).abs() <= 1, "peak at band {}", peak);
        assert!(frame.magnitudes().iter().all(|&m| m >= 0.0 && m.is_finite()));
    }

    #[test]
    fn test_silent_chunk_yields_zero_frame() {
        let mut analyzer = analyzer(44100.0, 0.0, 20000.0, 100);
        let silence = vec![0.0f32; 512];

        let frame = analyzer.analyze(&AudioChunk::new(&silence)).unwrap();
        assert_eq!(frame.len(), 100);
        assert!(frame.is_silent());

        let noisy = tone(440.0, 44100.0, 512);
        let frame = analyzer.analyze(&AudioChunk::silence(&noisy)).unwrap();
        assert!(frame.is_silent());
    }

    #[test]
    fn test_zero_amplitude_with_large_fft() {
        // 1024-point transform: 48 kHz over 46.875 Hz bands.
        let mut analyzer = analyzer(48000.0, 0.0, 4687.5, 100);
        assert_eq!(analyzer.mapper().fft_size(), 1024);

        let frame = analyzer.analyze(&AudioChunk::new(&[0.0; 1024])).unwrap();
        assert!(frame.magnitudes().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_empty_chunk_is_rejected() {
        let mut analyzer = analyzer(44100.0, 0.0, 20000.0, 100);
        assert_eq!(
            analyzer.analyze(&AudioChunk::new(&[])).unwrap_err(),
            AnalysisError::EmptyChunk
        );
    }

    #[test]
    fn test_analysis_is_deterministic() {
        let mut a = analyzer(44100.0, 0.0, 20000.0, 100);
        let mut b = analyzer(44100.0, 0.0, 20000.0, 100);
        let samples = tone(3210.0, 44100.0, 900);
        let other = tone(150.0, 44100.0, 900);

        let first = a.analyze(&AudioChunk::new(&samples)).unwrap();
        a.analyze(&AudioChunk::new(&other)).unwrap();
        let again = a.analyze(&AudioChunk::new(&samples)).unwrap();
        let fresh = b.analyze(&AudioChunk::new(&samples)).unwrap();

        assert_eq!(first, again);
        assert_eq!(first, fresh);
    }

    #[test]
    fn test_short_chunk_is_zero_padded() {
        let mut analyzer = analyzer(44100.0, 0.0, 20000.0, 100);
        let samples = tone(1000.0, 44100.0, 50);

        let frame = analyzer.analyze(&AudioChunk::new(&samples)).unwrap();
        assert!(!frame.is_silent());
    }

    #[test]
    fn test_missing_bins_are_zero_padded() {
        let mut analyzer = analyzer(8000.0, 0.0, 8000.0, 80);
        let samples = tone(3000.0, 8000.0, 400);

        let frame = analyzer.analyze(&AudioChunk::new(&samples)).unwrap();
        assert_eq!(frame.len(), 80);
        assert!(frame.magnitudes()[41..].iter().all(|&m| m == 0.0));
        assert!(frame.magnitudes()[..41].iter().any(|&m| m > 0.0));
    }

    #[test]
    fn test_range_above_nyquist_yields_zero_frame() {
        let mut analyzer = analyzer(8000.0, 10000.0, 20000.0, 10);
        assert_eq!(analyzer.mapper().fft_size(), 8);
        let samples = tone(1000.0, 8000.0, 256);

        let frame = analyzer.analyze(&AudioChunk::new(&samples)).unwrap();
        assert_eq!(frame.len(), 10);
        assert!(frame.is_silent());
    }

    #[test]
    fn test_gain_scales_linearly() {
        let samples = tone(2000.0, 44100.0, 441);
        let mut unit = analyzer(44100.0, 0.0, 20000.0, 100);
        unit.set_gain(1.0);
        let mut boosted = analyzer(44100.0, 0.0, 20000.0, 100);
        boosted.set_gain(4.0);

        let a = unit.analyze(&AudioChunk::new(&samples)).unwrap();
        let b = boosted.analyze(&AudioChunk::new(&samples)).unwrap();
        for (x, y) in a.magnitudes().iter().zip(b.magnitudes()) {
            assert!((x * 4.0 - y).abs() <= 1e-5 * y.max(1.0));
        }
    }

    #[test]
    fn test_negative_gain_never_goes_negative() {
        let mut analyzer = analyzer(44100.0, 0.0, 20000.0, 100);
        analyzer.set_gain(-3.0);
        assert_eq!(analyzer.gain(), 0.0);
        analyzer.set_gain(f32::NAN);
        assert_eq!(analyzer.gain(), 0.0);

        let samples = tone(1000.0, 44100.0, 441);
        let frame = analyzer.analyze(&AudioChunk::new(&samples)).unwrap();
        assert!(frame.magnitudes().iter().all(|&m| m == 0.0));
    }

    #[test]
    fn test_analyze_into_resizes_foreign_frame() {
        let mut analyzer = analyzer(44100.0, 0.0, 20000.0, 100);
        let mut frame = SpectrumFrame::zeroed(3);
        analyzer
            .analyze_into(&AudioChunk::new(&tone(500.0, 44100.0, 300)), &mut frame)
            .unwrap();
        assert_eq!(frame.len(), 100);
    }
}
