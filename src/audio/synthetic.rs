use std::f64::consts::PI;

/// Deterministic test signal: a three-harmonic tone whose pitch wanders slowly
/// from chunk to chunk. Stands in for a microphone when recording or testing.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    sample_rate: f32,
    frames: usize,
    call_count: u64,
}

impl SyntheticSource {
    pub fn new(sample_rate: f32, frames: usize) -> Self {
        Self {
            sample_rate,
            frames,
            call_count: 0,
        }
    }

    /// Source whose chunks cover one render interval each.
    pub fn for_interval(sample_rate: f32, interval_ms: f32) -> Self {
        Self::new(sample_rate, Self::frames_per_interval(sample_rate, interval_ms))
    }

    pub fn frames_per_interval(sample_rate: f32, interval_ms: f32) -> usize {
        (sample_rate as f64 * interval_ms as f64 / 1000.0).floor().max(0.0) as usize
    }

    /// How many chunks a recording of `duration_s` needs at one chunk per interval.
    pub fn chunk_count(duration_s: f32, interval_ms: f32) -> usize {
        (duration_s as f64 * 1000.0 / interval_ms as f64).floor().max(0.0) as usize
    }

    /// Fundamental frequency used for chunk number `n`.
    pub fn frequency_at(n: u64) -> f64 {
        let n = n as f64;
        440.0 + 200.0 * (0.05 * n).sin() + 200.0 * (0.02 * n).sin()
    }

    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Chunks generated so far.
    pub fn call_count(&self) -> u64 {
        self.call_count
    }

    /// Fill `buffer` with the next chunk, reusing its allocation.
    pub fn fill_next(&mut self, buffer: &mut Vec<f32>) {
        let freq = Self::frequency_at(self.call_count);
        let sample_rate = self.sample_rate as f64;

        buffer.clear();
        buffer.extend((0..self.frames).map(|i| {
            let phase = 2.0 * PI * freq * (i as f64 / sample_rate);
            let wave = 0.3 * phase.sin() + 0.15 * (2.0 * phase).sin() + 0.1 * (3.0 * phase).sin();
            wave as f32
        }));

        self.call_count += 1;
    }

    pub fn next_chunk(&mut self) -> Vec<f32> {
        let mut buffer = Vec::with_capacity(self.frames);
        self.fill_next(&mut buffer);
        buffer
    }
}

impl Iterator for SyntheticSource {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Self::Item> {
        Some(self.next_chunk())
    }
}
