use anyhow::Result;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{BandLayout, Renderer};
use crate::audio::SpectrumConfig;

/// A fixed-length recording of rendered frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportData {
    pub config: SpectrumConfig,
    pub gain: f32,
    pub interval_ms: f32,
    pub frame_rate: f32,
    pub frames: Vec<ExportedFrame>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedFrame {
    pub index: usize,
    pub timestamp_ms: f32,
    pub raw: Vec<f32>,
    pub normalized: Vec<f32>,
}

/// Renderer that records every drawn frame and writes them out as JSON.
///
/// Only meaningful when the total frame count is known up front, i.e. a
/// synthetic run of a fixed duration.
pub struct JsonFrameExporter {
    data: ExportData,
    expected_frames: usize,
}

impl JsonFrameExporter {
    pub fn new(
        config: SpectrumConfig,
        gain: f32,
        interval_ms: f32,
        expected_frames: usize,
    ) -> Self {
        Self {
            data: ExportData {
                config,
                gain,
                interval_ms,
                frame_rate: 1000.0 / interval_ms,
                frames: Vec::with_capacity(expected_frames),
            },
            expected_frames,
        }
    }

    pub fn frames(&self) -> &[ExportedFrame] {
        &self.data.frames
    }

    pub fn is_complete(&self) -> bool {
        self.data.frames.len() >= self.expected_frames
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&path, json)?;
        info!(
            "Wrote {} frames ({:.1} fps) to {}",
            self.data.frames.len(),
            self.data.frame_rate,
            path.as_ref().display()
        );
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<ExportData> {
        let json = std::fs::read_to_string(path)?;
        let data: ExportData = serde_json::from_str(&json)?;
        Ok(data)
    }
}

impl Renderer for JsonFrameExporter {
    fn configure(&mut self, layout: &BandLayout) -> Result<()> {
        if layout.band_count != self.data.config.band_count {
            anyhow::bail!(
                "layout has {} bands but the recording is configured for {}",
                layout.band_count,
                self.data.config.band_count
            );
        }
        Ok(())
    }

    fn draw_frame(&mut self, normalized: &[f32], raw: &[f32]) -> Result<()> {
        let index = self.data.frames.len();
        self.data.frames.push(ExportedFrame {
            index,
            timestamp_ms: index as f32 * self.data.interval_ms,
            raw: raw.to_vec(),
            normalized: normalized.to_vec(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{FrequencyBandMapper, SyntheticSource};
    use crate::render::Gradient;

    #[test]
    fn test_records_and_saves_frames() {
        let config = SpectrumConfig::new(44100.0, 0.0, 20000.0, 3);
        let mapper = FrequencyBandMapper::new(config).unwrap();
        let mut exporter = JsonFrameExporter::new(config, 10.0, 40.0, 2);
        exporter.configure(&BandLayout::new(&mapper, Gradient::Plasma)).unwrap();

        exporter.draw_frame(&[0.0, 1.0, 0.5], &[0.1, 0.3, 0.2]).unwrap();
        assert!(!exporter.is_complete());
        exporter.draw_frame(&[0.0, 0.0, 0.0], &[0.0, 0.0, 0.0]).unwrap();
        assert!(exporter.is_complete());

        let path = std::env::temp_dir()
            .join(format!("spectrum-export-{}.json", std::process::id()));
        exporter.save(&path).unwrap();
        let loaded = JsonFrameExporter::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(loaded.config, config);
        assert_eq!(loaded.frame_rate, 25.0);
        assert_eq!(loaded.frames.len(), 2);
        assert_eq!(loaded.frames[1].index, 1);
        assert_eq!(loaded.frames[1].timestamp_ms, 40.0);
        assert_eq!(loaded.frames[0].raw, vec![0.1, 0.3, 0.2]);
    }

    fn record(frames: usize) -> JsonFrameExporter {
        use crate::audio::{
            frame_channel, AudioChunk, ChunkPipeline, SpectrumAnalyzer, DEFAULT_GAIN,
        };
        use crate::render::RenderLoop;

        let config = SpectrumConfig::new(44100.0, 0.0, 20000.0, 100);
        let mapper = FrequencyBandMapper::new(config).unwrap();
        let layout = BandLayout::new(&mapper, Gradient::Plasma);
        let (publisher, receiver) = frame_channel(100);
        let mut pipeline =
            ChunkPipeline::new(SpectrumAnalyzer::new(mapper, DEFAULT_GAIN), publisher);
        let exporter = JsonFrameExporter::new(config, DEFAULT_GAIN, 30.0, frames);
        let mut render_loop = RenderLoop::new(receiver, exporter, &layout).unwrap();

        let mut source = SyntheticSource::for_interval(44100.0, 30.0);
        let mut buffer = Vec::new();
        for _ in 0..frames {
            source.fill_next(&mut buffer);
            pipeline.process(&AudioChunk::new(&buffer));
            render_loop.tick().unwrap();
        }
        assert_eq!(render_loop.fresh_frames(), frames as u64);
        render_loop.into_renderer()
    }

    #[test]
    fn test_synthetic_recording_is_reproducible() {
        let frames = SyntheticSource::chunk_count(0.3, 30.0);
        assert_eq!(frames, 10);

        let first = record(frames);
        let second = record(frames);
        assert!(first.is_complete());
        assert_eq!(first.frames().len(), 10);
        for (a, b) in first.frames().iter().zip(second.frames()) {
            assert_eq!(a.raw, b.raw);
            assert_eq!(a.normalized, b.normalized);
            assert!(a.normalized.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        assert_ne!(first.frames()[0].raw, first.frames()[9].raw);
    }

    #[test]
    fn test_rejects_mismatched_layout() {
        let config = SpectrumConfig::new(44100.0, 0.0, 20000.0, 3);
        let other =
            FrequencyBandMapper::new(SpectrumConfig::new(44100.0, 0.0, 20000.0, 5)).unwrap();
        let mut exporter = JsonFrameExporter::new(config, 10.0, 40.0, 1);
        assert!(exporter.configure(&BandLayout::new(&other, Gradient::Plasma)).is_err());
    }
}
