pub mod gradient;
pub mod terminal;
pub mod export;

pub use gradient::Gradient;
pub use terminal::TerminalRenderer;
pub use export::{ExportData, ExportedFrame, JsonFrameExporter};

use anyhow::Result;

use crate::audio::{FrameReceiver, FrequencyBandMapper};

/// Keeps normalization finite when every band holds the same value.
pub const NORMALIZE_EPSILON: f32 = 1e-6;

/// What a renderer needs to lay out its axis and colours.
#[derive(Debug, Clone)]
pub struct BandLayout {
    pub band_count: usize,
    pub low_hz: f32,
    pub delta_f: f32,
    pub gradient: Gradient,
    /// Band index and label for each axis tick.
    pub ticks: Vec<(usize, String)>,
}

impl BandLayout {
    pub fn new(mapper: &FrequencyBandMapper, gradient: Gradient) -> Self {
        Self {
            band_count: mapper.band_count(),
            low_hz: mapper.config().low_hz,
            delta_f: mapper.delta_f(),
            gradient,
            ticks: mapper.tick_marks(),
        }
    }
}

/// Presentation collaborator. Owns everything visual; the core only hands it frames.
pub trait Renderer {
    fn configure(&mut self, layout: &BandLayout) -> Result<()>;

    /// `normalized` is `raw` rescaled to 0..1 within the frame.
    fn draw_frame(&mut self, normalized: &[f32], raw: &[f32]) -> Result<()>;
}

/// Rescale `raw` into `out` as `(v - min) / (max - min + epsilon)`.
pub fn normalize_bands(raw: &[f32], out: &mut Vec<f32>) {
    out.clear();
    let Some(min) = raw.iter().copied().reduce(f32::min) else {
        return;
    };
    let max = raw.iter().copied().fold(min, f32::max);
    let span = max - min + NORMALIZE_EPSILON;

    out.extend(raw.iter().map(|&v| (v - min) / span));
}

/// Timer-driven consumer: each tick shows the freshest frame available.
pub struct RenderLoop<R: Renderer> {
    receiver: FrameReceiver,
    renderer: R,
    normalized: Vec<f32>,
    ticks: u64,
    fresh_frames: u64,
    last_sequence: u64,
}

impl<R: Renderer> RenderLoop<R> {
    pub fn new(receiver: FrameReceiver, mut renderer: R, layout: &BandLayout) -> Result<Self> {
        renderer.configure(layout)?;
        Ok(Self {
            receiver,
            renderer,
            normalized: Vec::with_capacity(layout.band_count),
            ticks: 0,
            fresh_frames: 0,
            last_sequence: 0,
        })
    }

    pub fn tick(&mut self) -> Result<()> {
        let frame = self.receiver.take_latest_or_fallback();
        if frame.sequence != self.last_sequence {
            self.fresh_frames += 1;
            self.last_sequence = frame.sequence;
        }
        self.ticks += 1;

        normalize_bands(frame.magnitudes(), &mut self.normalized);
        self.renderer.draw_frame(&self.normalized, frame.magnitudes())
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks that showed a frame not shown before.
    pub fn fresh_frames(&self) -> u64 {
        self.fresh_frames
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn into_renderer(self) -> R {
        self.renderer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{frame_channel, SpectrumConfig, SpectrumFrame};

    #[derive(Default)]
    struct Recorder {
        layout: Option<BandLayout>,
        frames: Vec<(Vec<f32>, Vec<f32>)>,
    }

    impl Renderer for Recorder {
        fn configure(&mut self, layout: &BandLayout) -> Result<()> {
            self.layout = Some(layout.clone());
            Ok(())
        }

        fn draw_frame(&mut self, normalized: &[f32], raw: &[f32]) -> Result<()> {
            self.frames.push((normalized.to_vec(), raw.to_vec()));
            Ok(())
        }
    }

    fn layout(bands: usize) -> BandLayout {
        let mapper =
            FrequencyBandMapper::new(SpectrumConfig::new(44100.0, 0.0, 20000.0, bands)).unwrap();
        BandLayout::new(&mapper, Gradient::Plasma)
    }

    #[test]
    fn test_normalize_spans_unit_range() {
        let mut out = Vec::new();
        normalize_bands(&[1.0, 3.0, 2.0], &mut out);
        assert_eq!(out[0], 0.0);
        assert!((out[1] - 1.0).abs() < 1e-5);
        assert!((out[2] - 0.5).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_flat_frame_is_finite() {
        let mut out = Vec::new();
        normalize_bands(&[0.0; 8], &mut out);
        assert_eq!(out, vec![0.0; 8]);

        normalize_bands(&[0.7; 5], &mut out);
        assert!(out.iter().all(|v| v.is_finite() && *v == 0.0));

        normalize_bands(&[], &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn test_render_loop_falls_back_between_publishes() {
        let (mut publisher, receiver) = frame_channel(4);
        let mut render_loop = RenderLoop::new(receiver, Recorder::default(), &layout(4)).unwrap();
        assert_eq!(render_loop.renderer().layout.as_ref().unwrap().band_count, 4);

        render_loop.tick().unwrap();
        publisher.publish(SpectrumFrame::from_magnitudes(vec![0.0, 1.0, 2.0, 4.0]));
        render_loop.tick().unwrap();
        render_loop.tick().unwrap();

        assert_eq!(render_loop.ticks(), 3);
        assert_eq!(render_loop.fresh_frames(), 1);

        let recorder = render_loop.into_renderer();
        assert_eq!(recorder.frames[0].1, vec![0.0; 4]);
        assert_eq!(recorder.frames[1].1, vec![0.0, 1.0, 2.0, 4.0]);
        assert_eq!(recorder.frames[1], recorder.frames[2]);
        assert!((recorder.frames[1].0[3] - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_layout_carries_ticks() {
        let layout = layout(100);
        assert_eq!(layout.delta_f, 200.0);
        assert_eq!(layout.ticks.len(), 4);
    }
}
