pub mod error;
pub mod bands;
pub mod fft;
pub mod channel;
pub mod synthetic;
pub mod device;
pub mod processor;

pub use error::{AnalysisError, ConfigError, DeviceError};
pub use bands::{bin_index_to_label, FrequencyBandMapper, SpectrumConfig, MAX_FFT_SIZE};
pub use fft::{SpectrumAnalyzer, DEFAULT_GAIN};
pub use channel::{frame_channel, FramePublisher, FrameReceiver};
pub use synthetic::SyntheticSource;
pub use device::DeviceSelector;
pub use processor::{ChunkPipeline, LiveCapture, LiveSource, SyntheticCapture};

use serde::{Deserialize, Serialize};

/// One block of mono samples handed over by an audio source.
#[derive(Debug, Clone, Copy)]
pub struct AudioChunk<'a> {
    samples: &'a [f32],
    silent: bool,
}

impl<'a> AudioChunk<'a> {
    pub fn new(samples: &'a [f32]) -> Self {
        Self {
            samples,
            silent: false,
        }
    }

    /// A chunk the source reports as carrying no input, whatever the buffer holds.
    pub fn silence(samples: &'a [f32]) -> Self {
        Self {
            samples,
            silent: true,
        }
    }

    pub fn samples(&self) -> &'a [f32] {
        self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.silent || self.samples.iter().all(|&s| s == 0.0)
    }
}

/// Magnitude per display band for the most recently analyzed chunk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFrame {
    /// Publish order; 0 for frames that never went through a channel.
    pub sequence: u64,
    magnitudes: Vec<f32>,
}

impl SpectrumFrame {
    pub fn zeroed(band_count: usize) -> Self {
        Self {
            sequence: 0,
            magnitudes: vec![0.0; band_count],
        }
    }

    pub fn from_magnitudes(magnitudes: Vec<f32>) -> Self {
        Self {
            sequence: 0,
            magnitudes,
        }
    }

    pub fn magnitudes(&self) -> &[f32] {
        &self.magnitudes
    }

    pub fn magnitudes_mut(&mut self) -> &mut [f32] {
        &mut self.magnitudes
    }

    pub fn len(&self) -> usize {
        self.magnitudes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magnitudes.is_empty()
    }

    pub fn is_silent(&self) -> bool {
        self.magnitudes.iter().all(|&m| m == 0.0)
    }

    /// Index of the loudest band, first one on ties.
    pub fn peak_band(&self) -> Option<usize> {
        self.magnitudes
            .iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f32)>, (i, &m)| match best {
                Some((_, peak)) if peak >= m => best,
                _ => Some((i, m)),
            })
            .map(|(i, _)| i)
    }
}
