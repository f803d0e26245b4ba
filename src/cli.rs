use clap::Parser;
use std::path::PathBuf;

use crate::audio::{ConfigError, DeviceSelector, SpectrumConfig, DEFAULT_GAIN};
use crate::render::Gradient;

/// Sample rate used by the synthetic source when none is given.
pub const SYNTHETIC_SAMPLE_RATE: f32 = 44100.0;

/// Show a live microphone frequency visualizer.
#[derive(Parser, Debug, Clone)]
#[command(name = "spectrum-visualizer")]
#[command(about = "Live audio spectrum analyzer for the terminal")]
pub struct Args {
    /// Show list of audio devices and exit
    #[arg(short = 'l', long)]
    pub list_devices: bool,

    /// Input device: numeric ID or substring (default: system default input)
    #[arg(short, long)]
    pub device: Option<DeviceSelector>,

    /// Sampling rate of audio device (default: the device's native rate)
    #[arg(short, long)]
    pub samplerate: Option<f32>,

    /// Interval in which the display is updated, in milliseconds
    #[arg(short, long, default_value_t = 30.0)]
    pub interval: f32,

    /// Frequency range in Hz
    #[arg(
        short,
        long,
        num_args = 2,
        value_names = ["LOW", "HIGH"],
        default_values_t = [0.0, 20000.0]
    )]
    pub range: Vec<f32>,

    /// Initial gain factor
    #[arg(short, long, default_value_t = DEFAULT_GAIN)]
    pub gain: f32,

    /// Number of frequency bands represented
    #[arg(short, long, default_value_t = 100)]
    pub bands: usize,

    /// Color gradient used for frequency bands
    #[arg(long, value_enum, default_value_t = Gradient::Plasma)]
    pub cmap: Gradient,

    /// Write the rendered frames to a JSON file and exit
    #[arg(short, long, requires = "test_mode")]
    pub output: Option<PathBuf>,

    /// Recording duration in seconds for --output
    #[arg(long, default_value_t = 10.0)]
    pub duration: f32,

    /// Use synthetic sine wave audio instead of the microphone
    #[arg(long)]
    pub test_mode: bool,
}

impl Args {
    pub fn low_hz(&self) -> f32 {
        self.range[0]
    }

    pub fn high_hz(&self) -> f32 {
        self.range[1]
    }

    /// Check everything that does not depend on the device, before touching it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bands == 0 {
            return Err(ConfigError::NoBands);
        }
        if self.high_hz() <= self.low_hz() || self.high_hz().is_nan() {
            return Err(ConfigError::EmptyRange {
                low_hz: self.low_hz(),
                high_hz: self.high_hz(),
            });
        }
        if !(self.low_hz() >= 0.0) {
            return Err(ConfigError::InvalidLowFrequency(self.low_hz()));
        }
        if !(self.interval.is_finite() && self.interval > 0.0) {
            return Err(ConfigError::InvalidInterval(self.interval));
        }
        if !(self.gain.is_finite() && self.gain > 0.0) {
            return Err(ConfigError::InvalidGain(self.gain));
        }
        if let Some(rate) = self.samplerate {
            if !(rate.is_finite() && rate >= 1.0) {
                return Err(ConfigError::InvalidSampleRate(rate));
            }
        }
        if self.output.is_some() && !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConfigError::InvalidDuration(self.duration));
        }
        Ok(())
    }

    pub fn spectrum_config(&self, sample_rate: f32) -> SpectrumConfig {
        SpectrumConfig::new(sample_rate, self.low_hz(), self.high_hz(), self.bands)
    }
}
