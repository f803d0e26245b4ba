use log::warn;
use serde::{Deserialize, Serialize};
use std::ops::Range;

use super::ConfigError;

/// Largest transform the mapper will plan. Narrower bands than this allows are
/// rejected instead of allocating gigabytes of FFT buffers.
pub const MAX_FFT_SIZE: usize = 1 << 22;

/// Analysis settings fixed at startup, once the device sample rate is known.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpectrumConfig {
    pub sample_rate: f32,
    pub low_hz: f32,
    pub high_hz: f32,
    pub band_count: usize,
}

impl SpectrumConfig {
    pub fn new(sample_rate: f32, low_hz: f32, high_hz: f32, band_count: usize) -> Self {
        Self {
            sample_rate,
            low_hz,
            high_hz,
            band_count,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band_count == 0 {
            return Err(ConfigError::NoBands);
        }
        if !(self.sample_rate.is_finite() && self.sample_rate >= 1.0) {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !(self.low_hz.is_finite() && self.low_hz >= 0.0) {
            return Err(ConfigError::InvalidLowFrequency(self.low_hz));
        }
        if !(self.high_hz.is_finite() && self.high_hz > self.low_hz) {
            return Err(ConfigError::EmptyRange {
                low_hz: self.low_hz,
                high_hz: self.high_hz,
            });
        }
        Ok(())
    }
}

/// Maps FFT bins onto display bands.
///
/// Each band is `delta_f` Hz wide. The transform size is chosen so that one bin
/// covers (at most) one band, which makes band `b` simply bin `low_bin + b`.
/// When the sample rate is too low for `high_hz`, the trailing bands have no
/// backing bin and are reported as zero.
#[derive(Debug, Clone)]
pub struct FrequencyBandMapper {
    config: SpectrumConfig,
    delta_f: f64,
    fft_size: usize,
    low_bin: usize,
}

impl FrequencyBandMapper {
    pub fn new(config: SpectrumConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let delta_f = (config.high_hz as f64 - config.low_hz as f64) / config.band_count as f64;
        let required = (config.sample_rate as f64 / delta_f).ceil().max(1.0);
        if required > MAX_FFT_SIZE as f64 {
            return Err(ConfigError::FftTooLarge {
                required,
                max: MAX_FFT_SIZE,
            });
        }
        let fft_size = required as usize;
        let low_bin = (config.low_hz as f64 / delta_f).floor() as usize;

        let mapper = Self {
            config,
            delta_f,
            fft_size,
            low_bin,
        };

        let truncated = mapper.truncated_bands();
        if truncated > 0 {
            warn!(
                "Sample rate {} Hz cannot resolve up to {} Hz: \
                 the top {} of {} bands will stay empty",
                config.sample_rate,
                config.high_hz,
                truncated,
                config.band_count
            );
        }

        Ok(mapper)
    }

    pub fn config(&self) -> &SpectrumConfig {
        &self.config
    }

    /// Width of one display band in Hz.
    pub fn delta_f(&self) -> f32 {
        self.delta_f as f32
    }

    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    pub fn low_bin(&self) -> usize {
        self.low_bin
    }

    /// Number of non-redundant bins produced by a real-input transform.
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2 + 1
    }

    pub fn band_count(&self) -> usize {
        self.config.band_count
    }

    /// Bands that have a backing FFT bin.
    pub fn populated_bands(&self) -> usize {
        self.bin_count()
            .saturating_sub(self.low_bin)
            .min(self.config.band_count)
    }

    pub fn truncated_bands(&self) -> usize {
        self.config.band_count - self.populated_bands()
    }

    /// Bin range that feeds the populated bands, in band order. Always lies
    /// within `0..bin_count()`, and is empty when `low_hz` is above Nyquist.
    pub fn bin_range(&self) -> Range<usize> {
        let start = self.low_bin.min(self.bin_count());
        start..start + self.populated_bands()
    }

    /// Lower edge of `band` in Hz.
    pub fn band_frequency(&self, band: usize) -> f32 {
        (self.config.low_hz as f64 + band as f64 * self.delta_f) as f32
    }

    /// Axis tick positions (band indices) with their frequency labels.
    pub fn tick_marks(&self) -> Vec<(usize, String)> {
        let bands = self.config.band_count;
        let step = match bands {
            0..=50 => 10,
            51..=100 => 20,
            101..=200 => 50,
            _ => 100,
        };

        (step..bands)
            .step_by(step)
            .map(|pos| (pos, bin_index_to_label(self.band_frequency(pos))))
            .collect()
    }
}

/// Short axis label for a frequency: `"440"`, `"2k"`, `"18k"`.
pub fn bin_index_to_label(hz: f32) -> String {
    let hz = hz.max(0.0) as u32;
    if hz >= 1000 {
        format!("{}k", hz / 1000)
    } else {
        hz.to_string()
    }
}
