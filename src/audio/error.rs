use std::fmt;

/// Invalid analysis or CLI settings. Always reported before capture starts.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    NoBands,
    InvalidSampleRate(f32),
    InvalidLowFrequency(f32),
    EmptyRange { low_hz: f32, high_hz: f32 },
    InvalidInterval(f32),
    InvalidGain(f32),
    InvalidDuration(f32),
    FftTooLarge { required: f64, max: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoBands => write!(f, "band count must be greater than zero"),
            ConfigError::InvalidSampleRate(rate) => {
                write!(f, "sample rate must be at least 1 Hz (got {} Hz)", rate)
            }
            ConfigError::InvalidLowFrequency(low) => {
                write!(f, "LOW must be a non-negative frequency (got {} Hz)", low)
            }
            ConfigError::EmptyRange { low_hz, high_hz } => write!(
                f,
                "HIGH must be greater than LOW (got {} Hz .. {} Hz)",
                low_hz, high_hz
            ),
            ConfigError::InvalidInterval(ms) => {
                write!(f, "update interval must be positive (got {} ms)", ms)
            }
            ConfigError::InvalidGain(gain) => {
                write!(f, "gain must be positive (got {})", gain)
            }
            ConfigError::InvalidDuration(secs) => {
                write!(f, "duration must be positive (got {} s)", secs)
            }
            ConfigError::FftTooLarge { required, max } => write!(
                f,
                "frequency range is too narrow for the band count: \
                 it needs a {}-point FFT, the maximum is {}",
                required, max
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

const LIST_HINT: &str = "Use --list-devices to list available devices.";

/// Failures finding or opening an input device. Fatal; never retried.
#[derive(Debug, Clone, PartialEq)]
pub enum DeviceError {
    NoDefaultInput,
    NotFound(String),
    Enumeration(String),
    Config { device: String, reason: String },
    UnsupportedFormat(String),
    Stream { device: String, reason: String },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NoDefaultInput => {
                write!(f, "No default input device found. {}", LIST_HINT)
            }
            DeviceError::NotFound(selector) => {
                write!(f, "No input device matches '{}'. {}", selector, LIST_HINT)
            }
            DeviceError::Enumeration(reason) => {
                write!(f, "Unable to enumerate input devices: {}", reason)
            }
            DeviceError::Config { device, reason } => write!(
                f,
                "Unable to use input device '{}': {}. {}",
                device, reason, LIST_HINT
            ),
            DeviceError::UnsupportedFormat(format) => {
                write!(f, "Unsupported input sample format: {}", format)
            }
            DeviceError::Stream { device, reason } => write!(
                f,
                "Failed to open input stream on '{}': {}. {}",
                device, reason, LIST_HINT
            ),
        }
    }
}

impl std::error::Error for DeviceError {}

/// A chunk the analyzer cannot turn into a frame. The producer skips the publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisError {
    EmptyChunk,
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::EmptyChunk => write!(f, "audio chunk contains no samples"),
        }
    }
}

impl std::error::Error for AnalysisError {}
