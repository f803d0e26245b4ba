use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Device;
use log::info;
use std::fmt;
use std::str::FromStr;

use super::DeviceError;

/// Input device chosen on the command line: a numeric index into the host's
/// input device list, or a case-insensitive substring of the device name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Index(usize),
    Name(String),
}

impl FromStr for DeviceSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<usize>() {
            Ok(index) => DeviceSelector::Index(index),
            Err(_) => DeviceSelector::Name(s.to_string()),
        })
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Index(index) => write!(f, "#{}", index),
            DeviceSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

impl DeviceSelector {
    fn matches(&self, index: usize, name: &str) -> bool {
        match self {
            DeviceSelector::Index(wanted) => *wanted == index,
            DeviceSelector::Name(pattern) => name.to_lowercase().contains(&pattern.to_lowercase()),
        }
    }
}

pub fn device_name(device: &Device) -> String {
    device.name().unwrap_or_else(|_| "Unknown".to_string())
}

/// Print every input device with its default configuration.
pub fn list_input_devices() -> Result<(), DeviceError> {
    let host = cpal::default_host();
    let default_name = host.default_input_device().map(|d| device_name(&d));
    let devices = host
        .input_devices()
        .map_err(|e| DeviceError::Enumeration(e.to_string()))?;

    println!("Input devices ({:?} host):", host.id());
    for (index, device) in devices.enumerate() {
        let name = device_name(&device);
        let marker = if Some(&name) == default_name.as_ref() { '>' } else { ' ' };
        match device.default_input_config() {
            Ok(config) => println!(
                "{} {:3} {} ({} ch, {} Hz, {:?})",
                marker,
                index,
                name,
                config.channels(),
                config.sample_rate().0,
                config.sample_format()
            ),
            Err(_) => println!("{} {:3} {} (no usable input config)", marker, index, name),
        }
    }

    Ok(())
}

/// Resolve an explicit selector, or fall back to the host's default input device.
pub fn resolve_input_device(selector: Option<&DeviceSelector>) -> Result<Device, DeviceError> {
    let host = cpal::default_host();

    let device = match selector {
        Some(selector) => {
            let devices = host
                .input_devices()
                .map_err(|e| DeviceError::Enumeration(e.to_string()))?;
            devices
                .enumerate()
                .find(|(index, device)| selector.matches(*index, &device_name(device)))
                .map(|(_, device)| device)
                .ok_or_else(|| DeviceError::NotFound(selector.to_string()))?
        }
        None => host.default_input_device().ok_or(DeviceError::NoDefaultInput)?,
    };

    info!("Using audio device: {}", device_name(&device));
    Ok(device)
}
