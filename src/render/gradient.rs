use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Colour gradients for band colouring, sampled at five evenly spaced stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gradient {
    #[default]
    Plasma,
    Viridis,
    Magma,
    Inferno,
    Gray,
}

const PLASMA: &[[u8; 3]] = &[
    [13, 8, 135],
    [126, 3, 168],
    [204, 71, 120],
    [248, 149, 64],
    [240, 249, 33],
];
const VIRIDIS: &[[u8; 3]] = &[
    [68, 1, 84],
    [59, 82, 139],
    [33, 145, 140],
    [94, 201, 98],
    [253, 231, 37],
];
const MAGMA: &[[u8; 3]] = &[
    [0, 0, 4],
    [81, 18, 124],
    [183, 55, 121],
    [252, 137, 97],
    [252, 253, 191],
];
const INFERNO: &[[u8; 3]] = &[
    [0, 0, 4],
    [87, 16, 110],
    [188, 55, 84],
    [249, 142, 9],
    [252, 255, 164],
];
const GRAY: &[[u8; 3]] = &[[0, 0, 0], [255, 255, 255]];

impl Gradient {
    fn stops(self) -> &'static [[u8; 3]] {
        match self {
            Gradient::Plasma => PLASMA,
            Gradient::Viridis => VIRIDIS,
            Gradient::Magma => MAGMA,
            Gradient::Inferno => INFERNO,
            Gradient::Gray => GRAY,
        }
    }

    /// RGB colour at position `t` in 0..1 (clamped; NaN maps to the start).
    pub fn color_at(self, t: f32) -> [u8; 3] {
        let stops = self.stops();
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };

        let scaled = t * (stops.len() - 1) as f32;
        let index = (scaled.floor() as usize).min(stops.len() - 2);
        let frac = scaled - index as f32;

        let (a, b) = (stops[index], stops[index + 1]);
        let mut rgb = [0u8; 3];
        for (channel, out) in rgb.iter_mut().enumerate() {
            let value = a[channel] as f32 + (b[channel] as f32 - a[channel] as f32) * frac;
            *out = value.round() as u8;
        }
        rgb
    }
}
