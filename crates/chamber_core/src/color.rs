//! Track color derivation.
//!
//! Hue encodes the sign of the charge, saturation the charge-to-mass ratio.
//! The color is computed once, when a particle's visual object is created.

use serde::{Deserialize, Serialize};

use crate::constants::{COLOR_VALUE, NEGATIVE_HUE, POSITIVE_HUE};
use crate::error::{ChamberError, Result};

/// Linear color as handed to the host's material assignment
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Color {
    Rgb([f32; 3]),
    Rgba([f32; 4]),
}

impl Color {
    /// [r, g, b, a], with alpha 1.0 when none was requested
    pub fn to_rgba(self) -> [f32; 4] {
        match self {
            Self::Rgb([r, g, b]) => [r, g, b, 1.0],
            Self::Rgba(c) => c,
        }
    }

    pub fn rgb(self) -> [f32; 3] {
        let [r, g, b, _] = self.to_rgba();
        [r, g, b]
    }
}

/// Standard HSV to RGB conversion, all channels in [0, 1]
pub fn hsv_to_rgb(h: f32, s: f32, v: f32) -> [f32; 3] {
    if s == 0.0 {
        return [v, v, v];
    }
    let h6 = h.rem_euclid(1.0) * 6.0;
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    match sector as u32 % 6 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// HSV components for a charge/mass pair.
///
/// Saturation is `|charge| / mass` clamped to [0, 1]; heavier or weakly
/// charged particles fade toward grey.
pub fn track_hsv(charge: f32, mass: f32) -> Result<[f32; 3]> {
    if !charge.is_finite() {
        return Err(ChamberError::InvalidCharge { charge });
    }
    if !mass.is_finite() || mass <= 0.0 {
        return Err(ChamberError::InvalidMass { mass });
    }
    let hue = if charge >= 0.0 { POSITIVE_HUE } else { NEGATIVE_HUE };
    let saturation = (charge.abs() / mass).clamp(0.0, 1.0);
    Ok([hue, saturation, COLOR_VALUE])
}

/// Material color for a particle track
pub fn color_for_particle(charge: f32, mass: f32, with_alpha: bool) -> Result<Color> {
    let [h, s, v] = track_hsv(charge, mass)?;
    let [r, g, b] = hsv_to_rgb(h, s, v);
    if with_alpha {
        Ok(Color::Rgba([r, g, b, 1.0]))
    } else {
        Ok(Color::Rgb([r, g, b]))
    }
}
