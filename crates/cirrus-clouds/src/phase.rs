//! Scattering phase function.

use serde::{Deserialize, Serialize};

/// Henyey-Greenstein phase function. `g > 0` favors forward scattering,
/// `g < 0` back scattering, `g = 0` is isotropic.
pub fn henyey_greenstein(cos_angle: f32, g: f32) -> f32 {
    let g2 = g * g;
    (1.0 - g2) / (4.0 * std::f32::consts::PI * (1.0 + g2 - 2.0 * g * cos_angle).powf(1.5))
}

/// Forward/back lobe blend plus a base brightness floor.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhaseParams {
    pub forward: f32,
    pub back: f32,
    pub base_brightness: f32,
    pub factor: f32,
}

impl PhaseParams {
    /// Scattering weight for the angle between the view ray and the
    /// direction to the sun. Constant along a ray.
    pub fn evaluate(&self, cos_angle: f32) -> f32 {
        let blend = 0.5 * henyey_greenstein(cos_angle, self.forward)
            + 0.5 * henyey_greenstein(cos_angle, -self.back);
        self.base_brightness + blend * self.factor
    }
}
