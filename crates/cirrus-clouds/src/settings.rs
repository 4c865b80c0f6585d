//! User-editable cloud settings with a revision counter.
//!
//! The pass compares `revision()` against the revision it last applied to
//! decide whether parameters must be rebuilt. Every edit goes through
//! [`CloudSettings::edit`], which bumps the revision when the guard drops,
//! so staleness can never be forgotten the way a manual dirty flag can.

use std::ops::{Deref, DerefMut};

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Shape of the cloud volume's spatial extent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum CloudDomain {
    /// Spherical annulus around `center`, e.g. a planet's cloud layer.
    Shell {
        center: Vec3,
        inner_radius: f32,
        outer_radius: f32,
    },
    /// Axis-aligned box described center-relative, `center +/- size/2`.
    Box { center: Vec3, size: Vec3 },
}

/// The full user-facing configuration for the cloud pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    pub domain: CloudDomain,
    pub anim_speed: f32,

    // March settings
    pub num_steps_main: i32,
    pub num_steps_light: i32,
    pub ray_offset_strength: f32,

    // Base shape
    pub cloud_scale: f32,
    pub density_multiplier: f32,
    pub density_offset: f32,
    pub shape_offset: Vec3,
    pub shape_noise_weights: Vec4,

    // Detail
    pub detail_noise_scale: f32,
    pub detail_noise_weight: f32,
    pub detail_noise_weights: Vec3,
    pub detail_offset: Vec3,

    // Lighting
    pub light_absorption_through_cloud: f32,
    pub light_absorption_toward_sun: f32,
    pub darkness_threshold: f32,
    pub forward_scattering: f32,
    pub back_scattering: f32,
    pub base_brightness: f32,
    pub phase_factor: f32,

    /// Edge length of the derived noise volumes.
    pub noise_resolution: u32,
}

impl Default for CloudConfig {
    fn default() -> Self {
        Self {
            domain: CloudDomain::Shell {
                center: Vec3::ZERO,
                inner_radius: 400.0,
                outer_radius: 500.0,
            },
            anim_speed: 0.0,
            num_steps_main: 5,
            num_steps_light: 8,
            ray_offset_strength: 0.0,
            cloud_scale: 1.0,
            density_multiplier: 1.0,
            density_offset: 0.0,
            shape_offset: Vec3::ZERO,
            shape_noise_weights: Vec4::new(1.0, 0.5, 0.25, 0.125),
            detail_noise_scale: 10.0,
            detail_noise_weight: 0.1,
            detail_noise_weights: Vec3::new(1.0, 0.5, 0.25),
            detail_offset: Vec3::ZERO,
            light_absorption_through_cloud: 1.0,
            light_absorption_toward_sun: 1.0,
            darkness_threshold: 0.2,
            forward_scattering: 0.83,
            back_scattering: 0.3,
            base_brightness: 0.8,
            phase_factor: 0.15,
            noise_resolution: 64,
        }
    }
}

/// A [`CloudConfig`] with a monotonically increasing revision.
#[derive(Clone, Debug)]
pub struct CloudSettings {
    config: CloudConfig,
    revision: u64,
}

impl CloudSettings {
    pub fn new(config: CloudConfig) -> Self {
        Self {
            config,
            revision: 1,
        }
    }

    pub fn config(&self) -> &CloudConfig {
        &self.config
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Mutable access that bumps the revision once when the guard drops.
    pub fn edit(&mut self) -> CloudSettingsEdit<'_> {
        CloudSettingsEdit { settings: self }
    }

    /// Swap in a whole new configuration.
    pub fn replace(&mut self, config: CloudConfig) {
        self.config = config;
        self.revision += 1;
    }
}

impl Default for CloudSettings {
    fn default() -> Self {
        Self::new(CloudConfig::default())
    }
}

pub struct CloudSettingsEdit<'a> {
    settings: &'a mut CloudSettings,
}

impl Deref for CloudSettingsEdit<'_> {
    type Target = CloudConfig;

    fn deref(&self) -> &CloudConfig {
        &self.settings.config
    }
}

impl DerefMut for CloudSettingsEdit<'_> {
    fn deref_mut(&mut self) -> &mut CloudConfig {
        &mut self.settings.config
    }
}

impl Drop for CloudSettingsEdit<'_> {
    fn drop(&mut self) {
        self.settings.revision += 1;
        log::trace!("cloud settings revision -> {}", self.settings.revision);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_bump_revision() {
        let mut settings = CloudSettings::default();
        let before = settings.revision();
        settings.edit().density_multiplier = 2.0;
        assert_eq!(settings.revision(), before + 1);
        assert_eq!(settings.config().density_multiplier, 2.0);
    }

    #[test]
    fn replace_bumps_revision() {
        let mut settings = CloudSettings::default();
        let before = settings.revision();
        settings.replace(CloudConfig::default());
        assert!(settings.revision() > before);
    }

    #[test]
    fn revision_is_monotonic_across_edits() {
        let mut settings = CloudSettings::default();
        let mut last = settings.revision();
        for i in 0..4 {
            settings.edit().anim_speed = i as f32;
            assert!(settings.revision() > last);
            last = settings.revision();
        }
    }

    #[test]
    fn config_round_trips_through_serde() {
        let config = CloudConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: CloudConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, back);
    }
}
