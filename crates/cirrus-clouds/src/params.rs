//! Per-frame cloud parameters, built from [`CloudSettings`] on revision
//! change.

use cirrus_core::{Aabb, Ray, RayInterval, Shell};
use glam::{Vec3, Vec4};

use crate::phase::PhaseParams;
use crate::settings::{CloudConfig, CloudDomain};

/// World units per noise tile at `cloud_scale == 1`. Kilometer-scale
/// domains sample a handful of tiles this way.
const BASE_NOISE_SCALE: f32 = 1.0e-3;

/// Resolved bounding volume for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CloudBounds {
    Shell(Shell),
    Box(Aabb),
}

impl CloudBounds {
    pub fn intersect(&self, ray: &Ray) -> Option<RayInterval> {
        match self {
            CloudBounds::Shell(shell) => shell.intersect_ray(ray),
            CloudBounds::Box(aabb) => aabb.intersect_ray(ray),
        }
    }

    /// Distance from an interior point to the volume boundary along
    /// `direction`; the light march integrates over this.
    pub fn exit_distance(&self, point: Vec3, direction: Vec3) -> f32 {
        match self {
            CloudBounds::Shell(shell) => shell.exit_distance(point, direction),
            CloudBounds::Box(aabb) => aabb.exit_distance(point, direction),
        }
    }
}

/// Immutable parameter set consumed by the raymarch engine.
///
/// Invariants established by [`CloudParameters::build`]: step counts are at
/// least 1, channel weights are normalized to sum to 1 (or all zero).
#[derive(Clone, Debug, PartialEq)]
pub struct CloudParameters {
    pub bounds: CloudBounds,
    pub shape_scale: f32,
    pub density_multiplier: f32,
    pub density_offset: f32,
    pub shape_offset: Vec3,
    pub detail_scale: f32,
    pub detail_offset: Vec3,
    pub detail_weight: f32,
    pub shape_weights: Vec4,
    pub detail_weights: Vec3,
    pub light_absorption_through_cloud: f32,
    pub light_absorption_toward_sun: f32,
    pub darkness_threshold: f32,
    pub phase: PhaseParams,
    pub num_steps_main: u32,
    pub num_steps_light: u32,
    pub ray_offset_strength: f32,
    pub animation_time: f32,
}

impl CloudParameters {
    /// Pure function of the configuration and the current time.
    pub fn build(config: &CloudConfig, time: f32) -> Self {
        let bounds = match config.domain {
            CloudDomain::Shell {
                center,
                inner_radius,
                outer_radius,
            } => CloudBounds::Shell(Shell::new(center, inner_radius, outer_radius)),
            CloudDomain::Box { center, size } => {
                CloudBounds::Box(Aabb::from_center_size(center, size))
            }
        };

        Self {
            bounds,
            shape_scale: config.cloud_scale * BASE_NOISE_SCALE,
            density_multiplier: config.density_multiplier,
            density_offset: config.density_offset,
            shape_offset: config.shape_offset,
            detail_scale: config.detail_noise_scale * BASE_NOISE_SCALE,
            detail_offset: config.detail_offset,
            detail_weight: config.detail_noise_weight,
            shape_weights: normalize_weights4(config.shape_noise_weights),
            detail_weights: normalize_weights3(config.detail_noise_weights),
            light_absorption_through_cloud: config.light_absorption_through_cloud,
            light_absorption_toward_sun: config.light_absorption_toward_sun,
            darkness_threshold: config.darkness_threshold,
            phase: PhaseParams {
                forward: config.forward_scattering,
                back: config.back_scattering,
                base_brightness: config.base_brightness,
                factor: config.phase_factor,
            },
            num_steps_main: config.num_steps_main.max(1) as u32,
            num_steps_light: config.num_steps_light.max(1) as u32,
            ray_offset_strength: config.ray_offset_strength,
            animation_time: config.anim_speed * time,
        }
    }
}

fn normalize_weights4(weights: Vec4) -> Vec4 {
    let sum = weights.dot(Vec4::ONE);
    if sum > f32::EPSILON {
        weights / sum
    } else {
        Vec4::ZERO
    }
}

fn normalize_weights3(weights: Vec3) -> Vec3 {
    let sum = weights.dot(Vec3::ONE);
    if sum > f32::EPSILON {
        weights / sum
    } else {
        Vec3::ZERO
    }
}
