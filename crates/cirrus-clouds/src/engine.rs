//! The raymarch engine.
//!
//! One call per camera ray: intersect the cloud bounds, march the interval
//! accumulating density-weighted light, run a shorter march toward the sun
//! at every occupied sample for self-shadowing, and fold the background
//! through the remaining transmittance.

use cirrus_core::Ray;
use cirrus_noise::NoiseVolume;
use glam::Vec3;

use crate::params::CloudParameters;

/// Result of shading one ray: `color` already contains the background
/// attenuated by the cloud, `alpha` is the cloud's own coverage for any
/// further downstream blending.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Shaded {
    pub color: Vec3,
    pub alpha: f32,
}

/// Accumulator for one ray's march. Discarded when the ray completes.
struct MarchState {
    transmittance: f32,
    accumulated_light: Vec3,
    distance: f32,
}

impl MarchState {
    fn start(offset: f32) -> Self {
        Self {
            transmittance: 1.0,
            accumulated_light: Vec3::ZERO,
            distance: offset,
        }
    }
}

pub struct RaymarchEngine {
    /// Marches stop once this little light would still get through.
    pub transmittance_cutoff: f32,
}

impl Default for RaymarchEngine {
    fn default() -> Self {
        Self {
            transmittance_cutoff: 0.01,
        }
    }
}

impl RaymarchEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shade one ray without a start offset.
    pub fn shade(
        &self,
        ray: &Ray,
        params: &CloudParameters,
        shape: &NoiseVolume,
        detail: &NoiseVolume,
        sun_direction: Vec3,
        background: Vec3,
    ) -> Shaded {
        self.shade_jittered(ray, params, shape, detail, sun_direction, background, 0.0)
    }

    /// Shade one ray. `jitter` in [0,1) offsets the first sample by up to
    /// `ray_offset_strength` world units to break up banding; the caller
    /// derives it from the pixel coordinates so frames stay stable.
    ///
    /// `sun_direction` points from the scene toward the sun.
    #[allow(clippy::too_many_arguments)]
    pub fn shade_jittered(
        &self,
        ray: &Ray,
        params: &CloudParameters,
        shape: &NoiseVolume,
        detail: &NoiseVolume,
        sun_direction: Vec3,
        background: Vec3,
        jitter: f32,
    ) -> Shaded {
        let Some(interval) = params.bounds.intersect(ray) else {
            return Shaded {
                color: background,
                alpha: 0.0,
            };
        };

        let span = interval.span();
        let step = span / params.num_steps_main as f32;
        let phase = params.phase.evaluate(ray.direction.dot(sun_direction));

        let mut state = MarchState::start(jitter * params.ray_offset_strength);
        while state.distance < span {
            let position = ray.point_at(interval.near + state.distance);
            let density = sample_density(position, params, shape, detail);
            if density > 0.0 {
                let sun_transmittance =
                    self.light_march(position, params, shape, detail, sun_direction);
                state.transmittance = (state.transmittance
                    * (-density * params.light_absorption_through_cloud * step).exp())
                .clamp(0.0, 1.0);
                state.accumulated_light +=
                    Vec3::splat(state.transmittance * density * sun_transmittance * phase * step);
                if state.transmittance < self.transmittance_cutoff {
                    break;
                }
            }
            state.distance += step;
        }

        Shaded {
            color: background * state.transmittance + state.accumulated_light,
            alpha: 1.0 - state.transmittance,
        }
    }

    /// Estimate how much sunlight reaches `position` by integrating density
    /// toward the sun up to the volume boundary. Floored by the darkness
    /// threshold so shadowed cores keep some ambient brightness.
    fn light_march(
        &self,
        position: Vec3,
        params: &CloudParameters,
        shape: &NoiseVolume,
        detail: &NoiseVolume,
        sun_direction: Vec3,
    ) -> f32 {
        let depth = params.bounds.exit_distance(position, sun_direction);
        let step = depth / params.num_steps_light as f32;
        let mut optical_depth = 0.0;
        let mut point = position;
        for _ in 0..params.num_steps_light {
            point += sun_direction * step;
            optical_depth += sample_density(point, params, shape, detail) * step;
        }
        let transmittance = (-optical_depth * params.light_absorption_toward_sun).exp();
        params.darkness_threshold + transmittance * (1.0 - params.darkness_threshold)
    }
}

/// Cloud density at a world position. The detail field erodes the base
/// shape, carving soft edges, and never adds density.
fn sample_density(
    position: Vec3,
    params: &CloudParameters,
    shape: &NoiseVolume,
    detail: &NoiseVolume,
) -> f32 {
    let drift = Vec3::new(1.0, 0.1, 0.2) * params.animation_time;
    let shape_uvw = position * params.shape_scale + params.shape_offset + drift;
    let base = shape.sample(shape_uvw).dot(params.shape_weights) - params.density_offset;
    if base <= 0.0 {
        return 0.0;
    }

    let mut density = base;
    if params.detail_weight > 0.0 {
        let detail_uvw = position * params.detail_scale + params.detail_offset + drift * 0.5;
        let detail_fbm = detail.sample(detail_uvw).truncate().dot(params.detail_weights);
        density -= (1.0 - detail_fbm) * params.detail_weight;
    }
    density.max(0.0) * params.density_multiplier
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{CloudConfig, CloudDomain};
    use cirrus_noise::VolumeFormat;
    use glam::{Vec3, Vec4};

    fn uniform_volume(value: f32) -> NoiseVolume {
        NoiseVolume::from_fn(2, VolumeFormat::Rgba16Unorm, |_, _, _| Vec4::splat(value))
    }

    fn unit_shell_config() -> CloudConfig {
        let mut config = CloudConfig::default();
        config.domain = CloudDomain::Shell {
            center: Vec3::ZERO,
            inner_radius: 0.0,
            outer_radius: 1.0,
        };
        config.shape_noise_weights = Vec4::new(1.0, 0.0, 0.0, 0.0);
        config.detail_noise_weight = 0.0;
        config.num_steps_main = 10;
        config.num_steps_light = 1;
        config.light_absorption_through_cloud = 1.0;
        config.ray_offset_strength = 0.0;
        config
    }

    #[test]
    fn uniform_density_ignores_detail_when_weight_zero() {
        let params = CloudParameters::build(&unit_shell_config(), 0.0);
        let shape = uniform_volume(1.0);
        let detail = uniform_volume(0.0);
        let d = sample_density(Vec3::new(0.1, 0.2, 0.3), &params, &shape, &detail);
        assert!((d - 1.0).abs() < 1e-3);
    }

    #[test]
    fn density_offset_subtracts() {
        let mut config = unit_shell_config();
        config.density_offset = 0.4;
        let params = CloudParameters::build(&config, 0.0);
        let shape = uniform_volume(1.0);
        let detail = uniform_volume(0.0);
        let d = sample_density(Vec3::ZERO, &params, &shape, &detail);
        assert!((d - 0.6).abs() < 1e-3);
    }

    #[test]
    fn detail_erodes_but_never_adds() {
        let mut config = unit_shell_config();
        config.detail_noise_weight = 0.5;
        config.detail_noise_weights = Vec3::new(1.0, 0.0, 0.0);
        let params = CloudParameters::build(&config, 0.0);
        let shape = uniform_volume(1.0);

        let full_detail = uniform_volume(1.0);
        let no_detail = uniform_volume(0.0);
        let with_full = sample_density(Vec3::ZERO, &params, &shape, &full_detail);
        let with_none = sample_density(Vec3::ZERO, &params, &shape, &no_detail);
        // Full detail leaves the base untouched, absent detail erodes it.
        assert!((with_full - 1.0).abs() < 1e-3);
        assert!((with_none - 0.5).abs() < 1e-3);
    }

    #[test]
    fn negative_density_clamps_to_zero() {
        let mut config = unit_shell_config();
        config.density_offset = 2.0;
        let params = CloudParameters::build(&config, 0.0);
        let shape = uniform_volume(1.0);
        let detail = uniform_volume(0.0);
        assert_eq!(sample_density(Vec3::ZERO, &params, &shape, &detail), 0.0);
    }

    #[test]
    fn light_march_is_darker_behind_dense_cloud() {
        let mut config = unit_shell_config();
        config.num_steps_light = 4;
        let params = CloudParameters::build(&config, 0.0);
        let engine = RaymarchEngine::new();
        let thin = uniform_volume(0.1);
        let dense = uniform_volume(1.0);
        let detail = uniform_volume(0.0);
        let sun = Vec3::Y;
        let lit_thin = engine.light_march(Vec3::ZERO, &params, &thin, &detail, sun);
        let lit_dense = engine.light_march(Vec3::ZERO, &params, &dense, &detail, sun);
        assert!(lit_thin > lit_dense);
        assert!(lit_dense >= params.darkness_threshold);
    }

    #[test]
    fn early_exit_matches_full_march_output_shape() {
        let mut config = unit_shell_config();
        config.num_steps_main = 64;
        config.density_multiplier = 50.0;
        let params = CloudParameters::build(&config, 0.0);
        let engine = RaymarchEngine::new();
        let shape = uniform_volume(1.0);
        let detail = uniform_volume(0.0);
        let ray = Ray::new(Vec3::new(0.0, 0.0, -5.0), Vec3::Z);
        let shaded = engine.shade(&ray, &params, &shape, &detail, Vec3::Y, Vec3::ONE);
        // Opaque cloud: nearly all background extinguished.
        assert!(shaded.alpha > 0.99);
    }
}
