use std::sync::Arc;

use cirrus_clouds::{CloudParameters, CloudSettings, RaymarchEngine};
use cirrus_core::{Camera, RenderTarget, Result};
use cirrus_noise::{NoiseVolumeCache, SourceVolume, VolumeFormat, VolumeSlot};
use glam::Vec3;
use parking_lot::RwLock;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Everything the frame driver supplies for one frame.
pub struct FrameContext<'a> {
    /// Color buffer holding the already-rendered frame; the pass reads it
    /// as the background and writes the composited result back.
    pub target: &'a mut RenderTarget,
    pub camera: &'a Camera,
    /// Direction from the scene toward the sun.
    pub sun_direction: Vec3,
    /// Elapsed time in seconds, drives cloud animation.
    pub time: f32,
}

/// The full-screen cloud pass.
///
/// Owns the noise volume cache and the last-built parameters; the settings
/// object stays owned by the host and is only read here.
pub struct CloudsPass {
    profiler_tag: String,
    settings: Arc<RwLock<CloudSettings>>,
    cache: NoiseVolumeCache,
    engine: RaymarchEngine,
    params: CloudParameters,
    last_applied: u64,
    shape_source: Option<SourceVolume>,
    detail_source: Option<SourceVolume>,
    live_tuning: bool,
}

impl CloudsPass {
    pub fn new(settings: Arc<RwLock<CloudSettings>>) -> Self {
        let (params, last_applied) = {
            let guard = settings.read();
            (CloudParameters::build(guard.config(), 0.0), guard.revision())
        };
        Self {
            profiler_tag: "clouds".to_string(),
            settings,
            cache: NoiseVolumeCache::new(),
            engine: RaymarchEngine::new(),
            params,
            last_applied,
            shape_source: None,
            detail_source: None,
            live_tuning: false,
        }
    }

    /// Label used in log output, e.g. for a frame profiler.
    pub fn with_profiler_tag(mut self, tag: impl Into<String>) -> Self {
        self.profiler_tag = tag.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.profiler_tag
    }

    /// In live-tuning mode parameters are rebuilt every frame instead of
    /// trusting the revision counter.
    pub fn set_live_tuning(&mut self, enabled: bool) {
        self.live_tuning = enabled;
    }

    /// Supply or clear the base shape source volume.
    pub fn set_shape_source(&mut self, source: Option<SourceVolume>) {
        self.shape_source = source;
    }

    /// Supply or clear the detail source volume.
    pub fn set_detail_source(&mut self, source: Option<SourceVolume>) {
        self.detail_source = source;
    }

    pub fn last_applied_revision(&self) -> u64 {
        self.last_applied
    }

    /// Render the cloud layer over the frame.
    ///
    /// Parameter rebuild and volume derivation finish on the calling thread
    /// before any shading task reads them.
    pub fn execute(&mut self, ctx: &mut FrameContext<'_>) -> Result<()> {
        log::trace!("{}: execute", self.profiler_tag);

        let resolution = {
            let settings = self.settings.read();
            let revision = settings.revision();
            if revision != self.last_applied || self.live_tuning {
                log::debug!(
                    "{}: rebuilding parameters (revision {} -> {})",
                    self.profiler_tag,
                    self.last_applied,
                    revision
                );
                self.params = CloudParameters::build(settings.config(), ctx.time);
                self.last_applied = revision;
            } else {
                // Only the animation clock moves between revisions.
                self.params.animation_time = settings.config().anim_speed * ctx.time;
            }
            settings.config().noise_resolution
        };

        self.cache.ensure(
            VolumeSlot::Shape,
            self.shape_source.as_ref(),
            resolution,
            VolumeFormat::Rgba16Unorm,
        );
        self.cache.ensure(
            VolumeSlot::Detail,
            self.detail_source.as_ref(),
            resolution,
            VolumeFormat::Rgba16Unorm,
        );

        let shape = self.cache.volume(VolumeSlot::Shape);
        let detail = self.cache.volume(VolumeSlot::Detail);
        let params = &self.params;
        let engine = &self.engine;
        let camera = ctx.camera;
        let sun = ctx.sun_direction.normalize();
        let width = ctx.target.width();
        let height = ctx.target.height();

        ctx.target
            .pixels_mut()
            .par_chunks_exact_mut(width as usize)
            .enumerate()
            .for_each(|(y, row)| {
                for (x, pixel) in row.iter_mut().enumerate() {
                    let (x, y) = (x as u32, y as u32);
                    let ray = camera.ray_for_pixel(x, y, width, height);
                    let background = pixel.truncate();
                    let shaded = engine.shade_jittered(
                        &ray,
                        params,
                        shape,
                        detail,
                        sun,
                        background,
                        pixel_jitter(x, y),
                    );
                    *pixel = shaded.color.extend(shaded.alpha);
                }
            });

        Ok(())
    }
}

/// Per-pixel jitter in [0,1), deterministic in the pixel coordinates so the
/// image is temporally stable.
fn pixel_jitter(x: u32, y: u32) -> f32 {
    let seed = ((x as u64) << 32) | y as u64;
    SmallRng::seed_from_u64(seed ^ 0x9e37_79b9_7f4a_7c15).gen()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cirrus_clouds::{CloudConfig, CloudDomain};
    use cirrus_noise::{NoiseVolume, SourceId};
    use glam::{Vec3, Vec4};

    fn test_settings() -> CloudSettings {
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
        config.noise_resolution = 4;
        CloudSettings::new(config)
    }

    fn uniform_source(id: u64, resolution: u32) -> SourceVolume {
        SourceVolume {
            id: SourceId(id),
            data: NoiseVolume::from_fn(resolution, VolumeFormat::Rgba16Unorm, |_, _, _| {
                Vec4::ONE
            }),
        }
    }

    fn frame_camera() -> Camera {
        Camera::perspective(
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::ZERO,
            Vec3::Y,
            std::f32::consts::FRAC_PI_3,
            1.0,
            0.1,
            100.0,
        )
    }

    #[test]
    fn clouds_cover_the_frame_center() {
        let settings = Arc::new(RwLock::new(test_settings()));
        let mut pass = CloudsPass::new(settings);
        pass.set_shape_source(Some(uniform_source(1, 4)));

        let camera = frame_camera();
        let mut target = RenderTarget::new(16, 16);
        target.clear(Vec3::ONE);
        pass.execute(&mut FrameContext {
            target: &mut target,
            camera: &camera,
            sun_direction: Vec3::new(0.0, 0.0, -1.0),
            time: 0.0,
        })
        .unwrap();

        let center = target.pixel(8, 8);
        assert!(center.w > 0.0 && center.w < 1.0);
        // Corner rays miss the unit shell and keep the cleared background.
        let corner = target.pixel(0, 0);
        assert_eq!(corner, Vec3::ONE.extend(0.0));
    }

    #[test]
    fn parameters_rebuild_only_on_revision_change() {
        let settings = Arc::new(RwLock::new(test_settings()));
        let mut pass = CloudsPass::new(settings.clone());
        pass.set_shape_source(Some(uniform_source(1, 4)));
        let camera = frame_camera();

        let applied = pass.last_applied_revision();
        let mut target = RenderTarget::new(4, 4);
        let mut ctx = FrameContext {
            target: &mut target,
            camera: &camera,
            sun_direction: Vec3::new(0.0, 0.0, -1.0),
            time: 0.0,
        };
        pass.execute(&mut ctx).unwrap();
        assert_eq!(pass.last_applied_revision(), applied);

        settings.write().edit().density_multiplier = 0.0;
        let mut target = RenderTarget::new(4, 4);
        target.clear(Vec3::ONE);
        pass.execute(&mut FrameContext {
            target: &mut target,
            camera: &camera,
            sun_direction: Vec3::new(0.0, 0.0, -1.0),
            time: 0.0,
        })
        .unwrap();
        assert!(pass.last_applied_revision() > applied);
        // Zero density leaves every pixel at the background.
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(target.pixel(x, y), Vec3::ONE.extend(0.0));
            }
        }
    }

    #[test]
    fn volume_cache_reuses_across_frames() {
        let settings = Arc::new(RwLock::new(test_settings()));
        let mut pass = CloudsPass::new(settings);
        pass.set_shape_source(Some(uniform_source(1, 4)));
        let camera = frame_camera();

        for _ in 0..3 {
            let mut target = RenderTarget::new(4, 4);
            pass.execute(&mut FrameContext {
                target: &mut target,
                camera: &camera,
                sun_direction: Vec3::new(0.0, 0.0, -1.0),
                time: 0.0,
            })
            .unwrap();
        }
        // One allocation per slot, ever.
        assert_eq!(pass.cache.allocations(), 2);
    }

    #[test]
    fn jitter_is_stable_per_pixel() {
        let a = pixel_jitter(13, 7);
        let b = pixel_jitter(13, 7);
        assert_eq!(a, b);
        assert!((0.0..1.0).contains(&a));
        assert_ne!(pixel_jitter(13, 7), pixel_jitter(7, 13));
    }
}
