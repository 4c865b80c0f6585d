//! Renders one frame of a procedural cloudscape to `clouds_demo.png`.

use std::sync::Arc;

use cirrus::noise::generate;
use cirrus::prelude::*;
use glam::Vec3;
use parking_lot::RwLock;

const WIDTH: u32 = 960;
const HEIGHT: u32 = 540;
const NOISE_RESOLUTION: u32 = 64;

fn main() {
    env_logger::init();

    let mut config = CloudConfig::default();
    // A cloud layer between ~5 and ~65 units above the camera, curved like
    // a planet's shell.
    config.domain = CloudDomain::Shell {
        center: Vec3::new(0.0, -395.0, 0.0),
        inner_radius: 400.0,
        outer_radius: 460.0,
    };
    config.cloud_scale = 8.0;
    config.density_multiplier = 0.6;
    config.density_offset = 0.55;
    config.detail_noise_scale = 32.0;
    config.detail_noise_weight = 0.25;
    config.num_steps_main = 48;
    config.num_steps_light = 8;
    config.ray_offset_strength = 4.0;
    config.noise_resolution = NOISE_RESOLUTION;

    let settings = Arc::new(RwLock::new(CloudSettings::new(config)));
    let mut pass = CloudsPass::new(settings);
    pass.set_shape_source(Some(SourceVolume {
        id: SourceId(1),
        data: generate::shape_volume(1, NOISE_RESOLUTION),
    }));
    pass.set_detail_source(Some(SourceVolume {
        id: SourceId(2),
        data: generate::detail_volume(2, NOISE_RESOLUTION),
    }));

    let camera = Camera::perspective(
        Vec3::new(0.0, 2.0, 0.0),
        Vec3::new(0.0, 12.0, 40.0),
        Vec3::Y,
        60f32.to_radians(),
        WIDTH as f32 / HEIGHT as f32,
        0.1,
        1000.0,
    );

    let mut target = RenderTarget::new(WIDTH, HEIGHT);
    target.fill_with(|_, y| {
        let t = y as f32 / HEIGHT as f32;
        Vec3::new(0.3, 0.5, 0.85).lerp(Vec3::new(0.7, 0.82, 0.95), t)
    });

    pass.execute(&mut FrameContext {
        target: &mut target,
        camera: &camera,
        sun_direction: Vec3::new(0.4, 0.55, 0.35).normalize(),
        time: 0.0,
    })
    .expect("cloud pass failed");

    let image = image::RgbaImage::from_raw(WIDTH, HEIGHT, target.to_rgba8())
        .expect("target size mismatch");
    image.save("clouds_demo.png").expect("failed to write png");
    log::info!("wrote clouds_demo.png");
}
