//! Dumps every z-slice of the generated shape volume into one PNG sheet.

use cirrus::noise::generate;

const RESOLUTION: u32 = 64;
const GRID: u32 = 8;

fn main() {
    env_logger::init();

    let volume = generate::shape_volume(7, RESOLUTION);
    let mut sheet = image::GrayImage::new(RESOLUTION * GRID, RESOLUTION * GRID);
    for slice in 0..RESOLUTION {
        let ox = (slice % GRID) * RESOLUTION;
        let oy = (slice / GRID) * RESOLUTION;
        for y in 0..RESOLUTION {
            for x in 0..RESOLUTION {
                let v = volume.voxel(x, y, slice).x;
                sheet.put_pixel(ox + x, oy + y, image::Luma([(v * 255.0) as u8]));
            }
        }
    }
    sheet.save("noise_preview.png").expect("failed to write png");
    log::info!("wrote noise_preview.png");
}
