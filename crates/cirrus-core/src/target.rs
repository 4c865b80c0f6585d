//! CPU frame target the cloud pass reads and writes.

use glam::{Vec3, Vec4};

/// An RGBA float color buffer. The RGB channels hold linear color, the alpha
/// channel holds the straight alpha produced by the last pass that wrote the
/// pixel.
pub struct RenderTarget {
    width: u32,
    height: u32,
    pixels: Vec<Vec4>,
}

impl RenderTarget {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Vec4::ZERO; (width * height) as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> Vec4 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, value: Vec4) {
        self.pixels[(y * self.width + x) as usize] = value;
    }

    /// Fill every pixel with `color` and alpha 1.
    pub fn clear(&mut self, color: Vec3) {
        self.pixels.fill(color.extend(1.0));
    }

    /// Fill with a per-pixel background, e.g. a sky gradient.
    pub fn fill_with(&mut self, mut f: impl FnMut(u32, u32) -> Vec3) {
        for y in 0..self.height {
            for x in 0..self.width {
                self.pixels[(y * self.width + x) as usize] = f(x, y).extend(1.0);
            }
        }
    }

    /// Mutable view of the buffer as rows, for parallel shading.
    pub fn rows_mut(&mut self) -> std::slice::ChunksExactMut<'_, Vec4> {
        self.pixels.chunks_exact_mut(self.width as usize)
    }

    /// The whole buffer in row-major order.
    pub fn pixels_mut(&mut self) -> &mut [Vec4] {
        &mut self.pixels
    }

    /// Quantize to 8-bit RGBA for image export. Colors are clamped, not
    /// tone-mapped.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for p in &self.pixels {
            let c = p.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
            out.extend_from_slice(&[c.x as u8, c.y as u8, c.z as u8, 255]);
        }
        out
    }
}
