//! Tileable 3-D noise generation for procedural cloud sources.
//!
//! Used when the host supplies no source volumes: a 4-channel shape volume
//! (Perlin-Worley in R, Worley octaves at rising frequency in GBA) and a
//! 3-channel Worley detail volume. Both are periodic in all three axes and
//! deterministic for a fixed seed.

use glam::{IVec3, Vec3, Vec4};
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::volume::{NoiseVolume, VolumeFormat};

/// Generate the base shape volume.
pub fn shape_volume(seed: u64, resolution: u32) -> NoiseVolume {
    let perm = permutation_table(seed);
    let res = resolution.max(1) as f32;
    NoiseVolume::from_fn(resolution, VolumeFormat::Rgba16Unorm, |x, y, z| {
        let p = (Vec3::new(x as f32, y as f32, z as f32) + 0.5) / res;
        let perlin = perlin_fbm(p, 4, 3, &perm);
        let w0 = worley_fbm(p, 4, 3, seed);
        let w1 = worley_fbm(p, 8, 3, seed.wrapping_add(1));
        let w2 = worley_fbm(p, 16, 3, seed.wrapping_add(2));
        // Perlin remapped onto the Worley base, the usual shape channel.
        let perlin_worley = w0 + perlin * (1.0 - w0);
        Vec4::new(perlin_worley, w0, w1, w2)
    })
}

/// Generate the high-frequency detail volume (RGB Worley octaves, A unused).
pub fn detail_volume(seed: u64, resolution: u32) -> NoiseVolume {
    let res = resolution.max(1) as f32;
    NoiseVolume::from_fn(resolution, VolumeFormat::Rgba16Unorm, |x, y, z| {
        let p = (Vec3::new(x as f32, y as f32, z as f32) + 0.5) / res;
        let w0 = worley_fbm(p, 8, 3, seed);
        let w1 = worley_fbm(p, 16, 3, seed.wrapping_add(1));
        let w2 = worley_fbm(p, 32, 3, seed.wrapping_add(2));
        Vec4::new(w0, w1, w2, 0.0)
    })
}

/// Seeded lattice permutation, doubled so hash chains never index past the
/// table.
fn permutation_table(seed: u64) -> [u8; 512] {
    let mut base: [u8; 256] = std::array::from_fn(|i| i as u8);
    let mut rng = SmallRng::seed_from_u64(seed);
    base.shuffle(&mut rng);
    let mut perm = [0u8; 512];
    perm[..256].copy_from_slice(&base);
    perm[256..].copy_from_slice(&base);
    perm
}

fn fade(t: f32) -> f32 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + t * (b - a)
}

fn grad3(hash: u8, x: f32, y: f32, z: f32) -> f32 {
    // 12 edge-direction gradients, folded over 16 cases.
    let h = hash & 15;
    let u = if h < 8 { x } else { y };
    let v = if h < 4 {
        y
    } else if h == 12 || h == 14 {
        x
    } else {
        z
    };
    let u = if h & 1 == 0 { u } else { -u };
    let v = if h & 2 == 0 { v } else { -v };
    u + v
}

/// Gradient noise on a lattice that wraps every `period` cells. `p` is in
/// lattice units. Output roughly in [-1, 1].
fn perlin3(p: Vec3, period: i32, perm: &[u8; 512]) -> f32 {
    let base = p.floor();
    let f = p - base;
    let cell = base.as_ivec3();
    let wrap = |v: i32| v.rem_euclid(period) as usize & 255;

    let u = fade(f.x);
    let v = fade(f.y);
    let w = fade(f.z);

    let hash = |dx: i32, dy: i32, dz: i32| -> u8 {
        let xi = wrap(cell.x + dx);
        let yi = wrap(cell.y + dy);
        let zi = wrap(cell.z + dz);
        perm[perm[perm[xi] as usize + yi] as usize + zi]
    };

    let g000 = grad3(hash(0, 0, 0), f.x, f.y, f.z);
    let g100 = grad3(hash(1, 0, 0), f.x - 1.0, f.y, f.z);
    let g010 = grad3(hash(0, 1, 0), f.x, f.y - 1.0, f.z);
    let g110 = grad3(hash(1, 1, 0), f.x - 1.0, f.y - 1.0, f.z);
    let g001 = grad3(hash(0, 0, 1), f.x, f.y, f.z - 1.0);
    let g101 = grad3(hash(1, 0, 1), f.x - 1.0, f.y, f.z - 1.0);
    let g011 = grad3(hash(0, 1, 1), f.x, f.y - 1.0, f.z - 1.0);
    let g111 = grad3(hash(1, 1, 1), f.x - 1.0, f.y - 1.0, f.z - 1.0);

    let x00 = lerp(g000, g100, u);
    let x10 = lerp(g010, g110, u);
    let x01 = lerp(g001, g101, u);
    let x11 = lerp(g011, g111, u);
    let y0 = lerp(x00, x10, v);
    let y1 = lerp(x01, x11, v);
    lerp(y0, y1, w)
}

/// Fractal gradient noise over `p` in [0,1) tile space, remapped to [0, 1].
/// Octave periods double, so every octave tiles.
fn perlin_fbm(p: Vec3, base_period: i32, octaves: u32, perm: &[u8; 512]) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    let mut period = base_period;
    for _ in 0..octaves {
        value += perlin3(p * period as f32, period, perm) * amplitude;
        total += amplitude;
        amplitude *= 0.5;
        period *= 2;
    }
    (value / total * 0.5 + 0.5).clamp(0.0, 1.0)
}

fn cell_hash(cell: IVec3, seed: u64) -> u64 {
    let mut h = seed ^ 0x9e37_79b9_7f4a_7c15;
    for v in [cell.x, cell.y, cell.z] {
        h ^= v as u32 as u64;
        h = h.wrapping_mul(0xff51_afd7_ed55_8ccd);
        h ^= h >> 33;
    }
    h
}

/// One deterministic feature point per lattice cell, in [0,1)^3.
fn feature_point(cell: IVec3, seed: u64) -> Vec3 {
    let mut rng = SmallRng::seed_from_u64(cell_hash(cell, seed));
    Vec3::new(rng.gen(), rng.gen(), rng.gen())
}

/// Inverted cellular noise over a lattice of `cells`^3 that wraps at the
/// tile boundary. `p` is in [0,1) tile space. 1 at a feature point, falling
/// off toward 0.
fn worley3(p: Vec3, cells: i32, seed: u64) -> f32 {
    let scaled = p * cells as f32;
    let base = scaled.floor();
    let frac = scaled - base;
    let cell = base.as_ivec3();

    let mut min_sq = f32::MAX;
    for dz in -1..=1 {
        for dy in -1..=1 {
            for dx in -1..=1 {
                let offset = IVec3::new(dx, dy, dz);
                let neighbor = cell + offset;
                let wrapped = IVec3::new(
                    neighbor.x.rem_euclid(cells),
                    neighbor.y.rem_euclid(cells),
                    neighbor.z.rem_euclid(cells),
                );
                let feature = offset.as_vec3() + feature_point(wrapped, seed);
                min_sq = min_sq.min((feature - frac).length_squared());
            }
        }
    }
    (1.0 - min_sq.sqrt()).clamp(0.0, 1.0)
}

/// Fractal Worley noise, cell counts doubling per octave.
fn worley_fbm(p: Vec3, base_cells: i32, octaves: u32, seed: u64) -> f32 {
    let mut value = 0.0;
    let mut amplitude = 1.0;
    let mut total = 0.0;
    let mut cells = base_cells;
    for octave in 0..octaves {
        value += worley3(p, cells, seed.wrapping_add(octave as u64)) * amplitude;
        total += amplitude;
        amplitude *= 0.5;
        cells *= 2;
    }
    value / total
}
