//! CPU-resident 3-D density volumes.

use cirrus_core::{CirrusError, Result};
use glam::{Vec3, Vec4};

/// Storage format of a volume's voxels, four channels each.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VolumeFormat {
    /// 16-bit unsigned normalized, the format the cloud pass derives into.
    Rgba16Unorm,
    /// 8-bit unsigned normalized, typical for imported source volumes.
    Rgba8Unorm,
}

impl VolumeFormat {
    pub fn bytes_per_voxel(&self) -> usize {
        match self {
            VolumeFormat::Rgba16Unorm => 8,
            VolumeFormat::Rgba8Unorm => 4,
        }
    }
}

enum VolumeData {
    Rgba16(Vec<u16>),
    Rgba8(Vec<u8>),
}

/// A cubic 3-D density field with wrapped (tileable) trilinear sampling.
///
/// The resolution is at least 1; a 1-voxel zeroed volume stands in for
/// "no density anywhere" and is what the cache hands out when a slot has no
/// usable source.
pub struct NoiseVolume {
    resolution: u32,
    data: VolumeData,
}

impl NoiseVolume {
    /// The valid-but-empty volume: a single zero voxel.
    pub fn empty(format: VolumeFormat) -> Self {
        Self {
            resolution: 1,
            data: match format {
                VolumeFormat::Rgba16Unorm => VolumeData::Rgba16(vec![0; 4]),
                VolumeFormat::Rgba8Unorm => VolumeData::Rgba8(vec![0; 4]),
            },
        }
    }

    /// Allocate a zeroed `resolution^3` volume, reporting allocation failure
    /// instead of aborting.
    pub fn try_allocate(resolution: u32, format: VolumeFormat) -> Result<Self> {
        let resolution = resolution.max(1);
        let len = (resolution as usize).pow(3) * 4;
        let oom = |_| {
            CirrusError::OutOfMemory(format!(
                "{}^3 volume ({} bytes)",
                resolution,
                len * format.bytes_per_voxel() / 4
            ))
        };
        let data = match format {
            VolumeFormat::Rgba16Unorm => {
                let mut v: Vec<u16> = Vec::new();
                v.try_reserve_exact(len).map_err(oom)?;
                v.resize(len, 0);
                VolumeData::Rgba16(v)
            }
            VolumeFormat::Rgba8Unorm => {
                let mut v: Vec<u8> = Vec::new();
                v.try_reserve_exact(len).map_err(oom)?;
                v.resize(len, 0);
                VolumeData::Rgba8(v)
            }
        };
        Ok(Self { resolution, data })
    }

    /// Build a volume by evaluating `f` at every voxel coordinate.
    pub fn from_fn(
        resolution: u32,
        format: VolumeFormat,
        mut f: impl FnMut(u32, u32, u32) -> Vec4,
    ) -> Self {
        let resolution = resolution.max(1);
        let mut volume = Self {
            resolution,
            data: match format {
                VolumeFormat::Rgba16Unorm => {
                    VolumeData::Rgba16(vec![0; (resolution as usize).pow(3) * 4])
                }
                VolumeFormat::Rgba8Unorm => {
                    VolumeData::Rgba8(vec![0; (resolution as usize).pow(3) * 4])
                }
            },
        };
        for z in 0..resolution {
            for y in 0..resolution {
                for x in 0..resolution {
                    volume.set_voxel(x, y, z, f(x, y, z));
                }
            }
        }
        volume
    }

    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    pub fn format(&self) -> VolumeFormat {
        match self.data {
            VolumeData::Rgba16(_) => VolumeFormat::Rgba16Unorm,
            VolumeData::Rgba8(_) => VolumeFormat::Rgba8Unorm,
        }
    }

    /// Raw voxel bytes, e.g. for uploading to a GPU texture.
    pub fn as_bytes(&self) -> &[u8] {
        match &self.data {
            VolumeData::Rgba16(v) => bytemuck::cast_slice(v),
            VolumeData::Rgba8(v) => v,
        }
    }

    fn index(&self, x: u32, y: u32, z: u32) -> usize {
        (((z * self.resolution + y) * self.resolution + x) * 4) as usize
    }

    pub fn voxel(&self, x: u32, y: u32, z: u32) -> Vec4 {
        let i = self.index(x, y, z);
        match &self.data {
            VolumeData::Rgba16(v) => Vec4::new(
                v[i] as f32 / 65535.0,
                v[i + 1] as f32 / 65535.0,
                v[i + 2] as f32 / 65535.0,
                v[i + 3] as f32 / 65535.0,
            ),
            VolumeData::Rgba8(v) => Vec4::new(
                v[i] as f32 / 255.0,
                v[i + 1] as f32 / 255.0,
                v[i + 2] as f32 / 255.0,
                v[i + 3] as f32 / 255.0,
            ),
        }
    }

    pub fn set_voxel(&mut self, x: u32, y: u32, z: u32, value: Vec4) {
        let i = self.index(x, y, z);
        let v = value.clamp(Vec4::ZERO, Vec4::ONE);
        match &mut self.data {
            VolumeData::Rgba16(d) => {
                for c in 0..4 {
                    d[i + c] = (v[c] * 65535.0 + 0.5) as u16;
                }
            }
            VolumeData::Rgba8(d) => {
                for c in 0..4 {
                    d[i + c] = (v[c] * 255.0 + 0.5) as u8;
                }
            }
        }
    }

    /// Trilinear sample with repeat addressing. `uvw` is in tile units:
    /// the volume tiles at every integer boundary.
    pub fn sample(&self, uvw: Vec3) -> Vec4 {
        let res = self.resolution as f32;
        let p = (uvw - uvw.floor()) * res - 0.5;
        let base = p.floor();
        let f = p - base;
        let i = base.as_ivec3();

        let r = self.resolution as i32;
        let x0 = i.x.rem_euclid(r) as u32;
        let y0 = i.y.rem_euclid(r) as u32;
        let z0 = i.z.rem_euclid(r) as u32;
        let x1 = (i.x + 1).rem_euclid(r) as u32;
        let y1 = (i.y + 1).rem_euclid(r) as u32;
        let z1 = (i.z + 1).rem_euclid(r) as u32;

        let fx = f.x;
        let fy = f.y;
        let fz = f.z;

        let c00 = self.voxel(x0, y0, z0).lerp(self.voxel(x1, y0, z0), fx);
        let c10 = self.voxel(x0, y1, z0).lerp(self.voxel(x1, y1, z0), fx);
        let c01 = self.voxel(x0, y0, z1).lerp(self.voxel(x1, y0, z1), fx);
        let c11 = self.voxel(x0, y1, z1).lerp(self.voxel(x1, y1, z1), fx);

        let c0 = c00.lerp(c10, fy);
        let c1 = c01.lerp(c11, fy);
        c0.lerp(c1, fz)
    }

    /// Voxel-for-voxel copy from a source of the same resolution. Not a
    /// resample; the caller checks resolutions match.
    pub fn copy_from(&mut self, source: &NoiseVolume) {
        debug_assert_eq!(self.resolution, source.resolution);
        match (&mut self.data, &source.data) {
            (VolumeData::Rgba16(dst), VolumeData::Rgba16(src)) => dst.copy_from_slice(src),
            (VolumeData::Rgba8(dst), VolumeData::Rgba8(src)) => dst.copy_from_slice(src),
            _ => {
                for z in 0..source.resolution {
                    for y in 0..source.resolution {
                        for x in 0..source.resolution {
                            let v = source.voxel(x, y, z);
                            self.set_voxel(x, y, z, v);
                        }
                    }
                }
            }
        }
    }
}
