//! Cirrus Noise - 3-D density fields for the cloud raymarcher
//!
//! CPU-resident voxel volumes with wrapped trilinear sampling, tileable
//! Perlin/Worley generation for procedural sources, and the cache that
//! decides when a derived volume is stale relative to its source.

pub mod cache;
pub mod generate;
pub mod volume;

pub use cache::{NoiseVolumeCache, SourceId, SourceVolume, VolumeSlot};
pub use volume::{NoiseVolume, VolumeFormat};
