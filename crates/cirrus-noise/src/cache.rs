//! Cache of derived density volumes with staleness detection.
//!
//! The cloud pass samples working copies of its source volumes. A copy is
//! valid only while its resolution and format match the requested target and
//! its recorded source identity matches the source the host last supplied;
//! anything else releases the copy and derives a fresh one. A slot with no
//! usable source degrades to an empty (zero-density) volume instead of
//! failing.

use std::collections::HashMap;

use crate::volume::{NoiseVolume, VolumeFormat};

/// Logical slot a derived volume belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum VolumeSlot {
    Shape,
    Detail,
}

/// Stable identity of a source volume, assigned by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(pub u64);

/// A source volume as handed over by the texture source provider.
pub struct SourceVolume {
    pub id: SourceId,
    pub data: NoiseVolume,
}

struct CachedVolume {
    source: Option<SourceId>,
    volume: NoiseVolume,
}

pub struct NoiseVolumeCache {
    slots: HashMap<VolumeSlot, CachedVolume>,
    empty: NoiseVolume,
    allocations: u64,
}

impl NoiseVolumeCache {
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            empty: NoiseVolume::empty(VolumeFormat::Rgba16Unorm),
            allocations: 0,
        }
    }

    /// Make the slot's derived volume current and return it.
    ///
    /// A cache hit (matching resolution, format and source identity) returns
    /// the existing volume untouched. A stale or missing entry allocates
    /// exactly once, then copies the source voxel-for-voxel when its
    /// resolution equals the target's; a mismatched or absent source leaves
    /// the new volume zeroed.
    pub fn ensure(
        &mut self,
        slot: VolumeSlot,
        source: Option<&SourceVolume>,
        resolution: u32,
        format: VolumeFormat,
    ) -> &NoiseVolume {
        let source_id = source.map(|s| s.id);
        let fresh = self.slots.get(&slot).is_some_and(|cached| {
            cached.volume.resolution() == resolution
                && cached.volume.format() == format
                && cached.source == source_id
        });
        if fresh {
            log::trace!("volume cache hit for {:?}", slot);
            return &self.slots[&slot].volume;
        }

        log::debug!("deriving {:?} volume at {}^3", slot, resolution);
        self.allocations += 1;
        let mut volume = match NoiseVolume::try_allocate(resolution, format) {
            Ok(volume) => volume,
            Err(err) => {
                log::warn!("{:?} volume allocation failed ({err}), degrading to empty", slot);
                NoiseVolume::empty(format)
            }
        };
        if let Some(source) = source {
            if source.data.resolution() == volume.resolution() {
                volume.copy_from(&source.data);
            } else {
                log::warn!(
                    "{:?} source resolution {} != target {}, volume left empty",
                    slot,
                    source.data.resolution(),
                    volume.resolution()
                );
            }
        }
        self.slots.insert(slot, CachedVolume { source: source_id, volume });
        &self.slots[&slot].volume
    }

    /// The slot's current volume; an empty volume if the slot was never
    /// ensured.
    pub fn volume(&self, slot: VolumeSlot) -> &NoiseVolume {
        self.slots
            .get(&slot)
            .map(|cached| &cached.volume)
            .unwrap_or(&self.empty)
    }

    /// Number of volume allocations performed so far.
    pub fn allocations(&self) -> u64 {
        self.allocations
    }

    /// Drop every derived volume.
    pub fn clear(&mut self) {
        log::debug!("clearing volume cache ({} slots)", self.slots.len());
        self.slots.clear();
    }
}

impl Default for NoiseVolumeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Vec3, Vec4};

    fn source(id: u64, resolution: u32) -> SourceVolume {
        SourceVolume {
            id: SourceId(id),
            data: NoiseVolume::from_fn(resolution, VolumeFormat::Rgba16Unorm, |x, _, _| {
                Vec4::splat(x as f32 / resolution as f32)
            }),
        }
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut cache = NoiseVolumeCache::new();
        let src = source(1, 8);
        let first = cache
            .ensure(VolumeSlot::Shape, Some(&src), 8, VolumeFormat::Rgba16Unorm)
            .as_bytes()
            .as_ptr() as usize;
        assert_eq!(cache.allocations(), 1);

        let second = cache
            .ensure(VolumeSlot::Shape, Some(&src), 8, VolumeFormat::Rgba16Unorm)
            .as_bytes()
            .as_ptr() as usize;
        assert_eq!(cache.allocations(), 1);
        assert_eq!(first, second);
    }

    #[test]
    fn resolution_change_triggers_one_reallocation() {
        let mut cache = NoiseVolumeCache::new();
        let src = source(1, 8);
        cache.ensure(VolumeSlot::Shape, Some(&src), 8, VolumeFormat::Rgba16Unorm);
        cache.ensure(VolumeSlot::Shape, Some(&src), 16, VolumeFormat::Rgba16Unorm);
        assert_eq!(cache.allocations(), 2);
        assert_eq!(cache.volume(VolumeSlot::Shape).resolution(), 16);
    }

    #[test]
    fn source_identity_change_triggers_rebuild() {
        let mut cache = NoiseVolumeCache::new();
        let a = source(1, 8);
        let b = source(2, 8);
        cache.ensure(VolumeSlot::Shape, Some(&a), 8, VolumeFormat::Rgba16Unorm);
        cache.ensure(VolumeSlot::Shape, Some(&b), 8, VolumeFormat::Rgba16Unorm);
        assert_eq!(cache.allocations(), 2);
        cache.ensure(VolumeSlot::Shape, None, 8, VolumeFormat::Rgba16Unorm);
        assert_eq!(cache.allocations(), 3);
    }

    #[test]
    fn matching_source_is_copied() {
        let mut cache = NoiseVolumeCache::new();
        let src = source(1, 8);
        let volume = cache.ensure(VolumeSlot::Shape, Some(&src), 8, VolumeFormat::Rgba16Unorm);
        assert_eq!(volume.voxel(4, 0, 0), src.data.voxel(4, 0, 0));
    }

    #[test]
    fn mismatched_source_resolution_leaves_volume_zeroed() {
        let mut cache = NoiseVolumeCache::new();
        let src = source(1, 4);
        let volume = cache.ensure(VolumeSlot::Shape, Some(&src), 8, VolumeFormat::Rgba16Unorm);
        assert_eq!(volume.resolution(), 8);
        assert_eq!(volume.sample(Vec3::splat(0.5)), Vec4::ZERO);
    }

    #[test]
    fn missing_source_yields_empty_volume() {
        let mut cache = NoiseVolumeCache::new();
        let volume = cache.ensure(VolumeSlot::Detail, None, 8, VolumeFormat::Rgba16Unorm);
        assert_eq!(volume.sample(Vec3::splat(0.25)), Vec4::ZERO);
        assert_eq!(cache.volume(VolumeSlot::Shape).resolution(), 1);
    }

    #[test]
    fn slots_are_independent() {
        let mut cache = NoiseVolumeCache::new();
        let src = source(1, 8);
        cache.ensure(VolumeSlot::Shape, Some(&src), 8, VolumeFormat::Rgba16Unorm);
        cache.ensure(VolumeSlot::Detail, None, 16, VolumeFormat::Rgba16Unorm);
        assert_eq!(cache.allocations(), 2);
        assert_eq!(cache.volume(VolumeSlot::Shape).resolution(), 8);
        assert_eq!(cache.volume(VolumeSlot::Detail).resolution(), 16);
    }
}
