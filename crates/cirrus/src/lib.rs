//! Cirrus - a volumetric cloud rendering core
//!
//! A full-screen cloud pass in the spirit of film-style cloudscapes: shape
//! and detail noise volumes, a density raymarch with sun-ward light
//! marching, and a Henyey-Greenstein phase blend, orchestrated by a thin
//! per-frame pass that rebuilds state only when settings actually change.

pub use cirrus_clouds as clouds;
pub use cirrus_core as core;
pub use cirrus_noise as noise;
pub use cirrus_pass_clouds as pass;

pub mod prelude {
    pub use crate::clouds::{
        CloudConfig, CloudDomain, CloudParameters, CloudSettings, RaymarchEngine, Shaded,
    };
    pub use crate::core::{Camera, Ray, RenderTarget};
    pub use crate::noise::{
        NoiseVolume, NoiseVolumeCache, SourceId, SourceVolume, VolumeFormat, VolumeSlot,
    };
    pub use crate::pass::{CloudsPass, FrameContext};
    pub use glam;
}
