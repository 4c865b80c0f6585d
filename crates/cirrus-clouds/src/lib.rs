//! Cirrus Clouds - the volumetric raymarching core
//!
//! Everything between "here is a camera ray" and "here is a cloud color":
//! user-editable settings with a revision counter, the per-frame parameter
//! struct built from them, the Henyey-Greenstein phase function, and the
//! raymarch engine that integrates density and light through the cloud
//! volume.

pub mod engine;
pub mod params;
pub mod phase;
pub mod settings;

pub use engine::{RaymarchEngine, Shaded};
pub use params::{CloudBounds, CloudParameters};
pub use phase::{henyey_greenstein, PhaseParams};
pub use settings::{CloudConfig, CloudDomain, CloudSettings};
