//! Cirrus Core - shared leaf types for the Cirrus cloud rendering engine
//!
//! Rays, bounding volumes, camera ray generation and the CPU frame target
//! used by the cloud pass. No rendering logic lives here.

pub mod bounds;
pub mod camera;
pub mod error;
pub mod ray;
pub mod target;

pub use bounds::{Aabb, RayInterval, Shell, Sphere};
pub use camera::Camera;
pub use error::{CirrusError, Result};
pub use ray::Ray;
pub use target::RenderTarget;
