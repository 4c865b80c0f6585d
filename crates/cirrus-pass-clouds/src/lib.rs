//! Cirrus Clouds Pass - the per-frame orchestrator
//!
//! Thin glue between a frame driver and the raymarch core: decides when the
//! parameter struct must be rebuilt (settings revision change), keeps the
//! derived noise volumes current, and fans the shading out over every pixel
//! of the frame target.

mod pass;

pub use pass::{CloudsPass, FrameContext};
