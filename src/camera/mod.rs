//! Camera state consumed by the picking pass.
//!
//! Orbit input lives with the host; this crate only needs the projection,
//! including the narrowed 1×1 view-offset projection used for picks.

/// Core camera struct and GPU uniform type.
pub mod core;

pub use self::core::{Camera, CameraUniform};
