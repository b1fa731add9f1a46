//! GS rasterization stage.
//!
//! This crate batches GS primitives, synthesizes one specialized shader program per
//! capability descriptor, and runs the per-pixel decode/test/blend logic directly
//! against a flat copy of GS local memory.

pub mod backend;
pub mod cache;
pub mod caps;
pub mod device;
pub mod draw;
pub mod logging;
pub mod memory;
pub mod params;
pub mod psm;
pub mod shader;
pub mod vertex;

pub use caps::{DescriptorSetCaps, PipelineCaps};
pub use draw::{Draw, DrawConfig, DrawStats};
pub use params::{DrawParams, Scissor};
pub use vertex::PrimVertex;

/// Width and height of the logical drawing area, in pixels.
pub const DRAW_AREA_SIZE: u32 = 1024;

/// Largest depth value plus one; vertex depth is normalized by this value.
pub const DEPTH_MAX: f32 = 4_294_967_296.0;
