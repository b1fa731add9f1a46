//! Headless GPU device management.
//!
//! Creates the wgpu Instance/Adapter/Device/Queue used by the wgpu draw backend.
//! There is no surface: the rasterizer's output lives in GS memory.

mod gpu;
mod init;

pub use gpu::Gpu;
pub use init::GpuInit;
