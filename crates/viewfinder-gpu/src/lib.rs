//! Viewfinder GPU - wgpu-based color pipeline
//!
//! Converts biplanar camera frames to graded RGB on the GPU and draws them
//! into either a presentable surface or an off-screen target that can be
//! read back to the CPU.

pub mod context;
pub mod lut_texture;
pub mod pipeline;
pub mod staging_pool;
pub mod surface;
pub mod target;
pub mod texture;
pub mod uniforms;

pub use context::GpuContext;
pub use lut_texture::LutTexture;
pub use pipeline::{ColorPipeline, FrameBinding};
pub use staging_pool::{SharedStagingPool, StagingPool};
pub use surface::{LiveSurface, SurfaceFrame};
pub use target::{OffscreenTarget, ReadbackBuffer, RowLayout};
pub use texture::{GpuTexture, PlaneTextures};
pub use uniforms::{DrawUniforms, QuadVertex, RawUniforms};
