//! The seam between render orchestration and the GPU.

use image::RgbaImage;
use viewfinder_color::Grading;
use viewfinder_core::{FrameBuffer, PixelSize, Result};
use viewfinder_gpu::DrawUniforms;

/// Receives read-back pixels, or `None` when the read-back failed.
pub type ReadbackHandler = Box<dyn FnOnce(Option<RgbaImage>) + Send + 'static>;

/// GPU operations a [`crate::Renderer`] drives once per refresh.
///
/// Draws are recorded in call order and become visible on [`Self::submit`].
pub trait RenderBackend {
    /// A frame bound for drawing.
    type Frame;
    /// An off-screen render target.
    type Target;

    /// Current size of the live surface.
    fn viewport_size(&self) -> PixelSize;

    /// Upload `frame` and bind it with `uniforms`.
    fn import_frame(&mut self, frame: &FrameBuffer, uniforms: DrawUniforms) -> Result<Self::Frame>;

    /// Allocate an off-screen target of `size`.
    fn allocate_target(&mut self, size: PixelSize) -> Result<Self::Target>;

    fn target_size(&self, target: &Self::Target) -> PixelSize;

    fn draw_to_target(&mut self, frame: &Self::Frame, target: &Self::Target);

    /// Schedule a copy of `target` to the CPU; `on_ready` runs once the GPU
    /// has finished, on the thread that polls the device.
    fn read_back(&mut self, target: &Self::Target, on_ready: ReadbackHandler) -> Result<()>;

    /// Draw to the live surface. Returns `false` when no drawable was
    /// available this refresh.
    fn draw_to_surface(&mut self, frame: &Self::Frame) -> bool;

    /// Submit recorded work, present, and start pending read-backs.
    fn submit(&mut self);

    /// Replace the grading; previously imported frames become stale.
    fn set_grading(&mut self, grading: &Grading);

    /// Block until all submitted work, including read-backs, has completed.
    fn wait_idle(&mut self);
}
