//! Production backend on top of `viewfinder-gpu`.

use crate::backend::{ReadbackHandler, RenderBackend};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;
use viewfinder_color::Grading;
use viewfinder_core::{FrameBuffer, PixelSize, Result, ViewfinderError};
use viewfinder_gpu::{
    ColorPipeline, DrawUniforms, FrameBinding, GpuContext, LiveSurface, OffscreenTarget,
    PlaneTextures, ReadbackBuffer, SharedStagingPool, StagingPool, SurfaceFrame,
};

/// Staging memory kept around for captures.
const STAGING_BUDGET: u64 = 64 * 1024 * 1024;

/// Renders through wgpu into a [`LiveSurface`].
pub struct WgpuBackend {
    ctx: GpuContext,
    pipeline: ColorPipeline,
    surface: LiveSurface,
    planes: Option<PlaneTextures>,
    encoder: Option<wgpu::CommandEncoder>,
    drawable: Option<SurfaceFrame>,
    readbacks: Vec<(ReadbackBuffer, ReadbackHandler)>,
    staging: SharedStagingPool,
}

impl WgpuBackend {
    /// Build the color pipeline for `surface` and apply `grading`.
    ///
    /// Fails when shaders or pipelines cannot be created.
    pub fn new(ctx: GpuContext, surface: LiveSurface, grading: &Grading) -> Result<Self> {
        let mut pipeline = ColorPipeline::configure(&ctx, surface.format())?;
        pipeline.set_grading(grading);
        info!(
            size = %surface.size(),
            graded = pipeline.has_lut(),
            "Render backend ready"
        );
        Ok(Self {
            ctx,
            pipeline,
            surface,
            planes: None,
            encoder: None,
            drawable: None,
            readbacks: Vec::new(),
            staging: Arc::new(Mutex::new(StagingPool::new(STAGING_BUDGET))),
        })
    }

    /// A headless backend drawing into an owned texture of `size`.
    pub fn headless(ctx: GpuContext, size: PixelSize, grading: &Grading) -> Result<Self> {
        if size.is_empty() {
            return Err(ViewfinderError::InvalidParameter(format!(
                "viewport {} is empty",
                size
            )));
        }
        let surface = LiveSurface::headless(&ctx, size, wgpu::TextureFormat::Rgba8Unorm);
        Self::new(ctx, surface, grading)
    }

    /// Resize the live surface; capture targets follow on the next capture.
    pub fn resize(&mut self, size: PixelSize) {
        self.surface.resize(&self.ctx.device, size);
        let keep = viewfinder_gpu::RowLayout::rgba(size).buffer_size();
        self.staging.lock().retain_size(keep);
    }
}

impl RenderBackend for WgpuBackend {
    type Frame = FrameBinding;
    type Target = OffscreenTarget;

    fn viewport_size(&self) -> PixelSize {
        self.surface.size()
    }

    fn import_frame(&mut self, frame: &FrameBuffer, uniforms: DrawUniforms) -> Result<FrameBinding> {
        if !frame.format.is_supported() {
            return Err(ViewfinderError::UnsupportedFormat(format!("{:?}", frame.format)));
        }
        if frame.is_empty() {
            return Err(ViewfinderError::InvalidFrame(format!("empty frame {}", frame.size())));
        }
        let planes =
            PlaneTextures::prepare(self.planes.take(), &self.ctx.device, &self.ctx.queue, frame)?;
        let binding = self.pipeline.bind_frame(&planes, uniforms);
        self.planes = Some(planes);
        Ok(binding)
    }

    fn allocate_target(&mut self, size: PixelSize) -> Result<OffscreenTarget> {
        if size.is_empty() {
            return Err(ViewfinderError::InvalidParameter(format!(
                "capture target {} is empty",
                size
            )));
        }
        Ok(OffscreenTarget::new(
            &self.ctx.device,
            size,
            self.pipeline.target_format(),
        ))
    }

    fn target_size(&self, target: &OffscreenTarget) -> PixelSize {
        target.size()
    }

    fn draw_to_target(&mut self, frame: &FrameBinding, target: &OffscreenTarget) {
        let encoder = self
            .encoder
            .get_or_insert_with(|| create_encoder(&self.ctx.device));
        self.pipeline.draw(encoder, target.view(), frame);
    }

    fn read_back(&mut self, target: &OffscreenTarget, on_ready: ReadbackHandler) -> Result<()> {
        let encoder = self
            .encoder
            .get_or_insert_with(|| create_encoder(&self.ctx.device));
        let readback = ReadbackBuffer::record(&self.ctx.device, encoder, target, &self.staging)?;
        self.readbacks.push((readback, on_ready));
        Ok(())
    }

    fn draw_to_surface(&mut self, frame: &FrameBinding) -> bool {
        let Some(drawable) = self.surface.acquire(&self.ctx.device) else {
            return false;
        };
        let encoder = self
            .encoder
            .get_or_insert_with(|| create_encoder(&self.ctx.device));
        self.pipeline.draw(encoder, drawable.view(), frame);
        self.drawable = Some(drawable);
        true
    }

    fn submit(&mut self) {
        if let Some(encoder) = self.encoder.take() {
            self.ctx.queue.submit(Some(encoder.finish()));
        }
        if let Some(drawable) = self.drawable.take() {
            drawable.present();
        }
        for (readback, on_ready) in self.readbacks.drain(..) {
            readback.map(self.staging.clone(), on_ready);
        }
        self.ctx.poll();
    }

    fn set_grading(&mut self, grading: &Grading) {
        self.pipeline.set_grading(grading);
    }

    fn wait_idle(&mut self) {
        self.ctx.wait_idle();
    }
}

fn create_encoder(device: &wgpu::Device) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Viewfinder Frame Encoder"),
    })
}
