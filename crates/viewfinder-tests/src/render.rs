//! Renderer driven through a software backend.
//!
//! The backend shades on the CPU with the same remap and color math the GPU
//! pipeline runs, so captures can be checked pixel by pixel without a GPU.

use image::{Rgba, RgbaImage};
use std::sync::Arc;
use viewfinder_color::{shade, Grading};
use viewfinder_core::{DeviceOrientation, FrameBuffer, PixelSize, Result, SharedFrameBuffer};
use viewfinder_gpu::DrawUniforms;
use viewfinder_render::{
    JobQueue, LatestFrame, ReadbackHandler, RenderBackend, RenderOutcome, Renderer,
};

struct SoftwareFrame {
    source: SharedFrameBuffer,
    uniforms: DrawUniforms,
}

struct SoftwareBackend {
    viewport: PixelSize,
    grading: Grading,
    drawn: Option<RgbaImage>,
    presented: Option<RgbaImage>,
    readbacks: Vec<(Option<RgbaImage>, ReadbackHandler)>,
}

impl SoftwareBackend {
    fn new(viewport: PixelSize, grading: Grading) -> Self {
        Self {
            viewport,
            grading,
            drawn: None,
            presented: None,
            readbacks: Vec::new(),
        }
    }

    fn rasterize(&self, frame: &SoftwareFrame, size: PixelSize) -> RgbaImage {
        let source = &frame.source;
        RgbaImage::from_fn(size.width, size.height, |x, y| {
            let uv = viewfinder_core::Vec2::new(
                (x as f32 + 0.5) / size.width as f32,
                (y as f32 + 0.5) / size.height as f32,
            );
            let src = frame.uniforms.source_uv(uv);
            let sx = ((src.x * source.width as f32) as u32).min(source.width - 1);
            let sy = ((src.y * source.height as f32) as u32).min(source.height - 1);
            let ycbcr = source.ycbcr_at(sx, sy).unwrap_or([0.0, 0.5, 0.5]);
            let [r, g, b] = shade(ycbcr, &self.grading);
            Rgba([
                (r * 255.0).round() as u8,
                (g * 255.0).round() as u8,
                (b * 255.0).round() as u8,
                255,
            ])
        })
    }
}

impl RenderBackend for SoftwareBackend {
    type Frame = SoftwareFrame;
    type Target = PixelSize;

    fn viewport_size(&self) -> PixelSize {
        self.viewport
    }

    fn import_frame(&mut self, frame: &FrameBuffer, uniforms: DrawUniforms) -> Result<SoftwareFrame> {
        Ok(SoftwareFrame {
            source: Arc::new(frame.clone()),
            uniforms,
        })
    }

    fn allocate_target(&mut self, size: PixelSize) -> Result<PixelSize> {
        Ok(size)
    }

    fn target_size(&self, target: &PixelSize) -> PixelSize {
        *target
    }

    fn draw_to_target(&mut self, frame: &SoftwareFrame, target: &PixelSize) {
        self.drawn = Some(self.rasterize(frame, *target));
    }

    fn read_back(&mut self, _target: &PixelSize, on_ready: ReadbackHandler) -> Result<()> {
        self.readbacks.push((self.drawn.clone(), on_ready));
        Ok(())
    }

    fn draw_to_surface(&mut self, frame: &SoftwareFrame) -> bool {
        self.presented = Some(self.rasterize(frame, self.viewport));
        true
    }

    fn submit(&mut self) {
        for (image, on_ready) in self.readbacks.drain(..) {
            on_ready(image);
        }
    }

    fn set_grading(&mut self, grading: &Grading) {
        self.grading = grading.clone();
    }

    fn wait_idle(&mut self) {}
}

fn renderer(viewport: PixelSize) -> (Renderer<SoftwareBackend>, Arc<LatestFrame>) {
    let latest = Arc::new(LatestFrame::new());
    let backend = SoftwareBackend::new(viewport, Grading::Identity);
    (Renderer::new(backend, latest.clone()), latest)
}

fn is_white(px: &Rgba<u8>) -> bool {
    px.0[..3].iter().all(|&c| c > 245)
}

fn is_black(px: &Rgba<u8>) -> bool {
    px.0[..3].iter().all(|&c| c < 10)
}

#[test]
fn portrait_capture_rotates_landscape_frame() {
    let (mut renderer, latest) = renderer(PixelSize::new(90, 160));
    latest.publish(FrameBuffer::test_pattern(320, 180));

    let jobs = JobQueue::new();
    let mut ticket = renderer
        .request_capture(DeviceOrientation::Portrait, jobs.executor())
        .unwrap();

    assert_eq!(
        renderer.render(),
        RenderOutcome::Presented { captured: true }
    );
    // Delivered only once the owning thread drains its queue.
    assert!(ticket.try_recv().unwrap().is_none());
    assert_eq!(jobs.run_pending(), 1);
    let frame = ticket.try_recv().unwrap().unwrap();

    assert_eq!(frame.image.dimensions(), (90, 160));
    assert_eq!(frame.viewport, PixelSize::new(90, 160));
    assert_eq!(frame.orientation, DeviceOrientation::Portrait);
    assert_eq!(frame.sequence, 1);
    assert_eq!(frame.source.size(), PixelSize::new(320, 180));

    // Source bars are vertical; rotated they run across each viewport row,
    // white at the top and black at the bottom.
    for y in [0, 40, 80, 159] {
        let first = *frame.image.get_pixel(0, y);
        assert!((1..90).all(|x| *frame.image.get_pixel(x, y) == first), "row {}", y);
    }
    assert!(is_white(frame.image.get_pixel(45, 0)));
    assert!(is_black(frame.image.get_pixel(45, 159)));
}

#[test]
fn landscape_capture_keeps_frame_upright() {
    let (mut renderer, latest) = renderer(PixelSize::new(160, 90));
    latest.publish(FrameBuffer::test_pattern(320, 180));

    let jobs = JobQueue::new();
    let ticket = renderer
        .request_capture(DeviceOrientation::LandscapeLeft, jobs.executor())
        .unwrap();
    renderer.render();
    jobs.run_pending();
    let frame = ticket.blocking_recv().unwrap();

    assert!(is_white(frame.image.get_pixel(0, 45)));
    assert!(is_black(frame.image.get_pixel(159, 45)));
    let column = *frame.image.get_pixel(10, 0);
    assert!((1..90).all(|y| *frame.image.get_pixel(10, y) == column));
}

#[test]
fn capture_matches_presented_image() {
    let (mut renderer, latest) = renderer(PixelSize::new(64, 48));
    latest.publish(FrameBuffer::test_pattern(128, 72));

    let jobs = JobQueue::new();
    let mut ticket = renderer
        .request_capture(DeviceOrientation::LandscapeLeft, jobs.executor())
        .unwrap();
    renderer.render();
    jobs.run_pending();
    let frame = ticket.try_recv().unwrap().unwrap();

    assert_eq!(renderer.backend().presented.as_ref(), Some(&frame.image));
}

#[test]
fn newer_frame_is_captured_after_publish() {
    let (mut renderer, latest) = renderer(PixelSize::new(32, 32));
    latest.publish(FrameBuffer::test_pattern(64, 64));
    renderer.render();
    latest.publish(FrameBuffer::test_pattern(64, 64));

    let jobs = JobQueue::new();
    let mut ticket = renderer
        .request_capture(DeviceOrientation::Portrait, jobs.executor())
        .unwrap();
    renderer.render();
    jobs.run_pending();

    assert_eq!(ticket.try_recv().unwrap().map(|f| f.sequence), Some(2));
    let stats = renderer.stats();
    assert_eq!(stats.invocations, 2);
    assert_eq!(stats.presented, 2);
    assert_eq!(stats.captures, 1);
}

#[test]
fn grading_change_applies_to_next_capture() {
    let (mut renderer, latest) = renderer(PixelSize::new(64, 36));
    latest.publish(FrameBuffer::test_pattern(128, 72));
    renderer.render();

    let mut entries = Vec::new();
    for b in 0..2 {
        for g in 0..2 {
            for r in 0..2 {
                entries.push([1.0 - r as f32, 1.0 - g as f32, 1.0 - b as f32]);
            }
        }
    }
    let invert = viewfinder_color::Lut3D::from_entries(2, entries).unwrap();
    renderer.set_grading(&Grading::Lut(invert));

    let jobs = JobQueue::new();
    let mut ticket = renderer
        .request_capture(DeviceOrientation::LandscapeLeft, jobs.executor())
        .unwrap();
    renderer.render();
    jobs.run_pending();
    let frame = ticket.try_recv().unwrap().unwrap();

    // The white bar on the left is now black.
    assert!(is_black(frame.image.get_pixel(0, 18)));
}

#[test]
fn uniforms_rotate_only_for_portrait_viewports() {
    let landscape_frame = PixelSize::new(1920, 1080);
    assert!(DrawUniforms::fit(PixelSize::new(390, 844), landscape_frame).rotates());
    assert!(!DrawUniforms::fit(PixelSize::new(844, 390), landscape_frame).rotates());
}
