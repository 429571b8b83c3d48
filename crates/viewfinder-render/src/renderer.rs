//! Per-refresh render state machine.

use crate::backend::RenderBackend;
use crate::capture::{CaptureError, CaptureSlot, CaptureTicket, CapturedFrame, PendingCapture};
use crate::executor::Executor;
use crate::slot::{FrameSnapshot, LatestFrame};
use std::sync::Arc;
use tracing::{debug, trace, warn};
use viewfinder_color::Grading;
use viewfinder_core::{DeviceOrientation, SharedFrameBuffer, ViewfinderError};
use viewfinder_gpu::DrawUniforms;

/// What one render invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No frame has been published yet; nothing was drawn.
    Idle,
    /// The frame could not be imported; the previous image stays visible.
    Dropped,
    /// The live surface had no drawable; a capture may still have been drawn.
    SurfaceUnavailable { captured: bool },
    /// The frame was presented, and also drawn for a capture if `captured`.
    Presented { captured: bool },
}

/// Running counters across invocations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub invocations: u64,
    pub presented: u64,
    pub dropped: u64,
    pub captures: u64,
    pub target_allocations: u64,
}

/// Cache key for an imported frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FrameKey {
    sequence: u64,
    uniforms: DrawUniforms,
}

struct ImportedFrame<F> {
    key: FrameKey,
    frame: F,
    source: SharedFrameBuffer,
}

/// Draws the latest camera frame each refresh and services captures.
///
/// The renderer is the sole owner of GPU state and of the capture trigger;
/// [`Self::render`] must be called from one thread.
pub struct Renderer<B: RenderBackend> {
    backend: B,
    latest: Arc<LatestFrame>,
    captures: Arc<CaptureSlot>,
    imported: Option<ImportedFrame<B::Frame>>,
    target: Option<B::Target>,
    stats: RenderStats,
}

impl<B: RenderBackend> Renderer<B> {
    pub fn new(backend: B, latest: Arc<LatestFrame>) -> Self {
        Self {
            backend,
            latest,
            captures: Arc::new(CaptureSlot::new()),
            imported: None,
            target: None,
            stats: RenderStats::default(),
        }
    }

    /// The slot frames are read from.
    pub fn latest(&self) -> &Arc<LatestFrame> {
        &self.latest
    }

    /// The capture slot; may be shared with other threads to request captures.
    pub fn captures(&self) -> &Arc<CaptureSlot> {
        &self.captures
    }

    /// Request a capture of the next rendered frame.
    pub fn request_capture(
        &self,
        orientation: DeviceOrientation,
        executor: Arc<dyn Executor>,
    ) -> Result<CaptureTicket, CaptureError> {
        self.captures.request(orientation, executor)
    }

    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Replace the grading; the next invocation re-imports the frame.
    pub fn set_grading(&mut self, grading: &Grading) {
        self.backend.set_grading(grading);
        self.imported = None;
    }

    /// Block until outstanding GPU work and read-backs have completed.
    pub fn wait_idle(&mut self) {
        self.backend.wait_idle();
    }

    /// Run one refresh.
    pub fn render(&mut self) -> RenderOutcome {
        self.stats.invocations += 1;

        let Some(snapshot) = self.latest.latest() else {
            trace!("No frame published, skipping refresh");
            return RenderOutcome::Idle;
        };

        if let Err(e) = self.import(&snapshot) {
            debug!(error = %e, sequence = snapshot.sequence, "Dropping frame");
            self.stats.dropped += 1;
            return RenderOutcome::Dropped;
        }

        let captured = match self.captures.take() {
            Some(pending) => self.schedule_capture(pending),
            None => false,
        };

        let Some(imported) = self.imported.as_ref() else {
            return RenderOutcome::Dropped;
        };
        let presented = self.backend.draw_to_surface(&imported.frame);
        self.backend.submit();

        if presented {
            self.stats.presented += 1;
            RenderOutcome::Presented { captured }
        } else {
            self.stats.dropped += 1;
            RenderOutcome::SurfaceUnavailable { captured }
        }
    }

    /// Make sure the snapshot is imported for the current viewport.
    fn import(&mut self, snapshot: &FrameSnapshot) -> viewfinder_core::Result<()> {
        if snapshot.frame.is_empty() {
            return Err(ViewfinderError::InvalidFrame(format!(
                "empty frame {}",
                snapshot.frame.size()
            )));
        }
        let uniforms = DrawUniforms::fit(self.backend.viewport_size(), snapshot.frame.size());
        let key = FrameKey {
            sequence: snapshot.sequence,
            uniforms,
        };
        if self.imported.as_ref().is_some_and(|f| f.key == key) {
            return Ok(());
        }

        let frame = self.backend.import_frame(&snapshot.frame, uniforms)?;
        self.imported = Some(ImportedFrame {
            key,
            frame,
            source: snapshot.frame.clone(),
        });
        Ok(())
    }

    /// Draw the imported frame off-screen and schedule its read-back.
    fn schedule_capture(&mut self, pending: PendingCapture) -> bool {
        let Some(imported) = self.imported.as_ref() else {
            return false;
        };
        let viewport = imported.key.uniforms.viewport();

        let reuse = self
            .target
            .as_ref()
            .is_some_and(|t| self.backend.target_size(t) == viewport);
        if !reuse {
            match self.backend.allocate_target(viewport) {
                Ok(target) => {
                    self.target = Some(target);
                    self.stats.target_allocations += 1;
                }
                Err(e) => {
                    warn!(error = %e, %viewport, "Cannot allocate capture target, abandoning capture");
                    return false;
                }
            }
        }
        let Some(target) = self.target.as_ref() else {
            return false;
        };

        self.backend.draw_to_target(&imported.frame, target);

        let source = imported.source.clone();
        let sequence = imported.key.sequence;
        let orientation = pending.orientation();
        let scheduled = self.backend.read_back(
            target,
            Box::new(move |image| match image {
                Some(image) => pending.complete(CapturedFrame {
                    image,
                    source,
                    viewport,
                    orientation,
                    sequence,
                }),
                None => warn!("Capture read-back failed, request will not complete"),
            }),
        );

        match scheduled {
            Ok(()) => {
                self.stats.captures += 1;
                debug!(%viewport, sequence, "Capture scheduled");
                true
            }
            Err(e) => {
                warn!(error = %e, "Cannot read back capture target");
                false
            }
        }
    }
}
