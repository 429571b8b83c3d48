//! Capture requests and their one-shot delivery.

use crate::executor::Executor;
use image::RgbaImage;
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::oneshot;
use tracing::debug;
use viewfinder_core::{DeviceOrientation, PixelSize, SharedFrameBuffer};

/// Capture request errors.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a capture is already pending")]
    AlreadyPending,

    #[error("capture was abandoned before completing")]
    Abandoned,
}

/// A frame captured from the preview.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    /// Rendered pixels at viewport size, as shown on screen.
    pub image: RgbaImage,
    /// The camera frame the image was drawn from.
    pub source: SharedFrameBuffer,
    pub viewport: PixelSize,
    /// Device orientation when the capture was requested.
    pub orientation: DeviceOrientation,
    /// Sequence number of `source` in the latest-frame slot.
    pub sequence: u64,
}

/// A request waiting for the next render invocation.
pub struct PendingCapture {
    sender: oneshot::Sender<CapturedFrame>,
    executor: Arc<dyn Executor>,
    orientation: DeviceOrientation,
}

impl PendingCapture {
    pub fn orientation(&self) -> DeviceOrientation {
        self.orientation
    }

    /// Deliver `frame` on the request's executor. Consumes the request.
    pub fn complete(self, frame: CapturedFrame) {
        let Self {
            sender, executor, ..
        } = self;
        executor.execute(Box::new(move || {
            if sender.send(frame).is_err() {
                debug!("Capture ticket dropped before delivery");
            }
        }));
    }
}

/// Receiving end of a capture request.
pub struct CaptureTicket {
    receiver: oneshot::Receiver<CapturedFrame>,
}

impl CaptureTicket {
    /// Non-blocking check; `Ok(None)` while the capture is in flight.
    pub fn try_recv(&mut self) -> Result<Option<CapturedFrame>, CaptureError> {
        match self.receiver.try_recv() {
            Ok(frame) => Ok(Some(frame)),
            Err(oneshot::error::TryRecvError::Empty) => Ok(None),
            Err(oneshot::error::TryRecvError::Closed) => Err(CaptureError::Abandoned),
        }
    }

    /// Block the current thread until the capture is delivered.
    ///
    /// Must not be called from within an async runtime.
    pub fn blocking_recv(self) -> Result<CapturedFrame, CaptureError> {
        self.receiver
            .blocking_recv()
            .map_err(|_| CaptureError::Abandoned)
    }

    /// Wait asynchronously for the capture.
    pub async fn recv(self) -> Result<CapturedFrame, CaptureError> {
        self.receiver.await.map_err(|_| CaptureError::Abandoned)
    }
}

/// Holds at most one pending capture request.
#[derive(Default)]
pub struct CaptureSlot {
    pending: Mutex<Option<PendingCapture>>,
}

impl CaptureSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a capture delivered on `executor`.
    ///
    /// Rejected while an earlier request has not been picked up by a render
    /// invocation yet.
    pub fn request(
        &self,
        orientation: DeviceOrientation,
        executor: Arc<dyn Executor>,
    ) -> Result<CaptureTicket, CaptureError> {
        let mut pending = self.pending.lock();
        if pending.is_some() {
            return Err(CaptureError::AlreadyPending);
        }
        let (sender, receiver) = oneshot::channel();
        *pending = Some(PendingCapture {
            sender,
            executor,
            orientation,
        });
        debug!(?orientation, "Capture requested");
        Ok(CaptureTicket { receiver })
    }

    /// Take the pending request, leaving the slot empty.
    pub fn take(&self) -> Option<PendingCapture> {
        self.pending.lock().take()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }
}
