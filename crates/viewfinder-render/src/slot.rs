//! Single-slot "latest frame" cell between the camera and the renderer.

use parking_lot::Mutex;
use std::sync::Arc;
use viewfinder_core::{FrameBuffer, SharedFrameBuffer};

/// The newest published frame and its sequence number.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub sequence: u64,
    pub frame: SharedFrameBuffer,
}

#[derive(Default)]
struct Slot {
    frame: Option<SharedFrameBuffer>,
    sequence: u64,
}

/// Holds only the most recent frame; publishing never blocks on the reader.
///
/// Older frames are replaced, not queued. Every publish bumps the sequence
/// number so readers can tell a new frame from a repeated one.
#[derive(Default)]
pub struct LatestFrame {
    slot: Mutex<Slot>,
}

impl LatestFrame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a frame, returning the one it replaced.
    ///
    /// The replaced frame is dropped by the caller, outside the lock.
    pub fn publish(&self, frame: impl Into<Arc<FrameBuffer>>) -> Option<SharedFrameBuffer> {
        let frame = frame.into();
        let mut slot = self.slot.lock();
        slot.sequence += 1;
        slot.frame.replace(frame)
    }

    /// The current frame, if any has been published.
    pub fn latest(&self) -> Option<FrameSnapshot> {
        let slot = self.slot.lock();
        slot.frame.as_ref().map(|frame| FrameSnapshot {
            sequence: slot.sequence,
            frame: frame.clone(),
        })
    }

    /// Number of frames published so far.
    pub fn sequence(&self) -> u64 {
        self.slot.lock().sequence
    }

    /// Drop the current frame, e.g. when the camera stops.
    pub fn clear(&self) -> Option<SharedFrameBuffer> {
        self.slot.lock().frame.take()
    }
}
