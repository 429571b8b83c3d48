//! Synthetic camera feeding the latest-frame slot.
//!
//! Stands in for a capture session: a dedicated thread publishes NV12 color
//! bars at the configured frame rate, scrolling a little every frame so
//! consecutive captures differ.

use crossbeam_channel::{select, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use viewfinder_core::{FrameBuffer, PixelSize, Result, ViewfinderError};
use viewfinder_render::LatestFrame;

/// Luma columns the bars move per frame. Even, so chroma stays aligned.
const SCROLL_STEP: u32 = 8;

pub struct SyntheticCamera {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<u64>>,
}

impl SyntheticCamera {
    /// Start publishing `size` frames into `slot` at `fps`.
    pub fn start(slot: Arc<LatestFrame>, size: PixelSize, fps: f32) -> Result<Self> {
        if size.is_empty() || fps.is_nan() || fps <= 0.0 {
            return Err(ViewfinderError::InvalidParameter(format!(
                "camera {} at {} fps",
                size, fps
            )));
        }
        let (stop_tx, stop_rx) = crossbeam_channel::bounded::<()>(0);
        let period = Duration::from_secs_f32(1.0 / fps);

        let thread = std::thread::Builder::new()
            .name("synthetic-camera".to_string())
            .spawn(move || {
                let base = FrameBuffer::test_pattern(size.width, size.height);
                let ticker = crossbeam_channel::tick(period);
                let started = Instant::now();
                let mut published = 0u64;
                loop {
                    select! {
                        recv(stop_rx) -> _ => break,
                        recv(ticker) -> _ => {
                            let shift = (published as u32).wrapping_mul(SCROLL_STEP) % size.width;
                            let mut frame = scrolled(&base, shift);
                            frame.timestamp = started.elapsed();
                            // Drop the replaced frame outside the slot lock.
                            drop(slot.publish(frame));
                            published += 1;
                        }
                    }
                }
                slot.clear();
                published
            })
            .map_err(|e| ViewfinderError::Internal(format!("Spawn camera thread: {}", e)))?;

        info!(%size, fps, "Synthetic camera started");
        Ok(Self {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    /// Stop the camera thread and return how many frames it published.
    pub fn stop(mut self) -> u64 {
        self.shutdown()
    }

    fn shutdown(&mut self) -> u64 {
        // Disconnecting the stop channel wakes the thread's select.
        self.stop.take();
        let published = self
            .thread
            .take()
            .and_then(|thread| thread.join().ok())
            .unwrap_or(0);
        debug!(published, "Synthetic camera stopped");
        published
    }
}

impl Drop for SyntheticCamera {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}

/// `frame` with every row rotated left by `shift` luma columns.
fn scrolled(frame: &FrameBuffer, shift: u32) -> FrameBuffer {
    let mut out = frame.clone();
    let shift = shift & !1;
    if shift == 0 {
        return out;
    }
    for plane in out.planes.iter_mut() {
        let subsample = frame.width / plane.width.max(1);
        let offset = (shift / subsample.max(1)) as usize * plane.bytes_per_pixel;
        for y in 0..plane.height {
            let row = plane.row_mut(y);
            let offset = offset % row.len().max(1);
            row.rotate_left(offset);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolled_moves_luma_and_chroma_together() {
        let base = FrameBuffer::test_pattern(64, 4);
        let moved = scrolled(&base, 16);
        assert_eq!(moved.ycbcr_at(0, 0), base.ycbcr_at(16, 0));
        assert_eq!(moved.ycbcr_at(40, 2), base.ycbcr_at(56, 2));
        assert_eq!(moved.size(), base.size());
    }

    #[test]
    fn camera_publishes_until_stopped() {
        let slot = Arc::new(LatestFrame::new());
        let camera = SyntheticCamera::start(slot.clone(), PixelSize::new(32, 16), 200.0).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while slot.sequence() < 3 && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }
        let published = camera.stop();
        assert!(published >= 3);
        assert!(slot.latest().is_none());
    }

    #[test]
    fn zero_rate_is_rejected() {
        let slot = Arc::new(LatestFrame::new());
        assert!(SyntheticCamera::start(slot, PixelSize::new(32, 16), 0.0).is_err());
    }
}
