//! Viewfinder Render - per-refresh preview and capture orchestration
//!
//! The [`Renderer`] runs once per display refresh. It always draws the most
//! recent camera frame to the live surface and, when a capture was
//! requested, draws the same frame once more into an off-screen target whose
//! pixels are read back and delivered through a one-shot [`CaptureTicket`].

pub mod backend;
pub mod capture;
pub mod executor;
pub mod renderer;
pub mod slot;
pub mod wgpu_backend;

pub use backend::{ReadbackHandler, RenderBackend};
pub use capture::{CaptureError, CaptureSlot, CaptureTicket, CapturedFrame, PendingCapture};
pub use executor::{Executor, InlineExecutor, Job, JobQueue, QueueExecutor};
pub use renderer::{RenderOutcome, RenderStats, Renderer};
pub use slot::{FrameSnapshot, LatestFrame};
pub use wgpu_backend::WgpuBackend;
