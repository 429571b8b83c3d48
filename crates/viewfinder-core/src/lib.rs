//! Viewfinder Core - Foundation types for the capture pipeline
//!
//! This crate provides the fundamental types shared by every other crate:
//! - Biplanar camera frames (FrameBuffer, FramePlane, PixelFormat)
//! - Geometric primitives (Size, PixelSize, Rect)
//! - Device and image orientation tags
//! - The common error type

pub mod error;
pub mod frame;
pub mod geometry;
pub mod orientation;

pub use error::{Result, ViewfinderError};
pub use frame::{FrameBuffer, FramePlane, PixelFormat, SharedFrameBuffer};
pub use geometry::{PixelSize, Rect, Size, Vec2};
pub use orientation::{DeviceOrientation, ImageOrientation};
