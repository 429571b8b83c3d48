//! Color subsystem errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ColorError {
    #[error("missing LUT_3D_SIZE directive")]
    MissingSize,
    #[error("bad LUT_3D_SIZE: {0}")]
    BadSize(String),
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },
    #[error("unsupported frame: {0}")]
    UnsupportedFrame(String),
    #[error("empty frame {width}x{height}")]
    EmptyFrame { width: u32, height: u32 },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
