//! Frame buffer types for camera frames in CPU memory.
//!
//! The pipeline consumes 8-bit biplanar 4:2:0 frames: a full-resolution luma
//! plane and a half-resolution plane of interleaved Cb/Cr pairs. Frames are
//! immutable once built and shared between threads as [`SharedFrameBuffer`].

use crate::error::{Result, ViewfinderError};
use crate::geometry::PixelSize;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;
use std::time::Duration;

/// Pixel format enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PixelFormat {
    /// Biplanar 4:2:0, Y plane + interleaved CbCr plane (camera native)
    #[default]
    Nv12,
    /// YUV 4:2:0 with three separate planes
    Yuv420P,
    /// 8-bit BGRA (32 bits per pixel)
    Bgra8,
}

impl PixelFormat {
    /// Whether the color pipeline can consume frames of this format.
    pub fn is_supported(self) -> bool {
        self == Self::Nv12
    }
}

/// A plane of pixel data with stride information.
#[derive(Debug, Clone)]
pub struct FramePlane {
    /// Raw pixel data
    pub data: Vec<u8>,
    /// Bytes per row (may include padding)
    pub stride: usize,
    /// Width in samples
    pub width: u32,
    /// Height in rows
    pub height: u32,
    /// Bytes per sample (1 for luma, 2 for interleaved chroma)
    pub bytes_per_pixel: usize,
}

impl FramePlane {
    /// Create a zeroed plane with the given dimensions.
    pub fn new(width: u32, height: u32, bytes_per_pixel: usize) -> Self {
        // Align stride to 64 bytes for SIMD and GPU compatibility
        let min_stride = (width as usize) * bytes_per_pixel;
        let stride = (min_stride + 63) & !63;
        let data = vec![0u8; stride * height as usize];
        Self {
            data,
            stride,
            width,
            height,
            bytes_per_pixel,
        }
    }

    /// Wrap existing plane bytes, validating that `data` covers every row.
    pub fn from_bytes(
        data: Vec<u8>,
        stride: usize,
        width: u32,
        height: u32,
        bytes_per_pixel: usize,
    ) -> Result<Self> {
        let row_bytes = width as usize * bytes_per_pixel;
        if stride < row_bytes {
            return Err(ViewfinderError::InvalidFrame(format!(
                "stride {} is shorter than a row of {} bytes",
                stride, row_bytes
            )));
        }
        let required = match height {
            0 => 0,
            h => stride * (h as usize - 1) + row_bytes,
        };
        if data.len() < required {
            return Err(ViewfinderError::InvalidFrame(format!(
                "plane holds {} bytes, {}x{} needs {}",
                data.len(),
                width,
                height,
                required
            )));
        }
        Ok(Self {
            data,
            stride,
            width,
            height,
            bytes_per_pixel,
        })
    }

    /// Get a row of pixel data.
    #[inline]
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.bytes_per_pixel;
        &self.data[start..end]
    }

    /// Get a mutable row of pixel data.
    #[inline]
    pub fn row_mut(&mut self, y: u32) -> &mut [u8] {
        let start = y as usize * self.stride;
        let end = start + self.width as usize * self.bytes_per_pixel;
        &mut self.data[start..end]
    }
}

/// A camera frame in CPU memory.
///
/// For [`PixelFormat::Nv12`] plane 0 is luma and plane 1 holds CbCr pairs at
/// half resolution in both axes. Planes are only ever replaced together by
/// building a new `FrameBuffer`.
#[derive(Debug, Clone)]
pub struct FrameBuffer {
    /// Pixel format
    pub format: PixelFormat,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Capture time relative to the start of the stream
    pub timestamp: Duration,
    /// Pixel data planes (1-3 depending on format)
    pub planes: SmallVec<[FramePlane; 3]>,
}

impl FrameBuffer {
    /// Create a zeroed frame buffer with the given dimensions and format.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        let (cw, ch) = chroma_dimensions(width, height);
        let planes = match format {
            PixelFormat::Nv12 => {
                smallvec::smallvec![
                    FramePlane::new(width, height, 1), // Y
                    FramePlane::new(cw, ch, 2),        // CbCr interleaved
                ]
            }
            PixelFormat::Yuv420P => {
                smallvec::smallvec![
                    FramePlane::new(width, height, 1), // Y
                    FramePlane::new(cw, ch, 1),        // Cb
                    FramePlane::new(cw, ch, 1),        // Cr
                ]
            }
            PixelFormat::Bgra8 => smallvec::smallvec![FramePlane::new(width, height, 4)],
        };

        Self {
            format,
            width,
            height,
            timestamp: Duration::ZERO,
            planes,
        }
    }

    /// Build an NV12 frame from its two planes.
    ///
    /// Fails when either plane does not match the frame dimensions, so a
    /// constructed frame is never partially valid.
    pub fn nv12(
        width: u32,
        height: u32,
        luma: FramePlane,
        chroma: FramePlane,
        timestamp: Duration,
    ) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(ViewfinderError::InvalidFrame(format!(
                "empty frame {}x{}",
                width, height
            )));
        }
        if luma.width != width || luma.height != height || luma.bytes_per_pixel != 1 {
            return Err(ViewfinderError::InvalidFrame(format!(
                "luma plane {}x{} does not match frame {}x{}",
                luma.width, luma.height, width, height
            )));
        }
        let (cw, ch) = chroma_dimensions(width, height);
        if chroma.width != cw || chroma.height != ch || chroma.bytes_per_pixel != 2 {
            return Err(ViewfinderError::InvalidFrame(format!(
                "chroma plane {}x{} does not match expected {}x{}",
                chroma.width, chroma.height, cw, ch
            )));
        }

        Ok(Self {
            format: PixelFormat::Nv12,
            width,
            height,
            timestamp,
            planes: smallvec::smallvec![luma, chroma],
        })
    }

    /// Frame dimensions.
    #[inline]
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Luma plane, if this is a biplanar frame.
    pub fn luma(&self) -> Option<&FramePlane> {
        match self.format {
            PixelFormat::Nv12 => self.planes.first(),
            _ => None,
        }
    }

    /// Interleaved chroma plane, if this is a biplanar frame.
    pub fn chroma(&self) -> Option<&FramePlane> {
        match self.format {
            PixelFormat::Nv12 => self.planes.get(1),
            _ => None,
        }
    }

    /// Whether either dimension is zero. Such frames cannot be drawn.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Normalized (Y, Cb, Cr) at a pixel, nearest chroma sample.
    ///
    /// Returns `None` for formats other than NV12 or out-of-range coordinates.
    pub fn ycbcr_at(&self, x: u32, y: u32) -> Option<[f32; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let luma = self.luma()?;
        let chroma = self.chroma()?;
        let l = luma.row(y)[x as usize];
        let crow = chroma.row((y / 2).min(chroma.height - 1));
        let cx = (x / 2).min(chroma.width - 1) as usize * 2;
        Some([
            l as f32 / 255.0,
            crow[cx] as f32 / 255.0,
            crow[cx + 1] as f32 / 255.0,
        ])
    }

    /// Create an NV12 test pattern (eight vertical color bars).
    pub fn test_pattern(width: u32, height: u32) -> Self {
        const BARS: [[f32; 3]; 8] = [
            [1.0, 1.0, 1.0], // White
            [1.0, 1.0, 0.0], // Yellow
            [0.0, 1.0, 1.0], // Cyan
            [0.0, 1.0, 0.0], // Green
            [1.0, 0.0, 1.0], // Magenta
            [1.0, 0.0, 0.0], // Red
            [0.0, 0.0, 1.0], // Blue
            [0.0, 0.0, 0.0], // Black
        ];
        let bar_of = |x: u32| BARS[(x as usize * 8 / width.max(1) as usize).min(7)];

        let mut frame = Self::new(width, height, PixelFormat::Nv12);
        for y in 0..height {
            let row = frame.planes[0].row_mut(y);
            for x in 0..width {
                row[x as usize] = unit_to_byte(rec709_encode(bar_of(x))[0]);
            }
        }
        let chroma = &mut frame.planes[1];
        let chroma_width = chroma.width;
        for y in 0..chroma.height {
            let row = chroma.row_mut(y);
            for cx in 0..chroma_width {
                let [_, cb, cr] = rec709_encode(bar_of(cx * 2));
                let i = cx as usize * 2;
                row[i] = unit_to_byte(cb);
                row[i + 1] = unit_to_byte(cr);
            }
        }
        frame
    }
}

/// Arc-wrapped frame buffer for shared ownership.
pub type SharedFrameBuffer = Arc<FrameBuffer>;

/// Chroma plane size for a 4:2:0 frame (rounded up for odd dimensions).
#[inline]
pub fn chroma_dimensions(width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(2), height.div_ceil(2))
}

/// Full-range Rec.709 RGB to normalized (Y, Cb, Cr).
fn rec709_encode([r, g, b]: [f32; 3]) -> [f32; 3] {
    let y = 0.2126 * r + 0.7152 * g + 0.0722 * b;
    [y, (b - y) / 1.8556 + 0.5, (r - y) / 1.5748 + 0.5]
}

#[inline]
fn unit_to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nv12_planes() {
        let frame = FrameBuffer::new(1920, 1080, PixelFormat::Nv12);
        assert_eq!(frame.planes.len(), 2);
        assert_eq!(frame.luma().unwrap().width, 1920);
        assert_eq!(frame.chroma().unwrap().width, 960);
        assert_eq!(frame.chroma().unwrap().height, 540);
        assert_eq!(frame.chroma().unwrap().bytes_per_pixel, 2);
    }

    #[test]
    fn test_odd_dimensions_round_chroma_up() {
        let frame = FrameBuffer::new(5, 3, PixelFormat::Nv12);
        let chroma = frame.chroma().unwrap();
        assert_eq!((chroma.width, chroma.height), (3, 2));
    }

    #[test]
    fn test_unsupported_format_has_no_biplanar_access() {
        let frame = FrameBuffer::new(16, 16, PixelFormat::Bgra8);
        assert!(!frame.format.is_supported());
        assert!(frame.luma().is_none());
        assert!(frame.chroma().is_none());
    }

    #[test]
    fn test_nv12_rejects_mismatched_chroma() {
        let luma = FramePlane::new(8, 8, 1);
        let chroma = FramePlane::new(8, 8, 2);
        let err = FrameBuffer::nv12(8, 8, luma, chroma, Duration::ZERO);
        assert!(matches!(err, Err(ViewfinderError::InvalidFrame(_))));
    }

    #[test]
    fn test_plane_from_short_bytes_fails() {
        let result = FramePlane::from_bytes(vec![0u8; 10], 4, 4, 4, 1);
        assert!(result.is_err());
        let ok = FramePlane::from_bytes(vec![0u8; 16], 4, 4, 4, 1);
        assert!(ok.is_ok());
    }

    #[test]
    fn test_pattern_white_bar_is_neutral() {
        let frame = FrameBuffer::test_pattern(64, 16);
        let [y, cb, cr] = frame.ycbcr_at(0, 0).unwrap();
        assert!((y - 1.0).abs() < 0.01);
        assert!((cb - 0.5).abs() < 0.01);
        assert!((cr - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_pattern_black_bar_is_dark() {
        let frame = FrameBuffer::test_pattern(64, 16);
        let [y, _, _] = frame.ycbcr_at(63, 15).unwrap();
        assert!(y < 0.01);
    }

    #[test]
    fn test_pattern_fills_every_chroma_column() {
        // Odd width: the last chroma column covers a single luma column.
        let frame = FrameBuffer::test_pattern(63, 9);
        let chroma = frame.chroma().unwrap();
        assert_eq!((chroma.width, chroma.height), (32, 5));

        // Blue bar pushes Cb up, red bar pushes Cr up.
        let [_, cb, _] = frame.ycbcr_at(50, 8).unwrap();
        assert!(cb > 0.9, "cb {}", cb);
        let [_, _, cr] = frame.ycbcr_at(42, 0).unwrap();
        assert!(cr > 0.9, "cr {}", cr);

        let last = chroma.row(chroma.height - 1);
        let i = (chroma.width as usize - 1) * 2;
        assert_eq!((last[i], last[i + 1]), (128, 128));
    }

    #[test]
    fn test_empty_frame_is_reported() {
        assert!(FrameBuffer::new(0, 4, PixelFormat::Nv12).is_empty());
        assert!(FrameBuffer::new(4, 0, PixelFormat::Nv12).is_empty());
        assert!(!FrameBuffer::test_pattern(2, 2).is_empty());
    }
}
