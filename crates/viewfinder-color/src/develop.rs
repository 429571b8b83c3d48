//! CPU develop path: biplanar frame to graded RGBA8.
//!
//! Mirrors the fragment stage of the GPU color pipeline step for step. Used
//! to develop full-resolution captures and as the reference in tests.

use crate::error::ColorError;
use crate::grading::Grading;
use crate::transfer::rec709_inverse_oetf;
use crate::ycbcr::ycbcr_to_rgb;
use rayon::prelude::*;
use tracing::debug;
use viewfinder_core::FrameBuffer;

/// Shade one texel: YCbCr → RGB → scene-linear → graded → clamped.
#[inline]
pub fn shade(ycbcr: [f32; 3], grading: &Grading) -> [f32; 3] {
    let linear = ycbcr_to_rgb(ycbcr).map(rec709_inverse_oetf);
    grading.apply(linear).map(|v| v.clamp(0.0, 1.0))
}

/// Develop a biplanar frame into tightly packed RGBA8 at full resolution.
///
/// Chroma is taken from the nearest 2×2 block. Rows are processed in
/// parallel.
pub fn develop_rgba8(frame: &FrameBuffer, grading: &Grading) -> Result<Vec<u8>, ColorError> {
    if !frame.format.is_supported() {
        return Err(ColorError::UnsupportedFrame(format!("{:?}", frame.format)));
    }
    if frame.is_empty() {
        return Err(ColorError::EmptyFrame {
            width: frame.width,
            height: frame.height,
        });
    }
    let start = std::time::Instant::now();
    let width = frame.width as usize;
    let mut out = vec![0u8; width * frame.height as usize * 4];

    out.par_chunks_mut(width * 4)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.chunks_exact_mut(4).enumerate() {
                let ycbcr = frame
                    .ycbcr_at(x as u32, y as u32)
                    .unwrap_or([0.0, 0.5, 0.5]);
                let [r, g, b] = shade(ycbcr, grading);
                px[0] = (r * 255.0).round() as u8;
                px[1] = (g * 255.0).round() as u8;
                px[2] = (b * 255.0).round() as u8;
                px[3] = 255;
            }
        });

    debug!(
        width = frame.width,
        height = frame.height,
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        "Developed frame on CPU"
    );
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lut::Lut3D;
    use viewfinder_core::PixelFormat;

    #[test]
    fn test_neutral_gray_shades_to_linear_gray() {
        let [r, g, b] = shade([0.5, 0.5, 0.5], &Grading::Identity);
        let expected = rec709_inverse_oetf(0.5);
        assert!((r - expected).abs() < 1e-6);
        assert!((g - expected).abs() < 1e-6);
        assert!((b - expected).abs() < 1e-6);
    }

    #[test]
    fn test_output_is_clamped() {
        let out = shade([1.0, 1.0, 1.0], &Grading::Identity);
        assert!(out.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn test_inverting_lut_is_applied() {
        let mut entries = Vec::new();
        for z in 0..2 {
            for y in 0..2 {
                for x in 0..2 {
                    entries.push([1.0 - x as f32, 1.0 - y as f32, 1.0 - z as f32]);
                }
            }
        }
        let grading = Grading::Lut(Lut3D::from_entries(2, entries).unwrap());
        let [r, _, _] = shade([0.0, 0.5, 0.5], &grading);
        assert!((r - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_develop_test_pattern() {
        let frame = FrameBuffer::test_pattern(16, 4);
        let rgba = develop_rgba8(&frame, &Grading::Identity).unwrap();
        assert_eq!(rgba.len(), 16 * 4 * 4);
        // White bar stays white, black bar stays black.
        assert!(rgba[0] > 250 && rgba[1] > 250 && rgba[2] > 250);
        let last = rgba.len() - 4;
        assert!(rgba[last] < 5 && rgba[last + 1] < 5 && rgba[last + 2] < 5);
        assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));
    }

    #[test]
    fn test_develop_rejects_unsupported_format() {
        let frame = FrameBuffer::new(4, 4, PixelFormat::Bgra8);
        assert!(matches!(
            develop_rgba8(&frame, &Grading::Identity),
            Err(ColorError::UnsupportedFrame(_))
        ));
    }

    #[test]
    fn test_develop_rejects_empty_frame() {
        for (w, h) in [(0, 4), (4, 0)] {
            let frame = FrameBuffer::new(w, h, PixelFormat::Nv12);
            assert!(matches!(
                develop_rgba8(&frame, &Grading::Identity),
                Err(ColorError::EmptyFrame { .. })
            ));
        }
    }
}
