//! Writes delivered captures to disk.
//!
//! Each capture produces three files sharing a stem:
//! - `<stem>-preview.png`: the graded viewport image, as shown on screen
//! - `<stem>.png`: the full-resolution develop cropped to the guide frame,
//!   stored in sensor orientation
//! - `<stem>.json`: orientation tag, crop rectangles and framing inputs

use anyhow::{Context, Result};
use image::RgbaImage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;
use viewfinder_color::{develop_rgba8, Grading};
use viewfinder_core::{PixelSize, Size};
use viewfinder_framing::{crop_capture, CropMetadata, FramingSpec};
use viewfinder_render::CapturedFrame;

/// Sidecar written next to each capture.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureRecord {
    pub index: u32,
    /// Sequence number of the camera frame that was captured.
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub source_size: PixelSize,
    pub viewport: PixelSize,
    pub preview: PathBuf,
    pub image: PathBuf,
    pub crop: CropMetadata,
    pub framing: FramingSpec,
}

pub struct CaptureSink {
    output_dir: PathBuf,
    framing: FramingSpec,
    grading: Grading,
    written: u32,
}

impl CaptureSink {
    /// Create the output directory if needed.
    pub fn new(output_dir: &Path, framing: FramingSpec, grading: Grading) -> Result<Self> {
        std::fs::create_dir_all(output_dir)
            .with_context(|| format!("creating output directory {}", output_dir.display()))?;
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            framing,
            grading,
            written: 0,
        })
    }

    pub fn written(&self) -> u32 {
        self.written
    }

    /// Develop, crop and write `captured`.
    pub fn save(&mut self, captured: &CapturedFrame) -> Result<CaptureRecord> {
        let index = self.written + 1;
        let stem = format!("capture-{:04}", index);
        let preview_path = self.output_dir.join(format!("{}-preview.png", stem));
        let image_path = self.output_dir.join(format!("{}.png", stem));
        let sidecar_path = self.output_dir.join(format!("{}.json", stem));

        captured
            .image
            .save(&preview_path)
            .with_context(|| format!("writing {}", preview_path.display()))?;

        let source = &captured.source;
        let pixels = develop_rgba8(source, &self.grading).context("developing capture")?;
        let raw = RgbaImage::from_raw(source.width, source.height, pixels)
            .context("developed buffer does not match frame size")?;

        // The guide is framed in the viewport the capture was drawn for.
        let framing = FramingSpec {
            container: Size::from(captured.viewport),
            orientation: captured.orientation,
            ..self.framing
        };
        let cropped = crop_capture(
            &raw,
            framing.guide(),
            framing.container,
            captured.orientation,
        );
        cropped
            .image
            .save(&image_path)
            .with_context(|| format!("writing {}", image_path.display()))?;

        let record = CaptureRecord {
            index,
            sequence: captured.sequence,
            timestamp_ms: source.timestamp.as_millis() as u64,
            source_size: source.size(),
            viewport: captured.viewport,
            preview: preview_path,
            image: image_path,
            crop: cropped.metadata(),
            framing,
        };
        let json = serde_json::to_vec_pretty(&record).context("serializing capture record")?;
        std::fs::write(&sidecar_path, json)
            .with_context(|| format!("writing {}", sidecar_path.display()))?;

        self.written = index;
        info!(
            index,
            sequence = captured.sequence,
            width = cropped.image.width(),
            height = cropped.image.height(),
            exif = record.crop.exif_orientation,
            "Capture saved"
        );
        Ok(record)
    }
}
