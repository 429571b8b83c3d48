//! Framing math: guide rectangle, aspect masks and capture crops.
//!
//! All inputs are in the *display* orientation of the preview container.
//! The container's vertical extent is aligned with the sensor's long axis,
//! so the guide's major edge is always its height.

use crate::film::FilmFormat;
use serde::{Deserialize, Serialize};
use tracing::debug;
use viewfinder_core::{DeviceOrientation, Rect, Size};

/// Slack allowed when comparing a crop against the image bounds.
const BOUNDS_EPSILON: f32 = 1e-3;

/// Stateless framing calculations.
pub struct FramingCalculator;

impl FramingCalculator {
    /// On-screen guide size for `film` at `focal_length_mm`.
    ///
    /// The container height is held fixed and scaled by the ratio of the
    /// film's and the device's half-angle tangents. Returns [`Size::ZERO`]
    /// for non-physical inputs.
    pub fn guide_frame(
        container: Size,
        focal_length_mm: f32,
        film: FilmFormat,
        device_hfov: f32,
    ) -> Size {
        let aspect = film.aspect_ratio();
        if !container.is_valid()
            || focal_length_mm <= 0.0
            || !(device_hfov > 0.0 && device_hfov < std::f32::consts::PI)
            || aspect <= 0.0
        {
            return Size::ZERO;
        }

        let film_hfov = film.horizontal_fov(focal_length_mm);
        let major = container.height * (film_hfov / 2.0).tan() / (device_hfov / 2.0).tan();
        let minor = major / aspect;
        Size::new(minor, major)
    }

    /// Constrain `frame` to `aspect_ratio`, holding the height fixed in
    /// landscape and the width fixed otherwise.
    pub fn aspect_sub_frame(frame: Size, aspect_ratio: f32, is_landscape: bool) -> Option<Size> {
        if aspect_ratio.is_nan() || aspect_ratio <= 0.0 {
            return None;
        }
        Some(if is_landscape {
            Size::new(frame.height * aspect_ratio, frame.height)
        } else {
            Size::new(frame.width, frame.width * aspect_ratio)
        })
    }

    /// Pixel crop of a captured image matching `guide` inside `container`.
    ///
    /// `captured`, `guide` and `container` are in display orientation; the
    /// result is too. The math runs in landscape-normalized space: the guide
    /// is scaled by the image/container ratio and centred in the image. When
    /// the crop would not fit, the whole image is returned.
    pub fn crop_rect(captured: Size, guide: Size, container: Size, is_landscape: bool) -> Rect {
        let full = Rect::from_size(captured);
        let normalize = |s: Size| if is_landscape { s } else { s.transposed() };

        let image = normalize(captured);
        let container = normalize(container);
        let guide = normalize(guide);

        if !image.is_valid() || !container.is_valid() || !guide.is_valid() {
            debug!(?captured, ?guide, ?container, "Degenerate crop input, keeping full image");
            return full;
        }

        let scale_x = image.width / container.width;
        let scale_y = image.height / container.height;
        let crop = Size::new(guide.width * scale_x, guide.height * scale_y);
        if !crop.is_valid()
            || crop.width > image.width + BOUNDS_EPSILON
            || crop.height > image.height + BOUNDS_EPSILON
        {
            debug!(?crop, ?image, "Crop exceeds image bounds, keeping full image");
            return full;
        }

        let x = ((image.width - crop.width) / 2.0).max(0.0);
        let y = ((image.height - crop.height) / 2.0).max(0.0);
        let landscape = Rect::new(x, y, crop.width, crop.height);

        if is_landscape {
            landscape
        } else {
            Rect::new(landscape.y, landscape.x, landscape.height, landscape.width)
        }
    }
}

/// Immutable framing inputs; outputs are recomputed on every call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FramingSpec {
    pub focal_length_mm: f32,
    pub film: FilmFormat,
    /// Device horizontal (long-edge) field of view in degrees.
    pub device_hfov_deg: f32,
    pub container: Size,
    pub orientation: DeviceOrientation,
    /// Optional mask aspect ratio (long edge / short edge).
    #[serde(default)]
    pub aspect_ratio: Option<f32>,
}

impl FramingSpec {
    /// Guide size inside the container.
    pub fn guide(&self) -> Size {
        FramingCalculator::guide_frame(
            self.container,
            self.focal_length_mm,
            self.film,
            self.device_hfov_deg.to_radians(),
        )
    }

    /// Guide rectangle centred in the container, for overlay drawing.
    pub fn guide_rect(&self) -> Rect {
        Rect::from_center_size(Rect::from_size(self.container).center(), self.guide())
    }

    /// Aspect-masked sub-frame of the guide, if a mask ratio is set.
    pub fn sub_frame(&self) -> Option<Size> {
        let ratio = self.aspect_ratio?;
        FramingCalculator::aspect_sub_frame(self.guide(), ratio, self.orientation.is_landscape())
    }

    /// Crop of a captured image (in display orientation) matching the guide.
    pub fn crop(&self, captured: Size) -> Rect {
        FramingCalculator::crop_rect(
            captured,
            self.guide(),
            self.container,
            self.orientation.is_landscape(),
        )
    }
}
