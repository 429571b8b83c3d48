//! Cropping full-resolution captures to the framing guide.
//!
//! Captured pixels stay in sensor orientation. The crop is computed in
//! display space, mapped back onto the sensor grid, and the result carries
//! the orientation tag needed to show it upright.

use crate::calculator::FramingCalculator;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;
use viewfinder_core::{DeviceOrientation, ImageOrientation, PixelSize, Rect, Size};

/// A capture cropped to the guide, still in sensor orientation.
#[derive(Debug, Clone)]
pub struct CroppedCapture {
    pub image: RgbaImage,
    pub orientation: ImageOrientation,
    /// Crop in sensor pixel coordinates.
    pub sensor_rect: Rect,
    /// Crop in display coordinates, as the user framed it.
    pub display_rect: Rect,
}

impl CroppedCapture {
    /// Size of the crop once displayed upright.
    pub fn oriented_size(&self) -> PixelSize {
        self.orientation
            .oriented_size(PixelSize::new(self.image.width(), self.image.height()))
    }

    /// Metadata describing the crop, without the pixels.
    pub fn metadata(&self) -> CropMetadata {
        CropMetadata {
            orientation: self.orientation,
            exif_orientation: self.orientation.exif_code(),
            sensor_rect: self.sensor_rect,
            display_rect: self.display_rect,
            width: self.image.width(),
            height: self.image.height(),
        }
    }
}

/// Serializable description of a [`CroppedCapture`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropMetadata {
    pub orientation: ImageOrientation,
    pub exif_orientation: u16,
    pub sensor_rect: Rect,
    pub display_rect: Rect,
    pub width: u32,
    pub height: u32,
}

/// Map a rectangle in display space onto the stored (sensor) pixel grid.
///
/// `oriented_size` is the displayed size of the stored image, i.e. after
/// applying `orientation`.
pub fn to_sensor_rect(rect: Rect, oriented_size: Size, orientation: ImageOrientation) -> Rect {
    let Size { width, height } = oriented_size;
    match orientation {
        ImageOrientation::Up => rect,
        ImageOrientation::Right => Rect::new(
            rect.y,
            width - rect.x - rect.width,
            rect.height,
            rect.width,
        ),
        ImageOrientation::Down => Rect::new(
            width - rect.x - rect.width,
            height - rect.y - rect.height,
            rect.width,
            rect.height,
        ),
        ImageOrientation::Left => Rect::new(
            height - rect.y - rect.height,
            rect.x,
            rect.height,
            rect.width,
        ),
    }
}

/// Crop a sensor-oriented capture to the guide framed in `container`.
///
/// `guide` and `container` are in display space for `device`. Falls back
/// to the full image when the guide cannot be mapped.
pub fn crop_capture(
    raw: &RgbaImage,
    guide: Size,
    container: Size,
    device: DeviceOrientation,
) -> CroppedCapture {
    let orientation = device.capture_orientation();
    let stored = Size::new(raw.width() as f32, raw.height() as f32);
    let displayed = orientation.oriented_size_f32(stored);

    let display_rect =
        FramingCalculator::crop_rect(displayed, guide, container, device.is_landscape());
    let sensor_rect = clamp_to(
        to_sensor_rect(display_rect, displayed, orientation).round(),
        raw.width(),
        raw.height(),
    );

    let image = image::imageops::crop_imm(
        raw,
        sensor_rect.x as u32,
        sensor_rect.y as u32,
        sensor_rect.width as u32,
        sensor_rect.height as u32,
    )
    .to_image();

    debug!(
        ?device,
        width = image.width(),
        height = image.height(),
        exif = orientation.exif_code(),
        "Cropped capture to guide"
    );

    CroppedCapture {
        image,
        orientation,
        sensor_rect,
        display_rect,
    }
}

fn clamp_to(rect: Rect, width: u32, height: u32) -> Rect {
    let (w, h) = (width as f32, height as f32);
    let x = rect.x.clamp(0.0, (w - 1.0).max(0.0));
    let y = rect.y.clamp(0.0, (h - 1.0).max(0.0));
    let rw = rect.width.clamp(1.0, w - x);
    let rh = rect.height.clamp(1.0, h - y);
    Rect::new(x, y, rw, rh)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const ALL_ORIENTATIONS: [ImageOrientation; 4] = [
        ImageOrientation::Up,
        ImageOrientation::Right,
        ImageOrientation::Down,
        ImageOrientation::Left,
    ];

    /// Pixel (x, y) stores its own coordinates in R and G.
    fn coordinate_image(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn full_display_rect_maps_to_full_sensor_rect() {
        let stored = Size::new(400.0, 300.0);
        for orientation in ALL_ORIENTATIONS {
            let displayed = orientation.oriented_size_f32(stored);
            let rect = to_sensor_rect(Rect::from_size(displayed), displayed, orientation);
            assert_eq!(rect, Rect::from_size(stored), "{:?}", orientation);
        }
    }

    #[test]
    fn right_orientation_maps_display_left_edge_to_sensor_bottom() {
        // Displayed 300x400; a strip on the display's left edge sits at the
        // bottom of the stored 400x300 image.
        let rect = to_sensor_rect(
            Rect::new(0.0, 0.0, 50.0, 400.0),
            Size::new(300.0, 400.0),
            ImageOrientation::Right,
        );
        assert_eq!(rect, Rect::new(0.0, 250.0, 400.0, 50.0));
    }

    #[test]
    fn left_orientation_maps_display_top_edge_to_sensor_right() {
        let rect = to_sensor_rect(
            Rect::new(0.0, 0.0, 300.0, 40.0),
            Size::new(300.0, 400.0),
            ImageOrientation::Left,
        );
        assert_eq!(rect, Rect::new(360.0, 0.0, 40.0, 300.0));
    }

    #[test]
    fn portrait_capture_is_cropped_in_sensor_space() {
        let raw = coordinate_image(200, 100);
        // Displayed 100x200; guide is the middle half horizontally.
        let cropped = crop_capture(
            &raw,
            Size::new(50.0, 200.0),
            Size::new(100.0, 200.0),
            DeviceOrientation::Portrait,
        );
        assert_eq!(cropped.orientation, ImageOrientation::Right);
        assert_eq!(cropped.display_rect, Rect::new(25.0, 0.0, 50.0, 200.0));
        assert_eq!(cropped.sensor_rect, Rect::new(0.0, 25.0, 200.0, 50.0));
        assert_eq!(cropped.image.dimensions(), (200, 50));
        assert_eq!(cropped.oriented_size(), PixelSize::new(50, 200));
        assert_eq!(cropped.image.get_pixel(0, 0).0[1], 25);
    }

    #[test]
    fn landscape_capture_keeps_orientation() {
        let raw = coordinate_image(200, 100);
        let cropped = crop_capture(
            &raw,
            Size::new(100.0, 50.0),
            Size::new(200.0, 100.0),
            DeviceOrientation::LandscapeLeft,
        );
        assert_eq!(cropped.orientation, ImageOrientation::Up);
        assert_eq!(cropped.image.dimensions(), (100, 50));
        assert_eq!(cropped.image.get_pixel(0, 0).0[..2], [50, 25]);
    }

    #[test]
    fn invalid_guide_keeps_full_capture() {
        let raw = coordinate_image(64, 48);
        let cropped = crop_capture(
            &raw,
            Size::ZERO,
            Size::new(48.0, 64.0),
            DeviceOrientation::PortraitUpsideDown,
        );
        assert_eq!(cropped.image.dimensions(), (64, 48));
        assert_eq!(cropped.metadata().exif_orientation, 8);
    }
}
