//! Framing guide through to cropped captures.

use image::{Rgba, RgbaImage};
use viewfinder_core::{DeviceOrientation, ImageOrientation, Size};
use viewfinder_framing::{crop_capture, FilmFormat, FramingSpec};

fn spec(focal_length_mm: f32, container: Size, orientation: DeviceOrientation) -> FramingSpec {
    let film = FilmFormat::Full35;
    FramingSpec {
        focal_length_mm,
        film,
        // The device sees exactly what a 50mm lens sees on this film.
        device_hfov_deg: film.horizontal_fov(50.0).to_degrees(),
        container,
        orientation,
        aspect_ratio: None,
    }
}

fn gray_image(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_pixel(width, height, Rgba([128, 128, 128, 255]))
}

#[test]
fn matching_field_of_view_keeps_whole_capture() {
    let spec = spec(50.0, Size::new(1000.0, 1500.0), DeviceOrientation::Portrait);
    let guide = spec.guide();
    assert!((guide.width - 1000.0).abs() < 0.5, "{:?}", guide);
    assert!((guide.height - 1500.0).abs() < 0.5, "{:?}", guide);

    let cropped = crop_capture(
        &gray_image(300, 200),
        guide,
        spec.container,
        spec.orientation,
    );
    assert_eq!(cropped.image.dimensions(), (300, 200));
    assert_eq!(cropped.orientation, ImageOrientation::Right);
}

#[test]
fn longer_lens_crops_centre_of_portrait_capture() {
    let spec = spec(100.0, Size::new(400.0, 600.0), DeviceOrientation::Portrait);
    let guide = spec.guide();
    assert!((guide.width - 200.0).abs() < 0.5, "{:?}", guide);
    assert!((guide.height - 300.0).abs() < 0.5, "{:?}", guide);

    let cropped = crop_capture(
        &gray_image(600, 400),
        guide,
        spec.container,
        spec.orientation,
    );
    // Displayed 400x600, the guide covers the middle 200x300.
    assert_eq!(cropped.image.dimensions(), (300, 200));
    assert_eq!(cropped.oriented_size().width, 200);
    assert_eq!(cropped.sensor_rect.x, 150.0);
    assert_eq!(cropped.sensor_rect.y, 100.0);

    let meta = cropped.metadata();
    assert_eq!(meta.exif_orientation, 6);
    assert_eq!((meta.width, meta.height), (300, 200));
}

#[test]
fn square_mask_uses_guide_width() {
    let spec = FramingSpec {
        aspect_ratio: Some(1.0),
        ..spec(50.0, Size::new(1000.0, 1500.0), DeviceOrientation::Portrait)
    };
    let mask = spec.sub_frame().unwrap();
    assert!((mask.width - mask.height).abs() < 1e-3);
    assert!((mask.width - spec.guide().width).abs() < 1e-3);
}

#[test]
fn guide_rect_is_centred_in_container() {
    let spec = spec(100.0, Size::new(400.0, 600.0), DeviceOrientation::Portrait);
    let rect = spec.guide_rect();
    let centre = rect.center();
    assert!((centre.x - 200.0).abs() < 1e-3);
    assert!((centre.y - 300.0).abs() < 1e-3);
}

#[test]
fn spec_serializes_for_sidecars() {
    let spec = spec(35.0, Size::new(390.0, 844.0), DeviceOrientation::LandscapeRight);
    let json = serde_json_roundtrip(&spec);
    assert_eq!(json, spec);
}

fn serde_json_roundtrip(spec: &FramingSpec) -> FramingSpec {
    let text = serde_json::to_string(spec).unwrap();
    assert!(text.contains("landscape_right"));
    serde_json::from_str(&text).unwrap()
}
