//! Viewfinder Framing - optical framing guides and pixel-accurate crops.
//!
//! Given a focal length and a film format, the calculator answers two
//! questions: how large the format's field of view appears inside the live
//! preview (the guide rectangle), and which pixels of a captured frame that
//! guide corresponds to (the crop rectangle).

pub mod calculator;
pub mod crop;
pub mod film;

pub use calculator::{FramingCalculator, FramingSpec};
pub use crop::{crop_capture, to_sensor_rect, CropMetadata, CroppedCapture};
pub use film::FilmFormat;
