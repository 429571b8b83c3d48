//! Viewfinder Color - YCbCr decoding, transfer functions and LUT grading.
//!
//! The functions here are the CPU reference of the fragment stage run by
//! `viewfinder-gpu`, and back the full-resolution develop used for captures.

pub mod develop;
pub mod error;
pub mod grading;
pub mod lut;
pub mod transfer;
pub mod ycbcr;

pub use develop::{develop_rgba8, shade};
pub use error::ColorError;
pub use grading::Grading;
pub use lut::{Lut3D, LutLoader};
pub use transfer::{rec709_inverse_oetf, rec709_oetf};
pub use ycbcr::ycbcr_to_rgb;
