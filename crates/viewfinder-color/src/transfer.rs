//! Rec.709 opto-electronic transfer function and its inverse.
#![allow(clippy::excessive_precision)]

/// Encoded value below which the inverse OETF is linear.
pub const REC709_INVERSE_BREAK: f32 = 0.081;
/// Linear value below which the OETF is linear.
pub const REC709_LINEAR_BREAK: f32 = 0.018;

const ALPHA: f32 = 1.099;
const BETA: f32 = 0.099;
const GAMMA: f32 = 0.45;
const LINEAR_SLOPE: f32 = 4.5;

/// Convert an encoded Rec.709 signal to scene-linear light.
#[inline]
pub fn rec709_inverse_oetf(v: f32) -> f32 {
    if v < REC709_INVERSE_BREAK {
        v / LINEAR_SLOPE
    } else {
        ((v + BETA) / ALPHA).powf(1.0 / GAMMA)
    }
}

/// Convert scene-linear light to an encoded Rec.709 signal.
#[inline]
pub fn rec709_oetf(v: f32) -> f32 {
    if v < REC709_LINEAR_BREAK {
        v * LINEAR_SLOPE
    } else {
        ALPHA * v.powf(GAMMA) - BETA
    }
}
