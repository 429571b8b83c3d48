//! Full-range Rec.709 YCbCr to RGB conversion.

/// Cr contribution to red.
pub const KR_CR: f32 = 1.5748;
/// Cb contribution to green.
pub const KG_CB: f32 = 0.1873;
/// Cr contribution to green.
pub const KG_CR: f32 = 0.4681;
/// Cb contribution to blue.
pub const KB_CB: f32 = 1.8556;

/// Convert normalized full-range (Y, Cb, Cr) to non-linear RGB.
///
/// Results are not clamped; out-of-gamut chroma may leave [0, 1].
#[inline]
pub fn ycbcr_to_rgb([y, cb, cr]: [f32; 3]) -> [f32; 3] {
    let cb = cb - 0.5;
    let cr = cr - 0.5;
    [y + KR_CR * cr, y - KG_CB * cb - KG_CR * cr, y + KB_CB * cb]
}
