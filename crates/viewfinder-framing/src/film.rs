//! Film format catalogue.

use serde::{Deserialize, Serialize};

/// A film (or sensor) format, described by its exposed image area.
///
/// Dimensions are in millimetres with the long edge first.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilmFormat {
    #[default]
    Full35,
    HalfFrame,
    Xpan,
    Medium645,
    Medium6x6,
    Medium6x7,
    Medium6x8,
    Medium6x9,
    Large4x5,
    Custom {
        width_mm: f32,
        height_mm: f32,
    },
}

impl FilmFormat {
    /// Every catalogued format in display order.
    pub const ALL: [FilmFormat; 9] = [
        Self::Full35,
        Self::HalfFrame,
        Self::Xpan,
        Self::Medium645,
        Self::Medium6x6,
        Self::Medium6x7,
        Self::Medium6x8,
        Self::Medium6x9,
        Self::Large4x5,
    ];

    /// Image area `(long edge, short edge)` in millimetres.
    pub fn dimensions_mm(self) -> (f32, f32) {
        match self {
            Self::Full35 => (36.0, 24.0),
            Self::HalfFrame => (24.0, 18.0),
            Self::Xpan => (65.0, 24.0),
            Self::Medium645 => (56.0, 41.5),
            Self::Medium6x6 => (56.0, 56.0),
            Self::Medium6x7 => (70.0, 56.0),
            Self::Medium6x8 => (77.0, 56.0),
            Self::Medium6x9 => (84.0, 56.0),
            Self::Large4x5 => (121.0, 97.0),
            Self::Custom {
                width_mm,
                height_mm,
            } => {
                if width_mm >= height_mm {
                    (width_mm, height_mm)
                } else {
                    (height_mm, width_mm)
                }
            }
        }
    }

    /// Long edge divided by short edge (always ≥ 1 for valid formats).
    pub fn aspect_ratio(self) -> f32 {
        let (w, h) = self.dimensions_mm();
        if h <= 0.0 {
            0.0
        } else {
            w / h
        }
    }

    /// Horizontal (long-edge) field of view in radians at `focal_length_mm`.
    pub fn horizontal_fov(self, focal_length_mm: f32) -> f32 {
        let (w, _) = self.dimensions_mm();
        2.0 * (w / (2.0 * focal_length_mm)).atan()
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Full35 => "35mm",
            Self::HalfFrame => "Half frame",
            Self::Xpan => "XPan",
            Self::Medium645 => "6×4.5",
            Self::Medium6x6 => "6×6",
            Self::Medium6x7 => "6×7",
            Self::Medium6x8 => "6×8",
            Self::Medium6x9 => "6×9",
            Self::Large4x5 => "4×5",
            Self::Custom { .. } => "Custom",
        }
    }
}
