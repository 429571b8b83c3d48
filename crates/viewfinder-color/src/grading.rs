//! Grading stage: 3D LUT or identity.

use crate::lut::{Lut3D, LutLoader};

/// The grading applied to scene-linear RGB.
#[derive(Debug, Clone, Default)]
pub enum Grading {
    /// Pass scene-linear values through unchanged.
    #[default]
    Identity,
    /// Trilinear lookup into a 3D LUT.
    Lut(Lut3D),
}

impl Grading {
    /// Grading from LUT text, falling back to identity when it is invalid.
    pub fn from_cube(content: &str) -> Self {
        LutLoader::parse(content).into()
    }

    /// The LUT, if one is loaded.
    pub fn lut(&self) -> Option<&Lut3D> {
        match self {
            Self::Identity => None,
            Self::Lut(lut) => Some(lut),
        }
    }

    /// Apply the grading to a linear RGB value.
    #[inline]
    pub fn apply(&self, rgb: [f32; 3]) -> [f32; 3] {
        match self {
            Self::Identity => rgb,
            Self::Lut(lut) => lut.sample(rgb),
        }
    }
}

impl From<Option<Lut3D>> for Grading {
    fn from(lut: Option<Lut3D>) -> Self {
        lut.map_or(Self::Identity, Self::Lut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_invalid_cube_degrades_to_identity() {
        let grading = Grading::from_cube("LUT_3D_SIZE 3\n0 0 0\n");
        assert!(grading.lut().is_none());
    }

    proptest! {
        #[test]
        fn prop_identity_passes_values_through(
            r in -0.5f32..1.5, g in -0.5f32..1.5, b in -0.5f32..1.5
        ) {
            let out = Grading::from_cube("LUT_3D_SIZE 0\n").apply([r, g, b]);
            prop_assert!((out[0] - r).abs() < 1e-6);
            prop_assert!((out[1] - g).abs() < 1e-6);
            prop_assert!((out[2] - b).abs() < 1e-6);
        }

        #[test]
        fn prop_identity_lut_matches_identity_in_range(
            r in 0f32..1.0, g in 0f32..1.0, b in 0f32..1.0
        ) {
            let out = Grading::Lut(Lut3D::identity(17)).apply([r, g, b]);
            prop_assert!((out[0] - r).abs() < 1e-5);
            prop_assert!((out[1] - g).abs() < 1e-5);
            prop_assert!((out[2] - b).abs() < 1e-5);
        }
    }
}
