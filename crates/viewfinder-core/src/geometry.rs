//! Geometric primitives for framing and viewport math.

use bytemuck::{Pod, Zeroable};
use glam::Vec2 as GlamVec2;
use serde::{Deserialize, Serialize};

/// 2D vector.
pub type Vec2 = GlamVec2;

/// Floating-point size in points or pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Zero size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// The same size with width and height exchanged.
    #[inline]
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    /// True when the width is at least the height.
    #[inline]
    pub fn is_landscape(self) -> bool {
        self.width >= self.height
    }

    /// This size with the long edge horizontal.
    #[inline]
    pub fn to_landscape(self) -> Self {
        if self.is_landscape() {
            self
        } else {
            self.transposed()
        }
    }

    /// True when both dimensions are finite and positive.
    #[inline]
    pub fn is_valid(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl From<PixelSize> for Size {
    fn from(size: PixelSize) -> Self {
        Self::new(size.width as f32, size.height as f32)
    }
}

/// Integer size of a texture, drawable or image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    /// Create a new pixel size.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True if either dimension is zero.
    #[inline]
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl std::fmt::Display for PixelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, Pod, Zeroable)]
#[repr(C)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Rectangle at the origin covering `size`.
    #[inline]
    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }

    /// Create a rectangle from center and size.
    pub fn from_center_size(center: Vec2, size: Size) -> Self {
        Self {
            x: center.x - size.width * 0.5,
            y: center.y - size.height * 0.5,
            width: size.width,
            height: size.height,
        }
    }

    /// Center point.
    #[inline]
    pub fn center(self) -> Vec2 {
        Vec2::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    /// Size of the rectangle.
    #[inline]
    pub fn size(self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Round to whole pixels (origin floored, size rounded).
    pub fn round(self) -> Self {
        Self::new(
            self.x.floor(),
            self.y.floor(),
            self.width.round(),
            self.height.round(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_from_center_size() {
        let r = Rect::from_center_size(Vec2::new(500.0, 500.0), Size::new(500.0, 1000.0));
        assert_eq!(r, Rect::new(250.0, 0.0, 500.0, 1000.0));
    }

    #[test]
    fn test_size_to_landscape() {
        assert_eq!(Size::new(3.0, 4.0).to_landscape(), Size::new(4.0, 3.0));
        assert_eq!(Size::new(4.0, 3.0).to_landscape(), Size::new(4.0, 3.0));
        assert!(!Size::new(0.0, 3.0).is_valid());
        assert!(!Size::new(f32::NAN, 3.0).is_valid());
    }

    #[test]
    fn test_round_floors_origin() {
        let r = Rect::new(10.7, -0.2, 99.5, 50.4).round();
        assert_eq!(r, Rect::new(10.0, -1.0, 100.0, 50.0));
    }

    proptest! {
        #[test]
        fn prop_from_center_size_keeps_center(
            cx in -5000f32..5000.0, cy in -5000f32..5000.0,
            w in 0f32..5000.0, h in 0f32..5000.0
        ) {
            let rect = Rect::from_center_size(Vec2::new(cx, cy), Size::new(w, h));
            prop_assert!((rect.center().x - cx).abs() < 1e-2);
            prop_assert!((rect.center().y - cy).abs() < 1e-2);
            prop_assert_eq!(rect.size(), Size::new(w, h));
        }

        #[test]
        fn prop_to_landscape_is_landscape_and_idempotent(w in 0f32..1e4, h in 0f32..1e4) {
            let landscape = Size::new(w, h).to_landscape();
            prop_assert!(landscape.is_landscape());
            prop_assert_eq!(landscape.to_landscape(), landscape);
            prop_assert_eq!(landscape.transposed().transposed(), landscape);
        }
    }
}
