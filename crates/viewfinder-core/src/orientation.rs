//! Device and image orientation tags.
//!
//! Camera sensors deliver landscape-native frames. The device orientation at
//! capture time decides how those pixels must be rotated to appear upright,
//! which is recorded as an EXIF-style [`ImageOrientation`] instead of
//! rotating the pixels themselves.

use crate::geometry::{PixelSize, Size};
use serde::{Deserialize, Serialize};

/// Physical orientation of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    /// Rotated counter-clockwise; the sensor's native orientation.
    LandscapeLeft,
    LandscapeRight,
}

impl DeviceOrientation {
    /// True for either landscape orientation.
    #[inline]
    pub fn is_landscape(self) -> bool {
        matches!(self, Self::LandscapeLeft | Self::LandscapeRight)
    }

    /// Tag that renders a sensor image captured in this orientation upright.
    pub fn capture_orientation(self) -> ImageOrientation {
        match self {
            Self::Portrait => ImageOrientation::Right,
            Self::PortraitUpsideDown => ImageOrientation::Left,
            Self::LandscapeLeft => ImageOrientation::Up,
            Self::LandscapeRight => ImageOrientation::Down,
        }
    }
}

/// How stored pixels must be rotated clockwise to display upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageOrientation {
    #[default]
    Up,
    /// Rotate 90° clockwise.
    Right,
    /// Rotate 180°.
    Down,
    /// Rotate 90° counter-clockwise.
    Left,
}

impl ImageOrientation {
    /// EXIF `Orientation` tag value.
    pub fn exif_code(self) -> u16 {
        match self {
            Self::Up => 1,
            Self::Down => 3,
            Self::Right => 6,
            Self::Left => 8,
        }
    }

    /// True when displaying swaps width and height.
    #[inline]
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Right | Self::Left)
    }

    /// Displayed size of stored pixels with this tag.
    pub fn oriented_size(self, stored: PixelSize) -> PixelSize {
        if self.is_quarter_turn() {
            PixelSize::new(stored.height, stored.width)
        } else {
            stored
        }
    }

    /// Floating-point variant of [`Self::oriented_size`].
    pub fn oriented_size_f32(self, stored: Size) -> Size {
        if self.is_quarter_turn() {
            stored.transposed()
        } else {
            stored
        }
    }
}
