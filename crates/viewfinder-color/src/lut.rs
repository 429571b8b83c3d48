//! .cube 3D LUT parsing and CPU sampling.

use crate::error::ColorError;
use std::path::Path;
use tracing::{debug, trace, warn};

const SIZE_DIRECTIVE: &str = "LUT_3D_SIZE";

/// 3D Look-Up Table stored as an RGBA float grid.
///
/// Entry `(x, y, z)` lives at index `x + N·y + N²·z`, where `x` is the axis
/// that varies fastest in the source file. Alpha is always 1.
#[derive(Debug, Clone, PartialEq)]
pub struct Lut3D {
    size: usize,
    data: Vec<[f32; 4]>,
}

impl Lut3D {
    /// Parse a .cube file containing a 3D LUT.
    pub fn from_cube(content: &str) -> Result<Self, ColorError> {
        let mut size = None;
        let mut entries = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            if is_size_directive(line) {
                let token = line.split_whitespace().last().unwrap_or_default();
                let n = token
                    .parse::<usize>()
                    .map_err(|e| ColorError::BadSize(format!("{:?}: {}", token, e)))?;
                size = Some(n);
                continue;
            }

            match parse_triplet(line) {
                Some(rgb) => entries.push(rgb),
                None => trace!(line = line_no + 1, "Skipping non-entry LUT line"),
            }
        }

        let size = size.ok_or(ColorError::MissingSize)?;
        Self::from_entries(size, entries)
    }

    /// Build a LUT from RGB entries in file order.
    pub fn from_entries(size: usize, entries: Vec<[f32; 3]>) -> Result<Self, ColorError> {
        if size == 0 {
            return Err(ColorError::BadSize("size must be positive".into()));
        }
        let expected = size
            .checked_pow(3)
            .ok_or_else(|| ColorError::BadSize(format!("{} overflows", size)))?;
        if entries.len() != expected {
            return Err(ColorError::DimensionMismatch {
                expected,
                got: entries.len(),
            });
        }

        Ok(Self {
            size,
            data: entries.into_iter().map(|[r, g, b]| [r, g, b, 1.0]).collect(),
        })
    }

    /// An identity LUT of the given size.
    ///
    /// Sizes below 2 are raised to 2: an identity grid needs both ends of
    /// each axis.
    pub fn identity(size: usize) -> Self {
        let size = size.max(2);
        let n = (size - 1) as f32;
        let mut data = Vec::with_capacity(size * size * size);
        for z in 0..size {
            for y in 0..size {
                for x in 0..size {
                    data.push([x as f32 / n, y as f32 / n, z as f32 / n, 1.0]);
                }
            }
        }
        Self { size, data }
    }

    /// Grid edge length N.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// All N³ RGBA entries in index order.
    #[inline]
    pub fn entries(&self) -> &[[f32; 4]] {
        &self.data
    }

    /// Flat RGBA floats, ready for texture upload.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.data)
    }

    /// Linear index of grid coordinate `(x, y, z)`.
    #[inline]
    pub fn index(&self, x: usize, y: usize, z: usize) -> usize {
        x + self.size * y + self.size * self.size * z
    }

    /// Entry at grid coordinate `(x, y, z)`.
    #[inline]
    pub fn get(&self, x: usize, y: usize, z: usize) -> [f32; 4] {
        self.data[self.index(x, y, z)]
    }

    /// Trilinearly sample the LUT; inputs are clamped to [0, 1].
    pub fn sample(&self, rgb: [f32; 3]) -> [f32; 3] {
        let s = self.size;
        if s == 1 {
            let [r, g, b, _] = self.data[0];
            return [r, g, b];
        }
        let n = (s - 1) as f32;
        let coords = rgb.map(|v| v.clamp(0.0, 1.0) * n);

        let r0 = (coords[0] as usize).min(s - 2);
        let g0 = (coords[1] as usize).min(s - 2);
        let b0 = (coords[2] as usize).min(s - 2);
        let fr = coords[0] - r0 as f32;
        let fg = coords[1] - g0 as f32;
        let fb = coords[2] - b0 as f32;

        let c000 = self.get(r0, g0, b0);
        let c100 = self.get(r0 + 1, g0, b0);
        let c010 = self.get(r0, g0 + 1, b0);
        let c110 = self.get(r0 + 1, g0 + 1, b0);
        let c001 = self.get(r0, g0, b0 + 1);
        let c101 = self.get(r0 + 1, g0, b0 + 1);
        let c011 = self.get(r0, g0 + 1, b0 + 1);
        let c111 = self.get(r0 + 1, g0 + 1, b0 + 1);

        let mut out = [0.0f32; 3];
        for c in 0..3 {
            let c00 = c000[c] * (1.0 - fr) + c100[c] * fr;
            let c10 = c010[c] * (1.0 - fr) + c110[c] * fr;
            let c01 = c001[c] * (1.0 - fr) + c101[c] * fr;
            let c11 = c011[c] * (1.0 - fr) + c111[c] * fr;
            let c0 = c00 * (1.0 - fg) + c10 * fg;
            let c1 = c01 * (1.0 - fg) + c11 * fg;
            out[c] = c0 * (1.0 - fb) + c1 * fb;
        }
        out
    }
}

/// Loads LUT assets, degrading to "no LUT" instead of failing.
pub struct LutLoader;

impl LutLoader {
    /// Parse LUT text; invalid input is logged and yields `None`.
    pub fn parse(content: &str) -> Option<Lut3D> {
        match Lut3D::from_cube(content) {
            Ok(lut) => {
                debug!(size = lut.size(), "Parsed 3D LUT");
                Some(lut)
            }
            Err(e) => {
                warn!(error = %e, "LUT unavailable, grading falls back to identity");
                None
            }
        }
    }

    /// Read and parse a LUT file; unreadable or invalid files yield `None`.
    pub fn load(path: &Path) -> Option<Lut3D> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read LUT file");
                None
            }
        }
    }
}

fn is_size_directive(line: &str) -> bool {
    line.get(..SIZE_DIRECTIVE.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(SIZE_DIRECTIVE))
}

fn parse_triplet(line: &str) -> Option<[f32; 3]> {
    let mut values = line.split_whitespace().map(|s| s.parse::<f32>());
    let r = values.next()?.ok()?;
    let g = values.next()?.ok()?;
    let b = values.next()?.ok()?;
    if values.next().is_some() {
        return None;
    }
    Some([r, g, b])
}
