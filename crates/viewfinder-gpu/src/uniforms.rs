//! Per-draw uniforms and the static quad geometry.
//!
//! The vertex stage maps destination UVs onto source UVs. The destination is
//! filled edge to edge: whichever axis of the video overflows the viewport
//! is scaled around the centre, so the frame is cropped rather than
//! letterboxed. Portrait draws additionally rotate the landscape-native
//! sensor frame 90° clockwise.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use viewfinder_core::PixelSize;

/// What a single draw needs to place a frame in a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawUniforms {
    /// Landscape sensor frame shown upright in a portrait destination.
    Portrait { viewport: PixelSize, source: PixelSize },
    /// Frame shown without rotation.
    Landscape { viewport: PixelSize, source: PixelSize },
}

impl DrawUniforms {
    /// Pick the variant for a viewport: portrait destinations of landscape
    /// sources rotate, everything else does not.
    pub fn fit(viewport: PixelSize, source: PixelSize) -> Self {
        let portrait_view = viewport.height > viewport.width;
        let landscape_source = source.width >= source.height;
        if portrait_view && landscape_source {
            Self::Portrait { viewport, source }
        } else {
            Self::Landscape { viewport, source }
        }
    }

    pub fn viewport(&self) -> PixelSize {
        match *self {
            Self::Portrait { viewport, .. } | Self::Landscape { viewport, .. } => viewport,
        }
    }

    pub fn source(&self) -> PixelSize {
        match *self {
            Self::Portrait { source, .. } | Self::Landscape { source, .. } => source,
        }
    }

    #[inline]
    pub fn rotates(&self) -> bool {
        matches!(self, Self::Portrait { .. })
    }

    /// Pack into the layout the shader expects.
    pub fn pack(&self) -> RawUniforms {
        let viewport = self.viewport();
        let source = self.source();
        let (video_w, video_h) = if self.rotates() {
            (source.height as f32, source.width as f32)
        } else {
            (source.width as f32, source.height as f32)
        };

        let mut uv_scale = [1.0f32, 1.0];
        if video_h > 0.0 && viewport.height > 0 {
            let video_aspect = video_w / video_h;
            let view_aspect = viewport.width as f32 / viewport.height as f32;
            if view_aspect > video_aspect {
                uv_scale[1] = video_aspect / view_aspect;
            } else if view_aspect > 0.0 {
                uv_scale[0] = view_aspect / video_aspect;
            }
        }

        RawUniforms {
            uv_scale,
            rotate: u32::from(self.rotates()),
            _padding: 0,
            viewport: [viewport.width as f32, viewport.height as f32],
            source: [source.width as f32, source.height as f32],
        }
    }

    /// CPU mirror of the vertex-stage remap: destination UV to source UV.
    pub fn source_uv(&self, uv: Vec2) -> Vec2 {
        let raw = self.pack();
        let scaled = (uv - Vec2::splat(0.5)) * Vec2::from(raw.uv_scale) + Vec2::splat(0.5);
        if raw.rotate != 0 {
            Vec2::new(scaled.y, 1.0 - scaled.x)
        } else {
            scaled
        }
    }
}

/// Uniform block shared by both fragment entry points.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct RawUniforms {
    pub uv_scale: [f32; 2],
    pub rotate: u32,
    pub _padding: u32,
    pub viewport: [f32; 2],
    pub source: [f32; 2],
}

/// Vertex of the full-screen quad.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

impl QuadVertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

    /// Triangle-strip quad covering clip space, UV origin top-left.
    pub const QUAD: [QuadVertex; 4] = [
        QuadVertex {
            position: [-1.0, 1.0],
            uv: [0.0, 0.0],
        },
        QuadVertex {
            position: [-1.0, -1.0],
            uv: [0.0, 1.0],
        },
        QuadVertex {
            position: [1.0, 1.0],
            uv: [1.0, 0.0],
        },
        QuadVertex {
            position: [1.0, -1.0],
            uv: [1.0, 1.0],
        },
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}
