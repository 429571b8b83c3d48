//! The live display target.

use crate::context::GpuContext;
use crate::texture::GpuTexture;
use tracing::{debug, warn};
use viewfinder_core::{PixelSize, Result, ViewfinderError};

/// Surface formats the pipeline writes linear output to unchanged, in order
/// of preference.
const PREFERRED_FORMATS: [wgpu::TextureFormat; 4] = [
    wgpu::TextureFormat::Bgra8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Bgra8UnormSrgb,
    wgpu::TextureFormat::Rgba8UnormSrgb,
];

/// First preferred format among those a surface supports.
fn pick_format(supported: &[wgpu::TextureFormat]) -> Option<wgpu::TextureFormat> {
    PREFERRED_FORMATS
        .into_iter()
        .find(|f| supported.contains(f))
}

/// Where the live preview is presented.
pub enum LiveSurface {
    /// A presentable window surface.
    Window {
        surface: wgpu::Surface<'static>,
        config: wgpu::SurfaceConfiguration,
    },
    /// An owned texture standing in for a display, for headless runs.
    Headless { target: GpuTexture },
}

/// A drawable acquired for one refresh.
pub enum SurfaceFrame {
    Window {
        texture: wgpu::SurfaceTexture,
        view: wgpu::TextureView,
    },
    Headless {
        view: wgpu::TextureView,
    },
}

impl SurfaceFrame {
    pub fn view(&self) -> &wgpu::TextureView {
        match self {
            Self::Window { view, .. } | Self::Headless { view } => view,
        }
    }

    /// Present the drawable. Must run after the draw was submitted.
    pub fn present(self) {
        if let Self::Window { texture, .. } = self {
            texture.present();
        }
    }
}

impl LiveSurface {
    /// Configure a window surface at `size` with its preferred format.
    pub fn window(
        ctx: &GpuContext,
        surface: wgpu::Surface<'static>,
        size: PixelSize,
    ) -> Result<Self> {
        let mut config = surface
            .get_default_config(&ctx.adapter, size.width.max(1), size.height.max(1))
            .ok_or_else(|| {
                ViewfinderError::Gpu("Surface is not supported by the adapter".to_string())
            })?;
        // Captures are read back from the same format, which must be 8-bit RGBA/BGRA
        let supported = surface.get_capabilities(&ctx.adapter).formats;
        config.format = pick_format(&supported).ok_or_else(|| {
            ViewfinderError::Gpu(format!(
                "Surface offers no 8-bit RGBA/BGRA format: {:?}",
                supported
            ))
        })?;
        surface.configure(&ctx.device, &config);
        debug!(format = ?config.format, %size, "Window surface configured");
        Ok(Self::Window { surface, config })
    }

    /// A headless surface backed by a texture of `format`.
    pub fn headless(ctx: &GpuContext, size: PixelSize, format: wgpu::TextureFormat) -> Self {
        Self::Headless {
            target: GpuTexture::render_target(&ctx.device, size.width, size.height, format),
        }
    }

    pub fn size(&self) -> PixelSize {
        match self {
            Self::Window { config, .. } => PixelSize::new(config.width, config.height),
            Self::Headless { target } => target.size(),
        }
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        match self {
            Self::Window { config, .. } => config.format,
            Self::Headless { target } => target.format,
        }
    }

    /// Resize the drawable; zero sizes are ignored.
    pub fn resize(&mut self, device: &wgpu::Device, size: PixelSize) {
        if size.is_empty() || size == self.size() {
            return;
        }
        match self {
            Self::Window { surface, config } => {
                config.width = size.width;
                config.height = size.height;
                surface.configure(device, config);
            }
            Self::Headless { target } => {
                *target = GpuTexture::render_target(device, size.width, size.height, target.format);
            }
        }
        debug!(%size, "Live surface resized");
    }

    /// Acquire the next drawable.
    ///
    /// Returns `None` when this refresh has to be skipped. Outdated or lost
    /// surfaces are reconfigured so the next refresh can succeed.
    pub fn acquire(&mut self, device: &wgpu::Device) -> Option<SurfaceFrame> {
        match self {
            Self::Headless { target } => Some(SurfaceFrame::Headless {
                view: target
                    .texture
                    .create_view(&wgpu::TextureViewDescriptor::default()),
            }),
            Self::Window { surface, config } => match surface.get_current_texture() {
                Ok(texture) => {
                    let view = texture
                        .texture
                        .create_view(&wgpu::TextureViewDescriptor::default());
                    Some(SurfaceFrame::Window { texture, view })
                }
                Err(wgpu::SurfaceError::Outdated | wgpu::SurfaceError::Lost) => {
                    debug!("Surface outdated, reconfiguring");
                    surface.configure(device, config);
                    None
                }
                Err(wgpu::SurfaceError::Timeout) => {
                    debug!("Surface acquire timed out");
                    None
                }
                Err(e) => {
                    warn!(error = %e, "Failed to acquire surface texture");
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat;

    #[test]
    fn window_format_prefers_linear_bgra() {
        let supported = [
            TextureFormat::Rgba8UnormSrgb,
            TextureFormat::Bgra8UnormSrgb,
            TextureFormat::Bgra8Unorm,
        ];
        assert_eq!(pick_format(&supported), Some(TextureFormat::Bgra8Unorm));
    }

    #[test]
    fn window_format_falls_back_to_srgb() {
        let supported = [TextureFormat::Rgb10a2Unorm, TextureFormat::Rgba8UnormSrgb];
        assert_eq!(pick_format(&supported), Some(TextureFormat::Rgba8UnormSrgb));
    }

    #[test]
    fn window_without_8bit_format_is_rejected() {
        let supported = [TextureFormat::Rgba16Float, TextureFormat::Rgb10a2Unorm];
        assert_eq!(pick_format(&supported), None);
    }
}
