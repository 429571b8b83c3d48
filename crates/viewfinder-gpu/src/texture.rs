//! GPU texture management.

use tracing::debug;
use viewfinder_core::{FrameBuffer, FramePlane, PixelSize, Result, ViewfinderError};

/// A 2D GPU texture with its default view.
pub struct GpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    pub format: wgpu::TextureFormat,
}

impl GpuTexture {
    /// Create a new GPU texture with the given dimensions.
    pub fn new(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        usage: wgpu::TextureUsages,
        label: Option<&str>,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label,
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage,
            view_formats: &[],
        });

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            width,
            height,
            format,
        }
    }

    /// Create a sampled texture for one plane of a camera frame.
    pub fn for_plane(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
        label: &str,
    ) -> Self {
        Self::new(
            device,
            width,
            height,
            format,
            wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            Some(label),
        )
    }

    /// Create a render target texture that can be copied out.
    pub fn render_target(
        device: &wgpu::Device,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        Self::new(
            device,
            width,
            height,
            format,
            wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC,
            Some("Render Target"),
        )
    }

    /// Texture dimensions.
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.width, self.height)
    }

    /// Upload a frame plane to this texture.
    pub fn upload_plane(&self, queue: &wgpu::Queue, plane: &FramePlane) -> Result<()> {
        if plane.width != self.width || plane.height != self.height {
            return Err(ViewfinderError::Gpu(format!(
                "Plane size {}x{} doesn't match texture size {}x{}",
                plane.width, plane.height, self.width, self.height
            )));
        }

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &plane.data,
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(plane.stride as u32),
                rows_per_image: Some(self.height),
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );

        Ok(())
    }
}

/// Luma and chroma textures for biplanar frames.
///
/// Textures are kept across frames and only recreated when the frame size
/// changes.
pub struct PlaneTextures {
    pub luma: GpuTexture,
    pub chroma: GpuTexture,
}

impl PlaneTextures {
    /// Allocate plane textures sized for `frame`.
    pub fn for_frame(device: &wgpu::Device, frame: &FrameBuffer) -> Result<Self> {
        let (luma, chroma) = biplanar(frame)?;
        debug!(width = frame.width, height = frame.height, "Allocating plane textures");
        Ok(Self {
            luma: GpuTexture::for_plane(
                device,
                luma.width,
                luma.height,
                wgpu::TextureFormat::R8Unorm,
                "Luma Plane",
            ),
            chroma: GpuTexture::for_plane(
                device,
                chroma.width,
                chroma.height,
                wgpu::TextureFormat::Rg8Unorm,
                "Chroma Plane",
            ),
        })
    }

    /// Whether these textures can hold `frame` without reallocation.
    pub fn fits(&self, frame: &FrameBuffer) -> bool {
        self.luma.size() == frame.size()
    }

    /// Upload both planes of `frame`.
    pub fn upload(&self, queue: &wgpu::Queue, frame: &FrameBuffer) -> Result<()> {
        let (luma, chroma) = biplanar(frame)?;
        self.luma.upload_plane(queue, luma)?;
        self.chroma.upload_plane(queue, chroma)
    }

    /// Reuse `cached` when it fits `frame`, otherwise allocate; then upload.
    pub fn prepare(
        cached: Option<Self>,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        frame: &FrameBuffer,
    ) -> Result<Self> {
        let textures = match cached {
            Some(textures) if textures.fits(frame) => textures,
            _ => Self::for_frame(device, frame)?,
        };
        textures.upload(queue, frame)?;
        Ok(textures)
    }
}

fn biplanar(frame: &FrameBuffer) -> Result<(&FramePlane, &FramePlane)> {
    match (frame.luma(), frame.chroma()) {
        (Some(luma), Some(chroma)) => Ok((luma, chroma)),
        _ => Err(ViewfinderError::UnsupportedFormat(format!(
            "{:?} frames cannot be imported",
            frame.format
        ))),
    }
}
