//! 3D LUT textures.

use half::f16;
use tracing::debug;
use viewfinder_color::Lut3D;

const LUT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// A LUT uploaded as a filterable `Rgba16Float` 3D texture.
pub struct LutTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub size: u32,
}

impl LutTexture {
    /// Upload `lut` to a new 3D texture.
    pub fn from_lut(device: &wgpu::Device, queue: &wgpu::Queue, lut: &Lut3D) -> Self {
        let texels: Vec<f16> = lut.as_floats().iter().copied().map(f16::from_f32).collect();
        let size = lut.size() as u32;
        debug!(size, "Uploading LUT texture");
        Self::upload(device, queue, size, &texels, "LUT 3D Texture")
    }

    /// A 1×1×1 white texture bound when no LUT is active.
    pub fn placeholder(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let texels = [f16::ONE; 4];
        Self::upload(device, queue, 1, &texels, "LUT Placeholder")
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        size: u32,
        texels: &[f16],
        label: &str,
    ) -> Self {
        let extent = wgpu::Extent3d {
            width: size,
            height: size,
            depth_or_array_layers: size,
        };
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: extent,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D3,
            format: LUT_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            bytemuck::cast_slice(texels),
            wgpu::ImageDataLayout {
                offset: 0,
                // 4 channels × 2 bytes
                bytes_per_row: Some(size * 8),
                rows_per_image: Some(size),
            },
            extent,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::D3),
            ..Default::default()
        });

        Self {
            texture,
            view,
            size,
        }
    }
}
