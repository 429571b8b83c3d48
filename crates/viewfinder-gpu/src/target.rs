//! Off-screen render target and CPU read-back.

use crate::staging_pool::SharedStagingPool;
use crate::texture::GpuTexture;
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, warn};
use viewfinder_core::{PixelSize, Result, ViewfinderError};

/// A render target that is never presented, only read back.
pub struct OffscreenTarget {
    texture: GpuTexture,
}

impl OffscreenTarget {
    pub fn new(device: &wgpu::Device, size: PixelSize, format: wgpu::TextureFormat) -> Self {
        debug!(%size, ?format, "Allocating off-screen target");
        Self {
            texture: GpuTexture::render_target(device, size.width, size.height, format),
        }
    }

    pub fn size(&self) -> PixelSize {
        self.texture.size()
    }

    pub fn format(&self) -> wgpu::TextureFormat {
        self.texture.format
    }

    pub fn view(&self) -> &wgpu::TextureView {
        &self.texture.view
    }

    pub fn texture(&self) -> &wgpu::Texture {
        &self.texture.texture
    }
}

/// Byte layout of a texture copied into a buffer.
///
/// Buffer rows must be padded to [`wgpu::COPY_BYTES_PER_ROW_ALIGNMENT`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowLayout {
    pub width: u32,
    pub height: u32,
    pub unpadded_bytes_per_row: u32,
    pub padded_bytes_per_row: u32,
}

impl RowLayout {
    /// Layout for a 4-byte-per-pixel image.
    pub fn rgba(size: PixelSize) -> Self {
        let unpadded_bytes_per_row = size.width * 4;
        let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
        let padded_bytes_per_row = unpadded_bytes_per_row.div_ceil(align) * align;
        Self {
            width: size.width,
            height: size.height,
            unpadded_bytes_per_row,
            padded_bytes_per_row,
        }
    }

    pub fn buffer_size(&self) -> u64 {
        self.padded_bytes_per_row as u64 * self.height as u64
    }

    /// Strip row padding and, for BGRA sources, swap to RGBA.
    pub fn unpad(&self, padded: &[u8], swap_red_blue: bool) -> Vec<u8> {
        let row_len = self.unpadded_bytes_per_row as usize;
        let mut out = Vec::with_capacity(row_len * self.height as usize);
        for row in padded
            .chunks(self.padded_bytes_per_row as usize)
            .take(self.height as usize)
        {
            out.extend_from_slice(&row[..row_len]);
        }
        if swap_red_blue {
            for px in out.chunks_exact_mut(4) {
                px.swap(0, 2);
            }
        }
        out
    }
}

/// A recorded texture-to-buffer copy awaiting submission.
pub struct ReadbackBuffer {
    buffer: Arc<wgpu::Buffer>,
    layout: RowLayout,
    swap_red_blue: bool,
}

impl ReadbackBuffer {
    /// Record a copy of `target` into a staging buffer from `pool`.
    pub fn record(
        device: &wgpu::Device,
        encoder: &mut wgpu::CommandEncoder,
        target: &OffscreenTarget,
        pool: &SharedStagingPool,
    ) -> Result<Self> {
        let swap_red_blue = match target.format() {
            wgpu::TextureFormat::Rgba8Unorm | wgpu::TextureFormat::Rgba8UnormSrgb => false,
            wgpu::TextureFormat::Bgra8Unorm | wgpu::TextureFormat::Bgra8UnormSrgb => true,
            other => {
                return Err(ViewfinderError::UnsupportedFormat(format!(
                    "cannot read back {:?}",
                    other
                )))
            }
        };

        let layout = RowLayout::rgba(target.size());
        let size = layout.buffer_size();
        let pooled = pool.lock().acquire(size);
        let buffer = match pooled {
            Some(buffer) => buffer,
            None => {
                debug!(size, "Allocating staging buffer");
                Arc::new(device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("Readback Staging Buffer"),
                    size,
                    usage: wgpu::BufferUsages::COPY_DST | wgpu::BufferUsages::MAP_READ,
                    mapped_at_creation: false,
                }))
            }
        };

        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: target.texture(),
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(layout.padded_bytes_per_row),
                    rows_per_image: Some(layout.height),
                },
            },
            wgpu::Extent3d {
                width: layout.width,
                height: layout.height,
                depth_or_array_layers: 1,
            },
        );

        Ok(Self {
            buffer,
            layout,
            swap_red_blue,
        })
    }

    pub fn layout(&self) -> RowLayout {
        self.layout
    }

    /// Request the mapping. Must be called after the copy was submitted.
    ///
    /// `on_ready` runs on the thread that polls the device. It receives
    /// `None` when mapping fails; the staging buffer returns to `pool`
    /// either way.
    pub fn map<F>(self, pool: SharedStagingPool, on_ready: F)
    where
        F: FnOnce(Option<RgbaImage>) + Send + 'static,
    {
        let Self {
            buffer,
            layout,
            swap_red_blue,
        } = self;
        let mapped = buffer.clone();

        buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                let image = match result {
                    Ok(()) => {
                        let pixels = {
                            let data = mapped.slice(..).get_mapped_range();
                            layout.unpad(&data, swap_red_blue)
                        };
                        mapped.unmap();
                        RgbaImage::from_raw(layout.width, layout.height, pixels)
                    }
                    Err(e) => {
                        warn!(error = %e, "Read-back mapping failed");
                        None
                    }
                };
                pool.lock().release(mapped);
                on_ready(image);
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        let layout = RowLayout::rgba(PixelSize::new(100, 3));
        assert_eq!(layout.unpadded_bytes_per_row, 400);
        assert_eq!(layout.padded_bytes_per_row, 512);
        assert_eq!(layout.buffer_size(), 1536);

        let aligned = RowLayout::rgba(PixelSize::new(64, 2));
        assert_eq!(aligned.padded_bytes_per_row, aligned.unpadded_bytes_per_row);
    }

    #[test]
    fn unpad_strips_padding_and_swaps() {
        let layout = RowLayout {
            width: 1,
            height: 2,
            unpadded_bytes_per_row: 4,
            padded_bytes_per_row: 8,
        };
        let padded = [1, 2, 3, 4, 0, 0, 0, 0, 5, 6, 7, 8, 0, 0, 0, 0];
        assert_eq!(layout.unpad(&padded, false), vec![1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(layout.unpad(&padded, true), vec![3, 2, 1, 4, 7, 6, 5, 8]);
    }
}
