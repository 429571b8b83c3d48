//! Color pipeline: biplanar frame to graded RGB in a single draw.

use crate::context::GpuContext;
use crate::lut_texture::LutTexture;
use crate::texture::PlaneTextures;
use crate::uniforms::{DrawUniforms, QuadVertex};
use std::sync::Arc;
use tracing::{debug, info};
use viewfinder_color::{Grading, Lut3D};
use viewfinder_core::{Result, ViewfinderError};
use wgpu::util::DeviceExt;

const SHADER_SOURCE: &str = include_str!("shaders/color.wgsl");

/// Entry points in [`SHADER_SOURCE`].
const VERTEX_ENTRY: &str = "vs_main";
const GRADED_ENTRY: &str = "fs_graded";
const IDENTITY_ENTRY: &str = "fs_identity";

/// Compiled programs, samplers, the quad buffer and the active LUT.
///
/// One instance serves every draw of a given target format.
pub struct ColorPipeline {
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    target_format: wgpu::TextureFormat,
    bind_group_layout: wgpu::BindGroupLayout,
    graded: wgpu::RenderPipeline,
    identity: wgpu::RenderPipeline,
    quad: wgpu::Buffer,
    plane_sampler: wgpu::Sampler,
    lut_sampler: wgpu::Sampler,
    placeholder: LutTexture,
    lut: Option<LutTexture>,
}

/// Everything one frame needs to be drawn, possibly more than once.
pub struct FrameBinding {
    bind_group: wgpu::BindGroup,
    uniforms: DrawUniforms,
    graded: bool,
}

impl FrameBinding {
    pub fn uniforms(&self) -> &DrawUniforms {
        &self.uniforms
    }
}

impl ColorPipeline {
    /// Compile the shader and build both pipelines for `target_format`.
    ///
    /// Shader or pipeline validation failures are returned, not deferred.
    pub fn configure(ctx: &GpuContext, target_format: wgpu::TextureFormat) -> Result<Self> {
        let device = ctx.device.clone();
        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Color Shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Color Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                texture_entry(1, wgpu::TextureViewDimension::D2),
                texture_entry(2, wgpu::TextureViewDimension::D2),
                sampler_entry(3),
                texture_entry(4, wgpu::TextureViewDimension::D3),
                sampler_entry(5),
            ],
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Color Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let graded = create_pipeline(&device, &layout, &shader, GRADED_ENTRY, target_format);
        let identity = create_pipeline(&device, &layout, &shader, IDENTITY_ENTRY, target_format);

        if let Some(error) = pollster::block_on(device.pop_error_scope()) {
            return Err(ViewfinderError::Shader(error.to_string()));
        }

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Quad Vertices"),
            contents: bytemuck::cast_slice(&QuadVertex::QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let plane_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Plane Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        let lut_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("LUT Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });

        let placeholder = LutTexture::placeholder(&device, &ctx.queue);

        info!(format = ?target_format, "Color pipeline configured");

        Ok(Self {
            device,
            queue: ctx.queue.clone(),
            target_format,
            bind_group_layout,
            graded,
            identity,
            quad,
            plane_sampler,
            lut_sampler,
            placeholder,
            lut: None,
        })
    }

    /// Format every draw target must have.
    pub fn target_format(&self) -> wgpu::TextureFormat {
        self.target_format
    }

    /// Replace the active LUT; `None` selects identity grading.
    pub fn set_lut(&mut self, lut: Option<&Lut3D>) {
        self.lut = lut.map(|lut| LutTexture::from_lut(&self.device, &self.queue, lut));
        debug!(graded = self.lut.is_some(), "LUT updated");
    }

    /// Convenience wrapper over [`Self::set_lut`].
    pub fn set_grading(&mut self, grading: &Grading) {
        self.set_lut(grading.lut());
    }

    pub fn has_lut(&self) -> bool {
        self.lut.is_some()
    }

    /// Write uniforms and build the bind group for one frame.
    pub fn bind_frame(&self, planes: &PlaneTextures, uniforms: DrawUniforms) -> FrameBinding {
        let raw = uniforms.pack();
        let uniform_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Draw Uniforms"),
                contents: bytemuck::bytes_of(&raw),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let lut_view = match &self.lut {
            Some(lut) => &lut.view,
            None => &self.placeholder.view,
        };

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Color Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&planes.luma.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&planes.chroma.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.plane_sampler),
                },
                wgpu::BindGroupEntry {
                    binding: 4,
                    resource: wgpu::BindingResource::TextureView(lut_view),
                },
                wgpu::BindGroupEntry {
                    binding: 5,
                    resource: wgpu::BindingResource::Sampler(&self.lut_sampler),
                },
            ],
        });

        FrameBinding {
            bind_group,
            uniforms,
            graded: self.lut.is_some(),
        }
    }

    /// Record one full-target draw of `binding` into `view`.
    pub fn draw(
        &self,
        encoder: &mut wgpu::CommandEncoder,
        view: &wgpu::TextureView,
        binding: &FrameBinding,
    ) {
        let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("Color Pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                    store: wgpu::StoreOp::Store,
                },
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let pipeline = if binding.graded {
            &self.graded
        } else {
            &self.identity
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &binding.bind_group, &[]);
        pass.set_vertex_buffer(0, self.quad.slice(..));
        pass.draw(0..QuadVertex::QUAD.len() as u32, 0..1);
    }
}

fn texture_entry(binding: u32, view_dimension: wgpu::TextureViewDimension) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn sampler_entry(binding: u32) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        count: None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    fragment_entry: &str,
    format: wgpu::TextureFormat,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(fragment_entry),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some(fragment_entry),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleStrip,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview: None,
        cache: None,
    })
}
