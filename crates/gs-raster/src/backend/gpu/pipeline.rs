//! Bind group layouts, render pipelines and resource bind groups.

use std::collections::HashMap;
use std::num::NonZeroU64;

use crate::cache::ResourceBinding;
use crate::caps::{DescriptorSetCaps, PipelineCaps};
use crate::params::DrawParams;
use crate::shader::{DrawProgram, FRAGMENT_ENTRY, VERTEX_ENTRY};
use crate::vertex::PrimVertex;

use super::context::DrawContext;
use super::target::DRAW_IMAGE_FORMAT;

/// A compiled draw program.
#[derive(Debug)]
pub struct GpuPipeline {
    pub(super) pipeline: wgpu::RenderPipeline,
}

/// A resource bind group (group 0).
#[derive(Debug)]
pub struct GpuResources {
    pub(super) bind_group: wgpu::BindGroup,
}

pub(super) fn params_binding_size() -> NonZeroU64 {
    NonZeroU64::new(std::mem::size_of::<DrawParams>() as u64).expect("DrawParams is not empty")
}

fn layout_entry(binding: ResourceBinding) -> wgpu::BindGroupLayoutEntry {
    let ty = match binding {
        ResourceBinding::Memory => wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Storage { read_only: false },
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        ResourceBinding::Clut
        | ResourceBinding::TextureSwizzle
        | ResourceBinding::FramebufferSwizzle
        | ResourceBinding::DepthSwizzle => wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Uint,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
    };
    wgpu::BindGroupLayoutEntry {
        binding: binding.binding(),
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty,
        count: None,
    }
}

/// Layouts shared by pipelines and bind groups.
///
/// Resource layouts depend only on the binding composition, so they are keyed by it
/// rather than by the full descriptor-set key.
pub(super) struct Layouts {
    params: wgpu::BindGroupLayout,
    resources: HashMap<Vec<ResourceBinding>, wgpu::BindGroupLayout>,
}

impl Layouts {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let params = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("gs draw params bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: Some(params_binding_size()),
                },
                count: None,
            }],
        });
        Self {
            params,
            resources: HashMap::new(),
        }
    }

    pub(super) fn params(&self) -> &wgpu::BindGroupLayout {
        &self.params
    }

    pub(super) fn resources(
        &mut self,
        device: &wgpu::Device,
        bindings: &[ResourceBinding],
    ) -> &wgpu::BindGroupLayout {
        self.resources.entry(bindings.to_vec()).or_insert_with(|| {
            log::debug!("resource layout for {bindings:?}");
            let entries: Vec<_> = bindings.iter().copied().map(layout_entry).collect();
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("gs resources bgl"),
                entries: &entries,
            })
        })
    }
}

pub(super) fn create_pipeline(
    device: &wgpu::Device,
    layouts: &mut Layouts,
    caps: &PipelineCaps,
    program: &DrawProgram,
) -> GpuPipeline {
    let bindings = crate::cache::resource_bindings(&DescriptorSetCaps::from(caps));
    let resource_layout = layouts.resources(device, &bindings).clone();

    let vertex = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("gs draw vertex shader"),
        source: wgpu::ShaderSource::Wgsl(program.vertex.as_str().into()),
    });
    let fragment = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("gs draw fragment shader"),
        source: wgpu::ShaderSource::Wgsl(program.fragment.as_str().into()),
    });

    let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("gs draw pipeline layout"),
        bind_group_layouts: &[&resource_layout, layouts.params()],
        immediate_size: 0,
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("gs draw pipeline"),
        layout: Some(&pipeline_layout),

        vertex: wgpu::VertexState {
            module: &vertex,
            entry_point: Some(VERTEX_ENTRY),
            compilation_options: Default::default(),
            buffers: &[PrimVertex::layout()],
        },

        fragment: Some(wgpu::FragmentState {
            module: &fragment,
            entry_point: Some(FRAGMENT_ENTRY),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: DRAW_IMAGE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),

        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },

        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    });

    GpuPipeline { pipeline }
}

pub(super) fn create_resources(
    device: &wgpu::Device,
    layouts: &mut Layouts,
    context: &DrawContext,
    caps: &DescriptorSetCaps,
    bindings: &[ResourceBinding],
) -> GpuResources {
    let entries: Vec<_> = bindings
        .iter()
        .map(|&binding| wgpu::BindGroupEntry {
            binding: binding.binding(),
            resource: match binding {
                ResourceBinding::Memory => context.memory_buffer().as_entire_binding(),
                ResourceBinding::Clut => wgpu::BindingResource::TextureView(context.clut_view()),
                ResourceBinding::TextureSwizzle => {
                    wgpu::BindingResource::TextureView(context.swizzle_view(caps.texture_format))
                }
                ResourceBinding::FramebufferSwizzle => wgpu::BindingResource::TextureView(
                    context.swizzle_view(caps.framebuffer_format),
                ),
                ResourceBinding::DepthSwizzle => wgpu::BindingResource::TextureView(
                    context.swizzle_view(caps.depthbuffer_format),
                ),
            },
        })
        .collect();

    let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("gs resources bind group"),
        layout: layouts.resources(device, bindings),
        entries: &entries,
    });
    GpuResources { bind_group }
}
