//! The draw image every pass renders into.
//!
//! Programs write their results to GS memory; the color attachment only exists so
//! the rasterizer has something to cover, and is never read.

use crate::params::Scissor;
use crate::DRAW_AREA_SIZE;

pub(super) const DRAW_IMAGE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

pub(super) struct DrawTarget {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DrawTarget {
    pub(super) fn new(device: &wgpu::Device) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("gs draw image"),
            size: wgpu::Extent3d {
                width: DRAW_AREA_SIZE,
                height: DRAW_AREA_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DRAW_IMAGE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }

    /// Begins a pass covering the draw area with viewport and scissor set.
    pub(super) fn begin_pass<'e>(
        &self,
        encoder: &'e mut wgpu::CommandEncoder,
        scissor: Scissor,
    ) -> wgpu::RenderPass<'e> {
        let mut rpass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("gs draw pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: &self.view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                    store: wgpu::StoreOp::Discard,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        let size = DRAW_AREA_SIZE as f32;
        rpass.set_viewport(0.0, 0.0, size, size, 0.0, 1.0);
        rpass.set_scissor_rect(scissor.x, scissor.y, scissor.width, scissor.height);
        rpass
    }
}
