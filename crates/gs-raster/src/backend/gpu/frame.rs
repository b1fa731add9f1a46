//! Per-frame-in-flight GPU storage.

use crate::params::DrawParams;
use crate::vertex::PrimVertex;

use super::pipeline::{params_binding_size, Layouts};

/// Vertex buffer and parameter ring of one frame slot.
///
/// Both are reused every time the slot comes around again, after the submission that
/// last used it has retired.
pub(super) struct FrameResources {
    pub(super) vertex_buffer: wgpu::Buffer,
    params_buffer: wgpu::Buffer,
    pub(super) params_bind_group: wgpu::BindGroup,
    param_stride: u32,
    param_slots: u32,
    next_param_slot: u32,
    pub(super) submission: Option<wgpu::SubmissionIndex>,
}

impl FrameResources {
    pub(super) fn new(
        device: &wgpu::Device,
        layouts: &Layouts,
        vertex_capacity: usize,
        param_slots: u32,
    ) -> Self {
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gs frame vertices"),
            size: (vertex_capacity * std::mem::size_of::<PrimVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let alignment = device.limits().min_uniform_buffer_offset_alignment;
        let param_stride = (std::mem::size_of::<DrawParams>() as u32).next_multiple_of(alignment);
        let params_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("gs frame params"),
            size: param_stride as u64 * param_slots as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let params_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("gs frame params bind group"),
            layout: layouts.params(),
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &params_buffer,
                    offset: 0,
                    size: Some(params_binding_size()),
                }),
            }],
        });

        Self {
            vertex_buffer,
            params_buffer,
            params_bind_group,
            param_stride,
            param_slots,
            next_param_slot: 0,
            submission: None,
        }
    }

    pub(super) fn params_exhausted(&self) -> bool {
        self.next_param_slot == self.param_slots
    }

    /// Queues `params` into the next ring slot and returns its dynamic offset.
    pub(super) fn push_params(&mut self, queue: &wgpu::Queue, params: &DrawParams) -> u32 {
        assert!(!self.params_exhausted(), "parameter ring exhausted");
        let offset = self.next_param_slot * self.param_stride;
        queue.write_buffer(&self.params_buffer, offset as u64, bytemuck::bytes_of(params));
        self.next_param_slot += 1;
        offset
    }

    /// Makes every ring slot available again.
    ///
    /// Only valid once the work that reads the ring has been submitted: queued writes
    /// land before the next submission, after the earlier one.
    pub(super) fn reset_params(&mut self) {
        self.next_param_slot = 0;
    }

    pub(super) fn write_vertices(&self, queue: &wgpu::Queue, first: u32, vertices: &[PrimVertex]) {
        let offset = first as u64 * std::mem::size_of::<PrimVertex>() as u64;
        queue.write_buffer(&self.vertex_buffer, offset, bytemuck::cast_slice(vertices));
    }
}
