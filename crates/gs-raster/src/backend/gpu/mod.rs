//! wgpu backend.
//!
//! WGSL has no fragment shader interlock, so fragments of overlapping triangles in one
//! pass could race on GS memory. Each batch is therefore split into runs of
//! non-overlapping triangles and every run gets its own render pass; pass boundaries
//! order the storage writes.

mod context;
mod frame;
mod pipeline;
mod target;

use anyhow::Result;

use crate::backend::{split_overlapping, DrawBackend, DrawPass, InterlockStrategy};
use crate::cache::ResourceBinding;
use crate::caps::{DescriptorSetCaps, PipelineCaps};
use crate::device::Gpu;
use crate::draw::DrawConfig;
use crate::memory::{GsMemory, SwizzleSet};
use crate::shader::{DrawProgram, PARAMS_GROUP, RESOURCE_GROUP};
use crate::vertex::PrimVertex;

pub use context::DrawContext;
pub use pipeline::{GpuPipeline, GpuResources};

use frame::FrameResources;
use pipeline::Layouts;
use target::DrawTarget;

pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    context: DrawContext,
    target: DrawTarget,
    layouts: Layouts,
    frames: Vec<FrameResources>,
    current: usize,
    staging: Vec<PrimVertex>,
    encoder: Option<wgpu::CommandEncoder>,
    passes_recorded: u64,
}

impl WgpuBackend {
    pub fn new(gpu: &Gpu, swizzle: &SwizzleSet, config: &DrawConfig) -> Self {
        assert!(config.frames_in_flight > 0, "at least one frame in flight");
        let device = gpu.device().clone();
        let queue = gpu.queue().clone();

        let context = DrawContext::new(&device, &queue, swizzle);
        let target = DrawTarget::new(&device);
        let layouts = Layouts::new(&device);
        let frames = (0..config.frames_in_flight)
            .map(|_| {
                FrameResources::new(
                    &device,
                    &layouts,
                    config.max_vertex_count,
                    config.param_slots_per_frame,
                )
            })
            .collect();

        log::info!(
            "wgpu draw backend: {} frames in flight, {} vertices, {} param slots per frame",
            config.frames_in_flight,
            config.max_vertex_count,
            config.param_slots_per_frame
        );

        Self {
            device,
            queue,
            context,
            target,
            layouts,
            frames,
            current: 0,
            staging: vec![PrimVertex::default(); config.max_vertex_count],
            encoder: None,
            passes_recorded: 0,
        }
    }

    pub fn context(&self) -> &DrawContext {
        &self.context
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    /// Replaces the GPU copy of GS memory.
    ///
    /// Draws recorded so far are submitted first, so they see the old contents and
    /// later draws see the new ones.
    pub fn upload_memory(&mut self, memory: &GsMemory) {
        self.submit_pending();
        self.context.upload_memory(&self.queue, memory);
    }

    /// Writes `words` at byte address `address`, ordered after recorded draws.
    pub fn write_memory(&mut self, address: u32, words: &[u32]) {
        self.submit_pending();
        self.context.write_memory(&self.queue, address, words);
    }

    /// Replaces the CLUT, ordered after recorded draws.
    pub fn upload_clut(&mut self, entries: &[u32]) {
        self.submit_pending();
        self.context.upload_clut(&self.queue, entries);
    }

    /// Reads GS memory back, including the effect of every draw recorded so far.
    pub fn read_memory(&mut self) -> Result<GsMemory> {
        self.submit_pending();
        self.context.read_memory(&self.device, &self.queue)
    }

    /// Render passes recorded so far; serialized batches use more than one.
    pub fn passes_recorded(&self) -> u64 {
        self.passes_recorded
    }

    /// Submits recorded passes and remembers the submission for the active frame.
    fn submit_encoder(&mut self) {
        let encoder = self
            .encoder
            .take()
            .unwrap_or_else(|| new_encoder(&self.device));
        let index = self.queue.submit(std::iter::once(encoder.finish()));
        self.frames[self.current].submission = Some(index);
    }

    fn submit_pending(&mut self) {
        if self.encoder.is_some() {
            self.submit_encoder();
        }
    }

    fn wait_for(&self, index: wgpu::SubmissionIndex) {
        if let Err(err) = self.device.poll(wgpu::PollType::Wait {
            submission_index: Some(index),
            timeout: None,
        }) {
            log::error!("waiting for frame resources failed: {err}");
            panic!("device poll failed: {err}");
        }
    }
}

fn new_encoder(device: &wgpu::Device) -> wgpu::CommandEncoder {
    device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("gs draw encoder"),
    })
}

impl DrawBackend for WgpuBackend {
    type Pipeline = GpuPipeline;
    type ResourceSet = GpuResources;

    fn interlock(&self) -> InterlockStrategy {
        InterlockStrategy::SerializedOverlaps
    }

    fn vertex_storage(&mut self) -> &mut [PrimVertex] {
        &mut self.staging
    }

    fn create_pipeline(&mut self, caps: &PipelineCaps, program: &DrawProgram) -> GpuPipeline {
        log::debug!("building draw pipeline for {caps:?}");
        pipeline::create_pipeline(&self.device, &mut self.layouts, caps, program)
    }

    fn create_resource_set(
        &mut self,
        caps: &DescriptorSetCaps,
        bindings: &[ResourceBinding],
    ) -> GpuResources {
        log::debug!("building resource set for {caps:?}");
        pipeline::create_resources(&self.device, &mut self.layouts, &self.context, caps, bindings)
    }

    fn record_draw(&mut self, pass: DrawPass<'_, GpuPipeline, GpuResources>) {
        let scissor = pass.scissor.clipped();
        if scissor.width == 0 || scissor.height == 0 {
            return;
        }

        if self.frames[self.current].params_exhausted() {
            log::debug!("parameter ring exhausted, submitting early");
            self.submit_encoder();
            self.frames[self.current].reset_params();
        }

        let range = pass.vertices.start as usize..pass.vertices.end as usize;
        let frame = &mut self.frames[self.current];
        frame.write_vertices(&self.queue, pass.vertices.start, &self.staging[range.clone()]);
        let params_offset = frame.push_params(&self.queue, pass.params);

        let runs = split_overlapping(&self.staging[range]);
        log::trace!(
            "draw {:?}: {} vertices in {} passes",
            pass.vertices,
            pass.vertices.len(),
            runs.len()
        );

        let device = &self.device;
        let encoder = self.encoder.get_or_insert_with(|| new_encoder(device));
        let frame = &self.frames[self.current];
        for run in &runs {
            let mut rpass = self.target.begin_pass(encoder, scissor);
            rpass.set_pipeline(&pass.pipeline.pipeline);
            rpass.set_bind_group(RESOURCE_GROUP, &pass.resources.bind_group, &[]);
            rpass.set_bind_group(PARAMS_GROUP, &frame.params_bind_group, &[params_offset]);
            rpass.set_vertex_buffer(0, frame.vertex_buffer.slice(..));
            let first = pass.vertices.start;
            rpass.draw(first + run.start..first + run.end, 0..1);
        }
        self.passes_recorded += runs.len() as u64;
    }

    fn submit_frame(&mut self) {
        self.submit_encoder();
        self.current = (self.current + 1) % self.frames.len();
        if let Some(index) = self.frames[self.current].submission.take() {
            self.wait_for(index);
        }
        self.frames[self.current].reset_params();
    }
}
