//! Vertex batching and render-state tracking.
//!
//! `Draw` accumulates vertices that share one (descriptor, parameters, scissor)
//! triple. Every setter compares against the current state first; a real change
//! flushes the open batch under the old state before the new value is committed.

mod batch;

use crate::backend::{DrawBackend, DrawPass};
use crate::cache::{resource_bindings, DescriptorSetCache, PipelineCache};
use crate::caps::{DescriptorSetCaps, PipelineCaps};
use crate::params::{DrawParams, Scissor};
use crate::shader;
use crate::vertex::PrimVertex;

use batch::Batch;

/// Sizing of the per-frame resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawConfig {
    /// Frame slots the backend cycles through before waiting on the GPU.
    pub frames_in_flight: usize,
    /// Vertex storage per frame slot.
    pub max_vertex_count: usize,
    /// Parameter payloads per frame slot before an early submission.
    pub param_slots_per_frame: u32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            max_vertex_count: 1024 * 128,
            param_slots_per_frame: 1024,
        }
    }
}

/// Counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    pub draws: u64,
    pub vertices: u64,
    pub pipelines_built: u64,
    pub resource_sets_built: u64,
    pub frames: u64,
}

pub struct Draw<B: DrawBackend> {
    backend: B,
    pipelines: PipelineCache<B::Pipeline>,
    resource_sets: DescriptorSetCache<B::ResourceSet>,

    caps: PipelineCaps,
    params: DrawParams,
    scissor: Scissor,

    batch: Batch,
    stats: DrawStats,
}

impl<B: DrawBackend> Draw<B> {
    pub fn new(backend: B) -> Self {
        log::debug!("draw state tracker using {:?} interlock", backend.interlock());
        Self {
            backend,
            pipelines: PipelineCache::new(),
            resource_sets: DescriptorSetCache::new(),
            caps: PipelineCaps::default(),
            params: DrawParams::default(),
            scissor: Scissor::default(),
            batch: Batch::default(),
            stats: DrawStats::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access for uploads; the open batch is not affected.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn stats(&self) -> DrawStats {
        self.stats
    }

    pub fn pipeline_caps(&self) -> &PipelineCaps {
        &self.caps
    }

    pub fn params(&self) -> &DrawParams {
        &self.params
    }

    pub fn scissor(&self) -> Scissor {
        self.scissor
    }

    /// Vertices queued in the open batch.
    pub fn pending_vertices(&self) -> u32 {
        self.batch.len()
    }

    // ── state setters ─────────────────────────────────────────────────────

    pub fn set_pipeline_caps(&mut self, caps: PipelineCaps) {
        if self.caps == caps {
            return;
        }
        self.flush_vertices();
        self.caps = caps;
    }

    pub fn set_framebuffer_params(&mut self, addr: u32, width: u32, write_mask: u32) {
        self.update_params(|p| {
            p.fb_buf_addr = addr;
            p.fb_buf_width = width;
            p.fb_write_mask = write_mask;
        });
    }

    pub fn set_depthbuffer_params(&mut self, addr: u32, width: u32) {
        self.update_params(|p| {
            p.depth_buf_addr = addr;
            p.depth_buf_width = width;
        });
    }

    /// `csa` is the first CLUT entry used by 4-bit textures.
    pub fn set_texture_params(&mut self, addr: u32, buf_width: u32, width: u32, height: u32, csa: u32) {
        self.update_params(|p| {
            p.tex_buf_addr = addr;
            p.tex_buf_width = buf_width;
            p.tex_width = width;
            p.tex_height = height;
            p.tex_csa = csa;
        });
    }

    pub fn set_texture_alpha_params(&mut self, ta0: u32, ta1: u32) {
        self.update_params(|p| {
            p.tex_a0 = ta0;
            p.tex_a1 = ta1;
        });
    }

    pub fn set_alpha_test_params(&mut self, alpha_ref: u32) {
        self.update_params(|p| p.alpha_ref = alpha_ref);
    }

    pub fn set_texture_clamp_params(&mut self, min_u: u32, min_v: u32, max_u: u32, max_v: u32) {
        self.update_params(|p| {
            p.clamp_min_u = min_u;
            p.clamp_min_v = min_v;
            p.clamp_max_u = max_u;
            p.clamp_max_v = max_v;
        });
    }

    pub fn set_alpha_blending_params(&mut self, alpha_fix: u32) {
        self.update_params(|p| p.alpha_fix = alpha_fix);
    }

    pub fn set_scissor(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let scissor = Scissor {
            x,
            y,
            width,
            height,
        };
        if self.scissor == scissor {
            return;
        }
        self.flush_vertices();
        self.scissor = scissor;
    }

    fn update_params(&mut self, edit: impl FnOnce(&mut DrawParams)) {
        let mut next = self.params;
        edit(&mut next);
        if next == self.params {
            return;
        }
        self.flush_vertices();
        self.params = next;
    }

    // ── vertices ──────────────────────────────────────────────────────────

    /// Appends vertices to the open batch.
    ///
    /// When frame storage cannot take them, the frame is submitted and storage recycled
    /// first. A single append larger than the whole storage is a caller bug.
    pub fn add_vertices(&mut self, vertices: &[PrimVertex]) {
        let capacity = self.backend.vertex_storage().len();
        if self.batch.end() as usize + vertices.len() > capacity {
            log::debug!("vertex storage full, flushing frame");
            self.flush_frame();
            assert!(
                vertices.len() <= capacity,
                "{} vertices do not fit in frame storage of {capacity}",
                vertices.len()
            );
        }

        let start = self.batch.end() as usize;
        self.backend.vertex_storage()[start..start + vertices.len()].copy_from_slice(vertices);
        self.batch.grow(vertices.len() as u32);
    }

    /// Records one draw for the open batch, if it holds any vertices.
    pub fn flush_vertices(&mut self) {
        if self.batch.is_empty() {
            return;
        }
        let count = self.batch.len();
        assert!(count % 3 == 0, "batch of {count} vertices is not a triangle list");

        let caps = self.caps;
        let set_caps = DescriptorSetCaps::from(&caps);
        let backend = &mut self.backend;
        let stats = &mut self.stats;

        let pipeline = self.pipelines.get_or_insert_with(caps, || {
            stats.pipelines_built += 1;
            backend.create_pipeline(&caps, &shader::synthesize(&caps))
        });
        let resources = self.resource_sets.get_or_insert_with(set_caps, || {
            stats.resource_sets_built += 1;
            backend.create_resource_set(&set_caps, &resource_bindings(&set_caps))
        });

        log::trace!("flush {:?} for {caps:?}", self.batch.range());
        backend.record_draw(DrawPass {
            caps: &caps,
            pipeline,
            resources,
            params: &self.params,
            scissor: self.scissor,
            vertices: self.batch.range(),
        });

        stats.draws += 1;
        stats.vertices += count as u64;
        self.batch.close();
    }

    // ── frame boundary ────────────────────────────────────────────────────

    /// Flushes pending vertices ahead of a frame submission.
    pub fn pre_flush_frame(&mut self) {
        self.flush_vertices();
    }

    /// Starts over at the beginning of the (recycled) vertex storage.
    pub fn post_flush_frame(&mut self) {
        self.batch.reset();
    }

    /// Submits the frame: pre hook, backend submission, post hook.
    pub fn flush_frame(&mut self) {
        self.pre_flush_frame();
        self.backend.submit_frame();
        self.post_flush_frame();
        self.stats.frames += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InterlockStrategy;
    use crate::cache::ResourceBinding;
    use crate::caps::{AlphaTest, DepthTest};
    use crate::psm::TextureFormat;
    use crate::shader::DrawProgram;
    use std::ops::Range;

    /// Backend that records what it is asked to do.
    #[derive(Default)]
    struct Recorder {
        storage: Vec<PrimVertex>,
        draws: Vec<(PipelineCaps, DrawParams, Scissor, Range<u32>)>,
        pipelines: Vec<PipelineCaps>,
        sets: Vec<Vec<ResourceBinding>>,
        submits: usize,
    }

    impl Recorder {
        fn with_capacity(capacity: usize) -> Self {
            Self {
                storage: vec![PrimVertex::default(); capacity],
                ..Default::default()
            }
        }
    }

    impl DrawBackend for Recorder {
        type Pipeline = usize;
        type ResourceSet = usize;

        fn interlock(&self) -> InterlockStrategy {
            InterlockStrategy::Native
        }

        fn vertex_storage(&mut self) -> &mut [PrimVertex] {
            &mut self.storage
        }

        fn create_pipeline(&mut self, caps: &PipelineCaps, program: &DrawProgram) -> usize {
            assert!(!program.fragment.is_empty());
            self.pipelines.push(*caps);
            self.pipelines.len() - 1
        }

        fn create_resource_set(
            &mut self,
            _caps: &DescriptorSetCaps,
            bindings: &[ResourceBinding],
        ) -> usize {
            self.sets.push(bindings.to_vec());
            self.sets.len() - 1
        }

        fn record_draw(&mut self, pass: DrawPass<'_, usize, usize>) {
            assert_eq!(self.pipelines[*pass.pipeline], *pass.caps);
            self.draws
                .push((*pass.caps, *pass.params, pass.scissor, pass.vertices));
        }

        fn submit_frame(&mut self) {
            self.submits += 1;
        }
    }

    fn triangles(count: usize) -> Vec<PrimVertex> {
        (0..count * 3)
            .map(|i| PrimVertex::solid(i as f32, 0.0, 0, [1, 2, 3, 4]))
            .collect()
    }

    fn draw() -> Draw<Recorder> {
        Draw::new(Recorder::with_capacity(30))
    }

    #[test]
    fn one_draw_per_flush_covering_all_appends() {
        let mut d = draw();
        d.add_vertices(&triangles(1));
        d.add_vertices(&triangles(2));
        d.flush_vertices();
        d.add_vertices(&triangles(1));
        d.flush_vertices();

        let ranges: Vec<_> = d.backend().draws.iter().map(|d| d.3.clone()).collect();
        assert_eq!(ranges, [0..9, 9..12]);
        assert_eq!(d.stats().draws, 2);
        assert_eq!(d.stats().vertices, 12);
    }

    #[test]
    fn empty_flush_records_nothing() {
        let mut d = draw();
        d.flush_vertices();
        d.flush_vertices();
        assert!(d.backend().draws.is_empty());
    }

    #[test]
    fn unchanged_state_never_flushes() {
        let mut d = draw();
        d.add_vertices(&triangles(1));
        d.set_pipeline_caps(PipelineCaps::default());
        d.set_framebuffer_params(0, 0, 0xFFFF_FFFF);
        d.set_depthbuffer_params(0, 0);
        d.set_texture_params(0, 0, 0, 0, 0);
        d.set_texture_alpha_params(0, 0);
        d.set_alpha_test_params(0);
        d.set_texture_clamp_params(0, 0, 0, 0);
        d.set_alpha_blending_params(0);
        d.set_scissor(0, 0, 1024, 1024);
        assert!(d.backend().draws.is_empty());
        assert_eq!(d.pending_vertices(), 3);
    }

    #[test]
    fn change_flushes_once_under_previous_state() {
        let mut d = draw();
        d.add_vertices(&triangles(1));
        d.set_framebuffer_params(0x2000, 640, 0xFFFF_FFFF);
        assert_eq!(d.backend().draws.len(), 1);
        assert_eq!(d.backend().draws[0].1.fb_buf_addr, 0);
        assert_eq!(d.params().fb_buf_addr, 0x2000);

        // Nothing pending: a further change flushes nothing.
        d.set_alpha_test_params(0x40);
        assert_eq!(d.backend().draws.len(), 1);

        d.add_vertices(&triangles(1));
        let caps = PipelineCaps {
            alpha_test: AlphaTest::GEqual,
            ..PipelineCaps::default()
        };
        d.set_pipeline_caps(caps);
        d.add_vertices(&triangles(1));
        d.set_scissor(0, 0, 320, 240);
        d.flush_vertices();

        let draws = &d.backend().draws;
        assert_eq!(draws.len(), 3);
        assert_eq!(draws[1].0, PipelineCaps::default());
        assert_eq!(draws[1].1.alpha_ref, 0x40);
        assert_eq!(draws[2].0, caps);
        assert_eq!(draws[2].2, Scissor::default());
    }

    #[test]
    fn caches_build_once_per_key() {
        let mut d = draw();
        let textured = PipelineCaps {
            has_texture: true,
            texture_format: TextureFormat::T8,
            ..Default::default()
        };
        let variants = [
            PipelineCaps::default(),
            textured,
            PipelineCaps {
                depth_test: DepthTest::Greater,
                ..Default::default()
            },
            textured,
            PipelineCaps::default(),
        ];
        for caps in variants {
            d.set_pipeline_caps(caps);
            d.add_vertices(&triangles(1));
        }
        d.flush_vertices();

        let stats = d.stats();
        assert_eq!(stats.draws, 5);
        assert_eq!(stats.pipelines_built, 3);
        // The depth-test variant shares the untextured resource set.
        assert_eq!(stats.resource_sets_built, 2);
        assert_eq!(d.backend().sets[1], resource_bindings(&DescriptorSetCaps::from(&textured)));
    }

    #[test]
    fn overflow_recycles_frame_storage() {
        let mut d = draw();
        d.add_vertices(&triangles(8));
        d.add_vertices(&triangles(3));

        let backend = d.backend();
        assert_eq!(backend.submits, 1);
        assert_eq!(backend.draws.len(), 1);
        assert_eq!(backend.draws[0].3, 0..24);
        assert_eq!(d.pending_vertices(), 9);
        d.flush_vertices();
        assert_eq!(d.backend().draws[1].3, 0..9);
    }

    #[test]
    fn frame_hooks_reset_storage() {
        let mut d = draw();
        d.add_vertices(&triangles(2));
        d.flush_frame();
        assert_eq!(d.backend().draws.len(), 1);
        assert_eq!(d.backend().submits, 1);
        d.add_vertices(&triangles(1));
        d.flush_frame();
        assert_eq!(d.backend().draws[1].3, 0..3);
        assert_eq!(d.stats().frames, 2);
    }

    #[test]
    #[should_panic(expected = "not a triangle list")]
    fn partial_triangle_is_fatal() {
        let mut d = draw();
        d.add_vertices(&triangles(1)[..2]);
        d.flush_vertices();
    }

    #[test]
    #[should_panic(expected = "do not fit")]
    fn oversized_append_is_fatal() {
        let mut d = draw();
        d.add_vertices(&triangles(11));
    }
}
