//! CPU backend.
//!
//! Runs the same per-pixel pipeline as the synthesized fragment programs against an
//! in-process `GsMemory`. Triangles and their fragments are processed strictly in
//! submission order, which gives native per-pixel ordering.

mod pixel;
mod raster;

use crate::backend::{DrawBackend, DrawPass, InterlockStrategy, CLUT_ENTRIES};
use crate::cache::ResourceBinding;
use crate::caps::{DescriptorSetCaps, PipelineCaps};
use crate::memory::{GsMemory, SwizzleSet};
use crate::shader::DrawProgram;
use crate::vertex::PrimVertex;
use crate::DEPTH_MAX;

use pixel::{Fragment, PixelState};

/// "Compiled" program of the CPU backend: the descriptor it specializes on.
#[derive(Debug, Clone)]
pub struct SoftwarePipeline {
    caps: PipelineCaps,
}

#[derive(Debug, Clone)]
pub struct SoftwareResources {
    bindings: Vec<ResourceBinding>,
}

impl SoftwareResources {
    pub fn bindings(&self) -> &[ResourceBinding] {
        &self.bindings
    }
}

pub struct SoftwareBackend {
    memory: GsMemory,
    swizzle: SwizzleSet,
    clut: Vec<u32>,
    vertices: Vec<PrimVertex>,
    frames_submitted: u64,
}

impl SoftwareBackend {
    /// Creates a backend with `vertex_capacity` vertices of frame storage.
    pub fn new(swizzle: SwizzleSet, vertex_capacity: usize) -> Self {
        Self {
            memory: GsMemory::new(),
            swizzle,
            clut: vec![0; CLUT_ENTRIES],
            vertices: vec![PrimVertex::default(); vertex_capacity],
            frames_submitted: 0,
        }
    }

    pub fn memory(&self) -> &GsMemory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut GsMemory {
        &mut self.memory
    }

    pub fn swizzle(&self) -> &SwizzleSet {
        &self.swizzle
    }

    /// CLUT entries, 16 bits each. 32-bit colors keep their high half 256 entries on.
    pub fn clut_mut(&mut self) -> &mut [u32] {
        &mut self.clut
    }

    pub fn frames_submitted(&self) -> u64 {
        self.frames_submitted
    }
}

fn interpolate(tri: &[PrimVertex], x: i32, y: i32, w: [f32; 3]) -> Fragment {
    let mut depth = 0.0;
    let mut color = [0.0; 4];
    let mut tex_coord = [0.0; 3];
    for (v, weight) in tri.iter().zip(w) {
        depth += weight * (v.z as f32 / DEPTH_MAX);
        for (c, vc) in color.iter_mut().zip(v.rgba()) {
            *c += weight * vc;
        }
        for (t, vt) in tex_coord.iter_mut().zip([v.s, v.t, v.q]) {
            *t += weight * vt;
        }
    }
    Fragment {
        x,
        y,
        depth,
        color,
        tex_coord,
    }
}

impl DrawBackend for SoftwareBackend {
    type Pipeline = SoftwarePipeline;
    type ResourceSet = SoftwareResources;

    fn interlock(&self) -> InterlockStrategy {
        InterlockStrategy::Native
    }

    fn vertex_storage(&mut self) -> &mut [PrimVertex] {
        &mut self.vertices
    }

    fn create_pipeline(&mut self, caps: &PipelineCaps, _program: &DrawProgram) -> SoftwarePipeline {
        log::debug!("software pipeline for {caps:?}");
        SoftwarePipeline { caps: *caps }
    }

    fn create_resource_set(
        &mut self,
        caps: &DescriptorSetCaps,
        bindings: &[ResourceBinding],
    ) -> SoftwareResources {
        log::debug!("software resource set for {caps:?}: {bindings:?}");
        SoftwareResources {
            bindings: bindings.to_vec(),
        }
    }

    fn record_draw(&mut self, pass: DrawPass<'_, SoftwarePipeline, SoftwareResources>) {
        let caps = &pass.pipeline.caps;
        debug_assert_eq!(caps, pass.caps);
        assert!(
            !caps.uses_clut() || pass.resources.bindings.contains(&ResourceBinding::Clut),
            "indexed texture drawn without a CLUT binding"
        );

        let state = PixelState {
            caps,
            params: pass.params,
            swizzle: &self.swizzle,
            clut: &self.clut,
        };
        let memory = &mut self.memory;
        let range = pass.vertices.start as usize..pass.vertices.end as usize;
        for tri in self.vertices[range].chunks_exact(3) {
            raster::rasterize(tri, &pass.scissor, |x, y, w| {
                let frag = interpolate(tri, x, y, w);
                pixel::shade(&state, memory, &frag);
            });
        }
    }

    fn submit_frame(&mut self) {
        self.frames_submitted += 1;
        log::trace!("software frame {} submitted", self.frames_submitted);
    }
}
