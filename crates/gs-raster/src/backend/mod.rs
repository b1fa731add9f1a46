//! Graphics backends.
//!
//! `DrawBackend` is the seam between the state tracker and the graphics API: it creates
//! programs and resource sets on cache misses, owns the per-frame vertex storage and
//! records one draw per flushed batch.

use std::ops::Range;

use crate::cache::ResourceBinding;
use crate::caps::{DescriptorSetCaps, PipelineCaps};
use crate::params::{DrawParams, Scissor};
use crate::shader::DrawProgram;
use crate::vertex::PrimVertex;

pub mod gpu;
pub mod software;

pub use gpu::WgpuBackend;
pub use software::SoftwareBackend;

/// Number of palette entries in the CLUT image.
pub const CLUT_ENTRIES: usize = 512;

/// How a backend keeps the read-modify-write tail of the pixel pipeline atomic per
/// pixel across overlapping primitives.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum InterlockStrategy {
    /// Fragments touching the same pixel are ordered by the backend itself.
    Native,
    /// The backend cannot order fragments inside one pass; batches are split into runs
    /// of non-overlapping triangles, one pass per run.
    SerializedOverlaps,
}

/// Everything needed to record one draw.
#[derive(Debug)]
pub struct DrawPass<'a, P, R> {
    pub caps: &'a PipelineCaps,
    pub pipeline: &'a P,
    pub resources: &'a R,
    pub params: &'a DrawParams,
    pub scissor: Scissor,
    /// Vertex range in the active frame's vertex storage.
    pub vertices: Range<u32>,
}

pub trait DrawBackend {
    type Pipeline;
    type ResourceSet;

    fn interlock(&self) -> InterlockStrategy;

    /// Vertex storage of the active frame. Its length is the frame's capacity.
    fn vertex_storage(&mut self) -> &mut [PrimVertex];

    fn create_pipeline(&mut self, caps: &PipelineCaps, program: &DrawProgram) -> Self::Pipeline;

    fn create_resource_set(
        &mut self,
        caps: &DescriptorSetCaps,
        bindings: &[ResourceBinding],
    ) -> Self::ResourceSet;

    fn record_draw(&mut self, pass: DrawPass<'_, Self::Pipeline, Self::ResourceSet>);

    /// Submits the frame's recorded work and makes the next frame's vertex storage
    /// active, blocking until that storage is no longer in use.
    fn submit_frame(&mut self);
}

/// Axis-aligned bounds of one triangle, in draw-area pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Bounds {
    min: [f32; 2],
    max: [f32; 2],
}

impl Bounds {
    fn of(tri: &[PrimVertex]) -> Self {
        let mut bounds = Bounds {
            min: [f32::INFINITY; 2],
            max: [f32::NEG_INFINITY; 2],
        };
        for v in tri {
            bounds.min = [bounds.min[0].min(v.x), bounds.min[1].min(v.y)];
            bounds.max = [bounds.max[0].max(v.x), bounds.max[1].max(v.y)];
        }
        bounds
    }

    /// Touching edges count as overlap; triangles sharing an edge may share pixels.
    fn overlaps(&self, other: &Bounds) -> bool {
        self.min[0] <= other.max[0]
            && other.min[0] <= self.max[0]
            && self.min[1] <= other.max[1]
            && other.min[1] <= self.max[1]
    }
}

/// Splits a triangle list into consecutive runs in which no two triangles' bounding
/// boxes intersect.
///
/// Ranges are vertex indices relative to `vertices` and together cover it in order.
pub fn split_overlapping(vertices: &[PrimVertex]) -> Vec<Range<u32>> {
    assert!(vertices.len() % 3 == 0, "triangle list of {} vertices", vertices.len());

    let mut runs = Vec::new();
    let mut run_start = 0u32;
    let mut run_bounds: Vec<Bounds> = Vec::new();

    for (index, tri) in vertices.chunks_exact(3).enumerate() {
        let start = index as u32 * 3;
        let bounds = Bounds::of(tri);
        if run_bounds.iter().any(|b| b.overlaps(&bounds)) {
            runs.push(run_start..start);
            run_start = start;
            run_bounds.clear();
        }
        run_bounds.push(bounds);
    }
    if !run_bounds.is_empty() {
        runs.push(run_start..vertices.len() as u32);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tri(x: f32, y: f32, size: f32) -> [PrimVertex; 3] {
        let white = [255; 4];
        [
            PrimVertex::solid(x, y, 0, white),
            PrimVertex::solid(x + size, y, 0, white),
            PrimVertex::solid(x, y + size, 0, white),
        ]
    }

    #[test]
    fn disjoint_triangles_share_a_run() {
        let list: Vec<_> = [tri(0.0, 0.0, 10.0), tri(20.0, 0.0, 10.0), tri(0.0, 20.0, 10.0)]
            .concat();
        assert_eq!(split_overlapping(&list), [0..9]);
    }

    #[test]
    fn overlap_starts_a_new_run() {
        let list: Vec<_> = [
            tri(0.0, 0.0, 10.0),
            tri(20.0, 0.0, 10.0),
            tri(5.0, 5.0, 10.0),
            tri(40.0, 40.0, 4.0),
            tri(41.0, 41.0, 1.0),
        ]
        .concat();
        assert_eq!(split_overlapping(&list), [0..6, 6..12, 12..15]);
    }

    #[test]
    fn shared_edge_counts_as_overlap() {
        let list: Vec<_> = [tri(0.0, 0.0, 10.0), tri(10.0, 0.0, 10.0)].concat();
        assert_eq!(split_overlapping(&list), [0..3, 3..6]);
    }

    #[test]
    fn empty_list_has_no_runs() {
        assert!(split_overlapping(&[]).is_empty());
    }
}
