use bytemuck::{Pod, Zeroable};

/// One primitive vertex, stored as-is in per-frame vertex storage.
///
/// Position is in draw-area pixels, `z` is the raw unsigned depth, `color` packs RGBA
/// with R in the low byte and `(s, t, q)` is the homogeneous texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct PrimVertex {
    pub x: f32,
    pub y: f32,
    pub z: u32,
    pub color: u32,
    pub s: f32,
    pub t: f32,
    pub q: f32,
}

impl PrimVertex {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        0 => Float32x2, // position
        1 => Uint32,    // depth
        2 => Unorm8x4,  // color
        3 => Float32x3  // tex coord
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<PrimVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }

    /// Untextured vertex with a solid RGBA color.
    pub fn solid(x: f32, y: f32, z: u32, rgba: [u8; 4]) -> Self {
        Self {
            x,
            y,
            z,
            color: u32::from_le_bytes(rgba),
            s: 0.0,
            t: 0.0,
            q: 1.0,
        }
    }

    /// Vertex color as normalized RGBA.
    pub fn rgba(&self) -> [f32; 4] {
        self.color.to_le_bytes().map(|c| c as f32 / 255.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_struct() {
        assert_eq!(std::mem::size_of::<PrimVertex>(), 28);
        assert_eq!(PrimVertex::layout().array_stride, 28);
        assert_eq!(PrimVertex::ATTRS[3].offset, 16);
    }

    #[test]
    fn solid_packs_red_low() {
        let v = PrimVertex::solid(0.0, 0.0, 0, [255, 0, 0, 128]);
        assert_eq!(v.color, 0x8000_00FF);
        assert_eq!(v.rgba()[3], 128.0 / 255.0);
    }
}
