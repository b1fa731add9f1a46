//! Per-draw parameter snapshot.

use bytemuck::{Pod, Zeroable};

use crate::DRAW_AREA_SIZE;

/// Parameter payload handed to the fragment program with every draw.
///
/// Changing a field flushes the pending batch but never requires a new program. The
/// layout matches the `DrawParams` uniform struct in `common.wgsl`: five rows of four
/// 32-bit words.
///
/// Addresses are byte addresses into GS memory, widths are in pixels, and the alpha
/// constants (`tex_a0`, `tex_a1`, `alpha_fix`, `alpha_ref`) are 8-bit values.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawParams {
    pub fb_buf_addr: u32,
    pub fb_buf_width: u32,
    pub depth_buf_addr: u32,
    pub depth_buf_width: u32,

    pub tex_buf_addr: u32,
    pub tex_buf_width: u32,
    pub tex_width: u32,
    pub tex_height: u32,

    /// First CLUT entry used by 4-bit indices.
    pub tex_csa: u32,
    pub tex_a0: u32,
    pub tex_a1: u32,
    pub _pad0: u32,

    pub clamp_min_u: u32,
    pub clamp_min_v: u32,
    pub clamp_max_u: u32,
    pub clamp_max_v: u32,

    /// Bits set here are written; cleared bits keep the stored value.
    pub fb_write_mask: u32,
    pub alpha_fix: u32,
    pub alpha_ref: u32,
    pub _pad1: u32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            fb_write_mask: 0xFFFF_FFFF,
            ..Zeroable::zeroed()
        }
    }
}

/// Scissor rectangle in draw-area pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Scissor {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Default for Scissor {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            width: DRAW_AREA_SIZE,
            height: DRAW_AREA_SIZE,
        }
    }
}

impl Scissor {
    /// Returns the rectangle clipped to the draw area.
    pub fn clipped(self) -> Self {
        let x = self.x.min(DRAW_AREA_SIZE);
        let y = self.y.min(DRAW_AREA_SIZE);
        Self {
            x,
            y,
            width: self.width.min(DRAW_AREA_SIZE - x),
            height: self.height.min(DRAW_AREA_SIZE - y),
        }
    }

    #[inline]
    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.x && y >= self.y && x - self.x < self.width && y - self.y < self.height
    }
}
