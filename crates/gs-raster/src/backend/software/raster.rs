//! Triangle scan conversion with pixel-centre sampling and a top-left fill rule.
//!
//! Coverage matches the host rasterizer closely enough that adjacent triangles
//! sharing an edge never both cover a pixel on it.

use crate::params::Scissor;
use crate::vertex::PrimVertex;

#[inline]
fn edge(a: [f32; 2], b: [f32; 2], p: [f32; 2]) -> f32 {
    (p[0] - a[0]) * (b[1] - a[1]) - (p[1] - a[1]) * (b[0] - a[0])
}

/// With positive area (y down), left edges run downwards and top edges run leftwards.
#[inline]
fn is_top_left(from: [f32; 2], to: [f32; 2]) -> bool {
    let (dx, dy) = (to[0] - from[0], to[1] - from[1]);
    dy > 0.0 || (dy == 0.0 && dx < 0.0)
}

#[inline]
fn inside(weight: f32, top_left: bool) -> bool {
    weight > 0.0 || (weight == 0.0 && top_left)
}

/// Calls `emit(x, y, weights)` for every pixel whose centre the triangle covers inside
/// the scissor. `weights` are the barycentric weights of `tri[0]`, `tri[1]` and `tri[2]`.
pub(super) fn rasterize(
    tri: &[PrimVertex],
    scissor: &Scissor,
    mut emit: impl FnMut(i32, i32, [f32; 3]),
) {
    let pos = |v: &PrimVertex| [v.x, v.y];
    let mut order = [0usize, 1, 2];
    let mut area = edge(pos(&tri[0]), pos(&tri[1]), pos(&tri[2]));
    if area == 0.0 || !area.is_finite() {
        return;
    }
    if area < 0.0 {
        order.swap(1, 2);
        area = -area;
    }
    let [a, b, c] = order.map(|i| pos(&tri[i]));

    let scissor = scissor.clipped();
    if scissor.width == 0 || scissor.height == 0 {
        return;
    }
    let min_x = a[0].min(b[0]).min(c[0]).floor().max(scissor.x as f32) as i32;
    let min_y = a[1].min(b[1]).min(c[1]).floor().max(scissor.y as f32) as i32;
    let max_x = a[0].max(b[0]).max(c[0]).ceil().min((scissor.x + scissor.width - 1) as f32) as i32;
    let max_y = a[1].max(b[1]).max(c[1]).ceil().min((scissor.y + scissor.height - 1) as f32) as i32;

    let top_left = [is_top_left(b, c), is_top_left(c, a), is_top_left(a, b)];

    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = [x as f32 + 0.5, y as f32 + 0.5];
            let w = [edge(b, c, p), edge(c, a, p), edge(a, b, p)];
            if !(0..3).all(|i| inside(w[i], top_left[i])) {
                continue;
            }
            let mut weights = [0.0; 3];
            for (slot, vertex) in order.iter().enumerate() {
                weights[*vertex] = w[slot] / area;
            }
            emit(x, y, weights);
        }
    }
}
