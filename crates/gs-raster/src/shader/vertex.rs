use crate::{DEPTH_MAX, DRAW_AREA_SIZE};

/// Vertex stage shared by every draw program.
///
/// Maps draw-area pixels to clip space with row 0 at the top, and carries depth as a
/// fraction of `DEPTH_MAX` so the fragment stage can rebuild the integer value.
pub(super) fn source() -> String {
    format!(
        r#"const DRAW_AREA_SIZE: f32 = {area:.1};
const DEPTH_MAX: f32 = {depth_max:.1};

struct VertexInput {{
    @location(0) position: vec2<f32>,
    @location(1) depth: u32,
    @location(2) color: vec4<f32>,
    @location(3) tex_coord: vec3<f32>,
}}

struct VertexOutput {{
    @builtin(position) position: vec4<f32>,
    @location(0) depth: f32,
    @location(1) color: vec4<f32>,
    @location(2) tex_coord: vec3<f32>,
}}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {{
    let ndc = input.position * (2.0 / DRAW_AREA_SIZE) - vec2<f32>(1.0);
    var output: VertexOutput;
    output.position = vec4<f32>(ndc.x, -ndc.y, 0.0, 1.0);
    output.depth = f32(input.depth) / DEPTH_MAX;
    output.color = input.color;
    output.tex_coord = input.tex_coord;
    return output;
}}
"#,
        area = DRAW_AREA_SIZE as f32,
        depth_max = DEPTH_MAX,
    )
}
