//! CPU execution of the specialized pixel pipeline.
//!
//! Every step follows the synthesized fragment program statement for statement,
//! including the order of float operations, so the two agree on rounding.

use crate::caps::{BlendFactor, BlendInput, PipelineCaps, TextureFunction};
use crate::memory::{pixel_address, GsMemory, SwizzleSet};
use crate::params::DrawParams;
use crate::psm::{
    color_to_psm16, color_to_psm32, psm16_to_color, psm32_to_color, quantize_alpha, ClutFormat,
    DepthFormat, FramebufferFormat, TextureFormat,
};
use crate::DEPTH_MAX;

/// Interpolated fragment inputs at one pixel centre.
#[derive(Debug, Copy, Clone)]
pub(super) struct Fragment {
    pub x: i32,
    pub y: i32,
    pub depth: f32,
    pub color: [f32; 4],
    pub tex_coord: [f32; 3],
}

/// Read-only state shared by every fragment of a draw.
pub(super) struct PixelState<'a> {
    pub caps: &'a PipelineCaps,
    pub params: &'a DrawParams,
    pub swizzle: &'a SwizzleSet,
    pub clut: &'a [u32],
}

type Color = [f32; 4];

/// Runs one fragment; returns the color the program would output.
pub(super) fn shade(state: &PixelState<'_>, memory: &mut GsMemory, frag: &Fragment) -> Color {
    let caps = state.caps;
    let params = state.params;
    let src_depth = (frag.depth * DEPTH_MAX) as u32;

    let color = if caps.has_texture {
        textured_color(state, memory, frag)
    } else {
        frag.color
    };

    if !caps
        .alpha_test
        .passes(quantize_alpha(color[3]), params.alpha_ref)
    {
        return color;
    }
    commit_pixel(state, memory, color, src_depth, frag.x, frag.y)
}

fn textured_color(state: &PixelState<'_>, memory: &GsMemory, frag: &Fragment) -> Color {
    let caps = state.caps;
    let params = state.params;
    let size = [params.tex_width as i32, params.tex_height as i32];
    let [s, t, q] = frag.tex_coord;
    let texel = [(s / q * size[0] as f32) as i32, (t / q * size[1] as f32) as i32];
    let u = caps.tex_clamp_u.apply(
        texel[0],
        size[0],
        params.clamp_min_u as i32,
        params.clamp_max_u as i32,
    );
    let v = caps.tex_clamp_v.apply(
        texel[1],
        size[1],
        params.clamp_min_v as i32,
        params.clamp_max_v as i32,
    );

    let mut color = texture_color(state, memory, u, v);

    if caps.expands_texture_alpha() {
        let ta0 = params.tex_a0 as f32 / 255.0;
        let ta1 = params.tex_a1 as f32 / 255.0;
        color[3] = mix(ta0, ta1, color[3]);
        if caps.texture_black_is_transparent && color[0] + color[1] + color[2] == 0.0 {
            color[3] = 0.0;
        }
    }

    combine(caps.texture_function, caps.texture_has_alpha, color, frag.color)
}

#[inline]
fn mix(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

fn combine(function: TextureFunction, has_alpha: bool, texel: Color, vertex: Color) -> Color {
    let offset = match function {
        TextureFunction::Decal => return texel,
        TextureFunction::Modulate => 0.0,
        TextureFunction::Highlight2 => vertex[3],
    };
    let mut color = [0.0; 4];
    for i in 0..4 {
        color[i] = (texel[i] * vertex[i] * 2.0 + offset).clamp(0.0, 1.0);
    }
    if !has_alpha {
        color[3] = vertex[3];
    }
    color
}

fn texture_color(state: &PixelState<'_>, memory: &GsMemory, u: i32, v: i32) -> Color {
    let params = state.params;
    let format = state.caps.texture_format;
    let address = pixel_address(
        state.swizzle.get(format),
        params.tex_buf_addr,
        params.tex_buf_width,
        u,
        v,
    );
    match format {
        TextureFormat::Ct32 => psm32_to_color(memory.read32(address)),
        TextureFormat::Ct24 => psm32_to_color(memory.read24(address)),
        TextureFormat::Ct16 | TextureFormat::Ct16S => psm16_to_color(memory.read16(address)),
        TextureFormat::T8 => clut_color(state, memory.read8(address)),
        TextureFormat::T4 => clut_color(state, memory.read4(address)),
        TextureFormat::T8H => clut_color(state, memory.read8(address.wrapping_add(3))),
        TextureFormat::T4HL => {
            clut_color(state, memory.read4(address.wrapping_add(3).wrapping_mul(2)))
        }
        TextureFormat::T4HH => {
            clut_color(state, memory.read4(address.wrapping_add(3).wrapping_mul(2) | 1))
        }
    }
}

fn clut_color(state: &PixelState<'_>, index: u32) -> Color {
    let offset = if state.caps.texture_format.is_idx8() {
        0
    } else {
        state.params.tex_csa as i32
    };
    let index = (index as i32).wrapping_add(offset);
    // Out-of-range image loads read zero.
    let entry = |i: i32| {
        usize::try_from(i)
            .ok()
            .and_then(|i| state.clut.get(i))
            .copied()
            .unwrap_or(0)
    };
    match state.caps.clut_format {
        ClutFormat::Ct32 => psm32_to_color(entry(index) | (entry(index.wrapping_add(256)) << 16)),
        ClutFormat::Ct16 | ClutFormat::Ct16S => psm16_to_color(entry(index)),
    }
}

fn read_framebuffer(format: FramebufferFormat, memory: &GsMemory, address: u32) -> u32 {
    match format {
        FramebufferFormat::Ct32 => memory.read32(address),
        FramebufferFormat::Ct24 => memory.read24(address),
        FramebufferFormat::Ct16 | FramebufferFormat::Ct16S => memory.read16(address),
    }
}

fn read_depth(format: DepthFormat, memory: &GsMemory, address: u32) -> u32 {
    match format {
        DepthFormat::Z32 => memory.read32(address),
        DepthFormat::Z24 => memory.read24(address),
        DepthFormat::Z16 | DepthFormat::Z16S => memory.read16(address),
    }
}

fn blend_input(input: BlendInput, src: &Color, dst: &Color) -> [f32; 3] {
    match input {
        BlendInput::Cs => [src[0], src[1], src[2]],
        BlendInput::Cd => [dst[0], dst[1], dst[2]],
        BlendInput::Zero => [0.0; 3],
    }
}

fn blend(caps: &PipelineCaps, params: &DrawParams, src: &Color, dst: &Color) -> Color {
    let a = blend_input(caps.blend_a, src, dst);
    let b = blend_input(caps.blend_b, src, dst);
    let d = blend_input(caps.blend_d, src, dst);
    let c = match caps.blend_c {
        BlendFactor::As => src[3],
        BlendFactor::Ad => dst[3],
        BlendFactor::Fix => params.alpha_fix as f32 / 255.0,
    };
    let mut out = [0.0, 0.0, 0.0, src[3].clamp(0.0, 1.0)];
    for i in 0..3 {
        out[i] = ((a[i] - b[i]) * c * 2.0 + d[i]).clamp(0.0, 1.0);
    }
    out
}

/// Destination reads, depth test, blend and writes for one fragment.
fn commit_pixel(
    state: &PixelState<'_>,
    memory: &mut GsMemory,
    src_color: Color,
    src_depth: u32,
    x: i32,
    y: i32,
) -> Color {
    let caps = state.caps;
    let params = state.params;
    let fb_address = pixel_address(
        state.swizzle.get(caps.framebuffer_format),
        params.fb_buf_addr,
        params.fb_buf_width,
        x,
        y,
    );
    let depth_address = pixel_address(
        state.swizzle.get(caps.depthbuffer_format),
        params.depth_buf_addr,
        params.depth_buf_width,
        x,
        y,
    );

    let mut dst_pixel = 0;
    let mut dst_color = [0.0; 4];
    if caps.reads_color() {
        dst_pixel = read_framebuffer(caps.framebuffer_format, memory, fb_address);
        dst_color = match caps.framebuffer_format {
            FramebufferFormat::Ct32 | FramebufferFormat::Ct24 => psm32_to_color(dst_pixel),
            FramebufferFormat::Ct16 | FramebufferFormat::Ct16S => psm16_to_color(dst_pixel),
        };
    }

    let depth = src_depth & caps.depthbuffer_format.mask();
    let depth_pass = caps
        .depth_test
        .passes(depth, || read_depth(caps.depthbuffer_format, memory, depth_address));

    let out_color = if caps.has_alpha_blending {
        blend(caps, params, &src_color, &dst_color)
    } else {
        src_color
    };

    if depth_pass {
        let mask = params.fb_write_mask;
        let encoded = match caps.framebuffer_format {
            FramebufferFormat::Ct32 | FramebufferFormat::Ct24 => color_to_psm32(out_color),
            FramebufferFormat::Ct16 | FramebufferFormat::Ct16S => color_to_psm16(out_color),
        };
        let pixel = (encoded & mask) | (dst_pixel & !mask);
        match caps.framebuffer_format {
            FramebufferFormat::Ct32 => memory.write32(fb_address, pixel),
            FramebufferFormat::Ct24 => memory.write24(fb_address, pixel),
            FramebufferFormat::Ct16 | FramebufferFormat::Ct16S => memory.write16(fb_address, pixel),
        }
        if caps.write_depth {
            match caps.depthbuffer_format {
                DepthFormat::Z32 => memory.write32(depth_address, depth),
                DepthFormat::Z24 => memory.write24(depth_address, depth),
                DepthFormat::Z16 | DepthFormat::Z16S => memory.write16(depth_address, depth),
            }
        }
    }
    out_color
}
