//! Fragment stage assembly.
//!
//! The program is built in the order pixels flow through it: address helpers, texture
//! fetch and decode, then `fs_main` (coordinates, combine, alpha test) which hands the
//! surviving fragment to `commit_pixel`. Everything `commit_pixel` does (destination
//! reads, depth test, blend, writes) must appear atomic per pixel; the backend
//! guarantees that by its interlock strategy.

use std::fmt::Write as _;

use crate::caps::{
    AlphaTest, BlendFactor, BlendInput, ClampMode, DepthTest, PipelineCaps, TextureFunction,
};
use crate::memory::GS_RAM_SIZE;
use crate::psm::{ClutFormat, DepthFormat, FramebufferFormat, Psm, TextureFormat, PAGE_SIZE};

use super::binding;

const COMMON: &str = include_str!("shaders/common.wgsl");

pub(super) fn source(caps: &PipelineCaps) -> String {
    let mut src = String::with_capacity(COMMON.len() + 4096);
    src.push_str(COMMON);
    src.push('\n');

    declare_images(&mut src, caps);

    pixel_address_fn(&mut src, "fb_pixel_address", "fb_swizzle", caps.framebuffer_format.into());
    pixel_address_fn(&mut src, "depth_pixel_address", "depth_swizzle", caps.depthbuffer_format.into());

    if caps.has_texture {
        pixel_address_fn(&mut src, "tex_pixel_address", "tex_swizzle", caps.texture_format.into());
        clamp_fn(&mut src, "clamp_u", caps.tex_clamp_u);
        clamp_fn(&mut src, "clamp_v", caps.tex_clamp_v);
        if caps.texture_format.is_indexed() {
            clut_fn(&mut src, caps);
        }
        texture_fn(&mut src, caps.texture_format);
    }

    commit_fn(&mut src, caps);
    main_fn(&mut src, caps);
    src
}

fn declare_images(src: &mut String, caps: &PipelineCaps) {
    let mut images = vec![
        (binding::FRAMEBUFFER_SWIZZLE, "fb_swizzle"),
        (binding::DEPTH_SWIZZLE, "depth_swizzle"),
    ];
    if caps.has_texture {
        images.push((binding::TEXTURE_SWIZZLE, "tex_swizzle"));
    }
    if caps.uses_clut() {
        images.push((binding::CLUT, "clut_image"));
    }
    images.sort_by_key(|(slot, _)| *slot);
    for (slot, name) in images {
        let _ = writeln!(src, "@group(0) @binding({slot}) var {name}: texture_2d<u32>;");
    }
    src.push('\n');
}

/// Emits `fn name(base: u32, width: u32, pos: vec2<i32>) -> u32` for one format.
///
/// Page geometry is inlined; only the in-page offset comes from the lookup image.
fn pixel_address_fn(src: &mut String, name: &str, table: &str, psm: Psm) {
    let storage = psm.storage();
    let (width, height) = (storage.page_width(), storage.page_height());
    let units = storage.units_per_byte();
    let _ = write!(
        src,
        r#"fn {name}(base: u32, width: u32, pos: vec2<i32>) -> u32 {{
    let page = pos >> vec2<u32>({shift_x}u, {shift_y}u);
    let in_page = vec2<i32>(vec2<u32>(pos) & vec2<u32>({mask_x}u, {mask_y}u));
    let pages_per_row = i32(width / {width}u);
    let page_index = u32(page.x + page.y * pages_per_row);
    let page_offset = textureLoad({table}, in_page, 0).x;
    return (base * {units}u + page_index * {page_units}u + page_offset) & 0x{addr_mask:X}u;
}}

"#,
        shift_x = width.trailing_zeros(),
        shift_y = height.trailing_zeros(),
        mask_x = width - 1,
        mask_y = height - 1,
        page_units = PAGE_SIZE * units,
        addr_mask = GS_RAM_SIZE * units - 1,
    );
}

fn clamp_fn(src: &mut String, name: &str, mode: ClampMode) {
    let expr = match mode {
        ClampMode::Repeat => "coord & (size - 1)",
        ClampMode::Clamp => "clamp(coord, 0, size - 1)",
        ClampMode::RegionClamp => "min(max(coord, min_value), max_value)",
        ClampMode::RegionRepeat => "(coord & min_value) | max_value",
    };
    let _ = write!(
        src,
        "fn {name}(coord: i32, size: i32, min_value: i32, max_value: i32) -> i32 {{\n    return {expr};\n}}\n\n"
    );
}

fn clut_fn(src: &mut String, caps: &PipelineCaps) {
    // 8-bit indices address the whole table; 4-bit ones start at the entry offset.
    let offset = if caps.texture_format.is_idx8() {
        ""
    } else {
        " + i32(params.tex1.x)"
    };
    let lookup = match caps.clut_format {
        ClutFormat::Ct32 => concat!(
            "    let lo = textureLoad(clut_image, vec2<i32>(index, 0), 0).x;\n",
            "    let hi = textureLoad(clut_image, vec2<i32>(index + 256, 0), 0).x;\n",
            "    return psm32_to_color(lo | (hi << 16u));\n",
        ),
        ClutFormat::Ct16 | ClutFormat::Ct16S => {
            "    return psm16_to_color(textureLoad(clut_image, vec2<i32>(index, 0), 0).x);\n"
        }
    };
    let _ = write!(
        src,
        "fn clut_color(pixel: u32) -> vec4<f32> {{\n    let index = i32(pixel){offset};\n{lookup}}}\n\n"
    );
}

fn texture_fn(src: &mut String, format: TextureFormat) {
    let fetch = match format {
        TextureFormat::Ct32 => "psm32_to_color(memory_read32(address))",
        TextureFormat::Ct24 => "psm32_to_color(memory_read24(address))",
        TextureFormat::Ct16 | TextureFormat::Ct16S => "psm16_to_color(memory_read16(address))",
        TextureFormat::T8 => "clut_color(memory_read8(address))",
        TextureFormat::T4 => "clut_color(memory_read4(address))",
        TextureFormat::T8H => "clut_color(memory_read8(address + 3u))",
        TextureFormat::T4HL => "clut_color(memory_read4((address + 3u) * 2u))",
        TextureFormat::T4HH => "clut_color(memory_read4(((address + 3u) * 2u) | 1u))",
    };
    let _ = write!(
        src,
        r#"fn texture_color(pos: vec2<i32>) -> vec4<f32> {{
    let address = tex_pixel_address(params.tex0.x, params.tex0.y, pos);
    return {fetch};
}}

"#
    );
}

fn blend_input(input: BlendInput) -> &'static str {
    match input {
        BlendInput::Cs => "src_color.rgb",
        BlendInput::Cd => "dst_color.rgb",
        BlendInput::Zero => "vec3<f32>(0.0)",
    }
}

fn blend_factor(factor: BlendFactor) -> &'static str {
    match factor {
        BlendFactor::As => "src_color.a",
        BlendFactor::Ad => "dst_color.a",
        BlendFactor::Fix => "(f32(params.alpha_fb.y) / 255.0)",
    }
}

fn commit_fn(src: &mut String, caps: &PipelineCaps) {
    src.push_str(
        "fn commit_pixel(src_color: vec4<f32>, src_depth: u32, fb_address: u32, depth_address: u32) -> vec4<f32> {\n",
    );
    src.push_str("    var dst_pixel = 0u;\n    var dst_color = vec4<f32>(0.0);\n");

    let (fb_read, fb_decode, fb_encode, fb_write) = match caps.framebuffer_format {
        FramebufferFormat::Ct32 => ("memory_read32", "psm32_to_color", "color_to_psm32", "memory_write32"),
        FramebufferFormat::Ct24 => ("memory_read24", "psm32_to_color", "color_to_psm32", "memory_write24"),
        FramebufferFormat::Ct16 | FramebufferFormat::Ct16S => {
            ("memory_read16", "psm16_to_color", "color_to_psm16", "memory_write16")
        }
    };
    if caps.reads_color() {
        let _ = write!(
            src,
            "    dst_pixel = {fb_read}(fb_address);\n    dst_color = {fb_decode}(dst_pixel);\n"
        );
    }

    let (depth_read, depth_write) = match caps.depthbuffer_format {
        DepthFormat::Z32 => ("memory_read32", "memory_write32"),
        DepthFormat::Z24 => ("memory_read24", "memory_write24"),
        DepthFormat::Z16 | DepthFormat::Z16S => ("memory_read16", "memory_write16"),
    };
    let _ = writeln!(
        src,
        "    let depth = src_depth & 0x{:X}u;",
        caps.depthbuffer_format.mask()
    );
    match caps.depth_test {
        DepthTest::Never => src.push_str("    let depth_pass = false;\n"),
        DepthTest::Always => src.push_str("    let depth_pass = true;\n"),
        DepthTest::GEqual | DepthTest::Greater => {
            let op = if caps.depth_test == DepthTest::GEqual { ">=" } else { ">" };
            let _ = write!(
                src,
                "    let dst_depth = {depth_read}(depth_address);\n    let depth_pass = depth {op} dst_depth;\n"
            );
        }
    }

    if caps.has_alpha_blending {
        let _ = write!(
            src,
            "    let blended = ({a} - {b}) * {c} * 2.0 + {d};\n    let out_color = clamp(vec4<f32>(blended, src_color.a), vec4<f32>(0.0), vec4<f32>(1.0));\n",
            a = blend_input(caps.blend_a),
            b = blend_input(caps.blend_b),
            c = blend_factor(caps.blend_c),
            d = blend_input(caps.blend_d),
        );
    } else {
        src.push_str("    let out_color = src_color;\n");
    }

    src.push_str("    if depth_pass {\n");
    let _ = write!(
        src,
        "        let write_mask = params.alpha_fb.x;\n        let pixel = ({fb_encode}(out_color) & write_mask) | (dst_pixel & ~write_mask);\n        {fb_write}(fb_address, pixel);\n"
    );
    if caps.write_depth {
        let _ = writeln!(src, "        {depth_write}(depth_address, depth);");
    }
    src.push_str("    }\n    return out_color;\n}\n\n");
}

fn main_fn(src: &mut String, caps: &PipelineCaps) {
    src.push_str("@fragment\nfn fs_main(input: FragmentInput) -> @location(0) vec4<f32> {\n");
    src.push_str("    let src_depth = u32(input.depth * DEPTH_MAX);\n");

    if caps.has_texture {
        src.push_str(concat!(
            "    let tex_size = vec2<i32>(params.tex0.zw);\n",
            "    let clamp_min = vec2<i32>(params.tex_clamp.xy);\n",
            "    let clamp_max = vec2<i32>(params.tex_clamp.zw);\n",
            "    let texel_pos = vec2<i32>(input.tex_coord.xy / input.tex_coord.z * vec2<f32>(tex_size));\n",
            "    let clamped_pos = vec2<i32>(\n",
            "        clamp_u(texel_pos.x, tex_size.x, clamp_min.x, clamp_max.x),\n",
            "        clamp_v(texel_pos.y, tex_size.y, clamp_min.y, clamp_max.y),\n",
            "    );\n",
            "    var color = texture_color(clamped_pos);\n",
        ));
        if caps.expands_texture_alpha() {
            src.push_str(concat!(
                "    let ta0 = f32(params.tex1.y) / 255.0;\n",
                "    let ta1 = f32(params.tex1.z) / 255.0;\n",
                "    color = vec4<f32>(color.rgb, mix(ta0, ta1, color.a));\n",
            ));
            if caps.texture_black_is_transparent {
                src.push_str(
                    "    if color.r + color.g + color.b == 0.0 {\n        color = vec4<f32>(color.rgb, 0.0);\n    }\n",
                );
            }
        }
        combine(src, caps);
    } else {
        src.push_str("    var color = input.color;\n");
    }

    match caps.alpha_test {
        AlphaTest::Always => src.push_str("    let alpha_pass = true;\n"),
        AlphaTest::Equal => {
            src.push_str("    let alpha_pass = quantize_alpha(color.a) == params.alpha_fb.z;\n")
        }
        AlphaTest::GEqual => {
            src.push_str("    let alpha_pass = quantize_alpha(color.a) >= params.alpha_fb.z;\n")
        }
    }

    src.push_str(concat!(
        "    if !alpha_pass {\n",
        "        return color;\n",
        "    }\n",
        "    let screen_pos = vec2<i32>(input.position.xy);\n",
        "    let fb_address = fb_pixel_address(params.fb_depth.x, params.fb_depth.y, screen_pos);\n",
        "    let depth_address = depth_pixel_address(params.fb_depth.z, params.fb_depth.w, screen_pos);\n",
        "    return commit_pixel(color, src_depth, fb_address, depth_address);\n",
        "}\n",
    ));
}

fn combine(src: &mut String, caps: &PipelineCaps) {
    let scaled = match caps.texture_function {
        TextureFunction::Decal => return,
        TextureFunction::Modulate => "color * input.color * 2.0",
        TextureFunction::Highlight2 => "color * input.color * 2.0 + vec4<f32>(input.color.a)",
    };
    let _ = writeln!(
        src,
        "    color = clamp({scaled}, vec4<f32>(0.0), vec4<f32>(1.0));"
    );
    if !caps.texture_has_alpha {
        src.push_str("    color = vec4<f32>(color.rgb, input.color.a);\n");
    }
}
