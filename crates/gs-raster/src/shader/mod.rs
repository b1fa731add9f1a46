//! Draw program synthesis.
//!
//! Every `PipelineCaps` value maps to one WGSL vertex/fragment pair. The vertex stage
//! is shared by all variants; the fragment stage is assembled from the capability
//! fields so each variant only contains the decode, test and blend steps it needs.

mod fragment;
mod vertex;

use crate::caps::PipelineCaps;

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

/// Binding slots of the resource group (group 0).
pub mod binding {
    pub const MEMORY: u32 = 0;
    pub const CLUT: u32 = 1;
    pub const TEXTURE_SWIZZLE: u32 = 2;
    pub const FRAMEBUFFER_SWIZZLE: u32 = 3;
    pub const DEPTH_SWIZZLE: u32 = 4;
}

/// Bind group index of the resource bindings.
pub const RESOURCE_GROUP: u32 = 0;
/// Bind group index of the `DrawParams` uniform.
pub const PARAMS_GROUP: u32 = 1;

/// WGSL source of one specialized draw program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawProgram {
    pub vertex: String,
    pub fragment: String,
}

/// Builds the program for `caps`.
///
/// The result depends only on `caps`; equal descriptors always produce identical
/// sources.
pub fn synthesize(caps: &PipelineCaps) -> DrawProgram {
    DrawProgram {
        vertex: vertex::source(),
        fragment: fragment::source(caps),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::caps::{
        AlphaTest, BlendFactor, BlendInput, ClampMode, DepthTest, TextureFunction,
    };
    use crate::psm::{ClutFormat, DepthFormat, FramebufferFormat, TextureFormat};

    fn validate(label: &str, source: &str) {
        let module = naga::front::wgsl::parse_str(source)
            .unwrap_or_else(|e| panic!("{label}: {}", e.emit_to_string(source)));
        naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::empty(),
        )
        .validate(&module)
        .unwrap_or_else(|e| panic!("{label}: {e:?}"));
    }

    fn validate_caps(caps: &PipelineCaps) {
        let program = synthesize(caps);
        validate(&format!("{caps:?} (fragment)"), &program.fragment);
    }

    #[test]
    fn vertex_program_is_valid() {
        validate("vertex", &vertex::source());
    }

    #[test]
    fn untextured_default_is_valid() {
        validate_caps(&PipelineCaps::default());
    }

    #[test]
    fn every_texture_and_clut_format_is_valid() {
        for texture_format in TextureFormat::ALL {
            for clut_format in [ClutFormat::Ct32, ClutFormat::Ct16, ClutFormat::Ct16S] {
                validate_caps(&PipelineCaps {
                    has_texture: true,
                    texture_format,
                    clut_format,
                    texture_has_alpha: true,
                    texture_black_is_transparent: true,
                    ..Default::default()
                });
            }
        }
    }

    #[test]
    fn every_buffer_format_and_test_is_valid() {
        let framebuffers = [
            FramebufferFormat::Ct32,
            FramebufferFormat::Ct24,
            FramebufferFormat::Ct16,
            FramebufferFormat::Ct16S,
        ];
        let depths = [DepthFormat::Z32, DepthFormat::Z24, DepthFormat::Z16, DepthFormat::Z16S];
        let depth_tests = [
            DepthTest::Never,
            DepthTest::Always,
            DepthTest::GEqual,
            DepthTest::Greater,
        ];
        for framebuffer_format in framebuffers {
            for depthbuffer_format in depths {
                for depth_test in depth_tests {
                    validate_caps(&PipelineCaps {
                        framebuffer_format,
                        depthbuffer_format,
                        depth_test,
                        write_depth: true,
                        mask_color: true,
                        ..Default::default()
                    });
                }
            }
        }
    }

    #[test]
    fn every_blend_operand_and_function_is_valid() {
        let inputs = [BlendInput::Cs, BlendInput::Cd, BlendInput::Zero];
        for blend_a in inputs {
            for blend_c in [BlendFactor::As, BlendFactor::Ad, BlendFactor::Fix] {
                validate_caps(&PipelineCaps {
                    has_alpha_blending: true,
                    blend_a,
                    blend_b: BlendInput::Cd,
                    blend_c,
                    blend_d: blend_a,
                    alpha_test: AlphaTest::GEqual,
                    ..Default::default()
                });
            }
        }
        let clamps = [
            ClampMode::Repeat,
            ClampMode::Clamp,
            ClampMode::RegionClamp,
            ClampMode::RegionRepeat,
        ];
        for function in [
            TextureFunction::Modulate,
            TextureFunction::Decal,
            TextureFunction::Highlight2,
        ] {
            for clamp in clamps {
                validate_caps(&PipelineCaps {
                    has_texture: true,
                    texture_function: function,
                    tex_clamp_u: clamp,
                    tex_clamp_v: clamp,
                    alpha_test: AlphaTest::Equal,
                    ..Default::default()
                });
            }
        }
    }

    #[test]
    fn synthesis_is_deterministic_and_specialized() {
        let plain = PipelineCaps::default();
        assert_eq!(synthesize(&plain), synthesize(&plain));

        let textured = PipelineCaps {
            has_texture: true,
            texture_format: TextureFormat::T8,
            ..plain
        };
        let plain_src = synthesize(&plain).fragment;
        let textured_src = synthesize(&textured).fragment;
        assert_ne!(plain_src, textured_src);
        assert!(!plain_src.contains("clut_image"));
        assert!(textured_src.contains("clut_image"));
        assert!(!plain_src.contains("tex_swizzle"));
    }

    #[test]
    fn untouched_steps_are_left_out() {
        let src = synthesize(&PipelineCaps::default()).fragment;
        // No blending, no masking and an ALWAYS depth test: nothing reads back.
        assert!(!src.contains("dst_pixel = memory_read"));
        assert!(!src.contains("dst_depth"));
        assert!(!src.contains("depth_address, depth)"));
    }
}
