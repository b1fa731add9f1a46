//! Capability descriptors.
//!
//! A `PipelineCaps` names one fully specialized rendering variant. It is the key of
//! the pipeline cache, so any field that changes the synthesized program belongs here
//! and nothing else does (addresses, sizes and constants go in `DrawParams`).

use crate::psm::{ClutFormat, DepthFormat, FramebufferFormat, TextureFormat};

/// Texture coordinate wrap mode, per axis.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ClampMode {
    /// `coord & (size - 1)`; size must be a power of two.
    #[default]
    Repeat,
    /// `clamp(coord, 0, size - 1)`.
    Clamp,
    /// `clamp(coord, min, max)`.
    RegionClamp,
    /// `(coord & min) | max`, with `min` acting as a mask and `max` as a fixed offset.
    RegionRepeat,
}

impl ClampMode {
    /// Applies the mode to one integer texel coordinate.
    ///
    /// `min` and `max` are the region bounds; the plain modes ignore them.
    #[inline]
    pub fn apply(self, coord: i32, size: i32, min: i32, max: i32) -> i32 {
        match self {
            ClampMode::Repeat => coord & size.wrapping_sub(1),
            ClampMode::Clamp => coord.max(0).min(size.wrapping_sub(1)),
            ClampMode::RegionClamp => coord.max(min).min(max),
            ClampMode::RegionRepeat => (coord & min) | max,
        }
    }
}

/// How the sampled texel is combined with the interpolated vertex color.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextureFunction {
    #[default]
    Modulate,
    Decal,
    Highlight2,
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum AlphaTest {
    #[default]
    Always,
    Equal,
    GEqual,
}

impl AlphaTest {
    /// Compares an 8-bit quantized alpha against the reference value.
    #[inline]
    pub fn passes(self, alpha: u32, reference: u32) -> bool {
        match self {
            AlphaTest::Always => true,
            AlphaTest::Equal => alpha == reference,
            AlphaTest::GEqual => alpha >= reference,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum DepthTest {
    Never,
    #[default]
    Always,
    GEqual,
    Greater,
}

impl DepthTest {
    /// True when the test compares against the stored depth.
    pub const fn reads_depth(self) -> bool {
        matches!(self, DepthTest::GEqual | DepthTest::Greater)
    }

    /// Compares source against destination depth; `dst` is only consulted when
    /// `reads_depth()` holds.
    #[inline]
    pub fn passes(self, src: u32, dst: impl FnOnce() -> u32) -> bool {
        match self {
            DepthTest::Never => false,
            DepthTest::Always => true,
            DepthTest::GEqual => src >= dst(),
            DepthTest::Greater => src > dst(),
        }
    }
}

/// Color operand of the blend equation (`A`, `B` and `D`).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendInput {
    /// Source color.
    #[default]
    Cs,
    /// Destination color.
    Cd,
    Zero,
}

/// Alpha operand of the blend equation (`C`).
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum BlendFactor {
    /// Source alpha.
    #[default]
    As,
    /// Destination alpha.
    Ad,
    /// Fixed constant from `DrawParams`.
    Fix,
}

/// Capability descriptor: the immutable key of one specialized draw program.
///
/// Blending computes `(A - B) * C * 2 + D`.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct PipelineCaps {
    pub has_texture: bool,
    pub framebuffer_format: FramebufferFormat,
    pub depthbuffer_format: DepthFormat,
    pub texture_format: TextureFormat,
    pub clut_format: ClutFormat,
    pub tex_clamp_u: ClampMode,
    pub tex_clamp_v: ClampMode,
    pub texture_function: TextureFunction,
    pub alpha_test: AlphaTest,
    pub depth_test: DepthTest,
    pub write_depth: bool,
    pub has_alpha_blending: bool,
    pub blend_a: BlendInput,
    pub blend_b: BlendInput,
    pub blend_c: BlendFactor,
    pub blend_d: BlendInput,
    pub mask_color: bool,
    pub texture_black_is_transparent: bool,
    pub texture_has_alpha: bool,
}

impl PipelineCaps {
    /// True when the destination color must be read before the write.
    pub const fn reads_color(&self) -> bool {
        self.has_alpha_blending || self.mask_color
    }

    /// True when the texture is indexed and needs the CLUT bound.
    pub const fn uses_clut(&self) -> bool {
        self.has_texture && self.texture_format.is_indexed()
    }

    /// True when sampled texels carry no alpha of their own and TA0/TA1 supply it.
    pub const fn expands_texture_alpha(&self) -> bool {
        let format_lacks_alpha = match self.texture_format {
            TextureFormat::Ct24 | TextureFormat::Ct16 | TextureFormat::Ct16S => true,
            TextureFormat::Ct32 => false,
            _ => matches!(self.clut_format, ClutFormat::Ct16 | ClutFormat::Ct16S),
        };
        self.has_texture && self.texture_has_alpha && format_lacks_alpha
    }
}

/// Descriptor-set key: the subset of `PipelineCaps` that decides resource bindings.
///
/// Many pipelines share one key, so bound resource sets are reused more widely than
/// programs.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct DescriptorSetCaps {
    pub has_texture: bool,
    pub framebuffer_format: FramebufferFormat,
    pub depthbuffer_format: DepthFormat,
    pub texture_format: TextureFormat,
}

impl DescriptorSetCaps {
    pub const fn uses_clut(&self) -> bool {
        self.has_texture && self.texture_format.is_indexed()
    }
}

impl From<&PipelineCaps> for DescriptorSetCaps {
    fn from(caps: &PipelineCaps) -> Self {
        Self {
            has_texture: caps.has_texture,
            framebuffer_format: caps.framebuffer_format,
            depthbuffer_format: caps.depthbuffer_format,
            texture_format: caps.texture_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_set_key_ignores_program_only_fields() {
        let a = PipelineCaps {
            has_texture: true,
            texture_format: TextureFormat::T8,
            alpha_test: AlphaTest::Equal,
            ..Default::default()
        };
        let b = PipelineCaps {
            has_alpha_blending: true,
            blend_c: BlendFactor::Fix,
            ..a
        };
        assert_ne!(a, b);
        assert_eq!(DescriptorSetCaps::from(&a), DescriptorSetCaps::from(&b));
        assert!(DescriptorSetCaps::from(&a).uses_clut());
    }

    #[test]
    fn destination_reads_follow_modes() {
        let caps = PipelineCaps::default();
        assert!(!caps.reads_color());
        assert!(PipelineCaps { mask_color: true, ..caps }.reads_color());
        assert!(!DepthTest::Always.reads_depth());
        assert!(DepthTest::Greater.reads_depth());
    }

    #[test]
    fn alpha_expansion_only_for_formats_without_alpha() {
        let base = PipelineCaps {
            has_texture: true,
            texture_has_alpha: true,
            ..Default::default()
        };
        assert!(!base.expands_texture_alpha());
        assert!(PipelineCaps { texture_format: TextureFormat::Ct24, ..base }.expands_texture_alpha());
        let indexed = PipelineCaps { texture_format: TextureFormat::T8, ..base };
        assert!(PipelineCaps { clut_format: ClutFormat::Ct16, ..indexed }.expands_texture_alpha());
        assert!(!indexed.expands_texture_alpha());
        assert!(!PipelineCaps { texture_has_alpha: false, ..indexed }.expands_texture_alpha());
    }

    #[test]
    fn clamp_laws_hold() {
        for size in [1, 2, 8, 64, 1024] {
            for coord in -2100..2100 {
                let repeat = ClampMode::Repeat.apply(coord, size, 0, 0);
                assert!((0..size).contains(&repeat), "repeat {coord} {size}");
                let clamp = ClampMode::Clamp.apply(coord, size, 0, 0);
                assert!((0..size).contains(&clamp), "clamp {coord} {size}");
            }
        }
        for coord in -300..300 {
            let region = ClampMode::RegionClamp.apply(coord, 256, 16, 47);
            assert!((16..=47).contains(&region));
        }
        // Inverted bounds resolve to `max` instead of panicking.
        assert_eq!(ClampMode::RegionClamp.apply(5, 256, 40, 10), 10);
        assert_eq!(ClampMode::RegionRepeat.apply(0x1234, 256, 0x0F, 0x30), 0x34);
    }

    #[test]
    fn alpha_test_exhaustive() {
        for reference in 0..=255u32 {
            for alpha in 0..=255u32 {
                assert!(AlphaTest::Always.passes(alpha, reference));
                assert_eq!(AlphaTest::Equal.passes(alpha, reference), alpha == reference);
                assert_eq!(AlphaTest::GEqual.passes(alpha, reference), alpha >= reference);
            }
        }
    }

    #[test]
    fn depth_test_reads_only_when_comparing() {
        let untouched = || -> u32 { panic!("destination read") };
        assert!(DepthTest::Always.passes(0, untouched));
        assert!(!DepthTest::Never.passes(u32::MAX, untouched));
        assert!(DepthTest::GEqual.passes(7, || 7));
        assert!(!DepthTest::Greater.passes(7, || 7));
    }
}
