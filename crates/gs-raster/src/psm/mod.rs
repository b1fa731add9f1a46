//! GS pixel storage formats.
//!
//! `Psm` is the full register-level universe. The role enums (`FramebufferFormat`,
//! `DepthFormat`, `TextureFormat`, `ClutFormat`) are the subsets each role accepts, so
//! every `match` over a role is exhaustive and an unsupported combination cannot be
//! expressed.

mod color;
mod storage;

use std::fmt;

pub use color::{color_to_psm16, color_to_psm32, psm16_to_color, psm32_to_color, quantize_alpha};
pub use storage::{Storage, PAGE_SIZE};

/// GS pixel storage mode, with its register encoding as discriminant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(u32)]
pub enum Psm {
    Ct32 = 0x00,
    Ct24 = 0x01,
    Ct16 = 0x02,
    Ct16S = 0x0A,
    T8 = 0x13,
    T4 = 0x14,
    T8H = 0x1B,
    T4HL = 0x24,
    T4HH = 0x2C,
    Z32 = 0x30,
    Z24 = 0x31,
    Z16 = 0x32,
    Z16S = 0x3A,
}

impl Psm {
    pub const ALL: [Psm; 13] = [
        Psm::Ct32,
        Psm::Ct24,
        Psm::Ct16,
        Psm::Ct16S,
        Psm::T8,
        Psm::T4,
        Psm::T8H,
        Psm::T4HL,
        Psm::T4HH,
        Psm::Z32,
        Psm::Z24,
        Psm::Z16,
        Psm::Z16S,
    ];

    /// Page layout used to address pixels of this format.
    ///
    /// The 8H/4HL/4HH formats live in the upper bits of 32-bit pixels and therefore
    /// share the 32-bit layout.
    pub const fn storage(self) -> Storage {
        match self {
            Psm::Ct32 | Psm::Ct24 | Psm::T8H | Psm::T4HL | Psm::T4HH => Storage::Ct32,
            Psm::Z32 | Psm::Z24 => Storage::Z32,
            Psm::Ct16 | Psm::Ct16S | Psm::Z16 | Psm::Z16S => Storage::Ct16,
            Psm::T8 => Storage::T8,
            Psm::T4 => Storage::T4,
        }
    }
}

/// Register value that does not name a known storage mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UnknownPsm(pub u32);

impl fmt::Display for UnknownPsm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown pixel storage mode 0x{:02X}", self.0)
    }
}

impl std::error::Error for UnknownPsm {}

impl TryFrom<u32> for Psm {
    type Error = UnknownPsm;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Psm::ALL
            .iter()
            .copied()
            .find(|psm| *psm as u32 == value)
            .ok_or(UnknownPsm(value))
    }
}

/// Formats a frame buffer may be stored in.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum FramebufferFormat {
    #[default]
    Ct32,
    Ct24,
    Ct16,
    Ct16S,
}

/// Formats a depth buffer may be stored in.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum DepthFormat {
    #[default]
    Z32,
    Z24,
    Z16,
    Z16S,
}

impl DepthFormat {
    /// Number of significant depth bits.
    pub const fn bits(self) -> u32 {
        match self {
            DepthFormat::Z32 => 32,
            DepthFormat::Z24 => 24,
            DepthFormat::Z16 | DepthFormat::Z16S => 16,
        }
    }

    /// Mask applied to depth values before comparison and storage.
    pub const fn mask(self) -> u32 {
        u32::MAX >> (32 - self.bits())
    }
}

/// Formats a texture may be sampled from.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    #[default]
    Ct32,
    Ct24,
    Ct16,
    Ct16S,
    T8,
    T4,
    T8H,
    T4HL,
    T4HH,
}

impl TextureFormat {
    pub const ALL: [TextureFormat; 9] = [
        TextureFormat::Ct32,
        TextureFormat::Ct24,
        TextureFormat::Ct16,
        TextureFormat::Ct16S,
        TextureFormat::T8,
        TextureFormat::T4,
        TextureFormat::T8H,
        TextureFormat::T4HL,
        TextureFormat::T4HH,
    ];

    /// True for formats whose texels index the CLUT.
    pub const fn is_indexed(self) -> bool {
        matches!(
            self,
            TextureFormat::T8
                | TextureFormat::T4
                | TextureFormat::T8H
                | TextureFormat::T4HL
                | TextureFormat::T4HH
        )
    }

    /// True for 8-bit indices, which ignore the CLUT entry offset.
    pub const fn is_idx8(self) -> bool {
        matches!(self, TextureFormat::T8 | TextureFormat::T8H)
    }
}

/// Formats the CLUT may hold palette entries in.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Hash)]
pub enum ClutFormat {
    #[default]
    Ct32,
    Ct16,
    Ct16S,
}

impl From<FramebufferFormat> for Psm {
    fn from(format: FramebufferFormat) -> Self {
        match format {
            FramebufferFormat::Ct32 => Psm::Ct32,
            FramebufferFormat::Ct24 => Psm::Ct24,
            FramebufferFormat::Ct16 => Psm::Ct16,
            FramebufferFormat::Ct16S => Psm::Ct16S,
        }
    }
}

impl From<DepthFormat> for Psm {
    fn from(format: DepthFormat) -> Self {
        match format {
            DepthFormat::Z32 => Psm::Z32,
            DepthFormat::Z24 => Psm::Z24,
            DepthFormat::Z16 => Psm::Z16,
            DepthFormat::Z16S => Psm::Z16S,
        }
    }
}

impl From<TextureFormat> for Psm {
    fn from(format: TextureFormat) -> Self {
        match format {
            TextureFormat::Ct32 => Psm::Ct32,
            TextureFormat::Ct24 => Psm::Ct24,
            TextureFormat::Ct16 => Psm::Ct16,
            TextureFormat::Ct16S => Psm::Ct16S,
            TextureFormat::T8 => Psm::T8,
            TextureFormat::T4 => Psm::T4,
            TextureFormat::T8H => Psm::T8H,
            TextureFormat::T4HL => Psm::T4HL,
            TextureFormat::T4HH => Psm::T4HH,
        }
    }
}

impl From<ClutFormat> for Psm {
    fn from(format: ClutFormat) -> Self {
        match format {
            ClutFormat::Ct32 => Psm::Ct32,
            ClutFormat::Ct16 => Psm::Ct16,
            ClutFormat::Ct16S => Psm::Ct16S,
        }
    }
}

macro_rules! role_try_from_psm {
    ($role:ident { $($variant:ident),+ $(,)? }) => {
        impl TryFrom<Psm> for $role {
            type Error = UnknownPsm;

            fn try_from(psm: Psm) -> Result<Self, Self::Error> {
                match psm {
                    $(Psm::$variant => Ok($role::$variant),)+
                    other => Err(UnknownPsm(other as u32)),
                }
            }
        }
    };
}

role_try_from_psm!(FramebufferFormat { Ct32, Ct24, Ct16, Ct16S });
role_try_from_psm!(DepthFormat { Z32, Z24, Z16, Z16S });
role_try_from_psm!(TextureFormat { Ct32, Ct24, Ct16, Ct16S, T8, T4, T8H, T4HL, T4HH });
role_try_from_psm!(ClutFormat { Ct32, Ct16, Ct16S });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_codes_round_trip() {
        for psm in Psm::ALL {
            assert_eq!(Psm::try_from(psm as u32), Ok(psm));
        }
        assert_eq!(Psm::try_from(0x03), Err(UnknownPsm(0x03)));
    }

    #[test]
    fn roles_reject_foreign_formats() {
        assert_eq!(DepthFormat::try_from(Psm::Z24), Ok(DepthFormat::Z24));
        assert!(DepthFormat::try_from(Psm::Ct32).is_err());
        assert!(ClutFormat::try_from(Psm::Ct24).is_err());
        assert_eq!(TextureFormat::try_from(Psm::T4HH), Ok(TextureFormat::T4HH));
    }

    #[test]
    fn indexed_predicates() {
        let indexed: Vec<_> = TextureFormat::ALL.into_iter().filter(|f| f.is_indexed()).collect();
        assert_eq!(indexed.len(), 5);
        assert!(TextureFormat::T8H.is_idx8());
        assert!(!TextureFormat::T4HL.is_idx8());
        assert!(!TextureFormat::Ct16.is_indexed());
    }

    #[test]
    fn high_bit_formats_use_32_bit_pages() {
        assert_eq!(Psm::T8H.storage(), Storage::Ct32);
        assert_eq!(Psm::T4HH.storage(), Storage::Ct32);
        assert_eq!(Psm::Z16S.storage(), Storage::Ct16);
    }

    #[test]
    fn depth_masks_follow_bit_width() {
        assert_eq!(DepthFormat::Z32.mask(), 0xFFFF_FFFF);
        assert_eq!(DepthFormat::Z24.mask(), 0x00FF_FFFF);
        assert_eq!(DepthFormat::Z16S.bits(), 16);
        assert_eq!(DepthFormat::Z16S.mask(), 0x0000_FFFF);
    }
}
