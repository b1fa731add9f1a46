/// Size of one GS memory page, in bytes.
pub const PAGE_SIZE: u32 = 8192;

/// Page geometry of a storage layout.
///
/// Every page holds `PAGE_SIZE` bytes; the pixel dimensions depend on pixel width.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Storage {
    Ct32,
    Z32,
    Ct16,
    T8,
    T4,
}

impl Storage {
    /// Page width in pixels.
    pub const fn page_width(self) -> u32 {
        match self {
            Storage::Ct32 | Storage::Z32 | Storage::Ct16 => 64,
            Storage::T8 | Storage::T4 => 128,
        }
    }

    /// Page height in pixels.
    pub const fn page_height(self) -> u32 {
        match self {
            Storage::Ct32 | Storage::Z32 => 32,
            Storage::Ct16 | Storage::T8 => 64,
            Storage::T4 => 128,
        }
    }

    /// Bits per stored pixel.
    pub const fn bits_per_pixel(self) -> u32 {
        match self {
            Storage::Ct32 | Storage::Z32 => 32,
            Storage::Ct16 => 16,
            Storage::T8 => 8,
            Storage::T4 => 4,
        }
    }

    /// Addressable units per byte: 4-bit storage is addressed in nibbles.
    pub const fn units_per_byte(self) -> u32 {
        match self {
            Storage::T4 => 2,
            _ => 1,
        }
    }

    /// Size of one pixel in address units.
    pub const fn pixel_units(self) -> u32 {
        match self {
            Storage::Ct32 | Storage::Z32 => 4,
            Storage::Ct16 => 2,
            Storage::T8 | Storage::T4 => 1,
        }
    }
}
