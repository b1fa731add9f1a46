use crate::psm::{Psm, Storage, PAGE_SIZE};

use super::GS_RAM_SIZE;

/// Page-local offset table for one pixel format.
///
/// Maps an in-page pixel position to its offset from the page start, in the storage's
/// address units (bytes, or nibbles for 4-bit storage). The owner of GS memory builds
/// these from the hardware block/column layouts; the GPU receives them as R32Uint
/// images of `page_width x page_height` texels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwizzleTable {
    storage: Storage,
    offsets: Vec<u32>,
}

impl SwizzleTable {
    /// Builds a table by evaluating `offset(x, y)` for every in-page position.
    pub fn from_fn(storage: Storage, mut offset: impl FnMut(u32, u32) -> u32) -> Self {
        let (width, height) = (storage.page_width(), storage.page_height());
        let mut offsets = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                offsets.push(offset(x, y));
            }
        }
        Self { storage, offsets }
    }

    /// Table that stores pages as plain row-major pixel arrays.
    pub fn row_major(storage: Storage) -> Self {
        let width = storage.page_width();
        let units = storage.pixel_units();
        Self::from_fn(storage, |x, y| (y * width + x) * units)
    }

    pub fn storage(&self) -> Storage {
        self.storage
    }

    /// Offsets in row-major texel order, as uploaded to the lookup image.
    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> u32 {
        self.offsets[(y * self.storage.page_width() + x) as usize]
    }
}

/// One lookup table per pixel format.
#[derive(Debug, Clone)]
pub struct SwizzleSet {
    tables: Vec<SwizzleTable>,
}

impl SwizzleSet {
    pub fn from_fn(mut table: impl FnMut(Psm) -> SwizzleTable) -> Self {
        let tables = Psm::ALL
            .iter()
            .map(|&psm| {
                let built = table(psm);
                assert_eq!(
                    built.storage(),
                    psm.storage(),
                    "swizzle table for {psm:?} has the wrong page layout"
                );
                built
            })
            .collect();
        Self { tables }
    }

    /// Row-major tables for every format.
    pub fn row_major() -> Self {
        Self::from_fn(|psm| SwizzleTable::row_major(psm.storage()))
    }

    pub fn get(&self, psm: impl Into<Psm>) -> &SwizzleTable {
        &self.tables[slot(psm.into())]
    }
}

const fn slot(psm: Psm) -> usize {
    match psm {
        Psm::Ct32 => 0,
        Psm::Ct24 => 1,
        Psm::Ct16 => 2,
        Psm::Ct16S => 3,
        Psm::T8 => 4,
        Psm::T4 => 5,
        Psm::T8H => 6,
        Psm::T4HL => 7,
        Psm::T4HH => 8,
        Psm::Z32 => 9,
        Psm::Z24 => 10,
        Psm::Z16 => 11,
        Psm::Z16S => 12,
    }
}

/// Computes the memory address of pixel `(x, y)` in a buffer.
///
/// `base` is a byte address and `buf_width` a width in pixels. The result is in the
/// table's address units and wraps at the end of GS memory. Negative coordinates wrap
/// into the previous page, matching the shader's arithmetic.
pub fn pixel_address(table: &SwizzleTable, base: u32, buf_width: u32, x: i32, y: i32) -> u32 {
    let storage = table.storage();
    let (page_width, page_height) = (storage.page_width(), storage.page_height());

    let page_x = x >> page_width.trailing_zeros();
    let page_y = y >> page_height.trailing_zeros();
    let in_x = (x as u32) & (page_width - 1);
    let in_y = (y as u32) & (page_height - 1);

    let pages_per_row = (buf_width / page_width) as i32;
    let page_index = page_x.wrapping_add(page_y.wrapping_mul(pages_per_row)) as u32;

    let units = storage.units_per_byte();
    let address = base
        .wrapping_mul(units)
        .wrapping_add(page_index.wrapping_mul(PAGE_SIZE * units))
        .wrapping_add(table.offset(in_x, in_y));
    address & (GS_RAM_SIZE * units - 1)
}
