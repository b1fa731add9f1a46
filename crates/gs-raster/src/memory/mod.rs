//! Flat GS local memory and its address views.
//!
//! Frame buffer, depth buffer, textures and the CLUT source all live in one 4 MiB
//! buffer and commonly alias. `GsMemory` is the CPU-side copy; the wgpu backend keeps
//! the same layout in a storage buffer.

mod swizzle;

pub use swizzle::{pixel_address, SwizzleSet, SwizzleTable};

/// Size of GS local memory, in bytes.
pub const GS_RAM_SIZE: u32 = 4 * 1024 * 1024;

const WORD_COUNT: usize = (GS_RAM_SIZE / 4) as usize;
const BYTE_MASK: u32 = GS_RAM_SIZE - 1;
const NIBBLE_MASK: u32 = GS_RAM_SIZE * 2 - 1;

/// GS local memory as little-endian 32-bit words.
#[derive(Clone)]
pub struct GsMemory {
    words: Box<[u32]>,
}

impl Default for GsMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for GsMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GsMemory").field("size", &GS_RAM_SIZE).finish()
    }
}

impl GsMemory {
    pub fn new() -> Self {
        Self {
            words: vec![0u32; WORD_COUNT].into_boxed_slice(),
        }
    }

    /// Raw words, in the layout uploaded to the GPU.
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn words_mut(&mut self) -> &mut [u32] {
        &mut self.words
    }

    #[inline]
    fn word(&self, address: u32) -> u32 {
        self.words[((address & BYTE_MASK) >> 2) as usize]
    }

    #[inline]
    fn merge(&mut self, address: u32, mask: u32, value: u32) {
        let word = &mut self.words[((address & BYTE_MASK) >> 2) as usize];
        *word = (*word & !mask) | (value & mask);
    }

    pub fn read32(&self, address: u32) -> u32 {
        self.word(address)
    }

    pub fn read24(&self, address: u32) -> u32 {
        self.word(address) & 0x00FF_FFFF
    }

    pub fn read16(&self, address: u32) -> u32 {
        let shift = (address & 2) * 8;
        (self.word(address) >> shift) & 0xFFFF
    }

    pub fn read8(&self, address: u32) -> u32 {
        let shift = (address & 3) * 8;
        (self.word(address) >> shift) & 0xFF
    }

    /// Reads a 4-bit value; `nibble_address` counts nibbles, not bytes.
    pub fn read4(&self, nibble_address: u32) -> u32 {
        let nibble_address = nibble_address & NIBBLE_MASK;
        let shift = (nibble_address & 7) * 4;
        (self.words[(nibble_address >> 3) as usize] >> shift) & 0xF
    }

    pub fn write32(&mut self, address: u32, value: u32) {
        self.merge(address, 0xFFFF_FFFF, value);
    }

    /// Writes the low 24 bits; the top byte of the word is preserved.
    pub fn write24(&mut self, address: u32, value: u32) {
        self.merge(address, 0x00FF_FFFF, value);
    }

    pub fn write16(&mut self, address: u32, value: u32) {
        let shift = (address & 2) * 8;
        self.merge(address, 0xFFFF << shift, value << shift);
    }

    pub fn write8(&mut self, address: u32, value: u32) {
        let shift = (address & 3) * 8;
        self.merge(address, 0xFF << shift, value << shift);
    }

    pub fn write4(&mut self, nibble_address: u32, value: u32) {
        let nibble_address = nibble_address & NIBBLE_MASK;
        let shift = (nibble_address & 7) * 4;
        self.merge(nibble_address >> 1, 0xF << shift, value << shift);
    }
}
