use core::ops::{Deref, DerefMut};

/// Fixed-size memory block that derefs to a slice.
///
/// Every RAM in the console (CPU work RAM, nametables, palette, OAM) is one of
/// these, so indexing and `fill` behave the same everywhere.
#[repr(transparent)]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemBlock<T, const N: usize>([T; N]);

pub mod cpu {
    use crate::memory::cpu as cpu_mem;

    pub type Ram = super::MemBlock<u8, { cpu_mem::INTERNAL_RAM_SIZE }>;
}

pub mod ppu {
    use crate::memory::ppu as ppu_mem;

    /// Internal nametable RAM.
    pub type Ciram = super::MemBlock<u8, { ppu_mem::CIRAM_SIZE }>;
    pub type PaletteRam = super::MemBlock<u8, { ppu_mem::PALETTE_RAM_SIZE }>;
    pub type OamRam = super::MemBlock<u8, { ppu_mem::OAM_RAM_SIZE }>;
}

impl<T: Copy + Default, const N: usize> MemBlock<T, N> {
    pub fn new() -> Self {
        Self([T::default(); N])
    }
}

impl<T: Copy, const N: usize> MemBlock<T, N> {
    /// Create a block where every element is initialized to `value`.
    #[inline]
    pub fn filled(value: T) -> Self {
        Self([value; N])
    }
}

impl<T: Copy + Default, const N: usize> Default for MemBlock<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> Deref for MemBlock<T, N> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T, const N: usize> DerefMut for MemBlock<T, N> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}
