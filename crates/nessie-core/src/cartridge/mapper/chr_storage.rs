//! PPU-side pattern memory.
//!
//! Boards carry either CHR ROM from the image or writable CHR RAM. Mappers
//! resolve a PPU address to an offset through their CHR bank view and then go
//! through this type, so ROM stays read-only without each mapper checking.

use crate::cartridge::header::{CHR_BANK_SIZE, Header};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChrStorage {
    /// Read-only tiles from the cartridge image.
    Rom(Box<[u8]>),
    /// Writable RAM on the cartridge.
    Ram(Box<[u8]>),
}

impl ChrStorage {
    /// Picks ROM when the image carries CHR data, RAM otherwise.
    pub fn select(header: &Header, chr_rom: Box<[u8]>) -> Self {
        if header.chr_rom_size > 0 {
            Self::Rom(chr_rom)
        } else {
            let size = header.chr_ram_size.max(CHR_BANK_SIZE);
            Self::Ram(vec![0; size].into_boxed_slice())
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_ram(&self) -> bool {
        matches!(self, Self::Ram(_))
    }

    pub fn read(&self, offset: usize) -> Option<u8> {
        self.as_slice().get(offset).copied()
    }

    /// Stores `data` when backed by RAM. Returns whether the write landed.
    pub fn write(&mut self, offset: usize, data: u8) -> bool {
        match self {
            Self::Ram(ram) => match ram.get_mut(offset) {
                Some(slot) => {
                    *slot = data;
                    true
                }
                None => false,
            },
            Self::Rom(_) => false,
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Self::Rom(bytes) | Self::Ram(bytes) => bytes,
        }
    }
}
