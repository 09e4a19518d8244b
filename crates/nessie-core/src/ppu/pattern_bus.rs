use crate::cartridge::{Cartridge, header::Mirroring};

/// Nametable layout used while no cartridge is inserted.
const UNPLUGGED_MIRRORING: Mirroring = Mirroring::Vertical;

/// Temporary view that lets the PPU reach the cartridge CHR space without
/// storing a reference to the cartridge.
///
/// The owner creates one of these per PPU call, so lifetimes stay explicit
/// and borrow-checked. An empty slot reads as zero and drops writes.
#[derive(Debug, Default)]
pub struct PatternBus<'a> {
    cartridge: Option<&'a mut Cartridge>,
}

impl<'a> PatternBus<'a> {
    pub fn new(cartridge: Option<&'a mut Cartridge>) -> Self {
        Self { cartridge }
    }

    /// CPU-initiated pattern read (PPUDATA).
    pub fn read(&mut self, addr: u16) -> u8 {
        self.cartridge
            .as_deref()
            .and_then(|cart| cart.ppu_read(addr))
            .unwrap_or(0)
    }

    /// CPU-initiated pattern write. Only CHR RAM accepts it.
    pub fn write(&mut self, addr: u16, data: u8) {
        if let Some(cart) = self.cartridge.as_deref_mut() {
            cart.ppu_write(addr, data);
        }
    }

    /// Rendering fetch. The mapper sees the address so it can watch A12.
    pub fn fetch(&mut self, addr: u16, ppu_cycle: u64) -> u8 {
        self.cartridge
            .as_deref_mut()
            .and_then(|cart| cart.ppu_fetch(addr, ppu_cycle))
            .unwrap_or(0)
    }

    pub fn mirroring(&self) -> Mirroring {
        self.cartridge
            .as_deref()
            .map_or(UNPLUGGED_MIRRORING, Cartridge::mirroring)
    }
}

/// Read-only CHR access for the debug renderers.
pub(crate) fn peek_pattern(cartridge: Option<&Cartridge>, addr: u16) -> u8 {
    cartridge.and_then(|cart| cart.ppu_read(addr)).unwrap_or(0)
}

pub(crate) fn peek_mirroring(cartridge: Option<&Cartridge>) -> Mirroring {
    cartridge.map_or(UNPLUGGED_MIRRORING, Cartridge::mirroring)
}
