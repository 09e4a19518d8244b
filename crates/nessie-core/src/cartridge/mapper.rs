//! Cartridge mappers.
//!
//! The supported boards form a closed set, so [`Mapper`] is a plain enum and
//! every call is a `match`. Each variant owns only its bank-switching state
//! and its two bank views; ROM and RAM live in [`CartridgeMemory`] and are
//! lent to the mapper on every access.

pub mod chr_storage;
pub mod mapper0;
pub mod mapper1;
pub mod mapper4;

use crate::{
    cartridge::{
        CartridgeMemory,
        header::{Header, Mirroring},
        memory_map::{BankSpace, MemoryMap},
    },
    error::Error,
};

pub use mapper0::Mapper0;
pub use mapper1::Mapper1;
pub use mapper4::Mapper4;

/// Bank-switching state machine of the inserted board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mapper {
    /// Mapper 0.
    Nrom(Mapper0),
    /// Mapper 1 (MMC1).
    Sxrom(Mapper1),
    /// Mapper 4 (MMC3).
    Txrom(Mapper4),
}

macro_rules! dispatch {
    ($mapper:expr, $inner:ident => $body:expr) => {
        match $mapper {
            Mapper::Nrom($inner) => $body,
            Mapper::Sxrom($inner) => $body,
            Mapper::Txrom($inner) => $body,
        }
    };
}

impl Mapper {
    /// Builds the mapper named by the header.
    pub fn from_header(header: &Header, memory: &CartridgeMemory) -> Result<Self, Error> {
        match header.mapper {
            0 => Ok(Self::Nrom(Mapper0::new(memory))),
            1 => Ok(Self::Sxrom(Mapper1::new(memory))),
            4 => Ok(Self::Txrom(Mapper4::new(header, memory))),
            other => Err(Error::UnsupportedMapper(other)),
        }
    }

    /// iNES mapper number.
    pub fn id(&self) -> u16 {
        match self {
            Self::Nrom(_) => 0,
            Self::Sxrom(_) => 1,
            Self::Txrom(_) => 4,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Nrom(_) => "NROM",
            Self::Sxrom(_) => "SxROM",
            Self::Txrom(_) => "TxROM",
        }
    }

    /// Restores power-on register state.
    pub fn reset(&mut self, memory: &CartridgeMemory) {
        match self {
            Self::Nrom(m) => *m = Mapper0::new(memory),
            Self::Sxrom(m) => m.reset(),
            Self::Txrom(m) => m.reset(),
        }
    }

    /// CPU read in `$4020-$FFFF`. `None` leaves the bus floating.
    pub fn on_cpu_read(&self, memory: &CartridgeMemory, addr: u16) -> Option<u8> {
        dispatch!(self, m => m.cpu_read(memory, addr))
    }

    /// CPU write in `$4020-$FFFF`. Returns whether the board claimed it.
    ///
    /// `cpu_cycle` lets serial mappers ignore the second write of a
    /// read-modify-write instruction.
    pub fn on_cpu_write(
        &mut self,
        memory: &mut CartridgeMemory,
        addr: u16,
        data: u8,
        cpu_cycle: u64,
    ) -> bool {
        match self {
            Self::Nrom(m) => m.cpu_write(memory, addr, data),
            Self::Sxrom(m) => m.cpu_write(memory, addr, data, cpu_cycle),
            Self::Txrom(m) => m.cpu_write(memory, addr, data),
        }
    }

    /// PPU pattern-table read in `$0000-$1FFF`.
    pub fn on_ppu_read(&self, memory: &CartridgeMemory, addr: u16) -> Option<u8> {
        dispatch!(self, m => m.chr_map().translate(addr).and_then(|offset| memory.chr.read(offset)))
    }

    /// PPU pattern-table write. Only lands on CHR RAM.
    pub fn on_ppu_write(&mut self, memory: &mut CartridgeMemory, addr: u16, data: u8) -> bool {
        dispatch!(self, m => match m.chr_map().translate(addr) {
            Some(offset) => memory.chr.write(offset, data),
            None => false,
        })
    }

    /// Lets boards that watch the PPU address bus see a rendering fetch.
    pub fn on_ppu_fetch(&mut self, addr: u16, ppu_cycle: u64) {
        if let Self::Txrom(m) = self {
            m.observe_ppu_fetch(addr, ppu_cycle);
        }
    }

    /// Current bank view of `space`.
    pub fn bank_view(&self, space: BankSpace) -> &MemoryMap {
        match space {
            BankSpace::Prg => dispatch!(self, m => m.prg_map()),
            BankSpace::Chr => dispatch!(self, m => m.chr_map()),
        }
    }

    /// Runtime mirroring override. `None` keeps the header's wiring.
    pub fn mirroring(&self) -> Option<Mirroring> {
        match self {
            Self::Nrom(_) => None,
            Self::Sxrom(m) => Some(m.mirroring()),
            Self::Txrom(m) => m.mirroring(),
        }
    }

    /// Level of the board's IRQ line.
    pub fn irq_pending(&self) -> bool {
        match self {
            Self::Txrom(m) => m.irq_pending(),
            _ => false,
        }
    }
}
