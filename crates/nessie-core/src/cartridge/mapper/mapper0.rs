//! Mapper 0 (NROM): no bank switching.
//!
//! 16 KiB boards mirror their single PRG bank into both halves of
//! `$8000-$FFFF`; 32 KiB boards map it linearly. CHR is one fixed 8 KiB bank.

use crate::{
    cartridge::{CartridgeMemory, memory_map::MemoryMap},
    memory::cpu as cpu_mem,
};

const PRG_WINDOW: usize = 16 * 1024;
const CHR_WINDOW: usize = 8 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper0 {
    prg_map: MemoryMap,
    chr_map: MemoryMap,
}

impl Mapper0 {
    pub fn new(memory: &CartridgeMemory) -> Self {
        let mut prg_map = MemoryMap::new(cpu_mem::PRG_ROM_START, PRG_WINDOW, 2, memory.prg_rom.len());
        let high = prg_map.last_bank().min(1);
        prg_map.remap(&[0, high]);

        let chr_map = MemoryMap::new(0x0000, CHR_WINDOW, 1, memory.chr.len());
        Self { prg_map, chr_map }
    }

    pub fn cpu_read(&self, memory: &CartridgeMemory, addr: u16) -> Option<u8> {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => memory.read_prg_ram(addr),
            cpu_mem::PRG_ROM_START..=0xFFFF => self
                .prg_map
                .translate(addr)
                .and_then(|offset| memory.prg_rom.get(offset).copied()),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, memory: &mut CartridgeMemory, addr: u16, data: u8) -> bool {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => memory.write_prg_ram(addr, data),
            _ => false,
        }
    }

    pub fn prg_map(&self) -> &MemoryMap {
        &self.prg_map
    }

    pub fn chr_map(&self) -> &MemoryMap {
        &self.chr_map
    }
}
