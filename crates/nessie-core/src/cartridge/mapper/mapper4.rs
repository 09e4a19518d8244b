//! Mapper 4 (TxROM / MMC3).
//!
//! | Area | Address range   | Behaviour                                          |
//! |------|-----------------|----------------------------------------------------|
//! | CPU  | `$6000-$7FFF`   | PRG RAM with enable / write-protect bits           |
//! | CPU  | `$8000-$9FFF`   | bank select (even) / bank data (odd)               |
//! | CPU  | `$A000-$BFFF`   | mirroring (even) / PRG RAM protect (odd)           |
//! | CPU  | `$C000-$DFFF`   | IRQ latch (even) / IRQ reload (odd)                |
//! | CPU  | `$E000-$FFFF`   | IRQ disable + acknowledge (even) / IRQ enable (odd) |
//! | PPU  | `$0000-$1FFF`   | 2x2 KiB + 4x1 KiB CHR windows, A12 inversion       |
//!
//! PRG is four 8 KiB windows: two switchable (R6, R7) and two fixed to the
//! last banks, with bank-select bit 6 swapping which of `$8000`/`$C000` is
//! switchable. The scanline counter is clocked by rising edges of PPU A12
//! seen on pattern fetches.

use tracing::debug;

use crate::{
    cartridge::{
        CartridgeMemory,
        header::{Header, Mirroring},
        memory_map::MemoryMap,
    },
    memory::cpu as cpu_mem,
    register::{Field, Register},
};

const PRG_WINDOW: usize = 8 * 1024;
const CHR_WINDOW: usize = 1024;

const BANK_TARGET: Field = Field::new(0, 3);
const PRG_SWAP: Field = Field::bit(6);
const CHR_INVERT: Field = Field::bit(7);

/// A12 must stay low for this many PPU cycles before a rise counts.
const A12_LOW_FILTER: u64 = 8;

/// CPU-visible MMC3 registers, decoded from address range and parity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mmc3Register {
    BankSelect,
    BankData,
    Mirroring,
    PrgRamProtect,
    IrqLatch,
    IrqReload,
    IrqDisable,
    IrqEnable,
}

impl Mmc3Register {
    fn from_addr(addr: u16) -> Option<Self> {
        let even = addr & 1 == 0;
        let register = match (addr, even) {
            (0x8000..=0x9FFF, true) => Self::BankSelect,
            (0x8000..=0x9FFF, false) => Self::BankData,
            (0xA000..=0xBFFF, true) => Self::Mirroring,
            (0xA000..=0xBFFF, false) => Self::PrgRamProtect,
            (0xC000..=0xDFFF, true) => Self::IrqLatch,
            (0xC000..=0xDFFF, false) => Self::IrqReload,
            (0xE000..=0xFFFF, true) => Self::IrqDisable,
            (0xE000..=0xFFFF, false) => Self::IrqEnable,
            _ => return None,
        };
        Some(register)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper4 {
    prg_map: MemoryMap,
    chr_map: MemoryMap,

    bank_select: Register<u8>,
    /// R0-R7 bank data registers.
    bank_regs: [u8; 8],
    /// `None` on four-screen boards, where `$A000` has no effect.
    mirroring: Option<Mirroring>,
    prg_ram_enable: bool,
    prg_ram_write_protect: bool,

    irq_latch: u8,
    irq_counter: u8,
    irq_reload: bool,
    irq_enabled: bool,
    irq_pending: bool,

    last_a12_high: bool,
    /// PPU cycle of the last fetch that drove A12 low.
    a12_low_since: u64,
}

impl Mapper4 {
    pub fn new(header: &Header, memory: &CartridgeMemory) -> Self {
        let mirroring = match header.mirroring {
            Mirroring::FourScreen => None,
            other => Some(other),
        };
        let mut mapper = Self {
            prg_map: MemoryMap::new(cpu_mem::PRG_ROM_START, PRG_WINDOW, 4, memory.prg_rom.len()),
            chr_map: MemoryMap::new(0x0000, CHR_WINDOW, 8, memory.chr.len()),
            bank_select: Register::default(),
            bank_regs: [0; 8],
            mirroring,
            prg_ram_enable: true,
            prg_ram_write_protect: false,
            irq_latch: 0,
            irq_counter: 0,
            irq_reload: false,
            irq_enabled: false,
            irq_pending: false,
            last_a12_high: false,
            a12_low_since: 0,
        };
        mapper.reset();
        mapper
    }

    pub fn reset(&mut self) {
        self.bank_select.set(0);
        self.bank_regs = [0, 2, 4, 5, 6, 7, 0, 1];
        self.prg_ram_enable = true;
        self.prg_ram_write_protect = false;
        self.irq_latch = 0;
        self.irq_counter = 0;
        self.irq_reload = false;
        self.irq_enabled = false;
        self.irq_pending = false;
        self.last_a12_high = false;
        self.a12_low_since = 0;
        self.update_banks();
    }

    pub fn cpu_read(&self, memory: &CartridgeMemory, addr: u16) -> Option<u8> {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => {
                if self.prg_ram_enable {
                    memory.read_prg_ram(addr)
                } else {
                    None
                }
            }
            cpu_mem::PRG_ROM_START..=0xFFFF => self
                .prg_map
                .translate(addr)
                .and_then(|offset| memory.prg_rom.get(offset).copied()),
            _ => None,
        }
    }

    pub fn cpu_write(&mut self, memory: &mut CartridgeMemory, addr: u16, data: u8) -> bool {
        if (cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END).contains(&addr) {
            return self.prg_ram_enable
                && !self.prg_ram_write_protect
                && memory.write_prg_ram(addr, data);
        }

        let Some(register) = Mmc3Register::from_addr(addr) else {
            return false;
        };

        match register {
            Mmc3Register::BankSelect => {
                self.bank_select.set(data);
                self.update_banks();
            }
            Mmc3Register::BankData => {
                let target = self.bank_select.field(BANK_TARGET) as usize;
                self.bank_regs[target] = data;
                self.update_banks();
            }
            Mmc3Register::Mirroring => {
                if self.mirroring.is_some() {
                    self.mirroring = Some(if data & 1 == 0 {
                        Mirroring::Vertical
                    } else {
                        Mirroring::Horizontal
                    });
                }
            }
            Mmc3Register::PrgRamProtect => {
                self.prg_ram_enable = data & 0x80 != 0;
                self.prg_ram_write_protect = data & 0x40 != 0;
            }
            Mmc3Register::IrqLatch => self.irq_latch = data,
            Mmc3Register::IrqReload => {
                self.irq_counter = 0;
                self.irq_reload = true;
            }
            Mmc3Register::IrqDisable => {
                self.irq_enabled = false;
                self.irq_pending = false;
            }
            Mmc3Register::IrqEnable => self.irq_enabled = true,
        }
        debug!("MMC3 {register:?} ${addr:04X} <- {data:#04X}");
        true
    }

    fn update_banks(&mut self) {
        let r = |index: usize| self.bank_regs[index] as usize;

        let second_last = self.prg_map.bank_count().saturating_sub(2);
        let last = self.prg_map.last_bank();
        let (r6, r7) = (r(6) & 0x3F, r(7) & 0x3F);
        let prg = if self.bank_select.flag(PRG_SWAP) {
            [second_last, r7, r6, last]
        } else {
            [r6, r7, second_last, last]
        };
        let prg = prg.map(|bank| self.prg_map.wrap(bank));

        let pairs = [r(0) & !1, r(0) | 1, r(1) & !1, r(1) | 1];
        let singles = [r(2), r(3), r(4), r(5)];
        let mut chr = [0usize; 8];
        if self.bank_select.flag(CHR_INVERT) {
            chr[..4].copy_from_slice(&singles);
            chr[4..].copy_from_slice(&pairs);
        } else {
            chr[..4].copy_from_slice(&pairs);
            chr[4..].copy_from_slice(&singles);
        }
        let chr = chr.map(|bank| self.chr_map.wrap(bank));

        self.prg_map.remap(&prg);
        self.chr_map.remap(&chr);
    }

    /// Watches A12 on rendering fetches and clocks the scanline counter on a
    /// filtered rising edge.
    pub fn observe_ppu_fetch(&mut self, addr: u16, ppu_cycle: u64) {
        if addr >= 0x2000 {
            return;
        }

        let a12_high = addr & 0x1000 != 0;
        if a12_high && !self.last_a12_high {
            if ppu_cycle.saturating_sub(self.a12_low_since) >= A12_LOW_FILTER {
                self.clock_irq_counter();
            }
        } else if !a12_high && self.last_a12_high {
            self.a12_low_since = ppu_cycle;
        }
        self.last_a12_high = a12_high;
    }

    fn clock_irq_counter(&mut self) {
        if self.irq_counter == 0 || self.irq_reload {
            self.irq_counter = self.irq_latch;
            self.irq_reload = false;
        } else {
            self.irq_counter -= 1;
        }

        if self.irq_counter == 0 && self.irq_enabled {
            self.irq_pending = true;
        }
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_pending
    }

    pub fn mirroring(&self) -> Option<Mirroring> {
        self.mirroring
    }

    pub fn prg_map(&self) -> &MemoryMap {
        &self.prg_map
    }

    pub fn chr_map(&self) -> &MemoryMap {
        &self.chr_map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::{header::Header, mapper::chr_storage::ChrStorage};

    fn setup() -> (Mapper4, CartridgeMemory) {
        let mut prg = vec![0u8; 16 * PRG_WINDOW];
        for (bank, chunk) in prg.chunks_mut(PRG_WINDOW).enumerate() {
            chunk.fill(bank as u8);
        }
        let mut chr = vec![0u8; 64 * CHR_WINDOW];
        for (bank, chunk) in chr.chunks_mut(CHR_WINDOW).enumerate() {
            chunk.fill(bank as u8);
        }
        let memory = CartridgeMemory {
            prg_rom: prg.into_boxed_slice(),
            prg_ram: vec![0; 0x2000].into_boxed_slice(),
            chr: ChrStorage::Rom(chr.into_boxed_slice()),
        };
        let mut bytes = [0u8; 16];
        bytes[..4].copy_from_slice(b"NES\x1A");
        bytes[4] = 8;
        bytes[5] = 8;
        bytes[6] = 0x40;
        let header = Header::parse(&bytes).expect("valid header");
        (Mapper4::new(&header, &memory), memory)
    }

    fn banks(map: &MemoryMap) -> Vec<usize> {
        map.windows().map(|w| w.bank).collect()
    }

    #[test]
    fn prg_mode_swaps_fixed_window() {
        let (mut mapper, mut memory) = setup();
        mapper.cpu_write(&mut memory, 0x8000, 6);
        mapper.cpu_write(&mut memory, 0x8001, 3);
        assert_eq!(banks(mapper.prg_map()), vec![3, 1, 14, 15]);

        mapper.cpu_write(&mut memory, 0x8000, 0x46);
        assert_eq!(banks(mapper.prg_map()), vec![14, 1, 3, 15]);
        assert_eq!(mapper.cpu_read(&memory, 0xC000), Some(3));
        assert_eq!(mapper.cpu_read(&memory, 0xE000), Some(15));
    }

    #[test]
    fn chr_inversion_swaps_groups() {
        let (mut mapper, mut memory) = setup();
        for (target, value) in [(0u8, 8u8), (1, 10), (2, 20), (3, 21), (4, 22), (5, 23)] {
            mapper.cpu_write(&mut memory, 0x8000, target);
            mapper.cpu_write(&mut memory, 0x8001, value);
        }
        assert_eq!(banks(mapper.chr_map()), vec![8, 9, 10, 11, 20, 21, 22, 23]);

        mapper.cpu_write(&mut memory, 0x8000, 0x80);
        assert_eq!(banks(mapper.chr_map()), vec![20, 21, 22, 23, 8, 9, 10, 11]);
    }

    #[test]
    fn same_bank_select_twice_is_idempotent() {
        let (mut mapper, mut memory) = setup();
        mapper.cpu_write(&mut memory, 0x8000, 0x47);
        mapper.cpu_write(&mut memory, 0x8001, 5);
        let before = mapper.clone();
        mapper.cpu_write(&mut memory, 0x8000, 0x47);
        assert_eq!(before, mapper);
    }

    #[test]
    fn mirroring_register() {
        let (mut mapper, mut memory) = setup();
        mapper.cpu_write(&mut memory, 0xA000, 1);
        assert_eq!(mapper.mirroring(), Some(Mirroring::Horizontal));
        mapper.cpu_write(&mut memory, 0xA000, 0);
        assert_eq!(mapper.mirroring(), Some(Mirroring::Vertical));
    }

    #[test]
    fn prg_ram_write_protect() {
        let (mut mapper, mut memory) = setup();
        assert!(mapper.cpu_write(&mut memory, 0x6000, 1));
        mapper.cpu_write(&mut memory, 0xA001, 0xC0);
        assert!(!mapper.cpu_write(&mut memory, 0x6000, 2));
        assert_eq!(mapper.cpu_read(&memory, 0x6000), Some(1));
        mapper.cpu_write(&mut memory, 0xA001, 0x00);
        assert_eq!(mapper.cpu_read(&memory, 0x6000), None);
    }

    /// One scanline's worth of A12 activity: background fetches low, sprite
    /// fetches high.
    fn scanline(mapper: &mut Mapper4, base_cycle: u64) {
        mapper.observe_ppu_fetch(0x0000, base_cycle);
        mapper.observe_ppu_fetch(0x1000, base_cycle + 260);
        mapper.observe_ppu_fetch(0x1008, base_cycle + 262);
    }

    #[test]
    fn irq_fires_after_latch_plus_one_scanlines() {
        let (mut mapper, mut memory) = setup();
        mapper.cpu_write(&mut memory, 0xC000, 2);
        mapper.cpu_write(&mut memory, 0xC001, 0);
        mapper.cpu_write(&mut memory, 0xE001, 0);

        // Reload to 2, then 1, then 0 fires.
        for line in 0..2 {
            scanline(&mut mapper, line * 341);
            assert!(!mapper.irq_pending());
        }
        scanline(&mut mapper, 2 * 341);
        assert!(mapper.irq_pending());

        mapper.cpu_write(&mut memory, 0xE000, 0);
        assert!(!mapper.irq_pending());
    }

    #[test]
    fn a12_edges_inside_filter_window_are_ignored() {
        let (mut mapper, mut memory) = setup();
        mapper.cpu_write(&mut memory, 0xC000, 5);
        mapper.observe_ppu_fetch(0x1000, 100);
        assert_eq!(mapper.irq_counter, 5);
        mapper.observe_ppu_fetch(0x0000, 102);
        mapper.observe_ppu_fetch(0x1000, 104);
        assert_eq!(mapper.irq_counter, 5);
    }
}
