//! Mapper 1 (SxROM / MMC1).
//!
//! Registers are loaded serially: each write to `$8000-$FFFF` shifts bit 0
//! into a 5-bit shift register and the fifth write commits the value to the
//! register picked by address bits 13-14. A write with bit 7 set clears the
//! shift register and forces PRG mode 3.
//!
//! | Address       | Register | Contents                                     |
//! |---------------|----------|----------------------------------------------|
//! | `$8000-$9FFF` | control  | mirroring (0-1), PRG mode (2-3), CHR mode (4) |
//! | `$A000-$BFFF` | CHR 0    | 4 KiB bank at `$0000` (or 8 KiB bank, bit 0 ignored) |
//! | `$C000-$DFFF` | CHR 1    | 4 KiB bank at `$1000` (4 KiB mode only)       |
//! | `$E000-$FFFF` | PRG      | 16 KiB bank (0-3), PRG RAM disable (4)        |

use tracing::debug;

use crate::{
    cartridge::{CartridgeMemory, header::Mirroring, memory_map::MemoryMap},
    memory::cpu as cpu_mem,
    register::{Field, Register},
};

const PRG_WINDOW: usize = 16 * 1024;
const CHR_WINDOW: usize = 4 * 1024;

const MIRRORING: Field = Field::new(0, 2);
const PRG_MODE: Field = Field::new(2, 2);
const CHR_4K_MODE: Field = Field::bit(4);

const PRG_BANK: Field = Field::new(0, 4);
const PRG_RAM_DISABLE: Field = Field::bit(4);

/// Shift register value right after a reset. The marker bit reaches bit 0 on
/// the fifth write.
const SHIFT_RESET: u8 = 0x10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapper1 {
    prg_map: MemoryMap,
    chr_map: MemoryMap,

    control: Register<u8>,
    chr_bank0: u8,
    chr_bank1: u8,
    prg_bank: Register<u8>,

    shift: u8,
    /// CPU cycle of the last serial write, used to drop the second write of
    /// read-modify-write instructions.
    last_write_cycle: Option<u64>,
}

impl Mapper1 {
    pub fn new(memory: &CartridgeMemory) -> Self {
        let mut mapper = Self {
            prg_map: MemoryMap::new(cpu_mem::PRG_ROM_START, PRG_WINDOW, 2, memory.prg_rom.len()),
            chr_map: MemoryMap::new(0x0000, CHR_WINDOW, 2, memory.chr.len()),
            control: Register::default(),
            chr_bank0: 0,
            chr_bank1: 0,
            prg_bank: Register::default(),
            shift: SHIFT_RESET,
            last_write_cycle: None,
        };
        mapper.reset();
        mapper
    }

    /// Power-on state: 16 KiB PRG switching at `$8000` with the last bank
    /// fixed at `$C000`, banks zeroed.
    pub fn reset(&mut self) {
        self.control.set(0x0C);
        self.chr_bank0 = 0;
        self.chr_bank1 = 0;
        self.prg_bank.set(0);
        self.shift = SHIFT_RESET;
        self.last_write_cycle = None;
        self.update_banks();
    }

    pub fn cpu_read(&self, memory: &CartridgeMemory, addr: u16) -> Option<u8> {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => {
                if self.prg_ram_enabled() {
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

    pub fn cpu_write(
        &mut self,
        memory: &mut CartridgeMemory,
        addr: u16,
        data: u8,
        cpu_cycle: u64,
    ) -> bool {
        match addr {
            cpu_mem::PRG_RAM_START..=cpu_mem::PRG_RAM_END => {
                self.prg_ram_enabled() && memory.write_prg_ram(addr, data)
            }
            cpu_mem::PRG_ROM_START..=0xFFFF => {
                self.write_serial(addr, data, cpu_cycle);
                true
            }
            _ => false,
        }
    }

    fn write_serial(&mut self, addr: u16, data: u8, cpu_cycle: u64) {
        let back_to_back = self
            .last_write_cycle
            .is_some_and(|last| cpu_cycle.wrapping_sub(last) < 2);
        self.last_write_cycle = Some(cpu_cycle);
        if back_to_back {
            return;
        }

        if data & 0x80 != 0 {
            self.shift = SHIFT_RESET;
            self.control.set(self.control.get() | 0x0C);
            self.update_banks();
            return;
        }

        let complete = self.shift & 1 != 0;
        self.shift = (self.shift >> 1) | ((data & 1) << 4);
        if complete {
            let value = self.shift;
            self.shift = SHIFT_RESET;
            self.commit(addr, value);
        }
    }

    fn commit(&mut self, addr: u16, value: u8) {
        match (addr >> 13) & 0b11 {
            0 => self.control.set(value),
            1 => self.chr_bank0 = value,
            2 => self.chr_bank1 = value,
            _ => self.prg_bank.set(value),
        }
        debug!(
            "MMC1 ${addr:04X} <- {value:#04X} (control {:#04X})",
            self.control.get()
        );
        self.update_banks();
    }

    fn update_banks(&mut self) {
        let bank = self.prg_bank.field(PRG_BANK) as usize;
        let last = self.prg_map.last_bank();
        let prg = match self.control.field(PRG_MODE) {
            // 32 KiB switching, low bit ignored.
            0 | 1 => {
                let base = bank & !1;
                [base, base + 1]
            }
            2 => [0, bank],
            _ => [bank, last],
        };
        let prg = prg.map(|bank| self.prg_map.wrap(bank));
        self.prg_map.remap(&prg);

        let chr = if self.control.flag(CHR_4K_MODE) {
            [self.chr_bank0 as usize, self.chr_bank1 as usize]
        } else {
            let base = (self.chr_bank0 & !1) as usize;
            [base, base + 1]
        };
        let chr = chr.map(|bank| self.chr_map.wrap(bank));
        self.chr_map.remap(&chr);
    }

    fn prg_ram_enabled(&self) -> bool {
        !self.prg_bank.flag(PRG_RAM_DISABLE)
    }

    pub fn mirroring(&self) -> Mirroring {
        match self.control.field(MIRRORING) {
            0 => Mirroring::SingleLower,
            1 => Mirroring::SingleUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        }
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
    use crate::cartridge::mapper::chr_storage::ChrStorage;

    fn memory(prg_banks: usize, chr_4k_banks: usize) -> CartridgeMemory {
        let mut prg = vec![0u8; prg_banks * PRG_WINDOW];
        for (bank, chunk) in prg.chunks_mut(PRG_WINDOW).enumerate() {
            chunk.fill(bank as u8);
        }
        let mut chr = vec![0u8; chr_4k_banks * CHR_WINDOW];
        for (bank, chunk) in chr.chunks_mut(CHR_WINDOW).enumerate() {
            chunk.fill(0x40 + bank as u8);
        }
        CartridgeMemory {
            prg_rom: prg.into_boxed_slice(),
            prg_ram: vec![0; 0x2000].into_boxed_slice(),
            chr: ChrStorage::Rom(chr.into_boxed_slice()),
        }
    }

    /// Feeds `value` LSB first through five writes on distinct cycles.
    fn load(mapper: &mut Mapper1, memory: &mut CartridgeMemory, addr: u16, value: u8, cycle: &mut u64) {
        for bit in 0..5 {
            mapper.cpu_write(memory, addr, (value >> bit) & 1, *cycle);
            *cycle += 4;
        }
    }

    #[test]
    fn power_on_fixes_last_bank_high() {
        let memory = memory(8, 4);
        let mapper = Mapper1::new(&memory);
        assert_eq!(mapper.cpu_read(&memory, 0x8000), Some(0));
        assert_eq!(mapper.cpu_read(&memory, 0xC000), Some(7));
    }

    #[test]
    fn fifth_write_selects_prg_bank() {
        let mut memory = memory(8, 4);
        let mut mapper = Mapper1::new(&memory);
        let mut cycle = 10;
        load(&mut mapper, &mut memory, 0xE000, 3, &mut cycle);
        assert_eq!(mapper.cpu_read(&memory, 0x8000), Some(3));
        assert_eq!(mapper.cpu_read(&memory, 0xC000), Some(7));
    }

    #[test]
    fn eight_kib_chr_mode_selects_even_pair() {
        let mut memory = memory(2, 8);
        let mut mapper = Mapper1::new(&memory);
        let mut cycle = 10;
        // Control: vertical mirroring, PRG mode 3, 8 KiB CHR.
        load(&mut mapper, &mut memory, 0x8000, 0b0_11_10, &mut cycle);
        load(&mut mapper, &mut memory, 0xA000, 0x04, &mut cycle);

        let banks: Vec<usize> = mapper.chr_map().windows().map(|w| w.bank).collect();
        assert_eq!(banks, vec![4, 5]);
        for window in mapper.chr_map().windows() {
            assert_eq!(window.storage_offset() / (8 * 1024), 2);
        }
        assert_eq!(mapper.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn four_kib_chr_mode_switches_windows_independently() {
        let mut memory = memory(2, 8);
        let mut mapper = Mapper1::new(&memory);
        let mut cycle = 10;
        load(&mut mapper, &mut memory, 0x8000, 0b1_11_11, &mut cycle);
        load(&mut mapper, &mut memory, 0xA000, 5, &mut cycle);
        load(&mut mapper, &mut memory, 0xC000, 2, &mut cycle);

        let banks: Vec<usize> = mapper.chr_map().windows().map(|w| w.bank).collect();
        assert_eq!(banks, vec![5, 2]);
        assert_eq!(mapper.mirroring(), Mirroring::Horizontal);
    }

    #[test]
    fn reset_bit_clears_shift_and_forces_mode_three() {
        let mut memory = memory(4, 2);
        let mut mapper = Mapper1::new(&memory);
        let mut cycle = 10;
        load(&mut mapper, &mut memory, 0x8000, 0b0_00_00, &mut cycle);
        assert_eq!(mapper.control.field(PRG_MODE), 0);

        mapper.cpu_write(&mut memory, 0x8000, 1, cycle);
        cycle += 4;
        mapper.cpu_write(&mut memory, 0x8000, 0x80, cycle);
        assert_eq!(mapper.shift, SHIFT_RESET);
        assert_eq!(mapper.control.field(PRG_MODE), 3);
    }

    #[test]
    fn back_to_back_writes_are_ignored() {
        let mut memory = memory(4, 2);
        let mut mapper = Mapper1::new(&memory);
        mapper.cpu_write(&mut memory, 0xE000, 1, 100);
        mapper.cpu_write(&mut memory, 0xE000, 1, 100);
        // Only one bit went in.
        assert_eq!(mapper.shift, 0b1_1000);
    }

    #[test]
    fn same_bank_select_twice_is_idempotent() {
        let mut memory = memory(8, 8);
        let mut mapper = Mapper1::new(&memory);
        let mut cycle = 10;
        load(&mut mapper, &mut memory, 0xE000, 5, &mut cycle);
        let first = (mapper.prg_map().clone(), mapper.chr_map().clone());
        load(&mut mapper, &mut memory, 0xE000, 5, &mut cycle);
        assert_eq!(first, (mapper.prg_map().clone(), mapper.chr_map().clone()));
    }

    #[test]
    fn prg_ram_disable_bit_floats_reads() {
        let mut memory = memory(2, 2);
        let mut mapper = Mapper1::new(&memory);
        let mut cycle = 10;
        assert!(mapper.cpu_write(&mut memory, 0x6000, 0x99, cycle));
        load(&mut mapper, &mut memory, 0xE000, 0x10, &mut cycle);
        assert_eq!(mapper.cpu_read(&memory, 0x6000), None);
        load(&mut mapper, &mut memory, 0xE000, 0x00, &mut cycle);
        assert_eq!(mapper.cpu_read(&memory, 0x6000), Some(0x99));
    }
}
