//! Bank-view tables.
//!
//! A [`MemoryMap`] splits one contiguous address range (e.g. `$8000-$FFFF`)
//! into equally sized windows and records which bank of the backing storage
//! each window currently shows. Mappers rebuild the whole table after a
//! register write through [`MemoryMap::remap`], so an access never sees a half
//! applied switch. Debuggers and disassemblers read the same table to resolve
//! an address to its ROM bank.

/// Address space a bank view belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BankSpace {
    /// CPU `$8000-$FFFF` program ROM windows.
    Prg,
    /// PPU `$0000-$1FFF` pattern table windows.
    Chr,
}

/// One window of a [`MemoryMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BankWindow {
    /// First address covered by the window.
    pub start: u16,
    /// Window size in bytes.
    pub size: usize,
    /// Selected bank, counted in window-sized units.
    pub bank: usize,
}

impl BankWindow {
    /// Byte offset of the window's first byte in the backing storage.
    pub fn storage_offset(&self) -> usize {
        self.bank * self.size
    }
}

const MAX_WINDOWS: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MemoryMap {
    base: u16,
    window_size: usize,
    window_count: usize,
    bank_count: usize,
    banks: [usize; MAX_WINDOWS],
}

impl MemoryMap {
    /// Builds a map of `window_count` windows of `window_size` bytes starting
    /// at `base`, backed by `storage_len` bytes. Every window starts on bank 0.
    pub fn new(base: u16, window_size: usize, window_count: usize, storage_len: usize) -> Self {
        debug_assert!(window_count > 0 && window_count <= MAX_WINDOWS);
        debug_assert!(window_size.is_power_of_two());
        Self {
            base,
            window_size,
            window_count: window_count.min(MAX_WINDOWS),
            bank_count: storage_len / window_size,
            banks: [0; MAX_WINDOWS],
        }
    }

    /// Number of window-sized banks in the backing storage.
    pub fn bank_count(&self) -> usize {
        self.bank_count
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Index of the last bank, for mappers that pin windows to the end of ROM.
    pub fn last_bank(&self) -> usize {
        self.bank_count.saturating_sub(1)
    }

    /// Replaces every window's bank in one step.
    ///
    /// Callers must already have wrapped bank numbers into range; the wrap
    /// here only exists so release builds stay in bounds.
    pub fn remap(&mut self, banks: &[usize]) {
        debug_assert_eq!(banks.len(), self.window_count);
        if self.bank_count == 0 {
            return;
        }
        for (slot, &bank) in self.banks.iter_mut().zip(banks) {
            debug_assert!(
                bank < self.bank_count,
                "bank {bank} out of range ({} banks)",
                self.bank_count
            );
            *slot = bank % self.bank_count;
        }
    }

    /// Wraps a register value into the available bank range.
    pub fn wrap(&self, bank: usize) -> usize {
        if self.bank_count == 0 {
            0
        } else {
            bank % self.bank_count
        }
    }

    /// Resolves `addr` to an offset in the backing storage.
    ///
    /// Returns `None` when the address lies outside the mapped range or the
    /// backing storage is empty.
    pub fn translate(&self, addr: u16) -> Option<usize> {
        let index = self.window_index(addr)?;
        if self.bank_count == 0 {
            return None;
        }
        let within = (addr - self.base) as usize & (self.window_size - 1);
        Some(self.banks[index] * self.window_size + within)
    }

    /// Bank currently visible at `addr`.
    pub fn bank_at(&self, addr: u16) -> Option<usize> {
        self.window_index(addr).map(|index| self.banks[index])
    }

    /// Windows in address order.
    pub fn windows(&self) -> impl Iterator<Item = BankWindow> + '_ {
        self.banks[..self.window_count]
            .iter()
            .enumerate()
            .map(|(index, &bank)| BankWindow {
                start: self.base + (index * self.window_size) as u16,
                size: self.window_size,
                bank,
            })
    }

    fn window_index(&self, addr: u16) -> Option<usize> {
        let offset = addr.checked_sub(self.base)? as usize;
        let index = offset / self.window_size;
        (index < self.window_count).then_some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn windows_partition_the_range() {
        let map = MemoryMap::new(0x8000, 0x2000, 4, 0x8000);
        let starts: Vec<u16> = map.windows().map(|w| w.start).collect();
        assert_eq!(starts, vec![0x8000, 0xA000, 0xC000, 0xE000]);
        assert_eq!(map.translate(0x7FFF), None);
        assert_eq!(map.translate(0xFFFF), Some(0x1FFF));
    }

    #[test]
    fn remap_redirects_translation() {
        let mut map = MemoryMap::new(0x8000, 0x4000, 2, 0x10000);
        map.remap(&[3, 1]);
        assert_eq!(map.translate(0x8001), Some(3 * 0x4000 + 1));
        assert_eq!(map.translate(0xC000), Some(0x4000));
        assert_eq!(map.bank_at(0x9000), Some(3));
    }

    #[test]
    fn empty_storage_translates_to_nothing() {
        let map = MemoryMap::new(0x0000, 0x0400, 8, 0);
        assert_eq!(map.bank_count(), 0);
        assert_eq!(map.translate(0x0000), None);
    }
}
