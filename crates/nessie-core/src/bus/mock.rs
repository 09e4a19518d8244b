use crate::bus::Bus;

/// Flat 64 KiB RAM that logs every CPU write.
#[derive(Debug)]
pub(crate) struct MockBus {
    pub(crate) mem: Vec<u8>,
    pub(crate) writes: Vec<(u16, u8)>,
}

impl Default for MockBus {
    fn default() -> Self {
        Self {
            mem: vec![0; 0x10000],
            writes: Vec::new(),
        }
    }
}

impl MockBus {
    /// Copies `bytes` to `addr` without logging.
    pub(crate) fn load(&mut self, addr: u16, bytes: &[u8]) {
        let start = addr as usize;
        self.mem[start..start + bytes.len()].copy_from_slice(bytes);
    }
}

impl Bus for MockBus {
    fn read(&mut self, addr: u16) -> u8 {
        self.mem[addr as usize]
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.writes.push((addr, data));
        self.mem[addr as usize] = data;
    }
}
