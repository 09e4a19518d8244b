//! CPU-visible PPU register state and the internal `v/t/x/w` latches.

mod control;
mod mask;
mod status;
mod vram_addr;
mod vram_registers;

pub use control::Control;
pub use mask::Mask;
pub use status::Status;
pub use vram_addr::VramAddr;
pub use vram_registers::VramRegisters;

/// Every register the CPU can reach through `$2000-$2007`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Registers {
    pub control: Control,
    pub mask: Mask,
    pub status: Status,
    /// OAMADDR, auto-incremented by OAMDATA writes.
    pub oam_addr: u8,
    pub vram: VramRegisters,
    /// Delayed PPUDATA read buffer.
    pub read_buffer: u8,
    /// Last value written to or read from any PPU port. Write-only registers
    /// read back as this value.
    pub io_latch: u8,
}

impl Registers {
    pub fn new() -> Self {
        Self::default()
    }

    /// `$2000` write; also copies the nametable bits into `t`.
    pub fn write_control(&mut self, value: u8) {
        self.control = Control::from_bits_retain(value);
        self.vram.t.set_nametable(self.control.nametable_index());
    }
}
