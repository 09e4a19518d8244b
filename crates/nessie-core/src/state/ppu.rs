use crate::ppu::{
    Ppu,
    registers::{Control, Mask, Status},
};

/// PPU position, registers and the internal scroll latches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PpuSnapshot {
    pub scanline: u16,
    pub dot: u16,
    pub frame: u64,
    pub control: Control,
    pub mask: Mask,
    pub status: Status,
    pub oam_addr: u8,
    /// Current VRAM address `v`.
    pub vram_addr: u16,
    /// Temporary VRAM address `t`.
    pub temp_addr: u16,
    pub fine_x: u8,
    pub write_toggle: bool,
    pub read_buffer: u8,
    pub odd_frame: bool,
}

impl PpuSnapshot {
    pub fn in_vblank(&self) -> bool {
        self.status.contains(Status::VERTICAL_BLANK)
    }
}

impl Ppu {
    pub fn snapshot(&self) -> PpuSnapshot {
        let registers = self.registers();
        PpuSnapshot {
            scanline: self.scanline(),
            dot: self.dot(),
            frame: self.frame(),
            control: registers.control,
            mask: registers.mask,
            status: registers.status,
            oam_addr: registers.oam_addr,
            vram_addr: registers.vram.v.raw(),
            temp_addr: registers.vram.t.raw(),
            fine_x: registers.vram.x,
            write_toggle: registers.vram.w,
            read_buffer: registers.read_buffer,
            odd_frame: self.is_odd_frame(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ppu::{PRE_RENDER_SCANLINE, pattern_bus::PatternBus};

    #[test]
    fn snapshot_exposes_scroll_latches() {
        let mut ppu = Ppu::new();
        let mut bus = PatternBus::default();
        ppu.cpu_write(0x2005, 0b0111_1101, &mut bus);

        let snapshot = ppu.snapshot();
        assert_eq!(snapshot.fine_x, 0b101);
        assert_eq!(snapshot.temp_addr & 0x1F, 0b01111);
        assert!(snapshot.write_toggle);
        assert_eq!((snapshot.scanline, snapshot.dot), (PRE_RENDER_SCANLINE, 0));
        assert!(!snapshot.in_vblank());
    }
}
