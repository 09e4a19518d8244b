use super::VramAddr;

/// Internal VRAM register block in the usual `v/t/x/w` naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VramRegisters {
    /// Current VRAM address.
    pub v: VramAddr,
    /// Temporary VRAM address (top-left of the screen while rendering).
    pub t: VramAddr,
    /// Fine X scroll (0..7).
    pub x: u8,
    /// Write toggle shared by `$2005` and `$2006`.
    pub w: bool,
}

impl VramRegisters {
    /// `$2005`: X scroll on the first write, Y scroll on the second.
    pub fn write_scroll(&mut self, value: u8) {
        if !self.w {
            self.t.set_coarse_x(value >> 3);
            self.x = value & 0b111;
        } else {
            self.t.set_coarse_y(value >> 3);
            self.t.set_fine_y(value & 0b111);
        }
        self.w = !self.w;
    }

    /// `$2006`: high six bits first, then the low byte, which also copies
    /// `t` into `v`.
    pub fn write_addr(&mut self, value: u8) {
        if !self.w {
            let hi = u16::from(value & 0b0011_1111) << 8;
            self.t.set_raw(hi | (self.t.raw() & 0x00FF));
        } else {
            self.t.set_raw((self.t.raw() & 0x7F00) | u16::from(value));
            self.v = self.t;
        }
        self.w = !self.w;
    }

    pub fn reset_latch(&mut self) {
        self.w = false;
    }
}
