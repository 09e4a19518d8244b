use std::fmt;

use crate::{
    memory::ppu as ppu_mem,
    register::{Field, Register},
};

// Layout (bits 0-14):
//  14 13 12 11 10 9 8 7 6 5 4 3 2 1 0
//  [fine_y][nt][coarse_y   ][coarse_x   ]
//  yyy     NN   YYYYY         XXXXX
const COARSE_X: Field = Field::new(0, 5);
const COARSE_Y: Field = Field::new(5, 5);
const NAMETABLE: Field = Field::new(10, 2);
const NAMETABLE_X: Field = Field::bit(10);
const NAMETABLE_Y: Field = Field::bit(11);
const FINE_Y: Field = Field::new(12, 3);

const ADDR_MASK: u16 = 0x7FFF;
const HORIZONTAL_BITS: u16 = (COARSE_X.mask() | NAMETABLE_X.mask()) as u16;
const VERTICAL_BITS: u16 = (COARSE_Y.mask() | NAMETABLE_Y.mask() | FINE_Y.mask()) as u16;

/// 15-bit "loopy" VRAM address used for the `v` and `t` registers.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct VramAddr(Register<u16>);

impl VramAddr {
    pub fn new(raw: u16) -> Self {
        Self(Register::new(raw & ADDR_MASK))
    }

    #[inline]
    pub fn raw(self) -> u16 {
        self.0.get()
    }

    #[inline]
    pub fn set_raw(&mut self, raw: u16) {
        self.0.set(raw & ADDR_MASK);
    }

    #[inline]
    pub fn coarse_x(self) -> u8 {
        self.0.field(COARSE_X) as u8
    }

    #[inline]
    pub fn set_coarse_x(&mut self, value: u8) {
        self.0.set_field(COARSE_X, value as u16);
    }

    #[inline]
    pub fn coarse_y(self) -> u8 {
        self.0.field(COARSE_Y) as u8
    }

    #[inline]
    pub fn set_coarse_y(&mut self, value: u8) {
        self.0.set_field(COARSE_Y, value as u16);
    }

    #[inline]
    pub fn nametable(self) -> u8 {
        self.0.field(NAMETABLE) as u8
    }

    #[inline]
    pub fn set_nametable(&mut self, value: u8) {
        self.0.set_field(NAMETABLE, value as u16);
    }

    #[inline]
    pub fn fine_y(self) -> u8 {
        self.0.field(FINE_Y) as u8
    }

    #[inline]
    pub fn set_fine_y(&mut self, value: u8) {
        self.0.set_field(FINE_Y, value as u16);
    }

    /// `v += step`, kept to 15 bits.
    pub fn increment(&mut self, step: u16) {
        self.set_raw(self.raw().wrapping_add(step));
    }

    /// Coarse X increment at the end of each tile, wrapping into the
    /// horizontally adjacent nametable.
    pub fn increment_x(&mut self) {
        if self.coarse_x() == 31 {
            self.set_coarse_x(0);
            let flipped = !self.0.flag(NAMETABLE_X);
            self.0.set_flag(NAMETABLE_X, flipped);
        } else {
            self.set_coarse_x(self.coarse_x() + 1);
        }
    }

    /// Fine Y increment at dot 256. Row 29 wraps into the vertically adjacent
    /// nametable; rows 30/31 (attribute memory) wrap without switching.
    pub fn increment_y(&mut self) {
        if self.fine_y() < 7 {
            self.set_fine_y(self.fine_y() + 1);
            return;
        }
        self.set_fine_y(0);
        match self.coarse_y() {
            29 => {
                self.set_coarse_y(0);
                let flipped = !self.0.flag(NAMETABLE_Y);
                self.0.set_flag(NAMETABLE_Y, flipped);
            }
            31 => self.set_coarse_y(0),
            y => self.set_coarse_y(y + 1),
        }
    }

    /// Copies coarse X and the horizontal nametable bit from `t`.
    pub fn copy_horizontal(&mut self, t: VramAddr) {
        self.set_raw((self.raw() & !HORIZONTAL_BITS) | (t.raw() & HORIZONTAL_BITS));
    }

    /// Copies fine Y, coarse Y and the vertical nametable bit from `t`.
    pub fn copy_vertical(&mut self, t: VramAddr) {
        self.set_raw((self.raw() & !VERTICAL_BITS) | (t.raw() & VERTICAL_BITS));
    }

    /// Nametable byte for the tile under the cursor.
    pub fn tile_addr(self) -> u16 {
        ppu_mem::NAMETABLE_BASE | (self.raw() & 0x0FFF)
    }

    /// Attribute byte covering the tile under the cursor.
    pub fn attribute_addr(self) -> u16 {
        let v = self.raw();
        ppu_mem::NAMETABLE_BASE
            | ppu_mem::ATTRIBUTE_OFFSET
            | (v & 0x0C00)
            | ((v >> 4) & 0x38)
            | ((v >> 2) & 0x07)
    }

    /// Shift that selects this tile's 2-bit palette out of its attribute byte.
    pub fn attribute_shift(self) -> u8 {
        ((self.coarse_y() & 0x02) << 1) | (self.coarse_x() & 0x02)
    }
}

impl fmt::Debug for VramAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VramAddr")
            .field("raw", &format_args!("{:#06X}", self.raw()))
            .field("fine_y", &self.fine_y())
            .field("nametable", &self.nametable())
            .field("coarse_y", &self.coarse_y())
            .field("coarse_x", &self.coarse_x())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_match_loopy_layout() {
        let mut v = VramAddr::default();
        v.set_coarse_x(0b10101);
        v.set_coarse_y(0b01110);
        v.set_nametable(0b10);
        v.set_fine_y(0b101);
        assert_eq!(v.raw(), 0b101_10_01110_10101);
    }

    #[test]
    fn coarse_x_wrap_toggles_horizontal_nametable() {
        let mut v = VramAddr::new(0x001F);
        v.increment_x();
        assert_eq!(v.raw(), 0x0400);
        v.set_coarse_x(31);
        v.increment_x();
        assert_eq!(v.nametable(), 0);
    }

    #[test]
    fn y_increment_wraps_at_row_29_and_31() {
        let mut v = VramAddr::default();
        v.set_fine_y(7);
        v.set_coarse_y(29);
        v.increment_y();
        assert_eq!((v.fine_y(), v.coarse_y(), v.nametable()), (0, 0, 0b10));

        v.set_fine_y(7);
        v.set_coarse_y(31);
        v.increment_y();
        assert_eq!((v.coarse_y(), v.nametable()), (0, 0b10));
    }

    #[test]
    fn copies_only_their_axis() {
        let t = VramAddr::new(0x7FFF);
        let mut v = VramAddr::default();
        v.copy_horizontal(t);
        assert_eq!(v.raw(), 0x041F);
        v.copy_vertical(t);
        assert_eq!(v.raw(), 0x7FFF);
    }

    #[test]
    fn attribute_address_for_tile() {
        // Nametable 1, coarse (x=10, y=20).
        let mut v = VramAddr::default();
        v.set_nametable(1);
        v.set_coarse_x(10);
        v.set_coarse_y(20);
        assert_eq!(v.tile_addr(), 0x2400 + 20 * 32 + 10);
        assert_eq!(v.attribute_addr(), 0x27C0 + 5 * 8 + 2);
        assert_eq!(v.attribute_shift(), 2);
    }
}
