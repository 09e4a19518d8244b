//! The NTSC master palette and palette RAM addressing.

use crate::memory::ppu as ppu_mem;

/// 8-bit RGB triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

macro_rules! palette {
    ($(($r:expr, $g:expr, $b:expr)),* $(,)?) => {
        [$(Color::new($r, $g, $b)),*]
    };
}

/// The 64 colors the PPU can emit, indexed by the 6-bit palette value.
#[rustfmt::skip]
pub static MASTER_PALETTE: [Color; 64] = palette![
    (84, 84, 84), (0, 30, 116), (8, 22, 147), (48, 12, 154), (92, 4, 121), (136, 6, 85), (147, 22, 34), (132, 48, 0),
    (76, 84, 0), (12, 102, 0), (0, 120, 44), (0, 106, 132), (0, 84, 136), (0, 0, 0), (0, 0, 0), (0, 0, 0),
    (160, 160, 160), (0, 70, 196), (48, 92, 255), (92, 70, 255), (136, 58, 255), (196, 78, 255), (204, 92, 204), (255, 114, 136),
    (255, 147, 84), (255, 173, 0), (216, 196, 0), (120, 214, 0), (0, 230, 116), (0, 196, 214), (0, 160, 255), (0, 0, 0),
    (255, 255, 255), (48, 152, 255), (120, 147, 255), (176, 138, 255), (220, 132, 255), (255, 152, 255), (255, 165, 214), (255, 188, 160),
    (255, 214, 136), (255, 234, 120), (255, 255, 160), (188, 255, 160), (120, 255, 188), (120, 255, 255), (120, 214, 255), (84, 84, 255),
    (255, 255, 255), (166, 230, 255), (188, 220, 255), (204, 214, 255), (214, 204, 255), (220, 204, 255), (214, 208, 230), (220, 214, 204),
    (234, 220, 196), (255, 230, 188), (240, 234, 196), (214, 240, 196), (188, 244, 214), (188, 244, 230), (188, 230, 244), (176, 176, 255),
];

/// Looks up a palette RAM value (only the low six bits are used).
#[inline]
pub fn color(index: u8) -> Color {
    MASTER_PALETTE[(index & 0x3F) as usize]
}

/// Palette RAM slot for `addr` in `$3F00-$3FFF`.
///
/// `$3F10/$14/$18/$1C` are mirrors of `$3F00/$04/$08/$0C`.
#[inline]
pub fn ram_index(addr: u16) -> usize {
    let index = (addr - ppu_mem::PALETTE_BASE) as usize % ppu_mem::PALETTE_RAM_SIZE;
    if index & 0x13 == 0x10 {
        index & !0x10
    } else {
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprite_backdrop_entries_mirror_background() {
        assert_eq!(ram_index(0x3F10), 0x00);
        assert_eq!(ram_index(0x3F14), 0x04);
        assert_eq!(ram_index(0x3F1C), 0x0C);
        assert_eq!(ram_index(0x3F11), 0x11);
        assert_eq!(ram_index(0x3F3F), 0x1F);
        assert_eq!(ram_index(0x3FF0), 0x00);
    }

    #[test]
    fn color_ignores_upper_bits() {
        assert_eq!(color(0x00), Color::new(84, 84, 84));
        assert_eq!(color(0xC1), Color::new(0, 30, 116));
        assert_eq!(color(0x30), Color::new(255, 255, 255));
    }
}
