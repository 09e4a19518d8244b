use bitflags::bitflags;

bitflags! {
    /// Attribute bits stored in sprite byte 2.
    ///
    /// ```text
    /// 7 6 5 4 3 2 1 0
    /// V H P . . . p p
    /// ```
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SpriteAttributes: u8 {
        /// Sprite palette select (`0..=3`).
        const PALETTE = 0b0000_0011;
        /// Drawn behind opaque background pixels.
        const PRIORITY_BEHIND_BACKGROUND = 0b0010_0000;
        const FLIP_HORIZONTAL = 0b0100_0000;
        const FLIP_VERTICAL = 0b1000_0000;
    }
}

impl SpriteAttributes {
    pub fn palette(self) -> u8 {
        self.bits() & Self::PALETTE.bits()
    }
}

/// Decoded OAM entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Sprite {
    /// Top scanline minus one, as stored in OAM.
    pub y: u8,
    pub tile: u8,
    pub attributes: SpriteAttributes,
    pub x: u8,
}

impl Sprite {
    pub const BYTES: usize = 4;

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            y: bytes[0],
            tile: bytes[1],
            attributes: SpriteAttributes::from_bits_retain(bytes[2]),
            x: bytes[3],
        }
    }

    /// Row of the sprite covered by `scanline`, if any.
    pub fn row_on(&self, scanline: u16, height: u8) -> Option<u8> {
        let row = scanline.checked_sub(self.y as u16)?;
        (row < height as u16).then_some(row as u8)
    }

    /// Pattern-table address of `row`, with vertical flip and 8x16 tile
    /// pairing applied. `table` is the PPUCTRL sprite table for 8x8 sprites.
    pub fn pattern_addr(&self, row: u8, height: u8, table: u16) -> u16 {
        let flipped = self.attributes.contains(SpriteAttributes::FLIP_VERTICAL);
        if height == 16 {
            let row = if flipped { 15 - row } else { row };
            let table = (self.tile as u16 & 1) * 0x1000;
            let tile = (self.tile & 0xFE) as u16 + (row as u16 >> 3);
            table + tile * 16 + (row as u16 & 7)
        } else {
            let row = if flipped { 7 - row } else { row };
            table + self.tile as u16 * 16 + row as u16
        }
    }
}

/// Up to eight sprites selected for one scanline, with their fetched
/// pattern rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SecondaryOam {
    sprites: [Sprite; SecondaryOam::CAPACITY],
    rows: [u8; SecondaryOam::CAPACITY],
    patterns: [[u8; 2]; SecondaryOam::CAPACITY],
    len: usize,
    /// OAM sprite 0 is the first entry.
    pub sprite0: bool,
}

impl SecondaryOam {
    pub const CAPACITY: usize = 8;

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Adds a sprite. Returns `false` once the buffer is full.
    pub fn push(&mut self, sprite: Sprite, row: u8) -> bool {
        if self.len == Self::CAPACITY {
            return false;
        }
        self.sprites[self.len] = sprite;
        self.rows[self.len] = row;
        self.len += 1;
        true
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn sprites(&self) -> &[Sprite] {
        &self.sprites[..self.len]
    }

    pub(crate) fn get(&self, slot: usize) -> Option<(Sprite, u8)> {
        (slot < self.len).then(|| (self.sprites[slot], self.rows[slot]))
    }

    pub(crate) fn set_pattern(&mut self, slot: usize, plane: usize, value: u8) {
        if slot < self.len {
            self.patterns[slot][plane] = value;
        }
    }

    /// `[low, high]` pattern bytes fetched for `slot`.
    pub fn pattern(&self, slot: usize) -> [u8; 2] {
        self.patterns[slot]
    }
}

/// Double buffer: the PPU fills `back` for the next scanline while `front`
/// describes the one being drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Latch<T> {
    front: T,
    back: T,
}

impl<T> Latch<T> {
    pub fn front(&self) -> &T {
        &self.front
    }

    pub fn back(&self) -> &T {
        &self.back
    }

    pub fn back_mut(&mut self) -> &mut T {
        &mut self.back
    }

    /// Publishes `back` as the new `front`.
    pub fn swap(&mut self) {
        core::mem::swap(&mut self.front, &mut self.back);
    }
}
