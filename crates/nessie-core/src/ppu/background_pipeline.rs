/// 16-bit left-shifting register used by the background pipeline.
///
/// The high byte holds the tile currently being drawn, the low byte the next
/// one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
struct Shift16(u16);

impl Shift16 {
    /// Replaces the low byte, keeping the pixels in flight.
    #[inline]
    fn load_low_byte(&mut self, byte: u8) {
        self.0 = (self.0 & 0xFF00) | byte as u16;
    }

    /// Bit at `15 - fine_x`. Fine X selects the tap instead of delaying the
    /// shift.
    #[inline]
    fn bit_with_fine_x(self, fine_x: u8) -> u8 {
        let shift = 15 - (fine_x & 0b111);
        ((self.0 >> shift) & 1) as u8
    }

    #[inline]
    fn shift(&mut self) {
        self.0 <<= 1;
    }
}

/// Tile data fetched during one 8-dot group, waiting for the next reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct TileLatch {
    pub(crate) nametable: u8,
    /// Attribute bits already shifted down to the tile's quadrant (`0..=3`).
    pub(crate) palette: u8,
    pub(crate) pattern_low: u8,
    pub(crate) pattern_high: u8,
}

/// Background pixel pipeline: two pattern shifters and two palette shifters.
///
/// Each visible dot samples one bit from every shifter and advances them;
/// every 8 dots the low bytes are reloaded from the [`TileLatch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub(crate) struct BgPipeline {
    /// `[bitplane0, bitplane1]`.
    pattern: [Shift16; 2],
    /// Palette bits replicated across the 8 pixels of a tile.
    palette: [Shift16; 2],
}

impl BgPipeline {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    /// Loads the next tile into the low bytes.
    pub(crate) fn reload(&mut self, tile: TileLatch) {
        self.pattern[0].load_low_byte(tile.pattern_low);
        self.pattern[1].load_low_byte(tile.pattern_high);
        for (i, shifter) in self.palette.iter_mut().enumerate() {
            let repeated = if (tile.palette >> i) & 1 != 0 { 0xFF } else { 0x00 };
            shifter.load_low_byte(repeated);
        }
    }

    /// Returns `(palette, pattern)`, both `0..=3`.
    pub(crate) fn sample(&self, fine_x: u8) -> (u8, u8) {
        let pattern = (self.pattern[1].bit_with_fine_x(fine_x) << 1)
            | self.pattern[0].bit_with_fine_x(fine_x);
        let palette = (self.palette[1].bit_with_fine_x(fine_x) << 1)
            | self.palette[0].bit_with_fine_x(fine_x);
        (palette, pattern)
    }

    pub(crate) fn shift(&mut self) {
        for shifter in self.pattern.iter_mut().chain(self.palette.iter_mut()) {
            shifter.shift();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tile(low: u8, high: u8, palette: u8) -> TileLatch {
        TileLatch {
            nametable: 0,
            palette,
            pattern_low: low,
            pattern_high: high,
        }
    }

    #[test]
    fn reloaded_tile_reaches_output_after_eight_shifts() {
        let mut bg = BgPipeline::new();
        bg.reload(tile(0b1000_0000, 0b1100_0000, 0b10));
        assert_eq!(bg.sample(0), (0, 0));

        for _ in 0..8 {
            bg.shift();
        }
        assert_eq!(bg.sample(0), (0b10, 0b11));
        bg.shift();
        assert_eq!(bg.sample(0), (0b10, 0b10));
    }

    #[test]
    fn fine_x_selects_a_later_pixel() {
        let mut bg = BgPipeline::new();
        bg.reload(tile(0b0010_0000, 0, 0b01));
        for _ in 0..8 {
            bg.shift();
        }
        assert_eq!(bg.sample(0).1, 0);
        assert_eq!(bg.sample(2), (0b01, 0b01));
    }

    #[test]
    fn reload_keeps_pixels_in_flight() {
        let mut bg = BgPipeline::new();
        bg.reload(tile(0xFF, 0x00, 0));
        for _ in 0..8 {
            bg.shift();
        }
        bg.reload(tile(0x00, 0xFF, 3));
        assert_eq!(bg.sample(0), (0, 0b01));
        assert_eq!(bg.sample(7), (0, 0b01));
    }
}
