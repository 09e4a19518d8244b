//! Debug renderers that project PPU memory through the current palette.
//!
//! These read CHR, nametable, palette and OAM state without side effects and
//! never touch the rendering pipeline.

use super::{
    Ppu,
    palette::{self, Color},
    pattern_bus::{peek_mirroring, peek_pattern},
    sprite::{Sprite, SpriteAttributes},
};
use crate::{cartridge::Cartridge, memory::ppu as ppu_mem};

/// Tiles per pattern-table row.
const PATTERN_TILES: usize = 16;
const NAMETABLE_COLUMNS: usize = 32;
const NAMETABLE_ROWS: usize = 30;
/// Sprites per row in the OAM sheet.
const SPRITE_SHEET_COLUMNS: usize = 8;

/// RGB image produced by a debug renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugImage {
    pub width: usize,
    pub height: usize,
    /// Packed RGB rows.
    pub rgb: Vec<u8>,
}

impl DebugImage {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rgb: vec![0; width * height * 3],
        }
    }

    fn put(&mut self, x: usize, y: usize, color: Color) {
        let offset = (y * self.width + x) * 3;
        if let Some(pixel) = self.rgb.get_mut(offset..offset + 3) {
            pixel.copy_from_slice(&[color.r, color.g, color.b]);
        }
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color> {
        let offset = (y * self.width + x) * 3;
        let rgb = self.rgb.get(offset..offset + 3)?;
        Some(Color::new(rgb[0], rgb[1], rgb[2]))
    }
}

/// Two-bit pixel from a pattern row pair. `column` 0 is the leftmost pixel.
fn pattern_pixel(low: u8, high: u8, column: usize) -> u8 {
    let bit = 7 - column;
    (((high >> bit) & 1) << 1) | ((low >> bit) & 1)
}

fn palette_color(ppu: &Ppu, palette: u8, pixel: u8) -> Color {
    let index = if pixel == 0 {
        0
    } else {
        (palette as usize) * 4 + pixel as usize
    };
    palette::color(ppu.palette_ram()[index] & ppu.registers().mask.palette_mask())
}

fn draw_tile(
    image: &mut DebugImage,
    ppu: &Ppu,
    cartridge: Option<&Cartridge>,
    tile_addr: u16,
    palette: u8,
    origin: (usize, usize),
) {
    for row in 0..8 {
        let low = peek_pattern(cartridge, tile_addr + row as u16);
        let high = peek_pattern(cartridge, tile_addr + row as u16 + 8);
        for column in 0..8 {
            let pixel = pattern_pixel(low, high, column);
            image.put(origin.0 + column, origin.1 + row, palette_color(ppu, palette, pixel));
        }
    }
}

/// 128x128 view of pattern table `table` (0 or 1) using palette `palette`
/// (`0..=7`, 4-7 being the sprite palettes).
pub fn render_pattern_table(
    ppu: &Ppu,
    cartridge: Option<&Cartridge>,
    table: u8,
    palette: u8,
) -> DebugImage {
    let side = PATTERN_TILES * 8;
    let mut image = DebugImage::new(side, side);
    let base = (table & 1) as u16 * ppu_mem::PATTERN_TABLE_SIZE;
    for tile in 0..PATTERN_TILES * PATTERN_TILES {
        let origin = ((tile % PATTERN_TILES) * 8, (tile / PATTERN_TILES) * 8);
        draw_tile(&mut image, ppu, cartridge, base + tile as u16 * 16, palette & 7, origin);
    }
    image
}

/// 512x480 view of all four logical nametables, laid out as
/// `$2000 $2400 / $2800 $2C00`, using the current background pattern table.
pub fn render_nametables(ppu: &Ppu, cartridge: Option<&Cartridge>) -> DebugImage {
    let mut image = DebugImage::new(NAMETABLE_COLUMNS * 8 * 2, NAMETABLE_ROWS * 8 * 2);
    let mirroring = peek_mirroring(cartridge);
    let pattern_base = ppu.registers().control.background_pattern_table();

    for table in 0..4u16 {
        let base = ppu_mem::NAMETABLE_BASE + table * ppu_mem::NAMETABLE_SIZE;
        let origin_x = (table as usize & 1) * NAMETABLE_COLUMNS * 8;
        let origin_y = (table as usize >> 1) * NAMETABLE_ROWS * 8;

        for row in 0..NAMETABLE_ROWS {
            for column in 0..NAMETABLE_COLUMNS {
                let tile_addr = base + (row * NAMETABLE_COLUMNS + column) as u16;
                let tile = ppu.ciram()[mirroring.ciram_offset(tile_addr)];
                let attr_addr = base
                    + ppu_mem::ATTRIBUTE_OFFSET
                    + ((row / 4) * 8 + column / 4) as u16;
                let attribute = ppu.ciram()[mirroring.ciram_offset(attr_addr)];
                let shift = ((row & 2) << 1) | (column & 2);
                let palette = (attribute >> shift) & 0b11;

                draw_tile(
                    &mut image,
                    ppu,
                    cartridge,
                    pattern_base + tile as u16 * 16,
                    palette,
                    (origin_x + column * 8, origin_y + row * 8),
                );
            }
        }
    }
    image
}

/// 64x64 sheet of the 64 OAM entries, 8 per row. Only the top 8 rows of
/// 8x16 sprites are shown. Flips are applied; transparent pixels show the
/// backdrop color.
pub fn render_sprites(ppu: &Ppu, cartridge: Option<&Cartridge>) -> DebugImage {
    let side = SPRITE_SHEET_COLUMNS * 8;
    let mut image = DebugImage::new(side, side);
    let control = ppu.registers().control;
    let height = control.sprite_height();

    for (index, bytes) in ppu.oam().chunks_exact(Sprite::BYTES).enumerate() {
        let sprite = Sprite::from_bytes(bytes);
        let origin = ((index % SPRITE_SHEET_COLUMNS) * 8, (index / SPRITE_SHEET_COLUMNS) * 8);
        let flip_h = sprite.attributes.contains(SpriteAttributes::FLIP_HORIZONTAL);

        for row in 0..8u8 {
            let addr = sprite.pattern_addr(row, height, control.sprite_pattern_table());
            let low = peek_pattern(cartridge, addr);
            let high = peek_pattern(cartridge, addr + 8);
            for column in 0..8 {
                let column_in_tile = if flip_h { 7 - column } else { column };
                let pixel = pattern_pixel(low, high, column_in_tile);
                let color = palette_color(ppu, 4 + sprite.attributes.palette(), pixel);
                image.put(origin.0 + column, origin.1 + row as usize, color);
            }
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pattern_pixel_reads_msb_first() {
        assert_eq!(pattern_pixel(0b1000_0000, 0b0000_0000, 0), 1);
        assert_eq!(pattern_pixel(0b0000_0000, 0b1000_0000, 0), 2);
        assert_eq!(pattern_pixel(0b0000_0001, 0b0000_0001, 7), 3);
        assert_eq!(pattern_pixel(0b0000_0001, 0b0000_0001, 6), 0);
    }

    #[test]
    fn empty_console_renders_backdrop_sized_images() {
        let ppu = Ppu::new();
        let table = render_pattern_table(&ppu, None, 0, 0);
        assert_eq!((table.width, table.height), (128, 128));
        assert_eq!(table.pixel(127, 127), Some(palette::color(0)));

        let nametables = render_nametables(&ppu, None);
        assert_eq!((nametables.width, nametables.height), (512, 480));
        assert_eq!(nametables.rgb.len(), 512 * 480 * 3);

        let sprites = render_sprites(&ppu, None);
        assert_eq!((sprites.width, sprites.height), (64, 64));
    }
}
