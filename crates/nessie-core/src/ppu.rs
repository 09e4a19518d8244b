//! Picture Processing Unit.
//!
//! The PPU is stepped one dot at a time over a 262-line x 341-dot NTSC frame.
//! Scanlines 0-239 are visible, 240 is idle, 241-260 are vertical blank and
//! 261 is the pre-render line. Background tiles are fetched in 8-dot groups
//! into a pair of shift registers; sprites for the next line are evaluated at
//! dot 257 and their pattern rows fetched during dots 257-320.
//!
//! The PPU never owns the cartridge. Every call that may touch CHR space takes
//! a [`PatternBus`] built by the caller for the duration of that call.

mod background_pipeline;
pub mod frame_buffer;
pub mod palette;
pub mod pattern_bus;
pub mod registers;
pub mod sprite;
mod sprite_pipeline;
pub mod viewer;

use core::fmt;

use crate::{
    mem_block::ppu::{Ciram, OamRam, PaletteRam},
    memory::ppu::{self as ppu_mem, Register as PpuRegister},
};
use background_pipeline::{BgPipeline, TileLatch};
use frame_buffer::{FrameBuffer, SCREEN_WIDTH};
use pattern_bus::PatternBus;
use registers::{Control, Mask, Registers, Status};
use sprite::{Latch, SecondaryOam, Sprite};
use sprite_pipeline::SpritePipeline;

pub const DOTS_PER_SCANLINE: u16 = 341;
pub const SCANLINES_PER_FRAME: u16 = 262;
pub const VISIBLE_SCANLINES: u16 = 240;
pub const VBLANK_SCANLINE: u16 = 241;
pub const PRE_RENDER_SCANLINE: u16 = 261;

/// Last dot of the pre-render line, skipped on odd frames while rendering.
const ODD_FRAME_SKIP_DOT: u16 = 339;
/// OAM byte 2 bits 2-4 are not implemented and read back as zero.
const OAM_ATTRIBUTE_MASK: u8 = 0xE3;
/// Palette RAM stores six bits; the top two come from the I/O latch.
const PALETTE_VALUE_MASK: u8 = 0x3F;

#[derive(Clone, PartialEq, Eq)]
pub struct Ppu {
    registers: Registers,
    ciram: Ciram,
    palette_ram: PaletteRam,
    oam: OamRam,
    /// Sprites for the line being drawn (front) and the next one (back).
    secondary: Latch<SecondaryOam>,
    bg: BgPipeline,
    /// Tile fetched during the current 8-dot group.
    tile: TileLatch,
    sprites: SpritePipeline,
    frame_buffer: FrameBuffer,
    /// Next dot to be processed is `(scanline, dot)`.
    scanline: u16,
    dot: u16,
    frame: u64,
    /// Dots since power-on. Mappers timestamp A12 edges with it.
    master_dot: u64,
    odd_frame: bool,
    nmi_pending: bool,
    /// A `$2002` read landed on the dot before vblank starts.
    suppress_vblank: bool,
    frame_done: bool,
}

impl fmt::Debug for Ppu {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ppu")
            .field("registers", &self.registers)
            .field("scanline", &self.scanline)
            .field("dot", &self.dot)
            .field("frame", &self.frame)
            .field("odd_frame", &self.odd_frame)
            .finish_non_exhaustive()
    }
}

impl Default for Ppu {
    fn default() -> Self {
        Self::new()
    }
}

impl Ppu {
    /// Power-on state: cleared memories, positioned at the start of the
    /// pre-render line.
    pub fn new() -> Self {
        Self {
            registers: Registers::new(),
            ciram: Ciram::new(),
            palette_ram: PaletteRam::new(),
            oam: OamRam::new(),
            secondary: Latch::default(),
            bg: BgPipeline::new(),
            tile: TileLatch::default(),
            sprites: SpritePipeline::new(),
            frame_buffer: FrameBuffer::new(),
            scanline: PRE_RENDER_SCANLINE,
            dot: 0,
            frame: 0,
            master_dot: 0,
            odd_frame: false,
            nmi_pending: false,
            suppress_vblank: false,
            frame_done: false,
        }
    }

    /// Soft reset. PPUCTRL, PPUMASK, the write toggle and the read buffer are
    /// cleared; VRAM, OAM and palette RAM keep their contents.
    pub fn reset(&mut self) {
        self.registers.write_control(0);
        self.registers.mask = Mask::empty();
        self.registers.vram.reset_latch();
        self.registers.read_buffer = 0;
        self.bg.clear();
        self.sprites.clear();
        self.scanline = PRE_RENDER_SCANLINE;
        self.dot = 0;
        self.odd_frame = false;
        self.nmi_pending = false;
        self.suppress_vblank = false;
        self.frame_done = false;
    }

    /// CPU read from `$2000-$3FFF`.
    pub fn cpu_read(&mut self, addr: u16, bus: &mut PatternBus<'_>) -> u8 {
        let value = match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Status => self.read_status(),
            PpuRegister::OamData => self.read_oam_data(),
            PpuRegister::Data => self.read_data(bus),
            _ => self.registers.io_latch,
        };
        self.registers.io_latch = value;
        value
    }

    /// Register value as a debugger would see it, without side effects.
    pub fn peek_register(&self, addr: u16) -> u8 {
        match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Status => self.status_byte(),
            PpuRegister::OamData => self.read_oam_data(),
            PpuRegister::Data => {
                let vram_addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
                if vram_addr >= ppu_mem::PALETTE_BASE {
                    self.read_palette(vram_addr)
                } else {
                    self.registers.read_buffer
                }
            }
            _ => self.registers.io_latch,
        }
    }

    /// CPU write to `$2000-$3FFF`.
    pub fn cpu_write(&mut self, addr: u16, data: u8, bus: &mut PatternBus<'_>) {
        self.registers.io_latch = data;
        match PpuRegister::from_cpu_addr(addr) {
            PpuRegister::Control => {
                let was_enabled = self.registers.control.nmi_enabled();
                self.registers.write_control(data);
                if !was_enabled
                    && self.registers.control.nmi_enabled()
                    && self.registers.status.contains(Status::VERTICAL_BLANK)
                {
                    self.nmi_pending = true;
                }
            }
            PpuRegister::Mask => self.registers.mask = Mask::from_bits_retain(data),
            PpuRegister::Status => {}
            PpuRegister::OamAddr => self.registers.oam_addr = data,
            PpuRegister::OamData => {
                self.oam[self.registers.oam_addr as usize] = data;
                self.registers.oam_addr = self.registers.oam_addr.wrapping_add(1);
            }
            PpuRegister::Scroll => self.registers.vram.write_scroll(data),
            PpuRegister::Addr => self.registers.vram.write_addr(data),
            PpuRegister::Data => {
                let vram_addr = self.registers.vram.v.raw();
                self.write_vram(vram_addr, data, bus);
                self.increment_vram_addr();
            }
        }
    }

    fn status_byte(&self) -> u8 {
        self.registers.status.bits() | (self.registers.io_latch & 0x1F)
    }

    fn read_status(&mut self) -> u8 {
        if self.scanline == VBLANK_SCANLINE && self.dot == 1 {
            self.suppress_vblank = true;
        }
        let value = self.status_byte();
        self.registers.status.remove(Status::VERTICAL_BLANK);
        self.registers.vram.reset_latch();
        value
    }

    fn read_oam_data(&self) -> u8 {
        let index = self.registers.oam_addr as usize;
        let value = self.oam[index];
        if index % Sprite::BYTES == 2 {
            value & OAM_ATTRIBUTE_MASK
        } else {
            value
        }
    }

    fn read_data(&mut self, bus: &mut PatternBus<'_>) -> u8 {
        let vram_addr = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
        let value = if vram_addr >= ppu_mem::PALETTE_BASE {
            // The buffer picks up the nametable byte underneath the palette.
            self.registers.read_buffer = self.read_vram(vram_addr - 0x1000, bus);
            self.read_palette(vram_addr) | (self.registers.io_latch & !PALETTE_VALUE_MASK)
        } else {
            let buffered = self.registers.read_buffer;
            self.registers.read_buffer = self.read_vram(vram_addr, bus);
            buffered
        };
        self.increment_vram_addr();
        value
    }

    fn increment_vram_addr(&mut self) {
        let step = self.registers.control.vram_increment();
        self.registers.vram.v.increment(step);
    }

    fn read_palette(&self, addr: u16) -> u8 {
        self.palette_ram[palette::ram_index(addr)] & PALETTE_VALUE_MASK
    }

    fn read_vram(&self, addr: u16, bus: &mut PatternBus<'_>) -> u8 {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr < ppu_mem::NAMETABLE_BASE {
            bus.read(addr)
        } else if addr < ppu_mem::PALETTE_BASE {
            self.ciram[bus.mirroring().ciram_offset(addr)]
        } else {
            self.read_palette(addr)
        }
    }

    fn write_vram(&mut self, addr: u16, data: u8, bus: &mut PatternBus<'_>) {
        let addr = addr & ppu_mem::VRAM_MIRROR_MASK;
        if addr < ppu_mem::NAMETABLE_BASE {
            bus.write(addr, data);
        } else if addr < ppu_mem::PALETTE_BASE {
            self.ciram[bus.mirroring().ciram_offset(addr)] = data;
        } else {
            self.palette_ram[palette::ram_index(addr)] = data & PALETTE_VALUE_MASK;
        }
    }

    /// Advances one dot.
    pub fn clock(&mut self, bus: &mut PatternBus<'_>) {
        match self.scanline {
            0..VISIBLE_SCANLINES => self.render_dot(bus),
            VISIBLE_SCANLINES if self.dot == 0 => {
                self.frame_buffer.swap();
                self.frame_done = true;
            }
            VBLANK_SCANLINE if self.dot == 1 => self.enter_vblank(),
            PRE_RENDER_SCANLINE => {
                if self.dot == 1 {
                    self.registers.status.remove(
                        Status::VERTICAL_BLANK | Status::SPRITE_ZERO_HIT | Status::SPRITE_OVERFLOW,
                    );
                }
                self.render_dot(bus);
            }
            _ => {}
        }
        self.advance();
    }

    fn enter_vblank(&mut self) {
        if core::mem::take(&mut self.suppress_vblank) {
            return;
        }
        self.registers.status.insert(Status::VERTICAL_BLANK);
        if self.registers.control.nmi_enabled() {
            self.nmi_pending = true;
        }
    }

    fn advance(&mut self) {
        self.master_dot += 1;
        let skip = self.scanline == PRE_RENDER_SCANLINE
            && self.dot == ODD_FRAME_SKIP_DOT
            && self.odd_frame
            && self.registers.mask.rendering_enabled();

        self.dot += 1;
        if skip || self.dot == DOTS_PER_SCANLINE {
            self.dot = 0;
            self.scanline += 1;
            if self.scanline == SCANLINES_PER_FRAME {
                self.scanline = 0;
                self.frame = self.frame.wrapping_add(1);
                self.odd_frame = !self.odd_frame;
            }
        }
    }

    /// Work for one dot of a visible or pre-render line.
    fn render_dot(&mut self, bus: &mut PatternBus<'_>) {
        let rendering = self.registers.mask.rendering_enabled();
        if rendering {
            self.background_fetch(bus);
            self.sprite_fetch(bus);
        } else if self.dot == 257 {
            self.sprites.clear();
        }

        if self.scanline < VISIBLE_SCANLINES && (1..=256).contains(&self.dot) {
            self.draw_pixel(rendering);
        }
    }

    fn background_fetch(&mut self, bus: &mut PatternBus<'_>) {
        let dot = self.dot;
        if (2..=257).contains(&dot) || (321..=337).contains(&dot) {
            self.bg.shift();
            let v = self.registers.vram.v;
            match (dot - 1) % 8 {
                0 => {
                    self.bg.reload(self.tile);
                    self.tile.nametable = self.ciram[bus.mirroring().ciram_offset(v.tile_addr())];
                }
                2 => {
                    let attribute = self.ciram[bus.mirroring().ciram_offset(v.attribute_addr())];
                    self.tile.palette = (attribute >> v.attribute_shift()) & 0b11;
                }
                4 => self.tile.pattern_low = bus.fetch(self.background_pattern_addr(), self.master_dot),
                6 => {
                    let addr = self.background_pattern_addr() + 8;
                    self.tile.pattern_high = bus.fetch(addr, self.master_dot);
                }
                7 => self.registers.vram.v.increment_x(),
                _ => {}
            }
        }

        match dot {
            256 => self.registers.vram.v.increment_y(),
            257 => {
                let t = self.registers.vram.t;
                self.registers.vram.v.copy_horizontal(t);
            }
            280..=304 if self.scanline == PRE_RENDER_SCANLINE => {
                let t = self.registers.vram.t;
                self.registers.vram.v.copy_vertical(t);
            }
            _ => {}
        }
    }

    fn background_pattern_addr(&self) -> u16 {
        self.registers.control.background_pattern_table()
            + self.tile.nametable as u16 * 16
            + self.registers.vram.v.fine_y() as u16
    }

    fn sprite_fetch(&mut self, bus: &mut PatternBus<'_>) {
        match self.dot {
            257 => self.evaluate_sprites(),
            258..=320 => {
                self.fetch_sprite_row(((self.dot - 257) / 8) as usize, bus);
                if self.dot == 320 {
                    self.secondary.swap();
                    self.sprites.load(self.secondary.front());
                }
            }
            _ => {}
        }
    }

    /// Fills the back secondary OAM with the sprites covering the next line.
    fn evaluate_sprites(&mut self) {
        let height = self.registers.control.sprite_height();
        let next = self.secondary.back_mut();
        next.clear();
        if self.scanline == PRE_RENDER_SCANLINE {
            return;
        }

        for (index, bytes) in self.oam.chunks_exact(Sprite::BYTES).enumerate() {
            let sprite = Sprite::from_bytes(bytes);
            let Some(row) = sprite.row_on(self.scanline, height) else {
                continue;
            };
            if !next.push(sprite, row) {
                self.registers.status.insert(Status::SPRITE_OVERFLOW);
                break;
            }
            if index == 0 {
                next.sprite0 = true;
            }
        }
    }

    /// Pattern fetch for secondary OAM `slot`: low plane on the 6th dot of the
    /// slot, high plane on the 8th. Empty slots fetch tile `$FF` so mappers
    /// still see the address bus toggle.
    fn fetch_sprite_row(&mut self, slot: usize, bus: &mut PatternBus<'_>) {
        let step = self.dot - 257;
        let plane = match step % 8 {
            5 => 0,
            7 => 1,
            _ => return,
        };
        let control = self.registers.control;
        let height = control.sprite_height();
        let (sprite, row) = self.secondary.back().get(slot).unwrap_or((
            Sprite {
                tile: 0xFF,
                ..Sprite::default()
            },
            0,
        ));
        let addr = sprite.pattern_addr(row, height, control.sprite_pattern_table()) + plane as u16 * 8;
        let value = bus.fetch(addr, self.master_dot);
        self.secondary.back_mut().set_pattern(slot, plane, value);
    }

    fn draw_pixel(&mut self, rendering: bool) {
        let x = self.dot - 1;
        let mask = self.registers.mask;

        let index = if rendering {
            let sprite = self.sprites.sample_and_shift();
            let (bg_palette, bg_pixel) = if mask.background_visible_at(x) {
                self.bg.sample(self.registers.vram.x)
            } else {
                (0, 0)
            };
            let sprite_visible = sprite.color != 0 && mask.sprites_visible_at(x);

            if sprite.sprite0 && sprite_visible && bg_pixel != 0 && x != 255 {
                self.registers.status.insert(Status::SPRITE_ZERO_HIT);
            }

            let bg_index = (bg_palette << 2) | bg_pixel;
            let sprite_index = 0x10 | (sprite.palette << 2) | sprite.color;
            match (bg_pixel != 0, sprite_visible) {
                (false, false) => 0,
                (false, true) => sprite_index,
                (true, false) => bg_index,
                (true, true) if sprite.behind_background => bg_index,
                (true, true) => sprite_index,
            }
        } else {
            // With rendering off the backdrop follows v when it points into
            // palette RAM.
            let v = self.registers.vram.v.raw() & ppu_mem::VRAM_MIRROR_MASK;
            if v >= ppu_mem::PALETTE_BASE { (v & 0x1F) as u8 } else { 0 }
        };

        let value = self.read_palette(ppu_mem::PALETTE_BASE + index as u16) & mask.palette_mask();
        debug_assert!((x as usize) < SCREEN_WIDTH);
        self.frame_buffer
            .write_pixel(x as usize, self.scanline as usize, palette::color(value));
    }

    /// Returns and clears the NMI request raised since the last call.
    pub fn take_nmi(&mut self) -> bool {
        core::mem::take(&mut self.nmi_pending)
    }

    /// Returns `true` once per completed frame.
    pub fn grab_frame_done(&mut self) -> bool {
        core::mem::take(&mut self.frame_done)
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.frame_buffer
    }

    pub fn registers(&self) -> &Registers {
        &self.registers
    }

    pub fn control(&self) -> Control {
        self.registers.control
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn dot(&self) -> u16 {
        self.dot
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn master_dot(&self) -> u64 {
        self.master_dot
    }

    pub fn is_odd_frame(&self) -> bool {
        self.odd_frame
    }

    pub fn oam(&self) -> &[u8] {
        &self.oam
    }

    pub fn palette_ram(&self) -> &[u8] {
        &self.palette_ram
    }

    pub fn ciram(&self) -> &[u8] {
        &self.ciram
    }

    /// Sprites selected for the line currently being drawn.
    pub fn line_sprites(&self) -> &SecondaryOam {
        self.secondary.front()
    }
}
