use std::path::Path;

use tracing::info;

use crate::{
    apu::Apu,
    bus::{Bus, CpuBus, OamDma, OpenBus, oam_dma::DmaCycle},
    cartridge::Cartridge,
    controller::Controller,
    cpu::{Cpu, Instruction},
    mem_block::cpu as cpu_ram,
    memory::{cpu as cpu_mem, ppu as ppu_mem},
    ppu::{Ppu, pattern_bus::PatternBus, viewer::DebugImage},
};

pub mod apu;
pub mod bus;
pub mod cartridge;
pub mod config;
pub mod controller;
pub mod cpu;
pub mod error;
pub mod mem_block;
pub mod memory;
pub mod ppu;
pub mod register;
pub mod state;

pub use config::NesConfig;
pub use controller::Button;
pub use error::Error;
pub use state::{CpuSnapshot, PpuSnapshot};

/// PPU dots per CPU cycle on NTSC.
const PPU_DOTS_PER_CPU_CYCLE: usize = 3;
/// Controller reads only drive the low bits; the rest float.
const CONTROLLER_OPEN_BUS_MASK: u8 = 0xE0;
const APU_STATUS_OPEN_BUS_MASK: u8 = 0x20;

/// Where [`Nes::run_until_break`] should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BreakMode {
    /// Run freely; loops stop at frame boundaries only.
    #[default]
    None,
    /// Stop before the CPU fetches its next instruction.
    NextInstruction,
    /// Stop when the PPU moves to another scanline.
    NextScanline,
    /// Stop when the PPU finishes a frame.
    NextFrame,
}

/// Why a run loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// A frame was completed and is ready in [`Nes::frame_buffer`].
    FrameComplete,
    /// The active [`BreakMode`] fired.
    Break(BreakMode),
}

/// Position recorded when a run loop starts, to detect break conditions.
#[derive(Debug, Clone, Copy)]
struct RunOrigin {
    scanline: u16,
    frames: u64,
}

/// The console: CPU, PPU, APU, work RAM, controller port and the cartridge
/// slot, advanced in lockstep one CPU cycle at a time.
#[derive(Debug)]
pub struct Nes {
    cpu: Cpu,
    ppu: Ppu,
    apu: Apu,
    ram: cpu_ram::Ram,
    cartridge: Option<Cartridge>,
    controller: Controller,
    oam_dma: OamDma,
    open_bus: OpenBus,
    config: NesConfig,
    break_mode: BreakMode,
    /// Frames completed since power-on.
    frames: u64,
    /// Set when a frame completes; cleared by [`Nes::grab_frame_done`].
    frame_ready: bool,
}

impl Default for Nes {
    fn default() -> Self {
        Self::new()
    }
}

impl Nes {
    /// Powered-on console with an empty cartridge slot.
    pub fn new() -> Self {
        Self::with_config(NesConfig::default())
    }

    pub fn with_config(config: NesConfig) -> Self {
        let mut nes = Self {
            cpu: Cpu::new(),
            ppu: Ppu::new(),
            apu: Apu::new(),
            ram: cpu_ram::Ram::new(),
            cartridge: None,
            controller: Controller::new(),
            oam_dma: OamDma::new(),
            open_bus: OpenBus::new(),
            config,
            break_mode: BreakMode::None,
            frames: 0,
            frame_ready: false,
        };
        nes.power_on();
        nes
    }

    pub fn config(&self) -> &NesConfig {
        &self.config
    }

    /// Loads an iNES file, attaches its battery save and powers the console
    /// on with it. On error the current cartridge stays in place.
    pub fn load_rom<P: AsRef<Path>>(&mut self, path: P) -> Result<(), Error> {
        let path = path.as_ref();
        let cartridge = cartridge::load_cartridge_from_file(path)?;
        info!("loaded {}", path.display());
        self.insert_with_battery(cartridge, Some(path));
        Ok(())
    }

    /// Loads an in-memory iNES image. `rom_path` only locates the battery
    /// save; pass `None` to run without one.
    pub fn load_rom_bytes(&mut self, bytes: &[u8], rom_path: Option<&Path>) -> Result<(), Error> {
        let cartridge = cartridge::load_cartridge(bytes)?;
        self.insert_with_battery(cartridge, rom_path);
        Ok(())
    }

    fn insert_with_battery(&mut self, mut cartridge: Cartridge, rom_path: Option<&Path>) {
        if let Some(save) = rom_path.and_then(|path| self.config.battery_path_for(path)) {
            cartridge.attach_battery(save, self.config.autoload_battery);
        }
        self.insert_cartridge(cartridge);
    }

    /// Inserts a cartridge and power cycles the console.
    pub fn insert_cartridge(&mut self, cartridge: Cartridge) {
        self.cartridge = Some(cartridge);
        self.power_on();
    }

    /// Removes the cartridge, power cycling the console. The removed
    /// cartridge is returned so callers can still save it.
    pub fn eject_cartridge(&mut self) -> Option<Cartridge> {
        let cartridge = self.cartridge.take();
        self.power_on();
        cartridge
    }

    pub fn cartridge(&self) -> Option<&Cartridge> {
        self.cartridge.as_ref()
    }

    /// Cold start: clears work RAM and every component, then runs the CPU
    /// reset sequence.
    pub fn power_on(&mut self) {
        self.ram.fill(0);
        self.ppu = Ppu::new();
        self.apu = Apu::new();
        self.oam_dma.reset();
        self.open_bus.reset();
        if let Some(cart) = self.cartridge.as_mut() {
            cart.reset();
        }
        self.frames = 0;
        self.frame_ready = false;

        let mut bus = CpuBus::new(
            &mut self.ram,
            &mut self.ppu,
            &mut self.apu,
            self.cartridge.as_mut(),
            &mut self.controller,
            &mut self.oam_dma,
            &mut self.open_bus,
            0,
        );
        self.cpu.power_on(&mut bus);
    }

    /// Warm reset (the console's reset button). Work RAM, VRAM and cartridge
    /// RAM keep their contents.
    pub fn reset(&mut self) {
        self.ppu.reset();
        self.apu.reset();
        self.oam_dma.reset();
        if let Some(cart) = self.cartridge.as_mut() {
            cart.reset();
        }
        self.frame_ready = false;

        let cycle = self.cpu.cycles();
        let mut bus = CpuBus::new(
            &mut self.ram,
            &mut self.ppu,
            &mut self.apu,
            self.cartridge.as_mut(),
            &mut self.controller,
            &mut self.oam_dma,
            &mut self.open_bus,
            cycle,
        );
        self.cpu.reset(&mut bus);
    }

    /// Advances one CPU cycle: the APU, then the CPU or a stolen DMA cycle,
    /// then three PPU dots.
    pub fn clock(&mut self) {
        self.apu.clock();

        let dma_turn = self.oam_dma.is_active()
            || (self.oam_dma.is_pending() && self.cpu.at_instruction_boundary());
        if dma_turn {
            if !self.oam_dma.is_active() {
                self.oam_dma.start(self.cpu.cycles() % 2 == 1);
            }
            self.dma_cycle();
            self.cpu.steal_cycle();
        } else {
            let cycle = self.cpu.cycles();
            let mut bus = CpuBus::new(
                &mut self.ram,
                &mut self.ppu,
                &mut self.apu,
                self.cartridge.as_mut(),
                &mut self.controller,
                &mut self.oam_dma,
                &mut self.open_bus,
                cycle,
            );
            self.cpu.clock(&mut bus);
        }

        for _ in 0..PPU_DOTS_PER_CPU_CYCLE {
            self.ppu.clock(&mut PatternBus::new(self.cartridge.as_mut()));
            if self.ppu.take_nmi() {
                self.cpu.pull_nmi();
            }
            if self.ppu.grab_frame_done() {
                self.frames += 1;
                self.frame_ready = true;
            }
        }

        let cartridge_irq = self.cartridge.as_ref().is_some_and(Cartridge::irq_pending);
        self.cpu.set_irq_line(cartridge_irq || self.apu.irq_pending());
    }

    fn dma_cycle(&mut self) {
        let Some(cycle) = self.oam_dma.next_cycle() else {
            return;
        };
        let cpu_cycle = self.cpu.cycles();
        let mut bus = CpuBus::new(
            &mut self.ram,
            &mut self.ppu,
            &mut self.apu,
            self.cartridge.as_mut(),
            &mut self.controller,
            &mut self.oam_dma,
            &mut self.open_bus,
            cpu_cycle,
        );
        match cycle {
            DmaCycle::Halt => {}
            DmaCycle::Read(addr) => {
                let data = bus.read(addr);
                self.oam_dma.latch(data);
            }
            DmaCycle::Write(data) => bus.write(ppu_mem::Register::OamData as u16, data),
        }
    }

    /// Runs until the next frame completes, or until the active break mode
    /// fires first.
    pub fn run_frame(&mut self) -> StopReason {
        let origin = self.run_origin();
        loop {
            self.clock();
            if let Some(reason) = self.break_hit(origin) {
                return reason;
            }
            if self.frames != origin.frames {
                return StopReason::FrameComplete;
            }
        }
    }

    /// Runs until the active break mode fires. With [`BreakMode::None`] this
    /// is [`Nes::run_frame`].
    pub fn run_until_break(&mut self) -> StopReason {
        if self.break_mode == BreakMode::None {
            return self.run_frame();
        }
        let origin = self.run_origin();
        loop {
            self.clock();
            if let Some(reason) = self.break_hit(origin) {
                return reason;
            }
        }
    }

    fn run_origin(&self) -> RunOrigin {
        RunOrigin {
            scanline: self.ppu.scanline(),
            frames: self.frames,
        }
    }

    fn break_hit(&self, origin: RunOrigin) -> Option<StopReason> {
        let hit = match self.break_mode {
            BreakMode::None => false,
            BreakMode::NextInstruction => {
                self.cpu.at_instruction_boundary() && !self.dma_active()
            }
            BreakMode::NextScanline => self.ppu.scanline() != origin.scanline,
            BreakMode::NextFrame => self.frames != origin.frames,
        };
        hit.then_some(StopReason::Break(self.break_mode))
    }

    pub fn set_break_mode(&mut self, mode: BreakMode) {
        self.break_mode = mode;
    }

    pub fn break_mode(&self) -> BreakMode {
        self.break_mode
    }

    /// Returns `true` once for every completed frame.
    pub fn grab_frame_done(&mut self) -> bool {
        core::mem::take(&mut self.frame_ready)
    }

    /// Latest completed 256x240 frame as packed RGB.
    pub fn frame_buffer(&self) -> &[u8] {
        self.ppu.frame_buffer().front()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn cpu(&self) -> &Cpu {
        &self.cpu
    }

    pub fn ppu(&self) -> &Ppu {
        &self.ppu
    }

    pub fn apu(&self) -> &Apu {
        &self.apu
    }

    pub fn cpu_snapshot(&self) -> CpuSnapshot {
        self.cpu.snapshot()
    }

    pub fn ppu_snapshot(&self) -> PpuSnapshot {
        self.ppu.snapshot()
    }

    /// An OAM DMA is requested or in progress.
    pub fn dma_active(&self) -> bool {
        self.oam_dma.is_pending() || self.oam_dma.is_active()
    }

    /// Reads a byte from the CPU address space without side effects: PPU
    /// and APU status flags, the controller shift register and the open bus
    /// are left untouched.
    pub fn peek_cpu_byte(&self, addr: u16) -> u8 {
        let floating = self.open_bus.sample(self.cpu.cycles());
        match addr {
            0x0000..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[(addr & cpu_mem::INTERNAL_RAM_MASK) as usize]
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => self.ppu.peek_register(addr),
            cpu_mem::APU_STATUS => self.apu.peek_status() | (floating & APU_STATUS_OPEN_BUS_MASK),
            cpu_mem::CONTROLLER_PORT_1 => {
                self.controller.peek() | (floating & CONTROLLER_OPEN_BUS_MASK)
            }
            cpu_mem::CONTROLLER_PORT_2 => 0,
            cpu_mem::CARTRIDGE_SPACE_BASE..=0xFFFF => self
                .cartridge
                .as_ref()
                .and_then(|cart| cart.cpu_read(addr))
                .unwrap_or(floating),
            _ => floating,
        }
    }

    /// Writes through the CPU bus exactly as a store instruction would,
    /// side effects included.
    ///
    /// The write is stamped with the current CPU cycle. SxROM ignores a
    /// serial write that lands within two cycles of the previous one, so
    /// only the first of several pokes to `$8000-$FFFF` made without
    /// clocking in between reaches the shift register.
    pub fn poke(&mut self, addr: u16, data: u8) {
        let cycle = self.cpu.cycles();
        let mut bus = CpuBus::new(
            &mut self.ram,
            &mut self.ppu,
            &mut self.apu,
            self.cartridge.as_mut(),
            &mut self.controller,
            &mut self.oam_dma,
            &mut self.open_bus,
            cycle,
        );
        bus.write(addr, data);
    }

    /// Decodes the instruction at `addr` for a disassembly view.
    pub fn disassemble(&self, addr: u16) -> Instruction {
        Instruction::decode(addr, |a| self.peek_cpu_byte(a))
    }

    /// Updates one button on the port 1 pad.
    pub fn set_button(&mut self, button: Button, pressed: bool) {
        self.controller.set_button(button, pressed);
    }

    /// Replaces every port 1 button at once; bit `n` is [`Button::ALL`]`[n]`.
    pub fn set_buttons(&mut self, mask: u8) {
        self.controller.set_state(mask);
    }

    pub fn render_pattern_table(&self, table: u8, palette: u8) -> DebugImage {
        ppu::viewer::render_pattern_table(&self.ppu, self.cartridge.as_ref(), table, palette)
    }

    pub fn render_nametables(&self) -> DebugImage {
        ppu::viewer::render_nametables(&self.ppu, self.cartridge.as_ref())
    }

    pub fn render_sprites(&self) -> DebugImage {
        ppu::viewer::render_sprites(&self.ppu, self.cartridge.as_ref())
    }

    /// Writes the cartridge's battery RAM to its save file, if it has one.
    pub fn save_battery(&self) -> bool {
        self.cartridge.as_ref().is_some_and(Cartridge::save_battery)
    }
}
