use tracing::trace;

use crate::{
    apu::Apu,
    bus::{Bus, OamDma, OpenBus},
    cartridge::Cartridge,
    controller::Controller,
    mem_block::cpu as cpu_ram,
    memory::cpu as cpu_mem,
    ppu::{Ppu, pattern_bus::PatternBus},
};

/// Controller reads only drive bit 0 (bits 1-4 are expansion port lines we
/// leave low); the top three bits float.
const CONTROLLER_OPEN_BUS_MASK: u8 = 0xE0;
/// `$4015` does not drive bit 5.
const APU_STATUS_OPEN_BUS_MASK: u8 = 0x20;

/// CPU-visible bus that bridges the core to RAM, the PPU, the APU, the
/// controller port and the cartridge mapper space. It borrows the hardware
/// from the owning [`Nes`](crate::Nes) for the duration of one CPU cycle.
#[derive(Debug)]
pub struct CpuBus<'a> {
    ram: &'a mut cpu_ram::Ram,
    ppu: &'a mut Ppu,
    apu: &'a mut Apu,
    cartridge: Option<&'a mut Cartridge>,
    controller: &'a mut Controller,
    oam_dma: &'a mut OamDma,
    open_bus: &'a mut OpenBus,
    /// CPU cycle this access happens on.
    cycle: u64,
}

impl<'a> CpuBus<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        ram: &'a mut cpu_ram::Ram,
        ppu: &'a mut Ppu,
        apu: &'a mut Apu,
        cartridge: Option<&'a mut Cartridge>,
        controller: &'a mut Controller,
        oam_dma: &'a mut OamDma,
        open_bus: &'a mut OpenBus,
        cycle: u64,
    ) -> Self {
        Self {
            ram,
            ppu,
            apu,
            cartridge,
            controller,
            oam_dma,
            open_bus,
            cycle,
        }
    }

    fn floating(&self, addr: u16) -> u8 {
        let value = self.open_bus.sample(self.cycle);
        trace!(addr = format_args!("{addr:04X}"), value, "open bus read");
        value
    }
}

impl Bus for CpuBus<'_> {
    fn read(&mut self, addr: u16) -> u8 {
        let value = match addr {
            0x0000..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[(addr & cpu_mem::INTERNAL_RAM_MASK) as usize]
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => {
                let mut pattern = PatternBus::new(self.cartridge.as_deref_mut());
                self.ppu.cpu_read(addr, &mut pattern)
            }
            cpu_mem::APU_STATUS => {
                let floating = self.open_bus.sample(self.cycle) & APU_STATUS_OPEN_BUS_MASK;
                // Not latched: the status read only reaches the CPU's internal bus.
                return self.apu.read_status() | floating;
            }
            cpu_mem::CONTROLLER_PORT_1 => {
                self.controller.read()
                    | (self.open_bus.sample(self.cycle) & CONTROLLER_OPEN_BUS_MASK)
            }
            // Port 2 is not connected.
            cpu_mem::CONTROLLER_PORT_2 => 0,
            cpu_mem::CARTRIDGE_SPACE_BASE..=0xFFFF => {
                match self.cartridge.as_deref().and_then(|cart| cart.cpu_read(addr)) {
                    Some(value) => value,
                    None => self.floating(addr),
                }
            }
            // Write-only APU registers, $4014 and the $4018-$401F test range.
            _ => self.floating(addr),
        };
        self.open_bus.latch(value, self.cycle);
        value
    }

    fn write(&mut self, addr: u16, data: u8) {
        self.open_bus.latch(data, self.cycle);
        match addr {
            0x0000..=cpu_mem::INTERNAL_RAM_MIRROR_END => {
                self.ram[(addr & cpu_mem::INTERNAL_RAM_MASK) as usize] = data;
            }
            cpu_mem::PPU_REGISTER_BASE..=cpu_mem::PPU_REGISTER_END => {
                let mut pattern = PatternBus::new(self.cartridge.as_deref_mut());
                self.ppu.cpu_write(addr, data, &mut pattern);
            }
            cpu_mem::APU_CHANNEL_BASE..=cpu_mem::APU_CHANNEL_END
            | cpu_mem::APU_STATUS
            | cpu_mem::CONTROLLER_PORT_2 => self.apu.cpu_write(addr, data),
            cpu_mem::OAM_DMA => self.oam_dma.request(data),
            cpu_mem::CONTROLLER_PORT_1 => self.controller.write_strobe(data),
            cpu_mem::CARTRIDGE_SPACE_BASE..=0xFFFF => {
                if let Some(cart) = self.cartridge.as_deref_mut() {
                    cart.cpu_write(addr, data, self.cycle);
                }
            }
            _ => {}
        }
    }
}
