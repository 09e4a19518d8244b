//! CPU address-space plumbing.

pub mod cpu;
#[cfg(test)]
pub mod mock;
pub mod oam_dma;
pub(crate) mod open_bus;

pub use cpu::CpuBus;
pub use oam_dma::OamDma;
pub(crate) use open_bus::OpenBus;

/// Byte-wide memory as seen by the CPU core.
///
/// Reads take `&mut self` because several devices (PPUSTATUS, PPUDATA,
/// controllers, `$4015`) change state when read. Implementations must never
/// panic on an unmapped address.
pub trait Bus {
    fn read(&mut self, addr: u16) -> u8;

    fn write(&mut self, addr: u16, data: u8);
}

impl<T: Bus + ?Sized> Bus for &mut T {
    fn read(&mut self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&mut self, addr: u16, data: u8) {
        (**self).write(addr, data)
    }
}
