//! Address constants for the CPU and PPU memory maps.
//!
//! Every module that decodes an address pulls its boundaries from here so the
//! bus dispatch table and the individual devices agree on the same layout.

/// CPU memory map details.
pub mod cpu {
    /// First address of the hardware stack page.
    pub const STACK_PAGE_START: u16 = 0x0100;

    /// NMI vector (`$FFFA/$FFFB`).
    pub const NMI_VECTOR: u16 = 0xFFFA;
    /// Reset vector (`$FFFC/$FFFD`).
    pub const RESET_VECTOR: u16 = 0xFFFC;
    /// IRQ/BRK vector (`$FFFE/$FFFF`).
    pub const IRQ_VECTOR: u16 = 0xFFFE;

    /// Last mirrored internal RAM address visible to the CPU (`$1FFF`).
    pub const INTERNAL_RAM_MIRROR_END: u16 = 0x1FFF;
    /// Size of the CPU internal RAM block (2 KiB mirrored through `$1FFF`).
    pub const INTERNAL_RAM_SIZE: usize = 0x0800;
    /// Mask applied to mirror CPU RAM accesses within `$0000-$1FFF`.
    pub const INTERNAL_RAM_MASK: u16 = (INTERNAL_RAM_SIZE as u16) - 1;

    /// First CPU address mapped to the PPU register mirror.
    pub const PPU_REGISTER_BASE: u16 = 0x2000;
    /// Last CPU address mirrored to the PPU register set.
    pub const PPU_REGISTER_END: u16 = 0x3FFF;

    /// First APU channel register.
    pub const APU_CHANNEL_BASE: u16 = 0x4000;
    /// Last APU channel register (DMC sample length).
    pub const APU_CHANNEL_END: u16 = 0x4013;
    /// OAM DMA trigger (`$4014`).
    pub const OAM_DMA: u16 = 0x4014;
    /// APU status / channel enable (`$4015`).
    pub const APU_STATUS: u16 = 0x4015;
    /// Controller strobe and port 1 read (`$4016`).
    pub const CONTROLLER_PORT_1: u16 = 0x4016;
    /// Port 2 read, frame counter write (`$4017`).
    pub const CONTROLLER_PORT_2: u16 = 0x4017;

    /// First address handled by the cartridge.
    pub const CARTRIDGE_SPACE_BASE: u16 = 0x4020;
    /// PRG RAM window start address (`$6000`).
    pub const PRG_RAM_START: u16 = 0x6000;
    /// PRG RAM window end address (inclusive).
    pub const PRG_RAM_END: u16 = 0x7FFF;
    /// PRG ROM window start address (`$8000`).
    pub const PRG_ROM_START: u16 = 0x8000;
}

/// PPU register layout and VRAM mirror rules.
pub mod ppu {
    /// Mask for decoding register mirrors (`addr & 0x0007`).
    pub const REGISTER_SELECT_MASK: u16 = 0x0007;

    /// Internal nametable RAM. 2 KiB on the console, doubled here so
    /// four-screen boards get their extra 2 KiB without a mapper hook.
    pub const CIRAM_SIZE: usize = 0x1000;

    /// Address mask applied to every PPU bus access (16 KiB space).
    pub const VRAM_MIRROR_MASK: u16 = 0x3FFF;

    /// Palette RAM base address (`$3F00`).
    pub const PALETTE_BASE: u16 = 0x3F00;
    /// Palette RAM byte count.
    pub const PALETTE_RAM_SIZE: usize = 0x20;

    /// Base address of nametable 0.
    pub const NAMETABLE_BASE: u16 = 0x2000;
    /// Size of a single nametable in bytes.
    pub const NAMETABLE_SIZE: u16 = 0x0400;
    /// Offset of the attribute table inside a nametable.
    pub const ATTRIBUTE_OFFSET: u16 = 0x03C0;

    /// Size of a single pattern table (4 KiB).
    pub const PATTERN_TABLE_SIZE: u16 = 0x1000;

    /// Primary OAM byte count.
    pub const OAM_RAM_SIZE: usize = 0x100;

    /// CPU-visible PPU register identifiers.
    #[repr(u16)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub enum Register {
        /// `$2000` - PPUCTRL
        Control = 0x2000,
        /// `$2001` - PPUMASK
        Mask = 0x2001,
        /// `$2002` - PPUSTATUS
        Status = 0x2002,
        /// `$2003` - OAMADDR
        OamAddr = 0x2003,
        /// `$2004` - OAMDATA
        OamData = 0x2004,
        /// `$2005` - PPUSCROLL
        Scroll = 0x2005,
        /// `$2006` - PPUADDR
        Addr = 0x2006,
        /// `$2007` - PPUDATA
        Data = 0x2007,
    }

    impl Register {
        /// Resolves the canonical register for a CPU address in `$2000-$3FFF`.
        pub const fn from_cpu_addr(addr: u16) -> Self {
            match addr & REGISTER_SELECT_MASK {
                0 => Self::Control,
                1 => Self::Mask,
                2 => Self::Status,
                3 => Self::OamAddr,
                4 => Self::OamData,
                5 => Self::Scroll,
                6 => Self::Addr,
                _ => Self::Data,
            }
        }
    }
}

/// APU register addresses that the length-counter stub decodes.
pub mod apu {
    /// `$4000` pulse 1 control (halt bit 5).
    pub const PULSE1_CONTROL: u16 = 0x4000;
    /// `$4003` pulse 1 length load.
    pub const PULSE1_LENGTH: u16 = 0x4003;
    /// `$4004` pulse 2 control.
    pub const PULSE2_CONTROL: u16 = 0x4004;
    /// `$4007` pulse 2 length load.
    pub const PULSE2_LENGTH: u16 = 0x4007;
    /// `$4008` triangle linear counter (halt bit 7).
    pub const TRIANGLE_CONTROL: u16 = 0x4008;
    /// `$400B` triangle length load.
    pub const TRIANGLE_LENGTH: u16 = 0x400B;
    /// `$400C` noise control (halt bit 5).
    pub const NOISE_CONTROL: u16 = 0x400C;
    /// `$400F` noise length load.
    pub const NOISE_LENGTH: u16 = 0x400F;
    /// `$4015` status.
    pub const STATUS: u16 = 0x4015;
    /// `$4017` frame counter.
    pub const FRAME_COUNTER: u16 = 0x4017;
}

#[cfg(test)]
mod tests {
    use super::ppu::Register;

    #[test]
    fn ppu_registers_mirror_every_eight_bytes() {
        assert_eq!(Register::from_cpu_addr(0x2000), Register::Control);
        assert_eq!(Register::from_cpu_addr(0x2008), Register::Control);
        assert_eq!(Register::from_cpu_addr(0x3FFA), Register::Status);
        assert_eq!(Register::from_cpu_addr(0x3FFF), Register::Data);
    }
}
