//! iNES / NES 2.0 header parsing.
//!
//! The first 16 bytes of every `.nes` image describe how much PRG/CHR data
//! follows, which mapper the board uses and how the nametables are wired.
//! [`Header::parse`] understands both the original iNES layout and the NES 2.0
//! extension and folds them into one [`Header`].

use bitflags::bitflags;

use crate::error::Error;

const NES_MAGIC: &[u8; 4] = b"NES\x1A";

/// Size of the fixed iNES header in bytes.
pub const NES_HEADER_LEN: usize = 16;
/// Size of the optional trainer block that sits between header and PRG.
pub const TRAINER_LEN: usize = 512;
/// PRG ROM bank unit (16 KiB).
pub const PRG_BANK_SIZE: usize = 16 * 1024;
/// CHR ROM bank unit (8 KiB).
pub const CHR_BANK_SIZE: usize = 8 * 1024;
/// PRG RAM unit used by iNES byte 8 (8 KiB).
pub const PRG_RAM_UNIT: usize = 8 * 1024;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags6: u8 {
        const MIRRORING        = 0b0000_0001;
        const BATTERY          = 0b0000_0010;
        const TRAINER          = 0b0000_0100;
        const FOUR_SCREEN      = 0b0000_1000;
        const MAPPER_LOW_MASK  = 0b1111_0000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags7: u8 {
        const VS_UNISYSTEM     = 0b0000_0001;
        const PLAYCHOICE_10    = 0b0000_0010;
        const NES2_DETECTION   = 0b0000_1100;
        const MAPPER_HIGH_MASK = 0b1111_0000;
    }
}

/// Nametable mirroring mode.
///
/// `FourScreen` is the "no mirroring" case where every logical nametable has
/// its own kilobyte of RAM. The single-screen variants are only reachable at
/// runtime through mapper registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mirroring {
    /// `$2000 = $2400`, `$2800 = $2C00`.
    Horizontal,
    /// `$2000 = $2800`, `$2400 = $2C00`.
    Vertical,
    /// All four nametables show the first kilobyte.
    SingleLower,
    /// All four nametables show the second kilobyte.
    SingleUpper,
    FourScreen,
}

impl Mirroring {
    /// Maps a nametable address (`$2000-$3EFF`) to an offset in nametable RAM.
    pub fn ciram_offset(self, addr: u16) -> usize {
        let addr = addr & 0x0FFF;
        let table = addr / 0x0400;
        let offset = addr & 0x03FF;
        let physical = match self {
            Mirroring::Horizontal => table >> 1,
            Mirroring::Vertical => table & 1,
            Mirroring::SingleLower => 0,
            Mirroring::SingleUpper => 1,
            Mirroring::FourScreen => table,
        };
        (physical * 0x0400 + offset) as usize
    }
}

/// Identifies the header flavour encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RomFormat {
    /// The original iNES 1.0 specification.
    INes,
    /// NES 2.0 with extended sizing and metadata fields.
    Nes20,
    /// Rare prototypes that pre-date the iNES standard.
    Archaic,
}

impl RomFormat {
    fn from_flags7(flags7: Flags7) -> Self {
        match (flags7.bits() >> 2) & 0b11 {
            0b10 => Self::Nes20,
            0b00 => Self::INes,
            _ => Self::Archaic,
        }
    }
}

/// Video timing hints embedded in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TvSystem {
    Ntsc,
    Pal,
    /// Region free: runs on either timing.
    Dual,
    /// Hybrid timing used by some Famiclones.
    Dendy,
}

/// Parsed cartridge header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Header {
    pub format: RomFormat,
    /// Mapper ID (0 == NROM, 1 == SxROM, 4 == TxROM, ...).
    pub mapper: u16,
    /// NES 2.0 submapper value. Always 0 for iNES files.
    pub submapper: u8,
    pub mirroring: Mirroring,
    /// Cartridge keeps PRG RAM contents when powered off.
    pub battery_backed_ram: bool,
    /// A 512 byte trainer sits between the header and PRG data.
    pub trainer_present: bool,
    /// Amount of PRG ROM in bytes.
    pub prg_rom_size: usize,
    /// Amount of CHR ROM in bytes. Zero means the board carries CHR RAM.
    pub chr_rom_size: usize,
    /// Volatile PRG RAM size. iNES files storing 0 get 8 KiB.
    pub prg_ram_size: usize,
    /// Battery backed PRG RAM size.
    pub prg_nvram_size: usize,
    /// CHR RAM size on the PPU side.
    pub chr_ram_size: usize,
    pub vs_unisystem: bool,
    pub playchoice_10: bool,
    pub tv_system: TvSystem,
}

impl Header {
    /// Parse a header from the first 16 bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < NES_HEADER_LEN {
            return Err(Error::TooShort {
                actual: bytes.len(),
            });
        }

        if &bytes[0..4] != NES_MAGIC {
            return Err(Error::InvalidMagic);
        }

        let flags6 = Flags6::from_bits_truncate(bytes[6]);
        let flags7 = Flags7::from_bits_truncate(bytes[7]);

        match RomFormat::from_flags7(flags7) {
            RomFormat::INes => Self::parse_ines(bytes, flags6, flags7),
            RomFormat::Nes20 => Self::parse_nes20(bytes, flags6, flags7),
            format @ RomFormat::Archaic => Err(Error::UnsupportedFormat(format)),
        }
    }

    /// Number of 16 KiB PRG banks.
    pub fn prg_banks(&self) -> usize {
        self.prg_rom_size.div_ceil(PRG_BANK_SIZE)
    }

    /// Number of 8 KiB CHR ROM banks (0 for CHR RAM boards).
    pub fn chr_banks(&self) -> usize {
        self.chr_rom_size.div_ceil(CHR_BANK_SIZE)
    }

    fn parse_ines(bytes: &[u8], flags6: Flags6, flags7: Flags7) -> Result<Self, Error> {
        let reserved = bytes[9] & 0b1111_1110;
        if reserved != 0 {
            return Err(Error::ReservedBitsSet(bytes[9]));
        }

        let prg_rom_units = bytes[4] as usize;
        let chr_rom_units = bytes[5] as usize;
        // Header stores 0 for "assume 8 KiB".
        let prg_ram_units = bytes[8].max(1) as usize;
        let battery = flags6.contains(Flags6::BATTERY);

        Ok(Self {
            format: RomFormat::INes,
            mapper: combine_mapper(flags6, flags7, 0),
            submapper: 0,
            mirroring: resolve_mirroring(flags6),
            battery_backed_ram: battery,
            trainer_present: flags6.contains(Flags6::TRAINER),
            prg_rom_size: prg_rom_units * PRG_BANK_SIZE,
            chr_rom_size: chr_rom_units * CHR_BANK_SIZE,
            prg_ram_size: prg_ram_units * PRG_RAM_UNIT,
            prg_nvram_size: if battery {
                prg_ram_units * PRG_RAM_UNIT
            } else {
                0
            },
            chr_ram_size: if chr_rom_units == 0 { CHR_BANK_SIZE } else { 0 },
            vs_unisystem: flags7.contains(Flags7::VS_UNISYSTEM),
            playchoice_10: flags7.contains(Flags7::PLAYCHOICE_10),
            tv_system: if bytes[9] & 0b1 == 0 {
                TvSystem::Ntsc
            } else {
                TvSystem::Pal
            },
        })
    }

    fn parse_nes20(bytes: &[u8], flags6: Flags6, flags7: Flags7) -> Result<Self, Error> {
        let prg_msb = bytes[9] & 0x0F;
        let chr_msb = (bytes[9] >> 4) & 0x0F;
        let prg_rom_size = decode_nes2_rom_size(bytes[4], prg_msb, PRG_BANK_SIZE);
        let chr_rom_size = decode_nes2_rom_size(bytes[5], chr_msb, CHR_BANK_SIZE);

        let prg_ram_size = decode_nes2_ram_size(bytes[10] & 0x0F);
        let prg_nvram_size = decode_nes2_ram_size(bytes[10] >> 4);
        let chr_ram_size = decode_nes2_ram_size(bytes[11] & 0x0F);
        let chr_nvram_size = decode_nes2_ram_size(bytes[11] >> 4);

        let console_type = flags7.bits() & 0b11;
        let tv_system = match bytes[12] & 0b11 {
            0b00 => TvSystem::Ntsc,
            0b01 => TvSystem::Pal,
            0b10 => TvSystem::Dual,
            _ => TvSystem::Dendy,
        };

        Ok(Self {
            format: RomFormat::Nes20,
            mapper: combine_mapper(flags6, flags7, bytes[8] & 0x0F),
            submapper: bytes[8] >> 4,
            mirroring: resolve_mirroring(flags6),
            battery_backed_ram: prg_nvram_size != 0
                || chr_nvram_size != 0
                || flags6.contains(Flags6::BATTERY),
            trainer_present: flags6.contains(Flags6::TRAINER),
            prg_rom_size,
            chr_rom_size,
            prg_ram_size,
            prg_nvram_size,
            chr_ram_size: chr_ram_size + chr_nvram_size,
            vs_unisystem: console_type == 1,
            playchoice_10: console_type == 2,
            tv_system,
        })
    }
}

fn resolve_mirroring(flags6: Flags6) -> Mirroring {
    if flags6.contains(Flags6::FOUR_SCREEN) {
        Mirroring::FourScreen
    } else if flags6.contains(Flags6::MIRRORING) {
        Mirroring::Vertical
    } else {
        Mirroring::Horizontal
    }
}

fn combine_mapper(flags6: Flags6, flags7: Flags7, upper: u8) -> u16 {
    let lower = (flags6.bits() >> 4) as u16;
    let middle = (flags7.bits() & Flags7::MAPPER_HIGH_MASK.bits()) as u16;
    let upper = (upper as u16) << 8;
    lower | middle | upper
}

fn decode_nes2_rom_size(lower: u8, upper_nibble: u8, unit: usize) -> usize {
    if upper_nibble != 0x0F {
        (((upper_nibble as usize) << 8) | lower as usize).saturating_mul(unit)
    } else {
        // Exponent-multiplier form: 2^E * (MM * 2 + 1).
        let exponent = (lower >> 2) as u32;
        let multiplier = ((lower & 0b11) as usize) * 2 + 1;
        1usize
            .checked_shl(exponent)
            .unwrap_or(usize::MAX)
            .saturating_mul(multiplier)
    }
}

fn decode_nes2_ram_size(nibble: u8) -> usize {
    if nibble == 0 { 0 } else { 64usize << nibble }
}
