use thiserror::Error;

use crate::cartridge::header::{NES_HEADER_LEN, RomFormat};

/// Failures raised while turning a ROM image into a [`Cartridge`](crate::cartridge::Cartridge).
///
/// These are only produced at load time. Once a cartridge is inserted the
/// emulator never surfaces an error from its stepping APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Provided buffer is shorter than the 16-byte header.
    #[error("header expected {NES_HEADER_LEN} bytes, got {actual}")]
    TooShort { actual: usize },
    /// Magic number ("NES<EOF>") is missing.
    #[error("missing NES magic bytes")]
    InvalidMagic,
    /// Header advertises a format we do not implement.
    #[error("unsupported iNES header format: {0:?}")]
    UnsupportedFormat(RomFormat),
    /// iNES 1.0 byte 9 carries reserved bits that must be zero.
    #[error("reserved header bits set in byte 9: {0:#04X}")]
    ReservedBitsSet(u8),
    /// Mapper number outside NROM / SxROM / TxROM.
    #[error("unsupported mapper {0}")]
    UnsupportedMapper(u16),
    /// A ROM section (trainer/PRG/CHR) is shorter than advertised.
    #[error("{section} section expected {expected} bytes, got {actual}")]
    SectionTooShort {
        section: &'static str,
        expected: usize,
        actual: usize,
    },
    /// I/O errors raised while reading ROMs from disk.
    #[error("i/o error while reading cartridge: {0}")]
    Io(#[from] std::io::Error),
}
