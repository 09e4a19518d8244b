use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, info, warn};

use crate::{
    cartridge::{
        header::{Header, NES_HEADER_LEN, PRG_BANK_SIZE, PRG_RAM_UNIT, TRAINER_LEN},
        mapper::chr_storage::ChrStorage,
        memory_map::{BankSpace, MemoryMap},
    },
    error::Error,
    memory::cpu as cpu_mem,
};

pub mod battery;
pub mod header;
pub mod mapper;
pub mod memory_map;

pub use mapper::Mapper;

/// ROM and RAM physically present on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartridgeMemory {
    pub prg_rom: Box<[u8]>,
    /// `$6000-$7FFF` work RAM. Empty when the board has none.
    pub prg_ram: Box<[u8]>,
    pub chr: ChrStorage,
}

impl CartridgeMemory {
    fn prg_ram_offset(&self, addr: u16) -> Option<usize> {
        if self.prg_ram.is_empty() {
            None
        } else {
            Some((addr - cpu_mem::PRG_RAM_START) as usize % self.prg_ram.len())
        }
    }

    pub fn read_prg_ram(&self, addr: u16) -> Option<u8> {
        self.prg_ram_offset(addr).map(|offset| self.prg_ram[offset])
    }

    pub fn write_prg_ram(&mut self, addr: u16, data: u8) -> bool {
        match self.prg_ram_offset(addr) {
            Some(offset) => {
                self.prg_ram[offset] = data;
                true
            }
            None => false,
        }
    }
}

/// A loaded game: header, board memory and the mapper that banks it.
#[derive(Debug, Clone)]
pub struct Cartridge {
    header: Header,
    memory: CartridgeMemory,
    mapper: Mapper,
    battery_path: Option<PathBuf>,
}

impl Cartridge {
    pub fn new(header: Header, prg_rom: Box<[u8]>, chr_rom: Box<[u8]>) -> Result<Self, Error> {
        let prg_ram_size = header.prg_ram_size.max(header.prg_nvram_size);
        let prg_ram = if prg_ram_size > 0 {
            vec![0; PRG_RAM_UNIT].into_boxed_slice()
        } else {
            Box::default()
        };
        let memory = CartridgeMemory {
            prg_rom,
            prg_ram,
            chr: ChrStorage::select(&header, chr_rom),
        };
        let mapper = Mapper::from_header(&header, &memory)?;

        info!(
            mapper = mapper.name(),
            prg_kib = memory.prg_rom.len() / 1024,
            chr_kib = memory.chr.len() / 1024,
            chr_ram = memory.chr.is_ram(),
            mirroring = ?header.mirroring,
            battery = header.battery_backed_ram,
            "cartridge loaded"
        );

        Ok(Self {
            header,
            memory,
            mapper,
            battery_path: None,
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn mapper(&self) -> &Mapper {
        &self.mapper
    }

    pub fn memory(&self) -> &CartridgeMemory {
        &self.memory
    }

    /// Restores mapper registers to their power-on state. RAM is kept.
    pub fn reset(&mut self) {
        self.mapper.reset(&self.memory);
    }

    pub fn cpu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.on_cpu_read(&self.memory, addr)
    }

    pub fn cpu_write(&mut self, addr: u16, data: u8, cpu_cycle: u64) -> bool {
        self.mapper
            .on_cpu_write(&mut self.memory, addr, data, cpu_cycle)
    }

    pub fn ppu_read(&self, addr: u16) -> Option<u8> {
        self.mapper.on_ppu_read(&self.memory, addr)
    }

    pub fn ppu_write(&mut self, addr: u16, data: u8) -> bool {
        self.mapper.on_ppu_write(&mut self.memory, addr, data)
    }

    /// Pattern fetch issued by the rendering pipeline.
    pub fn ppu_fetch(&mut self, addr: u16, ppu_cycle: u64) -> Option<u8> {
        self.mapper.on_ppu_fetch(addr, ppu_cycle);
        self.ppu_read(addr)
    }

    /// Effective nametable mirroring, with the mapper's override applied.
    pub fn mirroring(&self) -> header::Mirroring {
        self.mapper.mirroring().unwrap_or(self.header.mirroring)
    }

    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_pending()
    }

    pub fn bank_view(&self, space: BankSpace) -> &MemoryMap {
        self.mapper.bank_view(space)
    }

    /// Raw bytes of 16 KiB PRG bank `index`.
    pub fn prg_bank(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(PRG_BANK_SIZE)?;
        let end = (start + PRG_BANK_SIZE).min(self.memory.prg_rom.len());
        self.memory.prg_rom.get(start..end)
    }

    pub fn prg_bank_count(&self) -> usize {
        self.memory.prg_rom.len().div_ceil(PRG_BANK_SIZE)
    }

    pub fn prg_ram(&self) -> &[u8] {
        &self.memory.prg_ram
    }

    pub fn has_battery(&self) -> bool {
        self.header.battery_backed_ram && !self.memory.prg_ram.is_empty()
    }

    pub fn battery_path(&self) -> Option<&Path> {
        self.battery_path.as_deref()
    }

    /// Associates a save file and, if present, loads it into PRG RAM.
    ///
    /// Read failures are logged and leave RAM zeroed.
    pub fn attach_battery(&mut self, path: PathBuf, autoload: bool) {
        if !self.has_battery() {
            return;
        }
        if autoload {
            match battery::load(&path, &mut self.memory.prg_ram) {
                Ok(true) => info!("loaded battery save {}", path.display()),
                Ok(false) => debug!("no battery save at {}", path.display()),
                Err(err) => {
                    warn!("failed to read battery save {}: {err}", path.display());
                    self.memory.prg_ram.fill(0);
                }
            }
        }
        self.battery_path = Some(path);
    }

    /// Writes PRG RAM to the attached save file. Returns whether a file was
    /// written; failures are logged only.
    pub fn save_battery(&self) -> bool {
        let Some(path) = self.battery_path.as_deref().filter(|_| self.has_battery()) else {
            return false;
        };
        match battery::save(path, &self.memory.prg_ram) {
            Ok(()) => {
                debug!("wrote battery save {}", path.display());
                true
            }
            Err(err) => {
                warn!("failed to write battery save {}: {err}", path.display());
                false
            }
        }
    }
}

/// Load a cartridge from an in-memory iNES image.
pub fn load_cartridge(bytes: &[u8]) -> Result<Cartridge, Error> {
    let header_bytes = bytes.get(..NES_HEADER_LEN).ok_or(Error::TooShort {
        actual: bytes.len(),
    })?;
    let header = Header::parse(header_bytes)?;

    let mut cursor = NES_HEADER_LEN;
    if header.trainer_present {
        section(bytes, &mut cursor, TRAINER_LEN, "trainer")?;
    }
    let prg_rom = section(bytes, &mut cursor, header.prg_rom_size, "PRG ROM")?;
    let chr_rom = section(bytes, &mut cursor, header.chr_rom_size, "CHR ROM")?;

    Cartridge::new(header, prg_rom.into(), chr_rom.into())
}

/// Load a cartridge directly from disk.
pub fn load_cartridge_from_file<P>(path: P) -> Result<Cartridge, Error>
where
    P: AsRef<Path>,
{
    let bytes = fs::read(path)?;
    load_cartridge(&bytes)
}

fn section<'a>(
    bytes: &'a [u8],
    cursor: &mut usize,
    len: usize,
    name: &'static str,
) -> Result<&'a [u8], Error> {
    let start = *cursor;
    let available = bytes.len().saturating_sub(start);
    let slice = start
        .checked_add(len)
        .and_then(|end| bytes.get(start..end))
        .ok_or(Error::SectionTooShort {
            section: name,
            expected: len,
            actual: available,
        })?;
    *cursor += len;
    Ok(slice)
}
