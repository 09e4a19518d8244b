#![allow(dead_code)]

use anyhow::{Context, Result};
use nessie_core::Nes;

pub const PRG_BANK: usize = 0x4000;
pub const CHR_BANK: usize = 0x2000;
/// Where [`nrom`] places the program and points the reset vector.
pub const PROGRAM_START: u16 = 0x8000;

/// Builds a 16 KiB NROM image with CHR RAM, `program` at `$8000` and every
/// vector pointing at it.
pub fn nrom(program: &[u8]) -> Vec<u8> {
    nrom_with(program, &[])
}

/// Like [`nrom`], but also places each `(addr, bytes)` patch in PRG space.
/// Patches are applied last, so they can replace vectors.
pub fn nrom_with(program: &[u8], patches: &[(u16, &[u8])]) -> Vec<u8> {
    let mut image = vec![b'N', b'E', b'S', 0x1A, 1, 0, 0b0000_0001, 0];
    image.resize(16, 0);

    let mut prg = vec![0xEA; PRG_BANK];
    prg[..program.len()].copy_from_slice(program);
    let [lo, hi] = PROGRAM_START.to_le_bytes();
    for vector in [0x3FFA, 0x3FFC, 0x3FFE] {
        prg[vector] = lo;
        prg[vector + 1] = hi;
    }
    for (addr, bytes) in patches {
        let offset = (*addr as usize - PROGRAM_START as usize) % PRG_BANK;
        prg[offset..offset + bytes.len()].copy_from_slice(bytes);
    }
    image.extend_from_slice(&prg);
    image
}

/// Powered-on console running `program` from `$8000`.
pub fn console(program: &[u8]) -> Result<Nes> {
    console_from_image(&nrom(program))
}

pub fn console_from_image(image: &[u8]) -> Result<Nes> {
    let mut nes = Nes::new();
    nes.load_rom_bytes(image, None)
        .context("loading generated NROM image")?;
    Ok(nes)
}

/// Clocks until `done` holds, bailing out after `limit` CPU cycles.
pub fn clock_until<F>(nes: &mut Nes, limit: usize, mut done: F) -> Result<()>
where
    F: FnMut(&Nes) -> bool,
{
    for _ in 0..limit {
        if done(nes) {
            return Ok(());
        }
        nes.clock();
    }
    anyhow::bail!("condition not reached within {limit} cycles")
}
