mod common;

use anyhow::Result;
use common::{PRG_BANK, PROGRAM_START, console, console_from_image, nrom_with};
use nessie_core::{
    BreakMode, Button, Nes, StopReason,
    ppu::frame_buffer::{BYTES_PER_PIXEL, SCREEN_HEIGHT, SCREEN_WIDTH},
};

/// `JMP $8000`
const SPIN: [u8; 3] = [0x4C, 0x00, 0x80];

#[test]
fn reset_loads_vector_and_charges_seven_cycles() -> Result<()> {
    let nes = console(&SPIN)?;
    let cpu = nes.cpu_snapshot();
    assert_eq!(cpu.pc, PROGRAM_START);
    assert_eq!(cpu.s, 0xFD);
    assert_eq!(cpu.cycles, 7);
    assert_eq!(cpu.to_string(), "PC:8000 A:00 X:00 Y:00 P:24 SP:FD CYC:7");
    Ok(())
}

#[test]
fn nrom_128_mirrors_prg_into_upper_half() -> Result<()> {
    let nes = console(&[0xA9, 0x42, 0x4C, 0x02, 0x80])?;
    for offset in 0..5 {
        assert_eq!(
            nes.peek_cpu_byte(0x8000 + offset),
            nes.peek_cpu_byte(0xC000 + offset)
        );
    }
    assert_eq!(nes.peek_cpu_byte(0x8001), 0x42);
    Ok(())
}

#[test]
fn work_ram_mirrors_every_two_kib() -> Result<()> {
    let mut nes = console(&SPIN)?;
    nes.poke(0x0123, 0x5A);
    for mirror in [0x0923, 0x1123, 0x1923] {
        assert_eq!(nes.peek_cpu_byte(mirror), 0x5A);
    }
    Ok(())
}

#[test]
fn program_reads_controller_through_the_bus() -> Result<()> {
    #[rustfmt::skip]
    let program = [
        0xA9, 0x01,       // LDA #$01
        0x8D, 0x16, 0x40, // STA $4016
        0xA9, 0x00,       // LDA #$00
        0x8D, 0x16, 0x40, // STA $4016
        0xAD, 0x16, 0x40, // LDA $4016 (A)
        0x85, 0x10,       // STA $10
        0xAD, 0x16, 0x40, // LDA $4016 (B)
        0x85, 0x11,       // STA $11
        0xAD, 0x16, 0x40, // LDA $4016 (Select)
        0x85, 0x12,       // STA $12
        0x4C, 0x19, 0x80, // JMP *
    ];
    let mut nes = console(&program)?;
    nes.set_button(Button::A, true);
    nes.set_button(Button::Select, true);

    for _ in 0..100 {
        nes.clock();
    }

    assert_eq!(nes.peek_cpu_byte(0x0010) & 1, 1);
    assert_eq!(nes.peek_cpu_byte(0x0011) & 1, 0);
    assert_eq!(nes.peek_cpu_byte(0x0012) & 1, 1);
    // The upper bits float with the last value on the bus.
    assert_eq!(nes.peek_cpu_byte(0x0010) & 0xE0, 0x40);
    Ok(())
}

#[test]
fn second_controller_port_reads_zero() -> Result<()> {
    #[rustfmt::skip]
    let program = [
        0xA9, 0xFF,       // LDA #$FF
        0xAD, 0x17, 0x40, // LDA $4017
        0x85, 0x10,       // STA $10
        0x4C, 0x07, 0x80, // JMP *
    ];
    let mut nes = console(&program)?;
    nes.set_buttons(0xFF);
    nes.poke(0x4016, 1);
    nes.poke(0x4016, 0);
    nes.poke(0x0010, 0xAA);

    for _ in 0..50 {
        nes.clock();
    }

    assert_eq!(nes.peek_cpu_byte(0x0010), 0x00);
    assert_eq!(nes.peek_cpu_byte(0x4017), 0x00);
    Ok(())
}

/// 32 KiB SxROM image: bank 0 starts with `$EA`, bank 1 (fixed at `$C000`)
/// spins at `$C000` and holds the vectors.
fn sxrom() -> Vec<u8> {
    let mut image = vec![b'N', b'E', b'S', 0x1A, 2, 0, 0x10, 0];
    image.resize(16, 0);
    let mut prg = vec![0xEA; 2 * PRG_BANK];
    prg[PRG_BANK..PRG_BANK + 3].copy_from_slice(&[0x4C, 0x00, 0xC0]);
    for vector in [0x3FFA, 0x3FFC, 0x3FFE] {
        prg[PRG_BANK + vector..PRG_BANK + vector + 2].copy_from_slice(&[0x00, 0xC0]);
    }
    image.extend_from_slice(&prg);
    image
}

/// Serially writes `value` to the SxROM PRG bank register.
fn select_prg_bank(nes: &mut Nes, value: u8, clock_between: bool) {
    for bit in 0..5 {
        if clock_between {
            nes.run_until_break();
        }
        nes.poke(0xE000, (value >> bit) & 1);
    }
}

#[test]
fn sxrom_pokes_need_cycles_between_them() -> Result<()> {
    let mut nes = console_from_image(&sxrom())?;
    nes.set_break_mode(BreakMode::NextInstruction);
    nes.run_until_break();
    assert_eq!(nes.peek_cpu_byte(0x8000), 0xEA);

    // Back to back: only the first bit is shifted in.
    select_prg_bank(&mut nes, 1, false);
    assert_eq!(nes.peek_cpu_byte(0x8000), 0xEA);

    nes.run_until_break();
    nes.poke(0x8000, 0x80);
    select_prg_bank(&mut nes, 1, true);
    assert_eq!(nes.peek_cpu_byte(0x8000), 0x4C);
    Ok(())
}

#[test]
fn peeking_the_controller_does_not_shift() -> Result<()> {
    let mut nes = console(&SPIN)?;
    nes.set_buttons(Button::A.mask() | Button::Start.mask());
    nes.poke(0x4016, 1);
    nes.poke(0x4016, 0);

    assert_eq!(nes.peek_cpu_byte(0x4016) & 1, 1);
    assert_eq!(nes.peek_cpu_byte(0x4016) & 1, 1);
    Ok(())
}

#[test]
fn next_instruction_break_stops_on_boundaries() -> Result<()> {
    // LDA #$01; LDX #$02; JMP *
    let mut nes = console(&[0xA9, 0x01, 0xA2, 0x02, 0x4C, 0x04, 0x80])?;
    nes.set_break_mode(BreakMode::NextInstruction);

    // The reset sequence finishes first.
    assert_eq!(
        nes.run_until_break(),
        StopReason::Break(BreakMode::NextInstruction)
    );
    assert_eq!(nes.cpu_snapshot().pc, 0x8000);

    nes.run_until_break();
    let cpu = nes.cpu_snapshot();
    assert_eq!((cpu.pc, cpu.a, cpu.cycles), (0x8002, 0x01, 9));

    nes.run_until_break();
    let cpu = nes.cpu_snapshot();
    assert_eq!((cpu.pc, cpu.x, cpu.cycles), (0x8004, 0x02, 11));
    Ok(())
}

#[test]
fn next_scanline_break_advances_one_line() -> Result<()> {
    let mut nes = console(&SPIN)?;
    nes.set_break_mode(BreakMode::NextScanline);
    assert_eq!(nes.ppu().scanline(), 261);

    nes.run_until_break();
    assert_eq!(nes.ppu().scanline(), 0);
    nes.run_until_break();
    assert_eq!(nes.ppu().scanline(), 1);
    Ok(())
}

#[test]
fn next_frame_break_and_frame_latch() -> Result<()> {
    let mut nes = console(&SPIN)?;
    nes.set_break_mode(BreakMode::NextFrame);

    assert_eq!(nes.run_until_break(), StopReason::Break(BreakMode::NextFrame));
    assert_eq!(nes.frames(), 1);
    assert!(nes.grab_frame_done());
    assert!(!nes.grab_frame_done());

    nes.set_break_mode(BreakMode::None);
    assert_eq!(nes.run_frame(), StopReason::FrameComplete);
    assert_eq!(nes.frames(), 2);
    assert_eq!(
        nes.frame_buffer().len(),
        SCREEN_WIDTH * SCREEN_HEIGHT * BYTES_PER_PIXEL
    );
    Ok(())
}

#[test]
fn vblank_nmi_reaches_the_handler() -> Result<()> {
    #[rustfmt::skip]
    let program = [
        0xA9, 0x80,       // LDA #$80
        0x8D, 0x00, 0x20, // STA $2000
        0x4C, 0x05, 0x80, // JMP *
    ];
    // NMI handler at $9000: INC $20; RTI
    let image = nrom_with(&program, &[(0x9000, &[0xE6, 0x20, 0x40]), (0xFFFA, &[0x00, 0x90])]);
    let mut nes = Nes::new();
    nes.load_rom_bytes(&image, None)?;

    nes.run_frame();
    nes.run_frame();
    nes.run_frame();
    assert!(nes.peek_cpu_byte(0x0020) >= 2);
    Ok(())
}

#[test]
fn soft_reset_keeps_work_ram() -> Result<()> {
    let mut nes = console(&SPIN)?;
    nes.poke(0x0300, 0x99);
    nes.run_frame();
    nes.reset();
    assert_eq!(nes.peek_cpu_byte(0x0300), 0x99);
    assert_eq!(nes.cpu_snapshot().pc, PROGRAM_START);

    nes.power_on();
    assert_eq!(nes.peek_cpu_byte(0x0300), 0x00);
    Ok(())
}

#[test]
fn disassembly_reads_without_side_effects() -> Result<()> {
    let nes = console(&[0xAD, 0x02, 0x20, 0x4C, 0x03, 0x80])?;
    let instruction = nes.disassemble(0x8000);
    assert_eq!(instruction.size(), 3);
    assert_eq!(instruction.to_string(), "LDA $2002");
    assert_eq!(nes.disassemble(instruction.next_addr()).to_string(), "JMP $8003");
    Ok(())
}

#[test]
fn ejecting_leaves_an_open_bus() -> Result<()> {
    let mut nes = console(&SPIN)?;
    let cartridge = nes.eject_cartridge();
    assert!(cartridge.is_some());
    assert!(nes.cartridge().is_none());
    nes.poke(0x0000, 0x12);
    assert_eq!(nes.peek_cpu_byte(0x0000), 0x12);
    assert_eq!(nes.peek_cpu_byte(0x8000), nes.peek_cpu_byte(0x8001));
    Ok(())
}
