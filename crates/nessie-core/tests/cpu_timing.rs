mod common;

use anyhow::Result;
use common::{console_from_image, nrom_with};
use nessie_core::{BreakMode, Nes};
use proptest::prelude::*;

/// Cycles spent by each of the next `count` instructions.
fn instruction_costs(nes: &mut Nes, count: usize) -> Vec<u64> {
    nes.set_break_mode(BreakMode::NextInstruction);
    // Finish the reset sequence.
    nes.run_until_break();
    (0..count)
        .map(|_| {
            let before = nes.cpu_snapshot().cycles;
            nes.run_until_break();
            nes.cpu_snapshot().cycles - before
        })
        .collect()
}

#[test]
fn branch_costs_depend_on_outcome_and_page() -> Result<()> {
    #[rustfmt::skip]
    let program = [
        0xA9, 0x80,       // LDA #$80
        0x30, 0x00,       // BMI +0: taken, same page
        0xA9, 0x00,       // LDA #$00
        0x30, 0x10,       // BMI: not taken
        0x4C, 0xF0, 0x80, // JMP $80F0
    ];
    let patch: &[u8] = &[
        0xA9, 0x80, // $80F0 LDA #$80
        0x30, 0x10, // $80F2 BMI $8104: taken, crosses a page
    ];
    let image = nrom_with(&program, &[(0x80F0, patch), (0x8104, &[0x4C, 0x04, 0x81])]);
    let mut nes = console_from_image(&image)?;

    let costs = instruction_costs(&mut nes, 7);
    assert_eq!(costs, vec![2, 3, 2, 2, 3, 2, 4]);
    assert_eq!(nes.cpu_snapshot().pc, 0x8104);
    Ok(())
}

#[test]
fn indexed_reads_pay_for_page_crossing() -> Result<()> {
    #[rustfmt::skip]
    let program = [
        0xA2, 0x01,       // LDX #$01
        0xBD, 0x00, 0x02, // LDA $0200,X
        0xBD, 0xFF, 0x02, // LDA $02FF,X
        0x9D, 0x00, 0x02, // STA $0200,X
        0x4C, 0x0B, 0x80, // JMP *
    ];
    let mut nes = console_from_image(&nrom_with(&program, &[]))?;
    assert_eq!(instruction_costs(&mut nes, 4), vec![2, 4, 5, 5]);
    Ok(())
}

proptest! {
    #[test]
    fn immediate_loads_set_zero_and_negative(value in any::<u8>()) {
        // LDA #value; JMP *
        let image = nrom_with(&[0xA9, value, 0x4C, 0x02, 0x80], &[]);
        let mut nes = console_from_image(&image).map_err(|e| TestCaseError::fail(e.to_string()))?;
        instruction_costs(&mut nes, 1);

        let cpu = nes.cpu_snapshot();
        prop_assert_eq!(cpu.a, value);
        prop_assert_eq!(cpu.p.contains(nessie_core::cpu::Status::ZERO), value == 0);
        prop_assert_eq!(cpu.p.contains(nessie_core::cpu::Status::NEGATIVE), value & 0x80 != 0);
    }
}
