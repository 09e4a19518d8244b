use core::fmt;

use crate::cpu::{Cpu, Instruction, Phase, Status};

/// CPU registers, timing and the instruction last fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CpuSnapshot {
    pub a: u8,
    pub x: u8,
    pub y: u8,
    pub s: u8,
    pub p: Status,
    pub pc: u16,
    pub cycles: u64,
    pub phase: Phase,
    pub nmi_pending: bool,
    pub irq_pending: bool,
    pub instruction: Instruction,
}

impl Cpu {
    pub fn snapshot(&self) -> CpuSnapshot {
        CpuSnapshot {
            a: self.a(),
            x: self.x(),
            y: self.y(),
            s: self.s(),
            p: self.p(),
            pc: self.pc(),
            cycles: self.cycles(),
            phase: self.phase(),
            nmi_pending: self.nmi_pending(),
            irq_pending: self.irq_pending(),
            instruction: *self.current_instruction(),
        }
    }
}

/// Register line in the familiar trace-log layout.
impl fmt::Display for CpuSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "PC:{:04X} A:{:02X} X:{:02X} Y:{:02X} P:{:02X} SP:{:02X} CYC:{}",
            self.pc,
            self.a,
            self.x,
            self.y,
            self.p.bits(),
            self.s,
            self.cycles
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::mock::MockBus;

    #[test]
    fn snapshot_formats_like_a_trace_line() {
        let mut bus = MockBus::default();
        bus.load(0xFFFC, &[0x00, 0xC0]);
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        let snapshot = cpu.snapshot();
        assert_eq!(snapshot.pc, 0xC000);
        assert_eq!(snapshot.phase, Phase::Interrupt);
        assert_eq!(
            snapshot.to_string(),
            "PC:C000 A:00 X:00 Y:00 P:24 SP:FD CYC:7"
        );
    }
}
