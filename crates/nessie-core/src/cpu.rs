//! 2A03 CPU core.
//!
//! Instructions execute atomically: [`Cpu::step`] runs one whole instruction
//! (or interrupt sequence) against the bus and reports how many cycles it
//! costs. [`Cpu::clock`] spreads that cost over single CPU cycles so the rest
//! of the console can be interleaved with it. Interrupts are polled at
//! instruction boundaries.

use tracing::debug;

use crate::{
    bus::Bus,
    memory::cpu::{IRQ_VECTOR, NMI_VECTOR, RESET_VECTOR, STACK_PAGE_START},
};

pub mod addressing;
pub mod cycle;
pub mod instruction;
pub mod lookup;
pub mod mnemonic;
pub mod status;

pub use addressing::{Addressing, Operand};
pub use instruction::Instruction;
pub use lookup::{OpcodeInfo, opcode_info};
pub use mnemonic::Mnemonic;
pub use status::Status;

/// Cycles taken by reset, NMI, IRQ and BRK sequences.
const INTERRUPT_CYCLES: u8 = 7;

/// What the CPU is busy with on the current cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Powered but never reset; clocks are counted and ignored.
    Idle,
    /// At an instruction boundary; the next clock fetches.
    Fetch,
    /// Burning the remaining cycles of an instruction.
    Execute,
    /// Burning the remaining cycles of a reset or interrupt sequence.
    Interrupt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cpu {
    // Registers
    a: u8,     //Accumulator
    x: u8,     //X Index Register
    y: u8,     //Y Index Register
    s: u8,     //Stack Pointer
    p: Status, //Processor Status
    pc: u16,   //Program Counter

    cycles: u64,
    /// Cycles still owed by the work started on an earlier clock.
    stall: u8,
    phase: Phase,

    nmi_pending: bool,
    irq_pending: bool,
    /// Level of the shared IRQ line driven by the APU and the mapper.
    irq_line: bool,

    current: Instruction,
}

impl Default for Cpu {
    fn default() -> Self {
        Self::new()
    }
}

impl Cpu {
    /// Power-up register state. Call [`Cpu::reset`] to load the reset vector.
    pub fn new() -> Self {
        Self {
            a: 0,
            x: 0,
            y: 0,
            s: 0xFD,
            p: Status::new(),
            pc: 0,
            cycles: 0,
            stall: 0,
            phase: Phase::Idle,
            nmi_pending: false,
            irq_pending: false,
            irq_line: false,
            current: Instruction::default(),
        }
    }

    /// Power cycle: clears every register and runs the reset sequence.
    pub fn power_on<B: Bus>(&mut self, bus: &mut B) {
        *self = Self::new();
        self.reset(bus);
    }

    /// Runs the 7-cycle reset sequence: S = `$FD`, I set, PC from `$FFFC`.
    ///
    /// A, X, Y and the cycle counter keep their values.
    pub fn reset<B: Bus>(&mut self, bus: &mut B) {
        self.s = 0xFD;
        self.p.insert(Status::INTERRUPT);
        self.pc = read_vector(bus, RESET_VECTOR);
        self.nmi_pending = false;
        self.irq_pending = false;
        self.cycles += INTERRUPT_CYCLES as u64;
        self.stall = INTERRUPT_CYCLES;
        self.phase = Phase::Interrupt;
    }

    /// Advances exactly one CPU cycle.
    pub fn clock<B: Bus>(&mut self, bus: &mut B) {
        if self.phase == Phase::Idle {
            self.cycles += 1;
            return;
        }
        if self.stall > 0 {
            self.stall -= 1;
            if self.stall == 0 {
                self.phase = Phase::Fetch;
            }
            return;
        }

        let cycles = self.step(bus);
        self.stall = cycles - 1;
        if self.stall > 0 {
            self.phase = if self.phase == Phase::Fetch {
                Phase::Execute
            } else {
                self.phase
            };
        } else {
            self.phase = Phase::Fetch;
        }
    }

    /// Executes one instruction, or services a pending interrupt instead, and
    /// returns the cycles it costs. The cycle counter is advanced by the same
    /// amount.
    pub fn step<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let cycles = if self.nmi_pending {
            self.nmi_pending = false;
            self.interrupt(bus, NMI_VECTOR);
            self.phase = Phase::Interrupt;
            INTERRUPT_CYCLES
        } else if (self.irq_pending || self.irq_line) && !self.p.contains(Status::INTERRUPT) {
            self.irq_pending = false;
            self.interrupt(bus, IRQ_VECTOR);
            self.phase = Phase::Interrupt;
            INTERRUPT_CYCLES
        } else {
            self.phase = Phase::Fetch;
            self.execute_next(bus)
        };
        self.cycles += cycles as u64;
        cycles
    }

    /// Latches an NMI request, serviced at the next instruction boundary.
    pub fn pull_nmi(&mut self) {
        self.nmi_pending = true;
    }

    /// Latches an IRQ request, serviced once I is clear.
    pub fn pull_irq(&mut self) {
        self.irq_pending = true;
    }

    /// Drives the level-triggered IRQ line.
    pub fn set_irq_line(&mut self, asserted: bool) {
        self.irq_line = asserted;
    }

    /// Consumes one cycle without touching the bus (OAM DMA).
    pub fn steal_cycle(&mut self) {
        self.cycles += 1;
    }

    /// No cycles are owed and the next clock starts new work.
    pub fn at_instruction_boundary(&self) -> bool {
        self.stall == 0 && self.phase != Phase::Idle
    }

    pub fn a(&self) -> u8 {
        self.a
    }

    pub fn x(&self) -> u8 {
        self.x
    }

    pub fn y(&self) -> u8 {
        self.y
    }

    pub fn s(&self) -> u8 {
        self.s
    }

    pub fn p(&self) -> Status {
        self.p
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn nmi_pending(&self) -> bool {
        self.nmi_pending
    }

    pub fn irq_pending(&self) -> bool {
        self.irq_pending || self.irq_line
    }

    /// Most recently fetched instruction.
    pub fn current_instruction(&self) -> &Instruction {
        &self.current
    }

    /// Moves PC without running any bus cycles.
    pub fn set_pc(&mut self, pc: u16) {
        self.pc = pc;
    }

    fn interrupt<B: Bus>(&mut self, bus: &mut B, vector: u16) {
        self.push_word(bus, self.pc);
        self.push(bus, self.p.to_stack(false));
        self.p.insert(Status::INTERRUPT);
        self.p.remove(Status::DECIMAL);
        self.pc = read_vector(bus, vector);
    }

    fn execute_next<B: Bus>(&mut self, bus: &mut B) -> u8 {
        let addr = self.pc;
        let opcode = bus.read(addr);
        let info = opcode_info(opcode);
        let mut operands = [0; 2];
        for i in 0..info.addressing.operand_len() {
            operands[i as usize] = bus.read(addr.wrapping_add(1 + i));
        }
        self.current = Instruction {
            addr,
            opcode,
            operands,
            info,
        };
        self.pc = addr.wrapping_add(info.size());

        let resolved = info
            .addressing
            .resolve(bus, operands, self.pc, self.x, self.y);
        let branch_taken = self.execute(bus, info.mnemonic, resolved.operand);
        info.cycle.total(resolved.page_crossed, branch_taken)
    }

    /// Runs one operation. Returns whether a branch was taken.
    fn execute<B: Bus>(&mut self, bus: &mut B, mnemonic: Mnemonic, operand: Operand) -> bool {
        match mnemonic {
            //Load/Store
            Mnemonic::LDA => {
                self.a = self.load(bus, operand);
                self.p.update_zn(self.a);
            }
            Mnemonic::LDX => {
                self.x = self.load(bus, operand);
                self.p.update_zn(self.x);
            }
            Mnemonic::LDY => {
                self.y = self.load(bus, operand);
                self.p.update_zn(self.y);
            }
            Mnemonic::LAX => {
                let value = self.load(bus, operand);
                self.a = value;
                self.x = value;
                self.p.update_zn(value);
            }
            Mnemonic::STA => store(bus, operand, self.a),
            Mnemonic::STX => store(bus, operand, self.x),
            Mnemonic::STY => store(bus, operand, self.y),
            Mnemonic::SAX => store(bus, operand, self.a & self.x),

            //Transfer
            Mnemonic::TAX => {
                self.x = self.a;
                self.p.update_zn(self.x);
            }
            Mnemonic::TAY => {
                self.y = self.a;
                self.p.update_zn(self.y);
            }
            Mnemonic::TSX => {
                self.x = self.s;
                self.p.update_zn(self.x);
            }
            Mnemonic::TXA => {
                self.a = self.x;
                self.p.update_zn(self.a);
            }
            Mnemonic::TXS => self.s = self.x,
            Mnemonic::TYA => {
                self.a = self.y;
                self.p.update_zn(self.a);
            }

            //Stack
            Mnemonic::PHA => self.push(bus, self.a),
            Mnemonic::PHP => self.push(bus, self.p.to_stack(true)),
            Mnemonic::PLA => {
                self.a = self.pull(bus);
                self.p.update_zn(self.a);
            }
            Mnemonic::PLP => self.p = Status::from_stack(self.pull(bus)),

            //Shift
            Mnemonic::ASL => {
                self.modify(bus, operand, Self::asl);
            }
            Mnemonic::LSR => {
                self.modify(bus, operand, Self::lsr);
            }
            Mnemonic::ROL => {
                self.modify(bus, operand, Self::rol);
            }
            Mnemonic::ROR => {
                self.modify(bus, operand, Self::ror);
            }

            //Logic
            Mnemonic::AND => {
                let value = self.load(bus, operand);
                self.and(value);
            }
            Mnemonic::EOR => {
                let value = self.load(bus, operand);
                self.eor(value);
            }
            Mnemonic::ORA => {
                let value = self.load(bus, operand);
                self.ora(value);
            }
            Mnemonic::BIT => {
                let value = self.load(bus, operand);
                self.p.set(Status::ZERO, self.a & value == 0);
                self.p.set(Status::OVERFLOW, value & 0x40 != 0);
                self.p.set(Status::NEGATIVE, value & 0x80 != 0);
            }

            //Arithmetic
            Mnemonic::ADC => {
                let value = self.load(bus, operand);
                self.adc(value);
            }
            Mnemonic::SBC => {
                let value = self.load(bus, operand);
                self.adc(!value);
            }
            Mnemonic::CMP => {
                let value = self.load(bus, operand);
                self.compare(self.a, value);
            }
            Mnemonic::CPX => {
                let value = self.load(bus, operand);
                self.compare(self.x, value);
            }
            Mnemonic::CPY => {
                let value = self.load(bus, operand);
                self.compare(self.y, value);
            }
            Mnemonic::DCP => {
                let value = self.modify(bus, operand, |cpu, v| cpu.dec(v));
                self.compare(self.a, value);
            }
            Mnemonic::ISB => {
                let value = self.modify(bus, operand, |cpu, v| cpu.inc(v));
                self.adc(!value);
            }
            Mnemonic::SLO => {
                let value = self.modify(bus, operand, Self::asl);
                self.ora(value);
            }
            Mnemonic::SRE => {
                let value = self.modify(bus, operand, Self::lsr);
                self.eor(value);
            }
            Mnemonic::RLA => {
                let value = self.modify(bus, operand, Self::rol);
                self.and(value);
            }
            Mnemonic::RRA => {
                let value = self.modify(bus, operand, Self::ror);
                self.adc(value);
            }

            //Inc/Dec
            Mnemonic::INC => {
                self.modify(bus, operand, |cpu, v| cpu.inc(v));
            }
            Mnemonic::DEC => {
                self.modify(bus, operand, |cpu, v| cpu.dec(v));
            }
            Mnemonic::INX => self.x = self.inc(self.x),
            Mnemonic::INY => self.y = self.inc(self.y),
            Mnemonic::DEX => self.x = self.dec(self.x),
            Mnemonic::DEY => self.y = self.dec(self.y),

            //Control Flow
            Mnemonic::BRK => {
                self.push_word(bus, self.pc.wrapping_add(1));
                self.push(bus, self.p.to_stack(true));
                self.p.insert(Status::INTERRUPT);
                self.p.remove(Status::DECIMAL);
                self.pc = read_vector(bus, IRQ_VECTOR);
            }
            Mnemonic::JMP => {
                if let Operand::Address(target) = operand {
                    self.pc = target;
                }
            }
            Mnemonic::JSR => {
                if let Operand::Address(target) = operand {
                    self.push_word(bus, self.pc.wrapping_sub(1));
                    self.pc = target;
                }
            }
            Mnemonic::RTI => {
                self.p = Status::from_stack(self.pull(bus));
                self.pc = self.pull_word(bus);
            }
            Mnemonic::RTS => self.pc = self.pull_word(bus).wrapping_add(1),

            //Branch
            Mnemonic::BCC => return self.branch(operand, !self.p.contains(Status::CARRY)),
            Mnemonic::BCS => return self.branch(operand, self.p.contains(Status::CARRY)),
            Mnemonic::BEQ => return self.branch(operand, self.p.contains(Status::ZERO)),
            Mnemonic::BNE => return self.branch(operand, !self.p.contains(Status::ZERO)),
            Mnemonic::BMI => return self.branch(operand, self.p.contains(Status::NEGATIVE)),
            Mnemonic::BPL => return self.branch(operand, !self.p.contains(Status::NEGATIVE)),
            Mnemonic::BVS => return self.branch(operand, self.p.contains(Status::OVERFLOW)),
            Mnemonic::BVC => return self.branch(operand, !self.p.contains(Status::OVERFLOW)),

            //Flags
            Mnemonic::CLC => self.p.remove(Status::CARRY),
            Mnemonic::CLD => self.p.remove(Status::DECIMAL),
            Mnemonic::CLI => self.p.remove(Status::INTERRUPT),
            Mnemonic::CLV => self.p.remove(Status::OVERFLOW),
            Mnemonic::SEC => self.p.insert(Status::CARRY),
            Mnemonic::SED => self.p.insert(Status::DECIMAL),
            Mnemonic::SEI => self.p.insert(Status::INTERRUPT),

            //Misc
            Mnemonic::NOP => {
                // Unofficial NOPs with a memory operand still perform the read.
                if let Operand::Address(addr) = operand {
                    bus.read(addr);
                }
            }
            Mnemonic::ILL => {
                debug!(
                    opcode = format_args!("{:02X}", self.current.opcode),
                    pc = format_args!("{:04X}", self.current.addr),
                    "unimplemented opcode"
                );
            }
        }
        false
    }

    fn load<B: Bus>(&mut self, bus: &mut B, operand: Operand) -> u8 {
        match operand {
            Operand::Immediate(value) => value,
            Operand::Address(addr) => bus.read(addr),
            Operand::Accumulator => self.a,
            Operand::None => 0,
        }
    }

    /// Read-modify-write. Memory operands see the original value written
    /// back before the result, like the real bus sequence.
    fn modify<B: Bus>(
        &mut self,
        bus: &mut B,
        operand: Operand,
        op: impl FnOnce(&mut Self, u8) -> u8,
    ) -> u8 {
        match operand {
            Operand::Accumulator => {
                let result = op(self, self.a);
                self.a = result;
                result
            }
            Operand::Address(addr) => {
                let value = bus.read(addr);
                bus.write(addr, value);
                let result = op(self, value);
                bus.write(addr, result);
                result
            }
            Operand::Immediate(_) | Operand::None => 0,
        }
    }

    fn branch(&mut self, operand: Operand, condition: bool) -> bool {
        match operand {
            Operand::Address(target) if condition => {
                self.pc = target;
                true
            }
            _ => false,
        }
    }

    fn adc(&mut self, value: u8) {
        let sum = self.a as u16 + value as u16 + self.p.contains(Status::CARRY) as u16;
        let result = sum as u8;
        self.p.set(Status::CARRY, sum > 0xFF);
        self.p.set(
            Status::OVERFLOW,
            (!(self.a ^ value) & (self.a ^ result) & 0x80) != 0,
        );
        self.a = result;
        self.p.update_zn(result);
    }

    fn compare(&mut self, register: u8, value: u8) {
        self.p.set(Status::CARRY, register >= value);
        self.p.update_zn(register.wrapping_sub(value));
    }

    fn and(&mut self, value: u8) {
        self.a &= value;
        self.p.update_zn(self.a);
    }

    fn eor(&mut self, value: u8) {
        self.a ^= value;
        self.p.update_zn(self.a);
    }

    fn ora(&mut self, value: u8) {
        self.a |= value;
        self.p.update_zn(self.a);
    }

    fn asl(&mut self, value: u8) -> u8 {
        self.p.set(Status::CARRY, value & 0x80 != 0);
        let result = value << 1;
        self.p.update_zn(result);
        result
    }

    fn lsr(&mut self, value: u8) -> u8 {
        self.p.set(Status::CARRY, value & 0x01 != 0);
        let result = value >> 1;
        self.p.update_zn(result);
        result
    }

    fn rol(&mut self, value: u8) -> u8 {
        let carry_in = self.p.contains(Status::CARRY) as u8;
        self.p.set(Status::CARRY, value & 0x80 != 0);
        let result = (value << 1) | carry_in;
        self.p.update_zn(result);
        result
    }

    fn ror(&mut self, value: u8) -> u8 {
        let carry_in = (self.p.contains(Status::CARRY) as u8) << 7;
        self.p.set(Status::CARRY, value & 0x01 != 0);
        let result = (value >> 1) | carry_in;
        self.p.update_zn(result);
        result
    }

    fn inc(&mut self, value: u8) -> u8 {
        let result = value.wrapping_add(1);
        self.p.update_zn(result);
        result
    }

    fn dec(&mut self, value: u8) -> u8 {
        let result = value.wrapping_sub(1);
        self.p.update_zn(result);
        result
    }

    fn push<B: Bus>(&mut self, bus: &mut B, data: u8) {
        bus.write(STACK_PAGE_START | self.s as u16, data);
        self.s = self.s.wrapping_sub(1);
    }

    fn pull<B: Bus>(&mut self, bus: &mut B) -> u8 {
        self.s = self.s.wrapping_add(1);
        bus.read(STACK_PAGE_START | self.s as u16)
    }

    fn push_word<B: Bus>(&mut self, bus: &mut B, data: u16) {
        let [lo, hi] = data.to_le_bytes();
        self.push(bus, hi);
        self.push(bus, lo);
    }

    fn pull_word<B: Bus>(&mut self, bus: &mut B) -> u16 {
        let lo = self.pull(bus);
        let hi = self.pull(bus);
        u16::from_le_bytes([lo, hi])
    }
}

fn store<B: Bus>(bus: &mut B, operand: Operand, data: u8) {
    if let Operand::Address(addr) = operand {
        bus.write(addr, data);
    }
}

fn read_vector<B: Bus>(bus: &mut B, vector: u16) -> u16 {
    let lo = bus.read(vector);
    let hi = bus.read(vector.wrapping_add(1));
    u16::from_le_bytes([lo, hi])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::bus::mock::MockBus;

    const ORIGIN: u16 = 0x8000;

    /// CPU reset into `program` loaded at `$8000`.
    fn boot(program: &[u8]) -> (Cpu, MockBus) {
        let mut bus = MockBus::default();
        bus.load(ORIGIN, program);
        bus.load(RESET_VECTOR, &ORIGIN.to_le_bytes());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        (cpu, bus)
    }

    fn run(cpu: &mut Cpu, bus: &mut MockBus, instructions: usize) -> u64 {
        let start = cpu.cycles();
        for _ in 0..instructions {
            cpu.step(bus);
        }
        cpu.cycles() - start
    }

    #[test]
    fn reset_loads_vector_and_takes_seven_cycles() {
        let (mut cpu, mut bus) = boot(&[0xEA]);
        assert_eq!(cpu.pc(), ORIGIN);
        assert_eq!(cpu.s(), 0xFD);
        assert!(cpu.p().contains(Status::INTERRUPT));
        assert_eq!(cpu.cycles(), 7);

        for _ in 0..7 {
            assert!(!cpu.at_instruction_boundary());
            cpu.clock(&mut bus);
        }
        assert!(cpu.at_instruction_boundary());
        assert_eq!(cpu.pc(), ORIGIN);
    }

    #[test]
    fn lda_negative_then_bmi_takes_three_cycles() {
        // LDA #$80; BMI +2
        let (mut cpu, mut bus) = boot(&[0xA9, 0x80, 0x30, 0x02]);
        assert_eq!(cpu.step(&mut bus), 2);
        assert!(cpu.p().contains(Status::NEGATIVE));
        assert_eq!(cpu.step(&mut bus), 3);
        assert_eq!(cpu.pc(), 0x8006);
    }

    #[test]
    fn branch_across_page_costs_four() {
        let mut bus = MockBus::default();
        // $80F0: BNE +$20 lands on $8112.
        bus.load(0x80F0, &[0xD0, 0x20]);
        let mut cpu = Cpu::new();
        cpu.set_pc(0x80F0);
        cpu.phase = Phase::Fetch;
        assert_eq!(cpu.step(&mut bus), 4);
        assert_eq!(cpu.pc(), 0x8112);
    }

    #[test]
    fn indexed_read_pays_for_page_cross_only() {
        // LDX #$01; LDA $80FF,X; LDA $8000,X
        let (mut cpu, mut bus) = boot(&[0xA2, 0x01, 0xBD, 0xFF, 0x80, 0xBD, 0x00, 0x80]);
        cpu.step(&mut bus);
        assert_eq!(cpu.step(&mut bus), 5);
        assert_eq!(cpu.step(&mut bus), 4);
    }

    #[test]
    fn clock_spreads_instruction_cost() {
        // LDA $10 (3 cycles), NOP
        let (mut cpu, mut bus) = boot(&[0xA5, 0x10, 0xEA]);
        for _ in 0..7 {
            cpu.clock(&mut bus);
        }
        cpu.clock(&mut bus);
        assert_eq!(cpu.phase(), Phase::Execute);
        assert_eq!(cpu.pc(), 0x8002);
        cpu.clock(&mut bus);
        cpu.clock(&mut bus);
        assert!(cpu.at_instruction_boundary());
        assert_eq!(cpu.cycles(), 10);
    }

    #[test]
    fn unimplemented_opcode_costs_one_cycle_and_nothing_else() {
        let (mut cpu, mut bus) = boot(&[0x02, 0xEA]);
        let before = cpu.clone();
        assert_eq!(cpu.step(&mut bus), 1);
        assert_eq!(cpu.pc(), ORIGIN + 1);
        assert_eq!((cpu.a(), cpu.x(), cpu.y(), cpu.s()), (before.a, before.x, before.y, before.s));
        assert_eq!(cpu.p(), before.p);
        assert!(bus.writes.is_empty());
    }

    #[test]
    fn brk_and_rti_round_trip() {
        let mut bus = MockBus::default();
        bus.load(ORIGIN, &[0x00, 0xFF, 0xEA]);
        bus.load(0x9000, &[0x40]);
        bus.load(IRQ_VECTOR, &[0x00, 0x90]);
        bus.load(RESET_VECTOR, &ORIGIN.to_le_bytes());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.p.remove(Status::INTERRUPT);

        assert_eq!(cpu.step(&mut bus), 7);
        assert_eq!(cpu.pc(), 0x9000);
        assert!(cpu.p().contains(Status::INTERRUPT));
        let pushed = bus.mem[0x01FB];
        assert_eq!(pushed & 0x30, 0x30);

        assert_eq!(cpu.step(&mut bus), 6);
        assert_eq!(cpu.pc(), ORIGIN + 2);
        assert_eq!(cpu.s(), 0xFD);
        assert!(!cpu.p().contains(Status::INTERRUPT));
    }

    #[test]
    fn brk_clears_decimal_and_pushes_it() {
        // SED; BRK
        let mut bus = MockBus::default();
        bus.load(ORIGIN, &[0xF8, 0x00, 0xFF]);
        bus.load(0x9000, &[0xEA]);
        bus.load(IRQ_VECTOR, &[0x00, 0x90]);
        bus.load(RESET_VECTOR, &ORIGIN.to_le_bytes());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        run(&mut cpu, &mut bus, 2);
        assert_eq!(cpu.pc(), 0x9000);
        assert!(!cpu.p().contains(Status::DECIMAL));
        assert!(cpu.p().contains(Status::INTERRUPT));
        assert_eq!(bus.mem[0x01FB] & Status::DECIMAL.bits(), Status::DECIMAL.bits());
    }

    #[test]
    fn nmi_is_serviced_at_boundary_with_break_clear() {
        let mut bus = MockBus::default();
        bus.load(ORIGIN, &[0xEA, 0xEA]);
        bus.load(NMI_VECTOR, &[0x00, 0xA0]);
        bus.load(RESET_VECTOR, &ORIGIN.to_le_bytes());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);
        cpu.p.insert(Status::DECIMAL);

        cpu.pull_nmi();
        assert_eq!(cpu.step(&mut bus), 7);
        assert_eq!(cpu.pc(), 0xA000);
        assert_eq!(bus.mem[0x01FB] & Status::BREAK.bits(), 0);
        assert_eq!(u16::from_le_bytes([bus.mem[0x01FC], bus.mem[0x01FD]]), ORIGIN);
        assert!(!cpu.p().contains(Status::DECIMAL));
        assert!(!cpu.nmi_pending());
    }

    #[test]
    fn irq_waits_for_interrupt_flag() {
        // SEI already set by reset; CLI; NOP
        let mut bus = MockBus::default();
        bus.load(ORIGIN, &[0xEA, 0x58, 0xEA]);
        bus.load(IRQ_VECTOR, &[0x00, 0xB0]);
        bus.load(RESET_VECTOR, &ORIGIN.to_le_bytes());
        let mut cpu = Cpu::new();
        cpu.reset(&mut bus);

        cpu.set_irq_line(true);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), ORIGIN + 1);
        cpu.step(&mut bus);
        assert_eq!(cpu.pc(), ORIGIN + 2);
        assert_eq!(cpu.step(&mut bus), 7);
        assert_eq!(cpu.pc(), 0xB000);
    }

    #[test]
    fn read_modify_write_writes_old_value_first() {
        // INC $0200
        let (mut cpu, mut bus) = boot(&[0xEE, 0x00, 0x02]);
        bus.mem[0x0200] = 0x41;
        assert_eq!(cpu.step(&mut bus), 6);
        assert_eq!(bus.writes, vec![(0x0200, 0x41), (0x0200, 0x42)]);
    }

    #[test]
    fn decimal_flag_does_not_change_adc() {
        // SED; CLC; LDA #$09; ADC #$01
        let (mut cpu, mut bus) = boot(&[0xF8, 0x18, 0xA9, 0x09, 0x69, 0x01]);
        run(&mut cpu, &mut bus, 4);
        assert_eq!(cpu.a(), 0x0A);
    }

    #[test]
    fn illegal_combos_follow_documented_semantics() {
        let (mut cpu, mut bus) = boot(&[
            0xA7, 0x10, // LAX $10
            0x87, 0x11, // SAX $11
            0xC7, 0x12, // DCP $12
            0xE7, 0x13, // ISB $13
        ]);
        bus.mem[0x10] = 0x8F;
        bus.mem[0x12] = 0x90;
        bus.mem[0x13] = 0x0F;
        run(&mut cpu, &mut bus, 2);
        assert_eq!((cpu.a(), cpu.x()), (0x8F, 0x8F));
        assert_eq!(bus.mem[0x11], 0x8F);

        run(&mut cpu, &mut bus, 1);
        assert_eq!(bus.mem[0x12], 0x8F);
        assert!(cpu.p().contains(Status::ZERO | Status::CARRY));

        run(&mut cpu, &mut bus, 1);
        assert_eq!(bus.mem[0x13], 0x10);
        assert_eq!(cpu.a(), 0x7F);
    }

    #[test]
    fn jmp_indirect_page_wrap() {
        let (mut cpu, mut bus) = boot(&[0x6C, 0xFF, 0x02]);
        bus.mem[0x02FF] = 0x00;
        bus.mem[0x0200] = 0x90;
        bus.mem[0x0300] = 0xA0;
        assert_eq!(cpu.step(&mut bus), 5);
        assert_eq!(cpu.pc(), 0x9000);
    }

    /// Loads `value` through a given addressing mode, then returns P.
    fn flags_after_load(program: &[u8], value: u8) -> Status {
        let (mut cpu, mut bus) = boot(program);
        bus.mem[0x0010] = value;
        bus.mem[0x0300] = value;
        run(&mut cpu, &mut bus, 1);
        cpu.p()
    }

    proptest! {
        #[test]
        fn zero_and_negative_track_result(value: u8) {
            let modes: [&[u8]; 3] = [&[0xA9, value], &[0xA5, 0x10], &[0xAD, 0x00, 0x03]];
            for program in modes {
                let p = flags_after_load(program, value);
                prop_assert_eq!(p.contains(Status::ZERO), value == 0);
                prop_assert_eq!(p.contains(Status::NEGATIVE), value & 0x80 != 0);
            }
        }

        #[test]
        fn logic_and_arithmetic_set_zn_from_result(a: u8, v: u8, op in prop::sample::select(vec![0x29u8, 0x09, 0x49, 0x69, 0xE9])) {
            let (mut cpu, mut bus) = boot(&[0xA9, a, op, v]);
            run(&mut cpu, &mut bus, 2);
            let result = cpu.a();
            prop_assert_eq!(cpu.p().contains(Status::ZERO), result == 0);
            prop_assert_eq!(cpu.p().contains(Status::NEGATIVE), result & 0x80 != 0);
        }

        #[test]
        fn adc_then_sbc_restores_accumulator(a: u8, v: u8) {
            // LDA #a; CLC; ADC #v; SEC; SBC #v
            let (mut cpu, mut bus) = boot(&[0xA9, a, 0x18, 0x69, v, 0x38, 0xE9, v]);
            run(&mut cpu, &mut bus, 3);
            let sum = a as u16 + v as u16;
            prop_assert_eq!(cpu.p().contains(Status::CARRY), sum > 0xFF);
            let signed = a as i8 as i16 + v as i8 as i16;
            prop_assert_eq!(cpu.p().contains(Status::OVERFLOW), !(-128..=127).contains(&signed));
            run(&mut cpu, &mut bus, 2);
            prop_assert_eq!(cpu.a(), a);
        }

        #[test]
        fn pha_pla_restore_stack(values in prop::collection::vec(any::<u8>(), 1..24)) {
            let mut program = Vec::new();
            for v in &values {
                program.extend([0xA9, *v, 0x48]);
            }
            for i in 0..values.len() {
                program.extend([0x68, 0x8D, i as u8, 0x02]);
            }
            let (mut cpu, mut bus) = boot(&program);
            let s = cpu.s();
            run(&mut cpu, &mut bus, values.len() * 4);
            prop_assert_eq!(cpu.s(), s);
            let popped: Vec<u8> = bus.mem[0x0200..0x0200 + values.len()].to_vec();
            let expected: Vec<u8> = values.iter().rev().copied().collect();
            prop_assert_eq!(popped, expected);
        }

        #[test]
        fn php_plp_restores_flags(bits: u8) {
            // PHP; (clobber with LDA #0 / SEC) ; PLP
            let (mut cpu, mut bus) = boot(&[0x08, 0xA9, 0x00, 0x38, 0x28]);
            cpu.p = Status::from_stack(bits);
            let before = cpu.p();
            let s = cpu.s();
            run(&mut cpu, &mut bus, 4);
            prop_assert_eq!(cpu.s(), s);
            prop_assert_eq!(cpu.p(), before);
        }

        #[test]
        fn nested_jsr_rts_return_home(depth in 1usize..16) {
            // Subroutine i at $9000 + 4*i calls i+1; the deepest one returns.
            let mut bus = MockBus::default();
            bus.load(ORIGIN, &[0x20, 0x00, 0x90, 0xEA]);
            for i in 0..depth {
                let at = 0x9000 + 4 * i as u16;
                if i + 1 < depth {
                    let next = (at + 4).to_le_bytes();
                    bus.load(at, &[0x20, next[0], next[1], 0x60]);
                } else {
                    bus.load(at, &[0x60]);
                }
            }
            bus.load(RESET_VECTOR, &ORIGIN.to_le_bytes());
            let mut cpu = Cpu::new();
            cpu.reset(&mut bus);
            let s = cpu.s();

            run(&mut cpu, &mut bus, depth * 2);
            prop_assert_eq!(cpu.s(), s);
            prop_assert_eq!(cpu.pc(), ORIGIN + 3);
        }
    }
}
