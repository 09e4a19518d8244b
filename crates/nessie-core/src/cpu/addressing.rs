use crate::bus::Bus;

/// 6502 addressing modes.
///
/// Each mode knows how many operand bytes follow the opcode and how to turn
/// them into an [`Operand`] given the index registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Addressing {
    /// No operand. `CLC`, `TAX`, `RTS`.
    Implied,
    /// Operates on A. `ASL A`.
    Accumulator,
    /// `LDA #$42`.
    Immediate,
    /// `LDA $1234`.
    Absolute,
    /// `LDA $1234,X`. +1 cycle on a page cross for reads.
    AbsoluteX,
    /// `LDA $1234,Y`. +1 cycle on a page cross for reads.
    AbsoluteY,
    /// `JMP ($1234)`. The pointer high byte is fetched without carrying into
    /// the page, so `JMP ($10FF)` reads `$10FF` and `$1000`.
    Indirect,
    /// `LDA $42`.
    ZeroPage,
    /// `LDA $42,X`, wrapping inside page zero.
    ZeroPageX,
    /// `LDX $42,Y`, wrapping inside page zero.
    ZeroPageY,
    /// `LDA ($42,X)`.
    IndirectX,
    /// `LDA ($42),Y`.
    IndirectY,
    /// Branch offset, signed, relative to the next instruction.
    Relative,
}

/// What an instruction acts on once its addressing mode is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    None,
    Accumulator,
    Immediate(u8),
    /// Effective address. For branches this is the branch target.
    Address(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resolved {
    pub operand: Operand,
    /// Indexing or the branch target left the base page.
    pub page_crossed: bool,
}

#[inline]
const fn crosses(a: u16, b: u16) -> bool {
    a & 0xFF00 != b & 0xFF00
}

impl Addressing {
    /// Number of bytes following the opcode.
    pub const fn operand_len(self) -> u16 {
        match self {
            Addressing::Implied | Addressing::Accumulator => 0,
            Addressing::Immediate
            | Addressing::ZeroPage
            | Addressing::ZeroPageX
            | Addressing::ZeroPageY
            | Addressing::IndirectX
            | Addressing::IndirectY
            | Addressing::Relative => 1,
            Addressing::Absolute
            | Addressing::AbsoluteX
            | Addressing::AbsoluteY
            | Addressing::Indirect => 2,
        }
    }

    /// Computes the operand from the bytes that followed the opcode.
    ///
    /// `next_pc` is the address of the following instruction. Memory is only
    /// read to follow pointers; no CPU register is touched.
    pub fn resolve<B: Bus>(
        self,
        bus: &mut B,
        operands: [u8; 2],
        next_pc: u16,
        x: u8,
        y: u8,
    ) -> Resolved {
        let [lo, _] = operands;
        let word = u16::from_le_bytes(operands);
        let plain = |operand| Resolved {
            operand,
            page_crossed: false,
        };

        match self {
            Addressing::Implied => plain(Operand::None),
            Addressing::Accumulator => plain(Operand::Accumulator),
            Addressing::Immediate => plain(Operand::Immediate(lo)),
            Addressing::ZeroPage => plain(Operand::Address(lo as u16)),
            Addressing::ZeroPageX => plain(Operand::Address(lo.wrapping_add(x) as u16)),
            Addressing::ZeroPageY => plain(Operand::Address(lo.wrapping_add(y) as u16)),
            Addressing::Absolute => plain(Operand::Address(word)),
            Addressing::AbsoluteX | Addressing::AbsoluteY => {
                let index = if self == Addressing::AbsoluteX { x } else { y };
                let addr = word.wrapping_add(index as u16);
                Resolved {
                    operand: Operand::Address(addr),
                    page_crossed: crosses(word, addr),
                }
            }
            Addressing::Indirect => plain(Operand::Address(read_word_in_page(bus, word))),
            Addressing::IndirectX => {
                plain(Operand::Address(read_zero_page_word(bus, lo.wrapping_add(x))))
            }
            Addressing::IndirectY => {
                let base = read_zero_page_word(bus, lo);
                let addr = base.wrapping_add(y as u16);
                Resolved {
                    operand: Operand::Address(addr),
                    page_crossed: crosses(base, addr),
                }
            }
            Addressing::Relative => {
                let target = next_pc.wrapping_add(lo as i8 as u16);
                Resolved {
                    operand: Operand::Address(target),
                    page_crossed: crosses(next_pc, target),
                }
            }
        }
    }
}

/// Little-endian word whose high byte does not carry into the next page.
fn read_word_in_page<B: Bus>(bus: &mut B, addr: u16) -> u16 {
    let lo = bus.read(addr);
    let hi = bus.read((addr & 0xFF00) | (addr.wrapping_add(1) & 0x00FF));
    u16::from_le_bytes([lo, hi])
}

fn read_zero_page_word<B: Bus>(bus: &mut B, ptr: u8) -> u16 {
    let lo = bus.read(ptr as u16);
    let hi = bus.read(ptr.wrapping_add(1) as u16);
    u16::from_le_bytes([lo, hi])
}
