use std::fmt;

use crate::cpu::{
    addressing::Addressing,
    lookup::{OpcodeInfo, opcode_info},
};

/// One decoded instruction: where it lives, its raw bytes and its metadata.
///
/// Produced by the CPU for the instruction it is executing and by
/// [`Instruction::decode`] for disassembly of arbitrary memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Instruction {
    pub addr: u16,
    pub opcode: u8,
    /// Operand bytes; only the first `info.addressing.operand_len()` are
    /// meaningful.
    pub operands: [u8; 2],
    pub info: &'static OpcodeInfo,
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            addr: 0,
            opcode: 0xEA,
            operands: [0; 2],
            info: opcode_info(0xEA),
        }
    }
}

impl Instruction {
    /// Decodes the instruction at `addr`, pulling bytes from `read`.
    ///
    /// `read` should be side-effect free (e.g. [`Nes::peek_cpu_byte`](crate::Nes::peek_cpu_byte)).
    pub fn decode(addr: u16, mut read: impl FnMut(u16) -> u8) -> Self {
        let opcode = read(addr);
        let info = opcode_info(opcode);
        let mut operands = [0; 2];
        for (i, byte) in operands
            .iter_mut()
            .enumerate()
            .take(info.addressing.operand_len() as usize)
        {
            *byte = read(addr.wrapping_add(1 + i as u16));
        }
        Self {
            addr,
            opcode,
            operands,
            info,
        }
    }

    /// Length in bytes, opcode included.
    pub fn size(&self) -> u16 {
        self.info.size()
    }

    /// Address of the following instruction.
    pub fn next_addr(&self) -> u16 {
        self.addr.wrapping_add(self.size())
    }

    fn word(&self) -> u16 {
        u16::from_le_bytes(self.operands)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.info.mnemonic;
        let [lo, _] = self.operands;
        match self.info.addressing {
            Addressing::Implied => write!(f, "{name}"),
            Addressing::Accumulator => write!(f, "{name} A"),
            Addressing::Immediate => write!(f, "{name} #${lo:02X}"),
            Addressing::ZeroPage => write!(f, "{name} ${lo:02X}"),
            Addressing::ZeroPageX => write!(f, "{name} ${lo:02X},X"),
            Addressing::ZeroPageY => write!(f, "{name} ${lo:02X},Y"),
            Addressing::Absolute => write!(f, "{name} ${:04X}", self.word()),
            Addressing::AbsoluteX => write!(f, "{name} ${:04X},X", self.word()),
            Addressing::AbsoluteY => write!(f, "{name} ${:04X},Y", self.word()),
            Addressing::Indirect => write!(f, "{name} (${:04X})", self.word()),
            Addressing::IndirectX => write!(f, "{name} (${lo:02X},X)"),
            Addressing::IndirectY => write!(f, "{name} (${lo:02X}),Y"),
            Addressing::Relative => {
                let target = self.next_addr().wrapping_add(lo as i8 as u16);
                write!(f, "{name} ${target:04X}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> Instruction {
        Instruction::decode(0x8000, |addr| {
            bytes.get((addr - 0x8000) as usize).copied().unwrap_or(0)
        })
    }

    #[test]
    fn formats_each_operand_shape() {
        assert_eq!(decode(&[0xA9, 0x80]).to_string(), "LDA #$80");
        assert_eq!(decode(&[0x6C, 0x34, 0x12]).to_string(), "JMP ($1234)");
        assert_eq!(decode(&[0xB1, 0x10]).to_string(), "LDA ($10),Y");
        assert_eq!(decode(&[0x0A]).to_string(), "ASL A");
        assert_eq!(decode(&[0x02]).to_string(), "???");
    }

    #[test]
    fn branch_shows_absolute_target() {
        let bne = decode(&[0xD0, 0xFE]);
        assert_eq!(bne.size(), 2);
        assert_eq!(bne.to_string(), "BNE $8000");
    }
}
