use std::fmt;

/// Operation executed by an opcode, independent of its addressing mode.
///
/// The unofficial operations are the stable ones test ROMs rely on. `ILL`
/// covers every opcode whose behaviour is not emulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    //Load/Store
    LAX,
    LDA,
    LDX,
    LDY,
    SAX,
    STA,
    STX,
    STY,
    //Transfer
    TAX,
    TAY,
    TSX,
    TXA,
    TXS,
    TYA,
    //Stack
    PHA,
    PHP,
    PLA,
    PLP,
    //Shift
    ASL,
    LSR,
    ROL,
    ROR,
    //Logic
    AND,
    BIT,
    EOR,
    ORA,
    //Arithmetic
    ADC,
    CMP,
    CPX,
    CPY,
    DCP,
    ISB,
    RLA,
    RRA,
    SBC,
    SLO,
    SRE,
    //Inc/Dec
    DEC,
    DEX,
    DEY,
    INC,
    INX,
    INY,
    //Control Flow
    BRK,
    JMP,
    JSR,
    RTI,
    RTS,
    //Branch
    BCC,
    BCS,
    BEQ,
    BMI,
    BNE,
    BPL,
    BVC,
    BVS,
    //Flags
    CLC,
    CLD,
    CLI,
    CLV,
    SEC,
    SED,
    SEI,
    //Misc
    NOP,
    ILL,
}

impl Mnemonic {
    /// Three-letter assembler name.
    pub const fn name(self) -> &'static str {
        match self {
            Mnemonic::LAX => "LAX",
            Mnemonic::LDA => "LDA",
            Mnemonic::LDX => "LDX",
            Mnemonic::LDY => "LDY",
            Mnemonic::SAX => "SAX",
            Mnemonic::STA => "STA",
            Mnemonic::STX => "STX",
            Mnemonic::STY => "STY",
            Mnemonic::TAX => "TAX",
            Mnemonic::TAY => "TAY",
            Mnemonic::TSX => "TSX",
            Mnemonic::TXA => "TXA",
            Mnemonic::TXS => "TXS",
            Mnemonic::TYA => "TYA",
            Mnemonic::PHA => "PHA",
            Mnemonic::PHP => "PHP",
            Mnemonic::PLA => "PLA",
            Mnemonic::PLP => "PLP",
            Mnemonic::ASL => "ASL",
            Mnemonic::LSR => "LSR",
            Mnemonic::ROL => "ROL",
            Mnemonic::ROR => "ROR",
            Mnemonic::AND => "AND",
            Mnemonic::BIT => "BIT",
            Mnemonic::EOR => "EOR",
            Mnemonic::ORA => "ORA",
            Mnemonic::ADC => "ADC",
            Mnemonic::CMP => "CMP",
            Mnemonic::CPX => "CPX",
            Mnemonic::CPY => "CPY",
            Mnemonic::DCP => "DCP",
            Mnemonic::ISB => "ISB",
            Mnemonic::RLA => "RLA",
            Mnemonic::RRA => "RRA",
            Mnemonic::SBC => "SBC",
            Mnemonic::SLO => "SLO",
            Mnemonic::SRE => "SRE",
            Mnemonic::DEC => "DEC",
            Mnemonic::DEX => "DEX",
            Mnemonic::DEY => "DEY",
            Mnemonic::INC => "INC",
            Mnemonic::INX => "INX",
            Mnemonic::INY => "INY",
            Mnemonic::BRK => "BRK",
            Mnemonic::JMP => "JMP",
            Mnemonic::JSR => "JSR",
            Mnemonic::RTI => "RTI",
            Mnemonic::RTS => "RTS",
            Mnemonic::BCC => "BCC",
            Mnemonic::BCS => "BCS",
            Mnemonic::BEQ => "BEQ",
            Mnemonic::BMI => "BMI",
            Mnemonic::BNE => "BNE",
            Mnemonic::BPL => "BPL",
            Mnemonic::BVC => "BVC",
            Mnemonic::BVS => "BVS",
            Mnemonic::CLC => "CLC",
            Mnemonic::CLD => "CLD",
            Mnemonic::CLI => "CLI",
            Mnemonic::CLV => "CLV",
            Mnemonic::SEC => "SEC",
            Mnemonic::SED => "SED",
            Mnemonic::SEI => "SEI",
            Mnemonic::NOP => "NOP",
            Mnemonic::ILL => "???",
        }
    }

    /// Read-modify-write operations write the unmodified value back before
    /// the result.
    pub const fn is_read_modify_write(self) -> bool {
        matches!(
            self,
            Mnemonic::ASL
                | Mnemonic::LSR
                | Mnemonic::ROL
                | Mnemonic::ROR
                | Mnemonic::INC
                | Mnemonic::DEC
                | Mnemonic::SLO
                | Mnemonic::SRE
                | Mnemonic::RLA
                | Mnemonic::RRA
                | Mnemonic::DCP
                | Mnemonic::ISB
        )
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
