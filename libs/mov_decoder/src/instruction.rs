use std::fmt;

use crate::fields::{ EffectiveAddressBase, Register };

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveAddress {
    /// mod = 00, r/m = 110: a 16-bit address with no base registers.
    Direct(u16),
    Base(EffectiveAddressBase),
    Displaced8(EffectiveAddressBase, i8),
    Displaced16(EffectiveAddressBase, u16),
}

impl fmt::Display for EffectiveAddress {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Direct(address) => write!(formatter, "[{}]", address),
            Self::Base(base) | Self::Displaced8(base, 0) => write!(formatter, "[{}]", base),
            Self::Displaced8(base, displacement) if *displacement < 0 => {
                write!(formatter, "[{}-{}]", base, displacement.unsigned_abs())
            },
            Self::Displaced8(base, displacement) => write!(formatter, "[{}+{}]", base, displacement),
            // assemblers keep an explicit word displacement even when it is zero
            Self::Displaced16(base, displacement) => write!(formatter, "[{}+{}]", base, displacement),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operand {
    Register(Register),
    Memory(EffectiveAddress),
    Immediate(u16),
}

impl fmt::Display for Operand {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Operand::Register(register) => write!(formatter, "{}", register),
            Operand::Memory(effective_address) => write!(formatter, "{}", effective_address),
            Operand::Immediate(data) => write!(formatter, "{}", data),
        }
    }
}

/// Which of the supported `mov` encodings an instruction was decoded from.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Mov_Imm_To_Reg,
    Mov_RegMem_ToFrom_Reg,
}

impl Encoding {
    pub fn mnemonic(self) -> &'static str {
        match self {
            Encoding::Mov_Imm_To_Reg | Encoding::Mov_RegMem_ToFrom_Reg => "mov",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedInstruction {
    pub encoding: Encoding,
    pub destination: Operand,
    pub source: Operand,
    /// Offset of the first instruction byte in the decoded buffer.
    pub offset: usize,
    /// Number of bytes the encoding occupies.
    pub size: u8,
}

impl DecodedInstruction {
    #[inline(always)]
    pub fn mnemonic(&self) -> &'static str { self.encoding.mnemonic() }
}

impl fmt::Display for DecodedInstruction {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        write!(formatter, "{} {},{}", self.mnemonic(), self.destination, self.source)
    }
}
