//! Bitfield accessors for the packed instruction bytes and the lookup tables their 3-bit codes
//! index into.

use strum_macros::{ Display, IntoStaticStr };

use crate::error::{ DecodeError, DecodeResult, Field };

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum Register {
    // w = 0
    #[strum(serialize = "al")] Al,
    #[strum(serialize = "cl")] Cl,
    #[strum(serialize = "dl")] Dl,
    #[strum(serialize = "bl")] Bl,
    #[strum(serialize = "ah")] Ah,
    #[strum(serialize = "ch")] Ch,
    #[strum(serialize = "dh")] Dh,
    #[strum(serialize = "bh")] Bh,
    // w = 1
    #[strum(serialize = "ax")] Ax,
    #[strum(serialize = "cx")] Cx,
    #[strum(serialize = "dx")] Dx,
    #[strum(serialize = "bx")] Bx,
    #[strum(serialize = "sp")] Sp,
    #[strum(serialize = "bp")] Bp,
    #[strum(serialize = "si")] Si,
    #[strum(serialize = "di")] Di,
}

const REGISTERS: [[Register; 8]; 2] = [
    [ Register::Al, Register::Cl, Register::Dl, Register::Bl, Register::Ah, Register::Ch, Register::Dh, Register::Bh ],
    [ Register::Ax, Register::Cx, Register::Dx, Register::Bx, Register::Sp, Register::Bp, Register::Si, Register::Di ],
];

impl Register {
    pub fn from_code(code: u8, wide: bool) -> DecodeResult<Self> {
        REGISTERS[wide as usize]
            .get(code as usize)
            .copied()
            .ok_or(DecodeError::InvalidField { field: Field::Register, value: code })
    }

    /// The 3-bit code this register is encoded as.
    pub fn code(self) -> u8 {
        // Discriminants follow table order, so the low 3 bits are the code in both halves.
        self as u8 & 0b111
    }

    pub fn is_wide(self) -> bool { self as u8 >= Register::Ax as u8 }
}

pub fn register_name(code: u8, wide: bool) -> DecodeResult<&'static str> {
    Register::from_code(code, wide).map(Into::into)
}

/// Base register combinations selected by the r/m field of a memory operand.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr)]
pub enum EffectiveAddressBase {
    #[strum(serialize = "bx+si")] BX_SI,
    #[strum(serialize = "bx+di")] BX_DI,
    #[strum(serialize = "bp+si")] BP_SI,
    #[strum(serialize = "bp+di")] BP_DI,
    #[strum(serialize = "si")] SI,
    #[strum(serialize = "di")] DI,
    #[strum(serialize = "bp")] BP,
    #[strum(serialize = "bx")] BX,
}

const EFFECTIVE_ADDRESS_BASES: [EffectiveAddressBase; 8] = [
    EffectiveAddressBase::BX_SI,
    EffectiveAddressBase::BX_DI,
    EffectiveAddressBase::BP_SI,
    EffectiveAddressBase::BP_DI,
    EffectiveAddressBase::SI,
    EffectiveAddressBase::DI,
    EffectiveAddressBase::BP,
    EffectiveAddressBase::BX,
];

impl EffectiveAddressBase {
    pub fn from_code(code: u8) -> DecodeResult<Self> {
        EFFECTIVE_ADDRESS_BASES
            .get(code as usize)
            .copied()
            .ok_or(DecodeError::InvalidField { field: Field::RegisterOrMemory, value: code })
    }
}

pub fn effective_address_expression(code: u8) -> DecodeResult<&'static str> {
    EffectiveAddressBase::from_code(code).map(Into::into)
}

/// First byte of an instruction.
///
/// ```text
/// immediate to register:        1 0 1 1 | w | reg(3)
/// reg/mem to/from register:     1 0 0 0 1 0 | d | w
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionByte1(pub u8);

impl InstructionByte1 {
    const REGISTER_MEMORY_OPCODE: u8 = 0b100010;

    /// Top 4 bits: the opcode of the immediate-to-register form.
    #[inline(always)]
    pub fn opcode4(self) -> u8 { self.0 >> 4 }

    /// Top 6 bits: the opcode of the register/memory form.
    #[inline(always)]
    pub fn opcode6(self) -> u8 { self.0 >> 2 }

    /// Bit 1 (d). Set when the reg field names the destination.
    #[inline(always)]
    pub fn direction(self) -> bool { (self.0 >> 1) & 1 == 1 }

    /// Bit 0 (w) of the register/memory form.
    #[inline(always)]
    pub fn wide(self) -> bool { self.0 & 1 == 1 }

    /// Bit 3 (w) of the immediate-to-register form.
    #[inline(always)]
    pub fn immediate_wide(self) -> bool { (self.0 >> 3) & 1 == 1 }

    /// Bits 0..=2 (reg) of the immediate-to-register form.
    #[inline(always)]
    pub fn immediate_register(self) -> u8 { self.0 & 0b111 }

    pub fn register_memory(direction: bool, wide: bool) -> Self {
        Self(Self::REGISTER_MEMORY_OPCODE << 2 | (direction as u8) << 1 | wide as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressingMode {
    /// mod = 00
    Memory,
    /// mod = 01
    MemoryDisplacement8,
    /// mod = 10
    MemoryDisplacement16,
    /// mod = 11
    Register,
}

impl AddressingMode {
    pub fn from_bits(bits: u8) -> Self {
        match bits & 0b11 {
            0b00 => Self::Memory,
            0b01 => Self::MemoryDisplacement8,
            0b10 => Self::MemoryDisplacement16,
            _ => Self::Register,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            Self::Memory => 0b00,
            Self::MemoryDisplacement8 => 0b01,
            Self::MemoryDisplacement16 => 0b10,
            Self::Register => 0b11,
        }
    }
}

/// Second byte of the register/memory form: `mod(2) | reg(3) | r/m(3)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModRegRm(pub u8);

impl ModRegRm {
    /// Bits 6..=7.
    #[inline(always)]
    pub fn mode(self) -> AddressingMode { AddressingMode::from_bits(self.0 >> 6) }

    /// Bits 3..=5.
    #[inline(always)]
    pub fn reg(self) -> u8 { (self.0 >> 3) & 0b111 }

    /// Bits 0..=2.
    #[inline(always)]
    pub fn reg_or_mem(self) -> u8 { self.0 & 0b111 }

    pub fn from_fields(mode: AddressingMode, reg: u8, reg_or_mem: u8) -> Self {
        Self(mode.bits() << 6 | (reg & 0b111) << 3 | reg_or_mem & 0b111)
    }
}
