use thiserror::Error;
use strum_macros::Display;

/// Which packed field a lookup was indexed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Field {
    #[strum(serialize = "reg")]
    Register,
    #[strum(serialize = "r/m")]
    RegisterOrMemory,
}

/// Why a single instruction failed to decode.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unrecognized opcode in instruction byte {byte:08b}")]
    UnrecognizedOpcode { byte: u8 },

    // Fields are masked to 3 bits before lookup, so seeing this means the bit extraction is wrong.
    #[error("invalid {field} field value {value:#b}")]
    InvalidField { field: Field, value: u8 },

    #[error("truncated instruction: needed {needed} more byte(s) but only {available} remain")]
    TruncatedInstruction { needed: usize, available: usize },
}

/// A [`DecodeError`] pinned to the offset of the first byte of the instruction that caused it.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("invalid instruction at offset {offset}: {error}")]
pub struct InstructionError {
    pub offset: usize,
    pub error: DecodeError,
}

pub type DecodeResult<T> = Result<T, DecodeError>;
