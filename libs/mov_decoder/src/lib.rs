//! Decoder for the two 8086 `mov` encodings: immediate to register, and register/memory to/from
//! register in all four addressing modes.
//!
//! ```
//! let lines = mov_decoder::disassemble(&[0x89, 0xd8, 0xb8, 0x03, 0x00]).unwrap();
//! assert_eq!(lines, ["mov ax,bx", "mov ax,3"]);
//! ```

pub mod decoder;
pub mod error;
pub mod fields;
pub mod instruction;
pub mod stream;

pub use decoder::{ classify, decode_all, decode_instruction, disassemble, Decoder };
pub use error::{ DecodeError, Field, InstructionError };
pub use fields::{ effective_address_expression, register_name, EffectiveAddressBase, Register };
pub use instruction::{ DecodedInstruction, EffectiveAddress, Encoding, Operand };
pub use stream::ByteStream;
