use log::{ debug, warn };

use crate::{
    error::{ DecodeError, DecodeResult, InstructionError },
    fields::{ AddressingMode, EffectiveAddressBase, InstructionByte1, ModRegRm, Register },
    instruction::{ DecodedInstruction, EffectiveAddress, Encoding, Operand },
    stream::ByteStream,
};

/// Picks the decode path for a leading instruction byte.
pub fn classify(byte: u8) -> DecodeResult<Encoding> {
    let opcode = InstructionByte1(byte);
    if opcode.opcode4() == 0b1011 {
        Ok(Encoding::Mov_Imm_To_Reg)
    } else if opcode.opcode6() == 0b100010 {
        Ok(Encoding::Mov_RegMem_ToFrom_Reg)
    } else {
        Err(DecodeError::UnrecognizedOpcode { byte })
    }
}

fn decode_immediate_to_register(stream: &mut ByteStream, opcode: InstructionByte1) -> DecodeResult<(Operand, Operand)> {
    let wide = opcode.immediate_wide();
    let register = Register::from_code(opcode.immediate_register(), wide)?;
    let data = stream.read_data(wide)?;

    Ok((Operand::Register(register), Operand::Immediate(data)))
}

/// Decodes the operand named by the mod and r/m fields, consuming any displacement bytes.
fn resolve_register_or_memory(stream: &mut ByteStream, operands: ModRegRm, wide: bool) -> DecodeResult<Operand> {
    let reg_or_mem = operands.reg_or_mem();
    let effective_address = match operands.mode() {
        AddressingMode::Register => return Ok(Operand::Register(Register::from_code(reg_or_mem, wide)?)),
        AddressingMode::Memory if reg_or_mem == 0b110 => EffectiveAddress::Direct(stream.read_u16_le()?),
        AddressingMode::Memory => EffectiveAddress::Base(EffectiveAddressBase::from_code(reg_or_mem)?),
        AddressingMode::MemoryDisplacement8 => {
            let base = EffectiveAddressBase::from_code(reg_or_mem)?;
            EffectiveAddress::Displaced8(base, stream.read_u8()? as i8)
        },
        AddressingMode::MemoryDisplacement16 => {
            let base = EffectiveAddressBase::from_code(reg_or_mem)?;
            EffectiveAddress::Displaced16(base, stream.read_u16_le()?)
        },
    };

    Ok(Operand::Memory(effective_address))
}

fn decode_register_memory(stream: &mut ByteStream, opcode: InstructionByte1) -> DecodeResult<(Operand, Operand)> {
    let wide = opcode.wide();
    let operands = ModRegRm(stream.read_u8()?);
    let register_operand = Operand::Register(Register::from_code(operands.reg(), wide)?);
    let other_operand = resolve_register_or_memory(stream, operands, wide)?;

    Ok(if opcode.direction() {
        (register_operand, other_operand)
    } else {
        (other_operand, register_operand)
    })
}

/// Decodes the instruction starting at the stream's cursor.
///
/// On success the cursor sits on the first byte of the next instruction. On failure it has moved
/// past the leading byte but never past the end of the buffer.
pub fn decode_instruction(stream: &mut ByteStream) -> DecodeResult<DecodedInstruction> {
    let offset = stream.position();
    let byte = stream.read_u8()?;
    let encoding = classify(byte)?;
    let opcode = InstructionByte1(byte);

    let (destination, source) = match encoding {
        Encoding::Mov_Imm_To_Reg => decode_immediate_to_register(stream, opcode)?,
        Encoding::Mov_RegMem_ToFrom_Reg => decode_register_memory(stream, opcode)?,
    };

    // Encodings top out at 4 bytes.
    let size = (stream.position() - offset) as u8;
    Ok(DecodedInstruction { encoding, destination, source, offset, size })
}

/// Walks a buffer one instruction at a time.
///
/// Each item is either a decoded instruction or the error that stopped one. After an error the
/// decoder resumes right after whatever it had already consumed; a truncated instruction consumes
/// the rest of the buffer, since nothing after it can be complete.
pub struct Decoder<'a> { stream: ByteStream<'a> }

impl<'a> Decoder<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { stream: ByteStream::new(bytes) }
    }

    #[inline(always)]
    pub fn position(&self) -> usize { self.stream.position() }
}

impl<'a> Iterator for Decoder<'a> {
    type Item = Result<DecodedInstruction, InstructionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stream.is_at_end() { return None; }

        let offset = self.stream.position();
        match decode_instruction(&mut self.stream) {
            Ok(instruction) => {
                debug!("{:#06x} ({} bytes): {}", offset, instruction.size, instruction);
                Some(Ok(instruction))
            },
            Err(error) => {
                warn!("failed to decode instruction at {:#06x}: {}", offset, error);
                if let DecodeError::TruncatedInstruction { .. } = error { self.stream.exhaust(); }
                Some(Err(InstructionError { offset, error }))
            },
        }
    }
}

/// Decodes every instruction in `bytes`, keeping failures in place.
pub fn decode_all(bytes: &[u8]) -> Vec<Result<DecodedInstruction, InstructionError>> {
    Decoder::new(bytes).collect()
}

/// Renders every instruction in `bytes` as a line of assembly, stopping at the first failure.
pub fn disassemble(bytes: &[u8]) -> Result<Vec<String>, InstructionError> {
    Decoder::new(bytes)
        .map(|decoded| decoded.map(|instruction| instruction.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{ rngs::SmallRng, Rng, SeedableRng };

    fn decode_one(bytes: &[u8]) -> DecodeResult<DecodedInstruction> {
        decode_instruction(&mut ByteStream::new(bytes))
    }

    fn decode_line(bytes: &[u8]) -> String {
        let instruction = decode_one(bytes).unwrap_or_else(|err| panic!("failed to decode {:02x?}: {}", bytes, err));
        assert_eq!(instruction.size as usize, bytes.len(), "wrong size for {:02x?}", bytes);
        instruction.to_string()
    }

    #[test]
    fn classifies_leading_bytes() {
        for byte in 0xb0..=0xbf { assert_eq!(classify(byte), Ok(Encoding::Mov_Imm_To_Reg)); }
        for byte in 0x88..=0x8b { assert_eq!(classify(byte), Ok(Encoding::Mov_RegMem_ToFrom_Reg)); }
        for byte in [0x00, 0x8c, 0x8e, 0xa0, 0xc6, 0xff] {
            assert_eq!(classify(byte), Err(DecodeError::UnrecognizedOpcode { byte }));
        }
    }

    #[test]
    fn immediate_to_register() {
        assert_eq!(decode_line(&[0xb8, 0x03, 0x00]), "mov ax,3");
        assert_eq!(decode_line(&[0xb0, 0x03]), "mov al,3");
        assert_eq!(decode_line(&[0xb1, 0x0c]), "mov cl,12");
        assert_eq!(decode_line(&[0xb5, 0xf4]), "mov ch,244");
        assert_eq!(decode_line(&[0xba, 0x6c, 0x0f]), "mov dx,3948");
        assert_eq!(decode_line(&[0xba, 0x94, 0xf0]), "mov dx,61588");
    }

    #[test]
    fn register_mode() {
        assert_eq!(decode_line(&[0x89, 0xd8]), "mov ax,bx");
        assert_eq!(decode_line(&[0x89, 0xd9]), "mov cx,bx");
        assert_eq!(decode_line(&[0x88, 0xe5]), "mov ch,ah");
        assert_eq!(decode_line(&[0x89, 0xde]), "mov si,bx");
        assert_eq!(decode_line(&[0x8b, 0xd8]), "mov bx,ax");
    }

    #[test]
    fn memory_without_displacement() {
        assert_eq!(decode_line(&[0x8a, 0x00]), "mov al,[bx+si]");
        assert_eq!(decode_line(&[0x8b, 0x1b]), "mov bx,[bp+di]");
        assert_eq!(decode_line(&[0x89, 0x09]), "mov [bx+di],cx");
        assert_eq!(decode_line(&[0x88, 0x0a]), "mov [bp+si],cl");
    }

    #[test]
    fn direct_address() {
        assert_eq!(decode_line(&[0x8b, 0x1e, 0x34, 0x12]), "mov bx,[4660]");
        assert_eq!(decode_line(&[0x89, 0x36, 0x0f, 0x00]), "mov [15],si");
    }

    #[test]
    fn memory_with_byte_displacement() {
        assert_eq!(decode_line(&[0x8a, 0x60, 0x04]), "mov ah,[bx+si+4]");
        assert_eq!(decode_line(&[0x8b, 0x56, 0x00]), "mov dx,[bp]");
        assert_eq!(decode_line(&[0x8b, 0x41, 0xdb]), "mov ax,[bx+di-37]");
        assert_eq!(decode_line(&[0x89, 0x4f, 0xfd]), "mov [bx-3],cx");
    }

    #[test]
    fn memory_with_word_displacement() {
        assert_eq!(decode_line(&[0x8a, 0x80, 0x87, 0x13]), "mov al,[bx+si+4999]");
        assert_eq!(decode_line(&[0x8b, 0x86, 0x00, 0x00]), "mov ax,[bp+0]");
        assert_eq!(decode_line(&[0x89, 0x8f, 0xff, 0xff]), "mov [bx+65535],cx");
    }

    #[test]
    fn register_mode_reencodes() {
        for direction in [false, true] {
            for wide in [false, true] {
                for reg in 0..8 {
                    for reg_or_mem in 0..8 {
                        let opcode = InstructionByte1::register_memory(direction, wide);
                        let operands = ModRegRm::from_fields(AddressingMode::Register, reg, reg_or_mem);
                        let instruction = decode_one(&[opcode.0, operands.0]).unwrap();
                        assert_eq!(instruction.size, 2);

                        let (Operand::Register(destination), Operand::Register(source)) = (instruction.destination, instruction.source)
                        else { panic!("register mode decoded to memory operands: {}", instruction) };
                        let (decoded_reg, decoded_reg_or_mem) = if direction { (destination, source) } else { (source, destination) };

                        assert_eq!(destination.is_wide(), wide);
                        assert_eq!(InstructionByte1::register_memory(direction, destination.is_wide()), opcode);
                        assert_eq!(ModRegRm::from_fields(AddressingMode::Register, decoded_reg.code(), decoded_reg_or_mem.code()), operands);
                    }
                }
            }
        }
    }

    #[test]
    fn truncated_instructions() {
        let truncated = |needed, available| Err(DecodeError::TruncatedInstruction { needed, available });
        assert_eq!(decode_one(&[0xb8]), truncated(2, 0));
        assert_eq!(decode_one(&[0xb8, 0x01]), truncated(2, 1));
        assert_eq!(decode_one(&[0xb0]), truncated(1, 0));
        assert_eq!(decode_one(&[0x89]), truncated(1, 0));
        assert_eq!(decode_one(&[0x8a, 0x40]), truncated(1, 0));
        assert_eq!(decode_one(&[0x8a, 0x80, 0x87]), truncated(2, 1));
        assert_eq!(decode_one(&[0x8b, 0x1e]), truncated(2, 0));
    }

    #[test]
    fn decodes_a_listing() {
        let bytes = [
            0x89, 0xd9, // mov cx,bx
            0xb9, 0x0c, 0x00, // mov cx,12
            0x8b, 0x56, 0x00, // mov dx,[bp]
            0x88, 0x6e, 0x00, // mov [bp],ch
            0x8b, 0x41, 0xdb, // mov ax,[bx+di-37]
        ];
        let lines = disassemble(&bytes).unwrap();
        assert_eq!(lines, ["mov cx,bx", "mov cx,12", "mov dx,[bp]", "mov [bp],ch", "mov ax,[bx+di-37]"]);

        let offsets: Vec<usize> = Decoder::new(&bytes).map(|decoded| decoded.unwrap().offset).collect();
        assert_eq!(offsets, [0, 2, 5, 8, 11]);
    }

    #[test]
    fn errors_are_reported_in_place() {
        let bytes = [0x89, 0xd8, 0x0f, 0xb0, 0x07, 0xb8, 0x01];
        let entries = decode_all(&bytes);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].map(|instruction| instruction.to_string()), Ok(String::from("mov ax,bx")));
        assert_eq!(entries[1], Err(InstructionError { offset: 2, error: DecodeError::UnrecognizedOpcode { byte: 0x0f } }));
        assert_eq!(entries[2].map(|instruction| instruction.to_string()), Ok(String::from("mov al,7")));
        assert_eq!(
            entries[3],
            Err(InstructionError { offset: 5, error: DecodeError::TruncatedInstruction { needed: 2, available: 1 } })
        );

        let first_error = disassemble(&bytes).unwrap_err();
        assert_eq!(first_error.offset, 2);
    }

    #[test]
    fn empty_buffer() {
        assert!(decode_all(&[]).is_empty());
        assert_eq!(disassemble(&[]), Ok(vec![]));
    }

    #[test]
    fn random_buffers_never_overrun() {
        let mut rng = SmallRng::seed_from_u64(8086);
        for _ in 0..2000 {
            let length = rng.gen_range(0..64);
            let bytes: Vec<u8> = (0..length).map(|_| rng.gen()).collect();

            let mut decoder = Decoder::new(&bytes);
            let mut last_position = decoder.position();
            while let Some(decoded) = decoder.next() {
                assert!(decoder.position() > last_position, "decoder did not advance on {:02x?}", bytes);
                assert!(decoder.position() <= bytes.len());
                if let Ok(instruction) = decoded {
                    assert_eq!(instruction.offset, last_position);
                    assert_eq!(instruction.offset + instruction.size as usize, decoder.position());
                    assert!(!matches!(instruction.destination, Operand::Immediate(_)));
                }
                last_position = decoder.position();
            }
            assert_eq!(decoder.position(), bytes.len());
        }
    }
}
