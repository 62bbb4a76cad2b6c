use log::trace;

use crate::error::{ DecodeError, DecodeResult };

/// Read-only view over an instruction buffer with a forward-only cursor.
///
/// The cursor never moves backwards and never passes the end of the buffer. Reads that would need
/// more bytes than remain fail with [`DecodeError::TruncatedInstruction`] without consuming
/// anything.
pub struct ByteStream<'a> { bytes: &'a [u8], cursor: usize }

impl<'a> ByteStream<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, cursor: 0 }
    }

    #[inline(always)]
    pub fn position(&self) -> usize { self.cursor }

    #[inline(always)]
    pub fn remaining(&self) -> usize { self.bytes.len() - self.cursor }

    #[inline(always)]
    pub fn is_at_end(&self) -> bool { self.cursor >= self.bytes.len() }

    /// Moves the cursor to the end of the buffer. Used when nothing after the current point can be
    /// decoded any more.
    pub fn exhaust(&mut self) { self.cursor = self.bytes.len(); }

    fn ensure_available(&self, needed: usize) -> DecodeResult<()> {
        let available = self.remaining();
        if available < needed {
            Err(DecodeError::TruncatedInstruction { needed, available })
        } else {
            Ok(())
        }
    }

    pub fn read_u8(&mut self) -> DecodeResult<u8> {
        self.ensure_available(1)?;
        let byte = self.bytes[self.cursor];
        trace!("byte {:#06x}: {:08b}", self.cursor, byte);
        self.cursor += 1;
        Ok(byte)
    }

    /// Reads two bytes as a little-endian word.
    pub fn read_u16_le(&mut self) -> DecodeResult<u16> {
        self.ensure_available(2)?;
        let lo = self.read_u8()?;
        let hi = self.read_u8()?;
        Ok(u16::from_le_bytes([lo, hi]))
    }

    /// Reads immediate data: a word when `wide`, otherwise a zero-extended byte.
    #[inline(always)]
    pub fn read_data(&mut self, wide: bool) -> DecodeResult<u16> {
        if wide { self.read_u16_le() } else { self.read_u8().map(u16::from) }
    }
}
