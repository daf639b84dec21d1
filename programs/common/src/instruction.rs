//! Instruction data deserialization helpers
//!
//! All reads are bounds-checked and fail with `InvalidInstruction` on
//! truncated input.

use crate::error::ZodError;
use crate::types::Symbol;
use pinocchio::pubkey::Pubkey;

/// Sequential reader over instruction data with a tracked offset.
pub struct InstructionReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl<'a> InstructionReader<'a> {
    #[inline]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, offset: 0 }
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.offset)
    }

    pub fn read_u8(&mut self) -> Result<u8, ZodError> {
        if self.offset >= self.data.len() {
            return Err(ZodError::InvalidInstruction);
        }
        let v = self.data[self.offset];
        self.offset += 1;
        Ok(v)
    }

    pub fn read_u16(&mut self) -> Result<u16, ZodError> {
        Ok(u16::from_le_bytes(self.read_bytes::<2>()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, ZodError> {
        Ok(u64::from_le_bytes(self.read_bytes::<8>()?))
    }

    pub fn read_pubkey(&mut self) -> Result<Pubkey, ZodError> {
        Ok(Pubkey::from(self.read_bytes::<32>()?))
    }

    pub fn read_symbol(&mut self) -> Result<Symbol, ZodError> {
        Ok(Symbol {
            data: self.read_bytes::<24>()?,
        })
    }

    /// Optional u64 encoded as a one-byte flag followed by the value.
    pub fn read_opt_u64(&mut self) -> Result<Option<u64>, ZodError> {
        match self.read_u8()? {
            0 => Ok(None),
            1 => Ok(Some(self.read_u64()?)),
            _ => Err(ZodError::InvalidInstruction),
        }
    }

    pub fn read_bytes<const N: usize>(&mut self) -> Result<[u8; N], ZodError> {
        if self.offset + N > self.data.len() {
            return Err(ZodError::InvalidInstruction);
        }
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(&self.data[self.offset..self.offset + N]);
        self.offset += N;
        Ok(bytes)
    }
}
