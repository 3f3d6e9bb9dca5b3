//! The code-patch primitive (spec.md §4.1).
//!
//! Reads and writes a 16-bit opcode cell at an arbitrary address in the
//! shared address space. This performs no breakpoint bookkeeping of its
//! own — that lives in [`crate::breakpoint`] — it only knows how to get a
//! big-endian 16-bit value in or out of the backing image buffer, the same
//! narrow responsibility `Hook::copy_page` has in the teacher crate before
//! `HookManager` layers bookkeeping on top.

use crate::error::{CoreError, InvalidAddressSnafu};
use snafu::ensure;

/// A contiguous, addressable view of the target's loaded image.
///
/// `base` is the address the first byte of `bytes` is loaded at (the image
/// entry point, per spec.md §6: "Breakpoints are specified as byte offsets
/// from the entry point").
pub struct AddressSpace {
    base: u32,
    bytes: Vec<u8>,
}

impl AddressSpace {
    pub fn new(base: u32, bytes: Vec<u8>) -> Self {
        Self { base, bytes }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Address one past the last addressable byte, for bounds-checking.
    pub fn bound(&self) -> u32 {
        self.base + self.bytes.len() as u32
    }

    fn offset_of(&self, address: u32) -> Result<usize, CoreError> {
        ensure!(
            address >= self.base && (address as u64 + 2) <= self.bound() as u64,
            InvalidAddressSnafu {
                address,
                bound: self.bound(),
            }
        );
        Ok((address - self.base) as usize)
    }

    /// Reads the 16-bit opcode at `address`. Fails with
    /// [`CoreError::InvalidAddress`] when the address (or the cell that
    /// follows it) lies outside the loaded image bounds.
    pub fn read_opcode(&self, address: u32) -> Result<u16, CoreError> {
        let off = self.offset_of(address)?;
        Ok(u16::from_be_bytes([self.bytes[off], self.bytes[off + 1]]))
    }

    /// Writes `opcode` at `address`. spec.md §4.1: "replaces it atomically
    /// with respect to the target (the target is stopped at the moment of
    /// every patch in the normal flow)" — we rely on the caller (the
    /// breakpoint table, only ever mutated while the target is stopped per
    /// spec.md §5) to uphold that, not on any locking here.
    pub fn write_opcode(&mut self, address: u32, opcode: u16) -> Result<(), CoreError> {
        let off = self.offset_of(address)?;
        let [hi, lo] = opcode.to_be_bytes();
        self.bytes[off] = hi;
        self.bytes[off + 1] = lo;
        Ok(())
    }

    /// Reads a raw byte, used by the interpreter for operand bytes that
    /// aren't opcodes.
    pub fn read_byte(&self, address: u32) -> Result<u8, CoreError> {
        ensure!(
            address >= self.base && address < self.bound(),
            InvalidAddressSnafu {
                address,
                bound: self.bound(),
            }
        );
        Ok(self.bytes[(address - self.base) as usize])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_write_then_read() {
        let mut mem = AddressSpace::new(0x1000, vec![0; 8]);
        mem.write_opcode(0x1002, 0xABCD).unwrap();
        assert_eq!(mem.read_opcode(0x1002).unwrap(), 0xABCD);
    }

    #[test]
    fn out_of_bounds_address_is_rejected() {
        let mem = AddressSpace::new(0x1000, vec![0; 4]);
        assert!(matches!(
            mem.read_opcode(0x1004),
            Err(CoreError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn address_below_base_is_rejected() {
        let mem = AddressSpace::new(0x1000, vec![0; 4]);
        assert!(matches!(
            mem.read_opcode(0x0FFE),
            Err(CoreError::InvalidAddress { .. })
        ));
    }
}
