//! The loaded-image contract (spec.md §6 "Loaded image contract").
//!
//! The real program-image loader (the OS-provided segment loader) is
//! explicitly out of scope (spec.md §1); what the core needs is just
//! enough of the format to find the entry point and hand back a flat
//! [`crate::patch::AddressSpace`] for the first segment. See SPEC_FULL.md
//! §6 for why the length prefix is resolved as 16 bits here.

use crate::error::{CoreError, MalformedImageSnafu};
use crate::patch::AddressSpace;
use log::info;
use snafu::ensure;

/// A loaded segmented executable image, reduced to what the debugger core
/// needs: the first segment's code, loaded starting at a chosen base
/// address, with the entry point immediately after the segment's length
/// word.
pub struct Image {
    memory: AddressSpace,
    entry_point: u32,
}

impl Image {
    /// Parses `bytes` as a segmented image: a 16-bit big-endian length word
    /// (the byte length of the code that follows) followed by that much
    /// code. The segment is loaded at `load_base`; the entry point is
    /// `load_base + 2` (immediately after the length word).
    pub fn parse(bytes: &[u8], load_base: u32) -> Result<Self, CoreError> {
        ensure!(
            bytes.len() >= 2,
            MalformedImageSnafu {
                reason: "image shorter than the segment length word"
            }
        );
        let declared_len = u16::from_be_bytes([bytes[0], bytes[1]]) as usize;
        let code = &bytes[2..];
        ensure!(
            declared_len <= code.len(),
            MalformedImageSnafu {
                reason: "declared segment length exceeds the bytes available"
            }
        );

        let entry_point = load_base + 2;
        let memory = AddressSpace::new(load_base, bytes.to_vec());
        info!("parsed segmented image: {declared_len} bytes of code, entry point {entry_point:#x}");
        Ok(Self {
            memory,
            entry_point,
        })
    }

    pub fn entry_point(&self) -> u32 {
        self.entry_point
    }

    pub fn memory(&self) -> &AddressSpace {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut AddressSpace {
        &mut self.memory
    }

    /// Consumes the image, handing back its backing memory and entry point.
    pub fn into_parts(self) -> (AddressSpace, u32) {
        (self.memory, self.entry_point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_point_is_right_after_length_word() {
        // length word = 6, then NOP; NOP; RTS
        let bytes = [0x00, 0x06, 0x4E, 0x71, 0x4E, 0x71, 0x4E, 0x75];
        let image = Image::parse(&bytes, 0x2000).unwrap();
        assert_eq!(image.entry_point(), 0x2002);
        assert_eq!(image.memory().read_opcode(0x2002).unwrap(), 0x4E71);
    }

    #[test]
    fn declared_length_longer_than_data_is_rejected() {
        let bytes = [0xFF, 0xFF, 0x4E, 0x71];
        assert!(Image::parse(&bytes, 0x2000).is_err());
    }

    #[test]
    fn too_short_for_header_is_rejected() {
        let bytes = [0x00];
        assert!(Image::parse(&bytes, 0x2000).is_err());
    }
}
