use zerocopy::byteorder::little_endian::{U16, U32, U64};
use zerocopy::{FromBytes, FromZeros, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::checksum;
use crate::layout::{
    FORMAT_VERSION, HEADER_SIGNATURE, HEADER_SIZE, LOG_LENGTH, LOG_OFFSET, LOG_VERSION,
};

/// Length of the random input for one header: file write GUID followed by
/// data write GUID.
pub const WRITE_GUIDS_LEN: usize = 32;

/// Fixed part of a VHDX header. The rest of the 4 KiB block is reserved.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct HeaderRaw {
    pub signature: [u8; 4],        // 0x00 - "head"
    pub checksum: U32,             // 0x04 - CRC-32C over the whole block
    pub sequence_number: U64,      // 0x08 - higher value is the current header
    pub file_write_guid: [u8; 16], // 0x10
    pub data_write_guid: [u8; 16], // 0x20
    pub log_guid: [u8; 16],        // 0x30 - zero when there is no log to replay
    pub log_version: U16,          // 0x40
    pub version: U16,              // 0x42
    pub log_length: U32,           // 0x44
    pub log_offset: U64,           // 0x48
}

impl HeaderRaw {
    fn new(sequence_number: u64, write_guids: &[u8; WRITE_GUIDS_LEN]) -> Self {
        let (file_write, data_write) = write_guids.split_at(16);
        let mut raw = Self::new_zeroed();

        raw.signature = HEADER_SIGNATURE;
        raw.sequence_number.set(sequence_number);
        raw.file_write_guid.copy_from_slice(file_write);
        raw.data_write_guid.copy_from_slice(data_write);
        raw.log_version.set(LOG_VERSION);
        raw.version.set(FORMAT_VERSION);
        raw.log_length.set(LOG_LENGTH);
        raw.log_offset.set(LOG_OFFSET);
        raw
    }
}

/// Renders one header into `block`.
///
/// The two headers of an image must be given different `write_guids`.
pub fn write_header(
    block: &mut [u8; HEADER_SIZE],
    sequence_number: u64,
    write_guids: &[u8; WRITE_GUIDS_LEN],
) {
    let raw = HeaderRaw::new(sequence_number, write_guids);
    let (fixed, reserved) = block.split_at_mut(size_of::<HeaderRaw>());
    fixed.copy_from_slice(raw.as_bytes());
    reserved.fill(0);

    checksum::seal(block);
}
