use uuid::Uuid;
use zerocopy::byteorder::little_endian::{U32, U64};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::checksum;
use crate::guid;
use crate::layout::{
    BAT_REGION_LENGTH, BAT_REGION_OFFSET, METADATA_REGION_LENGTH, METADATA_REGION_OFFSET,
    REGION_TABLE_SIGNATURE, REGION_TABLE_SIZE,
};

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RegionTableHeaderRaw {
    pub signature: [u8; 4], // 0x00 - "regi"
    pub checksum: U32,      // 0x04
    pub entry_count: U32,   // 0x08
    pub reserved: U32,      // 0x0C
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct RegionTableEntryRaw {
    pub guid: [u8; 16],   // 0x00
    pub file_offset: U64, // 0x10
    pub length: U32,      // 0x18
    pub required: U32,    // 0x1C - bit 0 set means readers must understand the region
}

/// A region listed in the region table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionEntry {
    pub guid: Uuid,
    pub file_offset: u64,
    pub length: u32,
}

impl RegionEntry {
    fn to_raw(self) -> RegionTableEntryRaw {
        RegionTableEntryRaw {
            guid: guid::to_disk(&self.guid),
            file_offset: U64::new(self.file_offset),
            length: U32::new(self.length),
            required: U32::ZERO,
        }
    }
}

/// Regions in slot order: BAT first, then metadata.
pub const REGION_ENTRIES: [RegionEntry; 2] = [
    RegionEntry {
        guid: guid::BAT_REGION,
        file_offset: BAT_REGION_OFFSET as u64,
        length: BAT_REGION_LENGTH as u32,
    },
    RegionEntry {
        guid: guid::METADATA_REGION,
        file_offset: METADATA_REGION_OFFSET as u64,
        length: METADATA_REGION_LENGTH as u32,
    },
];

const ENTRY_SIZE: usize = size_of::<RegionTableEntryRaw>();

/// Renders a region table into `block`. The output does not depend on any
/// input, so both copies in an image are identical.
pub fn write_region_table(block: &mut [u8; REGION_TABLE_SIZE]) {
    block.fill(0);

    let header = RegionTableHeaderRaw {
        signature: REGION_TABLE_SIGNATURE,
        checksum: U32::ZERO,
        entry_count: U32::new(REGION_ENTRIES.len() as u32),
        reserved: U32::ZERO,
    };
    let header_len = size_of::<RegionTableHeaderRaw>();
    block[..header_len].copy_from_slice(header.as_bytes());

    for (slot, entry) in REGION_ENTRIES.iter().enumerate() {
        let start = header_len + slot * ENTRY_SIZE;
        block[start..start + ENTRY_SIZE].copy_from_slice(entry.to_raw().as_bytes());
    }

    checksum::seal(block);
}
