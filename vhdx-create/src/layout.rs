//! Fixed offsets, sizes and signatures of the image produced by this crate.
//!
//! Every structure lives at a constant position inside the first 4 MiB of
//! the file. See the
//! [VHDX format specification](https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-vhdx/)
//! for the meaning of each region.

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;

/// Total length of the produced image.
pub const IMAGE_SIZE: usize = 4 * MIB;

/// File type identifier signature at offset 0.
pub const FILE_SIGNATURE: [u8; 8] = *b"vhdxfile";

/// Offset of the UTF-16LE creator string inside the file type identifier.
pub const CREATOR_OFFSET: usize = 8;

/// Maximum length of the encoded creator string, in bytes.
pub const CREATOR_MAX_LEN: usize = 512;

pub const HEADER_1_OFFSET: usize = 64 * KIB;
pub const HEADER_2_OFFSET: usize = 128 * KIB;
pub const HEADER_SIZE: usize = 4 * KIB;
pub const HEADER_SIGNATURE: [u8; 4] = *b"head";

pub const REGION_TABLE_1_OFFSET: usize = 192 * KIB;
pub const REGION_TABLE_2_OFFSET: usize = 256 * KIB;
pub const REGION_TABLE_SIZE: usize = 64 * KIB;
pub const REGION_TABLE_SIGNATURE: [u8; 4] = *b"regi";

pub const BAT_REGION_OFFSET: usize = 2 * MIB;
pub const BAT_REGION_LENGTH: usize = MIB;

pub const METADATA_REGION_OFFSET: usize = 3 * MIB;
pub const METADATA_REGION_LENGTH: usize = MIB;
pub const METADATA_SIGNATURE: [u8; 8] = *b"metadata";

/// Start of the packed metadata payloads, relative to the metadata region.
pub const METADATA_PAYLOAD_OFFSET: usize = 64 * KIB;

/// Offset of the 4-byte checksum field in headers and region tables.
pub const CHECKSUM_OFFSET: usize = 4;

/// Placement of the log that headers point at. No log entries are written.
pub const LOG_OFFSET: u64 = 0x10_0000;
pub const LOG_LENGTH: u32 = MIB as u32;

pub const FORMAT_VERSION: u16 = 1;
pub const LOG_VERSION: u16 = 0;

pub const LOGICAL_SECTOR_SIZE: u32 = 512;
pub const PHYSICAL_SECTOR_SIZE: u32 = 4096;

/// Payload block size advertised in the file parameters (32 MiB).
pub const BLOCK_SIZE: u32 = 32 * MIB as u32;
