//! CRC-32C helpers for headers and region tables.

use crate::layout::CHECKSUM_OFFSET;

/// Computes the CRC-32C of `block` as if its checksum field were zero.
///
/// The block itself is left untouched, which makes this usable for
/// verifying already sealed structures.
///
/// # Panics
///
/// Panics if `block` is shorter than 8 bytes.
#[must_use]
pub fn compute(block: &[u8]) -> u32 {
    let field = CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4;

    let crc = crc32c::crc32c(&block[..field.start]);
    let crc = crc32c::crc32c_append(crc, &[0; 4]);
    crc32c::crc32c_append(crc, &block[field.end..])
}

/// Returns the checksum currently stored in `block`.
///
/// # Panics
///
/// Panics if `block` is shorter than 8 bytes.
#[must_use]
pub fn stored(block: &[u8]) -> u32 {
    let mut raw = [0; 4];
    raw.copy_from_slice(&block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4]);
    u32::from_le_bytes(raw)
}

/// Zeroes the checksum field, computes the CRC over the whole block and
/// stores the result. Must run after every other field has been written.
pub(crate) fn seal(block: &mut [u8]) {
    block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].fill(0);
    let crc = crc32c::crc32c(block);
    block[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].copy_from_slice(&crc.to_le_bytes());
}
