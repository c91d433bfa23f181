use snafu::ResultExt;

use crate::header::{self, WRITE_GUIDS_LEN};
use crate::layout::{
    CREATOR_OFFSET, FILE_SIGNATURE, HEADER_1_OFFSET, HEADER_2_OFFSET, IMAGE_SIZE,
    METADATA_REGION_LENGTH, METADATA_REGION_OFFSET, REGION_TABLE_1_OFFSET, REGION_TABLE_2_OFFSET,
};
use crate::metadata::{self, MetadataKind, MetadataOverrides};
use crate::params::ValidatedParams;
use crate::region;
use crate::{CreateError, PayloadOverflowSnafu};

/// Number of random bytes consumed by [`build_image`].
///
/// | Range      | Use                                         |
/// |------------|---------------------------------------------|
/// | `0..16`    | virtual disk id, unless one was supplied    |
/// | `16..48`   | file and data write GUIDs of header 1       |
/// | `48..80`   | file and data write GUIDs of header 2       |
pub const RANDOM_LEN: usize = HEADER_2_GUIDS + WRITE_GUIDS_LEN;

const DISK_ID: usize = 0;
const HEADER_1_GUIDS: usize = DISK_ID + 16;
const HEADER_2_GUIDS: usize = HEADER_1_GUIDS + WRITE_GUIDS_LEN;

/// Builds a complete 4 MiB image from validated parameters and a single
/// random draw.
///
/// The result only depends on the inputs, so identical arguments produce
/// identical images.
pub fn build_image(
    params: &ValidatedParams,
    random: &[u8; RANDOM_LEN],
) -> Result<Vec<u8>, CreateError> {
    let mut image = vec![0u8; IMAGE_SIZE];

    image[..FILE_SIGNATURE.len()].copy_from_slice(&FILE_SIGNATURE);
    let creator = params.creator_utf16();
    image[CREATOR_OFFSET..CREATOR_OFFSET + creator.len()].copy_from_slice(creator);

    let mut overrides = MetadataOverrides::new();
    overrides.set(MetadataKind::VirtualDiskSize, params.size.to_le_bytes());
    let disk_id = match params.disk_id() {
        Some(id) => *id,
        None => random_array(random, DISK_ID),
    };
    overrides.set(MetadataKind::VirtualDiskId, disk_id);

    for (sequence_number, offset, guids) in [
        (1, HEADER_1_OFFSET, HEADER_1_GUIDS),
        (2, HEADER_2_OFFSET, HEADER_2_GUIDS),
    ] {
        header::write_header(
            block_mut(&mut image, offset),
            sequence_number,
            &random_array(random, guids),
        );
    }
    tracing::debug!("wrote headers");

    for offset in [REGION_TABLE_1_OFFSET, REGION_TABLE_2_OFFSET] {
        region::write_region_table(block_mut(&mut image, offset));
    }
    tracing::debug!("wrote region tables");

    metadata::write_metadata(
        &mut image[METADATA_REGION_OFFSET..METADATA_REGION_OFFSET + METADATA_REGION_LENGTH],
        &overrides,
    )
    .context(PayloadOverflowSnafu)?;
    tracing::debug!(disk_id = %crate::guid::decode(&disk_id), "wrote metadata");

    Ok(image)
}

fn block_mut<const N: usize>(image: &mut [u8], offset: usize) -> &mut [u8; N] {
    (&mut image[offset..offset + N])
        .try_into()
        .expect("block slice is correctly sized")
}

fn random_array<const N: usize>(random: &[u8; RANDOM_LEN], start: usize) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&random[start..start + N]);
    out
}
