//! The metadata region: a table of known items followed by their payloads.

use std::fmt;

use snafu::{OptionExt, Snafu, ensure};
use uuid::Uuid;
use zerocopy::byteorder::little_endian::{U16, U32};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

use crate::guid;
use crate::layout::{
    BLOCK_SIZE, LOGICAL_SECTOR_SIZE, METADATA_PAYLOAD_OFFSET, METADATA_SIGNATURE,
    PHYSICAL_SECTOR_SIZE,
};

/// Errors when laying out the metadata payloads.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum PayloadOverflowError {
    #[snafu(display("creator is {len} bytes as UTF-16, at most {limit} fit"))]
    CreatorTooLong { len: usize, limit: usize },

    #[snafu(display("virtual disk size {size} does not fit a signed 64-bit field"))]
    SizeTooLarge { size: u64 },

    #[snafu(display(
        "{kind} payload of {len} bytes at offset {offset:#x} exceeds the {limit} byte metadata region"
    ))]
    RegionFull {
        kind: MetadataKind,
        offset: usize,
        len: usize,
        limit: usize,
    },

    #[snafu(display("no payload for {kind}"))]
    MissingPayload { kind: MetadataKind },
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct MetadataTableHeaderRaw {
    pub signature: [u8; 8],  // 0x00 - "metadata"
    pub reserved: U16,       // 0x08
    pub entry_count: U32,    // 0x0A
    pub reserved2: [u8; 18], // 0x0E
}

#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct MetadataTableEntryRaw {
    pub item_id: [u8; 16], // 0x00
    pub offset: U32,       // 0x10 - relative to the start of the metadata region
    pub length: U32,       // 0x14
    pub flags: u8,         // 0x18 - see MetadataFlags
    pub reserved: [u8; 7], // 0x19
}

const HEADER_SIZE: usize = size_of::<MetadataTableHeaderRaw>();
const ENTRY_SIZE: usize = size_of::<MetadataTableEntryRaw>();

/// Block size followed by a zero flags word: blocks are not kept allocated
/// and the disk has no parent.
const FILE_PARAMETERS_PAYLOAD: [u8; 8] = {
    let block = BLOCK_SIZE.to_le_bytes();
    [block[0], block[1], block[2], block[3], 0, 0, 0, 0]
};
const LOGICAL_SECTOR_PAYLOAD: [u8; 4] = LOGICAL_SECTOR_SIZE.to_le_bytes();
const PHYSICAL_SECTOR_PAYLOAD: [u8; 4] = PHYSICAL_SECTOR_SIZE.to_le_bytes();

bitflags::bitflags! {
    /// Flags stored in the first byte after an entry's length.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MetadataFlags: u8 {
        const IS_USER = 0x01;
        const IS_VIRTUAL_DISK = 0x02;
        const IS_REQUIRED = 0x04;
    }
}

/// The metadata items written into every image, in table order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetadataKind {
    FileParameters,
    VirtualDiskSize,
    LogicalSectorSize,
    PhysicalSectorSize,
    VirtualDiskId,
}

impl MetadataKind {
    /// All kinds in the order they appear in the table and in the payload area.
    pub const ALL: [Self; 5] = [
        Self::FileParameters,
        Self::VirtualDiskSize,
        Self::LogicalSectorSize,
        Self::PhysicalSectorSize,
        Self::VirtualDiskId,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn guid(self) -> Uuid {
        match self {
            Self::FileParameters => guid::FILE_PARAMETERS,
            Self::VirtualDiskSize => guid::VIRTUAL_DISK_SIZE,
            Self::LogicalSectorSize => guid::LOGICAL_SECTOR_SIZE,
            Self::PhysicalSectorSize => guid::PHYSICAL_SECTOR_SIZE,
            Self::VirtualDiskId => guid::VIRTUAL_DISK_ID,
        }
    }

    #[must_use]
    pub const fn flags(self) -> MetadataFlags {
        match self {
            Self::FileParameters => MetadataFlags::IS_REQUIRED,
            _ => MetadataFlags::IS_VIRTUAL_DISK.union(MetadataFlags::IS_REQUIRED),
        }
    }

    /// Payload used when the caller supplies none.
    ///
    /// Size and disk id are per-image and have no default.
    #[must_use]
    pub const fn default_payload(self) -> Option<&'static [u8]> {
        match self {
            Self::FileParameters => Some(&FILE_PARAMETERS_PAYLOAD),
            Self::LogicalSectorSize => Some(&LOGICAL_SECTOR_PAYLOAD),
            Self::PhysicalSectorSize => Some(&PHYSICAL_SECTOR_PAYLOAD),
            Self::VirtualDiskSize | Self::VirtualDiskId => None,
        }
    }
}

impl fmt::Display for MetadataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FileParameters => "file parameters",
            Self::VirtualDiskSize => "virtual disk size",
            Self::LogicalSectorSize => "logical sector size",
            Self::PhysicalSectorSize => "physical sector size",
            Self::VirtualDiskId => "virtual disk id",
        };
        f.write_str(name)
    }
}

/// Per-image payloads keyed by [`MetadataKind`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataOverrides {
    slots: [Option<Vec<u8>>; MetadataKind::ALL.len()],
}

impl MetadataOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, kind: MetadataKind, payload: impl Into<Vec<u8>>) {
        self.slots[kind.index()] = Some(payload.into());
    }

    #[must_use]
    pub fn get(&self, kind: MetadataKind) -> Option<&[u8]> {
        self.slots[kind.index()].as_deref()
    }

    /// Returns the override for `kind`, falling back to its default payload.
    fn resolve(&self, kind: MetadataKind) -> Option<&[u8]> {
        self.get(kind).or(kind.default_payload())
    }
}

/// One resolved payload and where it goes inside the metadata region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadPlacement<'a> {
    pub kind: MetadataKind,
    pub offset: usize,
    pub payload: &'a [u8],
}

impl PayloadPlacement<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Assigns payload offsets in table order, starting at
/// [`METADATA_PAYLOAD_OFFSET`] and packing without gaps.
///
/// Fails if any payload is missing or would run past `region_len`.
pub fn plan_payloads(
    overrides: &MetadataOverrides,
    region_len: usize,
) -> Result<Vec<PayloadPlacement<'_>>, PayloadOverflowError> {
    let mut cursor = METADATA_PAYLOAD_OFFSET;
    let mut placements = Vec::with_capacity(MetadataKind::ALL.len());

    for kind in MetadataKind::ALL {
        let payload = overrides
            .resolve(kind)
            .context(MissingPayloadSnafu { kind })?;
        let len = payload.len();

        ensure!(
            cursor
                .checked_add(len)
                .is_some_and(|end| end <= region_len),
            RegionFullSnafu {
                kind,
                offset: cursor,
                len,
                limit: region_len,
            }
        );

        placements.push(PayloadPlacement {
            kind,
            offset: cursor,
            payload,
        });
        cursor += len;
    }

    Ok(placements)
}

/// Renders the metadata table and payloads into the metadata `region`.
///
/// Every payload is checked against the region size before anything is
/// written, so on error `region` is left untouched.
pub fn write_metadata(
    region: &mut [u8],
    overrides: &MetadataOverrides,
) -> Result<(), PayloadOverflowError> {
    let placements = plan_payloads(overrides, region.len())?;

    let header = MetadataTableHeaderRaw {
        signature: METADATA_SIGNATURE,
        reserved: U16::ZERO,
        entry_count: U32::new(placements.len() as u32),
        reserved2: [0; 18],
    };
    region[..HEADER_SIZE].copy_from_slice(header.as_bytes());

    for (index, placement) in placements.iter().enumerate() {
        let kind = placement.kind;
        let entry = MetadataTableEntryRaw {
            item_id: guid::to_disk(&kind.guid()),
            offset: U32::new(placement.offset as u32),
            length: U32::new(placement.len() as u32),
            flags: kind.flags().bits(),
            reserved: [0; 7],
        };
        let start = HEADER_SIZE + index * ENTRY_SIZE;
        region[start..start + ENTRY_SIZE].copy_from_slice(entry.as_bytes());

        region[placement.offset..placement.offset + placement.len()]
            .copy_from_slice(placement.payload);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::METADATA_REGION_LENGTH;

    fn overrides() -> MetadataOverrides {
        let mut overrides = MetadataOverrides::new();
        overrides.set(
            MetadataKind::VirtualDiskSize,
            (1u64 << 30).to_le_bytes().to_vec(),
        );
        overrides.set(MetadataKind::VirtualDiskId, [0xAB; 16]);
        overrides
    }

    fn entry(region: &[u8], index: usize) -> MetadataTableEntryRaw {
        let start = HEADER_SIZE + index * ENTRY_SIZE;
        MetadataTableEntryRaw::read_from_bytes(&region[start..start + ENTRY_SIZE]).unwrap()
    }

    #[test]
    fn raw_sizes() {
        assert_eq!(HEADER_SIZE, 32);
        assert_eq!(ENTRY_SIZE, 32);
    }

    #[test]
    fn table_header() {
        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        write_metadata(&mut region, &overrides()).unwrap();

        assert_eq!(&region[..8], b"metadata");
        assert_eq!(&region[8..10], &[0, 0]);
        assert_eq!(&region[10..14], &5u32.to_le_bytes());
        assert!(region[14..32].iter().all(|&b| b == 0));
    }

    #[test]
    fn payloads_are_packed_in_catalog_order() {
        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        write_metadata(&mut region, &overrides()).unwrap();

        let expected = [
            (MetadataKind::FileParameters, 0x10000, 8),
            (MetadataKind::VirtualDiskSize, 0x10008, 8),
            (MetadataKind::LogicalSectorSize, 0x10010, 4),
            (MetadataKind::PhysicalSectorSize, 0x10014, 4),
            (MetadataKind::VirtualDiskId, 0x10018, 16),
        ];
        for (index, (kind, offset, len)) in expected.into_iter().enumerate() {
            let raw = entry(&region, index);
            assert_eq!(raw.item_id, guid::to_disk(&kind.guid()));
            assert_eq!(raw.offset.get(), offset);
            assert_eq!(raw.length.get(), len);
        }

        assert_eq!(&region[0x10000..0x10008], &[0, 0, 0, 2, 0, 0, 0, 0]);
        assert_eq!(&region[0x10008..0x10010], &(1u64 << 30).to_le_bytes());
        assert_eq!(&region[0x10010..0x10014], &512u32.to_le_bytes());
        assert_eq!(&region[0x10014..0x10018], &4096u32.to_le_bytes());
        assert_eq!(&region[0x10018..0x10028], &[0xAB; 16]);
        assert!(region[0x10028..].iter().all(|&b| b == 0));
    }

    #[test]
    fn entry_flags() {
        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        write_metadata(&mut region, &overrides()).unwrap();

        assert_eq!(entry(&region, 0).flags, 0b100);
        for index in 1..5 {
            assert_eq!(entry(&region, index).flags, 0b110);
        }
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut overrides = overrides();
        overrides.set(MetadataKind::LogicalSectorSize, 4096u32.to_le_bytes());

        let placements = plan_payloads(&overrides, METADATA_REGION_LENGTH).unwrap();
        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        write_metadata(&mut region, &overrides).unwrap();

        let logical = placements[MetadataKind::LogicalSectorSize.index()];
        assert_eq!(logical.payload, &4096u32.to_le_bytes());
        assert_eq!(
            &region[logical.offset..logical.offset + logical.len()],
            logical.payload
        );
    }

    #[test]
    fn placements_carry_resolved_payloads() {
        let overrides = overrides();
        let placements = plan_payloads(&overrides, METADATA_REGION_LENGTH).unwrap();

        assert_eq!(placements.len(), MetadataKind::ALL.len());
        for (placement, kind) in placements.iter().zip(MetadataKind::ALL) {
            assert_eq!(placement.kind, kind);
            assert!(!placement.is_empty(), "{kind}");
        }
        assert_eq!(placements[0].payload, &FILE_PARAMETERS_PAYLOAD);
        assert_eq!(placements[4].payload, &[0xAB; 16]);
    }

    #[test]
    fn missing_per_image_payload_is_an_error() {
        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        let err = write_metadata(&mut region, &MetadataOverrides::new()).unwrap_err();

        assert!(matches!(
            err,
            PayloadOverflowError::MissingPayload {
                kind: MetadataKind::VirtualDiskSize
            }
        ));
        assert!(region.iter().all(|&b| b == 0));
    }

    #[test]
    fn oversized_payload_is_rejected_before_writing() {
        let mut overrides = overrides();
        overrides.set(MetadataKind::VirtualDiskId, vec![0xCD; METADATA_REGION_LENGTH]);

        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        let err = write_metadata(&mut region, &overrides).unwrap_err();

        assert!(matches!(
            err,
            PayloadOverflowError::RegionFull {
                kind: MetadataKind::VirtualDiskId,
                offset: 0x10018,
                ..
            }
        ));
        assert!(region.iter().all(|&b| b == 0));
    }

    #[test]
    fn payload_may_end_exactly_at_region_end() {
        let mut overrides = overrides();
        let room = METADATA_REGION_LENGTH - 0x10018;
        overrides.set(MetadataKind::VirtualDiskId, vec![0x01; room]);

        let mut region = vec![0u8; METADATA_REGION_LENGTH];
        write_metadata(&mut region, &overrides).unwrap();
        assert_eq!(region[METADATA_REGION_LENGTH - 1], 0x01);
    }
}
