//! Conversion between canonical GUID strings and their on-disk form.
//!
//! VHDX stores GUIDs in the mixed-endian layout used by Windows: the first
//! three groups are little-endian and the last eight bytes are kept in
//! string order. `AABBCCDD-EEFF-0011-2233-445566778899` is therefore written
//! as `DD CC BB AA FF EE 11 00 22 33 44 55 66 77 88 99`.

use snafu::{ResultExt, Snafu, ensure};
use uuid::{Uuid, uuid};

/// Length of the hyphenated 8-4-4-4-12 form.
const CANONICAL_LEN: usize = 36;

/// Positions of the hyphens in the canonical form.
const HYPHENS: [usize; 4] = [8, 13, 18, 23];

pub const BAT_REGION: Uuid = uuid!("2DC27766-F623-4200-9D64-115E9BFD4A08");
pub const METADATA_REGION: Uuid = uuid!("8B7CA206-4790-4B9A-B8FE-575F050F886E");

pub const FILE_PARAMETERS: Uuid = uuid!("CAA16737-FA36-4D43-B3B6-33F0AA44E76B");
pub const VIRTUAL_DISK_SIZE: Uuid = uuid!("2FA54224-CD1B-4876-B211-5DBED83BF4B8");
pub const LOGICAL_SECTOR_SIZE: Uuid = uuid!("8141BF1D-A96F-4709-BA47-F233A8FAAB5F");
pub const PHYSICAL_SECTOR_SIZE: Uuid = uuid!("CDA348C7-445D-4471-9CC9-E9885251C556");
pub const VIRTUAL_DISK_ID: Uuid = uuid!("BECA12AB-B2E6-4523-93EF-C309E000C746");

/// Errors when parsing a canonical GUID string.
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ParseGuidError {
    #[snafu(display("expected {CANONICAL_LEN} characters, found {len}"))]
    InvalidLength { len: usize },

    #[snafu(display("expected '-' at position {position}"))]
    MissingHyphen { position: usize },

    #[snafu(display("invalid GUID '{text}'"))]
    InvalidDigits { text: String, source: uuid::Error },
}

/// Parses a hyphenated GUID string such as `BECA12AB-B2E6-4523-93EF-C309E000C746`.
///
/// Upper- and lower-case hex digits are accepted. Braced, URN and
/// hyphen-less forms are rejected.
pub fn parse(text: &str) -> Result<Uuid, ParseGuidError> {
    ensure!(
        text.len() == CANONICAL_LEN,
        InvalidLengthSnafu { len: text.len() }
    );

    let bytes = text.as_bytes();
    for position in HYPHENS {
        ensure!(bytes[position] == b'-', MissingHyphenSnafu { position });
    }

    Uuid::try_parse(text).context(InvalidDigitsSnafu { text })
}

/// Encodes a canonical GUID string into its 16-byte on-disk form.
pub fn encode(text: &str) -> Result<[u8; 16], ParseGuidError> {
    parse(text).map(|guid| to_disk(&guid))
}

/// Returns the on-disk form of `guid`.
#[must_use]
pub fn to_disk(guid: &Uuid) -> [u8; 16] {
    guid.to_bytes_le()
}

/// Decodes 16 on-disk bytes back to the upper-case canonical string.
#[must_use]
pub fn decode(bytes: &[u8; 16]) -> String {
    format!("{:X}", Uuid::from_bytes_le(*bytes).hyphenated())
}
