use snafu::{OptionExt, ResultExt};

use crate::layout::CREATOR_MAX_LEN;
use crate::metadata::{CreatorTooLongSnafu, SizeTooLargeSnafu};
use crate::{CreateError, InvalidIdentifierSnafu, PayloadOverflowSnafu, guid};

/// Creator recorded in the file type identifier when none is given.
pub const DEFAULT_CREATOR: &str = "vhdx-create";

/// Options for a new image.
///
/// ```
/// use vhdx_create::CreateParams;
///
/// let params = CreateParams::new(1 << 30)
///     .with_creator("my-tool")
///     .with_disk_id("BECA12AB-B2E6-4523-93EF-C309E000C746");
/// assert_eq!(params.size, 1 << 30);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateParams {
    /// Virtual disk size in bytes. Must be below 2^63. The image itself is
    /// 4 MiB whatever the size.
    pub size: u64,

    /// Creator name. Defaults to [`DEFAULT_CREATOR`]. At most 512 bytes once
    /// encoded as UTF-16.
    pub creator: Option<String>,

    /// Virtual disk id as a hyphenated GUID string. A random id is used when
    /// this is `None`.
    pub disk_id: Option<String>,
}

impl CreateParams {
    pub fn new(size: u64) -> Self {
        Self {
            size,
            creator: None,
            disk_id: None,
        }
    }

    #[must_use]
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    #[must_use]
    pub fn with_disk_id(mut self, disk_id: impl Into<String>) -> Self {
        self.disk_id = Some(disk_id.into());
        self
    }

    /// Checks every field and converts it to its on-disk form.
    ///
    /// # Errors
    ///
    /// Fails with [`CreateError::PayloadOverflow`] or
    /// [`CreateError::InvalidIdentifier`].
    pub fn validate(&self) -> Result<ValidatedParams, CreateError> {
        let size = i64::try_from(self.size)
            .ok()
            .context(SizeTooLargeSnafu { size: self.size })
            .context(PayloadOverflowSnafu)?;

        let creator = self.creator.as_deref().unwrap_or(DEFAULT_CREATOR);
        let creator: Vec<u8> = creator.encode_utf16().flat_map(u16::to_le_bytes).collect();
        if creator.len() > CREATOR_MAX_LEN {
            return CreatorTooLongSnafu {
                len: creator.len(),
                limit: CREATOR_MAX_LEN,
            }
            .fail()
            .context(PayloadOverflowSnafu);
        }

        let disk_id = self
            .disk_id
            .as_deref()
            .map(guid::encode)
            .transpose()
            .context(InvalidIdentifierSnafu)?;

        Ok(ValidatedParams {
            size,
            creator,
            disk_id,
        })
    }
}

/// Parameters that passed [`CreateParams::validate`], already encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedParams {
    pub(crate) size: i64,
    pub(crate) creator: Vec<u8>,
    pub(crate) disk_id: Option<[u8; 16]>,
}

impl ValidatedParams {
    /// Virtual disk size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size as u64
    }

    /// Creator string encoded as UTF-16LE.
    #[must_use]
    pub fn creator_utf16(&self) -> &[u8] {
        &self.creator
    }

    /// Caller-supplied disk id in on-disk byte order.
    #[must_use]
    pub fn disk_id(&self) -> Option<&[u8; 16]> {
        self.disk_id.as_ref()
    }
}
