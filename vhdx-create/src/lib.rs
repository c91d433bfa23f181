//! A library for creating empty fixed-size VHDX disk images.
//!
//! This crate builds the first 4 MiB of a VHDX file in memory: the file type
//! identifier, both headers, both region tables and the metadata region. The
//! block allocation table is left empty, so the resulting image describes a
//! disk of the requested size with no data blocks allocated.
//!
//! # Features
//!
//! - Checksummed headers and region tables (CRC-32C)
//! - Caller-supplied or random virtual disk id
//! - Pluggable randomness ([`RandomSource`]) and storage ([`BlobStore`])
//!
//! # Example
//!
//! ```no_run
//! # async fn run() -> Result<(), vhdx_create::CreateError> {
//! use vhdx_create::CreateParams;
//!
//! // 64 GiB disk with a random id.
//! vhdx_create::create_file("disk.vhdx", &CreateParams::new(64 << 30)).await?;
//!
//! // Or keep the bytes in memory.
//! let image = vhdx_create::create_buffer(&CreateParams::new(1 << 30)).await?;
//! assert_eq!(image.len(), vhdx_create::layout::IMAGE_SIZE);
//! # Ok(())
//! # }
//! ```
//!
//! # References
//!
//! - [MS-VHDX: Virtual Hard Disk v2 (VHDX) File Format](https://learn.microsoft.com/en-us/openspecs/windows_protocols/ms-vhdx/)

use std::path::{Path, PathBuf};

use snafu::{ResultExt, Snafu};

pub use self::image::{RANDOM_LEN, build_image};
pub use self::params::{CreateParams, DEFAULT_CREATOR, ValidatedParams};
pub use self::random::{OsRandom, RandomError, RandomSource};
pub use self::store::{BlobStore, FsBlobStore};

pub mod checksum;
pub mod guid;
pub mod header;
pub mod layout;
pub mod metadata;
pub mod region;

mod image;
mod params;
mod random;
mod store;

/// Errors for [`create_buffer()`] and [`create_file()`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum CreateError {
    #[snafu(display("cannot obtain random bytes"))]
    RandomnessUnavailable { source: RandomError },

    #[snafu(display("cannot write image to {}", path.display()))]
    PersistenceFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("invalid disk id"))]
    InvalidIdentifier { source: guid::ParseGuidError },

    #[snafu(display("payload does not fit"))]
    PayloadOverflow {
        source: metadata::PayloadOverflowError,
    },
}

/// Creates images using a [`RandomSource`] and a [`BlobStore`].
///
/// The free functions [`create_buffer()`] and [`create_file()`] use the
/// default collaborators. Construct this type directly to substitute either
/// of them.
#[derive(Debug, Clone, Default)]
#[must_use]
pub struct VhdxCreator<R = OsRandom, S = FsBlobStore> {
    random: R,
    store: S,
}

impl VhdxCreator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R, S> VhdxCreator<R, S> {
    /// Replaces the random source.
    pub fn with_random<R2>(self, random: R2) -> VhdxCreator<R2, S> {
        VhdxCreator {
            random,
            store: self.store,
        }
    }

    /// Replaces the store used by [`create_file()`](Self::create_file).
    pub fn with_store<S2>(self, store: S2) -> VhdxCreator<R, S2> {
        VhdxCreator {
            random: self.random,
            store,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<R: RandomSource, S: BlobStore> VhdxCreator<R, S> {
    /// Builds an image in memory.
    ///
    /// Parameters are validated before any randomness is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameters are invalid or the random source
    /// fails. No partial image is returned.
    pub async fn create_buffer(&self, params: &CreateParams) -> Result<Vec<u8>, CreateError> {
        let params = params.validate()?;
        let random = random::draw::<_, RANDOM_LEN>(&self.random)
            .await
            .context(RandomnessUnavailableSnafu)?;

        tracing::debug!(size = params.size(), "building image");
        build_image(&params, &random)
    }

    /// Builds an image and writes it to `path`.
    ///
    /// # Errors
    ///
    /// Returns any error from [`create_buffer()`](Self::create_buffer), or
    /// [`CreateError::PersistenceFailure`] if the store fails. The built
    /// image is discarded in that case.
    pub async fn create_file(
        &self,
        path: impl AsRef<Path>,
        params: &CreateParams,
    ) -> Result<(), CreateError> {
        let path = path.as_ref();
        let image = self.create_buffer(params).await?;

        self.store
            .write(path, image)
            .await
            .context(PersistenceFailureSnafu { path })?;

        tracing::debug!(path = %path.display(), "image written");
        Ok(())
    }
}

/// Builds an image in memory using the operating system random source.
///
/// # Errors
///
/// See [`VhdxCreator::create_buffer`].
pub async fn create_buffer(params: &CreateParams) -> Result<Vec<u8>, CreateError> {
    VhdxCreator::new().create_buffer(params).await
}

/// Builds an image and writes it to `path` on the local filesystem.
///
/// # Errors
///
/// See [`VhdxCreator::create_file`].
pub async fn create_file(
    path: impl AsRef<Path>,
    params: &CreateParams,
) -> Result<(), CreateError> {
    VhdxCreator::new().create_file(path, params).await
}
