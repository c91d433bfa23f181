use std::future::Future;
use std::path::Path;

/// Destination for a finished image.
pub trait BlobStore {
    /// Writes `bytes` to `path`, replacing anything already there.
    fn write(
        &self,
        path: &Path,
        bytes: Vec<u8>,
    ) -> impl Future<Output = std::io::Result<()>> + Send;
}

/// Writes images to the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsBlobStore;

impl BlobStore for FsBlobStore {
    fn write(
        &self,
        path: &Path,
        bytes: Vec<u8>,
    ) -> impl Future<Output = std::io::Result<()>> + Send {
        tokio::fs::write(path.to_path_buf(), bytes)
    }
}
