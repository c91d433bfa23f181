use std::future::Future;

use snafu::{ResultExt, Snafu, ensure};

/// Errors from a [`RandomSource`].
#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum RandomError {
    #[snafu(display("operating system random source failed"))]
    Os { source: getrandom::Error },

    #[snafu(display("random source task did not complete"))]
    TaskFailed { source: tokio::task::JoinError },

    #[snafu(display("random source returned {actual} bytes, expected {expected}"))]
    ShortRead { expected: usize, actual: usize },
}

/// Source of cryptographically secure random bytes.
///
/// The returned future completes once `len` bytes are available.
pub trait RandomSource {
    fn random_bytes(
        &self,
        len: usize,
    ) -> impl Future<Output = Result<Vec<u8>, RandomError>> + Send;
}

/// Draws from the operating system on tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl RandomSource for OsRandom {
    async fn random_bytes(&self, len: usize) -> Result<Vec<u8>, RandomError> {
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>, RandomError> {
            let mut buf = vec![0u8; len];
            getrandom::fill(&mut buf).context(OsSnafu)?;
            Ok(buf)
        })
        .await
        .context(TaskFailedSnafu)?
    }
}

/// Reads exactly `N` bytes from `source`.
pub(crate) async fn draw<R: RandomSource, const N: usize>(
    source: &R,
) -> Result<[u8; N], RandomError> {
    let bytes = source.random_bytes(N).await?;
    ensure!(
        bytes.len() == N,
        ShortReadSnafu {
            expected: N,
            actual: bytes.len(),
        }
    );

    let mut out = [0u8; N];
    out.copy_from_slice(&bytes);
    Ok(out)
}
