//! File hashing with large-input offload.
//!
//! Small files are read and digested on the calling task. Files at or above
//! the offload threshold are streamed through the hasher on a blocking
//! thread. Both paths produce the same digest and the same errors.

use disclose_core::{digest_reader_exact, CoreError, Sha256Digest, SourceDigest};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::{DiscloseError, Result};

/// Where a file's bytes are hashed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashStrategy {
    Inline,
    Offloaded,
}

impl HashStrategy {
    pub fn for_size(size_bytes: u64, offload_threshold: u64) -> Self {
        if size_bytes >= offload_threshold {
            HashStrategy::Offloaded
        } else {
            HashStrategy::Inline
        }
    }
}

/// SHA-256 of a byte buffer.
pub fn digest(bytes: &[u8]) -> Sha256Digest {
    Sha256Digest::hash(bytes)
}

/// Digest a file, offloading large files to a blocking thread.
///
/// The file must yield exactly as many bytes as its metadata reports; a
/// short read or any I/O error is a `ReadFailure`.
pub async fn digest_file(path: &Path, offload_threshold: u64) -> Result<SourceDigest> {
    let size_bytes = tokio::fs::metadata(path)
        .await
        .map_err(|e| read_failure(path, e))?
        .len();
    let strategy = HashStrategy::for_size(size_bytes, offload_threshold);
    debug!(path = %path.display(), size_bytes, ?strategy, "hashing file");

    let result = match strategy {
        HashStrategy::Inline => digest_inline(path, size_bytes).await,
        HashStrategy::Offloaded => digest_offloaded(path.to_path_buf(), size_bytes).await,
    };
    if let Err(err) = &result {
        warn!(path = %path.display(), error = %err, "file hashing failed");
    }
    result
}

async fn digest_inline(path: &Path, expected_len: u64) -> Result<SourceDigest> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| read_failure(path, e))?;
    Ok(digest_reader_exact(bytes.as_slice(), expected_len)?)
}

async fn digest_offloaded(path: PathBuf, expected_len: u64) -> Result<SourceDigest> {
    tokio::task::spawn_blocking(move || -> Result<SourceDigest> {
        let file = std::fs::File::open(&path).map_err(|e| read_failure(&path, e))?;
        Ok(digest_reader_exact(std::io::BufReader::new(file), expected_len)?)
    })
    .await
    .map_err(|e| DiscloseError::Task(e.to_string()))?
}

fn read_failure(path: &Path, err: std::io::Error) -> DiscloseError {
    DiscloseError::Core(CoreError::ReadFailure(format!("{}: {}", path.display(), err)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(data: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_strategy_threshold_is_inclusive() {
        assert_eq!(HashStrategy::for_size(9, 10), HashStrategy::Inline);
        assert_eq!(HashStrategy::for_size(10, 10), HashStrategy::Offloaded);
    }

    #[tokio::test]
    async fn test_inline_and_offloaded_agree() {
        let data = vec![0x5au8; 300_000];
        let file = write_temp(&data);

        let inline = digest_file(file.path(), u64::MAX).await.unwrap();
        let offloaded = digest_file(file.path(), 0).await.unwrap();

        assert_eq!(inline, offloaded);
        assert_eq!(inline.digest, Sha256Digest::hash(&data));
        assert_eq!(inline.size_bytes, data.len() as u64);
    }

    #[tokio::test]
    async fn test_empty_file() {
        let file = write_temp(b"");
        let result = digest_file(file.path(), 0).await.unwrap();
        assert_eq!(result.digest, Sha256Digest::hash(b""));
        assert_eq!(result.size_bytes, 0);
    }

    #[tokio::test]
    async fn test_missing_file_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.bin");
        for threshold in [0, u64::MAX] {
            let err = digest_file(&missing, threshold).await.unwrap_err();
            assert!(err.is_read_failure(), "unexpected error: {err}");
        }
    }
}
