//! MD5 checksums for files and streamed downloads

use md5::{Digest, Md5};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncReadExt;

use super::error::FsError;

/// Calculate the lowercase hex MD5 of a file
pub async fn file_md5(path: &Path) -> Result<String, FsError> {
    let display = path.display().to_string();
    let mut file = File::open(path)
        .await
        .map_err(|e| FsError::from_io(&display, "hashed", e))?;
    let mut hasher = Md5::new();
    let mut buffer = vec![0; 8192];

    loop {
        let bytes_read = file
            .read(&mut buffer)
            .await
            .map_err(|e| FsError::io(&display, e))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}

/// Incremental MD5 over chunks as they arrive
#[derive(Default)]
pub struct StreamingMd5 {
    hasher: Md5,
}

impl StreamingMd5 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, chunk: &[u8]) {
        self.hasher.update(chunk);
    }

    pub fn finish(self) -> String {
        format!("{:x}", self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_file_md5() {
        let temp_file = NamedTempFile::new().unwrap();
        std::fs::write(temp_file.path(), "hello, world\nthis is a test file\n").unwrap();

        let checksum = file_md5(temp_file.path()).await.unwrap();
        assert_eq!(checksum, "86d73d2f11e507365f7ea8e7ec3cc4cb");
    }

    #[test]
    fn test_streaming_matches_whole() {
        let mut streaming = StreamingMd5::new();
        streaming.update(b"hello ");
        streaming.update(b"world");
        assert_eq!(streaming.finish(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = file_md5(&dir.path().join("absent")).await.unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
    }
}
