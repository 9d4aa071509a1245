//! `FileSystem` backed by the local disk under a sandbox root

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use uuid::Uuid;
use walkdir::WalkDir;

use super::checksum::{file_md5, StreamingMd5};
use super::download::HttpDownloader;
use super::error::FsError;
use super::sandbox::Sandbox;
use super::{
    DeleteOptions, DownloadOptions, DownloadResult, EncodingType, FileInfo, FileSystem,
    InfoOptions, MakeDirectoryOptions, ReadOptions, RelocateOptions, WriteOptions,
};

const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct LocalFileSystem {
    sandbox: Sandbox,
    downloader: HttpDownloader,
}

impl LocalFileSystem {
    pub fn new(sandbox: Sandbox, downloader: HttpDownloader) -> Self {
        Self {
            sandbox,
            downloader,
        }
    }

    /// Open a sandbox at `root` with the default download client
    pub fn open(root: impl AsRef<Path>) -> Result<Self, FsError> {
        let sandbox = Sandbox::new(root)?;
        let downloader =
            HttpDownloader::new(Some(DEFAULT_DOWNLOAD_TIMEOUT)).map_err(FsError::ClientSetup)?;
        Ok(Self::new(sandbox, downloader))
    }

    pub fn sandbox(&self) -> &Sandbox {
        &self.sandbox
    }

    /// `file://` URI that `path` resolves to
    pub fn uri_for(&self, path: &str) -> Result<String, FsError> {
        let resolved = self.sandbox.resolve(path)?;
        Ok(self.sandbox.uri_for(&resolved))
    }

    /// Resolve a path that must not name the sandbox root itself
    fn resolve_entry(&self, path: &str) -> Result<PathBuf, FsError> {
        let resolved = self.sandbox.resolve(path)?;
        if self.sandbox.is_root(&resolved) {
            return Err(FsError::OutOfScope {
                path: path.to_string(),
            });
        }
        Ok(resolved)
    }

    async fn ensure_parent(&self, resolved: &Path, path: &str) -> Result<(), FsError> {
        let parent_is_dir = match resolved.parent() {
            Some(parent) => tokio::fs::metadata(parent)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
            None => false,
        };
        if parent_is_dir {
            Ok(())
        } else {
            Err(FsError::MissingParent {
                path: path.to_string(),
            })
        }
    }

    async fn stream_to(
        &self,
        url: &str,
        target: &Path,
        path: &str,
        options: DownloadOptions,
    ) -> Result<DownloadResult, FsError> {
        let mut response = self.downloader.fetch(url).await?;
        let temp_path = temp_path_for(target);

        let result = async {
            let mut file = tokio::fs::File::create(&temp_path)
                .await
                .map_err(|e| FsError::io(path, e))?;
            let mut hasher = options.md5.then(StreamingMd5::new);

            while let Some(chunk) = response.chunk().await? {
                if let Some(hasher) = hasher.as_mut() {
                    hasher.update(&chunk);
                }
                file.write_all(&chunk)
                    .await
                    .map_err(|e| FsError::io(path, e))?;
            }
            file.flush().await.map_err(|e| FsError::io(path, e))?;
            drop(file);

            tokio::fs::rename(&temp_path, target)
                .await
                .map_err(|e| FsError::io(path, e))?;
            Ok::<_, FsError>(hasher.map(StreamingMd5::finish))
        }
        .await;

        match result {
            Ok(md5) => Ok(DownloadResult {
                uri: self.sandbox.uri_for(target),
                status: response.status,
                headers: response.headers,
                md5,
            }),
            Err(e) => {
                let _ = tokio::fs::remove_file(&temp_path).await;
                Err(e)
            }
        }
    }
}

#[async_trait]
impl FileSystem for LocalFileSystem {
    async fn get_info(&self, path: &str, options: InfoOptions) -> Result<FileInfo, FsError> {
        let resolved = self.sandbox.resolve(path)?;
        let uri = self.sandbox.uri_for(&resolved);

        let metadata = match tokio::fs::metadata(&resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(FileInfo {
                    exists: false,
                    is_directory: false,
                    uri,
                    size: None,
                    modification_time: None,
                    md5: None,
                });
            }
            Err(e) => return Err(FsError::io(path, e)),
        };

        let modification_time = metadata
            .modified()
            .ok()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs_f64());

        let md5 = if options.md5 && metadata.is_file() {
            Some(file_md5(&resolved).await?)
        } else {
            None
        };

        Ok(FileInfo {
            exists: true,
            is_directory: metadata.is_dir(),
            uri,
            size: Some(metadata.len()),
            modification_time,
            md5,
        })
    }

    async fn download(
        &self,
        url: &str,
        path: &str,
        options: DownloadOptions,
    ) -> Result<DownloadResult, FsError> {
        let target = self.resolve_entry(path)?;
        self.ensure_parent(&target, path).await?;

        let result = self.stream_to(url, &target, path, options).await?;
        tracing::debug!("Downloaded {} to {}", url, target.display());
        Ok(result)
    }

    async fn read_as_string(&self, path: &str, options: ReadOptions) -> Result<String, FsError> {
        let resolved = self.sandbox.resolve(path)?;
        let bytes = tokio::fs::read(&resolved)
            .await
            .map_err(|e| FsError::from_io(path, "read", e))?;

        match options.encoding {
            EncodingType::Utf8 => String::from_utf8(bytes).map_err(|e| FsError::Encoding {
                path: path.to_string(),
                reason: e.to_string(),
            }),
            EncodingType::Base64 => Ok(STANDARD.encode(bytes)),
        }
    }

    async fn write_as_string(
        &self,
        path: &str,
        contents: &str,
        options: WriteOptions,
    ) -> Result<(), FsError> {
        let resolved = self.resolve_entry(path)?;
        self.ensure_parent(&resolved, path).await?;

        let bytes = match options.encoding {
            EncodingType::Utf8 => contents.as_bytes().to_vec(),
            EncodingType::Base64 => STANDARD.decode(contents).map_err(|e| FsError::Encoding {
                path: path.to_string(),
                reason: e.to_string(),
            })?,
        };

        tokio::fs::write(&resolved, bytes)
            .await
            .map_err(|e| FsError::io(path, e))
    }

    async fn delete(&self, path: &str, options: DeleteOptions) -> Result<(), FsError> {
        let resolved = self.resolve_entry(path)?;

        let metadata = match tokio::fs::symlink_metadata(&resolved).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if options.idempotent {
                    return Ok(());
                }
                return Err(FsError::not_found(path, "deleted"));
            }
            Err(e) => return Err(FsError::io(path, e)),
        };

        let removed = if metadata.is_dir() {
            tokio::fs::remove_dir_all(&resolved).await
        } else {
            tokio::fs::remove_file(&resolved).await
        };
        removed.map_err(|e| FsError::from_io(path, "deleted", e))
    }

    async fn move_entry(&self, options: RelocateOptions) -> Result<(), FsError> {
        let from = self.resolve_entry(&options.from)?;
        let to = self.resolve_entry(&options.to)?;

        tokio::fs::symlink_metadata(&from)
            .await
            .map_err(|e| FsError::from_io(&options.from, "moved", e))?;
        if from == to {
            return Ok(());
        }
        reject_nested(&from, &to, &options)?;
        self.ensure_parent(&to, &options.to).await?;

        tokio::fs::rename(&from, &to)
            .await
            .map_err(|e| FsError::io(&options.to, e))
    }

    async fn copy(&self, options: RelocateOptions) -> Result<(), FsError> {
        let from = self.resolve_entry(&options.from)?;
        let to = self.resolve_entry(&options.to)?;

        let metadata = tokio::fs::metadata(&from)
            .await
            .map_err(|e| FsError::from_io(&options.from, "copied", e))?;
        // copying onto itself would truncate the source
        if from == to {
            return Ok(());
        }
        reject_nested(&from, &to, &options)?;
        self.ensure_parent(&to, &options.to).await?;

        if metadata.is_dir() {
            let display = options.to.clone();
            tokio::task::spawn_blocking(move || copy_dir_sync(&from, &to))
                .await
                .map_err(|e| FsError::io(&display, std::io::Error::other(e)))?
                .map_err(|e| FsError::io(&display, e))
        } else {
            tokio::fs::copy(&from, &to)
                .await
                .map(|_| ())
                .map_err(|e| FsError::io(&options.to, e))
        }
    }

    async fn make_directory(
        &self,
        path: &str,
        options: MakeDirectoryOptions,
    ) -> Result<(), FsError> {
        let resolved = self.resolve_entry(path)?;
        let existing = tokio::fs::metadata(&resolved).await.ok();

        if options.intermediates {
            return match existing {
                Some(metadata) if metadata.is_dir() => Ok(()),
                Some(_) => Err(FsError::AlreadyExists {
                    path: path.to_string(),
                }),
                None => tokio::fs::create_dir_all(&resolved)
                    .await
                    .map_err(|e| FsError::io(path, e)),
            };
        }

        if existing.is_some() {
            return Err(FsError::AlreadyExists {
                path: path.to_string(),
            });
        }
        self.ensure_parent(&resolved, path).await?;
        tokio::fs::create_dir(&resolved)
            .await
            .map_err(|e| FsError::io(path, e))
    }

    async fn read_directory(&self, path: &str) -> Result<Vec<String>, FsError> {
        let resolved = self.sandbox.resolve(path)?;
        let metadata = tokio::fs::metadata(&resolved)
            .await
            .map_err(|e| FsError::from_io(path, "read", e))?;
        if !metadata.is_dir() {
            return Err(FsError::NotADirectory {
                path: path.to_string(),
            });
        }

        let mut entries = tokio::fs::read_dir(&resolved)
            .await
            .map_err(|e| FsError::io(path, e))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FsError::io(path, e))?
        {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}

/// Hidden sibling used while a download is in flight
fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{}.{}.part", name, Uuid::new_v4()))
}

/// A directory cannot be moved or copied into its own subtree
fn reject_nested(from: &Path, to: &Path, options: &RelocateOptions) -> Result<(), FsError> {
    if to.starts_with(from) {
        return Err(FsError::IntoItself {
            from: options.from.clone(),
            to: options.to.clone(),
        });
    }
    Ok(())
}

fn copy_dir_sync(from: &Path, to: &Path) -> std::io::Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(std::io::Error::other)?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(std::io::Error::other)?;
        let destination = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&destination)?;
        } else {
            std::fs::copy(entry.path(), &destination)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn filesystem() -> (TempDir, LocalFileSystem) {
        let dir = TempDir::new().unwrap();
        let fs = LocalFileSystem::open(dir.path()).unwrap();
        (dir, fs)
    }

    #[tokio::test]
    async fn test_get_info_reports_missing_and_present() {
        let (_dir, fs) = filesystem();

        let info = fs.get_info("absent.txt", InfoOptions::default()).await.unwrap();
        assert!(!info.exists);
        assert!(info.uri.ends_with("absent.txt"));

        fs.write_as_string("text.txt", "hello, world\nthis is a test file\n", WriteOptions::default())
            .await
            .unwrap();
        let info = fs
            .get_info("text.txt", InfoOptions { md5: true })
            .await
            .unwrap();
        assert!(info.exists);
        assert!(!info.is_directory);
        assert_eq!(info.size, Some(33));
        assert_eq!(info.md5.as_deref(), Some("86d73d2f11e507365f7ea8e7ec3cc4cb"));
        assert!(info.modification_time.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_base64_round_trip() {
        let (_dir, fs) = filesystem();
        let base64 = WriteOptions {
            encoding: EncodingType::Base64,
        };

        fs.write_as_string("bytes.bin", "aGVsbG8=", base64).await.unwrap();
        assert_eq!(
            fs.read_as_string("bytes.bin", ReadOptions::default()).await.unwrap(),
            "hello"
        );
        assert_eq!(
            fs.read_as_string(
                "bytes.bin",
                ReadOptions {
                    encoding: EncodingType::Base64
                }
            )
            .await
            .unwrap(),
            "aGVsbG8="
        );

        let err = fs.write_as_string("bad.bin", "***", base64).await.unwrap_err();
        assert!(matches!(err, FsError::Encoding { .. }));
    }

    #[tokio::test]
    async fn test_copy_directory_tree() {
        let (_dir, fs) = filesystem();
        fs.make_directory("src/nested", MakeDirectoryOptions { intermediates: true })
            .await
            .unwrap();
        fs.write_as_string("src/nested/file", "contents", WriteOptions::default())
            .await
            .unwrap();

        fs.copy(RelocateOptions::new("src", "dst")).await.unwrap();

        assert_eq!(
            fs.read_as_string("dst/nested/file", ReadOptions::default())
                .await
                .unwrap(),
            "contents"
        );
        assert!(fs.get_info("src/nested/file", InfoOptions::default()).await.unwrap().exists);
    }

    #[tokio::test]
    async fn test_root_cannot_be_deleted() {
        let (_dir, fs) = filesystem();
        let err = fs.delete("", DeleteOptions { idempotent: true }).await.unwrap_err();
        assert!(matches!(err, FsError::OutOfScope { .. }));
        let err = fs.delete("a/..", DeleteOptions::default()).await.unwrap_err();
        assert!(matches!(err, FsError::OutOfScope { .. }));
    }

    #[tokio::test]
    async fn test_read_directory_rejects_files() {
        let (_dir, fs) = filesystem();
        fs.write_as_string("file1", "contents1", WriteOptions::default())
            .await
            .unwrap();

        let err = fs.read_directory("file1").await.unwrap_err();
        assert!(matches!(err, FsError::NotADirectory { .. }));
        let err = fs.read_directory("missing").await.unwrap_err();
        assert!(matches!(err, FsError::NotFound { .. }));
        assert_eq!(fs.read_directory("").await.unwrap(), vec!["file1".to_string()]);
    }

    #[test]
    fn test_temp_path_is_hidden_sibling() {
        let temp = temp_path_for(Path::new("/sandbox/download1.png"));
        assert_eq!(temp.parent(), Some(Path::new("/sandbox")));
        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(".download1.png."));
        assert!(name.ends_with(".part"));
    }
}
