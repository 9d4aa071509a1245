//! Sandboxed filesystem capability
//!
//! Every path handed to a [`FileSystem`] is either relative to the sandbox
//! root or a `file://` URI that points inside it.

pub mod checksum;
pub mod download;
pub mod error;
pub mod local;
pub mod sandbox;

pub use checksum::{file_md5, StreamingMd5};
pub use download::HttpDownloader;
pub use error::FsError;
pub use local::LocalFileSystem;
pub use sandbox::Sandbox;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Async file operations scoped to a sandbox root
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Describe a path. A missing path is reported through `exists`, not as an error.
    async fn get_info(&self, path: &str, options: InfoOptions) -> Result<FileInfo, FsError>;

    async fn download(
        &self,
        url: &str,
        path: &str,
        options: DownloadOptions,
    ) -> Result<DownloadResult, FsError>;

    async fn read_as_string(&self, path: &str, options: ReadOptions) -> Result<String, FsError>;

    async fn write_as_string(
        &self,
        path: &str,
        contents: &str,
        options: WriteOptions,
    ) -> Result<(), FsError>;

    async fn delete(&self, path: &str, options: DeleteOptions) -> Result<(), FsError>;

    async fn move_entry(&self, options: RelocateOptions) -> Result<(), FsError>;

    async fn copy(&self, options: RelocateOptions) -> Result<(), FsError>;

    async fn make_directory(
        &self,
        path: &str,
        options: MakeDirectoryOptions,
    ) -> Result<(), FsError>;

    /// Names of the entries in a directory, sorted
    async fn read_directory(&self, path: &str) -> Result<Vec<String>, FsError>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingType {
    #[default]
    Utf8,
    Base64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct InfoOptions {
    pub md5: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DownloadOptions {
    pub md5: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    pub encoding: EncodingType,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub encoding: EncodingType,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DeleteOptions {
    pub idempotent: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MakeDirectoryOptions {
    pub intermediates: bool,
}

/// Source and destination of a move or copy
#[derive(Debug, Clone)]
pub struct RelocateOptions {
    pub from: String,
    pub to: String,
}

impl RelocateOptions {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub exists: bool,
    pub is_directory: bool,
    pub uri: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Seconds since the Unix epoch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modification_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadResult {
    pub uri: String,
    pub status: u16,
    pub headers: HashMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,
}
