//! Filesystem stat capability.

use std::fmt;
use std::path::Path;

use async_trait::async_trait;

/// What a path points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
    /// Exists, but is neither a regular file nor a directory.
    Other,
}

/// Answers "what is at this path". A missing path is `None`, never an error.
#[async_trait]
pub trait FileSystem: Send + Sync + fmt::Debug {
    async fn stat(&self, path: &Path) -> Option<FileKind>;
}

/// [`FileSystem`] backed by `tokio::fs`. Follows symlinks.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioFs;

#[async_trait]
impl FileSystem for TokioFs {
    async fn stat(&self, path: &Path) -> Option<FileKind> {
        let metadata = tokio::fs::metadata(path).await.ok()?;
        Some(if metadata.is_file() {
            FileKind::File
        } else if metadata.is_dir() {
            FileKind::Directory
        } else {
            FileKind::Other
        })
    }
}
