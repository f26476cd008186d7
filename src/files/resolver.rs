//! Resolution of a local target to the file that should be served.
//!
//! # Responsibilities
//! - Serve the path itself when it is a regular file
//! - Fall back to `index.html` inside a directory
//! - Remember the answer (including "nothing") per cache key
//!
//! # Design Decisions
//! - Keyed by the literal request URL, so query strings produce separate entries
//! - No eviction: the set of servable files is fixed for the life of a build
//! - Concurrent first requests for one key may both stat; the result is the same

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;

use crate::files::fs::{FileKind, FileSystem};

/// Result of a lookup, with enough detail for trace logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResolution {
    /// The file to serve, if any.
    pub path: Option<PathBuf>,
    /// What the original path turned out to be. `None` on a cache hit or a missing path.
    pub kind: Option<FileKind>,
    pub cache_hit: bool,
}

/// Resolves and caches local paths.
#[derive(Debug)]
pub struct FileResolver {
    fs: Arc<dyn FileSystem>,
    cache: DashMap<String, Option<PathBuf>>,
}

impl FileResolver {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            fs,
            cache: DashMap::new(),
        }
    }

    /// The path to serve for `original`, trying `with_index` when `original` is a directory.
    pub async fn path_to_serve(&self, original: &Path, with_index: &Path, key: &str) -> FileResolution {
        if let Some(cached) = self.cache.get(key) {
            return FileResolution {
                path: cached.value().clone(),
                kind: None,
                cache_hit: true,
            };
        }

        let kind = self.fs.stat(original).await;
        let path = match kind {
            Some(FileKind::File) => Some(original.to_path_buf()),
            Some(FileKind::Directory) => match self.fs.stat(with_index).await {
                Some(FileKind::File) => Some(with_index.to_path_buf()),
                _ => None,
            },
            _ => None,
        };

        self.cache.insert(key.to_string(), path.clone());
        FileResolution {
            path,
            kind,
            cache_hit: false,
        }
    }

    /// Number of cached entries.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}
