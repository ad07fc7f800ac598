//! Local file engine
//!
//! Every operation whose cost grows with file size or directory breadth
//! takes a [`CancellationToken`](crate::cancel::CancellationToken) and
//! fails with [`FmshError::Aborted`](crate::error::FmshError::Aborted) once
//! it is cancelled. Operations that write output remove partial files
//! before reporting an abort.

pub mod compress;
pub mod files;
pub mod format;
pub mod hash;
pub mod nav;
pub mod os;
pub mod search;
pub mod walk;

use crate::cancel::{self, CancellationToken};
use crate::error::{FmshError, FmshResult};
use std::fs::Metadata;
use std::path::Path;

pub(crate) const STREAM_CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EntryKind {
    Directory,
    File,
    Symlink,
    Other,
}

impl EntryKind {
    pub fn from_file_type(ft: &std::fs::FileType) -> Self {
        if ft.is_dir() {
            Self::Directory
        } else if ft.is_file() {
            Self::File
        } else if ft.is_symlink() {
            Self::Symlink
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::File => "file",
            Self::Symlink => "symlink",
            Self::Other => "other",
        }
    }
}

/// `stat` that reports a missing path as [`FmshError::NotFound`].
pub(crate) async fn stat(path: &Path, token: &CancellationToken) -> FmshResult<Metadata> {
    cancel::guard_path(token, path, tokio::fs::metadata(path)).await
}

pub(crate) async fn require_file(path: &Path, token: &CancellationToken) -> FmshResult<Metadata> {
    let meta = stat(path, token).await?;
    if meta.is_dir() {
        return Err(FmshError::IsADirectory(path.to_path_buf()));
    }
    Ok(meta)
}

pub(crate) async fn require_dir(path: &Path, token: &CancellationToken) -> FmshResult<Metadata> {
    let meta = stat(path, token).await?;
    if !meta.is_dir() {
        return Err(FmshError::NotADirectory(path.to_path_buf()));
    }
    Ok(meta)
}

pub(crate) async fn exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}
