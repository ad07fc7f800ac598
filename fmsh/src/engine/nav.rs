//! Working-directory navigation and listings

use super::EntryKind;
use crate::cancel::{self, CancellationToken};
use crate::error::FmshResult;
use crate::session::Session;
use std::path::{Path, PathBuf};

/// Move the session to the parent directory. At the root this is a no-op.
pub fn up(session: &mut Session) -> &Path {
    if let Some(parent) = session.cwd.parent() {
        session.cwd = parent.to_path_buf();
    }
    &session.cwd
}

/// Resolve `target` against the session and make it the cwd.
pub async fn change_dir(session: &mut Session, target: &str, token: &CancellationToken) -> FmshResult<PathBuf> {
    let path = session.resolve_path(target);
    super::require_dir(&path, token).await?;
    session.cwd.clone_from(&path);
    Ok(path)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntryInfo {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Entries of `dir`, directories first, each group sorted by name.
pub async fn list_dir(dir: &Path, token: &CancellationToken) -> FmshResult<Vec<DirEntryInfo>> {
    super::require_dir(dir, token).await?;
    let mut reader = cancel::guard_path(token, dir, tokio::fs::read_dir(dir)).await?;

    let mut entries = Vec::new();
    while let Some(entry) = cancel::guard_path(token, dir, reader.next_entry()).await? {
        let (kind, size) = match cancel::guard(token, entry.metadata()).await {
            Ok(meta) => (EntryKind::from_file_type(&meta.file_type()), meta.len()),
            Err(e) if e.is_aborted() => return Err(e),
            Err(_) => (EntryKind::Other, 0),
        };
        entries.push(DirEntryInfo {
            name: entry.file_name().to_string_lossy().into_owned(),
            kind,
            size,
        });
    }

    entries.sort_by(|a, b| {
        let a_dir = a.kind != EntryKind::Directory;
        let b_dir = b.kind != EntryKind::Directory;
        a_dir.cmp(&b_dir).then_with(|| a.name.cmp(&b.name))
    });
    Ok(entries)
}
