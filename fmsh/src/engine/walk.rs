//! Depth-first directory traversal
//!
//! Entries are yielded visit-then-descend, each directory's children sorted
//! by name, so repeated walks over the same tree produce the same order.
//! Symlinked directories are reported but never followed.

use super::EntryKind;
use crate::cancel::{self, CancellationToken};
use crate::error::FmshResult;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct WalkEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub depth: usize,
}

impl WalkEntry {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

pub struct Walker<'a> {
    token: &'a CancellationToken,
    stack: Vec<std::vec::IntoIter<WalkEntry>>,
}

impl<'a> Walker<'a> {
    /// Walk everything below `root` (the root itself is not yielded).
    pub async fn new(root: &Path, token: &'a CancellationToken) -> FmshResult<Walker<'a>> {
        super::require_dir(root, token).await?;
        let children = read_sorted(root, 1, token).await?;
        Ok(Self {
            token,
            stack: vec![children.into_iter()],
        })
    }

    /// Next entry in depth-first order; checks the token on every step.
    pub async fn next(&mut self) -> FmshResult<Option<WalkEntry>> {
        loop {
            cancel::check(self.token)?;
            let Some(top) = self.stack.last_mut() else {
                return Ok(None);
            };
            let Some(entry) = top.next() else {
                self.stack.pop();
                continue;
            };

            if entry.kind == EntryKind::Directory {
                match read_sorted(&entry.path, entry.depth + 1, self.token).await {
                    Ok(children) => self.stack.push(children.into_iter()),
                    Err(e) if e.is_aborted() => return Err(e),
                    Err(e) => {
                        tracing::debug!(path = %entry.path.display(), error = %e, "Skipping unreadable directory");
                    }
                }
            }
            return Ok(Some(entry));
        }
    }
}

async fn read_sorted(dir: &Path, depth: usize, token: &CancellationToken) -> FmshResult<Vec<WalkEntry>> {
    let mut reader = cancel::guard_path(token, dir, tokio::fs::read_dir(dir)).await?;
    let mut entries = Vec::new();
    while let Some(entry) = cancel::guard_path(token, dir, reader.next_entry()).await? {
        let kind = match cancel::guard(token, entry.file_type()).await {
            Ok(ft) => EntryKind::from_file_type(&ft),
            Err(e) if e.is_aborted() => return Err(e),
            Err(_) => EntryKind::Other,
        };
        entries.push(WalkEntry {
            path: entry.path(),
            kind,
            depth,
        });
    }
    entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tree() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/inner")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::write(root.join("b/inner/deep.txt"), "deep").unwrap();
        fs::write(root.join("b/two.txt"), "2").unwrap();
        fs::write(root.join("c.txt"), "c").unwrap();
        dir
    }

    #[tokio::test]
    async fn walks_depth_first_in_sorted_order() {
        let dir = tree();
        let token = CancellationToken::new();
        let mut walker = Walker::new(dir.path(), &token).await.unwrap();

        let mut seen = Vec::new();
        while let Some(entry) = walker.next().await.unwrap() {
            let rel = entry.path.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned();
            seen.push((rel, entry.depth));
        }

        let expected = vec![
            ("a".to_string(), 1),
            ("a/one.txt".to_string(), 2),
            ("b".to_string(), 1),
            ("b/inner".to_string(), 2),
            ("b/inner/deep.txt".to_string(), 3),
            ("b/two.txt".to_string(), 2),
            ("c.txt".to_string(), 1),
        ];
        assert_eq!(seen, expected);
    }

    #[tokio::test]
    async fn aborted_token_stops_the_walk() {
        let dir = tree();
        let token = CancellationToken::new();
        let mut walker = Walker::new(dir.path(), &token).await.unwrap();
        assert!(walker.next().await.unwrap().is_some());
        token.cancel();
        assert!(walker.next().await.unwrap_err().is_aborted());
    }

    #[tokio::test]
    async fn root_must_be_a_directory() {
        let dir = tree();
        let token = CancellationToken::new();
        let err = Walker::new(&dir.path().join("c.txt"), &token).await.err().unwrap();
        assert!(matches!(err, crate::error::FmshError::NotADirectory(_)));
    }
}
