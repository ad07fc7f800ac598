//! Basic file operations: read, create, write, copy, move, remove, inspect

use super::{EntryKind, STREAM_CHUNK_SIZE};
use crate::cancel::{self, CancellationToken};
use crate::error::{FmshError, FmshResult};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};

/// Read a whole file in chunks, checking the token between reads.
///
/// Invalid UTF-8 is replaced rather than rejected so binary files can still
/// be inspected.
pub async fn read_text(path: &Path, token: &CancellationToken) -> FmshResult<String> {
    cancel::check(token)?;
    super::require_file(path, token).await?;
    let mut file = cancel::guard_path(token, path, fs::File::open(path)).await?;

    let mut data = Vec::new();
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    loop {
        let n = cancel::guard(token, file.read(&mut buf)).await?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);
    }
    Ok(String::from_utf8_lossy(&data).into_owned())
}

/// Create an empty file; fails if anything already exists at `path`.
pub async fn create_file(path: &Path) -> FmshResult<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| FmshError::from_io(e, path))?;
    Ok(())
}

/// Replace the contents of `path` (created if missing).
pub async fn write_file(path: &Path, content: &str, token: &CancellationToken) -> FmshResult<()> {
    cancel::check(token)?;
    if fs::metadata(path).await.is_ok_and(|m| m.is_dir()) {
        return Err(FmshError::IsADirectory(path.to_path_buf()));
    }
    cancel::guard_path(token, path, fs::write(path, content.as_bytes())).await
}

pub async fn make_dir(path: &Path) -> FmshResult<()> {
    fs::create_dir(path).await.map_err(|e| FmshError::from_io(e, path))
}

/// Rename `path` to `new_name` inside the same parent directory.
pub async fn rename(path: &Path, new_name: &str) -> FmshResult<PathBuf> {
    if new_name.is_empty() || new_name.contains(['/', '\\']) || new_name == "." || new_name == ".." {
        return Err(FmshError::InvalidArgument(format!(
            "'{new_name}' is not a plain file name"
        )));
    }
    if !super::exists(path).await {
        return Err(FmshError::NotFound(path.to_path_buf()));
    }

    let target = path
        .parent()
        .map_or_else(|| PathBuf::from(new_name), |p| p.join(new_name));
    if super::exists(&target).await {
        return Err(FmshError::AlreadyExists(target));
    }
    fs::rename(path, &target)
        .await
        .map_err(|e| FmshError::from_io(e, path))?;
    Ok(target)
}

/// Where a copy of `src` lands when asked to go to `dst`.
///
/// An existing directory means "into this directory, under the source name".
async fn copy_destination(src: &Path, dst: &Path) -> FmshResult<PathBuf> {
    if fs::metadata(dst).await.is_ok_and(|m| m.is_dir()) {
        let name = src
            .file_name()
            .ok_or_else(|| FmshError::InvalidArgument(format!("{} has no file name", src.display())))?;
        return Ok(dst.join(name));
    }
    Ok(dst.to_path_buf())
}

/// Stream `src` into a new file. Never overwrites; a partially written
/// destination is removed before an error or abort is returned.
pub async fn copy_file(src: &Path, dst: &Path, token: &CancellationToken) -> FmshResult<PathBuf> {
    cancel::check(token)?;
    super::require_file(src, token).await?;
    let target = copy_destination(src, dst).await?;
    if super::exists(&target).await {
        return Err(FmshError::AlreadyExists(target));
    }

    let mut reader = cancel::guard_path(token, src, fs::File::open(src)).await?;
    // Not raced against the token: an abandoned open would still create the
    // file after we return. The pump below observes the abort instead.
    cancel::check(token)?;
    let mut writer = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&target)
        .await
        .map_err(|e| FmshError::from_io(e, &target))?;

    match pump(&mut reader, &mut writer, token).await {
        Ok(bytes) => {
            tracing::debug!(src = %src.display(), dst = %target.display(), bytes, "Copied file");
            Ok(target)
        }
        Err(e) => {
            drop(writer);
            cancel::discard_partial(&target).await;
            Err(e)
        }
    }
}

async fn pump(reader: &mut fs::File, writer: &mut fs::File, token: &CancellationToken) -> FmshResult<u64> {
    let mut buf = vec![0u8; STREAM_CHUNK_SIZE];
    let mut total = 0u64;
    loop {
        cancel::check(token)?;
        let n = cancel::guard(token, reader.read(&mut buf)).await?;
        if n == 0 {
            break;
        }
        cancel::guard(token, writer.write_all(&buf[..n])).await?;
        total += n as u64;
    }
    cancel::guard(token, writer.flush()).await?;
    Ok(total)
}

/// Copy then delete the source.
pub async fn move_file(src: &Path, dst: &Path, token: &CancellationToken) -> FmshResult<PathBuf> {
    let target = copy_file(src, dst, token).await?;
    fs::remove_file(src)
        .await
        .map_err(|e| FmshError::from_io(e, src))?;
    Ok(target)
}

/// Remove a single file. Directories are refused.
pub async fn remove_file(path: &Path) -> FmshResult<()> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| FmshError::from_io(e, path))?;
    if meta.is_dir() {
        return Err(FmshError::IsADirectory(path.to_path_buf()));
    }
    fs::remove_file(path).await.map_err(|e| FmshError::from_io(e, path))
}

/// Remove a directory; without `recursive` it must be empty.
pub async fn remove_dir(path: &Path, recursive: bool, token: &CancellationToken) -> FmshResult<()> {
    cancel::check(token)?;
    super::require_dir(path, token).await?;

    if recursive {
        return cancel::guard_path(token, path, fs::remove_dir_all(path)).await;
    }

    let mut reader = cancel::guard_path(token, path, fs::read_dir(path)).await?;
    if cancel::guard_path(token, path, reader.next_entry()).await?.is_some() {
        return Err(FmshError::NotEmpty(path.to_path_buf()));
    }
    cancel::guard_path(token, path, fs::remove_dir(path)).await
}

#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub size: u64,
    pub mode: Option<u32>,
    pub modified: Option<SystemTime>,
    pub created: Option<SystemTime>,
}

pub async fn info(path: &Path) -> FmshResult<FileInfo> {
    let meta = fs::symlink_metadata(path)
        .await
        .map_err(|e| FmshError::from_io(e, path))?;

    #[cfg(unix)]
    let mode = {
        use std::os::unix::fs::PermissionsExt;
        Some(meta.permissions().mode())
    };
    #[cfg(not(unix))]
    let mode = None;

    Ok(FileInfo {
        path: path.to_path_buf(),
        kind: EntryKind::from_file_type(&meta.file_type()),
        size: meta.len(),
        mode,
        modified: meta.modified().ok(),
        created: meta.created().ok(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs as sfs;

    #[tokio::test]
    async fn test_read_text_across_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        let content = "line of text\n".repeat(20_000);
        sfs::write(&path, &content).unwrap();

        let token = CancellationToken::new();
        assert_eq!(read_text(&path, &token).await.unwrap(), content);
    }

    #[tokio::test]
    async fn test_read_missing_and_directory() {
        let dir = tempfile::tempdir().unwrap();
        let token = CancellationToken::new();
        let err = read_text(&dir.path().join("nope"), &token).await.unwrap_err();
        assert!(matches!(err, FmshError::NotFound(_)));
        let err = read_text(dir.path(), &token).await.unwrap_err();
        assert!(matches!(err, FmshError::IsADirectory(_)));
    }

    #[tokio::test]
    async fn test_create_file_refuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.txt");
        create_file(&path).await.unwrap();
        assert_eq!(sfs::read(&path).unwrap().len(), 0);
        let err = create_file(&path).await.unwrap_err();
        assert!(matches!(err, FmshError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let token = CancellationToken::new();
        write_file(&path, "first", &token).await.unwrap();
        write_file(&path, "second", &token).await.unwrap();
        assert_eq!(sfs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_write_with_aborted_token_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        let token = CancellationToken::new();
        token.cancel();
        assert!(write_file(&path, "data", &token).await.unwrap_err().is_aborted());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_rename_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        sfs::write(&path, "a").unwrap();
        sfs::write(dir.path().join("taken.txt"), "t").unwrap();

        let err = rename(&path, "sub/b.txt").await.unwrap_err();
        assert!(matches!(err, FmshError::InvalidArgument(_)));
        let err = rename(&path, "taken.txt").await.unwrap_err();
        assert!(matches!(err, FmshError::AlreadyExists(_)));

        let target = rename(&path, "b.txt").await.unwrap();
        assert_eq!(target, dir.path().join("b.txt"));
        assert!(!path.exists());
        assert_eq!(sfs::read_to_string(target).unwrap(), "a");
    }

    #[tokio::test]
    async fn test_copy_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("src.bin");
        let data: Vec<u8> = (0..300_000u32).map(|i| (i % 256) as u8).collect();
        sfs::write(&src, &data).unwrap();
        sfs::create_dir(dir.path().join("out")).unwrap();

        let token = CancellationToken::new();
        let target = copy_file(&src, &dir.path().join("out"), &token).await.unwrap();
        assert_eq!(target, dir.path().join("out/src.bin"));
        assert_eq!(sfs::read(&target).unwrap(), data);
        assert!(src.exists());
    }

    #[tokio::test]
    async fn test_copy_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        sfs::write(&src, "new").unwrap();
        sfs::write(&dst, "old").unwrap();

        let token = CancellationToken::new();
        let err = copy_file(&src, &dst, &token).await.unwrap_err();
        assert!(matches!(err, FmshError::AlreadyExists(_)));
        assert_eq!(sfs::read_to_string(&dst).unwrap(), "old");
    }

    #[tokio::test]
    async fn test_copy_aborted_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        let dst = dir.path().join("b.txt");
        sfs::write(&src, "data").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        assert!(copy_file(&src, &dst, &token).await.unwrap_err().is_aborted());
        assert!(!dst.exists());
    }

    #[tokio::test]
    async fn test_copy_aborted_at_any_step_leaves_no_destination() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.bin");
        sfs::write(&src, vec![7u8; 3 * STREAM_CHUNK_SIZE]).unwrap();
        let dst = dir.path().join("b.bin");

        // Sweep the abort across the open, the pump and the flush.
        for delay in 0..64 {
            let token = CancellationToken::new();
            let canceller = {
                let token = token.clone();
                tokio::spawn(async move {
                    for _ in 0..delay {
                        tokio::task::yield_now().await;
                    }
                    token.cancel();
                })
            };
            match copy_file(&src, &dst, &token).await {
                Ok(target) => sfs::remove_file(target).unwrap(),
                Err(e) => {
                    assert!(e.is_aborted(), "delay {delay}: {e}");
                    assert!(!dst.exists(), "delay {delay} left a partial copy");
                }
            }
            canceller.await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_move_removes_source() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("a.txt");
        sfs::write(&src, "payload").unwrap();
        let token = CancellationToken::new();
        let target = move_file(&src, &dir.path().join("b.txt"), &token).await.unwrap();
        assert!(!src.exists());
        assert_eq!(sfs::read_to_string(target).unwrap(), "payload");
    }

    #[tokio::test]
    async fn test_remove_file_refuses_directories() {
        let dir = tempfile::tempdir().unwrap();
        let err = remove_file(dir.path()).await.unwrap_err();
        assert!(matches!(err, FmshError::IsADirectory(_)));

        let path = dir.path().join("gone.txt");
        sfs::write(&path, "x").unwrap();
        remove_file(&path).await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_remove_dir_requires_empty_unless_recursive() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("full");
        sfs::create_dir_all(target.join("inner")).unwrap();
        sfs::write(target.join("inner/file.txt"), "x").unwrap();

        let token = CancellationToken::new();
        let err = remove_dir(&target, false, &token).await.unwrap_err();
        assert!(matches!(err, FmshError::NotEmpty(_)));
        remove_dir(&target, true, &token).await.unwrap();
        assert!(!target.exists());

        let file = dir.path().join("plain.txt");
        sfs::write(&file, "x").unwrap();
        let err = remove_dir(&file, false, &token).await.unwrap_err();
        assert!(matches!(err, FmshError::NotADirectory(_)));
    }

    #[tokio::test]
    async fn test_info_reports_kind_and_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        sfs::write(&path, "12345").unwrap();

        let file = info(&path).await.unwrap();
        assert_eq!(file.kind, EntryKind::File);
        assert_eq!(file.size, 5);
        assert!(file.modified.is_some());

        let folder = info(dir.path()).await.unwrap();
        assert_eq!(folder.kind, EntryKind::Directory);
    }
}
