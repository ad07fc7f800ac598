//! Cooperative cancellation for long-running operations
//!
//! One [`CancellationToken`] is created per command invocation and handed
//! down through every layer of the handler. Work checks it before starting,
//! at each loop iteration, and every awaited I/O call goes through [`guard`]
//! so a single `cancel()` halts in-flight reads and writes promptly.

use crate::error::{FmshError, FmshResult};
use std::future::Future;
use std::path::Path;

pub use tokio_util::sync::CancellationToken;

/// Fail with [`FmshError::Aborted`] if the token has been cancelled.
pub fn check(token: &CancellationToken) -> FmshResult<()> {
    if token.is_cancelled() {
        Err(FmshError::Aborted)
    } else {
        Ok(())
    }
}

/// Run one I/O future, racing it against the token.
///
/// Cancellation wins ties, so a token aborted before the call never lets the
/// I/O start producing side effects that are observed afterwards.
pub async fn guard<T, F>(token: &CancellationToken, fut: F) -> FmshResult<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(FmshError::Aborted),
        res = fut => res.map_err(FmshError::Io),
    }
}

/// Like [`guard`], but maps IO errors onto the path that caused them.
pub async fn guard_path<T, F>(token: &CancellationToken, path: &Path, fut: F) -> FmshResult<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    tokio::select! {
        biased;
        () = token.cancelled() => Err(FmshError::Aborted),
        res = fut => res.map_err(|e| FmshError::from_io(e, path)),
    }
}

/// Remove a partially written output file after an abort or failure.
///
/// Removal is idempotent: a destination that was never created is fine.
pub async fn discard_partial(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::debug!(path = %path.display(), "Removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove partial output");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn check_reports_abort() {
        let token = CancellationToken::new();
        assert!(check(&token).is_ok());
        token.cancel();
        assert!(matches!(check(&token), Err(FmshError::Aborted)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let token = CancellationToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn guard_passes_through_results() {
        let token = CancellationToken::new();
        let value = guard(&token, async { Ok::<_, std::io::Error>(7) }).await.unwrap();
        assert_eq!(value, 7);

        let err = guard(&token, async {
            Err::<(), _>(std::io::Error::other("disk on fire"))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, FmshError::Io(_)));
    }

    #[tokio::test]
    async fn guard_prefers_cancellation_when_already_aborted() {
        let token = CancellationToken::new();
        token.cancel();
        let err = guard(&token, async { Ok::<_, std::io::Error>(()) })
            .await
            .unwrap_err();
        assert!(err.is_aborted());
    }

    #[tokio::test]
    async fn guard_interrupts_pending_io() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });
        let err = guard(&token, async {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok::<_, std::io::Error>(())
        })
        .await
        .unwrap_err();
        assert!(err.is_aborted());
    }

    #[tokio::test]
    async fn discard_partial_tolerates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never-created.bin");
        discard_partial(&path).await;
        assert!(!path.exists());

        std::fs::write(&path, b"half").unwrap();
        discard_partial(&path).await;
        assert!(!path.exists());
    }
}
