//! Error types for fmsh

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for fmsh operations
pub type FmshResult<T> = Result<T, FmshError>;

/// Error types for shell, registry and file engine operations
#[derive(Error, Debug)]
pub enum FmshError {
    /// No command or alias with this name
    #[error("Invalid command '{0}'. Type 'help' to see available commands")]
    UnknownCommand(String),

    /// A required positional argument was not given
    #[error("Missing argument: {0}")]
    MissingArgument(&'static str),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Hash or compression algorithm not supported
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The operation's cancellation token was aborted
    #[error("Operation aborted")]
    Aborted,

    #[error("No such file or directory: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Already exists: {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Is a directory: {}", .0.display())]
    IsADirectory(PathBuf),

    #[error("Directory not empty: {}", .0.display())]
    NotEmpty(PathBuf),

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Exit requested (not really an error)
    #[error("Exit requested")]
    Exit,
}

impl FmshError {
    /// Whether this failure is a user-initiated cancellation.
    pub fn is_aborted(&self) -> bool {
        matches!(self, FmshError::Aborted)
    }

    /// Attach a path to an IO error so the user sees which file failed.
    pub fn from_io(err: std::io::Error, path: impl Into<PathBuf>) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => FmshError::NotFound(path.into()),
            std::io::ErrorKind::AlreadyExists => FmshError::AlreadyExists(path.into()),
            _ => FmshError::Io(err),
        }
    }
}
