//! Per-shell session state
//!
//! The working directory lives here instead of in the process, so handlers
//! resolve paths against an explicit value that tests can set freely.

use std::path::{Component, Path, PathBuf};

pub const DEFAULT_USERNAME: &str = "Anonymous";

#[derive(Debug, Clone)]
pub struct Session {
    pub cwd: PathBuf,
    pub username: String,
    pub home: PathBuf,
}

impl Session {
    pub fn new(cwd: impl Into<PathBuf>, username: &str) -> Self {
        let cwd = cwd.into();
        let home = dirs::home_dir().unwrap_or_else(|| cwd.clone());
        Self {
            cwd: normalize(&cwd),
            username: normalize_username(username),
            home,
        }
    }

    /// Start in the user's home directory.
    pub fn in_home(username: &str) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("/"));
        Self::new(home, username)
    }

    pub fn with_home(mut self, home: impl Into<PathBuf>) -> Self {
        self.home = home.into();
        self
    }

    /// Resolve `path` against the working directory.
    ///
    /// `~` expands to the home directory; `.` and `..` are folded lexically.
    pub fn resolve_path(&self, path: &str) -> PathBuf {
        let joined = if path == "~" {
            self.home.clone()
        } else if let Some(rest) = path.strip_prefix("~/") {
            self.home.join(rest)
        } else {
            let p = Path::new(path);
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                self.cwd.join(p)
            }
        };
        normalize(&joined)
    }

    pub fn cwd_display(&self) -> String {
        self.cwd.display().to_string()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::in_home(DEFAULT_USERNAME)
    }
}

/// Empty or blank names fall back to `Anonymous`.
pub fn normalize_username(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        DEFAULT_USERNAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Fold `.` and `..` without touching the file system; never climbs above root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                let at_root = out.parent().is_none();
                if !at_root {
                    out.pop();
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_creation() {
        let session = Session::new("/tmp/work", "alice");
        assert_eq!(session.cwd, PathBuf::from("/tmp/work"));
        assert_eq!(session.username, "alice");
    }

    #[test]
    fn test_blank_username_defaults() {
        assert_eq!(Session::new("/", "").username, "Anonymous");
        assert_eq!(Session::new("/", "   ").username, "Anonymous");
    }

    #[test]
    fn test_resolve_relative_and_absolute() {
        let session = Session::new("/home/user", "u");
        assert_eq!(session.resolve_path("docs"), PathBuf::from("/home/user/docs"));
        assert_eq!(session.resolve_path("/etc/hosts"), PathBuf::from("/etc/hosts"));
        assert_eq!(session.resolve_path("."), PathBuf::from("/home/user"));
        assert_eq!(session.resolve_path(".."), PathBuf::from("/home"));
        assert_eq!(session.resolve_path("a/../b/./c"), PathBuf::from("/home/user/b/c"));
    }

    #[test]
    fn test_resolve_never_climbs_above_root() {
        let session = Session::new("/", "u");
        assert_eq!(session.resolve_path(".."), PathBuf::from("/"));
        assert_eq!(session.resolve_path("../../x"), PathBuf::from("/x"));
    }

    #[test]
    fn test_resolve_home() {
        let session = Session::new("/srv", "u").with_home("/home/u");
        assert_eq!(session.resolve_path("~"), PathBuf::from("/home/u"));
        assert_eq!(session.resolve_path("~/notes.txt"), PathBuf::from("/home/u/notes.txt"));
    }
}
