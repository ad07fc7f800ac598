//! fmsh configuration
//!
//! # Configuration Loading Priority
//!
//! 1. Compiled-in defaults
//! 2. `/etc/fmsh/fmsh.yaml` (system-wide)
//! 3. `~/.config/fmsh/fmsh.yaml` (user)
//! 4. `./fmsh.yaml` (working directory)
//! 5. `FMSH_CONFIG=/path/to/config.yaml` or `--config` (explicit, replaces 2-4)
//! 6. Environment variables (highest priority)
//!
//! Files are merged key by key, so a later file only needs the keys it
//! changes. `${VAR}` references are expanded before parsing.
//!
//! # Example Configuration
//!
//! ```yaml
//! shell:
//!   username: "${USER}"
//!   prompt: "{bold}{user}{reset} {cwd}> "
//!   start_dir: "~/work"
//!   interrupt_window_ms: 800
//!   history:
//!     file: "~/.fmsh_history"
//!     max_entries: 500
//!
//! logging:
//!   level: info
//!   format: json
//! ```

#![allow(missing_docs)]

mod error;
mod loader;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use types::*;

/// Load configuration from default locations.
///
/// Searches for config files in order and merges them.
/// Environment variables override file values.
pub fn load() -> Result<FmshConfig, ConfigError> {
    ConfigLoader::new().load()
}

/// Load configuration from a specific file.
pub fn load_from_file(path: &str) -> Result<FmshConfig, ConfigError> {
    ConfigLoader::new().with_file(path).load()
}
