use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FmshConfig {
    pub shell: ShellConfig,
    pub logging: LoggingConfig,
}

impl FmshConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shell.interrupt_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "shell.interrupt_window_ms",
                reason: "must be greater than zero",
            });
        }
        if self.shell.history.enabled && self.shell.history.max_entries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "shell.history.max_entries",
                reason: "must be greater than zero when history is enabled",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    /// Empty means `Anonymous`; the `--username` flag wins over this.
    pub username: String,
    /// Placeholders: `{user}`, `{cwd}` and color tags such as `{green}`.
    pub prompt: String,
    /// Empty means the home directory.
    pub start_dir: String,
    /// Print "You are currently in ..." after each line.
    pub show_cwd: bool,
    /// Two interrupts closer than this exit the shell.
    pub interrupt_window_ms: u64,
    pub history: HistoryConfig,
}

impl ShellConfig {
    pub fn interrupt_window(&self) -> Duration {
        Duration::from_millis(self.interrupt_window_ms)
    }

    /// `start_dir` with `~` and `$VAR` expanded, if set.
    pub fn start_dir_path(&self) -> Option<PathBuf> {
        if self.start_dir.trim().is_empty() {
            return None;
        }
        Some(expand_path(&self.start_dir))
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            prompt: "{green}{user}{reset}@fmsh:{blue}{cwd}{reset}> ".to_string(),
            start_dir: String::new(),
            show_cwd: true,
            interrupt_window_ms: 1000,
            history: HistoryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub file: String,
    pub max_entries: usize,
}

impl HistoryConfig {
    pub fn path(&self) -> PathBuf {
        expand_path(&self.file)
    }
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            file: "~/.fmsh_history".to_string(),
            max_entries: 1000,
        }
    }
}

fn expand_path(path: &str) -> PathBuf {
    let expanded = shellexpand::full(path).map_or_else(|_| shellexpand::tilde(path), |p| p);
    PathBuf::from(expanded.as_ref())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    /// Full `EnvFilter` directive; overrides `level` when set.
    pub filter: String,
}

impl LoggingConfig {
    /// Directive string for `tracing_subscriber::EnvFilter`.
    pub fn directive(&self) -> String {
        if self.filter.trim().is_empty() {
            self.level.as_str().to_string()
        } else {
            self.filter.clone()
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            format: LogFormat::Pretty,
            filter: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
    Compact,
}
