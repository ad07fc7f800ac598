use crate::{ConfigError, FmshConfig, LogLevel};
use regex::Regex;
use serde_yaml::Value;
use std::path::PathBuf;
use std::sync::OnceLock;

pub struct ConfigLoader {
    explicit_file: Option<PathBuf>,
    search_paths: Vec<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        if let Some(home) = dirs::home_dir() {
            search_paths.push(home.join(".config/fmsh/fmsh.yaml"));
        }
        search_paths.push(PathBuf::from("./fmsh.yaml"));

        #[cfg(unix)]
        search_paths.insert(0, PathBuf::from("/etc/fmsh/fmsh.yaml"));

        Self {
            explicit_file: None,
            search_paths,
        }
    }

    pub fn with_file(mut self, path: &str) -> Self {
        self.explicit_file = Some(PathBuf::from(path));
        self
    }

    /// Replace the default search locations.
    pub fn with_search_paths(mut self, paths: Vec<PathBuf>) -> Self {
        self.search_paths = paths;
        self
    }

    pub fn load(&self) -> Result<FmshConfig, ConfigError> {
        let explicit = std::env::var("FMSH_CONFIG")
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
            .or_else(|| self.explicit_file.clone());

        let mut merged = Value::Mapping(serde_yaml::Mapping::new());
        if let Some(path) = explicit {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::ReadFile {
                path: path.clone(),
                source: e,
            })?;
            tracing::debug!(path = %path.display(), "Loading config file");
            merge_values(&mut merged, self.parse_yaml(&content)?);
        } else {
            for path in &self.search_paths {
                if !path.exists() {
                    continue;
                }
                match std::fs::read_to_string(path) {
                    Ok(content) => {
                        tracing::debug!(path = %path.display(), "Merging config file");
                        merge_values(&mut merged, self.parse_yaml(&content)?);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable config file");
                    }
                }
            }
        }

        let mut config: FmshConfig = serde_yaml::from_value(merged)?;
        apply_env_overrides(&mut config, |name| std::env::var(name).ok());
        config.validate()?;
        Ok(config)
    }

    fn parse_yaml(&self, content: &str) -> Result<Value, ConfigError> {
        let expanded = self.expand_env_vars(content);
        let value: Value = serde_yaml::from_str(&expanded)?;
        // An empty file parses as null and contributes nothing.
        Ok(if value.is_null() {
            Value::Mapping(serde_yaml::Mapping::new())
        } else {
            value
        })
    }

    fn expand_env_vars(&self, content: &str) -> String {
        static ENV_REF: OnceLock<Regex> = OnceLock::new();
        let re = ENV_REF.get_or_init(|| Regex::new(r"\$\{([^}]+)\}").expect("env reference pattern is valid"));
        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_default()
        })
        .to_string()
    }
}

/// Deep-merge `overlay` into `base`: mappings merge key by key, anything
/// else in the overlay replaces the base value.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                match base_map.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Environment overrides, read through `lookup` so tests need not touch the
/// process environment.
fn apply_env_overrides<F>(config: &mut FmshConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(username) = lookup("FMSH_USERNAME") {
        config.shell.username = username;
    }
    if let Some(prompt) = lookup("FMSH_PROMPT") {
        config.shell.prompt = prompt;
    }
    if let Some(dir) = lookup("FMSH_START_DIR") {
        config.shell.start_dir = dir;
    }
    if let Some(level) = lookup("FMSH_LOG_LEVEL") {
        match serde_yaml::from_str::<LogLevel>(&level.to_lowercase()) {
            Ok(l) => config.logging.level = l,
            Err(_) => tracing::warn!(value = %level, "Ignoring invalid FMSH_LOG_LEVEL"),
        }
    }
    if let Some(window) = lookup("FMSH_INTERRUPT_WINDOW_MS") {
        match window.parse() {
            Ok(ms) => config.shell.interrupt_window_ms = ms,
            Err(_) => tracing::warn!(value = %window, "Ignoring invalid FMSH_INTERRUPT_WINDOW_MS"),
        }
    }
}
