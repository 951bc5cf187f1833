//! Configuration module for the bundler.
//!
//! A layered configuration system:
//! - Default values
//! - TOML configuration file (`cribo.toml`, discovered by walking ancestors)
//! - Environment variable overrides
//! - CLI argument overrides (applied by the caller after `Settings::load`)
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `CRIBO_` and use double
//! underscores to separate nested levels:
//! - `CRIBO_BUNDLE__TREE_SHAKE=false` sets `bundle.tree_shake`
//! - `CRIBO_BUNDLE__PYTHON_VERSION=3.11` sets `bundle.python_version`
//! - `CRIBO_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema.
    #[serde(default = "default_version")]
    pub version: u32,

    /// Bundling behavior.
    #[serde(default)]
    pub bundle: BundleConfig,

    /// Logging configuration, consumed by [`crate::logging`].
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BundleConfig {
    /// Source roots searched for first-party modules, in order.
    /// Defaults to the entry file's parent directory if left empty.
    #[serde(default)]
    pub source_roots: Vec<PathBuf>,

    /// Target Python version; selects the embedded stdlib snapshot.
    #[serde(default = "default_python_version")]
    pub python_version: String,

    /// Whether to remove definitions unreachable from the entry module (§4.4).
    #[serde(default = "default_true")]
    pub tree_shake: bool,

    /// Whether to emit a `requirements.txt` alongside the bundle.
    #[serde(default = "default_false")]
    pub emit_requirements: bool,

    /// Promote semantic warnings (§7) to fatal errors.
    #[serde(default = "default_false")]
    pub strict: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default tracing filter directive, e.g. "warn".
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides layered onto `default` as `module=level`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

fn default_version() -> u32 {
    1
}
fn default_python_version() -> String {
    "3.12".to_string()
}
fn default_true() -> bool {
    true
}
fn default_false() -> bool {
    false
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            bundle: BundleConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            source_roots: Vec::new(),
            python_version: default_python_version(),
            tree_shake: true,
            emit_requirements: false,
            strict: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources, discovering `cribo.toml` by
    /// walking up from the current directory.
    pub fn load() -> Result<Self, figment::Error> {
        let config_path =
            Self::find_workspace_config().unwrap_or_else(|| PathBuf::from("cribo.toml"));
        Self::load_from(config_path)
    }

    /// Load configuration from a specific file, still layering defaults and
    /// environment variables on top.
    pub fn load_from(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("CRIBO_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract()
    }

    /// Search from the current directory up to the filesystem root for a
    /// `cribo.toml`.
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        for ancestor in current.ancestors() {
            let candidate = ancestor.join("cribo.toml");
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }

    /// Save current configuration to file.
    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Write a default `cribo.toml` in the current directory.
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from("cribo.toml");
        if !force && config_path.exists() {
            return Err("cribo.toml already exists. Use --force to overwrite".into());
        }
        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.version, 1);
        assert_eq!(settings.bundle.python_version, "3.12");
        assert!(settings.bundle.tree_shake);
        assert!(!settings.bundle.strict);
    }

    #[test]
    fn load_from_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cribo.toml");

        let toml_content = r#"
version = 1

[bundle]
python_version = "3.11"
tree_shake = false
strict = true

[logging]
default = "debug"
"#;
        fs::write(&config_path, toml_content).unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert_eq!(settings.bundle.python_version, "3.11");
        assert!(!settings.bundle.tree_shake);
        assert!(settings.bundle.strict);
        assert_eq!(settings.logging.default, "debug");
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cribo.toml");

        fs::write(&config_path, "[bundle]\nstrict = true\n").unwrap();

        let settings = Settings::load_from(&config_path).unwrap();
        assert!(settings.bundle.strict);
        assert_eq!(settings.bundle.python_version, "3.12");
        assert!(settings.bundle.tree_shake);
    }

    #[test]
    fn env_overrides_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("cribo.toml");
        fs::write(&config_path, "[bundle]\ntree_shake = true\n").unwrap();

        unsafe {
            std::env::set_var("CRIBO_BUNDLE__TREE_SHAKE", "false");
        }
        let settings = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(&config_path))
            .merge(Env::prefixed("CRIBO_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
            .extract::<Settings>()
            .unwrap();
        unsafe {
            std::env::remove_var("CRIBO_BUNDLE__TREE_SHAKE");
        }

        assert!(!settings.bundle.tree_shake);
    }
}
