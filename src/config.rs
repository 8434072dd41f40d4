//! Configuration for flakewatch.
//!
//! Global settings live in `~/.flakewatch/config.toml` and are created
//! with defaults on first run. A per-project overlay file
//! (`.flakewatch.toml`) discovered upward from an invocation's first
//! target supplies the environment the tool runs with.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the per-project overlay file.
pub const PROJECT_OVERLAY_FILE: &str = ".flakewatch.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub tool: ToolConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    /// Base environment passed to every invocation.
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Settings for the wrapped analysis tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Command to run
    pub command: String,

    /// Argument string, tokenized before use (quotes respected)
    pub args: String,

    /// Seconds before a running invocation is force-terminated
    pub timeout_secs: u64,

    /// Treat `:` as ambiguous between path and field separators when
    /// parsing tool output (drive-letter paths)
    pub ambiguous_path_separators: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            command: "flake8".to_string(),
            args: "--statistics".to_string(),
            timeout_secs: 10,
            ambiguous_path_separators: cfg!(windows),
        }
    }
}

/// Settings for save-triggered runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Run the tool automatically when a file save is reported
    pub on_save: bool,
}

impl Default for WatchConfig {
    fn default() -> Self {
        WatchConfig { on_save: true }
    }
}

impl Config {
    /// Load configuration from the default path, creating it with
    /// defaults if it doesn't exist.
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to the default path.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path.
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".flakewatch").join("config.toml"))
    }
}

/// Per-project overlay carried by a `.flakewatch.toml` file.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProjectOverlay {
    /// Environment entries overriding the global table
    #[serde(default)]
    pub env: HashMap<String, String>,
}

/// Resolve the environment for an invocation, keyed on its first target.
///
/// Walks from the target's directory upward looking for a project
/// overlay. When one is found its entries override the global table and
/// `PYTHONPATH` is pointed at the project root; the search stops at the
/// first overlay.
pub fn environment_for(first_target: &Path, config: &Config) -> HashMap<String, String> {
    let mut env = config.env.clone();

    let start = if first_target.is_dir() {
        first_target
    } else {
        first_target.parent().unwrap_or(first_target)
    };

    for dir in start.ancestors() {
        let overlay_path = dir.join(PROJECT_OVERLAY_FILE);
        if !overlay_path.is_file() {
            continue;
        }
        if let Ok(contents) = fs::read_to_string(&overlay_path) {
            if let Ok(overlay) = toml::from_str::<ProjectOverlay>(&contents) {
                env.extend(overlay.env);
                env.insert("PYTHONPATH".to_string(), dir.display().to_string());
            }
        }
        break;
    }

    env
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_tool_defaults() {
        let config = Config::default();
        assert_eq!(config.tool.command, "flake8");
        assert_eq!(config.tool.args, "--statistics");
        assert_eq!(config.tool.timeout_secs, 10);
        assert!(config.watch.on_save);
    }

    #[test]
    fn test_round_trip() {
        let mut config = Config::default();
        config.tool.command = "pyflakes".to_string();
        config.env.insert("FOO".to_string(), "bar".to_string());

        let toml_string = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_string).unwrap();

        assert_eq!(parsed.tool.command, "pyflakes");
        assert_eq!(parsed.env.get("FOO").map(String::as_str), Some("bar"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[tool]\ncommand = \"ruff\"\n").unwrap();
        assert_eq!(parsed.tool.command, "ruff");
        assert_eq!(parsed.tool.timeout_secs, 10);
        assert!(parsed.watch.on_save);
        assert!(parsed.env.is_empty());
    }

    #[test]
    fn test_environment_without_overlay() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("pkg").join("mod.py");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "x = 1\n").unwrap();

        let mut config = Config::default();
        config.env.insert("GLOBAL".to_string(), "1".to_string());

        let env = environment_for(&target, &config);
        assert_eq!(env.get("GLOBAL").map(String::as_str), Some("1"));
        assert!(!env.contains_key("PYTHONPATH"));
    }

    #[test]
    fn test_environment_with_overlay() {
        let temp = TempDir::new().unwrap();
        let project = temp.path().join("proj");
        let target = project.join("pkg").join("mod.py");
        fs::create_dir_all(target.parent().unwrap()).unwrap();
        fs::write(&target, "x = 1\n").unwrap();
        fs::write(
            project.join(PROJECT_OVERLAY_FILE),
            "[env]\nGLOBAL = \"2\"\nLOCAL = \"yes\"\n",
        )
        .unwrap();

        let mut config = Config::default();
        config.env.insert("GLOBAL".to_string(), "1".to_string());

        let env = environment_for(&target, &config);
        assert_eq!(env.get("GLOBAL").map(String::as_str), Some("2"));
        assert_eq!(env.get("LOCAL").map(String::as_str), Some("yes"));
        assert_eq!(
            env.get("PYTHONPATH").map(String::as_str),
            Some(project.display().to_string().as_str())
        );
    }

    #[test]
    fn test_nearest_overlay_wins() {
        let temp = TempDir::new().unwrap();
        let outer = temp.path().join("outer");
        let inner = outer.join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(outer.join(PROJECT_OVERLAY_FILE), "[env]\nWHICH = \"outer\"\n").unwrap();
        fs::write(inner.join(PROJECT_OVERLAY_FILE), "[env]\nWHICH = \"inner\"\n").unwrap();
        let target = inner.join("mod.py");
        fs::write(&target, "").unwrap();

        let env = environment_for(&target, &Config::default());
        assert_eq!(env.get("WHICH").map(String::as_str), Some("inner"));
    }
}
