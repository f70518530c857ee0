/// Configuration management for mdtrim
///
/// mdtrim stores configuration in ~/.mdtrim/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Defaults target the README this tool was first written for: the end of
/// the flowchart, a stray `---` and the first copy of the step-by-step
/// heading. The stale walkthrough after it runs up to the second copy.
pub const DEFAULT_ANCHOR: &str =
    "style UserAction fill:#ffd93d\n```\n\n---\n\n---\n\n### 📋 Step-by-Step Flow Explanations\n\n";
pub const DEFAULT_MARKER: &str = "### 📋 Step-by-Step Flow Explanations";
pub const DEFAULT_TARGET: &str = "README.md";

/// mdtrim configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub target: TargetConfig,

    /// Anchor/marker settings
    #[serde(default)]
    pub pattern: PatternConfig,

    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// File processed when no FILE argument is given
    #[serde(default = "default_target")]
    pub path: String,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            path: default_target(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    #[serde(default = "default_anchor")]
    pub anchor: String,

    #[serde(default = "default_marker")]
    pub marker: String,

    /// Treat anchor and marker as regular expressions
    #[serde(default)]
    pub regex: bool,

    /// Collapse every occurrence instead of only the first
    #[serde(default)]
    pub all: bool,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            anchor: default_anchor(),
            marker: default_marker(),
            regex: false,
            all: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackupConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of backups kept before the oldest are removed
    #[serde(default = "default_max_backups")]
    pub max_backups: usize,

    /// Custom backup directory
    #[serde(default)]
    pub backup_dir: Option<String>,
}

impl Default for BackupConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_backups: default_max_backups(),
            backup_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Number of context lines to show around removed lines
    #[serde(default = "default_context_lines")]
    pub context_lines: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            context_lines: default_context_lines(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a debug log to ~/.mdtrim/mdtrim.log
    #[serde(default)]
    pub debug: bool,
}

// Default functions for serde
fn default_target() -> String { DEFAULT_TARGET.to_string() }
fn default_anchor() -> String { DEFAULT_ANCHOR.to_string() }
fn default_marker() -> String { DEFAULT_MARKER.to_string() }
fn default_true() -> bool { true }
fn default_max_backups() -> usize { 50 }
fn default_context_lines() -> usize { 2 }

/// Get the mdtrim home directory (~/.mdtrim)
pub fn mdtrim_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;
    Ok(home_dir.join(".mdtrim"))
}

/// Get the configuration file path
pub fn config_file_path() -> Result<PathBuf> {
    let config_dir = mdtrim_dir()?;
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

    Ok(config_dir.join("config.toml"))
}

/// Get the default configuration file content with comments
fn get_default_config_content() -> String {
    let template = r#"# mdtrim Configuration File
#
# Values set here can be overridden by command-line flags.
# Run 'mdtrim config --show' to print the effective configuration.

[target]
# File processed when no FILE argument is given (default: README.md)
path = "README.md"

[pattern]
# Text that ends the preserved prefix; removal starts right after it
anchor = __ANCHOR__

# Text where preserved content resumes; removal stops at the nearest one
marker = __MARKER__

# Treat anchor and marker as regular expressions (default: false)
regex = false

# Collapse every anchor/marker span instead of only the first (default: false)
all = false

[backup]
# Back up the file before writing (default: true)
enabled = true

# Number of backups to keep (default: 50)
max_backups = 50

# Custom backup directory (optional, default: ~/.mdtrim/backups/)
#backup_dir = "/mnt/backups/mdtrim"

[output]
# Context lines shown around removed lines in previews (default: 2, max: 10)
context_lines = 2

[logging]
# Write a debug log to ~/.mdtrim/mdtrim.log (default: false)
debug = false
"#;

    // toml::Value's Display gives a correctly escaped TOML string literal
    template
        .replace("__ANCHOR__", &toml::Value::String(DEFAULT_ANCHOR.to_string()).to_string())
        .replace("__MARKER__", &toml::Value::String(DEFAULT_MARKER.to_string()).to_string())
}

/// Write the default commented configuration file to `path`
pub fn save_default_config_to(path: &Path) -> Result<()> {
    fs::write(path, get_default_config_content())
        .with_context(|| format!("Failed to write default config file: {}", path.display()))
}

/// Save the default commented configuration file
pub fn save_default_config() -> Result<()> {
    save_default_config_to(&config_file_path()?)
}

/// Load configuration from `path`, creating a default file if needed
///
/// If the config file is malformed, it is recreated with defaults.
pub fn load_config_from(path: &Path) -> Result<Config> {
    if !path.exists() {
        save_default_config_to(path)?;
    }

    let config_str = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = match toml::from_str(&config_str) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "malformed config, restoring defaults");
            eprintln!("Warning: config file {} was malformed and has been reset", path.display());
            save_default_config_to(path)?;
            return Ok(Config::default());
        }
    };

    Ok(config)
}

/// Load configuration from ~/.mdtrim/config.toml
pub fn load_config() -> Result<Config> {
    load_config_from(&config_file_path()?)
}

/// Validate configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    if config.target.path.trim().is_empty() {
        anyhow::bail!("Invalid target path: must not be empty");
    }

    if config.pattern.anchor.is_empty() {
        anyhow::bail!("Invalid anchor: must not be empty");
    }

    if config.pattern.marker.is_empty() {
        anyhow::bail!("Invalid marker: must not be empty");
    }

    if config.backup.max_backups == 0 {
        anyhow::bail!("Invalid max_backups: 0 (must be at least 1)");
    }

    if config.output.context_lines > 10 {
        anyhow::bail!("Invalid context_lines: {} (max 10)", config.output.context_lines);
    }

    Ok(())
}
