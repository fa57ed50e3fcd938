use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct StoreConfig {
    /// Location of the user file
    pub path: PathBuf,
    /// Hex encoded encryption key
    pub key_hex: Option<String>,
    /// Name of an environment variable holding a hex encoded key
    pub key_env: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default = "default_console")]
    pub console: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: default_console(),
        }
    }
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_console() -> bool {
    false
}

// keys never end up in logs
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("path", &self.path)
            .field("key_hex", &self.key_hex.as_ref().map(|_| "<redacted>"))
            .field("key_env", &self.key_env)
            .finish()
    }
}

impl StoreConfig {
    /// Resolve the encryption key; `None` means the file is stored as plain text
    pub fn key(&self) -> Result<Option<Vec<u8>>> {
        let hex_key = match (&self.key_hex, &self.key_env) {
            (Some(_), Some(_)) => bail!("Only one of key_hex and key_env may be set"),
            (Some(hex_key), None) => hex_key.clone(),
            (None, Some(var)) => std::env::var(var)
                .context(format!("Failed to read key from environment variable {}", var))?,
            (None, None) => return Ok(None),
        };

        let key = hex::decode(hex_key.trim()).context("Key is not valid hex")?;
        match key.len() {
            16 | 24 | 32 => Ok(Some(key)),
            len => bail!("Key has a length of {} bytes, should be 16, 24 or 32", len),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.store.path.as_os_str().is_empty() {
            bail!("store path must not be empty");
        }

        if self.store.key_hex.is_some() && self.store.key_env.is_some() {
            bail!("Only one of key_hex and key_env may be set");
        }

        // An env key is only resolved when the store is opened
        if self.store.key_hex.is_some() {
            self.store.key()?;
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        Ok(())
    }
}
