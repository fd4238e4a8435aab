//! Configuration file management for studyweek.
//!
//! Provides a TOML-based config file at `~/.config/studyweek/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use studyweek_core::proposer::http::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use studyweek_core::proposer::{DEFAULT_TIMEOUT, HttpProposer, HttpProposerConfig, PlanProposer};
use studyweek_db::config::DbConfig;

pub const ENV_DATABASE_URL: &str = "STUDYWEEK_DATABASE_URL";
pub const ENV_PROPOSER_ENDPOINT: &str = "STUDYWEEK_PROPOSER_ENDPOINT";
pub const ENV_PROPOSER_MODEL: &str = "STUDYWEEK_PROPOSER_MODEL";
pub const ENV_PROPOSER_API_KEY: &str = "STUDYWEEK_PROPOSER_API_KEY";
pub const ENV_PROPOSER_TIMEOUT: &str = "STUDYWEEK_PROPOSER_TIMEOUT_SECS";

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    #[serde(default)]
    pub proposer: ProposerSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ProposerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the studyweek config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/studyweek` or
/// `~/.config/studyweek`, also on macOS.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("studyweek");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("studyweek")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    toml::from_str(&contents).context("failed to parse config file")
}

/// Serialize and write the config file, creating parent dirs as needed.
/// The file may hold an API key, so it is made owner-only on Unix.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(path)
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct StudyweekConfig {
    pub db_config: DbConfig,
    pub proposer: HttpProposerConfig,
    pub proposer_timeout: Duration,
}

impl StudyweekConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config
    /// file > default.
    ///
    /// - DB URL: `cli_db_url` > `STUDYWEEK_DATABASE_URL` > `database.url` >
    ///   `DbConfig::DEFAULT_URL`
    /// - Proposer endpoint, model, API key and timeout: `STUDYWEEK_PROPOSER_*`
    ///   env vars > `[proposer]` section > defaults (no API key)
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();
        let section = file_config.as_ref().map(|c| &c.proposer);

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var(ENV_DATABASE_URL) {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let pick = |env: &str, from_file: Option<&String>| -> Option<String> {
            std::env::var(env).ok().or_else(|| from_file.cloned())
        };

        let proposer = HttpProposerConfig {
            endpoint: pick(ENV_PROPOSER_ENDPOINT, section.and_then(|s| s.endpoint.as_ref()))
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            model: pick(ENV_PROPOSER_MODEL, section.and_then(|s| s.model.as_ref()))
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: pick(ENV_PROPOSER_API_KEY, section.and_then(|s| s.api_key.as_ref())),
            ..HttpProposerConfig::default()
        };

        let proposer_timeout = match std::env::var(ENV_PROPOSER_TIMEOUT) {
            Ok(raw) => Duration::from_secs(
                raw.parse()
                    .with_context(|| format!("{ENV_PROPOSER_TIMEOUT} is not a number: {raw:?}"))?,
            ),
            Err(_) => section
                .and_then(|s| s.timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_TIMEOUT),
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            proposer,
            proposer_timeout,
        })
    }

    /// Build the HTTP proposer. Requires an API key.
    pub fn build_proposer(&self) -> Result<Arc<dyn PlanProposer>> {
        if self.proposer.api_key.is_none() {
            bail!(
                "proposer API key not found; set {ENV_PROPOSER_API_KEY} or add `api_key` under [proposer] in {}",
                config_path().display()
            );
        }
        let proposer = HttpProposer::new(self.proposer.clone())
            .context("failed to build HTTP proposer")?;
        Ok(Arc::new(proposer))
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
