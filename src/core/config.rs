//! # Configuration
//!
//! Centralizes all settings with a clear override hierarchy:
//! defaults → config file → env vars → CLI flags.
//!
//! Config lives at `~/.termtalk/config.toml`. If missing on first run, a
//! commented-out default is generated so users can discover all options.
//! The result is resolved once at startup and passed explicitly from there.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::conversation::DEFAULT_SYSTEM_PROMPT;

// ============================================================================
// Config Structs (all fields Option<T> for sparse TOML)
// ============================================================================

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TermtalkConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub openai: OpenAiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GeneralConfig {
    pub model: Option<String>,
    pub system_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    pub port: Option<u16>,
    pub request_timeout_secs: Option<u64>,
}

// ============================================================================
// Defaults
// ============================================================================

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

// ============================================================================
// Resolved Config (concrete values, no Options)
// ============================================================================

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub model_name: String,
    pub system_prompt: String,
    pub api_key: Option<String>,
    pub base_url: String,
    pub port: Option<u16>,
    /// Upper bound on one HTTP chat call, first byte to last.
    pub request_timeout: Duration,
}

impl ResolvedConfig {
    /// Port for `serve`. There is no default.
    pub fn server_port(&self) -> Result<u16, ConfigError> {
        self.port.ok_or(ConfigError::MissingPort)
    }
}

/// Values given on the command line. `None` means "not specified".
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub model: Option<String>,
    pub port: Option<u16>,
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    MissingPort,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {e}"),
            ConfigError::Parse(e) => write!(f, "config parse error: {e}"),
            ConfigError::MissingPort => write!(
                f,
                "no port configured (use --port, the PORT env var, or [server] port)"
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Loading
// ============================================================================

/// Returns the path to `~/.termtalk/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".termtalk").join("config.toml"))
}

/// Load config from `~/.termtalk/config.toml`.
///
/// If the file doesn't exist, generates a commented-out default and
/// returns `TermtalkConfig::default()`. If it exists but is malformed,
/// returns `ConfigError::Parse`.
pub fn load_config() -> Result<TermtalkConfig, ConfigError> {
    let Some(path) = config_path() else {
        warn!("Could not determine home directory, using default config");
        return Ok(TermtalkConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> Result<TermtalkConfig, ConfigError> {
    if !path.exists() {
        info!("No config file found, generating default at {}", path.display());
        generate_default_config(path);
        return Ok(TermtalkConfig::default());
    }

    let contents = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: TermtalkConfig = toml::from_str(&contents).map_err(ConfigError::Parse)?;
    info!("Loaded config from {}", path.display());
    debug!("Config: general={:?} server={:?}", config.general, config.server);
    Ok(config)
}

/// Generates a commented-out default config file at the given path.
fn generate_default_config(path: &Path) {
    let default_content = r#"# termtalk configuration
# All settings are optional. Defaults are used for anything not specified.
# Override hierarchy: defaults → this file → env vars → CLI flags.

# [general]
# model = "gpt-4o-mini"              # Or set OPENAI_MODEL
# system_prompt = "Do not use markdown except when user asks for it."

# [openai]
# api_key = "sk-..."                 # Or set OPENAI_API_KEY
# base_url = "https://api.openai.com/v1"   # Or set OPENAI_BASE_URL

# [server]
# port = 8080                        # Or set PORT; required by `termtalk serve`
# request_timeout_secs = 120
"#;

    if let Some(parent) = path.parent()
        && let Err(e) = fs::create_dir_all(parent)
    {
        warn!("Failed to create config directory: {}", e);
        return;
    }
    if let Err(e) = fs::write(path, default_content) {
        warn!("Failed to write default config: {}", e);
    }
}

// ============================================================================
// Resolution
// ============================================================================

/// Resolve the final config by collapsing: defaults → config file → env vars → CLI.
pub fn resolve(config: &TermtalkConfig, cli: &CliOverrides) -> ResolvedConfig {
    resolve_with_env(config, cli, |key| std::env::var(key).ok())
}

fn resolve_with_env(
    config: &TermtalkConfig,
    cli: &CliOverrides,
    env: impl Fn(&str) -> Option<String>,
) -> ResolvedConfig {
    // Model: CLI → env → config → default
    let model_name = cli
        .model
        .clone()
        .or_else(|| env("OPENAI_MODEL"))
        .or_else(|| config.general.model.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    let api_key = env("OPENAI_API_KEY")
        .or_else(|| config.openai.api_key.clone())
        .filter(|k| !k.is_empty());

    let base_url = env("OPENAI_BASE_URL")
        .or_else(|| config.openai.base_url.clone())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

    let env_port = env("PORT").and_then(|raw| match raw.trim().parse::<u16>() {
        Ok(port) => Some(port),
        Err(e) => {
            warn!("Ignoring PORT={:?}: {}", raw, e);
            None
        }
    });
    let port = cli.port.or(env_port).or(config.server.port);

    let system_prompt = config
        .general
        .system_prompt
        .clone()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

    let request_timeout_secs = match config.server.request_timeout_secs {
        Some(0) => {
            warn!(
                "Ignoring request_timeout_secs = 0; using {}s",
                DEFAULT_REQUEST_TIMEOUT_SECS
            );
            DEFAULT_REQUEST_TIMEOUT_SECS
        }
        Some(secs) => secs,
        None => DEFAULT_REQUEST_TIMEOUT_SECS,
    };
    let request_timeout = Duration::from_secs(request_timeout_secs);

    ResolvedConfig {
        model_name,
        system_prompt,
        api_key,
        base_url,
        port,
        request_timeout,
    }
}
