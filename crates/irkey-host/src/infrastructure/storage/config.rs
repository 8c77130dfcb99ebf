//! TOML-based configuration for the host bridge.
//!
//! Reads and writes `AppConfig` to the platform-appropriate config file:
//! - Windows:  `%APPDATA%\IrKey\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/irkey/config.toml` (or `~/.config/irkey`)
//! - macOS:    `~/Library/Application Support/IrKey/config.toml`
//!
//! Example:
//!
//! ```toml
//! log_level = "info"
//!
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [dispatch]
//! repeat_threshold_ms = 200
//! single_tap = false
//! repeat = true
//!
//! [ghost]
//! enabled = true
//! key = "f10"
//! ```
//!
//! Every field has a `#[serde(default = ...)]`, so a partial file (or none at
//! all) still yields a complete configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use irkey_core::HidKeyCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::application::debounce::DebounceConfig;
use crate::application::session::{DispatchSession, GhostKey};
use crate::infrastructure::serial::{ReconnectPolicy, SerialSettings};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("unknown ghost key {0:?}")]
    InvalidGhostKey(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub serial: SerialConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub ghost: GhostConfig,
    #[serde(default)]
    pub profiles: ProfilesConfig,
    /// `tracing` level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SerialConfig {
    #[serde(default = "default_port")]
    pub port: String,
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,
    /// Upper bound on one blocking read.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
    /// 0 = retry forever.
    #[serde(default)]
    pub reconnect_max_attempts: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    #[serde(default = "default_repeat_threshold_ms")]
    pub repeat_threshold_ms: u64,
    #[serde(default)]
    pub single_tap: bool,
    /// Held buttons re-fire their action; `toggle_repeat` flips it at runtime.
    #[serde(default = "default_repeat")]
    pub repeat: bool,
    #[serde(default = "default_tap_cooldown_ms")]
    pub tap_cooldown_ms: u64,
    #[serde(default = "default_release_timeout_ms")]
    pub release_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GhostConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Key name as accepted in profiles, e.g. `"f10"`.
    #[serde(default = "default_ghost_key")]
    pub key: String,
    #[serde(default = "default_ghost_hold_ms")]
    pub hold_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfilesConfig {
    /// Overrides `<config dir>/profiles`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,
    /// File name of the profile used last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_used: Option<String>,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_port() -> String {
    if cfg!(target_os = "windows") {
        "COM5".to_string()
    } else {
        "/dev/ttyUSB0".to_string()
    }
}
fn default_baud_rate() -> u32 {
    9600
}
fn default_read_timeout_ms() -> u64 {
    100
}
fn default_reconnect_initial_ms() -> u64 {
    500
}
fn default_reconnect_max_ms() -> u64 {
    5_000
}
fn default_repeat_threshold_ms() -> u64 {
    200
}
fn default_repeat() -> bool {
    true
}
fn default_tap_cooldown_ms() -> u64 {
    500
}
fn default_release_timeout_ms() -> u64 {
    500
}
fn default_ghost_key() -> String {
    "f10".to_string()
}
fn default_ghost_hold_ms() -> u64 {
    200
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            dispatch: DispatchConfig::default(),
            ghost: GhostConfig::default(),
            profiles: ProfilesConfig::default(),
            log_level: default_log_level(),
        }
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
            reconnect_max_attempts: 0,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            repeat_threshold_ms: default_repeat_threshold_ms(),
            single_tap: false,
            repeat: default_repeat(),
            tap_cooldown_ms: default_tap_cooldown_ms(),
            release_timeout_ms: default_release_timeout_ms(),
        }
    }
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            key: default_ghost_key(),
            hold_ms: default_ghost_hold_ms(),
        }
    }
}

// ── Conversions into runtime types ────────────────────────────────────────────

impl AppConfig {
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings {
            port: self.serial.port.clone(),
            baud_rate: self.serial.baud_rate,
            read_timeout: Duration::from_millis(self.serial.read_timeout_ms),
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: Duration::from_millis(self.serial.reconnect_initial_ms),
            max_delay: Duration::from_millis(self.serial.reconnect_max_ms),
            max_attempts: self.serial.reconnect_max_attempts,
        }
    }

    pub fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig {
            repeat_threshold: Duration::from_millis(self.dispatch.repeat_threshold_ms),
            tap_cooldown: Duration::from_millis(self.dispatch.tap_cooldown_ms),
            release_timeout: Duration::from_millis(self.dispatch.release_timeout_ms),
        }
    }

    /// Initial session flags.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidGhostKey`] when `ghost.key` is not a known key.
    pub fn session(&self) -> Result<DispatchSession, ConfigError> {
        let key = HidKeyCode::from_name(&self.ghost.key)
            .ok_or_else(|| ConfigError::InvalidGhostKey(self.ghost.key.clone()))?;
        let ghost = GhostKey {
            key,
            hold: Duration::from_millis(self.ghost.hold_ms),
        };
        let mut session = DispatchSession::new(self.ghost.enabled, self.dispatch.single_tap, ghost);
        session.repeat_enabled = self.dispatch.repeat;
        Ok(session)
    }

    /// The configured profile directory, or `<config dir>/profiles`.
    pub fn profiles_dir(&self) -> Result<PathBuf, ConfigError> {
        match &self.profiles.dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(config_dir()?.join("profiles")),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads the config from the default location; defaults if the file is absent.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads the config from `path`, returning `AppConfig::default()` if the file
/// does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(&config_file_path()?, config)
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn save_config_to(path: &Path, config: &AppConfig) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("IrKey"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("irkey"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("IrKey")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
