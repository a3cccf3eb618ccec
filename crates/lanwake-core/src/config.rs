//! Configuration system for lanwake.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $LANWAKE_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/lanwake/config.toml
//!   3. ~/.config/lanwake/config.toml

use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::PathBuf;
use std::time::Duration;

use crate::wire::{MacAddr, WOL_PORT};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LanwakeConfig {
    pub agent: AgentConfig,
    pub monitor: MonitorConfig,
    pub wake: WakeConfig,
    pub messaging: MessagingConfig,
    pub api: ApiConfig,
    /// Devices seeded into the registry at startup. Runtime changes are not
    /// written back.
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Name reported in the hello message and /status.
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Maximum number of monitored devices.
    pub capacity: usize,
    /// Scheduler tick period.
    pub tick_ms: u64,
    /// Registry lock acquisition bound.
    pub lock_timeout_ms: u64,
    /// Defaults applied when a device leaves a schedule field zero or unset.
    pub default_interval_ms: u32,
    pub default_timeout_ms: u32,
    pub default_probe_count: u32,
    /// TCP ports tried in order by the liveness prober.
    pub probe_ports: Vec<u16>,
    /// Count a refused connection (RST) as proof the host is up.
    pub refused_is_reachable: bool,
    /// Period of the per-device success-rate log. 0 = off.
    pub stats_interval_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WakeConfig {
    /// Destination for magic packets, normally the subnet broadcast address.
    pub broadcast_addr: Ipv4Addr,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    pub topic_prefix: String,
    /// Outbound messages retained for API readers.
    pub history: usize,
    /// Publish a report on `{prefix}/ping` for every probe, not only on changes.
    pub publish_probe_results: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// HTTP API port on 127.0.0.1.
    pub port: u16,
}

/// One statically configured device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceConfig {
    pub name: String,
    pub ip: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<MacAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub interval_ms: u32,
    #[serde(default)]
    pub timeout_ms: u32,
    #[serde(default)]
    pub probe_count: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "lanwake".to_string(),
        }
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capacity: 20,
            tick_ms: 1000,
            lock_timeout_ms: 1000,
            default_interval_ms: 10_000,
            default_timeout_ms: 3000,
            default_probe_count: 1,
            probe_ports: vec![80, 22],
            refused_is_reachable: false,
            stats_interval_secs: 120,
        }
    }
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            broadcast_addr: Ipv4Addr::BROADCAST,
            port: WOL_PORT,
        }
    }
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "lanwake".to_string(),
            history: 128,
            publish_probe_results: true,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self { port: 9101 }
    }
}

impl MonitorConfig {
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("lanwake")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl LanwakeConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::file_path())
    }

    /// Load from an explicit path, then apply env overrides.
    pub fn load_from(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
            Self::parse(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))?
        } else {
            LanwakeConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse TOML text without touching the environment.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("LANWAKE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&LanwakeConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text).map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply LANWAKE_* env var overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(p) = var("LANWAKE_API__PORT").and_then(|v| v.parse().ok()) {
            self.api.port = p;
        }
        if let Some(t) = var("LANWAKE_MONITOR__TICK_MS").and_then(|v| v.parse().ok()) {
            self.monitor.tick_ms = t;
        }
        if let Some(c) = var("LANWAKE_MONITOR__CAPACITY").and_then(|v| v.parse().ok()) {
            self.monitor.capacity = c;
        }
        if let Some(a) = var("LANWAKE_WAKE__BROADCAST_ADDR").and_then(|v| v.parse().ok()) {
            self.wake.broadcast_addr = a;
        }
        if let Some(prefix) = var("LANWAKE_MESSAGING__TOPIC_PREFIX") {
            self.messaging.topic_prefix = prefix;
        }
    }
}
