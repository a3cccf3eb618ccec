//! Messaging channel schema: topic names and JSON payloads.
//!
//! Topics are logical names under a configurable prefix:
//!
//!   {prefix}/status/{name}          device status change / status reply
//!   {prefix}/wake/{name}/command    inbound verb text
//!   {prefix}/wake/{name}/status     wake confirmation
//!   {prefix}/system/devices         device summary, on demand
//!   {prefix}/ping                   per-probe result reports
//!   {prefix}/hello                  agent startup announcement
//!   {prefix}/commands               agent-level inbound commands
//!
//! Every `timestamp` is whole seconds of agent uptime.

use std::fmt;

use serde::{Deserialize, Serialize};

// ── Device status ─────────────────────────────────────────────────────────────

/// Last known state of a monitored device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    #[default]
    Unknown,
    Online,
    Offline,
    /// A wake packet was sent and no probe has answered yet.
    Waking,
}

impl DeviceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Online => "online",
            Self::Offline => "offline",
            Self::Waking => "waking",
        }
    }

    pub fn from_reachable(reachable: bool) -> Self {
        if reachable {
            Self::Online
        } else {
            Self::Offline
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Topics ────────────────────────────────────────────────────────────────────

/// Builds and parses channel topic names under one prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicScheme {
    prefix: String,
}

impl TopicScheme {
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn status(&self, name: &str) -> String {
        format!("{}/status/{}", self.prefix, name)
    }

    pub fn wake_command(&self, name: &str) -> String {
        format!("{}/wake/{}/command", self.prefix, name)
    }

    pub fn wake_status(&self, name: &str) -> String {
        format!("{}/wake/{}/status", self.prefix, name)
    }

    pub fn devices(&self) -> String {
        format!("{}/system/devices", self.prefix)
    }

    pub fn probe_results(&self) -> String {
        format!("{}/ping", self.prefix)
    }

    pub fn hello(&self) -> String {
        format!("{}/hello", self.prefix)
    }

    pub fn commands(&self) -> String {
        format!("{}/commands", self.prefix)
    }

    /// Extract the device name from a `{prefix}/wake/{name}/command` topic.
    pub fn parse_wake_command<'a>(&self, topic: &'a str) -> Option<&'a str> {
        let rest = topic.strip_prefix(self.prefix.as_str())?;
        let name = rest.strip_prefix("/wake/")?.strip_suffix("/command")?;
        if name.is_empty() || name.contains('/') {
            return None;
        }
        Some(name)
    }
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self::new("lanwake")
    }
}

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Published on `status/{name}` whenever a device's status changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub device: String,
    pub status: DeviceStatus,
    pub ip: String,
    pub timestamp: u64,
}

/// Published on `status/{name}` in answer to a `status` command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReply {
    pub device: String,
    pub status: DeviceStatus,
    pub ip: String,
    pub enabled: bool,
    pub timestamp: u64,
}

/// Published on `wake/{name}/status` after a wake packet went out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WakeConfirmation {
    pub device: String,
    pub action: String,
    pub timestamp: u64,
}

impl WakeConfirmation {
    pub const ACTION_WAKE_SENT: &'static str = "wake_sent";

    pub fn wake_sent(device: impl Into<String>, timestamp: u64) -> Self {
        Self {
            device: device.into(),
            action: Self::ACTION_WAKE_SENT.to_string(),
            timestamp,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceEntry {
    pub name: String,
    pub ip: String,
    pub status: DeviceStatus,
    pub enabled: bool,
}

/// Published on `system/devices`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSummary {
    pub devices: Vec<DeviceEntry>,
    pub total: usize,
    pub timestamp: u64,
}

/// Published on `ping` for every completed probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeReport {
    pub device: String,
    pub target_ip: String,
    pub success: bool,
    pub response_time_ms: u32,
    pub timestamp: u64,
}

/// Published on `hello` once the agent is up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub message: String,
    pub agent: String,
    pub version: String,
    pub devices: usize,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_use_prefix() {
        let topics = TopicScheme::new("esp32/");
        assert_eq!(topics.status("srv"), "esp32/status/srv");
        assert_eq!(topics.wake_command("srv"), "esp32/wake/srv/command");
        assert_eq!(topics.wake_status("srv"), "esp32/wake/srv/status");
        assert_eq!(topics.devices(), "esp32/system/devices");
        assert_eq!(topics.probe_results(), "esp32/ping");
    }

    #[test]
    fn parse_wake_command_extracts_name() {
        let topics = TopicScheme::default();
        assert_eq!(topics.parse_wake_command("lanwake/wake/nas1/command"), Some("nas1"));
        assert_eq!(topics.parse_wake_command("lanwake/wake//command"), None);
        assert_eq!(topics.parse_wake_command("lanwake/wake/a/b/command"), None);
        assert_eq!(topics.parse_wake_command("other/wake/nas1/command"), None);
        assert_eq!(topics.parse_wake_command("lanwake/wake/nas1/status"), None);
    }

    #[test]
    fn status_message_json_shape() {
        let msg = StatusMessage {
            device: "srv".into(),
            status: DeviceStatus::Offline,
            ip: "10.0.0.5".into(),
            timestamp: 42,
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["device"], "srv");
        assert_eq!(json["status"], "offline");
        assert_eq!(json["ip"], "10.0.0.5");
        assert_eq!(json["timestamp"], 42);
    }

    #[test]
    fn wake_confirmation_action() {
        let msg = WakeConfirmation::wake_sent("srv", 7);
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["action"], "wake_sent");
    }

    #[test]
    fn status_from_reachable() {
        assert_eq!(DeviceStatus::from_reachable(true), DeviceStatus::Online);
        assert_eq!(DeviceStatus::from_reachable(false), DeviceStatus::Offline);
        assert_eq!(DeviceStatus::default().to_string(), "unknown");
    }
}
