//! Command Router: inbound channel text to engine calls.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use lanwake_core::message::{DeviceSummary, StatusReply};
use lanwake_core::{EngineError, TopicScheme};

use crate::bus::{publish_json, MessageChannel};
use crate::registry::Registry;
use crate::wake::{WakeDispatcher, WakeReceipt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    /// `wake` or `on`.
    Wake,
    Status,
    Enable,
    Disable,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wake => "wake",
            Self::Status => "status",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }
}

impl FromStr for Verb {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wake" | "on" => Ok(Self::Wake),
            "status" => Ok(Self::Status),
            "enable" => Ok(Self::Enable),
            "disable" => Ok(Self::Disable),
            other => Err(EngineError::InvalidArgument(format!("unknown verb {other:?}"))),
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    WakeSent(WakeReceipt),
    Status(StatusReply),
    Enabled { device: String },
    Disabled { device: String },
    Summary(DeviceSummary),
}

pub struct CommandRouter {
    registry: Arc<Registry>,
    dispatcher: Arc<WakeDispatcher>,
    channel: Arc<dyn MessageChannel>,
    topics: TopicScheme,
}

impl CommandRouter {
    pub fn new(
        registry: Arc<Registry>,
        dispatcher: Arc<WakeDispatcher>,
        channel: Arc<dyn MessageChannel>,
        topics: TopicScheme,
    ) -> Self {
        Self {
            registry,
            dispatcher,
            channel,
            topics,
        }
    }

    pub fn topics(&self) -> &TopicScheme {
        &self.topics
    }

    /// Parse `verb` and run it against endpoint `name`.
    pub async fn handle(&self, name: &str, verb: &str) -> Result<CommandOutcome, EngineError> {
        let verb = verb.parse::<Verb>().map_err(|e| {
            tracing::warn!(device = %name, error = %e, "command ignored");
            e
        })?;
        self.execute(name, verb).await
    }

    pub async fn execute(&self, name: &str, verb: Verb) -> Result<CommandOutcome, EngineError> {
        tracing::debug!(device = %name, %verb, "command");
        match verb {
            Verb::Wake => self.dispatcher.wake(name).await.map(CommandOutcome::WakeSent),
            Verb::Status => {
                let view = self.registry.get(name).await?;
                let reply = StatusReply {
                    device: view.name,
                    status: view.status,
                    ip: view.ip,
                    enabled: view.enabled,
                    timestamp: self.registry.uptime_secs(),
                };
                publish_json(self.channel.as_ref(), &self.topics.status(name), &reply);
                Ok(CommandOutcome::Status(reply))
            }
            Verb::Enable => {
                self.registry.set_enabled(name, true).await?;
                Ok(CommandOutcome::Enabled {
                    device: name.to_string(),
                })
            }
            Verb::Disable => {
                self.registry.set_enabled(name, false).await?;
                Ok(CommandOutcome::Disabled {
                    device: name.to_string(),
                })
            }
        }
    }

    /// Route one inbound channel message by topic.
    ///
    /// `{prefix}/wake/{name}/command` carries a verb; `{prefix}/commands`
    /// accepts `devices` (or `list`) and answers with the device summary.
    pub async fn handle_message(&self, topic: &str, payload: &str) -> Result<CommandOutcome, EngineError> {
        if let Some(name) = self.topics.parse_wake_command(topic) {
            return self.handle(name, payload).await;
        }

        if topic == self.topics.commands() {
            return match payload.trim().to_ascii_lowercase().as_str() {
                "devices" | "list" => self.publish_summary().await.map(CommandOutcome::Summary),
                other => {
                    tracing::warn!(command = other, "unknown agent command");
                    Err(EngineError::InvalidArgument(format!("unknown command {other:?}")))
                }
            };
        }

        tracing::warn!(topic, "message on unhandled topic");
        Err(EngineError::InvalidArgument(format!("unhandled topic {topic:?}")))
    }

    /// Publish the device summary on `system/devices` and return it.
    pub async fn publish_summary(&self) -> Result<DeviceSummary, EngineError> {
        let summary = self.registry.summary().await?;
        publish_json(self.channel.as_ref(), &self.topics.devices(), &summary);
        Ok(summary)
    }
}
