//! Wake Dispatcher: registry-checked magic packet sends.
//!
//! The registry lock is only held while the endpoint is validated and
//! marked as waking; the broadcast itself happens after it is released.

use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Arc;

use serde::Serialize;

use lanwake_core::message::WakeConfirmation;
use lanwake_core::{EngineError, MacAddr, MagicPacket, TopicScheme, WireError};

use crate::bus::{publish_json, MessageChannel};
use crate::registry::Registry;

/// Hands a magic packet to the network.
///
/// Success means the datagram was accepted by the transport, nothing more.
pub trait PacketSender: Send + Sync {
    fn send(&self, packet: &MagicPacket, target: SocketAddrV4) -> Result<usize, WireError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WakeReceipt {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    pub mac: MacAddr,
    pub target: SocketAddrV4,
    pub bytes: usize,
}

pub struct WakeDispatcher {
    registry: Arc<Registry>,
    sender: Arc<dyn PacketSender>,
    channel: Arc<dyn MessageChannel>,
    topics: TopicScheme,
    target: SocketAddrV4,
}

impl WakeDispatcher {
    pub fn new(
        registry: Arc<Registry>,
        sender: Arc<dyn PacketSender>,
        channel: Arc<dyn MessageChannel>,
        topics: TopicScheme,
        target: SocketAddrV4,
    ) -> Self {
        Self {
            registry,
            sender,
            channel,
            topics,
            target,
        }
    }

    /// Wake a registered endpoint by name.
    ///
    /// Fails with `NotFound`, `Disabled` (nothing is sent and the status is
    /// left alone), `InvalidArgument` when no MAC is known, or `Transport`.
    /// The confirmation publish is best-effort and never fails the wake.
    pub async fn wake(&self, name: &str) -> Result<WakeReceipt, EngineError> {
        let mac = match self.registry.begin_wake(name).await {
            Ok(mac) => mac,
            Err(e) => {
                tracing::warn!(device = %name, error = %e, "wake rejected");
                return Err(e);
            }
        };

        let bytes = self.transmit(&mac, self.target)?;
        tracing::info!(device = %name, %mac, target = %self.target, "wake packet sent");

        let confirmation = WakeConfirmation::wake_sent(name, self.registry.uptime_secs());
        publish_json(self.channel.as_ref(), &self.topics.wake_status(name), &confirmation);

        Ok(WakeReceipt {
            device: Some(name.to_string()),
            mac,
            target: self.target,
            bytes,
        })
    }

    /// Send a magic packet to an arbitrary address, bypassing the registry.
    /// `broadcast` overrides the configured broadcast address.
    pub fn wake_mac(&self, mac: MacAddr, broadcast: Option<Ipv4Addr>) -> Result<WakeReceipt, EngineError> {
        let target = match broadcast {
            Some(ip) => SocketAddrV4::new(ip, self.target.port()),
            None => self.target,
        };
        let bytes = self.transmit(&mac, target)?;
        tracing::info!(%mac, %target, "wake packet sent");
        Ok(WakeReceipt {
            device: None,
            mac,
            target,
            bytes,
        })
    }

    fn transmit(&self, mac: &MacAddr, target: SocketAddrV4) -> Result<usize, EngineError> {
        let packet = MagicPacket::new(mac);
        self.sender.send(&packet, target).map_err(|e| {
            tracing::warn!(%mac, %target, error = %e, "wake packet send failed");
            EngineError::Transport(e.to_string())
        })
    }
}
