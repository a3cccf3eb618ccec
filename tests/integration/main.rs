//! lanwake integration test harness.
//!
//! Drives the engine end to end through the library crates: registry,
//! scheduler, observer, wake dispatcher, command router and message bus,
//! wired the same way the daemon wires them. The prober and the packet
//! sender are scripted fakes, so no root, network or real hosts are needed.
//! Time-dependent tests run on a paused tokio clock.
//!
//!   cargo test --test integration

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use lanwake_core::{MacAddr, MagicPacket, TopicScheme, WireError};
use lanwake_services::{
    ChannelObserver, CommandRouter, EndpointView, MessageBus, MessageChannel, ProbeOutcome,
    Prober, Registry, RegistryConfig, Scheduler, StatusObserver, WakeDispatcher,
};

mod channel;
mod properties;
mod scenarios;

// ── Fakes ─────────────────────────────────────────────────────────────────────

/// Answers from a per-address table and records every address probed.
#[derive(Default)]
pub struct ScriptedProber {
    up: Mutex<HashMap<String, bool>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn set(&self, ip: &str, up: bool) {
        self.up.lock().unwrap().insert(ip.to_string(), up);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, ip: &str) -> usize {
        self.calls().iter().filter(|c| *c == ip).count()
    }
}

impl Prober for ScriptedProber {
    async fn probe(&self, address: &str, _timeout: Duration) -> ProbeOutcome {
        self.calls.lock().unwrap().push(address.to_string());
        match self.up.lock().unwrap().get(address) {
            Some(true) => ProbeOutcome::online(5),
            _ => ProbeOutcome::offline(),
        }
    }
}

/// Keeps every packet instead of putting it on the wire.
#[derive(Default)]
pub struct RecordingSender {
    pub packets: Mutex<Vec<(MagicPacket, SocketAddrV4)>>,
}

impl RecordingSender {
    pub fn count(&self) -> usize {
        self.packets.lock().unwrap().len()
    }
}

impl lanwake_services::PacketSender for RecordingSender {
    fn send(&self, packet: &MagicPacket, target: SocketAddrV4) -> Result<usize, WireError> {
        self.packets.lock().unwrap().push((packet.clone(), target));
        Ok(lanwake_core::wire::MAGIC_PACKET_LEN)
    }
}

/// Records transitions, then forwards to the channel observer.
pub struct RecordingObserver {
    pub changes: Mutex<Vec<(String, bool)>>,
    inner: ChannelObserver,
}

impl RecordingObserver {
    pub fn changes(&self) -> Vec<(String, bool)> {
        self.changes.lock().unwrap().clone()
    }
}

impl StatusObserver for RecordingObserver {
    fn on_status_change(&self, endpoint: &EndpointView, reachable: bool, response_time_ms: u32) {
        self.changes
            .lock()
            .unwrap()
            .push((endpoint.name.clone(), reachable));
        self.inner
            .on_status_change(endpoint, reachable, response_time_ms);
    }

    fn on_probe_result(&self, endpoint: &EndpointView, outcome: &ProbeOutcome) {
        self.inner.on_probe_result(endpoint, outcome);
    }
}

// ── Engine ────────────────────────────────────────────────────────────────────

pub const BROADCAST: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::BROADCAST, 9);
pub const TICK: Duration = Duration::from_secs(1);

pub struct Engine {
    pub registry: Arc<Registry>,
    pub prober: Arc<ScriptedProber>,
    pub sender: Arc<RecordingSender>,
    pub observer: Arc<RecordingObserver>,
    pub bus: MessageBus,
    pub scheduler: Scheduler<Arc<ScriptedProber>>,
    pub dispatcher: Arc<WakeDispatcher>,
    pub router: CommandRouter,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        let topics = TopicScheme::default();
        let bus = MessageBus::new(256);
        let channel: Arc<dyn MessageChannel> = Arc::new(bus.clone());

        let observer = Arc::new(RecordingObserver {
            changes: Mutex::new(Vec::new()),
            inner: ChannelObserver::new(channel.clone(), topics.clone(), false),
        });
        let registry = Arc::new(Registry::new(config, observer.clone()));

        let prober = Arc::new(ScriptedProber::default());
        let scheduler = Scheduler::new(registry.clone(), prober.clone(), TICK);

        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Arc::new(WakeDispatcher::new(
            registry.clone(),
            sender.clone(),
            channel.clone(),
            topics.clone(),
            BROADCAST,
        ));
        let router = CommandRouter::new(registry.clone(), dispatcher.clone(), channel, topics);

        Self {
            registry,
            prober,
            sender,
            observer,
            bus,
            scheduler,
            dispatcher,
            router,
        }
    }
}

pub fn srv_mac() -> MacAddr {
    "00:11:22:33:44:55".parse().unwrap()
}
