//! lanwake-services: the monitoring engine.
//!
//! A fixed-capacity registry of named endpoints, a background scheduler
//! that probes each endpoint on its own interval, a single observer that
//! hears every result and every status transition, and the wake
//! dispatcher and command router that turn channel text into engine calls.

pub mod bus;
pub mod observer;
pub mod prober;
pub mod registry;
pub mod router;
pub mod scheduler;
pub mod wake;

pub use bus::{publish_json, MessageBus, MessageChannel, Published};
pub use observer::{ChannelObserver, NullObserver, StatusObserver};
pub use prober::{probe_target, ProbeOutcome, Prober, TcpProber};
pub use registry::{
    AddOutcome, EndpointView, NewEndpoint, ProbeTarget, Registry, RegistryConfig, Schedule,
    StatusUpdate,
};
pub use router::{CommandOutcome, CommandRouter, Verb};
pub use scheduler::{Scheduler, SchedulerHandle, TickReport};
pub use wake::{PacketSender, WakeDispatcher, WakeReceipt};
