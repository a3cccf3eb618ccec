//! lanwake-core: shared types, wire format, configuration and errors.
//! All other lanwake crates depend on this one.

pub mod config;
pub mod error;
pub mod message;
pub mod wire;

pub use error::{ChannelError, EngineError};
pub use message::{DeviceStatus, TopicScheme};
pub use wire::{MacAddr, MagicPacket, WireError};
