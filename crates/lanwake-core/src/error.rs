//! Engine error taxonomy.
//!
//! Every registry, dispatcher and router operation returns one of these
//! instead of panicking. A duplicate name is not an error: adding an
//! existing name is an upsert and reports `AddOutcome::Updated`.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// A required field was empty or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("device not found: {0}")]
    NotFound(String),

    #[error("registry full ({capacity} devices)")]
    CapacityExceeded { capacity: usize },

    /// The registry lock was not acquired within the bound.
    #[error("registry busy: lock not acquired within {0:?}")]
    Busy(Duration),

    /// Operation is valid but the device is administratively disabled.
    #[error("device is disabled: {0}")]
    Disabled(String),

    /// Socket or send failure.
    #[error("transport error: {0}")]
    Transport(String),
}

impl EngineError {
    /// Short machine-readable kind, used in API error bodies and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "invalid_argument",
            Self::NotFound(_) => "not_found",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::Busy(_) => "busy",
            Self::Disabled(_) => "disabled",
            Self::Transport(_) => "transport_error",
        }
    }
}

/// Failure to hand a message to the messaging channel.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    #[error("channel is not connected")]
    Disconnected,
    #[error("publish rejected: {0}")]
    Rejected(String),
}
