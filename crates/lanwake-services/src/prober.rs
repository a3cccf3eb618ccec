//! Liveness Prober: reachability by TCP handshake.
//!
//! An address is reachable when a connection to one of the candidate ports
//! completes before the deadline. Every failure mode (bad literal, refused,
//! unreachable network, timeout) reads as "offline"; nothing here returns
//! an error.

use std::future::Future;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::registry::ProbeTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ProbeOutcome {
    pub reachable: bool,
    /// Round-trip of the successful handshake; 0 when unreachable.
    pub response_time_ms: u32,
}

impl ProbeOutcome {
    pub fn online(response_time_ms: u32) -> Self {
        Self {
            reachable: true,
            response_time_ms,
        }
    }

    pub fn offline() -> Self {
        Self {
            reachable: false,
            response_time_ms: 0,
        }
    }
}

/// A single reachability check bounded by `timeout`.
pub trait Prober: Send + Sync {
    fn probe(&self, address: &str, timeout: Duration) -> impl Future<Output = ProbeOutcome> + Send;
}

impl<P: Prober> Prober for Arc<P> {
    fn probe(&self, address: &str, timeout: Duration) -> impl Future<Output = ProbeOutcome> + Send {
        (**self).probe(address, timeout)
    }
}

/// Run up to `probe_count` attempts against one endpoint, stopping at the
/// first success. Each attempt gets the full timeout.
pub async fn probe_target<P: Prober>(prober: &P, target: &ProbeTarget) -> ProbeOutcome {
    for attempt in 1..=target.probe_count.max(1) {
        let outcome = prober.probe(&target.ip, target.timeout).await;
        if outcome.reachable {
            return outcome;
        }
        tracing::trace!(device = %target.name, attempt, "probe attempt failed");
    }
    ProbeOutcome::offline()
}

/// Probes by connecting to each port in `ports` in turn.
#[derive(Debug, Clone)]
pub struct TcpProber {
    pub ports: Vec<u16>,
    /// Count "connection refused" as proof of life. A refusal means a host
    /// answered with RST, so it is up even if nothing listens on the port.
    pub refused_is_reachable: bool,
}

impl Default for TcpProber {
    fn default() -> Self {
        Self {
            ports: vec![80, 22],
            refused_is_reachable: false,
        }
    }
}

impl TcpProber {
    pub fn new(ports: Vec<u16>, refused_is_reachable: bool) -> Self {
        Self {
            ports,
            refused_is_reachable,
        }
    }
}

impl Prober for TcpProber {
    async fn probe(&self, address: &str, timeout: Duration) -> ProbeOutcome {
        let Ok(ip) = address.trim().parse::<IpAddr>() else {
            tracing::debug!(address, "not an IP literal, treating as unreachable");
            return ProbeOutcome::offline();
        };

        let started = Instant::now();
        let deadline = started + timeout;

        for &port in &self.ports {
            let target = SocketAddr::new(ip, port);
            match tokio::time::timeout_at(deadline, TcpStream::connect(target)).await {
                Ok(Ok(stream)) => {
                    drop(stream);
                    return ProbeOutcome::online(elapsed_ms(started));
                }
                Ok(Err(e)) if self.refused_is_reachable && e.kind() == std::io::ErrorKind::ConnectionRefused => {
                    return ProbeOutcome::online(elapsed_ms(started));
                }
                Ok(Err(e)) => {
                    tracing::trace!(%target, error = %e, "connect failed");
                }
                Err(_) => {
                    tracing::trace!(%target, ?timeout, "connect timed out");
                    break;
                }
            }
        }

        ProbeOutcome::offline()
    }
}

fn elapsed_ms(since: Instant) -> u32 {
    u32::try_from(since.elapsed().as_millis()).unwrap_or(u32::MAX)
}
