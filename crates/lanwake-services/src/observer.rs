//! Notification sink for probe results and status transitions.
//!
//! A registry has exactly one observer, fixed at construction, and calls
//! it synchronously after releasing the table lock.

use std::sync::Arc;

use lanwake_core::message::{ProbeReport, StatusMessage};
use lanwake_core::TopicScheme;

use crate::bus::{publish_json, MessageChannel};
use crate::prober::ProbeOutcome;
use crate::registry::EndpointView;

pub trait StatusObserver: Send + Sync {
    /// The endpoint's status changed. `endpoint` already carries the new
    /// status.
    fn on_status_change(&self, endpoint: &EndpointView, reachable: bool, response_time_ms: u32);

    /// Every completed probe, whether or not the status changed.
    fn on_probe_result(&self, _endpoint: &EndpointView, _outcome: &ProbeOutcome) {}
}

/// Discards every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StatusObserver for NullObserver {
    fn on_status_change(&self, _endpoint: &EndpointView, _reachable: bool, _response_time_ms: u32) {}
}

/// Reports through the messaging channel.
pub struct ChannelObserver {
    channel: Arc<dyn MessageChannel>,
    topics: TopicScheme,
    publish_probe_results: bool,
}

impl ChannelObserver {
    pub fn new(channel: Arc<dyn MessageChannel>, topics: TopicScheme, publish_probe_results: bool) -> Self {
        Self {
            channel,
            topics,
            publish_probe_results,
        }
    }
}

impl StatusObserver for ChannelObserver {
    fn on_status_change(&self, endpoint: &EndpointView, _reachable: bool, _response_time_ms: u32) {
        let message = StatusMessage {
            device: endpoint.name.clone(),
            status: endpoint.status,
            ip: endpoint.ip.clone(),
            timestamp: endpoint.last_probe_secs.unwrap_or_default(),
        };
        publish_json(self.channel.as_ref(), &self.topics.status(&endpoint.name), &message);
    }

    fn on_probe_result(&self, endpoint: &EndpointView, outcome: &ProbeOutcome) {
        if !self.publish_probe_results {
            return;
        }
        let report = ProbeReport {
            device: endpoint.name.clone(),
            target_ip: endpoint.ip.clone(),
            success: outcome.reachable,
            response_time_ms: outcome.response_time_ms,
            timestamp: endpoint.last_probe_secs.unwrap_or_default(),
        };
        publish_json(self.channel.as_ref(), &self.topics.probe_results(), &report);
    }
}
