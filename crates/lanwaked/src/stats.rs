//! Periodic device statistics, logged at info.

use std::sync::Arc;
use std::time::Duration;

use lanwake_core::config::MonitorConfig;
use lanwake_services::{EndpointView, Registry};

/// Logging period from config; `None` when the log is turned off.
pub fn stats_interval(monitor: &MonitorConfig) -> Option<Duration> {
    match monitor.stats_interval_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

pub async fn stats_printer(registry: Arc<Registry>, every: Duration) {
    let mut interval = tokio::time::interval(every);
    // The first tick fires immediately; nothing has been probed yet.
    interval.tick().await;
    loop {
        interval.tick().await;
        print_stats(&registry).await;
    }
}

pub async fn print_stats(registry: &Registry) {
    let views = match registry.list().await {
        Ok(views) => views,
        Err(e) => {
            tracing::warn!(error = %e, "stats skipped");
            return;
        }
    };

    tracing::info!(
        devices = views.len(),
        capacity = registry.capacity(),
        uptime_secs = registry.uptime_secs(),
        "device statistics"
    );
    for view in &views {
        tracing::info!(
            device = %view.name,
            ip = %view.ip,
            status = %view.status,
            enabled = view.enabled,
            success = view.success_count,
            fail = view.fail_count,
            rate = %rate_label(view),
            "  device"
        );
    }
}

fn rate_label(view: &EndpointView) -> String {
    match view.success_rate() {
        Some(rate) => format!("{rate:.1}%"),
        None => "n/a".to_string(),
    }
}
