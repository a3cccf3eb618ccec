//! lanwaked: LAN monitoring and Wake-on-LAN agent.

use std::net::SocketAddrV4;
use std::sync::Arc;

use anyhow::{Context, Result};

use lanwake_core::config::LanwakeConfig;
use lanwake_core::message::Hello;
use lanwake_core::TopicScheme;
use lanwake_services::{
    publish_json, ChannelObserver, CommandRouter, MessageBus, MessageChannel, NewEndpoint,
    Registry, RegistryConfig, Scheduler, SchedulerHandle, TcpProber, WakeDispatcher,
};

mod sender;
mod stats;

use sender::UdpPacketSender;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = LanwakeConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = LanwakeConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        LanwakeConfig::default()
    });
    tracing::info!(
        agent = %config.agent.name,
        path = %LanwakeConfig::file_path().display(),
        "lanwaked starting"
    );

    // Messaging channel
    let topics = TopicScheme::new(config.messaging.topic_prefix.clone());
    let bus = MessageBus::new(config.messaging.history);
    let channel: Arc<dyn MessageChannel> = Arc::new(bus.clone());

    // Registry, seeded from config
    let observer = Arc::new(ChannelObserver::new(
        channel.clone(),
        topics.clone(),
        config.messaging.publish_probe_results,
    ));
    let registry = Arc::new(Registry::new(
        RegistryConfig::from_monitor(&config.monitor),
        observer,
    ));
    for device in &config.devices {
        if let Err(e) = registry.add(NewEndpoint::from(device)).await {
            tracing::warn!(device = %device.name, error = %e, "skipping configured device");
        }
    }
    let device_count = registry.len().await.unwrap_or_default();
    tracing::info!(
        devices = device_count,
        capacity = registry.capacity(),
        "registry ready"
    );

    // Wake dispatcher and command router
    let wake_target = SocketAddrV4::new(config.wake.broadcast_addr, config.wake.port);
    let dispatcher = Arc::new(WakeDispatcher::new(
        registry.clone(),
        Arc::new(UdpPacketSender),
        channel.clone(),
        topics.clone(),
        wake_target,
    ));
    let router = Arc::new(CommandRouter::new(
        registry.clone(),
        dispatcher.clone(),
        channel.clone(),
        topics.clone(),
    ));

    // Scheduler
    let prober = TcpProber::new(
        config.monitor.probe_ports.clone(),
        config.monitor.refused_is_reachable,
    );
    let scheduler = SchedulerHandle::spawn(Scheduler::new(
        registry.clone(),
        prober.clone(),
        config.monitor.tick(),
    ))
    .context("failed to start scheduler")?;

    publish_json(
        channel.as_ref(),
        &topics.hello(),
        &Hello {
            message: format!("{} online", config.agent.name),
            agent: config.agent.name.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            devices: device_count,
            timestamp: registry.uptime_secs(),
        },
    );

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, _) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    // ── Spawn tasks ──────────────────────────────────────────────────────────

    let stats_every = stats::stats_interval(&config.monitor);
    let stats_task = {
        let registry = registry.clone();
        tokio::spawn(async move {
            match stats_every {
                Some(every) => stats::stats_printer(registry, every).await,
                None => std::future::pending().await,
            }
        })
    };

    let api_port = config.api.port;
    let api_task = {
        let state = lanwake_api::ApiState {
            registry: registry.clone(),
            router,
            dispatcher,
            prober,
            bus,
            agent_name: config.agent.name.clone(),
            scheduler_running: scheduler.running_flag(),
            shutdown_tx: shutdown_tx.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = lanwake_api::serve(state, api_port).await {
                tracing::error!(error = %e, "API server failed");
            }
        })
    };

    // ── Wait for exit ────────────────────────────────────────────────────────

    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        _ = shutdown_rx.recv() => tracing::info!("shutting down"),
        r = api_task           => tracing::error!("API task exited: {:?}", r),
        r = stats_task         => tracing::error!("stats printer exited: {:?}", r),
    }

    scheduler.stop().await;
    if stats_every.is_some() {
        stats::print_stats(&registry).await;
    }

    Ok(())
}
