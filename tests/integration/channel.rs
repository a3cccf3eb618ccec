//! Messaging channel round trips and a live scheduler against real sockets.

use crate::*;

use lanwake_core::message::{DeviceSummary, StatusReply};
use lanwake_core::{ChannelError, DeviceStatus, EngineError};
use lanwake_services::{
    CommandOutcome, NewEndpoint, NullObserver, Schedule, SchedulerHandle, TcpProber,
};

#[tokio::test]
async fn test_inbound_commands_drive_the_engine() {
    let engine = Engine::new();
    engine
        .registry
        .add(NewEndpoint::new("srv", "10.0.0.5").with_mac(srv_mac()))
        .await
        .unwrap();
    engine
        .registry
        .add(NewEndpoint::new("nas", "10.0.0.6"))
        .await
        .unwrap();
    let mut live = engine.bus.subscribe();

    // status: reply on status/{name}
    engine
        .router
        .handle_message("lanwake/wake/nas/command", "STATUS")
        .await
        .unwrap();
    let reply = live.recv().await.unwrap();
    assert_eq!(reply.topic, "lanwake/status/nas");
    let reply: StatusReply = serde_json::from_str(&reply.payload).unwrap();
    assert_eq!(reply.status, DeviceStatus::Unknown);
    assert!(reply.enabled);

    // disable, then wake is refused
    engine
        .router
        .handle_message("lanwake/wake/srv/command", "disable")
        .await
        .unwrap();
    let err = engine
        .router
        .handle_message("lanwake/wake/srv/command", "wake")
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::Disabled("srv".into()));
    assert_eq!(engine.sender.count(), 0);

    // enable, then "on" wakes
    engine
        .router
        .handle_message("lanwake/wake/srv/command", "enable")
        .await
        .unwrap();
    let outcome = engine
        .router
        .handle_message("lanwake/wake/srv/command", "on")
        .await
        .unwrap();
    assert!(matches!(outcome, CommandOutcome::WakeSent(_)));
    assert_eq!(engine.sender.count(), 1);
    let confirmation = live.recv().await.unwrap();
    assert_eq!(confirmation.topic, "lanwake/wake/srv/status");

    // device summary on demand
    engine
        .router
        .handle_message("lanwake/commands", "devices")
        .await
        .unwrap();
    let summary = live.recv().await.unwrap();
    assert_eq!(summary.topic, "lanwake/system/devices");
    let summary: DeviceSummary = serde_json::from_str(&summary.payload).unwrap();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.devices[0].status, DeviceStatus::Waking);

    // unknown verb: rejected, nothing published
    let before = engine.bus.len();
    assert!(matches!(
        engine
            .router
            .handle_message("lanwake/wake/srv/command", "reboot")
            .await,
        Err(EngineError::InvalidArgument(_))
    ));
    assert_eq!(engine.bus.len(), before);
}

struct Down;

impl MessageChannel for Down {
    fn publish(&self, _topic: &str, _payload: &str) -> Result<(), ChannelError> {
        Err(ChannelError::Disconnected)
    }
}

#[tokio::test]
async fn test_channel_outage_does_not_stop_monitoring() {
    let channel: Arc<dyn MessageChannel> = Arc::new(Down);
    let observer = Arc::new(ChannelObserver::new(
        channel.clone(),
        TopicScheme::default(),
        true,
    ));
    let registry = Arc::new(Registry::new(RegistryConfig::default(), observer));
    registry
        .add(NewEndpoint::new("srv", "10.0.0.5").with_mac(srv_mac()))
        .await
        .unwrap();

    let prober = Arc::new(ScriptedProber::default());
    prober.set("10.0.0.5", true);
    let report = Scheduler::new(registry.clone(), prober, TICK).tick().await;
    assert_eq!(report.online, 1);
    assert_eq!(
        registry.get("srv").await.unwrap().status,
        DeviceStatus::Online
    );

    let sender = Arc::new(RecordingSender::default());
    let dispatcher = WakeDispatcher::new(
        registry,
        sender.clone(),
        channel,
        TopicScheme::default(),
        BROADCAST,
    );
    dispatcher.wake("srv").await.unwrap();
    assert_eq!(sender.count(), 1);
}

#[tokio::test]
async fn test_live_scheduler_with_tcp_prober() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let registry = Arc::new(Registry::new(
        RegistryConfig::default(),
        Arc::new(NullObserver),
    ));
    let fast = Schedule {
        interval_ms: 50,
        timeout_ms: 500,
        probe_count: 1,
    };
    registry
        .add(NewEndpoint::new("local", "127.0.0.1").with_schedule(fast))
        .await
        .unwrap();
    registry
        .add(NewEndpoint::new("bogus", "not-an-ip").with_schedule(fast))
        .await
        .unwrap_err();

    let handle = SchedulerHandle::spawn(Scheduler::new(
        registry.clone(),
        TcpProber::new(vec![port], false),
        Duration::from_millis(20),
    ))
    .unwrap();

    let mut status = DeviceStatus::Unknown;
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = registry.get("local").await.unwrap().status;
        if status == DeviceStatus::Online {
            break;
        }
    }
    assert_eq!(status, DeviceStatus::Online);

    // Listener gone: connection refused reads as offline.
    drop(listener);
    for _ in 0..100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        status = registry.get("local").await.unwrap().status;
        if status == DeviceStatus::Offline {
            break;
        }
    }
    assert_eq!(status, DeviceStatus::Offline);

    handle.stop().await;
}
