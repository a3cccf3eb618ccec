//! The end-to-end walkthrough: add, fail, recover, wake, remove, overflow.

use crate::*;

use lanwake_core::message::{StatusMessage, WakeConfirmation};
use lanwake_core::{DeviceStatus, EngineError};
use lanwake_services::NewEndpoint;
use zerocopy::AsBytes;

#[tokio::test(start_paused = true)]
async fn test_device_lifecycle() {
    let engine = Engine::new();
    let interval = engine.registry.defaults().interval();

    // 1. Fresh endpoint is unknown with zeroed counters.
    engine
        .registry
        .add(NewEndpoint::new("srv", "10.0.0.5").with_mac(srv_mac()))
        .await
        .unwrap();
    let view = engine.registry.get("srv").await.unwrap();
    assert_eq!(view.status, DeviceStatus::Unknown);
    assert_eq!((view.success_count, view.fail_count), (0, 0));

    // 2. Prober says down; one tick after the interval marks it offline.
    engine.prober.set("10.0.0.5", false);
    tokio::time::advance(interval).await;
    engine.scheduler.tick().await;

    let view = engine.registry.get("srv").await.unwrap();
    assert_eq!(view.status, DeviceStatus::Offline);
    assert_eq!(view.fail_count, 1);
    assert_eq!(engine.observer.changes(), [("srv".to_string(), false)]);

    let published = engine.bus.on_topic("lanwake/status/srv");
    assert_eq!(published.len(), 1);
    let msg: StatusMessage = serde_json::from_str(&published[0].payload).unwrap();
    assert_eq!(msg.status, DeviceStatus::Offline);
    assert_eq!(msg.ip, "10.0.0.5");

    // 3. Prober says up; next due tick flips it online.
    engine.prober.set("10.0.0.5", true);
    tokio::time::advance(interval).await;
    engine.scheduler.tick().await;

    let view = engine.registry.get("srv").await.unwrap();
    assert_eq!(view.status, DeviceStatus::Online);
    assert_eq!(view.success_count, 1);
    assert_eq!(
        engine.observer.changes(),
        [("srv".to_string(), false), ("srv".to_string(), true)]
    );

    // 4. Wake: validated, marked waking, one 102-byte packet, confirmation queued.
    let receipt = engine.dispatcher.wake("srv").await.unwrap();
    assert_eq!(receipt.mac, srv_mac());
    assert_eq!(engine.registry.get("srv").await.unwrap().status, DeviceStatus::Waking);

    {
        let packets = engine.sender.packets.lock().unwrap();
        assert_eq!(packets.len(), 1);
        let (packet, target) = &packets[0];
        assert_eq!(*target, BROADCAST);
        assert_eq!(packet.as_bytes().len(), 102);
        assert_eq!(packet.target(), Some(srv_mac()));
    }

    let confirmations = engine.bus.on_topic("lanwake/wake/srv/status");
    assert_eq!(confirmations.len(), 1);
    let confirmation: WakeConfirmation = serde_json::from_str(&confirmations[0].payload).unwrap();
    assert_eq!(confirmation.action, "wake_sent");

    // 5. Remove; never probed again.
    engine.registry.remove("srv").await.unwrap();
    assert!(matches!(
        engine.registry.get("srv").await,
        Err(EngineError::NotFound(_))
    ));
    let probes_before = engine.prober.calls_for("10.0.0.5");
    for _ in 0..5 {
        tokio::time::advance(interval).await;
        let report = engine.scheduler.tick().await;
        assert_eq!(report.due, 0);
    }
    assert_eq!(engine.prober.calls_for("10.0.0.5"), probes_before);

    // 6. Fill to capacity; the 21st add fails and changes nothing.
    for i in 0..20 {
        engine
            .registry
            .add(NewEndpoint::new(format!("host{i:02}"), format!("10.0.1.{i}")))
            .await
            .unwrap();
    }
    let err = engine
        .registry
        .add(NewEndpoint::new("host20", "10.0.1.20"))
        .await
        .unwrap_err();
    assert_eq!(err, EngineError::CapacityExceeded { capacity: 20 });
    assert_eq!(engine.registry.len().await.unwrap(), 20);
}

#[tokio::test(start_paused = true)]
async fn test_woken_device_settles_on_next_probe() {
    let engine = Engine::new();
    engine
        .registry
        .add(NewEndpoint::new("srv", "10.0.0.5").with_mac(srv_mac()))
        .await
        .unwrap();
    engine.prober.set("10.0.0.5", true);
    engine.scheduler.tick().await;

    engine.dispatcher.wake("srv").await.unwrap();
    assert_eq!(engine.registry.get("srv").await.unwrap().status, DeviceStatus::Waking);

    // Still up: waking -> online is a transition.
    tokio::time::advance(engine.registry.defaults().interval()).await;
    engine.scheduler.tick().await;
    assert_eq!(engine.registry.get("srv").await.unwrap().status, DeviceStatus::Online);
    assert_eq!(
        engine.observer.changes(),
        [("srv".to_string(), true), ("srv".to_string(), true)]
    );
}
