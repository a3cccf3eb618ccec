//! Registry and scheduler invariants under longer operation sequences.

use crate::*;

use std::collections::HashSet;

use lanwake_core::{DeviceStatus, EngineError};
use lanwake_services::{AddOutcome, NewEndpoint, Schedule};

#[tokio::test]
async fn test_names_stay_unique_under_repeated_adds() {
    let engine = Engine::new();
    let names = ["a", "b", "c", "a", "d", "b", "b", "e", "a"];

    let mut expected = HashSet::new();
    for (i, name) in names.iter().enumerate() {
        let outcome = engine
            .registry
            .add(NewEndpoint::new(*name, format!("10.0.0.{i}")))
            .await
            .unwrap();
        let fresh = expected.insert(*name);
        assert_eq!(outcome == AddOutcome::Added, fresh, "{name}");

        let listed: Vec<String> = engine
            .registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|v| v.name)
            .collect();
        let unique: HashSet<_> = listed.iter().collect();
        assert_eq!(unique.len(), listed.len());
        assert_eq!(listed.len(), expected.len());
    }

    // Last write wins on address; order is first insertion.
    assert_eq!(engine.registry.get("a").await.unwrap().ip, "10.0.0.8");
    let order: Vec<String> = engine
        .registry
        .list()
        .await
        .unwrap()
        .into_iter()
        .map(|v| v.name)
        .collect();
    assert_eq!(order, ["a", "b", "c", "d", "e"]);
}

#[tokio::test]
async fn test_capacity_bound_holds_for_small_registry() {
    let engine = Engine::with_config(RegistryConfig {
        capacity: 3,
        ..RegistryConfig::default()
    });
    for name in ["a", "b", "c"] {
        engine.registry.add(NewEndpoint::new(name, "10.0.0.1")).await.unwrap();
    }
    assert!(matches!(
        engine.registry.add(NewEndpoint::new("d", "10.0.0.1")).await,
        Err(EngineError::CapacityExceeded { capacity: 3 })
    ));

    // Removing frees a slot.
    engine.registry.remove("b").await.unwrap();
    engine.registry.add(NewEndpoint::new("d", "10.0.0.1")).await.unwrap();
    assert_eq!(engine.registry.len().await.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_counters_are_monotonic_and_sum_to_attempts() {
    let engine = Engine::new();
    let schedule = Schedule {
        interval_ms: 1000,
        ..Schedule::default()
    };
    engine
        .registry
        .add(NewEndpoint::new("srv", "10.0.0.5").with_schedule(schedule))
        .await
        .unwrap();

    let pattern = [true, true, false, true, false, false, false, true, true, false];
    let mut previous = (0, 0);
    for up in pattern {
        engine.prober.set("10.0.0.5", up);
        engine.scheduler.tick().await;
        let view = engine.registry.get("srv").await.unwrap();
        assert!(view.success_count >= previous.0);
        assert!(view.fail_count >= previous.1);
        previous = (view.success_count, view.fail_count);
        tokio::time::advance(Duration::from_millis(1000)).await;
    }

    assert_eq!(previous, (5, 5));
    assert_eq!(
        previous.0 + previous.1,
        engine.prober.calls_for("10.0.0.5") as u64
    );

    // Transitions only: up, down, up, down, up, down.
    let transitions = engine.observer.changes();
    assert_eq!(transitions.len(), 6);
    assert!(transitions.windows(2).all(|w| w[0].1 != w[1].1));
}

#[tokio::test(start_paused = true)]
async fn test_disabled_endpoint_is_never_probed() {
    let engine = Engine::new();
    engine
        .registry
        .add(NewEndpoint::new("off", "10.0.0.9").with_mac(srv_mac()).disabled())
        .await
        .unwrap();

    for _ in 0..10 {
        tokio::time::advance(Duration::from_secs(60)).await;
        engine.scheduler.tick().await;
    }
    let view = engine.registry.get("off").await.unwrap();
    assert!(view.last_probe_time.is_none());
    assert_eq!(engine.prober.calls_for("10.0.0.9"), 0);

    // Wake is rejected: no packet, status untouched.
    let err = engine.dispatcher.wake("off").await.unwrap_err();
    assert_eq!(err, EngineError::Disabled("off".into()));
    assert_eq!(engine.sender.count(), 0);
    assert_eq!(view.status, DeviceStatus::Unknown);
    assert_eq!(
        engine.registry.get("off").await.unwrap().status,
        DeviceStatus::Unknown
    );
}

#[tokio::test(start_paused = true)]
async fn test_reenabled_endpoint_is_probed_on_next_tick() {
    let engine = Engine::new();
    engine
        .registry
        .add(NewEndpoint::new("srv", "10.0.0.5"))
        .await
        .unwrap();
    engine.scheduler.tick().await;
    assert_eq!(engine.prober.calls_for("10.0.0.5"), 1);

    engine.registry.set_enabled("srv", false).await.unwrap();
    tokio::time::advance(TICK).await;
    engine.registry.set_enabled("srv", true).await.unwrap();

    // Well inside the 10 s interval, yet due.
    let report = engine.scheduler.tick().await;
    assert_eq!(report.due, 1);
    assert_eq!(engine.prober.calls_for("10.0.0.5"), 2);
}

/// Takes its whole timeout before answering.
#[derive(Default)]
struct SlowProber {
    calls: std::sync::Mutex<Vec<String>>,
}

impl Prober for SlowProber {
    async fn probe(&self, address: &str, timeout: Duration) -> ProbeOutcome {
        self.calls.lock().unwrap().push(address.to_string());
        tokio::time::sleep(timeout).await;
        ProbeOutcome::offline()
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_probe_does_not_hold_the_lock() {
    let engine = Engine::with_config(RegistryConfig {
        lock_timeout: Duration::from_millis(50),
        ..RegistryConfig::default()
    });
    for (name, ip) in [("slow", "10.0.0.5"), ("next", "10.0.0.6")] {
        engine.registry.add(NewEndpoint::new(name, ip)).await.unwrap();
    }

    let prober = Arc::new(SlowProber::default());
    let scheduler = Scheduler::new(engine.registry.clone(), prober.clone(), TICK);
    let tick = tokio::spawn(async move { scheduler.tick().await });

    // Mid-probe, every registry call still gets the lock well inside 50 ms.
    tokio::time::sleep(Duration::from_millis(1500)).await;
    assert!(!tick.is_finished());
    engine.registry.set_enabled("next", false).await.unwrap();
    assert_eq!(engine.registry.len().await.unwrap(), 2);

    // Disabled while the tick was running: never contacted.
    let report = tick.await.unwrap();
    assert_eq!(report.due, 2);
    assert_eq!(report.probed, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(*prober.calls.lock().unwrap(), vec!["10.0.0.5".to_string()]);
    assert!(engine
        .registry
        .get("next")
        .await
        .unwrap()
        .last_probe_time
        .is_none());
}
