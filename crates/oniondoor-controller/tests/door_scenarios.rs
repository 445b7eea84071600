//! End-to-end door scenarios against the mock transport.
//!
//! Wall-clock decisions run on a `ManualClock`; unlock timing runs on paused
//! tokio time.

use std::sync::Arc;
use std::time::Duration;

use oniondoor_controller::{
    DoorConfig, DoorController, DoorError, DoorService, HandshakeOutcome, PresenceConfig,
    PressPath,
};
use oniondoor_core::{Clock, Level, ManualClock, PinId};
use oniondoor_hardware::mock::{
    MockDeviceCounter, MockDeviceCounterHandle, MockDigitalPort, MockDigitalPortHandle,
};
use tokio::time::Instant;

fn relay() -> PinId {
    PinId::DEFAULT_OUTPUT
}

fn button() -> PinId {
    PinId::DEFAULT_INPUT
}

struct Rig {
    controller: Arc<DoorController<MockDigitalPort>>,
    port: MockDigitalPortHandle,
    clock: ManualClock,
}

fn rig(config: DoorConfig) -> Rig {
    let clock = ManualClock::default();
    let (port, handle) = MockDigitalPort::with_clock("Scenario Port", Arc::new(clock.clone()));
    let controller = DoorController::builder(Arc::new(port))
        .config(config)
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();

    Rig {
        controller: Arc::new(controller),
        port: handle,
        clock,
    }
}

fn handshake_config() -> DoorConfig {
    DoorConfig {
        handshake_enabled: true,
        ..DoorConfig::default()
    }
}

fn relay_levels(port: &MockDigitalPortHandle) -> Vec<Level> {
    port.writes_to(relay()).iter().map(|w| w.level).collect()
}

#[tokio::test(start_paused = true)]
async fn test_activated_press_unlocks_immediately() {
    let rig = rig(handshake_config());

    rig.controller.activate(Duration::from_secs(120));
    rig.clock.advance(Duration::from_secs(60));

    let outcome = rig.controller.on_button_pressed(rig.clock.now()).await;
    assert_eq!(outcome.path, PressPath::Activated);

    outcome.unlock.unwrap().wait().await.unwrap();
    assert_eq!(relay_levels(&rig.port), vec![Level::High, Level::Low]);
}

#[tokio::test(start_paused = true)]
async fn test_press_after_activation_expired_falls_through() {
    let rig = rig(handshake_config());

    rig.controller.activate(Duration::from_secs(120));
    rig.clock.advance(Duration::from_secs(121));

    let outcome = rig.controller.on_button_pressed(rig.clock.now()).await;
    assert_eq!(outcome.path, PressPath::Handshake(HandshakeOutcome::Pending));
    assert!(!outcome.triggered_unlock());
    assert_eq!(rig.controller.active_until(), None);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_twelve_seconds_apart_unlocks() {
    let rig = rig(handshake_config());

    let first = rig.controller.on_button_pressed(rig.clock.now()).await;
    assert!(!first.triggered_unlock());

    rig.clock.advance(Duration::from_secs(12));
    let second = rig.controller.on_button_pressed(rig.clock.now()).await;
    assert!(matches!(
        second.path,
        PressPath::Handshake(HandshakeOutcome::Success { .. })
    ));

    second.unlock.unwrap().wait().await.unwrap();
    assert_eq!(relay_levels(&rig.port), vec![Level::High, Level::Low]);
}

#[tokio::test(start_paused = true)]
async fn test_handshake_twenty_seconds_apart_resets() {
    let rig = rig(handshake_config());

    rig.controller.on_button_pressed(rig.clock.now()).await;
    rig.clock.advance(Duration::from_secs(20));
    let second = rig.controller.on_button_pressed(rig.clock.now()).await;

    assert!(matches!(
        second.path,
        PressPath::Handshake(HandshakeOutcome::Failure { .. })
    ));
    assert!(!second.triggered_unlock());

    rig.clock.advance(Duration::from_secs(1));
    let third = rig.controller.on_button_pressed(rig.clock.now()).await;
    assert_eq!(third.path, PressPath::Handshake(HandshakeOutcome::Pending));

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(rig.port.writes_to(relay()).is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_presence_unlocks_without_handshake() {
    let clock = ManualClock::default();
    let (port, port_handle) = MockDigitalPort::with_clock("Scenario Port", Arc::new(clock.clone()));
    let (counter, devices): (MockDeviceCounter, MockDeviceCounterHandle) =
        MockDeviceCounter::new(5);

    let controller = DoorController::builder(Arc::new(port))
        .config(DoorConfig {
            handshake_enabled: true,
            presence: PresenceConfig {
                enabled: true,
                baseline: 3,
                ..PresenceConfig::default()
            },
            ..DoorConfig::default()
        })
        .clock(Arc::new(clock.clone()))
        .presence(counter)
        .build()
        .unwrap();

    let outcome = controller.on_button_pressed(clock.now()).await;
    assert_eq!(outcome.path, PressPath::Occupied);
    outcome.unlock.unwrap().wait().await.unwrap();
    assert_eq!(relay_levels(&port_handle), vec![Level::High, Level::Low]);

    devices.fail_queries(true);
    let outcome = controller.on_button_pressed(clock.now()).await;
    assert_eq!(outcome.path, PressPath::Handshake(HandshakeOutcome::Pending));
}

#[tokio::test(start_paused = true)]
async fn test_unresponsive_gateway_does_not_stall_presses() {
    let clock = ManualClock::default();
    let (port, port_handle) = MockDigitalPort::with_clock("Scenario Port", Arc::new(clock.clone()));
    let (counter, devices) = MockDeviceCounter::new(5);
    devices.hang_queries(true);

    let controller = DoorController::builder(Arc::new(port))
        .config(DoorConfig {
            presence: PresenceConfig {
                enabled: true,
                ..PresenceConfig::default()
            },
            ..DoorConfig::default()
        })
        .clock(Arc::new(clock.clone()))
        .presence(counter)
        .build()
        .unwrap();
    let handle = DoorService::new(Arc::new(controller)).start().await.unwrap();

    assert!(port_handle.press(button()).await.unwrap());
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(devices.queries(), 1);
    assert_eq!(relay_levels(&port_handle), vec![Level::Low]);

    handle.controller().activate(Duration::from_secs(120));
    clock.advance(Duration::from_secs(1));
    assert!(port_handle.press(button()).await.unwrap());

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(devices.queries(), 1);
    assert_eq!(
        relay_levels(&port_handle),
        vec![Level::Low, Level::High, Level::Low]
    );

    handle.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_redundant_triggers_produce_one_cycle() {
    let rig = rig(DoorConfig::default());

    let task = rig.controller.unlock_door().unwrap();
    for _ in 0..5 {
        assert!(rig.controller.unlock_door().is_none());
    }

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert!(rig.controller.unlock_door().is_none());

    task.wait().await.unwrap();
    assert_eq!(relay_levels(&rig.port), vec![Level::High, Level::Low]);
    assert!(!rig.controller.is_unlocked());
}

#[tokio::test(start_paused = true)]
async fn test_unlock_timing() {
    let rig = rig(DoorConfig::default());
    let triggered = Instant::now();

    let task = rig.controller.unlock_door().unwrap();

    tokio::time::sleep(Duration::from_millis(1_999)).await;
    assert!(rig.port.writes_to(relay()).is_empty());

    task.wait().await.unwrap();

    let writes = rig.port.writes_to(relay());
    assert!(writes[0].at - triggered >= Duration::from_secs(2));
    assert_eq!(writes[1].at - writes[0].at, Duration::from_secs(3));
}

#[tokio::test(start_paused = true)]
async fn test_guard_held_until_release() {
    let rig = rig(DoorConfig {
        unlock_hold_seconds: 5,
        ..DoorConfig::default()
    });

    let _task = rig.controller.unlock_door().unwrap();

    tokio::time::sleep(Duration::from_millis(6_900)).await;
    assert!(rig.controller.status().unlocking);
    assert_eq!(rig.port.level(relay()), Some(Level::High));

    rig.controller.wait_until_locked().await;
    assert!(!rig.controller.status().unlocking);
    assert_eq!(rig.port.level(relay()), Some(Level::Low));
    assert!(rig.controller.unlock_door().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_deactivate_does_not_cancel_cycle() {
    let rig = rig(DoorConfig::default());
    rig.controller.activate(Duration::from_secs(120));

    let outcome = rig.controller.on_button_pressed(rig.clock.now()).await;
    rig.controller.deactivate();

    outcome.unlock.unwrap().wait().await.unwrap();
    assert_eq!(relay_levels(&rig.port), vec![Level::High, Level::Low]);
    assert!(!rig.controller.is_activated());
}

#[tokio::test(start_paused = true)]
async fn test_write_failure_propagates_and_clears_guard() {
    let rig = rig(DoorConfig::default());
    rig.port.fail_writes(true);

    let result = rig.controller.unlock_door().unwrap().wait().await;
    assert!(matches!(result, Err(DoorError::Hardware(_))));
    assert!(!rig.controller.is_unlocked());

    rig.port.fail_writes(false);
    rig.controller.unlock_door().unwrap().wait().await.unwrap();
    assert_eq!(relay_levels(&rig.port), vec![Level::High, Level::Low]);
}

#[tokio::test(start_paused = true)]
async fn test_service_delivers_presses() {
    let rig = rig(DoorConfig::default());
    let handle = DoorService::new(Arc::clone(&rig.controller))
        .start()
        .await
        .unwrap();

    assert!(rig.port.is_subscribed(button()));
    assert_eq!(relay_levels(&rig.port), vec![Level::Low]);

    handle.controller().activate(Duration::from_secs(120));
    assert!(rig.port.press(button()).await.unwrap());

    rig.clock.advance(Duration::from_millis(50));
    assert!(!rig.port.press(button()).await.unwrap());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(
        relay_levels(&rig.port),
        vec![Level::Low, Level::High, Level::Low]
    );

    handle.shutdown().await.unwrap();
    assert!(!rig.port.is_subscribed(button()));
    assert_eq!(rig.port.level(relay()), Some(Level::Low));
}

#[tokio::test(start_paused = true)]
async fn test_service_shutdown_waits_for_cycle() {
    let rig = rig(DoorConfig::default());
    let handle = DoorService::new(Arc::clone(&rig.controller))
        .start()
        .await
        .unwrap();

    rig.controller.unlock_door().unwrap();
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(rig.port.level(relay()), Some(Level::High));

    handle.shutdown().await.unwrap();

    assert_eq!(
        relay_levels(&rig.port),
        vec![Level::Low, Level::High, Level::Low, Level::Low]
    );
}

#[tokio::test]
async fn test_service_start_fails_when_subscribe_fails() {
    let rig = rig(DoorConfig::default());
    rig.port.fail_subscribe(true);

    let result = DoorService::new(Arc::clone(&rig.controller)).start().await;

    assert!(matches!(result, Err(DoorError::Hardware(_))));
    assert!(!rig.port.is_subscribed(button()));
}
