//! Host session scenarios: a UI thread driving the bridge the way a mobile
//! shell does, with the execution loop running for real.

mod common;

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{presents, recording_controller, wait_until, window, Seen};
use tether_core::{InputEvent, LifecycleState, SurfaceSize, TouchPhase};
use tether_runtime::{BridgeConfig, RunState};

const TIMEOUT: Duration = Duration::from_secs(5);

#[test]
fn test_start_stop_without_events_presents_nothing() {
    let (controller, log) = recording_controller(BridgeConfig::default());

    controller.start().unwrap();
    let report = controller.stop().unwrap().unwrap();

    assert_eq!(report.frames_presented, 0);
    assert_eq!(presents(&log), 0);
    assert_eq!(controller.run_state(), RunState::Stopped);
}

#[test]
fn test_create_resize_destroy_scenario() {
    let (controller, log) = recording_controller(BridgeConfig::default());
    controller.start().unwrap();

    controller.report_surface_created(window("main"), 100, 200);
    controller.report_surface_changed(50, 50);
    assert!(wait_until(TIMEOUT, || {
        controller
            .surface()
            .is_some_and(|s| s.size() == SurfaceSize::new(50, 50))
    }));
    assert!(wait_until(TIMEOUT, || presents(&log) >= 1));

    controller.report_surface_destroyed_and_wait();
    assert!(controller.surface().is_none());
    let presented = presents(&log);

    controller.report_redraw_needed();
    thread::sleep(Duration::from_millis(50));
    assert_eq!(presents(&log), presented, "presented with no surface bound");

    let report = controller.stop().unwrap().unwrap();
    assert!(report.frames_skipped >= 1);
    assert!(log.lock().contains(&Seen::Lost));
}

#[test]
fn test_pause_keeps_touch_flowing() {
    let (controller, log) = recording_controller(BridgeConfig::default());
    controller.start().unwrap();
    controller.report_surface_created(window("main"), 64, 64);
    controller.report_resumed();
    assert!(wait_until(TIMEOUT, || presents(&log) >= 1));

    controller.report_paused();
    assert!(wait_until(TIMEOUT, || log
        .lock()
        .contains(&Seen::Lifecycle(LifecycleState::Paused))));
    let presented = presents(&log);

    controller.report_touch(9, TouchPhase::Started, 4.0, 5.0);
    controller.report_redraw_needed();
    assert!(wait_until(TIMEOUT, || log
        .lock()
        .iter()
        .any(|s| matches!(s, Seen::Input(InputEvent::Touch(t)) if t.pointer_id == 9))));
    thread::sleep(Duration::from_millis(50));
    assert_eq!(presents(&log), presented);

    controller.report_resumed();
    assert!(wait_until(TIMEOUT, || presents(&log) > presented));
    controller.stop().unwrap();
}

#[test]
fn test_per_producer_order_is_preserved() {
    let (controller, log) = recording_controller(BridgeConfig::default());
    let controller = Arc::new(controller);
    controller.start().unwrap();

    let producers: Vec<_> = (0..4)
        .map(|p| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || {
                for i in 0..200 {
                    controller.report_touch(p * 1000 + i, TouchPhase::Moved, 0.0, 0.0);
                }
            })
        })
        .collect();
    for h in producers {
        h.join().unwrap();
    }

    assert!(wait_until(TIMEOUT, || controller.queue_stats().pending == 0));
    controller.stop().unwrap();

    let touches: Vec<i32> = log
        .lock()
        .iter()
        .filter_map(|s| match s {
            Seen::Input(InputEvent::Touch(t)) => Some(t.pointer_id),
            _ => None,
        })
        .collect();
    assert_eq!(touches.len(), 800, "touch delivered twice or lost");

    let mut last_seen = [-1i32; 4];
    for id in touches {
        let producer = (id / 1000) as usize;
        let seq = id % 1000;
        assert!(seq > last_seen[producer], "producer {producer} reordered");
        last_seen[producer] = seq;
    }
}

#[test]
fn test_concurrent_start_leaves_one_thread() {
    let (controller, _log) = recording_controller(BridgeConfig::default());
    let controller = Arc::new(controller);

    let starters: Vec<_> = (0..4)
        .map(|_| {
            let controller = Arc::clone(&controller);
            thread::spawn(move || controller.start())
        })
        .collect();
    for h in starters {
        h.join().unwrap().unwrap();
    }

    assert_eq!(controller.run_state(), RunState::Running);
    assert!(controller.shared().is_live());

    controller.stop().unwrap();
    assert!(!controller.shared().is_live());
    assert_eq!(controller.stop().unwrap(), None);
}

#[test]
fn test_start_reaches_running_quickly() {
    let (controller, _log) = recording_controller(BridgeConfig::default());

    let start = Instant::now();
    controller.start().unwrap();
    assert_eq!(controller.run_state(), RunState::Running);
    assert!(start.elapsed() < TIMEOUT);

    controller.stop().unwrap();
}

#[test]
fn test_rapid_start_stop_cycles() {
    let (controller, log) = recording_controller(BridgeConfig::default());
    controller.report_surface_created(window("main"), 32, 32);

    let start = Instant::now();
    for i in 0..50 {
        controller.start().unwrap();
        if i % 2 == 0 {
            controller.report_surface_changed(32 + i, 32);
        } else {
            let ticket = controller.report_surface_destroyed();
            controller.report_surface_created(window("main"), 32, 32);
            assert!(ticket.wait_timeout(TIMEOUT));
        }
        controller.stop().unwrap();
    }
    let elapsed = start.elapsed();

    println!("\n=== Start/Stop Cycles ===");
    println!("Cycles: 50");
    println!("Elapsed: {elapsed:?}");
    println!("Presents: {}", presents(&log));
    println!("Queue: {:?}", controller.queue_stats());

    assert_eq!(controller.queue_stats().pending, 0);
    assert!(controller.surface().is_some());
}
