//! End-to-end bridge tests against scripted renderers.
//!
//! Each renderer is a small `/bin/sh` script that speaks the line protocol
//! using shell builtins only.

#![cfg(unix)]

use crossbeam_channel::{bounded, unbounded};
use renderlink::{
    BridgeConfig, BridgeError, ChannelState, Event, Frame, Hooks, Point, Size, Snapshot, Sprite,
    StopReason, Supervisor, TextOverlay, WindowConfig,
};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;

const QUIT: &str = r#"echo '{"action":"quit"}'"#;
const DRAIN: &str = "while read -r line; do :; done";

fn write_script(dir: &TempDir, body: &str, mode: u32) -> PathBuf {
    let path = dir.path().join("renderer.sh");
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
    path
}

fn renderer(dir: &TempDir, body: &str) -> BridgeConfig {
    BridgeConfig::new(write_script(dir, body, 0o755)).with_shutdown_timeout(Some(Duration::from_secs(5)))
}

fn scene() -> Snapshot {
    Snapshot::new(WindowConfig::new(800, 600, "My Game", "background.jpeg", "cute-bunny.png"), 60)
        .with_sprite(Sprite::new("tank1", ["tank-1.png", "tank-2.png"], Point::new(100, 100), Size::new(64, 64)))
        .with_text(TextOverlay::new("score", "Orbitron-Black.ttf", "Score: 0", 24, Point::new(10, 10)))
        .with_default_font("Orbitron-Black.ttf")
}

#[test]
fn test_quit_event_stops_the_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("read -r line\n{QUIT}\n{DRAIN}");
    let mut bridge = Supervisor::launch(renderer(&dir, &body)).unwrap();

    let summary = bridge.run(&mut scene).unwrap();

    assert_eq!(summary.reason, StopReason::Requested);
    assert!(summary.frames_sent >= 1);
    assert!(summary.exit_status.is_some());
    assert!(!bridge.is_running());
    assert_eq!(bridge.channel_state(), ChannelState::Closed);
}

#[test]
fn test_quit_stops_within_one_tick() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("read -r line\n{QUIT}\n{DRAIN}");
    let mut bridge = Supervisor::launch(renderer(&dir, &body)).unwrap();

    let started = Instant::now();
    let summary = bridge
        .run(&mut || {
            let mut slow = scene();
            slow.fps = 2;
            slow
        })
        .unwrap();

    // Quit lands during the first 500ms sleep; at most one more frame races it.
    assert_eq!(summary.reason, StopReason::Requested);
    assert!(summary.frames_sent <= 2, "sent {} frames", summary.frames_sent);
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn test_malformed_line_does_not_stop_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!(
        "read -r line\necho 'not-json'\necho '{{\"action\":\"mouse_motion\",\"x\":3,\"y\":4}}'\n\
         echo '{{\"action\":\"key_down\",\"keycode\":\"Space\"}}'\n{QUIT}\n{DRAIN}"
    );
    let (tx, rx) = bounded::<Event>(16);
    let mut bridge = Supervisor::launch_with(renderer(&dir, &body), Hooks::new().observer(tx)).unwrap();

    let summary = bridge.run(&mut scene).unwrap();
    assert_eq!(summary.reason, StopReason::Requested);

    let observed: Vec<Event> = rx.try_iter().collect();
    assert_eq!(
        observed,
        vec![
            Event::MouseMotion { x: 3, y: 4 },
            Event::KeyDown { keycode: "Space".to_string() },
        ]
    );
}

#[test]
fn test_unknown_action_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("echo '{{\"action\":\"teleport\"}}'\necho '[1,2]'\n{QUIT}\n{DRAIN}");
    let (tx, rx) = bounded::<Event>(16);
    let mut bridge = Supervisor::launch_with(renderer(&dir, &body), Hooks::new().observer(tx)).unwrap();

    let summary = bridge.run(&mut scene).unwrap();

    assert_eq!(summary.reason, StopReason::Requested);
    assert_eq!(rx.try_iter().count(), 0);
}

#[test]
fn test_diagnostics_are_forwarded() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("echo 'texture missing: tank-3.png' >&2\necho '' >&2\nread -r line\n{QUIT}\n{DRAIN}");
    let (tx, rx) = unbounded();
    let mut bridge = Supervisor::launch_with(renderer(&dir, &body), Hooks::new().diagnostics(tx)).unwrap();

    bridge.run(&mut scene).unwrap();

    let lines: Vec<String> = rx.try_iter().collect();
    assert_eq!(lines, vec!["texture missing: tank-3.png".to_string()]);
}

#[test]
fn test_renderer_receives_decodable_frames() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("read -r line\necho \"$line\" >&2\n{QUIT}\n{DRAIN}");
    let (tx, rx) = unbounded();
    let mut bridge = Supervisor::launch_with(renderer(&dir, &body), Hooks::new().diagnostics(tx)).unwrap();

    bridge.run(&mut scene).unwrap();

    let echoed = rx.try_recv().unwrap();
    let frame = Frame::from_line(&echoed);
    assert_eq!(frame.decode_snapshot().unwrap(), scene());
    assert_eq!(frame.to_record().unwrap()["sprites"][0]["id"], "tank1");
}

#[test]
fn test_renderer_exit_ends_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = Supervisor::launch(renderer(&dir, "exit 3")).unwrap();

    let summary = bridge.run(&mut scene).unwrap();

    assert!(matches!(summary.reason, StopReason::ChannelBroken | StopReason::Requested));
    assert_eq!(summary.exit_status.and_then(|s| s.code()), Some(3));
    assert_eq!(bridge.channel_state(), ChannelState::Closed);
}

#[test]
fn test_output_eof_can_be_ignored() {
    let dir = tempfile::tempdir().unwrap();
    let body = format!("exec 1>&-\n{DRAIN}");
    let config = renderer(&dir, &body).with_stop_on_output_eof(false);
    let mut bridge = Supervisor::launch(config).unwrap();

    let flag = bridge.running_flag();
    let stopper = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        flag.stop()
    });

    let summary = bridge.run(&mut scene).unwrap();

    assert!(stopper.join().unwrap());
    assert_eq!(summary.reason, StopReason::Requested);
    assert!(summary.frames_sent > 1);
}

#[test]
fn test_external_stop_request() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = Supervisor::launch(renderer(&dir, DRAIN)).unwrap();
    let flag = bridge.running_flag();

    thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        flag.stop();
    });

    let mut ticks = 0u32;
    let summary = bridge
        .run(&mut || {
            ticks += 1;
            scene()
        })
        .unwrap();

    assert_eq!(summary.reason, StopReason::Requested);
    assert_eq!(summary.frames_sent, u64::from(ticks));
    assert_eq!(summary.encode_failures, 0);
}

#[test]
fn test_shutdown_timeout_bounds_background_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let body = "trap '' TERM\nsleep 6 &\nwhile :; do sleep 1; done";
    let config = renderer(&dir, body).with_shutdown_timeout(Some(Duration::from_millis(200)));
    let mut bridge = Supervisor::launch(config).unwrap();

    let started = Instant::now();
    let status = bridge.shutdown().unwrap();

    assert!(status.is_some_and(|s| !s.success()));
    assert!(started.elapsed() < Duration::from_secs(2), "took {:?}", started.elapsed());
    assert_eq!(bridge.channel_state(), ChannelState::Closed);
}

#[test]
fn test_missing_binary_is_startup_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let err = Supervisor::launch(BridgeConfig::new(dir.path().join("no-such-renderer"))).unwrap_err();

    assert!(matches!(err, BridgeError::BinaryNotFound { .. }));
    assert!(err.is_startup_fatal());
}

#[test]
fn test_non_executable_renderer_is_fixed() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_script(&dir, &format!("{QUIT}\n{DRAIN}"), 0o644);

    let mut bridge = Supervisor::launch(BridgeConfig::new(&path)).unwrap();
    bridge.run(&mut scene).unwrap();

    let mode = fs::metadata(&path).unwrap().permissions().mode();
    assert_ne!(mode & 0o111, 0);
}

#[test]
fn test_shutdown_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let mut bridge = Supervisor::launch(renderer(&dir, DRAIN)).unwrap();
    assert!(bridge.is_alive());

    let first = bridge.shutdown().unwrap();
    assert!(first.is_some());
    assert_eq!(bridge.shutdown().unwrap(), first);
    assert_eq!(bridge.channel_state(), ChannelState::Closed);
    assert!(!bridge.is_running());
}

#[test]
fn test_drop_tears_down_running_bridge() {
    let dir = tempfile::tempdir().unwrap();
    let bridge = Supervisor::launch(renderer(&dir, DRAIN)).unwrap();
    let flag = bridge.running_flag();

    drop(bridge);

    assert!(!flag.is_running());
}
