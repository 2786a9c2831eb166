// ============================================================================
// tvstream-core/tests/session_lifecycle.rs
// ============================================================================
//
// Session and manager behaviour against the in-memory transcoder: fan-out,
// slow consumers, idle shutdown, readiness failures, fallback screens and
// concat position tracking.
//
// AI-ASSISTANT-INFO: Streaming session lifecycle integration tests

mod common;

use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use common::{MockSpawner, eventually, pipe_spec, quick_settings, segmented_spec};
use tempfile::tempdir;
use tvstream_core::error::CoreError;
use tvstream_core::stream::{
    ConcatEntry, ConcatList, RetryPolicy, SessionManager, SessionSettings, SessionState,
    StreamSession, ThrottleKey, TranscoderSpawner, concat_session,
};
use tvstream_core::CoreConfig;

const WAIT: Duration = Duration::from_secs(1);

fn start(spawner: &Arc<MockSpawner>, spec: tvstream_core::SessionSpec) -> Arc<StreamSession> {
    StreamSession::start(spec, Arc::clone(spawner) as Arc<dyn TranscoderSpawner>, quick_settings()).unwrap()
}

#[test]
fn test_output_fans_out_to_every_consumer() {
    let spawner = Arc::new(MockSpawner::new());
    let session = start(&spawner, pipe_spec("1"));
    assert_eq!(session.state(), SessionState::Ready);

    let mut first = session.attach().unwrap();
    let mut second = session.attach().unwrap();
    assert_eq!(session.state(), SessionState::Streaming);
    assert_eq!(session.consumer_count(), 2);

    spawner.control(0).write_stdout(b"hello");
    assert_eq!(first.recv_timeout(WAIT).as_deref(), Some(&b"hello"[..]));
    assert_eq!(second.recv_timeout(WAIT).as_deref(), Some(&b"hello"[..]));
    assert_eq!(session.bytes_streamed(), 5);

    session.stop().unwrap();
    let mut rest = Vec::new();
    first.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
    assert_eq!(session.state(), SessionState::Terminated);
}

#[test]
fn test_slow_consumer_is_detached() {
    let spawner = Arc::new(MockSpawner::new());
    let session = start(&spawner, pipe_spec("2"));

    let _slow = session.attach().unwrap();
    let mut fast = session.attach().unwrap();
    let reader = thread::spawn(move || {
        let mut received = 0usize;
        let mut buf = [0u8; 64];
        while let Ok(n) = fast.read(&mut buf) {
            if n == 0 {
                break;
            }
            received += n;
        }
        received
    });

    let control = spawner.control(0);
    for _ in 0..40 {
        control.write_stdout(b"chunk");
        thread::sleep(Duration::from_millis(2));
    }

    assert!(eventually(|| session.consumer_count() == 1));
    assert_eq!(session.state(), SessionState::Streaming);

    session.stop().unwrap();
    assert_eq!(reader.join().unwrap(), 40 * 5);
}

#[test]
fn test_last_consumer_leaving_stops_after_grace() {
    let spawner = Arc::new(MockSpawner::new());
    let session = start(&spawner, pipe_spec("3"));

    drop(session.attach().unwrap());
    assert!(eventually(|| session.state() == SessionState::Terminated));
    assert!(spawner.control(0).is_killed());
    assert!(matches!(session.attach(), Err(CoreError::SessionStopped(_))));
}

#[test]
fn test_reattach_within_grace_keeps_session() {
    let spawner = Arc::new(MockSpawner::new());
    let session = start(&spawner, pipe_spec("4"));

    drop(session.attach().unwrap());
    let _again = session.attach().unwrap();
    thread::sleep(quick_settings().idle_grace * 3);

    assert_eq!(session.state(), SessionState::Streaming);
    assert!(!spawner.control(0).is_killed());
    session.stop().unwrap();
}

#[test]
fn test_stop_kills_process_and_removes_segments() {
    let root = tempdir().unwrap();
    let spawner = Arc::new(MockSpawner::writing_playlist());
    let session = start(&spawner, segmented_spec("5", root.path()));

    let playlist = session.playlist().unwrap().to_path_buf();
    assert!(playlist.exists());
    let dir = playlist.parent().unwrap().to_path_buf();

    session.stop().unwrap();
    assert!(!dir.exists());
    assert!(spawner.control(0).is_killed());
    assert_eq!(session.state(), SessionState::Terminated);

    // Idempotent
    session.stop().unwrap();
    assert_eq!(spawner.spawn_count(), 1);
}

#[test]
fn test_concurrent_stop_waits_for_cleanup() {
    let root = tempdir().unwrap();
    let spawner = Arc::new(MockSpawner::with_behavior(|index, request, control| {
        if let Some(path) = request.args.last() {
            std::fs::write(path, "#EXTM3U\n").unwrap();
        }
        if index == 0 {
            control.delay_wait(Duration::from_millis(300));
        }
    }));
    let session = start(&spawner, segmented_spec("14", root.path()));
    let dir = session.playlist().unwrap().parent().unwrap().to_path_buf();

    let first_stop = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.stop())
    };
    assert!(eventually(|| session.state() == SessionState::Stopping));

    session.stop().unwrap();
    assert_eq!(session.state(), SessionState::Terminated);
    assert!(!dir.exists());

    // The old session's teardown must not touch its successor's files
    let next = start(&spawner, segmented_spec("14", root.path()));
    first_stop.join().unwrap().unwrap();
    assert!(next.playlist().unwrap().exists());
    next.stop().unwrap();
}

#[test]
fn test_first_consumer_receives_output_written_before_attach() {
    let spawner = Arc::new(MockSpawner::with_behavior(|_, _, control| {
        control.write_stdout(b"header");
    }));
    let session = start(&spawner, pipe_spec("15"));
    assert!(eventually(|| session.bytes_streamed() == 6));

    let mut first = session.attach().unwrap();
    assert_eq!(first.recv_timeout(WAIT).as_deref(), Some(&b"header"[..]));

    // Later consumers join the live stream
    let mut second = session.attach().unwrap();
    spawner.control(0).write_stdout(b"body");
    assert_eq!(first.recv_timeout(WAIT).as_deref(), Some(&b"body"[..]));
    assert_eq!(second.recv_timeout(WAIT).as_deref(), Some(&b"body"[..]));
    session.stop().unwrap();
}

#[test]
fn test_output_before_attach_is_bounded() {
    let spawner = Arc::new(MockSpawner::new());
    let session = start(&spawner, pipe_spec("16"));
    let control = spawner.control(0);
    for i in 0..40 {
        control.write_stdout(format!("{i:02}").as_bytes());
    }
    assert!(eventually(|| session.bytes_streamed() == 80));

    let mut consumer = session.attach().unwrap();
    let mut received = Vec::new();
    while let Some(chunk) = consumer.recv_timeout(Duration::from_millis(50)) {
        received.push(String::from_utf8(chunk.to_vec()).unwrap());
    }
    let buffer = quick_settings().consumer_buffer;
    assert_eq!(received.len(), buffer);
    assert_eq!(received.first().map(String::as_str), Some("24"));
    assert_eq!(received.last().map(String::as_str), Some("39"));
    session.stop().unwrap();
}

#[test]
fn test_process_exiting_before_playlist_fails_start() {
    let root = tempdir().unwrap();
    let spawner = Arc::new(MockSpawner::with_behavior(|_, _, control| {
        control.write_stderr("Invalid data found when processing input");
        control.exit(1);
    }));
    let spec = segmented_spec("6", root.path());
    let dir = root.path().join("stream_6");

    let err = StreamSession::start(spec, Arc::clone(&spawner) as Arc<dyn TranscoderSpawner>, quick_settings())
        .unwrap_err();
    match err {
        CoreError::ExitedBeforeReady { code, .. } => assert_eq!(code, Some(1)),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(!dir.exists());
}

#[test]
fn test_missing_playlist_times_out_after_every_attempt() {
    let root = tempdir().unwrap();
    let spawner = Arc::new(MockSpawner::new());
    let settings = SessionSettings {
        readiness: RetryPolicy {
            retries: 2,
            factor: 1.0,
            min_delay: Duration::from_millis(5),
        },
        ..quick_settings()
    };

    let err = StreamSession::start(
        segmented_spec("7", root.path()),
        Arc::clone(&spawner) as Arc<dyn TranscoderSpawner>,
        settings,
    )
    .unwrap_err();
    assert!(matches!(err, CoreError::ReadinessTimeout { attempts: 3, .. }), "{err:?}");
    assert!(spawner.control(0).is_killed());
}

#[test]
fn test_spawn_failure_is_not_retried() {
    let spawner = Arc::new(MockSpawner::failing());
    let mut spec = pipe_spec("8");
    spec.fallback = Some(spec.request.clone());

    let err = StreamSession::start(spec, Arc::clone(&spawner) as Arc<dyn TranscoderSpawner>, quick_settings())
        .unwrap_err();
    assert!(matches!(err, CoreError::CommandStart { .. }));
    assert!(spawner.requests().is_empty());
}

#[test]
fn test_fallback_replaces_failed_start() {
    let root = tempdir().unwrap();
    let spawner = Arc::new(MockSpawner::with_behavior(|index, request, control| {
        if index == 0 {
            control.exit(1);
        } else if let Some(path) = request.args.last() {
            std::fs::write(path, "#EXTM3U\n").unwrap();
        }
    }));
    let mut spec = segmented_spec("9", root.path());
    spec.fallback = Some(spec.request.clone());

    let session = start(&spawner, spec);
    assert_eq!(session.state(), SessionState::Ready);
    assert_eq!(session.spawn_count(), 2);
    session.stop().unwrap();
}

#[test]
fn test_crash_switches_to_fallback_once() {
    let spawner = Arc::new(MockSpawner::new());
    let mut spec = pipe_spec("10");
    spec.fallback = Some(spec.request.clone());
    let session = start(&spawner, spec);
    let _consumer = session.attach().unwrap();

    spawner.control(0).write_stderr("Conversion failed!");
    spawner.control(0).exit(1);
    assert!(eventually(|| session.spawn_count() == 2));
    assert!(session.state().is_running());

    spawner.control(1).exit(2);
    assert!(eventually(|| session.state() == SessionState::Error));
    match session.failure() {
        Some(CoreError::ProcessExited { code, .. }) => assert_eq!(code, Some(2)),
        other => panic!("unexpected failure: {other:?}"),
    }
    assert_eq!(session.consumer_count(), 0);
}

#[test]
fn test_clean_exit_terminates() {
    let spawner = Arc::new(MockSpawner::new());
    let session = start(&spawner, pipe_spec("11"));
    let mut consumer = session.attach().unwrap();

    spawner.control(0).exit(0);
    assert_eq!(session.wait_until_finished(Some(WAIT)), SessionState::Terminated);
    assert!(session.failure().is_none());

    let mut rest = Vec::new();
    consumer.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_concat_session_tracks_position_across_loops() {
    let root = tempdir().unwrap();
    let config = CoreConfig {
        stream_output_dir: root.path().to_path_buf(),
        ..CoreConfig::default()
    };
    let list = ConcatList::new(vec![
        ConcatEntry::new("/media/a.mkv", Some(Duration::from_secs(10))),
        ConcatEntry::new("/media/b.mkv", Some(Duration::from_secs(20))),
        ConcatEntry::new("/media/c.mkv", Some(Duration::from_secs(30))),
    ]);
    let total = list.total_duration();

    let spawner = Arc::new(MockSpawner::new());
    let spec = concat_session("12", list, &config, false).unwrap();
    let list_file = spec.scratch_files[0].clone();
    assert!(list_file.exists());
    let session = start(&spawner, spec);

    let control = spawner.control(0);
    for path in ["a", "b", "c", "a"] {
        control.write_stderr(&format!("[concat @ 0x55d0] Opening '/media/{path}.mkv' for reading"));
    }

    assert!(eventually(|| session.items_started() == 4));
    assert_eq!(session.current_item(), Some(0));
    assert_eq!(session.completed_duration(), total);
    assert_eq!(spawner.spawn_count(), 1);

    session.stop().unwrap();
    assert!(!list_file.exists());
}

#[test]
fn test_manager_keeps_one_session_per_channel() {
    let spawner = Arc::new(MockSpawner::new());
    let manager = SessionManager::with_settings(
        CoreConfig::default(),
        Arc::clone(&spawner) as Arc<dyn TranscoderSpawner>,
        quick_settings(),
    );

    let first = manager.get_or_create(pipe_spec("1")).unwrap();
    let again = manager.get_or_create(pipe_spec("1")).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(spawner.spawn_count(), 1);

    manager.get_or_create(pipe_spec("2")).unwrap();
    assert_eq!(manager.active_channels(), vec!["1".to_string(), "2".to_string()]);

    assert!(manager.stop("1").unwrap());
    assert!(!manager.stop("1").unwrap());
    assert!(manager.get("1").is_none());
    assert_eq!(first.state(), SessionState::Terminated);

    manager.stop_all().unwrap();
    assert!(manager.active_channels().is_empty());
    assert!(spawner.control(1).is_killed());
}

#[test]
fn test_manager_replaces_finished_session() {
    let spawner = Arc::new(MockSpawner::new());
    let manager = SessionManager::with_settings(
        CoreConfig::default(),
        Arc::clone(&spawner) as Arc<dyn TranscoderSpawner>,
        quick_settings(),
    );

    let first = manager.get_or_create(pipe_spec("1")).unwrap();
    spawner.control(0).exit(0);
    assert!(eventually(|| first.state().is_finished()));

    let second = manager.get_or_create(pipe_spec("1")).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(spawner.spawn_count(), 2);
    assert_eq!(manager.reap(), 0);
}

#[test]
fn test_manager_throttles_rapid_reconnects() {
    let manager = SessionManager::new(CoreConfig::default(), Arc::new(MockSpawner::new()));
    let item = ThrottleKey::new("program:/media/a.mkv", false);
    let other = ThrottleKey::new("program:/media/b.mkv", false);

    assert!(!manager.too_many_attempts("client-1", Some(&item)));
    assert!(manager.too_many_attempts("client-1", Some(&item)));
    assert!(!manager.too_many_attempts("client-1", Some(&other)));
    assert!(!manager.too_many_attempts("client-2", Some(&item)));
}
