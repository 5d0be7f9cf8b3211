//! Integration tests for the playback orchestrator
//!
//! These tests verify:
//! - At most one render loop and one render call at a time
//! - Stop ordering against the renderer's cleanup path
//! - Override toggling, suspension and resumption
//! - Failure handling on the playlist path

use anyhow::Result;
use ledplayer::media::PlayMode;
use ledplayer::player::{PlaybackOrchestrator, PlayerEvent};
use ledplayer::renderer::{MatrixRenderer, SimulatedCanvas};
use ledplayer::{Config, PlaylistSequencer};
use ledplayer_integration_tests::{entry, loops, panel, wait_until, RecordingRenderer, TestFixture};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_double_start_runs_one_loop() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let a = entry("A", PlayMode::Forever);
    orchestrator.load_playlist(Some(PlaylistSequencer::with_entries("p", vec![a.clone()]).shared()));

    assert!(orchestrator.start());
    assert!(!orchestrator.start());
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));
    assert!(!orchestrator.start());

    orchestrator.stop();
    assert_eq!(renderer.started(), vec!["A"]);
    assert_eq!(renderer.max_in_flight(), 1);
}

#[test]
fn test_stop_returns_after_renderer_cleanup() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let a = entry("A", PlayMode::Forever);
    orchestrator.load_playlist(Some(PlaylistSequencer::with_entries("p", vec![a.clone()]).shared()));

    orchestrator.start();
    assert!(wait_until(|| renderer.started().len() == 1));

    orchestrator.stop();
    renderer.record("stop-returns");

    assert_eq!(
        renderer.log(),
        vec!["render-start:A", "cancel-observed:A", "cleanup:A", "stop-returns"]
    );
    assert!(!orchestrator.is_running());
    assert!(!orchestrator.is_current_entry(&a));

    // Idempotent
    orchestrator.stop();
    assert_eq!(renderer.log().len(), 4);
}

#[test]
fn test_forever_override_toggles_back_to_playlist() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let p = entry("P", PlayMode::Forever);
    let x = entry("X", PlayMode::Forever);
    orchestrator.load_playlist(Some(PlaylistSequencer::with_entries("p", vec![p.clone()]).shared()));

    orchestrator.start();
    assert!(wait_until(|| orchestrator.is_current_entry(&p)));

    orchestrator.trigger_override(x.clone());
    assert!(wait_until(|| orchestrator.is_current_entry(&x)));
    assert!(orchestrator.now_playing().is_override());

    orchestrator.trigger_override(x.clone());
    assert!(wait_until(|| orchestrator.is_current_entry(&p)));
    assert!(!orchestrator.now_playing().is_override());

    orchestrator.stop();
    assert_eq!(renderer.started(), vec!["P", "X", "P"]);
}

#[test]
fn test_forever_toggle_without_playlist_goes_idle() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let x = entry("X", PlayMode::Forever);

    assert!(orchestrator.trigger_override(x.clone()));
    assert!(wait_until(|| orchestrator.is_current_entry(&x)));

    assert!(!orchestrator.trigger_override(x.clone()));
    assert!(!orchestrator.is_running());
    assert!(orchestrator.current_entry().is_none());
}

#[test]
fn test_loop_override_resumes_suspended_forever() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let p = entry("P", PlayMode::Forever);
    let y = entry("Y", PlayMode::Forever);
    let z = entry("Z", loops(3));
    orchestrator.load_playlist(Some(PlaylistSequencer::with_entries("p", vec![p]).shared()));

    orchestrator.trigger_override(y.clone());
    assert!(wait_until(|| orchestrator.is_current_entry(&y)));

    orchestrator.trigger_override(z.clone());
    assert!(wait_until(|| renderer.started().len() == 3));
    assert!(wait_until(|| orchestrator.is_current_entry(&y)));

    orchestrator.stop();
    assert_eq!(renderer.started(), vec!["Y", "Z", "Y"]);
}

#[test]
fn test_forever_over_finite_keeps_suspended() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let y = entry("Y", PlayMode::Forever);
    let z = entry("Z", loops(50));
    let w = entry("W", PlayMode::Forever);

    orchestrator.trigger_override(y.clone());
    assert!(wait_until(|| orchestrator.is_current_entry(&y)));
    orchestrator.trigger_override(z.clone());
    assert!(wait_until(|| orchestrator.is_current_entry(&z)));

    // Y is parked behind Z; a new forever request only replaces Z.
    orchestrator.trigger_override(w.clone());
    assert!(wait_until(|| orchestrator.is_current_entry(&w)));

    // Toggling W off resumes Y.
    assert!(orchestrator.trigger_override(w.clone()));
    assert!(wait_until(|| orchestrator.is_current_entry(&y)));

    orchestrator.stop();
    assert_eq!(renderer.started(), vec!["Y", "Z", "W", "Y"]);
}

#[test]
fn test_playlist_advances_after_finite_override() {
    let renderer = RecordingRenderer::new();
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let a = entry("A", PlayMode::Forever);
    let b = entry("B", PlayMode::Forever);
    let z = entry("Z", loops(1));
    orchestrator.load_playlist(Some(
        PlaylistSequencer::with_entries("p", vec![a.clone(), b.clone()]).shared(),
    ));

    orchestrator.start();
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));

    // Only a fresh start resumes the cursor; after Z the loop moves on.
    orchestrator.trigger_override(z);
    assert!(wait_until(|| renderer.started().len() == 3));
    assert!(wait_until(|| orchestrator.is_current_entry(&b)));

    orchestrator.stop();
    assert_eq!(renderer.started(), vec!["A", "Z", "B"]);
}

#[test]
fn test_failing_playlist_entry_disabled_once() -> Result<()> {
    let renderer = RecordingRenderer::new();
    renderer.fail_on("bad");
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());

    let bad = entry("bad", PlayMode::Forever);
    let good = entry("good", loops(1));
    let playlist = PlaylistSequencer::with_entries("p", vec![bad.clone(), good.clone()]).shared();

    let disabled = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&disabled);
    let _subscription = orchestrator.subscribe(move |event| {
        let PlayerEvent::EntryDisabled { entry } = event;
        assert_eq!(entry.name(), "bad");
        counter.fetch_add(1, Ordering::SeqCst);
    });

    orchestrator.load_playlist(Some(playlist));
    orchestrator.start();

    // "good" keeps cycling on its own once "bad" is out of rotation.
    assert!(wait_until(|| renderer.started().iter().filter(|n| *n == "good").count() >= 3));
    assert!(orchestrator.is_running());
    assert!(!bad.is_enabled());
    assert_eq!(disabled.load(Ordering::SeqCst), 1);
    assert_eq!(renderer.started().iter().filter(|n| *n == "bad").count(), 1);

    orchestrator.stop();
    Ok(())
}

#[test]
fn test_unsubscribed_listener_is_not_called() {
    let renderer = RecordingRenderer::new();
    renderer.fail_on("bad");
    let orchestrator = PlaybackOrchestrator::new(renderer.clone());
    let bad = entry("bad", PlayMode::Forever);

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let subscription = orchestrator.subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    drop(subscription);

    orchestrator.load_playlist(Some(PlaylistSequencer::with_entries("p", vec![bad.clone()]).shared()));
    orchestrator.start();

    assert!(wait_until(|| !orchestrator.is_running()));
    assert!(!bad.is_enabled());
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[test]
fn test_concurrent_triggers_never_overlap_renders() {
    let renderer = RecordingRenderer::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(renderer.clone()));

    let buttons: Vec<_> = (0..4)
        .map(|i| {
            let orchestrator = Arc::clone(&orchestrator);
            let button = entry(&format!("button-{}", i), if i % 2 == 0 { PlayMode::Forever } else { loops(1) });
            thread::spawn(move || {
                for _ in 0..10 {
                    orchestrator.trigger_override(button.clone());
                }
            })
        })
        .collect();

    for button in buttons {
        button.join().unwrap();
    }

    orchestrator.stop();
    assert_eq!(renderer.max_in_flight(), 1);
    assert!(!orchestrator.is_running());
}

#[test]
fn test_matrix_renderer_end_to_end() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut config = Config::default();
    config.playback.image_hold_ms = 5;

    let canvas = SimulatedCanvas::new(panel());
    let counters = canvas.counters();
    let orchestrator = PlaybackOrchestrator::new(Arc::new(MatrixRenderer::new(canvas, &config)));

    let first = fixture.template("first", loops(2))?.shared();
    let second = fixture.template("second", loops(1))?.shared();
    orchestrator.load_playlist(Some(
        PlaylistSequencer::with_entries("p", vec![first.clone(), second.clone()]).shared(),
    ));

    orchestrator.start();
    assert!(wait_until(|| counters.frames_drawn() >= 12));
    orchestrator.stop();

    assert!(first.is_enabled());
    assert!(second.is_enabled());
    assert!(counters.clears() >= 3);
    Ok(())
}
