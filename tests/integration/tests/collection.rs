//! Integration tests for the playlist collection manager and quick media
//!
//! These tests verify:
//! - Stop/start bracketing only around the playing playlist
//! - Persistence of cursors, pointers and failure-disabled entries
//! - Quick media buttons pre-empting and resuming the playlist

use anyhow::Result;
use ledplayer::media::{DisplayOptions, PlayMode};
use ledplayer::player::{PlaybackOrchestrator, PlayerEvent};
use ledplayer::renderer::{MatrixRenderer, SimulatedCanvas};
use ledplayer::{Config, PlayerError, PlaylistCollectionManager, QuickMediaBank};
use ledplayer_integration_tests::{loops, panel, wait_until, RecordingRenderer, TestFixture};
use std::sync::Arc;
use std::time::Duration;

fn manager(fixture: &TestFixture, orchestrator: &Arc<PlaybackOrchestrator>) -> Result<PlaylistCollectionManager> {
    Ok(PlaylistCollectionManager::new(
        Arc::clone(orchestrator),
        fixture.store()?,
        fixture.playlist_media(),
    )?)
}

#[test]
fn test_edits_to_playing_playlist_are_bracketed() -> Result<()> {
    let fixture = TestFixture::new()?;
    let renderer = RecordingRenderer::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(renderer.clone()));
    let manager = manager(&fixture, &orchestrator)?;

    manager.create_playlist("main")?;
    manager.create_playlist("other")?;
    let a = manager.add_item("main", 0, &fixture.template("A", PlayMode::Forever)?)?;
    manager.set_active_playlist_state(true, Some("main"))?;
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));

    // Editing another playlist leaves playback alone.
    manager.add_item("other", 0, &fixture.template("O", PlayMode::Forever)?)?;
    assert_eq!(renderer.started(), vec!["A"]);

    // Editing the playing one restarts it in place.
    manager.add_item("main", 1, &fixture.template("B", PlayMode::Forever)?)?;
    assert!(wait_until(|| renderer.started().len() == 2));
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));
    assert_eq!(
        renderer.log()[..4],
        ["render-start:A", "cancel-observed:A", "cleanup:A", "render-start:A"]
    );

    orchestrator.stop();
    Ok(())
}

#[test]
fn test_removing_current_item_moves_on() -> Result<()> {
    let fixture = TestFixture::new()?;
    let renderer = RecordingRenderer::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(renderer.clone()));
    let manager = manager(&fixture, &orchestrator)?;

    manager.create_playlist("main")?;
    let a = manager.add_item("main", 0, &fixture.template("A", PlayMode::Forever)?)?;
    let b = manager.add_item("main", 1, &fixture.template("B", PlayMode::Forever)?)?;
    manager.set_active_playlist_state(true, Some("main"))?;
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));

    manager.remove_item("main", 0)?;
    assert!(wait_until(|| orchestrator.is_current_entry(&b)));
    assert!(!a.source().exists());
    assert!(b.source().exists());

    manager.remove_item("main", 0)?;
    assert!(wait_until(|| !orchestrator.is_running()));
    assert!(matches!(manager.remove_item("main", 0), Err(PlayerError::InvalidInput(_))));
    Ok(())
}

#[test]
fn test_deleting_active_playlist_stops_playback() -> Result<()> {
    let fixture = TestFixture::new()?;
    let orchestrator = Arc::new(PlaybackOrchestrator::new(RecordingRenderer::new()));
    let manager = manager(&fixture, &orchestrator)?;

    manager.create_playlist("main")?;
    let a = manager.add_item("main", 0, &fixture.template("A", PlayMode::Forever)?)?;
    manager.set_active_playlist_state(true, Some("main"))?;
    manager.set_editing_playlist(Some("main"))?;
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));

    manager.delete_playlist("main")?;
    assert!(!orchestrator.is_running());
    assert!(orchestrator.loaded_playlist().is_none());
    assert!(manager.active_playlist().is_none());
    assert!(manager.editing_playlist().is_none());
    assert!(!a.source().exists());
    Ok(())
}

#[test]
fn test_restore_resumes_persisted_cursor() -> Result<()> {
    let fixture = TestFixture::new()?;
    let renderer = RecordingRenderer::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(renderer.clone()));

    {
        let manager = manager(&fixture, &orchestrator)?;
        manager.create_playlist("main")?;
        for (i, name) in ["A", "B", "C"].iter().enumerate() {
            manager.add_item("main", i, &fixture.template(name, PlayMode::Forever)?)?;
        }
        manager.set_active_playlist_state(true, Some("main"))?;
        manager.jump_to_item("main", 2)?;
        assert!(wait_until(|| orchestrator
            .current_entry()
            .is_some_and(|e| e.name() == "C")));
    }
    orchestrator.stop();
    orchestrator.load_playlist(None);

    let restored = manager(&fixture, &orchestrator)?;
    assert_eq!(restored.active_playlist().as_deref(), Some("main"));
    restored.restore()?;
    assert!(wait_until(|| orchestrator
        .current_entry()
        .is_some_and(|e| e.name() == "C")));

    orchestrator.stop();
    Ok(())
}

#[test]
fn test_incompatible_entry_is_disabled_and_persisted() -> Result<()> {
    let fixture = TestFixture::new()?;
    let mut config = Config::default();
    config.playback.image_hold_ms = 5;
    let orchestrator = Arc::new(PlaybackOrchestrator::new(Arc::new(MatrixRenderer::new(
        SimulatedCanvas::new(panel()),
        &config,
    ))));
    let manager = manager(&fixture, &orchestrator)?;

    let wide = DisplayOptions {
        chain_length: 2,
        ..panel()
    };
    manager.create_playlist("main")?;
    let broken = manager.add_item("main", 0, &fixture.template_for("wide", PlayMode::Forever, &wide)?)?;
    manager.add_item("main", 1, &fixture.template("fits", loops(1))?)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let _subscription = manager.subscribe(move |event| {
        let PlayerEvent::EntryDisabled { entry } = event;
        let _ = tx.send(entry.name().to_string());
    });

    manager.set_active_playlist_state(true, Some("main"))?;
    assert_eq!(rx.recv_timeout(Duration::from_secs(5))?, "wide");
    assert!(!broken.is_enabled());
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    orchestrator.stop();
    drop(manager);

    let reloaded = PlaylistCollectionManager::new(
        Arc::clone(&orchestrator),
        fixture.store()?,
        fixture.playlist_media(),
    )?;
    let playlist = reloaded.playlist("main").ok_or_else(|| anyhow::anyhow!("playlist lost"))?;
    let sequencer = playlist.lock();
    assert!(!sequencer.get(0).is_some_and(|e| e.is_enabled()));
    assert!(sequencer.get(1).is_some_and(|e| e.is_enabled()));
    Ok(())
}

#[test]
fn test_quick_media_preempts_and_resumes_playlist() -> Result<()> {
    let fixture = TestFixture::new()?;
    let renderer = RecordingRenderer::new();
    let orchestrator = Arc::new(PlaybackOrchestrator::new(renderer.clone()));
    let manager = manager(&fixture, &orchestrator)?;
    let quick = QuickMediaBank::new(3, Arc::clone(&orchestrator), fixture.store()?, fixture.quick_media());

    let main = manager.create_playlist("main")?;
    let a = manager.add_item("main", 0, &fixture.template("A", PlayMode::Forever)?)?;
    let jingle = quick.assign(0, &fixture.template("jingle", loops(2))?)?;
    let banner = quick.assign(1, &fixture.template("banner", PlayMode::Forever)?)?;

    manager.set_active_playlist_state(true, Some("main"))?;
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));

    // A finite button plays once, then the playlist carries on.
    quick.press(0)?;
    assert!(wait_until(|| renderer.started().len() == 3));
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));
    assert!(jingle.is_enabled());

    // A forever button holds the panel until pressed again.
    quick.press(1)?;
    assert!(wait_until(|| orchestrator.is_current_entry(&banner)));
    assert!(orchestrator.now_playing().is_override());
    assert!(orchestrator.is_playlist_playing(&main));
    quick.press(1)?;
    assert!(wait_until(|| orchestrator.is_current_entry(&a)));

    assert!(matches!(quick.press(2), Err(PlayerError::NotFound(_))));
    assert_eq!(renderer.started(), vec!["A", "jingle", "A", "banner", "A"]);

    orchestrator.stop();
    Ok(())
}
