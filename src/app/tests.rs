use super::*;
use crate::song::Song;
use crate::source::{Capabilities, Control, SourceSummary};
use crate::song::PlayState;

fn s(id: &str, selected: bool) -> SourceSummary {
    SourceSummary {
        id: id.into(),
        name: id.to_uppercase(),
        enabled: true,
        selected,
        capabilities: Capabilities::METADATA | Capabilities::TRANSPORT,
    }
}

#[test]
fn cursor_starts_on_selected_source() {
    let app = App::new(vec![s("mpris", false), s("folder", true)]);
    assert_eq!(app.cursor, 1);
    assert_eq!(app.active_source().map(|s| s.id.as_str()), Some("folder"));
    assert!(!app.running);
    assert_eq!(app.now_playing, Song::stopped());
}

#[test]
fn next_and_prev_wrap() {
    let mut app = App::new(vec![s("a", true), s("b", false), s("c", false)]);
    app.prev();
    assert_eq!(app.cursor_id(), Some("c"));
    app.next();
    assert_eq!(app.cursor_id(), Some("a"));
    app.next();
    assert_eq!(app.cursor_id(), Some("b"));
}

#[test]
fn navigation_on_empty_list_is_a_no_op() {
    let mut app = App::new(Vec::new());
    app.next();
    app.prev();
    assert_eq!(app.cursor, 0);
    assert_eq!(app.cursor_id(), None);
}

#[test]
fn sync_keeps_cursor_on_same_id() {
    let mut app = App::new(vec![s("a", true), s("b", false)]);
    app.next();
    assert_eq!(app.cursor_id(), Some("b"));

    let mut song = Song::default();
    song.set_state(PlayState::Playing);
    song.set_title("T");
    app.sync(true, song.clone(), vec![s("z", false), s("a", false), s("b", true)]);

    assert!(app.running);
    assert_eq!(app.now_playing, song);
    assert_eq!(app.cursor_id(), Some("b"));
    assert_eq!(app.active_source().map(|s| s.id.as_str()), Some("b"));
}

#[test]
fn sync_clamps_cursor_when_source_disappears() {
    let mut app = App::new(vec![s("a", true), s("b", false), s("c", false)]);
    app.prev();
    app.sync(false, Song::stopped(), vec![s("a", true)]);
    assert_eq!(app.cursor, 0);
}

#[test]
fn notices_replace_each_other() {
    let mut app = App::new(Vec::new());
    app.error("boom");
    assert!(app.notice.as_ref().is_some_and(Notice::is_error));
    app.info("ok");
    assert_eq!(app.notice.as_ref().map(Notice::text), Some("ok"));
    app.clear_notice();
    assert!(app.notice.is_none());
}

#[test]
fn progress_ratio_needs_a_duration() {
    let mut app = App::new(Vec::new());
    assert_eq!(app.progress_ratio(), None);

    let mut song = Song::default();
    song.set_duration_ms(200_000);
    song.set_progress_ms(50_000);
    app.now_playing = song;
    assert_eq!(app.progress_ratio(), Some(0.25));
}

#[test]
fn supports_follows_the_selected_source() {
    let mut folder = s("folder", false);
    folder.capabilities = Capabilities::METADATA;
    let mut app = App::new(vec![s("mpris", true), folder]);
    assert!(app.supports(Control::PlayPause));
    assert!(!app.supports(Control::VolumeMute));

    app.sync(false, Song::stopped(), vec![s("mpris", false), {
        let mut f = s("folder", true);
        f.capabilities = Capabilities::METADATA;
        f
    }]);
    assert!(!app.supports(Control::PlayPause));

    app.sync(false, Song::stopped(), Vec::new());
    assert!(!app.supports(Control::Next));
}
