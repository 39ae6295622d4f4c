use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::App;
use crate::query::{QuerySettings, QueryThread};
use crate::source::{Control, TargetStep};
use crate::ui;

/// Main terminal event loop: mirrors the query thread into `app`, draws,
/// and handles input. Returns `Ok(())` when the user quits.
pub fn run(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    app: &mut App,
    query: &QueryThread,
) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        app.sync(query.is_running(), query.latest(), query.sources());
        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key_event(key, app, query) {
                    return Ok(());
                }
            }
        }
    }
}

/// Apply one key press. Returns `true` when the app should exit.
fn handle_key_event(key: KeyEvent, app: &mut App, query: &QueryThread) -> bool {
    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('s') => match query.start() {
            Ok(()) => app.info("polling started"),
            Err(e) => app.error(e.to_string()),
        },
        KeyCode::Char('x') => {
            query.stop();
            app.info("polling stopped");
        }
        KeyCode::Char('j') | KeyCode::Down => app.next(),
        KeyCode::Char('k') | KeyCode::Up => app.prev(),
        KeyCode::Enter => {
            if let Some(id) = app.cursor_id().map(str::to_string) {
                query.select_source(&id);
                app.info(format!("selected source: {id}"));
            }
        }
        KeyCode::Char(' ') => control(Control::PlayPause, app, query),
        KeyCode::Char('S') => control(Control::Stop, app, query),
        KeyCode::Char('l') => control(Control::Next, app, query),
        KeyCode::Char('h') => control(Control::Previous, app, query),
        KeyCode::Char('+') | KeyCode::Char('=') => control(Control::VolumeUp, app, query),
        KeyCode::Char('-') => control(Control::VolumeDown, app, query),
        KeyCode::Char('m') => control(Control::VolumeMute, app, query),
        KeyCode::Char(']') => target(TargetStep::Next, app, query),
        KeyCode::Char('[') => target(TargetStep::Previous, app, query),
        KeyCode::Char('c') => toggle_cover_download(app, query),
        KeyCode::Char('K') => app.toggle_metadata_window(),
        KeyCode::Esc => {
            app.metadata_window = false;
            app.clear_notice();
        }
        _ => {}
    }
    false
}

fn control(control: Control, app: &mut App, query: &QueryThread) {
    if !app.supports(control) {
        app.error(format!("{control:?} is not supported by this source"));
        return;
    }
    if query.execute(control) {
        app.clear_notice();
    } else {
        debug!(?control, "control failed");
        app.error(format!("{control:?} failed"));
    }
}

fn toggle_cover_download(app: &mut App, query: &QueryThread) {
    let settings = query.settings();
    let download_cover = !settings.download_cover;
    query.set_settings(QuerySettings {
        download_cover,
        ..settings
    });
    app.info(if download_cover {
        "cover download on"
    } else {
        "cover download off"
    });
}

fn target(step: TargetStep, app: &mut App, query: &QueryThread) {
    if query.switch_target(step) {
        app.info("switched player target");
    } else {
        app.error("no other player mapped for this scene");
    }
}
