use std::env;

use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{error, info, warn};

use crate::app::App;

mod event_loop;
mod logging;
mod settings;
mod startup;

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let (settings, config_problem) = settings::load_settings();
    let _log_guard = logging::init(&settings.log);
    if let Some(problem) = config_problem {
        warn!("{problem}");
    }
    info!(version = env!("CARGO_PKG_VERSION"), "tunetap starting");

    // Optional first argument: source id to poll instead of the configured one.
    let source_override = env::args().nth(1);
    let query = startup::build_query(&settings, source_override.as_deref());
    let mut app = App::new(query.sources());
    if !app.sources.iter().any(|s| s.selected) {
        warn!(source = %query.selected_id(), "selected source is not registered");
    }

    if settings.query.autostart {
        if let Err(e) = query.start() {
            error!("autostart failed: {e}");
            app.error(e.to_string());
        }
    }

    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &mut app, &query);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    query.stop();
    info!("tunetap exiting");
    run_result
}
