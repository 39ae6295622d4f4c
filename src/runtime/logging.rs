use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::EnvFilter;

use crate::config::{LogSettings, default_state_dir};

/// Route `tracing` output to `tunetap.log`; the terminal belongs to the UI.
///
/// The returned guard flushes the writer on drop and must outlive the run.
/// Logging is skipped (with a note on stderr) when no log file can be
/// opened.
pub fn init(settings: &LogSettings) -> Option<WorkerGuard> {
    let Some(dir) = settings.dir.clone().or_else(default_state_dir) else {
        eprintln!("tunetap: no log directory (HOME unset?), logging disabled");
        return None;
    };

    let appender = fs::create_dir_all(&dir)
        .map_err(|e| e.to_string())
        .and_then(|()| {
            RollingFileAppender::builder()
                .rotation(Rotation::NEVER)
                .filename_prefix("tunetap")
                .filename_suffix("log")
                .build(&dir)
                .map_err(|e| e.to_string())
        });
    let appender = match appender {
        Ok(a) => a,
        Err(e) => {
            eprintln!("tunetap: cannot open log in {}: {e}", dir.display());
            return None;
        }
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter));
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_thread_names(true)
        .with_writer(writer)
        .try_init();
    Some(guard)
}
