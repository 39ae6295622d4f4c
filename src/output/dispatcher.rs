use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use tracing::{debug, warn};

use super::OutputDispatcher;
use super::render;
use crate::config::OutputSettings;
use crate::error::OutputError;
use crate::song::{PlayState, Song};

struct FileOutput {
    settings: OutputSettings,
    /// Text last written, for overwrite outputs.
    written: Option<String>,
    /// Track last appended, for log outputs.
    logged: Option<Song>,
}

/// Renders every snapshot into the configured files.
pub struct FileOutputs {
    outputs: Vec<FileOutput>,
    placeholder: String,
}

fn ensure_parent(path: &Path) -> Result<(), OutputError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn overwrite(path: &Path, text: &str) -> Result<(), OutputError> {
    ensure_parent(path)?;
    fs::write(path, text)?;
    Ok(())
}

fn append_line(path: &Path, line: &str) -> Result<(), OutputError> {
    ensure_parent(path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")?;
    Ok(())
}

impl FileOutput {
    fn write_current(&mut self, song: &Song, placeholder: &str) {
        let text = if song.is_playing_something() {
            render(&self.settings.format, song)
        } else {
            placeholder.to_string()
        };
        if self.written.as_deref() == Some(text.as_str()) {
            return;
        }
        match overwrite(&self.settings.path, &text) {
            Ok(()) => self.written = Some(text),
            Err(e) => warn!(path = %self.settings.path.display(), "output write failed: {e}"),
        }
    }

    fn log_new_track(&mut self, song: &Song) {
        if song.state() != PlayState::Playing || !song.is_playing_something() {
            return;
        }
        if self.logged.as_ref().is_some_and(|last| last.same_track(song)) {
            return;
        }
        let line = render(&self.settings.format, song);
        match append_line(&self.settings.path, &line) {
            Ok(()) => {
                debug!(path = %self.settings.path.display(), "logged track: {line}");
                self.logged = Some(song.clone());
            }
            Err(e) => warn!(path = %self.settings.path.display(), "output append failed: {e}"),
        }
    }
}

impl FileOutputs {
    pub fn new(outputs: Vec<OutputSettings>, placeholder: impl Into<String>) -> Self {
        Self {
            outputs: outputs
                .into_iter()
                .map(|settings| FileOutput {
                    settings,
                    written: None,
                    logged: None,
                })
                .collect(),
            placeholder: placeholder.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.outputs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outputs.is_empty()
    }
}

impl OutputDispatcher for FileOutputs {
    fn dispatch(&mut self, song: &Song) {
        for output in &mut self.outputs {
            if output.settings.log_mode {
                output.log_new_track(song);
            } else {
                output.write_current(song, &self.placeholder);
            }
        }
    }
}
