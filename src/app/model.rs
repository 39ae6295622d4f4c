//! Application model: `App` and `Notice`.
//!
//! The `App` struct mirrors what the query thread exposes (running flag,
//! latest snapshot, source list) plus the cursor and popups of the monitor.

use crate::song::Song;
use crate::source::{Control, SourceSummary};

/// One-line message shown in the status box.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Self::Info(s) | Self::Error(s) => s,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

/// The main application model.
pub struct App {
    pub sources: Vec<SourceSummary>,
    /// Cursor position in `sources`.
    pub cursor: usize,
    pub running: bool,
    pub now_playing: Song,
    pub notice: Option<Notice>,
    pub metadata_window: bool,
}

impl App {
    pub fn new(sources: Vec<SourceSummary>) -> Self {
        let cursor = sources.iter().position(|s| s.selected).unwrap_or(0);
        Self {
            sources,
            cursor,
            running: false,
            now_playing: Song::stopped(),
            notice: None,
            metadata_window: false,
        }
    }

    /// Refresh the mirrored query-thread state. The cursor stays on the
    /// same source id when the list changes.
    pub fn sync(&mut self, running: bool, now_playing: Song, sources: Vec<SourceSummary>) {
        let under_cursor = self.cursor_id().map(str::to_string);
        self.running = running;
        self.now_playing = now_playing;
        self.sources = sources;
        self.cursor = under_cursor
            .and_then(|id| self.sources.iter().position(|s| s.id == id))
            .unwrap_or_else(|| self.cursor.min(self.sources.len().saturating_sub(1)));
    }

    /// Id of the source under the cursor.
    pub fn cursor_id(&self) -> Option<&str> {
        self.sources.get(self.cursor).map(|s| s.id.as_str())
    }

    /// The source the query thread polls.
    pub fn active_source(&self) -> Option<&SourceSummary> {
        self.sources.iter().find(|s| s.selected)
    }

    /// Whether the polled source advertises `control`.
    pub fn supports(&self, control: Control) -> bool {
        self.active_source()
            .is_some_and(|s| s.capabilities.contains(control.capability()))
    }

    /// Move the cursor down, wrapping to the top.
    pub fn next(&mut self) {
        if !self.sources.is_empty() {
            self.cursor = (self.cursor + 1) % self.sources.len();
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn prev(&mut self) {
        if !self.sources.is_empty() {
            self.cursor = (self.cursor + self.sources.len() - 1) % self.sources.len();
        }
    }

    pub fn toggle_metadata_window(&mut self) {
        self.metadata_window = !self.metadata_window;
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.notice = Some(Notice::Info(msg.into()));
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.notice = Some(Notice::Error(msg.into()));
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Playback position as a ratio in `0.0..=1.0`; `None` without a duration.
    pub fn progress_ratio(&self) -> Option<f64> {
        let duration = self.now_playing.duration_ms();
        if duration == 0 {
            return None;
        }
        Some((self.now_playing.progress_ms() as f64 / duration as f64).clamp(0.0, 1.0))
    }
}
