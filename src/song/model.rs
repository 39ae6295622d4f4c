//! `Song` and `PlayState`.

use std::time::Duration;

/// Playback state reported by a source.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum PlayState {
    Playing,
    Paused,
    Stopped,
    #[default]
    Unknown,
}

impl PlayState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Unknown => "unknown",
        }
    }
}

/// Point-in-time "now playing" metadata.
///
/// Numeric fields use `0` for "unknown". Text fields use the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Song {
    title: String,
    artists: Vec<String>,
    album: String,
    label: String,
    year: u16,
    month: u8,
    day: u8,
    track_number: u32,
    disc_number: u32,
    duration_ms: u64,
    progress_ms: u64,
    cover_link: String,
    state: PlayState,
}

impl Song {
    /// An empty snapshot in the `Stopped` state.
    pub fn stopped() -> Self {
        Self {
            state: PlayState::Stopped,
            ..Self::default()
        }
    }

    /// Reset every field; the state becomes `Unknown`.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn set_state(&mut self, state: PlayState) {
        self.state = state;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn append_artist(&mut self, artist: impl Into<String>) {
        let artist = artist.into();
        if !artist.trim().is_empty() {
            self.artists.push(artist);
        }
    }

    pub fn set_album(&mut self, album: impl Into<String>) {
        self.album = album.into();
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn set_cover_link(&mut self, link: impl Into<String>) {
        self.cover_link = link.into();
    }

    pub fn set_track_number(&mut self, n: u32) {
        self.track_number = n;
    }

    pub fn set_disc_number(&mut self, n: u32) {
        self.disc_number = n;
    }

    /// Parse a track number such as `"7"` or `"7/12"`. Malformed input yields 0.
    pub fn set_track_number_str(&mut self, raw: &str) {
        self.track_number = parse_leading_number(raw);
    }

    /// Parse a disc number such as `"1"` or `"1/2"`. Malformed input yields 0.
    pub fn set_disc_number_str(&mut self, raw: &str) {
        self.disc_number = parse_leading_number(raw);
    }

    /// Parse `YYYY`, `YYYY-MM` or `YYYY-MM-DD` (timestamps after the date are
    /// ignored). Components that fail to parse are left at 0.
    pub fn set_release_date(&mut self, raw: &str) {
        let date = raw.trim().split(['T', ' ']).next().unwrap_or_default();
        let mut parts = date.split(['-', '/', '.']);
        self.year = parts.next().and_then(|p| p.trim().parse().ok()).unwrap_or(0);
        self.month = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .filter(|m| (1..=12).contains(m))
            .unwrap_or(0);
        self.day = parts
            .next()
            .and_then(|p| p.trim().parse().ok())
            .filter(|d| (1..=31).contains(d))
            .unwrap_or(0);
    }

    /// Set the track length. A progress beyond the new length is clamped.
    pub fn set_duration_ms(&mut self, ms: u64) {
        self.duration_ms = ms;
        if ms > 0 && self.progress_ms > ms {
            self.progress_ms = ms;
        }
    }

    /// Set the playback position, clamped to the duration when it is known.
    pub fn set_progress_ms(&mut self, ms: u64) {
        self.progress_ms = if self.duration_ms > 0 {
            ms.min(self.duration_ms)
        } else {
            ms
        };
    }

    pub fn state(&self) -> PlayState {
        self.state
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn artists(&self) -> &[String] {
        &self.artists
    }

    pub fn artists_joined(&self, sep: &str) -> String {
        self.artists.join(sep)
    }

    pub fn album(&self) -> &str {
        &self.album
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn year(&self) -> u16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    pub fn day(&self) -> u8 {
        self.day
    }

    pub fn track_number(&self) -> u32 {
        self.track_number
    }

    pub fn disc_number(&self) -> u32 {
        self.disc_number
    }

    pub fn cover_link(&self) -> &str {
        &self.cover_link
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn progress_ms(&self) -> u64 {
        self.progress_ms
    }

    pub fn duration(&self) -> Option<Duration> {
        (self.duration_ms > 0).then(|| Duration::from_millis(self.duration_ms))
    }

    /// Playing or paused with at least a title.
    pub fn is_playing_something(&self) -> bool {
        matches!(self.state, PlayState::Playing | PlayState::Paused) && !self.title.is_empty()
    }

    /// Whether both snapshots describe the same track, ignoring position/state.
    pub fn same_track(&self, other: &Song) -> bool {
        self.title == other.title && self.artists == other.artists && self.album == other.album
    }
}

fn parse_leading_number(raw: &str) -> u32 {
    raw.trim()
        .split('/')
        .next()
        .and_then(|n| n.trim().parse().ok())
        .unwrap_or(0)
}
