//! UI rendering helpers for the terminal monitor.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::output::format_clock;
use crate::song::Song;
use crate::source::Control;

/// Key bindings shown in the footer, in display order. Bindings tied to a
/// transport control carry the capability the polled source must have.
const CONTROLS: [(&str, &str, Option<Control>); 12] = [
    ("s/x", "start/stop polling", None),
    ("j/k", "up/down", None),
    ("enter", "select source", None),
    ("space", "play/pause", Some(Control::PlayPause)),
    ("S", "stop song", Some(Control::Stop)),
    ("h/l", "prev/next song", Some(Control::Next)),
    ("+/-", "volume", Some(Control::VolumeUp)),
    ("m", "mute", Some(Control::VolumeMute)),
    ("[/]", "prev/next target", None),
    ("c", "cover download", None),
    ("K", "metadata", None),
    ("q", "quit", None),
];

/// Footer line; controls the source cannot run are dimmed.
fn controls_line(app: &App) -> Line<'static> {
    let mut spans = Vec::with_capacity(CONTROLS.len() * 2);
    for (i, (key, what, control)) in CONTROLS.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw(" | "));
        }
        let style = match control {
            Some(c) if !app.supports(*c) => Style::default().fg(Color::DarkGray),
            _ => Style::default(),
        };
        spans.push(Span::styled(format!("[{key}] {what}"), style));
    }
    Line::from(spans)
}

fn left_padding() -> Padding {
    Padding {
        left: 1,
        right: 0,
        top: 0,
        bottom: 0,
    }
}

fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() { "-" } else { s }
}

fn release_text(song: &Song) -> String {
    match (song.year(), song.month(), song.day()) {
        (0, _, _) => "-".to_string(),
        (y, 0, _) => format!("{y}"),
        (y, m, 0) => format!("{y}-{m:02}"),
        (y, m, d) => format!("{y}-{m:02}-{d:02}"),
    }
}

fn status_text(app: &App) -> String {
    let mut parts: Vec<String> = Vec::new();

    parts.push(if app.running {
        " POLLING: Running".to_string()
    } else {
        " POLLING: Stopped".to_string()
    });

    match app.active_source() {
        Some(src) if src.enabled => parts.push(format!("Source: {}", src.name)),
        Some(src) => parts.push(format!("Source: {} (unavailable)", src.name)),
        None => parts.push("Source: none".to_string()),
    }

    parts.push(format!("State: {}", app.now_playing.state().as_str()));

    parts.join(" • ")
}

fn now_playing_text(song: &Song) -> String {
    if !song.is_playing_something() {
        return "Nothing playing".to_string();
    }
    let mut lines = vec![song.title().to_string()];
    let artists = song.artists_joined(", ");
    if !artists.is_empty() {
        lines.push(artists);
    }
    if !song.album().is_empty() {
        lines.push(song.album().to_string());
    }
    lines.join("\n")
}

/// Render the entire UI into `frame`.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(5),
        ])
        .split(frame.area());

    // Status box
    let mut status_lines = status_text(app);
    if let Some(notice) = &app.notice {
        status_lines.push('\n');
        status_lines.push(' ');
        status_lines.push_str(notice.text());
    }
    let status_style = match &app.notice {
        Some(n) if n.is_error() => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let status = Paragraph::new(status_lines)
        .style(status_style)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" tunetap ")
                .title_alignment(Alignment::Center),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[0]);

    // Now playing
    let song = &app.now_playing;
    let now_playing = Paragraph::new(now_playing_text(song))
        .bold()
        .block(Block::bordered().padding(left_padding()).title(" now playing "))
        .wrap(Wrap { trim: true });
    frame.render_widget(now_playing, chunks[1]);

    // Progress
    let label = match song.duration() {
        Some(_) => format!(
            "{} / {}",
            format_clock(song.progress_ms()),
            format_clock(song.duration_ms())
        ),
        None => format_clock(song.progress_ms()),
    };
    let gauge = Gauge::default()
        .block(Block::bordered().title(" progress "))
        .gauge_style(Style::default().add_modifier(Modifier::BOLD))
        .ratio(app.progress_ratio().unwrap_or(0.0))
        .label(label);
    frame.render_widget(gauge, chunks[2]);

    // Source list
    {
        let items: Vec<ListItem> = app
            .sources
            .iter()
            .map(|s| {
                let marker = if s.selected { "●" } else { " " };
                let availability = if s.enabled { "" } else { " (unavailable)" };
                ListItem::new(format!("{marker} {} [{}]{availability}", s.name, s.id))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(" sources "))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if !app.sources.is_empty() {
            state.select(Some(app.cursor));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    // Overlay metadata popup (keeps the source list visible under it)
    if app.metadata_window {
        let popup_area = centered_rect_sized(72, 11, chunks[3]);
        frame.render_widget(Clear, popup_area);

        let meta = format!(
            "Title: {}\nArtists: {}\nAlbum: {}\nLabel: {}\nReleased: {}\nTrack: {} Disc: {}\nCover: {}",
            or_dash(song.title()),
            or_dash(&song.artists_joined(", ")),
            or_dash(song.album()),
            or_dash(song.label()),
            release_text(song),
            song.track_number(),
            song.disc_number(),
            or_dash(song.cover_link()),
        );
        let meta_paragraph = Paragraph::new(meta)
            .block(
                Block::default()
                    .padding(left_padding())
                    .borders(Borders::ALL)
                    .title(" metadata (K closes) "),
            )
            .wrap(Wrap { trim: true });
        frame.render_widget(meta_paragraph, popup_area);
    }

    let footer = Paragraph::new(controls_line(app))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(left_padding()),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}

/// A rectangle of at most `width` x `height`, centered in `area`.
fn centered_rect_sized(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
