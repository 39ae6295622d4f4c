//! `{placeholder}` templates for file outputs.

use std::time::Duration;

use crate::song::Song;

/// Format milliseconds as `M:SS`, or `H:MM:SS` past the hour.
pub fn format_clock(ms: u64) -> String {
    let secs = Duration::from_millis(ms).as_secs();
    let (h, m, s) = (secs / 3600, (secs / 60) % 60, secs % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

fn number(n: impl Into<u64>) -> String {
    match n.into() {
        0 => String::new(),
        n => n.to_string(),
    }
}

fn placeholder(name: &str, song: &Song) -> Option<String> {
    let value = match name {
        "title" => song.title().to_string(),
        "artists" => song.artists_joined(", "),
        "artist" => song.artists().first().cloned().unwrap_or_default(),
        "album" => song.album().to_string(),
        "label" => song.label().to_string(),
        "year" => number(song.year()),
        "month" => number(song.month()),
        "day" => number(song.day()),
        "track" => number(song.track_number()),
        "disc" => number(song.disc_number()),
        "duration" => format_clock(song.duration_ms()),
        "progress" => format_clock(song.progress_ms()),
        "remaining" => format_clock(song.duration_ms().saturating_sub(song.progress_ms())),
        "status" => song.state().as_str().to_string(),
        "cover" => song.cover_link().to_string(),
        _ => return None,
    };
    Some(value)
}

/// Render `template` against `song`.
///
/// `{{` and `}}` produce literal braces. Unknown placeholders and an
/// unterminated `{` are copied through unchanged.
pub fn render(template: &str, song: &Song) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }

        let Some(end) = tail.find('}') else {
            out.push_str(tail);
            return out;
        };
        let name = &tail[1..end];
        match placeholder(name, song) {
            Some(value) => out.push_str(&value),
            None => out.push_str(&tail[..=end]),
        }
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}
