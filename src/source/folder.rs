//! Filesystem tag reader.
//!
//! Treats the most recently modified audio file under a directory as the
//! track that is playing. Useful with players or recorders that drop the
//! current file into a known folder.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use lofty::picture::PictureType;
use lofty::prelude::*;
use lofty::tag::{ItemKey, Tag};
use tracing::{debug, info};
use walkdir::WalkDir;

use super::{Capabilities, Control, MusicSource, Refresh, SourceCore};
use crate::config::FolderSettings;
use crate::output::CoverHandler;
use crate::song::{PlayState, Song};

pub const ID: &str = "folder";

/// Sidecar images checked when a file carries no embedded cover.
const SIDECAR_COVERS: [&str; 6] = [
    "cover.jpg",
    "cover.png",
    "Cover.jpg",
    "Cover.png",
    "folder.jpg",
    "folder.png",
];

#[derive(Debug, Clone, PartialEq, Eq)]
struct Seen {
    path: PathBuf,
    modified: SystemTime,
}

pub struct FolderSource {
    core: SourceCore,
    settings: FolderSettings,
    seen: Option<Seen>,
    picture: Option<Vec<u8>>,
}

fn normalized_extensions(settings: &FolderSettings) -> Vec<String> {
    settings
        .extensions
        .iter()
        .map(|e| e.trim().trim_start_matches('.').to_ascii_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}

fn is_audio_file(path: &Path, exts: &[String]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            exts.iter().any(|e| e == &ext)
        })
        .unwrap_or(false)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .map(|name| name.starts_with('.'))
        .unwrap_or(false)
}

/// The newest audio file under `dir`, honoring recursion and depth limits.
fn newest_audio_file(dir: &Path, settings: &FolderSettings) -> Option<Seen> {
    let exts = normalized_extensions(settings);
    let mut walker = WalkDir::new(dir);

    // Non-recursive = only the root directory.
    let depth_cap = if settings.recursive {
        settings.max_depth
    } else {
        Some(1)
    };
    if let Some(d) = depth_cap {
        walker = walker.max_depth(d);
    }

    walker
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e.path()))
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file() && is_audio_file(e.path(), &exts))
        .filter_map(|e| {
            let modified = e.metadata().ok()?.modified().ok()?;
            Some(Seen {
                path: e.into_path(),
                modified,
            })
        })
        .max_by(|a, b| {
            a.modified
                .cmp(&b.modified)
                .then_with(|| b.path.cmp(&a.path))
        })
}

fn item_text(tag: &Tag, matches: impl Fn(&ItemKey) -> bool) -> Option<String> {
    tag.items()
        .find(|item| matches(&item.key()))
        .and_then(|item| item.value().text())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn embedded_cover(tag: &Tag) -> Option<Vec<u8>> {
    tag.get_picture_type(PictureType::CoverFront)
        .or_else(|| {
            tag.pictures()
                .iter()
                .find(|p| matches!(p.pic_type(), PictureType::Other | PictureType::CoverBack))
        })
        .map(|p| p.data().to_vec())
}

fn sidecar_cover(path: &Path) -> Option<PathBuf> {
    let dir = path.parent()?;
    SIDECAR_COVERS
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

impl FolderSource {
    pub fn new(settings: FolderSettings) -> Self {
        Self {
            core: SourceCore::new(
                ID,
                "Folder tag reader",
                Capabilities::METADATA | Capabilities::DURATION | Capabilities::STATUS,
            ),
            settings,
            seen: None,
            picture: None,
        }
    }

    fn go_inactive(&mut self) -> Refresh {
        if let Some(seen) = self.seen.take() {
            info!(path = %seen.path.display(), "folder source lost its track");
        }
        self.picture = None;
        self.core.reset();
        Refresh::Inactive
    }

    fn read_track(&mut self, seen: &Seen) {
        let path = &seen.path;
        let song = &mut self.core.current;
        song.clear();
        song.set_state(PlayState::Playing);
        self.picture = None;

        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("UNKNOWN")
            .to_string();
        song.set_title(stem);

        match lofty::read_from_path(path) {
            Ok(tagged) => {
                song.set_duration_ms(
                    u64::try_from(tagged.properties().duration().as_millis()).unwrap_or(u64::MAX),
                );

                if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
                    if let Some(title) = tag.title() {
                        let title = title.trim();
                        if !title.is_empty() {
                            song.set_title(title);
                        }
                    }
                    if let Some(artist) = tag.artist() {
                        // Multi-artist frames are commonly joined with ';' or '/'.
                        for part in artist.split([';', '/']) {
                            song.append_artist(part.trim());
                        }
                    }
                    if let Some(album) = tag.album() {
                        song.set_album(album.trim());
                    }
                    if let Some(n) = tag.track() {
                        song.set_track_number(n);
                    }
                    if let Some(n) = tag.disk() {
                        song.set_disc_number(n);
                    }
                    if let Some(label) =
                        item_text(tag, |k| matches!(k, ItemKey::Label | ItemKey::Publisher))
                    {
                        song.set_label(label);
                    }
                    if let Some(date) = item_text(tag, |k| {
                        matches!(k, ItemKey::ReleaseDate | ItemKey::RecordingDate)
                    }) {
                        song.set_release_date(&date);
                    }
                    self.picture = embedded_cover(tag);
                }
            }
            Err(e) => debug!(path = %path.display(), "no readable tags: {e}"),
        }

        if self.picture.is_some() {
            song.set_cover_link(path.to_string_lossy());
        } else if let Some(cover) = sidecar_cover(path) {
            song.set_cover_link(cover.to_string_lossy());
        }
    }
}

impl MusicSource for FolderSource {
    fn id(&self) -> &str {
        self.core.id()
    }

    fn name(&self) -> &str {
        self.core.name()
    }

    fn capabilities(&self) -> Capabilities {
        self.core.capabilities()
    }

    fn enabled(&self) -> bool {
        self.settings.path.is_some()
    }

    fn refresh(&mut self) -> Refresh {
        let Some(dir) = self.settings.path.clone() else {
            return self.go_inactive();
        };
        if !dir.is_dir() {
            return self.go_inactive();
        }
        let Some(newest) = newest_audio_file(&dir, &self.settings) else {
            return self.go_inactive();
        };

        // Tags are only re-read when the file changed.
        if self.seen.as_ref() != Some(&newest) {
            debug!(path = %newest.path.display(), "folder source reading tags");
            self.read_track(&newest);
            self.seen = Some(newest);
        }
        Refresh::Active
    }

    fn song_info(&self) -> Song {
        self.core.current.clone()
    }

    fn reset_info(&mut self) {
        self.seen = None;
        self.picture = None;
        self.core.reset();
    }

    fn execute_capability(&mut self, _control: Control) -> bool {
        false
    }

    fn handle_cover(&mut self, covers: &mut dyn CoverHandler, song: &Song) {
        match &self.picture {
            Some(bytes) => covers.store(song.cover_link(), bytes),
            None => covers.fetch(song),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::Duration;
    use tempfile::tempdir;

    fn settings(dir: &Path) -> FolderSettings {
        FolderSettings {
            path: Some(dir.to_path_buf()),
            ..FolderSettings::default()
        }
    }

    fn touch(path: &Path, secs_after_epoch: u64) {
        fs::write(path, b"not real audio").unwrap();
        let when = SystemTime::UNIX_EPOCH + Duration::from_secs(secs_after_epoch);
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(when)
            .unwrap();
    }

    #[derive(Default)]
    struct Recorder {
        fetched: Vec<String>,
        stored: Vec<(String, usize)>,
    }

    impl CoverHandler for Recorder {
        fn fetch(&mut self, song: &Song) {
            self.fetched.push(song.cover_link().to_string());
        }

        fn store(&mut self, key: &str, bytes: &[u8]) {
            self.stored.push((key.to_string(), bytes.len()));
        }

        fn reset(&mut self) {}
    }

    #[test]
    fn is_audio_file_matches_configured_extensions_case_insensitive() {
        let exts = normalized_extensions(&FolderSettings::default());
        assert!(is_audio_file(Path::new("/tmp/a.mp3"), &exts));
        assert!(is_audio_file(Path::new("/tmp/a.FLAC"), &exts));
        assert!(!is_audio_file(Path::new("/tmp/a.txt"), &exts));
        assert!(!is_audio_file(Path::new("/tmp/a"), &exts));
    }

    #[test]
    fn newest_file_wins_and_title_falls_back_to_stem() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("old.mp3"), 1_000);
        touch(&dir.path().join("new.ogg"), 2_000);
        touch(&dir.path().join("newer.txt"), 3_000);

        let mut src = FolderSource::new(settings(dir.path()));
        assert!(src.enabled());
        assert_eq!(src.refresh(), Refresh::Active);

        let song = src.song_info();
        assert_eq!(song.title(), "new");
        assert_eq!(song.state(), PlayState::Playing);
    }

    #[test]
    fn a_newer_file_replaces_the_track() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("first.mp3"), 1_000);

        let mut src = FolderSource::new(settings(dir.path()));
        src.refresh();
        assert_eq!(src.song_info().title(), "first");

        touch(&dir.path().join("second.mp3"), 5_000);
        src.refresh();
        assert_eq!(src.song_info().title(), "second");
    }

    #[test]
    fn unchanged_file_keeps_snapshot() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("track.mp3"), 1_000);

        let mut src = FolderSource::new(settings(dir.path()));
        src.refresh();
        src.core.current.set_album("kept");
        src.refresh();
        assert_eq!(src.song_info().album(), "kept");
    }

    #[test]
    fn empty_or_missing_directory_is_inactive() {
        let dir = tempdir().unwrap();
        let mut src = FolderSource::new(settings(dir.path()));
        assert_eq!(src.refresh(), Refresh::Inactive);
        assert_eq!(src.song_info(), Song::stopped());

        let mut missing = FolderSource::new(settings(&dir.path().join("nope")));
        assert_eq!(missing.refresh(), Refresh::Inactive);

        let mut unset = FolderSource::new(FolderSettings::default());
        assert!(!unset.enabled());
        assert_eq!(unset.refresh(), Refresh::Inactive);
    }

    #[test]
    fn non_recursive_ignores_subdirectories() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("root.mp3"), 1_000);
        let sub = dir.path().join("sub");
        fs::create_dir_all(&sub).unwrap();
        touch(&sub.join("child.mp3"), 9_000);

        let mut src = FolderSource::new(FolderSettings {
            recursive: false,
            ..settings(dir.path())
        });
        src.refresh();
        assert_eq!(src.song_info().title(), "root");

        let mut deep = FolderSource::new(settings(dir.path()));
        deep.refresh();
        assert_eq!(deep.song_info().title(), "child");
    }

    #[test]
    fn hidden_files_are_skipped() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("visible.mp3"), 1_000);
        touch(&dir.path().join(".partial.mp3"), 9_000);

        let mut src = FolderSource::new(settings(dir.path()));
        src.refresh();
        assert_eq!(src.song_info().title(), "visible");
    }

    #[test]
    fn sidecar_cover_is_forwarded_to_handler() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("track.mp3"), 1_000);
        fs::write(dir.path().join("cover.jpg"), b"jpeg").unwrap();

        let mut src = FolderSource::new(settings(dir.path()));
        src.refresh();
        let song = src.song_info();
        let mut covers = Recorder::default();
        src.handle_cover(&mut covers, &song);

        assert!(covers.stored.is_empty());
        assert_eq!(covers.fetched.len(), 1);
        assert!(covers.fetched[0].ends_with("cover.jpg"));
    }

    #[test]
    fn transport_controls_are_refused() {
        let dir = tempdir().unwrap();
        let mut src = FolderSource::new(settings(dir.path()));
        assert!(!src.execute_capability(Control::PlayPause));
        assert!(!src.execute_capability(Control::Next));
    }
}
