//! MPRIS (D-Bus) media player source.
//!
//! Which player is polled depends on the current *scene*: a scene maps to
//! an ordered list of player names, and `switch_target` cycles through
//! that list. The target is re-resolved at the top of every refresh, so a
//! scene or mapping change is picked up on the next cycle.

mod bus;

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use tracing::{debug, info, warn};

pub use bus::{BUS_PREFIX, DbusBus, PlayerBus, TrackMetadata};

use super::{Capabilities, Control, MusicSource, Refresh, SourceCore, TargetStep};
use crate::config::MprisSettings;
use crate::error::SourceError;
use crate::song::{PlayState, Song};

pub const ID: &str = "mpris";

/// Scene used when the mapping has no entry for the current scene.
pub const DEFAULT_SCENE: &str = "default";

/// Yields the name of the scene that is currently active.
pub trait SceneProvider: Send {
    fn current_scene(&self) -> String;
}

/// A fixed scene name.
pub struct StaticScene(pub String);

impl SceneProvider for StaticScene {
    fn current_scene(&self) -> String {
        self.0.clone()
    }
}

/// Reads the scene name from the first line of a file, so another program
/// (a streaming tool, a window manager hook) can switch scenes.
pub struct SceneFile {
    pub path: PathBuf,
    pub fallback: String,
}

impl SceneProvider for SceneFile {
    fn current_scene(&self) -> String {
        match fs::read_to_string(&self.path) {
            Ok(text) => text
                .lines()
                .next()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.fallback.clone()),
            Err(e) => {
                debug!(path = %self.path.display(), "scene file unreadable: {e}");
                self.fallback.clone()
            }
        }
    }
}

/// Scene name -> ordered player names.
#[derive(Debug, Clone, Default)]
pub struct PlayerMapping {
    scenes: HashMap<String, Vec<String>>,
}

impl PlayerMapping {
    pub fn new(scenes: HashMap<String, Vec<String>>) -> Self {
        Self { scenes }
    }

    /// Targets for `scene`, falling back to the default scene.
    pub fn targets_for(&self, scene: &str) -> &[String] {
        self.scenes
            .get(scene)
            .or_else(|| self.scenes.get(DEFAULT_SCENE))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Whether `bus_name` belongs to the player called `target`.
///
/// `target` may be a full bus name or just the player part, e.g. `vlc`
/// matches `org.mpris.MediaPlayer2.vlc` and
/// `org.mpris.MediaPlayer2.vlc.instance4242`.
pub fn matches_player(bus_name: &str, target: &str) -> bool {
    let target = target.trim();
    if target.is_empty() {
        return false;
    }
    if bus_name.eq_ignore_ascii_case(target) {
        return true;
    }
    let Some(player) = bus_name.strip_prefix(BUS_PREFIX) else {
        return false;
    };
    let target = target.strip_prefix(BUS_PREFIX).unwrap_or(target);
    let player = player.to_ascii_lowercase();
    let target = target.to_ascii_lowercase();
    player == target || player.starts_with(&format!("{target}."))
}

pub struct MprisSource<B = DbusBus> {
    core: SourceCore,
    bus: B,
    mapping: PlayerMapping,
    scenes: Box<dyn SceneProvider>,
    scene: String,
    index: usize,
    bound: Option<String>,
}

impl MprisSource<DbusBus> {
    pub fn from_settings(settings: &MprisSettings) -> Self {
        let scenes: Box<dyn SceneProvider> = match &settings.scene_file {
            Some(path) => Box::new(SceneFile {
                path: path.clone(),
                fallback: settings.scene.clone(),
            }),
            None => Box::new(StaticScene(settings.scene.clone())),
        };
        let bus = if cfg!(target_os = "linux") {
            DbusBus::connect(settings.call_timeout())
        } else {
            DbusBus::disconnected()
        };
        Self::new(bus, PlayerMapping::new(settings.mappings.clone()), scenes)
    }
}

impl<B: PlayerBus> MprisSource<B> {
    pub fn new(bus: B, mapping: PlayerMapping, scenes: Box<dyn SceneProvider>) -> Self {
        Self {
            core: SourceCore::new(
                ID,
                "MPRIS media player",
                Capabilities::TITLE
                    | Capabilities::ARTIST
                    | Capabilities::ALBUM
                    | Capabilities::RELEASE
                    | Capabilities::TRACK_NUMBER
                    | Capabilities::COVER
                    | Capabilities::DURATION
                    | Capabilities::PROGRESS
                    | Capabilities::STATUS
                    | Capabilities::VOLUME
                    | Capabilities::TRANSPORT,
            ),
            bus,
            mapping,
            scenes,
            scene: String::new(),
            index: 0,
            bound: None,
        }
    }

    /// Bus name of the bound player, if any.
    #[cfg(test)]
    pub fn bound_player(&self) -> Option<&str> {
        self.bound.as_deref()
    }

    #[cfg(test)]
    pub fn target_index(&self) -> usize {
        self.index
    }

    /// Resolve which player should be polled given the live bus names.
    fn resolve_target(&mut self, names: &[String]) -> Option<String> {
        let scene = self.scenes.current_scene();
        if scene != self.scene {
            debug!(scene = %scene, "scene changed");
            self.scene = scene;
        }

        let targets = self.mapping.targets_for(&self.scene);
        if targets.is_empty() {
            // No mapping: stick with the bound player while it lives,
            // otherwise take the first one on the bus.
            if let Some(bound) = &self.bound {
                if names.contains(bound) {
                    return Some(bound.clone());
                }
            }
            return names.first().cloned();
        }

        self.index = self.index.min(targets.len() - 1);
        let target = &targets[self.index];
        names.iter().find(|n| matches_player(n, target)).cloned()
    }

    fn unbind(&mut self) {
        if self.bound.take().is_some() {
            self.bus.release();
        }
    }

    /// Release everything and report an empty, stopped snapshot.
    fn go_inactive(&mut self) -> Refresh {
        self.unbind();
        self.core.reset();
        Refresh::Inactive
    }

    /// Re-bind when the resolved target differs from the bound one.
    fn reload(&mut self) -> bool {
        if !self.bus.connected() {
            return false;
        }

        let names = match self.bus.player_names() {
            Ok(names) => names,
            Err(e) => {
                warn!("MPRIS: failed to list players: {e}");
                return false;
            }
        };

        let Some(target) = self.resolve_target(&names) else {
            if let Some(old) = &self.bound {
                info!(player = %old, scene = %self.scene, "MPRIS target is gone");
            }
            return false;
        };

        if self.bound.as_deref() == Some(target.as_str()) {
            return true;
        }

        self.unbind();
        match self.bus.bind(&target) {
            Ok(()) => {
                info!(player = %target, scene = %self.scene, "MPRIS target bound");
                self.bound = Some(target);
                true
            }
            Err(e) => {
                warn!(player = %target, "MPRIS: failed to bind player: {e}");
                false
            }
        }
    }

    fn populate(&mut self) -> Refresh {
        let state = match self.bus.status() {
            Ok(state) => state,
            Err(SourceError::Vanished(player)) => {
                info!(player = %player, "MPRIS player left the bus");
                return self.go_inactive();
            }
            Err(e) => {
                warn!("MPRIS: player stopped answering: {e}");
                return self.go_inactive();
            }
        };

        let song = &mut self.core.current;
        song.clear();
        song.set_state(state);

        // Nothing more to ask a stopped player.
        if state == PlayState::Stopped {
            return Refresh::Active;
        }

        match self.bus.metadata() {
            Ok(meta) => apply_metadata(song, &meta),
            Err(e) => debug!("MPRIS: failed to retrieve metadata: {e}"),
        }

        match self.bus.position_us() {
            Ok(us) => song.set_progress_ms(micros_to_millis(us)),
            Err(e) => debug!("MPRIS: failed to retrieve position: {e}"),
        }

        Refresh::Active
    }

    fn run_control(&mut self, control: Control) -> Result<(), SourceError> {
        match control {
            Control::PlayPause => self.bus.call("PlayPause"),
            Control::Stop => self.bus.call("Stop"),
            Control::Next => self.bus.call("Next"),
            Control::Previous => self.bus.call("Previous"),
            Control::VolumeUp => {
                let v = self.bus.volume()?;
                self.bus.set_volume((v * 1.1).max(0.05))
            }
            Control::VolumeDown => {
                let v = self.bus.volume()?;
                self.bus.set_volume(v * 0.9)
            }
            Control::VolumeMute => self.bus.set_volume(0.0),
        }
    }
}

fn micros_to_millis(us: i64) -> u64 {
    u64::try_from(us).unwrap_or(0) / 1000
}

fn apply_metadata(song: &mut Song, meta: &TrackMetadata) {
    if let Some(title) = &meta.title {
        song.set_title(title.as_str());
    }
    for artist in &meta.artists {
        song.append_artist(artist.as_str());
    }
    if let Some(album) = &meta.album {
        song.set_album(album.as_str());
    }
    if let Some(url) = &meta.art_url {
        song.set_cover_link(url.as_str());
    }
    if let Some(date) = &meta.release {
        song.set_release_date(date);
    }
    if let Some(n) = &meta.track_number {
        song.set_track_number_str(n);
    }
    if let Some(n) = &meta.disc_number {
        song.set_disc_number_str(n);
    }
    if let Some(us) = meta.length_us {
        song.set_duration_ms(micros_to_millis(us));
    }
}

impl<B: PlayerBus> MusicSource for MprisSource<B> {
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
        self.bus.connected()
    }

    fn refresh(&mut self) -> Refresh {
        if !self.reload() {
            return self.go_inactive();
        }
        self.populate()
    }

    fn song_info(&self) -> Song {
        self.core.current.clone()
    }

    fn reset_info(&mut self) {
        self.core.reset();
    }

    fn execute_capability(&mut self, control: Control) -> bool {
        if !self.core.supports(control) || self.bound.is_none() {
            return false;
        }
        match self.run_control(control) {
            Ok(()) => true,
            Err(e) => {
                warn!(?control, "MPRIS: control failed: {e}");
                false
            }
        }
    }

    fn switch_target(&mut self, step: TargetStep) -> bool {
        let len = self.mapping.targets_for(&self.scene).len();
        if len == 0 {
            return false;
        }
        let current = self.index.min(len - 1);
        self.index = match step {
            TargetStep::Next => (current + 1) % len,
            TargetStep::Previous => (current + len - 1) % len,
        };
        debug!(index = self.index, scene = %self.scene, "switched MPRIS target");
        true
    }
}

#[cfg(test)]
mod tests;
