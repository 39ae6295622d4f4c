use super::*;
use super::bus::play_state_from_status;
use crate::error::SourceError;
use std::sync::{Arc, Mutex};
use zvariant::{OwnedValue, Value};

#[derive(Default)]
struct FakeState {
    players: Vec<String>,
    statuses: HashMap<String, PlayState>,
    metadata: HashMap<String, TrackMetadata>,
    position_us: i64,
    volume: f64,
    bound: Option<String>,
    binds: Vec<String>,
    calls: Vec<String>,
}

#[derive(Clone, Default)]
struct FakeBus {
    state: Arc<Mutex<FakeState>>,
    offline: bool,
}

impl FakeBus {
    fn with_players(players: &[&str]) -> Self {
        let bus = FakeBus::default();
        {
            let mut s = bus.state.lock().unwrap();
            for p in players {
                s.players.push(p.to_string());
                s.statuses.insert(p.to_string(), PlayState::Playing);
            }
            s.volume = 0.5;
        }
        bus
    }

    fn set_meta(&self, player: &str, title: &str) {
        let mut s = self.state.lock().unwrap();
        s.metadata.insert(
            player.to_string(),
            TrackMetadata {
                title: Some(title.to_string()),
                artists: vec!["Artist".to_string()],
                length_us: Some(200_000_000),
                ..TrackMetadata::default()
            },
        );
    }

    fn remove_player(&self, player: &str) {
        let mut s = self.state.lock().unwrap();
        s.players.retain(|p| p != player);
    }

    fn live_bound(&self) -> Result<String, SourceError> {
        let s = self.state.lock().unwrap();
        let bound = s.bound.clone().ok_or(SourceError::Unbound)?;
        if !s.players.contains(&bound) {
            return Err(SourceError::Vanished(bound));
        }
        Ok(bound)
    }
}

impl PlayerBus for FakeBus {
    fn connected(&self) -> bool {
        !self.offline
    }

    fn player_names(&mut self) -> Result<Vec<String>, SourceError> {
        Ok(self.state.lock().unwrap().players.clone())
    }

    fn bind(&mut self, bus_name: &str) -> Result<(), SourceError> {
        let mut s = self.state.lock().unwrap();
        s.bound = Some(bus_name.to_string());
        s.binds.push(bus_name.to_string());
        Ok(())
    }

    fn release(&mut self) {
        self.state.lock().unwrap().bound = None;
    }

    fn status(&mut self) -> Result<PlayState, SourceError> {
        let bound = self.live_bound()?;
        let s = self.state.lock().unwrap();
        Ok(s.statuses.get(&bound).copied().unwrap_or(PlayState::Unknown))
    }

    fn position_us(&mut self) -> Result<i64, SourceError> {
        self.live_bound()?;
        Ok(self.state.lock().unwrap().position_us)
    }

    fn metadata(&mut self) -> Result<TrackMetadata, SourceError> {
        let bound = self.live_bound()?;
        let s = self.state.lock().unwrap();
        Ok(s.metadata.get(&bound).cloned().unwrap_or_default())
    }

    fn call(&mut self, method: &str) -> Result<(), SourceError> {
        self.live_bound()?;
        self.state.lock().unwrap().calls.push(method.to_string());
        Ok(())
    }

    fn volume(&mut self) -> Result<f64, SourceError> {
        self.live_bound()?;
        Ok(self.state.lock().unwrap().volume)
    }

    fn set_volume(&mut self, volume: f64) -> Result<(), SourceError> {
        self.live_bound()?;
        self.state.lock().unwrap().volume = volume;
        Ok(())
    }
}

const VLC: &str = "org.mpris.MediaPlayer2.vlc";
const SPOTIFY: &str = "org.mpris.MediaPlayer2.spotify";

fn mapping(entries: &[(&str, &[&str])]) -> PlayerMapping {
    PlayerMapping::new(
        entries
            .iter()
            .map(|(scene, targets)| {
                (
                    scene.to_string(),
                    targets.iter().map(|t| t.to_string()).collect(),
                )
            })
            .collect(),
    )
}

fn source(bus: &FakeBus, mapping: PlayerMapping) -> MprisSource<FakeBus> {
    MprisSource::new(
        bus.clone(),
        mapping,
        Box::new(StaticScene("live".to_string())),
    )
}

#[test]
fn matches_player_accepts_short_and_full_names() {
    assert!(matches_player(VLC, "vlc"));
    assert!(matches_player(VLC, "VLC"));
    assert!(matches_player("org.mpris.MediaPlayer2.vlc.instance42", "vlc"));
    assert!(matches_player(VLC, VLC));
    assert!(!matches_player("org.mpris.MediaPlayer2.vlcx", "vlc"));
    assert!(!matches_player(SPOTIFY, "vlc"));
    assert!(!matches_player(VLC, "  "));
}

#[test]
fn mapping_falls_back_to_default_scene() {
    let m = mapping(&[("default", &["spotify"]), ("live", &["vlc", "spotify"])]);
    assert_eq!(m.targets_for("live"), &["vlc".to_string(), "spotify".to_string()]);
    assert_eq!(m.targets_for("other"), &["spotify".to_string()]);
    assert!(PlayerMapping::default().targets_for("live").is_empty());
}

#[test]
fn refresh_populates_snapshot_from_mapped_player() {
    let bus = FakeBus::with_players(&[SPOTIFY, VLC]);
    bus.set_meta(VLC, "From VLC");
    bus.state.lock().unwrap().position_us = 5_000_000;

    let mut src = source(&bus, mapping(&[("live", &["vlc"])]));
    assert_eq!(src.refresh(), Refresh::Active);
    assert_eq!(src.bound_player(), Some(VLC));

    let song = src.song_info();
    assert_eq!(song.state(), PlayState::Playing);
    assert_eq!(song.title(), "From VLC");
    assert_eq!(song.artists(), &["Artist".to_string()]);
    assert_eq!(song.duration_ms(), 200_000);
    assert_eq!(song.progress_ms(), 5_000);
}

#[test]
fn without_mapping_first_player_is_used_and_kept() {
    let bus = FakeBus::with_players(&[SPOTIFY, VLC]);
    let mut src = source(&bus, PlayerMapping::default());

    src.refresh();
    assert_eq!(src.bound_player(), Some(SPOTIFY));

    // A new player sorting first must not steal the binding.
    bus.state
        .lock()
        .unwrap()
        .players
        .insert(0, "org.mpris.MediaPlayer2.audacious".to_string());
    src.refresh();
    assert_eq!(src.bound_player(), Some(SPOTIFY));
    assert_eq!(bus.state.lock().unwrap().binds.len(), 1);
}

#[test]
fn stopped_player_is_not_polled_further() {
    let bus = FakeBus::with_players(&[VLC]);
    bus.set_meta(VLC, "Ignored");
    bus.state
        .lock()
        .unwrap()
        .statuses
        .insert(VLC.to_string(), PlayState::Stopped);

    let mut src = source(&bus, PlayerMapping::default());
    assert_eq!(src.refresh(), Refresh::Active);
    let song = src.song_info();
    assert_eq!(song.state(), PlayState::Stopped);
    assert!(song.title().is_empty());
}

#[test]
fn vanished_player_clears_snapshot_and_releases_handle() {
    let bus = FakeBus::with_players(&[VLC]);
    bus.set_meta(VLC, "Song");
    let mut src = source(&bus, mapping(&[("live", &["vlc"])]));

    assert_eq!(src.refresh(), Refresh::Active);
    assert_eq!(src.song_info().title(), "Song");

    bus.remove_player(VLC);
    assert_eq!(src.refresh(), Refresh::Inactive);
    assert_eq!(src.song_info(), Song::stopped());
    assert_eq!(src.bound_player(), None);
    assert_eq!(bus.state.lock().unwrap().bound, None);

    // The player coming back is picked up again on the next cycle.
    bus.state.lock().unwrap().players.push(VLC.to_string());
    assert_eq!(src.refresh(), Refresh::Active);
    assert_eq!(src.bound_player(), Some(VLC));
}

#[test]
fn scene_change_rebinds_before_polling() {
    let dir = tempfile::tempdir().unwrap();
    let scene_path = dir.path().join("scene");
    std::fs::write(&scene_path, "music\n").unwrap();

    let bus = FakeBus::with_players(&[SPOTIFY, VLC]);
    bus.set_meta(SPOTIFY, "Spotify song");
    bus.set_meta(VLC, "VLC song");

    let mut src = MprisSource::new(
        bus.clone(),
        mapping(&[("music", &["spotify"]), ("video", &["vlc"])]),
        Box::new(SceneFile {
            path: scene_path.clone(),
            fallback: "music".to_string(),
        }),
    );

    src.refresh();
    assert_eq!(src.song_info().title(), "Spotify song");

    std::fs::write(&scene_path, "video\n").unwrap();
    src.refresh();
    assert_eq!(src.bound_player(), Some(VLC));
    assert_eq!(src.song_info().title(), "VLC song");
    assert_eq!(
        bus.state.lock().unwrap().binds,
        vec![SPOTIFY.to_string(), VLC.to_string()]
    );
}

#[test]
fn switch_target_cycles_and_wraps() {
    let bus = FakeBus::with_players(&[SPOTIFY, VLC]);
    let mut src = source(&bus, mapping(&[("live", &["vlc", "spotify"])]));

    src.refresh();
    assert_eq!(src.bound_player(), Some(VLC));

    assert!(src.switch_target(TargetStep::Next));
    src.refresh();
    assert_eq!(src.bound_player(), Some(SPOTIFY));

    assert!(src.switch_target(TargetStep::Next));
    assert_eq!(src.target_index(), 0);

    assert!(src.switch_target(TargetStep::Previous));
    assert_eq!(src.target_index(), 1);
}

#[test]
fn switch_target_without_mapping_is_refused() {
    let bus = FakeBus::with_players(&[VLC]);
    let mut src = source(&bus, PlayerMapping::default());
    assert!(!src.switch_target(TargetStep::Next));
}

#[test]
fn controls_are_distinct_and_need_a_bound_player() {
    let bus = FakeBus::with_players(&[VLC]);
    let mut src = source(&bus, PlayerMapping::default());

    // Nothing bound yet.
    assert!(!src.execute_capability(Control::Next));

    src.refresh();
    assert!(src.execute_capability(Control::PlayPause));
    assert!(src.execute_capability(Control::Stop));
    assert!(src.execute_capability(Control::Next));
    assert_eq!(
        bus.state.lock().unwrap().calls,
        vec!["PlayPause".to_string(), "Stop".to_string(), "Next".to_string()]
    );

    assert!(src.execute_capability(Control::VolumeDown));
    assert!((bus.state.lock().unwrap().volume - 0.45).abs() < 1e-9);
    assert!(src.execute_capability(Control::VolumeMute));
    assert_eq!(bus.state.lock().unwrap().volume, 0.0);
}

#[test]
fn disconnected_bus_disables_source() {
    let bus = FakeBus {
        offline: true,
        ..FakeBus::default()
    };
    let mut src = source(&bus, PlayerMapping::default());
    assert!(!src.enabled());
    assert_eq!(src.refresh(), Refresh::Inactive);
    assert_eq!(src.song_info().state(), PlayState::Stopped);
}

#[test]
fn metadata_map_is_decoded() {
    let mut map: HashMap<String, OwnedValue> = HashMap::new();
    map.insert(
        "xesam:title".into(),
        OwnedValue::try_from(Value::from("Title")).unwrap(),
    );
    map.insert(
        "xesam:artist".into(),
        OwnedValue::try_from(Value::from(vec!["A", "B"])).unwrap(),
    );
    map.insert(
        "mpris:length".into(),
        OwnedValue::try_from(Value::from(180_000_000u64)).unwrap(),
    );
    map.insert(
        "xesam:trackNumber".into(),
        OwnedValue::try_from(Value::from(4i32)).unwrap(),
    );
    map.insert(
        "xesam:discNumber".into(),
        OwnedValue::try_from(Value::from("2/3")).unwrap(),
    );
    map.insert(
        "xesam:album".into(),
        OwnedValue::try_from(Value::from("")).unwrap(),
    );

    let meta = TrackMetadata::from_map(&map);
    assert_eq!(meta.title.as_deref(), Some("Title"));
    assert_eq!(meta.artists, vec!["A".to_string(), "B".to_string()]);
    assert_eq!(meta.length_us, Some(180_000_000));
    assert_eq!(meta.track_number.as_deref(), Some("4"));
    assert_eq!(meta.disc_number.as_deref(), Some("2/3"));
    assert_eq!(meta.album, None);

    let mut song = Song::default();
    apply_metadata(&mut song, &meta);
    assert_eq!(song.track_number(), 4);
    assert_eq!(song.disc_number(), 2);
    assert_eq!(song.duration_ms(), 180_000);
}

#[test]
fn playback_status_strings_map_to_states() {
    assert_eq!(play_state_from_status("Playing"), PlayState::Playing);
    assert_eq!(play_state_from_status("Paused"), PlayState::Paused);
    assert_eq!(play_state_from_status("Stopped"), PlayState::Stopped);
    assert_eq!(play_state_from_status("Buffering"), PlayState::Unknown);
}

#[test]
fn missing_player_errors_mean_vanished() {
    let err = bus::property_error(zbus::fdo::Error::ServiceUnknown("gone".into()), VLC);
    assert!(matches!(err, SourceError::Vanished(ref p) if p == VLC));

    let err = bus::property_error(zbus::fdo::Error::NameHasNoOwner("gone".into()), VLC);
    assert!(matches!(err, SourceError::Vanished(_)));

    let err = bus::property_error(zbus::fdo::Error::Failed("boom".into()), VLC);
    assert!(matches!(err, SourceError::Fdo(_)));
}
