//! Capability flags and transport controls.

use bitflags::bitflags;

bitflags! {
    /// What a source can report or control. Fixed when the source is built.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct Capabilities: u32 {
        const TITLE = 1 << 0;
        const ARTIST = 1 << 1;
        const ALBUM = 1 << 2;
        const LABEL = 1 << 3;
        const RELEASE = 1 << 4;
        const TRACK_NUMBER = 1 << 5;
        const COVER = 1 << 6;
        const DURATION = 1 << 7;
        const PROGRESS = 1 << 8;
        const STATUS = 1 << 9;
        const VOLUME_UP = 1 << 10;
        const VOLUME_DOWN = 1 << 11;
        const VOLUME_MUTE = 1 << 12;
        const PLAY_PAUSE = 1 << 13;
        const STOP_SONG = 1 << 14;
        const NEXT_SONG = 1 << 15;
        const PREV_SONG = 1 << 16;

        const METADATA = Self::TITLE.bits()
            | Self::ARTIST.bits()
            | Self::ALBUM.bits()
            | Self::LABEL.bits()
            | Self::RELEASE.bits()
            | Self::TRACK_NUMBER.bits()
            | Self::COVER.bits();
        const TRANSPORT = Self::PLAY_PAUSE.bits()
            | Self::STOP_SONG.bits()
            | Self::NEXT_SONG.bits()
            | Self::PREV_SONG.bits();
        const VOLUME = Self::VOLUME_UP.bits()
            | Self::VOLUME_DOWN.bits()
            | Self::VOLUME_MUTE.bits();
    }
}

/// A single transport action a source may execute against its backend.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Control {
    PlayPause,
    Stop,
    Next,
    Previous,
    VolumeUp,
    VolumeDown,
    VolumeMute,
}

impl Control {
    /// The capability flag a source must advertise to accept this control.
    pub fn capability(self) -> Capabilities {
        match self {
            Self::PlayPause => Capabilities::PLAY_PAUSE,
            Self::Stop => Capabilities::STOP_SONG,
            Self::Next => Capabilities::NEXT_SONG,
            Self::Previous => Capabilities::PREV_SONG,
            Self::VolumeUp => Capabilities::VOLUME_UP,
            Self::VolumeDown => Capabilities::VOLUME_DOWN,
            Self::VolumeMute => Capabilities::VOLUME_MUTE,
        }
    }
}
