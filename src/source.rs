//! Pluggable now-playing sources.
//!
//! Every backend implements [`MusicSource`]. The query thread only ever
//! talks to the selected source through this trait, always while holding
//! the lifecycle lock, so implementations need `Send` but not `Sync`.

mod capability;
pub mod folder;
pub mod mpris;
mod registry;

pub use capability::{Capabilities, Control};
pub use registry::{SourceRegistry, SourceSummary};

use crate::output::CoverHandler;
use crate::song::Song;

/// Outcome of a refresh.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Refresh {
    /// The backend answered; the snapshot reflects it.
    Active,
    /// The backend is missing or unbound; the snapshot was reset to stopped.
    Inactive,
}

/// Direction for sources that map a scene to several possible targets.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TargetStep {
    Next,
    Previous,
}

pub trait MusicSource: Send {
    /// Stable identifier used by configuration.
    fn id(&self) -> &str;

    /// Human readable name.
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    /// Whether the backend integration is usable right now. Must not block.
    fn enabled(&self) -> bool;

    /// Pull the current state into the owned snapshot.
    ///
    /// Backend failures are absorbed here; they show up only as missing
    /// fields or as an `Inactive` outcome with a stopped snapshot.
    fn refresh(&mut self) -> Refresh;

    /// Copy of the snapshot as of the last refresh.
    fn song_info(&self) -> Song;

    /// Replace the snapshot with an empty, stopped one.
    fn reset_info(&mut self);

    /// Run a transport control. Returns `false` when unsupported or failed.
    fn execute_capability(&mut self, control: Control) -> bool;

    /// Materialize the cover for the last refreshed snapshot.
    fn handle_cover(&mut self, covers: &mut dyn CoverHandler, song: &Song) {
        covers.fetch(song);
    }

    /// Move to another mapped target, if this source has a mapping.
    fn switch_target(&mut self, _step: TargetStep) -> bool {
        false
    }
}

/// State every source carries: identity, capabilities and its snapshot.
#[derive(Debug, Clone)]
pub struct SourceCore {
    id: &'static str,
    name: &'static str,
    capabilities: Capabilities,
    pub current: Song,
}

impl SourceCore {
    pub fn new(id: &'static str, name: &'static str, capabilities: Capabilities) -> Self {
        Self {
            id,
            name,
            capabilities,
            current: Song::stopped(),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn supports(&self, control: Control) -> bool {
        self.capabilities.contains(control.capability())
    }

    pub fn reset(&mut self) {
        self.current = Song::stopped();
    }
}
