use std::sync::atomic::AtomicBool;
use std::sync::mpsc::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::output::{CoverHandler, OutputDispatcher};
use crate::song::Song;
use crate::source::SourceRegistry;

/// Per-cycle settings, read by the worker at the top of every cycle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct QuerySettings {
    pub refresh_rate: Duration,
    pub download_cover: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            refresh_rate: Duration::from_millis(500),
            download_cover: false,
        }
    }
}

/// Everything the worker touches while holding the lifecycle lock.
pub(super) struct Active {
    pub registry: SourceRegistry,
    pub outputs: Box<dyn OutputDispatcher>,
    pub covers: Box<dyn CoverHandler>,
    pub settings: QuerySettings,
}

pub(super) struct Shared {
    pub active: Mutex<Active>,
    /// Written only while `active` is held.
    pub running: AtomicBool,
    pub latest: Mutex<Song>,
}

pub(super) struct Worker {
    pub handle: JoinHandle<()>,
    pub wake: Sender<()>,
}

/// Lock, recovering the data if a previous holder panicked.
pub(super) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
