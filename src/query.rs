//! The query thread: one worker that polls the selected source on a fixed
//! cadence and republishes every snapshot.
//!
//! Lifecycle: `start()` and `stop()` are serialized by the worker slot, and
//! every access to the registry, outputs and cover handler happens under
//! the lifecycle lock. The worker publishes a copy of each snapshot into a
//! separate buffer so readers never wait on a slow refresh.

mod thread;
mod types;

use std::sync::atomic::Ordering;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use tracing::{error, info, warn};

pub use types::QuerySettings;

use crate::error::QueryError;
use crate::output::{CoverHandler, OutputDispatcher};
use crate::song::Song;
use crate::source::{Control, SourceRegistry, SourceSummary, TargetStep};
use thread::spawn_query_thread;
use types::{Active, Shared, Worker, lock};

pub struct QueryThread {
    shared: Arc<Shared>,
    worker: Mutex<Option<Worker>>,
}

impl QueryThread {
    pub fn new(
        registry: SourceRegistry,
        outputs: Box<dyn OutputDispatcher>,
        covers: Box<dyn CoverHandler>,
        settings: QuerySettings,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                active: Mutex::new(Active {
                    registry,
                    outputs,
                    covers,
                    settings,
                }),
                running: Default::default(),
                latest: Mutex::new(Song::stopped()),
            }),
            worker: Mutex::new(None),
        }
    }

    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::SeqCst)
    }

    /// Start polling. Does nothing if already running.
    pub fn start(&self) -> Result<(), QueryError> {
        let mut slot = lock(&self.worker);
        let active = lock(&self.shared.active);
        if slot.as_ref().is_some_and(|w| w.handle.is_finished()) {
            warn!("query thread died; restarting it");
            if let Some(dead) = slot.take() {
                let _ = dead.handle.join();
            }
            self.shared.running.store(false, Ordering::SeqCst);
        }
        if self.shared.running.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.shared.running.store(true, Ordering::SeqCst);

        let (wake, rx) = mpsc::channel();
        match spawn_query_thread(Arc::clone(&self.shared), rx) {
            Ok(handle) => {
                info!(source = active.registry.selected_id(), "query thread running");
                *slot = Some(Worker { handle, wake });
                Ok(())
            }
            Err(e) => {
                self.shared.running.store(false, Ordering::SeqCst);
                error!("failed to spawn query thread: {e}");
                Err(QueryError::Spawn(e))
            }
        }
    }

    /// Stop polling and wait for the worker to exit.
    ///
    /// Outputs receive one final stopped snapshot. Does nothing if the
    /// worker is not running.
    pub fn stop(&self) {
        let mut slot = lock(&self.worker);
        let Some(worker) = slot.take() else {
            return;
        };

        {
            let mut active = lock(&self.shared.active);
            let active = &mut *active;
            let stopped = match active.registry.selected_source() {
                Some(source) => {
                    source.reset_info();
                    source.song_info()
                }
                None => Song::stopped(),
            };
            *lock(&self.shared.latest) = stopped.clone();
            active.outputs.dispatch(&stopped);
            self.shared.running.store(false, Ordering::SeqCst);
        }

        drop(worker.wake);
        if worker.handle.join().is_err() {
            error!("query thread panicked");
        }

        lock(&self.shared.active).covers.reset();
        info!("query thread stopped");
    }

    /// Copy of the most recently published snapshot.
    pub fn latest(&self) -> Song {
        lock(&self.shared.latest).clone()
    }

    /// Change the selected source. The previous one is reset so it does
    /// not keep a stale snapshot around.
    pub fn select_source(&self, id: &str) {
        let mut active = lock(&self.shared.active);
        if active.registry.selected_id() == id {
            return;
        }
        if let Some(old) = active.registry.selected_source() {
            old.reset_info();
        }
        active.registry.set_selected(id);
        if active.registry.selected_source().is_none() {
            warn!(source = id, "selected source is unknown or disabled");
        } else {
            info!(source = id, "selected source changed");
        }
    }

    pub fn selected_id(&self) -> String {
        lock(&self.shared.active).registry.selected_id().to_string()
    }

    /// Run a transport control on the selected source.
    pub fn execute(&self, control: Control) -> bool {
        let mut active = lock(&self.shared.active);
        match active.registry.selected_source() {
            Some(source) => source.execute_capability(control),
            None => false,
        }
    }

    pub fn switch_target(&self, step: TargetStep) -> bool {
        let mut active = lock(&self.shared.active);
        match active.registry.selected_source() {
            Some(source) => source.switch_target(step),
            None => false,
        }
    }

    pub fn settings(&self) -> QuerySettings {
        lock(&self.shared.active).settings
    }

    /// Takes effect on the next cycle.
    pub fn set_settings(&self, settings: QuerySettings) {
        lock(&self.shared.active).settings = settings;
    }

    pub fn sources(&self) -> Vec<SourceSummary> {
        lock(&self.shared.active).registry.summaries()
    }
}

impl Drop for QueryThread {
    fn drop(&mut self) {
        self.stop();
    }
}
