use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, error, trace};

use super::types::{Active, Shared, lock};
use crate::song::Song;

pub(super) const THREAD_NAME: &str = "tunetap-query";

pub(super) fn spawn_query_thread(
    shared: Arc<Shared>,
    wake: Receiver<()>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(THREAD_NAME.to_string())
        .spawn(move || run(&shared, &wake))
}

fn run(shared: &Shared, wake: &Receiver<()>) {
    debug!("query thread started");
    loop {
        let started = Instant::now();

        let interval = {
            let mut active = lock(&shared.active);
            if !shared.running.load(Ordering::SeqCst) {
                break;
            }

            let interval = active.settings.refresh_rate;
            let download_cover = active.settings.download_cover;
            let active = &mut *active;

            let cycle = panic::catch_unwind(AssertUnwindSafe(|| {
                poll_selected(active, &shared.latest, download_cover)
            }));
            if cycle.is_err() {
                error!(
                    source = active.registry.selected_id(),
                    "poll cycle panicked; resetting the source"
                );
                if let Some(source) = active.registry.selected_source() {
                    source.reset_info();
                }
            }
            interval
        };

        if !shared.running.load(Ordering::SeqCst) {
            break;
        }

        // stop() wakes the wait early by dropping the sender.
        let elapsed = started.elapsed().min(interval);
        if let Err(RecvTimeoutError::Disconnected) = wake.recv_timeout(interval - elapsed) {
            break;
        }
    }
    debug!("query thread exiting");
}

/// One refresh of the selected source, published and dispatched.
fn poll_selected(active: &mut Active, latest: &Mutex<Song>, download_cover: bool) {
    let Some(source) = active.registry.selected_source() else {
        return;
    };
    let outcome = source.refresh();
    let song = source.song_info();
    trace!(source = source.id(), ?outcome, state = song.state().as_str(), "refreshed");

    *lock(latest) = song.clone();
    active.outputs.dispatch(&song);
    if download_cover {
        source.handle_cover(active.covers.as_mut(), &song);
    }
}
