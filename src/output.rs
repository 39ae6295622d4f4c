//! Where polled snapshots go.
//!
//! The query thread hands every snapshot to an [`OutputDispatcher`] and,
//! when cover downloads are enabled, asks the selected source to feed a
//! [`CoverHandler`].

mod cover;
mod dispatcher;
mod format;

pub use cover::{CoverArt, CoverHandler, NoCover};
pub use dispatcher::FileOutputs;
pub use format::{format_clock, render};

use crate::song::Song;

pub trait OutputDispatcher: Send {
    fn dispatch(&mut self, song: &Song);
}
