//! Now-playing snapshot types.
//!
//! A `Song` is cleared and repopulated by the active source on every poll
//! cycle; the query thread then copies it out for outputs and readers.

mod model;

pub use model::*;
