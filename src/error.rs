use std::io;

use thiserror::Error;

/// Errors raised while talking to a source backend.
///
/// These never leave a source: `refresh()` and `execute_capability()` log
/// them and degrade the snapshot instead.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("d-bus error: {0}")]
    Bus(#[from] zbus::Error),
    #[error("d-bus call failed: {0}")]
    Fdo(#[from] zbus::fdo::Error),
    #[error("tag error: {0}")]
    Tag(#[from] lofty::error::LoftyError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("player {0} is no longer on the bus")]
    Vanished(String),
    #[error("no player is bound")]
    Unbound,
}

/// Errors reported by the query thread lifecycle.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("failed to spawn query thread: {0}")]
    Spawn(#[source] io::Error),
}

/// Errors raised by outputs and the cover-art handler.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected http status {0}")]
    Status(u16),
    #[error("unusable cover link: {0}")]
    InvalidLink(String),
}
