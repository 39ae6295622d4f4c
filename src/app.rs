//! Application module: exposes the model used by the terminal monitor.
//!
//! The `App` model lives in `app::model` and mirrors the query thread's
//! state for rendering.

mod model;

pub use model::*;

#[cfg(test)]
mod tests;
