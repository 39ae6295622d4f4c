//! Configuration loader and schema types.
//!
//! Everything has a default, so a missing config file still yields a
//! runnable setup (MPRIS source, no outputs).

mod load;
mod schema;

pub use load::default_state_dir;
pub use schema::*;
