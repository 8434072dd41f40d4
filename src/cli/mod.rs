//! Command-line interface.

pub mod args;
pub mod targets;

pub use args::{Args, Commands, Verbosity};
