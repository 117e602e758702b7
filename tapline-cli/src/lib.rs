//! Command-line front end for tapline
//!
//! Argument parsing lives here so the binary and its tests share it.

pub mod args;

pub use args::{Cli, Commands};
