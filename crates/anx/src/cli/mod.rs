//! Command-line interface module.
//!
//! This module provides the CLI structure and command handler for the anx binary.

mod commands;
mod run;

pub use commands::Cli;
pub use run::run;
