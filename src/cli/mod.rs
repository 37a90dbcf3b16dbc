//! CLI module for the stego ledger
//!
//! This module contains all command-line interface related code including
//! argument parsing, command definitions, prompts and command handlers.
//!
//! # Submodules
//!
//! - `args` - Command-line argument definitions using clap
//! - `commands` - Command handler implementations
//! - `progress` - Progress bars and CLI output utilities
//! - `prompt` - Interactive prompts and the duplicate-decision policies

pub mod args;
pub mod commands;
pub mod progress;
pub mod prompt;

pub use args::{Args, Commands};
pub use commands::run_command;
pub use progress::DualWriter;
