//! GraphGen CLI library.
//!
//! This library provides the core functionality for the `graphgen` command-line
//! interface, including configuration management, chunk loading, command
//! execution, and output formatting.

pub mod chunks;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use chunks::{load_chunks, LoadedChunks};
pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
