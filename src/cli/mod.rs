//! CLI module for AeroQuery
//!
//! Provides command-line interface for:
//! - serve: Start the HTTP server
//! - query: One-shot query execution

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, QueryOptions};
pub use commands::{query, run, run_command, serve};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::write_json;
