//! Terra CLI - Command-line interface for the Terra country data pipeline
//!
//! This crate provides the CLI application that ties together all Terra components.

pub mod config;
pub mod output;

pub use config::{Command, Config, OutputFormat, SortArg};

use terra_core::{AppError, ErrorKind};

/// Process exit code for a failed command.
///
/// Upstream failures and missing records get their own codes so scripts can
/// tell them apart from everything else.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<AppError>().map(AppError::kind) {
        Some(ErrorKind::UpstreamUnavailable) => 2,
        Some(ErrorKind::NotFound) => 3,
        Some(ErrorKind::Unexpected) | None => 1,
    }
}
