//! CLI support for ottl-lang
//!
//! Provides programmatic access to the `ottl` commands so they can be
//! embedded in other tools and tested without spawning a process.

mod check;
mod transform;

pub use check::{CheckOptions, CheckResult, ContextKind, execute_check};
pub use transform::{Signal, TransformOptions, TransformOutput, execute_transform};

use std::io;

use thiserror::Error;

use crate::{evaluator::BindError, parser::ParseError, processor::ProcessorError};

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("bind error: {0}")]
    Bind(#[from] BindError),

    #[error(transparent)]
    Processor(#[from] ProcessorError),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("no input provided; use --input or pipe JSON to stdin")]
    NoInput,
}
