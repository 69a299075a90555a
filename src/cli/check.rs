//! Validate statements without running them

use clap::ValueEnum;

use super::CliError;
use crate::{
    ast::ParsedStatement,
    context::TransformContext,
    contexts::{LogContext, ResourceContext, SpanContext},
    evaluator::{BindError, bind},
    functions::{FunctionRegistry, datapoint_functions, standard_functions},
    parser,
};

/// Context a statement is bound against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ContextKind {
    Resource,
    #[default]
    Span,
    #[value(name = "datapoint")]
    DataPoint,
    Log,
}

/// Options for the check command
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub statement: String,
    pub context: ContextKind,
    /// Only validate syntax, don't bind
    pub syntax_only: bool,
}

/// Result of a check operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    SyntaxValid,
    /// Parsed and bound against the named context
    Bound(&'static str),
}

pub fn execute_check(options: &CheckOptions) -> Result<CheckResult, CliError> {
    let parsed = parser::parse(&options.statement)?;

    if options.syntax_only {
        return Ok(CheckResult::SyntaxValid);
    }

    let context = match options.context {
        ContextKind::Resource => {
            bind_with::<ResourceContext>(&parsed, &standard_functions())?
        }
        ContextKind::Span => bind_with::<SpanContext>(&parsed, &standard_functions())?,
        ContextKind::DataPoint => bind_with(&parsed, &datapoint_functions())?,
        ContextKind::Log => bind_with::<LogContext>(&parsed, &standard_functions())?,
    };
    Ok(CheckResult::Bound(context))
}

fn bind_with<K: TransformContext>(
    parsed: &ParsedStatement,
    registry: &FunctionRegistry<K>,
) -> Result<&'static str, BindError> {
    bind(parsed, registry)?;
    Ok(K::NAME)
}
