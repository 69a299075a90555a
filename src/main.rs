use std::{
    fs,
    io::{self, Read},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use ottl_lang::cli::{
    self, CheckOptions, CheckResult, CliError, ContextKind, Signal, TransformOptions,
};
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(name = "ottl")]
#[command(about = "OTTL - a statement language for transforming telemetry")]
#[command(version)]
struct Cli {
    /// Log level used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and bind a statement
    Check {
        /// The statement to validate
        statement: String,

        /// Context the statement is bound against
        #[arg(short, long, value_enum, default_value_t = ContextKind::Span)]
        context: ContextKind,

        /// Only validate syntax, don't bind
        #[arg(long)]
        syntax_only: bool,
    },

    /// Apply a processor configuration to a JSON telemetry batch
    Transform {
        /// Processor configuration file (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Batch file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Signal carried by the batch
        #[arg(short, long, value_enum, default_value_t = Signal::Traces)]
        signal: Signal,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let result = match cli.command {
        Commands::Check {
            statement,
            context,
            syntax_only,
        } => run_check(statement, context, syntax_only),
        Commands::Transform {
            config,
            input,
            signal,
            pretty,
        } => run_transform(config, input, signal, pretty),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();
}

fn run_check(statement: String, context: ContextKind, syntax_only: bool) -> Result<()> {
    let options = CheckOptions {
        statement,
        context,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid => println!("Syntax is valid"),
        CheckResult::Bound(context) => println!("Statement is valid for the {context} context"),
    }
    Ok(())
}

fn run_transform(
    config: PathBuf,
    input: Option<PathBuf>,
    signal: Signal,
    pretty: bool,
) -> Result<()> {
    let config = fs::read_to_string(&config)
        .with_context(|| format!("reading config {}", config.display()))?;

    let input = match input {
        Some(path) => Some(
            fs::read_to_string(&path)
                .with_context(|| format!("reading input {}", path.display()))?,
        ),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer).map_err(CliError::Io)?;
            Some(buffer)
        }
        None => None,
    };

    let options = TransformOptions {
        config,
        input,
        signal,
        pretty,
    };
    let result = cli::execute_transform(&options)?;

    for error in &result.report.errors {
        eprintln!("{error}");
    }
    println!("{}", result.output);
    Ok(())
}
