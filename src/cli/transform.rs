//! Run a processor configuration over a JSON telemetry batch

use clap::ValueEnum;
use serde::{Serialize, de::DeserializeOwned};

use super::CliError;
use crate::{
    pdata::{LogsData, MetricsData, TracesData},
    processor::{BatchReport, Config, TransformProcessor},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Signal {
    #[default]
    Traces,
    Metrics,
    Logs,
}

/// Options for the transform command
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    /// Processor configuration as JSON text
    pub config: String,
    /// Batch as JSON text in the `pdata` serde shape
    pub input: Option<String>,
    pub signal: Signal,
    pub pretty: bool,
}

#[derive(Debug)]
pub struct TransformOutput {
    /// The transformed batch, serialized
    pub output: String,
    pub report: BatchReport,
}

pub fn execute_transform(options: &TransformOptions) -> Result<TransformOutput, CliError> {
    let config = Config::from_json(&options.config)?;
    let processor = TransformProcessor::new(&config)?;
    let input = options.input.as_deref().ok_or(CliError::NoInput)?;

    match options.signal {
        Signal::Traces => run::<TracesData>(input, options.pretty, |data| {
            processor.process_traces(data)
        }),
        Signal::Metrics => run::<MetricsData>(input, options.pretty, |data| {
            processor.process_metrics(data)
        }),
        Signal::Logs => run::<LogsData>(input, options.pretty, |data| {
            processor.process_logs(data)
        }),
    }
}

fn run<T: Serialize + DeserializeOwned>(
    input: &str,
    pretty: bool,
    process: impl FnOnce(&mut T) -> BatchReport,
) -> Result<TransformOutput, CliError> {
    let mut data: T = serde_json::from_str(input)?;
    let report = process(&mut data);
    let output = if pretty {
        serde_json::to_string_pretty(&data)
    } else {
        serde_json::to_string(&data)
    }?;
    Ok(TransformOutput { output, report })
}
