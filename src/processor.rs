//! # Transform Processor
//!
//! Runs configured statements over whole telemetry batches.
//!
//! Each signal has its own ordered statement list. Statements are bound once
//! when the processor is built; any parse or bind failure aborts construction
//! and names the offending statement. At runtime every statement runs against
//! every record of its signal, in order. A statement that fails on a record is
//! logged and recorded in the [`BatchReport`], and processing continues with
//! the next statement.
//!
//! Example configuration (JSON):
//! ```json
//! {
//!   "traces": [
//!     "set(status.code, STATUS_CODE_ERROR) where attributes[\"http.status_code\"] >= 500"
//!   ],
//!   "metrics": [
//!     "convert_sum_to_gauge() where metric.name == \"system.cpu.time\""
//!   ],
//!   "logs": [
//!     "delete_key(attributes, \"password\")"
//!   ]
//! }
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    context::TransformContext,
    contexts::{DataPointContext, DataPointRecord, LogContext, LogRecordRef, SpanContext, SpanRecord},
    evaluator::{EvalError, ExecutableStatement, StatementError},
    functions::{FunctionRegistry, datapoint_functions, standard_functions},
    pdata::{LogsData, MetricsData, TracesData},
};

/// Statement lists per signal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub traces: Vec<String>,
    pub metrics: Vec<String>,
    pub logs: Vec<String>,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("unable to load {context} statement `{statement}`: {source}")]
    Statement {
        context: &'static str,
        statement: String,
        #[source]
        source: StatementError,
    },
}

/// Location of a record inside a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RecordPosition {
    pub resource: usize,
    pub scope: usize,
    pub record: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_point: Option<usize>,
}

impl fmt::Display for RecordPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.resource, self.scope, self.record)?;
        if let Some(dp) = self.data_point {
            write!(f, "/{dp}")?;
        }
        Ok(())
    }
}

/// One statement failure on one record.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("statement `{statement}` failed at {position}: {error}")]
pub struct RecordError {
    pub statement: String,
    pub position: RecordPosition,
    #[source]
    pub error: EvalError,
}

/// Outcome of processing one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    /// Records visited
    pub records: usize,
    /// Statement executions whose condition held and whose function ran
    pub executed: usize,
    pub errors: Vec<RecordError>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

struct BoundStatement<K: TransformContext> {
    text: String,
    statement: ExecutableStatement<K>,
}

/// Ordered statements bound to one context.
pub struct StatementSet<K: TransformContext> {
    statements: Vec<BoundStatement<K>>,
}

impl<K: TransformContext> StatementSet<K> {
    pub fn new(texts: &[String], registry: &FunctionRegistry<K>) -> Result<Self, ProcessorError> {
        let statements = texts
            .iter()
            .map(|text| -> Result<BoundStatement<K>, ProcessorError> {
                let statement = ExecutableStatement::compile(text, registry).map_err(|source| {
                    ProcessorError::Statement {
                        context: K::NAME,
                        statement: text.clone(),
                        source,
                    }
                })?;
                debug!(context = K::NAME, statement = %text, "bound statement");
                Ok(BoundStatement {
                    text: text.clone(),
                    statement,
                })
            })
            .collect::<Result<_, _>>()?;
        Ok(StatementSet { statements })
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Runs every statement against one record, in order.
    pub fn execute(
        &self,
        record: &mut K::Record<'_>,
        position: RecordPosition,
        report: &mut BatchReport,
    ) {
        report.records += 1;
        for bound in &self.statements {
            match bound.statement.execute(record) {
                Ok(true) => report.executed += 1,
                Ok(false) => {}
                Err(error) => {
                    warn!(
                        context = K::NAME,
                        statement = %bound.text,
                        %position,
                        %error,
                        "statement failed"
                    );
                    report.errors.push(RecordError {
                        statement: bound.text.clone(),
                        position,
                        error,
                    });
                }
            }
        }
    }
}

/// Applies configured statements to traces, metrics and logs.
pub struct TransformProcessor {
    traces: StatementSet<SpanContext>,
    metrics: StatementSet<DataPointContext>,
    logs: StatementSet<LogContext>,
}

impl TransformProcessor {
    pub fn new(config: &Config) -> Result<Self, ProcessorError> {
        Ok(TransformProcessor {
            traces: StatementSet::new(&config.traces, &standard_functions())?,
            metrics: StatementSet::new(&config.metrics, &datapoint_functions())?,
            logs: StatementSet::new(&config.logs, &standard_functions())?,
        })
    }

    pub fn process_traces(&self, data: &mut TracesData) -> BatchReport {
        let mut report = BatchReport::default();

        for (r, resource_spans) in data.resource_spans.iter_mut().enumerate() {
            let resource = &mut resource_spans.resource;
            for (s, scope_spans) in resource_spans.scope_spans.iter_mut().enumerate() {
                let scope = &mut scope_spans.scope;
                for (i, span) in scope_spans.spans.iter_mut().enumerate() {
                    let mut record = SpanRecord::new(span, scope, resource);
                    let position = RecordPosition {
                        resource: r,
                        scope: s,
                        record: i,
                        data_point: None,
                    };
                    self.traces.execute(&mut record, position, &mut report);
                }
            }
        }
        report
    }

    /// Statements run once per data point. Metrics appended to a scope while
    /// it is processed (by the summary conversions) are not visited.
    pub fn process_metrics(&self, data: &mut MetricsData) -> BatchReport {
        let mut report = BatchReport::default();

        for (r, resource_metrics) in data.resource_metrics.iter_mut().enumerate() {
            let resource = &mut resource_metrics.resource;
            for (s, scope_metrics) in resource_metrics.scope_metrics.iter_mut().enumerate() {
                let scope = &mut scope_metrics.scope;
                let metrics = &mut scope_metrics.metrics;
                for m in 0..metrics.len() {
                    let points = metrics[m].data_point_count();
                    for dp in 0..points {
                        let mut record = DataPointRecord::new(metrics, m, dp, scope, resource);
                        let position = RecordPosition {
                            resource: r,
                            scope: s,
                            record: m,
                            data_point: Some(dp),
                        };
                        self.metrics.execute(&mut record, position, &mut report);
                    }
                }
            }
        }
        report
    }

    pub fn process_logs(&self, data: &mut LogsData) -> BatchReport {
        let mut report = BatchReport::default();

        for (r, resource_logs) in data.resource_logs.iter_mut().enumerate() {
            let resource = &mut resource_logs.resource;
            for (s, scope_logs) in resource_logs.scope_logs.iter_mut().enumerate() {
                let scope = &mut scope_logs.scope;
                for (i, log) in scope_logs.log_records.iter_mut().enumerate() {
                    let mut record = LogRecordRef::new(log, scope, resource);
                    let position = RecordPosition {
                        resource: r,
                        scope: s,
                        record: i,
                        data_point: None,
                    };
                    self.logs.execute(&mut record, position, &mut report);
                }
            }
        }
        report
    }
}
