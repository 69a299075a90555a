//! # Telemetry Data Model
//!
//! In-memory shapes of the records statements run against. The hierarchy
//! mirrors OTLP: every signal groups records by resource, then by
//! instrumentation scope.
//!
//! ```text
//! TracesData  -> ResourceSpans   -> ScopeSpans   -> Span
//! MetricsData -> ResourceMetrics -> ScopeMetrics -> Metric -> data points
//! LogsData    -> ResourceLogs    -> ScopeLogs    -> LogRecord
//! ```
//!
//! All types round-trip through JSON with `serde`; field names are camelCase
//! and ids are hex strings. This is the crate's own JSON shape, not OTLP/JSON:
//! attributes are plain objects, metric payloads sit under a `data` key, and
//! number values are written as `{"asInt": 3}` or `{"asDouble": 0.5}`.
pub mod common;
pub mod logs;
pub mod metrics;
pub mod trace;

pub use common::{InstrumentationScope, Resource, SpanId, TraceId};
pub use logs::{LogRecord, LogsData, ResourceLogs, ScopeLogs, SeverityNumber};
pub use metrics::{
    AggregationTemporality, Bucket, Buckets, ExponentialHistogram, ExponentialHistogramDataPoint,
    Gauge, Histogram, HistogramDataPoint, Metric, MetricData, MetricDataType, MetricsData, NumberDataPoint, NumberValue, ResourceMetrics, ScopeMetrics, Sum,
    Summary, SummaryDataPoint, ValueAtQuantile,
};
pub use trace::{ResourceSpans, ScopeSpans, Span, SpanKind, Status, StatusCode, TracesData};

/// Error for an integer outside an enum's defined range.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{value} is not a valid {kind}")]
pub struct InvalidEnumValue {
    pub kind: &'static str,
    pub value: i64,
}
