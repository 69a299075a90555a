// tests/processor_tests.rs

use ottl_lang::evaluator::{BindError, EvalError, StatementError};
use ottl_lang::parser::ParseError;
use ottl_lang::pdata::{
    Gauge, InstrumentationScope, LogRecord, LogsData, Metric, MetricData, MetricsData,
    NumberDataPoint, NumberValue, Resource, ResourceLogs, ResourceMetrics, ResourceSpans,
    ScopeLogs, ScopeMetrics, ScopeSpans, SeverityNumber, Span, StatusCode, Sum, Summary,
    SummaryDataPoint, TracesData,
};
use ottl_lang::processor::{BatchReport, Config, ProcessorError, RecordPosition, TransformProcessor};
use ottl_lang::value::Map;
use ottl_lang::Value;

fn processor(config: Config) -> TransformProcessor {
    TransformProcessor::new(&config).unwrap()
}

fn traces_config(statements: &[&str]) -> Config {
    Config {
        traces: statements.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    }
}

fn span(name: &str, status_code: i64) -> Span {
    let mut attributes = Map::new();
    attributes.insert("http.status_code".to_string(), Value::Integer(status_code));
    Span {
        name: name.to_string(),
        attributes,
        ..Default::default()
    }
}

fn traces(spans: Vec<Vec<Span>>) -> TracesData {
    TracesData {
        resource_spans: vec![ResourceSpans {
            resource: Resource::default(),
            scope_spans: spans
                .into_iter()
                .map(|spans| ScopeSpans {
                    scope: InstrumentationScope::default(),
                    spans,
                })
                .collect(),
        }],
    }
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_config_from_json() {
    let config = Config::from_json(
        r#"{
            "traces": ["set(name, \"x\")"],
            "logs": ["delete_key(attributes, \"password\")"]
        }"#,
    )
    .unwrap();

    assert_eq!(config.traces, vec![r#"set(name, "x")"#.to_string()]);
    assert!(config.metrics.is_empty());
    assert_eq!(config.logs.len(), 1);
}

#[test]
fn test_empty_config() {
    let config = Config::from_json("{}").unwrap();
    assert_eq!(config, Config::default());
    assert!(TransformProcessor::new(&config).is_ok());
}

#[test]
fn test_config_rejects_unknown_sections() {
    assert!(Config::from_json(r#"{"spans": []}"#).is_err());
    assert!(Config::from_json(r#"{"traces": "set(name, \"x\")"}"#).is_err());
}

#[test]
fn test_invalid_statement_aborts_construction() {
    let result = TransformProcessor::new(&traces_config(&[
        r#"set(name, "ok")"#,
        r#"set(nope, "x")"#,
    ]));

    match result {
        Err(ProcessorError::Statement {
            context,
            statement,
            source,
        }) => {
            assert_eq!(context, "span");
            assert_eq!(statement, r#"set(nope, "x")"#);
            assert!(matches!(
                source,
                StatementError::Bind(BindError::InvalidPath { .. })
            ));
        }
        Ok(_) => panic!("expected construction to fail"),
    }
}

#[test]
fn test_syntax_error_names_context() {
    let config = Config {
        logs: vec!["delete_key(attributes".to_string()],
        ..Default::default()
    };
    let Err(err) = TransformProcessor::new(&config) else {
        panic!("expected construction to fail");
    };
    let ProcessorError::Statement { context, source, .. } = &err;
    assert_eq!(*context, "log");
    assert!(matches!(
        source,
        StatementError::Parse(ParseError::UnexpectedEof { .. })
    ));
    assert!(err.to_string().starts_with("unable to load log statement"));
}

#[test]
fn test_metric_functions_only_bind_for_metrics() {
    let metrics = Config {
        metrics: vec!["convert_sum_to_gauge()".to_string()],
        ..Default::default()
    };
    assert!(TransformProcessor::new(&metrics).is_ok());

    let err = TransformProcessor::new(&traces_config(&["convert_sum_to_gauge()"]));
    assert!(matches!(
        err,
        Err(ProcessorError::Statement {
            source: StatementError::Bind(BindError::UnknownFunction(_)),
            ..
        })
    ));
}

// ============================================================================
// Traces
// ============================================================================

#[test]
fn test_process_traces() {
    let processor = processor(traces_config(&[
        r#"set(status.code, STATUS_CODE_ERROR) where attributes["http.status_code"] >= 500"#,
        r#"set(attributes["checked"], true)"#,
    ]));

    let mut data = traces(vec![vec![span("a", 200), span("b", 503)], vec![span("c", 500)]]);
    let report = processor.process_traces(&mut data);

    assert_eq!(
        report,
        BatchReport {
            records: 3,
            executed: 5,
            errors: vec![],
        }
    );
    assert!(report.is_clean());

    let spans: Vec<&Span> = data.resource_spans[0]
        .scope_spans
        .iter()
        .flat_map(|scope| &scope.spans)
        .collect();
    let codes: Vec<StatusCode> = spans.iter().map(|s| s.status.code).collect();
    assert_eq!(
        codes,
        vec![StatusCode::Unset, StatusCode::Error, StatusCode::Error]
    );
    assert!(spans
        .iter()
        .all(|s| s.attributes.get("checked") == Some(&Value::Boolean(true))));
}

#[test]
fn test_statements_run_in_order() {
    let processor = processor(traces_config(&[
        r#"set(name, "renamed")"#,
        r#"set(attributes["seen"], name)"#,
    ]));

    let mut data = traces(vec![vec![span("original", 200)]]);
    processor.process_traces(&mut data);

    let span = &data.resource_spans[0].scope_spans[0].spans[0];
    assert_eq!(span.attributes.get("seen"), Some(&Value::from("renamed")));
}

#[test]
fn test_runtime_errors_are_reported_and_processing_continues() {
    let processor = processor(traces_config(&[
        r#"set(name, attributes["http.status_code"])"#,
        r#"set(attributes["after"], 1)"#,
    ]));

    let mut data = traces(vec![vec![span("a", 200)], vec![span("b", 404), span("c", 500)]]);
    let report = processor.process_traces(&mut data);

    assert_eq!(report.records, 3);
    assert_eq!(report.executed, 3);
    assert_eq!(report.errors.len(), 3);
    assert!(!report.is_clean());

    let error = &report.errors[2];
    assert_eq!(error.statement, r#"set(name, attributes["http.status_code"])"#);
    assert_eq!(
        error.position,
        RecordPosition {
            resource: 0,
            scope: 1,
            record: 1,
            data_point: None,
        }
    );
    assert_eq!(
        error.error,
        EvalError::TypeMismatch {
            target: "name",
            expected: "string",
            found: "integer",
        }
    );

    // the second statement still ran everywhere
    for scope in &data.resource_spans[0].scope_spans {
        for span in &scope.spans {
            assert_eq!(span.attributes.get("after"), Some(&Value::Integer(1)));
        }
    }
}

#[test]
fn test_record_error_message() {
    let processor = processor(traces_config(&["set(kind, 42)"]));
    let mut data = traces(vec![vec![span("a", 200)]]);
    let report = processor.process_traces(&mut data);

    assert_eq!(
        report.errors[0].to_string(),
        "statement `set(kind, 42)` failed at 0/0/0: 42 is not a valid span kind"
    );
}

#[test]
fn test_record_position_display() {
    let position = RecordPosition {
        resource: 1,
        scope: 2,
        record: 3,
        data_point: None,
    };
    assert_eq!(position.to_string(), "1/2/3");

    let position = RecordPosition {
        data_point: Some(4),
        ..position
    };
    assert_eq!(position.to_string(), "1/2/3/4");
}

#[test]
fn test_resource_changes_are_shared_by_spans() {
    let processor = processor(traces_config(&[
        r#"set(resource.attributes["count"], 1) where resource.attributes["count"] == nil"#,
        r#"set(resource.attributes["last"], name)"#,
    ]));

    let mut data = traces(vec![vec![span("a", 200), span("b", 200)]]);
    let report = processor.process_traces(&mut data);

    assert_eq!(report.executed, 3);
    let attributes = &data.resource_spans[0].resource.attributes;
    assert_eq!(attributes.get("count"), Some(&Value::Integer(1)));
    assert_eq!(attributes.get("last"), Some(&Value::from("b")));
}

// ============================================================================
// Metrics
// ============================================================================

fn metrics_data(metrics: Vec<Metric>) -> MetricsData {
    MetricsData {
        resource_metrics: vec![ResourceMetrics {
            resource: Resource::default(),
            scope_metrics: vec![ScopeMetrics {
                scope: InstrumentationScope::default(),
                metrics,
            }],
        }],
    }
}

fn gauge(name: &str, values: &[f64]) -> Metric {
    Metric {
        name: name.to_string(),
        data: MetricData::Gauge(Gauge {
            data_points: values
                .iter()
                .map(|v| NumberDataPoint {
                    value: NumberValue::AsDouble(*v),
                    ..Default::default()
                })
                .collect(),
        }),
        ..Default::default()
    }
}

#[test]
fn test_process_metrics_visits_every_point() {
    let config = Config {
        metrics: vec![r#"set(attributes["unit"], metric.unit)"#.to_string()],
        ..Default::default()
    };
    let processor = processor(config);

    let mut data = metrics_data(vec![gauge("a", &[1.0, 2.0]), gauge("b", &[3.0])]);
    let report = processor.process_metrics(&mut data);

    assert_eq!(report.records, 3);
    assert_eq!(report.executed, 3);
}

#[test]
fn test_metric_errors_carry_data_point() {
    let config = Config {
        metrics: vec![r#"set(value_double, "x")"#.to_string()],
        ..Default::default()
    };
    let processor = processor(config);

    let mut data = metrics_data(vec![gauge("a", &[1.0]), gauge("b", &[2.0, 3.0])]);
    let report = processor.process_metrics(&mut data);

    assert_eq!(report.errors.len(), 3);
    assert_eq!(
        report.errors[2].position,
        RecordPosition {
            resource: 0,
            scope: 0,
            record: 1,
            data_point: Some(1),
        }
    );
}

#[test]
fn test_process_metrics_conversion() {
    let config = Config {
        metrics: vec![
            r#"convert_gauge_to_sum("cumulative", true) where metric.name == "a""#.to_string(),
        ],
        ..Default::default()
    };
    let processor = processor(config);

    let mut data = metrics_data(vec![gauge("a", &[1.0]), gauge("b", &[2.0])]);
    processor.process_metrics(&mut data);

    let metrics = &data.resource_metrics[0].scope_metrics[0].metrics;
    assert!(matches!(metrics[0].data, MetricData::Sum(Sum { is_monotonic: true, .. })));
    assert!(matches!(metrics[1].data, MetricData::Gauge(_)));
}

#[test]
fn test_exponential_histogram_batch() {
    let input = r#"{
        "resourceMetrics": [{
            "scopeMetrics": [{
                "metrics": [
                    {"name": "cpu", "data": {"gauge": {"dataPoints": [{"value": {"asDouble": 0.5}}]}}},
                    {
                        "name": "payload_size",
                        "data": {"exponentialHistogram": {
                            "aggregationTemporality": 1,
                            "dataPoints": [
                                {"count": 4, "scale": 1, "positive": {"offset": 0, "bucketCounts": [4]}}
                            ]
                        }}
                    }
                ]
            }]
        }]
    }"#;
    let mut data: MetricsData = serde_json::from_str(input).unwrap();

    let config = Config {
        metrics: vec![
            r#"set(attributes["exp"], true) where metric.type == METRIC_DATA_TYPE_EXPONENTIAL_HISTOGRAM"#
                .to_string(),
            "set(zero_count, count)".to_string(),
        ],
        ..Default::default()
    };
    let report = processor(config).process_metrics(&mut data);

    assert_eq!(report.records, 2);
    assert_eq!(report.executed, 3);
    assert!(report.errors.is_empty());

    let metrics = &data.resource_metrics[0].scope_metrics[0].metrics;
    let MetricData::ExponentialHistogram(histogram) = &metrics[1].data else {
        panic!("expected an exponential histogram");
    };
    let dp = &histogram.data_points[0];
    assert_eq!(dp.attributes.get("exp"), Some(&Value::Boolean(true)));
    assert_eq!(dp.zero_count, 4);
}

#[test]
fn test_appended_metrics_are_not_visited() {
    let config = Config {
        metrics: vec![
            r#"convert_summary_count_val_to_sum("delta", false)"#.to_string(),
            r#"set(attributes["visited"], true)"#.to_string(),
        ],
        ..Default::default()
    };
    let processor = processor(config);

    let summary = Metric {
        name: "latency".to_string(),
        data: MetricData::Summary(Summary {
            data_points: vec![
                SummaryDataPoint {
                    count: 2,
                    ..Default::default()
                },
                SummaryDataPoint {
                    count: 5,
                    ..Default::default()
                },
            ],
        }),
        ..Default::default()
    };
    let mut data = metrics_data(vec![summary]);
    let report = processor.process_metrics(&mut data);

    assert_eq!(report.records, 2);
    let metrics = &data.resource_metrics[0].scope_metrics[0].metrics;
    assert_eq!(metrics.len(), 2);
    assert_eq!(metrics[1].name, "latency_count");

    let MetricData::Sum(sum) = &metrics[1].data else {
        panic!("expected a sum metric");
    };
    // points were copied before the summary points were tagged
    assert!(sum
        .data_points
        .iter()
        .all(|dp| dp.attributes.get("visited").is_none()));
}

// ============================================================================
// Logs
// ============================================================================

#[test]
fn test_process_logs() {
    let config = Config {
        logs: vec![
            r#"delete_key(attributes, "password")"#.to_string(),
            r#"set(severity_text, "WARN") where severity_number >= SEVERITY_NUMBER_WARN"#
                .to_string(),
        ],
        ..Default::default()
    };
    let processor = processor(config);

    let mut attributes = Map::new();
    attributes.insert("password".to_string(), Value::from("hunter2"));
    attributes.insert("user".to_string(), Value::from("alice"));
    let log = LogRecord {
        attributes,
        severity_number: SeverityNumber::WARN,
        ..Default::default()
    };

    let mut data = LogsData {
        resource_logs: vec![ResourceLogs {
            resource: Resource::default(),
            scope_logs: vec![ScopeLogs {
                scope: InstrumentationScope::default(),
                log_records: vec![log, LogRecord::default()],
            }],
        }],
    };

    let report = processor.process_logs(&mut data);
    assert_eq!(report.records, 2);
    assert_eq!(report.executed, 3);

    let logs = &data.resource_logs[0].scope_logs[0].log_records;
    assert!(!logs[0].attributes.contains_key("password"));
    assert!(logs[0].attributes.contains_key("user"));
    assert_eq!(logs[0].severity_text, "WARN");
    assert_eq!(logs[1].severity_text, "");
}

// ============================================================================
// JSON Batches
// ============================================================================

#[test]
fn test_traces_json_round_trip() {
    let input = r#"{
        "resourceSpans": [{
            "resource": {"attributes": {"service.name": "checkout"}},
            "scopeSpans": [{
                "scope": {"name": "http"},
                "spans": [{
                    "traceId": "0102030405060708090a0b0c0d0e0f10",
                    "spanId": "0102030405060708",
                    "name": "GET /cart",
                    "kind": 2,
                    "attributes": {"http.status_code": 500}
                }]
            }]
        }]
    }"#;

    let mut data: TracesData = serde_json::from_str(input).unwrap();
    let processor = processor(traces_config(&[
        r#"set(status.code, STATUS_CODE_ERROR) where attributes["http.status_code"] >= 500"#,
        r#"set(attributes["service"], resource.attributes["service.name"])"#,
    ]));
    let report = processor.process_traces(&mut data);
    assert!(report.is_clean());

    let output = serde_json::to_value(&data).unwrap();
    let span = &output["resourceSpans"][0]["scopeSpans"][0]["spans"][0];
    assert_eq!(span["status"]["code"], 2);
    assert_eq!(span["attributes"]["service"], "checkout");
    assert_eq!(span["spanId"], "0102030405060708");
    assert_eq!(span["kind"], 2);

    let reparsed: TracesData = serde_json::from_value(output).unwrap();
    assert_eq!(reparsed, data);
}
