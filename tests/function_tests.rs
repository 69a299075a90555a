// tests/function_tests.rs

use ottl_lang::contexts::{DataPointContext, DataPointRecord, SpanContext, SpanRecord};
use ottl_lang::evaluator::{BindError, ExecutableStatement, StatementError};
use ottl_lang::functions::{FunctionKind, datapoint_functions, standard_functions};
use ottl_lang::pdata::{
    AggregationTemporality, Gauge, InstrumentationScope, Metric, MetricData, NumberDataPoint,
    NumberValue, Resource, Span, SpanId, Sum, Summary, SummaryDataPoint, TraceId,
};
use ottl_lang::value::Map;
use ottl_lang::Value;

fn span() -> Span {
    let mut attributes = Map::new();
    attributes.insert("http.method".to_string(), Value::from("GET"));
    attributes.insert("http.route".to_string(), Value::from("/v1/users/42"));
    attributes.insert("http.status_code".to_string(), Value::Integer(503));
    attributes.insert("secret_token".to_string(), Value::from("abc123"));
    Span {
        name: "checkout".to_string(),
        attributes,
        ..Default::default()
    }
}

fn run(statement: &str, span: &mut Span) -> bool {
    let statement =
        ExecutableStatement::<SpanContext>::compile(statement, &standard_functions()).unwrap();
    let mut scope = InstrumentationScope::default();
    let mut resource = Resource::default();
    let mut record = SpanRecord::new(span, &mut scope, &mut resource);
    statement.execute(&mut record).unwrap()
}

// Stores the value of `expr` in a scratch attribute and reads it back.
fn eval(expr: &str) -> Value {
    let mut span = span();
    run(&format!(r#"set(attributes["out"], {})"#, expr), &mut span);
    span.attributes.get("out").cloned().unwrap_or_default()
}

fn bind_err(statement: &str) -> BindError {
    match ExecutableStatement::<SpanContext>::compile(statement, &standard_functions()) {
        Err(StatementError::Bind(err)) => err,
        Err(StatementError::Parse(err)) => panic!("unexpected parse error: {}", err),
        Ok(_) => panic!("expected {} to fail binding", statement),
    }
}

fn keys(span: &Span) -> Vec<&str> {
    span.attributes.keys().map(String::as_str).collect()
}

// ============================================================================
// Editors
// ============================================================================

#[test]
fn test_set() {
    let mut span = span();
    run(r#"set(name, "payment")"#, &mut span);
    run(r#"set(attributes["retries"], 3)"#, &mut span);
    assert_eq!(span.name, "payment");
    assert_eq!(span.attributes.get("retries"), Some(&Value::Integer(3)));
}

#[test]
fn test_set_nil_is_noop() {
    let mut span = span();
    run(r#"set(attributes["http.method"], nil)"#, &mut span);
    run(r#"set(name, attributes["missing"])"#, &mut span);
    assert_eq!(span.attributes.get("http.method"), Some(&Value::from("GET")));
    assert_eq!(span.name, "checkout");
}

#[test]
fn test_set_copies_between_paths() {
    let mut span = span();
    run(r#"set(name, attributes["http.route"])"#, &mut span);
    assert_eq!(span.name, "/v1/users/42");
}

#[test]
fn test_keep_keys() {
    let mut span = span();
    run(r#"keep_keys(attributes, "http.method", "missing")"#, &mut span);
    assert_eq!(keys(&span), vec!["http.method"]);

    run("keep_keys(attributes)", &mut span);
    assert!(span.attributes.is_empty());
}

#[test]
fn test_delete_key() {
    let mut span = span();
    run(r#"delete_key(attributes, "secret_token")"#, &mut span);
    assert_eq!(keys(&span), vec!["http.method", "http.route", "http.status_code"]);

    run(r#"delete_key(attributes, "missing")"#, &mut span);
    assert_eq!(span.attributes.len(), 3);
}

#[test]
fn test_delete_matching_keys() {
    let mut span = span();
    run(r#"delete_matching_keys(attributes, "^http")"#, &mut span);
    assert_eq!(keys(&span), vec!["secret_token"]);
}

#[test]
fn test_map_editor_on_non_map_is_noop() {
    let mut span = span();
    run(r#"delete_key(attributes["http.method"], "x")"#, &mut span);
    run("keep_keys(name)", &mut span);
    assert_eq!(span.attributes.len(), 4);
    assert_eq!(span.name, "checkout");
}

#[test]
fn test_truncate_all() {
    let mut span = span();
    run("truncate_all(attributes, 3)", &mut span);
    assert_eq!(span.attributes.get("http.route"), Some(&Value::from("/v1")));
    assert_eq!(span.attributes.get("secret_token"), Some(&Value::from("abc")));
    assert_eq!(span.attributes.get("http.method"), Some(&Value::from("GET")));
    assert_eq!(
        span.attributes.get("http.status_code"),
        Some(&Value::Integer(503))
    );
}

#[test]
fn test_limit() {
    let mut span = span();
    run("limit(attributes, 10)", &mut span);
    assert_eq!(span.attributes.len(), 4);

    run("limit(attributes, 2)", &mut span);
    assert_eq!(keys(&span), vec!["http.method", "http.route"]);

    run("limit(attributes, 0)", &mut span);
    assert!(span.attributes.is_empty());
}

#[test]
fn test_replace_match() {
    let mut span = span();
    run(
        r#"replace_match(attributes["http.route"], "/v1/users/*", "/v1/users/{id}")"#,
        &mut span,
    );
    assert_eq!(
        span.attributes.get("http.route"),
        Some(&Value::from("/v1/users/{id}"))
    );

    // the glob is anchored
    run(r#"replace_match(name, "check", "x")"#, &mut span);
    assert_eq!(span.name, "checkout");
}

#[test]
fn test_replace_pattern() {
    let mut span = span();
    run(
        r#"replace_pattern(attributes["http.route"], "[0-9]+$", "{id}")"#,
        &mut span,
    );
    assert_eq!(
        span.attributes.get("http.route"),
        Some(&Value::from("/v1/users/{id}"))
    );
}

#[test]
fn test_replace_pattern_expands_groups() {
    let mut span = span();
    run(
        r#"replace_pattern(attributes["http.route"], "^/v([0-9])/", "/version-$1/")"#,
        &mut span,
    );
    assert_eq!(
        span.attributes.get("http.route"),
        Some(&Value::from("/version-1/users/42"))
    );
}

#[test]
fn test_replace_all_matches() {
    let mut span = span();
    run(r#"replace_all_matches(attributes, "abc*", "***")"#, &mut span);
    assert_eq!(span.attributes.get("secret_token"), Some(&Value::from("***")));
    assert_eq!(span.attributes.get("http.method"), Some(&Value::from("GET")));
}

#[test]
fn test_replace_all_patterns() {
    let mut span = span();
    run(r##"replace_all_patterns(attributes, "[0-9]", "#")"##, &mut span);
    assert_eq!(
        span.attributes.get("http.route"),
        Some(&Value::from("/v#/users/##"))
    );
    assert_eq!(span.attributes.get("secret_token"), Some(&Value::from("abc###")));
    // only strings are rewritten
    assert_eq!(
        span.attributes.get("http.status_code"),
        Some(&Value::Integer(503))
    );
}

#[test]
fn test_editor_under_condition() {
    let mut span = span();
    assert!(!run(
        r#"delete_key(attributes, "secret_token") where name == "other""#,
        &mut span
    ));
    assert!(span.attributes.contains_key("secret_token"));

    assert!(run(
        r#"delete_key(attributes, "secret_token") where IsMatch(name, "^check")"#,
        &mut span
    ));
    assert!(!span.attributes.contains_key("secret_token"));
}

// ============================================================================
// Converters
// ============================================================================

#[test]
fn test_concat() {
    assert_eq!(
        eval(r#"Concat("-", name, attributes["http.status_code"], true)"#),
        Value::from("checkout-503-true")
    );
    assert_eq!(
        eval(r#"Concat("", "a", attributes["missing"], "b")"#),
        Value::from("ab")
    );
    assert_eq!(eval(r#"Concat(",")"#), Value::from(""));
}

#[test]
fn test_is_match() {
    assert_eq!(eval(r#"IsMatch(name, "^check")"#), Value::Boolean(true));
    assert_eq!(eval(r#"IsMatch(name, "^pay")"#), Value::Boolean(false));
    assert_eq!(
        eval(r#"IsMatch(attributes["http.status_code"], "^5")"#),
        Value::Boolean(true)
    );
    assert_eq!(
        eval(r#"IsMatch(attributes["missing"], ".*")"#),
        Value::Boolean(false)
    );
}

#[test]
fn test_int() {
    let test_cases = vec![
        (r#"Int("42")"#, Value::Integer(42)),
        ("Int(3.9)", Value::Integer(3)),
        ("Int(-3.9)", Value::Integer(-3)),
        ("Int(true)", Value::Integer(1)),
        (r#"Int(attributes["http.status_code"])"#, Value::Integer(503)),
        (r#"Int("forty")"#, Value::Nil),
        (r#"Int(attributes["missing"])"#, Value::Nil),
    ];

    for (expr, expected) in test_cases {
        assert_eq!(eval(expr), expected, "Failed for expression: {}", expr);
    }
}

#[test]
fn test_int_in_condition() {
    let mut span = span();
    span.attributes
        .insert("retries".to_string(), Value::from("7"));
    assert!(run(
        r#"set(name, "flaky") where Int(attributes["retries"]) > 5"#,
        &mut span
    ));
    assert_eq!(span.name, "flaky");
}

#[test]
fn test_split() {
    assert_eq!(
        eval(r#"Split(attributes["http.route"], "/")"#),
        Value::Array(vec![
            Value::from(""),
            Value::from("v1"),
            Value::from("users"),
            Value::from("42"),
        ])
    );
    assert_eq!(
        eval(r#"Split("a", ",")"#),
        Value::Array(vec![Value::from("a")])
    );
    assert_eq!(eval(r#"Split(attributes["http.status_code"], ",")"#), Value::Nil);
}

#[test]
fn test_span_id_and_trace_id() {
    let mut span = span();
    run("set(span_id, SpanID(0x0102030405060708))", &mut span);
    run(
        "set(trace_id, TraceID(0x0102030405060708090a0b0c0d0e0f10))",
        &mut span,
    );
    assert_eq!(span.span_id, SpanId([1, 2, 3, 4, 5, 6, 7, 8]));
    assert_eq!(
        span.trace_id,
        TraceId([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16])
    );
}

#[test]
fn test_compare_against_span_id() {
    let mut span = span();
    span.span_id = SpanId([0xaa; 8]);
    assert!(run(
        r#"set(name, "found") where span_id == SpanID(0xaaaaaaaaaaaaaaaa)"#,
        &mut span
    ));
    assert_eq!(span.name, "found");
}

// ============================================================================
// Bind Errors
// ============================================================================

#[test]
fn test_negative_limits_are_rejected() {
    for function in ["limit", "truncate_all"] {
        assert_eq!(
            bind_err(&format!("{}(attributes, -1)", function)),
            BindError::InvalidArgument {
                function: function.to_string(),
                index: 1,
                reason: "-1 must not be negative".to_string(),
            }
        );
    }
}

#[test]
fn test_split_rejects_empty_delimiter() {
    assert_eq!(
        bind_err(r#"set(attributes["x"], Split(name, ""))"#),
        BindError::InvalidArgument {
            function: "Split".to_string(),
            index: 1,
            reason: "delimiter must not be empty".to_string(),
        }
    );
}

#[test]
fn test_id_length_is_checked() {
    assert_eq!(
        bind_err("set(span_id, SpanID(0x0102))"),
        BindError::InvalidArgument {
            function: "SpanID".to_string(),
            index: 0,
            reason: "span id must be 8 bytes".to_string(),
        }
    );
    assert_eq!(
        bind_err("set(trace_id, TraceID(0x0102030405060708))"),
        BindError::InvalidArgument {
            function: "TraceID".to_string(),
            index: 0,
            reason: "trace id must be 16 bytes".to_string(),
        }
    );
}

#[test]
fn test_invalid_regex() {
    assert!(matches!(
        bind_err(r#"set(attributes["x"], IsMatch(name, "("))"#),
        BindError::InvalidArgument { index: 1, .. }
    ));
    assert!(matches!(
        bind_err(r#"delete_matching_keys(attributes, "[a-")"#),
        BindError::InvalidArgument { index: 1, .. }
    ));
}

#[test]
fn test_argument_kinds() {
    assert_eq!(
        bind_err("set(1, name)"),
        BindError::ArgumentKind {
            function: "set".to_string(),
            index: 0,
            expected: "a path",
            found: "integer",
        }
    );
    assert_eq!(
        bind_err(r#"keep_keys(attributes, "a", name)"#),
        BindError::ArgumentKind {
            function: "keep_keys".to_string(),
            index: 2,
            expected: "a string",
            found: "path",
        }
    );
    assert_eq!(
        bind_err(r#"limit(attributes, "2")"#),
        BindError::ArgumentKind {
            function: "limit".to_string(),
            index: 1,
            expected: "an int",
            found: "string",
        }
    );
    assert_eq!(
        bind_err("set(span_id, SpanID(name))"),
        BindError::ArgumentKind {
            function: "SpanID".to_string(),
            index: 0,
            expected: "bytes",
            found: "path",
        }
    );
}

#[test]
fn test_argument_counts() {
    assert_eq!(
        bind_err("delete_key(attributes)"),
        BindError::ArgumentCount {
            function: "delete_key".to_string(),
            expected: "2".to_string(),
            actual: 1,
        }
    );
    assert_eq!(
        bind_err(r#"set(name, Concat())"#),
        BindError::ArgumentCount {
            function: "Concat".to_string(),
            expected: "at least 1".to_string(),
            actual: 0,
        }
    );
}

#[test]
fn test_metric_functions_are_not_standard() {
    assert_eq!(
        bind_err("convert_sum_to_gauge()"),
        BindError::UnknownFunction("convert_sum_to_gauge".to_string())
    );
}

// ============================================================================
// Registries
// ============================================================================

#[test]
fn test_standard_registry() {
    let registry = standard_functions::<SpanContext>();
    let mut names = registry.names();
    names.sort_unstable();
    assert_eq!(
        names,
        vec![
            "Concat",
            "Int",
            "IsMatch",
            "Split",
            "SpanID",
            "TraceID",
            "delete_key",
            "delete_matching_keys",
            "keep_keys",
            "limit",
            "replace_all_matches",
            "replace_all_patterns",
            "replace_match",
            "replace_pattern",
            "set",
            "truncate_all",
        ]
    );
}

#[test]
fn test_datapoint_registry() {
    let registry = datapoint_functions();
    assert_eq!(registry.len(), standard_functions::<SpanContext>().len() + 4);
    for name in [
        "convert_sum_to_gauge",
        "convert_gauge_to_sum",
        "convert_summary_sum_val_to_sum",
        "convert_summary_count_val_to_sum",
        "set",
        "Concat",
    ] {
        assert!(registry.contains(name), "missing function: {}", name);
    }
}

#[test]
fn test_function_kinds() {
    let registry = datapoint_functions();
    let test_cases = vec![
        ("set", FunctionKind::Editor),
        ("keep_keys", FunctionKind::Editor),
        ("replace_all_patterns", FunctionKind::Editor),
        ("convert_sum_to_gauge", FunctionKind::Editor),
        ("convert_summary_count_val_to_sum", FunctionKind::Editor),
        ("Concat", FunctionKind::Converter),
        ("IsMatch", FunctionKind::Converter),
        ("TraceID", FunctionKind::Converter),
    ];

    for (name, expected) in test_cases {
        assert_eq!(
            registry.get(name).map(|def| def.kind),
            Some(expected),
            "Failed for function: {}",
            name
        );
    }
}

// ============================================================================
// Metric Conversions
// ============================================================================

fn number_point(value: NumberValue) -> NumberDataPoint {
    NumberDataPoint {
        value,
        time_unix_nano: 1_000,
        ..Default::default()
    }
}

fn summary_point(count: u64, sum: f64) -> SummaryDataPoint {
    let mut attributes = Map::new();
    attributes.insert("route".to_string(), Value::from("/checkout"));
    SummaryDataPoint {
        attributes,
        time_unix_nano: 2_000,
        count,
        sum,
        ..Default::default()
    }
}

fn metrics() -> Vec<Metric> {
    vec![
        Metric {
            name: "requests".to_string(),
            unit: "1".to_string(),
            data: MetricData::Sum(Sum {
                aggregation_temporality: AggregationTemporality::Cumulative,
                is_monotonic: true,
                data_points: vec![
                    number_point(NumberValue::AsInt(1)),
                    number_point(NumberValue::AsInt(2)),
                ],
            }),
            ..Default::default()
        },
        Metric {
            name: "temperature".to_string(),
            data: MetricData::Gauge(Gauge {
                data_points: vec![number_point(NumberValue::AsDouble(21.5))],
            }),
            ..Default::default()
        },
        Metric {
            name: "latency".to_string(),
            description: "request latency".to_string(),
            unit: "ms".to_string(),
            data: MetricData::Summary(Summary {
                data_points: vec![summary_point(4, 10.5), summary_point(6, 3.0)],
            }),
            ..Default::default()
        },
    ]
}

// Runs a statement once for every data point present when it starts.
fn run_points(statement: &str, metrics: &mut Vec<Metric>) {
    let statement =
        ExecutableStatement::<DataPointContext>::compile(statement, &datapoint_functions())
            .unwrap();
    let mut scope = InstrumentationScope::default();
    let mut resource = Resource::default();

    let counts: Vec<usize> = metrics.iter().map(Metric::data_point_count).collect();
    for (metric_index, count) in counts.into_iter().enumerate() {
        for data_point_index in 0..count {
            let mut record = DataPointRecord::new(
                metrics,
                metric_index,
                data_point_index,
                &mut scope,
                &mut resource,
            );
            statement.execute(&mut record).unwrap();
        }
    }
}

#[test]
fn test_convert_sum_to_gauge() {
    let mut metrics = metrics();
    run_points("convert_sum_to_gauge()", &mut metrics);

    assert_eq!(
        metrics[0].data,
        MetricData::Gauge(Gauge {
            data_points: vec![
                number_point(NumberValue::AsInt(1)),
                number_point(NumberValue::AsInt(2)),
            ],
        })
    );
    // other kinds are left alone
    assert!(matches!(metrics[1].data, MetricData::Gauge(_)));
    assert!(matches!(metrics[2].data, MetricData::Summary(_)));
}

#[test]
fn test_convert_gauge_to_sum() {
    let mut metrics = metrics();
    run_points(r#"convert_gauge_to_sum("delta", false)"#, &mut metrics);

    assert_eq!(
        metrics[1].data,
        MetricData::Sum(Sum {
            aggregation_temporality: AggregationTemporality::Delta,
            is_monotonic: false,
            data_points: vec![number_point(NumberValue::AsDouble(21.5))],
        })
    );
    assert!(matches!(metrics[0].data, MetricData::Sum(_)));
}

#[test]
fn test_conversion_under_condition() {
    let mut metrics = metrics();
    run_points(
        r#"convert_sum_to_gauge() where metric.name == "other""#,
        &mut metrics,
    );
    assert!(matches!(metrics[0].data, MetricData::Sum(_)));
}

#[test]
fn test_convert_summary_sum_val_to_sum() {
    let mut metrics = metrics();
    run_points(
        r#"convert_summary_sum_val_to_sum("cumulative", false)"#,
        &mut metrics,
    );

    assert_eq!(metrics.len(), 4);
    let created = &metrics[3];
    assert_eq!(created.name, "latency_sum");
    assert_eq!(created.description, "request latency");
    assert_eq!(created.unit, "ms");

    let MetricData::Sum(sum) = &created.data else {
        panic!("expected a sum metric");
    };
    assert_eq!(sum.aggregation_temporality, AggregationTemporality::Cumulative);
    assert!(!sum.is_monotonic);
    assert_eq!(sum.data_points.len(), 2);
    assert_eq!(sum.data_points[0].value, NumberValue::AsDouble(10.5));
    assert_eq!(sum.data_points[1].value, NumberValue::AsDouble(3.0));
    assert_eq!(sum.data_points[0].time_unix_nano, 2_000);
    assert_eq!(
        sum.data_points[0].attributes.get("route"),
        Some(&Value::from("/checkout"))
    );

    // the summary itself is kept
    assert!(matches!(metrics[2].data, MetricData::Summary(_)));
}

#[test]
fn test_convert_summary_count_val_to_sum() {
    let mut metrics = metrics();
    run_points(
        r#"convert_summary_count_val_to_sum("delta", true)"#,
        &mut metrics,
    );

    assert_eq!(metrics.len(), 4);
    assert_eq!(metrics[3].name, "latency_count");
    let MetricData::Sum(sum) = &metrics[3].data else {
        panic!("expected a sum metric");
    };
    assert_eq!(sum.aggregation_temporality, AggregationTemporality::Delta);
    assert!(sum.is_monotonic);
    let values: Vec<NumberValue> = sum.data_points.iter().map(|dp| dp.value).collect();
    assert_eq!(values, vec![NumberValue::AsInt(4), NumberValue::AsInt(6)]);
}

#[test]
fn test_summary_conversion_reuses_matching_metric() {
    let mut metrics = metrics();
    metrics.push(Metric {
        name: "latency_count".to_string(),
        data: MetricData::Sum(Sum {
            aggregation_temporality: AggregationTemporality::Delta,
            is_monotonic: true,
            data_points: vec![number_point(NumberValue::AsInt(1))],
        }),
        ..Default::default()
    });

    run_points(
        r#"convert_summary_count_val_to_sum("delta", true)"#,
        &mut metrics,
    );

    assert_eq!(metrics.len(), 4);
    let MetricData::Sum(sum) = &metrics[3].data else {
        panic!("expected a sum metric");
    };
    assert_eq!(sum.data_points.len(), 3);
}

#[test]
fn test_unknown_temporality() {
    let result = ExecutableStatement::<DataPointContext>::compile(
        r#"convert_gauge_to_sum("weekly", true)"#,
        &datapoint_functions(),
    );
    match result {
        Err(StatementError::Bind(err)) => assert_eq!(
            err,
            BindError::InvalidArgument {
                function: "convert_gauge_to_sum".to_string(),
                index: 0,
                reason: r#"unknown aggregation temporality 'weekly', expected "delta" or "cumulative""#
                    .to_string(),
            }
        ),
        Err(other) => panic!("unexpected error {}", other),
        Ok(_) => panic!("expected a bind error"),
    }
}
