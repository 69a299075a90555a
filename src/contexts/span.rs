use crate::{
    ast::{Field, Path},
    context::TransformContext,
    contexts::common::{
        ResourceAccess, ResourcePath, ScopeAccess, ScopePath, expect_end, expect_int, id_from_bytes,
        id_from_hex, lookup_enum, map_get, map_set, mismatch, scalar, set_map, set_string, set_u32,
        set_u64, split_first, u64_value, unknown_field,
    },
    evaluator::{BindError, EvalError},
    pdata::{InstrumentationScope, Resource, Span, SpanKind, StatusCode},
    value::{Map, Value},
};

/// Statements run once per span.
#[derive(Debug, Clone, Copy)]
pub struct SpanContext;

pub struct SpanRecord<'a> {
    pub span: &'a mut Span,
    pub scope: &'a mut InstrumentationScope,
    pub resource: &'a mut Resource,
}

impl<'a> SpanRecord<'a> {
    pub fn new(
        span: &'a mut Span,
        scope: &'a mut InstrumentationScope,
        resource: &'a mut Resource,
    ) -> Self {
        SpanRecord {
            span,
            scope,
            resource,
        }
    }
}

impl ResourceAccess for SpanRecord<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn resource_mut(&mut self) -> &mut Resource {
        self.resource
    }
}

impl ScopeAccess for SpanRecord<'_> {
    fn scope(&self) -> &InstrumentationScope {
        self.scope
    }

    fn scope_mut(&mut self) -> &mut InstrumentationScope {
        self.scope
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SpanPath {
    Resource(ResourcePath),
    Scope(ScopePath),
    TraceId,
    TraceIdString,
    SpanId,
    SpanIdString,
    ParentSpanId,
    ParentSpanIdString,
    TraceState,
    TraceStateKey(String),
    Name,
    Kind,
    StartTimeUnixNano,
    EndTimeUnixNano,
    Attributes,
    AttributeKey(String),
    DroppedAttributesCount,
    DroppedEventsCount,
    DroppedLinksCount,
    Status,
    StatusCode,
    StatusMessage,
}

pub(crate) const SPAN_ENUMS: &[(&str, i64)] = &[
    ("SPAN_KIND_UNSPECIFIED", 0),
    ("SPAN_KIND_INTERNAL", 1),
    ("SPAN_KIND_SERVER", 2),
    ("SPAN_KIND_CLIENT", 3),
    ("SPAN_KIND_PRODUCER", 4),
    ("SPAN_KIND_CONSUMER", 5),
    ("STATUS_CODE_UNSET", 0),
    ("STATUS_CODE_OK", 1),
    ("STATUS_CODE_ERROR", 2),
];

fn parse_span_path(fields: &[Field]) -> Result<SpanPath, String> {
    let (first, rest) = split_first(fields, "span")?;

    // Fields that take a sub path
    match first.name.as_str() {
        "resource" => {
            scalar(first)?;
            return ResourcePath::parse(rest).map(SpanPath::Resource);
        }
        "instrumentation_scope" => {
            scalar(first)?;
            return ScopePath::parse(rest).map(SpanPath::Scope);
        }
        "trace_id" | "span_id" | "parent_span_id" => {
            scalar(first)?;
            let as_string = match rest {
                [] => false,
                [field] if field.name == "string" && field.map_key.is_none() => true,
                _ => return Err(format!("'{}' only supports the 'string' sub field", first.name)),
            };
            return Ok(match (first.name.as_str(), as_string) {
                ("trace_id", false) => SpanPath::TraceId,
                ("trace_id", true) => SpanPath::TraceIdString,
                ("span_id", false) => SpanPath::SpanId,
                ("span_id", true) => SpanPath::SpanIdString,
                (_, false) => SpanPath::ParentSpanId,
                (_, true) => SpanPath::ParentSpanIdString,
            });
        }
        "status" => {
            scalar(first)?;
            return match rest {
                [] => Ok(SpanPath::Status),
                [field] if field.map_key.is_none() && field.name == "code" => Ok(SpanPath::StatusCode),
                [field] if field.map_key.is_none() && field.name == "message" => {
                    Ok(SpanPath::StatusMessage)
                }
                [field, ..] => Err(unknown_field(&field.name, "status")),
            };
        }
        _ => {}
    }

    let path = match first.name.as_str() {
        "attributes" => match &first.map_key {
            Some(key) => SpanPath::AttributeKey(key.clone()),
            None => SpanPath::Attributes,
        },
        "trace_state" => match &first.map_key {
            Some(key) => SpanPath::TraceStateKey(key.clone()),
            None => SpanPath::TraceState,
        },
        name => {
            scalar(first)?;
            match name {
                "name" => SpanPath::Name,
                "kind" => SpanPath::Kind,
                "start_time_unix_nano" => SpanPath::StartTimeUnixNano,
                "end_time_unix_nano" => SpanPath::EndTimeUnixNano,
                "dropped_attributes_count" => SpanPath::DroppedAttributesCount,
                "dropped_events_count" => SpanPath::DroppedEventsCount,
                "dropped_links_count" => SpanPath::DroppedLinksCount,
                other => return Err(unknown_field(other, "span")),
            }
        }
    };
    expect_end(rest)?;
    Ok(path)
}

impl TransformContext for SpanContext {
    type Record<'a> = SpanRecord<'a>;
    type Accessor = SpanPath;

    const NAME: &'static str = "span";

    fn parse_path(path: &Path) -> Result<SpanPath, BindError> {
        parse_span_path(&path.fields).map_err(|reason| BindError::invalid_path(path, Self::NAME, reason))
    }

    fn parse_enum(symbol: &str) -> Option<i64> {
        lookup_enum(SPAN_ENUMS, symbol)
    }

    fn get(accessor: &SpanPath, record: &SpanRecord<'_>) -> Result<Value, EvalError> {
        let span = &*record.span;
        Ok(match accessor {
            SpanPath::Resource(path) => path.get(record),
            SpanPath::Scope(path) => path.get(record),
            SpanPath::TraceId => Value::Bytes(span.trace_id.0.to_vec()),
            SpanPath::TraceIdString => Value::String(span.trace_id.to_hex()),
            SpanPath::SpanId => Value::Bytes(span.span_id.0.to_vec()),
            SpanPath::SpanIdString => Value::String(span.span_id.to_hex()),
            SpanPath::ParentSpanId => Value::Bytes(span.parent_span_id.0.to_vec()),
            SpanPath::ParentSpanIdString => Value::String(span.parent_span_id.to_hex()),
            SpanPath::TraceState => Value::String(span.trace_state.clone()),
            SpanPath::TraceStateKey(key) => trace_state_get(&span.trace_state, key)
                .map(Value::from)
                .unwrap_or_default(),
            SpanPath::Name => Value::String(span.name.clone()),
            SpanPath::Kind => Value::Integer(span.kind.into()),
            SpanPath::StartTimeUnixNano => u64_value(span.start_time_unix_nano),
            SpanPath::EndTimeUnixNano => u64_value(span.end_time_unix_nano),
            SpanPath::Attributes => Value::Map(span.attributes.clone()),
            SpanPath::AttributeKey(key) => map_get(&span.attributes, key),
            SpanPath::DroppedAttributesCount => Value::Integer(span.dropped_attributes_count.into()),
            SpanPath::DroppedEventsCount => Value::Integer(span.dropped_events_count.into()),
            SpanPath::DroppedLinksCount => Value::Integer(span.dropped_links_count.into()),
            SpanPath::Status => {
                let mut status = Map::new();
                status.insert("code".to_string(), Value::Integer(span.status.code.into()));
                status.insert("message".to_string(), Value::String(span.status.message.clone()));
                Value::Map(status)
            }
            SpanPath::StatusCode => Value::Integer(span.status.code.into()),
            SpanPath::StatusMessage => Value::String(span.status.message.clone()),
        })
    }

    fn set(accessor: &SpanPath, record: &mut SpanRecord<'_>, value: Value) -> Result<(), EvalError> {
        let span = &mut *record.span;
        match accessor {
            SpanPath::Resource(path) => return path.set(record, value),
            SpanPath::Scope(path) => return path.set(record, value),
            SpanPath::TraceId => span.trace_id = id_from_bytes("trace_id", &value)?,
            SpanPath::TraceIdString => span.trace_id = id_from_hex("trace_id.string", &value)?,
            SpanPath::SpanId => span.span_id = id_from_bytes("span_id", &value)?,
            SpanPath::SpanIdString => span.span_id = id_from_hex("span_id.string", &value)?,
            SpanPath::ParentSpanId => span.parent_span_id = id_from_bytes("parent_span_id", &value)?,
            SpanPath::ParentSpanIdString => {
                span.parent_span_id = id_from_hex("parent_span_id.string", &value)?
            }
            SpanPath::TraceState => set_string(&mut span.trace_state, "trace_state", value)?,
            SpanPath::TraceStateKey(key) => match value {
                Value::String(s) => trace_state_set(&mut span.trace_state, key, &s),
                other => return Err(mismatch("trace_state", "string", &other)),
            },
            SpanPath::Name => set_string(&mut span.name, "name", value)?,
            SpanPath::Kind => span.kind = SpanKind::try_from(expect_int("kind", &value)?)?,
            SpanPath::StartTimeUnixNano => {
                set_u64(&mut span.start_time_unix_nano, "start_time_unix_nano", value)?
            }
            SpanPath::EndTimeUnixNano => {
                set_u64(&mut span.end_time_unix_nano, "end_time_unix_nano", value)?
            }
            SpanPath::Attributes => set_map(&mut span.attributes, "attributes", value)?,
            SpanPath::AttributeKey(key) => map_set(&mut span.attributes, key, value),
            SpanPath::DroppedAttributesCount => set_u32(
                &mut span.dropped_attributes_count,
                "dropped_attributes_count",
                value,
            )?,
            SpanPath::DroppedEventsCount => {
                set_u32(&mut span.dropped_events_count, "dropped_events_count", value)?
            }
            SpanPath::DroppedLinksCount => {
                set_u32(&mut span.dropped_links_count, "dropped_links_count", value)?
            }
            SpanPath::Status => {
                let status = match value {
                    Value::Map(status) => status,
                    other => return Err(mismatch("status", "map", &other)),
                };
                let code = match status.get("code") {
                    Some(code) => Some(StatusCode::try_from(expect_int("status.code", code)?)?),
                    None => None,
                };
                let message = match status.get("message") {
                    Some(Value::String(message)) => Some(message.clone()),
                    Some(other) => return Err(mismatch("status.message", "string", other)),
                    None => None,
                };
                if let Some(code) = code {
                    span.status.code = code;
                }
                if let Some(message) = message {
                    span.status.message = message;
                }
            }
            SpanPath::StatusCode => {
                span.status.code = StatusCode::try_from(expect_int("status.code", &value)?)?
            }
            SpanPath::StatusMessage => set_string(&mut span.status.message, "status.message", value)?,
        }
        Ok(())
    }
}

/// Reads one member of a W3C `tracestate` list.
fn trace_state_get<'a>(state: &'a str, key: &str) -> Option<&'a str> {
    state
        .split(',')
        .filter_map(|member| member.trim().split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Updated members move to the front of the list.
fn trace_state_set(state: &mut String, key: &str, value: &str) {
    let mut members = vec![format!("{key}={value}")];
    members.extend(
        state
            .split(',')
            .map(str::trim)
            .filter(|member| !member.is_empty())
            .filter(|member| member.split_once('=').is_none_or(|(k, _)| k != key))
            .map(str::to_string),
    );
    *state = members.join(",");
}
