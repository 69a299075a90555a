use crate::{
    ast::{Field, Path},
    context::TransformContext,
    contexts::common::{
        ResourceAccess, ResourcePath, ScopeAccess, ScopePath, expect_end, expect_int, id_from_bytes,
        id_from_hex, lookup_enum, map_get, map_set, scalar, set_map, set_string, set_u32, set_u64,
        split_first, u64_value, unknown_field,
    },
    evaluator::{BindError, EvalError},
    pdata::{InstrumentationScope, LogRecord, Resource, SeverityNumber},
    value::Value,
};

/// Statements run once per log record.
#[derive(Debug, Clone, Copy)]
pub struct LogContext;

pub struct LogRecordRef<'a> {
    pub log: &'a mut LogRecord,
    pub scope: &'a mut InstrumentationScope,
    pub resource: &'a mut Resource,
}

impl<'a> LogRecordRef<'a> {
    pub fn new(
        log: &'a mut LogRecord,
        scope: &'a mut InstrumentationScope,
        resource: &'a mut Resource,
    ) -> Self {
        LogRecordRef {
            log,
            scope,
            resource,
        }
    }
}

impl ResourceAccess for LogRecordRef<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn resource_mut(&mut self) -> &mut Resource {
        self.resource
    }
}

impl ScopeAccess for LogRecordRef<'_> {
    fn scope(&self) -> &InstrumentationScope {
        self.scope
    }

    fn scope_mut(&mut self) -> &mut InstrumentationScope {
        self.scope
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LogPath {
    Resource(ResourcePath),
    Scope(ScopePath),
    TimeUnixNano,
    ObservedTimeUnixNano,
    SeverityNumber,
    SeverityText,
    Body,
    Attributes,
    AttributeKey(String),
    DroppedAttributesCount,
    Flags,
    TraceId,
    TraceIdString,
    SpanId,
    SpanIdString,
}

pub(crate) const LOG_ENUMS: &[(&str, i64)] = &[
    ("SEVERITY_NUMBER_UNSPECIFIED", 0),
    ("SEVERITY_NUMBER_TRACE", 1),
    ("SEVERITY_NUMBER_TRACE2", 2),
    ("SEVERITY_NUMBER_TRACE3", 3),
    ("SEVERITY_NUMBER_TRACE4", 4),
    ("SEVERITY_NUMBER_DEBUG", 5),
    ("SEVERITY_NUMBER_DEBUG2", 6),
    ("SEVERITY_NUMBER_DEBUG3", 7),
    ("SEVERITY_NUMBER_DEBUG4", 8),
    ("SEVERITY_NUMBER_INFO", 9),
    ("SEVERITY_NUMBER_INFO2", 10),
    ("SEVERITY_NUMBER_INFO3", 11),
    ("SEVERITY_NUMBER_INFO4", 12),
    ("SEVERITY_NUMBER_WARN", 13),
    ("SEVERITY_NUMBER_WARN2", 14),
    ("SEVERITY_NUMBER_WARN3", 15),
    ("SEVERITY_NUMBER_WARN4", 16),
    ("SEVERITY_NUMBER_ERROR", 17),
    ("SEVERITY_NUMBER_ERROR2", 18),
    ("SEVERITY_NUMBER_ERROR3", 19),
    ("SEVERITY_NUMBER_ERROR4", 20),
    ("SEVERITY_NUMBER_FATAL", 21),
    ("SEVERITY_NUMBER_FATAL2", 22),
    ("SEVERITY_NUMBER_FATAL3", 23),
    ("SEVERITY_NUMBER_FATAL4", 24),
];

fn parse_log_path(fields: &[Field]) -> Result<LogPath, String> {
    let (first, rest) = split_first(fields, "log")?;

    match first.name.as_str() {
        "resource" => {
            scalar(first)?;
            return ResourcePath::parse(rest).map(LogPath::Resource);
        }
        "instrumentation_scope" => {
            scalar(first)?;
            return ScopePath::parse(rest).map(LogPath::Scope);
        }
        "trace_id" | "span_id" => {
            scalar(first)?;
            let as_string = match rest {
                [] => false,
                [field] if field.name == "string" && field.map_key.is_none() => true,
                _ => return Err(format!("'{}' only supports the 'string' sub field", first.name)),
            };
            return Ok(match (first.name.as_str(), as_string) {
                ("trace_id", false) => LogPath::TraceId,
                ("trace_id", true) => LogPath::TraceIdString,
                (_, false) => LogPath::SpanId,
                (_, true) => LogPath::SpanIdString,
            });
        }
        _ => {}
    }

    let path = match first.name.as_str() {
        "attributes" => match &first.map_key {
            Some(key) => LogPath::AttributeKey(key.clone()),
            None => LogPath::Attributes,
        },
        name => {
            scalar(first)?;
            match name {
                "time_unix_nano" => LogPath::TimeUnixNano,
                "observed_time_unix_nano" => LogPath::ObservedTimeUnixNano,
                "severity_number" => LogPath::SeverityNumber,
                "severity_text" => LogPath::SeverityText,
                "body" => LogPath::Body,
                "dropped_attributes_count" => LogPath::DroppedAttributesCount,
                "flags" => LogPath::Flags,
                other => return Err(unknown_field(other, "log")),
            }
        }
    };
    expect_end(rest)?;
    Ok(path)
}

impl TransformContext for LogContext {
    type Record<'a> = LogRecordRef<'a>;
    type Accessor = LogPath;

    const NAME: &'static str = "log";

    fn parse_path(path: &Path) -> Result<LogPath, BindError> {
        parse_log_path(&path.fields).map_err(|reason| BindError::invalid_path(path, Self::NAME, reason))
    }

    fn parse_enum(symbol: &str) -> Option<i64> {
        lookup_enum(LOG_ENUMS, symbol)
    }

    fn get(accessor: &LogPath, record: &LogRecordRef<'_>) -> Result<Value, EvalError> {
        let log = &*record.log;
        Ok(match accessor {
            LogPath::Resource(path) => path.get(record),
            LogPath::Scope(path) => path.get(record),
            LogPath::TimeUnixNano => u64_value(log.time_unix_nano),
            LogPath::ObservedTimeUnixNano => u64_value(log.observed_time_unix_nano),
            LogPath::SeverityNumber => Value::Integer(log.severity_number.into()),
            LogPath::SeverityText => Value::String(log.severity_text.clone()),
            LogPath::Body => log.body.clone(),
            LogPath::Attributes => Value::Map(log.attributes.clone()),
            LogPath::AttributeKey(key) => map_get(&log.attributes, key),
            LogPath::DroppedAttributesCount => Value::Integer(log.dropped_attributes_count.into()),
            LogPath::Flags => Value::Integer(log.flags.into()),
            LogPath::TraceId => Value::Bytes(log.trace_id.0.to_vec()),
            LogPath::TraceIdString => Value::String(log.trace_id.to_hex()),
            LogPath::SpanId => Value::Bytes(log.span_id.0.to_vec()),
            LogPath::SpanIdString => Value::String(log.span_id.to_hex()),
        })
    }

    fn set(accessor: &LogPath, record: &mut LogRecordRef<'_>, value: Value) -> Result<(), EvalError> {
        let log = &mut *record.log;
        match accessor {
            LogPath::Resource(path) => return path.set(record, value),
            LogPath::Scope(path) => return path.set(record, value),
            LogPath::TimeUnixNano => set_u64(&mut log.time_unix_nano, "time_unix_nano", value)?,
            LogPath::ObservedTimeUnixNano => set_u64(
                &mut log.observed_time_unix_nano,
                "observed_time_unix_nano",
                value,
            )?,
            LogPath::SeverityNumber => {
                log.severity_number =
                    SeverityNumber::try_from(expect_int("severity_number", &value)?)?
            }
            LogPath::SeverityText => set_string(&mut log.severity_text, "severity_text", value)?,
            LogPath::Body => {
                if !value.is_nil() {
                    log.body = value;
                }
            }
            LogPath::Attributes => set_map(&mut log.attributes, "attributes", value)?,
            LogPath::AttributeKey(key) => map_set(&mut log.attributes, key, value),
            LogPath::DroppedAttributesCount => set_u32(
                &mut log.dropped_attributes_count,
                "dropped_attributes_count",
                value,
            )?,
            LogPath::Flags => set_u32(&mut log.flags, "flags", value)?,
            LogPath::TraceId => log.trace_id = id_from_bytes("trace_id", &value)?,
            LogPath::TraceIdString => log.trace_id = id_from_hex("trace_id.string", &value)?,
            LogPath::SpanId => log.span_id = id_from_bytes("span_id", &value)?,
            LogPath::SpanIdString => log.span_id = id_from_hex("span_id.string", &value)?,
        }
        Ok(())
    }
}
