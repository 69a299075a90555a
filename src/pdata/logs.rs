use serde::{Deserialize, Serialize};

use crate::{
    pdata::{InstrumentationScope, InvalidEnumValue, Resource, SpanId, TraceId},
    value::{Map, Value},
};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogsData {
    pub resource_logs: Vec<ResourceLogs>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceLogs {
    pub resource: Resource,
    pub scope_logs: Vec<ScopeLogs>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScopeLogs {
    pub scope: InstrumentationScope,
    pub log_records: Vec<LogRecord>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogRecord {
    pub time_unix_nano: u64,
    pub observed_time_unix_nano: u64,
    pub severity_number: SeverityNumber,
    pub severity_text: String,
    pub body: Value,
    pub attributes: Map,
    pub dropped_attributes_count: u32,
    pub flags: u32,
    pub trace_id: TraceId,
    pub span_id: SpanId,
}

/// Log severity, `0` (unspecified) through `24` (FATAL4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SeverityNumber(u8);

impl SeverityNumber {
    pub const UNSPECIFIED: SeverityNumber = SeverityNumber(0);
    pub const TRACE: SeverityNumber = SeverityNumber(1);
    pub const DEBUG: SeverityNumber = SeverityNumber(5);
    pub const INFO: SeverityNumber = SeverityNumber(9);
    pub const WARN: SeverityNumber = SeverityNumber(13);
    pub const ERROR: SeverityNumber = SeverityNumber(17);
    pub const FATAL: SeverityNumber = SeverityNumber(21);

    const MAX: i64 = 24;

    pub fn get(&self) -> u8 {
        self.0
    }
}

impl From<SeverityNumber> for i64 {
    fn from(s: SeverityNumber) -> Self {
        i64::from(s.0)
    }
}

impl TryFrom<i64> for SeverityNumber {
    type Error = InvalidEnumValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (0..=Self::MAX).contains(&value) {
            Ok(SeverityNumber(value as u8))
        } else {
            Err(InvalidEnumValue {
                kind: "severity number",
                value,
            })
        }
    }
}
