//! Data point context.
//!
//! A record is one data point of one metric. The adapter addresses the point
//! by index into the scope's metric list rather than borrowing it directly,
//! so functions such as `convert_sum_to_gauge` can rewrite the owning metric
//! or append sibling metrics while the record is live.
//!
//! Fields that do not exist on the point's kind (`count` on a gauge point,
//! `value_int` on a double point) read as nil and ignore writes.
//!
//! Exponential histogram points expose `scale`, `zero_count` and the
//! `positive`/`negative` bucket ranges, each addressable as a whole map or
//! through `.offset` and `.bucket_counts`.

use crate::{
    ast::{Field, Path},
    context::TransformContext,
    contexts::common::{
        ResourceAccess, ResourcePath, ScopeAccess, ScopePath, expect_bool, expect_end, expect_float,
        expect_int, lookup_enum, map_get, map_set, mismatch, scalar, set_map, set_string, set_u32,
        set_u64, split_first, u64_value, unknown_field,
    },
    evaluator::{BindError, EvalError},
    pdata::{
        AggregationTemporality, Buckets, ExponentialHistogramDataPoint, HistogramDataPoint, InstrumentationScope, Metric, MetricData,
        NumberDataPoint, NumberValue, Resource, SummaryDataPoint, ValueAtQuantile,
        metrics::FLAG_NO_RECORDED_VALUE,
    },
    value::{Map, Value},
};

#[derive(Debug, Clone, Copy)]
pub struct DataPointContext;

pub struct DataPointRecord<'a> {
    pub metrics: &'a mut Vec<Metric>,
    pub metric_index: usize,
    pub data_point_index: usize,
    pub scope: &'a mut InstrumentationScope,
    pub resource: &'a mut Resource,
}

#[derive(Clone, Copy)]
pub enum DataPointRef<'a> {
    Number(&'a NumberDataPoint),
    Histogram(&'a HistogramDataPoint),
    ExponentialHistogram(&'a ExponentialHistogramDataPoint),
    Summary(&'a SummaryDataPoint),
}

pub enum DataPointMut<'a> {
    Number(&'a mut NumberDataPoint),
    Histogram(&'a mut HistogramDataPoint),
    ExponentialHistogram(&'a mut ExponentialHistogramDataPoint),
    Summary(&'a mut SummaryDataPoint),
}

impl<'a> DataPointRecord<'a> {
    pub fn new(
        metrics: &'a mut Vec<Metric>,
        metric_index: usize,
        data_point_index: usize,
        scope: &'a mut InstrumentationScope,
        resource: &'a mut Resource,
    ) -> Self {
        DataPointRecord {
            metrics,
            metric_index,
            data_point_index,
            scope,
            resource,
        }
    }

    pub fn metric(&self) -> Result<&Metric, EvalError> {
        self.metrics
            .get(self.metric_index)
            .ok_or(EvalError::MissingRecord("metric"))
    }

    pub fn metric_mut(&mut self) -> Result<&mut Metric, EvalError> {
        self.metrics
            .get_mut(self.metric_index)
            .ok_or(EvalError::MissingRecord("metric"))
    }

    pub fn data_point(&self) -> Result<DataPointRef<'_>, EvalError> {
        let index = self.data_point_index;
        let point = match &self.metric()?.data {
            MetricData::Gauge(g) => g.data_points.get(index).map(DataPointRef::Number),
            MetricData::Sum(s) => s.data_points.get(index).map(DataPointRef::Number),
            MetricData::Histogram(h) => h.data_points.get(index).map(DataPointRef::Histogram),
            MetricData::ExponentialHistogram(h) => {
                h.data_points.get(index).map(DataPointRef::ExponentialHistogram)
            }
            MetricData::Summary(s) => s.data_points.get(index).map(DataPointRef::Summary),
            MetricData::Empty => None,
        };
        point.ok_or(EvalError::MissingRecord("data point"))
    }

    pub fn data_point_mut(&mut self) -> Result<DataPointMut<'_>, EvalError> {
        let index = self.data_point_index;
        let point = match &mut self.metric_mut()?.data {
            MetricData::Gauge(g) => g.data_points.get_mut(index).map(DataPointMut::Number),
            MetricData::Sum(s) => s.data_points.get_mut(index).map(DataPointMut::Number),
            MetricData::Histogram(h) => h.data_points.get_mut(index).map(DataPointMut::Histogram),
            MetricData::ExponentialHistogram(h) => {
                h.data_points.get_mut(index).map(DataPointMut::ExponentialHistogram)
            }
            MetricData::Summary(s) => s.data_points.get_mut(index).map(DataPointMut::Summary),
            MetricData::Empty => None,
        };
        point.ok_or(EvalError::MissingRecord("data point"))
    }
}

impl<'a> DataPointRef<'a> {
    fn attributes(self) -> &'a Map {
        match self {
            DataPointRef::Number(dp) => &dp.attributes,
            DataPointRef::Histogram(dp) => &dp.attributes,
            DataPointRef::ExponentialHistogram(dp) => &dp.attributes,
            DataPointRef::Summary(dp) => &dp.attributes,
        }
    }

    fn start_time_unix_nano(self) -> u64 {
        match self {
            DataPointRef::Number(dp) => dp.start_time_unix_nano,
            DataPointRef::Histogram(dp) => dp.start_time_unix_nano,
            DataPointRef::ExponentialHistogram(dp) => dp.start_time_unix_nano,
            DataPointRef::Summary(dp) => dp.start_time_unix_nano,
        }
    }

    fn time_unix_nano(self) -> u64 {
        match self {
            DataPointRef::Number(dp) => dp.time_unix_nano,
            DataPointRef::Histogram(dp) => dp.time_unix_nano,
            DataPointRef::ExponentialHistogram(dp) => dp.time_unix_nano,
            DataPointRef::Summary(dp) => dp.time_unix_nano,
        }
    }

    fn flags(self) -> u32 {
        match self {
            DataPointRef::Number(dp) => dp.flags,
            DataPointRef::Histogram(dp) => dp.flags,
            DataPointRef::ExponentialHistogram(dp) => dp.flags,
            DataPointRef::Summary(dp) => dp.flags,
        }
    }
}

impl<'a> DataPointMut<'a> {
    fn attributes(self) -> &'a mut Map {
        match self {
            DataPointMut::Number(dp) => &mut dp.attributes,
            DataPointMut::Histogram(dp) => &mut dp.attributes,
            DataPointMut::ExponentialHistogram(dp) => &mut dp.attributes,
            DataPointMut::Summary(dp) => &mut dp.attributes,
        }
    }

    fn start_time_unix_nano(self) -> &'a mut u64 {
        match self {
            DataPointMut::Number(dp) => &mut dp.start_time_unix_nano,
            DataPointMut::Histogram(dp) => &mut dp.start_time_unix_nano,
            DataPointMut::ExponentialHistogram(dp) => &mut dp.start_time_unix_nano,
            DataPointMut::Summary(dp) => &mut dp.start_time_unix_nano,
        }
    }

    fn time_unix_nano(self) -> &'a mut u64 {
        match self {
            DataPointMut::Number(dp) => &mut dp.time_unix_nano,
            DataPointMut::Histogram(dp) => &mut dp.time_unix_nano,
            DataPointMut::ExponentialHistogram(dp) => &mut dp.time_unix_nano,
            DataPointMut::Summary(dp) => &mut dp.time_unix_nano,
        }
    }

    fn flags(self) -> &'a mut u32 {
        match self {
            DataPointMut::Number(dp) => &mut dp.flags,
            DataPointMut::Histogram(dp) => &mut dp.flags,
            DataPointMut::ExponentialHistogram(dp) => &mut dp.flags,
            DataPointMut::Summary(dp) => &mut dp.flags,
        }
    }
}

impl ResourceAccess for DataPointRecord<'_> {
    fn resource(&self) -> &Resource {
        self.resource
    }

    fn resource_mut(&mut self) -> &mut Resource {
        self.resource
    }
}

impl ScopeAccess for DataPointRecord<'_> {
    fn scope(&self) -> &InstrumentationScope {
        self.scope
    }

    fn scope_mut(&mut self) -> &mut InstrumentationScope {
        self.scope
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricPath {
    Name,
    Description,
    Unit,
    Type,
    AggregationTemporality,
    IsMonotonic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BucketsPath {
    Whole,
    Offset,
    BucketCounts,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DataPointPath {
    Resource(ResourcePath),
    Scope(ScopePath),
    Metric(MetricPath),
    Attributes,
    AttributeKey(String),
    StartTimeUnixNano,
    TimeUnixNano,
    ValueDouble,
    ValueInt,
    Flags,
    Count,
    Sum,
    BucketCounts,
    ExplicitBounds,
    QuantileValues,
    Scale,
    ZeroCount,
    Positive(BucketsPath),
    Negative(BucketsPath),
}

pub(crate) const DATAPOINT_ENUMS: &[(&str, i64)] = &[
    ("AGGREGATION_TEMPORALITY_UNSPECIFIED", 0),
    ("AGGREGATION_TEMPORALITY_DELTA", 1),
    ("AGGREGATION_TEMPORALITY_CUMULATIVE", 2),
    ("METRIC_DATA_TYPE_NONE", 0),
    ("METRIC_DATA_TYPE_GAUGE", 1),
    ("METRIC_DATA_TYPE_SUM", 2),
    ("METRIC_DATA_TYPE_HISTOGRAM", 3),
    ("METRIC_DATA_TYPE_EXPONENTIAL_HISTOGRAM", 4),
    ("METRIC_DATA_TYPE_SUMMARY", 5),
    ("FLAG_NONE", 0),
    ("FLAG_NO_RECORDED_VALUE", FLAG_NO_RECORDED_VALUE as i64),
];

fn parse_metric_path(fields: &[Field]) -> Result<MetricPath, String> {
    let (first, rest) = split_first(fields, "metric")?;
    scalar(first)?;
    let path = match first.name.as_str() {
        "name" => MetricPath::Name,
        "description" => MetricPath::Description,
        "unit" => MetricPath::Unit,
        "type" => MetricPath::Type,
        "aggregation_temporality" => MetricPath::AggregationTemporality,
        "is_monotonic" => MetricPath::IsMonotonic,
        other => return Err(unknown_field(other, "metric")),
    };
    expect_end(rest)?;
    Ok(path)
}

fn parse_buckets_path(fields: &[Field]) -> Result<BucketsPath, String> {
    let Some((first, rest)) = fields.split_first() else {
        return Ok(BucketsPath::Whole);
    };
    scalar(first)?;
    let path = match first.name.as_str() {
        "offset" => BucketsPath::Offset,
        "bucket_counts" => BucketsPath::BucketCounts,
        other => return Err(unknown_field(other, "buckets")),
    };
    expect_end(rest)?;
    Ok(path)
}

fn parse_datapoint_path(fields: &[Field]) -> Result<DataPointPath, String> {
    let (first, rest) = split_first(fields, "datapoint")?;

    match first.name.as_str() {
        "resource" => {
            scalar(first)?;
            return ResourcePath::parse(rest).map(DataPointPath::Resource);
        }
        "instrumentation_scope" => {
            scalar(first)?;
            return ScopePath::parse(rest).map(DataPointPath::Scope);
        }
        "metric" => {
            scalar(first)?;
            return parse_metric_path(rest).map(DataPointPath::Metric);
        }
        "positive" => {
            scalar(first)?;
            return parse_buckets_path(rest).map(DataPointPath::Positive);
        }
        "negative" => {
            scalar(first)?;
            return parse_buckets_path(rest).map(DataPointPath::Negative);
        }
        _ => {}
    }

    let path = match first.name.as_str() {
        "attributes" => match &first.map_key {
            Some(key) => DataPointPath::AttributeKey(key.clone()),
            None => DataPointPath::Attributes,
        },
        name => {
            scalar(first)?;
            match name {
                "start_time_unix_nano" => DataPointPath::StartTimeUnixNano,
                "time_unix_nano" => DataPointPath::TimeUnixNano,
                "value_double" => DataPointPath::ValueDouble,
                "value_int" => DataPointPath::ValueInt,
                "flags" => DataPointPath::Flags,
                "count" => DataPointPath::Count,
                "sum" => DataPointPath::Sum,
                "bucket_counts" => DataPointPath::BucketCounts,
                "explicit_bounds" => DataPointPath::ExplicitBounds,
                "quantile_values" => DataPointPath::QuantileValues,
                "scale" => DataPointPath::Scale,
                "zero_count" => DataPointPath::ZeroCount,
                other => return Err(unknown_field(other, "datapoint")),
            }
        }
    };
    expect_end(rest)?;
    Ok(path)
}

impl TransformContext for DataPointContext {
    type Record<'a> = DataPointRecord<'a>;
    type Accessor = DataPointPath;

    const NAME: &'static str = "datapoint";

    fn parse_path(path: &Path) -> Result<DataPointPath, BindError> {
        parse_datapoint_path(&path.fields)
            .map_err(|reason| BindError::invalid_path(path, Self::NAME, reason))
    }

    fn parse_enum(symbol: &str) -> Option<i64> {
        lookup_enum(DATAPOINT_ENUMS, symbol)
    }

    fn get(accessor: &DataPointPath, record: &DataPointRecord<'_>) -> Result<Value, EvalError> {
        match accessor {
            DataPointPath::Resource(path) => return Ok(path.get(record)),
            DataPointPath::Scope(path) => return Ok(path.get(record)),
            DataPointPath::Metric(path) => return get_metric(*path, record.metric()?),
            _ => {}
        }

        let point = record.data_point()?;
        Ok(match (accessor, point) {
            (DataPointPath::Attributes, point) => Value::Map(point.attributes().clone()),
            (DataPointPath::AttributeKey(key), point) => map_get(point.attributes(), key),
            (DataPointPath::StartTimeUnixNano, point) => u64_value(point.start_time_unix_nano()),
            (DataPointPath::TimeUnixNano, point) => u64_value(point.time_unix_nano()),
            (DataPointPath::Flags, point) => Value::Integer(point.flags().into()),
            (DataPointPath::ValueDouble, DataPointRef::Number(dp)) => match dp.value {
                NumberValue::AsDouble(v) => Value::Float(v),
                NumberValue::AsInt(_) => Value::Nil,
            },
            (DataPointPath::ValueInt, DataPointRef::Number(dp)) => match dp.value {
                NumberValue::AsInt(v) => Value::Integer(v),
                NumberValue::AsDouble(_) => Value::Nil,
            },
            (DataPointPath::Count, DataPointRef::Histogram(dp)) => u64_value(dp.count),
            (DataPointPath::Count, DataPointRef::ExponentialHistogram(dp)) => u64_value(dp.count),
            (DataPointPath::Count, DataPointRef::Summary(dp)) => u64_value(dp.count),
            (DataPointPath::Sum, DataPointRef::Histogram(dp)) => {
                dp.sum.map(Value::Float).unwrap_or_default()
            }
            (DataPointPath::Sum, DataPointRef::ExponentialHistogram(dp)) => {
                dp.sum.map(Value::Float).unwrap_or_default()
            }
            (DataPointPath::Sum, DataPointRef::Summary(dp)) => Value::Float(dp.sum),
            (DataPointPath::BucketCounts, DataPointRef::Histogram(dp)) => {
                Value::Array(dp.bucket_counts.iter().map(|c| u64_value(*c)).collect())
            }
            (DataPointPath::ExplicitBounds, DataPointRef::Histogram(dp)) => {
                Value::Array(dp.explicit_bounds.iter().map(|b| Value::Float(*b)).collect())
            }
            (DataPointPath::QuantileValues, DataPointRef::Summary(dp)) => {
                Value::Array(dp.quantile_values.iter().map(quantile_value).collect())
            }
            (DataPointPath::Scale, DataPointRef::ExponentialHistogram(dp)) => {
                Value::Integer(dp.scale.into())
            }
            (DataPointPath::ZeroCount, DataPointRef::ExponentialHistogram(dp)) => {
                u64_value(dp.zero_count)
            }
            (DataPointPath::Positive(path), DataPointRef::ExponentialHistogram(dp)) => {
                get_buckets(*path, &dp.positive)
            }
            (DataPointPath::Negative(path), DataPointRef::ExponentialHistogram(dp)) => {
                get_buckets(*path, &dp.negative)
            }
            _ => Value::Nil,
        })
    }

    fn set(
        accessor: &DataPointPath,
        record: &mut DataPointRecord<'_>,
        value: Value,
    ) -> Result<(), EvalError> {
        match accessor {
            DataPointPath::Resource(path) => return path.set(record, value),
            DataPointPath::Scope(path) => return path.set(record, value),
            DataPointPath::Metric(path) => return set_metric(*path, record.metric_mut()?, value),
            _ => {}
        }

        let point = record.data_point_mut()?;
        match (accessor, point) {
            (DataPointPath::Attributes, point) => set_map(point.attributes(), "attributes", value)?,
            (DataPointPath::AttributeKey(key), point) => map_set(point.attributes(), key, value),
            (DataPointPath::StartTimeUnixNano, point) => {
                set_u64(point.start_time_unix_nano(), "start_time_unix_nano", value)?
            }
            (DataPointPath::TimeUnixNano, point) => {
                set_u64(point.time_unix_nano(), "time_unix_nano", value)?
            }
            (DataPointPath::Flags, point) => set_u32(point.flags(), "flags", value)?,
            (DataPointPath::ValueDouble, DataPointMut::Number(dp)) => {
                dp.value = NumberValue::AsDouble(expect_float("value_double", &value)?)
            }
            (DataPointPath::ValueInt, DataPointMut::Number(dp)) => {
                dp.value = NumberValue::AsInt(expect_int("value_int", &value)?)
            }
            (DataPointPath::Count, DataPointMut::Histogram(dp)) => {
                set_u64(&mut dp.count, "count", value)?
            }
            (DataPointPath::Count, DataPointMut::ExponentialHistogram(dp)) => {
                set_u64(&mut dp.count, "count", value)?
            }
            (DataPointPath::Count, DataPointMut::Summary(dp)) => set_u64(&mut dp.count, "count", value)?,
            (DataPointPath::Sum, DataPointMut::Histogram(dp)) => {
                dp.sum = Some(expect_float("sum", &value)?)
            }
            (DataPointPath::Sum, DataPointMut::ExponentialHistogram(dp)) => {
                dp.sum = Some(expect_float("sum", &value)?)
            }
            (DataPointPath::Sum, DataPointMut::Summary(dp)) => dp.sum = expect_float("sum", &value)?,
            (DataPointPath::BucketCounts, DataPointMut::Histogram(dp)) => {
                dp.bucket_counts = bucket_counts("bucket_counts", &value)?
            }
            (DataPointPath::ExplicitBounds, DataPointMut::Histogram(dp)) => {
                dp.explicit_bounds =
                    array_of(&value, "explicit_bounds", |item| expect_float("explicit_bounds", item))?
            }
            (DataPointPath::QuantileValues, DataPointMut::Summary(dp)) => {
                dp.quantile_values = array_of(&value, "quantile_values", parse_quantile)?
            }
            (DataPointPath::Scale, DataPointMut::ExponentialHistogram(dp)) => {
                let n = expect_int("scale", &value)?;
                dp.scale = i32::try_from(n).map_err(|_| EvalError::OutOfRange {
                    target: "scale",
                    value: n,
                })?
            }
            (DataPointPath::ZeroCount, DataPointMut::ExponentialHistogram(dp)) => {
                set_u64(&mut dp.zero_count, "zero_count", value)?
            }
            (DataPointPath::Positive(path), DataPointMut::ExponentialHistogram(dp)) => {
                set_buckets(*path, &mut dp.positive, "positive", value)?
            }
            (DataPointPath::Negative(path), DataPointMut::ExponentialHistogram(dp)) => {
                set_buckets(*path, &mut dp.negative, "negative", value)?
            }
            _ => {}
        }
        Ok(())
    }
}

fn get_metric(path: MetricPath, metric: &Metric) -> Result<Value, EvalError> {
    Ok(match path {
        MetricPath::Name => Value::String(metric.name.clone()),
        MetricPath::Description => Value::String(metric.description.clone()),
        MetricPath::Unit => Value::String(metric.unit.clone()),
        MetricPath::Type => Value::Integer(metric.data_type().into()),
        MetricPath::AggregationTemporality => match &metric.data {
            MetricData::Sum(s) => Value::Integer(s.aggregation_temporality.into()),
            MetricData::Histogram(h) => Value::Integer(h.aggregation_temporality.into()),
            MetricData::ExponentialHistogram(h) => Value::Integer(h.aggregation_temporality.into()),
            _ => Value::Nil,
        },
        MetricPath::IsMonotonic => match &metric.data {
            MetricData::Sum(s) => Value::Boolean(s.is_monotonic),
            _ => Value::Nil,
        },
    })
}

fn set_metric(path: MetricPath, metric: &mut Metric, value: Value) -> Result<(), EvalError> {
    match path {
        MetricPath::Name => set_string(&mut metric.name, "metric.name", value),
        MetricPath::Description => set_string(&mut metric.description, "metric.description", value),
        MetricPath::Unit => set_string(&mut metric.unit, "metric.unit", value),
        MetricPath::Type => Err(EvalError::ReadOnly("metric.type")),
        MetricPath::AggregationTemporality => {
            let temporality = AggregationTemporality::try_from(expect_int(
                "metric.aggregation_temporality",
                &value,
            )?)?;
            match &mut metric.data {
                MetricData::Sum(s) => s.aggregation_temporality = temporality,
                MetricData::Histogram(h) => h.aggregation_temporality = temporality,
                MetricData::ExponentialHistogram(h) => h.aggregation_temporality = temporality,
                _ => {}
            }
            Ok(())
        }
        MetricPath::IsMonotonic => {
            let monotonic = expect_bool("metric.is_monotonic", &value)?;
            if let MetricData::Sum(s) = &mut metric.data {
                s.is_monotonic = monotonic;
            }
            Ok(())
        }
    }
}

fn get_buckets(path: BucketsPath, buckets: &Buckets) -> Value {
    let offset = Value::Integer(buckets.offset.into());
    let counts = Value::Array(buckets.bucket_counts.iter().map(|c| u64_value(*c)).collect());
    match path {
        BucketsPath::Offset => offset,
        BucketsPath::BucketCounts => counts,
        BucketsPath::Whole => {
            let mut map = Map::new();
            map.insert("offset".to_string(), offset);
            map.insert("bucket_counts".to_string(), counts);
            Value::Map(map)
        }
    }
}

/// Checks the whole value before touching `buckets`.
fn set_buckets(
    path: BucketsPath,
    buckets: &mut Buckets,
    target: &'static str,
    value: Value,
) -> Result<(), EvalError> {
    match path {
        BucketsPath::Offset => buckets.offset = bucket_offset(target, &value)?,
        BucketsPath::BucketCounts => buckets.bucket_counts = bucket_counts(target, &value)?,
        BucketsPath::Whole => {
            let map = value.as_map().ok_or_else(|| mismatch(target, "map", &value))?;
            let offset = map
                .get("offset")
                .map(|v| bucket_offset(target, v))
                .transpose()?
                .unwrap_or_default();
            let counts = map
                .get("bucket_counts")
                .map(|v| bucket_counts(target, v))
                .transpose()?
                .unwrap_or_default();
            *buckets = Buckets {
                offset,
                bucket_counts: counts,
            };
        }
    }
    Ok(())
}

fn bucket_offset(target: &'static str, value: &Value) -> Result<i32, EvalError> {
    let n = expect_int(target, value)?;
    i32::try_from(n).map_err(|_| EvalError::OutOfRange { target, value: n })
}

fn bucket_counts(target: &'static str, value: &Value) -> Result<Vec<u64>, EvalError> {
    array_of(value, target, |item| {
        let n = expect_int(target, item)?;
        u64::try_from(n).map_err(|_| EvalError::OutOfRange { target, value: n })
    })
}

fn quantile_value(q: &ValueAtQuantile) -> Value {
    let mut map = Map::new();
    map.insert("quantile".to_string(), Value::Float(q.quantile));
    map.insert("value".to_string(), Value::Float(q.value));
    Value::Map(map)
}

fn parse_quantile(item: &Value) -> Result<ValueAtQuantile, EvalError> {
    let map = item
        .as_map()
        .ok_or_else(|| mismatch("quantile_values", "map", item))?;
    let field = |key: &str| {
        map.get(key)
            .map(|v| expect_float("quantile_values", v))
            .transpose()
            .map(Option::unwrap_or_default)
    };
    Ok(ValueAtQuantile {
        quantile: field("quantile")?,
        value: field("value")?,
    })
}

fn array_of<T>(
    value: &Value,
    target: &'static str,
    convert: impl Fn(&Value) -> Result<T, EvalError>,
) -> Result<Vec<T>, EvalError> {
    match value {
        Value::Array(items) => items.iter().map(convert).collect(),
        other => Err(mismatch(target, "array", other)),
    }
}
