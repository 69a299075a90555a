use serde::{Deserialize, Serialize};

use crate::{
    pdata::{InstrumentationScope, InvalidEnumValue, Resource},
    value::Map,
};

/// Flag bit marking a data point that carries no recorded value.
pub const FLAG_NO_RECORDED_VALUE: u32 = 1;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MetricsData {
    pub resource_metrics: Vec<ResourceMetrics>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub resource: Resource,
    pub scope_metrics: Vec<ScopeMetrics>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScopeMetrics {
    pub scope: InstrumentationScope,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metric {
    pub name: String,
    pub description: String,
    pub unit: String,
    pub data: MetricData,
}

impl Metric {
    pub fn data_type(&self) -> MetricDataType {
        match &self.data {
            MetricData::Empty => MetricDataType::None,
            MetricData::Gauge(_) => MetricDataType::Gauge,
            MetricData::Sum(_) => MetricDataType::Sum,
            MetricData::Histogram(_) => MetricDataType::Histogram,
            MetricData::ExponentialHistogram(_) => MetricDataType::ExponentialHistogram,
            MetricData::Summary(_) => MetricDataType::Summary,
        }
    }

    pub fn data_point_count(&self) -> usize {
        match &self.data {
            MetricData::Empty => 0,
            MetricData::Gauge(g) => g.data_points.len(),
            MetricData::Sum(s) => s.data_points.len(),
            MetricData::Histogram(h) => h.data_points.len(),
            MetricData::ExponentialHistogram(h) => h.data_points.len(),
            MetricData::Summary(s) => s.data_points.len(),
        }
    }
}

/// The typed payload of a metric.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MetricData {
    #[default]
    Empty,
    Gauge(Gauge),
    Sum(Sum),
    Histogram(Histogram),
    ExponentialHistogram(ExponentialHistogram),
    Summary(Summary),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Gauge {
    pub data_points: Vec<NumberDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Sum {
    pub aggregation_temporality: AggregationTemporality,
    pub is_monotonic: bool,
    pub data_points: Vec<NumberDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Histogram {
    pub aggregation_temporality: AggregationTemporality,
    pub data_points: Vec<HistogramDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExponentialHistogram {
    pub aggregation_temporality: AggregationTemporality,
    pub data_points: Vec<ExponentialHistogramDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Summary {
    pub data_points: Vec<SummaryDataPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NumberDataPoint {
    pub attributes: Map,
    pub start_time_unix_nano: u64,
    pub time_unix_nano: u64,
    pub value: NumberValue,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NumberValue {
    AsInt(i64),
    AsDouble(f64),
}

impl Default for NumberValue {
    fn default() -> Self {
        NumberValue::AsDouble(0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HistogramDataPoint {
    pub attributes: Map,
    pub start_time_unix_nano: u64,
    pub time_unix_nano: u64,
    pub count: u64,
    pub sum: Option<f64>,
    pub bucket_counts: Vec<u64>,
    pub explicit_bounds: Vec<f64>,
    pub flags: u32,
}

/// One cumulative histogram bucket: observations `<= upper_bound`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

impl HistogramDataPoint {
    /// Converts per-bucket counts into cumulative `le` buckets.
    ///
    /// There are `explicit_bounds.len() + 1` buckets; bounds without a count
    /// are ignored. The trailing `+Inf` bucket always holds the sum of every
    /// bucket count.
    pub fn cumulative_buckets(&self) -> Vec<Bucket> {
        let mut buckets = Vec::with_capacity(self.explicit_bounds.len() + 1);
        let mut cumulative = 0u64;

        for (bound, count) in self.explicit_bounds.iter().zip(&self.bucket_counts) {
            cumulative = cumulative.saturating_add(*count);
            buckets.push(Bucket {
                upper_bound: *bound,
                cumulative_count: cumulative,
            });
        }

        buckets.push(Bucket {
            upper_bound: f64::INFINITY,
            cumulative_count: self
                .bucket_counts
                .iter()
                .fold(0u64, |total, count| total.saturating_add(*count)),
        });
        buckets
    }
}

/// A base-2 exponential histogram point.
///
/// Bucket `i` of a range covers `(base^(offset+i), base^(offset+i+1)]` with
/// `base = 2^(2^-scale)`; `negative` mirrors it for values below zero.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExponentialHistogramDataPoint {
    pub attributes: Map,
    pub start_time_unix_nano: u64,
    pub time_unix_nano: u64,
    pub count: u64,
    pub sum: Option<f64>,
    pub scale: i32,
    pub zero_count: u64,
    pub positive: Buckets,
    pub negative: Buckets,
    pub flags: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Buckets {
    pub offset: i32,
    pub bucket_counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SummaryDataPoint {
    pub attributes: Map,
    pub start_time_unix_nano: u64,
    pub time_unix_nano: u64,
    pub count: u64,
    pub sum: f64,
    pub quantile_values: Vec<ValueAtQuantile>,
    pub flags: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ValueAtQuantile {
    pub quantile: f64,
    pub value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum AggregationTemporality {
    #[default]
    Unspecified,
    Delta,
    Cumulative,
}

impl From<AggregationTemporality> for i64 {
    fn from(t: AggregationTemporality) -> Self {
        match t {
            AggregationTemporality::Unspecified => 0,
            AggregationTemporality::Delta => 1,
            AggregationTemporality::Cumulative => 2,
        }
    }
}

impl TryFrom<i64> for AggregationTemporality {
    type Error = InvalidEnumValue;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(AggregationTemporality::Unspecified),
            1 => Ok(AggregationTemporality::Delta),
            2 => Ok(AggregationTemporality::Cumulative),
            _ => Err(InvalidEnumValue {
                kind: "aggregation temporality",
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricDataType {
    None,
    Gauge,
    Sum,
    Histogram,
    ExponentialHistogram,
    Summary,
}

impl From<MetricDataType> for i64 {
    fn from(t: MetricDataType) -> Self {
        match t {
            MetricDataType::None => 0,
            MetricDataType::Gauge => 1,
            MetricDataType::Sum => 2,
            MetricDataType::Histogram => 3,
            MetricDataType::ExponentialHistogram => 4,
            MetricDataType::Summary => 5,
        }
    }
}
