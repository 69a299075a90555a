//! Metric conversion functions, available in the data point context only.
//!
//! They rewrite the metric that owns the current data point. Converting a
//! summary appends one data point per call to a sibling sum metric named
//! `<name>_sum` or `<name>_count`, created on first use in the same scope.

use std::mem;

use crate::{
    contexts::{DataPointContext, DataPointRecord},
    evaluator::{BindError, EvalError},
    functions::{
        Arguments, ExprFunc, FunctionRegistry, ParamKind, standard_functions,
    },
    pdata::{
        AggregationTemporality, Gauge, Metric, MetricData, NumberDataPoint, NumberValue, Sum,
        SummaryDataPoint,
    },
    value::Value,
};

type Factory = Result<Box<dyn ExprFunc<DataPointContext>>, BindError>;

/// Standard functions plus the metric conversions.
pub fn datapoint_functions() -> FunctionRegistry<DataPointContext> {
    use ParamKind as P;

    let mut registry = standard_functions::<DataPointContext>();
    registry
        .register_editor("convert_sum_to_gauge", &[], convert_sum_to_gauge)
        .register_editor("convert_gauge_to_sum", &[P::String, P::Bool], convert_gauge_to_sum)
        .register_editor(
            "convert_summary_sum_val_to_sum",
            &[P::String, P::Bool],
            convert_summary_sum_val_to_sum,
        )
        .register_editor(
            "convert_summary_count_val_to_sum",
            &[P::String, P::Bool],
            convert_summary_count_val_to_sum,
        );
    registry
}

fn temporality_arg(args: &mut Arguments<DataPointContext>) -> Result<AggregationTemporality, BindError> {
    match args.string()?.as_str() {
        "delta" => Ok(AggregationTemporality::Delta),
        "cumulative" => Ok(AggregationTemporality::Cumulative),
        other => Err(args.invalid(format!(
            "unknown aggregation temporality '{other}', expected \"delta\" or \"cumulative\""
        ))),
    }
}

struct ConvertSumToGauge;

impl ExprFunc<DataPointContext> for ConvertSumToGauge {
    fn call(&self, record: &mut DataPointRecord<'_>) -> Result<Value, EvalError> {
        let metric = record.metric_mut()?;
        if let MetricData::Sum(sum) = &mut metric.data {
            let data_points = mem::take(&mut sum.data_points);
            metric.data = MetricData::Gauge(Gauge { data_points });
        }
        Ok(Value::Nil)
    }
}

fn convert_sum_to_gauge(_args: Arguments<DataPointContext>) -> Factory {
    Ok(Box::new(ConvertSumToGauge))
}

struct ConvertGaugeToSum {
    temporality: AggregationTemporality,
    monotonic: bool,
}

impl ExprFunc<DataPointContext> for ConvertGaugeToSum {
    fn call(&self, record: &mut DataPointRecord<'_>) -> Result<Value, EvalError> {
        let metric = record.metric_mut()?;
        if let MetricData::Gauge(gauge) = &mut metric.data {
            let data_points = mem::take(&mut gauge.data_points);
            metric.data = MetricData::Sum(Sum {
                aggregation_temporality: self.temporality,
                is_monotonic: self.monotonic,
                data_points,
            });
        }
        Ok(Value::Nil)
    }
}

fn convert_gauge_to_sum(mut args: Arguments<DataPointContext>) -> Factory {
    Ok(Box::new(ConvertGaugeToSum {
        temporality: temporality_arg(&mut args)?,
        monotonic: args.bool()?,
    }))
}

/// Which summary field becomes the sum value.
#[derive(Debug, Clone, Copy)]
enum SummaryField {
    Sum,
    Count,
}

impl SummaryField {
    fn suffix(&self) -> &'static str {
        match self {
            SummaryField::Sum => "_sum",
            SummaryField::Count => "_count",
        }
    }

    fn value(&self, dp: &SummaryDataPoint) -> NumberValue {
        match self {
            SummaryField::Sum => NumberValue::AsDouble(dp.sum),
            SummaryField::Count => {
                NumberValue::AsInt(i64::try_from(dp.count).unwrap_or(i64::MAX))
            }
        }
    }
}

struct ConvertSummaryToSum {
    field: SummaryField,
    temporality: AggregationTemporality,
    monotonic: bool,
}

impl ExprFunc<DataPointContext> for ConvertSummaryToSum {
    fn call(&self, record: &mut DataPointRecord<'_>) -> Result<Value, EvalError> {
        let metric = record.metric()?;
        let MetricData::Summary(summary) = &metric.data else {
            return Ok(Value::Nil);
        };
        let Some(dp) = summary.data_points.get(record.data_point_index) else {
            return Err(EvalError::MissingRecord("data point"));
        };

        let point = NumberDataPoint {
            attributes: dp.attributes.clone(),
            start_time_unix_nano: dp.start_time_unix_nano,
            time_unix_nano: dp.time_unix_nano,
            value: self.field.value(dp),
            flags: dp.flags,
        };
        let name = format!("{}{}", metric.name, self.field.suffix());
        let description = metric.description.clone();
        let unit = metric.unit.clone();

        let target = self.find_or_create(record.metrics, name, description, unit);
        if let MetricData::Sum(sum) = &mut target.data {
            sum.data_points.push(point);
        }
        Ok(Value::Nil)
    }
}

impl ConvertSummaryToSum {
    fn find_or_create<'m>(
        &self,
        metrics: &'m mut Vec<Metric>,
        name: String,
        description: String,
        unit: String,
    ) -> &'m mut Metric {
        let existing = metrics.iter().position(|m| {
            m.name == name
                && matches!(&m.data, MetricData::Sum(s)
                    if s.aggregation_temporality == self.temporality
                        && s.is_monotonic == self.monotonic)
        });

        let index = match existing {
            Some(index) => index,
            None => {
                metrics.push(Metric {
                    name,
                    description,
                    unit,
                    data: MetricData::Sum(Sum {
                        aggregation_temporality: self.temporality,
                        is_monotonic: self.monotonic,
                        data_points: Vec::new(),
                    }),
                });
                metrics.len() - 1
            }
        };
        &mut metrics[index]
    }
}

fn summary_to_sum(field: SummaryField, mut args: Arguments<DataPointContext>) -> Factory {
    Ok(Box::new(ConvertSummaryToSum {
        field,
        temporality: temporality_arg(&mut args)?,
        monotonic: args.bool()?,
    }))
}

fn convert_summary_sum_val_to_sum(args: Arguments<DataPointContext>) -> Factory {
    summary_to_sum(SummaryField::Sum, args)
}

fn convert_summary_count_val_to_sum(args: Arguments<DataPointContext>) -> Factory {
    summary_to_sum(SummaryField::Count, args)
}
