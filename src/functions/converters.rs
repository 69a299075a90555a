//! Converters: pure functions that compute a value from their arguments.

use regex::Regex;
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};

use crate::{
    context::{Getter, TransformContext},
    evaluator::{BindError, EvalError},
    functions::{Arguments, ExprFunc, FunctionRegistry, ParamKind},
    pdata::{SpanId, TraceId},
    value::Value,
};

pub(crate) fn register<K: TransformContext>(registry: &mut FunctionRegistry<K>) {
    use ParamKind as P;

    registry
        .register_converter("Concat", &[P::String, P::Getters], concat::<K>)
        .register_converter("IsMatch", &[P::Getter, P::Regex], is_match::<K>)
        .register_converter("Int", &[P::Getter], int::<K>)
        .register_converter("Split", &[P::Getter, P::String], split::<K>)
        .register_converter("SpanID", &[P::Bytes], span_id::<K>)
        .register_converter("TraceID", &[P::Bytes], trace_id::<K>);
}

type Factory<K> = Result<Box<dyn ExprFunc<K>>, BindError>;

/// Joins the string form of every value; nil contributes an empty string.
struct Concat<K: TransformContext> {
    delimiter: String,
    values: Vec<Getter<K>>,
}

impl<K: TransformContext> ExprFunc<K> for Concat<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        let mut parts = Vec::with_capacity(self.values.len());
        for value in &self.values {
            parts.push(value.get(record)?.to_string());
        }
        Ok(Value::String(parts.join(&self.delimiter)))
    }
}

fn concat<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(Concat {
        delimiter: args.string()?,
        values: args.getters()?,
    }))
}

/// Nil never matches; other values match on their string form.
struct IsMatch<K: TransformContext> {
    target: Getter<K>,
    pattern: Regex,
}

impl<K: TransformContext> ExprFunc<K> for IsMatch<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        let matched = match self.target.get(record)? {
            Value::Nil => false,
            Value::String(s) => self.pattern.is_match(&s),
            other => self.pattern.is_match(&other.to_string()),
        };
        Ok(Value::Boolean(matched))
    }
}

fn is_match<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(IsMatch {
        target: args.getter()?,
        pattern: args.regex()?,
    }))
}

struct Int<K: TransformContext> {
    value: Getter<K>,
}

impl<K: TransformContext> ExprFunc<K> for Int<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        Ok(to_int(&self.value.get(record)?)
            .map(Value::Integer)
            .unwrap_or_default())
    }
}

/// Floats truncate toward zero; strings parse as an int, then as a float.
/// Anything unconvertible yields `None`, which the converter returns as nil.
fn to_int(value: &Value) -> Option<i64> {
    match value {
        Value::Integer(n) => Some(*n),
        Value::Float(f) => float_to_int(*f),
        Value::Boolean(b) => Some(i64::from(*b)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(float_to_int))
        }
        _ => None,
    }
}

fn float_to_int(f: f64) -> Option<i64> {
    Decimal::from_f64(f).and_then(|d| d.trunc().to_i64())
}

fn int<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    Ok(Box::new(Int {
        value: args.getter()?,
    }))
}

/// Non-string input yields nil.
struct Split<K: TransformContext> {
    target: Getter<K>,
    delimiter: String,
}

impl<K: TransformContext> ExprFunc<K> for Split<K> {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        Ok(match self.target.get(record)? {
            Value::String(s) => Value::Array(
                s.split(self.delimiter.as_str())
                    .map(Value::from)
                    .collect(),
            ),
            _ => Value::Nil,
        })
    }
}

fn split<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    let target = args.getter()?;
    let delimiter = args.string()?;
    if delimiter.is_empty() {
        return Err(args.invalid("delimiter must not be empty"));
    }
    Ok(Box::new(Split { target, delimiter }))
}

/// A constant computed at bind time.
struct Constant(Value);

impl<K: TransformContext> ExprFunc<K> for Constant {
    fn call(&self, _record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        Ok(self.0.clone())
    }
}

fn span_id<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    let bytes = args.bytes()?;
    let id = SpanId::from_slice(&bytes)
        .ok_or_else(|| args.invalid(format!("span id must be {} bytes", SpanId::LEN)))?;
    Ok(Box::new(Constant(Value::Bytes(id.0.to_vec()))))
}

fn trace_id<K: TransformContext>(mut args: Arguments<K>) -> Factory<K> {
    let bytes = args.bytes()?;
    let id = TraceId::from_slice(&bytes)
        .ok_or_else(|| args.invalid(format!("trace id must be {} bytes", TraceId::LEN)))?;
    Ok(Box::new(Constant(Value::Bytes(id.0.to_vec()))))
}
