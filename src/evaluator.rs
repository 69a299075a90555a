use std::cmp::Ordering;

use rust_decimal::{Decimal, prelude::FromPrimitive};
use thiserror::Error;
use tracing::trace;

use crate::{
    ast::{BooleanExpression, BooleanValue, CompareOp, ParsedStatement, Path, Term},
    context::{Getter, TransformContext},
    functions::{ExprFunc, FunctionRegistry},
    parser::{self, ParseError},
    pdata::InvalidEnumValue,
    value::Value,
};

/// Errors raised while turning a parsed statement into an executable one.
///
/// All of them are detected once, before any record is touched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BindError {
    #[error("undefined function '{0}'")]
    UnknownFunction(String),

    #[error("invalid path expression '{path}' for {context} context: {reason}")]
    InvalidPath {
        path: String,
        context: &'static str,
        reason: String,
    },

    #[error("editor '{0}' cannot be used as a value")]
    EditorAsValue(String),

    #[error("unknown enum symbol '{symbol}' for {context} context")]
    UnknownEnum {
        symbol: String,
        context: &'static str,
    },

    #[error("function '{function}' expects {expected} arguments, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("argument {index} of '{function}' must be {expected}, got {found}")]
    ArgumentKind {
        function: String,
        index: usize,
        expected: &'static str,
        found: &'static str,
    },

    #[error("argument {index} of '{function}' is invalid: {reason}")]
    InvalidArgument {
        function: String,
        index: usize,
        reason: String,
    },
}

impl BindError {
    pub fn invalid_path(path: &Path, context: &'static str, reason: impl Into<String>) -> Self {
        BindError::InvalidPath {
            path: path.to_string(),
            context,
            reason: reason.into(),
        }
    }
}

/// Errors raised while executing a bound statement against one record.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("cannot compare {left} {op} {right}")]
    IncomparableTypes {
        left: &'static str,
        op: CompareOp,
        right: &'static str,
    },

    #[error("condition must evaluate to a boolean, got {0}")]
    NotBoolean(&'static str),

    #[error("cannot set {target} to {found}, expected {expected}")]
    TypeMismatch {
        target: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("{value} is out of range for {target}")]
    OutOfRange { target: &'static str, value: i64 },

    #[error("{0} is read-only")]
    ReadOnly(&'static str),

    #[error(transparent)]
    InvalidEnum(#[from] InvalidEnumValue),

    #[error("record no longer exists: {0}")]
    MissingRecord(&'static str),

    #[error("{function}: {reason}")]
    Function {
        function: &'static str,
        reason: String,
    },
}

/// Either failure of [`ExecutableStatement::compile`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatementError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Bind(#[from] BindError),
}

/// A statement bound to one context and ready to run against its records.
///
/// Binding resolves every path, function and enum up front, so execution
/// never looks anything up by name. The statement holds no per-record
/// state and can be shared across threads.
pub struct ExecutableStatement<K: TransformContext> {
    function: Box<dyn ExprFunc<K>>,
    condition: Option<Condition<K>>,
}

impl<K: TransformContext> ExecutableStatement<K> {
    /// Parses and binds in one step.
    ///
    /// # Examples
    ///
    /// ```
    /// use ottl_lang::{ExecutableStatement, contexts::ResourceContext, functions::standard_functions};
    ///
    /// let registry = standard_functions::<ResourceContext>();
    /// let statement = ExecutableStatement::compile(
    ///     r#"set(attributes["env"], "prod") where attributes["env"] == nil"#,
    ///     &registry,
    /// );
    /// assert!(statement.is_ok());
    /// ```
    pub fn compile(text: &str, registry: &FunctionRegistry<K>) -> Result<Self, StatementError> {
        let parsed = parser::parse(text)?;
        Ok(bind(&parsed, registry)?)
    }

    /// Runs the statement against one record.
    ///
    /// Returns whether the function ran: `false` when the where clause
    /// evaluated to `false`.
    pub fn execute(&self, record: &mut K::Record<'_>) -> Result<bool, EvalError> {
        if let Some(condition) = &self.condition
            && !condition.evaluate(record)?
        {
            return Ok(false);
        }

        self.function.call(record)?;
        Ok(true)
    }

    pub fn has_condition(&self) -> bool {
        self.condition.is_some()
    }
}

/// Binds a parsed statement to context `K` using the functions in `registry`.
pub fn bind<K: TransformContext>(
    statement: &ParsedStatement,
    registry: &FunctionRegistry<K>,
) -> Result<ExecutableStatement<K>, BindError> {
    trace!(
        context = K::NAME,
        function = %statement.invocation.function,
        "binding statement"
    );

    let function = registry.bind_invocation(&statement.invocation)?;
    let condition = statement
        .where_clause
        .as_ref()
        .map(|expr| Condition::bind(expr, registry))
        .transpose()?;

    Ok(ExecutableStatement {
        function,
        condition,
    })
}

/// Bound `or` of `and` terms.
struct Condition<K: TransformContext> {
    terms: Vec<Vec<Operand<K>>>,
}

enum Operand<K: TransformContext> {
    Comparison {
        left: Getter<K>,
        op: CompareOp,
        right: Getter<K>,
    },
    Constant(bool),
    Converter(Box<dyn ExprFunc<K>>),
    Nested(Condition<K>),
}

impl<K: TransformContext> Condition<K> {
    fn bind(expr: &BooleanExpression, registry: &FunctionRegistry<K>) -> Result<Self, BindError> {
        let terms = std::iter::once(&expr.left)
            .chain(&expr.right)
            .map(|term| bind_term(term, registry))
            .collect::<Result<_, _>>()?;
        Ok(Condition { terms })
    }

    /// Left to right; stops at the first true term, and within a term at the
    /// first false operand.
    fn evaluate(&self, record: &mut K::Record<'_>) -> Result<bool, EvalError> {
        for term in &self.terms {
            let mut satisfied = true;
            for operand in term {
                if !operand.evaluate(record)? {
                    satisfied = false;
                    break;
                }
            }
            if satisfied {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

fn bind_term<K: TransformContext>(
    term: &Term,
    registry: &FunctionRegistry<K>,
) -> Result<Vec<Operand<K>>, BindError> {
    std::iter::once(&term.left)
        .chain(&term.right)
        .map(|value| bind_operand(value, registry))
        .collect()
}

fn bind_operand<K: TransformContext>(
    value: &BooleanValue,
    registry: &FunctionRegistry<K>,
) -> Result<Operand<K>, BindError> {
    Ok(match value {
        BooleanValue::Comparison(comparison) => Operand::Comparison {
            left: registry.bind_getter(&comparison.left)?,
            op: comparison.op,
            right: registry.bind_getter(&comparison.right)?,
        },
        BooleanValue::Constant(b) => Operand::Constant(*b),
        BooleanValue::Converter(invocation) => {
            Operand::Converter(registry.bind_converter(invocation)?)
        }
        BooleanValue::SubExpr(expr) => Operand::Nested(Condition::bind(expr, registry)?),
    })
}

impl<K: TransformContext> Operand<K> {
    fn evaluate(&self, record: &mut K::Record<'_>) -> Result<bool, EvalError> {
        match self {
            Operand::Comparison { left, op, right } => {
                let left = left.get(record)?;
                let right = right.get(record)?;
                compare(&left, *op, &right)
            }
            Operand::Constant(b) => Ok(*b),
            Operand::Converter(function) => match function.call(record)? {
                Value::Boolean(b) => Ok(b),
                other => Err(EvalError::NotBoolean(other.type_name())),
            },
            Operand::Nested(condition) => condition.evaluate(record),
        }
    }
}

/// Compares two runtime values.
///
/// Integers and floats compare exactly with each other. Strings compare
/// lexicographically by bytes. Values of any other type are only equal to
/// values of the same type with equal contents; `==` across unrelated types
/// is `false` and `!=` is `true`. Ordering operators on anything that is not
/// a pair of numbers or a pair of strings fail with
/// [`EvalError::IncomparableTypes`].
///
/// NaN is unordered: every operator except `!=` yields `false` against it.
///
/// # Examples
///
/// ```
/// use ottl_lang::{Value, ast::CompareOp, evaluator::compare};
///
/// assert!(compare(&Value::Integer(1), CompareOp::Eq, &Value::Float(1.0)).unwrap());
/// assert!(!compare(&Value::from("1"), CompareOp::Eq, &Value::Integer(1)).unwrap());
/// assert!(compare(&Value::from("1"), CompareOp::Lt, &Value::Integer(1)).is_err());
/// ```
pub fn compare(left: &Value, op: CompareOp, right: &Value) -> Result<bool, EvalError> {
    let ordering = match (left, right) {
        (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Integer(a), Value::Float(b)) => compare_int_float(*a, *b),
        (Value::Float(a), Value::Integer(b)) => compare_int_float(*b, *a).map(Ordering::reverse),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => {
            if op.is_ordering() {
                return Err(EvalError::IncomparableTypes {
                    left: left.type_name(),
                    op,
                    right: right.type_name(),
                });
            }
            let equal = left == right;
            return Ok(if op == CompareOp::Eq { equal } else { !equal });
        }
    };

    let Some(ordering) = ordering else {
        return Ok(op == CompareOp::Ne);
    };

    Ok(match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Lte => ordering != Ordering::Greater,
        CompareOp::Gte => ordering != Ordering::Less,
        CompareOp::Gt => ordering == Ordering::Greater,
    })
}

fn compare_int_float(a: i64, b: f64) -> Option<Ordering> {
    if b.is_nan() {
        return None;
    }
    if let Some(ad) = Decimal::from_i64(a)
        && let Some(bd) = Decimal::from_f64(b)
    {
        return Some(ad.cmp(&bd));
    }
    (a as f64).partial_cmp(&b)
}

#[test]
fn test_compare_mixed_numbers() {
    assert!(compare(&Value::Integer(2), CompareOp::Gt, &Value::Float(1.5)).unwrap());
    assert!(compare(&Value::Float(1.5), CompareOp::Lt, &Value::Integer(2)).unwrap());
    assert!(compare(&Value::Integer(-3), CompareOp::Lte, &Value::Float(-3.0)).unwrap());
    // beyond decimal range
    assert!(compare(&Value::Integer(1), CompareOp::Lt, &Value::Float(1e300)).unwrap());
}

#[test]
fn test_compare_nan() {
    let nan = Value::Float(f64::NAN);
    assert!(!compare(&nan, CompareOp::Eq, &nan).unwrap());
    assert!(compare(&nan, CompareOp::Ne, &Value::Integer(0)).unwrap());
    assert!(!compare(&Value::Integer(0), CompareOp::Gte, &nan).unwrap());
}

#[test]
fn test_compare_across_families() {
    assert!(compare(&Value::Nil, CompareOp::Eq, &Value::Nil).unwrap());
    assert!(!compare(&Value::Nil, CompareOp::Eq, &Value::Boolean(false)).unwrap());
    assert!(compare(&Value::Bytes(vec![1]), CompareOp::Ne, &Value::from("01")).unwrap());
    assert_eq!(
        compare(&Value::Boolean(true), CompareOp::Gt, &Value::Boolean(false)),
        Err(EvalError::IncomparableTypes {
            left: "boolean",
            op: CompareOp::Gt,
            right: "boolean"
        })
    );
}
