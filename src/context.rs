//! Path resolution layer.
//!
//! Every record shape a statement can run against is described by one type
//! implementing [`TransformContext`]. The implementing type is a marker: it
//! owns no data, it only names the per-record adapter ([`TransformContext::Record`]),
//! the resolved path type ([`TransformContext::Accessor`]) and the path and
//! enum tables of the shape.
//!
//! Binding resolves a syntactic [`Path`] once into an accessor; evaluation
//! then reads and writes the live record through it without looking at
//! field names again.

use std::fmt;

use crate::{
    ast::Path,
    evaluator::{BindError, EvalError},
    functions::ExprFunc,
    value::Value,
};

/// A record shape statements can be bound to.
pub trait TransformContext: Sized + Send + Sync + 'static {
    /// Adapter borrowing one record (and its enclosing scope and resource)
    /// for the duration of a single evaluation.
    type Record<'a>;

    /// A path resolved against this shape's path table.
    type Accessor: fmt::Debug + Send + Sync + 'static;

    /// Context name used in error messages.
    const NAME: &'static str;

    /// Resolves a path fully. Unknown fields, map keys on non-map fields and
    /// trailing fields are bind errors.
    fn parse_path(path: &Path) -> Result<Self::Accessor, BindError>;

    /// Looks up an upper snake case enum symbol.
    fn parse_enum(symbol: &str) -> Option<i64>;

    fn get(accessor: &Self::Accessor, record: &Self::Record<'_>) -> Result<Value, EvalError>;

    fn set(
        accessor: &Self::Accessor,
        record: &mut Self::Record<'_>,
        value: Value,
    ) -> Result<(), EvalError>;
}

/// Read/write capability for one bound path.
pub struct GetSetter<K: TransformContext> {
    accessor: K::Accessor,
}

impl<K: TransformContext> GetSetter<K> {
    pub fn new(path: &Path) -> Result<Self, BindError> {
        Ok(GetSetter {
            accessor: K::parse_path(path)?,
        })
    }

    pub fn accessor(&self) -> &K::Accessor {
        &self.accessor
    }

    pub fn get(&self, record: &K::Record<'_>) -> Result<Value, EvalError> {
        K::get(&self.accessor, record)
    }

    pub fn set(&self, record: &mut K::Record<'_>, value: Value) -> Result<(), EvalError> {
        K::set(&self.accessor, record, value)
    }
}

impl<K: TransformContext> fmt::Debug for GetSetter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GetSetter")
            .field("context", &K::NAME)
            .field("accessor", &self.accessor)
            .finish()
    }
}

/// A bound value expression: anything usable as an argument or comparison
/// operand.
pub enum Getter<K: TransformContext> {
    /// Literal or resolved enum, cloned on every read
    Literal(Value),

    /// Field of the record
    Path(GetSetter<K>),

    /// Nested function call, run on every read
    Invocation(Box<dyn ExprFunc<K>>),
}

impl<K: TransformContext> Getter<K> {
    pub fn get(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError> {
        match self {
            Getter::Literal(value) => Ok(value.clone()),
            Getter::Path(path) => path.get(record),
            Getter::Invocation(function) => function.call(record),
        }
    }
}

impl<K: TransformContext> fmt::Debug for Getter<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Getter::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Getter::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Getter::Invocation(_) => f.write_str("Invocation(..)"),
        }
    }
}
