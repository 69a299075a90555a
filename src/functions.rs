//! # Function Registry
//!
//! Maps function names to a parameter signature and a factory. At bind time
//! the registry checks each argument expression against its parameter kind,
//! converts it into a [`BoundArg`], and hands the bound list to the factory,
//! which returns the executable [`ExprFunc`].
//!
//! Parameter kinds:
//!
//! | Kind        | Accepts                                        |
//! |-------------|------------------------------------------------|
//! | `Getter`    | any value expression                           |
//! | `GetSetter` | a path                                         |
//! | `String`    | a string literal                               |
//! | `Int`       | an int literal                                 |
//! | `Bool`      | a boolean literal                              |
//! | `Bytes`     | a bytes literal                                |
//! | `Enum`      | an enum symbol or int literal                  |
//! | `Regex`     | a string literal compiled as a regex           |
//! | `Strings`   | zero or more string literals (last only)       |
//! | `Getters`   | zero or more value expressions (last only)     |
//!
//! Functions are grouped into editors (mutate the record, return nil) and
//! converters (pure, return a value); both use the same registry. Only
//! converters may appear as values or inside a where clause.

pub mod converters;
pub mod editors;
pub mod metrics;

use std::{collections::HashMap, fmt, vec};

use regex::Regex;
use tracing::trace;

use crate::{
    ast::{Expr, Invocation},
    context::{GetSetter, Getter, TransformContext},
    evaluator::{BindError, EvalError},
    value::Value,
};

pub use metrics::datapoint_functions;

/// An executable function with its arguments already bound.
pub trait ExprFunc<K: TransformContext>: Send + Sync {
    fn call(&self, record: &mut K::Record<'_>) -> Result<Value, EvalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Getter,
    GetSetter,
    String,
    Int,
    Bool,
    Bytes,
    Enum,
    Regex,
    Strings,
    Getters,
}

impl ParamKind {
    pub fn is_variadic(&self) -> bool {
        matches!(self, ParamKind::Strings | ParamKind::Getters)
    }

    fn describe(&self) -> &'static str {
        match self {
            ParamKind::Getter | ParamKind::Getters => "a value",
            ParamKind::GetSetter => "a path",
            ParamKind::String | ParamKind::Strings | ParamKind::Regex => "a string",
            ParamKind::Int => "an int",
            ParamKind::Bool => "a boolean",
            ParamKind::Bytes => "bytes",
            ParamKind::Enum => "an enum",
        }
    }
}

/// One argument after bind-time conversion.
///
/// Enums are resolved to their integer value.
pub enum BoundArg<K: TransformContext> {
    Getter(Getter<K>),
    GetSetter(GetSetter<K>),
    String(String),
    Int(i64),
    Bool(bool),
    Bytes(Vec<u8>),
    Regex(Regex),
    Strings(Vec<String>),
    Getters(Vec<Getter<K>>),
}

/// Bound arguments handed to a factory, consumed in declaration order.
pub struct Arguments<K: TransformContext> {
    function: String,
    args: vec::IntoIter<BoundArg<K>>,
    index: usize,
}

macro_rules! take_arg {
    ($(#[$doc:meta])* $name:ident, $variant:ident, $ty:ty, $kind:expr) => {
        $(#[$doc])*
        pub fn $name(&mut self) -> Result<$ty, BindError> {
            match self.next() {
                Some(BoundArg::$variant(value)) => Ok(value),
                _ => Err(self.mismatch($kind)),
            }
        }
    };
}

impl<K: TransformContext> Arguments<K> {
    pub fn new(function: impl Into<String>, args: Vec<BoundArg<K>>) -> Self {
        Arguments {
            function: function.into(),
            args: args.into_iter(),
            index: 0,
        }
    }

    fn next(&mut self) -> Option<BoundArg<K>> {
        self.index += 1;
        self.args.next()
    }

    fn mismatch(&self, kind: ParamKind) -> BindError {
        BindError::ArgumentKind {
            function: self.function.clone(),
            index: self.index.saturating_sub(1),
            expected: kind.describe(),
            found: "a different argument kind",
        }
    }

    /// Rejects the most recently taken argument.
    pub fn invalid(&self, reason: impl Into<String>) -> BindError {
        BindError::InvalidArgument {
            function: self.function.clone(),
            index: self.index.saturating_sub(1),
            reason: reason.into(),
        }
    }

    take_arg!(getter, Getter, Getter<K>, ParamKind::Getter);
    take_arg!(get_setter, GetSetter, GetSetter<K>, ParamKind::GetSetter);
    take_arg!(string, String, String, ParamKind::String);
    take_arg!(
        /// Also used for `Enum` parameters.
        int,
        Int,
        i64,
        ParamKind::Int
    );
    take_arg!(bool, Bool, bool, ParamKind::Bool);
    take_arg!(bytes, Bytes, Vec<u8>, ParamKind::Bytes);
    take_arg!(regex, Regex, Regex, ParamKind::Regex);
    take_arg!(strings, Strings, Vec<String>, ParamKind::Strings);
    take_arg!(getters, Getters, Vec<Getter<K>>, ParamKind::Getters);
}

pub type FunctionFactory<K> = fn(Arguments<K>) -> Result<Box<dyn ExprFunc<K>>, BindError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionKind {
    /// Mutates the record; only valid as the invocation of a statement.
    Editor,
    /// Computes a value without touching the record.
    Converter,
}

pub struct FunctionDef<K: TransformContext> {
    pub kind: FunctionKind,
    pub params: &'static [ParamKind],
    pub factory: FunctionFactory<K>,
}

impl<K: TransformContext> FunctionDef<K> {
    fn accepts(&self, count: usize) -> bool {
        match self.params.last() {
            Some(last) if last.is_variadic() => count + 1 >= self.params.len(),
            _ => count == self.params.len(),
        }
    }

    fn expected(&self) -> String {
        match self.params.last() {
            Some(last) if last.is_variadic() => format!("at least {}", self.params.len() - 1),
            _ => self.params.len().to_string(),
        }
    }
}

/// Name to function table for one context.
pub struct FunctionRegistry<K: TransformContext> {
    functions: HashMap<String, FunctionDef<K>>,
}

impl<K: TransformContext> Default for FunctionRegistry<K> {
    fn default() -> Self {
        FunctionRegistry {
            functions: HashMap::new(),
        }
    }
}

impl<K: TransformContext> fmt::Debug for FunctionRegistry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names = self.names();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("context", &K::NAME)
            .field("functions", &names)
            .finish()
    }
}

impl<K: TransformContext> FunctionRegistry<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_editor(
        &mut self,
        name: impl Into<String>,
        params: &'static [ParamKind],
        factory: FunctionFactory<K>,
    ) -> &mut Self {
        self.register(name, FunctionKind::Editor, params, factory)
    }

    pub fn register_converter(
        &mut self,
        name: impl Into<String>,
        params: &'static [ParamKind],
        factory: FunctionFactory<K>,
    ) -> &mut Self {
        self.register(name, FunctionKind::Converter, params, factory)
    }

    /// Adds or replaces a function. Only the last parameter may be variadic.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: FunctionKind,
        params: &'static [ParamKind],
        factory: FunctionFactory<K>,
    ) -> &mut Self {
        debug_assert!(
            params
                .iter()
                .rev()
                .skip(1)
                .all(|param| !param.is_variadic()),
            "variadic parameter must be last"
        );
        self.functions
            .insert(name.into(), FunctionDef { kind, params, factory });
        self
    }

    pub fn get(&self, name: &str) -> Option<&FunctionDef<K>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.functions.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Resolves an invocation and all of its nested arguments.
    pub fn bind_invocation(&self, invocation: &Invocation) -> Result<Box<dyn ExprFunc<K>>, BindError> {
        let name = invocation.function.as_str();
        let def = self
            .get(name)
            .ok_or_else(|| BindError::UnknownFunction(name.to_string()))?;

        if !def.accepts(invocation.arguments.len()) {
            return Err(BindError::ArgumentCount {
                function: name.to_string(),
                expected: def.expected(),
                actual: invocation.arguments.len(),
            });
        }

        trace!(function = name, context = K::NAME, "binding invocation");

        let mut bound = Vec::with_capacity(def.params.len());
        for (index, param) in def.params.iter().enumerate() {
            let arg = if param.is_variadic() {
                self.bind_variadic(name, index, *param, &invocation.arguments[index..])?
            } else {
                self.bind_arg(name, index, *param, &invocation.arguments[index])?
            };
            bound.push(arg);
        }

        (def.factory)(Arguments::new(name, bound))
    }

    /// Like [`bind_invocation`](Self::bind_invocation), but rejects editors.
    ///
    /// Used wherever the result is read as a value, so that evaluating a
    /// where clause never mutates the record.
    pub fn bind_converter(&self, invocation: &Invocation) -> Result<Box<dyn ExprFunc<K>>, BindError> {
        let name = invocation.function.as_str();
        match self.get(name) {
            Some(def) if def.kind == FunctionKind::Editor => {
                Err(BindError::EditorAsValue(name.to_string()))
            }
            _ => self.bind_invocation(invocation),
        }
    }

    /// Binds a value expression: literal, enum, path or converter call.
    pub fn bind_getter(&self, expr: &Expr) -> Result<Getter<K>, BindError> {
        Ok(match expr {
            Expr::Invocation(invocation) => Getter::Invocation(self.bind_converter(invocation)?),
            Expr::Path(path) => Getter::Path(GetSetter::new(path)?),
            Expr::Enum(symbol) => Getter::Literal(Value::Integer(resolve_enum::<K>(symbol)?)),
            Expr::Bytes(b) => Getter::Literal(Value::Bytes(b.clone())),
            Expr::String(s) => Getter::Literal(Value::String(s.clone())),
            Expr::Float(f) => Getter::Literal(Value::Float(*f)),
            Expr::Int(i) => Getter::Literal(Value::Integer(*i)),
            Expr::Bool(b) => Getter::Literal(Value::Boolean(*b)),
            Expr::Nil => Getter::Literal(Value::Nil),
        })
    }

    fn bind_arg(
        &self,
        function: &str,
        index: usize,
        param: ParamKind,
        expr: &Expr,
    ) -> Result<BoundArg<K>, BindError> {
        let mismatch = || BindError::ArgumentKind {
            function: function.to_string(),
            index,
            expected: param.describe(),
            found: expr.kind_name(),
        };

        Ok(match (param, expr) {
            (ParamKind::Getter, _) => BoundArg::Getter(self.bind_getter(expr)?),
            (ParamKind::GetSetter, Expr::Path(path)) => BoundArg::GetSetter(GetSetter::new(path)?),
            (ParamKind::String, Expr::String(s)) => BoundArg::String(s.clone()),
            (ParamKind::Int, Expr::Int(i)) => BoundArg::Int(*i),
            (ParamKind::Bool, Expr::Bool(b)) => BoundArg::Bool(*b),
            (ParamKind::Bytes, Expr::Bytes(b)) => BoundArg::Bytes(b.clone()),
            (ParamKind::Enum, Expr::Enum(symbol)) => BoundArg::Int(resolve_enum::<K>(symbol)?),
            (ParamKind::Enum, Expr::Int(i)) => BoundArg::Int(*i),
            (ParamKind::Regex, Expr::String(pattern)) => {
                BoundArg::Regex(Regex::new(pattern).map_err(|e| BindError::InvalidArgument {
                    function: function.to_string(),
                    index,
                    reason: e.to_string(),
                })?)
            }
            _ => return Err(mismatch()),
        })
    }

    fn bind_variadic(
        &self,
        function: &str,
        start: usize,
        param: ParamKind,
        exprs: &[Expr],
    ) -> Result<BoundArg<K>, BindError> {
        match param {
            ParamKind::Getters => exprs
                .iter()
                .map(|expr| self.bind_getter(expr))
                .collect::<Result<_, _>>()
                .map(BoundArg::Getters),
            _ => exprs
                .iter()
                .enumerate()
                .map(|(offset, expr)| match expr {
                    Expr::String(s) => Ok(s.clone()),
                    other => Err(BindError::ArgumentKind {
                        function: function.to_string(),
                        index: start + offset,
                        expected: param.describe(),
                        found: other.kind_name(),
                    }),
                })
                .collect::<Result<_, _>>()
                .map(BoundArg::Strings),
        }
    }
}

fn resolve_enum<K: TransformContext>(symbol: &str) -> Result<i64, BindError> {
    K::parse_enum(symbol).ok_or_else(|| BindError::UnknownEnum {
        symbol: symbol.to_string(),
        context: K::NAME,
    })
}

/// Editors and converters available in every context.
pub fn standard_functions<K: TransformContext>() -> FunctionRegistry<K> {
    let mut registry = FunctionRegistry::new();
    editors::register(&mut registry);
    converters::register(&mut registry);
    registry
}

