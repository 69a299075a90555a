use std::fmt;

/// Abstract Syntax Tree node for a value expression.
///
/// Anything that can appear as a function argument or as one side of a
/// comparison. Exactly one form is present; the parser never produces an
/// empty or ambiguous node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Nested function call
    ///
    /// # Example
    /// ```text
    /// Concat("-", name, "x")
    /// ```
    Invocation(Invocation),

    /// Hex byte slice literal, already decoded
    ///
    /// # Example
    /// ```text
    /// 0x0a0b
    /// ```
    Bytes(Vec<u8>),

    /// String literal, already unquoted
    String(String),

    /// Literal floating point number
    Float(f64),

    /// Literal integer
    Int(i64),

    /// Boolean literal
    Bool(bool),

    /// The `nil` literal
    Nil,

    /// Upper snake case symbol resolved against the context's enum table
    ///
    /// # Example
    /// ```text
    /// SPAN_KIND_SERVER
    /// ```
    Enum(String),

    /// Telemetry field reference
    ///
    /// # Examples
    /// ```text
    /// name
    /// resource.attributes["host.name"]
    /// ```
    Path(Path),
}

impl Expr {
    /// Short name of the expression form, used in bind errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Invocation(_) => "invocation",
            Expr::Bytes(_) => "bytes",
            Expr::String(_) => "string",
            Expr::Float(_) => "float",
            Expr::Int(_) => "integer",
            Expr::Bool(_) => "boolean",
            Expr::Nil => "nil",
            Expr::Enum(_) => "enum",
            Expr::Path(_) => "path",
        }
    }
}

/// A function call with its ordered argument expressions.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub function: String,
    pub arguments: Vec<Expr>,
}

/// A telemetry path: one or more fields separated by `.`.
#[derive(Debug, Clone, PartialEq)]
pub struct Path {
    pub fields: Vec<Field>,
}

/// A single path segment with an optional `["key"]` accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub map_key: Option<String>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            map_key: None,
        }
    }

    pub fn with_key(name: impl Into<String>, key: impl Into<String>) -> Self {
        Field {
            name: name.into(),
            map_key: Some(key.into()),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.map_key {
            Some(key) => write!(f, "{}[{:?}]", self.name, key),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", field)?;
        }
        Ok(())
    }
}
