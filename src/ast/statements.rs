use crate::ast::{CompareOp, Expr, Invocation};

/// A complete statement.
///
/// # Example
/// ```text
/// set(status.code, 1) where name == "drop"
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    /// The function executed when the condition holds
    pub invocation: Invocation,

    /// Optional `where` clause; `None` means the statement always runs
    pub where_clause: Option<BooleanExpression>,
}

/// Terms joined by `or`.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanExpression {
    pub left: Term,
    pub right: Vec<Term>,
}

/// Boolean values joined by `and`.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub left: BooleanValue,
    pub right: Vec<BooleanValue>,
}

/// Something that evaluates to true or false.
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanValue {
    /// Comparison of two values
    ///
    /// # Example
    /// ```text
    /// attributes["http.status"] >= 500
    /// ```
    Comparison(Comparison),

    /// `true` or `false`
    Constant(bool),

    /// Converter call that must return a boolean
    ///
    /// # Example
    /// ```text
    /// IsMatch(name, "^GET ")
    /// ```
    Converter(Invocation),

    /// Parenthesized sub-expression
    SubExpr(Box<BooleanExpression>),
}

/// `left op right`
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub left: Expr,
    pub op: CompareOp,
    pub right: Expr,
}
