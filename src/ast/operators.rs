use std::{fmt, str::FromStr};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    /// Equal (`==`)
    Eq,
    /// Not equal (`!=`)
    Ne,
    /// Less than (`<`)
    Lt,
    /// Less than or equal (`<=`)
    Lte,
    /// Greater than or equal (`>=`)
    Gte,
    /// Greater than (`>`)
    Gt,
}

const COMPARE_OP_TABLE: [(&str, CompareOp); 6] = [
    ("==", CompareOp::Eq),
    ("!=", CompareOp::Ne),
    ("<", CompareOp::Lt),
    ("<=", CompareOp::Lte),
    (">", CompareOp::Gt),
    (">=", CompareOp::Gte),
];

impl CompareOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompareOp::Eq => "==",
            CompareOp::Ne => "!=",
            CompareOp::Lt => "<",
            CompareOp::Lte => "<=",
            CompareOp::Gte => ">=",
            CompareOp::Gt => ">",
        }
    }

    /// Ordering operators need an ordered type on both sides.
    pub fn is_ordering(&self) -> bool {
        !matches!(self, CompareOp::Eq | CompareOp::Ne)
    }
}

impl FromStr for CompareOp {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        COMPARE_OP_TABLE
            .iter()
            .find(|(text, _)| *text == s)
            .map(|(_, op)| *op)
            .ok_or_else(|| format!("'{}' is not a valid operator", s))
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[test]
fn test_operator_table_round_trip() {
    for (text, op) in COMPARE_OP_TABLE {
        assert_eq!(text.parse::<CompareOp>(), Ok(op));
        assert_eq!(op.as_str(), text);
    }
    assert!("=<".parse::<CompareOp>().is_err());
}
