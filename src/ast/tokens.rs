use std::fmt;

/// The class of a lexical token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Literals
    /// Hex byte slice
    ///
    /// # Examples
    /// ```text
    /// 0x0102
    /// 0xdeadBEEF
    /// ```
    Bytes,

    /// Floating point number with a mandatory fractional part
    ///
    /// # Examples
    /// ```text
    /// 1.5
    /// -.5
    /// 2.0e10
    /// ```
    Float,

    /// Signed integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -7
    /// +3
    /// ```
    Int,

    /// Double quoted string, escapes still present in the token text
    String,

    /// `true` or `false`
    Boolean,

    // Keywords and operators
    /// Logical OR (`or`)
    Or,

    /// Logical AND (`and`)
    And,

    /// One of `==`, `!=`, `<`, `<=`, `>`, `>=`
    Comparison,

    // Delimiters
    /// Left parenthesis
    LParen,

    /// Right parenthesis
    RParen,

    /// Argument separator
    Comma,

    /// Path field separator
    Dot,

    /// Left bracket opening a map key
    LBracket,

    /// Right bracket
    RBracket,

    // Identifiers
    /// Upper snake case identifier: enum symbols and upper case function names
    ///
    /// # Examples
    /// ```text
    /// SPAN_KIND_SERVER
    /// ```
    Uppercase,

    /// Lower snake case identifier: path fields, keywords, function names
    ///
    /// # Examples
    /// ```text
    /// attributes
    /// where
    /// nil
    /// ```
    Lowercase,

    /// Identifier mixing cases, only valid as a function name
    ///
    /// # Examples
    /// ```text
    /// IsMatch
    /// SpanID
    /// ```
    MixedCase,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Bytes => "bytes",
            TokenKind::Float => "float",
            TokenKind::Int => "integer",
            TokenKind::String => "string",
            TokenKind::Boolean => "boolean",
            TokenKind::Or => "'or'",
            TokenKind::And => "'and'",
            TokenKind::Comparison => "comparison operator",
            TokenKind::LParen => "'('",
            TokenKind::RParen => "')'",
            TokenKind::Comma => "','",
            TokenKind::Dot => "'.'",
            TokenKind::LBracket => "'['",
            TokenKind::RBracket => "']'",
            TokenKind::Uppercase => "upper case identifier",
            TokenKind::Lowercase => "lower case identifier",
            TokenKind::MixedCase => "identifier",
        };
        f.write_str(name)
    }
}

/// A lexical token: its class, the exact source text, and the byte offset
/// where the text starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, offset: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            offset,
        }
    }

    /// True for a lower case identifier spelling exactly `word`.
    pub fn is_keyword(&self, word: &str) -> bool {
        self.kind == TokenKind::Lowercase && self.text == word
    }

    /// True for any identifier class.
    pub fn is_identifier(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Uppercase | TokenKind::Lowercase | TokenKind::MixedCase
        )
    }
}
