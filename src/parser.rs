use thiserror::Error;

use crate::{
    ast::{
        BooleanExpression, BooleanValue, CompareOp, Comparison, Expr, Field, Invocation,
        ParsedStatement, Path, Term, Token, TokenKind,
    },
    lexer::{LexError, Lexer},
};

/// Syntax errors. Parsing stops at the first one and never yields a partial
/// statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error("unexpected token '{found}' at offset {offset}, expected {expected}")]
    UnexpectedToken {
        found: String,
        offset: usize,
        expected: &'static str,
    },

    #[error("unexpected end of statement at offset {offset}, expected {expected}")]
    UnexpectedEof {
        offset: usize,
        expected: &'static str,
    },

    #[error("invalid operator at offset {offset}: {message}")]
    InvalidOperator { message: String, offset: usize },

    #[error("invalid literal '{text}' at offset {offset}: {reason}")]
    InvalidLiteral {
        text: String,
        offset: usize,
        reason: String,
    },
}

pub struct Parser {
    tokens: Vec<Token>,
    position: usize,
    end_offset: usize,
}

impl Parser {
    pub fn new(lexer: Lexer<'_>) -> Result<Self, ParseError> {
        let tokens = lexer.tokenize()?;
        let end_offset = tokens.last().map(|t| t.offset + t.text.len()).unwrap_or(0);
        Ok(Parser {
            tokens,
            position: 0,
            end_offset,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.position)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.position + n)
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn unexpected(&self, expected: &'static str) -> ParseError {
        match self.peek() {
            Some(token) => ParseError::UnexpectedToken {
                found: token.text.clone(),
                offset: token.offset,
                expected,
            },
            None => ParseError::UnexpectedEof {
                offset: self.end_offset,
                expected,
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Result<Token, ParseError> {
        if self.check(kind) {
            // check() guarantees a token is present
            self.advance().ok_or_else(|| self.unexpected(expected))
        } else {
            Err(self.unexpected(expected))
        }
    }

    /// Parse a complete statement: `invocation ( 'where' bool_expr )?`
    pub fn parse_statement(&mut self) -> Result<ParsedStatement, ParseError> {
        let invocation = self.parse_invocation()?;

        let where_clause = if self.peek().is_some_and(|t| t.is_keyword("where")) {
            self.advance();
            Some(self.parse_boolean_expression()?)
        } else {
            None
        };

        if self.peek().is_some() {
            return Err(self.unexpected("'where' or end of statement"));
        }

        Ok(ParsedStatement {
            invocation,
            where_clause,
        })
    }

    fn parse_invocation(&mut self) -> Result<Invocation, ParseError> {
        let function = match self.peek() {
            Some(token) if token.is_identifier() => token.text.clone(),
            _ => return Err(self.unexpected("function name")),
        };
        self.advance();

        self.expect(TokenKind::LParen, "'(' after function name")?;

        let mut arguments = vec![];
        if self.check(TokenKind::RParen) {
            self.advance();
            return Ok(Invocation {
                function,
                arguments,
            });
        }

        loop {
            arguments.push(self.parse_value()?);

            if self.check(TokenKind::Comma) {
                self.advance();
            } else {
                self.expect(TokenKind::RParen, "',' or ')'")?;
                break;
            }
        }

        Ok(Invocation {
            function,
            arguments,
        })
    }

    fn parse_value(&mut self) -> Result<Expr, ParseError> {
        let Some(token) = self.peek().cloned() else {
            return Err(self.unexpected("value"));
        };

        // An identifier of any case followed by '(' is always a call
        if token.is_identifier() && self.peek_nth(1).is_some_and(|t| t.kind == TokenKind::LParen)
        {
            return self.parse_invocation().map(Expr::Invocation);
        }

        match token.kind {
            TokenKind::Bytes => {
                self.advance();
                hex::decode(&token.text[2..])
                    .map(Expr::Bytes)
                    .map_err(|e| invalid_literal(&token, e.to_string()))
            }
            TokenKind::String => {
                self.advance();
                unquote(&token).map(Expr::String)
            }
            TokenKind::Float => {
                self.advance();
                token
                    .text
                    .parse::<f64>()
                    .map(Expr::Float)
                    .map_err(|e| invalid_literal(&token, e.to_string()))
            }
            TokenKind::Int => {
                self.advance();
                token
                    .text
                    .parse::<i64>()
                    .map(Expr::Int)
                    .map_err(|e| invalid_literal(&token, e.to_string()))
            }
            TokenKind::Boolean => {
                self.advance();
                Ok(Expr::Bool(token.text == "true"))
            }
            TokenKind::Lowercase if token.text == "nil" => {
                self.advance();
                Ok(Expr::Nil)
            }
            TokenKind::Uppercase => {
                self.advance();
                Ok(Expr::Enum(token.text))
            }
            TokenKind::Lowercase => self.parse_path().map(Expr::Path),
            TokenKind::MixedCase => Err(self.unexpected("'(' after function name")),
            _ => Err(self.unexpected("value")),
        }
    }

    fn parse_path(&mut self) -> Result<Path, ParseError> {
        let mut fields = vec![];

        loop {
            let name = self.expect(TokenKind::Lowercase, "lower case field name")?;

            let map_key = if self.check(TokenKind::LBracket) {
                self.advance();
                let key = self.expect(TokenKind::String, "string map key")?;
                self.expect(TokenKind::RBracket, "']'")?;
                Some(unquote(&key)?)
            } else {
                None
            };

            fields.push(Field {
                name: name.text,
                map_key,
            });

            if self.check(TokenKind::Dot) {
                self.advance();
            } else {
                break;
            }
        }

        Ok(Path { fields })
    }

    fn parse_boolean_expression(&mut self) -> Result<BooleanExpression, ParseError> {
        let left = self.parse_term()?;

        let mut right = vec![];
        while self.check(TokenKind::Or) {
            self.advance();
            right.push(self.parse_term()?);
        }

        Ok(BooleanExpression { left, right })
    }

    fn parse_term(&mut self) -> Result<Term, ParseError> {
        let left = self.parse_boolean_value()?;

        let mut right = vec![];
        while self.check(TokenKind::And) {
            self.advance();
            right.push(self.parse_boolean_value()?);
        }

        Ok(Term { left, right })
    }

    fn parse_boolean_value(&mut self) -> Result<BooleanValue, ParseError> {
        if self.check(TokenKind::LParen) {
            self.advance();
            let expr = self.parse_boolean_expression()?;
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(BooleanValue::SubExpr(Box::new(expr)));
        }

        let left = self.parse_value()?;

        if self.check(TokenKind::Comparison) {
            let token = self.expect(TokenKind::Comparison, "comparison operator")?;
            let op = token
                .text
                .parse::<CompareOp>()
                .map_err(|message| ParseError::InvalidOperator {
                    message,
                    offset: token.offset,
                })?;
            let right = self.parse_value()?;
            return Ok(BooleanValue::Comparison(Comparison { left, op, right }));
        }

        match left {
            Expr::Bool(b) => Ok(BooleanValue::Constant(b)),
            Expr::Invocation(invocation) => Ok(BooleanValue::Converter(invocation)),
            _ => Err(self.unexpected("comparison operator")),
        }
    }
}

/// Parses one statement from text.
pub fn parse(input: &str) -> Result<ParsedStatement, ParseError> {
    Parser::new(Lexer::new(input))?.parse_statement()
}

fn invalid_literal(token: &Token, reason: String) -> ParseError {
    ParseError::InvalidLiteral {
        text: token.text.clone(),
        offset: token.offset,
        reason,
    }
}

fn unquote(token: &Token) -> Result<String, ParseError> {
    let inner = &token.text[1..token.text.len() - 1];
    let mut result = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('"') => result.push('"'),
            Some('\\') => result.push('\\'),
            Some(other) => {
                return Err(invalid_literal(
                    token,
                    format!("invalid escape sequence \\{}", other),
                ));
            }
            None => return Err(invalid_literal(token, "dangling backslash".to_string())),
        }
    }

    Ok(result)
}
