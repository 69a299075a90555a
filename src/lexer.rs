use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::ast::{Token, TokenKind};

/// Errors produced while splitting statement text into tokens.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    /// No rule matches the input at this byte offset
    #[error("unexpected character '{ch}' at offset {offset}")]
    UnexpectedChar { ch: char, offset: usize },
}

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    Token(TokenKind),
    Punct,
    Identifier,
    Whitespace,
}

struct Rule {
    kind: RuleKind,
    pattern: Regex,
}

// Order matters: the first rule matching at the current offset wins, so bytes
// must precede numbers and keywords must precede identifiers.
static RULES: LazyLock<Vec<Rule>> = LazyLock::new(|| {
    [
        (RuleKind::Token(TokenKind::Bytes), r"0x[a-fA-F0-9]+"),
        (
            RuleKind::Token(TokenKind::Float),
            r"[-+]?[0-9]*\.[0-9]+(?:[eE][-+]?[0-9]+)?",
        ),
        (RuleKind::Token(TokenKind::Int), r"[-+]?[0-9]+"),
        (RuleKind::Token(TokenKind::String), r#""(?:\\.|[^"\\])*""#),
        (RuleKind::Token(TokenKind::Or), r"or\b"),
        (RuleKind::Token(TokenKind::And), r"and\b"),
        (RuleKind::Token(TokenKind::Comparison), r"==|!=|>=|<=|>|<"),
        (RuleKind::Token(TokenKind::Boolean), r"(?:true|false)\b"),
        (RuleKind::Token(TokenKind::LParen), r"\("),
        (RuleKind::Token(TokenKind::RParen), r"\)"),
        (RuleKind::Punct, r"[,.\[\]]"),
        (RuleKind::Identifier, r"[A-Za-z_][A-Za-z0-9_]*"),
        (RuleKind::Whitespace, r"\s+"),
    ]
    .into_iter()
    .map(|(kind, pattern)| Rule {
        kind,
        pattern: Regex::new(&format!(r"\A(?:{})", pattern)).expect("lexer rule must compile"),
    })
    .collect()
});

pub struct Lexer<'a> {
    input: &'a str,
    position: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer { input, position: 0 }
    }

    /// Returns the next token, or `None` at end of input.
    pub fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            let rest = &self.input[self.position..];
            if rest.is_empty() {
                return Ok(None);
            }

            let matched = RULES
                .iter()
                .find_map(|rule| rule.pattern.find(rest).map(|m| (rule.kind, m.as_str())));

            let Some((kind, text)) = matched else {
                let ch = rest.chars().next().unwrap_or_default();
                return Err(LexError::UnexpectedChar {
                    ch,
                    offset: self.position,
                });
            };

            let offset = self.position;
            self.position += text.len();

            let kind = match kind {
                RuleKind::Whitespace => continue,
                RuleKind::Token(kind) => kind,
                RuleKind::Punct => punct_kind(text),
                RuleKind::Identifier => identifier_kind(text),
            };

            return Ok(Some(Token::new(kind, text, offset)));
        }
    }

    /// Consumes the lexer, returning every remaining token.
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token()? {
            tokens.push(token);
        }
        Ok(tokens)
    }
}

/// Splits `input` into tokens.
pub fn lex(input: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(input).tokenize()
}

fn punct_kind(text: &str) -> TokenKind {
    match text {
        "," => TokenKind::Comma,
        "." => TokenKind::Dot,
        "[" => TokenKind::LBracket,
        _ => TokenKind::RBracket,
    }
}

fn identifier_kind(text: &str) -> TokenKind {
    let has_upper = text.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = text.chars().any(|c| c.is_ascii_lowercase());
    match (has_upper, has_lower) {
        (true, true) => TokenKind::MixedCase,
        (false, true) => TokenKind::Lowercase,
        // underscores and digits only read as upper case, like enum symbols
        _ => TokenKind::Uppercase,
    }
}

#[test]
fn test_keywords() {
    let tokens = lex("and or true false").unwrap();
    let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::And,
            TokenKind::Or,
            TokenKind::Boolean,
            TokenKind::Boolean
        ]
    );
}

#[test]
fn test_keyword_prefix_is_identifier() {
    let tokens = lex("order android trueish").unwrap();
    assert!(tokens.iter().all(|t| t.kind == TokenKind::Lowercase));
}

#[test]
fn test_offsets() {
    let tokens = lex("set( name )").unwrap();
    let offsets: Vec<_> = tokens.iter().map(|t| t.offset).collect();
    assert_eq!(offsets, vec![0, 3, 5, 10]);
}
