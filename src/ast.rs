//! # OTTL Statement Language - Abstract Syntax Tree
//!
//! This module defines the Abstract Syntax Tree (AST) produced by the parser.
//! A statement is a single function invocation, optionally guarded by a
//! `where` clause:
//!
//! ```text
//! set(attributes["env"], "prod") where resource.attributes["region"] == "eu"
//! ```
//!
//! ## Architecture Overview
//!
//! - **[tokens]** - Lexical tokens produced by the lexer
//! - **[expressions]** - Value expressions (literals, paths, invocations)
//! - **[operators]** - Comparison operators
//! - **[statements]** - Statements and the boolean `where` clause tree
//!
//! ## Boolean Structure
//!
//! The `where` clause is kept in the shape of the grammar: an OR of terms, each
//! term an AND of boolean values. A boolean value is a comparison, a boolean
//! literal, a converter invocation, or a parenthesized sub-expression.
//!
//! ```text
//! name == "a" or kind == SPAN_KIND_SERVER and (status.code != 0 or true)
//! ```
//!
//! parses as `Or[Term[name == "a"], Term[kind == ..., Sub(Or[..])]]`.
//!
//! The tree is immutable once produced; binding reads it and never mutates it.
pub mod tokens;
pub mod expressions;
pub mod operators;
pub mod statements;

pub use tokens::{Token, TokenKind};
pub use expressions::{Expr, Field, Invocation, Path};
pub use operators::CompareOp;
pub use statements::{BooleanExpression, BooleanValue, Comparison, ParsedStatement, Term};
