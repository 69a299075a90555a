pub mod ast;
#[cfg(feature = "cli")]
pub mod cli;
pub mod context;
pub mod contexts;
pub mod evaluator;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod pdata;
pub mod processor;
pub mod value;

pub use ast::{Expr, ParsedStatement, Token};
pub use context::{GetSetter, Getter, TransformContext};
pub use evaluator::{BindError, EvalError, ExecutableStatement, StatementError, bind};
pub use functions::{ExprFunc, FunctionRegistry, ParamKind, datapoint_functions, standard_functions};
pub use lexer::{LexError, Lexer};
pub use parser::{ParseError, Parser, parse};
pub use processor::{BatchReport, Config, ProcessorError, TransformProcessor};
pub use value::Value;
