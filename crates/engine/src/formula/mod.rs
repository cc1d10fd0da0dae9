// Formula parsing, evaluation and reference shifting

pub mod eval;
pub mod parser;
pub mod shift;

pub use eval::{evaluate, is_error_sentinel};
pub use shift::shift_formula_refs;

use thiserror::Error;

/// Why a formula failed to parse. Never escapes [`evaluate`], which turns
/// every failure into a sentinel value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    #[error("formula must start with =")]
    MissingEquals,
    #[error("empty formula")]
    Empty,
    #[error("unexpected character: {0}")]
    UnexpectedChar(char),
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),
    #[error("unexpected end of formula")]
    UnexpectedEnd,
    #[error("unterminated string literal")]
    UnterminatedString,
    #[error("missing closing parenthesis")]
    UnclosedParen,
    #[error("invalid number: {0}")]
    InvalidNumber(String),
    #[error("invalid cell reference: {0}")]
    InvalidReference(String),
    #[error("unknown name: {0}")]
    UnknownName(String),
    #[error("unexpected input after expression: {0}")]
    TrailingInput(String),
}
