use rhai::{EvalAltResult, ParseError};
use thiserror::Error;

/// Why an expression produced no result
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Syntax(String),

    #[error("expression too complex: {operators} operators, limit is {limit}")]
    TooComplex { operators: usize, limit: usize },

    #[error("type error: {0}")]
    Type(String),

    #[error("unknown function `{0}`")]
    UnknownFunction(String),

    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    #[error("evaluation limit reached: {0}")]
    Limit(String),

    #[error("{0}")]
    Runtime(String),
}

impl From<ParseError> for EvalError {
    fn from(err: ParseError) -> Self {
        Self::Syntax(err.to_string())
    }
}

impl From<Box<EvalAltResult>> for EvalError {
    fn from(err: Box<EvalAltResult>) -> Self {
        match *err {
            EvalAltResult::ErrorFunctionNotFound(ref signature, _) => {
                Self::UnknownFunction(signature.clone())
            }
            EvalAltResult::ErrorArithmetic(ref message, _) => Self::Arithmetic(message.clone()),
            EvalAltResult::ErrorMismatchDataType(..) | EvalAltResult::ErrorMismatchOutputType(..) => {
                Self::Type(err.to_string())
            }
            EvalAltResult::ErrorTooManyOperations(_) | EvalAltResult::ErrorStackOverflow(_) => {
                Self::Limit(err.to_string())
            }
            _ => Self::Runtime(err.to_string()),
        }
    }
}
