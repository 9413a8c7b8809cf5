//! Error types for expression operations

use thiserror::Error;

/// Expression handler errors
#[derive(Error, Debug)]
pub enum ExpressionError {
    #[error("Expression compilation failed: {0}")]
    CompilationError(String),

    #[error("Expression evaluation failed: {0}")]
    EvaluationError(String),

    #[error("Expression did not return boolean result")]
    NonBooleanResult,

    #[error("Filter target must be an array or object, found {0}")]
    InvalidFilterTarget(String),
}

/// Result type for expression operations
pub type Result<T> = std::result::Result<T, ExpressionError>;
