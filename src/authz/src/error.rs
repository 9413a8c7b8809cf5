//! Error types for post-invocation authorization

use crate::expression::ExpressionError;
use thiserror::Error;

/// Message carried by every access-denied rejection
pub const ACCESS_DENIED_MESSAGE: &str = "Access is denied";

/// Authorization errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// An authorize expression evaluated to false
    #[error("{message}")]
    AccessDenied { message: String },

    /// Failure raised by the expression handler, passed through unchanged
    #[error(transparent)]
    Expression(#[from] ExpressionError),

    /// The intercepted call is not a method invocation
    #[error("Unsupported secured object: {0}")]
    UnsupportedSecuredObject(String),

    /// Invalid provider or handler configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl AuthzError {
    /// Access-denied rejection with the fixed message
    pub fn access_denied() -> Self {
        Self::AccessDenied {
            message: ACCESS_DENIED_MESSAGE.to_string(),
        }
    }

    /// Whether this is an authorization rejection rather than a collaborator failure
    pub fn is_access_denied(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_denied_message() {
        let err = AuthzError::access_denied();
        assert!(err.is_access_denied());
        assert_eq!(err.to_string(), "Access is denied");
    }

    #[test]
    fn test_expression_error_is_transparent() {
        let err: AuthzError = ExpressionError::NonBooleanResult.into();
        assert!(!err.is_access_denied());
        assert_eq!(err.to_string(), ExpressionError::NonBooleanResult.to_string());
    }
}
