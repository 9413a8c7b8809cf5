//! Configuration attributes attached to protected methods

use serde::{Deserialize, Serialize};
use std::fmt;

/// Source text of a security expression
///
/// Compilation is left to the expression handler, which may cache the result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Expression(String);

impl Expression {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn source(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Expression {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl From<String> for Expression {
    fn from(source: String) -> Self {
        Self(source)
    }
}

/// Expressions checked before the method runs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreInvocationAttribute {
    /// Name of the argument to filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter_target: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize: Option<Expression>,
}

/// Expressions checked after the method returns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInvocationAttribute {
    /// Applied to each element of the returned collection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Expression>,

    /// Boolean gate over the (filtered) return value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorize: Option<Expression>,
}

impl PostInvocationAttribute {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, expr: impl Into<Expression>) -> Self {
        self.filter = Some(expr.into());
        self
    }

    pub fn with_authorize(mut self, expr: impl Into<Expression>) -> Self {
        self.authorize = Some(expr.into());
        self
    }
}

/// Policy annotation attached to a protected operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigAttribute {
    /// Plain marker such as a required role
    Security { value: String },

    /// Pre-invocation expressions
    PreInvocation(PreInvocationAttribute),

    /// Post-invocation expressions
    PostInvocation(PostInvocationAttribute),
}

impl ConfigAttribute {
    pub fn security(value: impl Into<String>) -> Self {
        Self::Security { value: value.into() }
    }

    pub fn post_filter(expr: impl Into<Expression>) -> Self {
        Self::PostInvocation(PostInvocationAttribute::new().with_filter(expr))
    }

    pub fn post_authorize(expr: impl Into<Expression>) -> Self {
        Self::PostInvocation(PostInvocationAttribute::new().with_authorize(expr))
    }

    pub fn as_post_invocation(&self) -> Option<&PostInvocationAttribute> {
        match self {
            Self::PostInvocation(attr) => Some(attr),
            _ => None,
        }
    }
}

/// Find the post-invocation attribute in a method's attribute list
///
/// Only one is expected; if several are present the first wins.
pub fn find_post_invocation_attribute(
    attributes: &[ConfigAttribute],
) -> Option<&PostInvocationAttribute> {
    attributes.iter().find_map(ConfigAttribute::as_post_invocation)
}
