//! Caller identity and intercepted-call types

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Authenticated (or anonymous) caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authentication {
    /// Principal identifier (e.g., "alice", "service:billing")
    pub principal: String,

    /// Granted authorities (e.g., "ROLE_ADMIN")
    #[serde(default)]
    pub authorities: Vec<String>,

    /// Additional attributes (e.g., department, tenant)
    #[serde(default)]
    pub attributes: HashMap<String, Value>,

    /// Whether the principal has been authenticated
    #[serde(default = "default_authenticated")]
    pub authenticated: bool,
}

fn default_authenticated() -> bool {
    true
}

impl Authentication {
    /// Principal name used for unauthenticated callers
    pub const ANONYMOUS_PRINCIPAL: &'static str = "anonymousUser";

    /// Create an authenticated identity
    pub fn new(principal: impl Into<String>) -> Self {
        Self {
            principal: principal.into(),
            authorities: Vec::new(),
            attributes: HashMap::new(),
            authenticated: true,
        }
    }

    /// Create an unauthenticated identity
    pub fn anonymous() -> Self {
        Self {
            principal: Self::ANONYMOUS_PRINCIPAL.to_string(),
            authorities: vec!["ROLE_ANONYMOUS".to_string()],
            attributes: HashMap::new(),
            authenticated: false,
        }
    }

    /// Grant an authority
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authorities.push(authority.into());
        self
    }

    /// Add an attribute
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Check whether an authority has been granted
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn is_anonymous(&self) -> bool {
        !self.authenticated
    }
}

/// Named argument of an intercepted method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodArgument {
    pub name: String,
    pub value: Value,
}

/// Metadata of an intercepted method call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodInvocation {
    /// Type that declares the method (e.g., "DocumentService")
    pub target: String,

    /// Method name
    pub method: String,

    /// Arguments in declaration order
    #[serde(default)]
    pub arguments: Vec<MethodArgument>,
}

impl MethodInvocation {
    pub fn new(target: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            method: method.into(),
            arguments: Vec::new(),
        }
    }

    /// Append a named argument
    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.arguments.push(MethodArgument {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Look up an argument by name
    pub fn argument(&self, name: &str) -> Option<&Value> {
        self.arguments
            .iter()
            .find(|arg| arg.name == name)
            .map(|arg| &arg.value)
    }
}

impl fmt::Display for MethodInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.target, self.method)
    }
}

/// Kind of intercepted call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecuredObjectKind {
    MethodInvocation,
    FieldAccess,
    Constructor,
}

/// Intercepted call handed to after-invocation providers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SecuredObject {
    /// Ordinary method call
    MethodInvocation(MethodInvocation),

    /// Read of a guarded field
    FieldAccess { target: String, field: String },

    /// Construction of a guarded type
    Constructor { target: String },
}

impl SecuredObject {
    pub fn kind(&self) -> SecuredObjectKind {
        match self {
            Self::MethodInvocation(_) => SecuredObjectKind::MethodInvocation,
            Self::FieldAccess { .. } => SecuredObjectKind::FieldAccess,
            Self::Constructor { .. } => SecuredObjectKind::Constructor,
        }
    }

    /// The method invocation, if this object is one
    pub fn as_method_invocation(&self) -> Option<&MethodInvocation> {
        match self {
            Self::MethodInvocation(invocation) => Some(invocation),
            _ => None,
        }
    }
}

impl From<MethodInvocation> for SecuredObject {
    fn from(invocation: MethodInvocation) -> Self {
        Self::MethodInvocation(invocation)
    }
}

impl fmt::Display for SecuredObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MethodInvocation(invocation) => write!(f, "method {}", invocation),
            Self::FieldAccess { target, field } => write!(f, "field {}.{}", target, field),
            Self::Constructor { target } => write!(f, "constructor {}", target),
        }
    }
}
