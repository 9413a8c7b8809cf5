//! After-invocation providers
//!
//! A provider inspects the value returned by an intercepted call and either
//! releases it (possibly transformed) or rejects the call.

pub mod manager;
pub mod post_invocation;

pub use manager::AfterInvocationManager;
pub use post_invocation::ExpressionAfterInvocationProvider;

use serde_json::Value;

use crate::attribute::ConfigAttribute;
use crate::error::Result;
use crate::types::{Authentication, SecuredObject, SecuredObjectKind};

/// Decision point run after a guarded call returns
pub trait AfterInvocationProvider: Send + Sync {
    /// Release, transform or reject `returned`
    ///
    /// # Errors
    /// Returns [`AuthzError::AccessDenied`](crate::AuthzError::AccessDenied)
    /// when the caller may not see the result; other errors come from
    /// collaborators and are propagated as-is.
    fn decide(
        &self,
        authentication: &Authentication,
        object: &SecuredObject,
        attributes: &[ConfigAttribute],
        returned: Value,
    ) -> Result<Value>;

    /// Whether this provider handles the given attribute
    fn supports_attribute(&self, attribute: &ConfigAttribute) -> bool;

    /// Whether this provider handles the given kind of intercepted call
    fn supports_object_kind(&self, kind: SecuredObjectKind) -> bool;
}
