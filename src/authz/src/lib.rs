//! # Post-invocation expression authorization
//!
//! Decides, after a guarded method has returned, whether its result may be
//! released to the caller. A method carries at most one post-invocation
//! attribute with two optional expressions:
//!
//! - a **filter** expression, applied to each element of a collection-like
//!   result to drop what the caller may not see;
//! - an **authorize** expression, a boolean predicate over the (filtered)
//!   result that rejects the whole call when false.
//!
//! Expressions are evaluated through a pluggable [`SecurityExpressionHandler`];
//! the crate ships a CEL-backed default ([`CelExpressionHandler`]).
//!
//! ```text
//! attributes ─→ locate ─→ create context ─→ filter ─→ bind returnObject ─→ authorize
//!                  │                          │                              │
//!            (none: pass through)    (null: skip)              (false: AccessDenied)
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use postauthz::{
//!     AfterInvocationProvider, Authentication, CelExpressionHandler, ConfigAttribute,
//!     ExpressionAfterInvocationProvider, MethodInvocation, PostInvocationAttribute,
//!     SecuredObject,
//! };
//! use serde_json::json;
//!
//! let provider = ExpressionAfterInvocationProvider::new(Arc::new(CelExpressionHandler::new()));
//!
//! let auth = Authentication::new("alice").with_authority("ROLE_USER");
//! let call = SecuredObject::from(MethodInvocation::new("DocumentService", "list"));
//! let attrs = vec![ConfigAttribute::PostInvocation(
//!     PostInvocationAttribute::new().with_filter("filterObject.owner == principal"),
//! )];
//!
//! let docs = json!([{"id": 1, "owner": "alice"}, {"id": 2, "owner": "bob"}]);
//! let visible = provider.decide(&auth, &call, &attrs, docs).unwrap();
//! assert_eq!(visible, json!([{"id": 1, "owner": "alice"}]));
//! ```

pub mod attribute;
pub mod config;
pub mod error;
pub mod expression;
pub mod observe;
pub mod provider;
pub mod types;

pub use attribute::{
    find_post_invocation_attribute, ConfigAttribute, Expression, PostInvocationAttribute,
    PreInvocationAttribute,
};
pub use config::HandlerConfig;
pub use error::{AuthzError, Result, ACCESS_DENIED_MESSAGE};
pub use expression::{
    CelExpressionHandler, EvaluationContext, ExpressionError, SecurityExpressionHandler,
};
pub use observe::{
    CompositeObserver, DecisionEvent, DecisionEventKind, DecisionObserver, GateMetrics,
    GateMetricsSnapshot, TracingObserver,
};
pub use provider::{
    AfterInvocationManager, AfterInvocationProvider, ExpressionAfterInvocationProvider,
};
pub use types::{Authentication, MethodArgument, MethodInvocation, SecuredObject, SecuredObjectKind};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
