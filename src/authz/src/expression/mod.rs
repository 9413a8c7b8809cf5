//! Security expression evaluation
//!
//! [`SecurityExpressionHandler`] is the seam the after-invocation gate depends
//! on. [`CelExpressionHandler`] implements it on top of CEL (Common Expression
//! Language) with compiled program caching.

pub mod context;
pub mod convert;
pub mod engine;
pub mod error;
pub mod handler;

pub use context::EvaluationContext;
pub use engine::Engine;
pub use error::{ExpressionError, Result};
pub use handler::{CelExpressionHandler, SecurityExpressionHandler};
