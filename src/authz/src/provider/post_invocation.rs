//! Post-invocation expression gate
//!
//! Handles the `PostFilter` and `PostAuthorize` expressions of a method's
//! [`PostInvocationAttribute`].
//!
//! # Pipeline
//!
//! 1. Locate the post-invocation attribute; without one the value passes through
//! 2. Create an evaluation context for the caller and invocation
//! 3. Filter the value (skipped when the value is null)
//! 4. Bind the value as `returnObject`
//! 5. Evaluate the authorize expression; false rejects the call

use serde_json::Value;
use std::sync::Arc;

use crate::attribute::{find_post_invocation_attribute, ConfigAttribute, PostInvocationAttribute};
use crate::error::{AuthzError, Result};
use crate::expression::SecurityExpressionHandler;
use crate::observe::{DecisionEvent, DecisionEventKind, DecisionObserver, TracingObserver};
use crate::provider::AfterInvocationProvider;
use crate::types::{Authentication, MethodInvocation, SecuredObject, SecuredObjectKind};

/// After-invocation provider for post-invocation expression attributes
pub struct ExpressionAfterInvocationProvider {
    /// Expression evaluation strategy
    handler: Arc<dyn SecurityExpressionHandler>,

    /// Receives one event per branch taken
    observer: Arc<dyn DecisionObserver>,
}

impl ExpressionAfterInvocationProvider {
    /// Create a provider that logs decisions through `tracing`
    pub fn new(handler: Arc<dyn SecurityExpressionHandler>) -> Self {
        Self::with_observer(handler, Arc::new(TracingObserver))
    }

    pub fn with_observer(
        handler: Arc<dyn SecurityExpressionHandler>,
        observer: Arc<dyn DecisionObserver>,
    ) -> Self {
        Self { handler, observer }
    }

    fn emit(&self, authentication: &Authentication, object: &SecuredObject, kind: DecisionEventKind) {
        self.observer
            .on_event(&DecisionEvent::new(&authentication.principal, object.to_string(), kind));
    }

    fn evaluate(
        &self,
        authentication: &Authentication,
        object: &SecuredObject,
        invocation: &MethodInvocation,
        attribute: &PostInvocationAttribute,
        mut returned: Value,
    ) -> Result<Value> {
        let mut ctx = self
            .handler
            .create_evaluation_context(authentication, invocation)?;

        if let Some(filter) = &attribute.filter {
            if returned.is_null() {
                self.emit(
                    authentication,
                    object,
                    DecisionEventKind::FilterSkippedNullReturn {
                        expression: filter.clone(),
                    },
                );
            } else {
                returned = self.handler.filter(returned, filter, &mut ctx)?;
                self.emit(
                    authentication,
                    object,
                    DecisionEventKind::FilterApplied {
                        expression: filter.clone(),
                    },
                );
            }
        }

        self.handler.set_return_object(&returned, &mut ctx);

        if let Some(authorize) = &attribute.authorize {
            if !self.handler.evaluate_as_boolean(authorize, &ctx)? {
                self.emit(
                    authentication,
                    object,
                    DecisionEventKind::AccessRejected {
                        expression: authorize.clone(),
                    },
                );
                return Err(AuthzError::access_denied());
            }
        }

        self.emit(authentication, object, DecisionEventKind::AccessGranted);
        Ok(returned)
    }
}

impl AfterInvocationProvider for ExpressionAfterInvocationProvider {
    fn decide(
        &self,
        authentication: &Authentication,
        object: &SecuredObject,
        attributes: &[ConfigAttribute],
        returned: Value,
    ) -> Result<Value> {
        let Some(attribute) = find_post_invocation_attribute(attributes) else {
            self.emit(authentication, object, DecisionEventKind::PassThrough);
            return Ok(returned);
        };

        let invocation = object
            .as_method_invocation()
            .ok_or_else(|| AuthzError::UnsupportedSecuredObject(object.to_string()))?;

        let outcome = self.evaluate(authentication, object, invocation, attribute, returned);

        if let Err(AuthzError::Expression(error)) = &outcome {
            self.emit(
                authentication,
                object,
                DecisionEventKind::EvaluationFailed {
                    error: error.to_string(),
                },
            );
        }

        outcome
    }

    fn supports_attribute(&self, attribute: &ConfigAttribute) -> bool {
        matches!(attribute, ConfigAttribute::PostInvocation(_))
    }

    fn supports_object_kind(&self, kind: SecuredObjectKind) -> bool {
        kind == SecuredObjectKind::MethodInvocation
    }
}
