//! Decision events and observers
//!
//! The gate reports each branch it takes as a [`DecisionEvent`]. Observers
//! never influence the decision.

pub mod metrics;

pub use metrics::{GateMetrics, GateMetricsSnapshot};

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::attribute::Expression;

/// Branch taken by the post-invocation gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DecisionEventKind {
    /// No post-invocation attribute, value returned untouched
    PassThrough,

    /// Filter expression applied to the returned value
    FilterApplied { expression: Expression },

    /// Returned value was null so filtering was skipped
    FilterSkippedNullReturn { expression: Expression },

    /// Authorize expression evaluated to false
    AccessRejected { expression: Expression },

    /// All configured expressions passed
    AccessGranted,

    /// The expression handler failed; the error is propagated to the caller
    EvaluationFailed { error: String },
}

/// Structured record of one gate branch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionEvent {
    /// Unique event ID
    pub id: String,

    /// Principal the decision was made for
    pub principal: String,

    /// Intercepted call (e.g., "method DocumentService.find")
    pub secured_object: String,

    pub kind: DecisionEventKind,

    /// Event timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

impl DecisionEvent {
    pub fn new(
        principal: impl Into<String>,
        secured_object: impl Into<String>,
        kind: DecisionEventKind,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            principal: principal.into(),
            secured_object: secured_object.into(),
            kind,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

/// Side-channel hook receiving decision events
pub trait DecisionObserver: Send + Sync {
    fn on_event(&self, event: &DecisionEvent);
}

/// Emits decision events as debug-level `tracing` events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl DecisionObserver for TracingObserver {
    fn on_event(&self, event: &DecisionEvent) {
        match &event.kind {
            DecisionEventKind::PassThrough => {
                debug!(
                    principal = %event.principal,
                    object = %event.secured_object,
                    "No post-invocation attribute, returning value unchanged"
                );
            }
            DecisionEventKind::FilterApplied { expression } => {
                debug!(object = %event.secured_object, "Applied PostFilter expression {}", expression);
            }
            DecisionEventKind::FilterSkippedNullReturn { expression } => {
                debug!(
                    object = %event.secured_object,
                    "Return object is null, filtering with {} will be skipped", expression
                );
            }
            DecisionEventKind::AccessRejected { expression } => {
                debug!(
                    principal = %event.principal,
                    object = %event.secured_object,
                    "PostAuthorize expression {} rejected access", expression
                );
            }
            DecisionEventKind::AccessGranted => {
                debug!(
                    principal = %event.principal,
                    object = %event.secured_object,
                    "Post-invocation expressions passed"
                );
            }
            DecisionEventKind::EvaluationFailed { error } => {
                debug!(object = %event.secured_object, "Expression handler failed: {}", error);
            }
        }
    }
}

/// Forwards every event to each wrapped observer in order
#[derive(Default, Clone)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn DecisionObserver>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, observer: Arc<dyn DecisionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl DecisionObserver for CompositeObserver {
    fn on_event(&self, event: &DecisionEvent) {
        for observer in &self.observers {
            observer.on_event(event);
        }
    }
}
