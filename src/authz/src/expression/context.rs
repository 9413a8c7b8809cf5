//! Per-call evaluation context

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Variables visible to expressions during one gate invocation
///
/// Created by the expression handler, owned by a single call and dropped
/// when the call completes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationContext {
    variables: HashMap<String, Value>,
}

impl EvaluationContext {
    /// Variable bound to the method's result
    pub const RETURN_OBJECT: &'static str = "returnObject";

    /// Variable bound to the element under test while filtering
    pub const FILTER_OBJECT: &'static str = "filterObject";

    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set_variable`](Self::set_variable)
    pub fn with_variable(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set_variable(name, value);
        self
    }

    /// Bind a variable, replacing any previous binding
    pub fn set_variable(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.variables.insert(name.into(), value.into());
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    /// The bound return object, if any
    pub fn return_object(&self) -> Option<&Value> {
        self.variable(Self::RETURN_OBJECT)
    }

    /// All bound variables
    pub fn variables(&self) -> &HashMap<String, Value> {
        &self.variables
    }

    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }
}
