//! Chains after-invocation providers

use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::attribute::ConfigAttribute;
use crate::error::{AuthzError, Result};
use crate::provider::AfterInvocationProvider;
use crate::types::{Authentication, SecuredObject, SecuredObjectKind};

/// Runs each provider in order, feeding one provider's output to the next
pub struct AfterInvocationManager {
    providers: Vec<Arc<dyn AfterInvocationProvider>>,
}

impl AfterInvocationManager {
    /// # Errors
    /// Returns [`AuthzError::InvalidConfiguration`] when `providers` is empty
    pub fn new(providers: Vec<Arc<dyn AfterInvocationProvider>>) -> Result<Self> {
        if providers.is_empty() {
            return Err(AuthzError::InvalidConfiguration(
                "at least one after-invocation provider is required".to_string(),
            ));
        }

        info!("AfterInvocationManager initialized with {} providers", providers.len());
        Ok(Self { providers })
    }

    pub fn providers(&self) -> &[Arc<dyn AfterInvocationProvider>] {
        &self.providers
    }
}

impl AfterInvocationProvider for AfterInvocationManager {
    fn decide(
        &self,
        authentication: &Authentication,
        object: &SecuredObject,
        attributes: &[ConfigAttribute],
        returned: Value,
    ) -> Result<Value> {
        let mut result = returned;
        for (index, provider) in self.providers.iter().enumerate() {
            debug!("Running after-invocation provider {} for {}", index, object);
            result = provider.decide(authentication, object, attributes, result)?;
        }
        Ok(result)
    }

    fn supports_attribute(&self, attribute: &ConfigAttribute) -> bool {
        self.providers
            .iter()
            .any(|provider| provider.supports_attribute(attribute))
    }

    fn supports_object_kind(&self, kind: SecuredObjectKind) -> bool {
        self.providers
            .iter()
            .all(|provider| provider.supports_object_kind(kind))
    }
}
