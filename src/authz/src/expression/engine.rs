//! CEL expression engine with compiled program caching

use cel_interpreter::objects::Value as CelValue;
use cel_interpreter::{Context, Program};
use dashmap::DashMap;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::HandlerConfig;
use crate::expression::{
    context::EvaluationContext,
    convert::json_to_cel,
    error::{ExpressionError, Result},
};

/// CEL engine for compiling and evaluating expressions
pub struct Engine {
    /// Compiled program cache (thread-safe)
    program_cache: DashMap<String, Arc<Program>>,

    config: HandlerConfig,
}

impl Engine {
    /// Create a new CEL engine with default configuration
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::default())
    }

    pub fn with_config(config: HandlerConfig) -> Self {
        Self {
            program_cache: DashMap::new(),
            config,
        }
    }

    /// Compile a CEL expression, reusing a cached program when available
    ///
    /// # Errors
    /// Returns error if expression cannot be compiled
    pub fn compile(&self, expr: &str) -> Result<Arc<Program>> {
        if self.config.enable_program_cache {
            if let Some(prog) = self.program_cache.get(expr) {
                return Ok(prog.clone());
            }
        }

        let program = Program::compile(expr)
            .map_err(|e| ExpressionError::CompilationError(format!("{:?}", e)))?;
        let program = Arc::new(program);

        if self.config.enable_program_cache {
            if self.program_cache.len() >= self.config.program_cache_capacity {
                debug!(
                    "Program cache full ({} entries), flushing",
                    self.program_cache.len()
                );
                self.program_cache.clear();
            }
            self.program_cache.insert(expr.to_string(), program.clone());
        }

        Ok(program)
    }

    /// Evaluate a compiled program against the context variables
    ///
    /// The interpreter panics on some arithmetic faults (integer division by
    /// zero, `i64` overflow); those are reported as evaluation errors.
    ///
    /// # Errors
    /// Returns error if evaluation fails
    pub fn evaluate(&self, program: &Program, ctx: &EvaluationContext) -> Result<CelValue> {
        let mut cel_context = Context::default();
        for (name, value) in ctx.variables() {
            cel_context.add_variable_from_value(name.clone(), json_to_cel(value));
        }

        match panic::catch_unwind(AssertUnwindSafe(|| program.execute(&cel_context))) {
            Ok(result) => {
                result.map_err(|e| ExpressionError::EvaluationError(format!("{:?}", e)))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!("CEL evaluation aborted: {}", message);
                Err(ExpressionError::EvaluationError(format!(
                    "evaluation aborted: {}",
                    message
                )))
            }
        }
    }

    /// Compile and evaluate an expression, requiring a boolean result
    pub fn evaluate_bool(&self, expr: &str, ctx: &EvaluationContext) -> Result<bool> {
        let program = self.compile(expr)?;
        match self.evaluate(&program, ctx)? {
            CelValue::Bool(b) => Ok(b),
            _ => Err(ExpressionError::NonBooleanResult),
        }
    }

    /// Clear the compiled program cache
    pub fn clear_cache(&self) {
        self.program_cache.clear();
    }

    /// Get cache statistics
    pub fn cache_stats(&self) -> CacheStats {
        CacheStats {
            size: self.program_cache.len(),
            capacity: self.config.program_cache_capacity,
        }
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "interpreter panicked".to_string()
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    /// Number of cached programs
    pub size: usize,

    pub capacity: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_context() -> EvaluationContext {
        EvaluationContext::new()
            .with_variable("principal", "alice")
            .with_variable("authorities", json!(["ROLE_USER", "ROLE_EDITOR"]))
            .with_variable("returnObject", json!({"id": 1, "owner": "alice"}))
    }

    #[test]
    fn test_engine_creation() {
        let engine = Engine::new();
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn test_simple_expression() {
        let engine = Engine::new();
        let ctx = create_test_context();

        assert!(engine.evaluate_bool("true", &ctx).unwrap());
        assert!(!engine.evaluate_bool("false", &ctx).unwrap());
    }

    #[test]
    fn test_variable_access() {
        let engine = Engine::new();
        let ctx = create_test_context();

        assert!(engine
            .evaluate_bool("returnObject.owner == principal", &ctx)
            .unwrap());
        assert!(engine
            .evaluate_bool("'ROLE_USER' in authorities", &ctx)
            .unwrap());
        assert!(!engine
            .evaluate_bool("'ROLE_ADMIN' in authorities", &ctx)
            .unwrap());
    }

    #[test]
    fn test_program_caching() {
        let engine = Engine::new();
        let ctx = create_test_context();

        let _ = engine.evaluate_bool("true", &ctx).unwrap();
        assert_eq!(engine.cache_stats().size, 1);

        let _ = engine.evaluate_bool("true", &ctx).unwrap();
        assert_eq!(engine.cache_stats().size, 1);

        let _ = engine.evaluate_bool("false", &ctx).unwrap();
        assert_eq!(engine.cache_stats().size, 2);

        engine.clear_cache();
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn test_cache_flushes_at_capacity() {
        let engine = Engine::with_config(HandlerConfig {
            enable_program_cache: true,
            program_cache_capacity: 2,
        });

        engine.compile("1 == 1").unwrap();
        engine.compile("2 == 2").unwrap();
        assert_eq!(engine.cache_stats().size, 2);

        engine.compile("3 == 3").unwrap();
        assert_eq!(engine.cache_stats().size, 1);
    }

    #[test]
    fn test_cache_disabled() {
        let engine = Engine::with_config(HandlerConfig {
            enable_program_cache: false,
            ..HandlerConfig::default()
        });

        engine.compile("true").unwrap();
        assert_eq!(engine.cache_stats().size, 0);
    }

    #[test]
    fn test_compilation_error() {
        let engine = Engine::new();

        let result = engine.compile("invalid syntax @#$");
        assert!(matches!(result, Err(ExpressionError::CompilationError(_))));
    }

    #[test]
    fn test_non_boolean_result() {
        let engine = Engine::new();
        let ctx = create_test_context();

        let result = engine.evaluate_bool("'hello'", &ctx);
        assert!(matches!(result, Err(ExpressionError::NonBooleanResult)));
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Engine>();
    }

    #[test]
    fn test_division_by_zero_is_evaluation_error() {
        let engine = Engine::new();
        let ctx = EvaluationContext::new().with_variable("count", 0);

        let result = engine.evaluate_bool("10 / count > 1", &ctx);
        assert!(matches!(result, Err(ExpressionError::EvaluationError(_))));
    }

    #[test]
    fn test_unknown_variable_is_evaluation_error() {
        let engine = Engine::new();
        let ctx = create_test_context();

        let result = engine.evaluate_bool("missing == 1", &ctx);
        assert!(matches!(result, Err(ExpressionError::EvaluationError(_))));
    }
}
