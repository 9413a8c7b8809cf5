//! Expression handler seam and its CEL implementation

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::attribute::Expression;
use crate::config::HandlerConfig;
use crate::expression::{
    context::EvaluationContext,
    convert::json_type_name,
    engine::Engine,
    error::{ExpressionError, Result},
};
use crate::types::{Authentication, MethodInvocation};
use cel_interpreter::objects::Value as CelValue;

/// Evaluation strategy used by the after-invocation gate
///
/// Implementations are configured once and shared across concurrent calls;
/// all per-call state lives in the [`EvaluationContext`] they create.
pub trait SecurityExpressionHandler: Send + Sync {
    /// Build a fresh context for one intercepted call
    fn create_evaluation_context(
        &self,
        authentication: &Authentication,
        invocation: &MethodInvocation,
    ) -> Result<EvaluationContext>;

    /// Keep only the elements of `target` for which `expr` holds
    ///
    /// Must preserve the type category of `target` and never return null for
    /// a non-null target.
    fn filter(
        &self,
        target: Value,
        expr: &Expression,
        ctx: &mut EvaluationContext,
    ) -> Result<Value>;

    /// Evaluate `expr` as a boolean predicate
    fn evaluate_as_boolean(&self, expr: &Expression, ctx: &EvaluationContext) -> Result<bool>;

    /// Expose the method's result to subsequent expressions
    fn set_return_object(&self, value: &Value, ctx: &mut EvaluationContext);
}

/// Default handler evaluating expressions as CEL
///
/// # Variables
///
/// | name | value |
/// |------|-------|
/// | `principal` | principal id |
/// | `authentication` | `{principal, authorities, attributes, authenticated}` |
/// | `authorities` | granted authorities |
/// | `isAuthenticated`, `isAnonymous` | authentication state |
/// | `permitAll`, `denyAll` | `true`, `false` |
/// | `method` | `{target, name}` |
/// | `args` | arguments by name; each is also bound directly unless it shadows one of the above |
/// | `returnObject` | method result, once bound |
/// | `filterObject` | element under test while filtering |
pub struct CelExpressionHandler {
    engine: Engine,
}

const RESERVED_VARIABLES: &[&str] = &[
    "principal",
    "authentication",
    "authorities",
    "isAuthenticated",
    "isAnonymous",
    "permitAll",
    "denyAll",
    "method",
    "args",
    EvaluationContext::RETURN_OBJECT,
    EvaluationContext::FILTER_OBJECT,
];

impl CelExpressionHandler {
    pub fn new() -> Self {
        Self::with_config(HandlerConfig::default())
    }

    pub fn with_config(config: HandlerConfig) -> Self {
        Self {
            engine: Engine::with_config(config),
        }
    }

    /// Underlying CEL engine
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    fn retain(
        &self,
        program: &cel_interpreter::Program,
        candidate: Value,
        ctx: &mut EvaluationContext,
    ) -> Result<bool> {
        ctx.set_variable(EvaluationContext::FILTER_OBJECT, candidate);
        match self.engine.evaluate(program, ctx)? {
            CelValue::Bool(keep) => Ok(keep),
            _ => Err(ExpressionError::NonBooleanResult),
        }
    }

    fn filter_array(
        &self,
        items: Vec<Value>,
        expr: &Expression,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let program = self.engine.compile(expr.source())?;
        let total = items.len();
        let mut retained = Vec::with_capacity(total);

        for item in items {
            if self.retain(&program, item.clone(), ctx)? {
                retained.push(item);
            }
        }

        debug!("Retained {} of {} elements after filtering", retained.len(), total);
        Ok(Value::Array(retained))
    }

    fn filter_object(
        &self,
        entries: Map<String, Value>,
        expr: &Expression,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let program = self.engine.compile(expr.source())?;
        let total = entries.len();
        let mut retained = Map::new();

        for (key, value) in entries {
            let entry = json!({ "key": key, "value": value });
            if self.retain(&program, entry, ctx)? {
                retained.insert(key, value);
            }
        }

        debug!("Retained {} of {} entries after filtering", retained.len(), total);
        Ok(Value::Object(retained))
    }
}

impl Default for CelExpressionHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityExpressionHandler for CelExpressionHandler {
    fn create_evaluation_context(
        &self,
        authentication: &Authentication,
        invocation: &MethodInvocation,
    ) -> Result<EvaluationContext> {
        let mut args = Map::new();
        for arg in &invocation.arguments {
            args.insert(arg.name.clone(), arg.value.clone());
        }

        let mut ctx = EvaluationContext::new()
            .with_variable("principal", authentication.principal.as_str())
            .with_variable(
                "authentication",
                json!({
                    "principal": authentication.principal,
                    "authorities": authentication.authorities,
                    "attributes": authentication.attributes,
                    "authenticated": authentication.authenticated,
                }),
            )
            .with_variable("authorities", json!(authentication.authorities))
            .with_variable("isAuthenticated", authentication.authenticated)
            .with_variable("isAnonymous", authentication.is_anonymous())
            .with_variable("permitAll", true)
            .with_variable("denyAll", false)
            .with_variable(
                "method",
                json!({ "target": invocation.target, "name": invocation.method }),
            );

        for arg in &invocation.arguments {
            if RESERVED_VARIABLES.contains(&arg.name.as_str()) {
                debug!(
                    "Argument '{}' of {} shadows a built-in variable, only reachable via args",
                    arg.name, invocation
                );
                continue;
            }
            ctx.set_variable(arg.name.clone(), arg.value.clone());
        }
        ctx.set_variable("args", Value::Object(args));

        Ok(ctx)
    }

    fn filter(
        &self,
        target: Value,
        expr: &Expression,
        ctx: &mut EvaluationContext,
    ) -> Result<Value> {
        let filtered = match target {
            Value::Null => return Ok(Value::Null),
            Value::Array(items) => self.filter_array(items, expr, ctx),
            Value::Object(entries) => self.filter_object(entries, expr, ctx),
            other => Err(ExpressionError::InvalidFilterTarget(
                json_type_name(&other).to_string(),
            )),
        };

        ctx.remove_variable(EvaluationContext::FILTER_OBJECT);
        filtered
    }

    fn evaluate_as_boolean(&self, expr: &Expression, ctx: &EvaluationContext) -> Result<bool> {
        self.engine.evaluate_bool(expr.source(), ctx)
    }

    fn set_return_object(&self, value: &Value, ctx: &mut EvaluationContext) {
        ctx.set_variable(EvaluationContext::RETURN_OBJECT, value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context_for(handler: &CelExpressionHandler) -> EvaluationContext {
        let auth = Authentication::new("alice")
            .with_authority("ROLE_USER")
            .with_attribute("tenant", "acme");
        let invocation = MethodInvocation::new("DocumentService", "find")
            .with_argument("id", 42)
            .with_argument("principal", "mallory");

        handler.create_evaluation_context(&auth, &invocation).unwrap()
    }

    #[test]
    fn test_context_variables() {
        let handler = CelExpressionHandler::new();
        let ctx = context_for(&handler);

        assert_eq!(ctx.variable("principal"), Some(&json!("alice")));
        assert_eq!(ctx.variable("id"), Some(&json!(42)));
        assert_eq!(ctx.variable("isAuthenticated"), Some(&json!(true)));
        assert_eq!(
            ctx.variable("method"),
            Some(&json!({"target": "DocumentService", "name": "find"}))
        );
        assert!(ctx.return_object().is_none());
    }

    #[test]
    fn test_argument_cannot_shadow_builtin() {
        let handler = CelExpressionHandler::new();
        let ctx = context_for(&handler);

        assert_eq!(ctx.variable("principal"), Some(&json!("alice")));
        assert_eq!(
            ctx.variable("args"),
            Some(&json!({"id": 42, "principal": "mallory"}))
        );
    }

    #[test]
    fn test_builtin_predicates() {
        let handler = CelExpressionHandler::new();
        let ctx = context_for(&handler);

        for (expr, expected) in [
            ("permitAll", true),
            ("denyAll", false),
            ("isAuthenticated && !isAnonymous", true),
            ("'ROLE_USER' in authorities", true),
            ("authentication.attributes.tenant == 'acme'", true),
            ("args.id == 42 && id == 42", true),
        ] {
            let result = handler
                .evaluate_as_boolean(&Expression::new(expr), &ctx)
                .unwrap();
            assert_eq!(result, expected, "expression: {}", expr);
        }
    }

    #[test]
    fn test_filter_array() {
        let handler = CelExpressionHandler::new();
        let mut ctx = context_for(&handler);

        let filtered = handler
            .filter(json!([1, 5, 10, 20]), &Expression::new("filterObject >= 10"), &mut ctx)
            .unwrap();

        assert_eq!(filtered, json!([10, 20]));
        assert!(!ctx.contains(EvaluationContext::FILTER_OBJECT));
    }

    #[test]
    fn test_filter_object_entries() {
        let handler = CelExpressionHandler::new();
        let mut ctx = context_for(&handler);

        let filtered = handler
            .filter(
                json!({"a": {"owner": "alice"}, "b": {"owner": "bob"}}),
                &Expression::new("filterObject.value.owner == principal"),
                &mut ctx,
            )
            .unwrap();

        assert_eq!(filtered, json!({"a": {"owner": "alice"}}));
    }

    #[test]
    fn test_filter_can_empty_collection() {
        let handler = CelExpressionHandler::new();
        let mut ctx = context_for(&handler);

        let filtered = handler
            .filter(json!([1, 2]), &Expression::new("false"), &mut ctx)
            .unwrap();
        assert_eq!(filtered, json!([]));
    }

    #[test]
    fn test_filter_rejects_scalar() {
        let handler = CelExpressionHandler::new();
        let mut ctx = context_for(&handler);

        let result = handler.filter(json!("text"), &Expression::new("true"), &mut ctx);
        assert!(matches!(result, Err(ExpressionError::InvalidFilterTarget(t)) if t == "string"));
    }

    #[test]
    fn test_filter_requires_boolean() {
        let handler = CelExpressionHandler::new();
        let mut ctx = context_for(&handler);

        let result = handler.filter(json!([1]), &Expression::new("filterObject"), &mut ctx);
        assert!(matches!(result, Err(ExpressionError::NonBooleanResult)));
        assert!(!ctx.contains(EvaluationContext::FILTER_OBJECT));
    }

    #[test]
    fn test_set_return_object() {
        let handler = CelExpressionHandler::new();
        let mut ctx = context_for(&handler);

        handler.set_return_object(&json!({"owner": "alice"}), &mut ctx);
        assert!(handler
            .evaluate_as_boolean(&Expression::new("returnObject.owner == principal"), &ctx)
            .unwrap());
    }
}
