//! Conversion of JSON values into CEL values
//!
//! Returned values and context variables are plain `serde_json` values; the
//! interpreter only sees them at evaluation time.

use cel_interpreter::objects::{Key, Map, Value as CelValue};
use serde_json::{Number, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Convert a JSON value into the interpreter's value model
///
/// Objects become maps with string keys. Numbers keep the narrowest CEL
/// representation: signed, then unsigned, then float.
pub fn json_to_cel(value: &JsonValue) -> CelValue {
    match value {
        JsonValue::Null => CelValue::Null,
        JsonValue::Bool(b) => CelValue::Bool(*b),
        JsonValue::Number(n) => number_to_cel(n),
        JsonValue::String(s) => CelValue::String(Arc::new(s.clone())),
        JsonValue::Array(items) => CelValue::List(Arc::new(items.iter().map(json_to_cel).collect())),
        JsonValue::Object(fields) => {
            let map: HashMap<Key, CelValue> = fields
                .iter()
                .map(|(name, field)| (Key::from(name.clone()), json_to_cel(field)))
                .collect();
            CelValue::Map(Map { map: Arc::new(map) })
        }
    }
}

fn number_to_cel(n: &Number) -> CelValue {
    n.as_i64()
        .map(CelValue::Int)
        .or_else(|| n.as_u64().map(CelValue::UInt))
        .or_else(|| n.as_f64().map(CelValue::Float))
        .unwrap_or(CelValue::Null)
}

/// Short type name used in error messages
pub fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_to_cel_scalars() {
        assert!(matches!(json_to_cel(&json!(null)), CelValue::Null));
        assert!(matches!(json_to_cel(&json!(true)), CelValue::Bool(true)));
        assert!(matches!(json_to_cel(&json!(42)), CelValue::Int(42)));
        assert!(matches!(json_to_cel(&json!(u64::MAX)), CelValue::UInt(u64::MAX)));
        assert!(matches!(json_to_cel(&json!(-7)), CelValue::Int(-7)));
        assert!(matches!(json_to_cel(&json!(1.5)), CelValue::Float(f) if f == 1.5));
    }

    #[test]
    fn test_json_to_cel_string() {
        if let CelValue::String(s) = json_to_cel(&json!("hello")) {
            assert_eq!(s.as_str(), "hello");
        } else {
            panic!("Expected String");
        }
    }

    #[test]
    fn test_json_to_cel_nested() {
        let cel = json_to_cel(&json!({"owner": "alice", "tags": [1, 2, 3]}));
        if let CelValue::Map(map) = cel {
            assert_eq!(map.map.len(), 2);
            match map.map.get(&Key::from("tags".to_string())) {
                Some(CelValue::List(list)) => assert_eq!(list.len(), 3),
                other => panic!("Expected List, got {:?}", other),
            }
        } else {
            panic!("Expected Map");
        }
    }

    #[test]
    fn test_json_type_name() {
        assert_eq!(json_type_name(&json!("x")), "string");
        assert_eq!(json_type_name(&json!([])), "array");
        assert_eq!(json_type_name(&json!({})), "object");
    }
}
