//! Live conversation state and the tool result cache.

use crate::types::Message;
use serde_json::Value;
use std::collections::HashMap;

/// Messages of the current task plus results of the tool calls made in it.
#[derive(Debug, Clone, Default)]
pub struct ConversationContext {
    messages: Vec<Message>,
    results: HashMap<String, Value>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn cached(&self, fingerprint: &str) -> Option<&Value> {
        self.results.get(fingerprint)
    }

    pub fn remember(&mut self, fingerprint: String, result: Value) {
        self.results.insert(fingerprint, result);
    }

    pub fn cached_results(&self) -> usize {
        self.results.len()
    }
}

/// Cache key of a tool call: `name:` followed by the canonical arguments.
pub fn fingerprint(name: &str, arguments: &Value) -> String {
    format!("{}:{}", name, canonical_json(arguments))
}

/// Compact JSON with object keys sorted at every level.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                if let Some(inner) = map.get(key) {
                    write_canonical(inner, out);
                }
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fingerprint_ignores_key_order() {
        let a: Value =
            serde_json::from_str(r#"{"b": 1, "a": {"y": [1, {"d": 2, "c": 3}], "x": null}}"#)
                .unwrap();
        let b: Value =
            serde_json::from_str(r#"{"a": {"x": null, "y": [1, {"c": 3, "d": 2}]}, "b": 1}"#)
                .unwrap();
        assert_eq!(fingerprint("lookup", &a), fingerprint("lookup", &b));
    }

    #[test]
    fn test_fingerprint_distinguishes_values_and_tools() {
        let base = fingerprint("lookup", &json!({"id": 1}));
        assert_ne!(base, fingerprint("lookup", &json!({"id": 2})));
        assert_ne!(base, fingerprint("fetch", &json!({"id": 1})));
    }

    #[test]
    fn test_canonical_json_shape() {
        let value = json!({"z": "q\"uote", "a": [true, 1.5]});
        assert_eq!(canonical_json(&value), r#"{"a":[true,1.5],"z":"q\"uote"}"#);
        assert_eq!(fingerprint("ping", &json!({})), "ping:{}");
    }

    #[test]
    fn test_cache_round() {
        let mut context = ConversationContext::new();
        assert!(context.cached("ping:{}").is_none());
        context.remember("ping:{}".to_string(), json!("pong"));
        assert_eq!(context.cached("ping:{}"), Some(&json!("pong")));
        assert_eq!(context.cached_results(), 1);
    }
}
