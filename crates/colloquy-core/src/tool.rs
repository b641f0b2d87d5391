use serde::{Deserialize, Serialize};

/// A named procedure invocation with JSON arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// The textual (JSON) response to a [`ToolCall`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: crate::new_id(),
            name: name.into(),
            arguments,
        }
    }

    /// Returns a string argument, or `None` when it is missing or not a string.
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(serde_json::Value::as_str)
    }
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: true,
        }
    }

    /// Parses the content back into JSON. Every conversation tool answers
    /// with a JSON object carrying a `status` field.
    pub fn json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::from_str(&self.content)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_result_constructors_flag_errors() {
        let ok = ToolResult::success("call_1", r#"{"status":"replied"}"#);
        let failed = ToolResult::error("call_1", r#"{"status":"error"}"#);
        assert!(!ok.is_error);
        assert!(failed.is_error);
        assert_eq!(ok.call_id, failed.call_id);
    }

    #[test]
    fn test_str_arg() {
        let call = ToolCall::new("ask_human", serde_json::json!({"question": "ok?", "n": 3}));
        assert_eq!(call.str_arg("question"), Some("ok?"));
        assert_eq!(call.str_arg("n"), None);
        assert_eq!(call.str_arg("missing"), None);
    }

    #[test]
    fn test_json_content() {
        let result = ToolResult::success("c", r#"{"status":"success"}"#);
        assert_eq!(result.json().unwrap()["status"], "success");
    }
}
