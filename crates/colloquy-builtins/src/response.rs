//! Helpers shared by the conversation tools for building their JSON replies.
//!
//! Every reply is a JSON object with a `status` discriminator. Failures are
//! flagged `is_error` and carry `status: "error"` plus a `message`.

use colloquy_core::{ToolCall, ToolResult};
use serde_json::{json, Value};
use std::fmt::Display;

/// Outcome of a tool body: `Err` short-circuits with an error reply.
pub(crate) type Reply = Result<ToolResult, ToolResult>;

pub(crate) fn finish(reply: Reply) -> ToolResult {
    match reply {
        Ok(result) | Err(result) => result,
    }
}

pub(crate) fn success(call: &ToolCall, body: Value) -> ToolResult {
    ToolResult::success(&call.id, body.to_string())
}

pub(crate) fn failure(
    call: &ToolCall,
    conversation_id: Option<&str>,
    message: impl Display,
) -> ToolResult {
    let mut body = json!({
        "status": "error",
        "message": message.to_string(),
    });
    if let Some(id) = conversation_id {
        body["conversation_id"] = json!(id);
    }
    ToolResult::error(&call.id, body.to_string())
}

/// A non-empty string argument, or an error reply naming it.
pub(crate) fn required_str<'a>(call: &'a ToolCall, key: &str) -> Result<&'a str, ToolResult> {
    match call.str_arg(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(failure(call, None, format!("'{key}' is required"))),
    }
}

pub(crate) fn optional_str<'a>(call: &'a ToolCall, key: &str) -> &'a str {
    call.str_arg(key).unwrap_or_default()
}
