use async_trait::async_trait;
use colloquy_core::{ColloquyResult, ToolCall, ToolResult};
use serde::{Deserialize, Serialize};

/// Metadata describing a skill's name and JSON interface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescriptor {
    pub name: String,
    pub description: String,
    pub parameters_schema: serde_json::Value,
}

/// A procedure that can be invoked by name with JSON arguments.
///
/// Argument and domain problems are reported inside the [`ToolResult`]
/// (flagged `is_error`); an `Err` means the skill itself could not run.
#[async_trait]
pub trait Skill: Send + Sync {
    fn descriptor(&self) -> &SkillDescriptor;

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult>;
}
