use crate::response::{failure, finish, optional_str, required_str, success, Reply};
use async_trait::async_trait;
use colloquy_core::{ColloquyResult, PromptChannel, PromptOutcome, PromptRequest, ToolCall, ToolResult};
use colloquy_skills::skill::{Skill, SkillDescriptor};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// One-shot question to the human, outside of any conversation.
pub struct AskHumanSkill {
    descriptor: SkillDescriptor,
    channel: Arc<dyn PromptChannel>,
}

impl AskHumanSkill {
    pub fn new(channel: Arc<dyn PromptChannel>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "ask_human".to_string(),
                description: "Ask the human a single question and wait for the answer. \
                    Returns status 'answered' with the answer, or 'cancelled' if the \
                    human declined."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "question": {
                            "type": "string",
                            "description": "The question to ask"
                        },
                        "context": {
                            "type": "string",
                            "description": "Optional background shown with the question"
                        }
                    },
                    "required": ["question"]
                }),
            },
            channel,
        }
    }

    async fn run(&self, call: &ToolCall) -> Reply {
        let question = required_str(call, "question")?;
        let context = optional_str(call, "context");

        info!(question = %question, "Asking human");
        let outcome = self
            .channel
            .prompt(PromptRequest::new(question, context))
            .await
            .map_err(|e| failure(call, None, e))?;

        Ok(match outcome {
            PromptOutcome::Answered(answer) => success(
                call,
                json!({
                    "status": "answered",
                    "question": question,
                    "context": context,
                    "answer": answer,
                }),
            ),
            PromptOutcome::Cancelled => success(
                call,
                json!({
                    "status": "cancelled",
                    "question": question,
                    "message": "The human did not answer",
                }),
            ),
        })
    }
}

#[async_trait]
impl Skill for AskHumanSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call).await))
    }
}
