//! Conversation tools: the named procedures that drive a [`SessionStore`].
//!
//! `continue_conversation` is the only tool that waits on a human. It records
//! the question, awaits the [`PromptChannel`] with no store lock held, and
//! records the answer in a separate store call. A declined prompt records
//! nothing further.

use crate::response::{failure, finish, optional_str, required_str, success, Reply};
use async_trait::async_trait;
use colloquy_core::{
    ColloquyResult, PromptChannel, PromptOutcome, PromptRequest, ToolCall, ToolResult,
};
use colloquy_session::{Sender, Session, SessionStore, TurnKind};
use colloquy_skills::skill::{Skill, SkillDescriptor};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

fn conversation_id_schema() -> serde_json::Value {
    json!({
        "type": "string",
        "description": "Id returned by start_conversation"
    })
}

// ---------------------------------------------------------------------------
// start_conversation
// ---------------------------------------------------------------------------

/// Opens a new conversation.
pub struct StartConversationSkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
}

impl StartConversationSkill {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "start_conversation".to_string(),
                description: "Start a multi-turn conversation with the human about a topic. \
                    Use continue_conversation to ask questions and end_conversation to finish."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "topic": {
                            "type": "string",
                            "description": "What the conversation is about"
                        },
                        "context": {
                            "type": "string",
                            "description": "Optional background for the human"
                        }
                    },
                    "required": ["topic"]
                }),
            },
            store,
        }
    }

    fn run(&self, call: &ToolCall) -> Reply {
        let topic = required_str(call, "topic")?;
        let context = optional_str(call, "context");
        let id = self.store.create(topic, context);
        Ok(success(
            call,
            json!({
                "status": "conversation_started",
                "conversation_id": id,
                "topic": topic,
                "context": context,
                "message": "Use continue_conversation to ask, end_conversation to finish",
            }),
        ))
    }
}

#[async_trait]
impl Skill for StartConversationSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call)))
    }
}

// ---------------------------------------------------------------------------
// continue_conversation
// ---------------------------------------------------------------------------

/// Asks the next question in a conversation and records the reply.
pub struct ContinueConversationSkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
    channel: Arc<dyn PromptChannel>,
}

impl ContinueConversationSkill {
    pub fn new(store: Arc<SessionStore>, channel: Arc<dyn PromptChannel>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "continue_conversation".to_string(),
                description: "Ask the human the next question in an active conversation and \
                    wait for the reply. Returns 'replied' with the answer or 'cancelled'."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "conversation_id": conversation_id_schema(),
                        "message": {
                            "type": "string",
                            "description": "The question to put to the human"
                        }
                    },
                    "required": ["conversation_id", "message"]
                }),
            },
            store,
            channel,
        }
    }

    async fn run(&self, call: &ToolCall) -> Reply {
        let id = required_str(call, "conversation_id")?;
        let message = required_str(call, "message")?;

        let topic = self
            .store
            .get(id)
            .map(|session| session.topic().to_string())
            .ok_or_else(|| failure(call, Some(id), format!("Conversation {id} not found")))?;
        self.store
            .record(id, Sender::Agent, message, TurnKind::Question)
            .map_err(|e| failure(call, Some(id), e))?;

        let request = PromptRequest::new(message, format!("{topic} (conversation {id})"));
        let outcome = self
            .channel
            .prompt(request)
            .await
            .map_err(|e| failure(call, Some(id), e))?;

        let answer = match outcome {
            PromptOutcome::Answered(answer) => answer,
            PromptOutcome::Cancelled => {
                info!(conversation_id = %id, "Human declined to reply");
                return Ok(success(
                    call,
                    json!({
                        "status": "cancelled",
                        "conversation_id": id,
                        "question": message,
                        "message": "The human did not reply",
                    }),
                ));
            }
        };

        let turn = self
            .store
            .record(id, Sender::Human, answer.as_str(), TurnKind::Answer)
            .map_err(|e| {
                warn!(conversation_id = %id, error = %e, "Reply arrived after the conversation changed");
                failure(call, Some(id), e)
            })?;

        Ok(success(
            call,
            json!({
                "status": "replied",
                "conversation_id": id,
                "question": message,
                "answer": answer,
                "turn_id": turn.id,
            }),
        ))
    }
}

#[async_trait]
impl Skill for ContinueConversationSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call).await))
    }
}

// ---------------------------------------------------------------------------
// end_conversation
// ---------------------------------------------------------------------------

/// Ends a conversation, optionally recording a summary.
pub struct EndConversationSkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
}

impl EndConversationSkill {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "end_conversation".to_string(),
                description: "End an active conversation. An optional summary is recorded \
                    as the final message."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "conversation_id": conversation_id_schema(),
                        "summary": {
                            "type": "string",
                            "description": "Optional closing summary"
                        }
                    },
                    "required": ["conversation_id"]
                }),
            },
            store,
        }
    }

    fn run(&self, call: &ToolCall) -> Reply {
        let id = required_str(call, "conversation_id")?;
        let summary = optional_str(call, "summary");

        if !self.store.end(id, summary) {
            return Err(failure(
                call,
                Some(id),
                format!("Conversation {id} not found or already ended"),
            ));
        }
        Ok(success(
            call,
            json!({
                "status": "conversation_ended",
                "conversation_id": id,
                "summary": summary,
                "message_count": self.store.turn_count(id).unwrap_or_default(),
            }),
        ))
    }
}

#[async_trait]
impl Skill for EndConversationSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call)))
    }
}

// ---------------------------------------------------------------------------
// conversation_history
// ---------------------------------------------------------------------------

/// Returns one conversation with its full transcript.
pub struct ConversationHistorySkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
}

impl ConversationHistorySkill {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "conversation_history".to_string(),
                description: "Get a conversation's topic, status and every message in order."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {
                        "conversation_id": conversation_id_schema()
                    },
                    "required": ["conversation_id"]
                }),
            },
            store,
        }
    }

    fn run(&self, call: &ToolCall) -> Reply {
        let id = required_str(call, "conversation_id")?;
        let session = self
            .store
            .get(id)
            .ok_or_else(|| failure(call, Some(id), format!("Conversation {id} not found")))?;
        let messages = session.transcript().to_sequence();
        Ok(success(
            call,
            json!({
                "status": "success",
                "conversation_id": session.id(),
                "topic": session.topic(),
                "context": session.context(),
                "conversation_status": session.status(),
                "created_at": session.created_at(),
                "updated_at": session.updated_at(),
                "message_count": messages.len(),
                "messages": messages,
            }),
        ))
    }
}

#[async_trait]
impl Skill for ConversationHistorySkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        Ok(finish(self.run(&call)))
    }
}

// ---------------------------------------------------------------------------
// list_conversations
// ---------------------------------------------------------------------------

/// Summarizes every conversation, oldest first.
pub struct ListConversationsSkill {
    descriptor: SkillDescriptor,
    store: Arc<SessionStore>,
}

impl ListConversationsSkill {
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self {
            descriptor: SkillDescriptor {
                name: "list_conversations".to_string(),
                description: "List all conversations with their status and message counts."
                    .to_string(),
                parameters_schema: json!({
                    "type": "object",
                    "properties": {}
                }),
            },
            store,
        }
    }
}

/// The per-conversation entry used by `list_conversations`.
pub fn conversation_summary(session: &Session) -> serde_json::Value {
    json!({
        "conversation_id": session.id(),
        "topic": session.topic(),
        "status": session.status(),
        "created_at": session.created_at(),
        "updated_at": session.updated_at(),
        "message_count": session.turn_count(),
    })
}

#[async_trait]
impl Skill for ListConversationsSkill {
    fn descriptor(&self) -> &SkillDescriptor {
        &self.descriptor
    }

    async fn execute(&self, call: ToolCall) -> ColloquyResult<ToolResult> {
        let mut sessions = self.store.list();
        sessions.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        let active = sessions.iter().filter(|s| s.is_active()).count();
        let conversations: Vec<_> = sessions.iter().map(conversation_summary).collect();
        Ok(success(
            &call,
            json!({
                "status": "success",
                "total_count": conversations.len(),
                "active_count": active,
                "conversations": conversations,
            }),
        ))
    }
}
