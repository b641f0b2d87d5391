//! Built-in skills for Colloquy.
//!
//! Provides the conversation tools that expose a [`SessionStore`] as named,
//! JSON-invocable procedures, the one-shot `ask_human` tool, snapshot
//! save/load tools, and the prompt channels that reach the human.
//!
//! # Main entry points
//!
//! - [`register_conversation_builtins()`]: Register every conversation tool.
//! - [`StdinPromptChannel`]: Interactive terminal prompt.
//! - [`ScriptedPromptChannel`] / [`CallbackPromptChannel`]: Non-interactive channels.

/// One-shot question skill.
pub mod ask_human;
/// Conversation lifecycle skills.
pub mod conversation;
/// Snapshot save/load skills.
pub mod persistence;
/// Scripted and callback prompt channels.
pub mod prompt_channels;
mod response;
/// Stdin-based interactive prompt channel.
pub mod stdin_prompt;

pub use ask_human::AskHumanSkill;
pub use conversation::{
    ContinueConversationSkill, ConversationHistorySkill, EndConversationSkill,
    ListConversationsSkill, StartConversationSkill,
};
pub use persistence::{LoadConversationsSkill, SaveConversationsSkill};
pub use prompt_channels::{CallbackPromptChannel, PromptFuture, ScriptedPromptChannel};
pub use stdin_prompt::StdinPromptChannel;

use colloquy_core::PromptChannel;
use colloquy_session::SessionStore;
use colloquy_skills::SkillRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Register every conversation tool against one shared store.
///
/// `snapshot_path` is where `save_conversations` / `load_conversations` go
/// when the call does not name a path.
pub fn register_conversation_builtins(
    registry: &mut SkillRegistry,
    store: Arc<SessionStore>,
    channel: Arc<dyn PromptChannel>,
    snapshot_path: PathBuf,
) {
    registry.register(Arc::new(AskHumanSkill::new(channel.clone())));
    registry.register(Arc::new(StartConversationSkill::new(store.clone())));
    registry.register(Arc::new(ContinueConversationSkill::new(
        store.clone(),
        channel,
    )));
    registry.register(Arc::new(EndConversationSkill::new(store.clone())));
    registry.register(Arc::new(ConversationHistorySkill::new(store.clone())));
    registry.register(Arc::new(ListConversationsSkill::new(store.clone())));
    registry.register(Arc::new(SaveConversationsSkill::new(
        store.clone(),
        snapshot_path.clone(),
    )));
    registry.register(Arc::new(LoadConversationsSkill::new(store, snapshot_path)));
}
