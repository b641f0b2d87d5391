//! Core types and error definitions for Colloquy.
//!
//! This crate provides the foundational types shared across all Colloquy
//! crates.
//!
//! # Main types
//!
//! - [`ColloquyError`]: Unified error enum; [`ColloquyResult`] is its alias.
//! - [`new_id`]: Identifier generator for sessions and turns.
//! - [`ToolCall`] / [`ToolResult`]: Named procedure invocation and its JSON reply.
//! - [`PromptChannel`]: The "ask a human and wait" collaborator.

/// Error type and result alias.
pub mod error;
/// Identifier generator.
pub mod id;
/// Human prompt collaborator contract.
pub mod prompt;
/// Tool call and tool result types.
pub mod tool;

pub use error::{ColloquyError, ColloquyResult};
pub use id::new_id;
pub use prompt::{PromptChannel, PromptOutcome, PromptRequest};
pub use tool::{ToolCall, ToolResult};
