use crate::turn::{Sender, Turn, TurnKind};
use chrono::Utc;
use colloquy_core::new_id;
use std::collections::HashSet;

// ---------------------------------------------------------------------------
// Transcript
// ---------------------------------------------------------------------------

/// Append-only, insertion-ordered turns of one session.
///
/// Timestamps never go backwards: a turn appended within the same clock tick
/// as (or after a clock step behind) its predecessor reuses the predecessor's
/// timestamp, and insertion order breaks the tie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    session_id: String,
    turns: Vec<Turn>,
}

impl Transcript {
    pub(crate) fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            turns: Vec::new(),
        }
    }

    /// Rebuilds a transcript from persisted turns, checking ownership, id
    /// uniqueness and timestamp order.
    pub(crate) fn from_turns(session_id: &str, turns: Vec<Turn>) -> Result<Self, String> {
        for (pos, pair) in turns.windows(2).enumerate() {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(format!(
                    "turn {} of session {session_id} is older than the turn before it",
                    pos + 1
                ));
            }
        }
        let mut seen = HashSet::with_capacity(turns.len());
        for turn in &turns {
            if turn.id.is_empty() {
                return Err(format!("session {session_id} has a turn with an empty id"));
            }
            if turn.session_id != session_id {
                return Err(format!(
                    "turn {} belongs to session {}, found under {session_id}",
                    turn.id, turn.session_id
                ));
            }
            if !seen.insert(turn.id.as_str()) {
                return Err(format!("duplicate turn id {} in session {session_id}", turn.id));
            }
        }
        drop(seen);
        Ok(Self {
            session_id: session_id.to_string(),
            turns,
        })
    }

    /// Appends a turn at the tail and returns a copy of it.
    ///
    /// Only [`Session`](crate::Session) calls this, so that the owning
    /// session's `updated_at` always follows the newest turn.
    pub(crate) fn append(
        &mut self,
        sender: Sender,
        content: impl Into<String>,
        kind: TurnKind,
    ) -> Turn {
        let now = Utc::now();
        let timestamp = match self.turns.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        let turn = Turn {
            id: new_id(),
            session_id: self.session_id.clone(),
            timestamp,
            sender,
            content: content.into(),
            kind,
        };
        self.turns.push(turn.clone());
        turn
    }

    /// An owned copy of every turn, oldest first.
    pub fn to_sequence(&self) -> Vec<Turn> {
        self.turns.clone()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }

    pub fn as_slice(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
