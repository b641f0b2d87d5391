use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The party that produced a [`Turn`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The person answering questions.
    Human,
    /// The automated party asking them.
    Agent,
    /// Session bookkeeping (open and close markers).
    System,
}

/// What a [`Turn`] is within the exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnKind {
    Question,
    Answer,
    System,
}

/// One message in a session transcript.
///
/// Turns are only minted by [`Transcript`](crate::Transcript) appends; a
/// restored turn is checked against its owning session when the snapshot is
/// decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Turn {
    pub id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
    pub sender: Sender,
    pub content: String,
    pub kind: TurnKind,
}

impl Sender {
    pub fn as_str(self) -> &'static str {
        match self {
            Sender::Human => "human",
            Sender::Agent => "agent",
            Sender::System => "system",
        }
    }
}

impl TurnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TurnKind::Question => "question",
            TurnKind::Answer => "answer",
            TurnKind::System => "system",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TurnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Sender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" => Ok(Sender::Human),
            "agent" => Ok(Sender::Agent),
            "system" => Ok(Sender::System),
            other => Err(format!("unknown sender '{other}'")),
        }
    }
}

impl FromStr for TurnKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "question" => Ok(TurnKind::Question),
            "answer" => Ok(TurnKind::Answer),
            "system" => Ok(TurnKind::System),
            other => Err(format!("unknown turn kind '{other}'")),
        }
    }
}
