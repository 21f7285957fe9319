//! The in-memory conversation record.

use tracing::debug;

use crate::error::{Error, Result};
use crate::types::{Content, Role};

/// One role-tagged message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    /// Who wrote the turn.
    pub role: Role,
    /// What was written.
    pub text: String,
}

impl Turn {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

impl From<&Turn> for Content {
    fn from(turn: &Turn) -> Self {
        Content::new(turn.role, turn.text.clone())
    }
}

/// Ordered, append-only list of turns that alternates starting with `user`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    /// Create an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// The role the next appended turn must have.
    pub fn expected_role(&self) -> Role {
        match self.turns.last() {
            Some(Turn {
                role: Role::User, ..
            }) => Role::Model,
            _ => Role::User,
        }
    }

    /// Append a user turn.
    pub fn push_user(&mut self, text: impl Into<String>) -> Result<()> {
        self.push(Turn::user(text))
    }

    /// Append a model turn.
    pub fn push_model(&mut self, text: impl Into<String>) -> Result<()> {
        self.push(Turn::model(text))
    }

    /// Append a turn, rejecting it if it would break the alternation.
    pub fn push(&mut self, turn: Turn) -> Result<()> {
        let expected = self.expected_role();
        if turn.role != expected {
            return Err(Error::validation(
                format!("expected a {expected} turn, got a {} turn", turn.role),
                Some("role".to_string()),
            ));
        }
        self.turns.push(turn);
        debug!(len = self.turns.len(), role = %expected, "turn appended");
        Ok(())
    }

    /// Remove a trailing user turn that never got an answer.
    ///
    /// Returns the removed turn.  Model turns are never removed.
    pub(crate) fn pop_unanswered(&mut self) -> Option<Turn> {
        if self.expected_role() == Role::Model {
            self.turns.pop()
        } else {
            None
        }
    }

    /// All turns, oldest first.
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// The most recent turn.
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// The number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns true if no turn has been recorded.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}
