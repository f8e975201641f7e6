//! Chat turn domain types.
//!
//! A [`ChatTurn`] is the unit that flows through the whole service:
//! stored in the history file, replayed into the context window and
//! sent to the provider.

use serde::{Deserialize, Serialize};

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    #[default]
    User,
    /// The AI assistant
    Assistant,
    /// System instructions (persona, rules)
    System,
    /// Any role string we do not recognise in stored history
    #[serde(other)]
    Unknown,
}

impl Role {
    /// The wire name used by OpenAI-compatible APIs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
            Role::Unknown => "unknown",
        }
    }

    /// Whether a stored turn with this role may be replayed to the provider.
    pub fn is_conversational(&self) -> bool {
        matches!(self, Role::User | Role::Assistant)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who sent this message
    #[serde(default)]
    pub role: Role,

    /// The text content
    #[serde(default)]
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a new system turn.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = ChatTurn::user("What should my fasting sugar be?");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "What should my fasting sugar be?");
    }

    #[test]
    fn serializes_with_lowercase_role() {
        let json = serde_json::to_string(&ChatTurn::assistant("Hi")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"Hi"}"#);
    }

    #[test]
    fn unknown_role_is_tolerated() {
        let turn: ChatTurn = serde_json::from_str(r#"{"role":"tool","content":"x"}"#).unwrap();
        assert_eq!(turn.role, Role::Unknown);
        assert!(!turn.role.is_conversational());
    }

    #[test]
    fn missing_fields_take_defaults() {
        let turn: ChatTurn = serde_json::from_str(r#"{"content":"only text"}"#).unwrap();
        assert_eq!(turn.role, Role::User);

        let turn: ChatTurn = serde_json::from_str(r#"{"role":"assistant"}"#).unwrap();
        assert_eq!(turn.content, "");
    }

    #[test]
    fn system_role_is_not_conversational() {
        assert!(Role::User.is_conversational());
        assert!(Role::Assistant.is_conversational());
        assert!(!Role::System.is_conversational());
    }
}
