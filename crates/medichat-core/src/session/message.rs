use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix carried by assistant messages that record a failed completion.
pub const ERROR_MARKER: &str = "⚠️ An error occurred:";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Assistant message recording a provider failure in the transcript.
    pub fn provider_error(description: impl fmt::Display) -> Self {
        Self::assistant(format!("{ERROR_MARKER} {description}"))
    }

    pub fn is_error(&self) -> bool {
        self.role == Role::Assistant && self.content.starts_with(ERROR_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&Message::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let parsed = serde_json::from_str::<Message>(r#"{"role":"system","content":"x"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_provider_error_marker() {
        let msg = Message::provider_error("connection refused");
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.content, "⚠️ An error occurred: connection refused");
        assert!(msg.is_error());
        assert!(!Message::assistant("All good").is_error());
        assert!(!Message::user(ERROR_MARKER).is_error());
    }
}
