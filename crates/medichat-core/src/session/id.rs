use crate::error::{MediChatError, Result};
use chrono::{DateTime, Local};
use std::fmt;
use std::str::FromStr;

/// Timestamp layout used for new conversation ids (second resolution).
pub const ID_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Storage key of a conversation. Always a single path component.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        let valid = !raw.is_empty()
            && raw != "."
            && raw != ".."
            && !raw.chars().any(|c| c == '/' || c == '\\' || c == '\0');
        if valid {
            Ok(Self(raw))
        } else {
            Err(MediChatError::InvalidId(raw))
        }
    }

    pub fn from_time(time: DateTime<Local>) -> Self {
        Self(time.format(ID_FORMAT).to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ConversationId {
    type Err = MediChatError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for ConversationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
