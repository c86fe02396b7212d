pub mod error;
pub mod llm;
pub mod prompt;
pub mod session;
pub mod controller;
pub mod config;

// Re-export key types
pub use error::{MediChatError, Result};
pub use llm::{LlmClient, LlmResponse, Usage};
pub use prompt::{render_chat_prompt, render_title_prompt, Tone};
pub use session::{
    ConversationId, ConversationMetadata, ConversationSummary, Message, Role, SessionStore,
    ERROR_MARKER,
};
pub use controller::{clean_title, fallback_title, ConversationController, SessionState, TurnOutcome};
pub use config::Settings;
