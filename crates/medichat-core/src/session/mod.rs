mod id;
mod message;
pub mod store;

pub use id::{ConversationId, ID_FORMAT};
pub use message::{Message, Role, ERROR_MARKER};
pub use store::{ConversationMetadata, ConversationSummary, SessionStore};
