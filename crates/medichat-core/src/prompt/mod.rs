//! Fixed prompt templates for the medical assistant.
//!
//! Rendering is plain string construction: the same inputs always produce the
//! same prompt, and user text is never interpreted as template syntax.

mod tone;

pub use tone::{ParseToneError, Tone};

use crate::session::Message;

/// Canned reply the model must give for diagnosis or emergency requests.
pub const SAFETY_REDIRECT: &str =
    "I'm not qualified to provide that information. Please consult a licensed healthcare professional.";

const PERSONA: &str = "You are a highly reliable and knowledgeable AI medical assistant. \
Your job is to provide accurate, evidence-based information about medical topics such as \
symptoms, diseases, treatments, preventions, medications, and health tips.";

const STYLE: &str = "Always respond in a clear and concise manner, using plain language \
understandable to a general audience.";

const SAFETY: &str = "If a question seems to require a personal diagnosis, medical opinion, \
or is an emergency, respond with:";

/// Render the transcript block for `history`. Empty history renders as "".
pub fn format_history(history: &[Message]) -> String {
    if history.is_empty() {
        return String::new();
    }
    let mut result = String::from("Previous conversation:\n");
    for msg in history {
        result.push_str(&format!("{}: {}\n", msg.role.label(), msg.content));
    }
    result
}

/// Build the chat prompt. `history` must not include the current question,
/// which is passed as `topic`.
pub fn render_chat_prompt(topic: &str, tone: Tone, history: &[Message]) -> String {
    let history = format_history(history);
    let history = if history.is_empty() {
        history
    } else {
        format!("{history}\n")
    };

    format!(
        "{PERSONA}\n\n{STYLE}\n\n{SAFETY}\n\"{SAFETY_REDIRECT}\"\n\n\
         {history}Respond to the following in a {tone} tone:\n\"{topic}\"\n"
    )
}

/// Build the prompt asking for a short conversation title.
pub fn render_title_prompt(topic: &str) -> String {
    format!(
        "Generate a short, descriptive title of 3 to 6 words for a conversation that \
         starts with the following medical question. Reply with the title only, without \
         quotes.\n\nQuestion: \"{topic}\"\n"
    )
}
