use tracing::{debug, info, warn};

use crate::error::{MediChatError, Result};
use crate::llm::LlmClient;
use crate::prompt::{self, Tone};
use crate::session::{ConversationId, ConversationSummary, Message, SessionStore};

/// Number of words kept when the title has to be derived locally.
pub const FALLBACK_TITLE_WORDS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No conversation id allocated yet.
    Empty,
    /// Id allocated, title not yet saved.
    Untitled,
    /// Id allocated and title saved.
    Titled,
}

/// What happened during one [`ConversationController::submit_turn`].
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: Message,
    pub provider_failed: bool,
    /// Set only on the turn that derived the title.
    pub new_title: Option<String>,
}

/// Provider titles longer than this are discarded for the local fallback.
pub const MAX_TITLE_WORDS: usize = 12;

/// First non-blank line of a provider title reply with surrounding double
/// quotes removed, or `None` when nothing usable is left.
pub fn clean_title(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;
    let words: Vec<&str> = line.trim_matches('"').split_whitespace().collect();
    if words.is_empty() || words.len() > MAX_TITLE_WORDS {
        return None;
    }
    Some(words.join(" "))
}

/// First [`FALLBACK_TITLE_WORDS`] whitespace-separated words of `text`.
pub fn fallback_title(text: &str) -> String {
    text.split_whitespace()
        .take(FALLBACK_TITLE_WORDS)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Owns the active conversation and runs each turn against the completion
/// provider and the session store.
pub struct ConversationController {
    llm: Box<dyn LlmClient>,
    store: SessionStore,
    tone: Tone,
    id: Option<ConversationId>,
    title: Option<String>,
    messages: Vec<Message>,
}

impl ConversationController {
    pub fn new(llm: Box<dyn LlmClient>, store: SessionStore) -> Self {
        Self {
            llm,
            store,
            tone: Tone::default(),
            id: None,
            title: None,
            messages: Vec::new(),
        }
    }

    pub fn with_tone(mut self, tone: Tone) -> Self {
        self.tone = tone;
        self
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }

    pub fn set_tone(&mut self, tone: Tone) {
        self.tone = tone;
    }

    pub fn id(&self) -> Option<&ConversationId> {
        self.id.as_ref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn provider(&self) -> String {
        self.llm.describe()
    }

    pub fn state(&self) -> SessionState {
        match (&self.id, &self.title) {
            (None, _) => SessionState::Empty,
            (Some(_), None) => SessionState::Untitled,
            (Some(_), Some(_)) => SessionState::Titled,
        }
    }

    /// Run one turn: title the conversation on its first turn, ask the
    /// provider, record the question and reply and persist the whole log.
    ///
    /// Provider failures never fail the turn; they become an error-marked
    /// assistant message. Storage failures are returned and leave the
    /// in-memory session as it was before the turn.
    pub async fn submit_turn(&mut self, text: &str) -> Result<TurnOutcome> {
        let topic = text.trim();
        if topic.is_empty() {
            return Err(MediChatError::EmptyInput);
        }

        let id = match &self.id {
            Some(id) => id.clone(),
            None => self.store.create_id(),
        };

        let new_title = if self.title.is_none() {
            let title = self.derive_title(topic).await;
            self.store.save_title(&id, &title)?;
            Some(title)
        } else {
            None
        };

        if self.id.is_none() {
            info!("Started conversation {}", id);
            self.id = Some(id.clone());
        }
        if let Some(title) = &new_title {
            self.title = Some(title.clone());
        }

        let chat_prompt = prompt::render_chat_prompt(topic, self.tone, &self.messages);

        let (reply, provider_failed) = match self.complete(&chat_prompt).await {
            Ok(content) => (Message::assistant(content), false),
            Err(e) => {
                warn!("Completion failed for {}: {}", id, e);
                (Message::provider_error(&e), true)
            }
        };

        self.messages.push(Message::user(text));
        self.messages.push(reply.clone());
        if let Err(e) = self.store.save_messages(&id, &self.messages) {
            self.messages.truncate(self.messages.len() - 2);
            return Err(e);
        }

        Ok(TurnOutcome {
            reply,
            provider_failed,
            new_title,
        })
    }

    async fn derive_title(&self, topic: &str) -> String {
        let title_prompt = prompt::render_title_prompt(topic);
        match self.complete(&title_prompt).await {
            Ok(reply) => clean_title(&reply).unwrap_or_else(|| {
                warn!("Unusable title reply {:?}, using first words", reply);
                fallback_title(topic)
            }),
            Err(e) => {
                warn!("Title generation failed, using first words: {}", e);
                fallback_title(topic)
            }
        }
    }

    /// Provider call whose blank replies count as failures.
    async fn complete(&self, prompt: &str) -> Result<String> {
        let response = self.llm.complete(prompt).await?;
        if let Some(usage) = &response.usage {
            debug!(
                "{}: {} input tokens, {} output tokens",
                self.llm.describe(),
                usage.input_tokens,
                usage.output_tokens
            );
        }
        let content = response.content.trim();
        if content.is_empty() {
            return Err(MediChatError::Llm("Empty response from model".into()));
        }
        Ok(content.to_string())
    }

    /// Drop the active conversation. The next turn starts a new one.
    pub fn new_chat(&mut self) {
        self.id = None;
        self.title = None;
        self.messages.clear();
    }

    /// Make a persisted conversation the active one. On error the current
    /// conversation is left as it was.
    pub fn open(&mut self, id: &ConversationId) -> Result<()> {
        let messages = self.store.load(id)?;
        let title = match self.store.load_metadata(id) {
            Ok(meta) if !meta.title.trim().is_empty() => meta.title,
            Ok(_) => id.to_string(),
            Err(e) => {
                warn!("No usable title for {}: {}", id, e);
                id.to_string()
            }
        };

        self.id = Some(id.clone());
        self.title = Some(title);
        self.messages = messages;
        Ok(())
    }

    /// Delete a persisted conversation, resetting to empty when it is the
    /// active one.
    pub fn delete(&mut self, id: &ConversationId) -> Result<()> {
        self.store.delete(id)?;
        if self.id.as_ref() == Some(id) {
            self.new_chat();
        }
        Ok(())
    }

    pub fn list(&self) -> Result<Vec<ConversationSummary>> {
        self.store.list()
    }
}
