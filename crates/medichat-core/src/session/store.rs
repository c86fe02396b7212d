use chrono::{Local, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{MediChatError, Result};
use crate::session::id::ConversationId;
use crate::session::message::Message;

const TITLE_FILE: &str = "title.json";
const MESSAGES_FILE: &str = "messages.json";

/// Contents of a conversation's title record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationMetadata {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// One row of [`SessionStore::list`].
#[derive(Debug, Clone, PartialEq)]
pub struct ConversationSummary {
    pub id: ConversationId,
    pub title: String,
}

/// Persists conversations as one directory per id under a single root:
///
/// ```text
/// <root>/<id>/title.json
/// <root>/<id>/messages.json
/// ```
pub struct SessionStore {
    base_dir: PathBuf,
}

impl SessionStore {
    /// Create a store in the default directory (`<data_dir>/medichat/conversations`).
    pub fn new() -> Result<Self> {
        let base_dir = Self::default_dir()?;
        Self::with_dir(base_dir)
    }

    /// Create a store rooted at `base_dir` (useful for testing).
    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).map_err(|e| MediChatError::storage(&base_dir, e))?;
        Ok(Self { base_dir })
    }

    pub fn default_dir() -> Result<PathBuf> {
        let data = dirs::data_dir().ok_or_else(|| {
            MediChatError::Config("Could not determine data directory".to_string())
        })?;
        Ok(data.join("medichat").join("conversations"))
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn conversation_dir(&self, id: &ConversationId) -> PathBuf {
        self.base_dir.join(id.as_str())
    }

    fn title_path(&self, id: &ConversationId) -> PathBuf {
        self.conversation_dir(id).join(TITLE_FILE)
    }

    fn messages_path(&self, id: &ConversationId) -> PathBuf {
        self.conversation_dir(id).join(MESSAGES_FILE)
    }

    /// New id from the current time. Two conversations started within the
    /// same second share an id; the later writer wins.
    pub fn create_id(&self) -> ConversationId {
        ConversationId::from_time(Local::now())
    }

    /// All persisted conversations, newest first. A bad title record only
    /// affects its own entry, which falls back to the id as its title.
    pub fn list(&self) -> Result<Vec<ConversationSummary>> {
        let entries = match fs::read_dir(&self.base_dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(MediChatError::storage(&self.base_dir, e)),
        };

        let mut summaries = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", self.base_dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            let Ok(id) = ConversationId::parse(name) else {
                continue;
            };

            let title = match self.load_metadata(&id) {
                Ok(meta) if !meta.title.trim().is_empty() => meta.title,
                Ok(_) => id.to_string(),
                Err(e) => {
                    warn!("Using id as title for {}: {}", id, e);
                    id.to_string()
                }
            };
            summaries.push(ConversationSummary { id, title });
        }

        summaries.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(summaries)
    }

    /// Load the message log of a conversation.
    pub fn load(&self, id: &ConversationId) -> Result<Vec<Message>> {
        let messages: Vec<Message> = read_record(id, &self.messages_path(id))?;
        debug!("Loaded {} messages for {}", messages.len(), id);
        Ok(messages)
    }

    /// Load the title record of a conversation.
    pub fn load_metadata(&self, id: &ConversationId) -> Result<ConversationMetadata> {
        read_record(id, &self.title_path(id))
    }

    pub fn save_title(&self, id: &ConversationId, title: &str) -> Result<()> {
        let record = ConversationMetadata {
            title: title.to_string(),
            created_at: Some(Utc::now().to_rfc3339()),
        };
        let contents = serde_json::to_string_pretty(&record)?;
        write_atomic(&self.title_path(id), &contents)?;
        debug!("Saved title for {}: {}", id, title);
        Ok(())
    }

    /// Replace the stored log with `messages`. Readers see either the old
    /// log or the new one, never a partial write.
    pub fn save_messages(&self, id: &ConversationId, messages: &[Message]) -> Result<()> {
        let contents = serde_json::to_string_pretty(messages)?;
        write_atomic(&self.messages_path(id), &contents)?;
        debug!("Saved {} messages for {}", messages.len(), id);
        Ok(())
    }

    /// Remove everything stored for `id`. Missing conversations are not an error.
    pub fn delete(&self, id: &ConversationId) -> Result<()> {
        let dir = self.conversation_dir(id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!("Deleted conversation {}", id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(MediChatError::storage(dir, e)),
        }
    }
}

fn read_record<T: DeserializeOwned>(id: &ConversationId, path: &Path) -> Result<T> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(MediChatError::NotFound(id.to_string()))
        }
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Err(MediChatError::corrupt(id.as_str(), e.to_string()))
        }
        Err(e) => return Err(MediChatError::storage(path, e)),
    };

    serde_json::from_str(&contents).map_err(|e| MediChatError::corrupt(id.as_str(), e.to_string()))
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| MediChatError::storage(parent, e))?;
    }

    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents).map_err(|e| MediChatError::storage(&tmp_path, e))?;

    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(MediChatError::storage(path, e));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (TempDir, SessionStore) {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::with_dir(dir.path().join("conversations")).unwrap();
        (dir, store)
    }

    fn id(raw: &str) -> ConversationId {
        ConversationId::parse(raw).unwrap()
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (_dir, store) = store();
        let id = id("2024-05-01_10-00-00");
        let messages = vec![
            Message::user("What are the symptoms of flu?"),
            Message::assistant("Symptoms include:\n- fever\n- cough\n\n\"quoted\" text"),
        ];

        store.save_messages(&id, &messages).unwrap();
        assert_eq!(store.load(&id).unwrap(), messages);
    }

    #[test]
    fn test_save_messages_overwrites_whole_log() {
        let (_dir, store) = store();
        let id = id("2024-05-01_10-00-00");

        store
            .save_messages(&id, &[Message::user("a"), Message::assistant("b")])
            .unwrap();
        store.save_messages(&id, &[Message::user("only")]).unwrap();

        assert_eq!(store.load(&id).unwrap(), vec![Message::user("only")]);
        assert!(!store.messages_path(&id).with_extension("json.tmp").exists());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let (_dir, store) = store();
        let err = store.load(&id("nope")).unwrap_err();
        assert!(matches!(err, MediChatError::NotFound(ref missing) if missing == "nope"));
    }

    #[test]
    fn test_load_garbage_is_corrupt() {
        let (_dir, store) = store();
        let id = id("2024-05-01_10-00-00");
        fs::create_dir_all(store.conversation_dir(&id)).unwrap();
        fs::write(store.messages_path(&id), "{ not a list").unwrap();

        assert!(matches!(store.load(&id), Err(MediChatError::Corrupt { .. })));
    }

    #[test]
    fn test_load_unknown_role_is_corrupt() {
        let (_dir, store) = store();
        let id = id("2024-05-01_10-00-00");
        fs::create_dir_all(store.conversation_dir(&id)).unwrap();
        fs::write(
            store.messages_path(&id),
            r#"[{"role":"tool","content":"x"}]"#,
        )
        .unwrap();

        assert!(matches!(store.load(&id), Err(MediChatError::Corrupt { .. })));
    }

    #[test]
    fn test_title_roundtrip() {
        let (_dir, store) = store();
        let id = id("2024-05-01_10-00-00");
        store.save_title(&id, "Flu Symptoms Overview").unwrap();

        let meta = store.load_metadata(&id).unwrap();
        assert_eq!(meta.title, "Flu Symptoms Overview");
        assert!(meta.created_at.is_some());
    }

    #[test]
    fn test_list_newest_first_with_titles() {
        let (_dir, store) = store();
        let older = id("2024-05-01_10-00-00");
        let newer = id("2024-05-02_08-30-00");
        store.save_title(&older, "Older chat").unwrap();
        store.save_messages(&older, &[Message::user("hi")]).unwrap();
        store.save_title(&newer, "Newer chat").unwrap();

        let listed = store.list().unwrap();
        assert_eq!(
            listed,
            vec![
                ConversationSummary { id: newer, title: "Newer chat".into() },
                ConversationSummary { id: older, title: "Older chat".into() },
            ]
        );
    }

    #[test]
    fn test_list_falls_back_to_id_for_bad_titles() {
        let (_dir, store) = store();
        let good = id("2024-05-01_10-00-00");
        let corrupt = id("2024-05-02_10-00-00");
        let untitled = id("2024-05-03_10-00-00");

        store.save_title(&good, "Good").unwrap();
        fs::create_dir_all(store.conversation_dir(&corrupt)).unwrap();
        fs::write(store.title_path(&corrupt), "not json at all").unwrap();
        store.save_messages(&untitled, &[Message::user("x")]).unwrap();

        let listed = store.list().unwrap();
        let titles: Vec<(&str, &str)> = listed
            .iter()
            .map(|s| (s.id.as_str(), s.title.as_str()))
            .collect();
        assert_eq!(
            titles,
            vec![
                ("2024-05-03_10-00-00", "2024-05-03_10-00-00"),
                ("2024-05-02_10-00-00", "2024-05-02_10-00-00"),
                ("2024-05-01_10-00-00", "Good"),
            ]
        );
    }

    #[test]
    fn test_list_ignores_stray_files() {
        let (_dir, store) = store();
        fs::write(store.base_dir().join("notes.txt"), "hello").unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let (dir, store) = store();
        fs::remove_dir_all(dir.path().join("conversations")).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_delete_is_idempotent() {
        let (_dir, store) = store();
        let id = id("2024-05-01_10-00-00");
        store.save_title(&id, "Bye").unwrap();
        store.save_messages(&id, &[Message::user("x")]).unwrap();

        store.delete(&id).unwrap();
        assert!(store.list().unwrap().is_empty());
        assert!(matches!(store.load(&id), Err(MediChatError::NotFound(_))));

        store.delete(&id).unwrap();
    }

    #[test]
    fn test_save_creates_missing_root() {
        let (dir, store) = store();
        fs::remove_dir_all(dir.path().join("conversations")).unwrap();
        let id = id("2024-05-01_10-00-00");

        store.save_messages(&id, &[Message::user("x")]).unwrap();
        assert_eq!(store.load(&id).unwrap().len(), 1);
    }
}
