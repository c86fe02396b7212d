use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::MediChatError;
use crate::llm::{AzureOpenAIClient, LlmClient, OllamaClient, OpenAIClient, DEFAULT_API_VERSION};
use crate::prompt::Tone;
use crate::session::SessionStore;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    pub llm: LlmSettings,
    #[serde(default)]
    pub chat: ChatSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LlmSettings {
    pub provider: LlmProvider,
    /// Model name, or the deployment name for Azure.
    pub model: String,
    pub api_key_env: String,
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_version: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.5
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Azure,
    OpenAI,
    Ollama,
}

impl LlmProvider {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "azure" | "azure-openai" => Some(LlmProvider::Azure),
            "openai" => Some(LlmProvider::OpenAI),
            "ollama" => Some(LlmProvider::Ollama),
            _ => None,
        }
    }

    /// Env var conventionally holding this provider's key.
    pub fn default_api_key_env(&self) -> &'static str {
        match self {
            LlmProvider::Azure => "AZURE_OPENAI_API_KEY",
            LlmProvider::OpenAI => "OPENAI_API_KEY",
            LlmProvider::Ollama => "",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ChatSettings {
    #[serde(default)]
    pub tone: Tone,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            llm: LlmSettings {
                provider: LlmProvider::Azure,
                model: "gpt-4o".to_string(),
                api_key_env: LlmProvider::Azure.default_api_key_env().to_string(),
                base_url: None,
                api_version: Some(DEFAULT_API_VERSION.to_string()),
                temperature: default_temperature(),
            },
            chat: ChatSettings::default(),
        }
    }
}

impl Settings {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("medichat")
            .join("config.toml")
    }

    /// Load from the default path, falling back to defaults when the file is
    /// missing or invalid.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    pub fn save(&self) -> Result<(), MediChatError> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), MediChatError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| MediChatError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Switch provider, resetting the key env var to that provider's default.
    pub fn set_provider(&mut self, provider: LlmProvider) {
        if self.llm.provider != provider {
            self.llm.provider = provider;
            self.llm.api_key_env = provider.default_api_key_env().to_string();
        }
    }

    /// Get the API key from the environment variable specified in settings.
    pub fn api_key(&self) -> Option<String> {
        if self.llm.api_key_env.is_empty() {
            return None;
        }
        std::env::var(&self.llm.api_key_env)
            .ok()
            .filter(|k| !k.is_empty())
    }

    pub fn conversations_dir(&self) -> Result<PathBuf, MediChatError> {
        match &self.chat.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => SessionStore::default_dir(),
        }
    }

    pub fn open_store(&self) -> Result<SessionStore, MediChatError> {
        SessionStore::with_dir(self.conversations_dir()?)
    }

    fn require_api_key(&self) -> Result<String, MediChatError> {
        self.api_key().ok_or_else(|| {
            MediChatError::Config(format!(
                "No API key found; set the {} environment variable",
                self.llm.api_key_env
            ))
        })
    }

    /// Build an LLM client from the current settings.
    pub fn build_llm_client(&self) -> Result<Box<dyn LlmClient>, MediChatError> {
        let llm = &self.llm;
        let client: Box<dyn LlmClient> = match llm.provider {
            LlmProvider::Azure => {
                let base_url = llm.base_url.clone().ok_or_else(|| {
                    MediChatError::Config("Azure OpenAI requires llm.base_url".to_string())
                })?;
                let version = llm
                    .api_version
                    .clone()
                    .unwrap_or_else(|| DEFAULT_API_VERSION.to_string());
                Box::new(
                    AzureOpenAIClient::new(self.require_api_key()?, base_url, &llm.model)
                        .with_api_version(version)
                        .with_temperature(llm.temperature),
                )
            }
            LlmProvider::OpenAI => {
                let mut client = OpenAIClient::new(self.require_api_key()?)
                    .with_model(&llm.model)
                    .with_temperature(llm.temperature);
                if let Some(url) = &llm.base_url {
                    client = client.with_base_url(url);
                }
                Box::new(client)
            }
            LlmProvider::Ollama => {
                let mut client = OllamaClient::new(&llm.model).with_temperature(llm.temperature);
                if let Some(url) = &llm.base_url {
                    client = client.with_base_url(url);
                }
                Box::new(client)
            }
        };
        tracing::info!("Using LLM provider {}", client.describe());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.llm.provider, LlmProvider::Azure);
        assert_eq!(settings.llm.model, "gpt-4o");
        assert_eq!(settings.llm.api_key_env, "AZURE_OPENAI_API_KEY");
        assert_eq!(settings.llm.temperature, 0.5);
        assert_eq!(settings.chat.tone, Tone::Professional);
        assert!(settings.chat.data_dir.is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut settings = Settings::default();
        settings.set_provider(LlmProvider::Ollama);
        settings.llm.model = "llama3".to_string();
        settings.chat.tone = Tone::Reassuring;
        settings.chat.data_dir = Some(dir.path().join("chats"));
        settings.save_to(&path).unwrap();

        assert_eq!(Settings::load_from(&path), settings);
    }

    #[test]
    fn test_partial_file_uses_chat_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[llm]\nprovider = \"openai\"\nmodel = \"gpt-4o-mini\"\napi_key_env = \"OPENAI_API_KEY\"\n",
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.llm.provider, LlmProvider::OpenAI);
        assert_eq!(settings.llm.temperature, 0.5);
        assert_eq!(settings.chat.tone, Tone::Professional);
    }

    #[test]
    fn test_invalid_file_falls_back_to_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(LlmProvider::parse("Azure"), Some(LlmProvider::Azure));
        assert_eq!(LlmProvider::parse("openai"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::parse("ollama"), Some(LlmProvider::Ollama));
        assert_eq!(LlmProvider::parse("claude"), None);
    }

    #[test]
    fn test_azure_requires_base_url() {
        let settings = Settings::default();
        let err = settings.build_llm_client().err().expect("should fail");
        assert!(matches!(err, MediChatError::Config(_)));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let mut settings = Settings::default();
        settings.set_provider(LlmProvider::Ollama);
        settings.llm.model = "llama3".to_string();
        assert!(settings.api_key().is_none());

        let client = settings.build_llm_client().unwrap();
        assert_eq!(client.describe(), "ollama/llama3");
    }

    #[test]
    fn test_data_dir_override() {
        let mut settings = Settings::default();
        settings.chat.data_dir = Some(PathBuf::from("/tmp/medichat-test"));
        assert_eq!(
            settings.conversations_dir().unwrap(),
            PathBuf::from("/tmp/medichat-test")
        );
    }
}
