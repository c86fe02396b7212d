mod traits;
mod openai;
mod azure;
mod ollama;

pub use traits::*;
pub use openai::OpenAIClient;
pub use azure::{AzureOpenAIClient, DEFAULT_API_VERSION};
pub use ollama::OllamaClient;
