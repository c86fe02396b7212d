use anyhow::{anyhow, Result};
use clap::Parser;
use medichat_core::config::LlmProvider;
use medichat_core::{ConversationController, Settings, Tone};
use std::path::PathBuf;

mod app;
mod commands;

#[derive(Parser)]
#[command(name = "medichat")]
#[command(about = "MediChat - AI medical information assistant")]
#[command(version)]
struct Cli {
    /// Ask a single question and exit (the exchange is still saved)
    #[arg(short, long)]
    prompt: Option<String>,

    /// LLM model (deployment name for Azure)
    #[arg(short, long)]
    model: Option<String>,

    /// LLM provider (azure, openai, ollama)
    #[arg(long)]
    provider: Option<String>,

    /// Response tone (professional, friendly, reassuring, neutral)
    #[arg(short, long)]
    tone: Option<Tone>,

    /// Directory holding saved conversations
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// List saved conversations and exit
    #[arg(long)]
    list: bool,

    /// Write the effective settings (including these overrides) to the config file
    #[arg(long)]
    save_config: bool,
}

/// Apply command-line overrides on top of the loaded settings.
fn apply_overrides(cli: &Cli, settings: &mut Settings) -> Result<()> {
    if let Some(ref provider) = cli.provider {
        let provider = LlmProvider::parse(provider)
            .ok_or_else(|| anyhow!("Unknown provider '{provider}'. Options: azure, openai, ollama"))?;
        settings.set_provider(provider);
    }
    if let Some(ref model) = cli.model {
        settings.llm.model = model.clone();
    }
    if let Some(tone) = cli.tone {
        settings.chat.tone = tone;
    }
    if let Some(ref dir) = cli.data_dir {
        settings.chat.data_dir = Some(dir.clone());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::load();
    tracing::debug!("Settings path: {}", Settings::config_path().display());

    apply_overrides(&cli, &mut settings)?;

    if cli.save_config {
        settings.save()?;
        eprintln!("Saved settings to {}", Settings::config_path().display());
    }

    let store = settings.open_store()?;

    if cli.list {
        print!("{}", app::format_conversation_list(&store.list()?, None));
        return Ok(());
    }

    let llm = settings.build_llm_client()?;
    let mut controller = ConversationController::new(llm, store).with_tone(settings.chat.tone);

    if let Some(prompt) = cli.prompt {
        app::run_single_prompt(&mut controller, &prompt).await?;
    } else {
        app::run_repl(controller).await?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_overrides_apply_and_save() {
        let cli = Cli::try_parse_from([
            "medichat",
            "--provider",
            "ollama",
            "--model",
            "llama3",
            "--tone",
            "friendly",
            "--save-config",
        ])
        .unwrap();
        assert!(cli.save_config);

        let mut settings = Settings::default();
        apply_overrides(&cli, &mut settings).unwrap();
        assert_eq!(settings.llm.provider, LlmProvider::Ollama);
        assert_eq!(settings.llm.model, "llama3");
        assert_eq!(settings.chat.tone, Tone::Friendly);

        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        settings.save_to(&path).unwrap();
        let reloaded = Settings::load_from(&path);
        assert_eq!(reloaded.llm.provider, LlmProvider::Ollama);
        assert_eq!(reloaded.chat.tone, Tone::Friendly);
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let cli = Cli::try_parse_from(["medichat", "--provider", "bedrock"]).unwrap();
        let err = apply_overrides(&cli, &mut Settings::default()).unwrap_err();
        assert!(err.to_string().contains("Unknown provider 'bedrock'"));
    }
}
