use medichat_core::Tone;

/// Result of processing a slash command.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandResult {
    /// Display a message to the user.
    Message(String),
    /// Quit the application.
    Quit,
    /// Start a fresh conversation.
    NewConversation,
    /// List saved conversations.
    ListConversations,
    /// Open a saved conversation by ID.
    LoadConversation(String),
    /// Delete a saved conversation by ID.
    DeleteConversation(String),
    /// Change the response tone for this session.
    ToneChanged(Tone),
    /// Show status (conversation, tone, provider).
    ShowStatus,
    /// Not a command - treat as regular input.
    NotACommand,
}

pub fn handle_command(input: &str) -> CommandResult {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0];
    let arg = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match cmd {
        "/help" | "/h" => show_help(),
        "/exit" | "/quit" | "/q" => CommandResult::Quit,
        "/new" | "/clear" => CommandResult::NewConversation,
        "/list" | "/history" | "/conversations" => CommandResult::ListConversations,
        "/load" | "/open" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /load <conversation-id>".into())
            } else {
                CommandResult::LoadConversation(arg.to_string())
            }
        }
        "/delete" | "/rm" => {
            if arg.is_empty() {
                CommandResult::Message("Usage: /delete <conversation-id>".into())
            } else {
                CommandResult::DeleteConversation(arg.to_string())
            }
        }
        "/tone" => {
            if arg.is_empty() {
                let tones = Tone::all_names().join(", ");
                CommandResult::Message(format!("Available tones: {tones}\nUsage: /tone <tone>"))
            } else {
                match arg.parse::<Tone>() {
                    Ok(tone) => CommandResult::ToneChanged(tone),
                    Err(e) => CommandResult::Message(e.to_string()),
                }
            }
        }
        "/status" => CommandResult::ShowStatus,
        "/version" => CommandResult::Message(format!("MediChat CLI v{}", env!("CARGO_PKG_VERSION"))),

        // Unknown command
        _ => {
            if input.starts_with('/') {
                CommandResult::Message(format!("Unknown command: {cmd}. Type /help for commands."))
            } else {
                CommandResult::NotACommand
            }
        }
    }
}

fn show_help() -> CommandResult {
    let help_text = "\
MediChat Commands

  CONVERSATIONS
    /new, /clear              Start a fresh conversation
    /list, /history           List saved conversations
    /load <id>                Open a saved conversation
    /delete <id>              Delete a saved conversation

  SETTINGS
    /tone <name>              Change response tone (professional, friendly, reassuring, neutral)
    /status                   Show conversation, tone and provider

  OTHER
    /help, /h                 Show this help message
    /version                  Show version information
    /exit, /quit, /q          Quit the application

Anything else is sent as a question. Conversations are saved after every reply.";

    CommandResult::Message(help_text.into())
}
