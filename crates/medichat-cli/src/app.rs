use anyhow::Result;
use medichat_core::{
    ConversationController, ConversationId, ConversationSummary, MediChatError, Message, Role,
    TurnOutcome,
};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::{handle_command, CommandResult};

// ── Single prompt ───────────────────────────────────────────────────────

pub async fn run_single_prompt(controller: &mut ConversationController, prompt: &str) -> Result<()> {
    eprintln!("Thinking...");
    let outcome = controller.submit_turn(prompt).await?;
    print_outcome(controller, &outcome);
    Ok(())
}

// ── Interactive REPL ────────────────────────────────────────────────────

pub async fn run_repl(mut controller: ConversationController) -> Result<()> {
    println!("MediChat - ask a medical question, or /help for commands.");
    println!("Tone: {}  Provider: {}\n", controller.tone(), controller.provider());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match handle_command(line) {
            CommandResult::Quit => break,
            CommandResult::Message(text) => println!("{text}\n"),
            CommandResult::NewConversation => {
                controller.new_chat();
                println!("Started a new conversation.\n");
            }
            CommandResult::ListConversations => match controller.list() {
                Ok(list) => println!("{}", format_conversation_list(&list, controller.id())),
                Err(e) => eprintln!("Error listing conversations: {e}\n"),
            },
            CommandResult::LoadConversation(raw) => match open(&mut controller, &raw) {
                Ok(()) => print_transcript(&controller),
                Err(e) => eprintln!("Could not load {raw}: {e}\n"),
            },
            CommandResult::DeleteConversation(raw) => {
                match ConversationId::parse(raw.as_str()).and_then(|id| controller.delete(&id)) {
                    Ok(()) => println!("Deleted {raw}.\n"),
                    Err(e) => eprintln!("Could not delete {raw}: {e}\n"),
                }
            }
            CommandResult::ToneChanged(tone) => {
                controller.set_tone(tone);
                println!("Tone set to {tone}.\n");
            }
            CommandResult::ShowStatus => println!("{}", format_status(&controller)),
            CommandResult::NotACommand => {
                eprintln!("Thinking...");
                match controller.submit_turn(line).await {
                    Ok(outcome) => print_outcome(&controller, &outcome),
                    Err(MediChatError::EmptyInput) => {}
                    Err(e) => eprintln!("Error: {e}\n"),
                }
            }
        }
    }

    Ok(())
}

fn open(controller: &mut ConversationController, raw: &str) -> medichat_core::Result<()> {
    let id = ConversationId::parse(raw)?;
    controller.open(&id)
}

fn print_outcome(controller: &ConversationController, outcome: &TurnOutcome) {
    if let Some(title) = &outcome.new_title {
        if let Some(id) = controller.id() {
            println!("[{title}] ({id})");
        }
    }
    println!("{}\n", outcome.reply.content);
}

fn print_transcript(controller: &ConversationController) {
    println!(
        "── {} ──",
        controller.title().unwrap_or("Untitled conversation")
    );
    for msg in controller.messages() {
        println!("{}\n", format_message(msg));
    }
}

pub fn format_message(msg: &Message) -> String {
    match msg.role {
        Role::User => format!("You: {}", msg.content),
        Role::Assistant => format!("Assistant: {}", msg.content),
    }
}

pub fn format_conversation_list(
    list: &[ConversationSummary],
    active: Option<&ConversationId>,
) -> String {
    if list.is_empty() {
        return "No saved conversations.\n".to_string();
    }
    let mut out = String::from("Saved conversations (newest first):\n");
    for summary in list {
        let marker = if Some(&summary.id) == active { "*" } else { " " };
        out.push_str(&format!("{marker} {}  {}\n", summary.id, summary.title));
    }
    out
}

fn format_status(controller: &ConversationController) -> String {
    let conversation = match controller.id() {
        Some(id) => format!("{} ({id})", controller.title().unwrap_or("untitled")),
        None => "none (next message starts one)".to_string(),
    };
    format!(
        "Conversation: {conversation}\nMessages: {}\nTone: {}\nProvider: {}\nStorage: {}\n",
        controller.messages().len(),
        controller.tone(),
        controller.provider(),
        controller.store().base_dir().display(),
    )
}
