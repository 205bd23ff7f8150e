use crate::models::chat::{ ChatMessage, ChatRole };
use crate::store::{ ConversationStore, FAILURE_MESSAGE };
use log::{ info, warn };
use std::error::Error;
use std::path::{ Path, PathBuf };
use tokio::fs;
use tokio::io::{ AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt };

const HELP: &str =
    "Commands: /history, /clear, /export <path>, /import <path>, /quit. Anything else is sent as a question.";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    History,
    Clear,
    Export(PathBuf),
    Import(PathBuf),
    Quit,
    Help,
    Empty,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if !line.starts_with('/') {
            return Command::Ask(line.to_string());
        }

        let (name, arg) = match line.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (line, ""),
        };
        match (name, arg) {
            ("/history", _) => Command::History,
            ("/clear", _) => Command::Clear,
            ("/quit" | "/exit", _) => Command::Quit,
            ("/export", path) if !path.is_empty() => Command::Export(PathBuf::from(path)),
            ("/import", path) if !path.is_empty() => Command::Import(PathBuf::from(path)),
            _ => Command::Help,
        }
    }
}

pub fn format_message(msg: &ChatMessage) -> String {
    let role_display = match msg.role {
        ChatRole::User => "You",
        ChatRole::Assistant => "Assistant",
    };
    format!("[{}] {}: {}", msg.created_at, role_display, msg.content)
}

async fn print_line<W: AsyncWrite + Unpin>(
    out: &mut W,
    line: &str
) -> Result<(), Box<dyn Error + Send + Sync>> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await?;
    Ok(())
}

async fn print_history<W: AsyncWrite + Unpin>(
    store: &ConversationStore,
    out: &mut W
) -> Result<(), Box<dyn Error + Send + Sync>> {
    for msg in store.messages() {
        print_line(out, &format_message(&msg)).await?;
    }
    Ok(())
}

/// Drives a chat session: one command or question per input line until
/// `/quit` or end of input.
pub async fn run_session<R, W>(
    store: &ConversationStore,
    input: R,
    out: &mut W
) -> Result<(), Box<dyn Error + Send + Sync>>
    where R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin
{
    if store.has_messages() {
        print_history(store, out).await?;
    }
    print_line(out, HELP).await?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => {
                break;
            }
            Command::Help => print_line(out, HELP).await?,
            Command::History => print_history(store, out).await?,
            Command::Clear => {
                store.clear_conversation().await;
                print_line(out, "Conversation cleared.").await?;
            }
            Command::Export(path) => {
                let json = serde_json::to_string_pretty(&store.messages())?;
                match fs::write(&path, json).await {
                    Ok(()) => print_line(out, &format!("Exported to {}", path.display())).await?,
                    Err(e) => {
                        warn!("Export to {} failed: {}", path.display(), e);
                        print_line(out, &format!("Export failed: {}", e)).await?;
                    }
                }
            }
            Command::Import(path) => {
                match read_export(&path).await {
                    Ok(messages) => {
                        let count = messages.len();
                        store.replace_messages(messages).await;
                        print_line(out, &format!("Imported {} message(s).", count)).await?;
                    }
                    Err(e) => {
                        warn!("Import from {} failed: {}", path.display(), e);
                        print_line(out, &format!("Import failed: {}", e)).await?;
                    }
                }
            }
            Command::Ask(question) => {
                match store.ask_rag(&question).await {
                    Ok(Some(answer)) => print_line(out, &format!("Assistant: {}", answer)).await?,
                    Ok(None) => {}
                    Err(e) => {
                        print_line(out, &format!("Assistant: {}", FAILURE_MESSAGE)).await?;
                        print_line(out, &format!("(error: {})", e)).await?;
                    }
                }
            }
        }
    }

    info!("Chat session ended with {} message(s)", store.messages().len());
    Ok(())
}

async fn read_export(path: &Path) -> Result<Vec<ChatMessage>, Box<dyn Error + Send + Sync>> {
    let raw = fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&raw)?)
}
