//! Line-oriented console front end
//!
//! Maps typed lines to intents and renders conversation state as text.
//! Lines starting with `/` are commands; anything else is sent as a message.

use crate::runtime::{ConversationHandle, UiEffect};
use crate::state_machine::{Author, Choice, ConversationState, Intent, Message, MessageId};
use futures::StreamExt;
use std::collections::HashMap;
use std::io::Write;
use thiserror::Error;
use tokio::task::JoinHandle;

pub const HELP_TEXT: &str = "Commands:
  <text>                   send a message
  /yes, /no                answer the latest Yes/No prompt
  /qty <id> <item> <n>     set an item quantity on menu message <id>
  /order <id>              place the order from menu message <id>
  /help                    show this list
  /quit, /exit             leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Say(String),
    Choose(Choice),
    Quantity {
        message_id: MessageId,
        item: String,
        quantity: i32,
    },
    Order {
        message_id: MessageId,
    },
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command: {0} (try /help)")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
    #[error("Not a number: {0}")]
    InvalidNumber(String),
    #[error("Message {0} has no open menu")]
    NoMenu(MessageId),
}

/// Parse one input line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Some(Command::Say(line.to_string())));
    };

    let mut words = rest.split_whitespace();
    let name = words.next().unwrap_or_default();
    let args: Vec<&str> = words.collect();

    let command = match name {
        "yes" => Command::Choose(Choice::Yes),
        "no" => Command::Choose(Choice::No),
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "qty" => {
            const USAGE: &str = "/qty <id> <item> <n>";
            let [id, item @ .., quantity] = args.as_slice() else {
                return Err(CommandError::Usage(USAGE));
            };
            if item.is_empty() {
                return Err(CommandError::Usage(USAGE));
            }
            Command::Quantity {
                message_id: parse_id(id)?,
                item: item.join(" "),
                quantity: quantity
                    .parse()
                    .map_err(|_| CommandError::InvalidNumber((*quantity).to_string()))?,
            }
        }
        "order" => match args.as_slice() {
            [id] => Command::Order {
                message_id: parse_id(id)?,
            },
            _ => return Err(CommandError::Usage("/order <id>")),
        },
        other => return Err(CommandError::Unknown(format!("/{other}"))),
    };
    Ok(Some(command))
}

fn parse_id(raw: &str) -> Result<MessageId, CommandError> {
    raw.parse()
        .map(MessageId::new)
        .map_err(|_| CommandError::InvalidNumber(raw.to_string()))
}

impl Command {
    /// Intent to dispatch for this command, if any.
    ///
    /// `/order` reads the current quantities from the referenced menu.
    pub fn into_intent(self, state: &ConversationState) -> Result<Option<Intent>, CommandError> {
        let intent = match self {
            Command::Say(text) => Intent::SendMessage { text },
            Command::Choose(choice) => Intent::ButtonClicked { choice },
            Command::Quantity {
                message_id,
                item,
                quantity,
            } => Intent::UpdateQuantity {
                message_id,
                item,
                quantity,
            },
            Command::Order { message_id } => {
                let menu = state
                    .messages
                    .get(message_id)
                    .and_then(|m| m.menu.as_ref())
                    .filter(|menu| menu.is_enabled())
                    .ok_or(CommandError::NoMenu(message_id))?;
                Intent::PlaceOrder {
                    items: menu.items().to_vec(),
                }
            }
            Command::Help | Command::Quit => return Ok(None),
        };
        Ok(Some(intent))
    }
}

/// Text form of a single message
pub fn render_message(message: &Message) -> String {
    let who = match message.author {
        Author::User => "you",
        Author::Bot => "bot",
    };
    let mut out = format!("[{}] {who}: {}", message.id, message.text);

    if message.prompt.is_active() {
        out.push_str("\n    [Yes] [No]");
    }
    if let Some(menu) = &message.menu {
        for item in menu.items() {
            out.push_str(&format!("\n    {} x {}", item.quantity, item.name));
        }
        if !menu.is_enabled() {
            out.push_str("\n    (ordered)");
        }
    }
    out
}

/// Remembers what has been printed so only new or changed messages are shown
#[derive(Debug, Default)]
pub struct Transcript {
    seen: HashMap<MessageId, Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered messages that are new or differ from the last call
    pub fn changes(&mut self, state: &ConversationState) -> Vec<String> {
        let mut out = Vec::new();
        for message in &state.messages {
            if self.seen.get(&message.id) != Some(message) {
                out.push(render_message(message));
                self.seen.insert(message.id, message.clone());
            }
        }
        out
    }
}

/// Write new or changed messages and notifications to `out` until the
/// session's streams close or a write fails
pub fn spawn_printer<W>(handle: &ConversationHandle, mut out: W) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    let mut states = handle.state_stream();
    let effects = handle.effect_stream();

    tokio::spawn(async move {
        let mut effects = std::pin::pin!(effects);
        let mut transcript = Transcript::new();
        let mut was_pending = false;
        loop {
            let written = tokio::select! {
                Some(state) = states.next() => {
                    let mut lines = transcript.changes(&state);
                    if state.pending && !was_pending {
                        lines.push("...".to_string());
                    }
                    was_pending = state.pending;
                    lines.iter().try_for_each(|line| writeln!(out, "{line}"))
                }
                Some(effect) = effects.next() => match effect {
                    UiEffect::Notify { message } => writeln!(out, "! {message}"),
                },
                else => break,
            };
            if let Err(e) = written.and_then(|()| out.flush()) {
                tracing::debug!(error = %e, "Console output closed");
                break;
            }
        }
    })
}
