//! Conversation messages and the ordered message log

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Creation-order identifier assigned by [`MessageLog::append`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(u64);

impl MessageId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Author {
    User,
    Bot,
}

/// Interactive affordance attached to a bot message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Prompt {
    #[default]
    None,
    /// Yes/No buttons. Once disabled they never come back.
    OfferYesNo { enabled: bool },
}

impl Prompt {
    /// True when Yes/No buttons are shown and still actionable
    pub fn is_active(self) -> bool {
        matches!(self, Prompt::OfferYesNo { enabled: true })
    }
}

/// A single line of a menu or an order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub name: String,
    pub quantity: u32,
}

impl MenuItem {
    pub fn new(name: impl Into<String>, quantity: u32) -> Self {
        Self {
            name: name.into(),
            quantity,
        }
    }
}

/// Selectable order form carried by a bot message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Menu {
    items: Vec<MenuItem>,
    enabled: bool,
}

impl Menu {
    /// Fresh, active menu with every quantity at zero
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: names.into_iter().map(|name| MenuItem::new(name, 0)).collect(),
            enabled: true,
        }
    }

    pub fn items(&self) -> &[MenuItem] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Active menus accept quantity edits and can be ordered from
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn quantity(&self, item: &str) -> Option<u32> {
        self.items
            .iter()
            .find(|entry| entry.name == item)
            .map(|entry| entry.quantity)
    }

    /// Set the quantity for `item`, clamped to a floor of 1.
    ///
    /// Returns false if the menu has no such item.
    pub fn set_quantity(&mut self, item: &str, quantity: i32) -> bool {
        match self.items.iter_mut().find(|entry| entry.name == item) {
            Some(entry) => {
                entry.quantity = quantity.max(1).unsigned_abs();
                true
            }
            None => false,
        }
    }

    pub fn freeze(&mut self) {
        self.enabled = false;
    }
}

/// One entry in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub author: Author,
    #[serde(default)]
    pub prompt: Prompt,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<Menu>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_bot(&self) -> bool {
        self.author == Author::Bot
    }

    /// True when this message carries a menu that still accepts edits
    pub fn has_active_menu(&self) -> bool {
        self.menu.as_ref().is_some_and(Menu::is_enabled)
    }
}

/// A message before the log has assigned it an id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    text: String,
    author: Author,
    prompt: Prompt,
    menu: Option<Menu>,
}

impl MessageDraft {
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Author::User, text)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Author::Bot, text)
    }

    fn new(author: Author, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author,
            prompt: Prompt::None,
            menu: None,
        }
    }

    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = prompt;
        self
    }

    pub fn with_menu(mut self, menu: Menu) -> Self {
        // An empty mapping means "no menu shown"
        self.menu = (!menu.is_empty()).then_some(menu);
        self
    }
}

/// Ordered, append-mostly log of messages.
///
/// Entries are never reordered or removed. Ids come from an internal counter
/// so they are unique and increase in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message at the end and return the id it was given
    pub fn append(&mut self, draft: MessageDraft) -> MessageId {
        self.next_id += 1;
        let id = MessageId(self.next_id);
        self.messages.push(Message {
            id,
            text: draft.text,
            author: draft.author,
            prompt: draft.prompt,
            menu: draft.menu,
            created_at: Utc::now(),
        });
        id
    }

    /// Apply `transform` to every message matching `predicate`.
    ///
    /// Returns the number of messages touched.
    pub fn update_where<P, F>(&mut self, mut predicate: P, mut transform: F) -> usize
    where
        P: FnMut(&Message) -> bool,
        F: FnMut(&mut Message),
    {
        let mut touched = 0;
        for message in &mut self.messages {
            if predicate(message) {
                transform(message);
                touched += 1;
            }
        }
        touched
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Message> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl<'a> IntoIterator for &'a MessageLog {
    type Item = &'a Message;
    type IntoIter = std::slice::Iter<'a, Message>;

    fn into_iter(self) -> Self::IntoIter {
        self.messages.iter()
    }
}
