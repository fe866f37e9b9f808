//! Conversation state types

use super::message::MessageLog;
use serde::{Deserialize, Serialize};

// ============================================================================
// Conversation State
// ============================================================================

/// Everything the presentation layer needs to draw the conversation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub messages: MessageLog,
    /// A reply (scripted or from the gateway) is outstanding
    pub pending: bool,
    /// Description of the last failed turn, cleared by the next good one
    pub last_error: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of Yes/No prompts that can still be answered
    pub fn active_prompt_count(&self) -> usize {
        self.messages.iter().filter(|m| m.prompt.is_active()).count()
    }
}

// ============================================================================
// Catalog
// ============================================================================

/// An item the shop sells
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    /// Whole dollars
    pub price: u32,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, price: u32) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

pub fn coffee_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry::new("Espresso", 3),
        CatalogEntry::new("Latte", 4),
        CatalogEntry::new("Cappuccino", 4),
        CatalogEntry::new("Americano", 3),
    ]
}

// ============================================================================
// Context
// ============================================================================

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct ConvContext {
    pub conversation_id: String,
    /// Items offered when the user accepts the greeting
    pub catalog: Vec<CatalogEntry>,
}

impl ConvContext {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            catalog: coffee_catalog(),
        }
    }

    /// Context with a fresh random conversation id
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_catalog(mut self, catalog: Vec<CatalogEntry>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Bot text introducing the menu, one numbered line per item
    pub fn menu_text(&self) -> String {
        let mut text = String::from("Here's our coffee menu:");
        for (index, entry) in self.catalog.iter().enumerate() {
            text.push_str(&format!("\n{}. {} - ${}", index + 1, entry.name, entry.price));
        }
        text
    }
}
