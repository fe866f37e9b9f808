//! Intents that drive state transitions

use super::message::{MenuItem, MessageId};
use crate::gateway::GatewayErrorKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Requests to change the conversation.
///
/// The first four come from the presentation layer. `ReplyReceived` and
/// `ReplyFailed` are dispatched by the runtime once a gateway call resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    SendMessage {
        text: String,
    },
    ButtonClicked {
        choice: Choice,
    },
    PlaceOrder {
        items: Vec<MenuItem>,
    },
    UpdateQuantity {
        message_id: MessageId,
        item: String,
        quantity: i32,
    },

    // Gateway outcomes
    ReplyReceived {
        text: String,
    },
    ReplyFailed {
        kind: GatewayErrorKind,
        message: String,
    },
}

impl Intent {
    pub fn send_message(text: impl Into<String>) -> Self {
        Intent::SendMessage { text: text.into() }
    }

    /// Short name for log fields
    pub fn name(&self) -> &'static str {
        match self {
            Intent::SendMessage { .. } => "send_message",
            Intent::ButtonClicked { .. } => "button_clicked",
            Intent::PlaceOrder { .. } => "place_order",
            Intent::UpdateQuantity { .. } => "update_quantity",
            Intent::ReplyReceived { .. } => "reply_received",
            Intent::ReplyFailed { .. } => "reply_failed",
        }
    }
}

/// Answer to a Yes/No prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Choice {
    Yes,
    No,
}

impl Choice {
    /// Button label, also used as the user's message text
    pub fn label(self) -> &'static str {
        match self {
            Choice::Yes => "Yes",
            Choice::No => "No",
        }
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown button label: {0:?}")]
pub struct ChoiceParseError(String);

impl FromStr for Choice {
    type Err = ChoiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Yes" => Ok(Choice::Yes),
            "No" => Ok(Choice::No),
            other => Err(ChoiceParseError(other.to_string())),
        }
    }
}
