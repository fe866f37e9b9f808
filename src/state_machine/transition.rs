//! Pure state transition function
//!
//! Given the same state, context and intent this always produces the same
//! new state and effects. The gateway is never called from here; delegation
//! is expressed as an [`Effect::RequestReply`].

use super::message::{Menu, MenuItem, MessageDraft, MessageId, MessageLog, Prompt};
use super::{Choice, ConvContext, ConversationState, Effect, Intent};
use crate::gateway::GatewayErrorKind;
use thiserror::Error;

/// Text that triggers the scripted greeting (compared trimmed, ignoring case)
pub const GREETING_TRIGGER: &str = "hello";
pub const GREETING_TEXT: &str = "Welcome to my shop. Are you want coffee?";
/// Prompt sent to the gateway when the user declines the menu
pub const FOLLOW_UP_PROMPT: &str = "What do you want?";

pub const REPLY_FAILED: &str = "Failed to get reply";
pub const GENERIC_FAILURE_NOTICE: &str = "Something went wrong";
pub const BUSY_REPLY_TEXT: &str = "The system is busy right now. Please try again in a moment.";
pub const BUSY_NOTICE: &str = "Service is busy, please try again";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: ConversationState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: ConversationState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    /// No change at all
    pub fn unchanged(state: &ConversationState) -> Self {
        Self::new(state.clone())
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Intents the reducer refuses. State is never modified when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Please choose at least one item before placing an order")]
    EmptyOrder,
}

pub fn transition(
    state: &ConversationState,
    context: &ConvContext,
    intent: Intent,
) -> Result<TransitionResult, TransitionError> {
    match intent {
        // ============================================================
        // Free text
        // ============================================================
        Intent::SendMessage { text } => {
            let mut next = state.clone();
            next.messages.append(MessageDraft::user(text.as_str()));
            next.pending = true;

            // The greeting always wins over delegation
            if is_greeting(&text) {
                disable_yes_no_prompts(&mut next.messages);
                next.messages.append(
                    MessageDraft::bot(GREETING_TEXT)
                        .with_prompt(Prompt::OfferYesNo { enabled: true }),
                );
                next.pending = false;
                next.last_error = None;
                return Ok(TransitionResult::new(next));
            }

            Ok(TransitionResult::new(next).with_effect(Effect::request_reply(text)))
        }

        // ============================================================
        // Yes/No prompt
        // ============================================================
        Intent::ButtonClicked { choice } => {
            let mut next = state.clone();
            next.messages.append(MessageDraft::user(choice.label()));
            freeze_latest_prompt(&mut next.messages);
            next.pending = true;

            match choice {
                Choice::Yes => {
                    let names = context.catalog.iter().map(|entry| entry.name.clone());
                    next.messages.append(
                        MessageDraft::bot(context.menu_text()).with_menu(Menu::from_names(names)),
                    );
                    next.pending = false;
                    next.last_error = None;
                    Ok(TransitionResult::new(next))
                }
                Choice::No => Ok(TransitionResult::new(next)
                    .with_effect(Effect::request_reply(FOLLOW_UP_PROMPT))),
            }
        }

        // ============================================================
        // Order flow
        // ============================================================
        Intent::PlaceOrder { items } => {
            let summary = order_summary(&items).ok_or(TransitionError::EmptyOrder)?;

            let mut next = state.clone();
            next.messages.update_where(
                |m| m.has_active_menu(),
                |m| {
                    if let Some(menu) = m.menu.as_mut() {
                        menu.freeze();
                    }
                },
            );
            next.messages.append(MessageDraft::user(summary.as_str()));
            next.messages.append(MessageDraft::bot(format!(
                "Thanks! Your order has been placed:\n{summary}"
            )));
            next.last_error = None;
            Ok(TransitionResult::new(next))
        }

        Intent::UpdateQuantity {
            message_id,
            item,
            quantity,
        } => {
            if !accepts_quantity_edit(&state.messages, message_id, &item) {
                return Ok(TransitionResult::unchanged(state));
            }

            let mut next = state.clone();
            next.messages.update_where(
                |m| m.id == message_id,
                |m| {
                    if let Some(menu) = m.menu.as_mut() {
                        menu.set_quantity(&item, quantity);
                    }
                },
            );
            Ok(TransitionResult::new(next))
        }

        // ============================================================
        // Gateway outcomes
        // ============================================================
        Intent::ReplyReceived { text } if text.trim().is_empty() => Ok(reply_failed(
            state,
            GatewayErrorKind::EmptyReply,
        )),

        Intent::ReplyReceived { text } => {
            let mut next = state.clone();
            next.messages.append(MessageDraft::bot(text));
            next.pending = false;
            next.last_error = None;
            Ok(TransitionResult::new(next))
        }

        Intent::ReplyFailed { kind, .. } => Ok(reply_failed(state, kind)),
    }
}

// Helper functions

fn is_greeting(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case(GREETING_TRIGGER)
}

fn reply_failed(state: &ConversationState, kind: GatewayErrorKind) -> TransitionResult {
    let mut next = state.clone();
    next.pending = false;
    next.last_error = Some(REPLY_FAILED.to_string());

    if kind.is_overloaded() {
        next.messages.append(MessageDraft::bot(BUSY_REPLY_TEXT));
        TransitionResult::new(next).with_effect(Effect::notify(BUSY_NOTICE))
    } else {
        TransitionResult::new(next).with_effect(Effect::notify(GENERIC_FAILURE_NOTICE))
    }
}

/// Disable every Yes/No prompt that can still be answered
fn disable_yes_no_prompts(messages: &mut MessageLog) {
    messages.update_where(
        |m| m.prompt.is_active(),
        |m| m.prompt = Prompt::OfferYesNo { enabled: false },
    );
}

/// Disable the prompt on the most recent bot message still offering one
fn freeze_latest_prompt(messages: &mut MessageLog) {
    let latest = messages
        .iter()
        .rev()
        .find(|m| m.is_bot() && m.prompt.is_active())
        .map(|m| m.id);

    if let Some(id) = latest {
        messages.update_where(
            |m| m.id == id,
            |m| m.prompt = Prompt::OfferYesNo { enabled: false },
        );
    }
}

/// Only bot messages with an active menu that lists `item` take edits
fn accepts_quantity_edit(messages: &MessageLog, id: MessageId, item: &str) -> bool {
    messages.get(id).is_some_and(|m| {
        m.is_bot()
            && m.menu
                .as_ref()
                .is_some_and(|menu| menu.is_enabled() && menu.quantity(item).is_some())
    })
}

/// `"{quantity} x {item}"` per line, skipping zero quantities.
///
/// Repeated names are merged into the first line for that name.
fn order_summary(items: &[MenuItem]) -> Option<String> {
    let mut merged: Vec<(&str, u32)> = Vec::new();
    for item in items.iter().filter(|item| item.quantity > 0) {
        match merged.iter_mut().find(|(name, _)| *name == item.name) {
            Some((_, quantity)) => *quantity = quantity.saturating_add(item.quantity),
            None => merged.push((item.name.as_str(), item.quantity)),
        }
    }

    if merged.is_empty() {
        return None;
    }
    let lines: Vec<String> = merged
        .iter()
        .map(|(name, quantity)| format!("{quantity} x {name}"))
        .collect();
    Some(lines.join("\n"))
}
