//! One-shot notifications for the presentation layer

use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

/// Transient instruction to the presentation layer. Never part of state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEffect {
    /// Show a short-lived banner/toast
    Notify { message: String },
}

impl UiEffect {
    pub fn notify(message: impl Into<String>) -> Self {
        UiEffect::Notify {
            message: message.into(),
        }
    }
}

/// Fire-and-forget broadcast of [`UiEffect`]s.
///
/// Each emission reaches the subscribers attached at that moment, once.
/// With nobody listening the effect is dropped; nothing is queued or
/// replayed to later subscribers.
#[derive(Debug, Clone)]
pub struct EffectChannel {
    tx: broadcast::Sender<UiEffect>,
}

impl EffectChannel {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Returns how many subscribers received the effect
    pub fn emit(&self, effect: UiEffect) -> usize {
        self.tx.send(effect).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEffect> {
        self.tx.subscribe()
    }

    /// Subscribe as a stream. A receiver that falls behind skips what it missed.
    pub fn stream(&self) -> impl Stream<Item = UiEffect> + Send + 'static {
        BroadcastStream::new(self.subscribe()).filter_map(Result::ok)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EffectChannel {
    fn default() -> Self {
        Self::new(64)
    }
}
