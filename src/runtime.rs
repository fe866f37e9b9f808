//! Runtime for executing conversations
//!
//! A session is one [`ConversationRuntime`] task plus the
//! [`ConversationHandle`] the presentation layer talks to: intents go in,
//! a leveled state stream and an unleveled effect stream come out.

mod effect_channel;
mod executor;

#[cfg(test)]
pub mod testing;

pub use effect_channel::{EffectChannel, UiEffect};
pub use executor::ConversationRuntime;

use crate::gateway::Gateway;
use crate::state_machine::{ConvContext, ConversationState, Intent};
use futures::Stream;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_stream::wrappers::WatchStream;
use tokio_util::sync::CancellationToken;

const INTENT_QUEUE_DEPTH: usize = 32;
const EFFECT_CAPACITY: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuntimeError {
    #[error("Conversation session has ended")]
    SessionClosed,
}

/// Handle to interact with a running conversation
#[derive(Clone)]
pub struct ConversationHandle {
    conversation_id: String,
    intent_tx: mpsc::Sender<Intent>,
    state_rx: watch::Receiver<ConversationState>,
    effects: EffectChannel,
    shutdown: CancellationToken,
}

impl ConversationHandle {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    /// Queue an intent. Intents are applied in the order they are queued.
    pub async fn dispatch(&self, intent: Intent) -> Result<(), RuntimeError> {
        self.intent_tx
            .send(intent)
            .await
            .map_err(|_| RuntimeError::SessionClosed)
    }

    /// Latest-value state subscription
    pub fn state(&self) -> watch::Receiver<ConversationState> {
        self.state_rx.clone()
    }

    /// State as a stream, starting with the current value
    pub fn state_stream(&self) -> WatchStream<ConversationState> {
        WatchStream::new(self.state_rx.clone())
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state_rx.borrow().clone()
    }

    /// Effects emitted from now on; earlier ones are not replayed
    pub fn effects(&self) -> broadcast::Receiver<UiEffect> {
        self.effects.subscribe()
    }

    pub fn effect_stream(&self) -> impl Stream<Item = UiEffect> + Send + 'static {
        self.effects.stream()
    }

    /// End the session. Replies still in flight are discarded.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }
}

/// Start a conversation session on the current tokio runtime
pub fn start_session<G>(context: ConvContext, gateway: Arc<G>) -> (ConversationHandle, JoinHandle<()>)
where
    G: Gateway + ?Sized + 'static,
{
    let conversation_id = context.conversation_id.clone();
    let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE_DEPTH);
    let (state_tx, state_rx) = watch::channel(ConversationState::new());
    let effects = EffectChannel::new(EFFECT_CAPACITY);
    let shutdown = CancellationToken::new();

    let runtime = ConversationRuntime::new(
        context,
        gateway,
        intent_rx,
        &intent_tx,
        state_tx,
        effects.clone(),
        shutdown.clone(),
    );

    let conv_id = conversation_id.clone();
    let task = tokio::spawn(async move {
        runtime.run().await;
        tracing::info!(conv_id = %conv_id, "Conversation runtime finished");
    });

    let handle = ConversationHandle {
        conversation_id,
        intent_tx,
        state_rx,
        effects,
        shutdown,
    };
    (handle, task)
}
