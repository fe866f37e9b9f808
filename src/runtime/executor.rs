//! Conversation runtime executor

use super::{EffectChannel, UiEffect};
use crate::gateway::Gateway;
use crate::state_machine::{transition, ConvContext, ConversationState, Effect, Intent};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

/// Owns the conversation state and applies intents one at a time.
///
/// All transitions happen on the task running [`ConversationRuntime::run`].
/// Gateway calls run on spawned tasks and report back through the same
/// intent queue, so replies are serialized with everything else.
pub struct ConversationRuntime<G>
where
    G: Gateway + ?Sized + 'static,
{
    context: ConvContext,
    state: ConversationState,
    gateway: Arc<G>,
    intent_rx: mpsc::Receiver<Intent>,
    /// Weak so the loop ends once every handle is gone and no reply is in flight
    intent_tx: mpsc::WeakSender<Intent>,
    state_tx: watch::Sender<ConversationState>,
    effects: EffectChannel,
    shutdown: CancellationToken,
}

impl<G> ConversationRuntime<G>
where
    G: Gateway + ?Sized + 'static,
{
    pub fn new(
        context: ConvContext,
        gateway: Arc<G>,
        intent_rx: mpsc::Receiver<Intent>,
        intent_tx: &mpsc::Sender<Intent>,
        state_tx: watch::Sender<ConversationState>,
        effects: EffectChannel,
        shutdown: CancellationToken,
    ) -> Self {
        let state = state_tx.borrow().clone();
        Self {
            context,
            state,
            gateway,
            intent_rx,
            intent_tx: intent_tx.downgrade(),
            state_tx,
            effects,
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(
            conv_id = %self.context.conversation_id,
            model = %self.gateway.model_id(),
            "Starting conversation runtime"
        );

        // Process intents in a loop - no recursion
        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => break,
                next = self.intent_rx.recv() => match next {
                    Some(intent) => self.process_intent(intent),
                    None => break,
                },
            }
        }

        tracing::info!(
            conv_id = %self.context.conversation_id,
            messages = self.state.messages.len(),
            "Conversation runtime stopped"
        );
    }

    fn process_intent(&mut self, intent: Intent) {
        let name = intent.name();
        let result = match transition(&self.state, &self.context, intent) {
            Ok(r) => r,
            Err(e) => {
                // Rejections are user-facing (e.g. an empty order)
                tracing::warn!(conv_id = %self.context.conversation_id, intent = name, error = %e, "Intent rejected");
                self.effects.emit(UiEffect::notify(e.to_string()));
                return;
            }
        };

        self.state = result.new_state;
        tracing::debug!(
            conv_id = %self.context.conversation_id,
            intent = name,
            pending = self.state.pending,
            messages = self.state.messages.len(),
            effects = result.effects.len(),
            "Applied intent"
        );
        self.publish_state();

        for effect in result.effects {
            self.execute_effect(effect);
        }
    }

    /// Push the current state to subscribers if it changed
    fn publish_state(&self) {
        let state = &self.state;
        self.state_tx.send_if_modified(|current| {
            if current == state {
                false
            } else {
                current.clone_from(state);
                true
            }
        });
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::RequestReply { prompt } => self.request_reply(prompt),
            Effect::Notify { message } => {
                let delivered = self.effects.emit(UiEffect::Notify { message });
                tracing::debug!(delivered, "Emitted notification");
            }
        }
    }

    fn request_reply(&mut self, prompt: String) {
        let Some(intent_tx) = self.intent_tx.upgrade() else {
            // Every handle is gone; resolve now so pending is not left set
            tracing::debug!("Session closing, skipping gateway request");
            self.process_intent(Intent::ReplyFailed {
                kind: crate::gateway::GatewayErrorKind::Network,
                message: "Session closed".to_string(),
            });
            return;
        };

        let gateway = Arc::clone(&self.gateway);
        let conv_id = self.context.conversation_id.clone();

        tokio::spawn(async move {
            tracing::debug!(conv_id = %conv_id, "Requesting reply (background)");
            let intent = match gateway.send(&prompt).await {
                Ok(text) => Intent::ReplyReceived { text },
                Err(e) => Intent::ReplyFailed {
                    kind: e.kind,
                    message: e.message,
                },
            };
            if intent_tx.send(intent).await.is_err() {
                tracing::debug!(conv_id = %conv_id, "Runtime stopped before reply was applied");
            }
        });
    }
}
