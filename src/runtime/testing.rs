//! Mock implementations for testing
//!
//! These mocks enable integration testing without real I/O.

use super::{start_session, ConversationHandle, UiEffect};
use crate::gateway::{Gateway, GatewayError};
use crate::state_machine::{ConvContext, ConversationState, Intent};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};
use tokio::task::JoinHandle;

// ============================================================================
// Mock Gateway
// ============================================================================

/// Mock gateway that returns queued replies
pub struct MockGateway {
    replies: Mutex<VecDeque<Result<String, GatewayError>>>,
    /// Record of all prompts sent
    prompts: Mutex<Vec<String>>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Queue a successful reply
    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(Ok(reply.into()));
    }

    /// Queue a failure
    pub fn queue_error(&self, error: GatewayError) {
        self.replies.lock().unwrap().push_back(Err(error));
    }

    pub fn recorded_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn next_reply(&self, prompt: &str) -> Result<String, GatewayError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(GatewayError::network("No mock reply queued")))
    }
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        self.next_reply(prompt)
    }

    fn model_id(&self) -> &str {
        "mock-model"
    }
}

// ============================================================================
// Delayed Mock Gateway (for ordering tests)
// ============================================================================

/// Mock gateway that waits before answering
pub struct DelayedMockGateway {
    inner: MockGateway,
    delay: Duration,
    /// Notified when a request starts (for test synchronization)
    pub request_started: Arc<Notify>,
}

impl DelayedMockGateway {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MockGateway::new(),
            delay,
            request_started: Arc::new(Notify::new()),
        }
    }

    pub fn queue_reply(&self, reply: impl Into<String>) {
        self.inner.queue_reply(reply);
    }
}

#[async_trait]
impl Gateway for DelayedMockGateway {
    async fn send(&self, prompt: &str) -> Result<String, GatewayError> {
        self.request_started.notify_one();
        tokio::time::sleep(self.delay).await;
        self.inner.next_reply(prompt)
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}

// ============================================================================
// Test Runtime
// ============================================================================

/// A running session with its subscriptions already attached
pub struct TestRuntime<G: Gateway + 'static> {
    pub handle: ConversationHandle,
    pub gateway: Arc<G>,
    pub state_rx: watch::Receiver<ConversationState>,
    pub effect_rx: broadcast::Receiver<UiEffect>,
    pub task: JoinHandle<()>,
}

impl TestRuntime<MockGateway> {
    /// Session backed by an instant mock gateway
    pub fn new(gateway: MockGateway) -> Self {
        Self::with_gateway(gateway)
    }
}

impl<G: Gateway + 'static> TestRuntime<G> {
    pub fn with_gateway(gateway: G) -> Self {
        let gateway = Arc::new(gateway);
        let (handle, task) = start_session(ConvContext::new("test-conv"), gateway.clone());
        let state_rx = handle.state();
        let effect_rx = handle.effects();
        Self {
            handle,
            gateway,
            state_rx,
            effect_rx,
            task,
        }
    }

    pub async fn dispatch(&self, intent: Intent) {
        self.handle
            .dispatch(intent)
            .await
            .expect("Failed to dispatch intent");
    }

    pub async fn send_message(&self, text: &str) {
        self.dispatch(Intent::send_message(text)).await;
    }

    /// Wait until the published state satisfies `predicate`
    pub async fn wait_for_state(
        &mut self,
        timeout: Duration,
        predicate: impl FnMut(&ConversationState) -> bool,
    ) -> Option<ConversationState> {
        let waited = tokio::time::timeout(timeout, self.state_rx.wait_for(predicate)).await;
        match waited {
            Ok(Ok(state)) => Some(state.clone()),
            _ => None,
        }
    }

    /// Wait until `count` messages exist and nothing is pending
    pub async fn wait_for_idle(&mut self, count: usize) -> ConversationState {
        self.wait_for_state(Duration::from_secs(2), |s| {
            !s.pending && s.messages.len() >= count
        })
        .await
        .expect("Timed out waiting for the conversation to settle")
    }

    /// Wait for the next effect
    pub async fn next_effect(&mut self, timeout: Duration) -> Option<UiEffect> {
        match tokio::time::timeout(timeout, self.effect_rx.recv()).await {
            Ok(Ok(effect)) => Some(effect),
            _ => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::GatewayErrorKind;
    use crate::runtime::RuntimeError;
    use crate::state_machine::transition::{
        BUSY_NOTICE, BUSY_REPLY_TEXT, FOLLOW_UP_PROMPT, GENERIC_FAILURE_NOTICE, GREETING_TEXT,
        REPLY_FAILED,
    };
    use crate::state_machine::{Author, Choice, MenuItem, Prompt};

    const SHORT: Duration = Duration::from_millis(100);

    #[tokio::test]
    async fn test_mock_gateway() {
        let mock = MockGateway::new();
        mock.queue_reply("Hello");

        assert_eq!(mock.send("hi").await.unwrap(), "Hello");

        // Second call should fail (no more replies)
        let result = mock.send("again").await;
        assert_eq!(result.unwrap_err().kind, GatewayErrorKind::Network);
        assert_eq!(mock.recorded_prompts(), vec!["hi", "again"]);
    }

    /// Integration test: delegated free text
    #[tokio::test]
    async fn test_simple_text_reply() {
        let gateway = MockGateway::new();
        gateway.queue_reply("We sell coffee.");

        let mut rt = TestRuntime::new(gateway);
        rt.send_message("what do you sell?").await;

        let state = rt.wait_for_idle(2).await;
        let msgs = state.messages.as_slice();
        assert_eq!(msgs[0].author, Author::User);
        assert_eq!(msgs[1].author, Author::Bot);
        assert_eq!(msgs[1].text, "We sell coffee.");
        assert!(state.last_error.is_none());
        assert_eq!(rt.gateway.recorded_prompts(), vec!["what do you sell?"]);
    }

    #[tokio::test]
    async fn test_greeting_never_calls_gateway() {
        let mut rt = TestRuntime::new(MockGateway::new());
        rt.send_message("Hello").await;

        let state = rt.wait_for_idle(2).await;
        let bot = state.messages.last().unwrap();
        assert_eq!(bot.text, GREETING_TEXT);
        assert_eq!(bot.prompt, Prompt::OfferYesNo { enabled: true });
        assert!(rt.gateway.recorded_prompts().is_empty());
    }

    /// Integration test: the whole scripted ordering flow
    #[tokio::test]
    async fn test_order_flow() {
        let mut rt = TestRuntime::new(MockGateway::new());
        rt.send_message("hello").await;
        rt.dispatch(Intent::ButtonClicked { choice: Choice::Yes }).await;

        let state = rt.wait_for_idle(4).await;
        assert_eq!(state.active_prompt_count(), 0);
        let menu_msg = state.messages.last().unwrap();
        let menu_id = menu_msg.id;
        assert!(menu_msg.has_active_menu());

        rt.dispatch(Intent::UpdateQuantity {
            message_id: menu_id,
            item: "Latte".to_string(),
            quantity: 2,
        })
        .await;
        let state = rt
            .wait_for_state(Duration::from_secs(2), |s| {
                s.messages
                    .get(menu_id)
                    .and_then(|m| m.menu.as_ref())
                    .and_then(|menu| menu.quantity("Latte"))
                    == Some(2)
            })
            .await
            .expect("quantity update was not applied");

        let menu = state.messages.get(menu_id).unwrap().menu.as_ref().unwrap();
        let items: Vec<MenuItem> = menu.items().to_vec();
        rt.dispatch(Intent::PlaceOrder { items }).await;

        let state = rt.wait_for_idle(6).await;
        let msgs = state.messages.as_slice();
        assert_eq!(msgs[4].text, "2 x Latte");
        assert!(msgs[5].text.contains("2 x Latte"));
        assert!(!state.messages.get(menu_id).unwrap().has_active_menu());
        assert!(rt.gateway.recorded_prompts().is_empty());
    }

    #[tokio::test]
    async fn test_no_delegates_follow_up() {
        let gateway = MockGateway::new();
        gateway.queue_reply("Tea, maybe?");

        let mut rt = TestRuntime::new(gateway);
        rt.send_message("hello").await;
        rt.dispatch(Intent::ButtonClicked { choice: Choice::No }).await;

        let state = rt.wait_for_idle(4).await;
        assert_eq!(state.messages.last().unwrap().text, "Tea, maybe?");
        assert_eq!(rt.gateway.recorded_prompts(), vec![FOLLOW_UP_PROMPT]);
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_notifies_once() {
        let gateway = MockGateway::new();
        gateway.queue_error(GatewayError::network("connection reset"));

        let mut rt = TestRuntime::new(gateway);
        rt.send_message("what's your best seller?").await;

        let state = rt
            .wait_for_state(Duration::from_secs(2), |s| s.last_error.is_some())
            .await
            .expect("failure was not applied");
        assert!(!state.pending);
        assert_eq!(state.last_error.as_deref(), Some(REPLY_FAILED));
        assert_eq!(state.messages.len(), 1);

        assert_eq!(
            rt.next_effect(Duration::from_secs(2)).await,
            Some(UiEffect::notify(GENERIC_FAILURE_NOTICE))
        );
        assert_eq!(rt.next_effect(SHORT).await, None);
    }

    #[tokio::test]
    async fn test_overloaded_failure_adds_busy_reply() {
        let gateway = MockGateway::new();
        gateway.queue_error(GatewayError::overloaded("model overloaded"));

        let mut rt = TestRuntime::new(gateway);
        rt.send_message("coffee?").await;

        let state = rt.wait_for_idle(2).await;
        assert_eq!(state.messages.last().unwrap().text, BUSY_REPLY_TEXT);
        assert!(state.last_error.is_some());
        assert_eq!(
            rt.next_effect(Duration::from_secs(2)).await,
            Some(UiEffect::notify(BUSY_NOTICE))
        );
    }

    #[tokio::test]
    async fn test_error_cleared_by_next_success() {
        let gateway = MockGateway::new();
        gateway.queue_error(GatewayError::unknown("boom"));
        gateway.queue_reply("Back again");

        let mut rt = TestRuntime::new(gateway);
        rt.send_message("first").await;
        rt.wait_for_state(Duration::from_secs(2), |s| s.last_error.is_some())
            .await
            .expect("failure was not applied");

        rt.send_message("second").await;
        let state = rt.wait_for_idle(3).await;
        assert!(state.last_error.is_none());
        assert_eq!(state.messages.last().unwrap().text, "Back again");
    }

    #[tokio::test]
    async fn test_pending_while_gateway_in_flight() {
        let gateway = DelayedMockGateway::new(Duration::from_millis(200));
        gateway.queue_reply("Slow answer");
        let started = gateway.request_started.clone();

        let mut rt = TestRuntime::with_gateway(gateway);
        rt.send_message("anything new?").await;
        started.notified().await;

        // The user message is committed before the reply arrives
        let state = rt.handle.snapshot();
        assert!(state.pending);
        assert_eq!(state.messages.len(), 1);

        // Scripted intents are still applied while the call is outstanding
        rt.dispatch(Intent::send_message("hello")).await;
        let state = rt
            .wait_for_state(Duration::from_secs(2), |s| s.messages.len() == 3)
            .await
            .unwrap();
        assert_eq!(state.messages.last().unwrap().text, GREETING_TEXT);

        let state = rt.wait_for_idle(4).await;
        assert_eq!(state.messages.last().unwrap().text, "Slow answer");
    }

    #[tokio::test]
    async fn test_empty_order_is_reported() {
        let mut rt = TestRuntime::new(MockGateway::new());
        rt.dispatch(Intent::PlaceOrder { items: vec![] }).await;

        let effect = rt.next_effect(Duration::from_secs(2)).await.unwrap();
        assert!(matches!(effect, UiEffect::Notify { .. }));
        assert!(rt.handle.snapshot().messages.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_closes_session() {
        let rt = TestRuntime::new(MockGateway::new());
        rt.handle.shutdown();
        tokio::time::timeout(Duration::from_secs(2), rt.task)
            .await
            .expect("runtime did not stop")
            .unwrap();

        let result = rt.handle.dispatch(Intent::send_message("hi")).await;
        assert_eq!(result, Err(RuntimeError::SessionClosed));
    }

    #[tokio::test]
    async fn test_runtime_stops_when_handles_dropped() {
        let gateway = Arc::new(MockGateway::new());
        let (handle, task) = start_session(ConvContext::new("drop-conv"), gateway);
        drop(handle);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("runtime did not stop")
            .unwrap();
    }
}
