//! Effects produced by state transitions

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Ask the gateway for a reply to `prompt`; the outcome comes back as
    /// `ReplyReceived` or `ReplyFailed`
    RequestReply { prompt: String },

    /// One-shot notice for whoever is listening (a toast/snackbar)
    Notify { message: String },
}

impl Effect {
    pub fn request_reply(prompt: impl Into<String>) -> Self {
        Effect::RequestReply {
            prompt: prompt.into(),
        }
    }

    pub fn notify(message: impl Into<String>) -> Self {
        Effect::Notify {
            message: message.into(),
        }
    }
}
