//! Core conversation state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions: the
//! reducer turns an [`Intent`] into a new [`ConversationState`] plus the
//! [`Effect`]s the runtime should carry out.

mod effect;
pub mod intent;
pub mod message;
pub mod state;
pub(crate) mod transition;


pub use effect::Effect;
pub use intent::{Choice, ChoiceParseError, Intent};
pub use message::{Author, Menu, MenuItem, Message, MessageId, MessageLog, Prompt};
pub use state::{CatalogEntry, ConvContext, ConversationState};
pub use transition::{transition, TransitionError, TransitionResult};
