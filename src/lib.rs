//! Coffee-Bot conversation core
//!
//! A chat session where scripted turns (greeting, menu, ordering) are
//! handled locally and everything else is delegated to a language model.
//! The pure reducer lives in [`state_machine`]; [`runtime`] drives it.

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

pub mod console;
pub mod gateway;
pub mod runtime;
pub mod state_machine;
