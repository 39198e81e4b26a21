//! Background dispatch of user messages to AI providers.
//!
//! One supervised task per stored user message: load the session's history,
//! trim it to the context window, resolve the session's provider, call it
//! under an absolute deadline and append the assistant reply.

pub mod orchestrator;
pub mod state;

pub use orchestrator::{DispatchJob, Dispatcher};
pub use state::{DispatchError, DispatchOutcome, DispatchState};
