//! Text path of the service desk assistant.
//!
//! An utterance is classified by the ordered rule list in [`intent`], the
//! resulting [`intent::Intent`] is executed by [`dispatch::ActionDispatcher`]
//! against a [`deskvoice_core::ServiceDesk`], and the outcome is rendered
//! into a [`dispatch::ResultEnvelope`].

pub mod dispatch;
pub mod intent;
pub mod runtime;

#[cfg(test)]
pub(crate) mod test_support;

pub use dispatch::{ActionDispatcher, ResultEnvelope};
pub use intent::{classify, extract_title, Intent};
pub use runtime::AssistantRuntime;
