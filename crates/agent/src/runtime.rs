use std::sync::Arc;

use tracing::info;

use deskvoice_core::ServiceDesk;

use crate::dispatch::{ActionDispatcher, ResultEnvelope};
use crate::intent::classify;

/// Stateless text path: classify, dispatch, render.
#[derive(Clone)]
pub struct AssistantRuntime {
    dispatcher: ActionDispatcher,
}

impl AssistantRuntime {
    pub fn new(desk: Arc<dyn ServiceDesk>) -> Self {
        Self { dispatcher: ActionDispatcher::new(desk) }
    }

    pub async fn handle_assistant_utterance(&self, text: &str) -> ResultEnvelope {
        let intent = classify(text);
        let mutating = intent.is_mutating();
        let envelope = self.dispatcher.dispatch(intent).await;

        info!(
            event_name = "agent.utterance.handled",
            action = envelope.action,
            mutating,
            failed = envelope.result.get("error").is_some(),
            "assistant utterance handled"
        );
        envelope
    }
}
