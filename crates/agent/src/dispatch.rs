use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use deskvoice_core::domain::knowledge::KnowledgeSearchResult;
use deskvoice_core::{render_outcome, OperationError, ServiceDesk};

use crate::intent::Intent;

pub const NO_KNOWLEDGE_MATCH: &str =
    "I could not find a matching knowledge article. Please rephrase the issue.";

/// Reply to one utterance: which action ran, its raw result, and the
/// sentence to speak or show.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub action: &'static str,
    pub result: Value,
    pub response: String,
}

#[derive(Clone)]
pub struct ActionDispatcher {
    desk: Arc<dyn ServiceDesk>,
}

impl ActionDispatcher {
    pub fn new(desk: Arc<dyn ServiceDesk>) -> Self {
        Self { desk }
    }

    /// Runs exactly one backend operation for the intent.
    pub async fn dispatch(&self, intent: Intent) -> ResultEnvelope {
        let action = intent.action();

        match intent {
            Intent::TicketStatus { reference } => {
                let outcome = self.desk.get_ticket_status(&reference).await;
                let response = respond(&outcome, |ticket| {
                    format!(
                        "Ticket {} is currently {} with {} priority.",
                        ticket.formatted_number, ticket.status, ticket.priority
                    )
                });
                envelope(action, outcome, response)
            }
            Intent::TicketDetails { reference } => {
                let outcome = self.desk.get_ticket_details(&reference).await;
                let response = respond(&outcome, |ticket| {
                    format!(
                        "Ticket {} is {} and has {} update entries.",
                        ticket.formatted_number,
                        ticket.status,
                        ticket.updates.len()
                    )
                });
                envelope(action, outcome, response)
            }
            Intent::TicketUpdate(update) => {
                let outcome = self.desk.update_ticket(update).await;
                let response = respond(&outcome, |ticket| {
                    format!("Done. Ticket {} was updated to {}.", ticket.formatted_number, ticket.status)
                });
                envelope(action, outcome, response)
            }
            Intent::TicketCreate(ticket) => {
                let outcome = self.desk.create_ticket(ticket).await;
                let response = respond(&outcome, |ticket| {
                    format!(
                        "Ticket {} created with {} priority.",
                        ticket.formatted_number, ticket.priority
                    )
                });
                envelope(action, outcome, response)
            }
            Intent::KnowledgeSearch { query } => {
                let outcome = self.desk.search_knowledge(&query).await;
                let response = respond(&outcome, knowledge_response);
                envelope(action, outcome, response)
            }
        }
    }
}

pub fn knowledge_response(result: &KnowledgeSearchResult) -> String {
    match result.top() {
        Some(top) => format!("I found '{}'. Suggested guidance: {}", top.title, top.content),
        None => NO_KNOWLEDGE_MATCH.to_string(),
    }
}

/// Failures are spoken back verbatim.
fn respond<T>(outcome: &Result<T, OperationError>, render: impl FnOnce(&T) -> String) -> String {
    match outcome {
        Ok(value) => render(value),
        Err(error) => error.to_string(),
    }
}

fn envelope<T: Serialize>(
    action: &'static str,
    outcome: Result<T, OperationError>,
    response: String,
) -> ResultEnvelope {
    ResultEnvelope { action, result: render_outcome(outcome), response }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use deskvoice_core::domain::knowledge::{KnowledgeMatch, KnowledgeSearchResult};
    use serde_json::json;

    use super::{knowledge_response, ActionDispatcher, NO_KNOWLEDGE_MATCH};
    use crate::intent::Intent;
    use crate::test_support::StubDesk;

    #[test]
    fn empty_search_asks_to_rephrase() {
        let result = KnowledgeSearchResult { query: "x".to_string(), matches: Vec::new() };
        assert_eq!(knowledge_response(&result), NO_KNOWLEDGE_MATCH);
    }

    #[test]
    fn search_uses_only_the_top_match() {
        let article = |id: i64, title: &str, content: &str| KnowledgeMatch {
            id,
            title: title.to_string(),
            category: "network".to_string(),
            content: content.to_string(),
            source: "itsd-runbook".to_string(),
        };
        let result = KnowledgeSearchResult {
            query: "vpn".to_string(),
            matches: vec![
                article(1, "VPN not connecting", "Check certificates."),
                article(2, "VPN slow", "Change region."),
            ],
        };

        assert_eq!(
            knowledge_response(&result),
            "I found 'VPN not connecting'. Suggested guidance: Check certificates."
        );
    }

    #[tokio::test]
    async fn status_envelope_renders_sentence_and_result() {
        let desk = Arc::new(StubDesk::default());
        let dispatcher = ActionDispatcher::new(desk.clone());

        let envelope = dispatcher
            .dispatch(Intent::TicketStatus {
                reference: deskvoice_core::TicketReference::Id(1),
            })
            .await;

        assert_eq!(envelope.action, "ticket_status");
        assert_eq!(
            envelope.response,
            "Ticket ITSD-20240101-0001 is currently in_progress with high priority."
        );
        assert_eq!(envelope.result["formatted_number"], json!("ITSD-20240101-0001"));
        assert_eq!(desk.calls(), vec!["get_ticket_status"]);
    }

    #[tokio::test]
    async fn missing_ticket_error_is_echoed() {
        let desk = Arc::new(StubDesk::default());
        let dispatcher = ActionDispatcher::new(desk.clone());

        let envelope = dispatcher
            .dispatch(Intent::TicketDetails { reference: deskvoice_core::TicketReference::Id(9) })
            .await;

        assert_eq!(envelope.response, "Ticket 9 not found");
        assert_eq!(envelope.result, json!({ "error": "Ticket 9 not found" }));
        assert_eq!(desk.calls().len(), 1);
    }
}
