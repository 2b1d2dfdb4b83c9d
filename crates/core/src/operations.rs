//! Backend operations shared by the text assistant and the realtime bridge.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::domain::knowledge::KnowledgeSearchResult;
use crate::domain::ticket::{
    CreatedTicket, NewTicket, TicketDetails, TicketSummary, TicketUpdateRequest, UpdatedTicket,
};
use crate::errors::OperationError;
use crate::reference::TicketReference;

/// The five ticketing and knowledge operations the assistant can reach.
///
/// Implementations report every failure through [`OperationError`]; callers
/// turn the outcome into a result payload with [`render_outcome`].
#[async_trait]
pub trait ServiceDesk: Send + Sync {
    async fn search_knowledge(&self, query: &str)
        -> Result<KnowledgeSearchResult, OperationError>;

    async fn create_ticket(&self, ticket: NewTicket) -> Result<CreatedTicket, OperationError>;

    async fn get_ticket_status(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketSummary, OperationError>;

    async fn get_ticket_details(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketDetails, OperationError>;

    async fn update_ticket(
        &self,
        update: TicketUpdateRequest,
    ) -> Result<UpdatedTicket, OperationError>;
}

/// Success fields, or a single `error` field.
pub fn render_outcome<T: Serialize>(outcome: Result<T, OperationError>) -> Value {
    match outcome {
        Ok(value) => serde_json::to_value(value).unwrap_or_else(|error| {
            OperationError::Execution(format!("could not encode operation result: {error}"))
                .to_output()
        }),
        Err(error) => error.to_output(),
    }
}
