use async_trait::async_trait;
use tracing::{info, warn};

use deskvoice_core::domain::knowledge::{
    KnowledgeArticleSummary, KnowledgeSearchResult, NewKnowledgeArticle,
};
use deskvoice_core::domain::ticket::{
    CreatedTicket, NewTicket, TicketDetails, TicketSummary, TicketUpdateRequest, UpdatedTicket,
};
use deskvoice_core::{OperationError, ServiceDesk, TicketReference};

use crate::repositories::{RepositoryError, SqlKnowledgeRepository, SqlTicketRepository};
use crate::DbPool;

/// [`ServiceDesk`] backed by the SQLite ticket and knowledge tables.
pub struct SqlServiceDesk {
    knowledge: SqlKnowledgeRepository,
    tickets: SqlTicketRepository,
}

impl SqlServiceDesk {
    pub fn new(pool: DbPool) -> Self {
        Self {
            knowledge: SqlKnowledgeRepository::new(pool.clone()),
            tickets: SqlTicketRepository::new(pool),
        }
    }

    pub async fn create_knowledge_article(
        &self,
        article: NewKnowledgeArticle,
    ) -> Result<KnowledgeArticleSummary, OperationError> {
        let created = self.knowledge.create(&article).await.map_err(storage_failure)?;
        info!(
            event_name = "db.knowledge.article_created",
            article_id = created.id,
            source = %created.source,
            "knowledge article created"
        );
        Ok(created)
    }
}

fn storage_failure(error: RepositoryError) -> OperationError {
    warn!(event_name = "db.operation.failed", error = %error, "storage operation failed");
    error.into()
}

#[async_trait]
impl ServiceDesk for SqlServiceDesk {
    async fn search_knowledge(&self, query: &str) -> Result<KnowledgeSearchResult, OperationError> {
        let matches = self.knowledge.search(query).await.map_err(storage_failure)?;
        Ok(KnowledgeSearchResult { query: query.to_string(), matches })
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<CreatedTicket, OperationError> {
        let created = self.tickets.create(&ticket).await.map_err(storage_failure)?;
        info!(
            event_name = "db.ticket.created",
            ticket_id = created.id,
            ticket_number = %created.formatted_number,
            priority = %created.priority,
            "ticket created"
        );
        Ok(created)
    }

    async fn get_ticket_status(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketSummary, OperationError> {
        self.tickets
            .find_summary(reference)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| OperationError::not_found(reference))
    }

    async fn get_ticket_details(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketDetails, OperationError> {
        self.tickets
            .find_details(reference)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| OperationError::not_found(reference))
    }

    async fn update_ticket(
        &self,
        update: TicketUpdateRequest,
    ) -> Result<UpdatedTicket, OperationError> {
        let updated = self
            .tickets
            .update(&update.reference, update.status, &update.comment, &update.author)
            .await
            .map_err(storage_failure)?
            .ok_or_else(|| OperationError::not_found(&update.reference))?;
        info!(
            event_name = "db.ticket.updated",
            ticket_id = updated.id,
            ticket_number = %updated.formatted_number,
            status = %updated.status,
            "ticket updated"
        );
        Ok(updated)
    }
}
