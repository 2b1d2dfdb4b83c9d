use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use deskvoice_core::domain::knowledge::KnowledgeSearchResult;
use deskvoice_core::domain::ticket::{
    CreatedTicket, NewTicket, Priority, TicketDetails, TicketStatus, TicketSummary,
    TicketUpdateRequest, UpdatedTicket,
};
use deskvoice_core::{OperationError, ServiceDesk, TicketReference};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum DeskBehavior {
    #[default]
    Succeed,
    FailStorage,
    Panic,
    Stall,
}

/// Counts backend invocations; every ticket lookup hits ticket 5.
#[derive(Default)]
pub(crate) struct CountingDesk {
    calls: AtomicUsize,
    pub behavior: DeskBehavior,
}

impl CountingDesk {
    pub fn with_behavior(behavior: DeskBehavior) -> Self {
        Self { behavior, ..Self::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn enter(&self) -> Result<(), OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            DeskBehavior::Succeed => Ok(()),
            DeskBehavior::FailStorage => {
                Err(OperationError::Storage("database is locked".to_string()))
            }
            DeskBehavior::Panic => panic!("backend exploded"),
            DeskBehavior::Stall => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ServiceDesk for CountingDesk {
    async fn search_knowledge(&self, query: &str) -> Result<KnowledgeSearchResult, OperationError> {
        self.enter().await?;
        Ok(KnowledgeSearchResult { query: query.to_string(), matches: Vec::new() })
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<CreatedTicket, OperationError> {
        self.enter().await?;
        Ok(CreatedTicket {
            id: 5,
            formatted_number: "ITSD-20240101-0005".to_string(),
            status: TicketStatus::Open,
            priority: ticket.priority,
            title: ticket.title,
            assigned_group: ticket.assigned_group,
            created_at: Utc::now(),
        })
    }

    async fn get_ticket_status(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketSummary, OperationError> {
        self.enter().await?;
        if *reference != TicketReference::Id(5) {
            return Err(OperationError::not_found(reference));
        }
        Ok(TicketSummary {
            id: 5,
            formatted_number: "ITSD-20240101-0005".to_string(),
            status: TicketStatus::Open,
            priority: Priority::Medium,
            title: "Printer offline".to_string(),
            assigned_group: "service-desk".to_string(),
            updated_at: None,
        })
    }

    async fn get_ticket_details(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketDetails, OperationError> {
        self.enter().await?;
        Err(OperationError::not_found(reference))
    }

    async fn update_ticket(
        &self,
        update: TicketUpdateRequest,
    ) -> Result<UpdatedTicket, OperationError> {
        self.enter().await?;
        Ok(UpdatedTicket {
            id: 5,
            formatted_number: "ITSD-20240101-0005".to_string(),
            status: update.status,
            last_comment: update.comment,
        })
    }
}
