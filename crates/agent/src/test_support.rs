use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use deskvoice_core::domain::knowledge::{KnowledgeMatch, KnowledgeSearchResult};
use deskvoice_core::domain::ticket::{
    CreatedTicket, NewTicket, Priority, TicketDetails, TicketHistoryEntry, TicketStatus,
    TicketSummary, TicketUpdateRequest, UpdatedTicket,
};
use deskvoice_core::{OperationError, ServiceDesk, TicketReference};

const KNOWN_NUMBER: &str = "ITSD-20240101-0001";

/// In-memory desk holding a single ticket; records every operation invoked.
#[derive(Default)]
pub(crate) struct StubDesk {
    calls: Mutex<Vec<&'static str>>,
    pub fail_storage: bool,
}

impl StubDesk {
    pub fn failing() -> Self {
        Self { fail_storage: true, ..Self::default() }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    fn record(&self, name: &'static str) -> Result<(), OperationError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(name);
        }
        if self.fail_storage {
            return Err(OperationError::Storage("database is locked".to_string()));
        }
        Ok(())
    }

    fn known(reference: &TicketReference) -> Result<(), OperationError> {
        match reference {
            TicketReference::Id(1) => Ok(()),
            TicketReference::Code(code) if code == KNOWN_NUMBER => Ok(()),
            other => Err(OperationError::not_found(other)),
        }
    }
}

#[async_trait]
impl ServiceDesk for StubDesk {
    async fn search_knowledge(&self, query: &str) -> Result<KnowledgeSearchResult, OperationError> {
        self.record("search_knowledge")?;
        let matches = if query.to_lowercase().contains("vpn") {
            vec![KnowledgeMatch {
                id: 1,
                title: "VPN not connecting".to_string(),
                category: "network".to_string(),
                content: "Re-enter the VPN profile.".to_string(),
                source: "itsd-runbook".to_string(),
            }]
        } else {
            Vec::new()
        };
        Ok(KnowledgeSearchResult { query: query.to_string(), matches })
    }

    async fn create_ticket(&self, ticket: NewTicket) -> Result<CreatedTicket, OperationError> {
        self.record("create_ticket")?;
        Ok(CreatedTicket {
            id: 2,
            formatted_number: "ITSD-20240101-0002".to_string(),
            status: TicketStatus::Open,
            priority: ticket.priority,
            title: ticket.title,
            assigned_group: ticket.assigned_group,
            created_at: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).single().unwrap_or_default(),
        })
    }

    async fn get_ticket_status(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketSummary, OperationError> {
        self.record("get_ticket_status")?;
        Self::known(reference)?;
        Ok(TicketSummary {
            id: 1,
            formatted_number: KNOWN_NUMBER.to_string(),
            status: TicketStatus::InProgress,
            priority: Priority::High,
            title: "VPN prompts for certificate".to_string(),
            assigned_group: "network-operations".to_string(),
            updated_at: None,
        })
    }

    async fn get_ticket_details(
        &self,
        reference: &TicketReference,
    ) -> Result<TicketDetails, OperationError> {
        self.record("get_ticket_details")?;
        Self::known(reference)?;
        let entry = |status, comment: &str| TicketHistoryEntry {
            author: "voicebot".to_string(),
            status,
            comment: comment.to_string(),
            created_at: None,
        };
        Ok(TicketDetails {
            id: 1,
            formatted_number: KNOWN_NUMBER.to_string(),
            requester_name: "Dummy User 1".to_string(),
            requester_email: "dummy.user1@example.com".to_string(),
            title: "VPN prompts for certificate".to_string(),
            description: "VPN fails after password reset".to_string(),
            status: TicketStatus::InProgress,
            priority: Priority::High,
            assigned_group: "network-operations".to_string(),
            created_at: None,
            updated_at: None,
            updates: vec![
                entry(TicketStatus::Open, "created"),
                entry(TicketStatus::InProgress, "collected logs"),
            ],
        })
    }

    async fn update_ticket(
        &self,
        update: TicketUpdateRequest,
    ) -> Result<UpdatedTicket, OperationError> {
        self.record("update_ticket")?;
        Self::known(&update.reference)?;
        Ok(UpdatedTicket {
            id: 1,
            formatted_number: KNOWN_NUMBER.to_string(),
            status: update.status,
            last_comment: update.comment,
        })
    }
}
