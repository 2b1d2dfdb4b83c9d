use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

/// The tools advertised to the voice API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ToolName {
    SearchKnowledge,
    CreateTicket,
    GetTicketStatus,
    UpdateTicket,
}

impl ToolName {
    pub const ALL: [ToolName; 4] =
        [Self::SearchKnowledge, Self::CreateTicket, Self::GetTicketStatus, Self::UpdateTicket];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchKnowledge => "search_knowledge",
            Self::CreateTicket => "create_ticket",
            Self::GetTicketStatus => "get_ticket_status",
            Self::UpdateTicket => "update_ticket",
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.as_str() == name)
    }

    fn description(&self) -> &'static str {
        match self {
            Self::SearchKnowledge => "Search IT troubleshooting knowledge articles",
            Self::CreateTicket => "Create an IT support ticket",
            Self::GetTicketStatus => "Get current status for an IT support ticket",
            Self::UpdateTicket => "Update ticket status and leave a note",
        }
    }

    fn parameters(&self) -> Value {
        match self {
            Self::SearchKnowledge => json!({
                "type": "object",
                "properties": { "query": { "type": "string" } },
                "required": ["query"]
            }),
            Self::CreateTicket => json!({
                "type": "object",
                "properties": {
                    "requester_name": { "type": "string" },
                    "requester_email": { "type": "string" },
                    "title": { "type": "string" },
                    "description": { "type": "string" },
                    "priority": { "type": "string", "enum": ["low", "medium", "high"] }
                },
                "required": ["requester_name", "requester_email", "title", "description"]
            }),
            Self::GetTicketStatus => json!({
                "type": "object",
                "properties": {
                    "ticket_ref": {
                        "type": "string",
                        "description": "Ticket number such as ITSD-20240101-0001 or a numeric ticket id"
                    }
                },
                "required": ["ticket_ref"]
            }),
            Self::UpdateTicket => json!({
                "type": "object",
                "properties": {
                    "ticket_ref": {
                        "type": "string",
                        "description": "Ticket number such as ITSD-20240101-0001 or a numeric ticket id"
                    },
                    "comment": { "type": "string" },
                    "status": {
                        "type": "string",
                        "enum": ["open", "in_progress", "resolved", "closed"]
                    },
                    "author": { "type": "string" }
                },
                "required": ["ticket_ref", "comment", "status"]
            }),
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub parameters: Value,
}

pub fn tool_catalog() -> Vec<ToolSchema> {
    ToolName::ALL
        .iter()
        .map(|tool| ToolSchema {
            name: tool.as_str(),
            description: tool.description(),
            parameters: tool.parameters(),
        })
        .collect()
}

/// First frame sent on a new connection.
pub fn session_update(model: &str, instructions: &str) -> Value {
    json!({
        "type": "session.update",
        "session": {
            "model": model,
            "instructions": instructions,
            "tools": tool_catalog(),
        }
    })
}
