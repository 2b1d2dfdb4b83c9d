use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::InvalidFieldValue;
use crate::reference::TicketReference;

pub const DEFAULT_ASSIGNED_GROUP: &str = "service-desk";
pub const DEFAULT_UPDATE_AUTHOR: &str = "voicebot";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = InvalidFieldValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(InvalidFieldValue {
                field: "priority",
                value: value.to_string(),
                expected: "low|medium|high",
            }),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = InvalidFieldValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for TicketStatus {
    type Err = InvalidFieldValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            _ => Err(InvalidFieldValue {
                field: "status",
                value: value.to_string(),
                expected: "open|in_progress|resolved|closed",
            }),
        }
    }
}

impl TryFrom<String> for TicketStatus {
    type Error = InvalidFieldValue;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTicket {
    pub requester_name: String,
    pub requester_email: String,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub assigned_group: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTicket {
    pub id: i64,
    pub formatted_number: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub title: String,
    pub assigned_group: String,
    pub created_at: DateTime<Utc>,
}

/// Snapshot returned by a status lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: i64,
    pub formatted_number: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub title: String,
    pub assigned_group: String,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketHistoryEntry {
    pub author: String,
    pub status: TicketStatus,
    pub comment: String,
    pub created_at: Option<DateTime<Utc>>,
}

/// Full ticket record; `updates` is ordered oldest first.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDetails {
    pub id: i64,
    pub formatted_number: String,
    pub requester_name: String,
    pub requester_email: String,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: Priority,
    pub assigned_group: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub updates: Vec<TicketHistoryEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TicketUpdateRequest {
    pub reference: TicketReference,
    pub comment: String,
    pub status: TicketStatus,
    pub author: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdatedTicket {
    pub id: i64,
    pub formatted_number: String,
    pub status: TicketStatus,
    pub last_comment: String,
}
