//! Typed arguments for the four advertised tools.
//!
//! Both the realtime bridge and the HTTP surface decode untrusted JSON into
//! these structs and then call `validate` to obtain domain requests.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::domain::ticket::{
    NewTicket, Priority, TicketStatus, TicketUpdateRequest, DEFAULT_ASSIGNED_GROUP,
    DEFAULT_UPDATE_AUTHOR,
};
use crate::errors::OperationError;
use crate::reference::TicketReference;

pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_TITLE_CHARS: usize = 255;

#[derive(Clone, Debug, Deserialize)]
pub struct SearchKnowledgeArgs {
    pub query: String,
}

impl SearchKnowledgeArgs {
    pub fn validate(self) -> Result<String, OperationError> {
        if self.query.trim().chars().count() < MIN_QUERY_CHARS {
            return Err(OperationError::Validation(format!(
                "query must be at least {MIN_QUERY_CHARS} characters"
            )));
        }
        Ok(self.query)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreateTicketArgs {
    pub requester_name: String,
    pub requester_email: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_assigned_group")]
    pub assigned_group: String,
}

impl CreateTicketArgs {
    pub fn validate(self) -> Result<NewTicket, OperationError> {
        require_non_empty("requester_name", &self.requester_name)?;
        require_non_empty("title", &self.title)?;
        require_non_empty("description", &self.description)?;
        if !looks_like_email(&self.requester_email) {
            return Err(OperationError::Validation(format!(
                "requester_email `{}` is not a valid email address",
                self.requester_email
            )));
        }
        if self.title.chars().count() > MAX_TITLE_CHARS {
            return Err(OperationError::Validation(format!(
                "title must be at most {MAX_TITLE_CHARS} characters"
            )));
        }

        let assigned_group = if self.assigned_group.trim().is_empty() {
            default_assigned_group()
        } else {
            self.assigned_group
        };

        Ok(NewTicket {
            requester_name: self.requester_name,
            requester_email: self.requester_email.trim().to_string(),
            title: self.title,
            description: self.description,
            priority: self.priority,
            assigned_group,
        })
    }
}

/// A ticket pointer as peers send it: a string token or a bare integer.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum TicketRefArg {
    Number(u64),
    Text(String),
}

impl TicketRefArg {
    pub fn resolve(self) -> Result<TicketReference, OperationError> {
        let token = match self {
            Self::Number(id) => id.to_string(),
            Self::Text(text) => text,
        };
        TicketReference::parse(&token).map_err(|error| OperationError::Validation(error.to_string()))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct TicketLookupArgs {
    #[serde(alias = "ticket_id")]
    pub ticket_ref: TicketRefArg,
}

impl TicketLookupArgs {
    pub fn validate(self) -> Result<TicketReference, OperationError> {
        self.ticket_ref.resolve()
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct UpdateTicketArgs {
    #[serde(alias = "ticket_id")]
    pub ticket_ref: TicketRefArg,
    pub comment: String,
    pub status: TicketStatus,
    #[serde(default = "default_author")]
    pub author: String,
}

impl UpdateTicketArgs {
    pub fn validate(self) -> Result<TicketUpdateRequest, OperationError> {
        require_non_empty("comment", &self.comment)?;
        let author = if self.author.trim().is_empty() { default_author() } else { self.author };

        Ok(TicketUpdateRequest {
            reference: self.ticket_ref.resolve()?,
            comment: self.comment,
            status: self.status,
            author,
        })
    }
}

/// Decodes a JSON object into one of the argument structs.
pub fn decode_args<T: DeserializeOwned>(
    tool: &str,
    arguments: Map<String, Value>,
) -> Result<T, OperationError> {
    serde_json::from_value(Value::Object(arguments))
        .map_err(|error| OperationError::Validation(format!("invalid arguments for {tool}: {error}")))
}

fn default_assigned_group() -> String {
    DEFAULT_ASSIGNED_GROUP.to_string()
}

fn default_author() -> String {
    DEFAULT_UPDATE_AUTHOR.to_string()
}

fn require_non_empty(field: &str, value: &str) -> Result<(), OperationError> {
    if value.trim().is_empty() {
        return Err(OperationError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && !value.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}
