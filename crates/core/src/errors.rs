use serde_json::{json, Value};
use thiserror::Error;

use crate::reference::TicketReference;

/// Failure of a single backend operation.
///
/// Every variant is terminal for the one call that produced it and is carried
/// back to the caller as an `{"error": ...}` payload; none of them is retried.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum OperationError {
    #[error("Ticket {reference} not found")]
    TicketNotFound { reference: String },
    #[error("{0}")]
    Validation(String),
    #[error("storage failure: {0}")]
    Storage(String),
    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },
    #[error("{0}")]
    Execution(String),
}

impl OperationError {
    pub fn not_found(reference: &TicketReference) -> Self {
        Self::TicketNotFound { reference: reference.to_string() }
    }

    pub fn error_class(&self) -> &'static str {
        match self {
            Self::TicketNotFound { .. } => "not_found",
            Self::Validation(_) => "validation",
            Self::Storage(_) => "storage",
            Self::Timeout { .. } => "timeout",
            Self::Execution(_) => "execution",
        }
    }

    pub fn to_output(&self) -> Value {
        json!({ "error": self.to_string() })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::errors::OperationError;
    use crate::reference::TicketReference;

    #[test]
    fn not_found_renders_reference_verbatim() {
        let error = OperationError::not_found(&TicketReference::Code(
            "ITSD-20240101-0009".to_string(),
        ));

        assert_eq!(error.to_string(), "Ticket ITSD-20240101-0009 not found");
        assert_eq!(error.to_output(), json!({ "error": "Ticket ITSD-20240101-0009 not found" }));
        assert_eq!(error.error_class(), "not_found");
    }

    #[test]
    fn timeout_names_the_operation() {
        let error =
            OperationError::Timeout { operation: "update_ticket".to_string(), timeout_secs: 5 };

        assert_eq!(error.to_string(), "update_ticket timed out after 5s");
        assert_eq!(error.error_class(), "timeout");
    }
}
