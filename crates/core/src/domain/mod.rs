pub mod knowledge;
pub mod ticket;

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("unsupported {field} `{value}` (expected {expected})")]
pub struct InvalidFieldValue {
    pub field: &'static str,
    pub value: String,
    pub expected: &'static str,
}
