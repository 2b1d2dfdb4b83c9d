use std::fmt;
use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

pub const TICKET_PREFIX: &str = "ITSD";
/// Highest daily sequence that fits the four-digit number format.
pub const MAX_TICKET_SEQUENCE: u32 = 9999;

/// A pointer at one ticket, either by its issued number or by its row id.
///
/// The two shapes are mutually exclusive: a token that looks like
/// `ITSD-YYYYMMDD-NNNN` is always a [`TicketReference::Code`] (uppercased),
/// a token made only of ASCII digits is always a [`TicketReference::Id`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TicketReference {
    Code(String),
    Id(i64),
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("`{0}` is neither a ticket number like ITSD-20240101-0001 nor a numeric ticket id")]
pub struct InvalidTicketReference(pub String);

fn search_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\bitsd-[0-9]{8}-[0-9]+|[0-9]+").expect("ticket search pattern compiles")
    })
}

fn exact_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^(?:itsd-[0-9]{8}-[0-9]{4}|[0-9]+)$").expect("ticket token pattern compiles")
    })
}

impl TicketReference {
    /// Resolves a standalone token. Surrounding whitespace is ignored.
    pub fn parse(token: &str) -> Result<Self, InvalidTicketReference> {
        let trimmed = token.trim();
        if !exact_pattern().is_match(trimmed) {
            return Err(InvalidTicketReference(token.to_string()));
        }
        Self::from_matched(trimmed).ok_or_else(|| InvalidTicketReference(token.to_string()))
    }

    /// Finds the first ticket-shaped token inside free text.
    pub fn extract(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        search_pattern().find_iter(&lowered).find_map(|found| Self::from_matched(found.as_str()))
    }

    pub fn is_code(&self) -> bool {
        matches!(self, Self::Code(_))
    }

    fn from_matched(token: &str) -> Option<Self> {
        // an over-long sequence names no ticket, not a shorter one
        if !exact_pattern().is_match(token) {
            return None;
        }
        if token.as_bytes().first().is_some_and(u8::is_ascii_digit) {
            // digit runs longer than i64 cannot name a row
            token.parse::<i64>().ok().map(Self::Id)
        } else {
            Some(Self::Code(token.to_ascii_uppercase()))
        }
    }
}

impl fmt::Display for TicketReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => f.write_str(code),
            Self::Id(id) => write!(f, "{id}"),
        }
    }
}

impl Serialize for TicketReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Prefix shared by every ticket issued on `date`, e.g. `ITSD-20240101-`.
pub fn ticket_number_prefix(date: NaiveDate) -> String {
    format!("{TICKET_PREFIX}-{}-", date.format("%Y%m%d"))
}

/// `None` once the day's four-digit sequence space is used up.
pub fn format_ticket_number(date: NaiveDate, sequence: u32) -> Option<String> {
    (1..=MAX_TICKET_SEQUENCE)
        .contains(&sequence)
        .then(|| format!("{}{sequence:04}", ticket_number_prefix(date)))
}

/// Reads the trailing sequence of an issued number; `None` for foreign shapes.
pub fn ticket_sequence(ticket_number: &str) -> Option<u32> {
    ticket_number.rsplit('-').next().and_then(|tail| tail.parse::<u32>().ok())
}
