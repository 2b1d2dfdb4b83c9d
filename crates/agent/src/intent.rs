//! Deterministic utterance classification.
//!
//! An utterance is matched against [`RULES`] in order and the first rule that
//! fires decides the intent. Knowledge search is the fallback, so
//! classification never fails.

use std::sync::OnceLock;

use regex::Regex;

use deskvoice_core::args::MAX_TITLE_CHARS;
use deskvoice_core::domain::ticket::{
    NewTicket, Priority, TicketStatus, TicketUpdateRequest, DEFAULT_ASSIGNED_GROUP,
};
use deskvoice_core::TicketReference;

pub const WEB_UPDATE_AUTHOR: &str = "web-voicebot";
pub const WEB_REQUESTER_NAME: &str = "Web User";
pub const WEB_REQUESTER_EMAIL: &str = "webuser@example.com";

/// What the utterance asks for, together with the arguments it carries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    TicketStatus { reference: TicketReference },
    TicketDetails { reference: TicketReference },
    TicketUpdate(TicketUpdateRequest),
    TicketCreate(NewTicket),
    KnowledgeSearch { query: String },
}

impl Intent {
    pub fn action(&self) -> &'static str {
        match self {
            Self::TicketStatus { .. } => "ticket_status",
            Self::TicketDetails { .. } => "ticket_details",
            Self::TicketUpdate(_) => "ticket_update",
            Self::TicketCreate(_) => "ticket_create",
            Self::KnowledgeSearch { .. } => "knowledge_search",
        }
    }

    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::TicketUpdate(_) | Self::TicketCreate(_))
    }
}

struct Utterance<'a> {
    text: &'a str,
    lowered: String,
    reference: Option<TicketReference>,
}

impl Utterance<'_> {
    fn mentions(&self, keyword: &str) -> bool {
        self.lowered.contains(keyword)
    }
}

pub struct Rule {
    pub name: &'static str,
    matcher: fn(&Utterance<'_>) -> Option<Intent>,
}

/// Order is behavioral: an utterance mentioning both "update" and
/// "create ticket" with a reference is an update.
pub const RULES: &[Rule] = &[
    Rule { name: "ticket_status", matcher: status_rule },
    Rule { name: "ticket_details", matcher: details_rule },
    Rule { name: "ticket_update", matcher: update_rule },
    Rule { name: "ticket_create", matcher: create_rule },
];

pub fn classify(text: &str) -> Intent {
    let text = text.trim();
    let lowered = text.to_lowercase();
    let utterance = Utterance { text, reference: TicketReference::extract(&lowered), lowered };

    RULES
        .iter()
        .find_map(|rule| (rule.matcher)(&utterance))
        .unwrap_or_else(|| Intent::KnowledgeSearch { query: text.to_string() })
}

fn status_rule(utterance: &Utterance<'_>) -> Option<Intent> {
    if !(utterance.mentions("status") || utterance.mentions("check")) {
        return None;
    }
    let reference = utterance.reference.clone()?;
    Some(Intent::TicketStatus { reference })
}

fn details_rule(utterance: &Utterance<'_>) -> Option<Intent> {
    if !utterance.mentions("details") {
        return None;
    }
    let reference = utterance.reference.clone()?;
    Some(Intent::TicketDetails { reference })
}

fn update_rule(utterance: &Utterance<'_>) -> Option<Intent> {
    if !utterance.mentions("update") {
        return None;
    }
    let reference = utterance.reference.clone()?;
    let status = if utterance.mentions("resolved") {
        TicketStatus::Resolved
    } else if utterance.mentions("open") {
        TicketStatus::Open
    } else {
        TicketStatus::InProgress
    };

    Some(Intent::TicketUpdate(TicketUpdateRequest {
        reference,
        comment: utterance.text.to_string(),
        status,
        author: WEB_UPDATE_AUTHOR.to_string(),
    }))
}

fn create_rule(utterance: &Utterance<'_>) -> Option<Intent> {
    if !(utterance.mentions("create") && utterance.mentions("ticket")) {
        return None;
    }
    let priority = if utterance.mentions("high") {
        Priority::High
    } else if utterance.mentions("low") {
        Priority::Low
    } else {
        Priority::Medium
    };

    Some(Intent::TicketCreate(NewTicket {
        requester_name: WEB_REQUESTER_NAME.to_string(),
        requester_email: WEB_REQUESTER_EMAIL.to_string(),
        title: extract_title(utterance.text),
        description: utterance.text.to_string(),
        priority,
        assigned_group: DEFAULT_ASSIGNED_GROUP.to_string(),
    }))
}

fn for_word() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)\bfor\b").expect("title marker pattern compiles"))
}

/// Text after the first standalone "for", or the whole text when there is
/// none or nothing follows it. Capped at the storage title length.
pub fn extract_title(text: &str) -> String {
    let text = text.trim();
    let title = for_word()
        .find(text)
        .map(|marker| text[marker.end()..].trim())
        .filter(|rest| !rest.is_empty())
        .unwrap_or(text);

    title.chars().take(MAX_TITLE_CHARS).collect()
}
