pub mod args;
pub mod config;
pub mod domain;
pub mod errors;
pub mod operations;
pub mod reference;
pub mod telemetry;

pub use args::{
    decode_args, CreateTicketArgs, SearchKnowledgeArgs, TicketLookupArgs, TicketRefArg,
    UpdateTicketArgs,
};
pub use domain::knowledge::{
    KnowledgeArticleSummary, KnowledgeMatch, KnowledgeSearchResult, NewKnowledgeArticle,
};
pub use domain::ticket::{
    CreatedTicket, NewTicket, Priority, TicketDetails, TicketHistoryEntry, TicketStatus,
    TicketSummary, TicketUpdateRequest, UpdatedTicket,
};
pub use errors::OperationError;
pub use operations::{render_outcome, ServiceDesk};
pub use reference::TicketReference;
