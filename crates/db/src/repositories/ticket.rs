use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use deskvoice_core::domain::ticket::{
    CreatedTicket, NewTicket, Priority, TicketDetails, TicketHistoryEntry, TicketStatus,
    TicketSummary, UpdatedTicket, DEFAULT_UPDATE_AUTHOR,
};
use deskvoice_core::reference::{format_ticket_number, ticket_number_prefix, ticket_sequence};
use deskvoice_core::TicketReference;

use super::{RepositoryError, BEGIN_WRITE};
use crate::DbPool;

pub const CREATION_COMMENT: &str = "Ticket created via voicebot";

/// One history line written alongside a ticket insert.
#[derive(Clone, Debug)]
pub struct HistorySeed<'a> {
    pub author: &'a str,
    pub status: TicketStatus,
    pub comment: &'a str,
}

pub struct SqlTicketRepository {
    pool: DbPool,
}

impl SqlTicketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Allocates the next number for today and writes the ticket plus its
    /// creation entry in one transaction.
    pub async fn create(&self, ticket: &NewTicket) -> Result<CreatedTicket, RepositoryError> {
        let now = Utc::now();
        let history = [HistorySeed {
            author: DEFAULT_UPDATE_AUTHOR,
            status: TicketStatus::Open,
            comment: CREATION_COMMENT,
        }];

        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;
        let (id, formatted_number) =
            insert_ticket(&mut tx, ticket, TicketStatus::Open, &history, now).await?;
        tx.commit().await?;

        Ok(CreatedTicket {
            id,
            formatted_number,
            status: TicketStatus::Open,
            priority: ticket.priority,
            title: ticket.title.clone(),
            assigned_group: ticket.assigned_group.clone(),
            created_at: now,
        })
    }

    pub async fn find_summary(
        &self,
        reference: &TicketReference,
    ) -> Result<Option<TicketSummary>, RepositoryError> {
        let Some(row) = self.find_row(reference).await? else {
            return Ok(None);
        };

        Ok(Some(TicketSummary {
            id: row.id,
            formatted_number: row.ticket_number,
            status: row.status,
            priority: row.priority,
            title: row.title,
            assigned_group: row.assigned_group,
            updated_at: row.updated_at,
        }))
    }

    pub async fn find_details(
        &self,
        reference: &TicketReference,
    ) -> Result<Option<TicketDetails>, RepositoryError> {
        let Some(row) = self.find_row(reference).await? else {
            return Ok(None);
        };
        let updates = self.history(row.id).await?;

        Ok(Some(TicketDetails {
            id: row.id,
            formatted_number: row.ticket_number,
            requester_name: row.requester_name,
            requester_email: row.requester_email,
            title: row.title,
            description: row.description,
            status: row.status,
            priority: row.priority,
            assigned_group: row.assigned_group,
            created_at: row.created_at,
            updated_at: row.updated_at,
            updates,
        }))
    }

    /// History entries for one ticket, oldest first.
    pub async fn history(&self, ticket_id: i64) -> Result<Vec<TicketHistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT author, status, comment, created_at
             FROM ticket_updates
             WHERE ticket_id = ?
             ORDER BY created_at ASC, id ASC",
        )
        .bind(ticket_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_history).collect::<Result<Vec<_>, _>>()
    }

    pub async fn update(
        &self,
        reference: &TicketReference,
        status: TicketStatus,
        comment: &str,
        author: &str,
    ) -> Result<Option<UpdatedTicket>, RepositoryError> {
        let now = timestamp(Utc::now());
        let mut tx = self.pool.begin_with(BEGIN_WRITE).await?;

        let found = match reference {
            TicketReference::Code(code) => {
                sqlx::query("SELECT id, ticket_number FROM tickets WHERE ticket_number = ?")
                    .bind(code)
                    .fetch_optional(&mut *tx)
                    .await?
            }
            TicketReference::Id(id) => {
                sqlx::query("SELECT id, ticket_number FROM tickets WHERE id = ?")
                    .bind(id)
                    .fetch_optional(&mut *tx)
                    .await?
            }
        };
        let Some(found) = found else {
            return Ok(None);
        };
        let id: i64 = found.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?;
        let ticket_number: String =
            found.try_get("ticket_number").map_err(|e| RepositoryError::Decode(e.to_string()))?;

        sqlx::query("UPDATE tickets SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(&now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO ticket_updates (ticket_id, author, comment, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(author)
        .bind(comment)
        .bind(status.as_str())
        .bind(&now)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok(Some(UpdatedTicket {
            id,
            formatted_number: ticket_number,
            status,
            last_comment: comment.to_string(),
        }))
    }

    pub async fn count_by_requester_prefix(&self, prefix: &str) -> Result<i64, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM tickets WHERE requester_email LIKE ?")
                .bind(format!("{prefix}%"))
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn find_row(
        &self,
        reference: &TicketReference,
    ) -> Result<Option<TicketRow>, RepositoryError> {
        const BY_NUMBER: &str = "SELECT id, ticket_number, requester_name, requester_email, title,
                    description, status, priority, assigned_group, created_at, updated_at
             FROM tickets WHERE ticket_number = ?";
        const BY_ID: &str = "SELECT id, ticket_number, requester_name, requester_email, title,
                    description, status, priority, assigned_group, created_at, updated_at
             FROM tickets WHERE id = ?";

        // lookup strategy follows the reference shape, never both
        let row = match reference {
            TicketReference::Code(code) => {
                sqlx::query(BY_NUMBER).bind(code).fetch_optional(&self.pool).await?
            }
            TicketReference::Id(id) => sqlx::query(BY_ID).bind(id).fetch_optional(&self.pool).await?,
        };

        row.as_ref().map(row_to_ticket).transpose()
    }
}

/// Inserts a ticket with a freshly allocated number and its history lines.
/// Runs on the caller's write transaction so the number stays unique.
pub(crate) async fn insert_ticket(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    ticket: &NewTicket,
    status: TicketStatus,
    history: &[HistorySeed<'_>],
    now: DateTime<Utc>,
) -> Result<(i64, String), RepositoryError> {
    let date = now.date_naive();
    let issued: Vec<String> =
        sqlx::query_scalar("SELECT ticket_number FROM tickets WHERE ticket_number LIKE ?")
            .bind(format!("{}%", ticket_number_prefix(date)))
            .fetch_all(&mut **tx)
            .await?;
    let sequence = issued.iter().filter_map(|number| ticket_sequence(number)).max().unwrap_or(0) + 1;
    let ticket_number = format_ticket_number(date, sequence)
        .ok_or_else(|| RepositoryError::SequenceExhausted(ticket_number_prefix(date)))?;
    let created_at = timestamp(now);

    let result = sqlx::query(
        "INSERT INTO tickets (ticket_number, requester_name, requester_email, title, description,
                              status, priority, assigned_group, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&ticket_number)
    .bind(&ticket.requester_name)
    .bind(&ticket.requester_email)
    .bind(&ticket.title)
    .bind(&ticket.description)
    .bind(status.as_str())
    .bind(ticket.priority.as_str())
    .bind(&ticket.assigned_group)
    .bind(&created_at)
    .bind(&created_at)
    .execute(&mut **tx)
    .await?;
    let id = result.last_insert_rowid();

    for entry in history {
        sqlx::query(
            "INSERT INTO ticket_updates (ticket_id, author, comment, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(entry.author)
        .bind(entry.comment)
        .bind(entry.status.as_str())
        .bind(&created_at)
        .execute(&mut **tx)
        .await?;
    }

    Ok((id, ticket_number))
}

struct TicketRow {
    id: i64,
    ticket_number: String,
    requester_name: String,
    requester_email: String,
    title: String,
    description: String,
    status: TicketStatus,
    priority: Priority,
    assigned_group: String,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

fn timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .and_then(|raw| DateTime::parse_from_rfc3339(&raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}

fn row_to_ticket(row: &sqlx::sqlite::SqliteRow) -> Result<TicketRow, RepositoryError> {
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;
    let priority: String =
        row.try_get("priority").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(TicketRow {
        id: row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ticket_number: row
            .try_get("ticket_number")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        requester_name: row
            .try_get("requester_name")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        requester_email: row
            .try_get("requester_email")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        title: row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        description: row
            .try_get("description")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: status.parse().map_err(|e: deskvoice_core::domain::InvalidFieldValue| {
            RepositoryError::Decode(e.to_string())
        })?,
        priority: priority.parse().map_err(|e: deskvoice_core::domain::InvalidFieldValue| {
            RepositoryError::Decode(e.to_string())
        })?,
        assigned_group: row
            .try_get("assigned_group")
            .map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp(
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ),
        updated_at: parse_timestamp(
            row.try_get("updated_at").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ),
    })
}

fn row_to_history(row: &sqlx::sqlite::SqliteRow) -> Result<TicketHistoryEntry, RepositoryError> {
    let status: String =
        row.try_get("status").map_err(|e| RepositoryError::Decode(e.to_string()))?;

    Ok(TicketHistoryEntry {
        author: row.try_get("author").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        status: status.parse().map_err(|e: deskvoice_core::domain::InvalidFieldValue| {
            RepositoryError::Decode(e.to_string())
        })?,
        comment: row.try_get("comment").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        created_at: parse_timestamp(
            row.try_get("created_at").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        ),
    })
}
