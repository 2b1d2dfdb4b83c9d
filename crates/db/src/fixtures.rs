use chrono::Utc;
use serde::Serialize;
use tracing::info;

use deskvoice_core::domain::knowledge::NewKnowledgeArticle;
use deskvoice_core::domain::ticket::{NewTicket, Priority, TicketStatus, DEFAULT_UPDATE_AUTHOR};

use crate::connection::DbPool;
use crate::repositories::knowledge::insert_article;
use crate::repositories::ticket::{insert_ticket, HistorySeed};
use crate::repositories::{RepositoryError, BEGIN_WRITE};

pub const RUNBOOK_SOURCE: &str = "itsd-runbook";
pub const DUMMY_SOURCE: &str = "dummy-seed";
pub const DUMMY_REQUESTER_PREFIX: &str = "dummy.user";

struct ArticleSeed {
    title: &'static str,
    category: &'static str,
    tags: &'static str,
    content: &'static str,
}

struct TicketSeed {
    requester_name: &'static str,
    requester_email: &'static str,
    title: &'static str,
    description: &'static str,
    priority: Priority,
    assigned_group: &'static str,
    status: TicketStatus,
    updates: &'static [(&'static str, TicketStatus, &'static str)],
}

const RUNBOOK_ARTICLES: &[ArticleSeed] = &[
    ArticleSeed {
        title: "Reset MFA for Microsoft 365",
        category: "identity",
        tags: "mfa,microsoft,authenticator",
        content: "Open Entra admin center, search user, require re-register MFA, and instruct user to re-pair Microsoft Authenticator app.",
    },
    ArticleSeed {
        title: "VPN not connecting",
        category: "network",
        tags: "vpn,network,remote",
        content: "Validate internet access, confirm certificate validity, re-enter VPN profile, and check endpoint posture agent status.",
    },
];

const DUMMY_ARTICLES: &[ArticleSeed] = &[
    ArticleSeed {
        title: "Outlook profile corruption fix",
        category: "email",
        tags: "outlook,email,profile",
        content: "Create a new Outlook profile from Control Panel Mail and set it as default.",
    },
    ArticleSeed {
        title: "Printer offline troubleshooting",
        category: "print",
        tags: "printer,spooler,offline",
        content: "Restart Print Spooler, verify queue is clear, and re-add printer using IP port.",
    },
    ArticleSeed {
        title: "Blue screen after update",
        category: "endpoint",
        tags: "bsod,windows,driver",
        content: "Boot into Safe Mode, roll back latest driver update, and run DISM + SFC.",
    },
];

const DUMMY_TICKETS: &[TicketSeed] = &[
    TicketSeed {
        requester_name: "Dummy User 1",
        requester_email: "dummy.user1@example.com",
        title: "VPN prompts for certificate every login",
        description: "User cannot connect to VPN consistently after password reset.",
        priority: Priority::High,
        assigned_group: "network-operations",
        status: TicketStatus::InProgress,
        updates: &[
            (DEFAULT_UPDATE_AUTHOR, TicketStatus::Open, "Ticket created via dummy seed"),
            (
                "netops.agent",
                TicketStatus::InProgress,
                "Collected VPN client logs and cert chain details",
            ),
        ],
    },
    TicketSeed {
        requester_name: "Dummy User 2",
        requester_email: "dummy.user2@example.com",
        title: "Cannot print to finance floor printer",
        description: "Printer appears offline for one workstation only.",
        priority: Priority::Medium,
        assigned_group: "eu-deskside",
        status: TicketStatus::Open,
        updates: &[(DEFAULT_UPDATE_AUTHOR, TicketStatus::Open, "Ticket created via dummy seed")],
    },
    TicketSeed {
        requester_name: "Dummy User 3",
        requester_email: "dummy.user3@example.com",
        title: "Outlook crashes when opening shared mailbox",
        description: "Crash observed after Office patching, impacts customer support queue.",
        priority: Priority::High,
        assigned_group: "messaging-team",
        status: TicketStatus::Resolved,
        updates: &[
            (DEFAULT_UPDATE_AUTHOR, TicketStatus::Open, "Ticket created via dummy seed"),
            (
                "messaging.agent",
                TicketStatus::InProgress,
                "Reproduced issue and rebuilt user profile",
            ),
            (
                "messaging.agent",
                TicketStatus::Resolved,
                "Applied hotfix and confirmed stable behavior",
            ),
        ],
    },
];

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SeedSummary {
    pub knowledge_created: usize,
    pub tickets_created: usize,
    pub note: String,
}

impl ArticleSeed {
    fn to_article(&self, source: &str) -> NewKnowledgeArticle {
        NewKnowledgeArticle {
            title: self.title.to_string(),
            category: self.category.to_string(),
            content: self.content.to_string(),
            tags: self.tags.to_string(),
            source: source.to_string(),
        }
    }
}

/// Inserts the runbook articles when the knowledge table is empty.
/// Returns how many rows were written.
pub async fn seed_knowledge(pool: &DbPool) -> Result<usize, RepositoryError> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;
    let existing: Option<i64> = sqlx::query_scalar("SELECT id FROM knowledge_articles LIMIT 1")
        .fetch_optional(&mut *tx)
        .await?;
    if existing.is_some() {
        return Ok(0);
    }

    let now = Utc::now();
    for seed in RUNBOOK_ARTICLES {
        insert_article(&mut *tx, &seed.to_article(RUNBOOK_SOURCE), now).await?;
    }
    tx.commit().await?;

    info!(
        event_name = "db.seed.knowledge",
        correlation_id = "bootstrap",
        articles = RUNBOOK_ARTICLES.len(),
        "runbook knowledge seeded"
    );
    Ok(RUNBOOK_ARTICLES.len())
}

/// Inserts the demo articles and tickets, each group at most once.
pub async fn seed_dummy_data(pool: &DbPool) -> Result<SeedSummary, RepositoryError> {
    let mut tx = pool.begin_with(BEGIN_WRITE).await?;

    let existing_articles: Option<i64> =
        sqlx::query_scalar("SELECT id FROM knowledge_articles WHERE source = ? LIMIT 1")
            .bind(DUMMY_SOURCE)
            .fetch_optional(&mut *tx)
            .await?;
    let existing_tickets: Option<i64> =
        sqlx::query_scalar("SELECT id FROM tickets WHERE requester_email LIKE ? LIMIT 1")
            .bind(format!("{DUMMY_REQUESTER_PREFIX}%@example.com"))
            .fetch_optional(&mut *tx)
            .await?;

    let now = Utc::now();
    let mut knowledge_created = 0;
    let mut tickets_created = 0;

    if existing_articles.is_none() {
        for seed in DUMMY_ARTICLES {
            insert_article(&mut *tx, &seed.to_article(DUMMY_SOURCE), now).await?;
            knowledge_created += 1;
        }
    }

    if existing_tickets.is_none() {
        for seed in DUMMY_TICKETS {
            let ticket = NewTicket {
                requester_name: seed.requester_name.to_string(),
                requester_email: seed.requester_email.to_string(),
                title: seed.title.to_string(),
                description: seed.description.to_string(),
                priority: seed.priority,
                assigned_group: seed.assigned_group.to_string(),
            };
            let history: Vec<HistorySeed<'_>> = seed
                .updates
                .iter()
                .map(|(author, status, comment)| HistorySeed { author, status: *status, comment })
                .collect();
            insert_ticket(&mut tx, &ticket, seed.status, &history, now).await?;
            tickets_created += 1;
        }
    }

    tx.commit().await?;

    info!(
        event_name = "db.seed.dummy",
        knowledge_created,
        tickets_created,
        "dummy data seeding finished"
    );

    Ok(SeedSummary {
        knowledge_created,
        tickets_created,
        note: "Dummy data inserted only if not already present.".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use deskvoice_core::domain::ticket::TicketStatus;
    use deskvoice_core::{ServiceDesk, TicketReference};

    use super::{seed_dummy_data, seed_knowledge};
    use crate::{connect_with_settings, migrations, SqlServiceDesk};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn seed_knowledge_only_fills_an_empty_table() {
        let pool = setup().await;

        assert_eq!(seed_knowledge(&pool).await.expect("first seed"), 2);
        assert_eq!(seed_knowledge(&pool).await.expect("second seed"), 0);

        let desk = SqlServiceDesk::new(pool);
        let result = desk.search_knowledge("vpn").await.expect("search");
        assert_eq!(result.top().map(|top| top.title.as_str()), Some("VPN not connecting"));
    }

    #[tokio::test]
    async fn dummy_seed_is_idempotent() {
        let pool = setup().await;

        let first = seed_dummy_data(&pool).await.expect("first seed");
        assert_eq!(first.knowledge_created, 3);
        assert_eq!(first.tickets_created, 3);

        let second = seed_dummy_data(&pool).await.expect("second seed");
        assert_eq!(second.knowledge_created, 0);
        assert_eq!(second.tickets_created, 0);
    }

    #[tokio::test]
    async fn dummy_tickets_carry_their_histories() {
        let pool = setup().await;
        seed_dummy_data(&pool).await.expect("seed");
        let desk = SqlServiceDesk::new(pool);

        let third = desk.get_ticket_details(&TicketReference::Id(3)).await.expect("ticket 3");
        assert_eq!(third.status, TicketStatus::Resolved);
        assert_eq!(third.assigned_group, "messaging-team");
        let statuses: Vec<TicketStatus> = third.updates.iter().map(|entry| entry.status).collect();
        assert_eq!(
            statuses,
            [TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Resolved]
        );
        assert!(third.formatted_number.ends_with("-0003"));
    }
}
