//! `GET /health`: readiness of the ticket store and the knowledge base.
//!
//! Both stores are counted on every request. A failing count marks that store
//! unavailable and the whole desk degraded, answered with 503.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::{DateTime, Utc};
use deskvoice_db::DbPool;
use serde::Serialize;
use tracing::warn;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Readiness {
    Ready,
    Degraded,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StoreStatus {
    pub readiness: Readiness,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct DeskHealth {
    pub readiness: Readiness,
    pub tickets: StoreStatus,
    pub knowledge: StoreStatus,
    pub checked_at: DateTime<Utc>,
}

pub fn router(db_pool: DbPool) -> Router {
    Router::new().route("/health", get(desk_health)).with_state(db_pool)
}

async fn desk_health(State(pool): State<DbPool>) -> (StatusCode, Json<DeskHealth>) {
    let tickets = count_rows(&pool, "SELECT COUNT(*) FROM tickets").await;
    let knowledge = count_rows(&pool, "SELECT COUNT(*) FROM knowledge_articles").await;

    let readiness = if tickets.readiness == Readiness::Ready && knowledge.readiness == Readiness::Ready {
        Readiness::Ready
    } else {
        Readiness::Degraded
    };
    let status = match readiness {
        Readiness::Ready => StatusCode::OK,
        Readiness::Degraded => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status, Json(DeskHealth { readiness, tickets, knowledge, checked_at: Utc::now() }))
}

async fn count_rows(pool: &DbPool, statement: &'static str) -> StoreStatus {
    match sqlx::query_scalar::<_, i64>(statement).fetch_one(pool).await {
        Ok(rows) => StoreStatus { readiness: Readiness::Ready, rows: Some(rows), error: None },
        Err(error) => {
            warn!(
                event_name = "system.health.degraded",
                correlation_id = "health",
                statement,
                error = %error,
                "store count failed"
            );
            StoreStatus { readiness: Readiness::Degraded, rows: None, error: Some(error.to_string()) }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use deskvoice_db::{connect_with_settings, migrations, seed_knowledge, DbPool};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::router;

    async fn get_health(pool: DbPool) -> (StatusCode, Value) {
        let response = router(pool)
            .oneshot(Request::builder().uri("/health").body(Body::empty()).expect("request"))
            .await
            .expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        (status, serde_json::from_slice(&bytes).expect("json body"))
    }

    #[tokio::test]
    async fn seeded_desk_reports_row_counts() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        seed_knowledge(&pool).await.expect("seed knowledge");

        let (status, body) = get_health(pool.clone()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["readiness"], "ready");
        assert_eq!(body["tickets"]["rows"], 0);
        assert_eq!(body["knowledge"]["rows"], 2);
        assert!(body["tickets"].get("error").is_none());
        assert!(body["checked_at"].is_string());

        pool.close().await;
    }

    #[tokio::test]
    async fn unmigrated_database_is_unavailable() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");

        let (status, body) = get_health(pool.clone()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["readiness"], "degraded");
        assert_eq!(body["tickets"]["readiness"], "degraded");
        assert!(body["knowledge"]["error"].as_str().unwrap_or_default().contains("no such table"));

        pool.close().await;
    }

    #[tokio::test]
    async fn closed_pool_degrades_both_stores() {
        let pool = connect_with_settings("sqlite::memory:", 1, 5).await.expect("connect");
        pool.close().await;

        let (status, body) = get_health(pool).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["tickets"]["readiness"], "degraded");
        assert_eq!(body["knowledge"]["readiness"], "degraded");
        assert!(body["tickets"].get("rows").is_none());
    }
}
