//! JSON routes over the service desk and the text assistant.
//!
//! Request bodies are decoded with the same argument types the realtime tools
//! use, so validation messages match across both surfaces.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use deskvoice_agent::{AssistantRuntime, ResultEnvelope};
use deskvoice_core::args::{
    decode_args, CreateTicketArgs, SearchKnowledgeArgs, TicketLookupArgs, UpdateTicketArgs,
    MIN_QUERY_CHARS,
};
use deskvoice_core::domain::knowledge::{
    KnowledgeArticleSummary, KnowledgeSearchResult, NewKnowledgeArticle,
};
use deskvoice_core::domain::ticket::{CreatedTicket, TicketDetails, TicketSummary, UpdatedTicket};
use deskvoice_core::{OperationError, ServiceDesk};
use deskvoice_db::{seed_dummy_data, DbPool, SeedSummary, SqlServiceDesk};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::warn;

const MANUAL_SOURCE: &str = "manual";

#[derive(Clone)]
pub struct ApiState {
    db_pool: DbPool,
    desk: Arc<SqlServiceDesk>,
    assistant: AssistantRuntime,
}

impl ApiState {
    pub fn new(db_pool: DbPool, desk: Arc<SqlServiceDesk>, assistant: AssistantRuntime) -> Self {
        Self { db_pool, desk, assistant }
    }
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/knowledge/search", post(search_knowledge))
        .route("/knowledge/articles", post(create_knowledge_article))
        .route("/tickets", post(create_ticket))
        .route("/tickets/status", post(ticket_status))
        .route("/tickets/details", post(ticket_details))
        .route("/tickets/update", post(update_ticket))
        .route("/seed/dummy", post(seed_dummy))
        .route("/assistant/respond", post(assistant_respond))
        .with_state(state)
}

/// An [`OperationError`] rendered as `{"error": ...}` with a matching status.
#[derive(Debug)]
pub struct ApiError(OperationError);

impl From<OperationError> for ApiError {
    fn from(error: OperationError) -> Self {
        Self(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0 {
            OperationError::TicketNotFound { .. } => StatusCode::NOT_FOUND,
            OperationError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            OperationError::Storage(_) => StatusCode::SERVICE_UNAVAILABLE,
            OperationError::Timeout { .. } | OperationError::Execution(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        warn!(
            event_name = "api.request.failed",
            error_class = self.0.error_class(),
            status = status.as_u16(),
            error = %self.0,
            "request failed"
        );
        (status, Json(self.0.to_output())).into_response()
    }
}

type ApiResult<T> = Result<Json<T>, ApiError>;

#[derive(Debug, Deserialize)]
pub struct KnowledgeArticleInput {
    pub title: String,
    pub category: String,
    pub content: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default)]
    pub source: Option<String>,
}

impl KnowledgeArticleInput {
    fn validate(self) -> Result<NewKnowledgeArticle, OperationError> {
        for (field, value) in
            [("title", &self.title), ("category", &self.category), ("content", &self.content)]
        {
            if value.trim().is_empty() {
                return Err(OperationError::Validation(format!("{field} must not be empty")));
            }
        }

        Ok(NewKnowledgeArticle {
            title: self.title,
            category: self.category,
            content: self.content,
            tags: self.tags,
            source: self
                .source
                .filter(|source| !source.trim().is_empty())
                .unwrap_or_else(|| MANUAL_SOURCE.to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AssistantUtteranceInput {
    pub utterance: String,
}

async fn search_knowledge(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<KnowledgeSearchResult> {
    let query = decode_args::<SearchKnowledgeArgs>("search_knowledge", body)?.validate()?;
    Ok(Json(state.desk.search_knowledge(&query).await?))
}

async fn create_knowledge_article(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<KnowledgeArticleSummary>), ApiError> {
    let article = decode_args::<KnowledgeArticleInput>("create_knowledge_article", body)?.validate()?;
    let created = state.desk.create_knowledge_article(article).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn create_ticket(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<(StatusCode, Json<CreatedTicket>), ApiError> {
    let ticket = decode_args::<CreateTicketArgs>("create_ticket", body)?.validate()?;
    let created = state.desk.create_ticket(ticket).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn ticket_status(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<TicketSummary> {
    let reference = decode_args::<TicketLookupArgs>("get_ticket_status", body)?.validate()?;
    Ok(Json(state.desk.get_ticket_status(&reference).await?))
}

async fn ticket_details(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<TicketDetails> {
    let reference = decode_args::<TicketLookupArgs>("get_ticket_details", body)?.validate()?;
    Ok(Json(state.desk.get_ticket_details(&reference).await?))
}

async fn update_ticket(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<UpdatedTicket> {
    let update = decode_args::<UpdateTicketArgs>("update_ticket", body)?.validate()?;
    Ok(Json(state.desk.update_ticket(update).await?))
}

async fn seed_dummy(State(state): State<ApiState>) -> ApiResult<SeedSummary> {
    let summary = seed_dummy_data(&state.db_pool).await.map_err(OperationError::from)?;
    Ok(Json(summary))
}

async fn assistant_respond(
    State(state): State<ApiState>,
    Json(body): Json<Map<String, Value>>,
) -> ApiResult<ResultEnvelope> {
    let input = decode_args::<AssistantUtteranceInput>("assistant_respond", body)?;
    if input.utterance.trim().chars().count() < MIN_QUERY_CHARS {
        return Err(OperationError::Validation(format!(
            "utterance must be at least {MIN_QUERY_CHARS} characters"
        ))
        .into());
    }
    Ok(Json(state.assistant.handle_assistant_utterance(&input.utterance).await))
}

/// Body for unmatched paths, mirroring the error shape of the other routes.
pub async fn fallback() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "route not found" })))
}
