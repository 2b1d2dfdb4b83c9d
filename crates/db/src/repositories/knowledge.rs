use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use deskvoice_core::domain::knowledge::{
    KnowledgeArticleSummary, KnowledgeMatch, NewKnowledgeArticle,
};

use super::RepositoryError;
use crate::DbPool;

pub const SEARCH_LIMIT: i64 = 5;

pub struct SqlKnowledgeRepository {
    pool: DbPool,
}

impl SqlKnowledgeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Case-insensitive substring match over title, content, tags and category.
    pub async fn search(&self, query: &str) -> Result<Vec<KnowledgeMatch>, RepositoryError> {
        // query and columns are folded by the same sqlite lower()
        let pattern = format!("%{}%", escape_like(query.trim()));

        let rows = sqlx::query(
            "SELECT id, title, category, content, source
             FROM knowledge_articles
             WHERE lower(title) LIKE lower(?1) ESCAPE '\\'
                OR lower(content) LIKE lower(?1) ESCAPE '\\'
                OR lower(tags) LIKE lower(?1) ESCAPE '\\'
                OR lower(category) LIKE lower(?1) ESCAPE '\\'
             ORDER BY id ASC
             LIMIT ?2",
        )
        .bind(&pattern)
        .bind(SEARCH_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_match).collect::<Result<Vec<_>, _>>()
    }

    pub async fn create(
        &self,
        article: &NewKnowledgeArticle,
    ) -> Result<KnowledgeArticleSummary, RepositoryError> {
        let id = insert_article(&self.pool, article, Utc::now()).await?;

        Ok(KnowledgeArticleSummary {
            id,
            title: article.title.clone(),
            category: article.category.clone(),
            source: article.source.clone(),
        })
    }

    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM knowledge_articles")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn has_source(&self, source: &str) -> Result<bool, RepositoryError> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM knowledge_articles WHERE source = ? LIMIT 1")
                .bind(source)
                .fetch_optional(&self.pool)
                .await?;
        Ok(found.is_some())
    }
}

pub(crate) async fn insert_article<'e, E>(
    executor: E,
    article: &NewKnowledgeArticle,
    now: DateTime<Utc>,
) -> Result<i64, RepositoryError>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let result = sqlx::query(
        "INSERT INTO knowledge_articles (title, category, content, tags, source, created_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&article.title)
    .bind(&article.category)
    .bind(&article.content)
    .bind(&article.tags)
    .bind(&article.source)
    .bind(now.to_rfc3339_opts(SecondsFormat::Micros, true))
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

fn row_to_match(row: &sqlx::sqlite::SqliteRow) -> Result<KnowledgeMatch, RepositoryError> {
    Ok(KnowledgeMatch {
        id: row.try_get("id").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        title: row.try_get("title").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        category: row.try_get("category").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        content: row.try_get("content").map_err(|e| RepositoryError::Decode(e.to_string()))?,
        source: row.try_get("source").map_err(|e| RepositoryError::Decode(e.to_string()))?,
    })
}

fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
