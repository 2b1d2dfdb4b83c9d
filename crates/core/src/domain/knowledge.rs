use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeMatch {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub content: String,
    pub source: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeSearchResult {
    pub query: String,
    pub matches: Vec<KnowledgeMatch>,
}

impl KnowledgeSearchResult {
    pub fn top(&self) -> Option<&KnowledgeMatch> {
        self.matches.first()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewKnowledgeArticle {
    pub title: String,
    pub category: String,
    pub content: String,
    pub tags: String,
    pub source: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeArticleSummary {
    pub id: i64,
    pub title: String,
    pub category: String,
    pub source: String,
}
