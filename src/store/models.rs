use crate::engine::classify::Category;
use chrono::{DateTime, Utc};

/// A normalized feed item. `id` is derived from `link` and never changes.
#[derive(Debug, Clone, PartialEq)]
pub struct Article {
    pub id: String,
    pub source: String,
    pub title: String,
    pub link: String,
    pub description: String,
    pub published: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    /// AI summary, empty when none has been generated.
    pub summary: String,
    /// Comma-separated tags, empty when none.
    pub tags: String,
    pub signal_score: f64,
    pub category: Category,
    pub why_it_matters: String,
}

impl Article {
    pub fn new(
        source: &str,
        title: &str,
        link: &str,
        description: &str,
        published: DateTime<Utc>,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: crate::feed::normalize::article_id(link),
            source: source.to_string(),
            title: title.to_string(),
            link: link.to_string(),
            description: description.to_string(),
            published,
            fetched_at,
            summary: String::new(),
            tags: String::new(),
            signal_score: 0.0,
            category: Category::Platform,
            why_it_matters: String::new(),
        }
    }

    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderBy {
    #[default]
    Published,
    Signal,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOpts {
    /// Inclusive lower bound on publish time.
    pub since: Option<DateTime<Utc>>,
    /// Restrict to these sources; empty means all.
    pub sources: Vec<String>,
    /// Substring match on title or description.
    pub search: String,
    pub category: Option<Category>,
    /// Defaults to 500 when unset.
    pub limit: Option<usize>,
    pub order_by: OrderBy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub articles: u64,
    pub size_bytes: u64,
}
