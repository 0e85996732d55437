pub mod normalize;
pub mod rss;
pub mod types;

use crate::config::Source;
use crate::store::Article;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// Default deadline for one refresh across all sources.
pub const REFRESH_DEADLINE: Duration = Duration::from_secs(30);

#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, source: &Source) -> Result<Vec<Article>>;
}

/// Articles from every source that succeeded plus one message per failure.
#[derive(Debug, Default)]
pub struct FetchResult {
    pub articles: Vec<Article>,
    pub errors: Vec<String>,
}

/// Fetch all sources concurrently under one shared deadline. A failing or
/// slow source only contributes an error; it never affects its siblings.
pub async fn fetch_all(
    fetcher: Arc<dyn FeedFetcher>,
    sources: &[Source],
    deadline: Duration,
) -> FetchResult {
    let result = Arc::new(Mutex::new(FetchResult::default()));
    let deadline_at = Instant::now() + deadline;

    let mut handles = Vec::with_capacity(sources.len());
    for source in sources.iter().cloned() {
        let fetcher = fetcher.clone();
        let result = result.clone();
        handles.push(tokio::spawn(async move {
            let outcome = tokio::time::timeout_at(deadline_at, fetcher.fetch(&source)).await;
            let mut acc = match result.lock() {
                Ok(acc) => acc,
                Err(poisoned) => poisoned.into_inner(),
            };
            match outcome {
                Ok(Ok(articles)) => {
                    tracing::debug!(source = %source.name, count = articles.len(), "source fetched");
                    acc.articles.extend(articles);
                }
                Ok(Err(e)) => {
                    tracing::warn!(source = %source.name, error = %e, "source fetch failed");
                    acc.errors.push(format!("fetching {}: {:#}", source.name, e));
                }
                Err(_) => {
                    tracing::warn!(source = %source.name, "source fetch timed out");
                    acc.errors.push(format!("fetching {}: timed out", source.name));
                }
            }
        }));
    }

    for handle in handles {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "fetch task panicked");
            let mut acc = match result.lock() {
                Ok(acc) => acc,
                Err(poisoned) => poisoned.into_inner(),
            };
            acc.errors.push(format!("fetch task failed: {}", e));
        }
    }

    match Arc::try_unwrap(result) {
        Ok(mutex) => mutex.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner()),
        Err(shared) => {
            let mut acc = match shared.lock() {
                Ok(acc) => acc,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *acc)
        }
    }
}
