use super::message::{Command, Message};
use crate::ai::{Summarizer, CALL_DEADLINE};
use crate::config::Source;
use crate::engine::briefing::{self, BriefingConfig};
use crate::feed::{fetch_all, FeedFetcher, REFRESH_DEADLINE};
use crate::store::Store;
use crate::{browser, update};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Collaborators the session's side effects run against.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<Store>,
    pub fetcher: Arc<dyn FeedFetcher>,
    pub sources: Vec<Source>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
    pub briefing: BriefingConfig,
    pub refresh_deadline: Duration,
    /// Skip the release check (tests, offline use).
    pub check_updates: bool,
}

impl Services {
    pub fn new(
        store: Arc<Store>,
        fetcher: Arc<dyn FeedFetcher>,
        sources: Vec<Source>,
        summarizer: Option<Arc<dyn Summarizer>>,
    ) -> Self {
        Self {
            store,
            fetcher,
            sources,
            summarizer,
            briefing: BriefingConfig::default(),
            refresh_deadline: REFRESH_DEADLINE,
            check_updates: true,
        }
    }
}

/// Runs `Command`s as tokio tasks and reports each outcome as a `Message`.
/// Store calls go through `spawn_blocking`.
pub struct Executor {
    services: Services,
    tx: UnboundedSender<Message>,
}

impl Executor {
    pub fn new(services: Services, tx: UnboundedSender<Message>) -> Self {
        Self { services, tx }
    }

    pub fn dispatch(&self, cmd: Command) {
        let svc = self.services.clone();
        let tx = self.tx.clone();
        match cmd {
            Command::LoadArticles { generation, query } => {
                tokio::spawn(async move {
                    let store = svc.store.clone();
                    let msg = match blocking(move || store.query(&query)).await {
                        Ok(articles) => Message::ArticlesLoaded {
                            generation,
                            articles,
                        },
                        Err(e) => {
                            tracing::error!(error = %e, "loading articles failed");
                            Message::LoadFailed {
                                generation,
                                error: format!("{:#}", e),
                            }
                        }
                    };
                    let _ = tx.send(msg);
                });
            }
            Command::Refresh => {
                tokio::spawn(async move {
                    let _ = tx.send(refresh(svc).await);
                });
            }
            Command::GenerateBriefing { generation } => {
                tokio::spawn(async move {
                    let store = svc.store.clone();
                    let opts = svc.briefing.options(Utc::now());
                    let result = blocking(move || briefing::generate(&store, &opts))
                        .await
                        .map_err(|e| {
                            tracing::error!(error = %e, "briefing generation failed");
                            format!("briefing failed: {:#}", e)
                        });
                    let _ = tx.send(Message::BriefingLoaded {
                        generation,
                        briefing: result,
                    });
                });
            }
            Command::Summarize {
                article_id,
                title,
                description,
            } => {
                let Some(summarizer) = svc.summarizer.clone() else {
                    return;
                };
                tokio::spawn(async move {
                    let summary = with_deadline("summarize", summarizer.summarize(&title, &description)).await;
                    let _ = tx.send(Message::SummaryLoaded {
                        article_id,
                        summary,
                    });
                });
            }
            Command::PersistSummary {
                article_id,
                summary,
            } => {
                tokio::spawn(async move {
                    let store = svc.store.clone();
                    let id = article_id.clone();
                    if let Err(e) =
                        blocking(move || store.update_summary(&id, &summary.text, &summary.tags)).await
                    {
                        tracing::warn!(id = %article_id, error = %e, "could not persist summary");
                    }
                });
            }
            Command::Annotate {
                card_index,
                article_id,
                title,
                description,
            } => {
                let Some(summarizer) = svc.summarizer.clone() else {
                    return;
                };
                tokio::spawn(async move {
                    let text = with_deadline(
                        "why_it_matters",
                        summarizer.why_it_matters(&title, &description),
                    )
                    .await
                    .filter(|t| !t.is_empty());
                    if let Some(text) = &text {
                        let store = svc.store.clone();
                        let (id, text) = (article_id.clone(), text.clone());
                        if let Err(e) = blocking(move || store.update_annotation(&id, &text)).await {
                            tracing::warn!(id = %article_id, error = %e, "could not persist annotation");
                        }
                    }
                    let _ = tx.send(Message::AnnotationLoaded {
                        card_index,
                        article_id,
                        text,
                    });
                });
            }
            Command::Themes(inputs) => {
                let Some(summarizer) = svc.summarizer.clone() else {
                    return;
                };
                tokio::spawn(async move {
                    if let Some(themes) = with_deadline("themes", summarizer.themes(&inputs)).await {
                        let _ = tx.send(Message::ThemesLoaded(themes));
                    }
                });
            }
            Command::OpenUrl(url) => {
                tokio::spawn(async move {
                    let outcome = tokio::task::spawn_blocking(move || browser::open(&url)).await;
                    let error = match outcome {
                        Ok(Ok(())) => return,
                        Ok(Err(e)) => format!("{:#}", e),
                        Err(e) => format!("browser task failed: {}", e),
                    };
                    let _ = tx.send(Message::ActionFailed(error));
                });
            }
            Command::CheckUpdate => {
                if !svc.check_updates {
                    return;
                }
                tokio::spawn(async move {
                    if let Some(version) = update::check(env!("CARGO_PKG_VERSION")).await {
                        tracing::info!(version = %version, "update available");
                        let _ = tx.send(Message::UpdateAvailable(version));
                    }
                });
            }
        }
    }
}

/// Fetch every source, then upsert and stamp the refresh time.
async fn refresh(svc: Services) -> Message {
    let result = fetch_all(svc.fetcher.clone(), &svc.sources, svc.refresh_deadline).await;
    let warnings = result.errors;
    let articles = result.articles;
    let store = svc.store.clone();
    let outcome = blocking(move || {
        let count = store.upsert(&articles)?;
        store.set_last_refresh()?;
        Ok(count)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "refresh failed");
        format!("refresh failed: {:#}", e)
    });
    if let Ok(count) = &outcome {
        tracing::info!(count, warnings = warnings.len(), "refresh complete");
    }
    Message::RefreshDone { outcome, warnings }
}

async fn blocking<T, F>(f: F) -> anyhow::Result<T>
where
    F: FnOnce() -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| anyhow::anyhow!("store task failed: {}", e))?
}

/// Run an enrichment call under `CALL_DEADLINE`. Failures are logged and
/// reported as `None`.
async fn with_deadline<T>(op: &str, fut: impl Future<Output = anyhow::Result<T>>) -> Option<T> {
    match tokio::time::timeout(CALL_DEADLINE, fut).await {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            tracing::debug!(op, error = %e, "enrichment call failed");
            None
        }
        Err(_) => {
            tracing::debug!(op, "enrichment call timed out");
            None
        }
    }
}
