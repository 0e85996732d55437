use super::classify::{classify, Category};
use super::signal::{score_with_breakdown, Breakdown, ScoreInput, SourceWeights};
use super::trending::trending_terms;
use crate::config::DEFAULT_BRIEF_SIZE;
use crate::store::{Article, Store};
use anyhow::{Context, Result};
use chrono::{DateTime, Local, Utc};
use std::collections::HashMap;

const EXCERPT_MIN_SENTENCE_BYTES: usize = 20;
const EXCERPT_MAX_CHARS: usize = 150;
const ACTIVE_SOURCES_SHOWN: usize = 3;

/// Briefing window when no explicit start is configured.
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Session-wide briefing settings. Each build derives its own
/// `BriefingOptions`, so a rolling window always ends at build time.
#[derive(Debug, Clone, Default)]
pub struct BriefingConfig {
    /// Fixed window start; `None` means the last `DEFAULT_WINDOW_HOURS`.
    pub since: Option<DateTime<Utc>>,
    pub brief_size: usize,
    pub focus: Option<Category>,
    pub source_weights: SourceWeights,
}

impl BriefingConfig {
    pub fn options(&self, now: DateTime<Utc>) -> BriefingOptions {
        BriefingOptions {
            since: self
                .since
                .unwrap_or_else(|| now - chrono::Duration::hours(DEFAULT_WINDOW_HOURS)),
            brief_size: self.brief_size,
            focus: self.focus,
            source_weights: self.source_weights.clone(),
            themes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BriefingOptions {
    /// Window start; articles published before it are not considered.
    pub since: DateTime<Utc>,
    /// Zero falls back to the default of 5.
    pub brief_size: usize,
    pub focus: Option<Category>,
    pub source_weights: SourceWeights,
    /// Themes supplied by the caller. When empty, trending title terms are
    /// used instead.
    pub themes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub article: Article,
    /// 1-based position in the briefing.
    pub index: usize,
    pub reading_time: usize,
    pub breakdown: Breakdown,
    /// False while `article.why_it_matters` is only the description excerpt.
    pub has_annotation: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Briefing {
    pub date_label: String,
    pub scanned: usize,
    pub selected: usize,
    pub themes: Vec<String>,
    pub cards: Vec<Card>,
    pub focus: Option<Category>,
    /// Busiest sources in the window, e.g. "Netflix (4), Stripe (2)".
    pub active_sources: String,
}

/// Build the briefing from the store. Scores and categories are written
/// back best-effort; a failed write is logged and does not abort.
pub fn generate(store: &Store, opts: &BriefingOptions) -> Result<Briefing> {
    let articles = store
        .articles_since(opts.since)
        .context("fetching articles for briefing")?;

    let corpus = if opts.themes.is_empty() && !articles.is_empty() {
        store.all_articles().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not load corpus for trending terms");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let briefing = assemble(articles, &corpus, opts, Utc::now(), |a| {
        if let Err(e) = store.update_score(&a.id, a.signal_score, a.category) {
            tracing::warn!(id = %a.id, error = %e, "could not persist score");
        }
    });
    tracing::info!(
        scanned = briefing.scanned,
        selected = briefing.selected,
        "briefing generated"
    );
    Ok(briefing)
}

/// Score, classify, rank, filter and cut `articles` into a briefing.
/// `persist` sees every article once, after scoring.
pub fn assemble<F>(
    articles: Vec<Article>,
    corpus: &[Article],
    opts: &BriefingOptions,
    now: DateTime<Utc>,
    mut persist: F,
) -> Briefing
where
    F: FnMut(&Article),
{
    let brief_size = if opts.brief_size == 0 {
        DEFAULT_BRIEF_SIZE
    } else {
        opts.brief_size
    };

    let mut briefing = Briefing {
        date_label: now.with_timezone(&Local).format("%b %-d").to_string(),
        scanned: articles.len(),
        focus: opts.focus,
        active_sources: active_sources(&articles),
        ..Briefing::default()
    };

    let mut scored: Vec<(Article, Breakdown)> = articles
        .into_iter()
        .map(|mut a| {
            let breakdown = score_with_breakdown(
                &ScoreInput {
                    title: &a.title,
                    description: &a.description,
                    source: &a.source,
                    published: Some(a.published),
                },
                &opts.source_weights,
                now,
            );
            a.signal_score = breakdown.final_score;
            a.category = classify(&a.title, &a.description);
            persist(&a);
            (a, breakdown)
        })
        .collect();

    // Stable: equal scores keep their retrieval order.
    scored.sort_by(|a, b| b.0.signal_score.total_cmp(&a.0.signal_score));

    if let Some(focus) = opts.focus {
        scored.retain(|(a, _)| a.category == focus);
    }
    scored.truncate(brief_size);

    briefing.selected = scored.len();
    briefing.cards = scored
        .into_iter()
        .enumerate()
        .map(|(i, (mut article, breakdown))| {
            let has_annotation = !article.why_it_matters.is_empty();
            if !has_annotation {
                article.why_it_matters = description_excerpt(&article.description);
            }
            Card {
                index: i + 1,
                reading_time: reading_time(&article.description),
                article,
                breakdown,
                has_annotation,
            }
        })
        .collect();

    briefing.themes = if opts.themes.is_empty() {
        let selected: Vec<Article> = briefing.cards.iter().map(|c| c.article.clone()).collect();
        trending_terms(&selected, corpus)
    } else {
        opts.themes.clone()
    };

    briefing
}

/// First sentence when it ends past byte 20, otherwise a 150-char cut.
pub fn description_excerpt(desc: &str) -> String {
    if let Some((i, _)) = desc
        .char_indices()
        .find(|(i, c)| *c == '.' && *i > EXCERPT_MIN_SENTENCE_BYTES)
    {
        return desc[..=i].to_string();
    }
    if desc.chars().count() > EXCERPT_MAX_CHARS {
        let head: String = desc.chars().take(EXCERPT_MAX_CHARS).collect();
        return format!("{}...", head);
    }
    desc.to_string()
}

/// Minutes to read the full post, estimated from the description at 3x
/// length and 200 wpm.
pub fn reading_time(desc: &str) -> usize {
    (desc.split_whitespace().count() * 3 / 200).max(1)
}

pub fn greeting(hour: u32) -> &'static str {
    match hour {
        0..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    }
}

fn active_sources(articles: &[Article]) -> String {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for a in articles {
        *counts.entry(a.source.as_str()).or_insert(0) += 1;
    }
    let mut sorted: Vec<(&str, usize)> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    sorted
        .into_iter()
        .take(ACTIVE_SOURCES_SHOWN)
        .map(|(name, count)| format!("{} ({})", name, count))
        .collect::<Vec<_>>()
        .join(", ")
}
