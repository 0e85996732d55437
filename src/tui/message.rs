use crate::ai::{Summary, ThemeInput};
use crate::engine::briefing::Briefing;
use crate::store::{Article, QueryOpts};
use crossterm::event::KeyEvent;

/// Inputs to `App::update`: terminal keys, the spinner tick, and the
/// completions of work dispatched through `Command`s.
#[derive(Debug, Clone)]
pub enum Message {
    Key(KeyEvent),
    Tick,
    ArticlesLoaded {
        generation: u64,
        articles: Vec<Article>,
    },
    LoadFailed {
        generation: u64,
        error: String,
    },
    RefreshDone {
        /// Articles written, or the error that stopped the refresh.
        outcome: Result<usize, String>,
        warnings: Vec<String>,
    },
    BriefingLoaded {
        generation: u64,
        briefing: Result<Briefing, String>,
    },
    SummaryLoaded {
        article_id: String,
        summary: Option<Summary>,
    },
    AnnotationLoaded {
        card_index: usize,
        article_id: String,
        text: Option<String>,
    },
    ThemesLoaded(Vec<String>),
    UpdateAvailable(String),
    ActionFailed(String),
}

/// Side effects requested by `App::update`. Each runs off the event loop
/// and reports back with a `Message`.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadArticles {
        generation: u64,
        query: QueryOpts,
    },
    Refresh,
    GenerateBriefing {
        generation: u64,
    },
    Summarize {
        article_id: String,
        title: String,
        description: String,
    },
    PersistSummary {
        article_id: String,
        summary: Summary,
    },
    Annotate {
        card_index: usize,
        article_id: String,
        title: String,
        description: String,
    },
    Themes(Vec<ThemeInput>),
    OpenUrl(String),
    CheckUpdate,
}
