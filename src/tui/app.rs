use super::filter::FilterBar;
use super::message::{Command, Message};
use crate::ai::ThemeInput;
use crate::engine::briefing::{Briefing, Card};
use crate::store::{Article, QueryOpts};
use chrono::{DateTime, Utc};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseMode {
    Normal,
    Searching,
    Filtering,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    Browsing(BrowseMode),
    BriefingIntro,
    BriefingCard,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    List,
    Preview,
}

/// Transient status line. Cleared by the next key press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Error(String),
}

#[derive(Debug, Clone, Default)]
pub struct AppOptions {
    pub start_in_browse: bool,
    pub sources: Vec<String>,
    pub streak: u32,
    /// Posts published since the previous session, when known.
    pub new_since_last_open: Option<usize>,
    pub has_summarizer: bool,
    /// Lower bound for browsed articles.
    pub since: Option<DateTime<Utc>>,
}

/// Session state. Mutated only through `update`.
#[derive(Debug)]
pub struct App {
    pub view: View,
    pub pane: Pane,
    pub articles: Vec<Article>,
    pub cursor: usize,
    pub preview_scroll: u16,
    pub search: String,
    pub filter: FilterBar,
    /// Built fresh on every entry into the briefing; dropped on exit and
    /// after a refresh.
    pub briefing: Option<Briefing>,
    pub card_index: usize,
    pub show_breakdown: bool,
    pub refreshing: bool,
    pub spinner_frame: usize,
    pub status: Option<Status>,
    pub streak: u32,
    pub new_since_last_open: Option<usize>,
    pub update_available: Option<String>,
    has_summarizer: bool,
    since: Option<DateTime<Utc>>,
    pending_summaries: HashSet<String>,
    load_generation: u64,
    briefing_generation: u64,
    /// Set while a briefing requested from home is being built.
    opening_briefing: bool,
    should_quit: bool,
}

impl App {
    pub fn new(opts: AppOptions) -> Self {
        Self {
            view: if opts.start_in_browse {
                View::Browsing(BrowseMode::Normal)
            } else {
                View::Home
            },
            pane: Pane::List,
            articles: Vec::new(),
            cursor: 0,
            preview_scroll: 0,
            search: String::new(),
            filter: FilterBar::new(opts.sources),
            briefing: None,
            card_index: 0,
            show_breakdown: false,
            refreshing: false,
            spinner_frame: 0,
            status: None,
            streak: opts.streak,
            new_since_last_open: opts.new_since_last_open,
            update_available: None,
            has_summarizer: opts.has_summarizer,
            since: opts.since,
            pending_summaries: HashSet::new(),
            load_generation: 0,
            briefing_generation: 0,
            opening_briefing: false,
            should_quit: false,
        }
    }

    /// Work to start once the loop is running.
    pub fn init(&mut self) -> Vec<Command> {
        let mut cmds = vec![Command::CheckUpdate];
        if matches!(self.view, View::Browsing(_)) {
            cmds.push(self.reload());
        }
        cmds
    }

    pub fn is_opening_briefing(&self) -> bool {
        self.opening_briefing
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn selected(&self) -> Option<&Article> {
        self.articles.get(self.cursor)
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.briefing.as_ref()?.cards.get(self.card_index)
    }

    pub fn update(&mut self, msg: Message) -> Vec<Command> {
        match msg {
            Message::Key(key) => self.on_key(key),
            Message::Tick => {
                if self.refreshing {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
                Vec::new()
            }
            Message::ArticlesLoaded {
                generation,
                articles,
            } => {
                if generation != self.load_generation {
                    tracing::debug!(generation, current = self.load_generation, "dropping stale load");
                    return Vec::new();
                }
                self.articles = articles;
                self.cursor = self.cursor.min(self.articles.len().saturating_sub(1));
                self.summarize_selected().into_iter().collect()
            }
            Message::LoadFailed { generation, error } => {
                if generation == self.load_generation {
                    self.status = Some(Status::Error(error));
                }
                Vec::new()
            }
            Message::RefreshDone { outcome, warnings } => {
                self.refreshing = false;
                self.status = Some(match outcome {
                    Ok(count) if warnings.is_empty() => {
                        Status::Info(format!("Refreshed {} articles", count))
                    }
                    Ok(count) => Status::Error(format!(
                        "Refreshed {} articles; {}",
                        count,
                        warnings.join("; ")
                    )),
                    Err(e) => Status::Error(e),
                });
                self.briefing = None;
                vec![self.reload()]
            }
            Message::BriefingLoaded {
                generation,
                briefing,
            } => {
                if generation != self.briefing_generation || !self.opening_briefing {
                    tracing::debug!(generation, "dropping unwanted briefing");
                    return Vec::new();
                }
                self.opening_briefing = false;
                match briefing {
                    Ok(b) if !b.cards.is_empty() => {
                        self.briefing = Some(b);
                        self.enter_intro()
                    }
                    Ok(_) => {
                        let cmds = self.enter_browse();
                        self.status = Some(Status::Info("Nothing new for a briefing yet".into()));
                        cmds
                    }
                    Err(e) => {
                        let cmds = self.enter_browse();
                        self.status = Some(Status::Error(e));
                        cmds
                    }
                }
            }
            Message::SummaryLoaded {
                article_id,
                summary,
            } => {
                self.pending_summaries.remove(&article_id);
                let summary = match summary.filter(|s| !s.text.is_empty()) {
                    Some(s) => s,
                    None => return Vec::new(),
                };
                if let Some(a) = self.articles.iter_mut().find(|a| a.id == article_id) {
                    a.summary = summary.text.clone();
                    a.tags = summary.tags.join(",");
                }
                vec![Command::PersistSummary {
                    article_id,
                    summary,
                }]
            }
            Message::AnnotationLoaded {
                card_index,
                article_id,
                text,
            } => {
                let text = match text.filter(|t| !t.is_empty()) {
                    Some(t) => t,
                    None => return Vec::new(),
                };
                if let Some(card) = self
                    .briefing
                    .as_mut()
                    .and_then(|b| b.cards.get_mut(card_index))
                    .filter(|c| c.article.id == article_id)
                {
                    card.article.why_it_matters = text;
                    card.has_annotation = true;
                }
                Vec::new()
            }
            Message::ThemesLoaded(themes) => {
                if let Some(b) = self.briefing.as_mut().filter(|_| !themes.is_empty()) {
                    b.themes = themes;
                }
                Vec::new()
            }
            Message::UpdateAvailable(version) => {
                self.update_available = Some(version);
                Vec::new()
            }
            Message::ActionFailed(error) => {
                self.status = Some(Status::Error(error));
                Vec::new()
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Vec<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }
        self.status = None;

        match self.view {
            View::Home => self.on_home_key(key),
            View::BriefingIntro => self.on_intro_key(key),
            View::BriefingCard => self.on_card_key(key),
            View::Browsing(BrowseMode::Normal) => self.on_browse_key(key),
            View::Browsing(BrowseMode::Searching) => self.on_search_key(key),
            View::Browsing(BrowseMode::Filtering) => self.on_filter_key(key),
            View::Browsing(BrowseMode::Help) => {
                if matches!(key.code, KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc) {
                    self.view = View::Browsing(BrowseMode::Normal);
                }
                Vec::new()
            }
        }
    }

    fn on_home_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Char('b') | KeyCode::Char('1') => self.open_briefing(),
            KeyCode::Char('e') | KeyCode::Char('2') => self.enter_browse(),
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_intro_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Enter => {
                self.view = View::BriefingCard;
                self.card_index = 0;
                self.show_breakdown = false;
                Vec::new()
            }
            KeyCode::Char('e') => self.leave_briefing(View::Browsing(BrowseMode::Normal)),
            KeyCode::Char('h') => self.leave_briefing(View::Home),
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_card_key(&mut self, key: KeyEvent) -> Vec<Command> {
        let total = self.briefing.as_ref().map_or(0, |b| b.cards.len());
        match key.code {
            KeyCode::Char('n') | KeyCode::Char('j') | KeyCode::Right => {
                if self.card_index + 1 < total {
                    self.card_index += 1;
                    self.show_breakdown = false;
                }
                Vec::new()
            }
            KeyCode::Char('p') | KeyCode::Char('k') | KeyCode::Left => {
                if self.card_index > 0 {
                    self.card_index -= 1;
                    self.show_breakdown = false;
                }
                Vec::new()
            }
            KeyCode::Char('o') | KeyCode::Enter => self
                .current_card()
                .map(|c| Command::OpenUrl(c.article.link.clone()))
                .into_iter()
                .collect(),
            KeyCode::Char('i') => {
                self.show_breakdown = !self.show_breakdown;
                Vec::new()
            }
            KeyCode::Char('e') => self.leave_briefing(View::Browsing(BrowseMode::Normal)),
            KeyCode::Char('h') => self.leave_briefing(View::Home),
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_browse_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.move_down(),
            KeyCode::Char('k') | KeyCode::Up => self.move_up(),
            KeyCode::Tab => {
                self.pane = match self.pane {
                    Pane::List => Pane::Preview,
                    Pane::Preview => Pane::List,
                };
                Vec::new()
            }
            KeyCode::Char('o') | KeyCode::Enter => self
                .selected()
                .map(|a| Command::OpenUrl(a.link.clone()))
                .into_iter()
                .collect(),
            KeyCode::Char('/') => {
                self.view = View::Browsing(BrowseMode::Searching);
                Vec::new()
            }
            KeyCode::Char('f') => {
                self.view = View::Browsing(BrowseMode::Filtering);
                Vec::new()
            }
            KeyCode::Char('r') => {
                if self.refreshing {
                    return Vec::new();
                }
                self.refreshing = true;
                self.spinner_frame = 0;
                vec![Command::Refresh]
            }
            KeyCode::Char('h') => self.go_home(),
            KeyCode::Char('?') => {
                self.view = View::Browsing(BrowseMode::Help);
                Vec::new()
            }
            KeyCode::Char('q') => {
                self.should_quit = true;
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc => {
                self.view = View::Browsing(BrowseMode::Normal);
                self.search.clear();
                self.cursor = 0;
                vec![self.reload()]
            }
            KeyCode::Enter => {
                self.view = View::Browsing(BrowseMode::Normal);
                Vec::new()
            }
            KeyCode::Backspace => {
                if self.search.pop().is_none() {
                    return Vec::new();
                }
                self.cursor = 0;
                vec![self.reload()]
            }
            KeyCode::Char(c) => {
                self.search.push(c);
                self.cursor = 0;
                vec![self.reload()]
            }
            _ => Vec::new(),
        }
    }

    fn on_filter_key(&mut self, key: KeyEvent) -> Vec<Command> {
        match key.code {
            KeyCode::Esc | KeyCode::Char('f') => {
                self.view = View::Browsing(BrowseMode::Normal);
                return Vec::new();
            }
            KeyCode::Up | KeyCode::Char('k') => self.filter.up(),
            KeyCode::Down | KeyCode::Char('j') => self.filter.down(),
            KeyCode::Left | KeyCode::Char('h') => self.filter.left(),
            KeyCode::Right | KeyCode::Char('l') => self.filter.right(),
            KeyCode::Char(' ') | KeyCode::Enter => {
                self.filter.toggle_cursor();
                return self.filter_changed();
            }
            KeyCode::Char('a') => {
                self.filter.select_all();
                return self.filter_changed();
            }
            KeyCode::Char(c @ '1'..='9') => {
                let n = c as usize - '0' as usize;
                if self.filter.toggle_number(n) {
                    return self.filter_changed();
                }
            }
            _ => {}
        }
        Vec::new()
    }

    fn filter_changed(&mut self) -> Vec<Command> {
        self.cursor = 0;
        vec![self.reload()]
    }

    fn move_down(&mut self) -> Vec<Command> {
        if self.pane == Pane::Preview {
            self.preview_scroll = self.preview_scroll.saturating_add(1);
            return Vec::new();
        }
        if self.cursor + 1 < self.articles.len() {
            self.cursor += 1;
            self.preview_scroll = 0;
        }
        self.summarize_selected().into_iter().collect()
    }

    fn move_up(&mut self) -> Vec<Command> {
        if self.pane == Pane::Preview {
            self.preview_scroll = self.preview_scroll.saturating_sub(1);
            return Vec::new();
        }
        if self.cursor > 0 {
            self.cursor -= 1;
            self.preview_scroll = 0;
        }
        self.summarize_selected().into_iter().collect()
    }

    /// Request a fresh briefing; the view switches once it arrives.
    fn open_briefing(&mut self) -> Vec<Command> {
        if self.opening_briefing {
            return Vec::new();
        }
        self.opening_briefing = true;
        self.briefing = None;
        self.briefing_generation += 1;
        self.status = Some(Status::Info("Preparing briefing...".into()));
        vec![Command::GenerateBriefing {
            generation: self.briefing_generation,
        }]
    }

    fn enter_intro(&mut self) -> Vec<Command> {
        self.view = View::BriefingIntro;
        self.card_index = 0;
        self.show_breakdown = false;
        self.status = None;
        self.enrich_briefing()
    }

    /// Annotation for every card still showing an excerpt, plus themes.
    fn enrich_briefing(&self) -> Vec<Command> {
        let Some(briefing) = self.briefing.as_ref().filter(|_| self.has_summarizer) else {
            return Vec::new();
        };
        let mut cmds: Vec<Command> = briefing
            .cards
            .iter()
            .enumerate()
            .filter(|(_, card)| !card.has_annotation)
            .map(|(i, card)| Command::Annotate {
                card_index: i,
                article_id: card.article.id.clone(),
                title: card.article.title.clone(),
                description: card.article.description.clone(),
            })
            .collect();
        if !briefing.cards.is_empty() {
            cmds.push(Command::Themes(
                briefing
                    .cards
                    .iter()
                    .map(|c| ThemeInput {
                        title: c.article.title.clone(),
                        category: c.article.category.label().to_string(),
                    })
                    .collect(),
            ));
        }
        cmds
    }

    fn leave_briefing(&mut self, to: View) -> Vec<Command> {
        self.briefing = None;
        self.card_index = 0;
        match to {
            View::Home => self.go_home(),
            _ => self.enter_browse(),
        }
    }

    fn enter_browse(&mut self) -> Vec<Command> {
        self.opening_briefing = false;
        self.view = View::Browsing(BrowseMode::Normal);
        self.pane = Pane::List;
        vec![self.reload()]
    }

    fn go_home(&mut self) -> Vec<Command> {
        self.view = View::Home;
        Vec::new()
    }

    /// Bump the load generation and build the query for the current
    /// search and filter. Results for older generations are dropped.
    fn reload(&mut self) -> Command {
        self.load_generation += 1;
        Command::LoadArticles {
            generation: self.load_generation,
            query: QueryOpts {
                since: self.since,
                sources: self.filter.active_sources(),
                search: self.search.clone(),
                ..QueryOpts::default()
            },
        }
    }

    fn summarize_selected(&mut self) -> Option<Command> {
        if !self.has_summarizer {
            return None;
        }
        let article = self.articles.get(self.cursor)?;
        if !article.summary.is_empty() || self.pending_summaries.contains(&article.id) {
            return None;
        }
        self.pending_summaries.insert(article.id.clone());
        Some(Command::Summarize {
            article_id: article.id.clone(),
            title: article.title.clone(),
            description: article.description.clone(),
        })
    }
}
