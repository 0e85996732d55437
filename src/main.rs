use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use devnews::ai;
use devnews::config::{self, parse_duration, Config};
use devnews::engine::briefing::BriefingConfig;
use devnews::engine::classify::{resolve_alias, Category};
use devnews::feed::rss::HttpFeedFetcher;
use devnews::feed::{fetch_all, FeedFetcher, REFRESH_DEADLINE};
use devnews::store::Store;
use devnews::tui::{
    self,
    app::{App, AppOptions},
    executor::Services,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "devnews=info";

#[derive(Parser)]
#[command(name = "devnews", version)]
#[command(about = "Engineering blog aggregator with a daily briefing")]
struct Cli {
    /// Only show articles from the last duration (e.g. 7d, 24h)
    #[arg(long, global = true)]
    since: Option<String>,

    /// Refresh feeds before launching
    #[arg(long, global = true)]
    refresh: bool,

    /// Path to config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Restrict the briefing to one category (infra, ai, db, distributed, security, tools, platform)
    #[arg(long)]
    focus: Option<String>,

    /// Number of briefing cards
    #[arg(long)]
    brief_size: Option<usize>,

    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand)]
enum Cmd {
    /// Skip the briefing and open the article browser
    Browse,
    /// Delete cached articles older than the retention period
    Prune {
        /// Override the configured retention (e.g. 30d, 720h)
        #[arg(long)]
        older_than: Option<String>,
    },
    /// Show cache statistics
    Stats,
    /// Print version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Some(Cmd::Version) => {
            println!("devnews {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Some(Cmd::Prune { ref older_than }) => prune(&cli, older_than.as_deref()),
        Some(Cmd::Stats) => stats(),
        Some(Cmd::Browse) => run_app(&cli, true).await,
        None => run_app(&cli, false).await,
    }
}

/// Log to a file in the cache dir; the terminal belongs to the TUI.
fn init_logging() {
    let path = config::log_path();
    if let Some(dir) = path.parent() {
        let _ = std::fs::create_dir_all(dir);
    }
    let log_file = match std::fs::File::create(&path) {
        Ok(f) => f,
        Err(_) => return,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => Config::load(path),
        None => Config::load_or_init(&config::default_config_path()),
    }
}

fn prune(cli: &Cli, older_than: Option<&str>) -> Result<()> {
    let cfg = load_config(cli).context("loading config")?;
    let store = Store::open(&config::database_path()).context("opening cache")?;

    let retention = match older_than {
        Some(s) => parse_duration(s).context("invalid --older-than value")?,
        None => cfg.retention_duration(),
    };
    let deleted = store.prune(retention).context("pruning")?;
    if deleted == 0 {
        println!("Nothing to prune.");
    } else {
        println!(
            "Pruned {} article(s) older than {}.",
            deleted,
            format_duration(retention)
        );
    }
    Ok(())
}

fn stats() -> Result<()> {
    let path = config::database_path();
    let store = Store::open(&path).context("opening cache")?;
    let stats = store.stats().context("reading stats")?;
    println!("Cache: {}", path.display());
    println!("Articles: {}", stats.articles);
    println!("Size: {}", format_bytes(stats.size_bytes));
    Ok(())
}

async fn run_app(cli: &Cli, browse: bool) -> Result<()> {
    Config::load_env_file();
    let cfg = load_config(cli).context("loading config")?;

    // Reject a bad focus before doing any work.
    let focus = resolve_focus(cli.focus.as_deref().or(cfg.focus.as_deref()))?;
    let since = match &cli.since {
        Some(s) => {
            let d = parse_duration(s).context("invalid --since value")?;
            Some(since_cutoff(d, Utc::now())?)
        }
        None => None,
    };

    let store = Arc::new(Store::open(&config::database_path()).context("opening cache")?);
    let fetcher: Arc<dyn FeedFetcher> = Arc::new(HttpFeedFetcher::new()?);
    let sources = cfg.enabled_sources();

    if cli.refresh || store.needs_refresh(cfg.refresh_duration()) {
        println!("Fetching feeds...");
        let result = fetch_all(fetcher.clone(), &sources, REFRESH_DEADLINE).await;
        for e in &result.errors {
            eprintln!("  warning: {}", e);
        }
        let count = store.upsert(&result.articles).context("saving articles")?;
        store.set_last_refresh()?;
        tracing::info!(count, errors = result.errors.len(), "startup refresh complete");
        match store.prune(cfg.retention_duration()) {
            Ok(n) if n > 0 => tracing::info!(pruned = n, "pruned old articles"),
            Ok(_) => {}
            Err(e) => tracing::warn!(error = %e, "prune failed"),
        }
    }

    let streak = store.record_visit().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not record visit");
        0
    });

    let summarizer = match ai::from_config(cfg.ai.as_ref(), cfg.ai_key()) {
        Ok(s) => Some(s),
        Err(e) => {
            tracing::info!(reason = %e, "AI enrichment disabled");
            None
        }
    };

    let new_since_last_open = match store.last_opened() {
        Ok(Some(t)) => store
            .count_published_since(t)
            .map_err(|e| tracing::warn!(error = %e, "could not count new articles"))
            .ok(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!(error = %e, "could not read last opened");
            None
        }
    };
    if let Err(e) = store.set_last_opened() {
        tracing::warn!(error = %e, "could not record last opened");
    }

    let app = App::new(AppOptions {
        start_in_browse: browse,
        sources: cfg.source_names(),
        streak,
        new_since_last_open,
        has_summarizer: summarizer.is_some(),
        since,
    });
    let mut services = Services::new(store, fetcher, sources, summarizer);
    services.briefing = BriefingConfig {
        since,
        brief_size: cli.brief_size.unwrap_or_else(|| cfg.brief_size()),
        focus,
        source_weights: cfg.source_weights(),
    };
    tui::run(app, services).await
}

/// Start of a `--since` window ending at `now`.
fn since_cutoff(window: Duration, now: chrono::DateTime<Utc>) -> Result<chrono::DateTime<Utc>> {
    chrono::Duration::from_std(window)
        .ok()
        .and_then(|w| now.checked_sub_signed(w))
        .with_context(|| format!("--since window of {} is out of range", format_duration(window)))
}

fn resolve_focus(input: Option<&str>) -> Result<Option<Category>> {
    match input.map(str::trim).filter(|s| !s.is_empty()) {
        Some(alias) => Ok(Some(resolve_alias(alias)?)),
        None => Ok(None),
    }
}

fn format_duration(d: Duration) -> String {
    let hours = d.as_secs() / 3600;
    if hours >= 24 {
        format!("{}d", hours / 24)
    } else {
        format!("{}h", hours)
    }
}

fn format_bytes(b: u64) -> String {
    const KB: u64 = 1 << 10;
    const MB: u64 = 1 << 20;
    if b >= MB {
        format!("{:.1} MB", b as f64 / MB as f64)
    } else if b >= KB {
        format!("{:.1} KB", b as f64 / KB as f64)
    } else {
        format!("{} B", b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024 + 512 * 1024), "3.5 MB");
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_secs(90 * 86400)), "90d");
        assert_eq!(format_duration(Duration::from_secs(5 * 3600)), "5h");
    }

    #[test]
    fn test_since_cutoff() {
        let now = Utc::now();
        let d = parse_duration("7d").unwrap();
        assert_eq!(since_cutoff(d, now).unwrap(), now - chrono::Duration::days(7));
        let huge = parse_duration("100000000d").unwrap();
        assert!(since_cutoff(huge, now).is_err());
    }

    #[test]
    fn test_resolve_focus() {
        assert_eq!(resolve_focus(None).unwrap(), None);
        assert_eq!(resolve_focus(Some("  ")).unwrap(), None);
        assert_eq!(resolve_focus(Some("db")).unwrap(), Some(Category::Databases));
        assert!(resolve_focus(Some("cooking")).is_err());
    }

    #[test]
    fn test_cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["devnews", "prune", "--older-than", "30d"]).unwrap();
        assert!(matches!(cli.command, Some(Cmd::Prune { older_than: Some(ref d) }) if d == "30d"));
        let cli = Cli::try_parse_from(["devnews", "--focus", "ai", "--brief-size", "3"]).unwrap();
        assert_eq!(cli.focus.as_deref(), Some("ai"));
        assert_eq!(cli.brief_size, Some(3));
        let cli = Cli::try_parse_from(["devnews", "browse", "--since", "7d"]).unwrap();
        assert!(matches!(cli.command, Some(Cmd::Browse)));
        assert_eq!(cli.since.as_deref(), Some("7d"));
    }
}
