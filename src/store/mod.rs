//! Durable article store on SQLite.
//!
//! Writes go through a single connection behind a mutex, so mutations are
//! serialized. Every read opens its own read-only connection; with WAL
//! enabled, readers run alongside each other and alongside the writer, each
//! seeing a consistent snapshot for the duration of its call.

pub mod models;

pub use models::{Article, OrderBy, QueryOpts, StoreStats};

use crate::engine::classify::Category;
use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Local, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const DEFAULT_LIMIT: usize = 500;
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const META_LAST_REFRESH: &str = "last_refresh";
const META_LAST_OPENED: &str = "last_opened";
const META_LAST_VISIT: &str = "last_visit";
const META_STREAK: &str = "streak";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS articles (
    id             TEXT PRIMARY KEY,
    source         TEXT NOT NULL,
    title          TEXT NOT NULL,
    link           TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    published      INTEGER NOT NULL,
    fetched_at     INTEGER NOT NULL,
    summary        TEXT NOT NULL DEFAULT '',
    tags           TEXT NOT NULL DEFAULT '',
    signal_score   REAL NOT NULL DEFAULT 0,
    category       TEXT NOT NULL DEFAULT 'Platform',
    why_it_matters TEXT NOT NULL DEFAULT ''
);
CREATE INDEX IF NOT EXISTS idx_articles_published ON articles(published DESC);
CREATE INDEX IF NOT EXISTS idx_articles_source ON articles(source);
CREATE INDEX IF NOT EXISTS idx_articles_signal ON articles(signal_score DESC);

CREATE TABLE IF NOT EXISTS meta (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);
";

const ARTICLE_COLUMNS: &str = "id, source, title, link, description, published, fetched_at, \
     summary, tags, signal_score, category, why_it_matters";

pub struct Store {
    path: PathBuf,
    writer: Mutex<Connection>,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating store dir {}", dir.display()))?;
            }
        }

        let conn = Connection::open(path)
            .with_context(|| format!("opening store {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        tracing::debug!(path = %path.display(), journal_mode = %mode, "store opened");
        conn.execute_batch(SCHEMA).context("initializing schema")?;

        Ok(Self {
            path: path.to_path_buf(),
            writer: Mutex::new(conn),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn writer(&self) -> Result<MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| anyhow!("store writer lock poisoned"))
    }

    fn reader(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("opening read connection {}", self.path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    /// Insert new articles; for known ids refresh only title, description
    /// and fetch time. Enrichment columns are never touched.
    pub fn upsert(&self, articles: &[Article]) -> Result<usize> {
        let mut conn = self.writer()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO articles (id, source, title, link, description, published, fetched_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     description = excluded.description,
                     fetched_at = excluded.fetched_at",
            )?;
            for a in articles {
                stmt.execute(params![
                    a.id,
                    a.source,
                    a.title,
                    a.link,
                    a.description,
                    a.published.timestamp(),
                    a.fetched_at.timestamp(),
                ])
                .with_context(|| format!("upserting article {}", a.id))?;
            }
        }
        tx.commit().context("committing upsert")?;
        tracing::debug!(count = articles.len(), "upserted articles");
        Ok(articles.len())
    }

    pub fn query(&self, opts: &QueryOpts) -> Result<Vec<Article>> {
        let limit = opts.limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
        self.select(opts, Some(limit))
    }

    /// Every article published at or after `since`, newest first, unbounded.
    pub fn articles_since(&self, since: DateTime<Utc>) -> Result<Vec<Article>> {
        let opts = QueryOpts {
            since: Some(since),
            ..QueryOpts::default()
        };
        self.select(&opts, None)
    }

    pub fn all_articles(&self) -> Result<Vec<Article>> {
        self.select(&QueryOpts::default(), None)
    }

    fn select(&self, opts: &QueryOpts, limit: Option<usize>) -> Result<Vec<Article>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(since) = opts.since {
            clauses.push("published >= ?".to_string());
            args.push(Value::Integer(since.timestamp()));
        }
        if !opts.sources.is_empty() {
            let placeholders = vec!["?"; opts.sources.len()].join(",");
            clauses.push(format!("source IN ({})", placeholders));
            args.extend(opts.sources.iter().map(|s| Value::Text(s.clone())));
        }
        if !opts.search.is_empty() {
            clauses.push("(title LIKE ? OR description LIKE ?)".to_string());
            let term = format!("%{}%", opts.search);
            args.push(Value::Text(term.clone()));
            args.push(Value::Text(term));
        }
        if let Some(cat) = opts.category {
            clauses.push("category = ?".to_string());
            args.push(Value::Text(cat.label().to_string()));
        }

        let mut sql = format!("SELECT {} FROM articles", ARTICLE_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(match opts.order_by {
            OrderBy::Published => " ORDER BY published DESC",
            OrderBy::Signal => " ORDER BY signal_score DESC, published DESC",
        });
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let conn = self.reader()?;
        let mut stmt = conn.prepare(&sql).context("preparing article query")?;
        let rows = stmt
            .query_map(rusqlite::params_from_iter(args.iter()), row_to_article)
            .context("querying articles")?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row.context("reading article row")?);
        }
        Ok(out)
    }

    /// Delete articles published strictly before `now - retention`.
    pub fn prune(&self, retention: Duration) -> Result<usize> {
        let cutoff = chrono::Duration::from_std(retention)
            .ok()
            .and_then(|r| Utc::now().checked_sub_signed(r))
            .ok_or_else(|| anyhow!("retention of {}s is out of range", retention.as_secs()))?;
        let conn = self.writer()?;
        let deleted = conn
            .execute(
                "DELETE FROM articles WHERE published < ?1",
                params![cutoff.timestamp()],
            )
            .context("pruning articles")?;
        if deleted > 0 {
            tracing::info!(deleted, "pruned old articles");
        }
        Ok(deleted)
    }

    pub fn update_score(&self, id: &str, score: f64, category: Category) -> Result<()> {
        let conn = self.writer()?;
        conn.execute(
            "UPDATE articles SET signal_score = ?1, category = ?2 WHERE id = ?3",
            params![score, category.label(), id],
        )
        .with_context(|| format!("updating score for {}", id))?;
        Ok(())
    }

    pub fn update_annotation(&self, id: &str, text: &str) -> Result<()> {
        let conn = self.writer()?;
        conn.execute(
            "UPDATE articles SET why_it_matters = ?1 WHERE id = ?2",
            params![text, id],
        )
        .with_context(|| format!("updating annotation for {}", id))?;
        Ok(())
    }

    pub fn update_summary(&self, id: &str, summary: &str, tags: &[String]) -> Result<()> {
        let conn = self.writer()?;
        conn.execute(
            "UPDATE articles SET summary = ?1, tags = ?2 WHERE id = ?3",
            params![summary, tags.join(","), id],
        )
        .with_context(|| format!("updating summary for {}", id))?;
        Ok(())
    }

    /// True when the last refresh is unknown or older than `interval`.
    pub fn needs_refresh(&self, interval: Duration) -> bool {
        if interval.is_zero() {
            return true;
        }
        let last = match self.get_meta(META_LAST_REFRESH) {
            Ok(Some(v)) => v,
            Ok(None) => return true,
            Err(e) => {
                tracing::warn!(error = %e, "could not read last refresh");
                return true;
            }
        };
        let Ok(last) = DateTime::parse_from_rfc3339(&last) else {
            return true;
        };
        let elapsed = Utc::now().signed_duration_since(last.with_timezone(&Utc));
        match chrono::Duration::from_std(interval) {
            Ok(interval) => elapsed > interval,
            Err(_) => false,
        }
    }

    pub fn set_last_refresh(&self) -> Result<()> {
        self.set_meta(META_LAST_REFRESH, &now_rfc3339())
    }

    pub fn set_last_opened(&self) -> Result<()> {
        self.set_meta(META_LAST_OPENED, &now_rfc3339())
    }

    pub fn last_opened(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .get_meta(META_LAST_OPENED)?
            .and_then(|v| DateTime::parse_from_rfc3339(&v).ok())
            .map(|t| t.with_timezone(&Utc)))
    }

    /// Record today's visit in the local calendar and return the streak.
    pub fn record_visit(&self) -> Result<u32> {
        self.record_visit_on(Local::now().date_naive())
    }

    /// Consecutive-day streak: same day keeps it, the next day extends it,
    /// any longer gap (or a clock that went backwards) restarts at 1.
    pub fn record_visit_on(&self, today: NaiveDate) -> Result<u32> {
        let mut conn = self.writer()?;
        let tx = conn.transaction()?;

        let last: Option<String> = tx
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![META_LAST_VISIT],
                |row| row.get(0),
            )
            .optional()?;
        let current: u32 = tx
            .query_row(
                "SELECT value FROM meta WHERE key = ?1",
                params![META_STREAK],
                |row| row.get::<_, String>(0),
            )
            .optional()?
            .and_then(|v| v.parse().ok())
            .unwrap_or(0);

        let last = last.and_then(|v| NaiveDate::parse_from_str(&v, "%Y-%m-%d").ok());
        let streak = match last {
            Some(d) if d == today => current.max(1),
            Some(d) if d.succ_opt() == Some(today) => current + 1,
            _ => 1,
        };

        for (key, value) in [
            (META_LAST_VISIT, today.format("%Y-%m-%d").to_string()),
            (META_STREAK, streak.to_string()),
        ] {
            tx.execute(
                "INSERT INTO meta (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
        }
        tx.commit().context("recording visit")?;
        Ok(streak)
    }

    /// Articles published after `since`.
    pub fn count_published_since(&self, since: DateTime<Utc>) -> Result<usize> {
        let conn = self.reader()?;
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM articles WHERE published > ?1",
                params![since.timestamp()],
                |row| row.get(0),
            )
            .context("counting new articles")?;
        Ok(count.max(0) as usize)
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let conn = self.reader()?;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))
            .context("counting articles")?;
        let main = std::fs::metadata(&self.path)
            .map(|m| m.len())
            .with_context(|| format!("reading size of {}", self.path.display()))?;
        let mut wal_path = self.path.clone().into_os_string();
        wal_path.push("-wal");
        let wal = std::fs::metadata(&wal_path).map(|m| m.len()).unwrap_or(0);
        let size_bytes = main + wal;
        Ok(StoreStats {
            articles: count.max(0) as u64,
            size_bytes,
        })
    }

    fn get_meta(&self, key: &str) -> Result<Option<String>> {
        let conn = self.reader()?;
        conn.query_row(
            "SELECT value FROM meta WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .with_context(|| format!("reading meta {}", key))
    }

    fn set_meta(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.writer()?;
        conn.execute(
            "INSERT INTO meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .with_context(|| format!("writing meta {}", key))?;
        Ok(())
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn row_to_article(row: &Row<'_>) -> rusqlite::Result<Article> {
    let category: String = row.get(10)?;
    Ok(Article {
        id: row.get(0)?,
        source: row.get(1)?,
        title: row.get(2)?,
        link: row.get(3)?,
        description: row.get(4)?,
        published: from_unix(row.get(5)?),
        fetched_at: from_unix(row.get(6)?),
        summary: row.get(7)?,
        tags: row.get(8)?,
        signal_score: row.get(9)?,
        category: Category::from_label(&category),
        why_it_matters: row.get(11)?,
    })
}
