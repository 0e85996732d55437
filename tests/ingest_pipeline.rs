// Integration tests for feed ingest into the article store

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use devnews::config::{FeedKind, Source};
    use devnews::feed::rss::parse_feed;
    use devnews::feed::{fetch_all, FeedFetcher};
    use devnews::store::{Article, QueryOpts, Store};
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    const RSS_BODY: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Acme</title>
<item>
  <title>Scaling Postgres &amp; friends</title>
  <link>https://acme.example/postgres</link>
  <description>&lt;p&gt;How we sharded our database.&lt;/p&gt;</description>
  <pubDate>RSS_DATE</pubDate>
</item>
<item>
  <title>Retiring the monolith</title>
  <link>https://acme.example/monolith</link>
  <description>Microservices at last.</description>
</item>
</channel></rss>"#;

    const ATOM_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Globex</title>
  <entry>
    <title>Zero trust networking</title>
    <link rel="alternate" href="https://globex.example/zero-trust"/>
    <summary>Rolling out mTLS everywhere.</summary>
    <updated>ATOM_DATE</updated>
  </entry>
</feed>"#;

    /// Serves canned bodies by source name through the real parser.
    struct CannedFeeds(HashMap<&'static str, String>);

    #[async_trait]
    impl FeedFetcher for CannedFeeds {
        async fn fetch(&self, source: &Source) -> Result<Vec<Article>> {
            let body = self
                .0
                .get(source.name.as_str())
                .ok_or_else(|| anyhow::anyhow!("HTTP 404"))?;
            parse_feed(body, source, Utc::now())
        }
    }

    fn source(name: &str, kind: FeedKind) -> Source {
        Source {
            name: name.to_string(),
            kind,
            url: format!("https://{}.example/feed", name.to_lowercase()),
            enabled: true,
            weight: None,
        }
    }

    /// Items must fall inside the feed's age window, so dates are relative.
    fn fetcher() -> Arc<dyn FeedFetcher> {
        let an_hour_ago = Utc::now() - chrono::Duration::hours(1);
        Arc::new(CannedFeeds(HashMap::from([
            ("Acme", RSS_BODY.replace("RSS_DATE", &an_hour_ago.to_rfc2822())),
            ("Globex", ATOM_BODY.replace("ATOM_DATE", &an_hour_ago.to_rfc3339())),
            ("Broken", "<html><body>Service unavailable</body></html>".to_string()),
        ])))
    }

    #[tokio::test]
    async fn test_refresh_persists_good_sources_and_reports_bad_ones() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("cache.db")).unwrap();
        let sources = vec![
            source("Acme", FeedKind::Rss),
            source("Broken", FeedKind::Rss),
            source("Globex", FeedKind::Atom),
            source("Missing", FeedKind::Rss),
        ];

        let result = fetch_all(fetcher(), &sources, Duration::from_secs(5)).await;
        assert_eq!(result.articles.len(), 3);
        assert_eq!(result.errors.len(), 2);
        assert!(result.errors.iter().any(|e| e.contains("Broken")));
        assert!(result.errors.iter().any(|e| e.contains("Missing")));

        store.upsert(&result.articles).unwrap();
        let stored = store.query(&QueryOpts::default()).unwrap();
        assert_eq!(stored.len(), 3);

        let pg = stored
            .iter()
            .find(|a| a.link == "https://acme.example/postgres")
            .unwrap();
        assert_eq!(pg.title, "Scaling Postgres & friends");
        assert_eq!(pg.description, "How we sharded our database.");
        assert_eq!(pg.source, "Acme");
    }

    #[tokio::test]
    async fn test_repeated_refresh_does_not_duplicate() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("cache.db")).unwrap();
        let sources = vec![source("Acme", FeedKind::Rss), source("Globex", FeedKind::Atom)];

        for _ in 0..3 {
            let result = fetch_all(fetcher(), &sources, Duration::from_secs(5)).await;
            assert!(result.errors.is_empty());
            store.upsert(&result.articles).unwrap();
        }
        assert_eq!(store.stats().unwrap().articles, 3);
    }

    #[tokio::test]
    async fn test_enrichment_survives_refresh() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("cache.db")).unwrap();
        let sources = vec![source("Globex", FeedKind::Atom)];

        let first = fetch_all(fetcher(), &sources, Duration::from_secs(5)).await;
        store.upsert(&first.articles).unwrap();
        let id = first.articles[0].id.clone();
        store
            .update_summary(&id, "mTLS rollout notes.", &["security".to_string()])
            .unwrap();

        let again = fetch_all(fetcher(), &sources, Duration::from_secs(5)).await;
        store.upsert(&again.articles).unwrap();

        let stored = store.query(&QueryOpts::default()).unwrap();
        assert_eq!(stored[0].summary, "mTLS rollout notes.");
        assert_eq!(stored[0].tag_list(), vec!["security"]);
    }
}
