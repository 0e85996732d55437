// Integration tests for briefing generation over a populated store

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use devnews::engine::briefing::{generate, BriefingOptions};
    use devnews::engine::classify::Category;
    use devnews::store::{Article, OrderBy, QueryOpts, Store};
    use std::collections::HashMap;

    fn article(source: &str, slug: &str, title: &str, desc: &str, hours_ago: i64) -> Article {
        let now = Utc::now();
        Article::new(
            source,
            title,
            &format!("https://{}.example/{}", source.to_lowercase(), slug),
            desc,
            now - Duration::hours(hours_ago),
            now,
        )
    }

    fn seeded_store(dir: &tempfile::TempDir) -> Store {
        let store = Store::open(&dir.path().join("cache.db")).unwrap();
        store
            .upsert(&[
                article(
                    "Netflix",
                    "zero-trust",
                    "Zero trust authentication at the edge",
                    "Encryption, certificate rotation and oauth tokens for every service. \
                     We cover the security review process and vulnerability triage.",
                    2,
                ),
                article(
                    "Stripe",
                    "postgres",
                    "Sharding Postgres without downtime",
                    "A database migration story: schema changes, replication lag and \
                     query planning across hundreds of shards.",
                    3,
                ),
                article(
                    "Uber",
                    "kafka",
                    "Consensus and replication in our Kafka fleet",
                    "Distributed log replication, partition leadership and failover.",
                    5,
                ),
                article("Netflix", "party", "Office party recap", "Cake.", 6),
                article(
                    "Stripe",
                    "old",
                    "Security incident retrospective",
                    "An older post outside the window.",
                    24 * 10,
                ),
            ])
            .unwrap();
        store
    }

    fn options(brief_size: usize, focus: Option<Category>) -> BriefingOptions {
        BriefingOptions {
            since: Utc::now() - Duration::hours(24),
            brief_size,
            focus,
            source_weights: HashMap::from([("Stripe".to_string(), 0.9)]),
            themes: Vec::new(),
        }
    }

    #[test]
    fn test_briefing_caps_and_ranks_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir);

        let briefing = generate(&store, &options(2, None)).unwrap();
        assert_eq!(briefing.scanned, 4, "the ten-day-old post is outside the window");
        assert_eq!(briefing.selected, 2);
        assert_eq!(briefing.cards.len(), 2);
        assert_eq!(briefing.cards[0].index, 1);
        assert_eq!(briefing.cards[1].index, 2);
        assert!(
            briefing.cards[0].article.signal_score >= briefing.cards[1].article.signal_score
        );
        assert!(briefing
            .cards
            .iter()
            .all(|c| c.article.title != "Office party recap"));
    }

    #[test]
    fn test_focus_keeps_only_matching_category() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir);

        let briefing = generate(&store, &options(5, Some(Category::Security))).unwrap();
        assert_eq!(briefing.focus, Some(Category::Security));
        assert_eq!(briefing.cards.len(), 1);
        assert_eq!(
            briefing.cards[0].article.title,
            "Zero trust authentication at the edge"
        );
    }

    #[test]
    fn test_scores_and_categories_written_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir);
        generate(&store, &options(1, None)).unwrap();

        let ranked = store
            .query(&QueryOpts {
                order_by: OrderBy::Signal,
                since: Some(Utc::now() - Duration::hours(24)),
                ..QueryOpts::default()
            })
            .unwrap();
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|a| a.signal_score > 0.0));
        let pg = ranked.iter().find(|a| a.title.contains("Postgres")).unwrap();
        assert_eq!(pg.category, Category::Databases);

        let by_category = store
            .query(&QueryOpts {
                category: Some(Category::Security),
                ..QueryOpts::default()
            })
            .unwrap();
        assert_eq!(by_category.len(), 1, "the old post was never scored");
    }

    #[test]
    fn test_unannotated_cards_use_excerpt() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir);
        let first = generate(&store, &options(5, None)).unwrap();
        let card = first
            .cards
            .iter()
            .find(|c| c.article.source == "Uber")
            .unwrap();
        assert!(!card.has_annotation);
        assert!(!card.article.why_it_matters.is_empty());

        store
            .update_annotation(&card.article.id, "Shows how to survive broker loss.")
            .unwrap();
        let second = generate(&store, &options(5, None)).unwrap();
        let card = second
            .cards
            .iter()
            .find(|c| c.article.source == "Uber")
            .unwrap();
        assert!(card.has_annotation);
        assert_eq!(card.article.why_it_matters, "Shows how to survive broker loss.");
    }

    #[test]
    fn test_empty_window() {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("cache.db")).unwrap();
        let briefing = generate(&store, &options(5, None)).unwrap();
        assert_eq!(briefing.scanned, 0);
        assert!(briefing.cards.is_empty());
        assert!(briefing.themes.is_empty());
    }
}
