use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// Source name -> trust weight in [0, 1].
pub type SourceWeights = HashMap<String, f64>;

const WEIGHT_RECENCY: f64 = 0.30;
const WEIGHT_SOURCE: f64 = 0.25;
const WEIGHT_DEPTH: f64 = 0.25;
const WEIGHT_KEYWORDS: f64 = 0.20;

pub const DEFAULT_SOURCE_WEIGHT: f64 = 0.5;

/// High-signal engineering vocabulary matched against whole words.
const ENGINEERING_KEYWORDS: &[&str] = &[
    "scale", "scaling", "performance", "latency", "throughput", "reliability", "resilience",
    "architecture", "microservice", "distributed", "consensus", "replication", "sharding",
    "kubernetes", "container", "docker", "rust", "golang", "typescript", "database", "cache",
    "index", "encryption", "authentication", "security", "inference", "training", "model",
    "pipeline", "deployment", "observability", "migration", "optimization", "concurrency",
    "fault", "tolerant", "idempotent", "streaming", "realtime", "async",
];

/// The fields of an article the scorer looks at.
#[derive(Debug, Clone, Copy)]
pub struct ScoreInput<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub source: &'a str,
    pub published: Option<DateTime<Utc>>,
}

/// Per-factor contributions, each in [0, 1], plus the final 0-10 score.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Breakdown {
    pub recency: f64,
    pub source_weight: f64,
    pub depth: f64,
    pub keyword_density: f64,
    pub final_score: f64,
}

pub fn score(input: &ScoreInput<'_>, weights: &SourceWeights) -> f64 {
    score_with_breakdown(input, weights, Utc::now()).final_score
}

/// Score relative to `now`. Never fails; missing data scores low.
pub fn score_with_breakdown(
    input: &ScoreInput<'_>,
    weights: &SourceWeights,
    now: DateTime<Utc>,
) -> Breakdown {
    let mut b = Breakdown {
        recency: recency_score(input.published, now),
        source_weight: source_score(input.source, weights),
        depth: depth_score(input.description),
        keyword_density: keyword_score(input.title, input.description),
        final_score: 0.0,
    };
    let raw = b.recency * WEIGHT_RECENCY
        + b.source_weight * WEIGHT_SOURCE
        + b.depth * WEIGHT_DEPTH
        + b.keyword_density * WEIGHT_KEYWORDS;
    // 0-1 weighted sum -> 0-10, one decimal place
    b.final_score = (raw * 100.0).round() / 10.0;
    b
}

/// Halves every 24 hours. Future timestamps count as brand new.
pub fn recency_score(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(published) = published else {
        return 0.0;
    };
    let hours = ((now - published).num_milliseconds() as f64 / 3_600_000.0).max(0.0);
    let decay = -std::f64::consts::LN_2 / 24.0;
    (decay * hours).exp()
}

pub fn source_score(source: &str, weights: &SourceWeights) -> f64 {
    weights
        .get(source)
        .map(|w| w.clamp(0.0, 1.0))
        .unwrap_or(DEFAULT_SOURCE_WEIGHT)
}

pub fn depth_score(description: &str) -> f64 {
    match description.split_whitespace().count() {
        n if n >= 150 => 1.0,
        n if n >= 50 => 0.6,
        _ => 0.2,
    }
}

/// Keyword hits per word, scaled so 10% density saturates at 1.0.
pub fn keyword_score(title: &str, description: &str) -> f64 {
    let text = format!("{} {}", title, description).to_lowercase();
    let words: Vec<&str> = text
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }
    let hits = words
        .iter()
        .filter(|w| ENGINEERING_KEYWORDS.contains(w))
        .count();
    (hits as f64 / words.len() as f64 * 10.0).min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn n_words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    fn weights(pairs: &[(&str, f64)]) -> SourceWeights {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_recent_article_scores_high() {
        let now = Utc::now();
        let desc = format!(
            "We describe our approach to scaling container orchestration across regions with \
             performance optimization and reliability improvements. {}",
            n_words(160)
        );
        let input = ScoreInput {
            title: "Scaling Kubernetes Clusters for High Throughput",
            description: &desc,
            source: "Cloudflare",
            published: Some(now),
        };
        let s = score_with_breakdown(&input, &weights(&[("Cloudflare", 0.9)]), now).final_score;
        assert!(s >= 5.0, "expected high score, got {}", s);
        assert!(s <= 10.0, "score above range: {}", s);
    }

    #[test]
    fn test_old_article_scores_lower() {
        let now = Utc::now();
        let desc = n_words(160);
        let input = ScoreInput {
            title: "Scaling Kubernetes Clusters",
            description: &desc,
            source: "Cloudflare",
            published: Some(now - Duration::hours(72)),
        };
        let s = score_with_breakdown(&input, &weights(&[("Cloudflare", 0.9)]), now).final_score;
        assert!(s <= 7.0, "expected lower score for 72h old article, got {}", s);
    }

    #[test]
    fn test_recency_reference_points() {
        let now = Utc::now();
        let fresh = recency_score(Some(now), now);
        let day = recency_score(Some(now - Duration::hours(24)), now);
        let three_days = recency_score(Some(now - Duration::hours(72)), now);
        assert!((fresh - 1.0).abs() < 0.001, "fresh: {}", fresh);
        assert!((day - 0.5).abs() < 0.001, "24h: {}", day);
        assert!((three_days - 0.125).abs() < 0.001, "72h: {}", three_days);
    }

    #[test]
    fn test_recency_strictly_decreasing() {
        let now = Utc::now();
        let mut prev = f64::MAX;
        for h in 0..200 {
            let r = recency_score(Some(now - Duration::hours(h)), now);
            assert!(r < prev, "recency did not fall at {}h: {} >= {}", h, r, prev);
            prev = r;
        }
    }

    #[test]
    fn test_future_timestamp_clamps() {
        let now = Utc::now();
        let r = recency_score(Some(now + Duration::hours(5)), now);
        assert!((r - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_missing_timestamp_scores_zero_recency() {
        assert_eq!(recency_score(None, Utc::now()), 0.0);
    }

    #[test]
    fn test_default_source_weight() {
        assert_eq!(source_score("Unknown", &SourceWeights::new()), 0.5);
        assert_eq!(source_score("Unknown", &weights(&[("Other", 0.9)])), 0.5);
        assert_eq!(source_score("Other", &weights(&[("Other", 0.9)])), 0.9);
    }

    #[test]
    fn test_depth_bands() {
        assert_eq!(depth_score("hello world"), 0.2);
        assert_eq!(depth_score(&n_words(49)), 0.2);
        assert_eq!(depth_score(&n_words(50)), 0.6);
        assert_eq!(depth_score(&n_words(75)), 0.6);
        assert_eq!(depth_score(&n_words(150)), 1.0);
        assert_eq!(depth_score(&n_words(200)), 1.0);
    }

    #[test]
    fn test_keyword_density_caps() {
        assert_eq!(keyword_score("", ""), 0.0);
        // 1 hit in 4 words = 25% density -> saturated
        assert_eq!(keyword_score("Rust, for everyone!", "today"), 1.0);
        // 1 hit in 20 words = 5% -> 0.5
        let desc = n_words(19);
        assert!((keyword_score("latency", &desc) - 0.5).abs() < 0.001);
    }

    #[test]
    fn test_breakdown_components() {
        let now = Utc::now();
        let desc = n_words(160);
        let input = ScoreInput {
            title: "Distributed Database Replication",
            description: &desc,
            source: "Stripe",
            published: Some(now),
        };
        let b = score_with_breakdown(&input, &weights(&[("Stripe", 0.8)]), now);
        assert!(b.recency > 0.99);
        assert_eq!(b.source_weight, 0.8);
        assert_eq!(b.depth, 1.0);
        assert!(b.final_score >= 0.0 && b.final_score <= 10.0);
    }

    #[test]
    fn test_empty_input_in_range() {
        let input = ScoreInput {
            title: "",
            description: "",
            source: "",
            published: None,
        };
        let b = score_with_breakdown(&input, &SourceWeights::new(), Utc::now());
        assert_eq!(b.recency, 0.0);
        assert_eq!(b.keyword_density, 0.0);
        // 0.5 * 0.25 + 0.2 * 0.25 = 0.175
        assert!(b.final_score >= 1.7 && b.final_score <= 1.8, "got {}", b.final_score);
    }

    #[test]
    fn test_score_rounds_to_one_decimal() {
        let input = ScoreInput {
            title: "Concurrency in async Rust",
            description: "A walk through our streaming pipeline.",
            source: "Blog",
            published: Some(Utc::now() - Duration::hours(7)),
        };
        let s = score(&input, &SourceWeights::new());
        assert!(((s * 10.0).round() - s * 10.0).abs() < 1e-9);
        assert!((0.0..=10.0).contains(&s));
    }
}
