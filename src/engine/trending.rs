use crate::store::Article;
use std::collections::{HashMap, HashSet};

const MAX_TERMS: usize = 3;
const MIN_TERM_CHARS: usize = 4;

const STOP_WORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "from", "is", "it", "its", "this", "that", "are", "was", "were", "be", "been", "being",
    "have", "has", "had", "do", "does", "did", "will", "would", "could", "should", "may",
    "might", "can", "not", "no", "nor", "how", "what", "when", "where", "who", "which", "why",
    "all", "each", "every", "both", "few", "more", "most", "other", "some", "such", "than",
    "too", "very", "just", "about", "into", "over", "after", "before", "between", "under",
    "above", "out", "up", "down", "off", "our", "your", "we", "you", "they", "them", "their",
    "new", "use", "using", "used",
];

/// Title terms: lowercase, edge punctuation trimmed, short and stop words dropped.
pub fn title_terms(title: &str) -> Vec<String> {
    title
        .to_lowercase()
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()))
        .filter(|w| w.chars().count() >= MIN_TERM_CHARS)
        .filter(|w| !STOP_WORDS.contains(w))
        .map(str::to_string)
        .collect()
}

/// Top title terms of `selected` by TF-IDF against `corpus`.
///
/// Document frequency counts each corpus title once per term; terms that
/// appear fewer than twice in the selection are ignored. Ties are broken
/// alphabetically so the output is stable.
pub fn trending_terms(selected: &[Article], corpus: &[Article]) -> Vec<String> {
    let mut df: HashMap<String, usize> = HashMap::new();
    for a in corpus {
        let unique: HashSet<String> = title_terms(&a.title).into_iter().collect();
        for term in unique {
            *df.entry(term).or_insert(0) += 1;
        }
    }

    let mut tf: HashMap<String, usize> = HashMap::new();
    for a in selected {
        for term in title_terms(&a.title) {
            *tf.entry(term).or_insert(0) += 1;
        }
    }

    let total_docs = corpus.len().max(1) as f64;
    let mut scored: Vec<(String, f64)> = tf
        .into_iter()
        .filter(|(_, freq)| *freq >= 2)
        .map(|(term, freq)| {
            let doc_freq = df.get(&term).copied().unwrap_or(0).max(1) as f64;
            let score = freq as f64 * (total_docs / doc_freq).ln();
            (term, score)
        })
        .collect();

    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    scored.into_iter().take(MAX_TERMS).map(|(term, _)| term).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn titled(title: &str, n: usize) -> Article {
        let now = Utc::now();
        Article::new("S", title, &format!("https://t.example/{}", n), "", now, now)
    }

    #[test]
    fn test_title_terms_filters() {
        assert_eq!(
            title_terms("How we use Rust: the async story, using Tokio!"),
            vec!["rust", "async", "story", "tokio"]
        );
        assert!(title_terms("a an the of").is_empty());
    }

    #[test]
    fn test_requires_two_occurrences() {
        let selected = vec![titled("Kafka lessons", 1), titled("Postgres tuning", 2)];
        assert!(trending_terms(&selected, &selected).is_empty());
    }

    #[test]
    fn test_rare_corpus_terms_rank_higher() {
        let mut corpus: Vec<Article> = (0..10).map(|i| titled("engineering update", i)).collect();
        let selected = vec![
            titled("kafka engineering", 20),
            titled("kafka engineering", 21),
            titled("scaling kafka engineering", 22),
        ];
        corpus.extend(selected.iter().cloned());
        let terms = trending_terms(&selected, &corpus);
        assert_eq!(terms[0], "kafka");
        assert!(terms.len() <= 3);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(trending_terms(&[], &[]).is_empty());
    }

    #[test]
    fn test_ties_are_alphabetical() {
        let selected = vec![titled("zeta alpha", 1), titled("zeta alpha", 2)];
        // Empty corpus: every df clamps to 1, total to 1, so all scores are 0.
        let terms = trending_terms(&selected, &[]);
        assert_eq!(terms, vec!["alpha", "zeta"]);
    }
}
