pub mod claude;
pub mod openai;

use crate::config::AiConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Deadline for one summarization, annotation or themes call.
pub const CALL_DEADLINE: Duration = Duration::from_secs(15);

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_TAGS: usize = 3;
const MAX_THEMES: usize = 4;
const MAX_THEME_CHARS: usize = 60;
const MAX_WHY_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Summary {
    pub text: String,
    pub tags: Vec<String>,
}

/// Minimal article data sent for theme detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeInput {
    pub title: String,
    pub category: String,
}

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, title: &str, description: &str) -> Result<Summary>;
    async fn brief(&self, titles: &[String]) -> Result<String>;
    async fn why_it_matters(&self, title: &str, description: &str) -> Result<String>;
    async fn themes(&self, articles: &[ThemeInput]) -> Result<Vec<String>>;
}

/// A provider that answers a single user prompt with plain text.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[async_trait]
impl<T: Completion> Summarizer for T {
    async fn summarize(&self, title: &str, description: &str) -> Result<Summary> {
        let text = self.complete(&summarize_prompt(title, description)).await?;
        Ok(parse_summary_response(&text))
    }

    async fn brief(&self, titles: &[String]) -> Result<String> {
        let prompt = format!(
            "In one sentence (max 150 chars), summarize the main themes across these {} engineering blog posts:\n\n{}",
            titles.len(),
            titles.join("\n")
        );
        Ok(self.complete(&prompt).await?.trim().to_string())
    }

    async fn why_it_matters(&self, title: &str, description: &str) -> Result<String> {
        let prompt = format!(
            "You are a senior engineering analyst. Given this blog post title and description, \
             write a measured, technical \"Why it matters\" statement. Be precise and analytical. \
             No hype or exclamation marks. 2-3 sentences, max {} characters total.\n\n\
             Title: {}\nDescription: {}\n\n\
             Respond with ONLY the \"why it matters\" text, nothing else.",
            MAX_WHY_CHARS, title, description
        );
        let text = self.complete(&prompt).await?;
        Ok(clip_chars(text.trim(), MAX_WHY_CHARS))
    }

    async fn themes(&self, articles: &[ThemeInput]) -> Result<Vec<String>> {
        let mut listing = String::new();
        for a in articles {
            listing.push_str("- ");
            listing.push_str(&a.title);
            if !a.category.is_empty() {
                listing.push_str(&format!(" [{}]", a.category));
            }
            listing.push('\n');
        }
        let prompt = format!(
            "Given these engineering blog posts, identify 2-4 overarching technical themes. \
             Be analytical and specific. Each theme should be under {} characters.\n\n\
             Articles:\n{}\n\
             Respond with one theme per line. No bullets, numbers, or other formatting.",
            MAX_THEME_CHARS, listing
        );
        let text = self.complete(&prompt).await?;
        Ok(parse_themes(&text))
    }
}

/// Build the configured provider. Missing config, an empty key or an
/// unknown provider name is an error; callers treat it as "no summarizer".
pub fn from_config(cfg: Option<&AiConfig>, api_key: Option<String>) -> Result<Arc<dyn Summarizer>> {
    let cfg = match cfg {
        Some(cfg) => cfg,
        None => anyhow::bail!("AI not configured"),
    };
    let key = match api_key.filter(|k| !k.is_empty()) {
        Some(k) => k,
        None => anyhow::bail!("AI not configured: no API key"),
    };
    let client = reqwest::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .context("Failed to create HTTP client")?;

    let model = if cfg.model.is_empty() { None } else { Some(cfg.model.clone()) };
    match cfg.provider.as_str() {
        "claude" => Ok(Arc::new(claude::ClaudeProvider::new(client, key, model))),
        "openai" => Ok(Arc::new(openai::OpenAiProvider::new(client, key, model))),
        other => anyhow::bail!("unknown AI provider: {:?} (valid: claude, openai)", other),
    }
}

fn summarize_prompt(title: &str, description: &str) -> String {
    format!(
        "Summarize this engineering blog post in one sentence (max 120 chars) and provide up to 3 \
         topic tags (single words like: infrastructure, rust, performance, scaling, databases, \
         security, frontend, api, mobile, devops).\n\n\
         Format your response EXACTLY like this:\n\
         SUMMARY: <one sentence summary>\n\
         TAGS: tag1, tag2, tag3\n\n\
         Title: {}\nDescription: {}",
        title, description
    )
}

/// Read `SUMMARY:` and `TAGS:` lines. Tags are lowercased, at most three.
pub fn parse_summary_response(text: &str) -> Summary {
    let mut summary = Summary::default();
    for line in text.lines().map(str::trim) {
        if let Some(rest) = line.strip_prefix("SUMMARY:") {
            summary.text = rest.trim().to_string();
        } else if let Some(rest) = line.strip_prefix("TAGS:") {
            summary.tags = rest
                .split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .take(MAX_TAGS)
                .collect();
        }
    }
    summary
}

/// One theme per line with bullets and "1." / "1)" numbering removed.
pub fn parse_themes(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            let line = line.trim().trim_start_matches(['•', '-', '*']).trim();
            strip_numbering(line).trim()
        })
        .filter(|line| !line.is_empty())
        .map(|line| clip_chars(line, MAX_THEME_CHARS))
        .take(MAX_THEMES)
        .collect()
}

fn strip_numbering(line: &str) -> &str {
    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 || line.len() <= 2 {
        return line;
    }
    match line[digits..].chars().next() {
        Some('.') | Some(')') => &line[digits + 1..],
        _ => line,
    }
}

fn clip_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_summary_response() {
        let s = parse_summary_response(
            "SUMMARY: Netflix rebuilt its cache layer.\nTAGS: Caching, Scaling, rust, extra\n",
        );
        assert_eq!(s.text, "Netflix rebuilt its cache layer.");
        assert_eq!(s.tags, vec!["caching", "scaling", "rust"]);
    }

    #[test]
    fn test_parse_summary_response_garbage() {
        let s = parse_summary_response("I cannot help with that.");
        assert!(s.text.is_empty());
        assert!(s.tags.is_empty());
    }

    #[test]
    fn test_parse_themes_strips_formatting() {
        let themes = parse_themes(
            "1. Edge compute consolidation\n- Postgres at scale\n\n• Supply chain security\n2) Rust in production\n5. Too many",
        );
        assert_eq!(
            themes,
            vec![
                "Edge compute consolidation",
                "Postgres at scale",
                "Supply chain security",
                "Rust in production",
            ]
        );
    }

    #[test]
    fn test_parse_themes_caps_length() {
        let themes = parse_themes(&"x".repeat(100));
        assert_eq!(themes[0].chars().count(), MAX_THEME_CHARS);
    }

    #[test]
    fn test_numbers_without_marker_kept() {
        assert_eq!(parse_themes("2025 outages"), vec!["2025 outages"]);
    }

    #[test]
    fn test_from_config_requires_key_and_known_provider() {
        assert!(from_config(None, Some("k".into())).is_err());
        let cfg = AiConfig {
            provider: "claude".into(),
            ..AiConfig::default()
        };
        assert!(from_config(Some(&cfg), None).is_err());
        assert!(from_config(Some(&cfg), Some("k".into())).is_ok());

        let bad = AiConfig {
            provider: "gemini".into(),
            ..AiConfig::default()
        };
        let err = from_config(Some(&bad), Some("k".into())).err().unwrap();
        assert!(err.to_string().contains("unknown AI provider"));
    }

    struct Canned(String);

    #[async_trait]
    impl Completion for Canned {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_why_it_matters_is_clipped() {
        let text = Canned("y".repeat(500)).why_it_matters("t", "d").await.unwrap();
        assert_eq!(text.chars().count(), MAX_WHY_CHARS);
    }

    #[tokio::test]
    async fn test_themes_through_completion() {
        let themes = Canned("- A\n- B".to_string()).themes(&[]).await.unwrap();
        assert_eq!(themes, vec!["A", "B"]);
    }
}
