use super::normalize::{scrub_xml_entities, strip_html, truncate};
use super::types::{first_text, AtomFeed, RssDocument};
use super::FeedFetcher;
use crate::config::{FeedKind, Source};
use crate::store::Article;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;

/// Items older than this at fetch time are dropped.
pub const MAX_ITEM_AGE_DAYS: i64 = 7;
pub const MAX_DESCRIPTION_CHARS: usize = 300;

const USER_AGENT: &str = concat!("devnews/", env!("CARGO_PKG_VERSION"));

pub struct HttpFeedFetcher {
    client: Client,
}

impl HttpFeedFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(20))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, source: &Source) -> Result<Vec<Article>> {
        let resp = self
            .client
            .get(&source.url)
            .send()
            .await
            .with_context(|| format!("failed to reach {}", source.url))?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("{} returned {}", source.url, status);
        }

        let body = resp.text().await.context("failed to read feed body")?;
        let articles = parse_feed(&body, source, Utc::now())?;
        tracing::debug!(source = %source.name, count = articles.len(), "parsed feed");
        Ok(articles)
    }
}

/// Item fields common to both feed formats, before normalization.
struct RawItem {
    title: String,
    link: String,
    description: String,
    content: String,
    published: Option<String>,
    updated: Option<String>,
}

/// Parse an RSS or Atom document into articles attributed to `source`.
/// The root element decides the format; the configured type is only used
/// when the root is unrecognizable.
pub fn parse_feed(body: &str, source: &Source, now: DateTime<Utc>) -> Result<Vec<Article>> {
    let xml = scrub_xml_entities(body);
    let kind = sniff_kind(&xml).unwrap_or(source.kind);
    let items = match kind {
        FeedKind::Rss => parse_rss(&xml),
        FeedKind::Atom => parse_atom(&xml),
    }
    .with_context(|| format!("parsing feed for {}", source.name))?;

    let cutoff = now - Duration::days(MAX_ITEM_AGE_DAYS);
    let articles = items
        .into_iter()
        .filter(|item| !item.link.is_empty())
        .filter_map(|item| {
            let published = item
                .published
                .as_deref()
                .and_then(parse_date)
                .or_else(|| item.updated.as_deref().and_then(parse_date))
                .unwrap_or(now);
            if published < cutoff {
                return None;
            }
            let raw_desc = if item.description.is_empty() {
                &item.content
            } else {
                &item.description
            };
            let description = truncate(&strip_html(raw_desc), MAX_DESCRIPTION_CHARS).into_owned();
            Some(Article::new(
                &source.name,
                &strip_html(&item.title),
                &item.link,
                &description,
                published,
                now,
            ))
        })
        .collect();
    Ok(articles)
}

/// Feed format from the document's root element name.
fn sniff_kind(xml: &str) -> Option<FeedKind> {
    let mut rest = xml;
    while let Some(i) = rest.find('<') {
        let tag = &rest[i + 1..];
        if tag.starts_with('?') || tag.starts_with('!') {
            rest = tag;
            continue;
        }
        let name: String = tag
            .chars()
            .take_while(|c| c.is_alphanumeric() || *c == ':')
            .collect();
        return match name.rsplit(':').next().unwrap_or("") {
            "rss" => Some(FeedKind::Rss),
            "feed" => Some(FeedKind::Atom),
            _ => None,
        };
    }
    None
}

fn parse_rss(xml: &str) -> Result<Vec<RawItem>> {
    let doc: RssDocument = quick_xml::de::from_str(xml).context("invalid RSS document")?;
    Ok(doc
        .channel
        .items
        .into_iter()
        .map(|item| RawItem {
            title: first_text(&item.title).to_string(),
            link: first_text(&item.link).to_string(),
            description: first_text(&item.description).to_string(),
            content: first_text(&item.content).to_string(),
            published: Some(first_text(&item.pub_date).to_string()).filter(|s| !s.is_empty()),
            updated: Some(first_text(&item.dc_date).to_string()).filter(|s| !s.is_empty()),
        })
        .collect())
}

fn parse_atom(xml: &str) -> Result<Vec<RawItem>> {
    let feed: AtomFeed = quick_xml::de::from_str(xml).context("invalid Atom document")?;
    Ok(feed
        .entries
        .into_iter()
        .map(|entry| RawItem {
            title: first_text(&entry.title).to_string(),
            link: entry.alternate_link().unwrap_or_default().to_string(),
            description: first_text(&entry.summary).to_string(),
            content: first_text(&entry.content).to_string(),
            published: Some(first_text(&entry.published).to_string()).filter(|s| !s.is_empty()),
            updated: Some(first_text(&entry.updated).to_string()).filter(|s| !s.is_empty()),
        })
        .collect())
}

/// RFC 2822 (RSS) or RFC 3339 (Atom, Dublin Core) timestamps.
fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    DateTime::parse_from_rfc2822(s)
        .or_else(|_| DateTime::parse_from_rfc3339(s))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(kind: FeedKind) -> Source {
        Source {
            name: "Example".to_string(),
            kind,
            url: "https://example.com/feed".to_string(),
            enabled: true,
            weight: None,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-10T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Example Engineering</title>
    <link>https://example.com</link>
    <item>
      <title>Scaling our cache&nbsp;tier</title>
      <link>https://example.com/cache</link>
      <description><![CDATA[<p>How we <b>sharded</b> Redis.</p>]]></description>
      <pubDate>Mon, 10 Mar 2025 08:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Content only</title>
      <link>https://example.com/content</link>
      <content:encoded><![CDATA[<p>Body from content.</p>]]></content:encoded>
    </item>
    <item>
      <title>Ancient history</title>
      <link>https://example.com/old</link>
      <description>old</description>
      <pubDate>Mon, 03 Feb 2025 08:00:00 +0000</pubDate>
    </item>
    <item>
      <title>No link here</title>
      <description>skipped</description>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <entry>
    <title type="html">Consensus &amp; you</title>
    <link rel="alternate" href="https://example.com/raft"/>
    <link rel="replies" href="https://example.com/raft#comments"/>
    <published>2025-03-09T10:00:00Z</published>
    <summary type="html">&lt;p&gt;Raft in practice&lt;/p&gt;</summary>
  </entry>
  <entry>
    <title>Updated only</title>
    <link href="https://example.com/updated"/>
    <updated>2025-03-08T10:00:00+02:00</updated>
    <content type="html">Full body text</content>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss_items() {
        let articles = parse_feed(RSS, &source(FeedKind::Rss), now()).unwrap();
        assert_eq!(articles.len(), 2);

        let first = &articles[0];
        assert_eq!(first.title, "Scaling our cache tier");
        assert_eq!(first.description, "How we sharded Redis.");
        assert_eq!(first.source, "Example");
        assert_eq!(first.id, crate::feed::normalize::article_id("https://example.com/cache"));
        assert_eq!(first.published.to_rfc3339(), "2025-03-10T08:00:00+00:00");

        let second = &articles[1];
        assert_eq!(second.description, "Body from content.");
        // Missing publish time falls back to fetch time.
        assert_eq!(second.published, now());
    }

    #[test]
    fn test_parse_atom_entries() {
        let articles = parse_feed(ATOM, &source(FeedKind::Atom), now()).unwrap();
        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Consensus & you");
        assert_eq!(articles[0].link, "https://example.com/raft");
        assert_eq!(articles[0].description, "Raft in practice");
        assert_eq!(articles[1].link, "https://example.com/updated");
        assert_eq!(articles[1].description, "Full body text");
        assert_eq!(articles[1].published.to_rfc3339(), "2025-03-08T08:00:00+00:00");
    }

    #[test]
    fn test_misconfigured_type_falls_back() {
        let articles = parse_feed(ATOM, &source(FeedKind::Rss), now()).unwrap();
        assert_eq!(articles.len(), 2);
    }

    #[test]
    fn test_long_description_truncated() {
        let body = format!(
            r#"<rss><channel><item><title>t</title><link>https://e.com/x</link><description>{}</description></item></channel></rss>"#,
            "word ".repeat(200)
        );
        let articles = parse_feed(&body, &source(FeedKind::Rss), now()).unwrap();
        assert_eq!(articles[0].description.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(articles[0].description.ends_with("..."));
    }

    #[test]
    fn test_interleaved_repeated_elements() {
        let body = r#"<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
<channel><item>
  <title>Real title</title>
  <link>https://example.com/interleaved</link>
  <media:title>Thumbnail caption</media:title>
  <description>Short.</description>
  <media:description>Caption text</media:description>
  <pubDate>Mon, 10 Mar 2025 09:00:00 +0000</pubDate>
</item></channel></rss>"#;
        let articles = parse_feed(body, &source(FeedKind::Rss), now()).unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Real title");
        assert_eq!(articles[0].link, "https://example.com/interleaved");
        assert_eq!(articles[0].description, "Short.");
    }

    #[test]
    fn test_sniff_kind() {
        assert_eq!(sniff_kind(RSS), Some(FeedKind::Rss));
        assert_eq!(sniff_kind(ATOM), Some(FeedKind::Atom));
        assert_eq!(sniff_kind("<html><body/></html>"), None);
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(parse_feed("not xml at all <", &source(FeedKind::Rss), now()).is_err());
    }
}
