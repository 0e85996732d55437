//! Wire shapes of RSS 2.0 and Atom documents, as read by quick-xml's
//! serde deserializer. Unknown elements are ignored.
//!
//! Element names arrive without namespace prefixes, so `content:encoded`
//! shows up as `encoded` and an item's `media:title` lands next to its
//! plain `title`. Text fields are therefore sequences; the first non-empty
//! value wins.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RssDocument {
    pub channel: RssChannel,
}

#[derive(Debug, Deserialize)]
pub struct RssChannel {
    #[serde(rename = "item", default)]
    pub items: Vec<RssItem>,
}

#[derive(Debug, Deserialize)]
pub struct RssItem {
    #[serde(default)]
    pub title: Vec<TextNode>,
    #[serde(default)]
    pub link: Vec<TextNode>,
    #[serde(default)]
    pub description: Vec<TextNode>,
    #[serde(rename = "encoded", alias = "content:encoded", default)]
    pub content: Vec<TextNode>,
    #[serde(rename = "pubDate", default)]
    pub pub_date: Vec<TextNode>,
    #[serde(rename = "date", alias = "dc:date", default)]
    pub dc_date: Vec<TextNode>,
}

#[derive(Debug, Deserialize)]
pub struct AtomFeed {
    #[serde(rename = "entry", default)]
    pub entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AtomEntry {
    #[serde(default)]
    pub title: Vec<TextNode>,
    #[serde(rename = "link", default)]
    pub links: Vec<AtomLink>,
    #[serde(default)]
    pub summary: Vec<TextNode>,
    #[serde(default)]
    pub content: Vec<TextNode>,
    #[serde(default)]
    pub published: Vec<TextNode>,
    #[serde(default)]
    pub updated: Vec<TextNode>,
}

#[derive(Debug, Deserialize)]
pub struct AtomLink {
    #[serde(rename = "@href", default)]
    pub href: String,
    #[serde(rename = "@rel")]
    pub rel: Option<String>,
}

/// Element text, tolerant of attributes such as `type="html"`.
#[derive(Debug, Deserialize, Default)]
pub struct TextNode {
    #[serde(rename = "$text", default)]
    pub value: String,
}

/// First non-empty trimmed text among repeated elements.
pub fn first_text(nodes: &[TextNode]) -> &str {
    nodes
        .iter()
        .map(|n| n.value.trim())
        .find(|v| !v.is_empty())
        .unwrap_or("")
}

impl AtomEntry {
    /// The `alternate` link, falling back to the first link without a rel.
    pub fn alternate_link(&self) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.as_deref() == Some("alternate"))
            .or_else(|| self.links.iter().find(|l| l.rel.is_none()))
            .map(|l| l.href.trim())
            .filter(|h| !h.is_empty())
    }
}
