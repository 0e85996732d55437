use once_cell::sync::Lazy;
use regex::Regex;
use ring::digest;
use std::borrow::Cow;

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());

/// Stable identity for an article: first 16 bytes of SHA-256(link), hex.
pub fn article_id(link: &str) -> String {
    let hash = digest::digest(&digest::SHA256, link.as_bytes());
    hash.as_ref()[..16]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// Remove markup, decode entities and collapse whitespace.
pub fn strip_html(s: &str) -> String {
    let no_tags = TAG_RE.replace_all(s, " ");
    let decoded = html_escape::decode_html_entities(&no_tags);
    WS_RE.replace_all(&decoded, " ").trim().to_string()
}

/// Char-boundary safe truncation. Strings longer than `max` keep
/// `max - 3` chars plus "..."; tiny limits just cut.
pub fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    if s.chars().count() <= max {
        return Cow::Borrowed(s);
    }
    if max <= 3 {
        return Cow::Owned(s.chars().take(max).collect());
    }
    let end = s
        .char_indices()
        .nth(max - 3)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    Cow::Owned(format!("{}...", &s[..end]))
}

/// Rewrite HTML named entities that XML does not define (`&nbsp;`,
/// `&mdash;`, ...) as numeric references so the XML parser accepts them.
pub fn scrub_xml_entities(xml: &str) -> Cow<'_, str> {
    ENTITY_RE.replace_all(xml, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        if matches!(name, "amp" | "lt" | "gt" | "quot" | "apos") {
            return caps[0].to_string();
        }
        let decoded = html_escape::decode_html_entities(&caps[0]);
        if decoded == &caps[0] {
            // Unknown entity: escape the ampersand so the text survives.
            return format!("&amp;{};", name);
        }
        decoded.chars().map(|c| format!("&#{};", c as u32)).collect()
    })
}
