use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use feed_rs::parser;

#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub site_url: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub id: String,
    pub url: String,
    pub title: String,
    pub author: Option<String>,
    pub content: String,
    pub published_at: Option<DateTime<Utc>>,
}

impl ParsedEntry {
    /// Stable identity: the entry id when present, its link otherwise.
    pub fn hash(&self) -> String {
        let key = if self.id.trim().is_empty() {
            &self.url
        } else {
            &self.id
        };
        format!("{:x}", md5::compute(key.as_bytes()))
    }
}

/// Parses RSS, Atom or JSON Feed documents.
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(bytes).context("unable to parse feed")?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let url = entry
                .links
                .first()
                .map(|l| l.href.clone())
                .unwrap_or_default();
            let title = entry
                .title
                .map(|t| t.content)
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| url.clone());
            let content = entry
                .content
                .and_then(|c| c.body)
                .or(entry.summary.map(|s| s.content))
                .unwrap_or_default();

            ParsedEntry {
                id: entry.id,
                url,
                title,
                author: entry.authors.first().map(|a| a.name.clone()),
                content,
                published_at: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(ParsedFeed {
        title: feed.title.map(|t| t.content),
        site_url: feed.links.first().map(|l| l.href.clone()),
        entries,
    })
}
