use feed_rs::model::Entry;
use feed_rs::parser;
use reqwest::blocking::Client;
use url::Url;

use crate::domain::article::{
    KEY_AUTHOR, KEY_DATE, KEY_DESCRIPTION, KEY_ID, KEY_LINK, KEY_TITLE, KEY_TORRENT_URL,
};
use crate::domain::{ArticleFields, Feed, FeedType, FieldValue};
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::sources::traits::{FeedMetadata, FeedSource};

/// Common feed URL patterns to try when direct URL fails
const FEED_PATTERNS: &[&str] = &[
    "/rss",
    "/rss.xml",
    "/feed",
    "/feed/",
    "/feed.xml",
    "/atom.xml",
    "/index.xml",
    "/torrents.rss",
];

const TORRENT_MIME: &str = "application/x-bittorrent";

pub struct RssAtomSource {
    client: Client,
}

impl RssAtomSource {
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_else(|_| Client::new()),
        }
    }

    /// Try to discover a valid feed URL by testing common patterns
    /// Returns the first URL that successfully parses as a feed
    fn discover_feed_url(&self, url: &str) -> FeedgrabResult<(String, feed_rs::model::Feed)> {
        // First, try the URL as-is (might already be a feed URL)
        match self.fetch_and_parse(url) {
            Ok(feed) => return Ok((url.to_string(), feed)),
            Err(e) => tracing::debug!(url, error = %e, "not a feed, trying common locations"),
        }

        let parsed = Url::parse(url).map_err(|e| FeedgrabError::InvalidUrl(e.to_string()))?;
        let base_url = format!(
            "{}://{}",
            parsed.scheme(),
            parsed
                .host_str()
                .ok_or_else(|| FeedgrabError::InvalidUrl("Missing host".to_string()))?
        );

        let mut last_error = FeedgrabError::FeedParse("No valid feed found".to_string());

        for pattern in FEED_PATTERNS {
            let feed_url = format!("{}{}", base_url, pattern);

            // Check if URL returns success before trying to parse
            match self.client.head(&feed_url).send() {
                Ok(response) if response.status().is_success() => {
                    match self.fetch_and_parse(&feed_url) {
                        Ok(feed) => return Ok((feed_url, feed)),
                        Err(e) => last_error = e,
                    }
                }
                _ => continue,
            }
        }

        Err(last_error)
    }

    fn fetch_and_parse(&self, url: &str) -> FeedgrabResult<feed_rs::model::Feed> {
        let response = self.client.get(url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        Self::parse_bytes(&bytes)
    }

    fn parse_bytes(bytes: &[u8]) -> FeedgrabResult<feed_rs::model::Feed> {
        // Items without a guid keep an empty id so the article derives its own
        parser::Builder::new()
            .id_generator(|_, _, _| String::new())
            .build()
            .parse(bytes)
            .map_err(|e| FeedgrabError::FeedParse(e.to_string()))
    }

    fn items_from_bytes(bytes: &[u8]) -> FeedgrabResult<Vec<ArticleFields>> {
        let parsed = Self::parse_bytes(bytes)?;
        Ok(parsed.entries.into_iter().map(Self::entry_fields).collect())
    }

    fn entry_fields(entry: Entry) -> ArticleFields {
        let mut fields = ArticleFields::new();

        let torrent_url = Self::torrent_url(&entry);
        let link = entry
            .links
            .iter()
            .find(|l| l.rel.as_deref() != Some("enclosure"))
            .map(|l| l.href.clone())
            .unwrap_or_default();

        fields.insert(KEY_ID.to_string(), FieldValue::Text(entry.id));

        if let Some(date) = entry.published.or(entry.updated) {
            fields.insert(KEY_DATE.to_string(), FieldValue::Date(date.into()));
        }

        if let Some(title) = entry.title {
            fields.insert(KEY_TITLE.to_string(), FieldValue::Text(title.content));
        }

        if let Some(author) = entry.authors.into_iter().next() {
            fields.insert(KEY_AUTHOR.to_string(), FieldValue::Text(author.name));
        }

        let description = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body));
        if let Some(description) = description {
            fields.insert(KEY_DESCRIPTION.to_string(), FieldValue::Text(description));
        }

        fields.insert(KEY_TORRENT_URL.to_string(), FieldValue::Text(torrent_url));
        fields.insert(KEY_LINK.to_string(), FieldValue::Text(link));

        fields
    }

    /// Enclosure or link that points at a torrent, if the entry has one
    fn torrent_url(entry: &Entry) -> String {
        let from_media = entry
            .media
            .iter()
            .flat_map(|m| m.content.iter())
            .find_map(|c| {
                let url = c.url.as_ref()?.as_str();
                let mime = c.content_type.as_ref().map(|m| m.essence().to_string());
                is_torrent(url, mime.as_deref()).then(|| url.to_string())
            });

        from_media
            .or_else(|| {
                entry
                    .links
                    .iter()
                    .find(|l| is_torrent(&l.href, l.media_type.as_deref()))
                    .map(|l| l.href.clone())
            })
            .unwrap_or_default()
    }

    fn determine_feed_type(feed: &feed_rs::model::Feed) -> FeedType {
        match feed.feed_type {
            feed_rs::model::FeedType::Atom => FeedType::Atom,
            feed_rs::model::FeedType::JSON => FeedType::Json,
            _ => FeedType::Rss,
        }
    }
}

fn is_torrent(url: &str, mime: Option<&str>) -> bool {
    mime.map(|m| m.eq_ignore_ascii_case(TORRENT_MIME))
        .unwrap_or(false)
        || url.starts_with("magnet:")
        || url
            .split(['?', '#'])
            .next()
            .map(|path| path.to_ascii_lowercase().ends_with(".torrent"))
            .unwrap_or(false)
}

impl Default for RssAtomSource {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedSource for RssAtomSource {
    fn validate(&self, url: &str) -> FeedgrabResult<FeedMetadata> {
        let (feed_url, feed) = self.discover_feed_url(url)?;

        let feed_type = Self::determine_feed_type(&feed);

        let title = feed
            .title
            .map(|t| t.content)
            .unwrap_or_else(|| "Untitled Feed".to_string());

        let description = feed.description.map(|d| d.content);

        Ok(FeedMetadata {
            title,
            feed_type,
            feed_url,
            description,
        })
    }

    fn fetch_items(&self, feed: &Feed) -> FeedgrabResult<Vec<ArticleFields>> {
        let response = self.client.get(&feed.feed_url).send()?.error_for_status()?;
        let bytes = response.bytes()?;

        Self::items_from_bytes(&bytes)
    }
}
