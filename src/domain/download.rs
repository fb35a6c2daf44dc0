use serde::{Deserialize, Serialize};

use super::{Article, Feed};

/// A torrent handed over to the download queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedDownload {
    pub id: Option<i64>,
    pub feed_id: i64,
    pub feed_title: String,
    pub guid: String,
    pub title: String,
    pub torrent_url: String,
    pub rule_name: String,
    pub queued_at: Option<String>,
}

impl QueuedDownload {
    pub fn from_article(feed_id: i64, feed: &Feed, article: &Article, rule_name: &str) -> Self {
        Self {
            id: None,
            feed_id,
            feed_title: feed.title.clone(),
            guid: article.guid().to_string(),
            title: article.title().to_string(),
            torrent_url: article.torrent_url().to_string(),
            rule_name: rule_name.to_string(),
            queued_at: None,
        }
    }

    /// Format: "{feedTitle} {articleTitle} [{rule}]: {torrentUrl}"
    pub fn format(&self) -> String {
        let mut line = format!("{} {}", self.feed_title, self.title);

        if !self.rule_name.is_empty() {
            line.push_str(&format!(" [{}]", self.rule_name));
        }

        line.push_str(": ");
        line.push_str(&self.torrent_url);
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArticleFactory, ChangeNotifier, FeedType, FieldValue};

    #[test]
    fn test_from_article_uses_effective_torrent_url() {
        let feed = Feed::new(
            "https://tracker.example/rss".to_string(),
            "https://tracker.example/rss".to_string(),
            "Tracker".to_string(),
            FeedType::Rss,
        );
        let factory = ArticleFactory::new(feed.feed_ref(), ChangeNotifier::new());
        let article = factory
            .from_fields(
                [
                    ("title".to_string(), FieldValue::from("Debian 12")),
                    ("link".to_string(), FieldValue::from("https://tracker.example/d12")),
                ]
                .into_iter()
                .collect(),
            )
            .unwrap();

        let download = QueuedDownload::from_article(7, &feed, &article, "debian");

        assert_eq!(download.feed_id, 7);
        assert_eq!(download.guid, "Debian 12");
        assert_eq!(download.torrent_url, "https://tracker.example/d12");
    }

    #[test]
    fn test_format() {
        let download = QueuedDownload {
            id: None,
            feed_id: 1,
            feed_title: "Tracker".to_string(),
            guid: "g".to_string(),
            title: "Debian 12".to_string(),
            torrent_url: "https://t/d12.torrent".to_string(),
            rule_name: "debian".to_string(),
            queued_at: None,
        };

        assert_eq!(download.format(), "Tracker Debian 12 [debian]: https://t/d12.torrent");
    }

    #[test]
    fn test_format_without_rule() {
        let download = QueuedDownload {
            id: None,
            feed_id: 1,
            feed_title: "Tracker".to_string(),
            guid: "g".to_string(),
            title: "Debian 12".to_string(),
            torrent_url: "magnet:?xt=urn:btih:abc".to_string(),
            rule_name: String::new(),
            queued_at: None,
        };

        assert_eq!(download.format(), "Tracker Debian 12: magnet:?xt=urn:btih:abc");
    }
}
