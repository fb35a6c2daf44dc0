use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedType {
    Rss,
    Atom,
    Json,
}

impl FeedType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedType::Rss => "rss",
            FeedType::Atom => "atom",
            FeedType::Json => "json",
        }
    }
}

impl std::str::FromStr for FeedType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rss" => Ok(FeedType::Rss),
            "atom" => Ok(FeedType::Atom),
            "json" => Ok(FeedType::Json),
            _ => Err(format!("Unknown feed type: {}", s)),
        }
    }
}

impl std::fmt::Display for FeedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feed {
    pub id: Option<i64>,
    pub url: String,
    pub feed_url: String,
    pub title: String,
    pub feed_type: FeedType,
    pub created_at: Option<String>,
}

impl Feed {
    pub fn new(url: String, feed_url: String, title: String, feed_type: FeedType) -> Self {
        Self {
            id: None,
            url,
            feed_url,
            title,
            feed_type,
            created_at: None,
        }
    }

    pub fn feed_ref(&self) -> FeedRef {
        FeedRef::new(self.url.clone())
    }
}

/// Non-owning handle from an article back to the feed it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeedRef {
    url: String,
}

impl FeedRef {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl std::fmt::Display for FeedRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.url)
    }
}
