use crate::domain::{ArticleFields, Feed, FeedType};
use crate::errors::FeedgrabResult;

#[derive(Debug, Clone)]
pub struct FeedMetadata {
    pub title: String,
    pub feed_type: FeedType,
    pub feed_url: String,
    pub description: Option<String>,
}

#[cfg_attr(test, mockall::automock)]
pub trait FeedSource: Send + Sync {
    /// Validate that the URL points to a valid feed and return metadata
    fn validate(&self, url: &str) -> FeedgrabResult<FeedMetadata>;

    /// Fetch the feed and return one field bag per item
    fn fetch_items(&self, feed: &Feed) -> FeedgrabResult<Vec<ArticleFields>>;
}
