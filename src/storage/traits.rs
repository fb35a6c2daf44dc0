use crate::domain::{ArticleDocument, DownloadRule, Feed, QueuedDownload};
use crate::errors::FeedgrabResult;

#[cfg_attr(test, mockall::automock)]
pub trait FeedRepository: Send + Sync {
    fn add(&self, feed: &Feed) -> FeedgrabResult<i64>;
    fn remove(&self, id: i64) -> FeedgrabResult<()>;
    fn get_all(&self) -> FeedgrabResult<Vec<Feed>>;
    fn get_by_id(&self, id: i64) -> FeedgrabResult<Option<Feed>>;
    fn get_by_url(&self, url: &str) -> FeedgrabResult<Option<Feed>>;
    fn exists(&self, url: &str) -> FeedgrabResult<bool>;
}

#[cfg_attr(test, mockall::automock)]
pub trait ArticleRepository: Send + Sync {
    /// Documents stored for a feed, in the order they were saved.
    fn load(&self, feed_id: i64) -> FeedgrabResult<Vec<ArticleDocument>>;
    /// Replace everything stored for a feed.
    fn replace_all(
        &self,
        feed_id: i64,
        documents: &[(String, ArticleDocument)],
    ) -> FeedgrabResult<()>;
}

#[cfg_attr(test, mockall::automock)]
pub trait RuleRepository: Send + Sync {
    fn add(&self, rule: &DownloadRule) -> FeedgrabResult<i64>;
    fn remove(&self, name: &str) -> FeedgrabResult<bool>;
    fn get_all(&self) -> FeedgrabResult<Vec<DownloadRule>>;
}

#[cfg_attr(test, mockall::automock)]
pub trait DownloadQueueRepository: Send + Sync {
    /// Returns false when the torrent URL is already queued.
    fn enqueue(&self, download: &QueuedDownload) -> FeedgrabResult<bool>;
    fn get_all(&self) -> FeedgrabResult<Vec<QueuedDownload>>;
}
