use crate::domain::Feed;
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::sources::FeedSource;
use crate::storage::traits::FeedRepository;

pub struct FeedService<R: FeedRepository, S: FeedSource> {
    repository: R,
    source: S,
}

impl<R: FeedRepository, S: FeedSource> FeedService<R, S> {
    pub fn new(repository: R, source: S) -> Self {
        Self { repository, source }
    }

    /// Add a new feed by URL
    /// Validates the feed and stores it in the database
    pub fn add(&self, url: &str) -> FeedgrabResult<Feed> {
        if self.repository.exists(url)? {
            return Err(FeedgrabError::FeedAlreadyExists(url.to_string()));
        }

        let metadata = self.source.validate(url)?;

        let feed = Feed::new(
            url.to_string(),
            metadata.feed_url,
            metadata.title,
            metadata.feed_type,
        );

        let id = self.repository.add(&feed)?;
        tracing::info!(url, id, "feed added");

        Ok(Feed {
            id: Some(id),
            ..feed
        })
    }

    /// Remove a feed by ID. Its stored articles go with it.
    pub fn remove(&self, id: i64) -> FeedgrabResult<()> {
        self.repository.remove(id)
    }

    pub fn list(&self) -> FeedgrabResult<Vec<Feed>> {
        self.repository.get_all()
    }

    pub fn get(&self, id: i64) -> FeedgrabResult<Option<Feed>> {
        self.repository.get_by_id(id)
    }

    /// Look up a feed by the URL it was added with
    pub fn find(&self, url: &str) -> FeedgrabResult<Feed> {
        self.repository
            .get_by_url(url)?
            .ok_or_else(|| FeedgrabError::FeedNotFound(url.to_string()))
    }

    pub fn exists(&self, url: &str) -> FeedgrabResult<bool> {
        self.repository.exists(url)
    }
}
