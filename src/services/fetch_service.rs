use crate::domain::{ChangeNotifier, Feed, FeedArticles};
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::sources::FeedSource;
use crate::storage::traits::ArticleRepository;

/// What a single poll of a feed did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub new_articles: usize,
    pub duplicates: usize,
    pub outdated: usize,
    pub malformed: usize,
}

pub struct FetchService<A: ArticleRepository, S: FeedSource> {
    article_repository: A,
    source: S,
    max_articles: usize,
}

impl<A: ArticleRepository, S: FeedSource> FetchService<A, S> {
    pub fn new(article_repository: A, source: S, max_articles: usize) -> Self {
        Self {
            article_repository,
            source,
            max_articles,
        }
    }

    /// Rebuild the stored articles of a feed.
    ///
    /// Registering them fires `added` on the notifier, so listeners that only
    /// care about fresh items should subscribe after this returns.
    pub fn load_articles(
        &self,
        feed: &Feed,
        notifier: ChangeNotifier,
    ) -> FeedgrabResult<FeedArticles> {
        let feed_id = Self::feed_id(feed)?;
        let mut articles =
            FeedArticles::new(feed.feed_ref(), notifier).with_max_articles(self.max_articles);

        for document in self.article_repository.load(feed_id)? {
            let article = match articles.factory().from_document(&document) {
                Ok(article) => article,
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "dropping stored article");
                    continue;
                }
            };

            if let Err(e) = articles.register(article) {
                tracing::debug!(feed = %feed.url, error = %e, "stored article ignored");
            }
        }

        Ok(articles)
    }

    /// Fetch the feed and register every item not seen before.
    ///
    /// Items without a usable identity, repeats of known guids and items too
    /// old to be kept are counted and skipped; none of them stops the poll.
    pub fn poll(&self, feed: &Feed, articles: &mut FeedArticles) -> FeedgrabResult<PollReport> {
        let items = self.source.fetch_items(feed)?;
        let mut report = PollReport::default();

        for fields in items {
            let article = match articles.factory().from_fields(fields) {
                Ok(article) => article,
                Err(e) => {
                    tracing::warn!(feed = %feed.url, error = %e, "skipping feed item");
                    report.malformed += 1;
                    continue;
                }
            };

            match articles.register(article) {
                Ok(article) => {
                    tracing::debug!(feed = %feed.url, guid = article.guid(), "new article");
                    report.new_articles += 1;
                }
                Err(FeedgrabError::DuplicateArticle(guid)) => {
                    tracing::debug!(feed = %feed.url, guid, "already known");
                    report.duplicates += 1;
                }
                Err(FeedgrabError::OutdatedArticle(guid)) => {
                    tracing::debug!(feed = %feed.url, guid, "older than kept articles");
                    report.outdated += 1;
                }
                Err(e) => return Err(e),
            }
        }

        Ok(report)
    }

    /// Prune to the configured cap and persist. Returns how many were pruned.
    pub fn save_articles(&self, feed: &Feed, articles: &mut FeedArticles) -> FeedgrabResult<usize> {
        let feed_id = Self::feed_id(feed)?;
        let pruned = articles.prune(self.max_articles);

        let documents: Vec<_> = articles
            .iter()
            .map(|a| (a.guid().to_string(), a.to_document()))
            .collect();
        self.article_repository.replace_all(feed_id, &documents)?;

        Ok(pruned)
    }

    fn feed_id(feed: &Feed) -> FeedgrabResult<i64> {
        feed.id
            .ok_or_else(|| FeedgrabError::FeedNotFound("Feed has no ID".to_string()))
    }
}
