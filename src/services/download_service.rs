use std::sync::Mutex;

use crate::domain::{
    Article, ArticleListener, DownloadRule, Feed, FeedArticles, QueuedDownload, RuleMatcher,
};
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::storage::traits::{DownloadQueueRepository, RuleRepository};

/// A newly added article that matched a rule and is waiting to be queued
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDownload {
    pub guid: String,
    pub rule_name: String,
}

/// Listens for new articles and remembers the ones a rule wants downloaded.
///
/// Matching happens inside the `added` notification; queuing and marking read
/// happen afterwards in [`DownloadService::process`], once the feed is no
/// longer mid-registration.
#[derive(Debug)]
pub struct AutoDownloader {
    rules: Vec<RuleMatcher>,
    pending: Mutex<Vec<PendingDownload>>,
}

impl AutoDownloader {
    pub fn new(rules: Vec<RuleMatcher>) -> Self {
        Self {
            rules,
            pending: Mutex::new(Vec::new()),
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    /// Drain every match collected so far
    pub fn take_pending(&self) -> Vec<PendingDownload> {
        self.pending
            .lock()
            .map(|mut p| std::mem::take(&mut *p))
            .unwrap_or_default()
    }
}

impl ArticleListener for AutoDownloader {
    fn on_read(&self, _article: &Article) {}

    fn on_added(&self, article: &Article) {
        if article.is_read() || article.torrent_url().is_empty() {
            return;
        }

        let Some(rule) = self.rules.iter().find(|r| r.matches(article)) else {
            return;
        };

        tracing::debug!(guid = article.guid(), rule = rule.name(), "rule matched");
        if let Ok(mut pending) = self.pending.lock() {
            pending.push(PendingDownload {
                guid: article.guid().to_string(),
                rule_name: rule.name().to_string(),
            });
        }
    }
}

pub struct DownloadService<R: RuleRepository, Q: DownloadQueueRepository> {
    rule_repository: R,
    queue_repository: Q,
}

impl<R: RuleRepository, Q: DownloadQueueRepository> DownloadService<R, Q> {
    pub fn new(rule_repository: R, queue_repository: Q) -> Self {
        Self {
            rule_repository,
            queue_repository,
        }
    }

    /// Build a downloader from the enabled rules
    pub fn auto_downloader(&self) -> FeedgrabResult<AutoDownloader> {
        let rules = self
            .rule_repository
            .get_all()?
            .iter()
            .filter(|r| r.enabled)
            .map(DownloadRule::compile)
            .collect::<FeedgrabResult<Vec<_>>>()?;

        Ok(AutoDownloader::new(rules))
    }

    /// Queue the downloader's pending matches for this feed and mark them read.
    ///
    /// Returns the downloads that were newly queued. A torrent already in the
    /// queue is not queued again but its article is still marked read.
    pub fn process(
        &self,
        downloader: &AutoDownloader,
        feed: &Feed,
        articles: &mut FeedArticles,
    ) -> FeedgrabResult<Vec<QueuedDownload>> {
        let feed_id = feed
            .id
            .ok_or_else(|| FeedgrabError::FeedNotFound("Feed has no ID".to_string()))?;
        let mut queued = Vec::new();

        for pending in downloader.take_pending() {
            let Some(article) = articles.get(&pending.guid) else {
                tracing::debug!(guid = %pending.guid, "matched article no longer registered");
                continue;
            };

            let download =
                QueuedDownload::from_article(feed_id, feed, article, &pending.rule_name);
            if self.queue_repository.enqueue(&download)? {
                tracing::info!(torrent = %download.torrent_url, rule = %download.rule_name, "queued");
                queued.push(download);
            }

            if articles.mark_read(&pending.guid) == Some(false) {
                tracing::debug!(guid = %pending.guid, "matched article was already read");
            }
        }

        Ok(queued)
    }

    /// Preview what `process` would queue, without touching anything
    pub fn preview(
        &self,
        downloader: &AutoDownloader,
        feed: &Feed,
        articles: &FeedArticles,
    ) -> Vec<QueuedDownload> {
        let feed_id = feed.id.unwrap_or_default();

        downloader
            .take_pending()
            .into_iter()
            .filter_map(|pending| {
                articles.get(&pending.guid).map(|article| {
                    QueuedDownload::from_article(feed_id, feed, article, &pending.rule_name)
                })
            })
            .collect()
    }

    pub fn add_rule(&self, rule: &DownloadRule) -> FeedgrabResult<DownloadRule> {
        // Reject bad patterns before they are stored
        rule.compile()?;
        let id = self.rule_repository.add(rule)?;

        Ok(DownloadRule {
            id: Some(id),
            ..rule.clone()
        })
    }

    pub fn remove_rule(&self, name: &str) -> FeedgrabResult<()> {
        if self.rule_repository.remove(name)? {
            Ok(())
        } else {
            Err(FeedgrabError::RuleNotFound(name.to_string()))
        }
    }

    pub fn list_rules(&self) -> FeedgrabResult<Vec<DownloadRule>> {
        self.rule_repository.get_all()
    }

    pub fn queue(&self) -> FeedgrabResult<Vec<QueuedDownload>> {
        self.queue_repository.get_all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        ArticleFields, ChangeNotifier, FeedRef, FeedType, FieldValue, RecordingListener,
    };
    use crate::storage::sqlite::{
        SqliteDownloadQueueRepository, SqliteFeedRepository, SqliteRuleRepository, SqliteStorage,
    };
    use crate::storage::traits::{FeedRepository, MockDownloadQueueRepository, MockRuleRepository};
    use std::sync::Arc;

    fn setup() -> (DownloadService<SqliteRuleRepository, SqliteDownloadQueueRepository>, Feed) {
        let storage = SqliteStorage::in_memory().unwrap();
        let mut feed = Feed::new(
            "https://tracker.example/rss".to_string(),
            "https://tracker.example/rss".to_string(),
            "Tracker".to_string(),
            FeedType::Rss,
        );
        feed.id = Some(SqliteFeedRepository::new(storage.clone()).add(&feed).unwrap());

        let service = DownloadService::new(
            SqliteRuleRepository::new(storage.clone()),
            SqliteDownloadQueueRepository::new(storage),
        );
        (service, feed)
    }

    fn item(pairs: &[(&str, &str)]) -> ArticleFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    fn register(articles: &mut FeedArticles, pairs: &[(&str, &str)]) {
        let article = articles.factory().from_fields(item(pairs)).unwrap();
        articles.register(article).unwrap();
    }

    #[test]
    fn test_matching_articles_are_queued_and_read() {
        let (service, feed) = setup();
        service
            .add_rule(&DownloadRule::new("debian".to_string()).with_must_contain("debian"))
            .unwrap();

        let downloader = Arc::new(service.auto_downloader().unwrap());
        let listener = Arc::new(RecordingListener::new());
        let notifier = ChangeNotifier::new();
        notifier.subscribe(downloader.clone());
        notifier.subscribe(listener.clone());
        let mut articles = FeedArticles::new(feed.feed_ref(), notifier);

        register(
            &mut articles,
            &[("id", "d12"), ("title", "Debian 12"), ("torrentURL", "https://t/d12.torrent")],
        );
        register(
            &mut articles,
            &[("id", "f39"), ("title", "Fedora 39"), ("torrentURL", "https://t/f39.torrent")],
        );

        let queued = service.process(&downloader, &feed, &mut articles).unwrap();

        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].torrent_url, "https://t/d12.torrent");
        assert_eq!(queued[0].rule_name, "debian");
        assert!(articles.get("d12").unwrap().is_read());
        assert!(!articles.get("f39").unwrap().is_read());
        assert_eq!(listener.read(), vec!["d12"]);
        assert_eq!(service.queue().unwrap().len(), 1);
        assert!(downloader.take_pending().is_empty());
    }

    #[test]
    fn test_link_fallback_used_as_torrent_url() {
        let (service, feed) = setup();
        service.add_rule(&DownloadRule::new("all".to_string())).unwrap();

        let downloader = Arc::new(service.auto_downloader().unwrap());
        let notifier = ChangeNotifier::new();
        notifier.subscribe(downloader.clone());
        let mut articles = FeedArticles::new(feed.feed_ref(), notifier);

        register(&mut articles, &[("title", "Foo"), ("link", "http://a/b"), ("torrentURL", "")]);

        let queued = service.process(&downloader, &feed, &mut articles).unwrap();
        assert_eq!(queued[0].torrent_url, "http://a/b");
        assert_eq!(queued[0].guid, "Foo");
    }

    #[test]
    fn test_read_and_urlless_articles_ignored() {
        let downloader = Arc::new(AutoDownloader::new(vec![
            DownloadRule::new("all".to_string()).compile().unwrap(),
        ]));
        let notifier = ChangeNotifier::new();
        notifier.subscribe(downloader.clone());
        let mut articles = FeedArticles::new(FeedRef::new("https://tracker.example/rss"), notifier);

        register(&mut articles, &[("id", "seen"), ("link", "http://a/b"), ("isRead", "true")]);
        register(&mut articles, &[("id", "nowhere")]);

        assert!(downloader.take_pending().is_empty());
    }

    #[test]
    fn test_disabled_rules_are_not_loaded() {
        let (service, _) = setup();
        service.add_rule(&DownloadRule::new("on".to_string())).unwrap();
        service
            .add_rule(&DownloadRule::new("off".to_string()).with_enabled(false))
            .unwrap();

        assert_eq!(service.auto_downloader().unwrap().rule_count(), 1);
    }

    #[test]
    fn test_preview_does_not_queue() {
        let (service, feed) = setup();
        service.add_rule(&DownloadRule::new("all".to_string())).unwrap();

        let downloader = Arc::new(service.auto_downloader().unwrap());
        let notifier = ChangeNotifier::new();
        notifier.subscribe(downloader.clone());
        let mut articles = FeedArticles::new(feed.feed_ref(), notifier);
        register(&mut articles, &[("id", "1"), ("torrentURL", "magnet:?xt=urn:btih:abc")]);

        let preview = service.preview(&downloader, &feed, &articles);

        assert_eq!(preview.len(), 1);
        assert!(service.queue().unwrap().is_empty());
        assert!(!articles.get("1").unwrap().is_read());
    }

    #[test]
    fn test_already_queued_torrent_still_marks_read() {
        let mut queue = MockDownloadQueueRepository::new();
        queue.expect_enqueue().times(1).returning(|_| Ok(false));
        let service = DownloadService::new(MockRuleRepository::new(), queue);

        let downloader = Arc::new(AutoDownloader::new(vec![
            DownloadRule::new("all".to_string()).compile().unwrap(),
        ]));
        let notifier = ChangeNotifier::new();
        notifier.subscribe(downloader.clone());
        let mut feed = Feed::new(
            "https://tracker.example/rss".to_string(),
            "https://tracker.example/rss".to_string(),
            "Tracker".to_string(),
            FeedType::Rss,
        );
        feed.id = Some(1);
        let mut articles = FeedArticles::new(feed.feed_ref(), notifier);
        register(&mut articles, &[("id", "1"), ("torrentURL", "https://t/1.torrent")]);

        let queued = service.process(&downloader, &feed, &mut articles).unwrap();

        assert!(queued.is_empty());
        assert!(articles.get("1").unwrap().is_read());
    }

    #[test]
    fn test_removed_article_is_skipped() {
        let mut queue = MockDownloadQueueRepository::new();
        queue.expect_enqueue().never();
        let service = DownloadService::new(MockRuleRepository::new(), queue);

        let downloader = Arc::new(AutoDownloader::new(vec![
            DownloadRule::new("all".to_string()).compile().unwrap(),
        ]));
        let notifier = ChangeNotifier::new();
        notifier.subscribe(downloader.clone());
        let mut feed = Feed::new(
            "https://tracker.example/rss".to_string(),
            "https://tracker.example/rss".to_string(),
            "Tracker".to_string(),
            FeedType::Rss,
        );
        feed.id = Some(1);
        let mut articles = FeedArticles::new(feed.feed_ref(), notifier);
        register(&mut articles, &[("id", "1"), ("torrentURL", "https://t/1.torrent")]);
        articles.remove("1");

        let queued = service.process(&downloader, &feed, &mut articles).unwrap();

        assert!(queued.is_empty());
        assert!(downloader.take_pending().is_empty());
    }

    #[test]
    fn test_add_rule_rejects_bad_pattern() {
        let mut rules = MockRuleRepository::new();
        rules.expect_add().never();
        let service = DownloadService::new(rules, MockDownloadQueueRepository::new());

        let rule = DownloadRule::new("bad".to_string()).with_must_contain("[z-a]");
        let result = service.add_rule(&rule);

        assert!(matches!(result, Err(FeedgrabError::InvalidPattern(_))));
    }

    #[test]
    fn test_remove_unknown_rule() {
        let (service, _) = setup();
        assert!(matches!(
            service.remove_rule("ghost"),
            Err(FeedgrabError::RuleNotFound(_))
        ));
    }
}
