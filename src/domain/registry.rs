use std::collections::HashMap;

use super::{Article, ArticleDocument, ArticleFactory, ChangeNotifier, FeedRef};
use crate::errors::{FeedgrabError, FeedgrabResult};

/// Articles owned by a single feed, keyed by guid in insertion order.
///
/// The first article registered for a guid is kept; later ones with the same
/// guid are rejected so re-polling a feed never turns old items into new ones.
/// With a cap set, a full registry also rejects articles that pruning would
/// drop straight away.
#[derive(Debug)]
pub struct FeedArticles {
    factory: ArticleFactory,
    notifier: ChangeNotifier,
    max_articles: Option<usize>,
    articles: Vec<Article>,
    index: HashMap<String, usize>,
}

impl FeedArticles {
    pub fn new(feed: FeedRef, notifier: ChangeNotifier) -> Self {
        Self {
            factory: ArticleFactory::new(feed, notifier.clone()),
            notifier,
            max_articles: None,
            articles: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn with_max_articles(mut self, max: usize) -> Self {
        self.max_articles = Some(max);
        self
    }

    pub fn feed(&self) -> &FeedRef {
        self.factory.feed()
    }

    /// Factory producing articles bound to this feed and its notifier.
    pub fn factory(&self) -> &ArticleFactory {
        &self.factory
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    pub fn register(&mut self, article: Article) -> FeedgrabResult<&Article> {
        if article.feed() != self.feed() {
            return Err(FeedgrabError::ForeignArticle(format!(
                "{} from {}",
                article.guid(),
                article.feed()
            )));
        }

        if self.index.contains_key(article.guid()) {
            return Err(FeedgrabError::DuplicateArticle(article.guid().to_string()));
        }

        if !self.is_recent_enough(&article) {
            return Err(FeedgrabError::OutdatedArticle(article.guid().to_string()));
        }

        let position = self.articles.len();
        self.index.insert(article.guid().to_string(), position);
        self.articles.push(article);

        let article = &self.articles[position];
        self.notifier.notify_added(article);
        Ok(article)
    }

    pub fn contains(&self, guid: &str) -> bool {
        self.index.contains_key(guid)
    }

    pub fn get(&self, guid: &str) -> Option<&Article> {
        self.index.get(guid).map(|&i| &self.articles[i])
    }

    /// Returns `None` for an unknown guid, otherwise whether the article changed.
    pub fn mark_read(&mut self, guid: &str) -> Option<bool> {
        let position = *self.index.get(guid)?;
        Some(self.articles[position].mark_as_read())
    }

    pub fn remove(&mut self, guid: &str) -> Option<Article> {
        let position = self.index.remove(guid)?;
        let article = self.articles.remove(position);
        self.reindex();
        Some(article)
    }

    /// Keep the `max` newest articles. Undated articles count as oldest.
    /// Returns how many were dropped.
    pub fn prune(&mut self, max: usize) -> usize {
        if self.articles.len() <= max {
            return 0;
        }

        let mut order: Vec<usize> = (0..self.articles.len()).collect();
        // Stable sort keeps insertion order among equal dates
        order.sort_by(|&a, &b| {
            self.articles[b]
                .published_at()
                .cmp(&self.articles[a].published_at())
        });

        let mut keep = vec![false; self.articles.len()];
        for &i in order.iter().take(max) {
            keep[i] = true;
        }

        let before = self.articles.len();
        let mut flags = keep.into_iter();
        self.articles.retain(|_| flags.next().unwrap_or(false));
        self.reindex();

        before - self.articles.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter()
    }

    pub fn unread(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter().filter(|a| !a.is_read())
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    pub fn documents(&self) -> Vec<ArticleDocument> {
        self.articles.iter().map(Article::to_document).collect()
    }

    /// Below the cap anything goes. At the cap the article must be newer than
    /// the oldest article `prune` would keep; undated articles rank oldest.
    fn is_recent_enough(&self, article: &Article) -> bool {
        let Some(max) = self.max_articles else {
            return true;
        };
        if max == 0 || self.articles.len() < max {
            return true;
        }

        let mut dates: Vec<_> = self.articles.iter().map(Article::published_at).collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));

        match dates[max - 1] {
            Some(threshold) => article.is_newer_than(&threshold),
            None => article.published_at().is_some(),
        }
    }

    fn reindex(&mut self) {
        self.index = self
            .articles
            .iter()
            .enumerate()
            .map(|(i, a)| (a.guid().to_string(), i))
            .collect();
    }
}
