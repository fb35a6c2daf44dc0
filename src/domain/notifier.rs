use std::sync::{Arc, Mutex, MutexGuard};

use super::Article;

/// Receives article lifecycle events from a feed.
///
/// Events are delivered synchronously on the thread that caused them.
pub trait ArticleListener: Send + Sync {
    /// An article went from unread to read.
    fn on_read(&self, article: &Article);

    /// A feed accepted an article it had not seen before.
    fn on_added(&self, _article: &Article) {}
}

/// Shared handle to the listeners of one feed. Clones dispatch to the same list.
#[derive(Clone, Default)]
pub struct ChangeNotifier {
    listeners: Arc<Mutex<Vec<Arc<dyn ArticleListener>>>>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Arc<dyn ArticleListener>) {
        self.lock().push(listener);
    }

    pub fn listener_count(&self) -> usize {
        self.lock().len()
    }

    pub fn notify_read(&self, article: &Article) {
        for listener in self.snapshot() {
            listener.on_read(article);
        }
    }

    pub fn notify_added(&self, article: &Article) {
        for listener in self.snapshot() {
            listener.on_added(article);
        }
    }

    // Released before dispatch so listeners may subscribe others.
    fn snapshot(&self) -> Vec<Arc<dyn ArticleListener>> {
        self.lock().clone()
    }

    // A panic elsewhere cannot leave the list half-written, so poisoning is
    // logged and the list used as is.
    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn ArticleListener>>> {
        self.listeners.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("article listener list was poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

/// Listener that records the guid of every event it sees.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingListener {
    read: Mutex<Vec<String>>,
    added: Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guids of articles marked read, in notification order.
    pub fn read(&self) -> Vec<String> {
        self.read.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Guids of articles added, in notification order.
    pub fn added(&self) -> Vec<String> {
        self.added.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
impl ArticleListener for RecordingListener {
    fn on_read(&self, article: &Article) {
        if let Ok(mut read) = self.read.lock() {
            read.push(article.guid().to_string());
        }
    }

    fn on_added(&self, article: &Article) {
        if let Ok(mut added) = self.added.lock() {
            added.push(article.guid().to_string());
        }
    }
}
