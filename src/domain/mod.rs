pub mod article;
pub mod download;
pub mod factory;
pub mod feed;
pub mod notifier;
pub mod registry;
pub mod rule;

pub use article::{Article, ArticleDocument, ArticleFields, FieldValue};
pub use download::QueuedDownload;
pub use factory::ArticleFactory;
pub use feed::{Feed, FeedRef, FeedType};
pub use notifier::{ArticleListener, ChangeNotifier};
pub use registry::FeedArticles;
pub use rule::{DownloadRule, RuleMatcher};

#[cfg(test)]
pub use notifier::RecordingListener;
