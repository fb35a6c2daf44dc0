mod article_repository;
mod connection;
mod download_queue_repository;
mod feed_repository;
mod rule_repository;

pub use article_repository::SqliteArticleRepository;
pub use connection::SqliteStorage;
pub use download_queue_repository::SqliteDownloadQueueRepository;
pub use feed_repository::SqliteFeedRepository;
pub use rule_repository::SqliteRuleRepository;
