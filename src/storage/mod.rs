pub mod traits;
pub mod sqlite;

pub use traits::{ArticleRepository, DownloadQueueRepository, FeedRepository, RuleRepository};
pub use sqlite::{
    SqliteArticleRepository, SqliteDownloadQueueRepository, SqliteFeedRepository,
    SqliteRuleRepository, SqliteStorage,
};
