pub mod download_service;
pub mod feed_service;
pub mod fetch_service;

pub use download_service::{AutoDownloader, DownloadService, PendingDownload};
pub use feed_service::FeedService;
pub use fetch_service::{FetchService, PollReport};
