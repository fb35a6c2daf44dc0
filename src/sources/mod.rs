pub mod traits;
pub mod rss_atom;

pub use traits::{FeedMetadata, FeedSource};
pub use rss_atom::RssAtomSource;

#[cfg(test)]
pub use traits::MockFeedSource;
