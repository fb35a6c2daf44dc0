use crate::domain::{Feed, FeedType};
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::FeedRepository;

const SELECT_FEED: &str = "SELECT id, url, feed_url, title, feed_type, created_at FROM feeds";

pub struct SqliteFeedRepository {
    storage: SqliteStorage,
}

impl SqliteFeedRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }

    fn map_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Feed> {
        let feed_type_str: String = row.get(4)?;

        Ok(Feed {
            id: Some(row.get(0)?),
            url: row.get(1)?,
            feed_url: row.get(2)?,
            title: row.get(3)?,
            feed_type: feed_type_str.parse().unwrap_or(FeedType::Rss),
            created_at: row.get(5)?,
        })
    }

    fn query_one(&self, clause: &str, param: &dyn rusqlite::ToSql) -> FeedgrabResult<Option<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("{} {}", SELECT_FEED, clause))?;

        match stmt.query_row([param], Self::map_row) {
            Ok(f) => Ok(Some(f)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(FeedgrabError::from(e)),
        }
    }
}

impl FeedRepository for SqliteFeedRepository {
    fn add(&self, feed: &Feed) -> FeedgrabResult<i64> {
        let conn = self.storage.connection()?;

        // Check if already exists (within the same connection to avoid deadlock)
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)")?;
        let exists: bool = stmt.query_row([&feed.url], |row| row.get(0))?;
        drop(stmt);

        if exists {
            return Err(FeedgrabError::FeedAlreadyExists(feed.url.clone()));
        }

        conn.execute(
            "INSERT INTO feeds (url, feed_url, title, feed_type) VALUES (?1, ?2, ?3, ?4)",
            (&feed.url, &feed.feed_url, &feed.title, feed.feed_type.as_str()),
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn remove(&self, id: i64) -> FeedgrabResult<()> {
        let conn = self.storage.connection()?;
        conn.execute("DELETE FROM feeds WHERE id = ?1", [id])?;
        Ok(())
    }

    fn get_all(&self) -> FeedgrabResult<Vec<Feed>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY id", SELECT_FEED))?;

        let feeds = stmt.query_map([], Self::map_row)?;

        feeds.collect::<Result<Vec<_>, _>>().map_err(FeedgrabError::from)
    }

    fn get_by_id(&self, id: i64) -> FeedgrabResult<Option<Feed>> {
        self.query_one("WHERE id = ?1", &id)
    }

    fn get_by_url(&self, url: &str) -> FeedgrabResult<Option<Feed>> {
        self.query_one("WHERE url = ?1", &url)
    }

    fn exists(&self, url: &str) -> FeedgrabResult<bool> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare("SELECT EXISTS(SELECT 1 FROM feeds WHERE url = ?1)")?;
        let exists: bool = stmt.query_row([url], |row| row.get(0))?;
        Ok(exists)
    }
}
