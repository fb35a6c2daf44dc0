use crate::domain::QueuedDownload;
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::DownloadQueueRepository;

pub struct SqliteDownloadQueueRepository {
    storage: SqliteStorage,
}

impl SqliteDownloadQueueRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl DownloadQueueRepository for SqliteDownloadQueueRepository {
    fn enqueue(&self, download: &QueuedDownload) -> FeedgrabResult<bool> {
        let conn = self.storage.connection()?;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO download_queue (torrent_url, feed_id, feed_title, guid, title, rule_name) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            (
                &download.torrent_url,
                download.feed_id,
                &download.feed_title,
                &download.guid,
                &download.title,
                &download.rule_name,
            ),
        )?;
        Ok(inserted > 0)
    }

    fn get_all(&self) -> FeedgrabResult<Vec<QueuedDownload>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, feed_id, feed_title, guid, title, torrent_url, rule_name, queued_at FROM download_queue ORDER BY id",
        )?;

        let downloads = stmt.query_map([], |row| {
            Ok(QueuedDownload {
                id: Some(row.get(0)?),
                feed_id: row.get(1)?,
                feed_title: row.get(2)?,
                guid: row.get(3)?,
                title: row.get(4)?,
                torrent_url: row.get(5)?,
                rule_name: row.get(6)?,
                queued_at: row.get(7)?,
            })
        })?;

        downloads
            .collect::<Result<Vec<_>, _>>()
            .map_err(FeedgrabError::from)
    }
}
