use crate::domain::ArticleDocument;
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::ArticleRepository;

pub struct SqliteArticleRepository {
    storage: SqliteStorage,
}

impl SqliteArticleRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl ArticleRepository for SqliteArticleRepository {
    fn load(&self, feed_id: i64) -> FeedgrabResult<Vec<ArticleDocument>> {
        let conn = self.storage.connection()?;
        let mut stmt =
            conn.prepare("SELECT document FROM articles WHERE feed_id = ?1 ORDER BY id")?;

        let rows = stmt.query_map([feed_id], |row| row.get::<_, String>(0))?;

        let mut documents = Vec::new();
        for row in rows {
            let text = row?;
            match serde_json::from_str::<ArticleDocument>(&text) {
                Ok(document) => documents.push(document),
                Err(e) => tracing::warn!(feed_id, error = %e, "skipping unreadable article document"),
            }
        }

        Ok(documents)
    }

    fn replace_all(
        &self,
        feed_id: i64,
        documents: &[(String, ArticleDocument)],
    ) -> FeedgrabResult<()> {
        let mut conn = self.storage.connection()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM articles WHERE feed_id = ?1", [feed_id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO articles (feed_id, guid, document) VALUES (?1, ?2, ?3)",
            )?;
            for (guid, document) in documents {
                let text = serde_json::to_string(document)?;
                stmt.execute((feed_id, guid, text))?;
            }
        }

        tx.commit().map_err(FeedgrabError::from)
    }
}
