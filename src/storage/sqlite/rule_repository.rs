use crate::domain::DownloadRule;
use crate::errors::{FeedgrabError, FeedgrabResult};
use crate::storage::sqlite::SqliteStorage;
use crate::storage::traits::RuleRepository;

pub struct SqliteRuleRepository {
    storage: SqliteStorage,
}

impl SqliteRuleRepository {
    pub fn new(storage: SqliteStorage) -> Self {
        Self { storage }
    }
}

impl RuleRepository for SqliteRuleRepository {
    fn add(&self, rule: &DownloadRule) -> FeedgrabResult<i64> {
        let conn = self.storage.connection()?;

        let mut stmt =
            conn.prepare("SELECT EXISTS(SELECT 1 FROM download_rules WHERE name = ?1)")?;
        let exists: bool = stmt.query_row([&rule.name], |row| row.get(0))?;
        drop(stmt);

        if exists {
            return Err(FeedgrabError::RuleAlreadyExists(rule.name.clone()));
        }

        conn.execute(
            "INSERT INTO download_rules (name, must_contain, must_not_contain, feed_url, enabled) VALUES (?1, ?2, ?3, ?4, ?5)",
            (
                &rule.name,
                &rule.must_contain,
                &rule.must_not_contain,
                &rule.feed_url,
                rule.enabled,
            ),
        )?;

        Ok(conn.last_insert_rowid())
    }

    fn remove(&self, name: &str) -> FeedgrabResult<bool> {
        let conn = self.storage.connection()?;
        let removed = conn.execute("DELETE FROM download_rules WHERE name = ?1", [name])?;
        Ok(removed > 0)
    }

    fn get_all(&self) -> FeedgrabResult<Vec<DownloadRule>> {
        let conn = self.storage.connection()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, must_contain, must_not_contain, feed_url, enabled FROM download_rules ORDER BY id",
        )?;

        let rules = stmt.query_map([], |row| {
            Ok(DownloadRule {
                id: Some(row.get(0)?),
                name: row.get(1)?,
                must_contain: row.get(2)?,
                must_not_contain: row.get(3)?,
                feed_url: row.get(4)?,
                enabled: row.get(5)?,
            })
        })?;

        rules.collect::<Result<Vec<_>, _>>().map_err(FeedgrabError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_repo() -> SqliteRuleRepository {
        SqliteRuleRepository::new(SqliteStorage::in_memory().unwrap())
    }

    #[test]
    fn test_add_and_list_rules() {
        let repo = setup_repo();
        let rule = DownloadRule::new("debian".to_string())
            .with_must_contain("debian")
            .with_must_not_contain("testing")
            .with_feed_url(Some("https://tracker.example/rss".to_string()));

        let id = repo.add(&rule).unwrap();

        let rules = repo.get_all().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0], DownloadRule { id: Some(id), ..rule });
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let repo = setup_repo();
        let rule = DownloadRule::new("debian".to_string());

        repo.add(&rule).unwrap();
        assert!(matches!(repo.add(&rule), Err(FeedgrabError::RuleAlreadyExists(_))));
    }

    #[test]
    fn test_remove_rule() {
        let repo = setup_repo();
        repo.add(&DownloadRule::new("debian".to_string())).unwrap();

        assert!(repo.remove("debian").unwrap());
        assert!(!repo.remove("debian").unwrap());
        assert!(repo.get_all().unwrap().is_empty());
    }
}
