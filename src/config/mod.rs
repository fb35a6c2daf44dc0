use crate::errors::{FeedgrabError, FeedgrabResult};

pub const DEFAULT_MAX_ARTICLES: usize = 50;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: String,
    pub max_articles_per_feed: usize,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> FeedgrabResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        // Default db_path is relative to executable directory
        let db_path = std::env::var("FEEDGRAB_DB_PATH").unwrap_or_else(|_| {
            exe_dir
                .map(|d| d.join("feedgrab.db").to_string_lossy().into_owned())
                .unwrap_or_else(|| "./feedgrab.db".to_string())
        });

        let max_articles_per_feed = match std::env::var("FEEDGRAB_MAX_ARTICLES") {
            Ok(value) => Self::parse_max_articles(&value)?,
            Err(_) => DEFAULT_MAX_ARTICLES,
        };

        Ok(Self {
            db_path,
            max_articles_per_feed,
        })
    }

    fn parse_max_articles(value: &str) -> FeedgrabResult<usize> {
        match value.trim().parse::<usize>() {
            Ok(0) => Err(FeedgrabError::Config(
                "FEEDGRAB_MAX_ARTICLES must be greater than zero".to_string(),
            )),
            Ok(n) => Ok(n),
            Err(_) => Err(FeedgrabError::Config(format!(
                "FEEDGRAB_MAX_ARTICLES is not a number: {}",
                value
            ))),
        }
    }
}
