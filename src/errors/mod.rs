use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedgrabError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Feed errors
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),

    #[error("Feed not found: {0}")]
    FeedNotFound(String),

    #[error("Feed already exists: {0}")]
    FeedAlreadyExists(String),

    // Rule errors
    #[error("Download rule not found: {0}")]
    RuleNotFound(String),

    #[error("Download rule already exists: {0}")]
    RuleAlreadyExists(String),

    #[error("Invalid rule pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // Article errors
    #[error("Malformed article, cannot establish identity: {0}")]
    MalformedArticle(String),

    #[error("Article already registered: {0}")]
    DuplicateArticle(String),

    #[error("Article older than every kept article: {0}")]
    OutdatedArticle(String),

    #[error("Article belongs to another feed: {0}")]
    ForeignArticle(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    // Storage errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type FeedgrabResult<T> = Result<T, FeedgrabError>;
