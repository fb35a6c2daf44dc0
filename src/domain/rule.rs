use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use super::Article;
use crate::errors::FeedgrabResult;

/// Auto-download rule as stored and edited by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRule {
    pub id: Option<i64>,
    pub name: String,
    pub must_contain: String,
    pub must_not_contain: String,
    /// Restricts the rule to one feed; `None` applies it everywhere.
    pub feed_url: Option<String>,
    pub enabled: bool,
}

impl DownloadRule {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            must_contain: String::new(),
            must_not_contain: String::new(),
            feed_url: None,
            enabled: true,
        }
    }

    pub fn with_must_contain(mut self, pattern: impl Into<String>) -> Self {
        self.must_contain = pattern.into();
        self
    }

    pub fn with_must_not_contain(mut self, pattern: impl Into<String>) -> Self {
        self.must_not_contain = pattern.into();
        self
    }

    pub fn with_feed_url(mut self, feed_url: Option<String>) -> Self {
        self.feed_url = feed_url;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Compile the patterns. Fails on invalid regex syntax.
    pub fn compile(&self) -> FeedgrabResult<RuleMatcher> {
        Ok(RuleMatcher {
            name: self.name.clone(),
            must_contain: compile_pattern(&self.must_contain)?,
            must_not_contain: compile_pattern(&self.must_not_contain)?,
            feed_url: self.feed_url.clone(),
            enabled: self.enabled,
        })
    }
}

fn compile_pattern(pattern: &str) -> FeedgrabResult<Option<Regex>> {
    if pattern.trim().is_empty() {
        return Ok(None);
    }

    let regex = RegexBuilder::new(pattern).case_insensitive(true).build()?;
    Ok(Some(regex))
}

#[derive(Debug, Clone)]
pub struct RuleMatcher {
    name: String,
    must_contain: Option<Regex>,
    must_not_contain: Option<Regex>,
    feed_url: Option<String>,
    enabled: bool,
}

impl RuleMatcher {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, article: &Article) -> bool {
        if !self.enabled {
            return false;
        }

        if let Some(feed_url) = &self.feed_url {
            if feed_url != article.feed().url() {
                return false;
            }
        }

        let title = article.title();

        let included = self
            .must_contain
            .as_ref()
            .map(|re| re.is_match(title))
            .unwrap_or(true);
        let excluded = self
            .must_not_contain
            .as_ref()
            .map(|re| re.is_match(title))
            .unwrap_or(false);

        included && !excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ArticleFactory, ChangeNotifier, FeedRef, FieldValue};
    use crate::errors::FeedgrabError;

    fn article(feed: &str, title: &str) -> Article {
        let factory = ArticleFactory::new(FeedRef::new(feed), ChangeNotifier::new());
        let fields = [("title".to_string(), FieldValue::from(title))]
            .into_iter()
            .collect();
        factory.from_fields(fields).unwrap()
    }

    #[test]
    fn test_empty_rule_matches_everything() {
        let matcher = DownloadRule::new("all".to_string()).compile().unwrap();
        assert!(matcher.matches(&article("https://a/rss", "Anything at all")));
    }

    #[test]
    fn test_must_contain_is_case_insensitive() {
        let matcher = DownloadRule::new("debian".to_string())
            .with_must_contain(r"debian.*netinst")
            .compile()
            .unwrap();

        assert!(matcher.matches(&article("https://a/rss", "Debian 12.5 NETINST amd64")));
        assert!(!matcher.matches(&article("https://a/rss", "Fedora 40 Workstation")));
    }

    #[test]
    fn test_must_not_contain_excludes() {
        let matcher = DownloadRule::new("ubuntu".to_string())
            .with_must_contain("ubuntu")
            .with_must_not_contain("beta|rc")
            .compile()
            .unwrap();

        assert!(matcher.matches(&article("https://a/rss", "Ubuntu 24.04 Desktop")));
        assert!(!matcher.matches(&article("https://a/rss", "Ubuntu 24.10 Beta")));
    }

    #[test]
    fn test_feed_restriction() {
        let matcher = DownloadRule::new("scoped".to_string())
            .with_feed_url(Some("https://a/rss".to_string()))
            .compile()
            .unwrap();

        assert!(matcher.matches(&article("https://a/rss", "Item")));
        assert!(!matcher.matches(&article("https://b/rss", "Item")));
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let matcher = DownloadRule::new("off".to_string())
            .with_enabled(false)
            .compile()
            .unwrap();

        assert!(!matcher.matches(&article("https://a/rss", "Item")));
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let result = DownloadRule::new("broken".to_string())
            .with_must_contain("(unclosed")
            .compile();

        assert!(matches!(result, Err(FeedgrabError::InvalidPattern(_))));
    }
}
