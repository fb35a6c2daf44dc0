use super::article::{
    parse_date, KEY_AUTHOR, KEY_DATE, KEY_DESCRIPTION, KEY_ID, KEY_IS_READ, KEY_LINK, KEY_TITLE,
    KEY_TORRENT_URL,
};
use super::{Article, ArticleDocument, ArticleFields, ChangeNotifier, FeedRef, FieldValue};
use crate::errors::{FeedgrabError, FeedgrabResult};

/// Builds articles for one feed.
#[derive(Debug, Clone)]
pub struct ArticleFactory {
    feed: FeedRef,
    notifier: ChangeNotifier,
}

impl ArticleFactory {
    pub fn new(feed: FeedRef, notifier: ChangeNotifier) -> Self {
        Self { feed, notifier }
    }

    pub fn feed(&self) -> &FeedRef {
        &self.feed
    }

    /// Build an article from a field bag supplied by a feed source.
    ///
    /// The guid is the first non-empty of `id`, `torrentURL` and `title`.
    /// Torrent URLs are preferred over titles since titles collide far more often.
    pub fn from_fields(&self, mut fields: ArticleFields) -> FeedgrabResult<Article> {
        let text = |key: &str| fields.get(key).map(FieldValue::to_text).unwrap_or_default();

        let guid = [KEY_ID, KEY_TORRENT_URL, KEY_TITLE]
            .into_iter()
            .map(|key| text(key))
            .find(|value| !value.is_empty())
            .ok_or_else(|| {
                FeedgrabError::MalformedArticle(format!(
                    "item from {} has no id, torrent URL or title",
                    self.feed
                ))
            })?;

        let published_at = fields.get(KEY_DATE).and_then(FieldValue::to_datetime);
        let title = text(KEY_TITLE);
        let author = text(KEY_AUTHOR);
        let description = text(KEY_DESCRIPTION);
        let torrent_url = text(KEY_TORRENT_URL);
        let link = text(KEY_LINK);
        let is_read = fields
            .get(KEY_IS_READ)
            .map(FieldValue::to_bool)
            .unwrap_or(false);

        fields.insert(KEY_ID.to_string(), FieldValue::Text(guid.clone()));

        Ok(Article {
            feed: self.feed.clone(),
            guid,
            published_at,
            title,
            author,
            description,
            torrent_url,
            link,
            is_read,
            raw_fields: fields,
            notifier: self.notifier.clone(),
        })
    }

    /// Rebuild an article from its persisted document.
    ///
    /// Documents carry the date as RFC 2822 text; unparseable text leaves the
    /// article without a date rather than failing.
    pub fn from_document(&self, document: &ArticleDocument) -> FeedgrabResult<Article> {
        let fields: ArticleFields = document
            .iter()
            .map(|(key, value)| (key.clone(), FieldValue::from(value.clone())))
            .collect();

        let mut article = self.from_fields(fields)?;

        article.published_at = document
            .get(KEY_DATE)
            .and_then(|value| value.as_str())
            .and_then(parse_date);
        article.raw_fields.insert(
            KEY_DATE.to_string(),
            article
                .published_at
                .map(FieldValue::Date)
                .unwrap_or(FieldValue::Null),
        );

        Ok(article)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use serde_json::{json, Value};

    fn factory() -> ArticleFactory {
        ArticleFactory::new(FeedRef::new("https://tracker.example/rss"), ChangeNotifier::new())
    }

    fn fields(pairs: &[(&str, &str)]) -> ArticleFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), FieldValue::from(*v)))
            .collect()
    }

    fn document(value: Value) -> ArticleDocument {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[test]
    fn test_guid_from_id() {
        let article = factory()
            .from_fields(fields(&[
                ("id", "abc"),
                ("torrentURL", "http://t/1.torrent"),
                ("title", "Foo"),
            ]))
            .unwrap();

        assert_eq!(article.guid(), "abc");
    }

    #[test]
    fn test_guid_falls_back_to_torrent_url() {
        let article = factory()
            .from_fields(fields(&[
                ("id", ""),
                ("torrentURL", "http://t/1.torrent"),
                ("title", "Foo"),
            ]))
            .unwrap();

        assert_eq!(article.guid(), "http://t/1.torrent");
        assert_eq!(
            article.raw_fields()["id"],
            FieldValue::Text("http://t/1.torrent".to_string())
        );
    }

    #[test]
    fn test_guid_falls_back_to_title() {
        let article = factory()
            .from_fields(fields(&[("title", "Foo"), ("link", "http://a/b"), ("torrentURL", "")]))
            .unwrap();

        assert_eq!(article.guid(), "Foo");
        assert_eq!(article.raw_fields()["id"], FieldValue::Text("Foo".to_string()));
        assert_eq!(article.torrent_url(), "http://a/b");
        assert!(!article.is_read());
    }

    #[test]
    fn test_no_identity_is_malformed() {
        let result = factory().from_fields(fields(&[
            ("id", ""),
            ("torrentURL", ""),
            ("title", ""),
            ("link", "http://a/b"),
        ]));

        assert!(matches!(result, Err(FeedgrabError::MalformedArticle(_))));
        assert!(matches!(
            factory().from_fields(ArticleFields::new()),
            Err(FeedgrabError::MalformedArticle(_))
        ));
    }

    #[test]
    fn test_is_read_defaults_to_false() {
        let factory = factory();
        let unread = factory.from_fields(fields(&[("id", "1")])).unwrap();
        let mut read_fields = fields(&[("id", "2")]);
        read_fields.insert("isRead".to_string(), FieldValue::Bool(true));
        let read = factory.from_fields(read_fields).unwrap();

        assert!(!unread.is_read());
        assert!(read.is_read());
    }

    #[test]
    fn test_from_document_parses_rfc2822_date() {
        let article = factory()
            .from_document(&document(json!({
                "id": "1",
                "title": "Foo",
                "date": "Wed, 01 Jan 2020 12:00:00 +0000",
            })))
            .unwrap();

        let expected = DateTime::parse_from_rfc3339("2020-01-01T12:00:00Z").unwrap();
        assert_eq!(article.published_at(), Some(expected));
        assert_eq!(article.raw_fields()["date"], FieldValue::Date(expected));
    }

    #[test]
    fn test_from_document_bad_date_is_not_fatal() {
        let factory = factory();
        let bad = factory
            .from_document(&document(json!({ "id": "1", "date": "last tuesday" })))
            .unwrap();
        let missing = factory
            .from_document(&document(json!({ "id": "2" })))
            .unwrap();

        assert!(bad.published_at().is_none());
        assert!(missing.published_at().is_none());
        assert_eq!(bad.raw_fields()["date"], FieldValue::Null);
    }

    #[test]
    fn test_document_round_trip() {
        let factory = factory();
        let mut original = factory
            .from_document(&document(json!({
                "id": "guid-1",
                "date": "Sat, 13 Jan 2024 08:30:00 +0100",
                "title": "Ubuntu 24.04 ISO",
                "author": "releases",
                "description": "Desktop image",
                "torrentURL": "",
                "link": "https://tracker.example/ubuntu",
                "category": "linux",
                "seeders": 42,
            })))
            .unwrap();
        original.mark_as_read();

        let restored = factory.from_document(&original.to_document()).unwrap();

        assert_eq!(restored.guid(), original.guid());
        assert_eq!(restored.is_read(), original.is_read());
        assert_eq!(restored.title(), original.title());
        assert_eq!(restored.author(), original.author());
        assert_eq!(restored.description(), original.description());
        assert_eq!(restored.link(), original.link());
        assert_eq!(restored.torrent_url(), "https://tracker.example/ubuntu");
        assert_eq!(restored.published_at(), original.published_at());
        assert!(restored.published_at().is_some());
        assert_eq!(restored.raw_fields()["category"], FieldValue::Text("linux".to_string()));
        assert_eq!(restored.to_document(), original.to_document());
    }

    #[test]
    fn test_round_trip_keeps_derived_guid() {
        let factory = factory();
        let original = factory
            .from_fields(fields(&[("title", "Only a title")]))
            .unwrap();

        let restored = factory.from_document(&original.to_document()).unwrap();

        assert_eq!(restored.guid(), "Only a title");
        assert!(restored.published_at().is_none());
    }
}
