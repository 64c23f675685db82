//! The normalized feed model shared by RSS and Atom.
//!
//! Both dialects land in the same two structs; fields a document does not
//! supply stay empty. Items are appended only once sealed.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which syndication vocabulary governs the document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// No `<feed>` or `<channel>` has been opened yet. Treated like RSS.
    #[default]
    Undetermined,
    Rss,
    Atom,
}

impl Dialect {
    pub fn is_atom(self) -> bool {
        self == Dialect::Atom
    }
}

/// A parsed RSS channel or Atom feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Feed {
    pub title: String,
    pub subtitle: String,
    pub link: String,
    /// Dialect in effect when parsing finished.
    pub dialect: Dialect,
    /// Sealed items in document order.
    pub items: Vec<Item>,
}

/// One RSS `<item>` or Atom `<entry>`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Item {
    pub id: String,
    pub title: String,
    pub description: String,
    pub link: String,
    /// Best thumbnail URL seen for this item.
    pub image: String,
    /// Resolution tier name the thumbnail came from (e.g. `hqdefault`).
    pub image_source: String,
    /// Publish/update time; the item's creation time if the feed gave none.
    pub when: DateTime<Utc>,
}

impl Item {
    /// An empty item stamped with `when`.
    pub fn new(when: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            link: String::new(),
            image: String::new(),
            image_source: String::new(),
            when,
        }
    }

    /// Final fix-ups applied when the item's scope closes.
    pub(crate) fn seal(mut self) -> Self {
        if self.id.is_empty() {
            self.id = self.link.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_seal_falls_back_to_link() {
        let mut item = Item::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        item.link = "https://example.com/post".to_string();
        assert_eq!(item.seal().id, "https://example.com/post");
    }

    #[test]
    fn test_seal_keeps_explicit_id() {
        let mut item = Item::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        item.id = "urn:uuid:1".to_string();
        item.link = "https://example.com/post".to_string();
        assert_eq!(item.seal().id, "urn:uuid:1");
    }

    #[test]
    fn test_dialect_serializes_lowercase() {
        let json = serde_json::to_string(&Dialect::Atom).unwrap();
        assert_eq!(json, "\"atom\"");
    }
}
