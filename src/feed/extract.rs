//! Field routing: which output field a token's value belongs to.
//!
//! The mapping is a flat match over (level, dialect, tag) rather than a
//! handler per element type. Both functions are pure; applying the value
//! to the model is the engine's job.

use super::dates::DateFormat;
use super::model::Dialect;
use super::names::{NormalizedName, ATOM_NAMESPACE};
use super::state::Level;

/// Destination of a text or attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    FeedTitle,
    FeedSubtitle,
    FeedLink,
    ItemId,
    ItemTitle,
    ItemDescription,
    ItemLink,
    /// Item timestamp, parsed with the given layout.
    ItemWhen(DateFormat),
}

/// Routes character data found directly inside `tag`.
///
/// Any dialect other than Atom takes the RSS rows.
pub fn text_field(level: Level, dialect: Dialect, tag: &NormalizedName) -> Option<Field> {
    let atom = dialect.is_atom();
    match (level, tag.local.as_str()) {
        (Level::Feed, "title") => Some(Field::FeedTitle),
        (Level::Feed, "description") if !atom => Some(Field::FeedSubtitle),
        (Level::Feed, "subtitle") if atom => Some(Field::FeedSubtitle),
        (Level::Feed, "link") if !atom => Some(Field::FeedLink),

        (Level::Item, "guid") if !atom => Some(Field::ItemId),
        (Level::Item, "id") if atom => Some(Field::ItemId),
        (Level::Item, "title") if tag.is_unqualified() || tag.in_namespace(ATOM_NAMESPACE) => {
            Some(Field::ItemTitle)
        }
        (Level::Item, "description") if !atom => Some(Field::ItemDescription),
        (Level::Item, "summary") if atom => Some(Field::ItemDescription),
        (Level::Item, "link") if !atom => Some(Field::ItemLink),
        (Level::Item, "pubdate") if !atom => Some(Field::ItemWhen(DateFormat::Rss)),
        (Level::Item, "updated") if atom => Some(Field::ItemWhen(DateFormat::Atom)),
        _ => None,
    }
}

/// Routes an attribute of the element `tag` as it opens.
///
/// Only Atom's `<link href="...">` carries a field in an attribute.
pub fn attribute_field(
    level: Level,
    dialect: Dialect,
    tag: &NormalizedName,
    attribute: &NormalizedName,
) -> Option<Field> {
    if !dialect.is_atom() || !tag.is("link") || !attribute.is("href") {
        return None;
    }
    match level {
        Level::Feed => Some(Field::FeedLink),
        Level::Item => Some(Field::ItemLink),
    }
}

/// True for text that only separates elements.
pub fn is_formatting_whitespace(text: &str) -> bool {
    text.trim().is_empty()
}
