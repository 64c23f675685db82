//! The feed engine.
//!
//! [`parse_events`] drives every XML event through name normalization,
//! the dialect/level state machine and the field extractor, building a
//! [`Feed`] in one forward pass. [`FeedParser`] wraps it with configurable
//! options and clock, and feeds it from a reader, a byte slice or a file.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use thiserror::Error;

use super::dates::{normalize_date, Clock, SystemClock};
use super::extract::{attribute_field, is_formatting_whitespace, text_field, Field};
use super::model::{Feed, Item};
use super::names::{normalize, NormalizedName};
use super::state::{DialectState, Level, Transition};
use super::thumbnail::{offer, Candidate, ThumbnailNamespaces};
use super::tokenizer::{XmlAttribute, XmlEvent, XmlName, XmlTokenizer};

/// Errors that abort a parse. Nothing else does: unknown elements, bad
/// dates and missing ids are absorbed into the model.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The XML tokenizer rejected the document or its byte source failed.
    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The feed file could not be opened.
    #[error("Failed to open feed file: {0}")]
    Io(#[from] std::io::Error),
}

/// Knobs for the engine that are not part of the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserOptions {
    /// Namespaces identifying `media:thumbnail` and its tier attribute.
    pub thumbnails: ThumbnailNamespaces,
}

/// Entry point with configurable options and clock.
///
/// ```
/// use feedsift::feed::FeedParser;
///
/// let rss = r#"<rss><channel><title>News</title>
///   <item><title>Hello</title><link>https://example.com/1</link></item>
/// </channel></rss>"#;
/// let feed = FeedParser::new().parse_bytes(rss.as_bytes()).unwrap();
/// assert_eq!(feed.title, "News");
/// assert_eq!(feed.items[0].id, "https://example.com/1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FeedParser<C = SystemClock> {
    options: ParserOptions,
    clock: C,
}

impl FeedParser<SystemClock> {
    /// A parser with default [`ParserOptions`] and the system clock.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: Clock> FeedParser<C> {
    /// Replaces the engine options (thumbnail namespaces).
    pub fn with_options(mut self, options: ParserOptions) -> Self {
        self.options = options;
        self
    }

    /// Replaces the source of "now" used for item defaults and date fallbacks.
    pub fn with_clock<D: Clock>(self, clock: D) -> FeedParser<D> {
        FeedParser {
            options: self.options,
            clock,
        }
    }

    /// Options this parser was built with.
    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    /// Runs the engine over any event source. Source errors are returned
    /// unchanged and no partial feed escapes.
    pub fn parse_events<I, E>(&self, events: I) -> Result<Feed, E>
    where
        I: IntoIterator<Item = Result<XmlEvent, E>>,
    {
        parse_events(events, &self.options, &self.clock)
    }

    /// Tokenizes `reader` with [`XmlTokenizer`] and parses the result.
    ///
    /// # Arguments
    ///
    /// * `reader` - Buffered source of the XML document
    ///
    /// # Returns
    ///
    /// The complete feed. An item left open at end of input is dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::io::Cursor;
    /// use feedsift::feed::{Dialect, FeedParser};
    ///
    /// let xml = &b"<rss><channel><title>T</title><item><guid>1</guid></item></channel></rss>"[..];
    /// let feed = FeedParser::new().parse_reader(Cursor::new(xml)).unwrap();
    /// assert_eq!(feed.dialect, Dialect::Rss);
    /// assert_eq!(feed.items[0].id, "1");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Xml`] if the document is malformed or the
    /// reader fails part-way through. No partial feed is returned.
    pub fn parse_reader<R: BufRead>(&self, reader: R) -> Result<Feed, FeedError> {
        self.parse_events(XmlTokenizer::new(reader))
    }

    /// Parses an in-memory document. Same contract as [`Self::parse_reader`].
    pub fn parse_bytes(&self, bytes: &[u8]) -> Result<Feed, FeedError> {
        self.parse_reader(bytes)
    }

    /// Parses the document stored at `path`.
    ///
    /// # Errors
    ///
    /// - [`FeedError::Io`] if the file cannot be opened
    /// - [`FeedError::Xml`] if reading or tokenizing fails
    pub fn parse_file(&self, path: &Path) -> Result<Feed, FeedError> {
        let file = File::open(path)?;
        self.parse_reader(BufReader::new(file))
    }
}

/// Parses an RSS or Atom document with default options and the system clock.
pub fn parse<R: BufRead>(reader: R) -> Result<Feed, FeedError> {
    FeedParser::new().parse_reader(reader)
}

/// Byte-slice convenience over [`parse`].
pub fn parse_bytes(bytes: &[u8]) -> Result<Feed, FeedError> {
    FeedParser::new().parse_bytes(bytes)
}

/// Consumes `events` in order and builds a [`Feed`].
///
/// An item still open when the events run out is dropped without error.
pub fn parse_events<I, E>(events: I, options: &ParserOptions, clock: &dyn Clock) -> Result<Feed, E>
where
    I: IntoIterator<Item = Result<XmlEvent, E>>,
{
    let mut state = ParseState::new(options, clock);
    for event in events {
        state.handle(event?);
    }
    Ok(state.finish())
}

/// Everything one parse mutates. Owned by a single call.
struct ParseState<'a> {
    options: &'a ParserOptions,
    clock: &'a dyn Clock,
    machine: DialectState,
    /// Most recently opened element; cleared on any close.
    tag: NormalizedName,
    feed: Feed,
    current: Option<Item>,
}

impl<'a> ParseState<'a> {
    fn new(options: &'a ParserOptions, clock: &'a dyn Clock) -> Self {
        Self {
            options,
            clock,
            machine: DialectState::new(),
            tag: NormalizedName::default(),
            feed: Feed::default(),
            current: None,
        }
    }

    fn handle(&mut self, event: XmlEvent) {
        match event {
            XmlEvent::Start { name, attributes } => self.open(&name, &attributes),
            XmlEvent::End { name } => self.close(&name),
            XmlEvent::Text(text) => self.text(&text),
        }
    }

    fn open(&mut self, name: &XmlName, attributes: &[XmlAttribute]) {
        let tag = normalize(name);

        match self.machine.on_open(&tag) {
            Transition::EnterFeed(dialect) => {
                tracing::debug!(dialect = ?dialect, "Detected feed dialect");
            }
            Transition::OpenItem => {
                if self.current.is_some() {
                    tracing::debug!("Item opened before the previous one closed, discarding it");
                }
                self.current = Some(Item::new(self.clock.now()));
            }
            Transition::Stay => {}
        }

        let level = self.machine.level();
        let dialect = self.machine.dialect();

        for attr in attributes {
            let attr_name = normalize(&attr.name);
            if let Some(field) = attribute_field(level, dialect, &tag, &attr_name) {
                self.assign(field, &attr.value);
                break;
            }
        }

        if level == Level::Item && self.is_thumbnail(&tag) {
            let candidate = Candidate::from_attributes(attributes, self.options.thumbnails.video());
            if let Some(item) = self.current.as_mut() {
                offer(item, candidate);
            }
        }

        self.tag = tag;
    }

    fn close(&mut self, name: &XmlName) {
        self.tag = NormalizedName::default();

        if !self.machine.on_close(&normalize(name)) {
            return;
        }
        if let Some(item) = self.current.take() {
            let item = item.seal();
            tracing::trace!(id = %item.id, "Sealed item");
            self.feed.items.push(item);
        }
    }

    fn text(&mut self, text: &str) {
        if is_formatting_whitespace(text) {
            return;
        }
        if let Some(field) = text_field(self.machine.level(), self.machine.dialect(), &self.tag) {
            self.assign(field, text);
        }
    }

    fn assign(&mut self, field: Field, value: &str) {
        let clock = self.clock;
        match field {
            Field::FeedTitle => self.feed.title = value.to_owned(),
            Field::FeedSubtitle => self.feed.subtitle = value.to_owned(),
            Field::FeedLink => self.feed.link = value.to_owned(),
            item_field => {
                let Some(item) = self.current.as_mut() else {
                    return;
                };
                match item_field {
                    Field::ItemId => item.id = value.to_owned(),
                    Field::ItemTitle => item.title = value.to_owned(),
                    Field::ItemDescription => item.description = value.to_owned(),
                    Field::ItemLink => item.link = value.to_owned(),
                    Field::ItemWhen(format) => item.when = normalize_date(format, value, clock),
                    Field::FeedTitle | Field::FeedSubtitle | Field::FeedLink => {}
                }
            }
        }
    }

    fn is_thumbnail(&self, tag: &NormalizedName) -> bool {
        tag.is("thumbnail") && tag.in_namespace(self.options.thumbnails.media())
    }

    fn finish(self) -> Feed {
        if let Some(item) = &self.current {
            tracing::debug!(title = %item.title, "Input ended inside an item, dropping it");
        }
        let mut feed = self.feed;
        feed.dialect = self.machine.dialect();
        tracing::debug!(
            dialect = ?feed.dialect,
            items = feed.items.len(),
            "Parsed feed"
        );
        feed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::dates::FixedClock;
    use crate::feed::model::Dialect;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
    }

    fn start(local: &str) -> Result<XmlEvent, FeedError> {
        Ok(XmlEvent::Start {
            name: XmlName::unqualified(local),
            attributes: vec![],
        })
    }

    fn end(local: &str) -> Result<XmlEvent, FeedError> {
        Ok(XmlEvent::End {
            name: XmlName::unqualified(local),
        })
    }

    fn text(value: &str) -> Result<XmlEvent, FeedError> {
        Ok(XmlEvent::Text(value.to_string()))
    }

    fn run(events: Vec<Result<XmlEvent, FeedError>>) -> Feed {
        parse_events(events, &ParserOptions::default(), &clock()).unwrap()
    }

    #[test]
    fn test_rss_item_from_events() {
        let feed = run(vec![
            start("rss"),
            start("channel"),
            start("title"),
            text("Channel"),
            end("title"),
            start("item"),
            start("title"),
            text("T"),
            end("title"),
            start("guid"),
            text("G"),
            end("guid"),
            end("item"),
            end("channel"),
            end("rss"),
        ]);
        assert_eq!(feed.title, "Channel");
        assert_eq!(feed.dialect, Dialect::Rss);
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].id, "G");
        assert_eq!(feed.items[0].title, "T");
        assert_eq!(feed.items[0].when, clock().0);
    }

    #[test]
    fn test_unclosed_item_is_dropped() {
        let feed = run(vec![
            start("channel"),
            start("item"),
            start("title"),
            text("Done"),
            end("title"),
            end("item"),
            start("item"),
            start("title"),
            text("Truncated"),
            end("title"),
        ]);
        assert_eq!(feed.items.len(), 1);
        assert_eq!(feed.items[0].title, "Done");
    }

    #[test]
    fn test_source_error_is_propagated_verbatim() {
        #[derive(Debug, PartialEq)]
        struct SourceFailed;

        let events: Vec<Result<XmlEvent, SourceFailed>> = vec![
            Ok(XmlEvent::Start {
                name: XmlName::unqualified("channel"),
                attributes: vec![],
            }),
            Err(SourceFailed),
        ];
        let result = parse_events(events, &ParserOptions::default(), &clock());
        assert_eq!(result, Err(SourceFailed));
    }

    #[test]
    fn test_text_after_close_is_not_assigned() {
        let feed = run(vec![
            start("channel"),
            start("title"),
            text("Real"),
            end("title"),
            text("stray"),
            end("channel"),
        ]);
        assert_eq!(feed.title, "Real");
    }

    #[test]
    fn test_fields_after_last_item_go_to_feed() {
        let feed = run(vec![
            start("channel"),
            start("item"),
            start("title"),
            text("Post"),
            end("title"),
            end("item"),
            start("title"),
            text("Late channel title"),
            end("title"),
        ]);
        assert_eq!(feed.title, "Late channel title");
        assert_eq!(feed.items[0].title, "Post");
    }

    #[test]
    fn test_stray_item_close_is_ignored() {
        let feed = run(vec![start("channel"), end("item"), end("channel")]);
        assert!(feed.items.is_empty());
    }

    #[test]
    fn test_atom_href_uses_first_href_only() {
        let events: Vec<Result<XmlEvent, FeedError>> = vec![
            start("feed"),
            Ok(XmlEvent::Start {
                name: XmlName::unqualified("link"),
                attributes: vec![
                    XmlAttribute::new(XmlName::unqualified("rel"), "alternate"),
                    XmlAttribute::new(XmlName::unqualified("HREF"), "https://a.example/"),
                    XmlAttribute::new(XmlName::unqualified("href"), "https://b.example/"),
                ],
            }),
            end("link"),
        ];
        let feed = run(events);
        assert_eq!(feed.link, "https://a.example/");
    }
}
