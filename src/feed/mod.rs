//! Event-driven RSS 2.0 / Atom 1.0 parsing.
//!
//! The engine reads one XML event at a time and never builds a tree:
//!
//! - **Tokenizing**: [`tokenizer`] turns bytes into `Start`/`End`/`Text` events
//!   with resolved namespaces (backed by `quick-xml`)
//! - **Classification**: [`names`] case-folds names, [`state`] tracks dialect
//!   and feed/item level
//! - **Extraction**: [`extract`] routes values to fields, [`dates`] normalizes
//!   timestamps, [`thumbnail`] picks the best `media:thumbnail`
//! - **Fetching**: [`fetcher`] downloads feed bytes over HTTP
//!
//! # Example
//!
//! ```
//! use feedsift::feed::parse_bytes;
//!
//! let atom = r#"<feed xmlns="http://www.w3.org/2005/Atom">
//!   <title>Example</title>
//!   <entry><title>First</title><link href="https://example.com/1"/></entry>
//! </feed>"#;
//! let feed = parse_bytes(atom.as_bytes()).unwrap();
//! assert_eq!(feed.items[0].id, "https://example.com/1");
//! ```

pub mod dates;
pub mod extract;
pub mod fetcher;
pub mod model;
pub mod names;
pub mod parser;
pub mod state;
pub mod thumbnail;
pub mod tokenizer;

pub use dates::{Clock, FixedClock, SystemClock};
pub use fetcher::{fetch_and_parse, fetch_feed, FetchError, FetchOptions};
pub use model::{Dialect, Feed, Item};
pub use parser::{parse, parse_bytes, parse_events, FeedError, FeedParser, ParserOptions};
pub use thumbnail::ThumbnailNamespaces;
pub use tokenizer::{XmlAttribute, XmlEvent, XmlName, XmlTokenizer};
