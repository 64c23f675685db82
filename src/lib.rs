//! feedsift: turn RSS 2.0 and Atom 1.0 documents into one normalized model.
//!
//! The heart of the crate is [`feed`], an event-driven engine that reads XML
//! tokens one at a time, works out which dialect it is looking at, and
//! routes values into a [`feed::Feed`]. [`config`], [`render`] and [`util`]
//! back the `feedsift` command-line tool.

pub mod config;
pub mod feed;
pub mod render;
pub mod util;

pub use feed::{parse, parse_bytes, Feed, FeedError, FeedParser, Item};
