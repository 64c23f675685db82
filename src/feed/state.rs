//! Dialect and level tracking.
//!
//! Feeds never mix RSS and Atom tags, so a dialect flag set by the first
//! `<feed>` or `<channel>` plus a two-valued level is all the structure the
//! engine needs. No element stack is kept.

use super::model::Dialect;
use super::names::NormalizedName;

const ATOM_FEED: &str = "feed";
const ATOM_ENTRY: &str = "entry";
const RSS_CHANNEL: &str = "channel";
const RSS_ITEM: &str = "item";

/// Whether the parser is looking at feed-wide metadata or inside one item.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Level {
    #[default]
    Feed,
    Item,
}

/// What an element-open did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed.
    Stay,
    /// A `<feed>` or `<channel>` fixed the dialect.
    EnterFeed(Dialect),
    /// An `<item>`/`<entry>` opened; the caller starts a fresh item.
    OpenItem,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialectState {
    dialect: Dialect,
    level: Level,
}

impl DialectState {
    /// Starts undetermined, at feed level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Dialect fixed by the most recent `<feed>` or `<channel>`.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether values currently belong to the feed or to the open item.
    pub fn level(&self) -> Level {
        self.level
    }

    /// Applies an element-open. Only open events change the dialect.
    ///
    /// `<item>` opens an item unless the dialect is Atom; `<entry>` opens one
    /// only when it is.
    pub fn on_open(&mut self, name: &NormalizedName) -> Transition {
        match name.local.as_str() {
            ATOM_FEED => self.enter_feed(Dialect::Atom),
            RSS_CHANNEL => self.enter_feed(Dialect::Rss),
            RSS_ITEM if !self.dialect.is_atom() => self.open_item(),
            ATOM_ENTRY if self.dialect.is_atom() => self.open_item(),
            _ => Transition::Stay,
        }
    }

    /// Applies an element-close. Returns true when it closes item scope, in
    /// which case the level drops back to feed level.
    ///
    /// Matching is by local name regardless of dialect.
    pub fn on_close(&mut self, name: &NormalizedName) -> bool {
        if name.is(ATOM_ENTRY) || name.is(RSS_ITEM) {
            self.level = Level::Feed;
            true
        } else {
            false
        }
    }

    fn enter_feed(&mut self, dialect: Dialect) -> Transition {
        self.dialect = dialect;
        self.level = Level::Feed;
        Transition::EnterFeed(dialect)
    }

    fn open_item(&mut self) -> Transition {
        self.level = Level::Item;
        Transition::OpenItem
    }
}
