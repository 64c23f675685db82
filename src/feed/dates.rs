//! Date-time normalization for RSS and Atom timestamps.
//!
//! Dates in feeds are best-effort metadata: [`parse_date`] returns `None`
//! for anything it cannot read, and [`normalize_date`] substitutes the
//! current time from an injectable [`Clock`] so callers never see an error.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc, Weekday};

/// Layout of the date/time portion of an RSS `pubDate`, after the weekday.
const RSS_STAMP: &str = "%d %b %Y %H:%M:%S";

/// Source of "now" for item defaults and date fallbacks.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock frozen at one instant, for deterministic parses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Which dialect's date layout applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// Atom `<updated>`: RFC 3339 style.
    Atom,
    /// RSS `<pubDate>`: RFC 822 style.
    Rss,
}

/// Parses `text` with the layout selected by `format` and the text's last
/// character.
///
/// - Atom: a trailing `Z` (any case) selects `YYYY-MM-DDThh:mm:ssZ`,
///   anything else requires an explicit `±hh:mm` offset. Fractional
///   seconds are accepted in both.
/// - RSS: a trailing `T` (any case) selects the named-zone layout
///   `Mon, 2 Jan 2006 15:04:05 GMT`; anything else requires a numeric
///   `±hhmm` offset. Note that `UTC` does not end in `T` and therefore
///   goes down the numeric path and fails.
///
/// Years must have exactly four digits and the RSS weekday must be a
/// three-letter name followed by `", "`.
///
/// Returns `None` for empty or unparseable text.
pub fn parse_date(format: DateFormat, text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    match format {
        DateFormat::Atom => parse_atom(text),
        DateFormat::Rss => parse_rss(text),
    }
}

/// Like [`parse_date`], but falls back to `clock.now()`.
///
/// A malformed date is therefore indistinguishable from a missing one.
pub fn normalize_date(format: DateFormat, text: &str, clock: &dyn Clock) -> DateTime<Utc> {
    match parse_date(format, text) {
        Some(when) => when,
        None => {
            tracing::debug!(text = %text, format = ?format, "Unparseable date, using current time");
            clock.now()
        }
    }
}

fn parse_atom(text: &str) -> Option<DateTime<Utc>> {
    let (year, _) = text.split_once('-')?;
    if !is_four_digit_year(year) {
        return None;
    }

    if let Some(stamp) = text.strip_suffix('Z').or_else(|| text.strip_suffix('z')) {
        let naive = NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
        return Some(Utc.from_utc_datetime(&naive));
    }

    DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%:z")
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_rss(text: &str) -> Option<DateTime<Utc>> {
    // `Mon, `: a three-letter weekday name, not checked against the date
    // itself since plenty of feeds get it wrong.
    let (weekday, rest) = text.split_once(", ")?;
    if weekday.len() != 3 {
        return None;
    }
    weekday.parse::<Weekday>().ok()?;
    if !rest.split_whitespace().nth(2).is_some_and(is_four_digit_year) {
        return None;
    }

    if text.ends_with(|c: char| c.eq_ignore_ascii_case(&'t')) {
        let (stamp, zone) = rest.rsplit_once(' ')?;
        let offset = named_zone_offset(zone)?;
        let naive = NaiveDateTime::parse_from_str(stamp.trim_end(), RSS_STAMP).ok()?;
        return offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc));
    }

    DateTime::parse_from_str(rest, &format!("{} %z", RSS_STAMP))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// chrono's `%Y` takes any number of digits, so `06` would read as year 6.
fn is_four_digit_year(year: &str) -> bool {
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}

/// Offset for an RFC 822 zone abbreviation.
///
/// Unknown alphabetic abbreviations are read as UTC; non-alphabetic input
/// is rejected.
fn named_zone_offset(zone: &str) -> Option<FixedOffset> {
    if zone.is_empty() || !zone.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }

    let hours = match zone.to_ascii_uppercase().as_str() {
        "UT" | "UTC" | "GMT" | "Z" => 0,
        "EST" => -5,
        "EDT" => -4,
        "CST" => -6,
        "CDT" => -5,
        "MST" => -7,
        "MDT" => -6,
        "PST" => -8,
        "PDT" => -7,
        _ => {
            tracing::debug!(zone = %zone, "Unknown time zone abbreviation, assuming UTC");
            0
        }
    };
    FixedOffset::east_opt(hours * 3600)
}
