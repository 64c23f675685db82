//! Output formatting for the command-line tool.

use std::fmt::Write as _;

use crate::config::OutputFormat;
use crate::feed::Feed;
use crate::util::{sanitize_line, truncate_to_width};

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Renders `feed` in the requested format.
pub fn render(feed: &Feed, format: OutputFormat, title_width: usize) -> serde_json::Result<String> {
    match format {
        OutputFormat::Json => render_json(feed),
        OutputFormat::Text => Ok(render_text(feed, title_width)),
    }
}

/// The whole model as pretty-printed JSON; dates are RFC 3339 in UTC.
pub fn render_json(feed: &Feed) -> serde_json::Result<String> {
    serde_json::to_string_pretty(feed)
}

/// A header block followed by one line per item:
/// `date  title  link`, with the title cut to `title_width` columns.
///
/// Every feed-supplied string passes through [`sanitize_line`].
pub fn render_text(feed: &Feed, title_width: usize) -> String {
    let mut out = String::new();

    let title = if feed.title.is_empty() {
        "Untitled Feed"
    } else {
        feed.title.as_str()
    };
    // Writing into a String cannot fail
    let _ = writeln!(out, "{}", sanitize_line(title));
    if !feed.link.is_empty() {
        let _ = writeln!(out, "{}", sanitize_line(&feed.link));
    }
    if !feed.subtitle.is_empty() {
        let _ = writeln!(out, "{}", sanitize_line(&feed.subtitle));
    }
    let _ = writeln!(out, "{} item(s)", feed.items.len());

    for item in &feed.items {
        let title = sanitize_line(&item.title);
        let title: String = if title.is_empty() {
            "(untitled)".into()
        } else {
            truncate_to_width(&title, title_width).into_owned()
        };
        let _ = write!(out, "\n{}  {}", item.when.format(DATE_FORMAT), title);
        if !item.link.is_empty() {
            let _ = write!(out, "  {}", sanitize_line(&item.link));
        }
    }
    if !feed.items.is_empty() {
        out.push('\n');
    }

    out
}
