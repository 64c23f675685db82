//! Utility functions for the command-line surface.
//!
//! - **URL validation**: refuses feed URLs that point at internal hosts
//! - **Text**: terminal-safe, width-aware rendering of feed-supplied strings

mod text;
mod url_validator;

pub use text::{display_width, sanitize_line, truncate_to_width};
pub use url_validator::{validate_url, UrlValidationError};
