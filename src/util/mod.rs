//! Utility functions for common operations.
//!
//! - **URL handling**: base URL validation and feed path joining
//! - **Text processing**: terminal-safe display of untrusted feed text
//!
//! # Examples
//!
//! ```
//! use feedcheck::util::{join_feed_url, strip_control_chars, truncate_to_width};
//!
//! let url = join_feed_url("http://localhost:3001", "/feed.xml");
//! assert_eq!(url, "http://localhost:3001/feed.xml");
//!
//! assert_eq!(strip_control_chars("\x1b[1mBold\x1b[0m"), "Bold");
//! assert_eq!(truncate_to_width("Long article title", 10), "Long ar...");
//! ```

mod text;
mod url_validator;

pub use text::{strip_control_chars, truncate_to_width};
pub use url_validator::{join_feed_url, validate_base_url, UrlError};
