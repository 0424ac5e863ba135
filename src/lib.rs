//! Smoke tests for the RSS 2.0 and Atom 1.0 feeds of a locally running site.
//!
//! The binary fetches `/feed.xml` and `/atom.xml` from a dev server (found by
//! probing a short list of ports unless a base URL is given), checks each
//! document for the elements its format requires and exits non-zero if
//! either feed is unreachable, malformed or incomplete.

pub mod config;
pub mod feed;
pub mod report;
pub mod util;
