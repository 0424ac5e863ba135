//! Feed retrieval and structural validation.
//!
//! - **Fetching**: single-shot HTTP retrieval with timeout and size limit
//! - **Discovery**: probing candidate ports for a running feed server
//! - **Parsing**: bytes into a namespace-aware [`FeedDocument`]
//! - **Validation**: RSS 2.0 and Atom 1.0 required-element checklists
//!
//! # Example
//!
//! ```
//! use feedcheck::feed::{validate_bytes, FeedKind};
//!
//! let xml = br#"<rss version="2.0"><channel>
//!   <title>T</title><link>https://example.com</link><description>D</description>
//!   <item><title>I</title><link>https://example.com/i</link><description>D</description></item>
//! </channel></rss>"#;
//!
//! let result = validate_bytes(FeedKind::Rss, xml).unwrap();
//! assert!(result.passed());
//! ```

mod atom;
mod checklist;
mod discovery;
mod document;
mod fetcher;
mod rss;

pub use atom::{validate_atom, ATOM_NAMESPACE};
pub use checklist::{
    verify_elements, Diagnostic, ElementCheck, FeedKind, Level, Requirement, ValidationResult,
};
pub use discovery::{discover_base_url, DiscoveryError, DEFAULT_PORTS, PROBE_TIMEOUT};
pub use document::{parse_document, Element, FeedDocument, ParseError};
pub use fetcher::{fetch_feed, FetchError, MAX_FEED_SIZE};
pub use rss::validate_rss;

/// Validates a parsed document as the given feed kind.
pub fn validate(kind: FeedKind, doc: &FeedDocument) -> ValidationResult {
    match kind {
        FeedKind::Rss => validate_rss(doc),
        FeedKind::Atom => validate_atom(doc),
    }
}

/// Parses `bytes` and validates them as the given feed kind.
///
/// # Errors
///
/// Returns [`ParseError`] when the bytes are not well-formed XML. Structural
/// problems are never errors; they are `Fail` diagnostics in the result.
pub fn validate_bytes(kind: FeedKind, bytes: &[u8]) -> Result<ValidationResult, ParseError> {
    let doc = parse_document(bytes)?;
    Ok(validate(kind, &doc))
}
