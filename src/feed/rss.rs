//! RSS 2.0 structure checks.

use super::checklist::{verify_elements, ElementCheck, FeedKind, ValidationResult};
use super::document::FeedDocument;

const CHANNEL_CHECKS: &[ElementCheck] = &[
    ElementCheck::required("title"),
    ElementCheck::required("link"),
    ElementCheck::required("description"),
    ElementCheck::informational("language"),
    ElementCheck::informational("copyright"),
    ElementCheck::informational("lastBuildDate"),
    ElementCheck::informational("generator"),
];

const ITEM_CHECKS: &[ElementCheck] = &[
    ElementCheck::required("title"),
    ElementCheck::required("link"),
    ElementCheck::required("description").with_preview(),
    ElementCheck::informational("pubDate"),
    ElementCheck::informational("author"),
    ElementCheck::informational("guid"),
];

/// Validates a parsed document as an RSS 2.0 feed.
///
/// Checks, in order: `<rss version="2.0">` root, a `<channel>`, the channel's
/// required fields, at least one `<item>`, and the first item's required
/// fields. A wrong root, missing channel or empty item list stops the run
/// since nothing below them can be inspected; every other failure is recorded
/// and checking continues.
pub fn validate_rss(doc: &FeedDocument) -> ValidationResult {
    let mut result = ValidationResult::new(FeedKind::Rss);
    let root = doc.root();

    if !root.is(None, "rss") {
        result.fail(format!(
            "Invalid root element for RSS: {}",
            root.qualified_name()
        ));
        return result;
    }

    match root.attr("version") {
        Some("2.0") => result.pass("RSS version 2.0 detected"),
        Some(other) => result.fail(format!("Invalid RSS version: {}", other)),
        None => result.fail("Invalid RSS version: (missing)"),
    }

    let Some(channel) = root.child(None, "channel") else {
        result.fail("No channel element found");
        return result;
    };

    verify_elements(channel, None, "channel", CHANNEL_CHECKS, &mut result);

    let items: Vec<_> = channel.children(None, "item").collect();
    result.info(format!("Found {} items", items.len()));
    let Some(first) = items.first() else {
        result.fail("No items found");
        return result;
    };

    verify_elements(first, None, "item", ITEM_CHECKS, &mut result);

    tracing::debug!(
        items = items.len(),
        passed = result.passed(),
        "RSS document checked"
    );
    result
}
