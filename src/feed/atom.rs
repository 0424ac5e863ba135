//! Atom 1.0 structure checks.

use super::checklist::{display_value, verify_elements, ElementCheck, FeedKind, ValidationResult};
use super::document::{Element, FeedDocument};

/// XML namespace every Atom 1.0 element lives in.
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/Atom";

const FEED_CHECKS: &[ElementCheck] = &[
    ElementCheck::required("id"),
    ElementCheck::required("title"),
    ElementCheck::required("updated"),
    ElementCheck::informational("subtitle"),
    ElementCheck::informational("rights"),
];

const ENTRY_CHECKS: &[ElementCheck] = &[
    ElementCheck::required("id"),
    ElementCheck::required("title"),
    ElementCheck::required("updated"),
];

/// Validates a parsed document as an Atom 1.0 feed.
///
/// The root must be `feed` in [`ATOM_NAMESPACE`]; an unprefixed `<feed>`
/// without the namespace declaration is rejected. Required feed and entry
/// fields are looked up in the same namespace.
pub fn validate_atom(doc: &FeedDocument) -> ValidationResult {
    let mut result = ValidationResult::new(FeedKind::Atom);
    let root = doc.root();
    let ns = Some(ATOM_NAMESPACE);

    if !root.is(ns, "feed") {
        result.fail(format!(
            "Invalid root element for Atom: {}",
            root.qualified_name()
        ));
        return result;
    }
    result.pass(format!("Atom namespace: {}", ATOM_NAMESPACE));

    verify_elements(root, ns, "feed", FEED_CHECKS, &mut result);

    let entries: Vec<_> = root.children(ns, "entry").collect();
    result.info(format!("Found {} entries", entries.len()));
    let Some(first) = entries.first() else {
        result.fail("No entries found");
        return result;
    };

    verify_elements(first, ns, "entry", ENTRY_CHECKS, &mut result);
    report_entry_details(first, &mut result);

    tracing::debug!(
        entries = entries.len(),
        passed = result.passed(),
        "Atom document checked"
    );
    result
}

/// Informational details of an entry: link, summary/content and author.
fn report_entry_details(entry: &Element, result: &mut ValidationResult) {
    let ns = Some(ATOM_NAMESPACE);

    match entry_link(entry) {
        Some(href) => result.info(format!("Entry link: {}", display_value(href, false))),
        None => result.warn("Entry has no link"),
    }

    let summary = entry.child(ns, "summary").map(Element::text_content);
    let content = entry.child(ns, "content").map(Element::text_content);
    match (summary, content) {
        (Some(text), _) if !text.is_empty() => {
            result.info(format!("Entry summary: {}", display_value(&text, true)));
        }
        (_, Some(text)) if !text.is_empty() => {
            result.info(format!("Entry content: {}", display_value(&text, true)));
        }
        _ => result.warn("Entry has neither summary nor content"),
    }

    if let Some(author) = entry.child(ns, "author") {
        let parts: Vec<String> = ["name", "email"]
            .iter()
            .filter_map(|field| author.child(ns, field))
            .map(Element::text_content)
            .filter(|text| !text.is_empty())
            .collect();
        if !parts.is_empty() {
            result.info(format!(
                "Entry author: {}",
                display_value(&parts.join(", "), false)
            ));
        }
    }
}

/// The entry's alternate link, falling back to its first `<link>`.
fn entry_link(entry: &Element) -> Option<&str> {
    let mut links = entry
        .children(Some(ATOM_NAMESPACE), "link")
        .filter(|link| link.attr("href").is_some())
        .peekable();
    let first = links.peek().copied();

    links
        .find(|link| matches!(link.attr("rel"), None | Some("alternate")))
        .or(first)
        .and_then(|link| link.attr("href"))
}
