//! Namespace-aware XML document tree for feed validation.
//!
//! Feeds are small, so the whole document is materialized into an [`Element`]
//! tree once and the validators query it by `(namespace, local name)`.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;
use thiserror::Error;

/// Errors that can occur while turning raw bytes into a [`FeedDocument`].
///
/// These are kept apart from structural validation failures: a feed that
/// fails here was never inspected for required elements.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The underlying XML reader rejected the input.
    #[error("XML syntax error at byte {position}: {message}")]
    Syntax { message: String, position: u64 },
    /// An element used a namespace prefix that was never declared.
    #[error("Unknown namespace prefix: {0}")]
    UnknownPrefix(String),
    /// An attribute could not be read (duplicate, unquoted, bad escape).
    #[error("Invalid attribute: {0}")]
    Attribute(String),
    /// Input ended while an element was still open.
    #[error("Unclosed element <{0}> at end of document")]
    UnclosedElement(String),
    /// Input contained no elements at all.
    #[error("Document has no root element")]
    NoRoot,
    /// Text or a second element appeared outside the single root element.
    #[error("Unexpected content outside the root element: {0}")]
    TrailingContent(String),
}

/// A single XML element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    name: String,
    namespace: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Element>,
    text: String,
}

impl Element {
    /// Local name without any prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace URI the element resolved to, if any.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Name in Clark notation (`{uri}local`), or the bare local name when unbound.
    pub fn qualified_name(&self) -> String {
        match &self.namespace {
            Some(ns) => format!("{{{}}}{}", ns, self.name),
            None => self.name.clone(),
        }
    }

    pub fn is(&self, namespace: Option<&str>, name: &str) -> bool {
        self.namespace.as_deref() == namespace && self.name == name
    }

    /// Attribute value by its name as written (e.g. `version`, `xml:lang`).
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// First direct child matching the namespace and local name.
    pub fn child(&self, namespace: Option<&str>, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.is(namespace, name))
    }

    /// All direct children matching the namespace and local name, in document order.
    pub fn children<'a>(
        &'a self,
        namespace: Option<&'a str>,
        name: &'a str,
    ) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.is(namespace, name))
    }

    /// Text directly inside this element (entity references and CDATA decoded).
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Text of this element and all descendants, trimmed.
    ///
    /// Atom permits `type="xhtml"` titles whose text lives in a nested `<div>`,
    /// so emptiness checks look through markup.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

/// A successfully parsed feed document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedDocument {
    root: Element,
}

impl FeedDocument {
    pub fn root(&self) -> &Element {
        &self.root
    }
}

/// Parses raw bytes into a [`FeedDocument`].
///
/// Namespace prefixes are resolved while reading, so `atom:entry` and a
/// default-namespaced `entry` compare equal. No recovery is attempted: the
/// first error ends parsing.
///
/// # Errors
///
/// Returns [`ParseError`] for malformed XML, undeclared prefixes, unclosed
/// elements, an empty document, or content after the root element.
pub fn parse_document(bytes: &[u8]) -> Result<FeedDocument, ParseError> {
    // Entity declarations in a DOCTYPE are never expanded by quick-xml 0.37;
    // only the five predefined entities and character references resolve.
    let mut reader = NsReader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut buf = Vec::new();
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let (resolved, event) = match reader.read_resolved_event_into(&mut buf) {
            Ok(pair) => pair,
            Err(e) => {
                return Err(ParseError::Syntax {
                    message: e.to_string(),
                    position: reader.buffer_position() as u64,
                })
            }
        };
        let namespace = namespace_uri(resolved)?;

        match event {
            Event::Start(start) => {
                if root.is_some() {
                    return Err(ParseError::TrailingContent(local_name(&start)));
                }
                stack.push(element_from(&start, namespace)?);
            }
            Event::Empty(start) => {
                if root.is_some() {
                    return Err(ParseError::TrailingContent(local_name(&start)));
                }
                let element = element_from(&start, namespace)?;
                attach(&mut stack, &mut root, element);
            }
            Event::End(_) => {
                // Mismatched end names are rejected by the reader itself.
                if let Some(element) = stack.pop() {
                    attach(&mut stack, &mut root, element);
                }
            }
            Event::Text(text) => {
                let unescaped = text.unescape().map_err(|e| ParseError::Syntax {
                    message: e.to_string(),
                    position: reader.buffer_position() as u64,
                })?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(&unescaped),
                    None => return Err(ParseError::TrailingContent(unescaped.into_owned())),
                }
            }
            Event::CData(cdata) => {
                let text = std::str::from_utf8(&cdata).map_err(|e| ParseError::Syntax {
                    message: format!("invalid UTF-8 in CDATA section: {}", e),
                    position: reader.buffer_position() as u64,
                })?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(text),
                    None => return Err(ParseError::TrailingContent(text.to_string())),
                }
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = stack.last() {
        return Err(ParseError::UnclosedElement(open.name.clone()));
    }

    let root = root.ok_or(ParseError::NoRoot)?;
    tracing::trace!(root = %root.qualified_name(), "Parsed feed document");
    Ok(FeedDocument { root })
}

fn namespace_uri(resolved: ResolveResult<'_>) -> Result<Option<String>, ParseError> {
    match resolved {
        ResolveResult::Bound(ns) => Ok(Some(String::from_utf8_lossy(ns.as_ref()).into_owned())),
        ResolveResult::Unbound => Ok(None),
        ResolveResult::Unknown(prefix) => Err(ParseError::UnknownPrefix(
            String::from_utf8_lossy(&prefix).into_owned(),
        )),
    }
}

fn local_name(start: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(start.local_name().as_ref()).into_owned()
}

fn element_from(start: &BytesStart<'_>, namespace: Option<String>) -> Result<Element, ParseError> {
    let mut attributes = Vec::new();
    for attr_result in start.attributes() {
        let attr = attr_result.map_err(|e| ParseError::Attribute(e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| ParseError::Attribute(format!("{}: {}", key, e)))?
            .into_owned();
        attributes.push((key, value));
    }

    Ok(Element {
        name: local_name(start),
        namespace,
        attributes,
        children: Vec::new(),
        text: String::new(),
    })
}

/// Hangs a finished element on its parent, or makes it the root.
fn attach(stack: &mut [Element], root: &mut Option<Element>, element: Element) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => *root = Some(element),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

    #[test]
    fn test_parses_nested_elements_and_attributes() {
        let doc = parse_document(
            br#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Blog</title><item><title>One</title></item></channel></rss>"#,
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.name(), "rss");
        assert_eq!(root.namespace(), None);
        assert_eq!(root.attr("version"), Some("2.0"));

        let channel = root.child(None, "channel").unwrap();
        assert_eq!(channel.child(None, "title").unwrap().text(), "Blog");
        assert_eq!(channel.children(None, "item").count(), 1);
    }

    #[test]
    fn test_default_namespace_is_resolved() {
        let doc = parse_document(
            br#"<feed xmlns="http://www.w3.org/2005/Atom"><id>urn:x</id></feed>"#,
        )
        .unwrap();

        assert!(doc.root().is(Some(ATOM_NS), "feed"));
        assert_eq!(
            doc.root().qualified_name(),
            "{http://www.w3.org/2005/Atom}feed"
        );
        assert!(doc.root().child(Some(ATOM_NS), "id").is_some());
        assert!(doc.root().child(None, "id").is_none());
    }

    #[test]
    fn test_prefixed_namespace_is_resolved() {
        let doc = parse_document(
            br#"<a:feed xmlns:a="http://www.w3.org/2005/Atom"><a:title>T</a:title></a:feed>"#,
        )
        .unwrap();

        assert!(doc.root().is(Some(ATOM_NS), "feed"));
        assert_eq!(doc.root().child(Some(ATOM_NS), "title").unwrap().text(), "T");
    }

    #[test]
    fn test_entities_and_cdata_are_decoded() {
        let doc = parse_document(
            b"<rss><title>Fish &amp; Chips</title><description><![CDATA[<b>bold</b>]]></description></rss>",
        )
        .unwrap();

        assert_eq!(doc.root().child(None, "title").unwrap().text(), "Fish & Chips");
        assert_eq!(
            doc.root().child(None, "description").unwrap().text(),
            "<b>bold</b>"
        );
    }

    #[test]
    fn test_invalid_utf8_in_cdata_is_parse_error() {
        let result = parse_document(b"<rss><description><![CDATA[ok \xff\xfe]]></description></rss>");
        match result {
            Err(ParseError::Syntax { message, .. }) => assert!(message.contains("CDATA")),
            other => panic!("Expected Syntax error, got {:?}", other),
        }
    }

    #[test]
    fn test_cdata_after_root_is_trailing_content() {
        let result = parse_document(b"<rss></rss><![CDATA[extra]]>");
        assert!(matches!(result, Err(ParseError::TrailingContent(_))));
    }

    #[test]
    fn test_text_content_includes_descendants() {
        let doc = parse_document(
            br#"<title type="xhtml"><div xmlns="http://www.w3.org/1999/xhtml">Hello <b>there</b></div></title>"#,
        )
        .unwrap();

        assert_eq!(doc.root().text(), "");
        assert_eq!(doc.root().text_content(), "Hellothere");
    }

    #[test]
    fn test_truncated_tag_is_parse_error() {
        let result = parse_document(br#"<rss version="2.0"><channel><title>x</ti"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_unclosed_element_is_parse_error() {
        let result = parse_document(br#"<rss version="2.0"><channel>"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_mismatched_end_tag_is_parse_error() {
        let result = parse_document(b"<rss><channel></item></rss>");
        assert!(matches!(result, Err(ParseError::Syntax { .. })));
    }

    #[test]
    fn test_empty_input_has_no_root() {
        assert!(matches!(parse_document(b""), Err(ParseError::NoRoot)));
        assert!(matches!(
            parse_document(b"<?xml version=\"1.0\"?>"),
            Err(ParseError::NoRoot)
        ));
    }

    #[test]
    fn test_second_root_is_rejected() {
        let result = parse_document(b"<rss></rss><rss></rss>");
        assert!(matches!(result, Err(ParseError::TrailingContent(_))));
    }

    #[test]
    fn test_unknown_prefix_is_rejected() {
        let result = parse_document(b"<x:feed></x:feed>");
        assert!(matches!(result, Err(ParseError::UnknownPrefix(_))));
    }

    #[test]
    fn test_self_closing_root() {
        let doc = parse_document(br#"<rss version="2.0"/>"#).unwrap();
        assert_eq!(doc.root().attr("version"), Some("2.0"));
        assert!(doc.root().child(None, "channel").is_none());
    }
}
