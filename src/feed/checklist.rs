//! Shared element checklists and the validation result they feed into.

use std::fmt;

use super::document::Element;
use crate::util::{strip_control_chars, truncate_to_width};

/// Display width for long free-text values (descriptions, summaries).
pub const PREVIEW_WIDTH: usize = 53;

/// Which syndication format a document is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedKind {
    Rss,
    Atom,
}

impl fmt::Display for FeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedKind::Rss => f.write_str("RSS"),
            FeedKind::Atom => f.write_str("Atom"),
        }
    }
}

/// Whether a missing element invalidates the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Required,
    /// Reported when present, never fails validation.
    Informational,
}

/// One entry of a checklist: element local name plus its requirement.
#[derive(Debug, Clone, Copy)]
pub struct ElementCheck {
    pub name: &'static str,
    pub requirement: Requirement,
    /// Long free-text fields are shortened for display.
    pub preview: bool,
}

impl ElementCheck {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            requirement: Requirement::Required,
            preview: false,
        }
    }

    pub const fn informational(name: &'static str) -> Self {
        Self {
            name,
            requirement: Requirement::Informational,
            preview: false,
        }
    }

    pub const fn with_preview(mut self) -> Self {
        self.preview = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Pass,
    Info,
    Warn,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
}

/// Outcome of validating one document: pass/fail plus the lines explaining it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub kind: FeedKind,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    pub fn new(kind: FeedKind) -> Self {
        Self {
            kind,
            diagnostics: Vec::new(),
        }
    }

    /// True when no check failed.
    pub fn passed(&self) -> bool {
        !self.diagnostics.iter().any(|d| d.level == Level::Fail)
    }

    pub fn failures(&self) -> impl Iterator<Item = &str> + '_ {
        self.diagnostics
            .iter()
            .filter(|d| d.level == Level::Fail)
            .map(|d| d.message.as_str())
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            level,
            message: message.into(),
        });
    }

    pub fn pass(&mut self, message: impl Into<String>) {
        self.push(Level::Pass, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.push(Level::Warn, message);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.push(Level::Fail, message);
    }
}

/// Renders a feed value for the console: control characters stripped,
/// optionally shortened to [`PREVIEW_WIDTH`] columns.
pub fn display_value(value: &str, preview: bool) -> String {
    let clean = strip_control_chars(value);
    if preview {
        truncate_to_width(&clean, PREVIEW_WIDTH).into_owned()
    } else {
        clean.into_owned()
    }
}

/// Runs a checklist against the direct children of `parent`.
///
/// `scope` names the parent in messages ("channel", "item", "feed", "entry").
/// Required elements must be present with non-empty text; informational ones
/// are only reported when present. Every entry is evaluated so that all
/// missing fields are listed, not just the first.
pub fn verify_elements(
    parent: &Element,
    namespace: Option<&str>,
    scope: &str,
    checks: &[ElementCheck],
    result: &mut ValidationResult,
) {
    for check in checks {
        let found = parent.child(namespace, check.name);
        match (check.requirement, found) {
            (Requirement::Required, None) => {
                result.fail(format!(
                    "Missing required {} element: {}",
                    scope, check.name
                ));
            }
            (Requirement::Required, Some(element)) => {
                let text = element.text_content();
                if text.is_empty() {
                    result.fail(format!(
                        "Required {} element is empty: {}",
                        scope, check.name
                    ));
                } else {
                    result.pass(format!(
                        "{} {}: {}",
                        capitalize(scope),
                        check.name,
                        display_value(&text, check.preview)
                    ));
                }
            }
            (Requirement::Informational, Some(element)) => {
                result.info(format!(
                    "{} {}: {}",
                    capitalize(scope),
                    check.name,
                    display_value(&element.text_content(), check.preview)
                ));
            }
            (Requirement::Informational, None) => {}
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
