//! Anchor/marker deduplication.
//!
//! A duplicated region is the text between the end of an anchor and the
//! nearest following marker. Removing it leaves `anchor + marker + rest`.
//! Matching is an explicit two-step search (anchor, then nearest marker
//! after it) followed by a splice, so the stopping point never depends on
//! regex backtracking order.

use crate::error::{Error, Result};
use regex::Regex;
use std::ops::Range;

/// How many anchor/marker spans to collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Only the first anchor occurrence
    #[default]
    First,
    /// Every occurrence, scanning left to right. The marker is not consumed:
    /// the next anchor search starts at the marker, so a marker may also
    /// serve as the following anchor.
    All,
}

#[derive(Debug, Clone)]
enum Matcher {
    /// Literal text; each `\n` in it matches `\n` or `\r\n`
    Literal { text: String, re: Regex },
    Regex(Regex),
}

impl Matcher {
    fn literal(text: &str) -> Result<Self> {
        let escaped = regex::escape(&text.replace("\r\n", "\n"));
        let re = Regex::new(&escaped.replace('\n', r"\r?\n"))?;
        Ok(Matcher::Literal {
            text: text.to_string(),
            re,
        })
    }

    /// Leftmost match starting at or after `start`.
    fn find_at(&self, haystack: &str, start: usize) -> Option<Range<usize>> {
        let re = match self {
            Matcher::Literal { re, .. } => re,
            Matcher::Regex(re) => re,
        };
        re.find_at(haystack, start).map(|m| m.range())
    }

    fn as_str(&self) -> &str {
        match self {
            Matcher::Literal { text, .. } => text.as_str(),
            Matcher::Regex(re) => re.as_str(),
        }
    }
}

/// The fixed pair of boundaries that delimit a duplicated region.
#[derive(Debug, Clone)]
pub struct Pattern {
    anchor: Matcher,
    marker: Matcher,
    scope: Scope,
}

impl Pattern {
    /// Literal anchor and marker text.
    pub fn literal(anchor: &str, marker: &str) -> Result<Self> {
        if anchor.is_empty() {
            return Err(Error::InvalidPattern("anchor must not be empty".into()));
        }
        if marker.is_empty() {
            return Err(Error::InvalidPattern("marker must not be empty".into()));
        }

        Ok(Self {
            anchor: Matcher::literal(anchor)?,
            marker: Matcher::literal(marker)?,
            scope: Scope::First,
        })
    }

    /// Anchor and marker as regular expressions. Each must be able to match
    /// a non-empty span.
    pub fn regex(anchor: &str, marker: &str) -> Result<Self> {
        let anchor_re = Regex::new(anchor)?;
        let marker_re = Regex::new(marker)?;

        if anchor_re.is_match("") {
            return Err(Error::InvalidPattern(format!("anchor '{}' matches the empty string", anchor)));
        }
        if marker_re.is_match("") {
            return Err(Error::InvalidPattern(format!("marker '{}' matches the empty string", marker)));
        }

        Ok(Self {
            anchor: Matcher::Regex(anchor_re),
            marker: Matcher::Regex(marker_re),
            scope: Scope::First,
        })
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    pub fn anchor(&self) -> &str {
        self.anchor.as_str()
    }

    pub fn marker(&self) -> &str {
        self.marker.as_str()
    }

    pub fn is_regex(&self) -> bool {
        matches!(self.anchor, Matcher::Regex(_))
    }

    /// Short human-readable form, used in backup metadata and logs.
    pub fn describe(&self) -> String {
        let kind = if self.is_regex() { "regex" } else { "literal" };
        let scope = match self.scope {
            Scope::First => "first",
            Scope::All => "all",
        };
        format!(
            "{} anchor={:?} marker={:?} scope={}",
            kind,
            self.anchor(),
            self.marker(),
            scope
        )
    }

    /// Next removable span at or after `from`: the bytes between an anchor's
    /// end and the nearest marker start.
    fn next_span(&self, text: &str, from: usize) -> Option<Range<usize>> {
        let anchor = self.anchor.find_at(text, from)?;
        let marker = self.marker.find_at(text, anchor.end)?;
        Some(anchor.end..marker.start)
    }
}

/// A removed region of the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovedSpan {
    /// Byte range into the original content
    pub range: Range<usize>,
    pub text: String,
}

impl RemovedSpan {
    pub fn line_count(&self) -> usize {
        self.text.lines().count()
    }
}

/// Outcome of running a pattern over a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deduplication {
    pub content: String,
    pub removed: Vec<RemovedSpan>,
}

impl Deduplication {
    pub fn is_changed(&self) -> bool {
        !self.removed.is_empty()
    }

    pub fn removed_bytes(&self) -> usize {
        self.removed.iter().map(|s| s.range.len()).sum()
    }

    pub fn removed_lines(&self) -> usize {
        self.removed.iter().map(RemovedSpan::line_count).sum()
    }
}

/// Remove the duplicated region(s) delimited by `pattern`.
///
/// A document without an anchor, or without a marker after the anchor, is
/// returned unchanged. So is one where the marker directly follows the
/// anchor, which makes the operation idempotent.
pub fn deduplicate(text: &str, pattern: &Pattern) -> Deduplication {
    let mut removed = Vec::new();
    let mut from = 0;

    while from <= text.len() {
        let Some(span) = pattern.next_span(text, from) else {
            break;
        };
        let resume = span.end;

        if !span.is_empty() {
            removed.push(RemovedSpan {
                text: text[span.clone()].to_string(),
                range: span,
            });
        }

        if pattern.scope == Scope::First || resume <= from {
            break;
        }
        from = resume;
    }

    if removed.is_empty() {
        tracing::debug!("pattern did not match, document unchanged");
        return Deduplication {
            content: text.to_string(),
            removed,
        };
    }

    let mut content = String::with_capacity(text.len());
    let mut cursor = 0;
    for span in &removed {
        content.push_str(&text[cursor..span.range.start]);
        cursor = span.range.end;
    }
    content.push_str(&text[cursor..]);

    tracing::info!(
        spans = removed.len(),
        bytes = text.len() - content.len(),
        "removed duplicated content"
    );

    Deduplication { content, removed }
}
