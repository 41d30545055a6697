//! Heuristic article extraction.
//!
//! Each field is resolved by an ordered chain of candidates; the first one
//! that yields a non-empty value wins.
//!
//! | Field  | Candidates                                                              |
//! |--------|-------------------------------------------------------------------------|
//! | title  | first `h1` inside `article`/`main` → `og:title` meta → `<title>`        |
//! | author | `<meta name="author">`                                                  |
//! | date   | `article:published_time` meta → `<time datetime>` (first parseable)     |
//! | body   | first `article` → first `main`, sanitised (see [`super::sanitize`])     |
//!
//! Extraction is a pure function of the markup: no I/O, no clocks, no
//! randomness.

use crate::document::ExtractedDocument;
use crate::error::{markup_excerpt, ExtractError};
use crate::pipeline::sanitize::sanitize_region;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use html5ever::tendril::TendrilSink;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{parse_document, ParseOpts};
use markup5ever_rcdom::{Handle, NodeData, RcDom};
use tracing::debug;

/// Regions searched for the title heading and the body.
const CONTENT_REGIONS: &[&str] = &["article", "main"];

/// Extract title, byline and sanitised body from raw article markup.
///
/// # Errors
/// - [`ExtractError::InvalidInput`] for empty or whitespace-only markup
/// - [`ExtractError::NoTitleFound`] when no title candidate matches
/// - [`ExtractError::NoBodyFound`] when there is no `article` or `main`
/// - [`ExtractError::EmptyBody`] when sanitisation leaves nothing
pub fn extract_article(markup: &str) -> Result<ExtractedDocument, ExtractError> {
    if markup.trim().is_empty() {
        return Err(ExtractError::InvalidInput);
    }

    let dom = parse_markup(markup);
    let root = &dom.document;

    let title = resolve_title(root).ok_or_else(|| ExtractError::NoTitleFound {
        excerpt: markup_excerpt(markup),
    })?;
    let author = resolve_author(root);
    let publish_date = resolve_publish_date(root);

    let region = CONTENT_REGIONS
        .iter()
        .find_map(|tag| find_first(root, &|h| is_element(h, tag)))
        .ok_or_else(|| ExtractError::NoBodyFound {
            excerpt: markup_excerpt(markup),
        })?;
    let body_html = sanitize_region(&region);

    debug!(
        "Extracted '{}' (author: {:?}, date: {:?}, body: {} bytes)",
        title,
        author,
        publish_date,
        body_html.len()
    );

    ExtractedDocument::new(title, author, publish_date, body_html).map_err(|_| {
        ExtractError::EmptyBody {
            excerpt: markup_excerpt(markup),
        }
    })
}

/// Parse `markup` the way a browser with scripting disabled would, so
/// `<noscript>` children become elements that sanitisation can inspect.
pub(crate) fn parse_markup(markup: &str) -> RcDom {
    let opts = ParseOpts {
        tree_builder: TreeBuilderOpts {
            scripting_enabled: false,
            ..Default::default()
        },
        ..Default::default()
    };
    parse_document(RcDom::default(), opts).one(markup)
}

// ── Title ────────────────────────────────────────────────────────────────

fn resolve_title(root: &Handle) -> Option<String> {
    if let Some(heading) = first_region_heading(root) {
        debug!("Title from region heading");
        return Some(heading);
    }
    if let Some(og) = meta_content(root, "property", "og:title") {
        debug!("Title from og:title meta");
        return Some(og);
    }
    let title = find_first(root, &|h| {
        is_element(h, "title") && !collapse_whitespace(&text_content(h)).is_empty()
    })
    .map(|h| collapse_whitespace(&text_content(&h)));
    if title.is_some() {
        debug!("Title from <title>");
    }
    title
}

/// First non-empty `h1` in document order that sits inside a content region.
fn first_region_heading(root: &Handle) -> Option<String> {
    let mut stack = vec![(root.clone(), false)];
    while let Some((node, in_region)) = stack.pop() {
        let in_region = in_region || CONTENT_REGIONS.iter().any(|tag| is_element(&node, tag));
        if in_region && is_element(&node, "h1") {
            let text = collapse_whitespace(&text_content(&node));
            if !text.is_empty() {
                return Some(text);
            }
        }
        stack.extend(
            node.children
                .borrow()
                .iter()
                .rev()
                .map(|child| (child.clone(), in_region)),
        );
    }
    None
}

// ── Byline ───────────────────────────────────────────────────────────────

fn resolve_author(root: &Handle) -> Option<String> {
    meta_content(root, "name", "author")
}

fn resolve_publish_date(root: &Handle) -> Option<NaiveDate> {
    if let Some(date) = meta_contents(root, "property", "article:published_time")
        .iter()
        .find_map(|v| parse_date(v))
    {
        return Some(date);
    }

    descendants(root)
        .filter(|h| is_element(h, "time"))
        .filter_map(|h| attr(&h, "datetime"))
        .find_map(|v| parse_date(&v))
}

/// Parse a date or date-time and keep only the calendar date.
///
/// Accepts RFC 3339, RFC 2822, ISO 8601 with or without offset or
/// fractional seconds, and bare `YYYY-MM-DD`. Anything else yields `None`.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%dT%H:%M%z"] {
        if let Ok(dt) = DateTime::parse_from_str(value, fmt) {
            return Some(dt.date_naive());
        }
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

// ── DOM helpers ──────────────────────────────────────────────────────────

fn is_element(handle: &Handle, tag: &str) -> bool {
    matches!(handle.data, NodeData::Element { ref name, .. } if name.local.as_ref() == tag)
}

fn attr(handle: &Handle, key: &str) -> Option<String> {
    match handle.data {
        NodeData::Element { ref attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref().eq_ignore_ascii_case(key))
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Trimmed `content` of every `<meta key="value">`, empties skipped.
fn meta_contents(root: &Handle, key: &str, value: &str) -> Vec<String> {
    descendants(root)
        .filter(|h| {
            is_element(h, "meta")
                && attr(h, key).is_some_and(|v| v.trim().eq_ignore_ascii_case(value))
        })
        .filter_map(|h| attr(&h, "content"))
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .collect()
}

fn meta_content(root: &Handle, key: &str, value: &str) -> Option<String> {
    meta_contents(root, key, value).into_iter().next()
}

/// Pre-order walk over a node and its descendants, driven by an explicit
/// stack rather than recursion.
struct Descendants {
    stack: Vec<Handle>,
}

impl Iterator for Descendants {
    type Item = Handle;

    fn next(&mut self) -> Option<Handle> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.borrow().iter().rev().cloned());
        Some(node)
    }
}

fn descendants(root: &Handle) -> Descendants {
    Descendants {
        stack: vec![root.clone()],
    }
}

/// Depth-first, document-order search.
fn find_first(root: &Handle, pred: &dyn Fn(&Handle) -> bool) -> Option<Handle> {
    descendants(root).find(|h| pred(h))
}

fn text_content(handle: &Handle) -> String {
    let mut out = String::new();
    for node in descendants(handle) {
        if let NodeData::Text { ref contents } = node.data {
            out.push_str(&contents.borrow());
        }
    }
    out
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
