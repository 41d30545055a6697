//! Data carried between pipeline stages.
//!
//! [`ExtractedDocument`] is the extraction stage's only output and the
//! renderer's only content input. Its fields are private so an instance can
//! only exist with a non-empty title and body.

use chrono::NaiveDate;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why an [`ExtractedDocument`] could not be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidDocument {
    #[error("document title is empty")]
    EmptyTitle,
    #[error("document body is empty")]
    EmptyBody,
}

/// Title, byline and sanitised body of one article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractedDocument {
    title: String,
    author: Option<String>,
    publish_date: Option<NaiveDate>,
    body_html: String,
}

impl ExtractedDocument {
    /// Builds a document, rejecting a blank title or body.
    ///
    /// Title and body are trimmed; an author that trims to nothing is dropped.
    pub fn new(
        title: impl Into<String>,
        author: Option<String>,
        publish_date: Option<NaiveDate>,
        body_html: impl Into<String>,
    ) -> Result<Self, InvalidDocument> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(InvalidDocument::EmptyTitle);
        }
        let body_html = body_html.into().trim().to_string();
        if body_html.is_empty() {
            return Err(InvalidDocument::EmptyBody);
        }
        let author = author
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        Ok(Self {
            title,
            author,
            publish_date,
            body_html,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn author(&self) -> Option<&str> {
        self.author.as_deref()
    }

    pub fn publish_date(&self) -> Option<NaiveDate> {
        self.publish_date
    }

    /// Sanitised inner HTML of the article region.
    pub fn body_html(&self) -> &str {
        &self.body_html
    }
}

/// Where a custom stylesheet comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StylesheetSource {
    /// Read from disk when the render starts; unreadable → configuration error.
    Path(PathBuf),
    /// Already-loaded CSS text.
    Inline(String),
}

/// One render invocation: document, destination and optional style override.
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub document: ExtractedDocument,
    pub destination: PathBuf,
    pub custom_stylesheet: Option<StylesheetSource>,
}

impl RenderRequest {
    pub fn new(document: ExtractedDocument, destination: impl Into<PathBuf>) -> Self {
        Self {
            document,
            destination: destination.into(),
            custom_stylesheet: None,
        }
    }

    /// Attach a stylesheet file applied after the default rules.
    pub fn with_stylesheet_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.custom_stylesheet = Some(StylesheetSource::Path(path.into()));
        self
    }

    /// Attach CSS text applied after the default rules.
    pub fn with_stylesheet(mut self, css: impl Into<String>) -> Self {
        self.custom_stylesheet = Some(StylesheetSource::Inline(css.into()));
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }
}

/// What a finished conversion produced.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionSummary {
    pub title: String,
    pub author: Option<String>,
    pub publish_date: Option<NaiveDate>,
    pub output_path: PathBuf,
    /// Size of the downloaded markup in bytes.
    pub markup_bytes: usize,
    /// Size of the written PDF in bytes.
    pub pdf_bytes: usize,
    pub duration_ms: u64,
}
