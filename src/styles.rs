//! Stylesheet applied to every rendered article.
//!
//! The default rules always come first in the composed page, so a custom
//! stylesheet (see [`crate::document::RenderRequest::with_stylesheet_path`])
//! can override any of them by ordinary cascade order.

/// Default print stylesheet.
///
/// Serif body text, a muted byline block (`.article-meta`), shaded code
/// blocks, left-ruled blockquotes and images scaled to the page width.
pub const DEFAULT_STYLESHEET: &str = r#"
body {
    font-family: Georgia, 'Times New Roman', serif;
    line-height: 1.8;
    color: #333;
    max-width: 100%;
}
h1 {
    font-size: 2em;
    margin-bottom: 0.3em;
    line-height: 1.2;
}
h2, h3, h4 {
    margin-top: 1.5em;
    margin-bottom: 0.5em;
}
.article-meta {
    color: #666;
    font-size: 0.9em;
    margin-bottom: 2em;
    border-bottom: 1px solid #eee;
    padding-bottom: 1em;
}
p {
    margin-bottom: 1.2em;
}
img {
    max-width: 100%;
    height: auto;
    display: block;
    margin: 1.5em auto;
}
pre, code {
    font-family: 'Courier New', Courier, monospace;
    font-size: 0.9em;
}
pre {
    background-color: #f5f5f5;
    padding: 1em;
    overflow-x: auto;
    border-radius: 4px;
    line-height: 1.4;
    white-space: pre-wrap;
}
code {
    background-color: #f5f5f5;
    padding: 0.2em 0.4em;
    border-radius: 3px;
}
pre code {
    background: none;
    padding: 0;
}
blockquote {
    border-left: 3px solid #ccc;
    padding-left: 1em;
    margin-left: 0;
    color: #555;
    font-style: italic;
}
a {
    color: #1a8917;
    text-decoration: none;
}
figure {
    margin: 1.5em 0;
    page-break-inside: avoid;
}
figcaption {
    text-align: center;
    font-size: 0.85em;
    color: #666;
    margin-top: 0.5em;
}
"#;

/// Class of the byline block under the title.
pub const META_CLASS: &str = "article-meta";

/// Separator between the author and date in the byline.
pub const META_SEPARATOR: &str = " &middot; ";

/// `chrono` format for the byline date, e.g. "January 15, 2026".
pub const DATE_FORMAT: &str = "%B %-d, %Y";
