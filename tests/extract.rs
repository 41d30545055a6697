//! Extraction scenarios and properties.

use article2pdf::{extract_article, ExtractError};
use chrono::NaiveDate;
use proptest::prelude::*;

#[test]
fn article_heading_author_and_date() {
    let html = r#"<!DOCTYPE html>
<html>
<head>
  <title>Site | Understanding Async</title>
  <meta name="author" content="Jane">
  <meta property="article:published_time" content="2026-01-15T10:00:00Z">
</head>
<body>
  <article><h1>Understanding Async</h1><p>Body</p></article>
</body>
</html>"#;

    let doc = extract_article(html).unwrap();
    assert_eq!(doc.title(), "Understanding Async");
    assert_eq!(doc.author(), Some("Jane"));
    assert_eq!(doc.publish_date(), NaiveDate::from_ymd_opt(2026, 1, 15));
    assert!(doc.body_html().contains("<p>Body</p>"));
}

#[test]
fn og_title_when_no_heading() {
    let html = r#"<html><head><meta property="og:title" content="OG Title">
<title>Fallback</title></head><body><main><p>x</p></main></body></html>"#;

    let doc = extract_article(html).unwrap();
    assert_eq!(doc.title(), "OG Title");
}

#[test]
fn title_tag_is_last_resort() {
    let html = "<html><head><title> Plain  Title </title></head>\
                <body><article><p>x</p></article></body></html>";
    assert_eq!(extract_article(html).unwrap().title(), "Plain Title");
}

#[test]
fn no_title_anywhere() {
    let html = "<html><body><article><p>x</p></article></body></html>";
    match extract_article(html) {
        Err(ExtractError::NoTitleFound { excerpt }) => assert_eq!(excerpt, html),
        other => panic!("expected NoTitleFound, got {other:?}"),
    }
}

#[test]
fn chrome_only_article_is_empty_body() {
    let html = "<html><head><title>T</title></head><body>\
                <article><nav><a href='/'>Home</a></nav><script>track()</script></article>\
                </body></html>";
    assert!(matches!(
        extract_article(html),
        Err(ExtractError::EmptyBody { .. })
    ));
}

#[test]
fn excerpt_is_bounded() {
    let html = format!(
        "<html><body><div>{}</div></body></html>",
        "lorem ipsum ".repeat(200)
    );
    let err = extract_article(&html).unwrap_err();
    assert_eq!(err.excerpt().map(|e| e.chars().count()), Some(500));
}

#[test]
fn missing_optional_fields_are_absent() {
    let html = r#"<html><head><meta name="author" content="  "></head>
<body><article><h1>T</h1><time datetime="not a date">?</time><p>x</p></article></body></html>"#;
    let doc = extract_article(html).unwrap();
    assert_eq!(doc.author(), None);
    assert_eq!(doc.publish_date(), None);
}

#[test]
fn time_element_supplies_date() {
    let html = r#"<html><body><article><h1>T</h1>
<time datetime="2024-07-04T08:15:00+02:00">July 4</time><p>x</p></article></body></html>"#;
    let doc = extract_article(html).unwrap();
    assert_eq!(doc.publish_date(), NaiveDate::from_ymd_opt(2024, 7, 4));
}

#[test]
fn realistic_page_keeps_content_and_drops_chrome() {
    let html = r#"<!DOCTYPE html>
<html><head><title>Blog</title><style>.x{}</style></head>
<body>
<nav class="top"><a href="/">Home</a></nav>
<main class="layout">
  <article class="post" style="padding:0">
    <h1 class="title">Ownership in Practice</h1>
    <p class="lead" style="font-size:2em">Borrowing <a href="/b" class="l">rules</a>.</p>
    <pre class="hl"><code class="rust">let x = &amp;y;</code></pre>
    <figure><img src="/i.png" alt="diagram" class="wide"><figcaption>Fig 1</figcaption></figure>
    <blockquote style="color:red">Quote</blockquote>
    <button class="clap">👏</button>
    <footer class="meta"><p>Share this</p></footer>
  </article>
</main>
<footer>Site footer</footer>
</body></html>"#;

    let doc = extract_article(html).unwrap();
    let body = doc.body_html();
    assert_eq!(doc.title(), "Ownership in Practice");
    for kept in [
        "<h1>Ownership in Practice</h1>",
        "<a href=\"/b\">rules</a>",
        "<code>let x = &amp;y;</code>",
        "<img src=\"/i.png\" alt=\"diagram\">",
        "<figcaption>Fig 1</figcaption>",
        "<blockquote>Quote</blockquote>",
    ] {
        assert!(body.contains(kept), "missing {kept} in {body}");
    }
    for dropped in ["<button", "<footer", "Share this", "class=", "style="] {
        assert!(!body.contains(dropped), "found {dropped} in {body}");
    }
}

// ── Properties ───────────────────────────────────────────────────────────

const TAGS: &[&str] = &[
    "div", "p", "section", "span", "em", "ul", "li", "nav", "button", "footer", "script", "style",
    "noscript", "iframe", "template",
];
const ATTRS: &[&str] = &["id", "title", "data-k", "style", "class"];

#[derive(Debug, Clone)]
enum Node {
    Text(String),
    Element {
        tag: &'static str,
        attrs: Vec<(&'static str, String)>,
        children: Vec<Node>,
    },
}

impl Node {
    fn render(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(t),
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                out.push('<');
                out.push_str(tag);
                for (k, v) in attrs {
                    out.push_str(&format!(" {k}=\"{v}\""));
                }
                out.push('>');
                for c in children {
                    c.render(out);
                }
                out.push_str(&format!("</{tag}>"));
            }
        }
    }
}

fn node_strategy() -> impl Strategy<Value = Node> {
    let leaf = "[a-z ]{0,12}".prop_map(Node::Text);
    leaf.prop_recursive(8, 64, 4, |inner| {
        (
            prop::sample::select(TAGS),
            prop::collection::vec((prop::sample::select(ATTRS), "[a-z0-9]{0,6}"), 0..3),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(tag, attrs, children)| Node::Element {
                tag,
                attrs,
                children,
            })
    })
}

/// Markup for `tags` nested inside each other around a text leaf.
fn chain(tags: &[(&'static str, bool)]) -> String {
    let mut out = String::new();
    for &(tag, styled) in tags {
        if styled {
            out.push_str(&format!("<{tag} class=\"c\" style=\"s\">"));
        } else {
            out.push_str(&format!("<{tag}>"));
        }
    }
    out.push_str("leaf");
    for &(tag, _) in tags.iter().rev() {
        out.push_str(&format!("</{tag}>"));
    }
    out
}

fn page(nodes: &[Node]) -> String {
    let mut body = String::new();
    for n in nodes {
        n.render(&mut body);
    }
    wrap(&body)
}

fn wrap(body: &str) -> String {
    format!("<html><head><title>Generated</title></head><body><article>{body}</article></body></html>")
}

fn assert_no_chrome(body: &str) -> Result<(), TestCaseError> {
    for tag in ["<nav", "<button", "<footer", "<script", "<style"] {
        prop_assert!(!body.contains(tag), "{} in {}", tag, body);
    }
    prop_assert!(!body.contains(" style="), "style attr in {}", body);
    prop_assert!(!body.contains(" class="), "class attr in {}", body);
    Ok(())
}

proptest! {
    /// Identical markup always yields an identical outcome.
    #[test]
    fn prop_extraction_is_deterministic(nodes in prop::collection::vec(node_strategy(), 0..5)) {
        let html = page(&nodes);
        prop_assert_eq!(extract_article(&html), extract_article(&html));
    }

    /// Page chrome and presentation attributes never survive, at any depth.
    #[test]
    fn prop_sanitized_body_has_no_chrome(nodes in prop::collection::vec(node_strategy(), 1..5)) {
        let html = page(&nodes);
        if let Ok(doc) = extract_article(&html) {
            assert_no_chrome(doc.body_html())?;
        }
    }

    /// Arbitrary text never panics the extractor.
    #[test]
    fn prop_arbitrary_input_never_panics(input in ".{0,400}") {
        let _ = extract_article(&input);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    /// The guarantee holds for chains nested thousands of levels deep.
    #[test]
    fn prop_deep_nesting_has_no_chrome(
        tags in prop::collection::vec((prop::sample::select(TAGS), any::<bool>()), 1000..4000)
    ) {
        let html = wrap(&chain(&tags));
        if let Ok(doc) = extract_article(&html) {
            assert_no_chrome(doc.body_html())?;
        }
    }
}

#[test]
fn noscript_fallback_images_lose_presentation() {
    let html = r#"<article><h1>T</h1><noscript><img class="x" style="color:red" src="a.png"><script>evil()</script></noscript><p>b</p></article>"#;
    let doc = extract_article(html).unwrap();
    assert!(!doc.body_html().contains("class="), "{}", doc.body_html());
    assert!(!doc.body_html().contains("<script"), "{}", doc.body_html());
    assert!(doc.body_html().contains(r#"<img src="a.png">"#));
}

#[test]
fn deeply_nested_page_extracts_on_worker_sized_stack() {
    let depth = 20_000;
    let html = format!(
        "<html><head><title>Deep</title></head><body><article>{}<p class='x'>end</p>{}</article></body></html>",
        "<section style='a'>".repeat(depth),
        "</section>".repeat(depth)
    );
    let doc = std::thread::Builder::new()
        .stack_size(2 * 1024 * 1024)
        .spawn(move || extract_article(&html))
        .unwrap()
        .join()
        .unwrap()
        .unwrap();
    assert_eq!(doc.title(), "Deep");
    assert!(doc.body_html().contains("<p>end</p>"));
    assert!(!doc.body_html().contains("style="));
}
