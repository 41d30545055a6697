//! Article-region sanitisation.
//!
//! The parsed DOM is read, never mutated: [`sanitize_region`] walks the
//! region once and writes a fresh HTML string with page chrome and
//! presentation stripped.
//!
//! Removed outright (with all descendants): `nav`, `button`, `footer`,
//! `script`, `style`, and comments. Removed from every surviving element:
//! `style` and `class` attributes.

use markup5ever_rcdom::{Handle, NodeData};

/// Elements dropped together with their subtree.
pub const STRIPPED_ELEMENTS: &[&str] = &["nav", "button", "footer", "script", "style"];

/// Attributes removed from every element.
pub const STRIPPED_ATTRIBUTES: &[&str] = &["style", "class"];

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "basefont", "bgsound", "br", "col", "embed", "frame", "hr", "img", "input",
    "keygen", "link", "meta", "param", "source", "track", "wbr",
];

/// Elements whose content the parser keeps as unparsed text. The element
/// survives; that text is dropped.
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "iframe", "noembed", "noframes", "noscript", "plaintext", "xmp",
];

const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const XMLNS_NS: &str = "http://www.w3.org/2000/xmlns/";
const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Pending work for the serialiser.
enum Step {
    Visit { node: Handle, raw_parent: bool },
    Close(String),
}

/// Sanitise the children of `region` and serialise them to HTML.
///
/// The region element itself is not included; the result is its inner HTML.
/// The walk keeps its own stack, so nesting depth is bounded by memory only.
pub fn sanitize_region(region: &Handle) -> String {
    let mut out = String::new();
    let mut stack = Vec::new();
    push_children(region, false, &mut stack);

    while let Some(step) = stack.pop() {
        let (node, raw_parent) = match step {
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(&name);
                out.push('>');
                continue;
            }
            Step::Visit { node, raw_parent } => (node, raw_parent),
        };

        match node.data {
            NodeData::Text { ref contents } if !raw_parent => {
                escape_text(&contents.borrow(), &mut out)
            }
            NodeData::Element {
                ref name,
                ref attrs,
                ..
            } => {
                let local = name.local.as_ref();
                if STRIPPED_ELEMENTS.contains(&local) {
                    continue;
                }
                out.push('<');
                out.push_str(local);
                for attr in attrs
                    .borrow()
                    .iter()
                    .filter(|a| !STRIPPED_ATTRIBUTES.contains(&a.name.local.as_ref()))
                {
                    out.push(' ');
                    out.push_str(&attribute_name(attr));
                    out.push_str("=\"");
                    escape_attribute(&attr.value, &mut out);
                    out.push('"');
                }
                out.push('>');
                if VOID_ELEMENTS.contains(&local) {
                    continue;
                }
                stack.push(Step::Close(local.to_string()));
                push_children(&node, RAW_TEXT_ELEMENTS.contains(&local), &mut stack);
            }
            // Raw text, comments, doctypes and processing instructions.
            _ => {}
        }
    }
    out
}

/// Queue the children of `handle` so the first child is popped first.
fn push_children(handle: &Handle, raw_parent: bool, stack: &mut Vec<Step>) {
    let children = match handle.data {
        NodeData::Element {
            ref template_contents,
            ..
        } => match template_contents.borrow().as_ref() {
            Some(contents) => contents.children.borrow().clone(),
            None => handle.children.borrow().clone(),
        },
        _ => handle.children.borrow().clone(),
    };
    stack.extend(
        children
            .into_iter()
            .rev()
            .map(|node| Step::Visit { node, raw_parent }),
    );
}

fn attribute_name(attr: &html5ever::Attribute) -> String {
    let local = attr.name.local.as_ref();
    let prefix = match attr.name.ns.as_ref() {
        XML_NS => Some("xml"),
        XMLNS_NS if local != "xmlns" => Some("xmlns"),
        XLINK_NS => Some("xlink"),
        _ => None,
    };
    match prefix {
        Some(p) => format!("{p}:{local}"),
        None => local.to_string(),
    }
}

/// Escape `& < >` and non-breaking spaces in text content.
pub fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}
