//! HTML sanitization.
//!
//! [`AllowlistSanitizer`] parses an HTML fragment with `html5ever`, walks the
//! resulting DOM and reserializes what is left:
//!
//! - elements on the allowlist are kept with their allowed attributes only
//! - dangerous containers (`script`, `style`, `iframe`, ...) are removed
//!   together with everything inside them
//! - any other element is unwrapped: its children take its place
//! - comments, doctypes and processing instructions are removed
//! - `href`/`src` values with a scheme other than http, https or mailto are
//!   dropped (`data:image/...` is allowed for `img`)

use std::rc::Rc;

use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::ParseOpts;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};

/// HTML sanitizer capability.
pub trait HtmlSanitizer: Send + Sync {
    /// Return a safe version of `html`.
    fn sanitize(&self, html: &str) -> String;
}

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "b", "blockquote", "br", "caption", "code", "col", "colgroup", "dd", "del",
    "details", "div", "dl", "dt", "em", "figcaption", "figure", "h1", "h2", "h3", "h4", "h5",
    "h6", "hr", "i", "img", "ins", "kbd", "li", "mark", "ol", "p", "pre", "q", "s", "samp",
    "small", "span", "strike", "strong", "sub", "summary", "sup", "table", "tbody", "td",
    "tfoot", "th", "thead", "tr", "u", "ul",
];

const DROP_WITH_CONTENT: &[&str] = &[
    "applet", "embed", "frame", "frameset", "iframe", "math", "noembed", "noframes", "noscript",
    "object", "script", "select", "style", "svg", "template", "textarea", "title", "xmp",
];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

enum Action {
    Keep,
    Unwrap,
    Drop,
}

/// Tag and attribute allowlist sanitizer.
#[derive(Debug, Clone, Default)]
pub struct AllowlistSanitizer;

impl AllowlistSanitizer {
    /// Create the default sanitizer.
    pub fn new() -> Self {
        Self
    }

    fn keep_attr(tag: &str, attr: &str, value: &str) -> bool {
        let allowed = match attr {
            "title" | "lang" | "dir" => true,
            "href" => tag == "a",
            "src" | "alt" | "width" | "height" => tag == "img",
            "colspan" | "rowspan" | "align" | "style" => matches!(tag, "td" | "th"),
            "start" => tag == "ol",
            "class" => matches!(tag, "code" | "pre" | "span" | "div"),
            _ => false,
        };

        allowed
            && match attr {
                "href" | "src" => is_safe_url(value, tag == "img"),
                "style" => is_text_align(value),
                _ => true,
            }
    }

    fn action(node: &Handle) -> Action {
        match node.data {
            NodeData::Text { .. } => Action::Keep,
            NodeData::Element { ref name, .. } => {
                let tag = name.local.as_ref();
                if DROP_WITH_CONTENT.contains(&tag) {
                    log::debug!("Dropping <{}> with its content", tag);
                    Action::Drop
                } else if ALLOWED_TAGS.contains(&tag) {
                    Action::Keep
                } else {
                    log::debug!("Unwrapping disallowed tag <{}>", tag);
                    Action::Unwrap
                }
            }
            _ => Action::Drop,
        }
    }

    /// Clean the children of `node` in place.
    fn clean_children(&self, node: &Handle) {
        let children = node.children.take();
        let mut kept = Vec::with_capacity(children.len());

        for child in children {
            match Self::action(&child) {
                Action::Drop => {}
                Action::Keep => {
                    if let NodeData::Element {
                        ref name,
                        ref attrs,
                        ..
                    } = child.data
                    {
                        let tag = name.local.as_ref();
                        attrs
                            .borrow_mut()
                            .retain(|a| Self::keep_attr(tag, a.name.local.as_ref(), &a.value));
                        self.clean_children(&child);
                    }
                    kept.push(child);
                }
                Action::Unwrap => {
                    self.clean_children(&child);
                    kept.extend(child.children.take());
                }
            }
        }

        for child in &kept {
            child.parent.set(Some(Rc::downgrade(node)));
        }
        *node.children.borrow_mut() = kept;
    }
}

impl HtmlSanitizer for AllowlistSanitizer {
    fn sanitize(&self, html: &str) -> String {
        let dom = parse_fragment(html);
        let Some(body) = find_body(&dom.document) else {
            return String::new();
        };

        self.clean_children(&body);

        let mut bytes = Vec::with_capacity(html.len());
        let body: SerializableHandle = body.into();
        let opts = SerializeOpts {
            traversal_scope: TraversalScope::ChildrenOnly(None),
            ..Default::default()
        };
        if let Err(e) = serialize(&mut bytes, &body, opts) {
            log::warn!("HTML serialization failed: {}", e);
            return String::new();
        }

        String::from_utf8(bytes).unwrap_or_default()
    }
}

/// Parse `html` as the body of a minimal document.
fn parse_fragment(html: &str) -> RcDom {
    let wrapped = format!(
        "<!DOCTYPE html><html><head></head><body>{}</body></html>",
        html
    );
    parse_document(RcDom::default(), ParseOpts::default())
        .from_utf8()
        .one(wrapped.as_bytes())
}

fn find_body(node: &Handle) -> Option<Handle> {
    if let NodeData::Element { ref name, .. } = node.data {
        if name.local.as_ref() == "body" {
            return Some(node.clone());
        }
    }

    node.children.borrow().iter().find_map(find_body)
}

fn is_safe_url(url: &str, allow_data_image: bool) -> bool {
    let compact: String = url
        .chars()
        .filter(|c| !c.is_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = compact.find(|c| matches!(c, ':' | '/' | '?' | '#'));
    match scheme_end {
        Some(idx) if compact[idx..].starts_with(':') => {
            let scheme = &compact[..idx];
            SAFE_SCHEMES.contains(&scheme)
                || (allow_data_image && scheme == "data" && compact.starts_with("data:image/"))
        }
        // No scheme: relative URL or fragment
        _ => true,
    }
}

fn is_text_align(style: &str) -> bool {
    let style = style.trim().trim_end_matches(';').trim();
    match style.split_once(':') {
        Some((prop, value)) => {
            prop.trim().eq_ignore_ascii_case("text-align")
                && matches!(value.trim(), "left" | "center" | "right")
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(html: &str) -> String {
        AllowlistSanitizer::new().sanitize(html)
    }

    #[test]
    fn test_keeps_structure() {
        let html = "<h1>Title</h1>\n<p>Hello <strong>world</strong>.</p>\n";
        assert_eq!(clean(html), html);
    }

    #[test]
    fn test_drops_script_with_content() {
        assert_eq!(clean("a<script>alert(1)</script>b"), "ab");
        assert_eq!(clean("a<SCRIPT type=x>alert(1)</ScRiPt >b"), "ab");
        assert_eq!(clean("a<script>never closed"), "a");
    }

    #[test]
    fn test_drops_style_and_iframe() {
        assert_eq!(clean("<style>*{}</style><iframe src=x></iframe>ok"), "ok");
    }

    #[test]
    fn test_strips_event_handlers() {
        assert_eq!(
            clean(r#"<img src="a.png" onerror="alert(1)" alt="A">"#),
            r#"<img src="a.png" alt="A">"#
        );
        assert_eq!(clean(r#"<p onclick='x()'>t</p>"#), "<p>t</p>");
    }

    #[test]
    fn test_javascript_urls_removed() {
        assert_eq!(clean(r#"<a href="javascript:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(clean(r#"<a href=" JaVa&#x09;script:alert(1)">x</a>"#), "<a>x</a>");
        assert_eq!(clean(r#"<a href="vbscript:msgbox">x</a>"#), "<a>x</a>");
    }

    #[test]
    fn test_safe_urls_kept() {
        assert_eq!(
            clean(r#"<a href="https://example.com/?a=1&amp;b=2">x</a>"#),
            r#"<a href="https://example.com/?a=1&amp;b=2">x</a>"#
        );
        assert_eq!(clean(r#"<a href="/docs#top">x</a>"#), r#"<a href="/docs#top">x</a>"#);
    }

    #[test]
    fn test_data_urls() {
        assert_eq!(
            clean(r#"<img src="data:image/png;base64,AAAA">"#),
            r#"<img src="data:image/png;base64,AAAA">"#
        );
        assert_eq!(clean(r#"<a href="data:text/html,x">x</a>"#), "<a>x</a>");
    }

    #[test]
    fn test_unknown_tag_unwrapped() {
        assert_eq!(clean("<custom-el>inner</custom-el>"), "inner");
        assert_eq!(clean("<custom-el data-x=1><em>a</em>b</custom-el>"), "<em>a</em>b");
        assert_eq!(clean("<form><p>t</p></form>"), "<p>t</p>");
    }

    #[test]
    fn test_nested_drop_inside_unwrapped() {
        assert_eq!(clean("<section>a<script>x</script>b</section>"), "ab");
    }

    #[test]
    fn test_comments_and_doctype_removed() {
        assert_eq!(clean("<!DOCTYPE html><!-- hi -->x"), "x");
    }

    #[test]
    fn test_stray_angle_escaped() {
        assert_eq!(clean("a < b"), "a &lt; b");
        assert_eq!(clean("<3"), "&lt;3");
    }

    #[test]
    fn test_inline_formatting_kept() {
        assert_eq!(
            clean("H<sub>2</sub>O, x<sup>2</sup>, <kbd>Ctrl</kbd><br>"),
            "H<sub>2</sub>O, x<sup>2</sup>, <kbd>Ctrl</kbd><br>"
        );
    }

    #[test]
    fn test_table_alignment_style() {
        assert_eq!(
            clean(r#"<table><tr><td style="text-align: center">x</td></tr></table>"#),
            r#"<table><tbody><tr><td style="text-align: center">x</td></tr></tbody></table>"#
        );
        assert_eq!(
            clean(r#"<table><tr><td style="background:url(javascript:x)">x</td></tr></table>"#),
            "<table><tbody><tr><td>x</td></tr></tbody></table>"
        );
    }

    #[test]
    fn test_void_elements_normalised() {
        assert_eq!(clean("<br/>a<hr/>"), "<br>a<hr>");
    }

    #[test]
    fn test_unclosed_tags_balanced() {
        assert_eq!(clean("<p><strong>open"), "<p><strong>open</strong></p>");
    }
}
