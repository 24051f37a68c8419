//! Entry page model for injection.
//!
//! `tl` reads markup inside `<script>` and `<style>` bodies, so it is fed a
//! copy of the source with comments and raw text masked to spaces. Offsets
//! stay identical, so the tree locates `<body>` while every byte of the
//! original page survives: new content is spliced into the source text, the
//! page is never re-serialized from the tree.

use crate::utils::html::{
    Opaque, OpaqueKind, escape_attr, escape_raw_text, is_raw_text_element, is_void_element,
    mask_ranges, opaque_ranges, rfind_close_tag,
};

/// A node of the owned tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    /// Raw source text (entities not decoded)
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Lowercased tag name
    pub tag: String,
    pub attrs: Vec<(String, Option<String>)>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    /// Direct element children
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|n| match n {
            Node::Element(e) => Some(e),
            _ => None,
        })
    }

    /// Concatenated direct text children
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                Node::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Serialize this element and its subtree
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            out.push(' ');
            out.push_str(name);
            if let Some(value) = value {
                out.push_str("=\"");
                out.push_str(&escape_attr(value));
                out.push('"');
            }
        }
        out.push('>');

        if is_void_element(&self.tag) {
            return;
        }

        if is_raw_text_element(&self.tag) {
            out.push_str(&escape_raw_text(&self.tag, &self.text()));
        } else {
            for child in &self.children {
                match child {
                    Node::Element(e) => e.write_to(out),
                    Node::Text(t) => out.push_str(t),
                }
            }
        }

        out.push_str("</");
        out.push_str(&self.tag);
        out.push('>');
    }
}

/// Parsed entry page
#[derive(Debug, Clone)]
pub struct HtmlDocument {
    source: String,
    /// `source` with comments and raw text blanked out
    masked: String,
    nodes: Vec<Node>,
}

impl HtmlDocument {
    /// Parse a full document. Errors carry the parser's message.
    pub fn parse(source: &str) -> Result<Self, String> {
        let opaque = opaque_ranges(source);
        let masked = mask_ranges(source, &opaque);

        let mut raw_bodies = opaque
            .iter()
            .filter(|o| o.kind == OpaqueKind::RawText)
            .map(|Opaque { range, .. }| &source[range.clone()]);

        let nodes = {
            let dom =
                tl::parse(&masked, tl::ParserOptions::default()).map_err(|e| format!("{e:?}"))?;
            let parser = dom.parser();
            dom.children()
                .iter()
                .filter_map(|handle| convert(*handle, parser, &mut raw_bodies))
                .collect()
        };

        Ok(Self {
            source: source.to_string(),
            masked,
            nodes,
        })
    }

    /// First element named `tag`, depth-first
    pub fn find(&self, tag: &str) -> Option<&Element> {
        find_in(&self.nodes, tag)
    }

    pub fn body(&self) -> Option<&Element> {
        self.find("body")
    }

    /// Source with `element` inserted as the last child of `<body>`.
    ///
    /// Goes before the last real `</body>`; with the close tag omitted,
    /// before `</html>`, else at the end. `None` without a body element.
    pub fn append_to_body(&self, element: &Element) -> Option<String> {
        self.body()?;

        let at = rfind_close_tag(&self.masked, "body")
            .or_else(|| rfind_close_tag(&self.masked, "html"))
            .unwrap_or(self.source.len());

        let fragment = element.to_html();
        let mut out = String::with_capacity(self.source.len() + fragment.len());
        out.push_str(&self.source[..at]);
        out.push_str(&fragment);
        out.push_str(&self.source[at..]);
        Some(out)
    }
}

/// Raw text elements take their body from `raw_bodies` in document order.
fn convert<'s>(
    handle: tl::NodeHandle,
    parser: &tl::Parser,
    raw_bodies: &mut impl Iterator<Item = &'s str>,
) -> Option<Node> {
    match handle.get(parser)? {
        tl::Node::Tag(tag) => {
            let name = tag.name().as_utf8_str().to_lowercase();
            let mut element = Element::new(name);

            for (key, value) in tag.attributes().iter() {
                element
                    .attrs
                    .push((key.to_string(), value.map(|v| v.to_string())));
            }

            // tl matches close tags case-sensitively, so `<SCRIPT>..</script>`
            // stays open and adopts what follows. Those elements are kept.
            let raw_text = is_raw_text_element(&element.tag);
            if raw_text {
                if let Some(body) = raw_bodies.next().filter(|b| !b.is_empty()) {
                    element.children.push(Node::Text(body.to_string()));
                }
            }

            for child in tag.children().top().iter() {
                match convert(*child, parser, raw_bodies) {
                    Some(Node::Text(_)) if raw_text => {}
                    Some(node) => element.children.push(node),
                    None => {}
                }
            }

            Some(Node::Element(element))
        }
        tl::Node::Raw(bytes) => Some(Node::Text(bytes.as_utf8_str().into_owned())),
        tl::Node::Comment(_) => None,
    }
}

fn find_in<'a>(nodes: &'a [Node], tag: &str) -> Option<&'a Element> {
    for node in nodes {
        if let Node::Element(el) = node {
            if el.tag == tag {
                return Some(el);
            }
            if let Some(found) = find_in(&el.children, tag) {
                return Some(found);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = "<!DOCTYPE html>\n<html><head><title>API</title></head>\
        <body><api-console data-x=\"1\"></api-console><!-- note --></body></html>";

    #[test]
    fn test_finds_body() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        let body = doc.body().unwrap();
        assert_eq!(body.child_elements().count(), 1);
        assert_eq!(body.child_elements().next().unwrap().tag, "api-console");
    }

    #[test]
    fn test_missing_body() {
        let doc = HtmlDocument::parse("<html><head></head></html>").unwrap();
        assert!(doc.body().is_none());
        assert!(doc.append_to_body(&Element::new("script")).is_none());
    }

    #[test]
    fn test_script_bodies_are_text() {
        let source = "<html><head><script>if (a<b) go();</script></head>\
                      <body><script>for (var i=0;i<n;i++) f(i);</script>\
                      <api-console></api-console></body></html>";
        let doc = HtmlDocument::parse(source).unwrap();

        let head_script = doc.find("script").unwrap();
        assert_eq!(head_script.text(), "if (a<b) go();");

        let body = doc.body().unwrap();
        let tags: Vec<_> = body.child_elements().map(|e| e.tag.as_str()).collect();
        assert_eq!(tags, ["script", "api-console"]);
        assert_eq!(
            body.child_elements().next().unwrap().text(),
            "for (var i=0;i<n;i++) f(i);"
        );
    }

    #[test]
    fn test_mixed_case_script_keeps_body_reachable() {
        let source = "<html><head><SCRIPT>x = a<b;</script></head><body></body></html>";
        let doc = HtmlDocument::parse(source).unwrap();
        assert_eq!(doc.find("script").unwrap().text(), "x = a<b;");
        assert!(doc.body().is_some());
    }

    #[test]
    fn test_append_keeps_source_bytes() {
        let doc = HtmlDocument::parse(PAGE).unwrap();
        let html = doc
            .append_to_body(&Element::new("script").with_text("go();"))
            .unwrap();
        assert_eq!(html, PAGE.replace("</body>", "<script>go();</script></body>"));
    }

    #[test]
    fn test_append_ignores_close_tags_in_text() {
        let source = "<html><body><script>var s = '</body>';</script>\
                      <!-- </body> --></body></html>";
        let html = HtmlDocument::parse(source)
            .unwrap()
            .append_to_body(&Element::new("script").with_text("go();"))
            .unwrap();
        assert!(html.ends_with("<!-- </body> --><script>go();</script></body></html>"));
    }

    #[test]
    fn test_append_with_omitted_body_close() {
        let source = "<html><body><p>one<p>two</html>";
        let html = HtmlDocument::parse(source)
            .unwrap()
            .append_to_body(&Element::new("script").with_text("go();"))
            .unwrap();
        assert_eq!(html, "<html><body><p>one<p>two<script>go();</script></html>");

        let bare = "<body><api-console>";
        let html = HtmlDocument::parse(bare)
            .unwrap()
            .append_to_body(&Element::new("script").with_text("go();"))
            .unwrap();
        assert_eq!(html, "<body><api-console><script>go();</script>");
    }

    #[test]
    fn test_element_serialization() {
        let mut meta = Element::new("meta");
        meta.attrs.push(("charset".into(), Some("utf-8".into())));
        assert_eq!(meta.to_html(), r#"<meta charset="utf-8">"#);

        let script = Element::new("script").with_text("s = '</script>';");
        assert_eq!(script.to_html(), r"<script>s = '<\/script>';</script>");
    }
}
