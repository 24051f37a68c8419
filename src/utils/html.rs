//! HTML utility functions.
//!
//! - `escape_attr()` - quoting for attribute values re-emitted in double quotes
//! - `is_void_element()` / `is_raw_text_element()` - serialization rules
//! - `escape_raw_text()` - keep script/style text from closing its element early
//! - `opaque_ranges()` / `mask_ranges()` - hide comments and script/style
//!   bodies from the tree parser, which would read markup inside them
//! - `find_close_tag()` - locate a real closing tag in masked source

use std::borrow::Cow;
use std::ops::Range;

/// Escape an attribute value for output inside double quotes.
///
/// Values come from the parser undecoded, so existing entities stay as they
/// are. Only a bare `"` (legal in single-quoted source) needs rewriting.
#[inline]
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    if s.contains('"') {
        Cow::Owned(s.replace('"', "&quot;"))
    } else {
        Cow::Borrowed(s)
    }
}

/// Check if an HTML tag is a void element (no closing tag).
#[inline]
pub fn is_void_element(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

/// Check if tag is a raw text element (content is emitted verbatim).
#[inline]
pub fn is_raw_text_element(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Escape any `</tag` sequence inside raw text so the element can't be
/// closed by its own content. `<\/script>` is equivalent inside JS strings.
pub fn escape_raw_text<'a>(tag: &str, text: &'a str) -> Cow<'a, str> {
    let needle = format!("</{tag}");
    let lower = text.to_ascii_lowercase();
    if !lower.contains(&needle) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    let mut rest = 0;
    for (idx, _) in lower.match_indices(&needle) {
        out.push_str(&text[rest..idx]);
        out.push_str("<\\/");
        rest = idx + 2;
    }
    out.push_str(&text[rest..]);
    Cow::Owned(out)
}

/// What an [`Opaque`] range holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpaqueKind {
    Comment,
    RawText,
}

/// Source bytes that are text, never markup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opaque {
    pub range: Range<usize>,
    pub kind: OpaqueKind,
}

/// Comment bodies and raw text element contents, in source order.
///
/// A raw text element runs until the first matching `</tag`, as in browsers.
/// An unterminated comment or element runs to the end of the source.
pub fn opaque_ranges(source: &str) -> Vec<Opaque> {
    let mut out = Vec::new();
    let mut i = 0;

    while let Some(rel) = source[i..].find('<') {
        let lt = i + rel;
        let rest = &source[lt..];

        if rest.starts_with("<!--") {
            let body = lt + 4;
            let end = source[body..].find("-->").map_or(source.len(), |e| body + e);
            out.push(Opaque {
                range: body..end,
                kind: OpaqueKind::Comment,
            });
            i = (end + 3).min(source.len());
            continue;
        }

        if let Some(tag) = raw_text_open(rest) {
            let Some(gt) = find_tag_end(source, lt) else {
                break;
            };
            let body = gt + 1;
            let end = find_close_tag(source, body, tag).unwrap_or(source.len());
            out.push(Opaque {
                range: body..end,
                kind: OpaqueKind::RawText,
            });
            i = end;
            continue;
        }

        i = lt + 1;
    }

    out
}

/// Replace every byte in `ranges` with a space. Offsets are preserved.
pub fn mask_ranges<'a>(source: &str, ranges: impl IntoIterator<Item = &'a Opaque>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    for opaque in ranges {
        let Range { start, end } = opaque.range;
        out.push_str(&source[last..start]);
        out.push_str(&" ".repeat(end - start));
        last = end;
    }
    out.push_str(&source[last..]);
    out
}

/// Offset of the first `</tag` at or after `from`, matched case-insensitively
pub fn find_close_tag(source: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("</{tag}");
    let lower = source[from..].to_ascii_lowercase();
    lower
        .match_indices(&needle)
        .map(|(idx, _)| from + idx)
        .find(|&idx| ends_tag_name(source.as_bytes().get(idx + needle.len())))
}

/// Offset of the last `</tag` in `source`, matched case-insensitively
pub fn rfind_close_tag(source: &str, tag: &str) -> Option<usize> {
    let needle = format!("</{tag}");
    let lower = source.to_ascii_lowercase();
    lower
        .rmatch_indices(&needle)
        .map(|(idx, _)| idx)
        .find(|&idx| ends_tag_name(source.as_bytes().get(idx + needle.len())))
}

/// Raw text element opened at the start of `rest`, if any
fn raw_text_open(rest: &str) -> Option<&'static str> {
    ["script", "style"].into_iter().find(|tag| {
        rest.get(1..=tag.len())
            .is_some_and(|name| name.eq_ignore_ascii_case(tag))
            && ends_tag_name(rest.as_bytes().get(tag.len() + 1))
    })
}

/// Offset of the `>` closing the tag opened at `lt`. Quoted `>` is skipped.
fn find_tag_end(source: &str, lt: usize) -> Option<usize> {
    let mut quote = None;
    for (idx, &b) in source.as_bytes().iter().enumerate().skip(lt) {
        match (quote, b) {
            (None, b'"' | b'\'') => quote = Some(b),
            (Some(q), _) if q == b => quote = None,
            (None, b'>') => return Some(idx),
            _ => {}
        }
    }
    None
}

fn ends_tag_name(next: Option<&u8>) -> bool {
    matches!(
        next,
        None | Some(b' ' | b'\t' | b'\n' | b'\r' | b'\x0c' | b'>' | b'/')
    )
}
