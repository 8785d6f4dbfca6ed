//! Inline spans of the block-markup dialect.
//!
//! * `<a>label<:>href<a>` becomes a styled anchor.
//! * `<:>text<:>` becomes a bold emphasis span (only where emphasis is
//!   enabled, i.e. inside `#text`, `#strong` and heading trailers).
//!
//! Links are matched first, so the `<:>` inside a link never opens or closes
//! an emphasis span. Unmatched markers stay in the output literally.

use crate::styles;
use html_escape::encode_double_quoted_attribute;
use std::fmt::Write as _;

const LINK_OPEN: &str = "<a>";
const SEP: &str = "<:>";

/// Expand inline spans in `text`. Text outside spans is passed through as-is.
pub fn render_inline(text: &str, emphasis: bool) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    let mut rest = text;

    while !rest.is_empty() {
        let next_link = rest.find(LINK_OPEN);
        let next_em = if emphasis { rest.find(SEP) } else { None };

        match (next_link, next_em) {
            (Some(l), e) if e.is_none_or(|e| l <= e) => {
                out.push_str(&rest[..l]);
                match parse_link(&rest[l..]) {
                    Some((label, href, used)) => {
                        push_link(label, href, &mut out);
                        rest = &rest[l + used..];
                    }
                    None => {
                        out.push_str(LINK_OPEN);
                        rest = &rest[l + LINK_OPEN.len()..];
                    }
                }
            }
            (_, Some(e)) => {
                out.push_str(&rest[..e]);
                let after = &rest[e + SEP.len()..];
                match find_emphasis_close(after) {
                    Some(close) => {
                        let inner = render_inline(&after[..close], false);
                        let _ = write!(out, "<b class=\"{}\">{}</b>", styles::EMPHASIS, inner);
                        rest = &after[close + SEP.len()..];
                    }
                    None => {
                        out.push_str(SEP);
                        rest = after;
                    }
                }
            }
            _ => {
                out.push_str(rest);
                break;
            }
        }
    }
    out
}

/// Parse `<a>label<:>href<a>` at the start of `s`.
/// Returns the label, the href and the number of bytes consumed.
fn parse_link(s: &str) -> Option<(&str, &str, usize)> {
    let body = s.strip_prefix(LINK_OPEN)?;
    let sep = body.find(SEP)?;
    let after_sep = &body[sep + SEP.len()..];
    let close = after_sep.find(LINK_OPEN)?;
    let label = &body[..sep];
    // A label may not itself contain a link opener.
    if label.contains(LINK_OPEN) {
        return None;
    }
    let href = &after_sep[..close];
    let used = LINK_OPEN.len() + sep + SEP.len() + close + LINK_OPEN.len();
    Some((label, href, used))
}

/// Find the closing `<:>` of an emphasis span, stepping over complete links.
fn find_emphasis_close(s: &str) -> Option<usize> {
    let mut offset = 0;
    loop {
        let rest = &s[offset..];
        let sep = rest.find(SEP)?;
        match rest.find(LINK_OPEN) {
            Some(l) if l < sep => match parse_link(&rest[l..]) {
                Some((_, _, used)) => offset += l + used,
                None => return Some(offset + sep),
            },
            _ => return Some(offset + sep),
        }
    }
}

fn push_link(label: &str, href: &str, out: &mut String) {
    let _ = write!(
        out,
        "<a href=\"{}\" class=\"{}\">{}</a>",
        encode_double_quoted_attribute(href.trim()),
        styles::LINK,
        label
    );
}

/// Strip inline markers, leaving the text a reader would see.
pub fn plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(l) = rest.find(LINK_OPEN) {
        out.push_str(&rest[..l]);
        match parse_link(&rest[l..]) {
            Some((label, _, used)) => {
                out.push_str(label);
                rest = &rest[l + used..];
            }
            None => {
                out.push_str(LINK_OPEN);
                rest = &rest[l + LINK_OPEN.len()..];
            }
        }
    }
    out.push_str(rest);
    out.replace(SEP, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emphasis_span() {
        assert_eq!(
            render_inline("Welcome<:>bold<:> text", true),
            "Welcome<b class=\"font-bold text-blue-600\">bold</b> text"
        );
    }

    #[test]
    fn emphasis_disabled_keeps_markers() {
        assert_eq!(render_inline("a<:>b<:>c", false), "a<:>b<:>c");
    }

    #[test]
    fn unmatched_emphasis_is_literal() {
        assert_eq!(render_inline("a <:> b", true), "a <:> b");
    }

    #[test]
    fn link_span() {
        assert_eq!(
            render_inline("see <a>docs<:> https://d.test/x?a=1&b=2 <a> now", false),
            "see <a href=\"https://d.test/x?a=1&amp;b=2\" class=\"text-blue-600 hover:underline\">docs</a> now"
        );
    }

    #[test]
    fn link_separator_does_not_open_emphasis() {
        let html = render_inline("<a>x<:>https://x.test<a> and <:>y<:>", true);
        assert!(html.starts_with("<a href=\"https://x.test\""));
        assert!(html.ends_with("and <b class=\"font-bold text-blue-600\">y</b>"));
    }

    #[test]
    fn link_inside_emphasis() {
        let html = render_inline("<:>go <a>here<:>https://h.test<a><:>", true);
        assert_eq!(
            html,
            "<b class=\"font-bold text-blue-600\">go <a href=\"https://h.test\" \
             class=\"text-blue-600 hover:underline\">here</a></b>"
        );
    }

    #[test]
    fn incomplete_link_is_literal() {
        assert_eq!(render_inline("<a>broken", false), "<a>broken");
    }

    #[test]
    fn plain_text_strips_markers() {
        assert_eq!(plain_text("Hi <a>there<:>https://t.test<a> <:>you<:>"), "Hi there you");
    }
}
