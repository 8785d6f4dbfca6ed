//! Heading anchors and the navigation list.

use crate::config::AnchorPolicy;
use crate::output::Heading;
use crate::pipeline::document::Block;
use crate::styles;
use html_escape::{encode_double_quoted_attribute, encode_text};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::fmt::Write as _;
use unicode_normalization::UnicodeNormalization;

/// Anything that is not a letter, number, `_`, whitespace or `-`.
/// Combining marks (Mn/Mc) are not word characters here.
static RE_NON_SLUG: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\p{L}\p{N}_\s-]").unwrap());

/// Anchor slug for heading text.
///
/// NFKC-normalise, trim, lowercase, drop everything that is not a word
/// character, whitespace or `-`, turn each whitespace character into `-`,
/// then collapse runs of `-`. `"Hello, World!"` becomes `hello-world`.
pub fn slugify(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    let lowered = normalized.trim().to_lowercase();
    let kept = RE_NON_SLUG.replace_all(&lowered, "");

    let mut slug = String::with_capacity(kept.len());
    for c in kept.chars() {
        let ch = if c.is_whitespace() { '-' } else { c };
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }
    slug
}

/// Give every h1–h3 heading an anchor id and collect them in document order.
///
/// Deeper headings are left without an id and are not listed.
pub fn annotate(blocks: &mut [Block], policy: AnchorPolicy) -> Vec<Heading> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut headings = Vec::new();

    for block in blocks.iter_mut() {
        let Block::Heading(h) = block else { continue };
        if !(1..=3).contains(&h.level) {
            continue;
        }

        let base = slugify(&h.text);
        let id = match policy {
            AnchorPolicy::Preserve => base,
            AnchorPolicy::Suffix => {
                let count = seen.entry(base.clone()).or_insert(0);
                let id = if *count == 0 {
                    base
                } else {
                    format!("{base}-{count}")
                };
                *count += 1;
                id
            }
        };

        h.anchor_id = Some(id.clone());
        headings.push(Heading {
            level: h.level,
            text: h.text.clone(),
            anchor_id: id,
        });
    }
    headings
}

/// Render the navigation list, indenting each entry by `level - 1` markers.
pub fn render_nav(headings: &[Heading]) -> String {
    if headings.is_empty() {
        return String::new();
    }
    let mut out = String::new();
    let _ = writeln!(
        out,
        "<nav class=\"{}\">\n<ul class=\"{}\">",
        styles::NAV,
        styles::NAV_LIST
    );
    for h in headings {
        let indent = styles::NAV_INDENT.repeat(usize::from(h.level.saturating_sub(1)));
        let _ = writeln!(
            out,
            "<li class=\"{}\">{}<a href=\"#{}\" class=\"{}\">{}</a></li>",
            styles::NAV_ITEM,
            indent,
            encode_double_quoted_attribute(&h.anchor_id),
            styles::LINK,
            encode_text(&h.text)
        );
    }
    out.push_str("</ul>\n</nav>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::HeadingBlock;

    fn heading(level: u8, text: &str) -> Block {
        Block::Heading(HeadingBlock {
            level,
            inner: text.into(),
            text: text.into(),
            anchor_id: None,
            spaced: false,
        })
    }

    #[test]
    fn slug_examples() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Multiple   Spaces  "), "multiple-spaces");
        assert_eq!(slugify("Already-hyphen -- here"), "already-hyphen-here");
        assert_eq!(slugify("snake_case Title"), "snake_case-title");
        assert_eq!(slugify("ＡＢＣ　全角"), "abc-全角");
        assert_eq!(slugify("!!!"), "");
    }

    #[test]
    fn slug_drops_combining_marks() {
        // Virama (U+094D) and vowel sign E (U+0947) are Mn.
        assert_eq!(slugify("नमस्ते"), "नमसत");
        assert_eq!(slugify("नमस्ते दुनिया"), "नमसत-दनय");
    }

    #[test]
    fn slug_shape() {
        for input in ["Rust & Go: a comparison", "  -- edge --  ", "Tab\tand\nnewline"] {
            let slug = slugify(input);
            assert!(!slug.contains("--"), "{slug}");
            assert!(slug
                .chars()
                .all(|c| c == '-' || c == '_' || (c.is_alphanumeric() && !c.is_uppercase())));
        }
    }

    #[test]
    fn annotate_in_document_order() {
        let mut blocks = vec![
            heading(1, "Top"),
            Block::Raw("<p>x</p>".into()),
            heading(3, "Deep Dive"),
            heading(5, "Ignored"),
            heading(2, "Middle"),
        ];
        let found = annotate(&mut blocks, AnchorPolicy::Preserve);
        let ids: Vec<&str> = found.iter().map(|h| h.anchor_id.as_str()).collect();
        assert_eq!(ids, vec!["top", "deep-dive", "middle"]);
        assert!(matches!(&blocks[3], Block::Heading(h) if h.anchor_id.is_none()));
    }

    #[test]
    fn duplicate_ids_preserved_or_suffixed() {
        let mut blocks = vec![heading(2, "Setup"), heading(2, "Setup"), heading(2, "Setup")];
        let ids: Vec<String> = annotate(&mut blocks.clone(), AnchorPolicy::Preserve)
            .into_iter()
            .map(|h| h.anchor_id)
            .collect();
        assert_eq!(ids, vec!["setup", "setup", "setup"]);

        let ids: Vec<String> = annotate(&mut blocks, AnchorPolicy::Suffix)
            .into_iter()
            .map(|h| h.anchor_id)
            .collect();
        assert_eq!(ids, vec!["setup", "setup-1", "setup-2"]);
    }

    #[test]
    fn nav_indents_by_level() {
        let nav = render_nav(&[
            Heading {
                level: 1,
                text: "A & B".into(),
                anchor_id: "a-b".into(),
            },
            Heading {
                level: 3,
                text: "C".into(),
                anchor_id: "c".into(),
            },
        ]);
        assert!(nav.starts_with("<nav class=\"toc mb-12\">"));
        assert!(nav.contains(">A &amp; B</a>"));
        assert!(nav.contains("<li class=\"mb-2 text-gray-700\">&emsp;&emsp;<a href=\"#c\""));
        assert!(render_nav(&[]).is_empty());
    }
}
