//! Intermediate block representation and styled HTML emission.
//!
//! Both renderers produce a flat, ordered list of [`Block`]s. Styling is
//! applied here, once, while emitting; no pass ever re-reads finished HTML.
//!
//! [`Block::Raw`] segments are concatenated verbatim, so a renderer may split
//! its output at any point (for example to lift a heading out of a list item)
//! and the emitted document is still the plain concatenation of the parts.

use crate::styles;
use html_escape::{encode_double_quoted_attribute, encode_text};
use std::fmt::Write as _;
use std::path::Path;

/// One unit of rendered body content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    /// Already-rendered HTML, or source text left unexpanded.
    Raw(String),
    Heading(HeadingBlock),
    /// A paragraph; `inner` is rendered inline HTML.
    Paragraph { inner: String },
    Code(CodeBlock),
    /// A captioned image block (block markup `#img`).
    Image { src: String, alt: String },
    /// A highlighted note; both parts are rendered inline HTML.
    Callout { title: String, body: String },
    Table(Table),
}

/// A heading awaiting (or carrying) its anchor id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingBlock {
    pub level: u8,
    /// Rendered inline HTML of the heading.
    pub inner: String,
    /// Plain text, used for the slug and the navigation list.
    pub text: String,
    pub anchor_id: Option<String>,
    /// Surround with `<br>` (block-markup headings).
    pub spaced: bool,
}

/// A fenced or `#code` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub title: Option<String>,
    pub lang: Option<String>,
    pub code: String,
}

/// Column alignment from a table separator row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    None,
    Left,
    Center,
    Right,
}

impl Align {
    fn style(self) -> Option<&'static str> {
        match self {
            Align::None => None,
            Align::Left => Some("text-align: left"),
            Align::Center => Some("text-align: center"),
            Align::Right => Some("text-align: right"),
        }
    }
}

/// A parsed pipe table; cells hold rendered inline HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub align: Vec<Align>,
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Emit the whole body.
pub fn emit(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        emit_block(block, &mut out);
    }
    out
}

fn emit_block(block: &Block, out: &mut String) {
    match block {
        Block::Raw(html) => out.push_str(html),
        Block::Heading(h) => emit_heading(h, out),
        Block::Paragraph { inner } => {
            let _ = writeln!(out, "<p class=\"{}\">{}</p>", styles::PARAGRAPH, inner);
        }
        Block::Code(code) => emit_code(code, out),
        Block::Image { src, alt } => {
            let _ = write!(
                out,
                "<div class=\"{}\"><img src=\"{}\" alt=\"{}\" class=\"{}\">",
                styles::IMAGE_CONTAINER,
                encode_double_quoted_attribute(src),
                encode_double_quoted_attribute(alt),
                styles::IMAGE
            );
            if !alt.is_empty() {
                let _ = write!(
                    out,
                    "<p class=\"{}\">{}</p>",
                    styles::IMAGE_CAPTION,
                    encode_text(alt)
                );
            }
            out.push_str("</div>\n");
        }
        Block::Callout { title, body } => {
            let _ = writeln!(
                out,
                "<div class=\"{}\"><strong>{}</strong> {}</div>",
                styles::CALLOUT,
                title,
                body
            );
        }
        Block::Table(table) => emit_table(table, out),
    }
}

fn emit_heading(h: &HeadingBlock, out: &mut String) {
    if h.spaced {
        out.push_str("<br>");
    }
    let _ = write!(out, "<h{}", h.level);
    if let Some(ref id) = h.anchor_id {
        let _ = write!(out, " id=\"{}\"", encode_double_quoted_attribute(id));
    }
    if let Some(class) = styles::heading_class(h.level) {
        let _ = write!(out, " class=\"{class}\"");
    }
    let _ = write!(out, ">{}</h{}>", h.inner, h.level);
    if h.spaced {
        out.push_str("<br>");
    }
    out.push('\n');
}

fn emit_code(code: &CodeBlock, out: &mut String) {
    let _ = write!(out, "<div class=\"{}\">", styles::CODE_CONTAINER);
    if let Some(ref title) = code.title {
        let _ = write!(out, "<p>{title}</p>");
    }
    out.push_str("<pre><code");
    if let Some(ref lang) = code.lang {
        let _ = write!(out, " class=\"language-{}\"", encode_double_quoted_attribute(lang));
    }
    let _ = writeln!(
        out,
        ">{}</code></pre><button onclick=\"copyToClipboard(this)\" class=\"{}\">{}</button></div>",
        encode_text(&code.code),
        styles::COPY_BUTTON,
        styles::COPY_LABEL
    );
}

fn emit_table(table: &Table, out: &mut String) {
    let _ = writeln!(out, "<table class=\"{}\">", styles::TABLE);
    out.push_str("<thead><tr>");
    for (i, cell) in table.header.iter().enumerate() {
        emit_cell("th", cell, table.align.get(i).copied().unwrap_or(Align::None), out);
    }
    out.push_str("</tr></thead>\n");
    if !table.rows.is_empty() {
        out.push_str("<tbody>\n");
        for row in &table.rows {
            out.push_str("<tr>");
            for (i, cell) in row.iter().enumerate() {
                emit_cell("td", cell, table.align.get(i).copied().unwrap_or(Align::None), out);
            }
            out.push_str("</tr>\n");
        }
        out.push_str("</tbody>\n");
    }
    out.push_str("</table>\n");
}

fn emit_cell(tag: &str, inner: &str, align: Align, out: &mut String) {
    let _ = write!(out, "<{tag} class=\"{}\"", styles::TABLE_CELL);
    if let Some(style) = align.style() {
        let _ = write!(out, " style=\"{style}\"");
    }
    let _ = write!(out, ">{inner}</{tag}>");
}

/// Render an inline media reference: `.mp4` becomes a `<video>`, anything
/// else an `<img>` that opens the in-page modal viewer.
pub fn render_media(src: &str, alt: &str, out: &mut String) {
    let src_attr = encode_double_quoted_attribute(src);
    if is_video(src) {
        let _ = write!(
            out,
            "\n<div class=\"{}\">\n    <video controls class=\"{}\">\n        \
             <source src=\"{}\" type=\"video/mp4\">\n        \
             Your browser does not support the video tag.\n    </video>\n</div>\n",
            styles::VIDEO_CONTAINER,
            styles::VIDEO,
            src_attr
        );
    } else {
        // The onclick argument sits inside a single-quoted JS string.
        let js_src = src.replace('\\', "\\\\").replace('\'', "\\'");
        let _ = write!(
            out,
            "<img src=\"{}\" alt=\"{}\" class=\"{}\" onclick=\"openModal('{}', 'image')\"/>",
            src_attr,
            encode_double_quoted_attribute(alt),
            styles::MEDIA,
            encode_double_quoted_attribute(&js_src)
        );
    }
}

fn is_video(src: &str) -> bool {
    let path = src.split(['?', '#']).next().unwrap_or(src);
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_blocks_concatenate() {
        let blocks = vec![
            Block::Raw("<ul><li>".into()),
            Block::Raw("x</li></ul>".into()),
        ];
        assert_eq!(emit(&blocks), "<ul><li>x</li></ul>");
    }

    #[test]
    fn heading_with_anchor_and_class() {
        let h = Block::Heading(HeadingBlock {
            level: 2,
            inner: "Intro".into(),
            text: "Intro".into(),
            anchor_id: Some("intro".into()),
            spaced: true,
        });
        assert_eq!(
            emit(&[h]),
            "<br><h2 id=\"intro\" class=\"text-3xl font-bold text-gray-800 mb-4\">Intro</h2><br>\n"
        );
    }

    #[test]
    fn deep_heading_is_bare() {
        let h = Block::Heading(HeadingBlock {
            level: 4,
            inner: "Deep".into(),
            text: "Deep".into(),
            anchor_id: None,
            spaced: false,
        });
        assert_eq!(emit(&[h]), "<h4>Deep</h4>\n");
    }

    #[test]
    fn code_is_escaped_and_copyable() {
        let html = emit(&[Block::Code(CodeBlock {
            title: Some("main.c".into()),
            lang: None,
            code: "#include <stdio.h>".into(),
        })]);
        assert!(html.starts_with("<div class=\"copyable mb-4\"><p>main.c</p><pre><code>"));
        assert!(html.contains("#include &lt;stdio.h&gt;"));
        assert!(html.contains("onclick=\"copyToClipboard(this)\""));
    }

    #[test]
    fn image_block_with_caption() {
        let html = emit(&[Block::Image {
            src: "cat.png".into(),
            alt: "A \"cat\"".into(),
        }]);
        assert!(html.contains(
            "<img src=\"cat.png\" alt=\"A &quot;cat&quot;\" class=\"responsive-image\">"
        ));
        assert!(html.contains("<p class=\"text-sm text-gray-600 mt-2\">A \"cat\"</p>"));
    }

    #[test]
    fn table_alignment() {
        let html = emit(&[Block::Table(Table {
            align: vec![Align::Center, Align::None],
            header: vec!["A".into(), "B".into()],
            rows: vec![vec!["1".into(), "2".into()]],
        })]);
        assert!(html.contains(
            "<th class=\"px-4 py-2 border\" style=\"text-align: center\">A</th>"
        ));
        assert!(html.contains("<td class=\"px-4 py-2 border\">2</td>"));
        assert!(html.contains("<tbody>"));
    }

    #[test]
    fn media_by_extension() {
        let mut out = String::new();
        render_media("clip.MP4", "clip", &mut out);
        assert!(out.contains("<video controls class=\"responsive-media\">"));
        assert!(out.contains("<source src=\"clip.MP4\" type=\"video/mp4\">"));

        let mut out = String::new();
        render_media("pic.png", "pic", &mut out);
        assert_eq!(
            out,
            "<img src=\"pic.png\" alt=\"pic\" class=\"responsive-media mb-4 cursor-pointer\" \
             onclick=\"openModal('pic.png', 'image')\"/>"
        );
    }

    #[test]
    fn video_detection_ignores_query() {
        assert!(is_video("https://cdn.test/v.mp4?token=1"));
        assert!(!is_video("https://cdn.test/v.mp4.png"));
    }
}
