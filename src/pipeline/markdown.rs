//! Markdown → blocks via `pulldown-cmark`.
//!
//! Events are written straight into styled HTML. Headings, fenced code and
//! tables are lifted out as their own [`Block`]s so the heading annotator and
//! the emitter can handle them structurally; everything in between is
//! flushed as [`Block::Raw`]. A heading inside a list item therefore splits
//! the list's HTML across two raw blocks, which is fine because raw blocks
//! are concatenated verbatim.
//!
//! Single newlines inside a paragraph become `<br />`.

use crate::pipeline::document::{render_media, Align, Block, CodeBlock, HeadingBlock, Table};
use crate::styles;
use html_escape::{encode_double_quoted_attribute, encode_text};
use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::fmt::Write as _;

/// Render Markdown source to blocks.
pub fn render(text: &str) -> Vec<Block> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::default();
    for event in Parser::new_ext(text, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

struct HeadingCapture {
    level: u8,
    inner: String,
    text: String,
}

struct CodeCapture {
    lang: Option<String>,
    code: String,
}

struct ImageCapture {
    src: String,
    alt: String,
}

#[derive(Default)]
struct TableCapture {
    align: Vec<Align>,
    header: Vec<String>,
    rows: Vec<Vec<String>>,
    in_head: bool,
    row: Vec<String>,
    cell: String,
}

#[derive(Default)]
struct Renderer {
    blocks: Vec<Block>,
    buf: String,
    heading: Option<HeadingCapture>,
    code: Option<CodeCapture>,
    image: Option<ImageCapture>,
    table: Option<TableCapture>,
}

impl Renderer {
    /// Where inline HTML currently goes.
    fn out(&mut self) -> &mut String {
        if let Some(ref mut h) = self.heading {
            return &mut h.inner;
        }
        if let Some(ref mut t) = self.table {
            return &mut t.cell;
        }
        &mut self.buf
    }

    fn flush(&mut self) {
        if !self.buf.is_empty() {
            self.blocks.push(Block::Raw(std::mem::take(&mut self.buf)));
        }
    }

    fn finish(mut self) -> Vec<Block> {
        self.flush();
        self.blocks
    }

    fn handle(&mut self, event: Event<'_>) {
        if let Some(ref mut code) = self.code {
            match event {
                Event::Text(text) => code.code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.end_code(),
                _ => {}
            }
            return;
        }

        if let Some(ref mut image) = self.image {
            match event {
                Event::Text(text) | Event::Code(text) => image.alt.push_str(&text),
                Event::End(TagEnd::Image) => self.end_image(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if let Some(ref mut h) = self.heading {
                    h.text.push_str(&text);
                }
                let escaped = encode_text(&text).into_owned();
                self.out().push_str(&escaped);
            }
            Event::Code(code) => {
                if let Some(ref mut h) = self.heading {
                    h.text.push_str(&code);
                }
                let html = format!(
                    "<code class=\"{}\">{}</code>",
                    styles::INLINE_CODE,
                    encode_text(&code)
                );
                self.out().push_str(&html);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.out().push_str(&html),
            Event::SoftBreak | Event::HardBreak => {
                if let Some(ref mut h) = self.heading {
                    h.text.push(' ');
                }
                self.out().push_str("<br />\n");
            }
            Event::Rule => self.out().push_str("<hr />\n"),
            Event::TaskListMarker(checked) => {
                let marker = if checked {
                    "<input disabled=\"\" type=\"checkbox\" checked=\"\"/>\n"
                } else {
                    "<input disabled=\"\" type=\"checkbox\"/>\n"
                };
                self.out().push_str(marker);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush();
                self.heading = Some(HeadingCapture {
                    level: heading_level(level),
                    inner: String::new(),
                    text: String::new(),
                });
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeCapture {
                    lang,
                    code: String::new(),
                });
            }
            Tag::Table(align) => {
                self.flush();
                self.table = Some(TableCapture {
                    align: align.into_iter().map(convert_align).collect(),
                    ..TableCapture::default()
                });
            }
            Tag::TableHead => {
                if let Some(ref mut t) = self.table {
                    t.in_head = true;
                }
            }
            Tag::TableRow | Tag::TableCell => {}
            Tag::Image { dest_url, .. } => {
                self.image = Some(ImageCapture {
                    src: dest_url.into_string(),
                    alt: String::new(),
                });
            }
            Tag::Paragraph => {
                let _ = write!(self.out(), "<p class=\"{}\">", styles::PARAGRAPH);
            }
            Tag::BlockQuote(_) => {
                let _ = writeln!(self.out(), "<blockquote class=\"{}\">", styles::BLOCKQUOTE);
            }
            Tag::List(Some(start)) => {
                let out = self.out();
                let _ = write!(out, "<ol class=\"{}\"", styles::ORDERED_LIST);
                if start != 1 {
                    let _ = write!(out, " start=\"{start}\"");
                }
                out.push_str(">\n");
            }
            Tag::List(None) => {
                let _ = writeln!(self.out(), "<ul class=\"{}\">", styles::UNORDERED_LIST);
            }
            Tag::Item => {
                let _ = write!(self.out(), "<li class=\"{}\">", styles::LIST_ITEM);
            }
            Tag::Emphasis => self.out().push_str("<em>"),
            Tag::Strong => self.out().push_str("<strong>"),
            Tag::Strikethrough => self.out().push_str("<del>"),
            Tag::Link {
                dest_url, title, ..
            } => {
                let out = self.out();
                let _ = write!(
                    out,
                    "<a href=\"{}\" class=\"{}\"",
                    encode_double_quoted_attribute(&dest_url),
                    styles::LINK
                );
                if !title.is_empty() {
                    let _ = write!(out, " title=\"{}\"", encode_double_quoted_attribute(&title));
                }
                out.push('>');
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Heading(_) => {
                if let Some(h) = self.heading.take() {
                    self.blocks.push(Block::Heading(HeadingBlock {
                        level: h.level,
                        inner: h.inner,
                        text: h.text.trim().to_string(),
                        anchor_id: None,
                        spaced: false,
                    }));
                }
            }
            TagEnd::TableCell => {
                if let Some(ref mut t) = self.table {
                    let cell = std::mem::take(&mut t.cell);
                    t.row.push(cell);
                }
            }
            TagEnd::TableHead => {
                if let Some(ref mut t) = self.table {
                    t.header = std::mem::take(&mut t.row);
                    t.in_head = false;
                }
            }
            TagEnd::TableRow => {
                if let Some(ref mut t) = self.table {
                    if !t.in_head {
                        let row = std::mem::take(&mut t.row);
                        t.rows.push(row);
                    }
                }
            }
            TagEnd::Table => {
                if let Some(t) = self.table.take() {
                    self.blocks.push(Block::Table(Table {
                        align: t.align,
                        header: t.header,
                        rows: t.rows,
                    }));
                }
            }
            TagEnd::Paragraph => self.out().push_str("</p>\n"),
            TagEnd::BlockQuote(_) => self.out().push_str("</blockquote>\n"),
            TagEnd::List(true) => self.out().push_str("</ol>\n"),
            TagEnd::List(false) => self.out().push_str("</ul>\n"),
            TagEnd::Item => self.out().push_str("</li>\n"),
            TagEnd::Emphasis => self.out().push_str("</em>"),
            TagEnd::Strong => self.out().push_str("</strong>"),
            TagEnd::Strikethrough => self.out().push_str("</del>"),
            TagEnd::Link => self.out().push_str("</a>"),
            _ => {}
        }
    }

    fn end_code(&mut self) {
        if let Some(c) = self.code.take() {
            let code = c.code.strip_suffix('\n').unwrap_or(&c.code).to_string();
            self.blocks.push(Block::Code(CodeBlock {
                title: None,
                lang: c.lang,
                code,
            }));
        }
    }

    fn end_image(&mut self) {
        if let Some(img) = self.image.take() {
            if let Some(ref mut h) = self.heading {
                h.text.push_str(&img.alt);
            }
            let mut html = String::new();
            render_media(&img.src, &img.alt, &mut html);
            self.out().push_str(&html);
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_align(a: Alignment) -> Align {
    match a {
        Alignment::None => Align::None,
        Alignment::Left => Align::Left,
        Alignment::Center => Align::Center,
        Alignment::Right => Align::Right,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::emit;

    fn html(src: &str) -> String {
        emit(&render(src))
    }

    #[test]
    fn heading_and_strong_paragraph() {
        let blocks = render("# Title\n\nSome **text**.");
        assert!(matches!(&blocks[0], Block::Heading(h) if h.level == 1 && h.text == "Title"));
        assert_eq!(
            blocks[1],
            Block::Raw("<p class=\"text-gray-700 mb-4\">Some <strong>text</strong>.</p>\n".into())
        );
    }

    #[test]
    fn single_newline_is_a_line_break() {
        assert_eq!(
            html("one\ntwo"),
            "<p class=\"text-gray-700 mb-4\">one<br />\ntwo</p>\n"
        );
    }

    #[test]
    fn fenced_code_is_a_code_block() {
        let blocks = render("```rust extra\nfn main() {}\n```\n");
        assert_eq!(
            blocks,
            vec![Block::Code(CodeBlock {
                title: None,
                lang: Some("rust".into()),
                code: "fn main() {}".into(),
            })]
        );
    }

    #[test]
    fn lists_and_items_are_styled() {
        let out = html("- a\n- b\n\n3. x\n4. y\n");
        assert!(out.contains("<ul class=\"list-disc list-inside mb-4\">"));
        assert!(out.contains("<li class=\"mb-2 text-gray-700\">a</li>"));
        assert!(out.contains("<ol class=\"list-decimal list-inside mb-4\" start=\"3\">"));
    }

    #[test]
    fn blockquote_link_and_inline_code() {
        let out = html("> see [docs](https://d.test \"Docs\") and `x < y`");
        assert!(out.contains("<blockquote class=\"blockquote mb-4\">"));
        assert!(out.contains(
            "<a href=\"https://d.test\" class=\"text-blue-600 hover:underline\" title=\"Docs\">docs</a>"
        ));
        assert!(out.contains("<code class=\"bg-gray-100 rounded-lg p-1\">x &lt; y</code>"));
    }

    #[test]
    fn tables_are_lifted() {
        let blocks = render("| A | B |\n|:-:|---|\n| 1 | **2** |\n");
        let Block::Table(ref t) = blocks[0] else {
            panic!("expected table, got {:?}", blocks);
        };
        assert_eq!(t.align, vec![Align::Center, Align::None]);
        assert_eq!(t.header, vec!["A", "B"]);
        assert_eq!(t.rows, vec![vec!["1".to_string(), "<strong>2</strong>".to_string()]]);
    }

    #[test]
    fn images_and_videos() {
        let out = html("![a cat](cat.png)\n\n![clip](movie.mp4)");
        assert!(out.contains(
            "<img src=\"cat.png\" alt=\"a cat\" class=\"responsive-media mb-4 cursor-pointer\" \
             onclick=\"openModal('cat.png', 'image')\"/>"
        ));
        assert!(out.contains("<source src=\"movie.mp4\" type=\"video/mp4\">"));
    }

    #[test]
    fn heading_inside_list_splits_raw_blocks() {
        let blocks = render("- # Inner\n");
        assert_eq!(blocks.len(), 3);
        assert!(matches!(&blocks[1], Block::Heading(h) if h.text == "Inner"));
        assert!(emit(&blocks).ends_with("</li>\n</ul>\n"));
    }

    #[test]
    fn text_is_escaped_but_html_passes_through() {
        let out = html("a < b\n\n<div class=\"x\">raw</div>\n");
        assert!(out.contains("a &lt; b"));
        assert!(out.contains("<div class=\"x\">raw</div>"));
    }

    #[test]
    fn multi_line_heading_text_keeps_a_space() {
        let blocks = render("Foo\nbar\n===\n");
        match &blocks[0] {
            Block::Heading(h) => {
                assert_eq!(h.level, 1);
                assert_eq!(h.text, "Foo bar");
                assert_eq!(crate::pipeline::headings::slugify(&h.text), "foo-bar");
            }
            other => panic!("expected a heading, got {other:?}"),
        }
    }
}
