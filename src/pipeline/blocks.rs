//! Parser for the `#tag` block-markup dialect.
//!
//! The source is cut into segments by a line-oriented tokenizer. A tag token
//! is `#name` at the start of a line (leading blanks allowed), where `name`
//! is an ASCII letter followed by letters, digits or `_`, optionally followed
//! on the same line by a parenthesised argument: `#h2(Intro)`. A segment's
//! content runs from the end of its tag token to the next tag token or the
//! end of the text. Inside a `#code` body only known tags end the segment,
//! so lines such as `#include <stdio.h>` stay part of the code.
//!
//! | Tag | Payload | Block |
//! |-----|---------|-------|
//! | `#h2` | heading text | [`Block::Heading`] (level 2) |
//! | `#text` | text with `<:>emphasis<:>` | [`Block::Paragraph`] |
//! | `#code` | `title<:>code` | [`Block::Code`] |
//! | `#img` | `src<:>alt` | [`Block::Image`] |
//! | `#strong` | `title<:>body` | [`Block::Callout`] |
//! | `#table` | pipe table | [`Block::Table`] |
//!
//! The payload is the parenthesised argument when present, else the content.
//! Content after an argument becomes a paragraph of its own. Text outside any
//! tag is passed through with only `<a>label<:>href<a>` links expanded.
//!
//! Nothing here fails: unknown tags and malformed payloads produce a
//! [`MarkupWarning`] and the segment's source text is kept verbatim.

use crate::error::MarkupWarning;
use crate::pipeline::document::{Align, Block, CodeBlock, HeadingBlock, Table};
use crate::pipeline::inline::{plain_text, render_inline};
use tracing::warn;

const SEP: &str = "<:>";

// `#title` / `#description` are not listed: column-0 directives are stripped
// before parsing, and an indented one is reported like any other unknown tag.
const KNOWN_TAGS: &[&str] = &["h2", "text", "code", "img", "strong", "table"];

/// Blocks plus the diagnostics collected while producing them.
#[derive(Debug, Default)]
pub struct ParsedMarkup {
    pub blocks: Vec<Block>,
    pub warnings: Vec<MarkupWarning>,
}

impl ParsedMarkup {
    fn warn(&mut self, warning: MarkupWarning, raw: &str) {
        warn!("{}", warning);
        self.warnings.push(warning);
        self.blocks.push(Block::Raw(raw.to_string()));
    }
}

/// A `#name(arg)` token found at the start of a line.
#[derive(Debug, Clone, PartialEq, Eq)]
struct TagToken<'a> {
    name: &'a str,
    arg: Option<&'a str>,
    /// Opening `(` with no matching `)` on the line.
    unclosed: bool,
    /// Byte length of the line prefix up to the end of the token.
    len: usize,
}

#[derive(Debug)]
struct Segment<'a> {
    tag: Option<TagToken<'a>>,
    /// Complete source text of the segment, tag token included.
    raw: &'a str,
    /// 1-indexed line of the segment start.
    line: usize,
}

impl Segment<'_> {
    /// Text after the tag token.
    fn content(&self) -> &str {
        match self.tag {
            Some(ref t) => &self.raw[t.len..],
            None => self.raw,
        }
    }
}

/// Parse block markup into blocks. Directive lines should already be removed.
pub fn parse(text: &str) -> ParsedMarkup {
    let mut parsed = ParsedMarkup::default();
    for segment in segments(text) {
        expand(&segment, &mut parsed);
    }
    parsed
}

fn is_known(name: &str) -> bool {
    KNOWN_TAGS.contains(&name)
}

/// Recognise a tag token at the start of `line`.
fn tag_token(line: &str) -> Option<TagToken<'_>> {
    let indent = line.len() - line.trim_start_matches([' ', '\t']).len();
    let after_hash = line[indent..].strip_prefix('#')?;
    if !after_hash.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let name_len = after_hash
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(after_hash.len());
    let name = &after_hash[..name_len];
    let mut len = indent + 1 + name_len;

    let rest = &line[len..];
    if !rest.starts_with('(') {
        return Some(TagToken {
            name,
            arg: None,
            unclosed: false,
            len,
        });
    }

    let mut depth = 0usize;
    for (i, c) in rest.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    let arg = &rest[1..i];
                    len += i + 1;
                    return Some(TagToken {
                        name,
                        arg: Some(arg),
                        unclosed: false,
                        len,
                    });
                }
            }
            '\n' => break,
            _ => {}
        }
    }
    Some(TagToken {
        name,
        arg: None,
        unclosed: true,
        len,
    })
}

/// Cut `text` into tagged segments.
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut start = 0usize;
    let mut start_line = 1usize;
    let mut current: Option<TagToken<'_>> = None;
    let mut offset = 0usize;

    for (idx, line) in text.split_inclusive('\n').enumerate() {
        if let Some(token) = tag_token(line) {
            let in_code = current.as_ref().is_some_and(|t| t.name == "code");
            if !in_code || is_known(token.name) {
                if offset > start || current.is_some() {
                    out.push(Segment {
                        tag: current.take(),
                        raw: &text[start..offset],
                        line: start_line,
                    });
                }
                start = offset;
                start_line = idx + 1;
                current = Some(token);
            }
        }
        offset += line.len();
    }

    if offset > start || current.is_some() {
        out.push(Segment {
            tag: current,
            raw: &text[start..],
            line: start_line,
        });
    }
    out
}

fn expand(seg: &Segment<'_>, parsed: &mut ParsedMarkup) {
    let Some(ref tag) = seg.tag else {
        parsed.blocks.push(Block::Raw(render_inline(seg.raw, false)));
        return;
    };

    if !is_known(tag.name) {
        let warning = MarkupWarning::UnknownTag {
            name: tag.name.to_string(),
            line: seg.line,
        };
        parsed.warn(warning, seg.raw);
        return;
    }

    if tag.unclosed {
        let warning = malformed(tag.name, seg.line, "unclosed '(' in tag argument");
        parsed.warn(warning, seg.raw);
        return;
    }

    let content = seg.content();
    let (payload, trailer) = match tag.arg {
        Some(arg) => (arg, content),
        None => (content, ""),
    };

    let result = match tag.name {
        "h2" => expand_heading(tag.arg, content),
        "text" => Ok(expand_text(payload)),
        "code" => expand_code(tag.arg, content),
        "img" => expand_image(payload),
        "strong" => expand_callout(payload),
        "table" => expand_table(payload),
        other => Err(format!("no expansion for '#{other}'")),
    };

    match result {
        Ok(blocks) => {
            parsed.blocks.extend(blocks);
            // `#h2` and `#code` consume their own trailing content.
            if !matches!(tag.name, "h2" | "code") {
                parsed.blocks.extend(trailer_paragraph(trailer));
            }
        }
        Err(reason) => {
            let warning = if tag.name == "table" {
                MarkupWarning::MalformedTable {
                    line: seg.line,
                    reason,
                }
            } else {
                malformed(tag.name, seg.line, &reason)
            };
            parsed.warn(warning, seg.raw);
        }
    }
}

fn malformed(tag: &str, line: usize, reason: &str) -> MarkupWarning {
    MarkupWarning::MalformedPayload {
        tag: tag.to_string(),
        line,
        reason: reason.to_string(),
    }
}

fn trailer_paragraph(trailer: &str) -> Option<Block> {
    let trailer = trailer.trim();
    (!trailer.is_empty()).then(|| Block::Paragraph {
        inner: render_inline(trailer, true),
    })
}

fn expand_heading(arg: Option<&str>, content: &str) -> Result<Vec<Block>, String> {
    let (title, rest) = match arg {
        Some(arg) => (arg, content),
        None => content.split_once('\n').unwrap_or((content, "")),
    };
    let title = title.trim();
    if title.is_empty() {
        return Err("empty heading".into());
    }

    let mut blocks = vec![Block::Heading(HeadingBlock {
        level: 2,
        inner: render_inline(title, false),
        text: plain_text(title),
        anchor_id: None,
        spaced: true,
    })];
    blocks.extend(trailer_paragraph(rest));
    Ok(blocks)
}

fn expand_text(payload: &str) -> Vec<Block> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Vec::new();
    }
    vec![Block::Paragraph {
        inner: render_inline(payload, true),
    }]
}

fn expand_code(arg: Option<&str>, content: &str) -> Result<Vec<Block>, String> {
    let (title, code) = match arg {
        Some(title) => (title, content),
        None => content
            .split_once(SEP)
            .ok_or_else(|| format!("expected 'title{SEP}code'"))?,
    };
    let title = title.trim();
    let code = code.strip_prefix('\n').unwrap_or(code).trim_end();
    Ok(vec![Block::Code(CodeBlock {
        title: (!title.is_empty()).then(|| title.to_string()),
        lang: None,
        code: code.to_string(),
    })])
}

fn expand_image(payload: &str) -> Result<Vec<Block>, String> {
    let (src, alt) = payload
        .split_once(SEP)
        .ok_or_else(|| format!("expected 'src{SEP}alt'"))?;
    let src = src.trim();
    if src.is_empty() {
        return Err("empty image source".into());
    }
    Ok(vec![Block::Image {
        src: src.to_string(),
        alt: alt.trim().to_string(),
    }])
}

fn expand_callout(payload: &str) -> Result<Vec<Block>, String> {
    let (title, body) = payload
        .split_once(SEP)
        .ok_or_else(|| format!("expected 'title{SEP}body'"))?;
    Ok(vec![Block::Callout {
        title: render_inline(title.trim(), true),
        body: render_inline(body.trim(), true),
    }])
}

fn expand_table(payload: &str) -> Result<Vec<Block>, String> {
    let lines: Vec<&str> = payload
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if lines.len() < 2 {
        return Err("needs a header row and a separator row".into());
    }
    if let Some(bad) = lines.iter().find(|l| !l.contains('|')) {
        return Err(format!("not a pipe row: '{bad}'"));
    }

    let header = split_row(lines[0]);
    let separator = split_row(lines[1]);
    if separator.len() != header.len() {
        return Err(format!(
            "separator has {} column(s), header has {}",
            separator.len(),
            header.len()
        ));
    }
    let align = separator
        .iter()
        .map(|cell| parse_align(cell))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| "missing separator row".to_string())?;

    let width = header.len();
    let rows = lines[2..]
        .iter()
        .map(|line| {
            let mut cells: Vec<String> = split_row(line)
                .into_iter()
                .map(|c| render_inline(c, false))
                .collect();
            cells.resize(width, String::new());
            cells
        })
        .collect();

    Ok(vec![Block::Table(Table {
        align,
        header: header.into_iter().map(|c| render_inline(c, false)).collect(),
        rows,
    })])
}

fn split_row(line: &str) -> Vec<&str> {
    let line = line.trim();
    let line = line.strip_prefix('|').unwrap_or(line);
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').map(str::trim).collect()
}

/// `---`, `:--`, `--:` or `:-:`; anything else is not a separator cell.
fn parse_align(cell: &str) -> Option<Align> {
    let left = cell.starts_with(':');
    let right = cell.len() > 1 && cell.ends_with(':');
    let dashes = cell.trim_start_matches(':').trim_end_matches(':');
    if dashes.is_empty() || !dashes.chars().all(|c| c == '-') {
        return None;
    }
    Some(match (left, right) {
        (true, true) => Align::Center,
        (true, false) => Align::Left,
        (false, true) => Align::Right,
        (false, false) => Align::None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::document::emit;

    #[test]
    fn tokens() {
        let t = tag_token("#h2(Intro (part 1))rest\n").unwrap();
        assert_eq!(t.name, "h2");
        assert_eq!(t.arg, Some("Intro (part 1)"));
        assert_eq!(&"#h2(Intro (part 1))rest\n"[t.len..], "rest\n");

        let t = tag_token("  #text hello").unwrap();
        assert_eq!(t.name, "text");
        assert_eq!(t.arg, None);

        assert!(tag_token("# Heading").is_none());
        assert!(tag_token("#1 fan").is_none());
        assert!(tag_token("text #h2(x)").is_none());
        assert!(tag_token("#h2(open\n").unwrap().unclosed);
    }

    #[test]
    fn heading_with_trailing_text() {
        let parsed = parse("#h2(Intro)Welcome<:>bold<:> text");
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.blocks.len(), 2);
        assert!(matches!(&parsed.blocks[0], Block::Heading(h) if h.text == "Intro" && h.spaced));
        assert_eq!(
            parsed.blocks[1],
            Block::Paragraph {
                inner: "Welcome<b class=\"font-bold text-blue-600\">bold</b> text".into()
            }
        );
    }

    #[test]
    fn heading_without_argument_uses_first_line() {
        let parsed = parse("#h2 Setup\nInstall it.");
        assert!(matches!(&parsed.blocks[0], Block::Heading(h) if h.text == "Setup"));
        assert!(matches!(&parsed.blocks[1], Block::Paragraph { inner } if inner == "Install it."));
    }

    #[test]
    fn text_runs_until_next_tag() {
        let parsed = parse("#text first line\nsecond line\n#text other");
        assert_eq!(parsed.blocks.len(), 2);
        assert_eq!(
            parsed.blocks[0],
            Block::Paragraph {
                inner: "first line\nsecond line".into()
            }
        );
    }

    #[test]
    fn code_block_keeps_hash_lines() {
        let src = "#code main.c<:>\n#include <stdio.h>\nint main() {}\n#text after";
        let parsed = parse(src);
        assert!(parsed.warnings.is_empty());
        assert_eq!(
            parsed.blocks[0],
            Block::Code(CodeBlock {
                title: Some("main.c".into()),
                lang: None,
                code: "#include <stdio.h>\nint main() {}".into(),
            })
        );
        assert!(matches!(&parsed.blocks[1], Block::Paragraph { inner } if inner == "after"));
    }

    #[test]
    fn malformed_code_is_left_verbatim() {
        let src = "#code no separator here\n";
        let parsed = parse(src);
        assert_eq!(parsed.blocks, vec![Block::Raw(src.into())]);
        assert!(matches!(
            &parsed.warnings[0],
            MarkupWarning::MalformedPayload { tag, line: 1, .. } if tag == "code"
        ));
    }

    #[test]
    fn unknown_tag_is_left_verbatim() {
        let parsed = parse("#text ok\n#quote something\n");
        assert_eq!(parsed.blocks[1], Block::Raw("#quote something\n".into()));
        assert_eq!(
            parsed.warnings,
            vec![MarkupWarning::UnknownTag {
                name: "quote".into(),
                line: 2
            }]
        );
    }

    #[test]
    fn indented_directive_is_kept_with_a_warning() {
        let parsed = parse("#text ok\n  #title Hidden\n");
        assert_eq!(parsed.blocks[1], Block::Raw("  #title Hidden\n".into()));
        assert_eq!(
            parsed.warnings,
            vec![MarkupWarning::UnknownTag {
                name: "title".into(),
                line: 2
            }]
        );
    }

    #[test]
    fn image_and_callout() {
        let parsed = parse("#img https://x.test/a.png<:>A cat\n#strong Note<:>Be <:>careful<:>");
        assert_eq!(
            parsed.blocks[0],
            Block::Image {
                src: "https://x.test/a.png".into(),
                alt: "A cat".into()
            }
        );
        assert_eq!(
            parsed.blocks[1],
            Block::Callout {
                title: "Note".into(),
                body: "Be <b class=\"font-bold text-blue-600\">careful</b>".into()
            }
        );
    }

    #[test]
    fn image_without_source_is_malformed() {
        let parsed = parse("#img <:>alt only");
        assert_eq!(parsed.warnings.len(), 1);
        assert_eq!(parsed.blocks, vec![Block::Raw("#img <:>alt only".into())]);
    }

    #[test]
    fn loose_text_expands_links_only() {
        let parsed = parse("Intro <a>site<:>https://s.test<a> <:>not bold<:>\n");
        assert_eq!(
            parsed.blocks,
            vec![Block::Raw(
                "Intro <a href=\"https://s.test\" class=\"text-blue-600 hover:underline\">site</a> \
                 <:>not bold<:>\n"
                    .into()
            )]
        );
    }

    #[test]
    fn table_with_alignment() {
        let src = "#table\n| Name | Qty |\n|:-----|----:|\n| Apple | 3 |\n| Pear |\n";
        let parsed = parse(src);
        assert!(parsed.warnings.is_empty());
        let Block::Table(ref table) = parsed.blocks[0] else {
            panic!("expected a table, got {:?}", parsed.blocks[0]);
        };
        assert_eq!(table.align, vec![Align::Left, Align::Right]);
        assert_eq!(table.header, vec!["Name", "Qty"]);
        assert_eq!(table.rows[1], vec!["Pear".to_string(), String::new()]);
        assert!(emit(&parsed.blocks)
            .contains("<table class=\"min-w-full table-auto mb-4 border\">"));
    }

    #[test]
    fn table_without_separator_is_malformed() {
        let src = "#table\n| A | B |\n| 1 | 2 |\n";
        let parsed = parse(src);
        assert!(matches!(parsed.warnings[0], MarkupWarning::MalformedTable { line: 1, .. }));
        assert_eq!(parsed.blocks, vec![Block::Raw(src.into())]);
    }

    #[test]
    fn table_with_one_row_is_malformed() {
        let parsed = parse("#table | A |");
        assert!(matches!(parsed.warnings[0], MarkupWarning::MalformedTable { .. }));
    }

    #[test]
    fn unclosed_argument_is_malformed() {
        let parsed = parse("#h2(Intro\n");
        assert!(matches!(
            &parsed.warnings[0],
            MarkupWarning::MalformedPayload { tag, .. } if tag == "h2"
        ));
        assert_eq!(parsed.blocks, vec![Block::Raw("#h2(Intro\n".into())]);
    }

    #[test]
    fn empty_input() {
        let parsed = parse("");
        assert!(parsed.blocks.is_empty());
        assert!(parsed.warnings.is_empty());
    }
}
