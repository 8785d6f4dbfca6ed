//! Metadata directives: `#title <text>` and `#description <text>`.
//!
//! Extraction and stripping are two separate passes. The pipeline extracts
//! first and strips afterwards, so a directive line is read exactly once and
//! never leaks into the rendered body.

use crate::config::ConversionConfig;
use crate::context::RenderContext;
use crate::output::Metadata;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#title\b[ \t]*(.*)$").unwrap());

static RE_DESCRIPTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#description\b[ \t]*(.*)$").unwrap());

static RE_DIRECTIVE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#(?:title|description)\b.*(?:\n|$)").unwrap());

/// Build the page metadata for `text`.
///
/// The first directive of each kind wins; its text is trimmed. A missing or
/// empty directive falls back to the configured default. `og_image` and
/// `og_url` always come from the context.
pub fn extract(text: &str, ctx: &RenderContext, config: &ConversionConfig) -> Metadata {
    Metadata {
        title: directive(&RE_TITLE, text).unwrap_or_else(|| config.default_title.clone()),
        description: directive(&RE_DESCRIPTION, text)
            .unwrap_or_else(|| config.default_description.clone()),
        og_image: ctx.og_image(),
        og_url: ctx.og_url(),
    }
}

/// Remove every `#title` / `#description` line from `text`.
pub fn strip_directives(text: &str) -> String {
    RE_DIRECTIVE_LINE.replace_all(text, "").into_owned()
}

fn directive(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|value| !value.is_empty())
}
