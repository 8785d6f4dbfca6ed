//! Substitute metadata, navigation and body into the shell template.
//!
//! Placeholders are `$title`, `$description`, `$og_image`, `$og_url`, `$nav`
//! and `$content`. Substitution is a single pass over the shell, so a `$`
//! sequence inside substituted content is never expanded again. Unknown
//! `$name` sequences (JavaScript, prices) are left alone.

use crate::output::Metadata;
use html_escape::encode_double_quoted_attribute;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

static RE_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$(title|description|og_image|og_url|nav|content)\b").unwrap());

/// Build the final document.
///
/// Title and description land in attribute values as well as text, so they
/// are attribute-escaped. `body` and `nav` are inserted as-is.
pub fn assemble(shell: &str, metadata: &Metadata, nav: &str, body: &str) -> String {
    RE_PLACEHOLDER
        .replace_all(shell, |caps: &Captures| match &caps[1] {
            "title" => encode_double_quoted_attribute(&metadata.title).into_owned(),
            "description" => encode_double_quoted_attribute(&metadata.description).into_owned(),
            "og_image" => encode_double_quoted_attribute(&metadata.og_image).into_owned(),
            "og_url" => encode_double_quoted_attribute(&metadata.og_url).into_owned(),
            "nav" => nav.to_string(),
            _ => body.to_string(),
        })
        .into_owned()
}
