//! Presentational class names and fixed markup fragments.
//!
//! Published pages are styled by Tailwind utility classes that the shell
//! template safelists. These strings are a compatibility contract with pages
//! already online: change them only together with the shell.

// ── Headings ─────────────────────────────────────────────────────────────

pub const H1: &str = "text-4xl font-bold text-gray-800 mb-4";
pub const H2: &str = "text-3xl font-bold text-gray-800 mb-4";
pub const H3: &str = "text-2xl font-bold text-gray-800 mb-4";

/// Class for an annotated heading of the given level, if it gets one.
pub fn heading_class(level: u8) -> Option<&'static str> {
    match level {
        1 => Some(H1),
        2 => Some(H2),
        3 => Some(H3),
        _ => None,
    }
}

// ── Text blocks ──────────────────────────────────────────────────────────

pub const PARAGRAPH: &str = "text-gray-700 mb-4";
pub const EMPHASIS: &str = "font-bold text-blue-600";
pub const LINK: &str = "text-blue-600 hover:underline";
pub const BLOCKQUOTE: &str = "blockquote mb-4";
pub const CALLOUT: &str = "note mb-4";
pub const INLINE_CODE: &str = "bg-gray-100 rounded-lg p-1";

// ── Lists ────────────────────────────────────────────────────────────────

pub const UNORDERED_LIST: &str = "list-disc list-inside mb-4";
pub const ORDERED_LIST: &str = "list-decimal list-inside mb-4";
pub const LIST_ITEM: &str = "mb-2 text-gray-700";

// ── Tables ───────────────────────────────────────────────────────────────

pub const TABLE: &str = "min-w-full table-auto mb-4 border";
pub const TABLE_CELL: &str = "px-4 py-2 border";

// ── Code blocks ──────────────────────────────────────────────────────────

pub const CODE_CONTAINER: &str = "copyable mb-4";
pub const COPY_BUTTON: &str = "bg-blue-600 hover:bg-blue-700 text-white font-bold py-1 px-3 rounded";
pub const COPY_LABEL: &str = "コピー";

// ── Media ────────────────────────────────────────────────────────────────

pub const IMAGE_CONTAINER: &str = "image-container mb-4";
pub const IMAGE: &str = "responsive-image";
pub const IMAGE_CAPTION: &str = "text-sm text-gray-600 mt-2";
pub const MEDIA: &str = "responsive-media mb-4 cursor-pointer";
pub const VIDEO_CONTAINER: &str = "video-container mb-4";
pub const VIDEO: &str = "responsive-media";

// ── Navigation ───────────────────────────────────────────────────────────

pub const NAV: &str = "toc mb-12";
pub const NAV_LIST: &str = "mb-4";
pub const NAV_ITEM: &str = "mb-2 text-gray-700";

/// Visual indent emitted once per level below the top in the navigation list.
pub const NAV_INDENT: &str = "&emsp;";
