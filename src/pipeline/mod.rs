//! Pipeline stages for markup-to-HTML conversion.
//!
//! Each submodule implements exactly one step. Data flows one way and no
//! stage reads the output of a later one.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ metadata ──▶ media ──▶ markdown | blocks ──▶ headings ──▶ assemble
//! (read)    (extract,    (fetch,   (one renderer per      (ids, nav)   (shell)
//!            strip)       rewrite)  input format)
//! ```
//!
//! 1. [`input`]   : read the source and detect its format
//! 2. [`metadata`]: extract `#title` / `#description`, then strip them
//! 3. [`media`]   : download remote media, rewrite references; the only
//!    stage with network I/O
//! 4. [`markdown`] / [`blocks`]: render to [`document::Block`]s, styled as
//!    they are built; the two renderers never see each other's output
//! 5. [`headings`]: slug anchors and the navigation list
//! 6. [`assemble`]: substitute everything into the shell

pub mod assemble;
pub mod blocks;
pub mod document;
pub mod headings;
pub mod inline;
pub mod input;
pub mod markdown;
pub mod media;
pub mod metadata;
