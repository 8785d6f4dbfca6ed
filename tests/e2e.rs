//! End-to-end tests through the public API.
//!
//! Every test pins the render date and injects a fake [`MediaFetcher`], so
//! nothing here touches the network.

use async_trait::async_trait;
use blogpress::{
    convert_file, convert_source, convert_to_dir, BlogPressError, ConversionConfig,
    ConversionOutput, InputFormat, MarkupWarning, MediaError, MediaFetcher, RenderContext,
    SourceDocument,
};
use chrono::NaiveDate;
use reqwest::Url;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Writes `payload of <url>` so every download is distinguishable on disk.
struct ContentFetcher;

#[async_trait]
impl MediaFetcher for ContentFetcher {
    async fn fetch(&self, url: &Url, dest: &Path) -> Result<u64, MediaError> {
        let body = format!("payload of {url}");
        tokio::fs::write(dest, &body)
            .await
            .map_err(|e| MediaError::WriteFailed {
                url: url.to_string(),
                path: dest.to_path_buf(),
                reason: e.to_string(),
            })?;
        Ok(body.len() as u64)
    }
}

/// Simulates a network that is down.
struct FailingFetcher;

#[async_trait]
impl MediaFetcher for FailingFetcher {
    async fn fetch(&self, url: &Url, _dest: &Path) -> Result<u64, MediaError> {
        Err(MediaError::FetchFailed {
            url: url.to_string(),
            reason: "connection refused".into(),
        })
    }
}

fn fixed_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 2).unwrap()
}

fn config_with(fetcher: Arc<dyn MediaFetcher>) -> ConversionConfig {
    ConversionConfig::builder()
        .base_url("https://blog.test")
        .date(fixed_date())
        .fetcher(fetcher)
        .build()
        .unwrap()
}

async fn render(
    text: &str,
    format: InputFormat,
    config: &ConversionConfig,
    dir: &Path,
) -> ConversionOutput {
    let ctx = RenderContext::from_config(config, dir);
    convert_source(&SourceDocument::new(text, format), &ctx, config)
        .await
        .unwrap()
}

// ── Metadata ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn defaults_without_directives() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render("just text\n", InputFormat::Markdown, &config, dir.path()).await;

    assert_eq!(out.metadata.title, blogpress::config::DEFAULT_TITLE);
    assert_eq!(out.metadata.description, blogpress::config::DEFAULT_DESCRIPTION);
    assert!(out.html.contains(&format!("<title>{}</title>", blogpress::config::DEFAULT_TITLE)));
}

#[tokio::test]
async fn directives_are_trimmed_and_removed_from_body() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render(
        "#title   Spaced Title  \n#description  Short  \nBody line\n",
        InputFormat::Markdown,
        &config,
        dir.path(),
    )
    .await;

    assert_eq!(out.metadata.title, "Spaced Title");
    assert_eq!(out.metadata.description, "Short");
    assert!(!out.body.contains("#title"));
    assert!(out.body.contains("Body line"));
}

#[tokio::test]
async fn social_urls_depend_only_on_the_date() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let a = render("#title A\nfirst", InputFormat::Markdown, &config, dir.path()).await;
    let b = render("#title B\n#text second", InputFormat::BlockMarkup, &config, dir.path()).await;

    assert_eq!(a.metadata.og_image, b.metadata.og_image);
    assert_eq!(a.metadata.og_url, b.metadata.og_url);
    assert_eq!(a.metadata.og_image, "https://blog.test/Card/Card_2025-01-02.png");
    assert_eq!(a.metadata.og_url, "https://blog.test/2025-01-02/index.html");
}

// ── Media ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn relative_references_are_untouched() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(FailingFetcher));
    let out = render("![local](img/pic.png)\n", InputFormat::Markdown, &config, dir.path()).await;

    assert!(out.media.is_empty());
    assert!(out.body.contains("src=\"img/pic.png\""));
}

#[tokio::test]
async fn colliding_names_are_both_kept() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render(
        "![a](https://one.test/x/pic.png)\n\n![b](https://two.test/y/pic.png)\n",
        InputFormat::Markdown,
        &config,
        dir.path(),
    )
    .await;

    let names: Vec<&str> = out
        .media
        .iter()
        .map(|m| m.local_name.as_deref().unwrap())
        .collect();
    assert_eq!(names, vec!["pic.png", "pic_1.png"]);
    assert!(out.body.contains("src=\"pic.png\""));
    assert!(out.body.contains("src=\"pic_1.png\""));

    let first = std::fs::read_to_string(dir.path().join("pic.png")).unwrap();
    let second = std::fs::read_to_string(dir.path().join("pic_1.png")).unwrap();
    assert_eq!(first, "payload of https://one.test/x/pic.png");
    assert_eq!(second, "payload of https://two.test/y/pic.png");
}

#[tokio::test]
async fn existing_file_is_never_overwritten() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("pic.png"), "already here").unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let src = "![a](https://one.test/pic.png)";
    let out = render(src, InputFormat::Markdown, &config, dir.path()).await;

    assert_eq!(out.media[0].local_name.as_deref(), Some("pic_1.png"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("pic.png")).unwrap(),
        "already here"
    );
}

#[tokio::test]
async fn failed_fetch_keeps_the_remote_src() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(FailingFetcher));
    let out = render(
        "![alt](https://example.com/pic.png)\n",
        InputFormat::Markdown,
        &config,
        dir.path(),
    )
    .await;

    assert!(out.body.contains("<img src=\"https://example.com/pic.png\""));
    assert_eq!(out.stats.media_failed, 1);
    assert!(matches!(out.media[0].error, Some(MediaError::FetchFailed { .. })));
}

#[tokio::test]
async fn block_markup_images_are_localized() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render(
        "#img https://cdn.test/shot.png<:>A screenshot\n",
        InputFormat::BlockMarkup,
        &config,
        dir.path(),
    )
    .await;

    assert!(out.body.contains("src=\"shot.png\""));
    assert!(out.body.contains("A screenshot"));
    assert!(dir.path().join("shot.png").exists());
}

// ── Headings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn heading_slug_drops_punctuation() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render("## Hello, World!\n", InputFormat::Markdown, &config, dir.path()).await;

    assert_eq!(out.headings.len(), 1);
    assert_eq!(out.headings[0].anchor_id, "hello-world");
    assert!(out.body.contains("<h2 id=\"hello-world\""));
}

// ── Block markup ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn block_markup_post() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render(
        "#title My Post\n#description A test\n#h2(Intro)Welcome<:>bold<:> text",
        InputFormat::BlockMarkup,
        &config,
        dir.path(),
    )
    .await;

    assert_eq!(out.metadata.title, "My Post");
    assert_eq!(out.metadata.description, "A test");
    assert!(
        out.body
            .contains("<h2 id=\"intro\" class=\"text-3xl font-bold text-gray-800 mb-4\">Intro</h2>"),
        "body: {}",
        out.body
    );
    assert!(out.body.contains(
        "<p class=\"text-gray-700 mb-4\">Welcome<b class=\"font-bold text-blue-600\">bold</b> text</p>"
    ));
    assert!(out.warnings.is_empty());
}

#[tokio::test]
async fn malformed_code_is_a_warning_not_an_error() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render(
        "#text before\n#code no separator here\n#text after\n",
        InputFormat::BlockMarkup,
        &config,
        dir.path(),
    )
    .await;

    assert!(out.body.contains("#code no separator here"));
    assert!(out.body.contains("before"));
    assert!(out.body.contains("after"));
    assert_eq!(out.warnings.len(), 1);
    assert!(matches!(
        &out.warnings[0],
        MarkupWarning::MalformedPayload { tag, line: 2, .. } if tag == "code"
    ));
    assert_eq!(out.stats.warnings, 1);
}

// ── Markdown ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn markdown_post() {
    let dir = TempDir::new().unwrap();
    let config = config_with(Arc::new(ContentFetcher));
    let out = render("# Title\n\nSome **text**.", InputFormat::Markdown, &config, dir.path()).await;

    assert_eq!(out.body.matches("<h1").count(), 1);
    assert!(out.body.contains("<h1 id=\"title\""));
    assert!(out.body.contains("<p class=\"text-gray-700 mb-4\">Some <strong>text</strong>.</p>"));
}

// ── File entry points ────────────────────────────────────────────────────────

#[tokio::test]
async fn converts_files_into_an_output_dir() {
    let src = TempDir::new().unwrap();
    let out_dir = TempDir::new().unwrap();
    let input = src.path().join("day1.mbs");
    std::fs::write(&input, "#title Day 1\n#img https://cdn.test/a.png<:>cap\n").unwrap();

    let config = config_with(Arc::new(ContentFetcher));
    let out = convert_to_dir(&input, out_dir.path(), &config).await.unwrap();

    let page = out_dir.path().join("day1.html");
    assert_eq!(out.output_path.as_deref(), Some(page.as_path()));
    let html = std::fs::read_to_string(&page).unwrap();
    assert!(html.contains("<title>Day 1</title>"));
    assert!(out_dir.path().join("a.png").exists());
    assert!(!src.path().join("a.png").exists());
}

#[tokio::test]
async fn unsupported_extension_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("notes.txt");
    std::fs::write(&input, "hello").unwrap();

    let err = convert_file(&input, &config_with(Arc::new(ContentFetcher)))
        .await
        .unwrap_err();
    assert!(matches!(err, BlogPressError::UnsupportedFormat { .. }));
}
