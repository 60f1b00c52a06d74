//! Web Fetcher (spec §4.2): fetches a URL and materializes it as a
//! `FileEntity` pointing at a local markdown file, the same shape a
//! downloaded binary file takes before the File Chunker runs over it.
//! Ported from `original_source/backend/airweave/platform/transformers/web_fetcher.py`,
//! which shells out to Firecrawl for the HTML-to-markdown step; there is no
//! Firecrawl-equivalent crate in the workspace, so that step is replaced
//! with the same regex-based `html_to_markdown` conversion the teacher uses
//! for scraped pages (`rootsignal-domains/src/scraping/adapters/http.rs`).

use std::path::PathBuf;

use airweave_common::AirweaveError;
use airweave_entity::{Entity, FileEntity, Provenance};
use regex::Regex;

/// Strip a raw HTML document down to markdown-ish text: scripts and styles
/// are removed outright, a handful of structural tags become their markdown
/// equivalent, everything else is stripped, and entities/whitespace are
/// normalized. This is a best-effort conversion, not a full HTML parser.
pub fn html_to_markdown(html: &str) -> String {
    let strip_tag = |input: &str, tag: &str| -> String {
        let pattern = format!(r"(?is)<{tag}[^>]*>.*?</{tag}>");
        Regex::new(&pattern).unwrap().replace_all(input, "").to_string()
    };

    let mut text = html.to_string();
    text = strip_tag(&text, "script");
    text = strip_tag(&text, "style");

    let replacements: &[(&str, &str)] = &[
        (r"(?is)<h1[^>]*>(.*?)</h1>", "\n# $1\n"),
        (r"(?is)<h2[^>]*>(.*?)</h2>", "\n## $1\n"),
        (r"(?is)<h3[^>]*>(.*?)</h3>", "\n### $1\n"),
        (r"(?is)<li[^>]*>(.*?)</li>", "\n- $1"),
        (r"(?is)<br\s*/?>", "\n"),
        (r"(?is)<p[^>]*>(.*?)</p>", "\n$1\n"),
        (r#"(?is)<a[^>]*href="([^"]*)"[^>]*>(.*?)</a>"#, "[$2]($1)"),
    ];
    for (pattern, replacement) in replacements {
        text = Regex::new(pattern).unwrap().replace_all(&text, *replacement).to_string();
    }

    // Strip whatever tags remain (bold/italic/div/span/etc.) without a
    // markdown equivalent.
    text = Regex::new(r"(?s)<[^>]+>").unwrap().replace_all(&text, "").to_string();

    text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    let blank_lines = Regex::new(r"\n{3,}").unwrap();
    text = blank_lines.replace_all(&text, "\n\n").to_string();

    text.lines()
        .map(|l| l.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Fetches `url`, converts the response body to markdown, writes it under
/// `temp_root` using `FileEntity::temp_path`'s naming convention, and
/// returns a `FileEntity` ready for the File Chunker. Non-HTML responses
/// are passed through unconverted — the original only special-cases HTML.
pub async fn fetch_as_file_entity(
    client: &reqwest::Client,
    url: &str,
    provenance: Provenance,
    temp_root: &str,
) -> Result<(FileEntity, PathBuf), AirweaveError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| AirweaveError::TransientUpstream(format!("fetching {url}: {e}")))?;

    if !response.status().is_success() {
        return Err(AirweaveError::TransientUpstream(format!(
            "fetching {url}: status {}",
            response.status()
        )));
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/html")
        .to_string();

    let body = response
        .text()
        .await
        .map_err(|e| AirweaveError::TransientUpstream(format!("reading body of {url}: {e}")))?;

    let markdown = if content_type.contains("html") {
        html_to_markdown(&body)
    } else {
        body
    };

    let base = Entity::new(url, "WebPage", provenance);
    let file = FileEntity::new(base, url, "text/markdown");
    let path = file.temp_path(temp_root);

    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AirweaveError::Anyhow(e.into()))?;
    }
    tokio::fs::write(&path, &markdown)
        .await
        .map_err(|e| AirweaveError::Anyhow(e.into()))?;

    Ok((file, path))
}
