//! File Converter (spec §4.2): materializes a file to markdown via a
//! pluggable per-MIME converter, mirroring the teacher's registry-by-name
//! pattern (spec §9's "dynamic dispatch... use a registry keyed by
//! short_name"). Real docx/pptx/pdf parsing is out of scope (spec §1); the
//! registry here demonstrates the contract with converters for the
//! formats that need no external parser (plain text, markdown, html,
//! csv/json passthrough) and a slot for callers to register more.

use std::collections::HashMap;

use airweave_common::AirweaveError;

/// Converts raw file bytes of a known MIME type to markdown text.
pub trait FileConverter: Send + Sync {
    fn mime_types(&self) -> &[&str];
    fn convert(&self, bytes: &[u8]) -> Result<String, AirweaveError>;
}

pub struct PlainTextConverter;

impl FileConverter for PlainTextConverter {
    fn mime_types(&self) -> &[&str] {
        &["text/plain", "text/markdown"]
    }

    fn convert(&self, bytes: &[u8]) -> Result<String, AirweaveError> {
        String::from_utf8(bytes.to_vec())
            .map_err(|e| AirweaveError::PerItemBadData {
                entity_id: "unknown".into(),
                message: format!("not valid utf-8: {e}"),
            })
    }
}

pub struct HtmlConverter;

impl FileConverter for HtmlConverter {
    fn mime_types(&self) -> &[&str] {
        &["text/html"]
    }

    fn convert(&self, bytes: &[u8]) -> Result<String, AirweaveError> {
        let html = PlainTextConverter.convert(bytes)?;
        Ok(crate::web_fetcher::html_to_markdown(&html))
    }
}

pub struct JsonConverter;

impl FileConverter for JsonConverter {
    fn mime_types(&self) -> &[&str] {
        &["application/json"]
    }

    fn convert(&self, bytes: &[u8]) -> Result<String, AirweaveError> {
        let text = PlainTextConverter.convert(bytes)?;
        let value: serde_json::Value = serde_json::from_str(&text).map_err(|e| AirweaveError::PerItemBadData {
            entity_id: "unknown".into(),
            message: format!("invalid json: {e}"),
        })?;
        Ok(format!("```json\n{}\n```", serde_json::to_string_pretty(&value).unwrap_or(text)))
    }
}

pub struct CsvConverter;

impl FileConverter for CsvConverter {
    fn mime_types(&self) -> &[&str] {
        &["text/csv"]
    }

    fn convert(&self, bytes: &[u8]) -> Result<String, AirweaveError> {
        let text = PlainTextConverter.convert(bytes)?;
        let mut out = String::new();
        for (i, line) in text.lines().enumerate() {
            let cells: Vec<&str> = line.split(',').collect();
            out.push_str("| ");
            out.push_str(&cells.join(" | "));
            out.push_str(" |\n");
            if i == 0 {
                out.push_str("| ");
                out.push_str(&vec!["---"; cells.len()].join(" | "));
                out.push_str(" |\n");
            }
        }
        Ok(out)
    }
}

/// Registry of converters keyed by the MIME types they claim, populated at
/// startup — the same dispatch shape the spec asks for source/destination
/// adapters (spec §9).
pub struct ConverterRegistry {
    by_mime: HashMap<String, std::sync::Arc<dyn FileConverter>>,
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self { by_mime: HashMap::new() }
    }

    pub fn register(&mut self, converter: std::sync::Arc<dyn FileConverter>) {
        for mime in converter.mime_types() {
            self.by_mime.insert(mime.to_string(), converter.clone());
        }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(std::sync::Arc::new(PlainTextConverter));
        registry.register(std::sync::Arc::new(HtmlConverter));
        registry.register(std::sync::Arc::new(JsonConverter));
        registry.register(std::sync::Arc::new(CsvConverter));
        registry
    }

    pub fn convert(&self, mime_type: &str, bytes: &[u8]) -> Result<String, AirweaveError> {
        self.by_mime
            .get(mime_type)
            .ok_or_else(|| AirweaveError::PerItemBadData {
                entity_id: "unknown".into(),
                message: format!("no converter registered for mime type {mime_type}"),
            })?
            .convert(bytes)
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_plain_text_passthrough() {
        let registry = ConverterRegistry::with_defaults();
        let out = registry.convert("text/plain", b"hello").unwrap();
        assert_eq!(out, "hello");
    }

    #[test]
    fn converts_html_to_markdown() {
        let registry = ConverterRegistry::with_defaults();
        let out = registry.convert("text/html", b"<h1>Title</h1><p>Body</p>").unwrap();
        assert!(out.contains("# Title"));
        assert!(out.contains("Body"));
    }

    #[test]
    fn unknown_mime_type_errors() {
        let registry = ConverterRegistry::with_defaults();
        assert!(registry.convert("application/x-unknown", b"x").is_err());
    }
}
