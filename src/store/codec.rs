//! Persisted history codec
//!
//! Two container forms share one JSON body:
//! - `data.js`: `window.BENCHMARK_DATA = <json>` (no trailing newline)
//! - anything else: bare JSON followed by a newline
//!
//! The body is pretty-printed with two-space indentation. Encoding is a pure
//! function of the document, so decode→encode of an encoded document is
//! byte-identical.

use std::path::Path;

use crate::constants::format::{DATA_JS_EXTENSION, DATA_JS_PREFIX};
use crate::model::HistoryDocument;

/// Container form of a history file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryFormat {
    Json,
    DataJs,
}

impl HistoryFormat {
    /// Pick the form from the file extension (`.js` → `data.js` form)
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case(DATA_JS_EXTENSION) => HistoryFormat::DataJs,
            _ => HistoryFormat::Json,
        }
    }
}

/// Canonical bytes of a document
///
/// Fails when a value has no JSON form (NaN or an infinity).
pub fn encode(document: &HistoryDocument, format: HistoryFormat) -> serde_json::Result<Vec<u8>> {
    let body = serde_json::to_string_pretty(document)?;
    let text = match format {
        HistoryFormat::Json => format!("{body}\n"),
        HistoryFormat::DataJs => format!("{DATA_JS_PREFIX}{body}"),
    };
    Ok(text.into_bytes())
}

/// Parse a history file's text
///
/// Blank text is an empty document. Anything else must parse completely;
/// the error string describes where it did not.
pub fn decode(text: &str, format: HistoryFormat) -> Result<HistoryDocument, String> {
    if text.trim().is_empty() {
        return Ok(HistoryDocument::default());
    }

    let body = match format {
        HistoryFormat::Json => text,
        HistoryFormat::DataJs => {
            let trimmed = text.trim_start();
            let prefix = DATA_JS_PREFIX.trim_end();
            let rest = trimmed
                .strip_prefix(prefix)
                .ok_or_else(|| format!("missing '{prefix}' prefix"))?;
            rest.trim().trim_end_matches(';')
        }
    };

    serde_json::from_str(body).map_err(|e| {
        format!(
            "invalid JSON at line {} column {}: {}",
            e.line(),
            e.column(),
            e
        )
    })
}
