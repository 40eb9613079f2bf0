//! JSON export of pipeline results
//!
//! Results are written as one JSON object keyed by URL, sorted so that two
//! exports of the same batch are byte-identical.

use crate::storage::PageRecord;
use crate::SieveError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// One exported entry, keyed by its URL in the enclosing object
#[derive(Debug, Serialize)]
struct ExportEntry<'a> {
    content: &'a str,
    error: bool,
    message: &'a str,
    outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    status_code: Option<u16>,
    extraction_failed: bool,
}

/// Formats pipeline results as a pretty-printed JSON object
///
/// # Arguments
///
/// * `results` - Records returned by the content pipeline
///
/// # Returns
///
/// * `Ok(String)` - The JSON document
/// * `Err(SieveError)` - Serialization failed
pub fn format_json(results: &HashMap<String, PageRecord>) -> Result<String, SieveError> {
    let entries: BTreeMap<&str, ExportEntry<'_>> = results
        .iter()
        .map(|(url, page)| {
            let entry = ExportEntry {
                content: page.extracted_content.as_deref().unwrap_or(&page.url),
                error: page.fetch_error,
                message: &page.fetch_message,
                outcome: page.outcome.to_string(),
                status_code: page.status_code,
                extraction_failed: page.extraction_failed,
            };
            (url.as_str(), entry)
        })
        .collect();

    Ok(serde_json::to_string_pretty(&entries)?)
}

/// Writes pipeline results as JSON to `output_path`
///
/// # Arguments
///
/// * `results` - Records returned by the content pipeline
/// * `output_path` - Path where the JSON file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the export
/// * `Err(SieveError)` - Failed to serialize or write
pub fn export_json(
    results: &HashMap<String, PageRecord>,
    output_path: &Path,
) -> Result<(), SieveError> {
    let json = format_json(results)?;

    let mut file = File::create(output_path)?;
    file.write_all(json.as_bytes())?;
    file.write_all(b"\n")?;

    tracing::info!(
        "Exported {} results to {}",
        results.len(),
        output_path.display()
    );
    Ok(())
}
