//! Recipient source: turns uploaded CSV text into recipient records.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use super::RecipientRecord;

/// Fields whose header is matched case-insensitively.
const ALIASED_FIELDS: [&str; 2] = ["email", "name"];

/// Errors that can occur while reading a recipient list
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecipientSourceError {
    /// The input has no header row
    #[error("CSV is empty")]
    Empty,

    /// The header row has no email column
    #[error("CSV has no email column")]
    MissingEmailColumn,
}

/// Parse comma separated text with a header row into recipient records.
///
/// Blank lines are ignored and cells are trimmed. `email` and `name` headers
/// are normalised to lowercase whatever their case; other headers are kept as
/// written. Rows without an email are dropped.
pub fn parse_recipients(text: &str) -> Result<Vec<RecipientRecord>, RecipientSourceError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let header: Vec<String> = lines
        .next()
        .ok_or(RecipientSourceError::Empty)?
        .split(',')
        .map(normalise_header)
        .collect();

    if !header.iter().any(|h| h == "email") {
        return Err(RecipientSourceError::MissingEmailColumn);
    }

    let records = lines
        .map(|line| {
            let mut cells = line.split(',').map(str::trim);

            header
                .iter()
                .map(|h| (h.clone(), cells.next().unwrap_or_default().to_string()))
                .collect::<RecipientRecord>()
        })
        .filter(|record| !record.email().trim().is_empty())
        .collect();

    Ok(records)
}

fn normalise_header(raw: &str) -> String {
    let trimmed = raw.trim();

    ALIASED_FIELDS
        .iter()
        .find(|alias| alias.eq_ignore_ascii_case(trimmed))
        .map_or_else(|| trimmed.to_string(), |alias| alias.to_string())
}

/// A short summary of a loaded recipient list
#[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq)]
pub struct RecipientPreview {
    /// Number of recipients loaded
    #[schema(example = 42)]
    pub count: usize,

    /// Up to three `email • name` samples
    #[schema(example = json!(["ana@example.com • Ana"]))]
    pub sample: Vec<String>,
}

/// Summarise a recipient list for display.
pub fn preview(records: &[RecipientRecord]) -> RecipientPreview {
    RecipientPreview {
        count: records.len(),
        sample: records
            .iter()
            .take(3)
            .map(|r| format!("{} • {}", r.email(), r.name()))
            .collect(),
    }
}
