//! Spreadsheets (`.xls`, `.xlsx`) through calamine. Sheets are read in
//! workbook order, rows top to bottom, cells left to right; each non-empty
//! cell becomes one fragment.

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDateTime, Timelike};
use tracing::debug;

use crate::document::extract::xml;
use crate::document::extract::ExtractError;
use crate::document::normalize::ExtractedDocument;

pub fn extract(path: &Path) -> Result<ExtractedDocument, ExtractError> {
    // Encrypted OOXML workbooks are wrapped in a compound file.
    if path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("xlsx"))
    {
        xml::reject_ole_container(path)?;
    }

    let mut workbook = open_workbook_auto(path)?;
    let mut doc = ExtractedDocument::default();
    for name in workbook.sheet_names() {
        let range = workbook.worksheet_range(&name)?;
        let before = doc.len();
        for row in range.rows() {
            for cell in row {
                if let Some(text) = cell_text(cell) {
                    doc.push(text);
                }
            }
        }
        debug!("sheet {:?}: {} cell(s)", name, doc.len() - before);
    }
    Ok(doc)
}

fn cell_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::DateTime(_) | Data::DateTimeIso(_) => match cell.as_datetime() {
            Some(dt) => Some(format_datetime(dt)),
            None => Some(cell.to_string()),
        },
        other => Some(other.to_string()),
    }
}

/// Dates at midnight print without a time component.
fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time().num_seconds_from_midnight() == 0 && dt.time().nanosecond() == 0 {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}
