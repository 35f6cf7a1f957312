// =============================================================================
// SHEET MODULE
// =============================================================================
// Item lookup against the upstream Excel export.
//
// The first worksheet is read with its first row as column names. Fields are
// resolved with the same alias table the JSON normalizer uses, but the key
// comparison is exact: "js0260" does not find "JS0260" here, while the list
// filters would match it.
// =============================================================================

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};

use crate::error::{AppError, AppResult};
use crate::models::StockItem;
use crate::normalize::{item_from_source, FieldSource};

// -----------------------------------------------------------------------------
// ROWS
// -----------------------------------------------------------------------------

/// One data row as `(header, cell text)` pairs in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    cells: Vec<(String, String)>,
}

impl SheetRow {
    pub fn new(cells: Vec<(String, String)>) -> Self {
        Self { cells }
    }
}

impl FieldSource for SheetRow {
    fn text_for(&self, key: &str) -> Option<String> {
        let wanted = key.to_lowercase();
        self.cells
            .iter()
            .find(|(header, _)| header.to_lowercase() == wanted)
            .map(|(_, value)| value.clone())
    }
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

// -----------------------------------------------------------------------------
// PARSING
// -----------------------------------------------------------------------------

/// Reads the first worksheet of an `.xlsx` payload into rows.
///
/// # Errors
/// [`AppError::UpstreamMalformed`] when the bytes are not a readable
/// workbook or the workbook has no worksheet.
pub fn parse_workbook(bytes: &[u8]) -> AppResult<Vec<SheetRow>> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|err| AppError::UpstreamMalformed(format!("unreadable workbook: {err}")))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| AppError::UpstreamMalformed("workbook has no worksheets".into()))?
        .map_err(|err| AppError::UpstreamMalformed(format!("unreadable worksheet: {err}")))?;

    Ok(rows_from_range(&range))
}

/// Uses the first row as headers. Blank cells become "", and rows that are
/// blank throughout are skipped.
pub fn rows_from_range(range: &Range<Data>) -> Vec<SheetRow> {
    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_row.iter().map(cell_text).collect();

    rows.map(|row| {
        let cells = headers
            .iter()
            .enumerate()
            .filter(|(_, header)| !header.is_empty())
            .map(|(column, header)| {
                let value = row.get(column).map(cell_text).unwrap_or_default();
                (header.clone(), value)
            })
            .collect();
        SheetRow::new(cells)
    })
    .filter(|row| row.cells.iter().any(|(_, value)| !value.is_empty()))
    .collect()
}

// -----------------------------------------------------------------------------
// LOOKUP
// -----------------------------------------------------------------------------

/// Returns the first row whose resolved part number equals `key` exactly.
pub fn lookup_by_key(rows: &[SheetRow], key: &str) -> Option<StockItem> {
    rows.iter()
        .map(item_from_source)
        .find(|item| item.num == key)
}
