use std::sync::{Mutex, MutexGuard};

use super::{CellRange, SheetBackend, SheetDetails, StoreError, StoreResult};
use crate::models::COLUMNS;

/// An in-process sheet with the same range semantics as the Sheets API.
///
/// Row 1 holds the column headers. Reads drop trailing empty cells and
/// trailing empty rows the way `values.get` does. Only single-letter
/// columns are addressable.
pub struct MemorySheet {
    details: SheetDetails,
    rows: Mutex<Vec<Vec<String>>>,
}

impl Default for MemorySheet {
    fn default() -> Self {
        Self::new("Sheet1", 0)
    }
}

fn column_index(column: char) -> usize {
    (column as usize).saturating_sub('A' as usize)
}

fn trim_trailing_empty(mut cells: Vec<String>) -> Vec<String> {
    while cells.last().is_some_and(String::is_empty) {
        cells.pop();
    }
    cells
}

impl MemorySheet {
    pub fn new(title: &str, sheet_id: i64) -> Self {
        let header = COLUMNS.iter().map(|c| c.to_string()).collect();
        Self {
            details: SheetDetails {
                title: title.to_string(),
                sheet_id,
            },
            rows: Mutex::new(vec![header]),
        }
    }

    /// Seeds raw data rows below the header, bypassing the store.
    pub fn with_rows(self, rows: Vec<Vec<String>>) -> Self {
        if let Ok(mut sheet) = self.rows.lock() {
            sheet.extend(rows);
        }
        self
    }

    /// Every row including the header, as stored.
    pub fn snapshot(&self) -> StoreResult<Vec<Vec<String>>> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<Vec<String>>>> {
        self.rows
            .lock()
            .map_err(|_| StoreError::backend("in-memory sheet lock poisoned"))
    }

    fn check_range(&self, range: &CellRange) -> StoreResult<()> {
        if range.sheet != self.details.title {
            return Err(StoreError::Backend(format!("Unable to parse range: {range}")));
        }
        if range.first_row == 0 {
            return Err(StoreError::Backend(format!("Invalid row in range: {range}")));
        }
        Ok(())
    }

    fn write_cells(row: &mut Vec<String>, first_column: usize, cells: Vec<String>) {
        let needed = first_column + cells.len();
        if row.len() < needed {
            row.resize(needed, String::new());
        }
        for (offset, cell) in cells.into_iter().enumerate() {
            row[first_column + offset] = cell;
        }
    }
}

impl SheetBackend for MemorySheet {
    async fn sheet_details(&self) -> StoreResult<SheetDetails> {
        Ok(self.details.clone())
    }

    async fn get_values(&self, range: &CellRange) -> StoreResult<Vec<Vec<String>>> {
        self.check_range(range)?;
        let rows = self.lock()?;
        let first = range.first_row as usize - 1;
        let end = range
            .last_row
            .map_or(rows.len(), |last| (last as usize).min(rows.len()));
        let columns = column_index(range.first_column)..=column_index(range.last_column);

        let mut values: Vec<Vec<String>> = rows
            .get(first..end)
            .unwrap_or_default()
            .iter()
            .map(|row| {
                let cells = row
                    .iter()
                    .enumerate()
                    .filter(|(idx, _)| columns.contains(idx))
                    .map(|(_, cell)| cell.clone())
                    .collect();
                trim_trailing_empty(cells)
            })
            .collect();
        while values.last().is_some_and(Vec::is_empty) {
            values.pop();
        }
        Ok(values)
    }

    async fn append_rows(&self, range: &CellRange, new_rows: Vec<Vec<String>>) -> StoreResult<()> {
        self.check_range(range)?;
        let mut rows = self.lock()?;
        let first_column = column_index(range.first_column);
        let table_start = range.first_row as usize - 1;
        let after_last = rows
            .iter()
            .rposition(|row| row.iter().any(|cell| !cell.is_empty()))
            .map_or(table_start, |idx| (idx + 1).max(table_start));
        if rows.len() < after_last {
            rows.resize(after_last, Vec::new());
        }
        for (offset, cells) in new_rows.into_iter().enumerate() {
            let mut row = Vec::new();
            Self::write_cells(&mut row, first_column, cells);
            rows.insert(after_last + offset, row);
        }
        Ok(())
    }

    async fn update_values(
        &self,
        range: &CellRange,
        new_rows: Vec<Vec<String>>,
    ) -> StoreResult<()> {
        self.check_range(range)?;
        let mut rows = self.lock()?;
        let first_column = column_index(range.first_column);
        for (offset, cells) in new_rows.into_iter().enumerate() {
            let idx = range.first_row as usize - 1 + offset;
            if rows.len() <= idx {
                rows.resize(idx + 1, Vec::new());
            }
            Self::write_cells(&mut rows[idx], first_column, cells);
        }
        Ok(())
    }

    async fn delete_rows(&self, sheet_id: i64, first: u32, last: u32) -> StoreResult<()> {
        if sheet_id != self.details.sheet_id {
            return Err(StoreError::Backend(format!("No grid with id: {sheet_id}")));
        }
        if first == 0 || last < first {
            return Err(StoreError::Backend(format!(
                "Invalid row span {first}..={last}"
            )));
        }
        let mut rows = self.lock()?;
        let start = (first as usize - 1).min(rows.len());
        let end = (last as usize).min(rows.len());
        rows.drain(start..end);
        Ok(())
    }
}
