// Spreadsheet-backed record store

use std::fmt;
use std::future::Future;

use tokio::sync::OnceCell;

use crate::models::{McqPayload, McqRecord};

pub mod memory;
pub mod sheets;

pub use memory::MemorySheet;
pub use sheets::{GoogleSheets, SheetsCredentials};

/// First row holding data; row 1 carries the column headers.
pub const FIRST_DATA_ROW: u32 = 2;
const FIRST_COLUMN: char = 'A';
const LAST_COLUMN: char = 'M';

/// Failures of store operations. `MissingCredentials` and `Backend`
/// together mean the store is unavailable; handlers answer both with 500.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("MCQ not found")]
    NotFound,
    #[error("Row changed during operation. Please retry.")]
    Conflict,
    #[error("Missing Google Sheets credentials")]
    MissingCredentials,
    #[error("sheet backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Title and numeric id of the sheet holding the records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetDetails {
    pub title: String,
    pub sheet_id: i64,
}

/// A rectangular block of cells on one sheet, rows 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellRange {
    pub sheet: String,
    pub first_column: char,
    pub last_column: char,
    pub first_row: u32,
    /// `None` reads through the last populated row.
    pub last_row: Option<u32>,
}

impl CellRange {
    /// All record columns from the first data row down.
    pub fn data(sheet: &str) -> Self {
        Self {
            sheet: sheet.to_string(),
            first_column: FIRST_COLUMN,
            last_column: LAST_COLUMN,
            first_row: FIRST_DATA_ROW,
            last_row: None,
        }
    }

    /// The id column from the first data row down.
    pub fn ids(sheet: &str) -> Self {
        Self {
            last_column: FIRST_COLUMN,
            ..Self::data(sheet)
        }
    }

    /// The id cell of a single row.
    pub fn id_cell(sheet: &str, row: u32) -> Self {
        Self {
            first_row: row,
            last_row: Some(row),
            ..Self::ids(sheet)
        }
    }

    /// Every record column of a single row.
    pub fn row(sheet: &str, row: u32) -> Self {
        Self {
            first_row: row,
            last_row: Some(row),
            ..Self::data(sheet)
        }
    }

    pub fn width(&self) -> usize {
        (self.last_column as usize).saturating_sub(self.first_column as usize) + 1
    }
}

impl fmt::Display for CellRange {
    /// A1 notation with the sheet title quoted, e.g. `'Sheet 1'!A2:M`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let title = self.sheet.replace('\'', "''");
        write!(
            f,
            "'{title}'!{}{}:{}",
            self.first_column, self.first_row, self.last_column
        )?;
        if let Some(last_row) = self.last_row {
            write!(f, "{last_row}")?;
        }
        Ok(())
    }
}

/// The range-addressed calls the store needs from a tabular backend.
#[cfg_attr(test, mockall::automock)]
pub trait SheetBackend: Send + Sync {
    /// Title and id of the first sheet of the spreadsheet.
    fn sheet_details(&self) -> impl Future<Output = StoreResult<SheetDetails>> + Send;

    /// Values in `range`. Trailing empty rows are omitted and each row may
    /// be shorter than the range when its trailing cells are empty.
    fn get_values(
        &self,
        range: &CellRange,
    ) -> impl Future<Output = StoreResult<Vec<Vec<String>>>> + Send;

    /// Appends `rows` after the last populated row of the table at `range`.
    fn append_rows(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Overwrites the cells of `range` with `rows`.
    fn update_values(
        &self,
        range: &CellRange,
        rows: Vec<Vec<String>>,
    ) -> impl Future<Output = StoreResult<()>> + Send;

    /// Structurally removes the 1-based rows `first..=last`, shifting rows
    /// below them up.
    fn delete_rows(
        &self,
        sheet_id: i64,
        first: u32,
        last: u32,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// CRUD over MCQ records kept one per row.
///
/// Records are addressed by id only. Row numbers are resolved against the
/// live sheet on every mutation and never cached, since any delete shifts
/// the rows below it.
pub struct RecordStore<B> {
    backend: B,
    details: OnceCell<SheetDetails>,
}

impl<B: SheetBackend> RecordStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            details: OnceCell::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Fetches and caches the sheet metadata.
    ///
    /// The metadata is kept for the life of the process and never refreshed,
    /// so renaming the sheet while the service runs needs a restart. Store
    /// calls run this lazily if startup could not.
    pub async fn init(&self) -> StoreResult<&SheetDetails> {
        self.details
            .get_or_try_init(|| async {
                let details = self.backend.sheet_details().await?;
                tracing::info!(
                    title = %details.title,
                    sheet_id = details.sheet_id,
                    "sheet metadata cached"
                );
                Ok::<_, StoreError>(details)
            })
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<McqRecord>> {
        let details = self.init().await?;
        let rows = self
            .backend
            .get_values(&CellRange::data(&details.title))
            .await?;
        Ok(rows.iter().map(|row| McqRecord::from_row(row)).collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn get(&self, id: &str) -> StoreResult<McqRecord> {
        self.list()
            .await?
            .into_iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound)
    }

    #[tracing::instrument(skip_all, fields(id = %record.id))]
    pub async fn create(&self, record: &McqRecord) -> StoreResult<()> {
        let details = self.init().await?;
        self.backend
            .append_rows(&CellRange::data(&details.title), vec![record.to_row()])
            .await
    }

    #[tracing::instrument(skip(self, payload))]
    pub async fn update(&self, id: &str, payload: McqPayload) -> StoreResult<McqRecord> {
        let details = self.init().await?;
        let row = self.resolve_row(id).await?;
        let record = payload.into_record(id.to_string());
        self.backend
            .update_values(&CellRange::row(&details.title, row), vec![record.to_row()])
            .await?;
        Ok(record)
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let details = self.init().await?;
        let row = self.resolve_row(id).await?;
        self.backend.delete_rows(details.sheet_id, row, row).await
    }

    /// Resolves `id` to its current 1-based row number.
    ///
    /// Scans the id column for the first match, then re-reads that single
    /// cell to confirm nothing shifted in between. One more scan and verify
    /// is allowed; a second mismatch is a `Conflict`. A row can still move
    /// after the final verify and before the caller's write lands. The
    /// backend has no conditional write to close that gap.
    pub async fn resolve_row(&self, id: &str) -> StoreResult<u32> {
        for attempt in 1..=2 {
            let row = self.find_row(id).await?;
            if self.id_at_row(row).await? == id {
                return Ok(row);
            }
            tracing::warn!(id, row, attempt, "row shifted between scan and verify");
        }
        Err(StoreError::Conflict)
    }

    async fn find_row(&self, id: &str) -> StoreResult<u32> {
        let details = self.init().await?;
        let ids = self
            .backend
            .get_values(&CellRange::ids(&details.title))
            .await?;
        let idx = ids
            .iter()
            .position(|row| row.first().map(String::as_str) == Some(id))
            .ok_or(StoreError::NotFound)?;
        u32::try_from(idx)
            .map(|idx| idx + FIRST_DATA_ROW)
            .map_err(StoreError::backend)
    }

    async fn id_at_row(&self, row: u32) -> StoreResult<String> {
        let details = self.init().await?;
        let values = self
            .backend
            .get_values(&CellRange::id_cell(&details.title, row))
            .await?;
        Ok(values
            .into_iter()
            .next()
            .and_then(|cells| cells.into_iter().next())
            .unwrap_or_default())
    }
}
