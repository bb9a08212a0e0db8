use std::sync::atomic::{AtomicUsize, Ordering};

use mcq_admin::{
    models::{new_record_id, CorrectOption, Difficulty, McqPayload, McqRecord},
    store::{
        CellRange, MemorySheet, RecordStore, SheetBackend, SheetDetails, StoreError, StoreResult,
    },
};

fn payload(subject: &str) -> McqPayload {
    McqPayload {
        subject: subject.to_string(),
        topic: "Optics".to_string(),
        subtopic: String::new(),
        kind: "Conceptual".to_string(),
        question: "Which colour bends most in a prism?".to_string(),
        option_a: "Red".to_string(),
        option_b: "Green".to_string(),
        option_c: "Violet".to_string(),
        option_d: "Yellow".to_string(),
        correct_option: CorrectOption::C,
        explanation: String::new(),
        difficulty: Difficulty::Challenge,
    }
}

fn record(subject: &str) -> McqRecord {
    payload(subject).into_record(new_record_id())
}

/// Wraps a sheet and deletes its first data row right after each full scan
/// of the id column, while the store is between scan and verify.
struct ShiftingSheet {
    inner: MemorySheet,
    shifts_left: AtomicUsize,
}

impl ShiftingSheet {
    fn new(inner: MemorySheet, shifts: usize) -> Self {
        Self {
            inner,
            shifts_left: AtomicUsize::new(shifts),
        }
    }
}

impl SheetBackend for ShiftingSheet {
    async fn sheet_details(&self) -> StoreResult<SheetDetails> {
        self.inner.sheet_details().await
    }

    async fn get_values(&self, range: &CellRange) -> StoreResult<Vec<Vec<String>>> {
        let values = self.inner.get_values(range).await?;
        let is_id_scan = range.width() == 1 && range.last_row.is_none();
        if is_id_scan
            && self
                .shifts_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            let details = self.inner.sheet_details().await?;
            self.inner.delete_rows(details.sheet_id, 2, 2).await?;
        }
        Ok(values)
    }

    async fn append_rows(&self, range: &CellRange, rows: Vec<Vec<String>>) -> StoreResult<()> {
        self.inner.append_rows(range, rows).await
    }

    async fn update_values(&self, range: &CellRange, rows: Vec<Vec<String>>) -> StoreResult<()> {
        self.inner.update_values(range, rows).await
    }

    async fn delete_rows(&self, sheet_id: i64, first: u32, last: u32) -> StoreResult<()> {
        self.inner.delete_rows(sheet_id, first, last).await
    }
}

async fn seeded(records: &[McqRecord]) -> MemorySheet {
    let sheet = MemorySheet::new("Questions", 42);
    for r in records {
        sheet
            .append_rows(&CellRange::data("Questions"), vec![r.to_row()])
            .await
            .unwrap();
    }
    sheet
}

#[tokio::test]
async fn records_round_trip_through_every_column() {
    let store = RecordStore::new(MemorySheet::default());
    let mut full = record("Physics");
    full.subtopic = "Dispersion".to_string();
    full.explanation = "Shorter wavelengths refract more.".to_string();
    let sparse = record("Optics");

    store.create(&full).await.unwrap();
    store.create(&sparse).await.unwrap();

    assert_eq!(store.list().await.unwrap(), vec![full.clone(), sparse.clone()]);
    assert_eq!(store.get(&sparse.id).await.unwrap(), sparse);
}

#[tokio::test]
async fn hand_edited_rows_still_list() {
    let sheet = MemorySheet::default().with_rows(vec![vec![
        "manual-1".to_string(),
        "History".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "".to_string(),
        "Z".to_string(),
    ]]);
    let store = RecordStore::new(sheet);

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].correct_option, "Z");
    assert_eq!(records[0].difficulty, "");
}

#[tokio::test]
async fn deleting_shifts_later_records_up() {
    let records = [record("A"), record("B"), record("C"), record("D")];
    let store = RecordStore::new(seeded(&records).await);

    assert_eq!(store.resolve_row(&records[2].id).await.unwrap(), 4);
    store.delete(&records[1].id).await.unwrap();

    assert_eq!(store.resolve_row(&records[2].id).await.unwrap(), 3);
    assert_eq!(
        store.list().await.unwrap(),
        vec![records[0].clone(), records[2].clone(), records[3].clone()]
    );
    assert!(matches!(
        store.get(&records[1].id).await,
        Err(StoreError::NotFound)
    ));
}

#[tokio::test]
async fn one_shift_during_resolution_is_absorbed_by_the_retry() {
    let records = [record("A"), record("B"), record("Target")];
    let target = records[2].id.clone();
    let store = RecordStore::new(ShiftingSheet::new(seeded(&records).await, 1));

    let updated = store.update(&target, payload("Retargeted")).await.unwrap();
    assert_eq!(updated.id, target);

    let listed = store.list().await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0], records[1]);
    assert_eq!(listed[1].id, target);
    assert_eq!(listed[1].subject, "Retargeted");
}

#[tokio::test]
async fn repeated_shifts_end_in_conflict_without_writing() {
    let records = [record("A"), record("B"), record("Target")];
    let target = records[2].id.clone();
    let store = RecordStore::new(ShiftingSheet::new(seeded(&records).await, 2));

    assert!(matches!(
        store.delete(&target).await,
        Err(StoreError::Conflict)
    ));

    // The two concurrent deletes happened; the target itself is untouched.
    let listed = store.list().await.unwrap();
    assert_eq!(listed, vec![records[2].clone()]);
}
