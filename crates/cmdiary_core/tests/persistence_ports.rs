use chrono::NaiveDate;
use cmdiary_core::{
    FieldValue, ItemType, JsonLinesRecordRepository, NewRecord, PersistError, PersistencePort,
    Record, RecordStore, SqliteRecordRepository, StoreConfig, StoreError,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusqlite::params;

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn fill<P: PersistencePort>(store: &mut RecordStore<P>) {
    store
        .add(NewRecord::new(ItemType::Homework, "Maths", "Exercise 4B").due(date(2026, 10, 20)))
        .unwrap();
    let mut untitled = NewRecord::new(ItemType::Note, "", "Buy graph paper");
    untitled.subject = None;
    store.add(untitled).unwrap();
    let essay = store
        .add(NewRecord::new(ItemType::Assessment, "History", "Essay draft").with_priority(true))
        .unwrap();
    store.extend(-1, &[essay]).unwrap();
}

#[test]
fn sqlite_file_round_trip_preserves_order_and_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diary.db");

    let before: Vec<Record> = {
        let repo = SqliteRecordRepository::open(&path).unwrap();
        let mut store =
            RecordStore::open_with_rng(repo, StoreConfig::default(), StdRng::seed_from_u64(3))
                .unwrap();
        fill(&mut store);
        store.entries().to_vec()
    };

    let reopened = RecordStore::open(
        SqliteRecordRepository::open(&path).unwrap(),
        StoreConfig::default(),
    )
    .unwrap();
    assert_eq!(reopened.entries(), before.as_slice());
    assert_eq!(reopened.entries()[1].subject(), None);
}

#[test]
fn sqlite_stores_dates_as_day_month_year_text() {
    let mut repo = SqliteRecordRepository::in_memory().unwrap();
    let record = Record::from_field_map(&{
        let mut map = cmdiary_core::FieldMap::new();
        map.insert("uid".to_string(), FieldValue::Int(120));
        map.insert("item_type".to_string(), "homework".into());
        map.insert("due_date".to_string(), FieldValue::Date(date(2026, 3, 7)));
        map
    })
    .unwrap();
    repo.save_all(&[record.to_field_map()]).unwrap();

    let stored: String = repo
        .connection()
        .query_row("SELECT due_date FROM records WHERE uid = 120;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(stored, "07/03/2026");

    let loaded = repo.load_all().unwrap();
    assert_eq!(loaded.len(), 1);
    assert_eq!(Record::from_field_map(&loaded[0]).unwrap(), record);
}

#[test]
fn sqlite_reads_legacy_na_due_date_as_null() {
    let repo = SqliteRecordRepository::in_memory().unwrap();
    repo.connection()
        .execute(
            "INSERT INTO records (position, uid, item_type, subject, description, due_date, priority)
             VALUES (0, ?1, 'note', 'Art', 'N/A', 'N/A', 0);",
            params![250],
        )
        .unwrap();

    let store = RecordStore::open(repo, StoreConfig::default()).unwrap();
    let record = store.get(250).unwrap();
    assert_eq!(record.due_date(), None);
    assert_eq!(record.description(), Some("N/A"));
    assert_eq!(record.subject(), Some("Art"));
}

#[test]
fn sqlite_corrupt_rows_abort_hydration() {
    let repo = SqliteRecordRepository::in_memory().unwrap();
    repo.connection()
        .execute(
            "INSERT INTO records (position, uid, item_type, subject, description, due_date, priority)
             VALUES (0, 101, 'exam', 'Maths', 'Paper 1', NULL, 0);",
            [],
        )
        .unwrap();
    let err = RecordStore::open(repo, StoreConfig::default()).err().unwrap();
    assert!(matches!(err, StoreError::Validation(_)));

    let repo = SqliteRecordRepository::in_memory().unwrap();
    repo.connection()
        .execute(
            "INSERT INTO records (position, uid, item_type, subject, description, due_date, priority)
             VALUES (0, 101, 'note', 'Maths', 'Paper 1', '31/02/2026', 0);",
            [],
        )
        .unwrap();
    let err = RecordStore::open(repo, StoreConfig::default()).err().unwrap();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[test]
fn jsonl_missing_file_is_created_empty() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("diary.jsonl");

    let mut repo = JsonLinesRecordRepository::new(&path);
    assert!(repo.load_all().unwrap().is_empty());
    assert!(path.exists());
}

#[test]
fn jsonl_round_trip_writes_one_line_per_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diary.jsonl");

    let before: Vec<Record> = {
        let mut store = RecordStore::open_with_rng(
            JsonLinesRecordRepository::new(&path),
            StoreConfig::default(),
            StdRng::seed_from_u64(11),
        )
        .unwrap();
        fill(&mut store);
        store.entries().to_vec()
    };

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().count(), 3);
    assert!(contents.contains("\"due_date\":\"20/10/2026\""));
    assert!(!path.with_file_name("diary.jsonl.tmp").exists());
    let first: serde_json::Value = serde_json::from_str(contents.lines().next().unwrap()).unwrap();
    assert!(first["uid"].is_u64());
    assert_eq!(first["item_type"], "homework");
    assert_eq!(first["priority"], false);

    let reopened =
        RecordStore::open(JsonLinesRecordRepository::new(&path), StoreConfig::default()).unwrap();
    assert_eq!(reopened.entries(), before.as_slice());
}

#[test]
fn jsonl_malformed_line_is_reported_as_invalid_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diary.jsonl");
    std::fs::write(
        &path,
        "{\"uid\":101,\"item_type\":\"note\"}\nnot json\n",
    )
    .unwrap();

    let err = RecordStore::open(JsonLinesRecordRepository::new(&path), StoreConfig::default())
        .err()
        .unwrap();
    match err {
        StoreError::Persist(PersistError::InvalidData(message)) => {
            assert!(message.starts_with("line 2"), "unexpected message: {message}");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn sqlite_keeps_na_text_in_text_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("diary.db");

    let before: Vec<Record> = {
        let mut store = RecordStore::open(
            SqliteRecordRepository::open(&path).unwrap(),
            StoreConfig::default(),
        )
        .unwrap();
        store
            .add(NewRecord::new(ItemType::Note, "N/A", "N/A"))
            .unwrap();
        store.entries().to_vec()
    };

    let reopened = RecordStore::open(
        SqliteRecordRepository::open(&path).unwrap(),
        StoreConfig::default(),
    )
    .unwrap();
    assert_eq!(reopened.entries(), before.as_slice());
    assert_eq!(reopened.entries()[0].subject(), Some("N/A"));
    assert_eq!(reopened.entries()[0].description(), Some("N/A"));
}
