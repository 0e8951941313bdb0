use chrono::{Local, NaiveDate};
use cmdiary_core::{
    FieldMap, FieldValue, IdAllocator, ItemType, NewRecord, Record, RecordAttribute, RecordId,
    ValidationError,
};

struct NextId(RecordId);

impl IdAllocator for NextId {
    type Error = ValidationError;

    fn allocate_id(&mut self) -> Result<RecordId, ValidationError> {
        self.0 += 1;
        Ok(self.0)
    }
}

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn homework() -> Record {
    let new_record = NewRecord::new(ItemType::Homework, "Maths", "Exercise 4B").due(date(2026, 10, 20));
    Record::create(new_record, Some(101), &mut NextId(0)).unwrap()
}

#[test]
fn create_allocates_id_only_when_none_is_given() {
    let mut allocator = NextId(100);
    let allocated = Record::create(
        NewRecord::new(ItemType::Note, "Art", "Bring charcoal"),
        None,
        &mut allocator,
    )
    .unwrap();
    assert_eq!(allocated.id(), 101);
    assert_eq!(allocated.item_type(), ItemType::Note);
    assert!(!allocated.priority());
    assert_eq!(allocated.due_date(), None);

    let explicit = Record::create(
        NewRecord::new(ItemType::Assessment, "History", "Essay"),
        Some(7),
        &mut allocator,
    )
    .unwrap();
    assert_eq!(explicit.id(), 7);
    assert_eq!(allocator.0, 101);
}

#[test]
fn edit_ignores_attributes_outside_whitelist() {
    let mut record = homework();
    let before = record.clone();

    record.edit("colour", &"red".into()).unwrap();
    record.edit("days_left", &FieldValue::Int(3)).unwrap();
    record.edit("s", &"Art".into()).unwrap();
    record.edit("owner", &FieldValue::Null).unwrap();

    assert_eq!(record, before);
}

#[test]
fn edit_applies_whitelisted_attributes_with_validation() {
    let mut record = homework();

    record.edit("subject", &"Physics".into()).unwrap();
    record.edit("item_type", &"assessment".into()).unwrap();
    record.edit("due_date", &"01/11/2026".into()).unwrap();
    record.edit("priority", &FieldValue::Bool(true)).unwrap();
    record.edit("uid", &FieldValue::Int(555)).unwrap();

    assert_eq!(record.subject(), Some("Physics"));
    assert_eq!(record.item_type(), ItemType::Assessment);
    assert_eq!(record.due_date(), Some(date(2026, 11, 1)));
    assert!(record.priority());
    assert_eq!(record.id(), 555);

    let err = record.edit("item_type", &"exam".into()).unwrap_err();
    assert!(matches!(err, ValidationError::NotAnOption { field: "item_type", .. }));
    assert_eq!(record.item_type(), ItemType::Assessment);

    let err = record.edit("uid", &FieldValue::Null).unwrap_err();
    assert_eq!(err, ValidationError::MissingField("uid"));
    assert_eq!(record.id(), 555);

    record.edit("due_date", &FieldValue::Null).unwrap();
    assert_eq!(record.due_date(), None);
}

#[test]
fn field_map_round_trip_reconstructs_identical_record() {
    let mut record = homework();
    record.set_priority(true).unwrap();

    let map = record.to_field_map();
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    for attribute in RecordAttribute::PERSISTED {
        assert!(keys.contains(&attribute.name()));
    }
    assert_eq!(map["due_date"], FieldValue::Date(date(2026, 10, 20)));

    let rebuilt = Record::from_field_map(&map).unwrap();
    assert_eq!(rebuilt, record);
}

#[test]
fn field_map_serializes_dates_as_day_month_year_text() {
    let json = serde_json::to_value(homework().to_field_map()).unwrap();
    assert_eq!(json["uid"], 101);
    assert_eq!(json["item_type"], "homework");
    assert_eq!(json["due_date"], "20/10/2026");
    assert_eq!(json["priority"], false);

    let decoded: FieldMap = serde_json::from_value(json).unwrap();
    assert_eq!(decoded["due_date"], FieldValue::Text("20/10/2026".to_string()));
    assert_eq!(Record::from_field_map(&decoded).unwrap(), homework());
}

#[test]
fn from_field_map_rejects_non_reconstructible_data() {
    let mut bad_type = homework().to_field_map();
    bad_type.insert("item_type".to_string(), "exam".into());
    assert!(matches!(
        Record::from_field_map(&bad_type),
        Err(ValidationError::NotAnOption { field: "item_type", .. })
    ));

    let mut bad_uid = homework().to_field_map();
    bad_uid.insert("uid".to_string(), "one".into());
    assert!(matches!(
        Record::from_field_map(&bad_uid),
        Err(ValidationError::WrongType { field: "uid", .. })
    ));

    let mut missing_uid = homework().to_field_map();
    missing_uid.remove("uid");
    assert_eq!(
        Record::from_field_map(&missing_uid).unwrap_err(),
        ValidationError::MissingField("uid")
    );
}

#[test]
fn from_field_map_defaults_missing_optional_fields() {
    let mut map = FieldMap::new();
    map.insert("uid".to_string(), FieldValue::Int(300));
    map.insert("item_type".to_string(), "note".into());

    let record = Record::from_field_map(&map).unwrap();
    assert_eq!(record.id(), 300);
    assert_eq!(record.subject(), None);
    assert_eq!(record.description(), None);
    assert_eq!(record.due_date(), None);
    assert!(!record.priority());
}

#[test]
fn days_remaining_is_relative_to_today() {
    let record = homework();
    assert_eq!(record.days_remaining_from(date(2026, 10, 17)), Some(3));
    assert_eq!(record.days_remaining_from(date(2026, 10, 25)), Some(-5));

    let mut undated = homework();
    undated.set_due_date(None).unwrap();
    assert_eq!(undated.days_remaining(), None);

    let today = Local::now().date_naive();
    let mut due_today = homework();
    due_today.set_due_date(Some(today)).unwrap();
    assert_eq!(due_today.days_remaining(), Some(0));
}

#[test]
fn item_type_parses_names_and_abbreviations() {
    assert_eq!(ItemType::parse("Homework"), Some(ItemType::Homework));
    assert_eq!(ItemType::parse("a"), Some(ItemType::Assessment));
    assert_eq!(ItemType::parse(" N "), Some(ItemType::Note));
    assert_eq!(ItemType::parse("exam"), None);
}

#[test]
fn typed_setters_update_the_field_map() {
    let mut record = homework();
    record.set_item_type(ItemType::Note).unwrap();
    record.set_subject(None).unwrap();
    record.set_description(Some("Read chapter 2".to_string())).unwrap();

    let map = record.to_field_map();
    assert_eq!(map["item_type"], FieldValue::Text("note".to_string()));
    assert_eq!(map["subject"], FieldValue::Null);
    assert_eq!(map["description"], FieldValue::Text("Read chapter 2".to_string()));
    assert_eq!(record.value_of(RecordAttribute::Uid), FieldValue::Int(101));
}

#[test]
fn required_fields_never_read_back_as_defaults() {
    let mut null_uid = homework().to_field_map();
    null_uid.insert("uid".to_string(), FieldValue::Null);
    assert_eq!(
        Record::from_field_map(&null_uid).unwrap_err(),
        ValidationError::MissingField("uid")
    );

    let mut null_type = homework().to_field_map();
    null_type.insert("item_type".to_string(), FieldValue::Null);
    assert_eq!(
        Record::from_field_map(&null_type).unwrap_err(),
        ValidationError::MissingField("item_type")
    );

    let mut record = homework();
    record.set_attribute(RecordAttribute::Uid, &FieldValue::Null).unwrap_err();
    record.set_attribute(RecordAttribute::ItemType, &FieldValue::Null).unwrap_err();
    assert_eq!(record.id(), 101);
    assert_eq!(record.value_of(RecordAttribute::Uid), FieldValue::Int(101));
    assert_eq!(record.item_type(), ItemType::Homework);
}
