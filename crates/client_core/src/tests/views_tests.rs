use super::*;
use shared::domain::{RecordField, RecordId};

fn reading(id: i64, temperature: Option<f64>, location: &str) -> SensorRecord {
    let mut record = SensorRecord::new(id);
    record.temperature = temperature;
    record.location = Some(location.to_string());
    record
}

fn ids(records: &[&SensorRecord]) -> Vec<RecordId> {
    records.iter().map(|record| record.id.clone()).collect()
}

#[test]
fn orders_numeric_ids_first_and_keeps_unparsable_ids_in_arrival_order() {
    let records = vec![
        SensorRecord::new(RecordId::Text("zeta".into())),
        SensorRecord::new(10),
        SensorRecord::new(RecordId::Text("alpha".into())),
        SensorRecord::new(RecordId::Text("2".into())),
        SensorRecord::new(0),
    ];
    let ordered = order_by_identifier(records);
    let ordered: Vec<String> = ordered.iter().map(|record| record.id.to_string()).collect();
    assert_eq!(ordered, vec!["0", "2", "10", "zeta", "alpha"]);
}

#[test]
fn search_matches_any_field_case_insensitively() {
    let records = vec![
        reading(1, Some(19.0), "Room 23"),
        reading(2, Some(21.0), "Hall"),
        reading(3, None, "KITCHEN"),
    ];

    assert_eq!(ids(&filter_records(&records, "23")), vec![RecordId::Number(1)]);
    assert_eq!(ids(&filter_records(&records, "kitchen")), vec![RecordId::Number(3)]);
    assert_eq!(filter_records(&records, "").len(), 3);
    assert!(filter_records(&records, "99").is_empty());
}

#[test]
fn search_covers_pass_through_fields_but_never_nulls() {
    let mut record = reading(1, None, "Lab");
    record
        .extra
        .insert("received_at".into(), serde_json::json!("2024-05-01T10:00:00Z"));
    let records = vec![record];

    assert_eq!(filter_records(&records, "2024-05").len(), 1);
    assert!(filter_records(&records, "null").is_empty());
}

#[test]
fn sorting_same_field_twice_flips_direction_and_stays_stable() {
    let records = vec![
        reading(1, Some(20.0), "a"),
        reading(2, Some(15.0), "b"),
        reading(3, Some(20.0), "c"),
        reading(4, Some(15.0), "d"),
    ];

    let first = SortSpec::toggle(None, FieldKey::Column(RecordField::Temperature));
    assert_eq!(first.direction, SortDirection::Ascending);
    let mut view = filter_records(&records, "");
    sort_records(&mut view, &first);
    assert_eq!(ids(&view), [2, 4, 1, 3].map(RecordId::Number).to_vec());

    let second = SortSpec::toggle(Some(&first), FieldKey::Column(RecordField::Temperature));
    assert_eq!(second.direction, SortDirection::Descending);
    let mut view = filter_records(&records, "");
    sort_records(&mut view, &second);
    assert_eq!(ids(&view), [1, 3, 2, 4].map(RecordId::Number).to_vec());

    let other = SortSpec::toggle(Some(&second), FieldKey::Column(RecordField::Location));
    assert_eq!(other.direction, SortDirection::Ascending);
}

#[test]
fn null_temperatures_sort_last_in_both_directions() {
    let records = vec![
        reading(1, Some(20.0), "x"),
        reading(2, None, "y"),
        reading(3, Some(15.0), "z"),
    ];

    let mut spec = SortSpec::ascending(RecordField::Temperature);
    let mut view = filter_records(&records, "");
    sort_records(&mut view, &spec);
    assert_eq!(ids(&view), [3, 1, 2].map(RecordId::Number).to_vec());

    spec.direction = SortDirection::Descending;
    let mut view = filter_records(&records, "");
    sort_records(&mut view, &spec);
    assert_eq!(ids(&view), [1, 3, 2].map(RecordId::Number).to_vec());
}

#[test]
fn pagination_counts_pages_and_clamps_requests() {
    let records: Vec<SensorRecord> = (1..=12).map(SensorRecord::new).collect();
    let all = || filter_records(&records, "");

    let page = paginate(all(), 5, 1);
    assert_eq!(page.page_count, 3);
    assert_eq!(page.items.len(), 5);

    let last = paginate(all(), 5, 3);
    assert_eq!(last.items.len(), 2);
    assert_eq!(ids(&last.items), [11, 12].map(RecordId::Number).to_vec());

    let clamped = paginate(all(), 5, 10);
    assert_eq!(clamped.page, 3);
    assert_eq!(clamped.items, last.items);

    let below = paginate(all(), 5, 0);
    assert_eq!(below.page, 1);
}

#[test]
fn empty_collection_has_no_pages_but_reports_first_page() {
    let page = paginate(Vec::new(), 5, 4);
    assert_eq!(page.page_count, 0);
    assert_eq!(page.page, 1);
    assert!(page.items.is_empty());
}

#[test]
fn projection_filters_before_sorting_and_paging() {
    let records = vec![
        reading(1, Some(30.0), "Room 23"),
        reading(2, Some(10.0), "Room 23"),
        reading(3, Some(5.0), "Hall"),
        reading(4, Some(20.0), "Room 23"),
    ];
    let query = ViewQuery {
        search: "room".into(),
        sort: Some(SortSpec::ascending(RecordField::Temperature)),
        page_size: 2,
        page: 2,
    };

    let page = project(&records, &query);
    assert_eq!(page.total, 3);
    assert_eq!(page.page_count, 2);
    assert_eq!(ids(&page.items), vec![RecordId::Number(1)]);
    // Stored order untouched.
    assert_eq!(records[0].id, RecordId::Number(1));
}
