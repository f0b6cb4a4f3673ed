use notestore_core::{
    default_notes, FilterCondition, FilterOperator, ListQuery, Note, QueryEngine, QueryError,
    SortKey,
};

fn sample_notes() -> Vec<Note> {
    vec![
        Note::new(1, "Grocery List Item", "Buy more coffee."),
        Note::new(2, "Personal Goal", "Finish reading the book."),
        Note::new(3, "Work goal", "Ship the release."),
        Note::new(4, "Groceries again", "Buy tea."),
        Note::new(5, "Personal Goal", "Run a marathon."),
        Note::new(6, "Reading list", "Three novels."),
    ]
}

fn ids(notes: &[Note]) -> Vec<i64> {
    notes.iter().map(|note| note.id).collect()
}

#[test]
fn title_contains_goal_matches_seed_example() {
    let query = ListQuery::new()
        .filter(FilterCondition::contains("title", "goal"))
        .page(0, 10);
    let page = QueryEngine::default().run(&default_notes(), &query).unwrap();

    assert_eq!(page.total_count, 1);
    assert_eq!(page.items, vec![default_notes()[1].clone()]);
}

#[test]
fn filters_combine_with_and_and_never_grow_the_set() {
    let records = sample_notes();
    let engine = QueryEngine::default();
    let conditions = vec![
        FilterCondition::contains("title", "goal"),
        FilterCondition::new("text", FilterOperator::StartsWith, "finish"),
    ];

    let rows = engine.filter(&records, &conditions).unwrap();
    assert!(rows.len() <= records.len());
    assert_eq!(rows.iter().map(|note| note.id).collect::<Vec<_>>(), vec![2]);

    for condition in &conditions {
        let single = engine.filter(&records, std::slice::from_ref(condition)).unwrap();
        assert!(single.len() >= rows.len());
        assert!(single.len() <= records.len());
    }
}

#[test]
fn ends_with_ignores_case() {
    let records = sample_notes();
    let condition = FilterCondition::new("text", FilterOperator::EndsWith, "BOOK.");
    let rows = QueryEngine::default().filter(&records, &[condition]).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, 2);
}

#[test]
fn total_count_is_independent_of_page_window() {
    let records = sample_notes();
    let engine = QueryEngine::default();
    let base = ListQuery::new().filter(FilterCondition::contains("text", "buy"));

    for page_size in 1..=4 {
        for page_index in 0..4 {
            let page = engine
                .run(&records, &base.clone().page(page_index, page_size))
                .unwrap();
            assert_eq!(page.total_count, 2);
            assert!(page.items.len() <= page_size);
        }
    }
}

#[test]
fn pages_concatenate_to_the_full_sorted_set() {
    let records = sample_notes();
    let engine = QueryEngine::default();
    let sort = SortKey::asc("title");

    let full = engine
        .run(&records, &ListQuery::new().sort(sort.clone()).page(0, 100))
        .unwrap();
    let mut stitched = Vec::new();
    for page_index in 0..3 {
        let page = engine
            .run(
                &records,
                &ListQuery::new().sort(sort.clone()).page(page_index, 2),
            )
            .unwrap();
        stitched.extend(page.items);
    }
    assert_eq!(ids(&stitched), ids(&full.items));
}

#[test]
fn equal_sort_keys_keep_store_order() {
    let records = sample_notes();
    let page = QueryEngine::default()
        .run(
            &records,
            &ListQuery::new().sort(SortKey::desc("title")).page(0, 100),
        )
        .unwrap();

    // Both "Personal Goal" notes tie and keep their relative store order.
    let positions: Vec<_> = page
        .items
        .iter()
        .filter(|note| note.title == "Personal Goal")
        .map(|note| note.id)
        .collect();
    assert_eq!(positions, vec![2, 5]);
    assert_eq!(ids(&page.items), vec![3, 6, 2, 5, 1, 4]);
}

#[test]
fn empty_sort_spec_preserves_filtered_order() {
    let records = sample_notes();
    let page = QueryEngine::default()
        .run(&records, &ListQuery::new().page(0, 100))
        .unwrap();
    assert_eq!(ids(&page.items), ids(&records));
}

#[test]
fn less_than_on_text_field_with_number_is_a_type_mismatch() {
    let records = sample_notes();
    let condition = FilterCondition::new("text", FilterOperator::LessThan, 10_i64);
    let err = QueryEngine::default()
        .run(&records, &ListQuery::new().filter(condition))
        .unwrap_err();
    assert!(matches!(err, QueryError::DataTypeMismatch { ref field, .. } if field == "text"));
}

#[test]
fn query_deserializes_from_data_grid_shape() {
    let query: ListQuery = serde_json::from_value(serde_json::json!({
        "filter": [{ "field": "id", "operator": ">", "value": 3 }],
        "sort": [{ "field": "id", "sort": "desc" }],
        "page": { "page": 0, "pageSize": 2 }
    }))
    .unwrap();

    let page = QueryEngine::default().run(&sample_notes(), &query).unwrap();
    assert_eq!(ids(&page.items), vec![6, 5]);
    assert_eq!(page.total_count, 3);

    let wire = serde_json::to_value(&page).unwrap();
    assert_eq!(wire["totalCount"], 3);
    assert_eq!(wire["items"][0]["id"], 6);
}
