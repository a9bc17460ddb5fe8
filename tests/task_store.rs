use chrono::NaiveDate;
use taskman::{Priority, StoreError, StoredPriority, TaskDraft, TaskStore, ValidationError};

fn date(text: &str) -> NaiveDate {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").unwrap()
}

fn draft(title: &str, priority: Priority, deadline: Option<&str>) -> TaskDraft {
    let mut draft = TaskDraft::new(title);
    draft.priority = priority;
    draft.deadline = deadline.map(date);
    draft
}

fn task_count(store: &TaskStore) -> i64 {
    store
        .database()
        .conn()
        .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
        .unwrap()
}

fn listed_ids(store: &TaskStore, search: Option<&str>) -> Vec<i64> {
    store.list(search).unwrap().iter().map(|t| t.id).collect()
}

#[test]
fn create_and_get_roundtrip() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut input = draft("  Pay rent  ", Priority::High, Some("2024-06-01"));
    input.description = Some("landlord wants it by the 1st".to_string());

    let id = store.create(&input).unwrap();
    let task = store.get_by_id(id).unwrap().unwrap();

    assert_eq!(task.id, id);
    assert_eq!(task.title, "Pay rent");
    assert_eq!(task.description.as_deref(), Some("landlord wants it by the 1st"));
    assert_eq!(task.priority, Priority::High);
    assert_eq!(task.deadline, Some(date("2024-06-01")));
    assert!(!task.completed);
}

#[test]
fn create_applies_defaults() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&TaskDraft::new("Water plants")).unwrap();
    let task = store.get_by_id(id).unwrap().unwrap();

    assert_eq!(task.priority, Priority::Medium);
    assert_eq!(task.description, None);
    assert_eq!(task.deadline, None);
    assert!(!task.completed);
}

#[test]
fn create_with_blank_title_fails_without_writing() {
    let store = TaskStore::open_in_memory().unwrap();
    for title in ["", "   ", "\t\n"] {
        let err = store.create(&TaskDraft::new(title)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(ValidationError::EmptyTitle)));
        assert!(err.is_validation());
    }
    assert_eq!(task_count(&store), 0);
}

#[test]
fn ids_increase_monotonically() {
    let store = TaskStore::open_in_memory().unwrap();
    let a = store.create(&TaskDraft::new("a")).unwrap();
    let b = store.create(&TaskDraft::new("b")).unwrap();
    let c = store.create(&TaskDraft::new("c")).unwrap();
    assert!(a < b && b < c);
}

#[test]
fn get_missing_id_returns_none() {
    let store = TaskStore::open_in_memory().unwrap();
    assert!(store.get_by_id(99).unwrap().is_none());
}

#[test]
fn update_roundtrip_leaves_identity_fields_untouched() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store
        .create(&draft("Draft essay", Priority::Low, Some("2024-03-01")))
        .unwrap();
    store.toggle_completion(id).unwrap();
    let before = store.get_by_id(id).unwrap().unwrap();

    let mut changes = draft(" Final essay ", Priority::High, Some("2024-02-15"));
    changes.description = Some("submit via portal".to_string());
    store.update(id, &changes).unwrap();

    let after = store.get_by_id(id).unwrap().unwrap();
    assert_eq!(after.title, "Final essay");
    assert_eq!(after.description.as_deref(), Some("submit via portal"));
    assert_eq!(after.priority, Priority::High);
    assert_eq!(after.deadline, Some(date("2024-02-15")));
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.completed, before.completed);
}

#[test]
fn update_can_clear_optional_fields() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut input = draft("Call bank", Priority::Medium, Some("2024-01-10"));
    input.description = Some("about the card".to_string());
    let id = store.create(&input).unwrap();

    store.update(id, &TaskDraft::new("Call bank")).unwrap();
    let task = store.get_by_id(id).unwrap().unwrap();
    assert_eq!(task.description, None);
    assert_eq!(task.deadline, None);
}

#[test]
fn update_missing_id_is_not_found_and_changes_nothing() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&TaskDraft::new("existing")).unwrap();
    let before = store.list(None).unwrap();

    let err = store.update(id + 1, &TaskDraft::new("ghost")).unwrap_err();
    assert!(matches!(err, StoreError::NotFound(missing) if missing == id + 1));
    assert_eq!(store.list(None).unwrap(), before);
}

#[test]
fn update_with_blank_title_is_rejected() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&TaskDraft::new("keep")).unwrap();

    let err = store.update(id, &TaskDraft::new("  ")).unwrap_err();
    assert!(err.is_validation());
    assert_eq!(store.get_by_id(id).unwrap().unwrap().title, "keep");
}

#[test]
fn toggle_twice_restores_original_state() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&TaskDraft::new("stretch")).unwrap();

    assert!(store.toggle_completion(id).unwrap());
    assert!(store.get_by_id(id).unwrap().unwrap().completed);
    assert!(!store.toggle_completion(id).unwrap());
    assert!(!store.get_by_id(id).unwrap().unwrap().completed);
}

#[test]
fn toggle_missing_id_is_not_found() {
    let store = TaskStore::open_in_memory().unwrap();
    assert!(store.toggle_completion(1).unwrap_err().is_not_found());
}

#[test]
fn delete_removes_task_and_id_is_never_reused() {
    let store = TaskStore::open_in_memory().unwrap();
    store.create(&TaskDraft::new("first")).unwrap();
    let last = store.create(&TaskDraft::new("second")).unwrap();

    store.delete(last).unwrap();
    assert!(store.get_by_id(last).unwrap().is_none());

    let next = store.create(&TaskDraft::new("third")).unwrap();
    assert!(next > last);
}

#[test]
fn delete_missing_id_is_not_found() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&TaskDraft::new("only")).unwrap();
    store.delete(id).unwrap();
    assert!(matches!(store.delete(id), Err(StoreError::NotFound(_))));
}

#[test]
fn list_orders_by_priority_then_deadline() {
    let store = TaskStore::open_in_memory().unwrap();
    let a = store.create(&draft("A", Priority::High, Some("2024-05-01"))).unwrap();
    let b = store.create(&draft("B", Priority::Medium, Some("2024-01-01"))).unwrap();
    let c = store.create(&draft("C", Priority::High, Some("2024-01-01"))).unwrap();

    assert_eq!(listed_ids(&store, None), vec![c, a, b]);
}

#[test]
fn list_full_ordering_rule() {
    let store = TaskStore::open_in_memory().unwrap();
    let low_undated = store.create(&draft("l1", Priority::Low, None)).unwrap();
    let med_undated = store.create(&draft("m1", Priority::Medium, None)).unwrap();
    let med_late = store.create(&draft("m2", Priority::Medium, Some("2025-01-01"))).unwrap();
    let high_undated = store.create(&draft("h1", Priority::High, None)).unwrap();
    let med_late_twin = store.create(&draft("m3", Priority::Medium, Some("2025-01-01"))).unwrap();
    let low_dated = store.create(&draft("l2", Priority::Low, Some("2023-01-01"))).unwrap();

    assert_eq!(
        listed_ids(&store, None),
        vec![high_undated, med_late, med_late_twin, med_undated, low_dated, low_undated]
    );
}

#[test]
fn list_summaries_carry_display_fields() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&draft("Renew passport", Priority::High, Some("2024-09-09"))).unwrap();
    store.toggle_completion(id).unwrap();

    let summaries = store.list(None).unwrap();
    assert_eq!(summaries.len(), 1);
    let summary = &summaries[0];
    assert_eq!(summary.id, id);
    assert_eq!(summary.title, "Renew passport");
    assert_eq!(summary.priority, Priority::High);
    assert_eq!(summary.deadline, Some(date("2024-09-09")));
    assert!(summary.completed);
}

#[test]
fn search_filters_title_and_description_case_insensitively() {
    let store = TaskStore::open_in_memory().unwrap();
    let in_title = store.create(&draft("Project kickoff", Priority::Low, None)).unwrap();
    let mut with_desc = draft("Email Sam", Priority::High, None);
    with_desc.description = Some("re: PROJ budget".to_string());
    let in_desc = store.create(&with_desc).unwrap();
    store.create(&draft("Groceries", Priority::High, None)).unwrap();

    // Same ordering rule applies to the filtered set
    assert_eq!(listed_ids(&store, Some("proj")), vec![in_desc, in_title]);
}

#[test]
fn blank_search_lists_everything() {
    let store = TaskStore::open_in_memory().unwrap();
    store.create(&TaskDraft::new("one")).unwrap();
    store.create(&TaskDraft::new("two")).unwrap();

    assert_eq!(store.list(Some("   ")).unwrap().len(), 2);
    assert_eq!(store.list(Some("")).unwrap().len(), 2);
}

#[test]
fn search_treats_sql_wildcards_literally() {
    let store = TaskStore::open_in_memory().unwrap();
    let percent = store.create(&TaskDraft::new("Raise by 5%")).unwrap();
    store.create(&TaskDraft::new("Raise by 5 euros")).unwrap();

    assert_eq!(listed_ids(&store, Some("5%")), vec![percent]);
    assert!(store.list(Some("_")).unwrap().is_empty());
}

#[test]
fn search_with_no_matches_is_empty() {
    let store = TaskStore::open_in_memory().unwrap();
    store.create(&TaskDraft::new("something")).unwrap();
    assert!(store.list(Some("nothing like it")).unwrap().is_empty());
}

fn insert_raw(store: &TaskStore, title: &str, priority: &str, deadline: Option<&str>) -> i64 {
    let conn = store.database().conn();
    conn.execute(
        "INSERT INTO tasks (title, priority, deadline) VALUES (?1, ?2, ?3)",
        rusqlite::params![title, priority, deadline],
    )
    .unwrap();
    conn.last_insert_rowid()
}

#[test]
fn unrecognised_stored_priority_is_listed_last() {
    let store = TaskStore::open_in_memory().unwrap();
    let normal = store.create(&draft("normal", Priority::Low, None)).unwrap();
    let legacy = insert_raw(&store, "legacy", "Urgent", Some("2000-01-01"));
    let high = store.create(&draft("high", Priority::High, None)).unwrap();

    let summaries = store.list(None).unwrap();
    let ids: Vec<i64> = summaries.iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![high, normal, legacy]);
    assert_eq!(summaries[2].priority, StoredPriority::Other("Urgent".to_string()));
    assert_eq!(summaries[2].priority.rank(), 4);
}

#[test]
fn unrecognised_priority_rows_are_searchable_and_editable() {
    let store = TaskStore::open_in_memory().unwrap();
    let legacy = insert_raw(&store, "legacy report", "", None);

    assert_eq!(listed_ids(&store, Some("report")), vec![legacy]);

    store.update(legacy, &draft("legacy report", Priority::High, None)).unwrap();
    assert_eq!(store.get_by_id(legacy).unwrap().unwrap().priority, Priority::High);
}

#[test]
fn description_is_trimmed_and_blank_becomes_none() {
    let store = TaskStore::open_in_memory().unwrap();
    let mut input = TaskDraft::new("Call plumber");
    input.description = Some("  kitchen sink \n".to_string());
    let id = store.create(&input).unwrap();
    assert_eq!(
        store.get_by_id(id).unwrap().unwrap().description.as_deref(),
        Some("kitchen sink")
    );

    input.description = Some("   ".to_string());
    store.update(id, &input).unwrap();
    assert_eq!(store.get_by_id(id).unwrap().unwrap().description, None);
}

#[test]
fn failing_write_is_a_storage_error() {
    let store = TaskStore::open_in_memory().unwrap();
    let id = store.create(&TaskDraft::new("before")).unwrap();
    store
        .database()
        .conn()
        .execute("DROP TABLE tasks", [])
        .unwrap();

    let err = store.create(&TaskDraft::new("after")).unwrap_err();
    assert!(err.is_storage());
    assert!(!err.is_validation());

    assert!(store.update(id, &TaskDraft::new("x")).unwrap_err().is_storage());
    assert!(store.toggle_completion(id).unwrap_err().is_storage());
    assert!(store.delete(id).unwrap_err().is_storage());
    assert!(store.list(None).unwrap_err().is_storage());
}
