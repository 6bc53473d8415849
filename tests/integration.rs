use std::fs;
use std::time::Duration;

use media_diary::controller::{AppState, SaveOutcome, View};
use media_diary::db::{import_from_json, load_collections, load_records, open_store};
use media_diary::query::stats_now;
use media_diary::{export_to_dir, import_from_file, MediaType, SearchResult, StatsRange};

fn catalog_hit(title: &str, kind: MediaType) -> SearchResult {
    SearchResult {
        id: format!("cat-{title}"),
        title: title.to_string(),
        year: "2016".to_string(),
        author: None,
        thumbnail: None,
        description: None,
        kind,
        is_manual: false,
    }
}

fn write_entry(state: &mut AppState, title: &str, kind: MediaType, stars: u8, tags: &[&str]) {
    state.show(View::WriteSearch);
    state.select_item(catalog_hit(title, kind));
    state.advance_to_rating().unwrap();
    state.set_rating(stars);
    state.advance_to_review().unwrap();
    let tags = tags.iter().map(|t| t.to_string()).collect();
    assert!(matches!(
        state.save_record("", tags).unwrap(),
        SaveOutcome::Created(_)
    ));
}

#[test]
fn diary_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut state = AppState::new(open_store(dir.path()).unwrap(), Duration::ZERO);
        write_entry(&mut state, "Arrival", MediaType::Movie, 5, &["sf"]);
        write_entry(&mut state, "Exhalation", MediaType::Book, 4, &["sf", "stories"]);
    }

    let state = AppState::new(open_store(dir.path()).unwrap(), Duration::ZERO);
    let titles: Vec<&str> = state.records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Exhalation", "Arrival"]);
    assert_eq!(state.collections, vec!["sf", "stories"]);

    let stats = stats_now(&state.records, StatsRange::Month);
    assert_eq!(stats.books, 1);
    assert_eq!(stats.movies, 1);
    assert_eq!(stats.avg_rating, 4.5);

    let best = state.monthly_best();
    assert_eq!(best[0].title, "Arrival");
}

#[test]
fn export_then_import_into_a_fresh_store() {
    let source_dir = tempfile::tempdir().unwrap();
    let mut source = AppState::new(open_store(source_dir.path()).unwrap(), Duration::ZERO);
    write_entry(&mut source, "Heat", MediaType::Movie, 4, &["crime"]);
    write_entry(&mut source, "Dune", MediaType::Book, 5, &[]);
    source.add_collection("to read").unwrap();

    let export_dir = tempfile::tempdir().unwrap();
    let path = export_to_dir(source.connection(), export_dir.path()).unwrap();
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("movie_book_records_") && name.ends_with(".json"));

    let target_dir = tempfile::tempdir().unwrap();
    let target = open_store(target_dir.path()).unwrap();
    let summary = import_from_file(&target, &path).unwrap();
    assert_eq!(summary.records, 2);
    assert_eq!(summary.collections, 2);
    assert_eq!(load_records(&target), source.records);
    assert_eq!(load_collections(&target), vec!["crime", "to read"]);
}

#[test]
fn partial_import_leaves_other_store_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut state = AppState::new(open_store(dir.path()).unwrap(), Duration::ZERO);
    write_entry(&mut state, "Heat", MediaType::Movie, 4, &["crime"]);

    let summary = import_from_json(state.connection(), r#"{"collections": ["noir"]}"#).unwrap();
    assert_eq!(summary.collections, 1);
    state.reload();
    assert_eq!(state.records.len(), 1);
    assert_eq!(state.collections, vec!["noir"]);
}

#[test]
fn legacy_blob_with_unknown_type_still_loads() {
    let dir = tempfile::tempdir().unwrap();
    let conn = open_store(dir.path()).unwrap();
    let file = dir.path().join("old.json");
    fs::write(
        &file,
        r#"{"records": [{"id": "1", "title": "Podcast", "type": "audio", "rating": 3, "date": "2024-02-01T10:00:00.000Z"}]}"#,
    )
    .unwrap();

    import_from_file(&conn, &file).unwrap();
    let records = load_records(&conn);
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, MediaType::Unknown);
    assert!(records[0].tags.is_empty());
}
