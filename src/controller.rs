//! Headless application state. The controller owns the record and collection
//! snapshots, the active view and the write flow, and exposes the operations
//! the terminal front-end triggers. It never draws anything, which keeps the
//! whole navigation model testable against an in-memory store.

use std::time::{Duration, Instant};

use rusqlite::Connection;
use thiserror::Error;
use tracing::{debug, info};

use crate::catalog::create_manual_entry;
use crate::db::{
    add_collection, delete_record, generate_id, load_collections, load_records, upsert_record,
};
use crate::models::{MediaType, Record, SearchResult, Stats, StatsRange, TypeFilter};
use crate::query::{self, today};

/// Entries shown in the monthly best list.
pub const MONTHLY_BEST_LIMIT: usize = 5;

/// Named views. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Home,
    LocalSearch,
    WriteSearch,
    WriteRating,
    WriteReview,
    Detail,
}

/// User-facing validation failures. The front-end shows these as error
/// toasts and leaves the state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FlowError {
    #[error("Pick a title first.")]
    NoSelection,
    #[error("Choose a star rating first.")]
    NoRating,
    #[error("No record is open.")]
    NoRecord,
    #[error("Collection name is required.")]
    EmptyCollectionName,
}

/// What a successful save did.
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    Created(Record),
    Updated(Record),
}

/// A catalog search the front-end should run in the background.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
    pub search_type: TypeFilter,
}

/// Results for a [`SearchTicket`], handed back to [`AppState::apply_search_response`].
#[derive(Debug, Clone)]
pub struct SearchResponse {
    pub seq: u64,
    pub query: String,
    pub results: Vec<SearchResult>,
}

/// Debounce timer plus a monotonically increasing request counter. Only the
/// response to the most recently issued request is ever applied.
#[derive(Debug)]
pub struct SearchSequencer {
    latest: u64,
    debounce: Duration,
    pending_since: Option<Instant>,
}

impl SearchSequencer {
    pub fn new(debounce: Duration) -> Self {
        Self {
            latest: 0,
            debounce,
            pending_since: None,
        }
    }

    /// Restart the quiet period; called on every keystroke.
    pub fn schedule(&mut self, now: Instant) {
        self.pending_since = Some(now);
    }

    pub fn cancel_pending(&mut self) {
        self.pending_since = None;
    }

    pub fn has_pending(&self) -> bool {
        self.pending_since.is_some()
    }

    /// Consume the pending request once its quiet period has elapsed.
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending_since {
            Some(since) if now.saturating_duration_since(since) >= self.debounce => {
                self.pending_since = None;
                true
            }
            _ => false,
        }
    }

    /// Allocate the next sequence number. Anything issued earlier becomes
    /// stale.
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// Make every in-flight request stale and drop the pending one.
    pub fn invalidate(&mut self) {
        self.latest += 1;
        self.pending_since = None;
    }

    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

/// Transient state of the create/edit sequence.
#[derive(Debug, Clone, Default)]
pub struct WriteFlow {
    pub query: String,
    pub search_type: TypeFilter,
    pub results: Vec<SearchResult>,
    /// A request is in flight for the current query.
    pub searching: bool,
    /// Query whose results are currently shown.
    pub searched_query: Option<String>,
    pub selected: Option<SearchResult>,
    /// 0 until the user picks at least one star.
    pub rating: f64,
    /// Id of the record being edited; `None` for a new record.
    pub editing_id: Option<String>,
    pub note: String,
    pub tags: Vec<String>,
    /// Date the record will carry (`YYYY-MM-DD`).
    pub date: String,
    /// Note, tags and date were filled in on the first visit to the review
    /// step; later visits keep the draft.
    pub review_prefilled: bool,
}

/// Explicit application state driven by the front-end.
pub struct AppState {
    conn: Connection,
    pub view: View,
    pub records: Vec<Record>,
    pub collections: Vec<String>,
    pub range: StatsRange,
    pub best_filter: TypeFilter,
    pub local_query: String,
    pub local_results: Vec<Record>,
    pub detail_id: Option<String>,
    pub write: WriteFlow,
    search: SearchSequencer,
}

impl AppState {
    /// Hydrate from the stores and land on the home view.
    pub fn new(conn: Connection, debounce: Duration) -> Self {
        let mut state = Self {
            conn,
            view: View::Home,
            records: Vec::new(),
            collections: Vec::new(),
            range: StatsRange::default(),
            best_filter: TypeFilter::default(),
            local_query: String::new(),
            local_results: Vec::new(),
            detail_id: None,
            write: WriteFlow::default(),
            search: SearchSequencer::new(debounce),
        };
        state.show(View::Home);
        state
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Switch views, running the enter hook of the target view. Rating and
    /// review redirect to the search step when nothing is selected.
    pub fn show(&mut self, view: View) {
        match view {
            View::Home => self.reload(),
            View::LocalSearch => self.refresh_local_search(),
            View::WriteSearch => self.reset_write_flow(),
            View::WriteRating => {
                if self.write.selected.is_none() {
                    return self.show(View::WriteSearch);
                }
            }
            View::WriteReview => {
                if self.write.selected.is_none() {
                    return self.show(View::WriteSearch);
                }
                if !self.write.review_prefilled {
                    self.prefill_review();
                }
            }
            View::Detail => {
                if self.current_record().is_none() {
                    return self.show(View::Home);
                }
            }
        }
        debug!(?view, "view changed");
        self.view = view;
    }

    /// Re-read both stores.
    pub fn reload(&mut self) {
        self.records = load_records(&self.conn);
        self.collections = load_collections(&self.conn);
    }

    pub fn stats(&self) -> Stats {
        query::stats_now(&self.records, self.range)
    }

    pub fn monthly_best(&self) -> Vec<Record> {
        query::monthly_best_now(&self.records, self.best_filter, MONTHLY_BEST_LIMIT)
    }

    pub fn cycle_range(&mut self) -> StatsRange {
        self.range = self.range.next();
        self.range
    }

    pub fn cycle_best_filter(&mut self) -> TypeFilter {
        self.best_filter = self.best_filter.next();
        self.best_filter
    }

    pub fn add_collection(&mut self, name: &str) -> Result<bool, FlowError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(FlowError::EmptyCollectionName);
        }
        let before = self.collections.len();
        self.collections = add_collection(&self.conn, name);
        Ok(self.collections.len() > before)
    }

    /// Jump to the local search with a collection name as the query.
    pub fn open_collection(&mut self, name: &str) {
        self.local_query = name.to_string();
        self.show(View::LocalSearch);
    }

    pub fn set_local_query(&mut self, query: String) {
        self.local_query = query;
        self.refresh_local_search();
    }

    fn refresh_local_search(&mut self) {
        self.local_results = query::search(&self.records, &self.local_query, TypeFilter::All);
    }

    pub fn open_detail(&mut self, id: &str) -> Result<(), FlowError> {
        if !self.records.iter().any(|r| r.id == id) {
            return Err(FlowError::NoRecord);
        }
        self.detail_id = Some(id.to_string());
        self.show(View::Detail);
        Ok(())
    }

    pub fn current_record(&self) -> Option<&Record> {
        let id = self.detail_id.as_deref()?;
        self.records.iter().find(|r| r.id == id)
    }

    /// Delete the record shown in the detail view and go home.
    pub fn delete_current(&mut self) -> Result<Record, FlowError> {
        let record = self.current_record().cloned().ok_or(FlowError::NoRecord)?;
        delete_record(&self.conn, &record.id);
        info!(id = %record.id, "deleted record");
        self.detail_id = None;
        self.show(View::Home);
        Ok(record)
    }

    /// Re-enter the write flow at the rating step for the open record.
    pub fn begin_edit(&mut self) -> Result<(), FlowError> {
        let record = self.current_record().cloned().ok_or(FlowError::NoRecord)?;
        self.search.invalidate();
        self.write = WriteFlow {
            selected: Some(SearchResult::from(&record)),
            rating: record.rating,
            editing_id: Some(record.id.clone()),
            ..WriteFlow::default()
        };
        self.show(View::WriteRating);
        Ok(())
    }

    fn reset_write_flow(&mut self) {
        self.search.invalidate();
        self.write = WriteFlow::default();
    }

    /// Record a keystroke in the catalog query. A blank query clears the
    /// results right away; anything else restarts the debounce timer.
    pub fn edit_write_query(&mut self, query: String, now: Instant) {
        self.write.query = query;
        if self.write.query.trim().is_empty() {
            self.search.invalidate();
            self.write.results.clear();
            self.write.searching = false;
            self.write.searched_query = None;
        } else {
            self.search.schedule(now);
        }
    }

    /// Fire the debounced search once its quiet period is over.
    pub fn poll_debounce(&mut self, now: Instant) -> Option<SearchTicket> {
        if self.search.take_due(now) {
            self.issue_search()
        } else {
            None
        }
    }

    /// Search immediately, dropping any pending debounced request.
    pub fn submit_write_search(&mut self) -> Option<SearchTicket> {
        self.search.cancel_pending();
        self.issue_search()
    }

    /// Whether Enter should submit the query rather than pick a result.
    pub fn write_query_is_stale(&self) -> bool {
        let query = self.write.query.trim();
        !query.is_empty()
            && (self.search.has_pending()
                || (self.write.searched_query.as_deref() != Some(query) && !self.write.searching))
    }

    fn issue_search(&mut self) -> Option<SearchTicket> {
        let query = self.write.query.trim().to_string();
        if query.is_empty() {
            return None;
        }
        let seq = self.search.issue();
        self.write.searching = true;
        debug!(seq, %query, "catalog search issued");
        Some(SearchTicket {
            seq,
            query,
            search_type: self.write.search_type,
        })
    }

    /// Apply catalog results unless a newer request has been issued since.
    /// Returns whether the response was used.
    pub fn apply_search_response(&mut self, response: SearchResponse) -> bool {
        if !self.search.is_current(response.seq) {
            debug!(seq = response.seq, "discarding stale search response");
            return false;
        }
        self.write.searching = false;
        self.write.searched_query = Some(response.query);
        self.write.results = response.results;
        true
    }

    /// Rotate the catalog filter and search again when there is a query.
    pub fn cycle_search_type(&mut self) -> Option<SearchTicket> {
        self.write.search_type = self.write.search_type.next();
        if self.write.query.trim().is_empty() {
            None
        } else {
            self.submit_write_search()
        }
    }

    /// Selectable rows for the search step: catalog hits, or manual-entry
    /// options once a search for a non-blank query came back empty.
    pub fn write_candidates(&self) -> Vec<SearchResult> {
        if !self.write.results.is_empty() {
            return self.write.results.clone();
        }
        let query = match self.write.searched_query.as_deref() {
            Some(q) if !q.trim().is_empty() && !self.write.searching => q,
            _ => return Vec::new(),
        };
        let mut manual = Vec::new();
        if matches!(self.write.search_type, TypeFilter::All | TypeFilter::Movie) {
            manual.push(create_manual_entry(query, MediaType::Movie, ""));
        }
        if matches!(self.write.search_type, TypeFilter::All | TypeFilter::Book) {
            manual.push(create_manual_entry(query, MediaType::Book, ""));
        }
        manual
    }

    pub fn select_item(&mut self, item: SearchResult) {
        debug!(title = %item.title, kind = %item.kind, "selected item");
        self.write.selected = Some(item);
    }

    /// Move from the search step to the rating step.
    pub fn advance_to_rating(&mut self) -> Result<(), FlowError> {
        if self.write.selected.is_none() {
            return Err(FlowError::NoSelection);
        }
        self.show(View::WriteRating);
        Ok(())
    }

    pub fn set_rating(&mut self, stars: u8) {
        self.write.rating = f64::from(stars.min(5));
    }

    /// Step the rating by whole stars, staying within 1..=5.
    pub fn adjust_rating(&mut self, delta: i8) {
        let next = (self.write.rating.floor() as i64 + i64::from(delta)).clamp(1, 5);
        self.write.rating = next as f64;
    }

    /// Move from the rating step to the review step.
    pub fn advance_to_review(&mut self) -> Result<(), FlowError> {
        if self.write.rating <= 0.0 {
            return Err(FlowError::NoRating);
        }
        self.show(View::WriteReview);
        Ok(())
    }

    /// Leave the review step for the rating step without losing anything.
    pub fn back_to_rating(&mut self) {
        if self.write.selected.is_some() {
            self.view = View::WriteRating;
        }
    }

    fn prefill_review(&mut self) {
        let existing = self
            .write
            .editing_id
            .as_deref()
            .and_then(|id| self.records.iter().find(|r| r.id == id))
            .cloned();

        match existing {
            Some(record) => {
                self.write.note = record.note;
                self.write.tags = record.tags;
                self.write.date = if query::parse_record_date(&record.date).is_some() {
                    record.date
                } else {
                    today_iso()
                };
            }
            None => {
                self.write.note.clear();
                self.write.tags.clear();
                self.write.date = today_iso();
            }
        }
        self.write.review_prefilled = true;
    }

    /// Persist the write flow, add its tags as collections and go home.
    pub fn save_record(&mut self, note: &str, tags: Vec<String>) -> Result<SaveOutcome, FlowError> {
        let item = self.write.selected.clone().ok_or(FlowError::NoSelection)?;
        if self.write.rating <= 0.0 {
            return Err(FlowError::NoRating);
        }

        let editing = self.write.editing_id.clone();
        let date = if self.write.date.trim().is_empty() {
            today_iso()
        } else {
            self.write.date.clone()
        };
        let record = Record {
            id: editing.clone().unwrap_or_else(generate_id),
            title: item.title,
            kind: item.kind,
            year: item.year,
            thumbnail: item.thumbnail,
            author: item.author.filter(|a| !a.trim().is_empty()),
            rating: self.write.rating,
            date,
            note: note.trim().to_string(),
            tags: dedupe_tags(tags),
            created_at: None,
            updated_at: None,
        };

        let stored = upsert_record(&self.conn, record);
        for tag in &stored.tags {
            add_collection(&self.conn, tag);
        }
        info!(id = %stored.id, updated = editing.is_some(), "saved record");

        self.detail_id = None;
        self.show(View::Home);
        self.search.invalidate();
        self.write = WriteFlow::default();

        Ok(match editing {
            Some(_) => SaveOutcome::Updated(stored),
            None => SaveOutcome::Created(stored),
        })
    }
}

/// Split a comma-separated tag line, trimming blanks and duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    dedupe_tags(raw.split(',').map(str::to_string).collect())
}

fn dedupe_tags(tags: Vec<String>) -> Vec<String> {
    let mut unique: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if !tag.is_empty() && !unique.iter().any(|t| t == tag) {
            unique.push(tag.to_string());
        }
    }
    unique
}

fn today_iso() -> String {
    today().format("%Y-%m-%d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ensure_schema;

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn state() -> AppState {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();
        AppState::new(conn, DEBOUNCE)
    }

    fn hit(title: &str, kind: MediaType) -> SearchResult {
        SearchResult {
            id: format!("cat-{title}"),
            title: title.to_string(),
            year: "1999".to_string(),
            author: Some("Someone".to_string()),
            thumbnail: Some("https://img.example/x.jpg".to_string()),
            description: None,
            kind,
            is_manual: false,
        }
    }

    fn save_new(state: &mut AppState, title: &str, stars: u8, tags: &[&str]) -> Record {
        state.show(View::WriteSearch);
        state.select_item(hit(title, MediaType::Movie));
        state.advance_to_rating().unwrap();
        state.set_rating(stars);
        state.advance_to_review().unwrap();
        let tags = tags.iter().map(|t| t.to_string()).collect();
        match state.save_record("great", tags).unwrap() {
            SaveOutcome::Created(record) => record,
            other => panic!("expected a new record, got {other:?}"),
        }
    }

    #[test]
    fn starts_on_home() {
        let state = state();
        assert_eq!(state.view, View::Home);
        assert!(state.records.is_empty());
    }

    #[test]
    fn entering_write_search_resets_everything() {
        let mut state = state();
        state.show(View::WriteSearch);
        state.write.query = "dune".to_string();
        state.cycle_search_type();
        state.select_item(hit("Dune", MediaType::Book));
        state.set_rating(4);

        state.show(View::WriteSearch);
        assert!(state.write.selected.is_none());
        assert_eq!(state.write.rating, 0.0);
        assert_eq!(state.write.search_type, TypeFilter::All);
        assert!(state.write.query.is_empty());
    }

    #[test]
    fn rating_and_review_redirect_without_selection() {
        let mut state = state();
        state.show(View::WriteRating);
        assert_eq!(state.view, View::WriteSearch);

        state.show(View::WriteReview);
        assert_eq!(state.view, View::WriteSearch);
    }

    #[test]
    fn rating_is_required_before_review_and_save() {
        let mut state = state();
        state.show(View::WriteSearch);
        assert_eq!(state.advance_to_rating(), Err(FlowError::NoSelection));

        state.select_item(hit("Heat", MediaType::Movie));
        state.advance_to_rating().unwrap();
        assert_eq!(state.advance_to_review(), Err(FlowError::NoRating));
        assert_eq!(state.view, View::WriteRating);
        assert_eq!(
            state.save_record("", Vec::new()).unwrap_err(),
            FlowError::NoRating
        );
        assert!(state.records.is_empty());
    }

    #[test]
    fn save_without_selection_is_rejected() {
        let mut state = state();
        state.write.rating = 3.0;
        assert_eq!(
            state.save_record("", Vec::new()).unwrap_err(),
            FlowError::NoSelection
        );
    }

    #[test]
    fn saving_creates_record_adds_collections_and_goes_home() {
        let mut state = state();
        let record = save_new(&mut state, "Heat", 5, &["crime", " noir ", "crime", ""]);

        assert_eq!(state.view, View::Home);
        assert_eq!(state.records.len(), 1);
        assert_eq!(state.records[0].id, record.id);
        assert_eq!(record.rating, 5.0);
        assert_eq!(record.tags, vec!["crime", "noir"]);
        assert_eq!(record.note, "great");
        assert_eq!(record.date, today_iso());
        assert_eq!(state.collections, vec!["crime", "noir"]);
        assert!(state.write.selected.is_none());
    }

    #[test]
    fn edit_flow_prefills_and_updates_in_place() {
        let mut state = state();
        let original = save_new(&mut state, "Heat", 3, &["crime"]);
        save_new(&mut state, "Ronin", 4, &[]);

        state.open_detail(&original.id).unwrap();
        assert_eq!(state.view, View::Detail);
        state.begin_edit().unwrap();
        assert_eq!(state.view, View::WriteRating);
        assert_eq!(state.write.rating, 3.0);
        assert_eq!(state.write.selected.as_ref().unwrap().title, "Heat");

        state.set_rating(5);
        state.advance_to_review().unwrap();
        assert_eq!(state.write.note, "great");
        assert_eq!(state.write.tags, vec!["crime"]);

        let outcome = state
            .save_record("even better", vec!["crime".to_string(), "la".to_string()])
            .unwrap();
        let updated = match outcome {
            SaveOutcome::Updated(record) => record,
            other => panic!("expected an update, got {other:?}"),
        };
        assert_eq!(updated.id, original.id);
        assert_eq!(updated.created_at, original.created_at);
        assert_eq!(state.records.len(), 2);
        let stored = state.records.iter().find(|r| r.id == original.id).unwrap();
        assert_eq!(stored.rating, 5.0);
        assert_eq!(stored.note, "even better");
    }

    #[test]
    fn review_for_new_record_starts_blank() {
        let mut state = state();
        state.write.note = "left over".to_string();
        state.select_item(hit("Heat", MediaType::Movie));
        state.set_rating(2);
        state.show(View::WriteReview);
        assert!(state.write.note.is_empty());
        assert_eq!(state.write.date, today_iso());
    }

    #[test]
    fn review_draft_survives_a_trip_back_to_rating() {
        let mut state = state();
        state.show(View::WriteSearch);
        state.select_item(hit("Heat", MediaType::Movie));
        state.advance_to_rating().unwrap();
        state.set_rating(3);
        state.advance_to_review().unwrap();

        state.write.note = "my draft".to_string();
        state.write.tags = vec!["crime".to_string()];
        state.back_to_rating();
        assert_eq!(state.view, View::WriteRating);
        state.set_rating(4);
        state.advance_to_review().unwrap();

        assert_eq!(state.write.note, "my draft");
        assert_eq!(state.write.tags, vec!["crime"]);

        state.show(View::WriteSearch);
        state.select_item(hit("Ronin", MediaType::Movie));
        state.set_rating(2);
        state.show(View::WriteReview);
        assert!(state.write.note.is_empty());
    }

    #[test]
    fn delete_from_detail_goes_home() {
        let mut state = state();
        let record = save_new(&mut state, "Heat", 3, &[]);
        state.open_detail(&record.id).unwrap();

        let removed = state.delete_current().unwrap();
        assert_eq!(removed.id, record.id);
        assert_eq!(state.view, View::Home);
        assert!(state.records.is_empty());
        assert_eq!(state.delete_current().unwrap_err(), FlowError::NoRecord);
    }

    #[test]
    fn unknown_detail_id_is_rejected() {
        let mut state = state();
        assert_eq!(state.open_detail("nope"), Err(FlowError::NoRecord));
        assert_eq!(state.view, View::Home);
    }

    #[test]
    fn collections_open_local_search() {
        let mut state = state();
        save_new(&mut state, "Heat", 3, &["crime"]);
        save_new(&mut state, "Amélie", 5, &["paris"]);

        state.open_collection("crime");
        assert_eq!(state.view, View::LocalSearch);
        assert_eq!(state.local_results.len(), 1);
        assert_eq!(state.local_results[0].title, "Heat");

        state.set_local_query(String::new());
        assert_eq!(state.local_results.len(), 2);
    }

    #[test]
    fn add_collection_validates_and_deduplicates() {
        let mut state = state();
        assert_eq!(state.add_collection("  "), Err(FlowError::EmptyCollectionName));
        assert_eq!(state.add_collection("sf"), Ok(true));
        assert_eq!(state.add_collection(" sf "), Ok(false));
        assert_eq!(state.collections, vec!["sf"]);
    }

    #[test]
    fn debounce_fires_only_after_quiet_period() {
        let mut state = state();
        state.show(View::WriteSearch);
        let start = Instant::now();

        state.edit_write_query("du".to_string(), start);
        state.edit_write_query("dun".to_string(), start + Duration::from_millis(300));
        assert!(state.poll_debounce(start + Duration::from_millis(600)).is_none());

        let ticket = state
            .poll_debounce(start + Duration::from_millis(800))
            .expect("debounced search should fire");
        assert_eq!(ticket.query, "dun");
        assert!(state.write.searching);
        assert!(state.poll_debounce(start + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn submit_bypasses_and_cancels_debounce() {
        let mut state = state();
        state.show(View::WriteSearch);
        let start = Instant::now();

        state.edit_write_query("alien".to_string(), start);
        assert!(state.write_query_is_stale());
        let ticket = state.submit_write_search().unwrap();
        assert_eq!(ticket.query, "alien");
        assert!(state.poll_debounce(start + Duration::from_secs(1)).is_none());
    }

    #[test]
    fn stale_responses_are_discarded() {
        let mut state = state();
        state.show(View::WriteSearch);
        state.edit_write_query("ali".to_string(), Instant::now());
        let first = state.submit_write_search().unwrap();
        state.edit_write_query("alien".to_string(), Instant::now());
        let second = state.submit_write_search().unwrap();
        assert!(second.seq > first.seq);

        let applied = state.apply_search_response(SearchResponse {
            seq: second.seq,
            query: second.query.clone(),
            results: vec![hit("Alien", MediaType::Movie)],
        });
        assert!(applied);

        let late = state.apply_search_response(SearchResponse {
            seq: first.seq,
            query: first.query,
            results: vec![hit("Ali", MediaType::Movie)],
        });
        assert!(!late);
        assert_eq!(state.write.results.len(), 1);
        assert_eq!(state.write.results[0].title, "Alien");
        assert!(!state.write.searching);
        assert!(!state.write_query_is_stale());
    }

    #[test]
    fn reset_invalidates_in_flight_searches() {
        let mut state = state();
        state.show(View::WriteSearch);
        state.edit_write_query("heat".to_string(), Instant::now());
        let ticket = state.submit_write_search().unwrap();

        state.show(View::WriteSearch);
        assert!(!state.apply_search_response(SearchResponse {
            seq: ticket.seq,
            query: ticket.query,
            results: vec![hit("Heat", MediaType::Movie)],
        }));
        assert!(state.write.results.is_empty());
    }

    #[test]
    fn blank_query_clears_results_without_searching() {
        let mut state = state();
        state.show(View::WriteSearch);
        state.write.results = vec![hit("Heat", MediaType::Movie)];
        state.edit_write_query("   ".to_string(), Instant::now());
        assert!(state.write.results.is_empty());
        assert!(state.submit_write_search().is_none());
    }

    #[test]
    fn empty_results_offer_manual_entries_per_type() {
        let mut state = state();
        state.show(View::WriteSearch);
        state.edit_write_query("Home Video".to_string(), Instant::now());
        let ticket = state.submit_write_search().unwrap();
        state.apply_search_response(SearchResponse {
            seq: ticket.seq,
            query: ticket.query,
            results: Vec::new(),
        });

        let candidates = state.write_candidates();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.is_manual));
        assert_eq!(candidates[0].kind, MediaType::Movie);
        assert_eq!(candidates[1].kind, MediaType::Book);

        let retry = state.cycle_search_type().unwrap();
        assert_eq!(retry.search_type, TypeFilter::Movie);
        state.apply_search_response(SearchResponse {
            seq: retry.seq,
            query: retry.query,
            results: Vec::new(),
        });
        let candidates = state.write_candidates();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, MediaType::Movie);
    }

    #[test]
    fn rating_adjustment_stays_in_bounds() {
        let mut state = state();
        state.adjust_rating(-1);
        assert_eq!(state.write.rating, 1.0);
        state.set_rating(5);
        state.adjust_rating(1);
        assert_eq!(state.write.rating, 5.0);
        state.set_rating(9);
        assert_eq!(state.write.rating, 5.0);
    }

    #[test]
    fn parse_tags_trims_and_dedupes() {
        assert_eq!(parse_tags(" a, b ,,a, c "), vec!["a", "b", "c"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn home_queries_follow_filters() {
        let mut state = state();
        save_new(&mut state, "Heat", 3, &[]);
        assert_eq!(state.stats().movies, 1);
        assert_eq!(state.monthly_best().len(), 1);

        assert_eq!(state.cycle_best_filter(), TypeFilter::Movie);
        assert_eq!(state.cycle_best_filter(), TypeFilter::Book);
        assert!(state.monthly_best().is_empty());

        assert_eq!(state.cycle_range(), StatsRange::Month);
        assert_eq!(state.stats().total, 1);
    }
}
