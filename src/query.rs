//! Read-only views over a record snapshot: local search, the monthly best
//! list and range statistics. Everything here works on slices so callers can
//! pass whatever snapshot they hold; functions that depend on "today" take it
//! as an argument and have `*_now` wrappers that read the local clock.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, Local, NaiveDate};

use crate::models::{MediaType, Record, Stats, StatsRange, TypeFilter};

/// Case-insensitive substring search over title, note and comma-joined tags.
/// A blank query returns every record that passes `filter`.
pub fn search(records: &[Record], query: &str, filter: TypeFilter) -> Vec<Record> {
    let needle = query.trim().to_lowercase();
    records
        .iter()
        .filter(|record| filter.matches(record.kind))
        .filter(|record| needle.is_empty() || matches_query(record, &needle))
        .cloned()
        .collect()
}

fn matches_query(record: &Record, needle: &str) -> bool {
    record.title.to_lowercase().contains(needle)
        || record.note.to_lowercase().contains(needle)
        || record.tags.join(",").to_lowercase().contains(needle)
}

/// Highest-rated records dated in the same month and year as `today`.
///
/// Equal ratings are ordered by date, most recent first; records that still
/// tie keep their store order.
pub fn monthly_best(
    records: &[Record],
    filter: TypeFilter,
    limit: usize,
    today: NaiveDate,
) -> Vec<Record> {
    let mut best: Vec<(NaiveDate, &Record)> = records
        .iter()
        .filter(|record| filter.matches(record.kind))
        .filter_map(|record| parse_record_date(&record.date).map(|date| (date, record)))
        .filter(|(date, _)| same_month(*date, today))
        .collect();

    best.sort_by(|(a_date, a), (b_date, b)| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b_date.cmp(a_date))
    });

    best.into_iter()
        .take(limit)
        .map(|(_, record)| record.clone())
        .collect()
}

/// [`monthly_best`] against the local calendar.
pub fn monthly_best_now(records: &[Record], filter: TypeFilter, limit: usize) -> Vec<Record> {
    monthly_best(records, filter, limit, today())
}

/// Count books and movies in `range` and average their ratings.
pub fn stats(records: &[Record], range: StatsRange, today: NaiveDate) -> Stats {
    let in_range: Vec<&Record> = records
        .iter()
        .filter(|record| match range {
            StatsRange::All => true,
            StatsRange::Year => parse_record_date(&record.date)
                .map(|date| date.year() == today.year())
                .unwrap_or(false),
            StatsRange::Month => parse_record_date(&record.date)
                .map(|date| same_month(date, today))
                .unwrap_or(false),
        })
        .collect();

    let total = in_range.len();
    let avg_rating = if total == 0 {
        0.0
    } else {
        in_range.iter().map(|record| record.rating).sum::<f64>() / total as f64
    };

    Stats {
        books: in_range.iter().filter(|r| r.kind == MediaType::Book).count(),
        movies: in_range.iter().filter(|r| r.kind == MediaType::Movie).count(),
        avg_rating,
        total,
    }
}

/// [`stats`] against the local calendar.
pub fn stats_now(records: &[Record], range: StatsRange) -> Stats {
    stats(records, range, today())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_record_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|stamp| stamp.with_timezone(&Local).date_naive())
    })
}

/// Today's date on the local calendar.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn same_month(date: NaiveDate, today: NaiveDate) -> bool {
    date.year() == today.year() && date.month() == today.month()
}
