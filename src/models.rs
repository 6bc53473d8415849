//! Domain models that mirror the persisted JSON blobs and get passed
//! throughout the TUI. These types stay light-weight data holders so other
//! layers can focus on presentation and persistence logic. Field names are
//! serialized in camelCase so blobs and export files keep the same layout as
//! older diaries.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Kind of media a record or search result describes.
pub enum MediaType {
    Book,
    Movie,
    /// Anything a hand-edited blob may contain. Such records still load but
    /// never count as books or movies.
    #[default]
    #[serde(other)]
    Unknown,
}

impl MediaType {
    /// Short label used in list rows.
    pub fn label(self) -> &'static str {
        match self {
            MediaType::Book => "Book",
            MediaType::Movie => "Movie",
            MediaType::Unknown => "Other",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
/// One logged book or movie.
pub struct Record {
    /// Unique across the store. An empty id means "assign one on upsert".
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub kind: MediaType,
    /// Release or publication year as text; catalogs return ranges like
    /// `2011–2019` for some titles, so this is not parsed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub year: String,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    /// Star rating between 0 and 5. The write flow only ever stores whole
    /// stars, but imported data may carry fractions.
    #[serde(default, deserialize_with = "null_as_default")]
    pub rating: f64,
    /// ISO date (`YYYY-MM-DD`) the item was consumed.
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub note: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    /// Unix epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<i64>,
    /// Unix epoch milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Read an explicit `null` the same way as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Record {
    /// Compose a `Title (Year)` string that gracefully omits the year when
    /// blank.
    pub fn display_title(&self) -> String {
        display_with_year(&self.title, &self.year)
    }

    /// `Movie / 2019` style subtitle used across list views.
    pub fn subtitle(&self) -> String {
        subtitle(self.kind, &self.year)
    }

    /// Five-character star strip, rounding fractional ratings down.
    pub fn stars(&self) -> String {
        star_strip(self.rating)
    }
}

/// Normalized catalog hit. Transient: never persisted directly, only copied
/// into a [`Record`] when the write flow saves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub year: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: MediaType,
    /// Set for entries the user typed in when the catalogs had nothing.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_manual: bool,
}

impl SearchResult {
    pub fn display_title(&self) -> String {
        display_with_year(&self.title, &self.year)
    }

    pub fn subtitle(&self) -> String {
        let base = subtitle(self.kind, &self.year);
        match self.author.as_deref().map(str::trim) {
            Some(author) if !author.is_empty() => format!("{base} / {author}"),
            _ => base,
        }
    }
}

impl From<&Record> for SearchResult {
    /// Rebuild the selection for the edit flow from a stored record.
    fn from(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            year: record.year.clone(),
            author: record.author.clone(),
            thumbnail: record.thumbnail.clone(),
            description: None,
            kind: record.kind,
            is_manual: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Restricts queries and catalog searches to one media type.
pub enum TypeFilter {
    #[default]
    All,
    Book,
    Movie,
}

impl TypeFilter {
    pub fn matches(self, kind: MediaType) -> bool {
        match self {
            TypeFilter::All => true,
            TypeFilter::Book => kind == MediaType::Book,
            TypeFilter::Movie => kind == MediaType::Movie,
        }
    }

    /// Rotate All → Movie → Book → All, the order the search tabs are drawn.
    pub fn next(self) -> Self {
        match self {
            TypeFilter::All => TypeFilter::Movie,
            TypeFilter::Movie => TypeFilter::Book,
            TypeFilter::Book => TypeFilter::All,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TypeFilter::All => "All",
            TypeFilter::Book => "Books",
            TypeFilter::Movie => "Movies",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Time window for the home screen statistics.
pub enum StatsRange {
    #[default]
    Year,
    Month,
    All,
}

impl StatsRange {
    pub fn next(self) -> Self {
        match self {
            StatsRange::Year => StatsRange::Month,
            StatsRange::Month => StatsRange::All,
            StatsRange::All => StatsRange::Year,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatsRange::Year => "This year",
            StatsRange::Month => "This month",
            StatsRange::All => "All time",
        }
    }
}

impl std::str::FromStr for StatsRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "year" => Ok(StatsRange::Year),
            "month" => Ok(StatsRange::Month),
            "all" => Ok(StatsRange::All),
            other => Err(format!("unknown range '{other}' (expected year, month or all)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
/// Aggregate counts for a [`StatsRange`].
pub struct Stats {
    pub books: usize,
    pub movies: usize,
    pub avg_rating: f64,
    pub total: usize,
}

fn display_with_year(title: &str, year: &str) -> String {
    if year.trim().is_empty() {
        title.to_string()
    } else {
        format!("{} ({})", title, year.trim())
    }
}

fn subtitle(kind: MediaType, year: &str) -> String {
    if year.trim().is_empty() {
        kind.label().to_string()
    } else {
        format!("{} / {}", kind.label(), year.trim())
    }
}

/// Render a rating as filled and hollow stars.
pub fn star_strip(rating: f64) -> String {
    let filled = rating.clamp(0.0, 5.0).floor() as usize;
    let mut strip = "★".repeat(filled);
    strip.push_str(&"☆".repeat(5 - filled));
    strip
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_reads_legacy_blob_shape() {
        let json = r#"{
            "id": "a",
            "title": "Dune",
            "type": "book",
            "year": "1965",
            "thumbnail": null,
            "author": "",
            "rating": 4.5,
            "date": "2024-06-01",
            "note": "spice",
            "tags": ["sf"],
            "createdAt": 1717200000000,
            "updatedAt": 1717200000000,
            "somethingNew": true
        }"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.kind, MediaType::Book);
        assert_eq!(record.rating, 4.5);
        assert_eq!(record.created_at, Some(1_717_200_000_000));
        assert_eq!(record.tags, vec!["sf".to_string()]);
    }

    #[test]
    fn missing_fields_default() {
        let record: Record = serde_json::from_str(r#"{"id":"x","title":"T"}"#).unwrap();
        assert_eq!(record.kind, MediaType::Unknown);
        assert_eq!(record.rating, 0.0);
        assert!(record.tags.is_empty());
        assert!(record.date.is_empty());
    }

    #[test]
    fn unknown_type_does_not_fail() {
        let record: Record =
            serde_json::from_str(r#"{"id":"x","title":"T","type":"podcast"}"#).unwrap();
        assert_eq!(record.kind, MediaType::Unknown);
    }

    #[test]
    fn record_serializes_with_type_key() {
        let record = Record {
            id: "a".into(),
            title: "Heat".into(),
            kind: MediaType::Movie,
            year: "1995".into(),
            thumbnail: None,
            author: None,
            rating: 5.0,
            date: "2024-06-15".into(),
            note: String::new(),
            tags: Vec::new(),
            created_at: Some(1),
            updated_at: Some(2),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "movie");
        assert_eq!(value["createdAt"], 1);
        assert_eq!(value["updatedAt"], 2);
    }

    #[test]
    fn star_strip_clamps() {
        assert_eq!(star_strip(3.7), "★★★☆☆");
        assert_eq!(star_strip(9.0), "★★★★★");
        assert_eq!(star_strip(-1.0), "☆☆☆☆☆");
    }

    #[test]
    fn type_filter_cycles_through_every_tab() {
        let mut filter = TypeFilter::All;
        filter = filter.next();
        assert_eq!(filter, TypeFilter::Movie);
        filter = filter.next();
        assert_eq!(filter, TypeFilter::Book);
        assert_eq!(filter.next(), TypeFilter::All);
    }

    #[test]
    fn stats_range_parses_cli_values() {
        assert_eq!("Month".parse::<StatsRange>(), Ok(StatsRange::Month));
        assert!("week".parse::<StatsRange>().is_err());
    }
}
