//! Google Books volumes API.
//!
//! API docs: https://developers.google.com/books/docs/v1/using

use serde::Deserialize;

use super::CatalogError;
use crate::models::{MediaType, SearchResult};

pub const DEFAULT_BOOKS_URL: &str = "https://www.googleapis.com/books/v1/volumes";
/// Page size requested from the volumes endpoint.
pub const MAX_RESULTS: &str = "10";

#[derive(Debug, Deserialize)]
struct VolumesResponse {
    #[serde(default)]
    items: Vec<Volume>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Volume {
    id: String,
    #[serde(default)]
    volume_info: VolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VolumeInfo {
    title: Option<String>,
    published_date: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    image_links: Option<ImageLinks>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageLinks {
    thumbnail: Option<String>,
}

/// Query parameters for a volumes search.
pub fn query_params(query: &str) -> Vec<(&'static str, String)> {
    vec![
        ("q", query.to_string()),
        ("maxResults", MAX_RESULTS.to_string()),
    ]
}

/// Map a volumes response body onto search results.
pub fn parse_books_response(json: &str) -> Result<Vec<SearchResult>, CatalogError> {
    let response: VolumesResponse = serde_json::from_str(json)
        .map_err(|e| CatalogError::Parse(format!("invalid Google Books JSON: {e}")))?;

    Ok(response.items.into_iter().map(into_result).collect())
}

fn into_result(volume: Volume) -> SearchResult {
    let info = volume.volume_info;
    let year: String = info
        .published_date
        .unwrap_or_default()
        .chars()
        .take(4)
        .collect();

    SearchResult {
        id: volume.id,
        title: info
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string()),
        year,
        author: Some(info.authors.join(", ")),
        thumbnail: info.image_links.and_then(|links| links.thumbnail),
        description: Some(info.description.unwrap_or_default()),
        kind: MediaType::Book,
        is_manual: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_volume_fields() {
        let json = r#"{
            "kind": "books#volumes",
            "totalItems": 2,
            "items": [
                {
                    "id": "zyTCAlFPjgYC",
                    "volumeInfo": {
                        "title": "The Google Story",
                        "authors": ["David A. Vise", "Mark Malseed"],
                        "publishedDate": "2005-11-15",
                        "description": "Inside the company",
                        "imageLinks": {"thumbnail": "http://books.google.com/t.jpg"}
                    }
                },
                {"id": "bare", "volumeInfo": {}}
            ]
        }"#;

        let results = parse_books_response(json).unwrap();
        assert_eq!(results.len(), 2);

        let first = &results[0];
        assert_eq!(first.id, "zyTCAlFPjgYC");
        assert_eq!(first.title, "The Google Story");
        assert_eq!(first.year, "2005");
        assert_eq!(first.author.as_deref(), Some("David A. Vise, Mark Malseed"));
        assert_eq!(first.thumbnail.as_deref(), Some("http://books.google.com/t.jpg"));
        assert_eq!(first.kind, MediaType::Book);

        let bare = &results[1];
        assert_eq!(bare.title, "Untitled");
        assert_eq!(bare.year, "");
        assert_eq!(bare.thumbnail, None);
    }

    #[test]
    fn no_items_means_no_results() {
        let results = parse_books_response(r#"{"kind":"books#volumes","totalItems":0}"#).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn garbage_is_a_parse_error() {
        assert!(matches!(
            parse_books_response("<html>"),
            Err(CatalogError::Parse(_))
        ));
    }
}
