//! OMDb search API. Requires an API key.
//!
//! API docs: https://www.omdbapi.com/

use serde::Deserialize;

use super::CatalogError;
use crate::models::{MediaType, SearchResult};

pub const DEFAULT_MOVIES_URL: &str = "https://www.omdbapi.com/";

#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Search", default)]
    search: Vec<OmdbMovie>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OmdbMovie {
    #[serde(rename = "imdbID")]
    imdb_id: String,
    #[serde(rename = "Title")]
    title: String,
    #[serde(rename = "Year", default)]
    year: String,
    #[serde(rename = "Poster")]
    poster: Option<String>,
}

pub fn query_params(api_key: &str, query: &str) -> Vec<(&'static str, String)> {
    vec![
        ("apikey", api_key.to_string()),
        ("s", query.to_string()),
        ("type", "movie".to_string()),
    ]
}

/// Map an OMDb search body onto search results. `"Response": "False"` (no
/// match, bad key, too many results) is an empty list, not an error.
pub fn parse_movies_response(json: &str) -> Result<Vec<SearchResult>, CatalogError> {
    let response: OmdbResponse = serde_json::from_str(json)
        .map_err(|e| CatalogError::Parse(format!("invalid OMDb JSON: {e}")))?;

    if response.response.eq_ignore_ascii_case("false") {
        if let Some(reason) = response.error {
            tracing::debug!(%reason, "OMDb returned no results");
        }
        return Ok(Vec::new());
    }

    Ok(response
        .search
        .into_iter()
        .map(|movie| SearchResult {
            id: movie.imdb_id,
            title: movie.title,
            year: movie.year,
            author: None,
            thumbnail: movie.poster.filter(|p| p != "N/A"),
            description: None,
            kind: MediaType::Movie,
            is_manual: false,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_search_hits() {
        let json = r#"{
            "Search": [
                {"Title": "Alien", "Year": "1979", "imdbID": "tt0078748", "Type": "movie", "Poster": "https://m.media-amazon.com/alien.jpg"},
                {"Title": "Aliens", "Year": "1986", "imdbID": "tt0090605", "Type": "movie", "Poster": "N/A"}
            ],
            "totalResults": "2",
            "Response": "True"
        }"#;

        let results = parse_movies_response(json).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, "tt0078748");
        assert_eq!(results[0].year, "1979");
        assert_eq!(
            results[0].thumbnail.as_deref(),
            Some("https://m.media-amazon.com/alien.jpg")
        );
        assert_eq!(results[1].thumbnail, None);
        assert!(results.iter().all(|r| r.kind == MediaType::Movie));
    }

    #[test]
    fn false_response_is_empty() {
        let json = r#"{"Response":"False","Error":"Movie not found!"}"#;
        assert!(parse_movies_response(json).unwrap().is_empty());
    }

    #[test]
    fn params_include_key_and_type() {
        let params = query_params("k3y", "heat");
        assert!(params.contains(&("apikey", "k3y".to_string())));
        assert!(params.contains(&("s", "heat".to_string())));
        assert!(params.contains(&("type", "movie".to_string())));
    }
}
