//! External catalog search. Each adapter call is failure-safe on its own: a
//! network error, a non-success status or a body we cannot parse is logged
//! and turns into an empty list, so a combined search still shows whatever
//! the other catalog returned.

mod books;
mod movies;

use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{MediaType, SearchResult, TypeFilter};

pub use books::{parse_books_response, DEFAULT_BOOKS_URL};
pub use movies::{parse_movies_response, DEFAULT_MOVIES_URL};

/// Combined results are cut off after this many items.
pub const MAX_COMBINED_RESULTS: usize = 15;

const USER_AGENT: &str = concat!("media-diary/", env!("CARGO_PKG_VERSION"));

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("catalog answered with status {0}")]
    Status(u16),
    #[error("parse error: {0}")]
    Parse(String),
    #[error("no API key configured for {0}")]
    MissingApiKey(&'static str),
}

/// Endpoints and credentials for the two catalogs.
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub books_url: String,
    pub movies_url: String,
    pub omdb_api_key: Option<String>,
    pub timeout: Duration,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            books_url: DEFAULT_BOOKS_URL.to_string(),
            movies_url: DEFAULT_MOVIES_URL.to_string(),
            omdb_api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

/// HTTP client for the book and movie catalogs.
pub struct CatalogClient {
    http: Client,
    settings: CatalogSettings,
}

impl CatalogClient {
    pub fn new(settings: CatalogSettings) -> Result<Self> {
        let http = Client::builder()
            .timeout(settings.timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("failed to create HTTP client")?;
        Ok(Self { http, settings })
    }

    /// Search the book catalog. Never fails; see the module docs.
    pub async fn search_books(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.try_search_books(query).await {
            Ok(results) => {
                debug!(query, count = results.len(), "book search finished");
                results
            }
            Err(err) => {
                warn!(query, error = %err, "book search failed");
                Vec::new()
            }
        }
    }

    /// Search the movie catalog. Never fails; see the module docs.
    pub async fn search_movies(&self, query: &str) -> Vec<SearchResult> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        match self.try_search_movies(query).await {
            Ok(results) => {
                debug!(query, count = results.len(), "movie search finished");
                results
            }
            Err(err) => {
                warn!(query, error = %err, "movie search failed");
                Vec::new()
            }
        }
    }

    /// Query both catalogs at once and interleave the hits.
    pub async fn search_all(&self, query: &str) -> Vec<SearchResult> {
        if query.trim().is_empty() {
            return Vec::new();
        }
        let (books, movies) = tokio::join!(self.search_books(query), self.search_movies(query));
        interleave(movies, books, MAX_COMBINED_RESULTS)
    }

    /// Dispatch to one catalog or both according to `filter`.
    pub async fn search(&self, query: &str, filter: TypeFilter) -> Vec<SearchResult> {
        match filter {
            TypeFilter::All => self.search_all(query).await,
            TypeFilter::Book => self.search_books(query).await,
            TypeFilter::Movie => self.search_movies(query).await,
        }
    }

    async fn try_search_books(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        let body = self
            .fetch(&self.settings.books_url, &books::query_params(query))
            .await?;
        parse_books_response(&body)
    }

    async fn try_search_movies(&self, query: &str) -> Result<Vec<SearchResult>, CatalogError> {
        let api_key = self
            .settings
            .omdb_api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(CatalogError::MissingApiKey("OMDb"))?;
        let body = self
            .fetch(&self.settings.movies_url, &movies::query_params(api_key, query))
            .await?;
        parse_movies_response(&body)
    }

    async fn fetch(&self, url: &str, params: &[(&str, String)]) -> Result<String, CatalogError> {
        let response = self.http.get(url).query(params).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status.as_u16()));
        }
        Ok(response.text().await?)
    }
}

/// Alternate one movie, one book per round until both run out or `cap` is
/// reached. A shorter list simply stops contributing.
pub fn interleave(
    movies: Vec<SearchResult>,
    books: Vec<SearchResult>,
    cap: usize,
) -> Vec<SearchResult> {
    let mut combined = Vec::with_capacity(cap.min(movies.len() + books.len()));
    let mut movies = movies.into_iter();
    let mut books = books.into_iter();

    loop {
        let movie = movies.next();
        let book = books.next();
        if movie.is_none() && book.is_none() {
            break;
        }
        combined.extend(movie);
        combined.extend(book);
    }

    combined.truncate(cap);
    combined
}

/// Build a selectable entry for a title neither catalog knows about.
pub fn create_manual_entry(title: &str, kind: MediaType, year: &str) -> SearchResult {
    SearchResult {
        id: format!("manual-{}", Utc::now().timestamp_millis()),
        title: title.trim().to_string(),
        year: year.trim().to_string(),
        author: None,
        thumbnail: None,
        description: None,
        kind,
        is_manual: true,
    }
}
