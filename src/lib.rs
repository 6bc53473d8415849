//! Core library surface for the Media Diary TUI.
//!
//! The binary is a thin shell over these modules: persistence in [`db`], pure
//! queries in [`query`], catalog lookups in [`catalog`], the headless view
//! state in [`controller`] and the Ratatui front-end in [`ui`].
pub mod catalog;
pub mod config;
pub mod controller;
pub mod db;
pub mod logging;
pub mod models;
pub mod query;
pub mod ui;

/// Persistence entry points used by `main.rs`.
pub use db::{export_to_dir, import_from_file, open_store};

pub use catalog::{CatalogClient, CatalogSettings};
pub use config::Config;
pub use controller::{AppState, View};
pub use models::{MediaType, Record, SearchResult, Stats, StatsRange, TypeFilter};

/// The interactive application entry point and state container.
pub use ui::{run_app, App};
