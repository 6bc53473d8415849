//! Ratatui front-end. Key handling and drawing live here; every state change
//! goes through [`crate::controller::AppState`].

mod app;
mod forms;
mod helpers;
mod screens;
mod search;
mod terminal;

pub use app::App;
pub use terminal::run_app;
