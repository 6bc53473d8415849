//! Binary entry point. With no subcommand it opens the diary in the terminal
//! UI; the subcommands run headless against the same store.
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use media_diary::logging::{init_file_logging, init_stderr_logging};
use media_diary::query::stats_now;
use media_diary::{
    db, export_to_dir, import_from_file, open_store, run_app, App, AppState, CatalogClient,
    Config, StatsRange,
};

#[derive(Parser)]
#[command(name = "media-diary", version, about = "A personal diary of books and movies")]
struct Cli {
    /// Read settings from this file instead of the default location.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write every record and collection to a dated JSON file.
    Export {
        /// Target directory; defaults to `export_dir` from the config.
        dir: Option<PathBuf>,
    },
    /// Replace the stored records and/or collections with those in FILE.
    Import { file: PathBuf },
    /// Print rating statistics as JSON.
    Stats {
        #[arg(default_value = "year", value_name = "year|month|all")]
        range: StatsRange,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load_with(cli.config.as_deref())?;
    let data_dir = config.data_dir()?;

    match cli.command {
        None => run_tui(&config, &data_dir),
        Some(command) => {
            init_stderr_logging(&config.log_level)?;
            run_command(command, &config, &data_dir)
        }
    }
}

/// Bring up logging, the store and the catalog client, then hand control to
/// the Ratatui event loop until the user quits.
fn run_tui(config: &Config, data_dir: &Path) -> Result<()> {
    init_file_logging(data_dir, &config.log_level)?;
    let conn = open_store(data_dir)?;
    info!(data_dir = %data_dir.display(), "starting media diary");

    let catalog = CatalogClient::new(config.catalog_settings())?;
    let state = AppState::new(conn, config.debounce());
    let mut app = App::new(state, catalog, config.export_dir.clone())?;
    run_app(&mut app)
}

fn run_command(command: Command, config: &Config, data_dir: &Path) -> Result<()> {
    let conn = open_store(data_dir)?;
    match command {
        Command::Export { dir } => {
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let path = export_to_dir(&conn, &dir)?;
            println!("{}", path.display());
        }
        Command::Import { file } => {
            let summary = import_from_file(&conn, &file)?;
            println!(
                "Imported {} records and {} collections from {}.",
                summary.records,
                summary.collections,
                file.display()
            );
        }
        Command::Stats { range } => {
            let records = db::load_records(&conn);
            let stats = stats_now(&records, range);
            let json = serde_json::to_string_pretty(&stats).context("failed to render stats")?;
            println!("{json}");
        }
    }
    Ok(())
}
