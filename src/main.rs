mod cli;
mod config;
mod db;
mod models;
mod notify;
mod prayer_times;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use rusqlite::Connection;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;
use db::migrations::run_migrations;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;
    if !AppConfig::config_path()?.exists() {
        // first run: write the defaults so they can be edited
        config.save().context("Writing default config")?;
    }

    // Ensure data directory exists and open DB
    AppConfig::ensure_data_dir()?;
    let db_path = AppConfig::db_path()?;
    let conn = Connection::open(&db_path)
        .with_context(|| format!("Opening database at {:?}", db_path))?;

    // Enable WAL mode for better concurrent access
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;

    // Run migrations on every startup
    run_migrations(&conn)?;

    let offline = cli.offline;
    match cli.command {
        None => handlers::handle_times(&conn, &config, offline, None)?,
        Some(Commands::Times { date }) => handlers::handle_times(&conn, &config, offline, date)?,
        Some(Commands::Watch { precise }) => {
            handlers::handle_watch(&conn, &config, offline, precise)?
        }
        Some(Commands::Alarm { action }) => {
            handlers::handle_alarm(&conn, &config, offline, &action)?
        }
        Some(Commands::City { action }) => {
            handlers::handle_city(&conn, &config, offline, &action)?
        }
        Some(Commands::Notify) => handlers::handle_notify(&conn, &config, offline)?,
    }

    Ok(())
}
