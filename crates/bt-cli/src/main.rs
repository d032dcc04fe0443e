use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bt_cli::commands::util::{field_inputs, parse_datetime};
use bt_cli::commands::{events, status, sync, timeline, types};
use bt_cli::{Cli, Commands, Config, TypesAction};

/// Load config and open database, ensuring the parent directory exists.
fn open_database(config_path: Option<&Path>) -> Result<(bt_db::Database, Config)> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }

    let db = bt_db::Database::open(&config.database_path).with_context(|| {
        format!(
            "failed to open database {}",
            config.database_path.display()
        )
    })?;
    Ok((db, config))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let Some(command) = cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let (mut db, config) = open_database(cli.config.as_deref())?;
    let mut out = io::stdout().lock();
    let now = Utc::now();

    match command {
        Commands::Start { type_name, at } => {
            let at = parse_datetime(at.as_deref().unwrap_or("now"), now)?;
            events::start(&mut out, &mut db, &type_name, at)?;
        }
        Commands::Finish { fields } => {
            let event = events::finish(&mut out, &mut db, &field_inputs(&fields), now)?;
            sync::push_finalized(&config, event)?;
        }
        Commands::Log {
            type_name,
            at,
            fields,
        } => {
            let at = parse_datetime(at.as_deref().unwrap_or("now"), now)?;
            let event = events::log(
                &mut out,
                &mut db,
                &type_name,
                at,
                &field_inputs(&fields),
                now,
            )?;
            sync::push_finalized(&config, event)?;
        }
        Commands::Edit { index, fields } => {
            events::edit(&mut out, &mut db, index, &field_inputs(&fields))?;
        }
        Commands::Delete { index } => events::delete(&mut out, &mut db, index)?,
        Commands::List { json } => events::list(&mut out, &db, &Local, json)?,
        Commands::Timeline => timeline::timeline(&mut out, &db, &Local)?,
        Commands::Trends { json } => timeline::trends(&mut out, &db, &Local, json)?,
        Commands::Schema { type_name } => types::schema(&mut out, &db, &type_name)?,
        Commands::Types { action } => match action {
            TypesAction::List => types::list(&mut out, &mut db)?,
            TypesAction::Add {
                name,
                color,
                duration,
                volume,
                inputs,
            } => types::add(&mut out, &mut db, &name, &color, duration, volume, inputs)?,
            TypesAction::Remove { name } => types::remove(&mut out, &mut db, &name)?,
        },
        Commands::Pull => sync::pull(&mut out, &mut db, &config)?,
        Commands::Status => status::run(&mut out, &mut db, &config, now)?,
    }

    Ok(())
}
