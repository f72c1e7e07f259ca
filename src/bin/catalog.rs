//! Catalog CLI
//!
//! Thin transport adapter: runs one catalog operation against a journaled
//! store and prints `<status code> <json body>`.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use itemcatalog::config::WalSyncStrategy;
use itemcatalog::{AttributeValue, CatalogService, Config, Fields, JournaledStore, Status};
use tracing_subscriber::{fmt, EnvFilter};

/// Item catalog
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Course item catalog over a journaled key-value store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./catalog_data")]
    data_dir: String,

    /// fsync the WAL after this many writes (1 = every write)
    #[arg(long, default_value = "1")]
    sync_every: usize,

    /// Return an empty list instead of not-found when nothing matches
    #[arg(long)]
    allow_empty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Add an item
    Add {
        /// Field as name=value (repeatable); values parse as bool, integer or string
        #[arg(short, long = "field", value_parser = parse_field)]
        fields: Vec<(String, AttributeValue)>,

        /// JSON object body (replaces --field)
        #[arg(long, conflicts_with = "fields")]
        json: Option<String>,
    },

    /// Get an item by id and course
    Get {
        id: String,

        #[arg(short, long)]
        course: String,
    },

    /// Delete an item by id and course
    Delete {
        id: String,

        #[arg(short, long)]
        course: String,
    },

    /// List every item
    List,

    /// List items of a course
    ByCourse { course: String },

    /// List items of a year
    ByYear { year: String },

    /// Rewrite the WAL as a checkpoint of live records
    Compact,
}

fn parse_field(raw: &str) -> Result<(String, AttributeValue), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got `{}`", raw))?;
    if name.is_empty() {
        return Err(format!("empty field name in `{}`", raw));
    }
    Ok((name.to_string(), AttributeValue::infer(value)))
}

/// fsync cadence for `--sync-every`; 0 and 1 both mean every write
fn sync_strategy(sync_every: usize) -> WalSyncStrategy {
    match sync_every {
        0 | 1 => WalSyncStrategy::EveryWrite,
        count => WalSyncStrategy::EveryNEntries { count },
    }
}

fn build_config(args: &Args) -> Config {
    Config::builder()
        .data_dir(&args.data_dir)
        .wal_sync_strategy(sync_strategy(args.sync_every))
        .empty_list_as_not_found(!args.allow_empty)
        .build()
}

/// Process exit code for an outcome status
fn exit_code(status: Status) -> i32 {
    if status.is_success() {
        0
    } else {
        1
    }
}

fn main() {
    // Initialize tracing/logging (stderr, so stdout stays the response)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,itemcatalog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = build_config(&args);

    tracing::debug!("Data directory: {}", args.data_dir);

    let store = match JournaledStore::open(&config) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            std::process::exit(1);
        }
    };

    let service = CatalogService::from_store(store.clone(), &config);

    let outcome = match args.command {
        Commands::Add { fields, json } => match json {
            Some(body) => service.add_item_json(&body),
            None => service.add_item(fields.into_iter().collect::<Fields>()),
        },
        Commands::Get { id, course } => service.get_item(&id, &course),
        Commands::Delete { id, course } => service.delete_item(&id, &course),
        Commands::List => service.list_items(),
        Commands::ByCourse { course } => service.list_items_by_course(&course),
        Commands::ByYear { year } => service.list_items_by_year(&year),
        Commands::Compact => match store.compact() {
            Ok(count) => {
                println!("compacted {} records", count);
                finish(&store, 0);
            }
            Err(e) => {
                tracing::error!("Compaction failed: {}", e);
                finish(&store, 1);
            }
        },
    };

    let status = outcome.status();
    println!("{} {}", status.code(), outcome.body());
    finish(&store, exit_code(status));
}

fn finish(store: &JournaledStore, code: i32) -> ! {
    if let Err(e) = store.sync() {
        tracing::error!("Failed to sync WAL: {}", e);
        std::process::exit(1);
    }
    std::process::exit(code)
}
