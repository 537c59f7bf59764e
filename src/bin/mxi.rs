//! CLI entry point for the `mxi` command-line tool.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

use memex_index::cli::commands;
use memex_index::config::{load_config, resolve_snapshot_path, IndexConfig};
use memex_index::IndexError;

#[derive(Parser)]
#[command(
    name = "mxi",
    about = "memex index CLI — incrementally-updated search index over web history"
)]
struct Cli {
    /// Output format: "text" (default) or "json"
    #[arg(long, default_value = "text")]
    format: String,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot file (overrides MXI_SNAPSHOT and the config)
    #[arg(long, short = 's')]
    snapshot: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new empty snapshot
    Create,
    /// Display entry counts for the snapshot
    Info,
    /// Index one page submission (JSON file)
    Add {
        /// Path to the submission JSON
        submission: PathBuf,
    },
    /// Bulk-index page submissions from a JSON-lines file
    Import {
        /// Path to the .jsonl file
        jsonl_file: PathBuf,
    },
    /// Bookmark an indexed page
    Bookmark {
        /// Page id (page/example.com/docs) or the page URL
        page_id: String,
        /// Bookmark time in epoch milliseconds (default: now)
        #[arg(long)]
        time: Option<u64>,
    },
    /// Attach a visit/ or bookmark/ key to an indexed page
    Timestamp {
        /// Page id or the page URL
        page_id: String,
        /// Timestamp key, e.g. visit/1700000000000
        key: String,
        /// Metadata as a JSON object
        #[arg(long)]
        meta: Option<String>,
    },
    /// Merge a JSON object into a timestamp entry's metadata
    Annotate {
        /// Timestamp key
        timestamp_id: String,
        /// JSON object to merge
        json: String,
    },
    /// Print the value stored under a key
    Get {
        /// Store key
        key: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.format == "json";

    let config = match &cli.config {
        Some(path) => match load_config(&path.to_string_lossy()) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                process::exit(3);
            }
        },
        None => IndexConfig::default(),
    };

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let file = resolve_snapshot_path(cli.snapshot.as_deref(), &config);

    let result = match cli.command {
        Commands::Create => commands::cmd_create(&file),
        Commands::Info => commands::cmd_info(&file, json),
        Commands::Add { submission } => commands::cmd_add(&file, &submission, &config, json).await,
        Commands::Import { jsonl_file } => {
            commands::cmd_import(&file, &jsonl_file, &config, json).await
        }
        Commands::Bookmark { page_id, time } => {
            commands::cmd_bookmark(&file, &page_id, time, &config, json).await
        }
        Commands::Timestamp { page_id, key, meta } => {
            commands::cmd_timestamp(&file, &page_id, &key, meta.as_deref(), &config, json).await
        }
        Commands::Annotate {
            timestamp_id,
            json: patch,
        } => commands::cmd_annotate(&file, &timestamp_id, &patch, &config, json).await,
        Commands::Get { key } => commands::cmd_get(&file, &key, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let code = match &e {
            IndexError::Io(_) => 1,
            IndexError::InvalidMagic
            | IndexError::UnsupportedVersion(_)
            | IndexError::Truncated
            | IndexError::Compression(_) => 2,
            IndexError::Derivation(_) | IndexError::Config(_) | IndexError::Usage(_) => 3,
            e if e.is_precondition() => 4,
            _ => 5,
        };
        process::exit(code);
    }
}
