//! filerstore CLI
//!
//! Opens a filer store locally and runs one operation against it.

use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::{Parser, Subcommand};
use filerstore::entry::MODE_DIR;
use filerstore::{Entry, FileChunk, FilerStore, FullPath, StoreConfig, StoreRegistry, TxnContext};
use tracing_subscriber::{fmt, EnvFilter};

/// filerstore CLI
#[derive(Parser, Debug)]
#[command(name = "filerstore-cli")]
#[command(about = "Inspect and edit filer metadata stores")]
#[command(version)]
struct Args {
    /// TOML config file (flags below override it)
    #[arg(short, long)]
    config: Option<String>,

    /// Store backend name
    #[arg(short, long)]
    store: Option<String>,

    /// Store data directory
    #[arg(short, long)]
    dir: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create or replace an entry
    Put {
        /// Full path of the entry
        path: String,

        /// Size of a single placeholder chunk
        #[arg(long, default_value = "0")]
        size: u64,

        /// MIME type
        #[arg(long, default_value = "")]
        mime: String,

        /// Mark the entry as a directory
        #[arg(long)]
        dir_entry: bool,
    },

    /// Print an entry
    Get {
        /// Full path of the entry
        path: String,
    },

    /// Delete an entry
    Rm {
        /// Full path of the entry
        path: String,
    },

    /// List a directory
    Ls {
        /// Directory to list
        dir: String,

        /// File name to start from
        #[arg(long, default_value = "")]
        start: String,

        /// Include the start file itself
        #[arg(long)]
        inclusive: bool,

        /// Maximum number of entries
        #[arg(short, long, default_value = "100")]
        limit: i64,
    },

    /// List available store backends
    Stores,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,filerstore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let registry = StoreRegistry::with_builtin_stores();

    if let Commands::Stores = args.command {
        for name in registry.names() {
            println!("{}", name);
        }
        return;
    }

    let config = match build_config(&args) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            process::exit(2);
        }
    };

    let store = match registry.open(&config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open store: {}", e);
            process::exit(1);
        }
    };

    let code = match run(store.as_ref(), args.command) {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{}", e);
            1
        }
    };

    store.shutdown();
    process::exit(code);
}

/// Config file first, then flag overrides
fn build_config(args: &Args) -> filerstore::Result<StoreConfig> {
    let mut config = match &args.config {
        Some(path) => StoreConfig::load(path)?,
        None => StoreConfig::default(),
    };
    if let Some(store) = &args.store {
        config.store = store.clone();
    }
    if let Some(dir) = &args.dir {
        config.dir = Some(dir.into());
    }
    Ok(config)
}

fn run(store: &dyn FilerStore, command: Commands) -> filerstore::Result<()> {
    let ctx = TxnContext::none();

    match command {
        Commands::Put {
            path,
            size,
            mime,
            dir_entry,
        } => {
            let now = unix_now();
            let mut entry = Entry::new(path);
            entry.attr.mtime = now;
            entry.attr.crtime = now;
            entry.attr.mode = if dir_entry { MODE_DIR | 0o755 } else { 0o644 };
            entry.attr.mime = mime;
            if size > 0 {
                entry.chunks.push(FileChunk {
                    size,
                    mtime: now * 1_000_000_000,
                    ..Default::default()
                });
            }
            store.insert_entry(&ctx, &entry)?;
            println!("saved {}", entry.full_path);
        }
        Commands::Get { path } => {
            let entry = store.find_entry(&ctx, &FullPath::from(path))?;
            print_entry(&entry);
            for chunk in &entry.chunks {
                println!(
                    "  chunk {} offset={} size={}",
                    chunk.file_id, chunk.offset, chunk.size
                );
            }
        }
        Commands::Rm { path } => {
            store.delete_entry(&ctx, &FullPath::from(path))?;
        }
        Commands::Ls {
            dir,
            start,
            inclusive,
            limit,
        } => {
            let listing =
                store.list_directory_entries(&ctx, &FullPath::from(dir), &start, inclusive, limit);
            for entry in &listing.entries {
                print_entry(entry);
            }
            listing.into_result()?;
        }
        Commands::Stores => {}
    }

    Ok(())
}

fn print_entry(entry: &Entry) {
    let kind = if entry.is_directory() { "d" } else { "-" };
    println!(
        "{} {:o} {:>10} {}",
        kind,
        entry.attr.mode & 0o7777,
        entry.size(),
        entry.full_path
    );
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
