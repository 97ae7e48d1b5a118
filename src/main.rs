mod app;
mod domain;
mod logging;
mod persist;
mod repo;
mod ui;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::info;

use app::App;
use domain::store::TodoStore;
use domain::todo::{Todo, now_millis};
use persist::Persister;
use repo::KeyValueStorage;
use repo::file::JsonFileStorage;
use repo::memory::InMemoryStorage;
use repo::sqlite::SqliteStorage;
use ui::backdrop::Backdrop;

#[derive(Parser, Debug)]
#[command(author, version, about = "tsumiki: a single-screen todo list", long_about = None)]
struct Args {
    /// Tick interval of render loop in milliseconds
    #[arg(long, default_value_t = 120)]
    tick_ms: u64,

    /// Start with demo tasks (kept in memory only)
    #[arg(long, default_value_t = false)]
    demo: bool,

    /// Use in-memory storage instead of SQLite
    #[arg(long, default_value_t = false)]
    memory: bool,

    /// Path to SQLite storage file (default: OS data dir)
    #[arg(long, conflicts_with = "json_dir")]
    db_path: Option<PathBuf>,

    /// Store tasks as JSON files in this directory instead of SQLite
    #[arg(long)]
    json_dir: Option<PathBuf>,

    /// Directory for log files (default: OS data dir)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level: trace, debug, info, warn, error, off
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Backdrop to use instead of a random one
    #[arg(long, value_enum)]
    backdrop: Option<Backdrop>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let log_dir = match args.log_dir.clone() {
        Some(dir) => dir,
        None => logging::default_log_dir()?,
    };
    let _logger = logging::init_logging(&args.log_level, &log_dir)?;

    let storage = open_storage(&args)?;
    let persister = Persister::start(storage)?;
    let loading = persister.load();
    let backdrop = args.backdrop.unwrap_or_else(Backdrop::random);
    info!("event=launch module=main status=ok backdrop={}", backdrop.name());

    let mut app = App::new(TodoStore::new(persister), loading, backdrop);
    let res = ui::run(&mut app, Duration::from_millis(args.tick_ms));
    app.into_store().into_sink().shutdown();
    res
}

fn open_storage(args: &Args) -> Result<Box<dyn KeyValueStorage + Send>> {
    let storage: Box<dyn KeyValueStorage + Send> = if args.demo {
        Box::new(InMemoryStorage::with_seed(seed_todos())?)
    } else if args.memory {
        Box::new(InMemoryStorage::default())
    } else if let Some(dir) = args.json_dir.as_ref() {
        Box::new(JsonFileStorage::open(dir)?)
    } else if let Some(path) = args.db_path.as_ref() {
        Box::new(SqliteStorage::open(path)?)
    } else {
        Box::new(SqliteStorage::open_default()?)
    };
    Ok(storage)
}

fn seed_todos() -> Vec<Todo> {
    let now = now_millis();
    ["Buy milk", "Walk the dog", "Water the plants"]
        .into_iter()
        .zip(0..)
        .map(|(text, offset)| Todo::with_created_at(text, now + offset))
        .collect()
}
