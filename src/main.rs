use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local, Utc};
use clap::{Parser, Subcommand};
use localhist::kernel::services::adapters::{
    default_journal_path, ensure_settings_file, load_settings, load_settings_from, FileFilter,
    FileWatcherService, JournalStore, LocalGateway,
};
use localhist::kernel::services::ports::HistoryConfig;
use localhist::kernel::services::Host;
use localhist::kernel::LocalHistoryService;
use localhist::models::{ChangeSetId, Entry, Timestamp, VcsPath};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

mod logging;

const DRAIN_INTERVAL: Duration = Duration::from_millis(200);

#[derive(Parser)]
#[command(name = "localhist")]
#[command(about = "Local history for project directories")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the per-user localhist.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Content root to track; may be repeated and replaces configured roots
    #[arg(short, long = "root", global = true)]
    roots: Vec<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Record changes until interrupted
    Watch,
    /// Bring the history up to date with the disk once
    Sync,
    /// List change-sets, or the revisions of one path
    Log { path: Option<PathBuf> },
    /// Print the content of a file revision (latest by default)
    Show {
        path: PathBuf,
        #[arg(long)]
        change_set: Option<u64>,
    },
    /// Restore a file to the content it had after a change-set
    Revert {
        path: PathBuf,
        #[arg(long)]
        change_set: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logging = logging::init(cli.verbose);

    let config = load_config(&cli)?;
    if config.content_roots.is_empty() {
        bail!("no content roots: pass --root or set content_roots in the settings file");
    }

    let filter = FileFilter::from_config(&config).context("invalid exclude pattern")?;
    let gateway = Arc::new(LocalGateway::new(filter));
    let store_path = match &config.store_path {
        Some(path) => path.clone(),
        None => default_journal_path(&config.content_roots)
            .context("cannot determine the data directory")?,
    };
    let store = JournalStore::new(store_path);
    let journal = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;

    let mut host = Host::new();
    let mut service = LocalHistoryService::startup(&mut host, &config, gateway, journal)?;

    let outcome = match cli.command {
        Commands::Watch => watch(&host, &service, &config, &store),
        Commands::Sync => {
            println!("{} change-sets recorded", service.change_sets().len());
            Ok(())
        }
        Commands::Log { path } => {
            print_log(&service, path.as_deref());
            Ok(())
        }
        Commands::Show { path, change_set } => show(&service, &path, change_set),
        Commands::Revert { path, change_set } => service
            .revert(&to_vcs_path(&path), ChangeSetId(change_set))
            .map_err(Into::into),
    };

    store
        .save(&service.journal())
        .with_context(|| format!("saving {}", store.path().display()))?;
    service.shutdown(&mut host);
    outcome
}

fn load_config(cli: &Cli) -> Result<HistoryConfig> {
    let mut config = match &cli.config {
        Some(path) => load_settings_from(path)
            .with_context(|| format!("reading settings {}", path.display()))?,
        None => {
            if let Err(err) = ensure_settings_file() {
                tracing::debug!(error = %err, "settings file not created");
            }
            load_settings().unwrap_or_default()
        }
    };
    if !cli.roots.is_empty() {
        config.content_roots = cli.roots.clone();
    }
    config.content_roots = config
        .content_roots
        .iter()
        .map(|root| {
            root.canonicalize()
                .with_context(|| format!("content root {}", root.display()))
        })
        .collect::<Result<_>>()?;
    Ok(config)
}

fn to_vcs_path(path: &Path) -> VcsPath {
    let absolute = path.canonicalize().unwrap_or_else(|_| {
        std::env::current_dir()
            .map(|dir| dir.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    });
    VcsPath::from_fs(&absolute)
}

fn format_time(timestamp: Timestamp) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp)
        .map(|time| {
            time.with_timezone(&Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
        })
        .unwrap_or_else(|| timestamp.to_string())
}

fn watch(
    host: &Host,
    service: &LocalHistoryService,
    config: &HistoryConfig,
    store: &JournalStore,
) -> Result<()> {
    let stop = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&stop))?;
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&stop))?;

    let mut watcher = FileWatcherService::new(&config.content_roots)?;
    tracing::info!(roots = ?watcher.roots(), "watching");

    let mut saved = service.change_sets().len();
    while !stop.load(Ordering::Relaxed) {
        let events = watcher.drain_events();
        if !events.is_empty() {
            host.refresh(true, &events);
            let recorded = service.change_sets().len();
            if recorded != saved {
                store.save(&service.journal())?;
                saved = recorded;
            }
        }
        std::thread::sleep(DRAIN_INTERVAL);
    }
    tracing::info!("interrupted");
    Ok(())
}

fn print_log(service: &LocalHistoryService, path: Option<&Path>) {
    let Some(path) = path else {
        for info in service.change_sets() {
            println!(
                "{:>6}  {}  {:<24} {} change(s)",
                info.id.0,
                format_time(info.timestamp),
                info.label.as_deref().unwrap_or("-"),
                info.change_count
            );
        }
        return;
    };

    let path = to_vcs_path(path);
    for revision in service.revisions_for(&path) {
        let size = match revision.entry.as_ref() {
            Entry::File { content, .. } => format!("{} bytes", content.len()),
            Entry::Directory { children, .. } => format!("{} entries", children.len()),
        };
        println!(
            "{:>6}  {}  {:<24} {}",
            revision.change_set.0,
            format_time(revision.timestamp),
            revision.cause_label().unwrap_or("-"),
            size
        );
    }
}

fn show(service: &LocalHistoryService, path: &Path, change_set: Option<u64>) -> Result<()> {
    let path = to_vcs_path(path);
    let revisions = service.revisions_for(&path);
    let revision = match change_set {
        Some(id) => revisions
            .into_iter()
            .find(|revision| revision.change_set == ChangeSetId(id)),
        None => revisions.into_iter().next(),
    };
    let Some(revision) = revision else {
        bail!("no such revision of {path}");
    };

    match revision.entry.as_ref() {
        Entry::File { content, .. } => match content.bytes() {
            Some(bytes) => std::io::stdout().write_all(bytes)?,
            None => println!("<content not kept: {} bytes>", content.len()),
        },
        Entry::Directory { children, .. } => {
            for child in children {
                let suffix = if child.is_directory() { "/" } else { "" };
                println!("{}{}", child.name(), suffix);
            }
        }
    }
    Ok(())
}
