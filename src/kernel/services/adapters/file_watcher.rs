use crate::kernel::event::FsEvent;
use crate::models::VcsPath;
use notify::event::{ModifyKind, RenameMode};
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Raw notification reduced to what history cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RawChange {
    Appeared(PathBuf),
    Vanished(PathBuf),
    Written(PathBuf),
    Moved { from: PathBuf, to: PathBuf },
}

/// Watches content roots and turns raw notifications into history events.
/// The notify thread only forwards into a channel; translation happens on
/// the thread that calls `drain_events`.
pub struct FileWatcherService {
    _watcher: RecommendedWatcher,
    inbox: mpsc::Receiver<notify::Event>,
    roots: Vec<PathBuf>,
}

impl FileWatcherService {
    pub fn new(roots: &[PathBuf]) -> Result<Self, notify::Error> {
        let roots: Vec<PathBuf> = roots
            .iter()
            .map(|root| root.canonicalize().unwrap_or_else(|_| root.clone()))
            .collect();
        let (tx, inbox) = mpsc::channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let _ = tx.send(event);
                }
                Err(err) => tracing::debug!(error = %err, "watch error"),
            },
            Config::default().with_poll_interval(POLL_INTERVAL),
        )?;
        for root in &roots {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }
        Ok(Self {
            _watcher: watcher,
            inbox,
            roots,
        })
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Everything received since the last drain, in arrival order. Repeated
    /// writes to one path collapse into the first.
    pub fn drain_events(&mut self) -> Vec<FsEvent> {
        let mut events = Vec::new();
        let mut written: FxHashSet<PathBuf> = FxHashSet::default();
        while let Ok(event) = self.inbox.try_recv() {
            for change in classify(event) {
                self.translate(change, &mut written, &mut events);
            }
        }
        events
    }

    fn translate(
        &self,
        change: RawChange,
        written: &mut FxHashSet<PathBuf>,
        events: &mut Vec<FsEvent>,
    ) {
        let vcs = |path: &Path| VcsPath::from_fs(path);
        match change {
            RawChange::Appeared(path) if path.exists() && self.is_watched(&path) => {
                written.remove(&path);
                events.push(FsEvent::created(vcs(&path)));
            }
            RawChange::Vanished(path) if self.is_watched(&path) => {
                written.remove(&path);
                events.push(FsEvent::deleted(vcs(&path)));
            }
            RawChange::Written(path) => {
                let is_file = path.metadata().is_ok_and(|meta| meta.is_file());
                if is_file && self.is_watched(&path) && written.insert(path.clone()) {
                    events.push(FsEvent::contents_changed(vcs(&path)));
                }
            }
            RawChange::Moved { from, to } => {
                written.remove(&from);
                written.remove(&to);
                let source = self.is_watched(&from);
                let target = self.is_watched(&to);
                if source && target {
                    events.extend(FsEvent::relocated(&vcs(&from), &vcs(&to)));
                } else if source {
                    events.push(FsEvent::deleted(vcs(&from)));
                } else if target && to.exists() {
                    events.push(FsEvent::created(vcs(&to)));
                }
            }
            RawChange::Appeared(_) | RawChange::Vanished(_) => {}
        }
    }

    fn is_watched(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| path.starts_with(root))
    }
}

fn each(paths: Vec<PathBuf>, make: fn(PathBuf) -> RawChange) -> Vec<RawChange> {
    paths.into_iter().map(make).collect()
}

/// Half-renames (only one side reported) degrade to a delete or a create.
/// Metadata-only notifications carry no content and are dropped.
fn classify(event: notify::Event) -> Vec<RawChange> {
    let notify::Event { kind, paths, .. } = event;
    match kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
            each(paths, RawChange::Appeared)
        }
        EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
            each(paths, RawChange::Vanished)
        }
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() >= 2 => {
            let mut paths = paths.into_iter();
            match (paths.next(), paths.next()) {
                (Some(from), Some(to)) => vec![RawChange::Moved { from, to }],
                _ => Vec::new(),
            }
        }
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(_) => each(paths, RawChange::Written),
        _ => Vec::new(),
    }
}
