use super::*;
use crate::kernel::core::HistoryCore;
use crate::kernel::services::adapters::{FileFilter, MemoryGateway};
use crate::kernel::services::ports::Gateway;
use crate::models::{CaseSensitivity, Clock, LocalVcs};
use std::sync::Arc;

fn p(path: &str) -> VcsPath {
    VcsPath::new(path)
}

fn setup() -> (Arc<MemoryGateway>, FileListener) {
    let filter =
        FileFilter::new(vec![p("/proj")], &[".git"], &[], CaseSensitivity::Sensitive).unwrap();
    let gateway = Arc::new(MemoryGateway::new(filter));
    let clock_gateway = gateway.clone();
    let clock: Clock = Arc::new(move || clock_gateway.now());
    let vcs = LocalVcs::with_clock(CaseSensitivity::Sensitive, clock);
    let core = HistoryCore::new(vcs, gateway.clone(), 1024).into_shared();
    (gateway, FileListener::new(core))
}

fn change_set_labels(listener: &FileListener) -> Vec<Option<String>> {
    listener
        .core
        .lock()
        .vcs()
        .change_sets()
        .into_iter()
        .map(|info| info.label)
        .collect()
}

#[test]
fn test_paired_action_groups_events() {
    let (gw, listener) = setup();
    gw.write_file(&p("/proj/a"), "a");
    gw.write_file(&p("/proj/b"), "b");

    listener.start_action("Format");
    listener.file_created(&p("/proj/a"));
    listener.file_created(&p("/proj/b"));
    listener.finish_action().unwrap();

    assert_eq!(change_set_labels(&listener), vec![Some("Format".to_string())]);
}

#[test]
fn test_finish_action_closes_latest() {
    let (gw, listener) = setup();
    gw.write_file(&p("/proj/a"), "a");

    listener.start_action("outer");
    listener.start_action("inner");
    listener.file_created(&p("/proj/a"));
    listener.finish_action().unwrap();
    assert_eq!(listener.core.lock().scope().open_actions(), 1);
    listener.finish_action().unwrap();

    assert_eq!(change_set_labels(&listener), vec![Some("outer".to_string())]);
}

#[test]
fn test_finish_action_without_start_fails() {
    let (_gw, listener) = setup();
    assert_eq!(listener.finish_action(), Err(ScopeError::ActionNotStarted));
}

#[test]
fn test_command_finished_without_start_fails() {
    let (_gw, listener) = setup();
    assert_eq!(
        listener.command_finished(&CommandEvent::named("Undo")),
        Err(ScopeError::CommandNotStarted)
    );
    assert!(listener.core.lock().scope().is_idle());
}

#[test]
fn test_double_command_start_fails() {
    let (_gw, listener) = setup();
    listener.command_started(&CommandEvent::unnamed()).unwrap();
    assert_eq!(
        listener.command_started(&CommandEvent::unnamed()),
        Err(ScopeError::CommandAlreadyStarted)
    );
    listener.command_finished(&CommandEvent::unnamed()).unwrap();
    assert!(listener.core.lock().scope().is_idle());
}

#[test]
fn test_file_callbacks_outside_scope() {
    let (gw, listener) = setup();
    gw.write_file(&p("/proj/a"), "1");
    listener.file_created(&p("/proj/a"));
    gw.write_file(&p("/proj/a"), "2");
    listener.contents_changed(&p("/proj/a"));
    gw.remove(&p("/proj/a"));
    listener.file_deleted(&p("/proj/a"));

    let core = listener.core.lock();
    assert!(!core.vcs().has_entry(&p("/proj/a")));
    assert_eq!(core.vcs().change_sets().len(), 3);
}

#[test]
fn test_refresh_callbacks() {
    let (gw, listener) = setup();
    gw.write_file(&p("/proj/a"), "a");
    listener.before_refresh_start(false);
    listener.file_created(&p("/proj/a"));
    listener.after_refresh_finish(false).unwrap();

    assert_eq!(
        change_set_labels(&listener),
        vec![Some("External Change".to_string())]
    );
    assert_eq!(
        listener.after_refresh_finish(false),
        Err(ScopeError::RefreshNotStarted)
    );
}
