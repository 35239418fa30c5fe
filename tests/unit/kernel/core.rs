use super::*;
use crate::kernel::services::adapters::{FileFilter, MemoryGateway};
use crate::kernel::scope::REFRESH_LABEL;
use crate::models::{CaseSensitivity, Clock};

fn p(path: &str) -> VcsPath {
    VcsPath::new(path)
}

fn setup() -> (Arc<MemoryGateway>, HistoryCore) {
    let filter = FileFilter::new(
        vec![p("/proj")],
        &[".git"],
        &["**/*.log"],
        CaseSensitivity::Sensitive,
    )
    .unwrap();
    let gateway = Arc::new(MemoryGateway::new(filter));
    let clock_gateway = gateway.clone();
    let clock: Clock = Arc::new(move || clock_gateway.now());
    let vcs = LocalVcs::with_clock(CaseSensitivity::Sensitive, clock);
    let core = HistoryCore::new(vcs, gateway.clone(), 1024);
    (gateway, core)
}

fn text(content: &Content) -> String {
    String::from_utf8(content.bytes().unwrap().to_vec()).unwrap()
}

fn current_text(core: &HistoryCore, path: &str) -> String {
    text(core.vcs().entry(&p(path)).unwrap().content().unwrap())
}

#[test]
fn test_events_outside_scope_are_atomic() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.txt"), "1");
    core.file_event(&FsEvent::created("/proj/a.txt"));
    gw.write_file(&p("/proj/a.txt"), "2");
    core.file_event(&FsEvent::contents_changed("/proj/a.txt"));

    assert_eq!(core.vcs().revisions_for(&p("/proj/a.txt")).len(), 2);
    assert_eq!(core.vcs().change_sets().len(), 2);
    assert_eq!(current_text(&core, "/proj/a.txt"), "2");
}

#[test]
fn test_created_directory_is_recorded_recursively_in_one_change_set() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/dir/one"), "1");
    gw.write_file(&p("/proj/dir/sub/two"), "2");
    gw.write_file(&p("/proj/dir/.git/HEAD"), "ref");

    core.file_event(&FsEvent::created("/proj/dir"));

    assert_eq!(core.vcs().change_sets().len(), 1);
    assert!(core.vcs().has_entry(&p("/proj/dir/one")));
    assert!(core.vcs().has_entry(&p("/proj/dir/sub/two")));
    assert!(!core.vcs().has_entry(&p("/proj/dir/.git")));
    assert_eq!(core.vcs().revisions_for(&p("/proj/dir")).len(), 1);
}

#[test]
fn test_filtered_files_leave_no_trace() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/.git/HEAD"), "ref");
    gw.write_file(&p("/proj/build.log"), "x");

    core.file_event(&FsEvent::created("/proj/.git"));
    core.file_event(&FsEvent::created("/proj/build.log"));
    core.file_event(&FsEvent::contents_changed("/proj/build.log"));
    gw.create_dir(&p("/proj/out"));
    gw.rename(&p("/proj/build.log"), &p("/proj/out/build.log"));
    for event in FsEvent::relocated(&p("/proj/build.log"), &p("/proj/out/build.log")) {
        core.file_event(&event);
    }

    assert!(!core.vcs().has_entry(&p("/proj/.git")));
    assert!(!core.vcs().has_entry(&p("/proj/build.log")));
    assert!(!core.vcs().has_entry(&p("/proj/out/build.log")));
    assert!(core.vcs().change_sets().is_empty());
}

#[test]
fn test_events_outside_content_roots_are_ignored() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/elsewhere/a.txt"), "x");
    core.file_event(&FsEvent::created("/elsewhere/a.txt"));
    assert!(!core.vcs().has_entry(&p("/elsewhere/a.txt")));
}

#[test]
fn test_contents_changed_creates_missing_entry() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/src/new.rs"), "fn main() {}");
    core.file_event(&FsEvent::contents_changed("/proj/src/new.rs"));
    assert_eq!(current_text(&core, "/proj/src/new.rs"), "fn main() {}");
}

#[test]
fn test_large_file_keeps_only_length() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/big.bin"), vec![7u8; 2048]);
    core.file_event(&FsEvent::created("/proj/big.bin"));

    let entry = core.vcs().entry(&p("/proj/big.bin")).unwrap();
    assert_eq!(
        entry.content(),
        Some(&Content::Unavailable { length: 2048 })
    );
}

#[test]
fn test_same_length_rewrite_of_large_file_is_recorded() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/big.bin"), vec![1u8; 2048]);
    core.file_event(&FsEvent::created("/proj/big.bin"));

    gw.advance(10);
    gw.write_file(&p("/proj/big.bin"), vec![2u8; 2048]);
    core.file_event(&FsEvent::contents_changed("/proj/big.bin"));

    assert_eq!(core.vcs().revisions_for(&p("/proj/big.bin")).len(), 2);
}

#[test]
fn test_deleting_untracked_file_is_a_no_op() {
    let (_gw, mut core) = setup();
    core.file_event(&FsEvent::deleted("/proj/never-seen"));
    assert!(core.vcs().change_sets().is_empty());
}

#[test]
fn test_delete_removes_entry() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.txt"), "1");
    core.file_event(&FsEvent::created("/proj/a.txt"));
    gw.remove(&p("/proj/a.txt"));
    core.file_event(&FsEvent::deleted("/proj/a.txt"));

    assert!(!core.vcs().has_entry(&p("/proj/a.txt")));
    assert_eq!(core.vcs().change_sets().len(), 2);
}

#[test]
fn test_rename_keeps_history() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.txt"), "1");
    core.file_event(&FsEvent::created("/proj/a.txt"));
    gw.rename(&p("/proj/a.txt"), &p("/proj/b.txt"));
    core.file_event(&FsEvent::PropertyChanged {
        path: p("/proj/b.txt"),
        property: FileProperty::Name,
        old_value: "a.txt".to_string(),
    });

    assert!(!core.vcs().has_entry(&p("/proj/a.txt")));
    assert_eq!(core.vcs().revisions_for(&p("/proj/b.txt")).len(), 2);
    assert_eq!(current_text(&core, "/proj/b.txt"), "1");
}

#[test]
fn test_other_property_changes_are_ignored() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.txt"), "1");
    core.file_event(&FsEvent::created("/proj/a.txt"));
    core.file_event(&FsEvent::PropertyChanged {
        path: p("/proj/a.txt"),
        property: FileProperty::Other("writable".to_string()),
        old_value: "true".to_string(),
    });
    assert_eq!(core.vcs().change_sets().len(), 1);
}

#[test]
fn test_move_between_tracked_directories_keeps_history() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/src/f.rs"), "x");
    core.file_event(&FsEvent::created("/proj/src/f.rs"));
    gw.create_dir(&p("/proj/dst"));
    gw.rename(&p("/proj/src/f.rs"), &p("/proj/dst/f.rs"));
    core.file_event(&FsEvent::Moved {
        path: p("/proj/dst/f.rs"),
        old_parent: p("/proj/src"),
        new_parent: p("/proj/dst"),
    });

    assert!(!core.vcs().has_entry(&p("/proj/src/f.rs")));
    assert_eq!(core.vcs().revisions_for(&p("/proj/dst/f.rs")).len(), 2);
}

#[test]
fn test_move_with_rename_keeps_history() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a/x.txt"), "x");
    core.file_event(&FsEvent::created("/proj/a/x.txt"));
    gw.create_dir(&p("/proj/b"));
    core.file_event(&FsEvent::created("/proj/b"));

    gw.rename(&p("/proj/a/x.txt"), &p("/proj/b/y.txt"));
    core.start_action(Some("Move".to_string()));
    for event in FsEvent::relocated(&p("/proj/a/x.txt"), &p("/proj/b/y.txt")) {
        core.file_event(&event);
    }
    core.finish_latest_action().unwrap();

    assert!(!core.vcs().has_entry(&p("/proj/a/x.txt")));
    assert!(!core.vcs().has_entry(&p("/proj/b/x.txt")));
    let revisions = core.vcs().revisions_for(&p("/proj/b/y.txt"));
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0].cause_label(), Some("Move"));
    assert_eq!(current_text(&core, "/proj/b/y.txt"), "x");
}

#[test]
fn test_move_with_rename_leaves_file_at_old_name_alone() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a/x.txt"), "moved");
    gw.write_file(&p("/proj/b/x.txt"), "resident");
    core.file_event(&FsEvent::created("/proj/a"));
    core.file_event(&FsEvent::created("/proj/b"));

    gw.rename(&p("/proj/a/x.txt"), &p("/proj/b/y.txt"));
    for event in FsEvent::relocated(&p("/proj/a/x.txt"), &p("/proj/b/y.txt")) {
        core.file_event(&event);
    }

    assert!(!core.vcs().has_entry(&p("/proj/a/x.txt")));
    assert_eq!(current_text(&core, "/proj/b/x.txt"), "resident");
    assert_eq!(current_text(&core, "/proj/b/y.txt"), "moved");
}

#[test]
fn test_moved_file_leaves_a_revision_on_its_old_directory() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/src/f.rs"), "x");
    gw.create_dir(&p("/proj/dst"));
    core.file_event(&FsEvent::created("/proj/src"));
    core.file_event(&FsEvent::created("/proj/dst"));
    let before = core.vcs().revisions_for(&p("/proj/src")).len();

    gw.rename(&p("/proj/src/f.rs"), &p("/proj/dst/f.rs"));
    core.file_event(&FsEvent::Moved {
        path: p("/proj/dst/f.rs"),
        old_parent: p("/proj/src"),
        new_parent: p("/proj/dst"),
    });

    let revisions = core.vcs().revisions_for(&p("/proj/src"));
    assert_eq!(revisions.len(), before + 1);
    assert!(revisions[0].entry.children().is_empty());
}

#[test]
fn test_move_out_of_content_root_is_a_delete() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/f"), "x");
    core.file_event(&FsEvent::created("/proj/f"));
    gw.rename(&p("/proj/f"), &p("/other/f"));
    core.file_event(&FsEvent::Moved {
        path: p("/other/f"),
        old_parent: p("/proj"),
        new_parent: p("/other"),
    });

    assert!(!core.vcs().has_entry(&p("/proj/f")));
    assert!(!core.vcs().has_entry(&p("/other/f")));
}

#[test]
fn test_move_into_content_root_is_a_create() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/other/g"), "x");
    gw.rename(&p("/other/g"), &p("/proj/g"));
    core.file_event(&FsEvent::Moved {
        path: p("/proj/g"),
        old_parent: p("/other"),
        new_parent: p("/proj"),
    });

    assert_eq!(current_text(&core, "/proj/g"), "x");
    assert_eq!(core.vcs().revisions_for(&p("/proj/g")).len(), 1);
}

#[test]
fn test_rename_to_excluded_name_is_a_delete() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/out.txt"), "x");
    core.file_event(&FsEvent::created("/proj/out.txt"));
    gw.rename(&p("/proj/out.txt"), &p("/proj/out.log"));
    for event in FsEvent::relocated(&p("/proj/out.txt"), &p("/proj/out.log")) {
        core.file_event(&event);
    }

    assert!(!core.vcs().has_entry(&p("/proj/out.txt")));
    assert!(!core.vcs().has_entry(&p("/proj/out.log")));
}

#[test]
fn test_rename_over_existing_entry_updates_target() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.txt"), "1");
    core.file_event(&FsEvent::created("/proj/a.txt"));
    gw.write_file(&p("/proj/a.txt.tmp"), "2");
    core.file_event(&FsEvent::created("/proj/a.txt.tmp"));

    gw.rename(&p("/proj/a.txt.tmp"), &p("/proj/a.txt"));
    for event in FsEvent::relocated(&p("/proj/a.txt.tmp"), &p("/proj/a.txt")) {
        core.file_event(&event);
    }

    assert!(!core.vcs().has_entry(&p("/proj/a.txt.tmp")));
    assert_eq!(current_text(&core, "/proj/a.txt"), "2");
    assert_eq!(core.vcs().revisions_for(&p("/proj/a.txt")).len(), 2);
}

#[test]
fn test_unreadable_file_does_not_abort_batch() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a"), "a");
    gw.write_file(&p("/proj/b"), "b");
    gw.set_unreadable(&p("/proj/a"), true);

    core.before_refresh_start(false);
    core.file_event(&FsEvent::created("/proj/a"));
    core.file_event(&FsEvent::created("/proj/b"));
    core.after_refresh_finish(false).unwrap();

    assert!(!core.vcs().has_entry(&p("/proj/a")));
    assert!(core.vcs().has_entry(&p("/proj/b")));
    assert_eq!(core.vcs().change_sets().len(), 1);
}

#[test]
fn test_refresh_closes_with_external_change_label() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a"), "a");
    gw.write_file(&p("/proj/b"), "b");

    core.before_refresh_start(true);
    core.file_event(&FsEvent::created("/proj/a"));
    core.file_event(&FsEvent::created("/proj/b"));
    core.after_refresh_finish(true).unwrap();

    let change_sets = core.vcs().change_sets();
    assert_eq!(change_sets.len(), 1);
    assert_eq!(change_sets[0].label.as_deref(), Some(REFRESH_LABEL));
}

#[test]
fn test_unsaved_documents_of_unknown_or_filtered_files_are_skipped() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.log"), "x");
    gw.set_unsaved_document(&p("/proj/a.log"), "edited");
    gw.set_unsaved_document(&p("/proj/unknown.txt"), "edited");

    let token = core.start_action(Some("edit".to_string()));
    core.finish_action(token).unwrap();

    assert!(core.vcs().change_sets().is_empty());
    assert!(!gw.has_unsaved_documents());
}

#[test]
fn test_unsaved_document_recorded_at_scope_boundary() {
    let (gw, mut core) = setup();
    gw.write_file(&p("/proj/a.txt"), "disk");
    core.file_event(&FsEvent::created("/proj/a.txt"));

    gw.set_unsaved_document(&p("/proj/a.txt"), "buffer");
    core.command_started(&CommandEvent::named("Type")).unwrap();
    core.command_finished(&CommandEvent::unnamed()).unwrap();

    assert_eq!(current_text(&core, "/proj/a.txt"), "buffer");
    let revisions = core.vcs().revisions_for(&p("/proj/a.txt"));
    assert_eq!(revisions.len(), 2);
    assert_eq!(revisions[0].cause_label(), Some("Type"));
}

#[test]
fn test_finish_latest_action_without_action_fails() {
    let (_gw, mut core) = setup();
    assert_eq!(
        core.finish_latest_action(),
        Err(ScopeError::ActionNotStarted)
    );
    assert!(!core.vcs().is_change_set_open());
}

#[test]
fn test_misuse_leaves_state_unchanged() {
    let (_gw, mut core) = setup();
    core.command_started(&CommandEvent::unnamed()).unwrap();
    assert_eq!(
        core.command_started(&CommandEvent::unnamed()),
        Err(ScopeError::CommandAlreadyStarted)
    );
    assert_eq!(core.vcs().change_set_depth(), 1);
    core.command_finished(&CommandEvent::unnamed()).unwrap();
    assert_eq!(
        core.command_finished(&CommandEvent::unnamed()),
        Err(ScopeError::CommandNotStarted)
    );
    assert_eq!(core.vcs().change_set_depth(), 0);
}
