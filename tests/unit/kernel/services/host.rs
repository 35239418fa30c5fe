use super::*;
use crate::kernel::scope::ScopeError;
use parking_lot::Mutex;

#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<String>>,
    reject: bool,
}

impl Recorder {
    fn rejecting() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    fn push(&self, call: String) -> Result<(), ScopeError> {
        self.calls.lock().push(call);
        if self.reject {
            Err(ScopeError::CommandNotStarted)
        } else {
            Ok(())
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

impl CommandListener for Recorder {
    fn command_started(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        self.push(format!("command_started {:?}", event.name))
    }

    fn command_finished(&self, event: &CommandEvent) -> Result<(), ScopeError> {
        self.push(format!("command_finished {:?}", event.name))
    }
}

impl RefreshListener for Recorder {
    fn before_refresh_start(&self, asynchronous: bool) -> Result<(), ScopeError> {
        self.push(format!("before_refresh_start {asynchronous}"))
    }

    fn after_refresh_finish(&self, asynchronous: bool) -> Result<(), ScopeError> {
        self.push(format!("after_refresh_finish {asynchronous}"))
    }
}

impl FsListener for Recorder {
    fn file_event(&self, event: &FsEvent) {
        let _ = self.push(format!("file_event {}", event.path()));
    }
}

#[test]
fn test_add_and_remove_listeners() {
    let mut host = Host::new();
    let recorder = Arc::new(Recorder::default());

    let command = host.add_command_listener(recorder.clone());
    let refresh = host.add_refresh_listener(recorder.clone());
    let fs = host.add_fs_listener(recorder.clone());
    assert_eq!(host.listener_count(), 3);
    assert_ne!(command, refresh);
    assert_ne!(refresh, fs);

    assert!(host.remove_command_listener(command));
    assert!(!host.remove_command_listener(command));
    assert!(!host.remove_refresh_listener(command));
    assert!(host.remove_refresh_listener(refresh));
    assert!(host.remove_fs_listener(fs));
    assert_eq!(host.listener_count(), 0);
}

#[test]
fn test_fire_reaches_listeners_in_order() {
    let mut host = Host::new();
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());
    host.add_command_listener(first.clone());
    host.add_command_listener(second.clone());

    host.fire_command_started(&CommandEvent::named("Paste"));
    host.fire_command_finished(&CommandEvent::unnamed());

    let expected = vec![
        "command_started Some(\"Paste\")".to_string(),
        "command_finished None".to_string(),
    ];
    assert_eq!(first.calls(), expected);
    assert_eq!(second.calls(), expected);
}

#[test]
fn test_rejections_do_not_stop_delivery() {
    let mut host = Host::new();
    let rejecting = Arc::new(Recorder::rejecting());
    let accepting = Arc::new(Recorder::default());
    host.add_command_listener(rejecting.clone());
    host.add_command_listener(accepting.clone());

    host.fire_command_finished(&CommandEvent::unnamed());

    assert_eq!(rejecting.calls().len(), 1);
    assert_eq!(accepting.calls().len(), 1);
}

#[test]
fn test_refresh_wraps_events() {
    let mut host = Host::new();
    let recorder = Arc::new(Recorder::default());
    host.add_refresh_listener(recorder.clone());
    host.add_fs_listener(recorder.clone());

    host.refresh(
        true,
        &[FsEvent::created("/proj/a"), FsEvent::deleted("/proj/b")],
    );

    assert_eq!(
        recorder.calls(),
        vec![
            "before_refresh_start true".to_string(),
            "file_event /proj/a".to_string(),
            "file_event /proj/b".to_string(),
            "after_refresh_finish true".to_string(),
        ]
    );
}

#[test]
fn test_removed_listener_is_not_notified() {
    let mut host = Host::new();
    let recorder = Arc::new(Recorder::default());
    let id = host.add_fs_listener(recorder.clone());
    host.remove_fs_listener(id);

    host.fire_file_event(&FsEvent::contents_changed("/proj/a"));
    assert!(recorder.calls().is_empty());
}
