use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use notify::EventKind;
use notify::event::{
    AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};

use super::debouncer::{DEBOUNCE_MS, Debouncer, is_qualifying, is_temp_file};
use super::watch_set::WatchSet;
use super::{NotifyResult, RebuildLoop, SourceWatcher};

fn make_event(path: &str, kind: EventKind) -> notify::Event {
    notify::Event {
        kind,
        paths: vec![PathBuf::from(path)],
        attrs: Default::default(),
    }
}

fn modify_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Data(DataChange::Any))
}

fn metadata_kind() -> EventKind {
    EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime))
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

// ============================================================================
// Debouncer
// ============================================================================

#[test]
fn test_debouncer_idle() {
    let mut debouncer = Debouncer::new();
    assert!(!debouncer.is_pending());
    assert!(!debouncer.fire(Instant::now()));
}

#[test]
fn test_debouncer_fires_after_window() {
    let mut debouncer = Debouncer::new();
    let t0 = Instant::now();

    assert!(debouncer.observe(&make_event("/s/a.md", modify_kind()), t0));
    assert_eq!(debouncer.deadline(), Some(t0 + ms(DEBOUNCE_MS)));
    assert!(!debouncer.fire(t0 + ms(DEBOUNCE_MS - 1)));
    assert!(debouncer.fire(t0 + ms(DEBOUNCE_MS)));
    assert!(!debouncer.is_pending());
    assert!(!debouncer.fire(t0 + ms(DEBOUNCE_MS * 2)));
}

#[test]
fn test_debouncer_new_event_replaces_deadline() {
    let mut debouncer = Debouncer::new();
    let t0 = Instant::now();

    debouncer.observe(&make_event("/s/a.md", modify_kind()), t0);
    debouncer.observe(&make_event("/s/b.md", modify_kind()), t0 + ms(400));

    assert!(!debouncer.fire(t0 + ms(600)));
    assert!(debouncer.fire(t0 + ms(900)));
}

#[test]
fn test_debouncer_ignores_non_qualifying() {
    let mut debouncer = Debouncer::with_window(ms(100));
    let t0 = Instant::now();

    debouncer.observe(&make_event("/s/a.md", modify_kind()), t0);
    assert!(!debouncer.observe(&make_event("/s/a.md", metadata_kind()), t0 + ms(90)));

    assert_eq!(debouncer.deadline(), Some(t0 + ms(100)));
}

#[test]
fn test_qualifying_kinds() {
    assert!(is_qualifying(&make_event("/s/a.md", modify_kind())));
    assert!(is_qualifying(&make_event(
        "/s/a.md",
        EventKind::Create(CreateKind::File)
    )));
    assert!(is_qualifying(&make_event(
        "/s/a.md",
        EventKind::Remove(RemoveKind::File)
    )));
    assert!(is_qualifying(&make_event(
        "/s/a.md",
        EventKind::Modify(ModifyKind::Name(notify::event::RenameMode::Any))
    )));

    assert!(!is_qualifying(&make_event("/s/a.md", metadata_kind())));
    assert!(!is_qualifying(&make_event(
        "/s/a.md",
        EventKind::Access(AccessKind::Any)
    )));
    assert!(!is_qualifying(&make_event("/s/a.md", EventKind::Other)));
}

#[test]
fn test_temp_files_do_not_qualify() {
    assert!(!is_qualifying(&make_event("/s/.a.md.swp", modify_kind())));
    assert!(!is_qualifying(&make_event("/s/a.md~", modify_kind())));

    let mixed = notify::Event {
        kind: modify_kind(),
        paths: vec![PathBuf::from("/s/a.md.tmp"), PathBuf::from("/s/a.md")],
        attrs: Default::default(),
    };
    assert!(is_qualifying(&mixed));
}

#[test]
fn test_is_temp_file() {
    assert!(is_temp_file(std::path::Path::new("notes/a.md.bak")));
    assert!(is_temp_file(std::path::Path::new(".hidden")));
    assert!(!is_temp_file(std::path::Path::new("notes/a.md")));
}

// ============================================================================
// RebuildLoop (virtual time)
// ============================================================================

struct Harness {
    events: mpsc::Sender<NotifyResult>,
    shutdown: watch::Sender<bool>,
    count: Arc<AtomicUsize>,
    task: JoinHandle<usize>,
}

impl Harness {
    fn start() -> Self {
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let (events, events_rx) = mpsc::channel(64);
        let (shutdown, shutdown_rx) = watch::channel(false);

        let rebuild_loop = RebuildLoop::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let task = tokio::spawn(rebuild_loop.run(events_rx, shutdown_rx));

        Self {
            events,
            shutdown,
            count,
            task,
        }
    }

    async fn send(&self, kind: EventKind) {
        self.events
            .send(Ok(make_event("/site/src/a.md", kind)))
            .await
            .unwrap();
    }

    fn rebuilds(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }

    async fn stop(self) -> usize {
        self.shutdown.send(true).unwrap();
        self.task.await.unwrap()
    }
}

#[tokio::test(start_paused = true)]
async fn test_burst_triggers_one_rebuild() {
    let harness = Harness::start();

    for _ in 0..5 {
        harness.send(modify_kind()).await;
        sleep(ms(100)).await;
    }
    // Last event at t=400; deadline at t=900.
    assert_eq!(harness.rebuilds(), 0);

    sleep(ms(350)).await; // t=850
    assert_eq!(harness.rebuilds(), 0);

    sleep(ms(100)).await; // t=950
    assert_eq!(harness.rebuilds(), 1);

    sleep(ms(2000)).await;
    assert_eq!(harness.rebuilds(), 1);
    assert_eq!(harness.stop().await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_window_measures_quiescence() {
    let harness = Harness::start();

    harness.send(modify_kind()).await;
    sleep(ms(450)).await;
    harness.send(EventKind::Create(CreateKind::File)).await;

    sleep(ms(150)).await; // t=600, past the first event's deadline
    assert_eq!(harness.rebuilds(), 0);

    sleep(ms(400)).await; // t=1000
    assert_eq!(harness.rebuilds(), 1);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_separate_bursts_rebuild_separately() {
    let harness = Harness::start();

    harness.send(modify_kind()).await;
    sleep(ms(600)).await;
    assert_eq!(harness.rebuilds(), 1);

    harness.send(EventKind::Remove(RemoveKind::File)).await;
    sleep(ms(600)).await;
    assert_eq!(harness.rebuilds(), 2);

    assert_eq!(harness.stop().await, 2);
}

#[tokio::test(start_paused = true)]
async fn test_non_qualifying_events_do_not_reset_timer() {
    let harness = Harness::start();

    harness.send(metadata_kind()).await;
    sleep(ms(1000)).await;
    assert_eq!(harness.rebuilds(), 0);

    harness.send(modify_kind()).await; // t=1000, deadline t=1500
    sleep(ms(400)).await;
    harness.send(metadata_kind()).await;
    harness.send(EventKind::Access(AccessKind::Any)).await;
    sleep(ms(150)).await; // t=1550
    assert_eq!(harness.rebuilds(), 1);

    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_notify_error_keeps_loop_running() {
    let harness = Harness::start();

    harness
        .events
        .send(Err(notify::Error::generic("watch queue overflow")))
        .await
        .unwrap();
    harness.send(modify_kind()).await;
    sleep(ms(600)).await;

    assert_eq!(harness.rebuilds(), 1);
    harness.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_abandons_pending_rebuild() {
    let harness = Harness::start();

    harness.send(modify_kind()).await;
    sleep(ms(100)).await;

    let count = Arc::clone(&harness.count);
    assert_eq!(harness.stop().await, 0);

    sleep(ms(1000)).await;
    assert_eq!(count.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn test_closed_channel_ends_loop() {
    let Harness {
        events,
        shutdown,
        task,
        ..
    } = Harness::start();

    drop(events);
    assert_eq!(task.await.unwrap(), 0);
    drop(shutdown);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_before_run() {
    let (_events, events_rx) = mpsc::channel::<NotifyResult>(1);
    let (shutdown, shutdown_rx) = watch::channel(false);
    shutdown.send(true).unwrap();

    let rebuilds = RebuildLoop::new(|| {}).run(events_rx, shutdown_rx).await;
    assert_eq!(rebuilds, 0);
}

// ============================================================================
// Watch set and real watcher
// ============================================================================

fn source_tree() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let source = temp.path().canonicalize().unwrap().join("src");
    fs::create_dir_all(source.join("notes/deep")).unwrap();
    fs::create_dir_all(source.join("assets")).unwrap();
    (temp, source)
}

#[test]
fn test_watch_set_snapshot() {
    let (_temp, source) = source_tree();
    let set = WatchSet::snapshot(&source).unwrap();

    assert_eq!(set.len(), 4);
    assert!(set.contains(&source));
    assert!(set.contains(&source.join("notes/deep")));
}

#[test]
fn test_watch_set_tracks_created_and_removed_dirs() {
    let (_temp, source) = source_tree();
    let mut watcher = notify::recommended_watcher(|_: NotifyResult| {}).unwrap();
    let mut set = WatchSet::snapshot(&source).unwrap();
    set.attach(&mut watcher).unwrap();

    let fresh = source.join("fresh");
    fs::create_dir_all(fresh.join("inner")).unwrap();
    let created = notify::Event {
        kind: EventKind::Create(CreateKind::Folder),
        paths: vec![fresh.clone()],
        attrs: Default::default(),
    };
    assert_eq!(set.update(&mut watcher, &created), 2);
    assert!(set.contains(&fresh.join("inner")));
    // Already tracked.
    assert_eq!(set.update(&mut watcher, &created), 0);

    fs::remove_dir_all(&fresh).unwrap();
    let removed = notify::Event {
        kind: EventKind::Remove(RemoveKind::Folder),
        paths: vec![fresh.clone()],
        attrs: Default::default(),
    };
    set.update(&mut watcher, &removed);
    assert!(!set.contains(&fresh));
    assert!(!set.contains(&fresh.join("inner")));
    assert_eq!(set.len(), 4);
}

#[test]
fn test_watch_set_reattaches_dir_moved_back_in() {
    let (temp, source) = source_tree();
    let mut watcher = notify::recommended_watcher(|_: NotifyResult| {}).unwrap();
    let mut set = WatchSet::snapshot(&source).unwrap();
    set.attach(&mut watcher).unwrap();

    let notes = source.join("notes");
    let parked = temp.path().canonicalize().unwrap().join("parked");
    fs::rename(&notes, &parked).unwrap();
    let moved_out = notify::Event {
        kind: EventKind::Modify(ModifyKind::Name(RenameMode::From)),
        paths: vec![notes.clone()],
        attrs: Default::default(),
    };
    set.update(&mut watcher, &moved_out);
    assert!(!set.contains(&notes));
    assert!(!set.contains(&notes.join("deep")));

    fs::rename(&parked, &notes).unwrap();
    let moved_in = notify::Event {
        kind: EventKind::Modify(ModifyKind::Name(RenameMode::To)),
        paths: vec![notes.clone()],
        attrs: Default::default(),
    };
    assert_eq!(set.update(&mut watcher, &moved_in), 2);
    assert!(set.contains(&notes.join("deep")));
}

#[test]
fn test_watch_set_rename_within_tree() {
    let (_temp, source) = source_tree();
    let mut watcher = notify::recommended_watcher(|_: NotifyResult| {}).unwrap();
    let mut set = WatchSet::snapshot(&source).unwrap();
    set.attach(&mut watcher).unwrap();

    let from = source.join("notes");
    let to = source.join("journal");
    fs::rename(&from, &to).unwrap();
    let renamed = notify::Event {
        kind: EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        paths: vec![from.clone(), to.clone()],
        attrs: Default::default(),
    };

    assert_eq!(set.update(&mut watcher, &renamed), 2);
    assert!(!set.contains(&from));
    assert!(set.contains(&to.join("deep")));
    assert_eq!(set.len(), 4);
}

#[test]
fn test_source_watcher_missing_root_fails() {
    let temp = TempDir::new().unwrap();
    assert!(SourceWatcher::start(&temp.path().join("missing")).is_err());
}

#[test]
fn test_spawned_loop_rebuilds_on_change() {
    let (_temp, source) = source_tree();
    let watcher = SourceWatcher::start(&source).unwrap();
    assert_eq!(watcher.watched_dirs(), 4);

    let (rebuilt_tx, rebuilt_rx) = std::sync::mpsc::channel();
    let (shutdown, shutdown_rx) = watch::channel(false);
    let handle = super::spawn(watcher, shutdown_rx, move || {
        let _ = rebuilt_tx.send(());
    })
    .unwrap();

    fs::write(source.join("notes/deep/a.md"), "---\nstatus: true\n---\n").unwrap();
    rebuilt_rx.recv_timeout(Duration::from_secs(10)).unwrap();

    // A directory created after startup is watched too.
    fs::create_dir(source.join("later")).unwrap();
    rebuilt_rx.recv_timeout(Duration::from_secs(10)).unwrap();
    fs::write(source.join("later/b.md"), "body").unwrap();
    rebuilt_rx.recv_timeout(Duration::from_secs(10)).unwrap();

    shutdown.send(true).unwrap();
    handle.join().unwrap();
}
