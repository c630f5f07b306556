//! Watch/rebuild loop.
//!
//! Watches every directory of the source tree and turns bursts of change
//! events into a single debounced rebuild.
//!
//! ```text
//! notify ─▶ std mpsc ─▶ bridge thread ─▶ tokio mpsc ─▶ RebuildLoop ─▶ rebuild()
//!                                       shutdown ──▶┘
//! ```
//!
//! The watcher starts before the initial build so edits made during that
//! build are buffered rather than lost.

mod debouncer;
mod watch_set;

#[cfg(test)]
mod tests;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::thread::{self, JoinHandle};

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};

use crate::{debug, log};
use debouncer::Debouncer;
use watch_set::WatchSet;

/// Capacity of the event channel between the bridge thread and the loop.
const EVENT_BUFFER: usize = 256;

/// Watch setup failure. Fatal to the serve command.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("watch root `{}` is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("failed to create file watcher")]
    Create(#[source] notify::Error),

    #[error("failed to watch `{}`", .0.display())]
    Register(PathBuf, #[source] notify::Error),

    #[error("failed to enumerate directories under `{}`", .0.display())]
    Walk(PathBuf, #[source] jwalk::Error),
}

type NotifyResult = notify::Result<notify::Event>;

/// A started watcher whose events are buffered until the loop runs.
pub struct SourceWatcher {
    watcher: RecommendedWatcher,
    watch_set: WatchSet,
    notify_rx: std_mpsc::Receiver<NotifyResult>,
}

impl SourceWatcher {
    /// Register every directory under `root`.
    pub fn start(root: &Path) -> Result<Self, WatchError> {
        let (notify_tx, notify_rx) = std_mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .map_err(WatchError::Create)?;

        let watch_set = WatchSet::snapshot(root)?;
        watch_set.attach(&mut watcher)?;

        Ok(Self {
            watcher,
            watch_set,
            notify_rx,
        })
    }

    /// Number of directories currently watched.
    pub fn watched_dirs(&self) -> usize {
        self.watch_set.len()
    }
}

/// Debounced rebuild state machine.
///
/// Owns its timer and watcher. Rebuilds run inline on the loop task, so a
/// rebuild always finishes before the next event is looked at.
pub struct RebuildLoop<F> {
    debouncer: Debouncer,
    tracker: Option<(RecommendedWatcher, WatchSet)>,
    rebuild: F,
}

impl<F: FnMut()> RebuildLoop<F> {
    pub fn new(rebuild: F) -> Self {
        Self {
            debouncer: Debouncer::new(),
            tracker: None,
            rebuild,
        }
    }

    /// Keep the watch set in step with directory events.
    fn tracking(mut self, watcher: RecommendedWatcher, watch_set: WatchSet) -> Self {
        self.tracker = Some((watcher, watch_set));
        self
    }

    /// Run until shutdown is signaled or the event channel closes.
    ///
    /// A pending rebuild is abandoned on shutdown. Returns the number of
    /// rebuilds performed.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<NotifyResult>,
        mut shutdown: watch::Receiver<bool>,
    ) -> usize {
        let mut rebuilds = 0;
        if *shutdown.borrow() {
            return rebuilds;
        }

        loop {
            let deadline = self.debouncer.deadline();

            tokio::select! {
                biased;
                _ = shutdown.changed() => break,
                event = events.recv() => match event {
                    Some(Ok(event)) => self.on_event(&event),
                    Some(Err(e)) => log!("watch"; "notify error: {}", e),
                    None => break,
                },
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.debouncer.fire(Instant::now()) {
                        (self.rebuild)();
                        rebuilds += 1;
                    }
                }
            }
        }

        if self.debouncer.is_pending() {
            debug!("watch"; "shutdown with a pending rebuild, skipped");
        }
        rebuilds
    }

    fn on_event(&mut self, event: &notify::Event) {
        if let Some((watcher, watch_set)) = &mut self.tracker {
            watch_set.update(watcher, event);
        }
        if self.debouncer.observe(event, Instant::now()) {
            debug!("watch"; "{:?}: {:?}", event.kind, event.paths);
        }
    }
}

/// Run the rebuild loop for `source` on a dedicated thread.
///
/// The thread exits once `shutdown` flips to `true` (or its sender drops).
pub fn spawn<F>(
    source: SourceWatcher,
    shutdown: watch::Receiver<bool>,
    rebuild: F,
) -> io::Result<JoinHandle<()>>
where
    F: FnMut() + Send + 'static,
{
    thread::Builder::new()
        .name("arrow-watch".into())
        .spawn(move || run_on_current_thread(source, shutdown, rebuild))
}

fn run_on_current_thread<F: FnMut()>(
    source: SourceWatcher,
    shutdown: watch::Receiver<bool>,
    rebuild: F,
) {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            log!("error"; "failed to start watch runtime: {}", e);
            return;
        }
    };

    let SourceWatcher {
        watcher,
        watch_set,
        notify_rx,
    } = source;
    let (async_tx, async_rx) = mpsc::channel(EVENT_BUFFER);

    // notify is sync; forward into the async channel from a plain thread.
    // Ends when the watcher (and its sender) drops or the loop goes away.
    let bridge = thread::Builder::new()
        .name("arrow-watch-bridge".into())
        .spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                if async_tx.blocking_send(result).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = bridge {
        log!("error"; "failed to start watch bridge: {}", e);
        return;
    }

    let rebuild_loop = RebuildLoop::new(rebuild).tracking(watcher, watch_set);
    runtime.block_on(rebuild_loop.run(async_rx, shutdown));
}
