use std::path::Path;
use std::time::Duration;

use notify::EventKind;
use notify::event::ModifyKind;
use tokio::time::Instant;

/// Quiescence required before a rebuild.
pub(super) const DEBOUNCE_MS: u64 = 500;

/// Single-slot rebuild timer.
///
/// Pure timing: callers pass the current instant, so the state machine is
/// driven the same way by the loop and by tests.
///
/// ```text
/// Idle ──qualifying event──▶ Pending(deadline = now + window)
/// Pending ──qualifying event──▶ Pending(deadline reset)
/// Pending ──deadline reached──▶ Idle (rebuild)
/// ```
#[derive(Debug)]
pub(super) struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self::with_window(Duration::from_millis(DEBOUNCE_MS))
    }

    pub(super) fn with_window(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
        }
    }

    /// Feed an event. Qualifying events replace any pending deadline.
    ///
    /// Returns whether the event qualified.
    pub(super) fn observe(&mut self, event: &notify::Event, now: Instant) -> bool {
        if !is_qualifying(event) {
            return false;
        }
        self.deadline = Some(now + self.window);
        true
    }

    /// Pending deadline, if armed.
    pub(super) fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub(super) fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Disarm and report `true` if the deadline has been reached.
    pub(super) fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Create, data/name modification, and removal events count; metadata-only
/// and access notifications do not. Events touching only editor scratch
/// files are ignored.
pub(super) fn is_qualifying(event: &notify::Event) -> bool {
    let kind_matches = match event.kind {
        EventKind::Create(_) | EventKind::Remove(_) => true,
        EventKind::Modify(modify) => !matches!(modify, ModifyKind::Metadata(_)),
        _ => false,
    };

    kind_matches && (event.paths.is_empty() || event.paths.iter().any(|p| !is_temp_file(p)))
}

/// Check if path is a temp/backup file (editor artifacts)
pub(super) fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}
