use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use notify::event::{CreateKind, ModifyKind, RenameMode};
use notify::{EventKind, RecursiveMode, Watcher};

use super::WatchError;
use crate::build::collect_dirs;
use crate::{debug, log};

/// Directories registered with the watcher, one non-recursive watch each.
///
/// Responsibility:
/// - Snapshot and attach every directory of the source tree at startup
/// - Attach directories created (or moved in) while running
/// - Forget directories that were removed, so a recreated one is attached again
#[derive(Debug, Default)]
pub(super) struct WatchSet {
    dirs: BTreeSet<PathBuf>,
}

impl WatchSet {
    /// Every directory under `root`, including `root`.
    pub(super) fn snapshot(root: &Path) -> Result<Self, WatchError> {
        if !root.is_dir() {
            return Err(WatchError::NotADirectory(root.to_path_buf()));
        }
        let dirs = collect_dirs(root).map_err(|e| WatchError::Walk(root.to_path_buf(), e))?;
        Ok(Self {
            dirs: dirs.into_iter().collect(),
        })
    }

    /// Register every directory. Any failure is fatal.
    pub(super) fn attach<W: Watcher>(&self, watcher: &mut W) -> Result<(), WatchError> {
        for dir in &self.dirs {
            watcher
                .watch(dir, RecursiveMode::NonRecursive)
                .map_err(|e| WatchError::Register(dir.clone(), e))?;
        }
        Ok(())
    }

    /// Keep the set in step with directory create/move/remove events.
    ///
    /// Returns the number of newly attached directories.
    pub(super) fn update<W: Watcher>(&mut self, watcher: &mut W, event: &notify::Event) -> usize {
        match event.kind {
            EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for path in &event.paths {
                    self.forget(watcher, path);
                }
                0
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
                if let [from, to] = event.paths.as_slice() {
                    self.forget(watcher, from);
                    if to.is_dir() {
                        return self.attach_new(watcher, to);
                    }
                }
                0
            }
            EventKind::Create(CreateKind::Folder | CreateKind::Any)
            | EventKind::Modify(ModifyKind::Name(_)) => event
                .paths
                .iter()
                .filter(|p| p.is_dir())
                .map(|p| self.attach_new(watcher, p))
                .sum(),
            _ => 0,
        }
    }

    fn attach_new<W: Watcher>(&mut self, watcher: &mut W, dir: &Path) -> usize {
        if self.dirs.contains(dir) {
            return 0;
        }
        let dirs = match collect_dirs(dir) {
            Ok(dirs) => dirs,
            Err(e) => {
                log!("watch"; "failed to scan new directory {}: {}", dir.display(), e);
                return 0;
            }
        };

        let mut added = 0;
        for dir in dirs {
            if self.dirs.contains(&dir) {
                continue;
            }
            match watcher.watch(&dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    debug!("watch"; "watching new directory {}", dir.display());
                    self.dirs.insert(dir);
                    added += 1;
                }
                Err(e) => log!("watch"; "failed to watch {}: {}", dir.display(), e),
            }
        }
        added
    }

    fn forget<W: Watcher>(&mut self, watcher: &mut W, path: &Path) {
        let removed: Vec<PathBuf> = self
            .dirs
            .iter()
            .filter(|dir| dir.starts_with(path))
            .cloned()
            .collect();
        for dir in removed {
            // The OS drops the watch with the directory; unwatch may fail.
            let _ = watcher.unwatch(&dir);
            self.dirs.remove(&dir);
        }
    }

    pub(super) fn len(&self) -> usize {
        self.dirs.len()
    }

    #[cfg(test)]
    pub(super) fn contains(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }
}
