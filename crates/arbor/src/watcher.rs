//! Route file watcher for hot reload.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};

use crate::hot_reload::SharedRouter;

/// Reloads a [`SharedRouter`] whenever its route file changes.
pub struct RouteWatcher {
    path: PathBuf,
    shared: Arc<SharedRouter>,
}

impl RouteWatcher {
    pub fn new(path: &Path, shared: Arc<SharedRouter>) -> Self {
        Self {
            path: path.to_path_buf(),
            shared,
        }
    }

    /// Start watching in a background thread.
    ///
    /// The parent directory is watched rather than the file itself, so
    /// editors that save by renaming a new file into place are picked up.
    /// Dropping the returned watcher stops it.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let directory = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let path = self.path.clone();
        let shared = self.shared;

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if !concerns(&event, &path) {
                        return;
                    }
                    tracing::info!(path = %path.display(), "Route file change detected, reloading");
                    // failures are logged by the reload itself
                    let _ = shared.reload_from(&path);
                }
                Err(e) => tracing::error!(error = %e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&directory, RecursiveMode::NonRecursive)?;

        arbor_telemetry::log_watching!(path = %self.path.display(), "Route file watcher started");
        Ok(watcher)
    }
}

/// Whether `event` modified or created the file at `path`.
fn concerns(event: &Event, path: &Path) -> bool {
    if !(event.kind.is_modify() || event.kind.is_create()) {
        return false;
    }
    let Some(name) = path.file_name() else {
        return false;
    };
    event
        .paths
        .iter()
        .any(|changed| changed.file_name() == Some(name))
}
