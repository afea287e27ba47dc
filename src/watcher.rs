//! Graph file watching

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use notify::RecursiveMode;
use notify_debouncer_mini::new_debouncer;
use tracing::{debug, error};

/// Call `on_change` from a background thread whenever `path` is modified.
///
/// Editors often replace files instead of writing them in place, so the
/// parent directory is watched and events are filtered down to `path`.
pub fn watch_file<F>(path: &Path, mut on_change: F) -> Result<()>
where
    F: FnMut(&Path) + Send + 'static,
{
    let target = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve graph path: {}", path.display()))?;
    let dir = target
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    // Use a debouncer to avoid too many events
    let (tx, rx) = std::sync::mpsc::channel();
    let mut debouncer = new_debouncer(Duration::from_millis(100), tx)?;
    debouncer
        .watcher()
        .watch(&dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("Failed to watch {}", dir.display()))?;

    debug!("Watching {}", target.display());

    std::thread::spawn(move || {
        // Keep debouncer alive for the duration of the watcher
        let _debouncer = debouncer;

        loop {
            match rx.recv() {
                Ok(Ok(events)) => {
                    if events.iter().any(|event| is_same_file(&event.path, &target)) {
                        on_change(&target);
                    }
                }
                Ok(Err(e)) => {
                    error!("Watch error: {:?}", e);
                }
                Err(_) => {
                    // Channel closed, exit
                    break;
                }
            }
        }
    });

    Ok(())
}

fn is_same_file(changed: &Path, target: &Path) -> bool {
    changed == target
        || changed
            .canonicalize()
            .map(|p| p == target)
            .unwrap_or(false)
}
