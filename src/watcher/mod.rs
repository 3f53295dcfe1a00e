use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use crate::Cms;
use crate::ui::{self, Icons};

/// Quiet period that closes a burst of filesystem events
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Runs a full rebuild whenever either source tree changes.
///
/// There is no per-file sync: any relevant event triggers `Cms::rebuild`.
pub struct Watcher {
    cms: Cms,
    debounce: Duration,
}

impl Watcher {
    pub fn new(cms: Cms) -> Self {
        Self {
            cms,
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn run(mut self) -> anyhow::Result<()> {
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

        let config = self.cms.config().clone();
        for root in [&config.pages, &config.data] {
            if root.exists() {
                watcher.watch(root, RecursiveMode::Recursive)?;
                println!("{} Watching for changes in {:?}...", Icons::EYE, root);
            } else {
                ui::warn(&format!("Not watching {:?}: directory does not exist", root));
            }
        }

        self.rebuild();

        while let Some(relevant) = next_burst(&rx, self.debounce) {
            if relevant {
                self.rebuild();
            }
        }

        self.cms.teardown();
        Ok(())
    }

    fn rebuild(&mut self) {
        match self.cms.rebuild() {
            Ok(stats) => ui::success(&format!(
                "Rebuilt: {} pages, {} documents ({:.2?})",
                stats.pages, stats.documents, stats.elapsed
            )),
            Err(e) => {
                tracing::error!("Rebuild failed, keeping previous content: {}", e);
                ui::error(&format!("Rebuild failed: {}", e));
            }
        }
    }
}

/// Block for the next event, then absorb everything that follows within `window`.
///
/// Returns whether the burst contained a content change, or `None` once the
/// watcher has hung up.
fn next_burst(rx: &Receiver<notify::Result<Event>>, window: Duration) -> Option<bool> {
    let mut relevant = is_content_change(&rx.recv().ok()?);
    loop {
        match rx.recv_timeout(window) {
            Ok(event) => relevant |= is_content_change(&event),
            Err(RecvTimeoutError::Timeout) => return Some(relevant),
            Err(RecvTimeoutError::Disconnected) => return Some(relevant),
        }
    }
}

fn is_content_change(event: &notify::Result<Event>) -> bool {
    match event {
        Ok(event) => matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ),
        Err(e) => {
            tracing::warn!("watch error: {:?}", e);
            false
        }
    }
}
