//! Built-in list providers for the standalone picker.

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use sift_core::item::Item;
use sift_engine::{
    ActionSpec, ActionTarget, ListContext, ListProvider, LoadResult, ProviderError, TaskEvent,
    TaskHandle,
};

/// Labels the user confirmed, printed to stdout after the picker closes.
pub type Picked = Arc<Mutex<Vec<String>>>;

fn pick(picked: &Picked, target: ActionTarget<'_>) {
    let Ok(mut out) = picked.lock() else { return };
    match target {
        ActionTarget::One(item) => out.push(item.label.clone()),
        ActionTarget::Many(items) => out.extend(items.iter().map(|i| i.label.clone())),
    }
}

// ── files ──

/// Streams every regular file under the working directory.
pub struct FilesProvider {
    picked: Picked,
}

impl FilesProvider {
    pub fn new(picked: Picked) -> Self {
        Self { picked }
    }
}

fn walk(dir: &Path, base: &Path, stop: &AtomicBool, sender: &mpsc::UnboundedSender<TaskEvent>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        if stop.load(Ordering::Relaxed) {
            return;
        }
        let path = entry.path();
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if path.is_dir() {
            walk(&path, base, stop, sender);
        } else {
            let label = path
                .strip_prefix(base)
                .unwrap_or(&path)
                .to_string_lossy()
                .into_owned();
            if sender.send(TaskEvent::Item(Item::new(label))).is_err() {
                return;
            }
        }
    }
}

impl ListProvider for FilesProvider {
    fn name(&self) -> &str {
        "files"
    }

    fn description(&self) -> &str {
        "files under the working directory"
    }

    fn default_action(&self) -> &str {
        "open"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("open").multiple()]
    }

    fn load(
        &mut self,
        context: &ListContext,
        token: &CancellationToken,
    ) -> Result<Option<LoadResult>, ProviderError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let stop = Arc::new(AtomicBool::new(false));
        let stop_walk = stop.clone();
        let cwd = context.cwd.clone();
        let token = token.clone();
        std::thread::spawn(move || {
            walk(&cwd, &cwd, &stop_walk, &tx);
            if !token.is_cancelled() {
                let _ = tx.send(TaskEvent::End);
            }
            debug!("file walk finished");
        });
        let handle = TaskHandle::with_disposer(rx, move || stop.store(true, Ordering::Relaxed));
        Ok(Some(LoadResult::Stream(handle)))
    }

    fn execute_action(
        &mut self,
        name: &str,
        target: ActionTarget<'_>,
        _context: &ListContext,
    ) -> Result<(), ProviderError> {
        match name {
            "open" => {
                pick(&self.picked, target);
                Ok(())
            }
            other => Err(ProviderError(format!("unknown action \"{other}\""))),
        }
    }
}

// ── lines ──

/// Lines of one file, loaded atomically. Labels carry the line number;
/// filtering and the picked output use the line text itself.
pub struct LinesProvider {
    picked: Picked,
}

impl LinesProvider {
    pub fn new(picked: Picked) -> Self {
        Self { picked }
    }
}

impl ListProvider for LinesProvider {
    fn name(&self) -> &str {
        "lines"
    }

    fn description(&self) -> &str {
        "lines of a file"
    }

    fn default_action(&self) -> &str {
        "print"
    }

    fn actions(&self) -> Vec<ActionSpec> {
        vec![ActionSpec::new("print").multiple()]
    }

    fn load(
        &mut self,
        context: &ListContext,
        _token: &CancellationToken,
    ) -> Result<Option<LoadResult>, ProviderError> {
        let path = context
            .args
            .first()
            .ok_or_else(|| ProviderError::from("usage: lines <file>"))?;
        let content = fs::read_to_string(context.cwd.join(path))?;
        let items = content
            .lines()
            .enumerate()
            .map(|(number, line)| {
                let mut item = Item::new(format!("{:>4} {line}", number + 1));
                item.filter_text = Some(line.to_string());
                item
            })
            .collect();
        Ok(Some(LoadResult::Items(items)))
    }

    fn execute_action(
        &mut self,
        name: &str,
        target: ActionTarget<'_>,
        _context: &ListContext,
    ) -> Result<(), ProviderError> {
        match name {
            "print" => {
                pick(&self.picked, target);
                Ok(())
            }
            other => Err(ProviderError(format!("unknown action \"{other}\""))),
        }
    }
}
