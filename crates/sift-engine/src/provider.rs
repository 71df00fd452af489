//! The provider contract: how a named list hands items and actions to the
//! engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio_util::sync::CancellationToken;

use sift_core::item::Item;
use sift_core::options::ListOptions;

/// Error reported by a provider's load, action, or resolve call.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ProviderError(pub String);

impl From<io::Error> for ProviderError {
    fn from(err: io::Error) -> Self {
        ProviderError(err.to_string())
    }
}

impl From<String> for ProviderError {
    fn from(message: String) -> Self {
        ProviderError(message)
    }
}

impl From<&str> for ProviderError {
    fn from(message: &str) -> Self {
        ProviderError(message.to_string())
    }
}

/// Everything a provider sees about the current activation.
#[derive(Debug, Clone)]
pub struct ListContext {
    pub input: String,
    pub cwd: PathBuf,
    pub args: Vec<String>,
    pub options: ListOptions,
}

/// Signals from a streaming load.
#[derive(Debug)]
pub enum TaskEvent {
    Item(Item),
    Error(String),
    End,
}

/// Handle to a streaming load: an event stream plus a disposer that tears
/// down the underlying resource. Disposal is idempotent.
pub struct TaskHandle {
    pub events: UnboundedReceiver<TaskEvent>,
    disposer: Option<Box<dyn FnOnce() + Send>>,
}

impl TaskHandle {
    pub fn new(events: UnboundedReceiver<TaskEvent>) -> Self {
        Self {
            events,
            disposer: None,
        }
    }

    pub fn with_disposer(
        events: UnboundedReceiver<TaskEvent>,
        disposer: impl FnOnce() + Send + 'static,
    ) -> Self {
        Self {
            events,
            disposer: Some(Box::new(disposer)),
        }
    }

    pub fn dispose(&mut self) {
        if let Some(disposer) = self.disposer.take() {
            disposer();
        }
    }
}

impl Drop for TaskHandle {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// What a load call produced.
pub enum LoadResult {
    Items(Vec<Item>),
    Stream(TaskHandle),
}

/// Metadata for one provider action. `multiple` actions get the whole
/// target array in one call, `parallel` ones run once per item without
/// stopping at the first failure.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    pub name: String,
    pub persist: bool,
    pub reload: bool,
    pub parallel: bool,
    pub multiple: bool,
}

impl ActionSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            persist: false,
            reload: false,
            parallel: false,
            multiple: false,
        }
    }

    pub fn persist(mut self) -> Self {
        self.persist = true;
        self
    }

    pub fn reload(mut self) -> Self {
        self.reload = true;
        self
    }

    pub fn parallel(mut self) -> Self {
        self.parallel = true;
        self
    }

    pub fn multiple(mut self) -> Self {
        self.multiple = true;
        self
    }
}

/// Target handed to an action execution.
pub enum ActionTarget<'a> {
    One(&'a Item),
    Many(&'a [Item]),
}

/// A named, registerable list source.
pub trait ListProvider: Send {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Interactive lists are re-queried on every (debounced) input change
    /// instead of being filtered in the worker.
    fn interactive(&self) -> bool {
        false
    }

    fn default_action(&self) -> &str;

    fn actions(&self) -> Vec<ActionSpec>;

    /// Produce items. `None` means nothing to show. Streaming results must
    /// observe `token` and stop emitting once it is canceled.
    fn load(
        &mut self,
        context: &ListContext,
        token: &CancellationToken,
    ) -> Result<Option<LoadResult>, ProviderError>;

    fn execute_action(
        &mut self,
        name: &str,
        target: ActionTarget<'_>,
        context: &ListContext,
    ) -> Result<(), ProviderError>;

    /// Lazily enrich an item the first time it is inspected.
    fn resolve_item(&mut self, _item: &Item) -> Result<Option<Item>, ProviderError> {
        Ok(None)
    }

    /// Called once the display surface is bound and visible.
    fn surface_ready(&mut self) {}
}
