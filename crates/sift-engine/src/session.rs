//! One activation of a named list: state machine, key dispatch, action
//! execution, and the binding between worker, prompt, history, and surface.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{debug, error, warn};

use sift_core::config::Config;
use sift_core::directive::{BuiltinAction, Directive, PromptAction};
use sift_core::history::History;
use sift_core::item::Item;
use sift_core::options::{InputMode, ListOptions};

use crate::error::EngineError;
use crate::mappings::Mappings;
use crate::prompt::Prompt;
use crate::provider::{ActionSpec, ActionTarget, ListContext, ListProvider};
use crate::surface::{DisplaySurface, HostCommand, ViewState};
use crate::worker::{ItemsBatch, TaskOutcome, Worker, WorkerEvent};

/// Debounce for keystroke-driven re-filtering.
const REFILTER_DELAY: Duration = Duration::from_millis(50);
/// Slower debounce once the item buffer is large.
const REFILTER_DELAY_LARGE: Duration = Duration::from_millis(300);
const LARGE_LIST: usize = 10_000;
/// Debounce for auto-preview as the cursor moves.
const PREVIEW_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Starting,
    Active,
    Hidden,
    Disposed,
}

pub struct Session {
    name: String,
    state: SessionState,
    provider: Box<dyn ListProvider>,
    context: ListContext,
    config: Config,
    mappings: Mappings,
    prompt: Prompt,
    history: History,
    worker: Worker,
    surface: Box<dyn DisplaySurface>,
    /// Currently displayed, filtered items.
    view: Vec<Item>,
    selected: Vec<usize>,
    cursor: usize,
    loading: bool,
    /// Single-flight guard for action execution.
    executing: bool,
    first_done: bool,
    refilter_deadline: Option<Instant>,
    interactive_deadline: Option<Instant>,
    preview_deadline: Option<Instant>,
}

impl Session {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: &str,
        provider: Box<dyn ListProvider>,
        options: ListOptions,
        args: Vec<String>,
        cwd: PathBuf,
        config: Config,
        history: History,
        surface: Box<dyn DisplaySurface>,
    ) -> (Self, UnboundedReceiver<WorkerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let worker = Worker::new(tx, config.extended_search);
        let mut prompt = Prompt::new(options.mode);
        prompt.set_text(&options.input);
        let context = ListContext {
            input: options.input.clone(),
            cwd,
            args,
            options,
        };
        let mappings = Mappings::from_config(&config);
        let session = Self {
            name: name.to_string(),
            state: SessionState::Starting,
            provider,
            context,
            config,
            mappings,
            prompt,
            history,
            worker,
            surface,
            view: Vec::new(),
            selected: Vec::new(),
            cursor: 0,
            loading: false,
            executing: false,
            first_done: false,
            refilter_deadline: None,
            interactive_deadline: None,
            preview_deadline: None,
        };
        (session, rx)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn options(&self) -> &ListOptions {
        &self.context.options
    }

    pub fn view(&self) -> &[Item] {
        &self.view
    }

    pub fn prompt_text(&self) -> &str {
        self.prompt.text()
    }

    fn sync_input(&mut self) {
        self.context.input = self.prompt.text().to_string();
    }

    fn render(&mut self) {
        if self.state != SessionState::Active {
            return;
        }
        self.surface.render(&ViewState {
            items: &self.view,
            cursor: self.cursor,
            selected: &self.selected,
            loading: self.loading,
            total: self.worker.item_count(),
            prompt: &self.prompt,
            matcher: self.context.options.matcher,
            mode: self.context.options.mode,
        });
    }

    // ── lifecycle ──

    /// Open the surface and run the first load. On failure the surface is
    /// torn down again and the session stays out of Active.
    pub fn start(&mut self, now: Instant) -> Result<(), EngineError> {
        if self.context.options.interactive && !self.provider.interactive() {
            return Err(EngineError::NotInteractive(self.name.clone()));
        }
        self.surface.open(&self.context.options, &self.config)?;
        self.history.filter(self.prompt.text());
        self.sync_input();
        if let Err(err) = self
            .worker
            .load_items(&mut *self.provider, &self.context, false, now)
        {
            self.surface.close();
            return Err(err.into());
        }
        self.state = SessionState::Active;
        self.provider.surface_ready();
        self.render();
        Ok(())
    }

    /// Stop loading, persist history, and tear down the surface, keeping
    /// accumulated items and selection for `resume`.
    pub fn hide(&mut self) {
        if matches!(self.state, SessionState::Hidden | SessionState::Disposed) {
            return;
        }
        self.refilter_deadline = None;
        self.interactive_deadline = None;
        self.preview_deadline = None;
        self.worker.stop();
        let input = self.prompt.text().to_string();
        self.history.add(&input);
        if let Err(err) = self.history.save() {
            warn!(error = %err, "failed to persist input history");
        }
        self.surface.close();
        self.state = SessionState::Hidden;
    }

    /// Rebind a fresh surface and redraw the retained view.
    pub fn resume(&mut self, surface: Box<dyn DisplaySurface>) -> Result<(), EngineError> {
        if self.state != SessionState::Hidden {
            return Err(EngineError::AlreadyActive(self.name.clone()));
        }
        self.surface = surface;
        self.surface.open(&self.context.options, &self.config)?;
        self.state = SessionState::Active;
        self.provider.surface_ready();
        self.render();
        if self.context.options.auto_preview {
            self.do_action(Some("preview"), Instant::now());
        }
        Ok(())
    }

    /// Terminal teardown; hands the provider back for re-registration.
    pub fn dispose(mut self) -> Box<dyn ListProvider> {
        self.worker.stop();
        let input = self.prompt.text().to_string();
        self.history.add(&input);
        if let Err(err) = self.history.save() {
            warn!(error = %err, "failed to persist input history");
        }
        self.surface.close();
        self.state = SessionState::Disposed;
        self.provider
    }

    // ── events ──

    pub fn on_worker_event(&mut self, event: WorkerEvent, now: Instant) {
        match event {
            WorkerEvent::Loading(loading) => {
                self.loading = loading;
                self.render();
            }
            WorkerEvent::Items(batch) => self.apply_batch(batch),
            WorkerEvent::Task { generation, event } => {
                self.sync_input();
                let outcome = self
                    .worker
                    .on_task_event(generation, event, &self.context, now);
                if let TaskOutcome::Failed(message) = outcome {
                    error!(list = %self.name, error = %message, "streaming load failed");
                    self.hide();
                    self.surface.show_message(&message, true);
                }
            }
        }
    }

    fn apply_batch(&mut self, batch: ItemsBatch) {
        if self.state != SessionState::Active {
            return;
        }
        if batch.append {
            self.view.extend(batch.items);
        } else {
            self.view = batch.items;
            self.selected.clear();
            self.cursor = self.cursor.min(self.view.len().saturating_sub(1));
        }
        let auto_first = self.context.options.first && batch.finished && !self.first_done;
        self.render();
        if auto_first && !self.view.is_empty() {
            self.first_done = true;
            self.cursor = 0;
            self.do_action(None, Instant::now());
        }
    }

    /// Fire any expired debounce deadline.
    pub fn on_tick(&mut self, now: Instant) {
        if self.state != SessionState::Active {
            return;
        }
        if self.interactive_deadline.is_some_and(|d| d <= now) {
            self.interactive_deadline = None;
            self.sync_input();
            if let Err(err) = self
                .worker
                .load_items(&mut *self.provider, &self.context, false, now)
            {
                self.surface.show_message(&err.to_string(), true);
            }
        }
        if self.refilter_deadline.is_some_and(|d| d <= now) {
            self.refilter_deadline = None;
            self.sync_input();
            self.worker.draw_items(&self.context);
        }
        if self.preview_deadline.is_some_and(|d| d <= now) {
            self.preview_deadline = None;
            self.do_action(Some("preview"), now);
        }
    }

    fn schedule_refilter(&mut self, now: Instant) {
        if self.context.options.interactive {
            self.interactive_deadline =
                Some(now + Duration::from_millis(self.config.interactive_debounce_ms));
        } else {
            let delay = if self.worker.item_count() > LARGE_LIST {
                REFILTER_DELAY_LARGE
            } else {
                REFILTER_DELAY
            };
            self.refilter_deadline = Some(now + delay);
        }
        self.render();
    }

    fn input_changed(&mut self, now: Instant) {
        self.history.filter(self.prompt.text());
        self.schedule_refilter(now);
    }

    // ── key dispatch ──

    pub fn on_key(&mut self, key: &str, now: Instant) {
        if self.state != SessionState::Active {
            return;
        }
        let mode = self.context.options.mode;
        if self.context.options.number_select && mode == InputMode::Insert {
            let mut chars = key.chars();
            if let (Some(digit), None) = (chars.next(), chars.next()) {
                if let Some(value) = digit.to_digit(10) {
                    self.do_number_select(value as usize, now);
                    return;
                }
            }
        }
        match self.mappings.resolve(mode, key) {
            Some(Ok(directive)) => self.handle_directive(directive, now),
            Some(Err(err)) => self.surface.show_message(&err.to_string(), true),
            None => {
                let ch = if key == "Space" {
                    Some(' ')
                } else {
                    let mut chars = key.chars();
                    match (chars.next(), chars.next()) {
                        (Some(ch), None) => Some(ch),
                        _ => None,
                    }
                };
                if let Some(ch) = ch {
                    if mode == InputMode::Insert && !ch.is_control() {
                        self.prompt.insert(ch);
                        self.input_changed(now);
                    }
                }
            }
        }
    }

    pub fn handle_directive(&mut self, directive: Directive, now: Instant) {
        match directive {
            Directive::Do(builtin) => self.handle_builtin(builtin, now),
            Directive::Prompt(action) => self.handle_prompt_action(action, now),
            Directive::Action(name) => self.do_action(Some(&name), now),
            Directive::Call(func) => {
                let item = self.view.get(self.cursor).cloned();
                let command = HostCommand::Call {
                    func: &func,
                    item: item.as_ref(),
                };
                if let Err(err) = self.surface.host_command(command) {
                    self.surface.show_message(&err.to_string(), true);
                }
            }
            Directive::Expr(func) => {
                let item = self.view.get(self.cursor).cloned();
                let command = HostCommand::Expr {
                    func: &func,
                    item: item.as_ref(),
                };
                match self.surface.host_command(command) {
                    Ok(Some(action)) => self.do_action(Some(&action), now),
                    Ok(None) => {}
                    Err(err) => self.surface.show_message(&err.to_string(), true),
                }
            }
            Directive::FeedKeys(keys) => {
                if let Err(err) = self.surface.host_command(HostCommand::FeedKeys(&keys)) {
                    self.surface.show_message(&err.to_string(), true);
                }
            }
            Directive::Normal { command, remap } => {
                let host = HostCommand::Normal {
                    command: &command,
                    remap,
                };
                if let Err(err) = self.surface.host_command(host) {
                    self.surface.show_message(&err.to_string(), true);
                }
            }
            Directive::Command(command) => {
                if let Err(err) = self.surface.host_command(HostCommand::Command(&command)) {
                    self.surface.show_message(&err.to_string(), true);
                }
            }
        }
    }

    fn handle_builtin(&mut self, builtin: BuiltinAction, now: Instant) {
        match builtin {
            BuiltinAction::SelectAll => {
                self.selected = (0..self.view.len()).collect();
                self.render();
            }
            BuiltinAction::Refresh => {
                self.sync_input();
                if let Err(err) = self
                    .worker
                    .load_items(&mut *self.provider, &self.context, true, now)
                {
                    self.surface.show_message(&err.to_string(), true);
                }
            }
            BuiltinAction::Exit | BuiltinAction::Cancel => self.hide(),
            BuiltinAction::Stop => self.worker.stop(),
            BuiltinAction::Toggle => self.toggle_selection(),
            BuiltinAction::ToggleMode => {
                let mode = self.context.options.mode.toggled();
                self.context.options.mode = mode;
                self.prompt.set_mode(mode);
                self.render();
            }
            BuiltinAction::SwitchMatcher => {
                if self.context.options.interactive {
                    return;
                }
                self.context.options.matcher = self.context.options.matcher.next();
                self.sync_input();
                self.worker.draw_items(&self.context);
                self.render();
            }
            BuiltinAction::Previous => {
                self.move_cursor(-1, now);
            }
            BuiltinAction::Next => {
                self.move_cursor(1, now);
            }
            BuiltinAction::DefaultAction => self.do_action(None, now),
        }
    }

    fn handle_prompt_action(&mut self, action: PromptAction, now: Instant) {
        let changed = match action {
            PromptAction::Previous => {
                if let Some(entry) = self.history.previous().map(str::to_string) {
                    self.prompt.set_text(&entry);
                    self.schedule_refilter(now);
                }
                return;
            }
            PromptAction::Next => {
                if let Some(entry) = self.history.next().map(str::to_string) {
                    self.prompt.set_text(&entry);
                    self.schedule_refilter(now);
                }
                return;
            }
            PromptAction::Start => {
                self.prompt.move_to_start();
                false
            }
            PromptAction::End => {
                self.prompt.move_to_end();
                false
            }
            PromptAction::Left => {
                self.prompt.move_left();
                false
            }
            PromptAction::Right => {
                self.prompt.move_right();
                false
            }
            PromptAction::DeleteForward => self.prompt.delete_forward(),
            PromptAction::DeleteBackward => self.prompt.delete_backward(),
            PromptAction::RemoveTail => self.prompt.remove_tail(),
            PromptAction::RemoveAhead => self.prompt.remove_ahead(),
            PromptAction::RemoveWord => self.prompt.remove_word(),
        };
        if changed {
            self.input_changed(now);
        } else {
            self.render();
        }
    }

    fn move_cursor(&mut self, delta: isize, now: Instant) {
        if self.view.is_empty() {
            return;
        }
        let len = self.view.len() as isize;
        let next = (self.cursor as isize + delta).rem_euclid(len);
        self.cursor = next as usize;
        self.resolve_current();
        if self.context.options.auto_preview {
            self.preview_deadline = Some(now + PREVIEW_DELAY);
        }
        self.render();
    }

    fn toggle_selection(&mut self) {
        if self.view.is_empty() {
            return;
        }
        if let Some(pos) = self.selected.iter().position(|&i| i == self.cursor) {
            self.selected.remove(pos);
        } else {
            self.selected.push(self.cursor);
        }
        if self.cursor + 1 < self.view.len() {
            self.cursor += 1;
        }
        self.render();
    }

    /// Lazily enrich the item under the cursor via the provider.
    fn resolve_current(&mut self) {
        let Some(item) = self.view.get(self.cursor) else {
            return;
        };
        if item.resolved {
            return;
        }
        match self.provider.resolve_item(item) {
            Ok(Some(mut resolved)) => {
                resolved.resolved = true;
                self.view[self.cursor] = resolved;
            }
            Ok(None) => self.view[self.cursor].resolved = true,
            Err(err) => debug!(error = %err, "resolve_item failed"),
        }
    }

    fn do_number_select(&mut self, digit: usize, now: Instant) {
        // 1..9 pick the first nine entries, 0 picks the tenth
        let index = if digit == 0 { 9 } else { digit - 1 };
        if index < self.view.len() {
            self.cursor = index;
            self.do_action(None, now);
        }
    }

    // ── actions ──

    /// Run a named action (or the provider's default) against the current
    /// target. Reentrant calls while one is executing are ignored.
    pub fn do_action(&mut self, name: Option<&str>, now: Instant) {
        if self.executing {
            return;
        }
        self.executing = true;
        let result = self.execute_action(name, now);
        self.executing = false;
        if let Err(err) = result {
            error!(list = %self.name, error = %err, "action failed");
            self.surface.show_message(&err.to_string(), true);
        }
    }

    fn execute_action(&mut self, name: Option<&str>, now: Instant) -> Result<(), EngineError> {
        let actions = self.provider.actions();
        let spec: ActionSpec = match name {
            Some(name) => actions
                .into_iter()
                .find(|a| a.name == name)
                .ok_or_else(|| EngineError::UnknownAction(name.to_string()))?,
            None => {
                let default = self.provider.default_action().to_string();
                let idx = actions.iter().position(|a| a.name == default).unwrap_or(0);
                actions
                    .into_iter()
                    .nth(idx)
                    .ok_or(EngineError::UnknownAction(default))?
            }
        };
        let name = spec.name.clone();
        let targets: Vec<Item> = if self.selected.is_empty() {
            self.view.get(self.cursor).cloned().into_iter().collect()
        } else {
            let mut indices = self.selected.clone();
            indices.sort_unstable();
            indices
                .into_iter()
                .filter_map(|i| self.view.get(i).cloned())
                .collect()
        };
        if targets.is_empty() {
            return Ok(());
        }
        let persist = spec.persist || name == "preview";
        if !persist {
            if self.context.options.no_quit {
                // keep the list open, run in the previous window
                self.surface.jump_back();
            } else {
                self.hide();
            }
        }
        self.sync_input();
        let context = self.context.clone();
        if spec.multiple {
            self.provider
                .execute_action(&name, ActionTarget::Many(&targets), &context)?;
        } else if spec.parallel {
            // every item runs even if one fails; first error wins
            let mut first_err = None;
            for item in &targets {
                let result = self
                    .provider
                    .execute_action(&name, ActionTarget::One(item), &context);
                if let Err(err) = result {
                    first_err.get_or_insert(err);
                }
            }
            if let Some(err) = first_err {
                return Err(err.into());
            }
        } else {
            for item in &targets {
                self.provider
                    .execute_action(&name, ActionTarget::One(item), &context)?;
            }
        }
        if persist {
            self.surface.restore_focus();
            self.render();
        }
        if spec.reload && self.state == SessionState::Active {
            self.worker
                .load_items(&mut *self.provider, &self.context, true, now)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use tokio_util::sync::CancellationToken;

    use crate::provider::{LoadResult, ProviderError, TaskEvent};

    // ── test doubles ──

    #[derive(Default)]
    struct SurfaceLog {
        opened: usize,
        closed: usize,
        messages: Vec<(String, bool)>,
        rendered: usize,
        last_count: usize,
    }

    #[derive(Clone, Default)]
    struct RecordingSurface(Arc<Mutex<SurfaceLog>>);

    impl RecordingSurface {
        fn log(&self) -> std::sync::MutexGuard<'_, SurfaceLog> {
            self.0.lock().unwrap()
        }
    }

    impl DisplaySurface for RecordingSurface {
        fn open(&mut self, _options: &ListOptions, _config: &Config) -> Result<(), ProviderError> {
            self.log().opened += 1;
            Ok(())
        }
        fn render(&mut self, view: &ViewState<'_>) {
            let mut log = self.log();
            log.rendered += 1;
            log.last_count = view.items.len();
        }
        fn show_message(&mut self, message: &str, is_error: bool) {
            self.log().messages.push((message.to_string(), is_error));
        }
        fn jump_back(&mut self) {}
        fn restore_focus(&mut self) {}
        fn close(&mut self) {
            self.log().closed += 1;
        }
        fn host_command(
            &mut self,
            _command: HostCommand<'_>,
        ) -> Result<Option<String>, ProviderError> {
            Ok(None)
        }
    }

    struct TestProvider {
        items: Vec<Item>,
        fail_load: bool,
        executed: Arc<AtomicUsize>,
        last_action: Arc<Mutex<Option<String>>>,
    }

    impl TestProvider {
        fn with_labels(labels: &[&str]) -> Self {
            Self {
                items: labels.iter().map(|l| Item::new(*l)).collect(),
                fail_load: false,
                executed: Arc::new(AtomicUsize::new(0)),
                last_action: Arc::new(Mutex::new(None)),
            }
        }
    }

    impl ListProvider for TestProvider {
        fn name(&self) -> &str {
            "test"
        }
        fn default_action(&self) -> &str {
            "open"
        }
        fn actions(&self) -> Vec<ActionSpec> {
            vec![
                ActionSpec::new("open"),
                ActionSpec::new("preview").persist(),
                ActionSpec::new("delete").reload().multiple(),
            ]
        }
        fn load(
            &mut self,
            _context: &ListContext,
            _token: &CancellationToken,
        ) -> Result<Option<LoadResult>, ProviderError> {
            if self.fail_load {
                return Err(ProviderError::from("load blew up"));
            }
            Ok(Some(LoadResult::Items(self.items.clone())))
        }
        fn execute_action(
            &mut self,
            name: &str,
            _target: ActionTarget<'_>,
            _context: &ListContext,
        ) -> Result<(), ProviderError> {
            self.executed.fetch_add(1, Ordering::SeqCst);
            *self.last_action.lock().unwrap() = Some(name.to_string());
            Ok(())
        }
    }

    fn build(
        provider: TestProvider,
        dir: &tempfile::TempDir,
    ) -> (Session, UnboundedReceiver<WorkerEvent>, RecordingSurface) {
        let surface = RecordingSurface::default();
        let history = History::load_from(dir.path().join("history.json"), "test", Path::new("/tmp"));
        let (session, rx) = Session::new(
            "test",
            Box::new(provider),
            ListOptions::default(),
            Vec::new(),
            PathBuf::from("/tmp"),
            Config::default(),
            history,
            Box::new(surface.clone()),
        );
        (session, rx, surface)
    }

    fn pump(session: &mut Session, rx: &mut UnboundedReceiver<WorkerEvent>) {
        while let Ok(event) = rx.try_recv() {
            session.on_worker_event(event, Instant::now());
        }
    }

    // ── lifecycle ──

    #[tokio::test]
    async fn start_shows_loaded_items() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, surface) =
            build(TestProvider::with_labels(&["one", "two"]), &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(session.view().len(), 2);
        assert_eq!(surface.log().last_count, 2);
    }

    #[tokio::test]
    async fn failed_load_aborts_activation() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = TestProvider::with_labels(&[]);
        provider.fail_load = true;
        let (mut session, _rx, surface) = build(provider, &dir);
        let result = session.start(Instant::now());
        assert!(result.is_err());
        assert_ne!(session.state(), SessionState::Active);
        // surface opened then torn down again
        assert_eq!(surface.log().closed, 1);
    }

    #[tokio::test]
    async fn hide_and_resume_retain_view() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, _surface) =
            build(TestProvider::with_labels(&["one", "two"]), &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.hide();
        assert_eq!(session.state(), SessionState::Hidden);
        assert_eq!(session.view().len(), 2);

        let fresh = RecordingSurface::default();
        session.resume(Box::new(fresh.clone())).unwrap();
        assert_eq!(session.state(), SessionState::Active);
        assert_eq!(fresh.log().last_count, 2);
    }

    #[tokio::test]
    async fn task_error_hides_session_with_message() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, surface) = build(TestProvider::with_labels(&["x"]), &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        // tag the event with the live generation so it passes the stale guard
        let generation = session.worker.generation;
        session.on_worker_event(
            WorkerEvent::Task {
                generation,
                event: TaskEvent::Error("pipe broke".into()),
            },
            Instant::now(),
        );
        assert_ne!(session.state(), SessionState::Active);
        let log = surface.log();
        assert!(log.messages.iter().any(|(m, err)| *err && m.contains("pipe broke")));
    }

    // ── input and filtering ──

    #[tokio::test]
    async fn typed_key_schedules_debounced_refilter() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, _surface) =
            build(TestProvider::with_labels(&["alpha", "beta"]), &dir);
        let start = Instant::now();
        session.start(start).unwrap();
        pump(&mut session, &mut rx);
        session.on_key("a", start);
        assert_eq!(session.prompt_text(), "a");
        // not refiltered until the deadline passes
        session.on_tick(start);
        pump(&mut session, &mut rx);
        assert_eq!(session.view().len(), 2);
        session.on_tick(start + Duration::from_millis(60));
        pump(&mut session, &mut rx);
        let labels: Vec<_> = session.view().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["alpha", "beta"]);
        session.on_key("l", start + Duration::from_millis(70));
        session.on_tick(start + Duration::from_millis(200));
        pump(&mut session, &mut rx);
        let labels: Vec<_> = session.view().iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, ["alpha"]);
    }

    #[tokio::test]
    async fn history_previous_restores_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, _surface) = build(TestProvider::with_labels(&["x"]), &dir);
        session.history.add("foo");
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.handle_directive(
            Directive::Prompt(PromptAction::Previous),
            Instant::now(),
        );
        assert_eq!(session.prompt_text(), "foo");
    }

    #[tokio::test]
    async fn switch_matcher_cycles_and_redraws() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, _surface) = build(TestProvider::with_labels(&["x"]), &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.handle_directive(
            Directive::Do(BuiltinAction::SwitchMatcher),
            Instant::now(),
        );
        assert_eq!(
            session.options().matcher,
            sift_core::matcher::MatcherKind::Strict
        );
    }

    // ── actions ──

    #[tokio::test]
    async fn default_action_hides_session() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TestProvider::with_labels(&["one"]);
        let executed = provider.executed.clone();
        let (mut session, mut rx, _surface) = build(provider, &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.do_action(None, Instant::now());
        assert_eq!(executed.load(Ordering::SeqCst), 1);
        assert_eq!(session.state(), SessionState::Hidden);
    }

    #[tokio::test]
    async fn persist_action_keeps_session_active() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TestProvider::with_labels(&["one"]);
        let last = provider.last_action.clone();
        let (mut session, mut rx, _surface) = build(provider, &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.do_action(Some("preview"), Instant::now());
        assert_eq!(last.lock().unwrap().as_deref(), Some("preview"));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn unknown_action_reports_without_leaving_active() {
        let dir = tempfile::tempdir().unwrap();
        let (mut session, mut rx, surface) = build(TestProvider::with_labels(&["one"]), &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.do_action(Some("vanish"), Instant::now());
        assert_eq!(session.state(), SessionState::Active);
        assert!(surface.log().messages.iter().any(|(_, err)| *err));
    }

    #[tokio::test]
    async fn reentrant_do_action_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TestProvider::with_labels(&["one"]);
        let executed = provider.executed.clone();
        let (mut session, mut rx, _surface) = build(provider, &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.executing = true;
        session.do_action(None, Instant::now());
        assert_eq!(executed.load(Ordering::SeqCst), 0);
        session.executing = false;
        session.do_action(None, Instant::now());
        assert_eq!(executed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn multiple_action_gets_selection_in_one_call() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TestProvider::with_labels(&["one", "two", "three"]);
        let executed = provider.executed.clone();
        let (mut session, mut rx, _surface) = build(provider, &dir);
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.handle_directive(Directive::Do(BuiltinAction::Toggle), Instant::now());
        session.handle_directive(Directive::Do(BuiltinAction::Toggle), Instant::now());
        session.do_action(Some("delete"), Instant::now());
        // both selected items went out in a single call
        assert_eq!(executed.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn auto_preview_follows_cursor_movement() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TestProvider::with_labels(&["one", "two"]);
        let last = provider.last_action.clone();
        let (mut session, mut rx, _surface) = build(provider, &dir);
        session.context.options.auto_preview = true;
        let now = Instant::now();
        session.start(now).unwrap();
        pump(&mut session, &mut rx);
        session.handle_directive(Directive::Do(BuiltinAction::Next), now);
        // nothing yet, the preview is debounced
        assert_eq!(last.lock().unwrap().as_deref(), None);
        session.on_tick(now + PREVIEW_DELAY);
        assert_eq!(last.lock().unwrap().as_deref(), Some("preview"));
        assert_eq!(session.state(), SessionState::Active);
    }

    #[tokio::test]
    async fn number_select_runs_default_action() {
        let dir = tempfile::tempdir().unwrap();
        let provider = TestProvider::with_labels(&["one", "two"]);
        let executed = provider.executed.clone();
        let (mut session, mut rx, _surface) = build(provider, &dir);
        session.context.options.number_select = true;
        session.start(Instant::now()).unwrap();
        pump(&mut session, &mut rx);
        session.on_key("2", Instant::now());
        assert_eq!(executed.load(Ordering::SeqCst), 1);
    }
}
