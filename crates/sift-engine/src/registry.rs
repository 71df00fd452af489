//! Named provider registration and session ownership.
//!
//! The registry enforces the single-active-session rule as a
//! check-and-acquire at `start`. A provider is moved into its session for
//! the session's lifetime and reclaimed on dispose.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use tokio::sync::mpsc::UnboundedReceiver;
use tracing::info;

use sift_core::config::Config;
use sift_core::history::History;
use sift_core::options::parse_args;

use crate::error::EngineError;
use crate::provider::ListProvider;
use crate::session::{Session, SessionState};
use crate::surface::DisplaySurface;
use crate::worker::WorkerEvent;

pub struct Registry {
    providers: HashMap<String, Box<dyn ListProvider>>,
    sessions: HashMap<String, Session>,
    config: Config,
    cwd: PathBuf,
}

impl Registry {
    pub fn new(config: Config, cwd: PathBuf) -> Self {
        Self {
            providers: HashMap::new(),
            sessions: HashMap::new(),
            config,
            cwd,
        }
    }

    pub fn register(&mut self, provider: Box<dyn ListProvider>) {
        self.providers.insert(provider.name().to_string(), provider);
    }

    /// Registered list names, idle and running alike.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .providers
            .keys()
            .chain(self.sessions.keys())
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Parse an invocation and activate the named list on `surface`.
    /// Returns the session name and the worker event stream the host must
    /// drain.
    pub fn start(
        &mut self,
        tokens: &[String],
        surface: Box<dyn DisplaySurface>,
    ) -> Result<(String, UnboundedReceiver<WorkerEvent>), EngineError> {
        let parsed = parse_args(tokens)?;
        if self
            .sessions
            .values()
            .any(|s| s.state() == SessionState::Active)
        {
            return Err(EngineError::SessionActive);
        }
        // a previous run of the same list is superseded
        if let Some(old) = self.sessions.remove(&parsed.name) {
            let provider = old.dispose();
            self.providers.insert(provider.name().to_string(), provider);
        }
        let provider = self
            .providers
            .remove(&parsed.name)
            .ok_or_else(|| EngineError::UnknownList(parsed.name.clone()))?;
        let history = History::load(&parsed.name, &self.cwd);
        let (mut session, events) = Session::new(
            &parsed.name,
            provider,
            parsed.options,
            parsed.args,
            self.cwd.clone(),
            self.config.clone(),
            history,
            surface,
        );
        match session.start(Instant::now()) {
            Ok(()) => {
                info!(list = %parsed.name, "session started");
                self.sessions.insert(parsed.name.clone(), session);
                Ok((parsed.name, events))
            }
            Err(err) => {
                let provider = session.dispose();
                self.providers.insert(provider.name().to_string(), provider);
                Err(err)
            }
        }
    }

    pub fn session_mut(&mut self, name: &str) -> Option<&mut Session> {
        self.sessions.get_mut(name)
    }

    pub fn active_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions
            .values_mut()
            .find(|s| s.state() == SessionState::Active)
    }

    /// Bring a hidden session back on a fresh surface.
    pub fn resume(
        &mut self,
        name: &str,
        surface: Box<dyn DisplaySurface>,
    ) -> Result<(), EngineError> {
        if self
            .sessions
            .values()
            .any(|s| s.state() == SessionState::Active)
        {
            return Err(EngineError::SessionActive);
        }
        let session = self
            .sessions
            .get_mut(name)
            .ok_or_else(|| EngineError::NoSession(name.to_string()))?;
        session.resume(surface)
    }

    /// Dispose a session and make its provider startable again.
    pub fn stop(&mut self, name: &str) -> Result<(), EngineError> {
        let session = self
            .sessions
            .remove(name)
            .ok_or_else(|| EngineError::NoSession(name.to_string()))?;
        let provider = session.dispose();
        self.providers.insert(provider.name().to_string(), provider);
        Ok(())
    }

    pub fn stop_all(&mut self) {
        let names: Vec<String> = self.sessions.keys().cloned().collect();
        for name in names {
            let _ = self.stop(&name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    use tokio_util::sync::CancellationToken;

    use sift_core::item::Item;
    use sift_core::options::ListOptions;

    use crate::provider::{
        ActionSpec, ActionTarget, ListContext, LoadResult, ProviderError,
    };
    use crate::surface::{HostCommand, ViewState};

    struct NullSurface;

    impl DisplaySurface for NullSurface {
        fn open(&mut self, _options: &ListOptions, _config: &Config) -> Result<(), ProviderError> {
            Ok(())
        }
        fn render(&mut self, _view: &ViewState<'_>) {}
        fn show_message(&mut self, _message: &str, _is_error: bool) {}
        fn jump_back(&mut self) {}
        fn restore_focus(&mut self) {}
        fn close(&mut self) {}
        fn host_command(
            &mut self,
            _command: HostCommand<'_>,
        ) -> Result<Option<String>, ProviderError> {
            Ok(None)
        }
    }

    struct StaticProvider {
        name: &'static str,
        loads: Arc<Mutex<usize>>,
    }

    impl StaticProvider {
        fn new(name: &'static str) -> Self {
            Self {
                name,
                loads: Arc::new(Mutex::new(0)),
            }
        }
    }

    impl ListProvider for StaticProvider {
        fn name(&self) -> &str {
            self.name
        }
        fn default_action(&self) -> &str {
            "open"
        }
        fn actions(&self) -> Vec<ActionSpec> {
            vec![ActionSpec::new("open")]
        }
        fn load(
            &mut self,
            _context: &ListContext,
            _token: &CancellationToken,
        ) -> Result<Option<LoadResult>, ProviderError> {
            *self.loads.lock().unwrap() += 1;
            Ok(Some(LoadResult::Items(vec![Item::new("entry")])))
        }
        fn execute_action(
            &mut self,
            _name: &str,
            _target: ActionTarget<'_>,
            _context: &ListContext,
        ) -> Result<(), ProviderError> {
            Ok(())
        }
    }

    fn registry() -> Registry {
        Registry::new(Config::default(), PathBuf::from("/tmp"))
    }

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn unknown_list_is_rejected() {
        let mut registry = registry();
        let err = registry
            .start(&tokens(&["nope"]), Box::new(NullSurface))
            .unwrap_err();
        assert!(matches!(err, EngineError::UnknownList(_)));
    }

    #[tokio::test]
    async fn second_start_while_active_is_rejected() {
        let mut registry = registry();
        registry.register(Box::new(StaticProvider::new("files")));
        registry.register(Box::new(StaticProvider::new("lines")));
        registry
            .start(&tokens(&["files"]), Box::new(NullSurface))
            .unwrap();
        let err = registry
            .start(&tokens(&["lines"]), Box::new(NullSurface))
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionActive));
    }

    #[tokio::test]
    async fn interactive_flag_needs_interactive_provider() {
        let mut registry = registry();
        registry.register(Box::new(StaticProvider::new("files")));
        let err = registry
            .start(&tokens(&["-I", "files"]), Box::new(NullSurface))
            .unwrap_err();
        assert!(matches!(err, EngineError::NotInteractive(_)));
        // provider reclaimed, a plain start works afterwards
        registry
            .start(&tokens(&["files"]), Box::new(NullSurface))
            .unwrap();
    }

    #[tokio::test]
    async fn stop_makes_provider_startable_again() {
        let mut registry = registry();
        let provider = StaticProvider::new("files");
        let loads = provider.loads.clone();
        registry.register(Box::new(provider));
        registry
            .start(&tokens(&["files"]), Box::new(NullSurface))
            .unwrap();
        registry.stop("files").unwrap();
        registry
            .start(&tokens(&["files"]), Box::new(NullSurface))
            .unwrap();
        assert_eq!(*loads.lock().unwrap(), 2);
    }

    #[tokio::test]
    async fn hidden_session_can_resume() {
        let mut registry = registry();
        registry.register(Box::new(StaticProvider::new("files")));
        let (name, _events) = registry
            .start(&tokens(&["files"]), Box::new(NullSurface))
            .unwrap();
        registry.session_mut(&name).unwrap().hide();
        registry.resume(&name, Box::new(NullSurface)).unwrap();
        assert_eq!(
            registry.session_mut(&name).unwrap().state(),
            SessionState::Active
        );
    }
}
