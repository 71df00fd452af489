//! Terminal display surface: copies engine view state into a shared model
//! the draw loop renders.

use std::sync::{Arc, Mutex};

use sift_core::config::Config;
use sift_core::item::Item;
use sift_core::matcher::MatcherKind;
use sift_core::options::{InputMode, ListOptions};
use sift_engine::{DisplaySurface, HostCommand, ProviderError, ViewState};

/// Everything the draw loop needs for one frame.
#[derive(Debug)]
pub struct UiModel {
    pub open: bool,
    pub items: Vec<Item>,
    pub cursor: usize,
    pub selected: Vec<usize>,
    pub loading: bool,
    pub total: usize,
    pub prompt_text: String,
    pub prompt_cursor: usize,
    pub mode: InputMode,
    pub matcher: MatcherKind,
    pub message: Option<(String, bool)>,
    pub reverse: bool,
    pub height: Option<u16>,
    pub indicator: String,
    pub selected_sign: String,
}

impl Default for UiModel {
    fn default() -> Self {
        Self {
            open: false,
            items: Vec::new(),
            cursor: 0,
            selected: Vec::new(),
            loading: false,
            total: 0,
            prompt_text: String::new(),
            prompt_cursor: 0,
            mode: InputMode::Insert,
            matcher: MatcherKind::Fuzzy,
            message: None,
            reverse: false,
            height: None,
            indicator: ">".to_string(),
            selected_sign: "*".to_string(),
        }
    }
}

pub type SharedModel = Arc<Mutex<UiModel>>;

pub struct TuiSurface {
    model: SharedModel,
}

impl TuiSurface {
    pub fn new(model: SharedModel) -> Self {
        Self { model }
    }
}

impl DisplaySurface for TuiSurface {
    fn open(&mut self, options: &ListOptions, config: &Config) -> Result<(), ProviderError> {
        let mut model = self.model.lock().map_err(|_| "ui state poisoned")?;
        model.open = true;
        model.message = None;
        model.reverse = options.reverse;
        model.height = options.height.or(Some(config.max_height));
        model.indicator = config.indicator.clone();
        model.selected_sign = config.selected_sign.clone();
        Ok(())
    }

    fn render(&mut self, view: &ViewState<'_>) {
        let Ok(mut model) = self.model.lock() else {
            return;
        };
        model.items = view.items.to_vec();
        model.cursor = view.cursor;
        model.selected = view.selected.to_vec();
        model.loading = view.loading;
        model.total = view.total;
        model.prompt_text = view.prompt.text().to_string();
        model.prompt_cursor = view.prompt.cursor();
        model.mode = view.mode;
        model.matcher = view.matcher;
    }

    fn show_message(&mut self, message: &str, is_error: bool) {
        if let Ok(mut model) = self.model.lock() {
            model.message = Some((message.to_string(), is_error));
        }
    }

    fn jump_back(&mut self) {}

    fn restore_focus(&mut self) {}

    fn close(&mut self) {
        if let Ok(mut model) = self.model.lock() {
            model.open = false;
        }
    }

    fn host_command(&mut self, command: HostCommand<'_>) -> Result<Option<String>, ProviderError> {
        let family = match command {
            HostCommand::Call { .. } => "call",
            HostCommand::Expr { .. } => "expr",
            HostCommand::FeedKeys(_) => "feedkeys",
            HostCommand::Normal { .. } => "normal",
            HostCommand::Command(_) => "command",
        };
        Err(ProviderError(format!(
            "\"{family}\" mappings need an editor host"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // main echoes a leftover error to stderr after leaving the alternate
    // screen, so closing the surface must not clear it
    #[test]
    fn error_message_survives_close() {
        let model: SharedModel = Arc::new(Mutex::new(UiModel::default()));
        let mut surface = TuiSurface::new(model.clone());
        surface
            .open(&ListOptions::default(), &Config::default())
            .unwrap();
        surface.show_message("walk failed", true);
        surface.close();
        let model = model.lock().unwrap();
        assert!(!model.open);
        assert_eq!(model.message.as_ref().map(|(m, e)| (m.as_str(), *e)), Some(("walk failed", true)));
    }
}
