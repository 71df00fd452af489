//! The display surface contract: what the engine needs from a host UI.

use sift_core::config::Config;
use sift_core::item::Item;
use sift_core::matcher::MatcherKind;
use sift_core::options::{InputMode, ListOptions};

use crate::prompt::Prompt;
use crate::provider::ProviderError;

/// Snapshot of everything the surface needs to draw one frame.
pub struct ViewState<'a> {
    pub items: &'a [Item],
    pub cursor: usize,
    /// Indices into `items` of multi-selected entries.
    pub selected: &'a [usize],
    pub loading: bool,
    /// Total accumulated items before filtering.
    pub total: usize,
    pub prompt: &'a Prompt,
    pub matcher: MatcherKind,
    pub mode: InputMode,
}

/// Host-side commands a mapping directive can request.
pub enum HostCommand<'a> {
    /// Invoke a host function with the current item.
    Call { func: &'a str, item: Option<&'a Item> },
    /// Invoke a host function and return an action name to run.
    Expr { func: &'a str, item: Option<&'a Item> },
    FeedKeys(&'a str),
    Normal { command: &'a str, remap: bool },
    Command(&'a str),
}

/// A visual list binding. The session owns the view data; the surface only
/// renders it and runs host-side commands.
pub trait DisplaySurface: Send {
    /// Bind and show the surface for a starting or resuming session.
    fn open(&mut self, options: &ListOptions, config: &Config) -> Result<(), ProviderError>;

    /// Draw the current view. Called after every view or prompt change.
    fn render(&mut self, view: &ViewState<'_>);

    /// Short user-visible message, outside the list itself.
    fn show_message(&mut self, message: &str, is_error: bool);

    /// Move focus to the previously focused window, keeping the list open.
    fn jump_back(&mut self);

    /// Restore focus and size of the list after a persist action.
    fn restore_focus(&mut self);

    /// Tear the binding down. The session may be resumed with a new surface.
    fn close(&mut self);

    /// Run a host command. `Expr` may return an action name.
    fn host_command(&mut self, command: HostCommand<'_>) -> Result<Option<String>, ProviderError>;
}
