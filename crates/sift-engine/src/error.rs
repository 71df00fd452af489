//! Engine-level error type, surfaced to the user as short messages.

use thiserror::Error;

use crate::provider::ProviderError;
use sift_core::directive::DirectiveError;
use sift_core::options::OptionsError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Options(#[from] OptionsError),
    #[error(transparent)]
    Directive(#[from] DirectiveError),
    #[error("list \"{0}\" not found")]
    UnknownList(String),
    #[error("list \"{0}\" is already active")]
    AlreadyActive(String),
    #[error("another list is active")]
    SessionActive,
    #[error("list \"{0}\" does not support interactive mode")]
    NotInteractive(String),
    #[error("action \"{0}\" not registered")]
    UnknownAction(String),
    #[error("no session named \"{0}\"")]
    NoSession(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
}
