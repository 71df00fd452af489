//! Session, worker, and prompt machinery for the sift list engine.

pub mod error;
pub mod mappings;
pub mod prompt;
pub mod provider;
pub mod registry;
pub mod session;
pub mod surface;
pub mod worker;

pub use error::EngineError;
pub use provider::{
    ActionSpec, ActionTarget, ListContext, ListProvider, LoadResult, ProviderError, TaskEvent,
    TaskHandle,
};
pub use registry::Registry;
pub use session::{Session, SessionState};
pub use surface::{DisplaySurface, HostCommand, ViewState};
pub use worker::{ItemsBatch, Worker, WorkerEvent};
