//! Offload Dispatcher
//!
//! Large graphs are computed off the caller's thread so interactive
//! callers stay responsive. The boundary is the [`TaskExecutor`] trait: a
//! request carries an operation, its payload and a correlation id, and the
//! executor answers with exactly one response carrying the same id.

pub mod dispatcher;
pub mod protocol;
pub mod worker;

pub use dispatcher::Dispatcher;
pub use protocol::{OffloadRequest, OffloadResponse, OffloadTask, Operation, Outcome, TaskOutput};
pub use worker::{BackgroundWorker, InlineExecutor, TaskExecutor};
