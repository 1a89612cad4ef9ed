//! # Runtime
//!
//! Event-driven machinery around the reconciler.
//!
//! - `error_policy`: backoff for failed passes and watch error classification
//! - `watch_loop`: secret watch, trigger dispatch, and shutdown handling

pub mod error_policy;
pub mod watch_loop;

pub use error_policy::{ErrorPolicy, WatchErrorAction};
pub use watch_loop::{run_watch_loop, run_workers};
