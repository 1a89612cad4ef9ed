//! # Controller
//!
//! - `reconciler`: the reconciliation pass over the configuration secret
//! - `presence`: which monitored secrets exist
//! - `backoff`: Fibonacci retry delays
//! - `server`: metrics and probe endpoints

pub mod backoff;
pub mod presence;
pub mod reconciler;
pub mod server;

pub use reconciler::{PassOutcome, Reconciler, ReconcilerError, SecretTrigger};
