//! # Configuration
//!
//! Controller-level settings. Values come from environment variables (populated
//! from a ConfigMap via `envFrom` in the deployment) and can be overridden on
//! the command line.

mod controller;

pub use controller::{ControllerConfig, LogFormat};
