//! # Observability
//!
//! - `logging`: tracing subscriber initialization
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;
