//! # Alertmanager Config Controller
//!
//! Keeps the receivers and routes of the Alertmanager configuration stored in
//! the `alertmanager-main` secret in sync with two credential secrets:
//!
//! - `pd-secret` (`PAGERDUTY_KEY`) drives the `pagerduty` receiver and route
//! - `dms-secret` (`SNITCH_URL`) drives the `watchdog` heartbeat receiver and route
//!
//! A credential secret that exists gets its receiver and route upserted; one
//! that is gone gets them removed. Everything else in the configuration is
//! left alone.

pub mod alertmanager;
pub mod config;
pub mod constants;
pub mod controller;
pub mod observability;
pub mod runtime;
pub mod store;
