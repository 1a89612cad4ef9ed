//! # Alertmanager Configuration
//!
//! In-memory model of the Alertmanager configuration document and the
//! operations the controller performs on it.
//!
//! - `types`: document model (only the fields the controller touches are typed,
//!   everything else is carried through untouched)
//! - `codec`: YAML decode/encode
//! - `integration`: the PagerDuty and Dead Man's Snitch integrations and their
//!   canonical receivers/routes
//! - `merge`: upsert and removal of an integration's receiver and route

pub mod codec;
pub mod integration;
pub mod merge;
pub mod types;

pub use codec::{decode, decode_secret, encode, CodecError};
pub use integration::Integration;
pub use merge::{remove_channel, upsert_channel, ChannelChange};
pub use types::{AlertmanagerConfig, PagerdutyConfig, Receiver, Route, WebhookConfig};
