//! # Configuration Codec
//!
//! Converts the Alertmanager configuration between its persisted YAML form and
//! [`AlertmanagerConfig`].
//!
//! Decoding is strict about the fields the controller models: a document that
//! is not YAML, is not a mapping, or carries a `match_re` pattern Alertmanager
//! would reject is reported as [`CodecError::Malformed`] instead of being
//! replaced with a default.

use crate::alertmanager::types::{AlertmanagerConfig, Route};
use crate::constants::ALERTMANAGER_CONFIG_KEY;
use crate::store::SecretData;
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid YAML: {0}")]
    Malformed(#[source] serde_yaml::Error),

    #[error("secret has no '{0}' field")]
    MissingField(String),

    #[error("route for receiver '{receiver}' has invalid match_re pattern for label '{label}': {source}")]
    InvalidMatcher {
        receiver: String,
        label: String,
        #[source]
        source: regex::Error,
    },

    #[error("failed to serialize configuration: {0}")]
    Encode(#[source] serde_yaml::Error),
}

/// Decode a YAML document
///
/// An empty document decodes to an empty configuration.
///
/// # Errors
///
/// Returns [`CodecError::Malformed`] or [`CodecError::InvalidMatcher`] when the
/// bytes do not describe an Alertmanager configuration.
pub fn decode(bytes: &[u8]) -> Result<AlertmanagerConfig, CodecError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(AlertmanagerConfig::default());
    }
    let config: AlertmanagerConfig = serde_yaml::from_slice(bytes).map_err(CodecError::Malformed)?;
    if let Some(route) = &config.route {
        validate_matchers(route)?;
    }
    Ok(config)
}

/// Decode the configuration stored in the Alertmanager secret's data
///
/// # Errors
///
/// Returns [`CodecError::MissingField`] when the secret has no
/// `alertmanager.yaml` entry, otherwise the errors of [`decode`].
pub fn decode_secret(data: &SecretData) -> Result<AlertmanagerConfig, CodecError> {
    let bytes = data
        .get(ALERTMANAGER_CONFIG_KEY)
        .ok_or_else(|| CodecError::MissingField(ALERTMANAGER_CONFIG_KEY.to_string()))?;
    decode(bytes)
}

/// Encode a configuration as YAML
///
/// # Errors
///
/// Returns [`CodecError::Encode`] if serialization fails.
pub fn encode(config: &AlertmanagerConfig) -> Result<Vec<u8>, CodecError> {
    serde_yaml::to_string(config)
        .map(String::into_bytes)
        .map_err(CodecError::Encode)
}

/// Alertmanager anchors `match_re` patterns on both ends
fn validate_matchers(route: &Route) -> Result<(), CodecError> {
    for (label, pattern) in &route.match_re {
        Regex::new(&format!("^(?:{pattern})$")).map_err(|source| CodecError::InvalidMatcher {
            receiver: route.receiver.clone().unwrap_or_default(),
            label: label.clone(),
            source,
        })?;
    }
    route.routes.iter().try_for_each(validate_matchers)
}
