//! # Presence Resolution
//!
//! Determines which monitored secrets exist in a namespace from a listing of
//! secret names.

use crate::alertmanager::Integration;
use crate::constants::ALERTMANAGER_SECRET_NAME;

/// Which monitored secrets currently exist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Presence {
    pub pagerduty: bool,
    pub watchdog: bool,
    pub alertmanager_config: bool,
}

impl Presence {
    /// Resolve presence from the names of the secrets in a namespace
    pub fn resolve<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        names
            .into_iter()
            .fold(Self::default(), |mut presence, name| {
                match name.as_ref() {
                    ALERTMANAGER_SECRET_NAME => presence.alertmanager_config = true,
                    other => match Integration::from_secret_name(other) {
                        Some(Integration::PagerDuty) => presence.pagerduty = true,
                        Some(Integration::Watchdog) => presence.watchdog = true,
                        None => {}
                    },
                }
                presence
            })
    }

    /// Whether the credential secret of an integration exists
    #[must_use]
    pub const fn has(&self, integration: Integration) -> bool {
        match integration {
            Integration::PagerDuty => self.pagerduty,
            Integration::Watchdog => self.watchdog,
        }
    }

    /// Record an integration's credential secret as missing
    pub fn mark_absent(&mut self, integration: Integration) {
        match integration {
            Integration::PagerDuty => self.pagerduty = false,
            Integration::Watchdog => self.watchdog = false,
        }
    }

    /// Reconciliation has to wait until the configuration secret exists
    #[must_use]
    pub const fn is_deferred(&self) -> bool {
        !self.alertmanager_config
    }
}

/// Whether a secret name is one the controller reacts to
#[must_use]
pub fn is_monitored(name: &str) -> bool {
    name == ALERTMANAGER_SECRET_NAME || Integration::from_secret_name(name).is_some()
}
