// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Diagnostic toggles.
//!
//! The library logs through `tracing` and never installs a subscriber.
//! These flags decide which of the chattier messages are emitted at all.
//!
//! # Examples
//!
//! ```
//! use indigo_dispatch::DiagnosticsConfig;
//!
//! let config = DiagnosticsConfig::from_json(r#"{"log_driver_actions": true}"#).unwrap();
//! assert!(config.log_driver_actions);
//! assert!(config.log_callback_exceptions);
//!
//! let quiet = DiagnosticsConfig::all(false);
//! assert!(!quiet.log_alert_properties);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;

/// Which diagnostics the dispatcher and its clients emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)]
pub struct DiagnosticsConfig {
    /// Log every delivered event (info).
    pub log_driver_actions: bool,
    /// Log every matched registration (info).
    pub log_dispatching: bool,
    /// Log handler panics and scheduler submission failures (warn).
    pub log_callback_exceptions: bool,
    /// Log device connect/disconnect requests and failures.
    pub log_device_connection: bool,
    /// Log properties sent to the bus (info).
    pub log_property_set: bool,
    /// Log delivered properties in Alert state (warn).
    pub log_alert_properties: bool,
}

impl DiagnosticsConfig {
    /// Sets every flag to `enabled`.
    #[must_use]
    pub const fn all(enabled: bool) -> Self {
        Self {
            log_driver_actions: enabled,
            log_dispatching: enabled,
            log_callback_exceptions: enabled,
            log_device_connection: enabled,
            log_property_set: enabled,
            log_alert_properties: enabled,
        }
    }

    /// Parses a JSON object of flags; absent flags keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidDocument`] on malformed JSON or unknown flags.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(json).map_err(|e| ConfigurationError::InvalidDocument(e.to_string()))
    }

    /// Enables or disables event logging.
    #[must_use]
    pub fn with_driver_actions(mut self, enabled: bool) -> Self {
        self.log_driver_actions = enabled;
        self
    }

    /// Enables or disables match logging.
    #[must_use]
    pub fn with_dispatching(mut self, enabled: bool) -> Self {
        self.log_dispatching = enabled;
        self
    }

    /// Enables or disables handler failure logging.
    #[must_use]
    pub fn with_callback_exceptions(mut self, enabled: bool) -> Self {
        self.log_callback_exceptions = enabled;
        self
    }

    /// Enables or disables device connection logging.
    #[must_use]
    pub fn with_device_connection(mut self, enabled: bool) -> Self {
        self.log_device_connection = enabled;
        self
    }

    /// Enables or disables outgoing property logging.
    #[must_use]
    pub fn with_property_set(mut self, enabled: bool) -> Self {
        self.log_property_set = enabled;
        self
    }

    /// Enables or disables Alert-state logging.
    #[must_use]
    pub fn with_alert_properties(mut self, enabled: bool) -> Self {
        self.log_alert_properties = enabled;
        self
    }
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            log_driver_actions: false,
            log_dispatching: false,
            log_callback_exceptions: true,
            log_device_connection: false,
            log_property_set: false,
            log_alert_properties: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_warn() {
        let config = DiagnosticsConfig::default();
        assert!(!config.log_driver_actions);
        assert!(!config.log_dispatching);
        assert!(config.log_callback_exceptions);
        assert!(config.log_alert_properties);
    }

    #[test]
    fn all_sets_every_flag() {
        assert_eq!(
            DiagnosticsConfig::all(true),
            DiagnosticsConfig::default()
                .with_driver_actions(true)
                .with_dispatching(true)
                .with_device_connection(true)
                .with_property_set(true)
        );
    }

    #[test]
    fn from_json_rejects_unknown_flag() {
        let err = DiagnosticsConfig::from_json(r#"{"log_everything": true}"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDocument(_)));
    }

    #[test]
    fn from_json_keeps_defaults() {
        let config = DiagnosticsConfig::from_json(r#"{"log_callback_exceptions": false}"#).unwrap();
        assert!(!config.log_callback_exceptions);
        assert!(config.log_alert_properties);
    }
}
