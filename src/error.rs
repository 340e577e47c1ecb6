// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the dispatch engine and its clients.
//!
//! Registration problems surface synchronously as [`ConfigurationError`].
//! Handler problems never leave the dispatcher: they are described by
//! [`DispatchFailure`] and only ever reach the diagnostics log.

use thiserror::Error;

use crate::property::PropertyKind;

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A registration or filter was malformed.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// A property could not be built or read.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// The native bus rejected a request.
    #[error("bus error: {0}")]
    Bus(#[from] BusError),

    /// A device-level operation failed.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// No known device matched the requested name.
    #[error("no '{name}' device found, available devices are: {available}")]
    DeviceNotFound {
        /// The name that was looked up.
        name: String,
        /// Names of the devices that are known, separated by `; `.
        available: String,
    },
}

/// Malformed registrations and filters.
///
/// These are returned to the caller of `register` (or of the filter
/// constructors) and are never swallowed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The filter named a field that events do not carry.
    #[error("unknown filter field '{0}'")]
    UnknownFilterField(String),

    /// The filter value could not be parsed for its field.
    #[error("invalid value '{value}' for filter field '{field}'")]
    InvalidFilterValue {
        /// The field being set.
        field: String,
        /// The rejected value.
        value: String,
    },

    /// A filter or diagnostics document could not be decoded.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A suspend-capable handler was registered without a scheduler.
    #[error("handler '{0}' is suspend-capable but no scheduler was supplied")]
    MissingScheduler(String),

    /// An inline handler was registered together with a scheduler.
    #[error("handler '{0}' runs inline but a scheduler was supplied")]
    UnexpectedScheduler(String),

    /// A run limit of zero would never fire.
    #[error("run limit must be at least 1")]
    ZeroRunLimit,
}

/// Why a matched handler did not complete its invocation.
///
/// Failures are logged by the dispatcher and still consume one run of a
/// bounded registration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// An inline handler panicked.
    #[error("handler panicked: {0}")]
    HandlerPanicked(String),

    /// A suspend-capable handler could not be handed to its scheduler.
    #[error("scheduler submission failed: {0}")]
    Submission(#[from] SubmitError),
}

/// Errors returned by a [`TaskScheduler`](crate::dispatch::TaskScheduler).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    /// The scheduler no longer accepts tasks.
    #[error("scheduler is closed")]
    Closed,

    /// The scheduler queue is at capacity.
    #[error("scheduler queue is full")]
    Full,
}

/// Errors in the property data model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// An item of one kind was added to a property of another kind.
    #[error("expected a {expected} item, got a {actual} item")]
    KindMismatch {
        /// Kind of the property.
        expected: PropertyKind,
        /// Kind of the offered item.
        actual: PropertyKind,
    },

    /// A schema does not know the item name.
    #[error("property {property} doesn't have {item} item")]
    UnknownItem {
        /// The schema property name.
        property: String,
        /// The rejected item name.
        item: String,
    },

    /// A single value was given for a schema with several items.
    #[error("single value needs a single-item property, but {property} has {count} items")]
    NotSingleItem {
        /// The schema property name.
        property: String,
        /// How many items the schema allows.
        count: usize,
    },

    /// A property with no items cannot be sent.
    #[error("property {0} has no items")]
    EmptyProperty(String),

    /// A textual enum value could not be parsed.
    #[error("invalid {kind}: {value}")]
    InvalidEnum {
        /// Name of the enum being parsed.
        kind: &'static str,
        /// The rejected text.
        value: String,
    },
}

/// Errors reported by a [`Bus`](crate::client::Bus) implementation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus is not running.
    #[error("bus unavailable: {0}")]
    Unavailable(String),

    /// The bus refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// Errors related to device operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// The property used to describe a device was not `DRIVER_INFO`.
    #[error("not a DRIVER_INFO property: {0}")]
    NotDriverInfo(String),

    /// A required item was absent.
    #[error("missing item {item} in {property}")]
    MissingItem {
        /// The property name.
        property: String,
        /// The absent item.
        item: String,
    },

    /// The device did not confirm a requested change in time.
    #[error("device '{device}' did not confirm {target} within {millis} ms")]
    ConfirmationTimeout {
        /// The device name.
        device: String,
        /// The status that was awaited.
        target: String,
        /// The wait, in milliseconds.
        millis: u128,
    },
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configuration_error_display() {
        let err = ConfigurationError::UnknownFilterField("colour".to_string());
        assert_eq!(err.to_string(), "unknown filter field 'colour'");
    }

    #[test]
    fn error_from_configuration_error() {
        let err: Error = ConfigurationError::ZeroRunLimit.into();
        assert!(matches!(
            err,
            Error::Configuration(ConfigurationError::ZeroRunLimit)
        ));
    }

    #[test]
    fn dispatch_failure_from_submit_error() {
        let failure: DispatchFailure = SubmitError::Closed.into();
        assert_eq!(
            failure.to_string(),
            "scheduler submission failed: scheduler is closed"
        );
    }

    #[test]
    fn kind_mismatch_display() {
        let err = ValueError::KindMismatch {
            expected: PropertyKind::Switch,
            actual: PropertyKind::Number,
        };
        assert_eq!(err.to_string(), "expected a switch item, got a number item");
    }

    #[test]
    fn device_not_found_lists_devices() {
        let err = Error::DeviceNotFound {
            name: "Guider".to_string(),
            available: "CCD Imager Simulator; Mount Simulator".to_string(),
        };
        assert!(err.to_string().contains("Mount Simulator"));
    }
}
