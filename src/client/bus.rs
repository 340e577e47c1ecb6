// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound boundary to the native bus.

use crate::error::BusError;
use crate::property::Property;

/// Requests sent from application code to the native bus.
///
/// Inbound traffic goes the other way: the bus integration calls
/// [`Dispatcher::deliver`](crate::dispatch::Dispatcher::deliver) for every
/// define, update or delete it sees. An implementation must not call
/// `deliver` while holding a lock that its own methods also take.
pub trait Bus: Send + Sync {
    /// Asks the owning device to change a property.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the request could not be sent.
    fn set_property(&self, property: &Property) -> Result<(), BusError>;

    /// Loads and attaches a driver library, e.g. `indigo_ccd_simulator`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the driver could not be attached.
    fn attach_driver(&self, library: &str) -> Result<(), BusError>;

    /// Detaches a driver library.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the driver could not be detached.
    fn detach_driver(&self, library: &str) -> Result<(), BusError>;
}
