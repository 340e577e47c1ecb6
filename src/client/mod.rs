// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Drivers, devices and the client that owns them.
//!
//! Everything here is an ordinary user of the [`Dispatcher`]: devices
//! follow their connection state through a registered handler, and drivers
//! discover devices by collecting `DRIVER_INFO` definitions.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use indigo_dispatch::client::{Bus, Client};
//!
//! # async fn example(bus: Arc<dyn Bus>) -> indigo_dispatch::Result<()> {
//! let client = Client::new(bus);
//! // The bus integration feeds client.dispatcher().deliver(..)
//!
//! client.attach_driver("indigo_ccd_simulator", Duration::from_secs(1)).await?;
//! let ccd = client.find_device("ccd imager")?;
//! ccd.connect(Some(Duration::from_secs(3))).await?;
//!
//! client.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod bus;
mod device;
mod driver;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

pub use bus::Bus;
pub use device::{Device, DeviceStatus};
pub use driver::{DETACH_TIMEOUT, Driver};

use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};

/// Owns the dispatcher, the bus and the attached drivers.
///
/// The dispatcher lives exactly as long as the client holds it;
/// [`shutdown`](Self::shutdown) detaches every driver and clears all
/// registrations.
pub struct Client {
    dispatcher: Arc<Dispatcher>,
    bus: Arc<dyn Bus>,
    drivers: Mutex<Vec<Driver>>,
}

impl Client {
    /// Creates a client with a fresh dispatcher.
    #[must_use]
    pub fn new(bus: Arc<dyn Bus>) -> Self {
        Self::with_dispatcher(Arc::new(Dispatcher::new()), bus)
    }

    /// Creates a client around an existing dispatcher.
    ///
    /// Use this when the bus integration needs the dispatcher before the
    /// client exists.
    #[must_use]
    pub fn with_dispatcher(dispatcher: Arc<Dispatcher>, bus: Arc<dyn Bus>) -> Self {
        Self {
            dispatcher,
            bus,
            drivers: Mutex::new(Vec::new()),
        }
    }

    /// Returns the dispatcher, for the bus integration and for handlers.
    #[must_use]
    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Attaches a driver library and returns the devices it announced
    /// within `window`.
    ///
    /// # Errors
    ///
    /// See [`Driver::attach`].
    pub async fn attach_driver(&self, library: &str, window: Duration) -> Result<Vec<Arc<Device>>> {
        let driver = Driver::attach(
            library,
            Arc::clone(&self.bus),
            Arc::clone(&self.dispatcher),
            window,
        )
        .await?;
        let devices = driver.devices().to_vec();
        self.drivers.lock().push(driver);
        Ok(devices)
    }

    /// Returns every known device, in discovery order.
    #[must_use]
    pub fn devices(&self) -> Vec<Arc<Device>> {
        self.drivers
            .lock()
            .iter()
            .flat_map(|driver| driver.devices().iter().cloned())
            .collect()
    }

    /// Looks a device up by name.
    ///
    /// Tries a case-insensitive exact match first, then a case-insensitive
    /// prefix match.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DeviceNotFound`] if nothing matches.
    pub fn find_device(&self, name: &str) -> Result<Arc<Device>> {
        let devices = self.devices();
        let wanted = name.to_lowercase();

        let exact = devices
            .iter()
            .find(|device| device.name().to_lowercase() == wanted);
        let found = exact.or_else(|| {
            devices
                .iter()
                .find(|device| device.name().to_lowercase().starts_with(&wanted))
        });
        if let Some(device) = found {
            return Ok(Arc::clone(device));
        }

        Err(Error::DeviceNotFound {
            name: name.to_string(),
            available: devices
                .iter()
                .map(|device| device.name())
                .collect::<Vec<_>>()
                .join("; "),
        })
    }

    /// Detaches every driver and clears all registrations.
    ///
    /// Detach failures are logged; shutdown always completes.
    pub async fn shutdown(&self) {
        let drivers = std::mem::take(&mut *self.drivers.lock());
        for mut driver in drivers {
            if let Err(e) = driver.detach().await {
                tracing::warn!(library = %driver.library(), error = %e, "Failed to detach driver");
            }
        }
        self.dispatcher.clear();
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("dispatcher", &self.dispatcher)
            .field("drivers", &self.drivers.lock().len())
            .finish_non_exhaustive()
    }
}
