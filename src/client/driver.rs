// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Driver libraries and the devices they announce.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{Bus, Device};
use crate::dispatch::{Accepts, Dispatcher, Handler, Registration};
use crate::error::Result;
use crate::event::Action;
use crate::property::{Property, PropertyState};

/// How long each device gets to confirm its disconnection on detach.
pub const DETACH_TIMEOUT: Duration = Duration::from_secs(3);

/// An attached driver library.
pub struct Driver {
    library: String,
    devices: Vec<Arc<Device>>,
    attached: bool,
    bus: Arc<dyn Bus>,
}

impl Driver {
    /// Attaches a driver library and collects the devices it announces.
    ///
    /// Every `DRIVER_INFO` defined in state OK during `window` becomes a
    /// [`Device`]. Devices announced later are not picked up.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus refuses to attach the library or if a
    /// collected `DRIVER_INFO` is incomplete. In the latter case the library
    /// is detached again before returning.
    pub async fn attach(
        library: impl Into<String>,
        bus: Arc<dyn Bus>,
        dispatcher: Arc<Dispatcher>,
        window: Duration,
    ) -> Result<Self> {
        let library = library.into();
        let collected: Arc<Mutex<Vec<Property>>> = Arc::new(Mutex::new(Vec::new()));

        let collector = {
            let collected = Arc::clone(&collected);
            Handler::inline(move |_, property| collected.lock().push(property.clone()))
                .named(format!("{library} device collector"))
        };
        dispatcher.register(
            Registration::new(collector.clone()).accepts(
                Accepts::new()
                    .action(Action::Define)
                    .name("DRIVER_INFO")
                    .state(PropertyState::Ok),
            ),
        )?;

        if dispatcher.diagnostics().log_driver_actions {
            tracing::info!(library = %library, "Attaching driver");
        }
        if let Err(e) = bus.attach_driver(&library) {
            dispatcher.unregister(&collector);
            return Err(e.into());
        }

        tokio::time::sleep(window).await;
        dispatcher.unregister(&collector);

        let properties = std::mem::take(&mut *collected.lock());
        let devices = match build_devices(&properties, &dispatcher, &bus) {
            Ok(devices) => devices,
            Err(e) => {
                if let Err(detach) = bus.detach_driver(&library) {
                    tracing::warn!(library = %library, error = %detach, "Failed to detach driver");
                }
                return Err(e);
            }
        };
        tracing::debug!(library = %library, devices = devices.len(), "Driver attached");

        Ok(Self {
            library,
            devices,
            attached: true,
            bus,
        })
    }

    /// Returns the library name.
    #[must_use]
    pub fn library(&self) -> &str {
        &self.library
    }

    /// Returns the devices found on attach.
    #[must_use]
    pub fn devices(&self) -> &[Arc<Device>] {
        &self.devices
    }

    /// Returns `true` until the driver is detached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Disconnects every device, then detaches the library.
    ///
    /// Devices that do not confirm within [`DETACH_TIMEOUT`] are logged and
    /// skipped. Detaching twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus refuses to detach the library.
    pub async fn detach(&mut self) -> Result<()> {
        if !self.attached {
            return Ok(());
        }
        for device in &self.devices {
            if let Err(e) = device.disconnect(Some(DETACH_TIMEOUT)).await {
                tracing::warn!(
                    library = %self.library,
                    device = %device.name(),
                    error = %e,
                    "Device did not disconnect"
                );
            }
        }
        self.bus.detach_driver(&self.library)?;
        self.attached = false;
        tracing::debug!(library = %self.library, "Driver detached");
        Ok(())
    }
}

/// Builds one device per distinct `DRIVER_NAME`, in announcement order.
fn build_devices(
    properties: &[Property],
    dispatcher: &Arc<Dispatcher>,
    bus: &Arc<dyn Bus>,
) -> Result<Vec<Arc<Device>>> {
    let mut devices: Vec<Arc<Device>> = Vec::with_capacity(properties.len());
    for property in properties {
        let announced = property.text_value("DRIVER_NAME");
        if devices.iter().any(|device| Some(device.name()) == announced) {
            continue;
        }
        let device = Device::from_driver_info(property, Arc::clone(dispatcher), Arc::clone(bus))?;
        devices.push(Arc::new(device));
    }
    Ok(devices)
}

impl fmt::Debug for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Driver")
            .field("library", &self.library)
            .field("devices", &self.devices)
            .field("attached", &self.attached)
            .finish_non_exhaustive()
    }
}
