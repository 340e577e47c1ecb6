// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Devices announced by a driver.

use std::fmt;
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::watch;

use super::Bus;
use crate::dispatch::{Accepts, Dispatcher, Handler, Registration, RegistrationId};
use crate::error::{ConfigurationError, DeviceError, Result};
use crate::event::Action;
use crate::property::schema::common;
use crate::property::{Property, PropertyState};

/// Connection status of a device, as last reported by the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DeviceStatus {
    /// Not connected.
    #[default]
    Disconnected,
    /// Connected.
    Connected,
    /// The last connection attempt failed.
    Failed,
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Disconnected => "DISCONNECTED",
            Self::Connected => "CONNECTED",
            Self::Failed => "FAILED",
        })
    }
}

/// A device on the bus.
///
/// The status follows `CONNECTION` updates for this device through a
/// handler that lives as long as the `Device`.
pub struct Device {
    name: String,
    version: String,
    interface: String,
    status: Arc<watch::Sender<DeviceStatus>>,
    connection_handler: Handler,
    dispatcher: Arc<Dispatcher>,
    bus: Arc<dyn Bus>,
}

impl Device {
    /// Builds a device from its `DRIVER_INFO` property.
    ///
    /// # Errors
    ///
    /// Returns [`DeviceError::NotDriverInfo`] for any other property and
    /// [`DeviceError::MissingItem`] if a driver item is absent.
    pub fn from_driver_info(
        property: &Property,
        dispatcher: Arc<Dispatcher>,
        bus: Arc<dyn Bus>,
    ) -> Result<Self> {
        if property.name() != "DRIVER_INFO" {
            return Err(DeviceError::NotDriverInfo(property.summary()).into());
        }
        let item = |name: &str| {
            property
                .text_value(name)
                .map(str::to_string)
                .ok_or_else(|| DeviceError::MissingItem {
                    property: property.name().to_string(),
                    item: name.to_string(),
                })
        };
        let name = item("DRIVER_NAME")?;
        let version = item("DRIVER_VERSION")?;
        let interface = item("DRIVER_INTERFACE")?;

        let (status, _) = watch::channel(DeviceStatus::Disconnected);
        let status = Arc::new(status);
        let connection_handler =
            connection_handler(&name, Arc::clone(&status), Arc::downgrade(&dispatcher));

        dispatcher.register(
            Registration::new(connection_handler.clone()).accepts(
                Accepts::new()
                    .action(Action::Update)
                    .name(common::CONNECTION.name)
                    .device(name.clone()),
            ),
        )?;
        tracing::debug!(device = %name, version = %version, "Device created");

        Ok(Self {
            name,
            version,
            interface,
            status,
            connection_handler,
            dispatcher,
            bus,
        })
    }

    /// Returns the device name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the driver version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the interface mask as reported by the driver.
    #[must_use]
    pub fn interface(&self) -> &str {
        &self.interface
    }

    /// Returns the current status.
    #[must_use]
    pub fn status(&self) -> DeviceStatus {
        *self.status.borrow()
    }

    /// Returns a receiver that observes status changes.
    #[must_use]
    pub fn watch_status(&self) -> watch::Receiver<DeviceStatus> {
        self.status.subscribe()
    }

    /// Registers a handler for this device's events only.
    ///
    /// Any device set on the registration's filter is replaced.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::register`].
    pub fn register(
        &self,
        mut registration: Registration,
    ) -> std::result::Result<RegistrationId, ConfigurationError> {
        registration.accepts.device = Some(self.name.clone());
        self.dispatcher.register(registration)
    }

    /// Asks the device to connect.
    ///
    /// With `wait`, also waits for the bus to confirm.
    ///
    /// # Errors
    ///
    /// Returns an error if the request could not be sent or, with `wait`,
    /// if the device was not connected in time.
    pub async fn connect(&self, wait: Option<Duration>) -> Result<()> {
        self.request(DeviceStatus::Connected, wait).await
    }

    /// Asks the device to disconnect.
    ///
    /// # Errors
    ///
    /// See [`Device::connect`].
    pub async fn disconnect(&self, wait: Option<Duration>) -> Result<()> {
        self.request(DeviceStatus::Disconnected, wait).await
    }

    async fn request(&self, target: DeviceStatus, wait: Option<Duration>) -> Result<()> {
        if self.status() == target {
            return Ok(());
        }

        let diagnostics = self.dispatcher.diagnostics();
        if diagnostics.log_device_connection {
            tracing::info!(device = %self.name, target = %target, "Requesting connection change");
        }

        let item = match target {
            DeviceStatus::Connected => "CONNECTED",
            DeviceStatus::Disconnected | DeviceStatus::Failed => "DISCONNECTED",
        };
        let property = common::CONNECTION.switch(&self.name, &[(item, true)])?;
        if diagnostics.log_property_set {
            tracing::info!(device = %self.name, name = %property.name(), "{property}");
        }

        // Subscribe first: the bus may confirm before set_property returns
        let mut receiver = self.status.subscribe();
        self.bus.set_property(&property)?;

        let Some(wait) = wait else {
            return Ok(());
        };
        let confirmed = tokio::time::timeout(wait, async {
            receiver.wait_for(|status| *status == target).await.is_ok()
        })
        .await;
        if matches!(confirmed, Ok(true)) {
            return Ok(());
        }

        if diagnostics.log_device_connection {
            tracing::warn!(
                device = %self.name,
                target = %target,
                status = %self.status(),
                "Connection change not confirmed"
            );
        }
        Err(DeviceError::ConfirmationTimeout {
            device: self.name.clone(),
            target: target.to_string(),
            millis: wait.as_millis(),
        }
        .into())
    }
}

impl fmt::Debug for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Device")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("interface", &self.interface)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.dispatcher.unregister(&self.connection_handler);
    }
}

/// Tracks `CONNECTION` updates of one device.
fn connection_handler(
    device: &str,
    status: Arc<watch::Sender<DeviceStatus>>,
    dispatcher: Weak<Dispatcher>,
) -> Handler {
    let device = device.to_string();
    let name = format!("{device} connection");
    Handler::inline(move |_, property| match property.state() {
        Some(PropertyState::Ok) => {
            let connected = property.switch_value("CONNECTED").unwrap_or(false);
            status.send_replace(if connected {
                DeviceStatus::Connected
            } else {
                DeviceStatus::Disconnected
            });
        }
        Some(PropertyState::Alert) => {
            let log = dispatcher
                .upgrade()
                .is_some_and(|dispatcher| dispatcher.diagnostics().log_device_connection);
            if log {
                tracing::warn!(device = %device, "Connection failed");
            }
            status.send_replace(DeviceStatus::Failed);
        }
        _ => {}
    })
    .named(name)
}
