// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `indigo_dispatch` - Attribute-filtered event dispatch for INDIGO devices.
//!
//! INDIGO drivers define, update and delete named properties on their
//! devices. This library turns that stream into [`Event`]s and runs them
//! through a [`Dispatcher`], which calls every registered handler whose
//! filter matches.
//!
//! # Supported Features
//!
//! - **Filters**: Match on action, kind, device, name, state, permission and switch rule
//! - **Handlers**: Inline closures, or async closures submitted to a scheduler
//! - **Run limits**: Handlers that remove themselves after N runs
//! - **Isolation**: A panicking handler never stops delivery to the others
//! - **Devices and drivers**: Connection tracking and device discovery on top of the dispatcher
//!
//! # Quick Start
//!
//! ```
//! use indigo_dispatch::dispatch::{Accepts, Handler, Registration};
//! use indigo_dispatch::event::Action;
//! use indigo_dispatch::property::{Property, PropertyKind, PropertyState, SwitchItem};
//! use indigo_dispatch::Dispatcher;
//!
//! fn main() -> indigo_dispatch::Result<()> {
//!     let dispatcher = Dispatcher::new();
//!
//!     // Fire once on the next CONNECTION update
//!     dispatcher.register(
//!         Registration::new(Handler::inline(|action, prop| {
//!             println!("{action}: {prop}");
//!         }))
//!         .accepts(Accepts::new().action(Action::Update).name("CONNECTION"))
//!         .once(),
//!     )?;
//!
//!     // The bus integration calls deliver for every event it sees
//!     let property = Property::new(PropertyKind::Switch, "CCD Imager Simulator", "CONNECTION")
//!         .with_state(PropertyState::Ok)
//!         .with_item(SwitchItem::new("CONNECTED", true))?;
//!     dispatcher.deliver(Action::Update, property);
//!
//!     assert_eq!(dispatcher.registration_count(), 0);
//!     Ok(())
//! }
//! ```
//!
//! # Logging
//!
//! The library logs through `tracing` and never installs a subscriber.
//! [`DiagnosticsConfig`] selects which of the chattier messages are emitted.

pub mod client;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod property;

pub use client::{Bus, Client, Device, DeviceStatus, Driver};
pub use diagnostics::DiagnosticsConfig;
pub use dispatch::{Accepts, Dispatcher, Handler, Registration, RegistrationId, TaskScheduler};
pub use error::{
    BusError, ConfigurationError, DeviceError, DispatchFailure, Error, Result, SubmitError,
    ValueError,
};
pub use event::{Action, Event, EventFeed};
pub use property::{Property, PropertyKind, PropertyState};
