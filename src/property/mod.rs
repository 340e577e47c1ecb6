// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! INDIGO property data model.
//!
//! A [`Property`] is a named group of items on one device. Its kind (text,
//! number, switch, light or blob) fixes the type of every item it holds.
//! Properties arrive from the bus inside events and are built locally with
//! the [`schema`] catalog when a value has to be sent to a device.

mod attributes;
mod item;
pub mod schema;
mod vector;

pub use attributes::{Permission, PropertyKind, PropertyState, SwitchRule};
pub use item::{BlobItem, Item, LightItem, NumberItem, SwitchItem, TextItem};
pub use schema::PropertySchema;
pub use vector::{Items, Property};
