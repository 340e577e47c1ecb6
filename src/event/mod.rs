// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bus events.
//!
//! Every define, update or delete coming from the bus becomes one [`Event`]:
//! an [`Action`] plus a snapshot of the property. The dispatcher also
//! republishes events on an [`EventFeed`] for async consumers.
//!
//! # Examples
//!
//! ```
//! use indigo_dispatch::event::{Action, Event};
//! use indigo_dispatch::property::{Property, PropertyKind};
//!
//! let action: Action = "update".parse().unwrap();
//! let event = Event::new(action, Property::new(PropertyKind::Number, "CCD", "CCD_EXPOSURE"));
//! assert_eq!(event.action(), Action::Update);
//! assert_eq!(event.property().name(), "CCD_EXPOSURE");
//! ```

mod feed;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::property::Property;

pub use feed::EventFeed;

/// The kind of bus event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Property first announced.
    #[serde(alias = "DEFINE")]
    Define,
    /// Property value or state changed.
    #[serde(alias = "UPDATE")]
    Update,
    /// Property withdrawn.
    #[serde(alias = "DELETE")]
    Delete,
}

impl Action {
    /// Returns the wire tag of the action.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Define => "define",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "define" => Ok(Self::Define),
            "update" => Ok(Self::Update),
            "delete" => Ok(Self::Delete),
            _ => Err(ValueError::InvalidEnum {
                kind: "action",
                value: s.to_string(),
            }),
        }
    }
}

/// One bus event.
///
/// The property is shared, so cloning an event is cheap. Handlers that
/// want to keep data beyond their invocation must copy it.
#[derive(Debug, Clone)]
pub struct Event {
    action: Action,
    property: Arc<Property>,
}

impl Event {
    /// Creates an event.
    #[must_use]
    pub fn new(action: Action, property: Property) -> Self {
        Self {
            action,
            property: Arc::new(property),
        }
    }

    /// Returns the action.
    #[must_use]
    pub fn action(&self) -> Action {
        self.action
    }

    /// Returns the property snapshot.
    #[must_use]
    pub fn property(&self) -> &Property {
        &self.property
    }

    /// Returns a shared handle to the property snapshot.
    #[must_use]
    pub fn shared_property(&self) -> Arc<Property> {
        Arc::clone(&self.property)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.action, self.property.summary())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyKind;

    #[test]
    fn action_parses_wire_tags() {
        assert_eq!("define".parse::<Action>(), Ok(Action::Define));
        assert_eq!("UPDATE".parse::<Action>(), Ok(Action::Update));
        assert_eq!(" delete ".parse::<Action>(), Ok(Action::Delete));
        assert!("set".parse::<Action>().is_err());
    }

    #[test]
    fn clone_shares_property() {
        let event = Event::new(
            Action::Define,
            Property::new(PropertyKind::Text, "CCD", "DRIVER_INFO"),
        );
        let copy = event.clone();
        assert!(Arc::ptr_eq(&event.shared_property(), &copy.shared_property()));
    }

    #[test]
    fn display_includes_action_and_summary() {
        let event = Event::new(
            Action::Delete,
            Property::new(PropertyKind::Light, "Mount", "STATUS"),
        );
        assert!(event.to_string().starts_with("delete: STATUS property of 'Mount'"));
    }
}
