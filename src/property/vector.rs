// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Vector properties: a named, typed group of items on one device.

use std::fmt;

use crate::error::ValueError;

use super::{
    BlobItem, Item, LightItem, NumberItem, Permission, PropertyKind, PropertyState, SwitchItem,
    SwitchRule, TextItem,
};

/// The items of a property.
///
/// One variant per kind, so every item of a property has the same type.
#[derive(Debug, Clone, PartialEq)]
pub enum Items {
    /// Text items.
    Text(Vec<TextItem>),
    /// Number items.
    Number(Vec<NumberItem>),
    /// Switch items.
    Switch(Vec<SwitchItem>),
    /// Light items.
    Light(Vec<LightItem>),
    /// Blob items.
    Blob(Vec<BlobItem>),
}

impl Items {
    /// Creates an empty item list of the given kind.
    #[must_use]
    pub const fn empty(kind: PropertyKind) -> Self {
        match kind {
            PropertyKind::Text => Self::Text(Vec::new()),
            PropertyKind::Number => Self::Number(Vec::new()),
            PropertyKind::Switch => Self::Switch(Vec::new()),
            PropertyKind::Light => Self::Light(Vec::new()),
            PropertyKind::Blob => Self::Blob(Vec::new()),
        }
    }

    /// Returns the kind of the items.
    #[must_use]
    pub const fn kind(&self) -> PropertyKind {
        match self {
            Self::Text(_) => PropertyKind::Text,
            Self::Number(_) => PropertyKind::Number,
            Self::Switch(_) => PropertyKind::Switch,
            Self::Light(_) => PropertyKind::Light,
            Self::Blob(_) => PropertyKind::Blob,
        }
    }

    /// Returns the number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Text(items) => items.len(),
            Self::Number(items) => items.len(),
            Self::Switch(items) => items.len(),
            Self::Light(items) => items.len(),
            Self::Blob(items) => items.len(),
        }
    }

    /// Returns `true` if there are no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the item names in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        match self {
            Self::Text(items) => items.iter().map(|i| i.name.as_str()).collect(),
            Self::Number(items) => items.iter().map(|i| i.name.as_str()).collect(),
            Self::Switch(items) => items.iter().map(|i| i.name.as_str()).collect(),
            Self::Light(items) => items.iter().map(|i| i.name.as_str()).collect(),
            Self::Blob(items) => items.iter().map(|i| i.name.as_str()).collect(),
        }
    }

    fn push(&mut self, item: Item) -> Result<(), ValueError> {
        match (self, item) {
            (Self::Text(items), Item::Text(item)) => items.push(item),
            (Self::Number(items), Item::Number(item)) => items.push(item),
            (Self::Switch(items), Item::Switch(item)) => items.push(item),
            (Self::Light(items), Item::Light(item)) => items.push(item),
            (Self::Blob(items), Item::Blob(item)) => items.push(item),
            (items, item) => {
                return Err(ValueError::KindMismatch {
                    expected: items.kind(),
                    actual: item.kind(),
                });
            }
        }
        Ok(())
    }
}

/// A snapshot of one property as seen on the bus.
///
/// Properties delivered by the bus carry a state and usually a permission.
/// Properties built locally (see [`schema`](super::schema)) carry neither
/// until the bus reports them back.
///
/// # Examples
///
/// ```
/// use indigo_dispatch::property::{Property, PropertyKind, PropertyState, SwitchItem};
///
/// let prop = Property::new(PropertyKind::Switch, "CCD Imager Simulator", "CONNECTION")
///     .with_state(PropertyState::Ok)
///     .with_item(SwitchItem::new("CONNECTED", true))
///     .unwrap();
///
/// assert_eq!(prop.switch_value("CONNECTED"), Some(true));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    device: String,
    name: String,
    state: Option<PropertyState>,
    permission: Option<Permission>,
    rule: Option<SwitchRule>,
    items: Items,
}

impl Property {
    /// Creates an empty property of the given kind.
    #[must_use]
    pub fn new(kind: PropertyKind, device: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            name: name.into(),
            state: None,
            permission: None,
            rule: None,
            items: Items::empty(kind),
        }
    }

    /// Sets the property state.
    #[must_use]
    pub fn with_state(mut self, state: PropertyState) -> Self {
        self.state = Some(state);
        self
    }

    /// Sets the property permission.
    #[must_use]
    pub fn with_permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Sets the switch rule. Ignored by non-switch properties.
    #[must_use]
    pub fn with_rule(mut self, rule: SwitchRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Appends an item and returns the property.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::KindMismatch`] if the item kind differs from the property kind.
    pub fn with_item(mut self, item: impl Into<Item>) -> Result<Self, ValueError> {
        self.push(item)?;
        Ok(self)
    }

    /// Appends an item.
    ///
    /// # Errors
    ///
    /// Returns [`ValueError::KindMismatch`] if the item kind differs from the property kind.
    pub fn push(&mut self, item: impl Into<Item>) -> Result<(), ValueError> {
        self.items.push(item.into())
    }

    /// Returns the device name.
    #[must_use]
    pub fn device(&self) -> &str {
        &self.device
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the property kind.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        self.items.kind()
    }

    /// Returns the state, if known.
    #[must_use]
    pub fn state(&self) -> Option<PropertyState> {
        self.state
    }

    /// Returns the permission, if known.
    #[must_use]
    pub fn permission(&self) -> Option<Permission> {
        self.permission
    }

    /// Returns the switch rule. Always `None` for non-switch properties.
    #[must_use]
    pub fn switch_rule(&self) -> Option<SwitchRule> {
        match self.items {
            Items::Switch(_) => self.rule,
            _ => None,
        }
    }

    /// Returns the items.
    #[must_use]
    pub fn items(&self) -> &Items {
        &self.items
    }

    /// Looks up a text item value by name.
    #[must_use]
    pub fn text_value(&self, item: &str) -> Option<&str> {
        match &self.items {
            Items::Text(items) => items
                .iter()
                .find(|i| i.name == item)
                .map(|i| i.value.as_str()),
            _ => None,
        }
    }

    /// Looks up a number item value by name.
    #[must_use]
    pub fn number_value(&self, item: &str) -> Option<f64> {
        match &self.items {
            Items::Number(items) => items.iter().find(|i| i.name == item).map(|i| i.value),
            _ => None,
        }
    }

    /// Looks up a switch item value by name.
    #[must_use]
    pub fn switch_value(&self, item: &str) -> Option<bool> {
        match &self.items {
            Items::Switch(items) => items.iter().find(|i| i.name == item).map(|i| i.value),
            _ => None,
        }
    }

    /// Looks up a light item value by name.
    #[must_use]
    pub fn light_value(&self, item: &str) -> Option<PropertyState> {
        match &self.items {
            Items::Light(items) => items.iter().find(|i| i.name == item).map(|i| i.value),
            _ => None,
        }
    }

    /// Looks up a blob item value by name.
    #[must_use]
    pub fn blob_value(&self, item: &str) -> Option<&[u8]> {
        match &self.items {
            Items::Blob(items) => items
                .iter()
                .find(|i| i.name == item)
                .map(|i| i.value.as_slice()),
            _ => None,
        }
    }

    /// Returns a one-line description without the items.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} property of '{}' in {} state (type={}, perm={}, rule={})",
            self.name,
            self.device,
            self.state.map_or("UNKNOWN", |s| s.as_str()),
            self.kind(),
            self.permission.map_or("UNKNOWN", |p| p.as_str()),
            self.switch_rule().map_or("None", |r| r.as_str()),
        )
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())?;
        match &self.items {
            Items::Switch(items) => {
                let on: Vec<&str> = items
                    .iter()
                    .filter(|i| i.value)
                    .map(|i| i.name.as_str())
                    .collect();
                let off: Vec<&str> = items
                    .iter()
                    .filter(|i| !i.value)
                    .map(|i| i.name.as_str())
                    .collect();
                if !on.is_empty() {
                    write!(f, "\n\tOn: {}", on.join(", "))?;
                }
                if !off.is_empty() {
                    write!(f, "\n\tOff: {}", off.join(", "))?;
                }
                Ok(())
            }
            Items::Text(items) => write_items(f, items),
            Items::Number(items) => write_items(f, items),
            Items::Light(items) => write_items(f, items),
            Items::Blob(items) => write_items(f, items),
        }
    }
}

fn write_items<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    f.write_str("\n\titems:")?;
    for item in items {
        write!(f, "\n\t{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connection(connected: bool) -> Property {
        Property::new(PropertyKind::Switch, "CCD Imager Simulator", "CONNECTION")
            .with_state(PropertyState::Ok)
            .with_permission(Permission::ReadWrite)
            .with_rule(SwitchRule::ExactlyOne)
            .with_item(SwitchItem::new("CONNECTED", connected))
            .unwrap()
            .with_item(SwitchItem::new("DISCONNECTED", !connected))
            .unwrap()
    }

    #[test]
    fn push_rejects_mismatched_kind() {
        let mut prop = Property::new(PropertyKind::Number, "Focuser", "FOCUSER_POSITION");
        let err = prop.push(TextItem::new("POSITION", "100")).unwrap_err();
        assert_eq!(
            err,
            ValueError::KindMismatch {
                expected: PropertyKind::Number,
                actual: PropertyKind::Text,
            }
        );
        assert!(prop.items().is_empty());
    }

    #[test]
    fn typed_lookups() {
        let prop = connection(true);
        assert_eq!(prop.switch_value("CONNECTED"), Some(true));
        assert_eq!(prop.switch_value("DISCONNECTED"), Some(false));
        assert_eq!(prop.switch_value("MISSING"), None);
        assert_eq!(prop.text_value("CONNECTED"), None);
        assert_eq!(prop.items().names(), vec!["CONNECTED", "DISCONNECTED"]);
    }

    #[test]
    fn switch_rule_only_for_switches() {
        let light =
            Property::new(PropertyKind::Light, "Mount", "STATUS").with_rule(SwitchRule::Any);
        assert_eq!(light.switch_rule(), None);
        assert_eq!(connection(true).switch_rule(), Some(SwitchRule::ExactlyOne));
    }

    #[test]
    fn switch_display_lists_on_and_off() {
        let text = connection(true).to_string();
        assert!(text.starts_with(concat!(
            "CONNECTION property of 'CCD Imager Simulator' in OK state ",
            "(type=switch, perm=RW, rule=EXACTLY_ONE)"
        )));
        assert!(text.contains("\n\tOn: CONNECTED"));
        assert!(text.contains("\n\tOff: DISCONNECTED"));
    }

    #[test]
    fn summary_for_local_property() {
        let prop = Property::new(PropertyKind::Number, "CCD", "CCD_EXPOSURE");
        assert_eq!(
            prop.summary(),
            "CCD_EXPOSURE property of 'CCD' in UNKNOWN state (type=number, perm=UNKNOWN, rule=None)"
        );
        assert_eq!(prop.to_string(), prop.summary());
    }

    #[test]
    fn blob_lookup() {
        let prop = Property::new(PropertyKind::Blob, "CCD", "CCD_IMAGE")
            .with_item(BlobItem::new("IMAGE", vec![1, 2, 3], ".fits"))
            .unwrap();
        assert_eq!(prop.blob_value("IMAGE"), Some(&[1, 2, 3][..]));
    }
}
