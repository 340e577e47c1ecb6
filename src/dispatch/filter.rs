// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Interest filters.
//!
//! An [`Accepts`] filter lists required values for a closed set of event
//! fields. Absent fields are "don't care"; every present field must equal
//! the event's value for the filter to match.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigurationError;
use crate::event::{Action, Event};
use crate::property::{Permission, PropertyKind, PropertyState, SwitchRule};

/// Field names a filter may constrain.
pub const FILTER_FIELDS: [&str; 7] = [
    "action",
    "kind",
    "device",
    "name",
    "state",
    "permission",
    "switchRule",
];

/// Declarative predicate over event fields.
///
/// # Examples
///
/// ```
/// use indigo_dispatch::dispatch::Accepts;
/// use indigo_dispatch::event::{Action, Event};
/// use indigo_dispatch::property::{Property, PropertyKind, PropertyState};
///
/// let filter = Accepts::new().action(Action::Update).name("CONNECTION");
///
/// let update = Event::new(
///     Action::Update,
///     Property::new(PropertyKind::Switch, "CCD", "CONNECTION").with_state(PropertyState::Ok),
/// );
/// assert!(filter.matches(&update));
///
/// // The same filter, loaded from a document.
/// let loaded = Accepts::from_json(r#"{"action": "update", "name": "CONNECTION"}"#).unwrap();
/// assert_eq!(loaded, filter);
///
/// // Unknown fields are rejected up front.
/// assert!(Accepts::from_pairs([("colour", "red")]).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Accepts {
    /// Required action.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Required property kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<PropertyKind>,
    /// Required device name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Required property name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Required property state.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<PropertyState>,
    /// Required property permission.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permission: Option<Permission>,
    /// Required switch rule.
    #[serde(
        rename = "switchRule",
        alias = "switch_rule",
        skip_serializing_if = "Option::is_none"
    )]
    pub switch_rule: Option<SwitchRule>,
}

impl Accepts {
    /// Creates a filter that matches every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires the given action.
    #[must_use]
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Requires the given property kind.
    #[must_use]
    pub fn kind(mut self, kind: PropertyKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Requires the given device.
    #[must_use]
    pub fn device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Requires the given property name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Requires the given property state.
    #[must_use]
    pub fn state(mut self, state: PropertyState) -> Self {
        self.state = Some(state);
        self
    }

    /// Requires the given permission.
    #[must_use]
    pub fn permission(mut self, permission: Permission) -> Self {
        self.permission = Some(permission);
        self
    }

    /// Requires the given switch rule.
    #[must_use]
    pub fn switch_rule(mut self, rule: SwitchRule) -> Self {
        self.switch_rule = Some(rule);
        self
    }

    /// Builds a filter from `(field, value)` text pairs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownFilterField`] for a field outside
    /// [`FILTER_FIELDS`] and [`ConfigurationError::InvalidFilterValue`] for a
    /// value that does not parse.
    pub fn from_pairs<K, V>(
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ConfigurationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut accepts = Self::new();
        for (field, value) in pairs {
            accepts.set(field.as_ref(), value.as_ref())?;
        }
        Ok(accepts)
    }

    /// Builds a filter from a JSON object.
    ///
    /// Values are parsed the same way as in [`Accepts::from_pairs`]; `null`
    /// leaves a field unconstrained.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::UnknownFilterField`] for an unknown key,
    /// [`ConfigurationError::InvalidFilterValue`] for a value that does not
    /// parse and [`ConfigurationError::InvalidDocument`] for anything that is
    /// not an object of strings.
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let document: serde_json::Map<String, serde_json::Value> = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidDocument(e.to_string()))?;

        let mut accepts = Self::new();
        for (field, value) in &document {
            match value {
                serde_json::Value::String(value) => accepts.set(field, value)?,
                serde_json::Value::Null if is_filter_field(field) => {}
                serde_json::Value::Null => {
                    return Err(ConfigurationError::UnknownFilterField(field.clone()));
                }
                other => {
                    return Err(ConfigurationError::InvalidDocument(format!(
                        "filter field '{field}' must be a string, got {other}"
                    )));
                }
            }
        }
        Ok(accepts)
    }

    /// Sets one field from text.
    ///
    /// # Errors
    ///
    /// See [`Accepts::from_pairs`].
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), ConfigurationError> {
        fn parse<T: FromStr>(field: &str, value: &str) -> Result<T, ConfigurationError> {
            value
                .parse()
                .map_err(|_| ConfigurationError::InvalidFilterValue {
                    field: field.to_string(),
                    value: value.to_string(),
                })
        }

        match field {
            "action" => self.action = Some(parse(field, value)?),
            "kind" => self.kind = Some(parse(field, value)?),
            "device" => self.device = Some(value.to_string()),
            "name" => self.name = Some(value.to_string()),
            "state" => self.state = Some(parse(field, value)?),
            "permission" => self.permission = Some(parse(field, value)?),
            "switchRule" | "switch_rule" => self.switch_rule = Some(parse(field, value)?),
            other => return Err(ConfigurationError::UnknownFilterField(other.to_string())),
        }
        Ok(())
    }

    /// Returns `true` if no field is constrained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns `true` if every constrained field equals the event's value.
    ///
    /// A property that lacks a constrained attribute (no state yet, no
    /// permission, or no switch rule because it is not a switch) does
    /// not match.
    #[must_use]
    pub fn matches(&self, event: &Event) -> bool {
        let property = event.property();

        self.action.is_none_or(|action| action == event.action())
            && self.kind.is_none_or(|kind| kind == property.kind())
            && self
                .device
                .as_deref()
                .is_none_or(|device| device == property.device())
            && self
                .name
                .as_deref()
                .is_none_or(|name| name == property.name())
            && self.state.is_none_or(|state| property.state() == Some(state))
            && self
                .permission
                .is_none_or(|permission| property.permission() == Some(permission))
            && self
                .switch_rule
                .is_none_or(|rule| property.switch_rule() == Some(rule))
    }
}

fn is_filter_field(field: &str) -> bool {
    field == "switch_rule" || FILTER_FIELDS.contains(&field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{LightItem, Property, SwitchItem};

    fn connection_update(state: PropertyState) -> Event {
        Event::new(
            Action::Update,
            Property::new(PropertyKind::Switch, "CCD Imager Simulator", "CONNECTION")
                .with_state(state)
                .with_permission(Permission::ReadWrite)
                .with_rule(SwitchRule::ExactlyOne)
                .with_item(SwitchItem::new("CONNECTED", true))
                .unwrap(),
        )
    }

    fn light_define() -> Event {
        Event::new(
            Action::Define,
            Property::new(PropertyKind::Light, "Mount Simulator", "MOUNT_STATUS")
                .with_state(PropertyState::Idle)
                .with_item(LightItem::new("TRACKING", PropertyState::Ok))
                .unwrap(),
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        let filter = Accepts::new();
        assert!(filter.is_empty());
        assert!(filter.matches(&connection_update(PropertyState::Ok)));
        assert!(filter.matches(&light_define()));
    }

    #[test]
    fn every_field_must_match() {
        let filter = Accepts::new()
            .action(Action::Update)
            .kind(PropertyKind::Switch)
            .device("CCD Imager Simulator")
            .name("CONNECTION")
            .state(PropertyState::Ok)
            .permission(Permission::ReadWrite)
            .switch_rule(SwitchRule::ExactlyOne);

        assert!(filter.matches(&connection_update(PropertyState::Ok)));
        assert!(!filter.matches(&connection_update(PropertyState::Busy)));
        assert!(!filter.clone().device("Other").matches(&connection_update(PropertyState::Ok)));
        assert!(!filter.action(Action::Define).matches(&connection_update(PropertyState::Ok)));
    }

    #[test]
    fn missing_attribute_fails_instead_of_erroring() {
        // Light properties have no switch rule and this one has no permission.
        let event = light_define();
        assert!(!Accepts::new().switch_rule(SwitchRule::Any).matches(&event));
        assert!(!Accepts::new().permission(Permission::ReadOnly).matches(&event));
    }

    #[test]
    fn impossible_filter_is_legal() {
        let filter = Accepts::new().kind(PropertyKind::Blob).name("CONNECTION");
        assert!(!filter.matches(&connection_update(PropertyState::Ok)));
    }

    #[test]
    fn from_pairs_parses_values() {
        let filter = Accepts::from_pairs([
            ("action", "update"),
            ("name", "CCD_IMAGE"),
            ("state", "OK"),
            ("kind", "blob"),
            ("switch_rule", "any"),
        ])
        .unwrap();

        assert_eq!(
            filter,
            Accepts::new()
                .action(Action::Update)
                .name("CCD_IMAGE")
                .state(PropertyState::Ok)
                .kind(PropertyKind::Blob)
                .switch_rule(SwitchRule::Any)
        );
    }

    #[test]
    fn from_pairs_rejects_unknown_field() {
        let err = Accepts::from_pairs([("property_class", "blob")]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::UnknownFilterField("property_class".to_string())
        );
    }

    #[test]
    fn from_pairs_rejects_bad_value() {
        let err = Accepts::from_pairs([("state", "sleepy")]).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidFilterValue {
                field: "state".to_string(),
                value: "sleepy".to_string(),
            }
        );
    }

    #[test]
    fn from_json_rejects_unknown_field() {
        let err = Accepts::from_json(r#"{"name": "CONNECTION", "label": "x"}"#).unwrap_err();
        assert_eq!(err, ConfigurationError::UnknownFilterField("label".to_string()));
    }

    #[test]
    fn from_json_accepts_switch_rule_spellings() {
        let camel = Accepts::from_json(r#"{"switchRule": "exactly_one"}"#).unwrap();
        let snake = Accepts::from_json(r#"{"switch_rule": "EXACTLY_ONE"}"#).unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.switch_rule, Some(SwitchRule::ExactlyOne));
    }

    #[test]
    fn from_json_rejects_bad_value() {
        let err = Accepts::from_json(r#"{"action": "set"}"#).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::InvalidFilterValue {
                field: "action".to_string(),
                value: "set".to_string(),
            }
        );
    }

    #[test]
    fn from_json_rejects_non_string_value() {
        let err = Accepts::from_json(r#"{"name": 5}"#).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidDocument(_)));
    }

    #[test]
    fn from_json_agrees_with_from_pairs() {
        let pairs = [("action", "Update"), ("state", "Ok"), ("kind", "SWITCH")];
        let from_pairs = Accepts::from_pairs(pairs).unwrap();
        let from_json =
            Accepts::from_json(r#"{"action": "Update", "state": "Ok", "kind": "SWITCH"}"#).unwrap();

        assert_eq!(from_json, from_pairs);
        assert_eq!(from_json.action, Some(Action::Update));
    }

    #[test]
    fn from_json_null_leaves_field_open() {
        let filter = Accepts::from_json(r#"{"name": "CONNECTION", "state": null}"#).unwrap();
        assert_eq!(filter, Accepts::new().name("CONNECTION"));
    }

    #[test]
    fn serializes_only_present_fields() {
        let json = serde_json::to_string(&Accepts::new().name("CCD_EXPOSURE")).unwrap();
        assert_eq!(json, r#"{"name":"CCD_EXPOSURE"}"#);
    }
}
