// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property attribute enumerations, mirroring `indigo_bus.h`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Normalizes enum text for case-insensitive parsing.
fn normalize(s: &str) -> String {
    s.trim().to_ascii_uppercase().replace(['-', ' '], "_")
}

/// State of a property (`indigo_property_state`).
///
/// # Examples
///
/// ```
/// use indigo_dispatch::property::PropertyState;
///
/// let state: PropertyState = "ok".parse().unwrap();
/// assert_eq!(state, PropertyState::Ok);
/// assert_eq!(state.to_string(), "OK");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyState {
    /// Property is passive (unused by INDIGO).
    #[serde(alias = "IDLE")]
    Idle,
    /// Property is in correct state or the last operation on it succeeded.
    #[serde(alias = "OK")]
    Ok,
    /// Property is transient or an operation on it is pending.
    #[serde(alias = "BUSY")]
    Busy,
    /// Property is in incorrect state or an operation on it failed.
    #[serde(alias = "ALERT")]
    Alert,
}

impl PropertyState {
    /// Returns the INDIGO name of the state.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Ok => "OK",
            Self::Busy => "BUSY",
            Self::Alert => "ALERT",
        }
    }

    /// Returns the numeric value used by `indigo_bus.h`.
    #[must_use]
    pub const fn as_num(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Ok => 1,
            Self::Busy => 2,
            Self::Alert => 3,
        }
    }
}

impl fmt::Display for PropertyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "IDLE" | "0" => Ok(Self::Idle),
            "OK" | "1" => Ok(Self::Ok),
            "BUSY" | "2" => Ok(Self::Busy),
            "ALERT" | "3" => Ok(Self::Alert),
            _ => Err(ValueError::InvalidEnum {
                kind: "property state",
                value: s.to_string(),
            }),
        }
    }
}

/// Access permission of a property (`indigo_property_perm`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    /// Read-only.
    #[serde(alias = "ro", alias = "RO")]
    ReadOnly,
    /// Read-write.
    #[serde(alias = "rw", alias = "RW")]
    ReadWrite,
    /// Write-only.
    #[serde(alias = "wo", alias = "WO")]
    WriteOnly,
}

impl Permission {
    /// Returns the short INDIGO name of the permission.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadOnly => "RO",
            Self::ReadWrite => "RW",
            Self::WriteOnly => "WO",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "RO" | "READ_ONLY" | "READONLY" => Ok(Self::ReadOnly),
            "RW" | "READ_WRITE" | "READWRITE" => Ok(Self::ReadWrite),
            "WO" | "WRITE_ONLY" | "WRITEONLY" => Ok(Self::WriteOnly),
            _ => Err(ValueError::InvalidEnum {
                kind: "permission",
                value: s.to_string(),
            }),
        }
    }
}

/// Switch group behaviour (`indigo_rule`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchRule {
    /// Radio button group with exactly one switch on.
    #[serde(alias = "EXACTLY_ONE")]
    ExactlyOne,
    /// Radio button group with none or one switch on.
    #[serde(alias = "AT_MOST_ONE")]
    AtMostOne,
    /// Checkbox group.
    #[serde(alias = "ANY")]
    Any,
}

impl SwitchRule {
    /// Returns the INDIGO name of the rule.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExactlyOne => "EXACTLY_ONE",
            Self::AtMostOne => "AT_MOST_ONE",
            Self::Any => "ANY",
        }
    }
}

impl fmt::Display for SwitchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SwitchRule {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "EXACTLY_ONE" | "EXACTLYONE" => Ok(Self::ExactlyOne),
            "AT_MOST_ONE" | "ATMOSTONE" => Ok(Self::AtMostOne),
            "ANY" => Ok(Self::Any),
            _ => Err(ValueError::InvalidEnum {
                kind: "switch rule",
                value: s.to_string(),
            }),
        }
    }
}

/// Which of the five vector property variants a property is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    /// Text vector.
    Text,
    /// Number vector.
    Number,
    /// Switch vector.
    Switch,
    /// Light vector.
    Light,
    /// BLOB vector.
    Blob,
}

impl PropertyKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Switch => "switch",
            Self::Light => "light",
            Self::Blob => "blob",
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyKind {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).trim_end_matches("_VECTOR").trim_end_matches("_PROPERTY") {
            "TEXT" => Ok(Self::Text),
            "NUMBER" => Ok(Self::Number),
            "SWITCH" => Ok(Self::Switch),
            "LIGHT" => Ok(Self::Light),
            "BLOB" => Ok(Self::Blob),
            _ => Err(ValueError::InvalidEnum {
                kind: "property kind",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_parses_case_insensitively() {
        assert_eq!("Alert".parse::<PropertyState>(), Ok(PropertyState::Alert));
        assert_eq!("busy".parse::<PropertyState>(), Ok(PropertyState::Busy));
        assert_eq!("3".parse::<PropertyState>(), Ok(PropertyState::Alert));
        assert!("sleeping".parse::<PropertyState>().is_err());
    }

    #[test]
    fn state_numeric_values_match_indigo() {
        assert_eq!(PropertyState::Idle.as_num(), 0);
        assert_eq!(PropertyState::Alert.as_num(), 3);
    }

    #[test]
    fn permission_accepts_short_and_long_names() {
        assert_eq!("rw".parse::<Permission>(), Ok(Permission::ReadWrite));
        assert_eq!("read-only".parse::<Permission>(), Ok(Permission::ReadOnly));
        assert_eq!(Permission::WriteOnly.to_string(), "WO");
    }

    #[test]
    fn switch_rule_roundtrips_through_display() {
        for rule in [SwitchRule::ExactlyOne, SwitchRule::AtMostOne, SwitchRule::Any] {
            assert_eq!(rule.to_string().parse::<SwitchRule>(), Ok(rule));
        }
    }

    #[test]
    fn kind_accepts_vector_suffix() {
        assert!("vector".parse::<PropertyKind>().is_err());
        assert_eq!("blob_vector".parse::<PropertyKind>(), Ok(PropertyKind::Blob));
        assert_eq!("switch".parse::<PropertyKind>(), Ok(PropertyKind::Switch));
    }

    #[test]
    fn serde_uses_snake_case() {
        let rule: SwitchRule = serde_json::from_str("\"at_most_one\"").unwrap();
        assert_eq!(rule, SwitchRule::AtMostOne);
        let perm: Permission = serde_json::from_str("\"RO\"").unwrap();
        assert_eq!(perm, Permission::ReadOnly);
        assert_eq!(serde_json::to_string(&PropertyKind::Light).unwrap(), "\"light\"");
    }
}
