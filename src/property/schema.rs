// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Schemas for well-known writable properties, analogous to `indigo_names.h`.
//!
//! A schema knows the property name, its kind, the allowed item names and,
//! for switches, the rule. It builds properties ready to be sent to a device.
//!
//! # Examples
//!
//! ```
//! use indigo_dispatch::property::schema::{ccd, common};
//!
//! let connect = common::CONNECTION
//!     .switch("CCD Imager Simulator", &[("CONNECTED", true)])
//!     .unwrap();
//! assert_eq!(connect.switch_value("CONNECTED"), Some(true));
//!
//! let exposure = ccd::CCD_EXPOSURE.single_number("CCD Imager Simulator", 5.0).unwrap();
//! assert_eq!(exposure.number_value("EXPOSURE"), Some(5.0));
//! ```

use crate::error::ValueError;

use super::{NumberItem, Property, PropertyKind, SwitchItem, SwitchRule, TextItem};

/// Description of a well-known property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertySchema {
    /// Property name.
    pub name: &'static str,
    /// Property kind.
    pub kind: PropertyKind,
    /// Allowed item names; empty means any name is accepted.
    pub allowed_items: &'static [&'static str],
    /// Switch rule, for switch properties.
    pub rule: Option<SwitchRule>,
}

impl PropertySchema {
    const fn new(
        name: &'static str,
        kind: PropertyKind,
        allowed_items: &'static [&'static str],
    ) -> Self {
        Self {
            name,
            kind,
            allowed_items,
            rule: None,
        }
    }

    const fn switch_with(
        name: &'static str,
        allowed_items: &'static [&'static str],
        rule: SwitchRule,
    ) -> Self {
        Self {
            name,
            kind: PropertyKind::Switch,
            allowed_items,
            rule: Some(rule),
        }
    }

    /// Returns `true` if the schema accepts the item name.
    #[must_use]
    pub fn allows(&self, item: &str) -> bool {
        self.allowed_items.is_empty() || self.allowed_items.iter().any(|allowed| *allowed == item)
    }

    /// Builds a switch property from `(item, value)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if the schema is not a switch, an item name is not allowed,
    /// or no items are given.
    pub fn switch(&self, device: &str, items: &[(&str, bool)]) -> Result<Property, ValueError> {
        self.build(device, PropertyKind::Switch, items, |name, value| {
            SwitchItem::new(name, *value)
        })
    }

    /// Builds a number property from `(item, value)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if the schema is not a number, an item name is not allowed,
    /// or no items are given.
    pub fn number(&self, device: &str, items: &[(&str, f64)]) -> Result<Property, ValueError> {
        self.build(device, PropertyKind::Number, items, |name, value| {
            NumberItem::new(name, *value)
        })
    }

    /// Builds a text property from `(item, value)` pairs.
    ///
    /// # Errors
    ///
    /// Fails if the schema is not text, an item name is not allowed,
    /// or no items are given.
    pub fn text(&self, device: &str, items: &[(&str, &str)]) -> Result<Property, ValueError> {
        self.build(device, PropertyKind::Text, items, |name, value| {
            TextItem::new(name, *value)
        })
    }

    /// Builds a single-item number property.
    ///
    /// # Errors
    ///
    /// Fails if the schema allows more than one item or is not a number.
    pub fn single_number(&self, device: &str, value: f64) -> Result<Property, ValueError> {
        let item = self.single_item()?;
        self.number(device, &[(item, value)])
    }

    /// Builds a single-item text property.
    ///
    /// # Errors
    ///
    /// Fails if the schema allows more than one item or is not text.
    pub fn single_text(&self, device: &str, value: &str) -> Result<Property, ValueError> {
        let item = self.single_item()?;
        self.text(device, &[(item, value)])
    }

    fn single_item(&self) -> Result<&'static str, ValueError> {
        match self.allowed_items {
            [item] => Ok(*item),
            items => Err(ValueError::NotSingleItem {
                property: self.name.to_string(),
                count: items.len(),
            }),
        }
    }

    fn build<V, I>(
        &self,
        device: &str,
        kind: PropertyKind,
        items: &[(&str, V)],
        make: impl Fn(&str, &V) -> I,
    ) -> Result<Property, ValueError>
    where
        I: Into<super::Item>,
    {
        if self.kind != kind {
            return Err(ValueError::KindMismatch {
                expected: self.kind,
                actual: kind,
            });
        }
        if items.is_empty() {
            return Err(ValueError::EmptyProperty(self.name.to_string()));
        }

        let mut prop = Property::new(self.kind, device, self.name);
        if let Some(rule) = self.rule {
            prop = prop.with_rule(rule);
        }
        for (name, value) in items {
            if !self.allows(name) {
                return Err(ValueError::UnknownItem {
                    property: self.name.to_string(),
                    item: (*name).to_string(),
                });
            }
            prop.push(make(*name, value))?;
        }
        Ok(prop)
    }
}

/// Properties common to all devices.
pub mod common {
    use super::{PropertyKind, PropertySchema, SwitchRule};

    /// Connect or disconnect the device.
    pub const CONNECTION: PropertySchema = PropertySchema::switch_with(
        "CONNECTION",
        &["CONNECTED", "DISCONNECTED"],
        SwitchRule::ExactlyOne,
    );

    /// Device identification.
    pub const INFO: PropertySchema = PropertySchema::new(
        "INFO",
        PropertyKind::Text,
        &[
            "DEVICE_NAME",
            "DEVICE_VERSION",
            "DEVICE_INTERFACE",
            "FRAMEWORK_NAME",
            "FRAMEWORK_VERSION",
            "DEVICE_MODEL",
            "DEVICE_FIRMWARE_REVISION",
            "DEVICE_HARDWARE_REVISION",
            "DEVICE_SERIAL_NUMBER",
        ],
    );

    /// Simulation mode.
    pub const SIMULATION: PropertySchema = PropertySchema::switch_with(
        "SIMULATION",
        &["ENABLED", "DISABLED"],
        SwitchRule::ExactlyOne,
    );

    /// Configuration load/save/remove.
    pub const CONFIG: PropertySchema = PropertySchema::switch_with(
        "CONFIG",
        &["LOAD", "SAVE", "REMOVE"],
        SwitchRule::AtMostOne,
    );

    /// Device path like `/dev/tty0` or URL like `lx200://host:port`.
    pub const DEVICE_PORT: PropertySchema =
        PropertySchema::new("DEVICE_PORT", PropertyKind::Text, &["PORT"]);

    /// Serial port configuration like `9600-8N1`.
    pub const DEVICE_BAUDRATE: PropertySchema =
        PropertySchema::new("DEVICE_BAUDRATE", PropertyKind::Text, &["BAUDRATE"]);

    /// Observatory location.
    pub const GEOGRAPHIC_COORDINATES: PropertySchema = PropertySchema::new(
        "GEOGRAPHIC_COORDINATES",
        PropertyKind::Number,
        &["LATITUDE", "LONGITUDE", "ELEVATION", "ACCURACY"],
    );

    /// Device clock. May be read-only depending on hardware.
    pub const UTC_TIME: PropertySchema =
        PropertySchema::new("UTC_TIME", PropertyKind::Number, &["TIME", "OFFSET"]);
}

/// CCD-specific properties.
pub mod ccd {
    use super::{PropertyKind, PropertySchema, SwitchRule};

    /// Lens aperture and focal length, in centimeters.
    pub const CCD_LENS: PropertySchema = PropertySchema::new(
        "CCD_LENS",
        PropertyKind::Number,
        &["APERTURE", "FOCAL_LENGTH"],
    );

    /// Where images are delivered.
    pub const CCD_UPLOAD_MODE: PropertySchema = PropertySchema::switch_with(
        "CCD_UPLOAD_MODE",
        &["CLIENT", "LOCAL", "BOTH"],
        SwitchRule::ExactlyOne,
    );

    /// Local storage directory and file prefix.
    pub const CCD_LOCAL_MODE: PropertySchema =
        PropertySchema::new("CCD_LOCAL_MODE", PropertyKind::Text, &["DIR", "PREFIX"]);

    /// Start an exposure, in seconds.
    pub const CCD_EXPOSURE: PropertySchema =
        PropertySchema::new("CCD_EXPOSURE", PropertyKind::Number, &["EXPOSURE"]);

    /// Like `CCD_EXPOSURE` but uploads COUNT images; -1 loops forever.
    pub const CCD_STREAMING: PropertySchema = PropertySchema::new(
        "CCD_STREAMING",
        PropertyKind::Number,
        &["EXPOSURE", "COUNT"],
    );

    /// Abort the running exposure.
    pub const CCD_ABORT_EXPOSURE: PropertySchema = PropertySchema::switch_with(
        "CCD_ABORT_EXPOSURE",
        &["ABORT_EXPOSURE"],
        SwitchRule::ExactlyOne,
    );

    /// Region of interest and bit depth.
    pub const CCD_FRAME: PropertySchema = PropertySchema::new(
        "CCD_FRAME",
        PropertyKind::Number,
        &["LEFT", "TOP", "WIDTH", "HEIGHT", "BITS_PER_PIXEL"],
    );

    /// Binning. `CCD_MODE` is the preferred way to set it.
    pub const CCD_BIN: PropertySchema = PropertySchema::new(
        "CCD_BIN",
        PropertyKind::Number,
        &["HORIZONTAL", "VERTICAL"],
    );

    /// Readout mode; item names are device-specific.
    pub const CCD_MODE: PropertySchema =
        PropertySchema::switch_with("CCD_MODE", &[], SwitchRule::ExactlyOne);

    /// Readout speed.
    pub const CCD_READ_MODE: PropertySchema = PropertySchema::switch_with(
        "CCD_READ_MODE",
        &["HIGH_SPEED", "LOW_NOISE"],
        SwitchRule::ExactlyOne,
    );

    /// Sensor gain.
    pub const CCD_GAIN: PropertySchema =
        PropertySchema::new("CCD_GAIN", PropertyKind::Number, &["GAIN"]);

    /// Sensor offset.
    pub const CCD_OFFSET: PropertySchema =
        PropertySchema::new("CCD_OFFSET", PropertyKind::Number, &["OFFSET"]);

    /// Sensor gamma.
    pub const CCD_GAMMA: PropertySchema =
        PropertySchema::new("CCD_GAMMA", PropertyKind::Number, &["GAMMA"]);

    /// Frame type.
    pub const CCD_FRAME_TYPE: PropertySchema = PropertySchema::switch_with(
        "CCD_FRAME_TYPE",
        &["LIGHT", "BIAS", "DARK", "FLAT"],
        SwitchRule::ExactlyOne,
    );

    /// Image format. `JPEG_AVI` and `RAW_SER` use the second format for streaming.
    pub const CCD_IMAGE_FORMAT: PropertySchema = PropertySchema::switch_with(
        "CCD_IMAGE_FORMAT",
        &["RAW", "FITS", "XISF", "JPEG", "JPEG_AVI", "RAW_SER"],
        SwitchRule::ExactlyOne,
    );

    /// Path of the last locally stored image.
    pub const CCD_IMAGE_FILE: PropertySchema =
        PropertySchema::new("CCD_IMAGE_FILE", PropertyKind::Text, &["FILE"]);

    /// The image itself.
    pub const CCD_IMAGE: PropertySchema =
        PropertySchema::new("CCD_IMAGE", PropertyKind::Blob, &["IMAGE"]);

    /// Sensor temperature. May be read-only depending on hardware.
    pub const CCD_TEMPERATURE: PropertySchema =
        PropertySchema::new("CCD_TEMPERATURE", PropertyKind::Number, &["TEMPERATURE"]);

    /// Cooler on/off.
    pub const CCD_COOLER: PropertySchema =
        PropertySchema::switch_with("CCD_COOLER", &["ON", "OFF"], SwitchRule::ExactlyOne);

    /// Cooler power. May be read-only depending on hardware.
    pub const CCD_COOLER_POWER: PropertySchema =
        PropertySchema::new("CCD_COOLER_POWER", PropertyKind::Number, &["POWER"]);

    /// JPEG preview delivery.
    pub const CCD_PREVIEW: PropertySchema = PropertySchema::switch_with(
        "CCD_PREVIEW",
        &["ENABLED", "DISABLED"],
        SwitchRule::ExactlyOne,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_schema_builds_switch_with_rule() {
        let prop = common::CONNECTION
            .switch("Mount Simulator", &[("DISCONNECTED", true)])
            .unwrap();
        assert_eq!(prop.name(), "CONNECTION");
        assert_eq!(prop.device(), "Mount Simulator");
        assert_eq!(prop.switch_rule(), Some(SwitchRule::ExactlyOne));
        assert_eq!(prop.state(), None);
    }

    #[test]
    fn unknown_item_is_rejected() {
        let err = common::CONNECTION
            .switch("Mount Simulator", &[("ON", true)])
            .unwrap_err();
        assert_eq!(
            err,
            ValueError::UnknownItem {
                property: "CONNECTION".to_string(),
                item: "ON".to_string(),
            }
        );
    }

    #[test]
    fn open_schema_accepts_any_item() {
        let prop = ccd::CCD_MODE
            .switch("CCD", &[("RAW 16 1600x1200", true)])
            .unwrap();
        assert_eq!(prop.switch_value("RAW 16 1600x1200"), Some(true));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        let err = ccd::CCD_EXPOSURE.switch("CCD", &[("EXPOSURE", true)]).unwrap_err();
        assert!(matches!(err, ValueError::KindMismatch { .. }));
    }

    #[test]
    fn empty_items_are_rejected() {
        let err = ccd::CCD_FRAME.number("CCD", &[]).unwrap_err();
        assert_eq!(err, ValueError::EmptyProperty("CCD_FRAME".to_string()));
    }

    #[test]
    fn single_value_needs_single_item_schema() {
        let err = ccd::CCD_BIN.single_number("CCD", 2.0).unwrap_err();
        assert_eq!(
            err,
            ValueError::NotSingleItem {
                property: "CCD_BIN".to_string(),
                count: 2,
            }
        );

        let port = common::DEVICE_PORT.single_text("Mount", "/dev/ttyUSB0").unwrap();
        assert_eq!(port.text_value("PORT"), Some("/dev/ttyUSB0"));
    }
}
