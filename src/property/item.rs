// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Item types, one per property kind.

use std::fmt;

use super::{PropertyKind, PropertyState};

/// A text item.
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    /// Item name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Item value.
    pub value: String,
}

impl TextItem {
    /// Creates a text item with an empty label.
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value: value.into(),
        }
    }
}

impl fmt::Display for TextItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = \"{}\"", self.name, self.value)
    }
}

/// A number item with its optional range and target.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberItem {
    /// Item name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Current value.
    pub value: f64,
    /// printf-style format hint, `%g` unless the driver says otherwise.
    pub format: String,
    /// Lower bound.
    pub min: Option<f64>,
    /// Upper bound.
    pub max: Option<f64>,
    /// Step between allowed values.
    pub step: Option<f64>,
    /// Value the device is moving toward.
    pub target: Option<f64>,
}

impl NumberItem {
    /// Creates a number item with no range information.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value,
            format: "%g".to_string(),
            min: None,
            max: None,
            step: None,
            target: None,
        }
    }

    /// Sets the allowed range.
    #[must_use]
    pub fn with_range(mut self, min: f64, max: f64, step: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.step = Some(step);
        self
    }

    /// Sets the target value.
    #[must_use]
    pub fn with_target(mut self, target: f64) -> Self {
        self.target = Some(target);
        self
    }
}

impl fmt::Display for NumberItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn opt(v: Option<f64>) -> String {
            v.map_or_else(String::new, |v| v.to_string())
        }

        write!(f, "{} = {}", self.name, self.value)?;
        if let Some(target) = self.target {
            write!(f, ", target {target}")?;
        }
        // slice notation [min:max:step]
        if self.min.is_some() || self.max.is_some() {
            write!(
                f,
                ", in range [{}:{}:{}]",
                opt(self.min),
                opt(self.max),
                opt(self.step)
            )?;
        }
        Ok(())
    }
}

/// A switch item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwitchItem {
    /// Item name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Whether the switch is on.
    pub value: bool,
}

impl SwitchItem {
    /// Creates a switch item with an empty label.
    #[must_use]
    pub fn new(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value,
        }
    }
}

impl fmt::Display for SwitchItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)
    }
}

/// A light (status indicator) item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightItem {
    /// Item name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Indicated state.
    pub value: PropertyState,
}

impl LightItem {
    /// Creates a light item with an empty label.
    #[must_use]
    pub fn new(name: impl Into<String>, value: PropertyState) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value,
        }
    }
}

impl fmt::Display for LightItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} is in {} state", self.name, self.value)
    }
}

/// A binary blob item, e.g. an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobItem {
    /// Item name.
    pub name: String,
    /// Human-readable label.
    pub label: String,
    /// Raw bytes.
    pub value: Vec<u8>,
    /// Format suffix such as `.fits`.
    pub format: String,
}

impl BlobItem {
    /// Creates a blob item with an empty label.
    #[must_use]
    pub fn new(name: impl Into<String>, value: Vec<u8>, format: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: String::new(),
            value,
            format: format.into(),
        }
    }
}

impl fmt::Display for BlobItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} bytes BLOB {} in \"{}\" format",
            self.value.len(),
            self.name,
            self.format
        )
    }
}

/// Any single item, used when building a property item by item.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    /// A text item.
    Text(TextItem),
    /// A number item.
    Number(NumberItem),
    /// A switch item.
    Switch(SwitchItem),
    /// A light item.
    Light(LightItem),
    /// A blob item.
    Blob(BlobItem),
}

impl Item {
    /// Returns the property kind this item belongs to.
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

    /// Returns the item name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Text(item) => &item.name,
            Self::Number(item) => &item.name,
            Self::Switch(item) => &item.name,
            Self::Light(item) => &item.name,
            Self::Blob(item) => &item.name,
        }
    }
}

impl From<TextItem> for Item {
    fn from(item: TextItem) -> Self {
        Self::Text(item)
    }
}

impl From<NumberItem> for Item {
    fn from(item: NumberItem) -> Self {
        Self::Number(item)
    }
}

impl From<SwitchItem> for Item {
    fn from(item: SwitchItem) -> Self {
        Self::Switch(item)
    }
}

impl From<LightItem> for Item {
    fn from(item: LightItem) -> Self {
        Self::Light(item)
    }
}

impl From<BlobItem> for Item {
    fn from(item: BlobItem) -> Self {
        Self::Blob(item)
    }
}
