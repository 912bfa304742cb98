//! Shared value types: control identity, CSS sizes and public events.

use std::fmt;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Identity of a control instance.
///
/// Used as the ownership key for process-wide shared resources (the modal
/// dialog subsystem, toolbar panels) and to derive engine element ids.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ControlId(SmolStr);

impl ControlId {
    pub fn new(id: impl Into<SmolStr>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Element id handed to the engine when replacing the native input.
    pub fn editor_element_id(&self) -> SmolStr {
        smol_str::format_smolstr!("{}_DesignMode", self.0)
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ControlId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// CSS length unit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SizeUnit {
    #[default]
    #[serde(rename = "px")]
    Px,
    #[serde(rename = "em")]
    Em,
    #[serde(rename = "rem")]
    Rem,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "vh")]
    Vh,
    #[serde(rename = "vw")]
    Vw,
}

impl SizeUnit {
    pub fn as_css(&self) -> &'static str {
        match self {
            SizeUnit::Px => "px",
            SizeUnit::Em => "em",
            SizeUnit::Rem => "rem",
            SizeUnit::Percent => "%",
            SizeUnit::Vh => "vh",
            SizeUnit::Vw => "vw",
        }
    }
}

/// A CSS length. A value of `-1` means "not set" (use the default size),
/// which in design mode enables auto-grow.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub value: f64,
    pub unit: SizeUnit,
}

impl Size {
    pub const UNSET: Size = Size {
        value: -1.0,
        unit: SizeUnit::Px,
    };

    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self { value, unit }
    }

    pub fn px(value: f64) -> Self {
        Self::new(value, SizeUnit::Px)
    }

    pub fn percent(value: f64) -> Self {
        Self::new(value, SizeUnit::Percent)
    }

    pub fn is_unset(&self) -> bool {
        self.value == -1.0
    }

    pub fn to_css(&self) -> String {
        format!("{}{}", self.value, self.unit.as_css())
    }
}

impl Default for Size {
    fn default() -> Self {
        Self::UNSET
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.value, self.unit.as_css())
    }
}

/// Events a control publishes to application code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ControlEvent {
    Change,
    Focus,
    Blur,
}

/// Resize behaviour of a multi-line control or design mode editor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Resizing {
    Enabled,
    #[default]
    Disabled,
    Horizontal,
    Vertical,
}

impl Resizing {
    /// Direction string understood by the engine's resize plugin.
    pub fn engine_direction(&self) -> &'static str {
        match self {
            Resizing::Enabled => "both",
            Resizing::Vertical => "vertical",
            Resizing::Horizontal => "horizontal",
            Resizing::Disabled => "none",
        }
    }

    pub fn as_data(&self) -> &'static str {
        match self {
            Resizing::Enabled => "enabled",
            Resizing::Disabled => "disabled",
            Resizing::Horizontal => "horizontal",
            Resizing::Vertical => "vertical",
        }
    }
}
