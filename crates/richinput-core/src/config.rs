//! Design mode configuration.
//!
//! Mirrors the option object accepted by `set_design_mode(true, config)`.
//! Field names deserialize from PascalCase so configuration written for the
//! web component (`{"Toolbar": {"Position": "Bottom"}}`) loads unchanged.
//! Options that distinguish "unset" from `false` are `Option<bool>`.

use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::error::InputError;
use crate::tags::{TagCreator, TagRequestHook, TagResponseHook};
use crate::types::{Size, SizeUnit};

/// Languages the editor engine ships translations for.
pub const SUPPORTED_LANGUAGES: &[&str] = &["da", "de", "en", "no"];

/// Engine language for a locale such as `de-DE`, falling back to English.
pub fn language_for_locale(locale: &str) -> &'static str {
    let code = locale.get(..2).unwrap_or(locale).to_ascii_lowercase();
    SUPPORTED_LANGUAGES
        .iter()
        .find(|lang| **lang == code)
        .copied()
        .unwrap_or("en")
}

/// Callback attached to the configuration after deserialization.
///
/// Compared by identity, so two configurations referencing the same hook are
/// equal.
pub struct Hook<T: ?Sized>(pub Rc<T>);

impl<T: ?Sized> Hook<T> {
    pub fn new(inner: Rc<T>) -> Self {
        Self(inner)
    }
}

impl<T: ?Sized> Clone for Hook<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T: ?Sized> PartialEq for Hook<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: ?Sized> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Hook(..)")
    }
}

impl<T: ?Sized> std::ops::Deref for Hook<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

/// Length as written in configuration. The unit defaults to pixels.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub value: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<SizeUnit>,
}

impl Dimension {
    pub fn new(value: f64, unit: SizeUnit) -> Self {
        Self {
            value,
            unit: Some(unit),
        }
    }

    pub fn size(&self) -> Size {
        Size::new(self.value, self.unit.unwrap_or_default())
    }
}

impl From<Size> for Dimension {
    fn from(size: Size) -> Self {
        Self::new(size.value, size.unit)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmbedType {
    #[default]
    #[serde(rename = "base64")]
    Base64,
    #[serde(rename = "blob")]
    Blob,
}

/// Which tracked image blobs are released when the control is disposed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RevokePolicy {
    #[default]
    All,
    UnreferencedOnly,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ToolbarPosition {
    #[default]
    Top,
    Bottom,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InfoPanelAlignment {
    Left,
    #[default]
    Center,
    Right,
}

impl InfoPanelAlignment {
    pub fn as_css(&self) -> &'static str {
        match self {
            InfoPanelAlignment::Left => "left",
            InfoPanelAlignment::Center => "center",
            InfoPanelAlignment::Right => "right",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ImagesConfig {
    pub enabled: Option<bool>,
    pub embed_type: Option<EmbedType>,
    pub revoke_blob_urls_on_dispose: Option<RevokePolicy>,
    pub revoke_external_blob_urls_on_dispose: Option<bool>,
    pub revoke_unreferenced_blob_urls_on_value_set: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct PluginsConfig {
    pub emojis: Option<bool>,
    pub images: Option<ImagesConfig>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ToolbarConfig {
    pub formatting: Option<bool>,
    pub justify: Option<bool>,
    pub lists: Option<bool>,
    pub links: Option<bool>,
    pub emojis: Option<bool>,
    pub images: Option<bool>,
    pub tables: Option<bool>,
    pub detach: Option<bool>,
    pub position: Option<ToolbarPosition>,
    pub sticky: Option<bool>,
    pub hide_when_inactive: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct InfoPanelConfig {
    pub text: Option<String>,
    pub alignment: Option<InfoPanelAlignment>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TagTrigger {
    pub marker: SmolStr,
    pub minimum_characters: Option<u32>,
    /// Milliseconds; `0` disables debouncing, unset means 300.
    pub debounce_query: Option<u32>,
    pub pattern: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TagsConfig {
    pub triggers: Vec<TagTrigger>,
    pub query_url: String,
    pub jsonp_callback: Option<String>,
    pub jsonp_timeout: Option<u32>,
    #[serde(skip)]
    pub on_request: Option<Hook<dyn TagRequestHook>>,
    #[serde(skip)]
    pub on_response: Option<Hook<dyn TagResponseHook>>,
    #[serde(skip)]
    pub tag_creator: Option<Hook<dyn TagCreator>>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct AutoGrowConfig {
    pub enabled: Option<bool>,
    pub minimum_height: Option<Dimension>,
    pub maximum_height: Option<Dimension>,
    pub prevent_resize_beyond_maximum_height: Option<bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DetachableConfig {
    pub title: Option<String>,
    pub maximizable: Option<bool>,
    pub maximized: Option<bool>,
    pub draggable: Option<bool>,
    pub resizable: Option<bool>,
    pub width: Option<Dimension>,
    pub minimum_width: Option<Dimension>,
    pub maximum_width: Option<Dimension>,
    pub height: Option<Dimension>,
    pub minimum_height: Option<Dimension>,
    pub maximum_height: Option<Dimension>,
}

/// Complete design mode configuration.
///
/// Cloned when handed to a control; a configuration applied to a live editor
/// is never modified, changes go through a reload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct EditorConfig {
    pub plugins: Option<PluginsConfig>,
    pub toolbar: Option<ToolbarConfig>,
    pub info_panel: Option<InfoPanelConfig>,
    pub tags: Option<TagsConfig>,
    pub auto_grow: Option<AutoGrowConfig>,
    pub detachable: Option<DetachableConfig>,
}

impl EditorConfig {
    /// Parse and validate a JSON option object.
    pub fn from_json(json: &str) -> Result<Self, InputError> {
        let config: EditorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field rules serde cannot express.
    pub fn validate(&self) -> Result<(), InputError> {
        if let Some(tags) = &self.tags {
            if tags.query_url.trim().is_empty() {
                return Err(InputError::invalid_config(
                    "Tags.QueryUrl",
                    "a query url is required",
                ));
            }
            if tags.triggers.is_empty() {
                return Err(InputError::invalid_config(
                    "Tags.Triggers",
                    "at least one trigger is required",
                ));
            }
            for trigger in &tags.triggers {
                if trigger.marker.is_empty() {
                    return Err(InputError::invalid_config(
                        "Tags.Triggers.Marker",
                        "marker must not be empty",
                    ));
                }
                if let Some(pattern) = &trigger.pattern {
                    regex::Regex::new(pattern).map_err(|e| {
                        InputError::invalid_config("Tags.Triggers.Pattern", e.to_string())
                    })?;
                }
            }
            if tags.jsonp_timeout == Some(0) {
                return Err(InputError::invalid_config(
                    "Tags.JsonpTimeout",
                    "timeout must be positive",
                ));
            }
        }

        if let Some(auto_grow) = &self.auto_grow {
            check_range(
                "AutoGrow.MinimumHeight",
                auto_grow.minimum_height,
                auto_grow.maximum_height,
            )?;
        }

        if let Some(detachable) = &self.detachable {
            for (field, dim) in [
                ("Detachable.Width", detachable.width),
                ("Detachable.Height", detachable.height),
            ] {
                if let Some(dim) = dim
                    && !(dim.value.is_finite() && dim.value > 0.0)
                {
                    return Err(InputError::invalid_config(field, "must be positive"));
                }
            }
            check_range(
                "Detachable.MinimumWidth",
                detachable.minimum_width,
                detachable.maximum_width,
            )?;
            check_range(
                "Detachable.MinimumHeight",
                detachable.minimum_height,
                detachable.maximum_height,
            )?;
        }

        Ok(())
    }

    fn images(&self) -> Option<&ImagesConfig> {
        self.plugins.as_ref()?.images.as_ref()
    }

    /// Image support requested explicitly, by plugin or toolbar button.
    pub fn images_requested(&self) -> bool {
        self.images().and_then(|i| i.enabled) == Some(true)
            || self.toolbar.as_ref().and_then(|t| t.images) == Some(true)
    }

    pub fn emojis_requested(&self) -> bool {
        self.plugins.as_ref().and_then(|p| p.emojis) == Some(true)
            || self.toolbar.as_ref().and_then(|t| t.emojis) == Some(true)
    }

    pub fn embed_type(&self) -> EmbedType {
        self.images().and_then(|i| i.embed_type).unwrap_or_default()
    }

    pub fn revoke_policy(&self) -> RevokePolicy {
        self.images()
            .and_then(|i| i.revoke_blob_urls_on_dispose)
            .unwrap_or_default()
    }

    pub fn revoke_external_blobs(&self) -> bool {
        self.images().and_then(|i| i.revoke_external_blob_urls_on_dispose) == Some(true)
    }

    pub fn revoke_unreferenced_on_value_set(&self) -> bool {
        self.images()
            .and_then(|i| i.revoke_unreferenced_blob_urls_on_value_set)
            == Some(true)
    }

    pub fn toolbar_position(&self) -> ToolbarPosition {
        self.toolbar
            .as_ref()
            .and_then(|t| t.position)
            .unwrap_or_default()
    }

    pub fn toolbar_sticky(&self) -> bool {
        self.toolbar.as_ref().and_then(|t| t.sticky) == Some(true)
    }

    pub fn hide_toolbar_when_inactive(&self) -> bool {
        self.toolbar.as_ref().and_then(|t| t.hide_when_inactive) == Some(true)
    }

    pub fn detach_enabled(&self) -> bool {
        self.toolbar.as_ref().and_then(|t| t.detach) == Some(true)
    }

    pub fn auto_grow_enabled(&self) -> bool {
        self.auto_grow.as_ref().and_then(|a| a.enabled) == Some(true)
    }

    pub fn prevent_resize_beyond_maximum(&self) -> bool {
        self.auto_grow
            .as_ref()
            .and_then(|a| a.prevent_resize_beyond_maximum_height)
            == Some(true)
    }
}

fn check_range(
    field: &'static str,
    minimum: Option<Dimension>,
    maximum: Option<Dimension>,
) -> Result<(), InputError> {
    for dim in [minimum, maximum].into_iter().flatten() {
        if !dim.value.is_finite() || dim.value < 0.0 {
            return Err(InputError::invalid_config(field, "must be a non-negative number"));
        }
    }
    if let (Some(min), Some(max)) = (minimum, maximum) {
        let (min, max) = (min.size(), max.size());
        if min.unit == max.unit && min.value > max.value {
            return Err(InputError::invalid_config(
                field,
                "minimum must not exceed maximum",
            ));
        }
    }
    Ok(())
}

/// Process-wide engine settings, applied once when the engine script loads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct EngineSettings {
    pub script_url: SmolStr,
    #[serde(default)]
    pub skin: Option<SmolStr>,
}

impl EngineSettings {
    pub fn new(script_url: impl Into<SmolStr>) -> Self {
        Self {
            script_url: script_url.into(),
            skin: None,
        }
    }
}
