//! The detached editor: a larger editor in a modal window, editing a copy of
//! the control's value.
//!
//! The window and its editor are created once per control and reused. The
//! copy is written back when the user commits; canceling discards it after
//! confirmation if it was modified.

use std::rc::{Rc, Weak};

use serde::Serialize;
use smol_str::SmolStr;

use crate::config::{
    DetachableConfig, Dimension, EditorConfig, ImagesConfig, PluginsConfig, RevokePolicy,
    ToolbarConfig, ToolbarPosition,
};
use crate::focus::FocusSignal;
use crate::locale::Strings;
use crate::types::{ControlId, Size, SizeUnit};
use crate::value::normalize_editor_html;

/// The modal window hosting the detached editor.
pub trait DetachedDialog {
    fn set_value(&self, html: &str);

    fn value(&self) -> String;

    /// Apply settings. Unless `preserve_geometry` is set, the window is also
    /// resized and re-centered.
    fn apply_settings(&self, settings: &DetachedSettings, preserve_geometry: bool);

    /// The editor inside the window reloads itself for a new language.
    fn set_locale(&self, locale: &str);

    fn open(&self);

    fn close(&self);

    fn is_open(&self) -> bool;

    /// Disabling also disables the commit button.
    fn set_enabled(&self, enabled: bool);

    fn focus_editor(&self);

    fn focus_cancel(&self);

    fn dispose(&self);
}

/// Commit and cancel buttons of the detached window, implemented by the
/// owning control.
pub trait DetachedActions {
    fn commit(&self);

    fn cancel(&self);
}

pub trait DetachedDialogFactory {
    fn create(&self, owner: &ControlId, actions: Weak<dyn DetachedActions>)
    -> Rc<dyn DetachedDialog>;
}

/// Settings for the detached window and its editor.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DetachedSettings {
    pub title: String,
    pub maximizable: bool,
    pub maximized: bool,
    pub draggable: bool,
    pub resizable: bool,
    pub width: Size,
    pub minimum_width: Size,
    pub maximum_width: Size,
    pub height: Size,
    pub minimum_height: Size,
    pub maximum_height: Size,
    pub spellcheck: bool,
    pub ok_label: SmolStr,
    pub cancel_label: SmolStr,
    pub editor: EditorConfig,
}

impl DetachedSettings {
    /// Derive from the owning control's configuration.
    ///
    /// The detached editor always shows its toolbar on top and cannot be
    /// detached again or auto grow. When images are enabled it may embed
    /// them, but only revokes blobs the owner does not reference, since
    /// committed images are handed over to the owner.
    pub fn derive(
        config: Option<&EditorConfig>,
        images_enabled: bool,
        spellcheck: bool,
        strings: &Strings,
    ) -> Self {
        let mut editor = config.cloned().unwrap_or_default();
        let detachable = editor.detachable.take().unwrap_or_default();
        editor.auto_grow = None;

        if images_enabled {
            let embed_type = editor.embed_type();
            let plugins = editor.plugins.get_or_insert_with(PluginsConfig::default);
            plugins.images = Some(ImagesConfig {
                enabled: Some(true),
                embed_type: Some(embed_type),
                revoke_blob_urls_on_dispose: Some(RevokePolicy::UnreferencedOnly),
                revoke_external_blob_urls_on_dispose: Some(false),
                revoke_unreferenced_blob_urls_on_value_set: None,
            });
        }

        let toolbar = editor.toolbar.get_or_insert_with(ToolbarConfig::default);
        toolbar.detach = Some(false);
        toolbar.position = Some(ToolbarPosition::Top);
        toolbar.sticky = Some(false);
        toolbar.hide_when_inactive = Some(false);

        let DetachableConfig {
            title,
            maximizable,
            maximized,
            draggable,
            resizable,
            width,
            minimum_width,
            maximum_width,
            height,
            minimum_height,
            maximum_height,
        } = detachable;
        let size = |dim: Option<Dimension>, value: f64, unit: SizeUnit| {
            dim.map(|d| d.size()).unwrap_or(Size::new(value, unit))
        };

        DetachedSettings {
            title: title.unwrap_or_default(),
            maximizable: maximizable.unwrap_or(true),
            maximized: maximized.unwrap_or(false),
            draggable: draggable.unwrap_or(true),
            resizable: resizable.unwrap_or(true),
            width: size(width, 850.0, SizeUnit::Px),
            minimum_width: size(minimum_width, 20.0, SizeUnit::Em),
            maximum_width: size(maximum_width, 100.0, SizeUnit::Percent),
            height: size(height, 550.0, SizeUnit::Px),
            minimum_height: size(minimum_height, 12.0, SizeUnit::Em),
            maximum_height: size(maximum_height, 100.0, SizeUnit::Percent),
            spellcheck,
            ok_label: strings.ok.into(),
            cancel_label: strings.cancel.into(),
            editor,
        }
    }
}

/// A control's detached window and whether the control currently uses it.
pub struct DetachedSession {
    dialog: Rc<dyn DetachedDialog>,
    active: bool,
}

impl DetachedSession {
    pub fn new(dialog: Rc<dyn DetachedDialog>) -> Self {
        Self {
            dialog,
            active: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_open(&self) -> bool {
        self.active && self.dialog.is_open()
    }

    pub fn value(&self) -> String {
        normalize_editor_html(&self.dialog.value())
    }

    pub fn open(&mut self, value: &str, settings: &DetachedSettings) {
        self.active = true;
        self.dialog.set_value(value);
        self.dialog.apply_settings(settings, false);
        self.dialog.open();
    }

    pub fn close(&mut self) {
        self.active = false;
        self.dialog.close();
    }

    /// Follow the owner's visibility. Returns the focus transition implied
    /// by the window appearing or disappearing.
    pub fn set_visible(&mut self, visible: bool) -> Option<FocusSignal> {
        if !self.active {
            return None;
        }
        let open = self.dialog.is_open();
        if !visible && open {
            self.dialog.close();
            Some(FocusSignal::Blur)
        } else if visible && !open {
            self.dialog.open();
            Some(FocusSignal::Focus)
        } else {
            None
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.dialog.set_enabled(enabled);
        if self.active {
            self.focus(enabled);
        }
    }

    /// Focus the editor, or the cancel button while disabled.
    pub fn focus(&self, enabled: bool) {
        if enabled {
            self.dialog.focus_editor();
        } else {
            self.dialog.focus_cancel();
        }
    }

    pub fn focus_cancel(&self) {
        self.dialog.focus_cancel();
    }

    /// Re-apply settings after the owner reloaded, keeping window geometry.
    pub fn reload(&self, settings: &DetachedSettings) {
        self.dialog.apply_settings(settings, true);
    }

    pub fn set_locale(&self, locale: &str) {
        self.dialog.set_locale(locale);
    }

    pub fn dispose(self) {
        self.dialog.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AutoGrowConfig, EmbedType};
    use crate::locale::strings;

    #[test]
    fn test_settings_defaults() {
        let settings = DetachedSettings::derive(None, false, true, strings("en"));
        assert_eq!(settings.title, "");
        assert!(settings.maximizable && settings.draggable && settings.resizable);
        assert!(!settings.maximized);
        assert_eq!(settings.width, Size::px(850.0));
        assert_eq!(settings.minimum_width, Size::new(20.0, SizeUnit::Em));
        assert_eq!(settings.maximum_height, Size::percent(100.0));
        assert_eq!(settings.cancel_label, "Cancel");

        let toolbar = settings.editor.toolbar.unwrap();
        assert_eq!(toolbar.detach, Some(false));
        assert_eq!(toolbar.position, Some(ToolbarPosition::Top));
        assert!(settings.editor.plugins.is_none());
    }

    #[test]
    fn test_settings_override_owner_config() {
        let config = EditorConfig {
            plugins: Some(PluginsConfig {
                images: Some(ImagesConfig {
                    enabled: Some(true),
                    embed_type: Some(EmbedType::Blob),
                    revoke_blob_urls_on_dispose: Some(RevokePolicy::All),
                    revoke_external_blob_urls_on_dispose: Some(true),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            toolbar: Some(ToolbarConfig {
                detach: Some(true),
                position: Some(ToolbarPosition::Bottom),
                hide_when_inactive: Some(true),
                ..Default::default()
            }),
            auto_grow: Some(AutoGrowConfig {
                enabled: Some(true),
                ..Default::default()
            }),
            detachable: Some(DetachableConfig {
                title: Some("Notes".into()),
                width: Some(Dimension::new(60.0, SizeUnit::Percent)),
                ..Default::default()
            }),
            ..Default::default()
        };

        let settings = DetachedSettings::derive(Some(&config), true, false, strings("da"));
        assert_eq!(settings.title, "Notes");
        assert_eq!(settings.width, Size::percent(60.0));
        assert_eq!(settings.ok_label, "OK");
        assert!(!settings.spellcheck);
        assert!(settings.editor.auto_grow.is_none());
        assert!(settings.editor.detachable.is_none());
        assert!(!settings.editor.hide_toolbar_when_inactive());
        assert_eq!(settings.editor.toolbar_position(), ToolbarPosition::Top);
        assert_eq!(settings.editor.embed_type(), EmbedType::Blob);
        assert_eq!(
            settings.editor.revoke_policy(),
            RevokePolicy::UnreferencedOnly
        );
        assert!(!settings.editor.revoke_external_blobs());
    }
}
