//! Toolbar layout derived from configuration, and temporary button disabling.

use serde::Serialize;
use smol_str::SmolStr;

use crate::config::EditorConfig;
use crate::platform::EditorInstance;

/// Command of the custom button that opens the detached editor.
pub const DETACH_COMMAND: &str = "Detach";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ToolbarGroup {
    pub name: SmolStr,
    pub items: Vec<SmolStr>,
}

impl ToolbarGroup {
    fn new(name: &str, items: &[&str]) -> Self {
        Self {
            name: name.into(),
            items: items.iter().map(|i| SmolStr::new(i)).collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CustomButton {
    pub label: SmolStr,
    pub command: SmolStr,
}

/// Engine plugins, toolbar groups and custom buttons for one editor.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ToolbarLayout {
    pub plugins: Vec<SmolStr>,
    pub groups: Vec<ToolbarGroup>,
    pub custom_buttons: Vec<CustomButton>,
}

impl ToolbarLayout {
    /// Formatting, justify, lists and links are on unless switched off;
    /// without a toolbar section they are the whole toolbar. Emojis, images,
    /// tables and the detach button are opt-in.
    ///
    /// `images_enabled` also covers values that already contain images,
    /// which the engine would strip without the image plugins loaded.
    pub fn derive(config: Option<&EditorConfig>, images_enabled: bool, detach_label: &str) -> Self {
        let mut layout = ToolbarLayout::default();
        let toolbar = config.and_then(|c| c.toolbar.as_ref());
        let on_unless_disabled = |flag: Option<bool>| flag != Some(false);
        let opted_in = |flag: Option<bool>| flag == Some(true);

        if config.is_some_and(|c| c.emojis_requested()) {
            layout.plugins.push("emoji".into());
        }
        if images_enabled {
            if toolbar.is_some_and(|t| opted_in(t.images)) {
                layout.plugins.push("base64image".into());
            }
            layout.plugins.push("base64imagepaste".into());
            layout.plugins.push("dragresize".into());
        }
        layout.plugins.push("custombuttons".into());

        if toolbar.is_none_or(|t| on_unless_disabled(t.formatting)) {
            layout
                .groups
                .push(ToolbarGroup::new("BasicFormatting", &["Bold", "Italic", "Underline"]));
        }
        if toolbar.is_none_or(|t| on_unless_disabled(t.justify)) {
            layout.groups.push(ToolbarGroup::new(
                "Justify",
                &["JustifyLeft", "JustifyCenter", "JustifyRight"],
            ));
        }
        if toolbar.is_none_or(|t| on_unless_disabled(t.lists)) {
            layout.groups.push(ToolbarGroup::new(
                "Lists",
                &["NumberedList", "BulletedList", "Indent", "Outdent"],
            ));
        }
        if toolbar.is_none_or(|t| on_unless_disabled(t.links)) {
            layout
                .groups
                .push(ToolbarGroup::new("Links", &["Link", "Unlink"]));
        }

        if let Some(toolbar) = toolbar {
            let mut insert = Vec::new();
            if opted_in(toolbar.emojis) {
                insert.push("EmojiPanel");
            }
            if opted_in(toolbar.images) {
                insert.push("base64image");
            }
            if opted_in(toolbar.tables) {
                insert.push("Table");
            }
            if !insert.is_empty() {
                layout.groups.push(ToolbarGroup::new("Insert", &insert));
            }

            if opted_in(toolbar.detach) {
                layout.custom_buttons.push(CustomButton {
                    label: detach_label.into(),
                    command: DETACH_COMMAND.into(),
                });
                layout
                    .groups
                    .push(ToolbarGroup::new("DetachableEditor", &[DETACH_COMMAND]));
            }
        }

        layout
    }
}

/// Whether the image plugins must be loaded: requested by configuration or
/// needed because one of `values` already contains an image.
pub fn images_enabled(config: Option<&EditorConfig>, values: &[&str]) -> bool {
    config.is_some_and(|c| c.images_requested()) || values.iter().any(|v| v.contains("<img "))
}

/// Disables toolbar commands while the selection is inside a tag and
/// restores exactly those that were enabled before.
#[derive(Debug, Default)]
pub struct ButtonStateGuard {
    restore: Option<Vec<SmolStr>>,
}

impl ButtonStateGuard {
    /// Disable every command. May be called repeatedly while moving between
    /// tags (the engine re-enables commands on navigation); only the first
    /// call records which commands to restore.
    pub fn disable(&mut self, editor: &dyn EditorInstance) {
        let record = self.restore.is_none();
        let mut enabled = Vec::new();
        for (command, is_enabled) in editor.commands() {
            if record && is_enabled {
                enabled.push(command.clone());
            }
            editor.set_command_enabled(&command, false);
        }
        if record {
            self.restore = Some(enabled);
        }
    }

    pub fn restore(&mut self, editor: &dyn EditorInstance) {
        if let Some(commands) = self.restore.take() {
            for command in commands {
                editor.set_command_enabled(&command, true);
            }
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.restore.is_some()
    }

    /// Drop recorded state without touching the editor (editor destroyed).
    pub fn forget(&mut self) {
        self.restore = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolbarConfig;

    #[test]
    fn test_default_layout() {
        let layout = ToolbarLayout::derive(None, false, "Detach");
        insta::assert_yaml_snapshot!(layout);
    }

    #[test]
    fn test_full_layout() {
        let config = EditorConfig {
            toolbar: Some(ToolbarConfig {
                justify: Some(false),
                emojis: Some(true),
                images: Some(true),
                tables: Some(true),
                detach: Some(true),
                ..Default::default()
            }),
            ..Default::default()
        };
        let layout = ToolbarLayout::derive(Some(&config), images_enabled(Some(&config), &[]), "Pop out");
        insta::assert_yaml_snapshot!(layout);
    }

    #[test]
    fn test_images_forced_by_value() {
        assert!(!images_enabled(None, &["<p>text</p>"]));
        assert!(images_enabled(None, &["<p><img src=\"a.png\"></p>"]));

        let layout = ToolbarLayout::derive(None, true, "Detach");
        assert_eq!(
            layout.plugins,
            vec![
                SmolStr::new("base64imagepaste"),
                SmolStr::new("dragresize"),
                SmolStr::new("custombuttons")
            ]
        );
    }
}
