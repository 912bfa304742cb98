//! Value baseline and dirty tracking.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_PARAGRAPH_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</p>\n$").expect("valid regex"));

static EMPTY_IMAGE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(<img[^>]*?) class=""([^>]*>)"#).expect("valid regex"));

/// Clean up HTML returned by the editor engine.
///
/// The engine's writer appends a newline after the final paragraph, and the
/// image resize plugin can leave an empty `class` attribute on the selected
/// image. Only one image can be selected at a time, so only the first match
/// is rewritten.
pub fn normalize_editor_html(html: &str) -> String {
    let html = TRAILING_PARAGRAPH_NEWLINE.replace(html, "</p>");
    EMPTY_IMAGE_CLASS.replace(&html, "$1$2").into_owned()
}

/// Original value, last notified value and editor dirty flags of one control.
///
/// In design mode dirty state is never derived by comparing values: the
/// engine rewrites markup it is given, so the value counts as dirty once the
/// user edits it, or a user value is assigned.
#[derive(Debug, Default, Clone)]
pub struct ValueStore {
    original: String,
    assigned: String,
    notified: String,
    editor_dirty: bool,
    dirty_pending: bool,
}

impl ValueStore {
    /// Record an externally assigned value.
    ///
    /// Resets the dirty baseline unless `preserve_dirty` is set.
    pub fn assign(&mut self, value: &str, preserve_dirty: bool) {
        if !preserve_dirty {
            self.original = value.to_string();
        }
        self.assigned = value.to_string();
        self.notified = value.to_string();
        self.editor_dirty = self.dirty_pending;
        self.dirty_pending = false;
    }

    /// Dirty baseline.
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The value most recently assigned by code, returned from design mode
    /// while the user has not edited it.
    pub fn assigned(&self) -> &str {
        &self.assigned
    }

    /// Value most recently announced through a change notification.
    pub fn notified(&self) -> &str {
        &self.notified
    }

    /// Record `current` as notified if it differs. Returns whether a change
    /// notification is due.
    pub fn take_change(&mut self, current: &str) -> bool {
        if current == self.notified {
            return false;
        }
        self.notified = current.to_string();
        true
    }

    /// The next assignment comes from the user rather than code.
    pub fn mark_user_value(&mut self) {
        self.dirty_pending = true;
    }

    /// The user edited the value inside the editor.
    pub fn mark_edited(&mut self) {
        self.editor_dirty = true;
    }

    pub fn is_editor_dirty(&self) -> bool {
        self.editor_dirty
    }

    /// Forget a pending user value mark, e.g. when the editor is destroyed.
    pub fn clear_pending(&mut self) {
        self.dirty_pending = false;
    }

    pub fn is_dirty(&self, design_mode: bool, current: &str) -> bool {
        if design_mode {
            self.editor_dirty
        } else {
            self.original != current
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trailing_newline() {
        assert_eq!(
            normalize_editor_html("<p>Hello world</p>\n"),
            "<p>Hello world</p>"
        );
        assert_eq!(
            normalize_editor_html("<p>a</p>\n<p>b</p>\n"),
            "<p>a</p>\n<p>b</p>"
        );
        assert_eq!(normalize_editor_html("<p>x</p>\n\n"), "<p>x</p>\n\n");
    }

    #[test]
    fn test_normalize_empty_image_class() {
        assert_eq!(
            normalize_editor_html(r#"<p><img class="" src="a.png"></p>"#),
            r#"<p><img src="a.png"></p>"#
        );
        // Only the first (selected) image.
        assert_eq!(
            normalize_editor_html(r#"<img class="" src="a"><img class="" src="b">"#),
            r#"<img src="a"><img class="" src="b">"#
        );
        assert_eq!(
            normalize_editor_html(r#"<img class="wide" src="a">"#),
            r#"<img class="wide" src="a">"#
        );
    }

    #[test]
    fn test_preserve_dirty_keeps_baseline() {
        let mut store = ValueStore::default();
        store.assign("a", false);
        store.assign("b", true);
        assert_eq!(store.original(), "a");
        assert_eq!(store.assigned(), "b");
        assert!(store.is_dirty(false, "b"));
        store.assign("c", false);
        assert!(!store.is_dirty(false, "c"));
    }

    #[test]
    fn test_design_mode_dirty_is_flag_based() {
        let mut store = ValueStore::default();
        store.assign("<p>Hello</p>", true);
        assert!(!store.is_dirty(true, "<p>Something else</p>"));
        store.mark_edited();
        assert!(store.is_dirty(true, "<p>Hello</p>"));
        store.assign("<p>Hello</p>", false);
        assert!(!store.is_dirty(true, "<p>Hello</p>"));
    }

    #[test]
    fn test_user_value_marks_dirty_on_assign() {
        let mut store = ValueStore::default();
        store.mark_user_value();
        store.assign("typed", true);
        assert!(store.is_editor_dirty());
        store.assign("reset", false);
        assert!(!store.is_editor_dirty());
    }

    #[test]
    fn test_take_change_is_idempotent() {
        let mut store = ValueStore::default();
        assert!(store.take_change("x"));
        assert!(!store.take_change("x"));
        assert_eq!(store.notified(), "x");
    }
}
