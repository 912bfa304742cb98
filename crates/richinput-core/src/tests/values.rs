use std::rc::Rc;

use super::fakes::{FakeEditor, Harness, TestControl};
use crate::config::EditorConfig;
use crate::engine::EngineEvent;
use crate::platform::{DomFocus, DomPart, EditorInstance};
use crate::types::ControlEvent;

fn type_into_input(tc: &TestControl, value: &str) {
    tc.dom.state.borrow_mut().input_value = value.to_string();
    tc.control.notify_input_changed();
}

fn add_image(editor: &FakeEditor, url: &str, blob: bool) {
    editor
        .emit(EngineEvent::ImageAdded {
            url: url.into(),
            blob,
        })
        .unwrap();
}

/// A focused design mode control created with `config`.
fn configured_control(h: &Harness, config: &str) -> (TestControl, Rc<FakeEditor>) {
    let tc = h.control("A", "");
    let config = EditorConfig::from_json(config).unwrap();
    tc.control.set_design_mode(true, Some(config)).unwrap();
    h.load_engine();
    let editor = h.engine.last_editor().unwrap();
    editor.ready().unwrap();
    h.scheduler.run_pending();
    editor.focus();
    tc.control.notify_focus_changed();
    (tc, editor)
}

#[test]
fn test_assigned_values_reset_dirty_baseline() {
    let h = Harness::new();
    let tc = h.control("A", "x");
    assert_eq!(tc.control.value(), "x");
    assert!(!tc.control.is_dirty());

    assert_eq!(tc.control.set_value("y", false), "y");
    assert!(!tc.control.is_dirty());
    tc.control.set_value("y", false);

    tc.control.set_value("z", true);
    assert!(tc.control.is_dirty());
    tc.control.set_value("y", true);
    assert!(!tc.control.is_dirty());

    assert_eq!(
        tc.events.take(),
        [ControlEvent::Change, ControlEvent::Change, ControlEvent::Change]
    );
}

#[test]
fn test_typing_fires_change_once() {
    let h = Harness::new();
    let tc = h.control("A", "");

    type_into_input(&tc, "typed");
    assert_eq!(tc.events.take(), [ControlEvent::Change]);
    assert!(tc.control.is_dirty());

    tc.control.notify_input_changed();
    assert!(tc.events.take().is_empty());
}

#[test]
fn test_user_value_is_dirty() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_user_value("u");
    assert!(tc.control.is_dirty());

    let (tc, editor) = h.design_control("B", "<p>a</p>");
    tc.control.set_user_value("<p>b</p>");
    assert!(tc.control.is_dirty());
    assert_eq!(tc.control.value(), "<p>b</p>");
    assert_eq!(editor.data(), "<p>b</p>");
    assert_eq!(tc.events.take(), [ControlEvent::Change]);
}

#[test]
fn test_design_mode_edits_count_when_focused() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "<p>a</p>");

    // The engine rewriting its content is not an edit.
    editor.type_html("<p>engine</p>");
    assert_eq!(tc.control.value(), "<p>a</p>");
    assert!(!tc.control.is_dirty());
    assert!(tc.events.take().is_empty());

    editor.focus();
    tc.control.notify_focus_changed();
    editor.type_html("<p>c</p>\n");
    assert_eq!(tc.control.value(), "<p>c</p>");
    assert!(tc.control.is_dirty());
    assert_eq!(tc.events.take(), [ControlEvent::Focus, ControlEvent::Change]);

    tc.control.set_value("<p>d</p>", false);
    assert!(!tc.control.is_dirty());
    assert_eq!(tc.control.value(), "<p>d</p>");
    assert_eq!(editor.data(), "<p>d</p>");
    assert_eq!(tc.events.take(), [ControlEvent::Change]);
}

#[test]
fn test_debounced_change_waits_for_pause() {
    let h = Harness::new();
    let tc = h.control("A", "");
    assert_eq!(tc.control.set_change_debounce(Some(200)), Some(200));
    tc.dom.set_focus(DomFocus::Input);
    tc.control.notify_focus_changed();
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);

    type_into_input(&tc, "a");
    h.scheduler.advance(150);
    type_into_input(&tc, "ab");
    h.scheduler.advance(199);
    assert!(tc.events.take().is_empty());
    h.scheduler.advance(1);
    assert_eq!(tc.events.take(), [ControlEvent::Change]);

    // Leaving the control publishes a pending change first.
    type_into_input(&tc, "abc");
    tc.control.set_focused(false);
    assert_eq!(tc.events.take(), [ControlEvent::Change, ControlEvent::Blur]);
    h.scheduler.advance(500);
    assert!(tc.events.take().is_empty());
}

#[test]
fn test_assigning_cancels_pending_change() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_change_debounce(Some(200));

    type_into_input(&tc, "a");
    tc.control.set_value("b", false);
    assert_eq!(tc.events.take(), [ControlEvent::Change]);
    h.scheduler.advance(500);
    assert!(tc.events.take().is_empty());
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_turning_debounce_off_flushes() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_change_debounce(Some(200));

    type_into_input(&tc, "a");
    assert!(tc.events.take().is_empty());
    assert_eq!(tc.control.set_change_debounce(None), None);
    assert_eq!(tc.events.take(), [ControlEvent::Change]);
}

#[test]
fn test_placeholder_shown_while_empty() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");

    tc.control.set_placeholder("Type here");
    assert_eq!(tc.dom.state.borrow().placeholder, "Type here");
    assert_eq!(
        editor.part_data(DomPart::Editable, "placeholder").as_deref(),
        Some("Type here")
    );

    tc.control.set_value("<p>x</p>", false);
    assert_eq!(editor.part_data(DomPart::Editable, "placeholder"), None);
}

#[test]
fn test_dispose_revokes_all_tracked_blobs() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    add_image(&editor, "blob:a", true);
    add_image(&editor, "https://example.com/c.png", false);
    editor
        .emit(EngineEvent::Paste {
            blob_urls: vec!["blob:b".into()],
        })
        .unwrap();

    tc.control.dispose();
    assert_eq!(*h.revoker.revoked.borrow(), ["blob:a", "blob:b"]);
}

#[test]
fn test_dispose_keeps_referenced_blobs() {
    let h = Harness::new();
    let (tc, editor) = configured_control(
        &h,
        r#"{ "Plugins": { "Images": { "Enabled": true, "EmbedType": "blob", "RevokeBlobUrlsOnDispose": "UnreferencedOnly" } } }"#,
    );
    add_image(&editor, "blob:a", true);
    add_image(&editor, "blob:b", true);
    editor.type_html(r#"<p><img src="blob:a"></p>"#);

    tc.control.dispose();
    assert_eq!(*h.revoker.revoked.borrow(), ["blob:b"]);
}

#[test]
fn test_assigned_value_releases_unreferenced_blobs() {
    let h = Harness::new();
    let (tc, editor) = configured_control(
        &h,
        r#"{ "Plugins": { "Images": { "Enabled": true, "EmbedType": "blob", "RevokeUnreferencedBlobUrlsOnValueSet": true } } }"#,
    );
    add_image(&editor, "blob:a", true);
    add_image(&editor, "blob:b", true);

    tc.control.set_value(r#"<p><img src="blob:a"></p>"#, false);
    assert_eq!(*h.revoker.revoked.borrow(), ["blob:b"]);

    tc.control.dispose();
    assert_eq!(*h.revoker.revoked.borrow(), ["blob:b", "blob:a"]);
}
