use std::rc::Rc;

use super::fakes::{FakeDetachedDialog, FakeEditor, Harness, TestControl};
use crate::engine::EngineEvent;
use crate::locale;
use crate::platform::EditorInstance;
use crate::toolbar::DETACH_COMMAND;
use crate::types::ControlEvent;

fn detach(h: &Harness, editor: &FakeEditor) -> Rc<FakeDetachedDialog> {
    editor
        .emit(EngineEvent::CustomCommand(DETACH_COMMAND.into()))
        .unwrap();
    h.detached.last().unwrap()
}

fn focused_design_control(h: &Harness, value: &str) -> (TestControl, Rc<FakeEditor>) {
    let (tc, editor) = h.design_control("A", value);
    editor.focus();
    tc.control.notify_focus_changed();
    (tc, editor)
}

#[test]
fn test_open_hands_over_value_and_settings() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "<p>a</p>");
    let dialog = detach(&h, &editor);

    assert!(dialog.open.get());
    assert_eq!(*dialog.value.borrow(), "<p>a</p>");
    let (settings, preserve) = dialog.settings.borrow().clone().unwrap();
    assert!(!preserve);
    assert_eq!(settings.ok_label, "OK");
    assert_eq!(settings.editor.toolbar.unwrap().detach, Some(false));

    let state = tc.control.state();
    assert!(state.detached_open);
    assert!(state.focus_locked);
    assert!(tc.control.focused());

    // Opening again while open does nothing.
    tc.control.open_detached();
    assert_eq!(h.detached.dialogs.borrow().len(), 1);
}

#[test]
fn test_detach_requires_ready_editor() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.open_detached();
    assert!(h.detached.last().is_none());
    assert!(!tc.control.state().detached_open);
}

#[test]
fn test_commit_assigns_user_value() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "<p>a</p>");
    let dialog = detach(&h, &editor);

    dialog.type_html("<p>new</p>\n");
    dialog.click_ok();

    assert!(!dialog.open.get());
    assert_eq!(tc.control.value(), "<p>new</p>");
    assert_eq!(editor.data(), "<p>new</p>");
    assert!(tc.control.is_dirty());
    assert_eq!(tc.events.take(), [ControlEvent::Focus, ControlEvent::Change]);

    let state = tc.control.state();
    assert!(!state.detached_open);
    assert!(!state.focus_locked);
    assert!(state.focused);
}

#[test]
fn test_cancel_without_changes_closes() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "<p>a</p>");
    let dialog = detach(&h, &editor);

    dialog.click_cancel();
    assert!(h.confirm.messages.borrow().is_empty());
    assert!(!dialog.open.get());
    assert!(!tc.control.state().focus_locked);
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);
}

#[test]
fn test_cancel_with_changes_asks_first() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "<p>a</p>");
    let dialog = detach(&h, &editor);
    dialog.type_html("<p>edited</p>");

    dialog.click_cancel();
    assert_eq!(
        *h.confirm.messages.borrow(),
        [locale::strings("en").cancel_confirm_message()]
    );
    h.confirm.answer(false);
    assert!(dialog.open.get());
    assert_eq!(dialog.cancel_focused.get(), 1);

    dialog.click_cancel();
    h.confirm.answer(true);
    assert!(!dialog.open.get());
    assert_eq!(tc.control.value(), "<p>a</p>");
    assert!(!tc.control.is_dirty());
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);
}

#[test]
fn test_confirm_message_follows_locale() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "");
    tc.control.set_locale("de-DE");
    let editor = {
        assert!(editor.destroyed.get());
        let reloaded = h.engine.last_editor().unwrap();
        reloaded.ready().unwrap();
        reloaded
    };
    let dialog = detach(&h, &editor);
    dialog.type_html("<p>x</p>");
    dialog.click_cancel();
    assert_eq!(
        h.confirm.messages.borrow()[0],
        locale::strings("de").cancel_confirm_message()
    );
}

#[test]
fn test_blobs_follow_the_outcome() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "");

    let dialog = detach(&h, &editor);
    dialog.type_html(r#"<p><img src="blob:discarded"></p>"#);
    dialog.click_cancel();
    h.confirm.answer(true);
    assert_eq!(*h.revoker.revoked.borrow(), ["blob:discarded"]);

    let dialog = detach(&h, &editor);
    assert_eq!(h.detached.dialogs.borrow().len(), 1);
    dialog.type_html(r#"<p><img src="blob:kept"></p>"#);
    dialog.click_ok();
    assert_eq!(h.revoker.revoked.borrow().len(), 1);

    tc.control.dispose();
    assert_eq!(
        *h.revoker.revoked.borrow(),
        ["blob:discarded", "blob:kept"]
    );
}

#[test]
fn test_disabling_moves_focus_to_cancel() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "");
    let dialog = detach(&h, &editor);

    assert!(!tc.control.set_enabled(false));
    assert!(!dialog.enabled.get());
    assert_eq!(dialog.cancel_focused.get(), 1);
    assert!(tc.control.focused());
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);

    // Canceling a disabled control reports the blur.
    dialog.click_cancel();
    assert!(!dialog.open.get());
    assert_eq!(tc.events.take(), [ControlEvent::Blur]);
}

#[test]
fn test_hiding_the_control_hides_the_window() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "");
    let dialog = detach(&h, &editor);

    tc.control.set_visible(false);
    assert!(!dialog.open.get());
    assert!(!tc.control.focused());
    tc.control.set_visible(true);
    assert!(dialog.open.get());
    assert_eq!(
        tc.events.take(),
        [ControlEvent::Focus, ControlEvent::Blur, ControlEvent::Focus]
    );
}

#[test]
fn test_window_survives_reload() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "");
    let dialog = detach(&h, &editor);

    tc.control.set_check_spelling(false);
    assert!(editor.destroyed.get());
    assert!(dialog.open.get());
    let (settings, preserve) = dialog.settings.borrow().clone().unwrap();
    assert!(preserve);
    assert!(!settings.spellcheck);

    tc.control.set_locale("da");
    assert_eq!(dialog.locale.borrow().as_deref(), Some("da"));
    assert!(!dialog.disposed.get());
    assert!(tc.control.state().detached_open);
}

#[test]
fn test_dispose_closes_the_window() {
    let h = Harness::new();
    let (tc, editor) = focused_design_control(&h, "");
    let dialog = detach(&h, &editor);

    tc.control.dispose();
    assert!(dialog.disposed.get());
    assert!(!dialog.open.get());
    assert!(tc.control.is_disposed());

    // Late clicks from the disposed window are ignored.
    dialog.click_ok();
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);
}
