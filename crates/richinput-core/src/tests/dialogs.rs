use super::fakes::{FakeEditor, Harness, TestControl};
use crate::engine::EngineResponse;
use crate::platform::{ControlDom, DialogHandle, DomFocus, EditorInstance};
use crate::types::ControlEvent;

fn focus(tc: &TestControl, editor: &FakeEditor) {
    editor.focus();
    tc.control.notify_focus_changed();
}

#[test]
fn test_blur_while_dialog_loads_hides_it_once_shown() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    focus(&tc, &editor);
    assert_eq!(h.open_dialog(&editor), EngineResponse::Proceed);
    assert!(h.dialogs.is_loading(tc.control.id()));

    // Focus sits on the body while the dialog loads; that still counts.
    tc.dom.set_focus(DomFocus::Body);
    tc.control.notify_focus_changed();
    assert!(tc.control.focused());

    assert!(!tc.control.set_focused(false));
    assert!(h.dialogs.is_canceled(tc.control.id()));

    let dialog = h.show_dialog();
    assert_eq!(dialog.hidden.get(), 1);
    assert!(!h.dialogs.is_active());
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);

    h.scheduler.run_pending();
    assert_eq!(tc.events.take(), [ControlEvent::Blur]);
    assert!(!tc.control.state().focus_locked);
}

#[test]
fn test_refocus_before_show_keeps_dialog() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    focus(&tc, &editor);
    h.open_dialog(&editor);

    tc.control.set_focused(false);
    tc.control.set_focused(true);
    let dialog = h.show_dialog();
    assert_eq!(dialog.hidden.get(), 0);
    assert!(h.dialogs.is_shown(tc.control.id()));
    assert!(tc.control.focused());
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);
}

#[test]
fn test_blur_while_dialog_shown_hides_it() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    focus(&tc, &editor);
    h.open_dialog(&editor);
    let dialog = h.show_dialog();

    assert!(!tc.control.set_focused(false));
    assert_eq!(dialog.hidden.get(), 1);
    assert_eq!(tc.events.take(), [ControlEvent::Focus, ControlEvent::Blur]);

    h.scheduler.run_pending();
    assert!(tc.events.take().is_empty());
    assert!(!tc.control.state().focus_locked);
}

#[test]
fn test_dispose_while_dialog_loads() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    focus(&tc, &editor);
    h.open_dialog(&editor);

    tc.control.dispose();
    assert!(!tc.control.is_disposed());
    assert!(tc.dom.state.borrow().removed);
    assert!(!editor.destroyed.get());

    let dialog = h.show_dialog();
    assert_eq!(dialog.hidden.get(), 0);
    h.scheduler.run_pending();

    assert!(tc.control.is_disposed());
    assert!(editor.destroyed.get());
    assert_eq!(dialog.hidden.get(), 1);
    assert!(!h.dialogs.is_active());
    assert_eq!(h.scheduler.pending(), 0);
}

#[test]
fn test_disable_while_dialog_loads_is_postponed() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "<p>a</p>");
    focus(&tc, &editor);
    h.open_dialog(&editor);

    assert_eq!(tc.control.set_design_mode(false, None), Ok(true));
    assert!(!editor.destroyed.get());
    assert!(h.dialogs.disable_postponed(tc.control.id()));

    let dialog = h.show_dialog();
    h.scheduler.run_pending();

    assert!(!tc.control.design_mode());
    assert!(editor.destroyed.get());
    assert_eq!(dialog.hidden.get(), 1);
    assert_eq!(tc.dom.input_value(), "<p>a</p>");
    assert_eq!(tc.dom.current_focus(), DomFocus::Input);
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);
}

#[test]
fn test_enable_withdraws_postponed_disable() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    focus(&tc, &editor);
    h.open_dialog(&editor);

    tc.control.set_design_mode(false, None).unwrap();
    assert_eq!(tc.control.set_design_mode(true, None), Ok(true));
    assert!(!h.dialogs.disable_postponed(tc.control.id()));

    let dialog = h.show_dialog();
    h.scheduler.run_pending();
    assert!(tc.control.design_mode());
    assert_eq!(dialog.hidden.get(), 0);

    // The user closes the dialog.
    dialog.hide();
    h.scheduler.run_pending();
    assert!(tc.control.design_mode());
    assert!(!editor.destroyed.get());
    assert!(!tc.control.state().focus_locked);
}

#[test]
fn test_reload_while_dialog_loads_waits_for_close() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    focus(&tc, &editor);
    h.open_dialog(&editor);

    tc.control.set_locale("de-DE");
    assert_eq!(h.engine.created(), 1);

    let dialog = h.show_dialog();
    h.scheduler.run_pending();
    assert_eq!(h.engine.created(), 1);

    dialog.hide();
    h.scheduler.run_pending();
    assert_eq!(h.engine.created(), 2);
    assert!(editor.destroyed.get());
    let reloaded = h.engine.last_editor().unwrap();
    assert_eq!(reloaded.options.borrow().as_ref().unwrap().language, "de");
}

#[test]
fn test_second_dialog_is_rejected() {
    let h = Harness::new();
    let (a, editor_a) = h.design_control("A", "");
    let (b, editor_b) = h.design_control("B", "");
    focus(&a, &editor_a);
    assert_eq!(h.open_dialog(&editor_a), EngineResponse::Proceed);

    assert_eq!(h.open_dialog(&editor_b), EngineResponse::Cancel);
    assert_eq!(h.dialogs.active_owner(), Some(a.control.id().clone()));
    assert!(!b.control.state().focus_locked);
    assert!(b.events.take().is_empty());
}

#[test]
fn test_opening_dialog_reports_focus() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    h.open_dialog(&editor);
    assert_eq!(tc.events.take(), [ControlEvent::Focus]);
    assert!(tc.control.state().focus_locked);
    assert!(tc.control.focused());
}
