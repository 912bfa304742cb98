use super::fakes::Harness;
use crate::engine::EngineEvent;
use crate::platform::Observation;
use crate::sizing::SIZE_RETRY_INTERVAL_MS;
use crate::types::{Resizing, Size};

#[test]
fn test_maximize_toggles_between_heights() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_height(Size::px(100.0));

    assert!(tc.control.set_maximizable(true, None));
    assert!(tc.control.multi_line());
    assert_eq!(tc.dom.data("maximizable").as_deref(), Some("true"));

    assert!(tc.control.set_maximized(true));
    assert_eq!(tc.control.height(), Size::px(200.0));
    assert_eq!(tc.dom.state.borrow().height, Size::px(200.0));
    assert_eq!(tc.dom.data("maximized").as_deref(), Some("true"));

    assert!(!tc.control.set_maximized(false));
    assert_eq!(tc.control.height(), Size::px(100.0));
    assert_eq!(tc.dom.data("maximized"), None);
}

#[test]
fn test_explicit_height_leaves_maximized_state() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_height(Size::px(100.0));
    tc.control.set_maximizable(true, None);
    tc.control.set_maximized(true);

    tc.control.set_height(Size::px(150.0));
    assert!(!tc.control.maximized());
    assert_eq!(tc.control.height(), Size::px(150.0));

    tc.control.set_maximized(true);
    assert_eq!(tc.control.height(), Size::px(300.0));
}

#[test]
fn test_configured_maximized_height() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_height(Size::px(100.0));
    tc.control.set_maximizable(true, Some(400.0));
    tc.control.set_maximizable(true, Some(500.0));

    tc.control.set_maximized(true);
    assert_eq!(tc.control.height(), Size::px(500.0));
}

#[test]
fn test_disabling_maximize_reverts_to_single_line() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_height(Size::px(100.0));
    tc.control.set_maximizable(true, None);
    tc.control.set_maximized(true);

    assert!(!tc.control.set_maximizable(false, None));
    assert!(!tc.control.maximized());
    assert!(!tc.control.multi_line());
    assert!(!tc.dom.state.borrow().multi_line);
    assert_eq!(tc.dom.data("maximizable"), None);
    assert_eq!(tc.dom.data("multiline"), None);
    assert!(tc.control.height().is_unset());
}

#[test]
fn test_explicit_multi_line_survives_maximize_off() {
    let h = Harness::new();
    let tc = h.control("A", "");
    tc.control.set_multi_line(true);
    tc.control.set_maximizable(true, None);
    tc.control.set_maximizable(false, None);
    assert!(tc.control.multi_line());
}

#[test]
fn test_resizable_native_input() {
    let h = Harness::new();
    let tc = h.control("A", "");

    assert_eq!(tc.control.set_resizable(Resizing::Vertical), Resizing::Vertical);
    assert!(tc.control.multi_line());
    assert_eq!(tc.dom.data("resizable").as_deref(), Some("vertical"));

    tc.control.set_resizable(Resizing::Disabled);
    assert_eq!(tc.dom.data("resizable"), None);
    assert!(!tc.control.multi_line());
}

#[test]
fn test_resizable_reloads_editor() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    let options = editor.options.borrow().clone().unwrap();
    assert!(!options.resize_enabled);

    tc.control.set_resizable(Resizing::Enabled);
    assert!(editor.destroyed.get());
    let reloaded = h.engine.last_editor().unwrap();
    let options = reloaded.options.borrow().clone().unwrap();
    assert!(options.resize_enabled);
    assert_eq!(options.resize_dir, "both");
    // Multi line belongs to the native input only.
    assert!(!tc.control.multi_line());
}

#[test]
fn test_editor_follows_explicit_height() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    assert_eq!(tc.dom.data("autogrow").as_deref(), Some("true"));
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::percent(100.0)))
    );

    tc.control.set_height(Size::px(100.0));
    assert_eq!(tc.dom.data("autogrow"), None);
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(100.0)))
    );

    tc.control.set_maximizable(true, None);
    tc.control.set_maximized(true);
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(200.0)))
    );
    // Programmatic resizes are not manual ones.
    assert_eq!(tc.dom.data("resized"), None);
}

#[test]
fn test_auto_grow_editor_cannot_be_maximized() {
    let h = Harness::new();
    let (tc, _editor) = h.design_control("A", "");
    assert!(tc.control.set_maximizable(true, None));
    assert!(!tc.control.set_maximized(true));
    assert!(tc.control.height().is_unset());
}

#[test]
fn test_manual_resize_is_recorded() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");

    editor.emit(EngineEvent::Resize).unwrap();
    assert_eq!(tc.dom.data("resized").as_deref(), Some("true"));

    tc.control.set_width(Size::px(300.0));
    assert_eq!(tc.dom.data("resized"), None);
    assert_eq!(tc.dom.state.borrow().width, Size::px(300.0));
}

#[test]
fn test_percentage_height_is_monitored() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");

    tc.control.set_height(Size::percent(50.0));
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(100.0)))
    );
    let count = editor.resizes.borrow().len();

    h.scheduler.advance(250);
    assert_eq!(editor.resizes.borrow().len(), count);

    tc.dom.state.borrow_mut().offset_height = 180.0;
    h.scheduler.advance(250);
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(180.0)))
    );

    tc.control.set_height(Size::px(120.0));
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(120.0)))
    );
    let count = editor.resizes.borrow().len();
    tc.dom.state.borrow_mut().offset_height = 90.0;
    h.scheduler.advance(1000);
    assert_eq!(editor.resizes.borrow().len(), count);
}

#[test]
fn test_hidden_control_resizes_once_visible() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    let observers = tc.dom.observer_count();
    let count = editor.resizes.borrow().len();

    tc.dom.state.borrow_mut().visible = false;
    tc.control.set_height(Size::px(100.0));
    assert_eq!(editor.resizes.borrow().len(), count);
    assert_eq!(tc.dom.observer_count(), observers + 1);

    // Still hidden: nothing happens.
    tc.dom.fire(Observation::Mutation);
    assert_eq!(editor.resizes.borrow().len(), count);

    tc.dom.state.borrow_mut().visible = true;
    tc.dom.fire(Observation::Mutation);
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(100.0)))
    );
    assert_eq!(tc.dom.observer_count(), observers);
}

#[test]
fn test_hidden_control_polls_without_observers() {
    let h = Harness::new();
    let (tc, editor) = h.design_control("A", "");
    let count = editor.resizes.borrow().len();
    {
        let mut state = tc.dom.state.borrow_mut();
        state.supports_observers = false;
        state.visible = false;
    }

    tc.control.set_height(Size::px(100.0));
    h.scheduler.advance(SIZE_RETRY_INTERVAL_MS.into());
    assert_eq!(editor.resizes.borrow().len(), count);

    tc.dom.state.borrow_mut().visible = true;
    h.scheduler.advance(SIZE_RETRY_INTERVAL_MS.into());
    assert_eq!(
        editor.resizes.borrow().last(),
        Some(&(Size::percent(100.0), Size::px(100.0)))
    );
    assert_eq!(h.scheduler.pending(), 0);
}
