//! Logical focus, the focus lock, toolbar panels and context menus.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use super::{ActivePanel, Core, Message, Shared};
use crate::dialog::CancelOutcome;
use crate::focus::{self, FocusHolder, FocusProbe, FocusRoute, FocusSignal};
use crate::platform::{DomFocus, ToolbarPanel};

/// Interval of the poll that detects a toolbar panel closing.
pub(super) const PANEL_POLL_INTERVAL_MS: u32 = 250;

impl Core {
    pub(super) fn is_focused(&self, sh: &Shared) -> bool {
        let dialogs = &sh.ctx.dialogs;
        let dom_focus = sh.dom.focus();
        let probe = FocusProbe {
            detached_open: self.detached.as_ref().is_some_and(|s| s.is_active()),
            visible: self.visible,
            design_mode: self.design_mode,
            dialog_owned: dialogs.owns(&sh.id) && !dialogs.is_canceled(&sh.id),
            dialog_loading: dialogs.is_loading(&sh.id),
            dialog_has_focus: dialogs.dialog_has_focus(&sh.id),
            focus_on_body: dom_focus == DomFocus::Body,
            panel_has_focus: self.panel_has_focus(sh),
            dom_within_root: dom_focus.within_root(),
            input_focused: dom_focus == DomFocus::Input,
        };
        focus::is_focused(&probe)
    }

    fn panel_has_focus(&self, sh: &Shared) -> bool {
        self.panel.as_ref().is_some_and(|p| {
            p.panel.is_open()
                && p.panel.owner().as_ref() == Some(&sh.id)
                && p.panel.contains_focus()
        })
    }

    fn focus_route(&self) -> FocusRoute {
        if self.detached.as_ref().is_some_and(|s| s.is_active()) {
            FocusRoute::Detached
        } else if !self.design_mode {
            FocusRoute::Input
        } else if self.lifecycle.is_ready() {
            FocusRoute::Editor
        } else {
            FocusRoute::Container
        }
    }

    pub(super) fn set_focused(&mut self, sh: &Shared, focused: bool) -> bool {
        let route = self.focus_route();
        if route == FocusRoute::Detached {
            if focused {
                if let Some(session) = &self.detached {
                    session.focus(self.enabled);
                }
            } else {
                warn!(
                    control = %sh.id,
                    "focus cannot be removed while the detached editor is open"
                );
            }
            return self.visible;
        }

        if focused {
            sh.ctx.dialogs.clear_cancel(&sh.id);
            match route {
                FocusRoute::Editor => {
                    if let Some(editor) = self.lifecycle.editor() {
                        editor.focus();
                    }
                }
                FocusRoute::Container => sh.dom.focus_container(),
                FocusRoute::Input => sh.dom.focus_input(),
                FocusRoute::Detached => {}
            }
        } else if self.design_mode {
            let dialogs = &sh.ctx.dialogs;
            if dialogs.owns(&sh.id) {
                if dialogs.is_shown(&sh.id) {
                    dialogs.hide(&sh.id);
                    sh.dom.blur();
                    let signal = self.focus.force(false);
                    self.emit_focus(sh, signal);
                } else if dialogs.request_cancel(&sh.id) == CancelOutcome::Deferred {
                    debug!(control = %sh.id, "dialog loading, it is hidden once shown");
                    sh.dom.blur();
                }
            } else {
                self.close_panel(sh);
                if sh.dom.focus().within_root() {
                    sh.dom.blur();
                }
            }
        } else {
            sh.dom.blur();
        }

        self.sync_focus(sh);
        self.is_focused(sh)
    }

    /// Reconcile the reported focus state with native focus. Suppressed
    /// while the focus lock is held.
    pub(super) fn sync_focus(&mut self, sh: &Shared) {
        let now = self.is_focused(sh);
        let signal = self.focus.native_change(now);
        self.emit_focus(sh, signal);
    }

    pub(super) fn lock_focus(&mut self, holder: FocusHolder) {
        self.focus.lock(holder);
    }

    pub(super) fn unlock_focus(&mut self, sh: &Shared, holder: FocusHolder) {
        let now = self.is_focused(sh);
        let signal = self.focus.unlock(holder, now);
        self.emit_focus(sh, signal);
    }

    /// Apply the side effects of a reported focus transition and publish it.
    pub(super) fn emit_focus(&mut self, sh: &Shared, signal: Option<FocusSignal>) {
        let Some(signal) = signal else {
            return;
        };
        trace!(control = %sh.id, signal = ?signal, "focus transition");
        match signal {
            FocusSignal::Focus => {
                self.restore_toolbar(sh, false);
            }
            FocusSignal::Blur => {
                self.hide_toolbar(sh, false);
                self.change_timer.cancel(&*sh.ctx.scheduler);
                self.fire_on_change(sh);
                if let Some(editor) = self.lifecycle.editor() {
                    self.buttons.restore(&*editor);
                }
                self.suppress_paste = false;
                self.update_placeholder(sh);
            }
        }
        sh.emit(signal.event());
    }

    pub(super) fn on_panel_opened(&mut self, sh: &Shared, panel: Rc<dyn ToolbarPanel>) {
        self.release_panel(sh);
        panel.claim(&sh.id);
        let signal = self.focus.force(true);
        self.emit_focus(sh, signal);
        self.lock_focus(FocusHolder::Panel);
        let timer = sh.schedule(PANEL_POLL_INTERVAL_MS, Message::PanelPoll);
        self.panel = Some(ActivePanel {
            panel,
            timer: Some(timer),
        });
        debug!(control = %sh.id, "toolbar panel opened");
    }

    pub(super) fn panel_poll(&mut self, sh: &Shared) {
        let Some(active) = &mut self.panel else {
            return;
        };
        active.timer = None;
        let keep = active.panel.is_open()
            && active.panel.owner().as_ref() == Some(&sh.id)
            && self.lifecycle.is_ready();
        if keep {
            let timer = sh.schedule(PANEL_POLL_INTERVAL_MS, Message::PanelPoll);
            if let Some(active) = &mut self.panel {
                active.timer = Some(timer);
            }
        } else {
            self.release_panel(sh);
        }
    }

    /// Close a panel opened from this control, moving focus back to the
    /// editor if the panel held it.
    pub(super) fn close_panel(&mut self, sh: &Shared) {
        if self.panel_has_focus(sh)
            && let Some(editor) = self.lifecycle.editor()
        {
            editor.focus();
        }
        self.release_panel(sh);
    }

    fn release_panel(&mut self, sh: &Shared) {
        let Some(active) = self.panel.take() else {
            return;
        };
        if let Some(timer) = active.timer {
            sh.ctx.scheduler.cancel(timer);
        }
        debug!(control = %sh.id, "toolbar panel released");
        self.unlock_focus(sh, FocusHolder::Panel);
    }

    pub(super) fn on_menu_show(&mut self) {
        self.menu_open = true;
        self.lock_focus(FocusHolder::Menu);
    }

    pub(super) fn on_menu_hide(&mut self, sh: &Shared, menu_focused: bool) {
        if !std::mem::take(&mut self.menu_open) {
            return;
        }
        if menu_focused || sh.dom.focus() == DomFocus::Body {
            self.set_focused(sh, true);
        } else {
            let signal = self.focus.force(false);
            self.emit_focus(sh, signal);
        }
        self.unlock_focus(sh, FocusHolder::Menu);
    }
}
