//! Logical focus of a control.
//!
//! Native focus moves around while the user works in toolbar panels, context
//! menus, modal dialogs and the detached editor, all of which live outside
//! the control's root element. The coordinator keeps application code from
//! seeing those moves: while any of them holds the lock, native focus
//! changes are ignored, and the last release compares the state last
//! reported with the state at that time.

use tracing::trace;

use crate::types::ControlEvent;

/// A focus transition to report to application code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusSignal {
    Focus,
    Blur,
}

impl FocusSignal {
    pub fn from_state(focused: bool) -> Self {
        if focused { FocusSignal::Focus } else { FocusSignal::Blur }
    }

    pub fn event(self) -> ControlEvent {
        match self {
            FocusSignal::Focus => ControlEvent::Focus,
            FocusSignal::Blur => ControlEvent::Blur,
        }
    }
}

/// Where a focus request is delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusRoute {
    /// The detached editor is open and takes focus requests.
    Detached,
    /// The ready editor surface.
    Editor,
    /// Design mode without a ready editor: the root element holds focus
    /// until the editor can take it.
    Container,
    /// The native input.
    Input,
}

/// Inputs for deciding whether a control logically has focus.
#[derive(Clone, Copy, Debug, Default)]
pub struct FocusProbe {
    pub detached_open: bool,
    pub visible: bool,
    pub design_mode: bool,
    /// The control owns the dialog session and did not ask to cancel it.
    pub dialog_owned: bool,
    pub dialog_loading: bool,
    pub dialog_has_focus: bool,
    pub focus_on_body: bool,
    /// A toolbar panel opened by this control holds focus.
    pub panel_has_focus: bool,
    pub dom_within_root: bool,
    pub input_focused: bool,
}

/// Whether a control logically has focus.
///
/// While the control's dialog is transitioning focus may sit on `<body>`;
/// that still counts as focused.
pub fn is_focused(probe: &FocusProbe) -> bool {
    if probe.detached_open {
        return probe.visible;
    }
    if probe.design_mode {
        if probe.dialog_owned
            && (probe.dialog_loading || probe.dialog_has_focus || probe.focus_on_body)
        {
            return true;
        }
        return probe.panel_has_focus || probe.dom_within_root;
    }
    probe.input_focused
}

/// What holds the focus lock. Holders lock and release independently; the
/// lock is held while any of them holds it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FocusHolder {
    Dialog,
    Detached,
    Panel,
    Menu,
}

impl FocusHolder {
    fn bit(self) -> u8 {
        1 << self as u8
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FocusCoordinator {
    reported: bool,
    holders: u8,
}

impl FocusCoordinator {
    /// State last reported to application code.
    pub fn reported(&self) -> bool {
        self.reported
    }

    pub fn is_locked(&self) -> bool {
        self.holders != 0
    }

    /// Start ignoring native focus changes on behalf of `holder`.
    /// Idempotent per holder.
    pub fn lock(&mut self, holder: FocusHolder) {
        if self.holders & holder.bit() == 0 {
            trace!(reported = self.reported, holder = ?holder, "focus locked");
        }
        self.holders |= holder.bit();
    }

    /// Release `holder`'s lock. Once no holder remains, reconcile with `now`.
    pub fn unlock(&mut self, holder: FocusHolder, now: bool) -> Option<FocusSignal> {
        if self.holders & holder.bit() == 0 {
            return None;
        }
        self.holders &= !holder.bit();
        if self.is_locked() {
            trace!(holder = ?holder, "focus lock still held");
            return None;
        }
        trace!(reported = self.reported, now, "focus unlocked");
        self.reconcile(now)
    }

    /// A native focus change. Suppressed while locked.
    pub fn native_change(&mut self, now: bool) -> Option<FocusSignal> {
        if self.is_locked() {
            return None;
        }
        self.reconcile(now)
    }

    /// Report a transition regardless of the lock. Used where the control
    /// knows focus left even though native events will never say so.
    pub fn force(&mut self, focused: bool) -> Option<FocusSignal> {
        self.reconcile(focused)
    }

    /// Forget all state, e.g. on disposal.
    pub fn abandon(&mut self) {
        *self = FocusCoordinator::default();
    }

    fn reconcile(&mut self, now: bool) -> Option<FocusSignal> {
        if now == self.reported {
            return None;
        }
        self.reported = now;
        Some(FocusSignal::from_state(now))
    }
}
