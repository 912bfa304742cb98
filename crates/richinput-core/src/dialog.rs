//! Ownership of the engine's shared modal dialog subsystem.
//!
//! The engine has one dialog subsystem for the whole page. At most one
//! control owns it at a time; a session starts when an editor command opens
//! a dialog and ends when the dialog reports that it was hidden.
//!
//! Dialogs load asynchronously. Between the command and the dialog being
//! shown the owner may be disposed, switched out of design mode or blurred.
//! Those requests are recorded on the session and carried out once the
//! dialog appears, because the engine fails if the editor is destroyed while
//! one of its dialogs is still loading.
//!
//! Follow-up work for the owner is always scheduled with a zero delay so the
//! engine finishes its own dialog bookkeeping first.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::platform::DialogHandle;
use crate::scheduler::Scheduler;
use crate::types::ControlId;

/// Notification from the engine's dialog subsystem.
#[derive(Clone)]
pub enum DialogEvent {
    Shown(Rc<dyn DialogHandle>),
    Hidden,
}

impl std::fmt::Debug for DialogEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DialogEvent::Shown(_) => f.write_str("Shown(..)"),
            DialogEvent::Hidden => f.write_str("Hidden"),
        }
    }
}

/// The control a dialog session was opened for.
pub trait DialogOwner {
    /// The dialog was hidden and the session ended. `canceled` is set when
    /// the owner asked to blur while the dialog was loading.
    fn dialog_closed(&self, canceled: bool);

    /// The owner was disposed while its dialog loaded; the dialog is now
    /// shown and disposal can proceed.
    fn resume_dispose(&self);

    /// Design mode was turned off while the dialog loaded.
    fn resume_disable_design_mode(&self);
}

/// Outcome of [`DialogSessionManager::try_open`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OpenOutcome {
    Accepted,
    /// Another session is active; the dialog command must be canceled.
    Rejected,
}

/// Outcome of [`DialogSessionManager::request_cancel`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The caller does not own the active session.
    NotOwner,
    /// The dialog was shown and has been hidden.
    Hidden,
    /// The dialog is loading; it is hidden as soon as it appears.
    Deferred,
}

struct DialogSession {
    owner: ControlId,
    link: Weak<dyn DialogOwner>,
    dialog: Option<Rc<dyn DialogHandle>>,
    canceled: bool,
    owner_disposed: bool,
    disable_postponed: bool,
}

impl DialogSession {
    fn is_loading(&self) -> bool {
        self.dialog.is_none()
    }
}

/// Process-wide registry of the active dialog session.
pub struct DialogSessionManager {
    scheduler: Rc<dyn Scheduler>,
    session: RefCell<Option<DialogSession>>,
}

impl DialogSessionManager {
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Rc<Self> {
        Rc::new(Self {
            scheduler,
            session: RefCell::new(None),
        })
    }

    /// Start a session for `owner`. Rejected while any session is active,
    /// including one belonging to `owner` itself.
    pub fn try_open(&self, owner: &ControlId, link: Weak<dyn DialogOwner>) -> OpenOutcome {
        let mut session = self.session.borrow_mut();
        if let Some(active) = &*session {
            debug!(
                control = %owner,
                active = %active.owner,
                "dialog already active, rejecting"
            );
            return OpenOutcome::Rejected;
        }
        trace!(control = %owner, "dialog session opened");
        *session = Some(DialogSession {
            owner: owner.clone(),
            link,
            dialog: None,
            canceled: false,
            owner_disposed: false,
            disable_postponed: false,
        });
        OpenOutcome::Accepted
    }

    pub fn is_active(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn active_owner(&self) -> Option<ControlId> {
        self.session.borrow().as_ref().map(|s| s.owner.clone())
    }

    pub fn owns(&self, owner: &ControlId) -> bool {
        self.with_owned(owner, |_| ()).is_some()
    }

    /// `owner` holds a session whose dialog has not been shown yet.
    pub fn is_loading(&self, owner: &ControlId) -> bool {
        self.with_owned(owner, |s| s.is_loading()).unwrap_or(false)
    }

    /// `owner` holds a session whose dialog is shown.
    pub fn is_shown(&self, owner: &ControlId) -> bool {
        self.with_owned(owner, |s| !s.is_loading()).unwrap_or(false)
    }

    pub fn is_canceled(&self, owner: &ControlId) -> bool {
        self.with_owned(owner, |s| s.canceled).unwrap_or(false)
    }

    pub fn dialog_has_focus(&self, owner: &ControlId) -> bool {
        let dialog = self
            .with_owned(owner, |s| s.dialog.clone())
            .flatten();
        dialog.is_some_and(|d| d.contains_focus())
    }

    /// Ask for the owner's dialog to go away.
    pub fn request_cancel(&self, owner: &ControlId) -> CancelOutcome {
        let dialog = {
            let mut session = self.session.borrow_mut();
            match &mut *session {
                Some(s) if &s.owner == owner => {
                    s.canceled = true;
                    match &s.dialog {
                        Some(dialog) => dialog.clone(),
                        None => {
                            debug!(control = %owner, "dialog loading, cancel deferred");
                            return CancelOutcome::Deferred;
                        }
                    }
                }
                _ => return CancelOutcome::NotOwner,
            }
        };
        dialog.hide();
        CancelOutcome::Hidden
    }

    /// Hide the owner's dialog if it is shown, without marking the session
    /// canceled. Returns whether a dialog was hidden.
    pub fn hide(&self, owner: &ControlId) -> bool {
        let dialog = self.with_owned(owner, |s| s.dialog.clone()).flatten();
        match dialog {
            Some(dialog) => {
                dialog.hide();
                true
            }
            None => false,
        }
    }

    /// Focus returned to the owner while its dialog loads; drop a pending
    /// cancellation.
    pub fn clear_cancel(&self, owner: &ControlId) {
        self.with_owned_mut(owner, |s| s.canceled = false);
    }

    pub fn mark_owner_disposed(&self, owner: &ControlId) {
        self.with_owned_mut(owner, |s| s.owner_disposed = true);
    }

    pub fn postpone_disable(&self, owner: &ControlId) {
        self.with_owned_mut(owner, |s| s.disable_postponed = true);
    }

    /// Withdraw a postponed design mode disable. Returns whether one was
    /// pending.
    pub fn clear_postponed_disable(&self, owner: &ControlId) -> bool {
        self.with_owned_mut(owner, |s| std::mem::take(&mut s.disable_postponed))
            .unwrap_or(false)
    }

    pub fn disable_postponed(&self, owner: &ControlId) -> bool {
        self.with_owned(owner, |s| s.disable_postponed).unwrap_or(false)
    }

    pub fn handle(&self, event: DialogEvent) {
        match event {
            DialogEvent::Shown(dialog) => self.on_shown(dialog),
            DialogEvent::Hidden => self.on_hidden(),
        }
    }

    fn on_shown(&self, dialog: Rc<dyn DialogHandle>) {
        enum Next {
            Hide,
            Nothing,
            ResumeDispose(Weak<dyn DialogOwner>),
            ResumeDisable(Weak<dyn DialogOwner>),
        }

        let next = {
            let mut session = self.session.borrow_mut();
            match &mut *session {
                None => Next::Nothing,
                Some(s) => {
                    s.dialog = Some(dialog.clone());
                    if s.canceled {
                        Next::Hide
                    } else if s.owner_disposed {
                        Next::ResumeDispose(s.link.clone())
                    } else if s.disable_postponed {
                        Next::ResumeDisable(s.link.clone())
                    } else {
                        Next::Nothing
                    }
                }
            }
        };

        match next {
            Next::Hide => {
                trace!("dialog shown after cancel, hiding");
                dialog.hide();
            }
            Next::Nothing => {}
            Next::ResumeDispose(link) => {
                self.scheduler.schedule(
                    0,
                    Box::new(move || {
                        if let Some(owner) = link.upgrade() {
                            owner.resume_dispose();
                        }
                    }),
                );
            }
            Next::ResumeDisable(link) => {
                self.scheduler.schedule(
                    0,
                    Box::new(move || {
                        if let Some(owner) = link.upgrade() {
                            owner.resume_disable_design_mode();
                        }
                    }),
                );
            }
        }
    }

    fn on_hidden(&self) {
        let Some(session) = self.session.borrow_mut().take() else {
            return;
        };
        trace!(control = %session.owner, canceled = session.canceled, "dialog session closed");
        let (link, canceled) = (session.link, session.canceled);
        self.scheduler.schedule(
            0,
            Box::new(move || {
                if let Some(owner) = link.upgrade() {
                    owner.dialog_closed(canceled);
                }
            }),
        );
    }

    fn with_owned<R>(&self, owner: &ControlId, f: impl FnOnce(&DialogSession) -> R) -> Option<R> {
        match &*self.session.borrow() {
            Some(s) if &s.owner == owner => Some(f(s)),
            _ => None,
        }
    }

    fn with_owned_mut<R>(
        &self,
        owner: &ControlId,
        f: impl FnOnce(&mut DialogSession) -> R,
    ) -> Option<R> {
        match &mut *self.session.borrow_mut() {
            Some(s) if &s.owner == owner => Some(f(s)),
            _ => None,
        }
    }
}
