//! The detached editor window.

use std::rc::Weak;

use tracing::{debug, info, warn};

use super::{Core, Message, Shared};
use crate::detached::{DetachedActions, DetachedSession, DetachedSettings};
use crate::focus::FocusHolder;
use crate::locale;
use crate::toolbar::images_enabled;

impl Core {
    pub(super) fn detached_settings(&self, sh: &Shared) -> DetachedSettings {
        let value = self.value(sh);
        let detached_value = self
            .detached
            .as_ref()
            .filter(|s| s.is_active())
            .map(|s| s.value())
            .unwrap_or_default();
        DetachedSettings::derive(
            self.config.as_ref(),
            images_enabled(self.config.as_ref(), &[&value, &detached_value]),
            self.spellcheck,
            locale::strings(&self.locale),
        )
    }

    pub(super) fn open_detached(&mut self, sh: &Shared) {
        if !self.design_mode || !self.lifecycle.is_ready() {
            warn!(control = %sh.id, "detached editor requires a ready design mode editor");
            return;
        }
        if self.detached.as_ref().is_some_and(|s| s.is_active()) {
            return;
        }

        self.lock_focus(FocusHolder::Detached);
        let settings = self.detached_settings(sh);
        let value = self.value(sh);
        let session = self.detached.get_or_insert_with(|| {
            let actions: Weak<dyn DetachedActions> = sh.weak.clone();
            DetachedSession::new(sh.ctx.detached.create(&sh.id, actions))
        });
        session.open(&value, &settings);
        if !self.enabled {
            session.set_enabled(false);
        }
        info!(control = %sh.id, "detached editor opened");
    }

    pub(super) fn commit_detached(&mut self, sh: &Shared) {
        let Some(session) = self.detached.as_mut().filter(|s| s.is_active()) else {
            return;
        };
        let value = session.value();
        session.close();
        self.blobs.adopt(&value);
        self.set_user_value(sh, &value);
        debug!(control = %sh.id, "detached editor committed");
        self.set_focused(sh, true);
        self.unlock_focus(sh, FocusHolder::Detached);
    }

    pub(super) fn cancel_detached(&mut self, sh: &Shared) {
        let Some(session) = self.detached.as_ref().filter(|s| s.is_active()) else {
            return;
        };
        if session.value() == self.value(sh) {
            self.close_canceled(sh);
            return;
        }
        let weak = sh.weak.clone();
        let message = locale::strings(&self.locale).cancel_confirm_message();
        sh.ctx.confirm.confirm(
            &message,
            Box::new(move |discard| {
                if let Some(shared) = weak.upgrade() {
                    shared.post(Message::DetachedConfirmed(discard));
                }
            }),
        );
    }

    pub(super) fn cancel_confirmed(&mut self, sh: &Shared, discard: bool) {
        if discard {
            self.close_canceled(sh);
        } else if let Some(session) = self.detached.as_ref().filter(|s| s.is_active()) {
            session.focus_cancel();
        }
    }

    fn close_canceled(&mut self, sh: &Shared) {
        let primary = self.value(sh);
        let Some(session) = self.detached.as_mut().filter(|s| s.is_active()) else {
            return;
        };
        self.blobs.discard(&session.value(), &primary, &*sh.ctx.blobs);
        session.close();
        debug!(control = %sh.id, "detached editor canceled");

        if self.enabled {
            self.set_focused(sh, true);
            self.unlock_focus(sh, FocusHolder::Detached);
        } else {
            self.unlock_focus(sh, FocusHolder::Detached);
            let signal = self.focus.force(false);
            self.emit_focus(sh, signal);
        }
    }
}
