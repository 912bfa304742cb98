//! Value handling and editor notifications.

use std::rc::Weak;

use tracing::{debug, trace};

use super::{Core, Message, Shared};
use crate::dialog::{DialogOwner, OpenOutcome};
use crate::engine::{EngineEvent, EngineResponse};
use crate::error::InputError;
use crate::focus::FocusHolder;
use crate::platform::{DomPart, StyleProperty};
use crate::toolbar::DETACH_COMMAND;
use crate::types::ControlEvent;
use crate::value::normalize_editor_html;

impl Core {
    pub(super) fn on_engine_event(
        &mut self,
        sh: &Shared,
        generation: u64,
        event: EngineEvent,
    ) -> Result<EngineResponse, InputError> {
        if !self.lifecycle.is_current(generation) {
            trace!(control = %sh.id, generation, event = ?event, "event from stale editor ignored");
            return Ok(EngineResponse::Proceed);
        }
        if !self.lifecycle.is_ready() && !matches!(event, EngineEvent::InstanceReady) {
            return Ok(EngineResponse::Proceed);
        }

        match event {
            EngineEvent::InstanceReady => self.on_instance_ready(sh, generation)?,
            EngineEvent::Change => self.on_editor_change(sh),
            EngineEvent::Resize => self.on_editor_resize(sh),
            EngineEvent::SelectionChange { in_tag } => self.on_selection_change(sh, in_tag),
            EngineEvent::BeforeCommand {
                name,
                opens_dialog,
                in_tag,
            } => return Ok(self.on_before_command(sh, &name, opens_dialog, in_tag)),
            EngineEvent::CustomCommand(command) => {
                if command == DETACH_COMMAND {
                    self.open_detached(sh);
                }
            }
            EngineEvent::Paste { blob_urls } => {
                for url in blob_urls {
                    self.blobs.track(url);
                }
                if self.suppress_paste {
                    debug!(control = %sh.id, "paste inside tag undone");
                    sh.schedule(0, Message::UndoPaste { generation });
                }
            }
            EngineEvent::ImageAdded { url, blob } => {
                if blob {
                    self.blobs.track(url);
                }
            }
            EngineEvent::MenuShow => self.on_menu_show(),
            EngineEvent::MenuHide { menu_focused } => self.on_menu_hide(sh, menu_focused),
            EngineEvent::ToolbarPanelOpened(panel) => self.on_panel_opened(sh, panel),
        }
        Ok(EngineResponse::Proceed)
    }

    fn on_editor_change(&mut self, sh: &Shared) {
        if !self.values.is_editor_dirty() && self.focus.reported() {
            self.values.mark_edited();
        }
        self.update_placeholder(sh);
        self.input_changed(sh);
    }

    fn on_editor_resize(&mut self, sh: &Shared) {
        let Some(editor) = self.lifecycle.editor() else {
            return;
        };
        editor.set_style(DomPart::Editable, StyleProperty::Height, None);
        let prevent = self
            .config
            .as_ref()
            .is_some_and(|c| c.prevent_resize_beyond_maximum());
        if self.sizing.auto_grow && !prevent {
            editor.set_style(DomPart::Editable, StyleProperty::MinHeight, None);
            editor.set_style(DomPart::Editable, StyleProperty::MaxHeight, None);
        }
        self.sizing.resized = true;
        sh.dom.set_data("resized", Some("true"));
    }

    fn on_selection_change(&mut self, sh: &Shared, in_tag: bool) {
        if in_tag {
            self.suppress_paste = true;
            let generation = self.lifecycle.ready().map(|r| r.generation).unwrap_or(0);
            sh.schedule(0, Message::DisableButtons { generation });
        } else {
            self.suppress_paste = false;
            if let Some(editor) = self.lifecycle.editor() {
                self.buttons.restore(&*editor);
            }
        }
    }

    fn on_before_command(
        &mut self,
        sh: &Shared,
        name: &str,
        opens_dialog: bool,
        in_tag: bool,
    ) -> EngineResponse {
        if in_tag && name != "undo" {
            trace!(control = %sh.id, command = name, "command inside tag canceled");
            return EngineResponse::Cancel;
        }
        if !opens_dialog {
            return EngineResponse::Proceed;
        }

        let dialogs = &sh.ctx.dialogs;
        if dialogs.is_active() {
            debug!(control = %sh.id, command = name, "another dialog is active, command canceled");
            return EngineResponse::Cancel;
        }
        if !self.focus.reported() {
            self.set_focused(sh, true);
        }
        self.lock_focus(FocusHolder::Dialog);
        let owner: Weak<dyn DialogOwner> = sh.weak.clone();
        match dialogs.try_open(&sh.id, owner) {
            OpenOutcome::Accepted => {
                debug!(control = %sh.id, command = name, "dialog session opened");
                EngineResponse::Proceed
            }
            OpenOutcome::Rejected => {
                self.unlock_focus(sh, FocusHolder::Dialog);
                EngineResponse::Cancel
            }
        }
    }

    /// The current value: the editor's in design mode, the native input's
    /// otherwise.
    pub(super) fn value(&self, sh: &Shared) -> String {
        if self.design_mode
            && let Some(editor) = self.lifecycle.editor()
        {
            if self.values.is_editor_dirty() {
                normalize_editor_html(&editor.data())
            } else {
                self.values.assigned().to_string()
            }
        } else {
            sh.dom.input_value()
        }
    }

    pub(super) fn set_value(&mut self, sh: &Shared, value: &str, preserve_dirty: bool) -> String {
        let changed = self.value(sh) != value;
        self.values.assign(value, preserve_dirty);

        match self.lifecycle.editor() {
            Some(editor) if self.design_mode => {
                sh.with_change_suppressed(|| editor.set_data(value));
                self.update_placeholder(sh);
                self.update_editor_size(sh);
            }
            _ => sh.dom.set_input_value(value),
        }

        if let Some(config) = &self.config {
            if config.revoke_unreferenced_on_value_set() {
                self.blobs.prune_unreferenced(value, &*sh.ctx.blobs);
            }
            if config.revoke_external_blobs() {
                self.blobs.track_referenced(value);
            }
        }

        if changed {
            self.change_timer.cancel(&*sh.ctx.scheduler);
            sh.emit(ControlEvent::Change);
        }
        value.to_string()
    }

    pub(super) fn set_user_value(&mut self, sh: &Shared, value: &str) -> String {
        self.values.mark_user_value();
        self.set_value(sh, value, true)
    }

    pub(super) fn is_dirty(&self, sh: &Shared) -> bool {
        let current = if self.design_mode {
            String::new()
        } else {
            sh.dom.input_value()
        };
        self.values.is_dirty(self.design_mode, &current)
    }

    /// The value changed through user input. Notifies now or once typing
    /// pauses.
    pub(super) fn input_changed(&mut self, sh: &Shared) {
        match self.change_debounce_ms {
            Some(delay) if delay > 0 => {
                let task = sh.task(Message::FlushChange);
                self.change_timer.arm(&*sh.ctx.scheduler, delay, task);
            }
            _ => self.fire_on_change(sh),
        }
    }

    /// Publish a change if the value differs from the last one published.
    pub(super) fn fire_on_change(&mut self, sh: &Shared) {
        let current = self.value(sh);
        if self.values.take_change(&current) {
            sh.emit(ControlEvent::Change);
        }
    }

    pub(super) fn set_change_debounce(&mut self, sh: &Shared, delay_ms: Option<u32>) -> Option<u32> {
        if delay_ms != self.change_debounce_ms {
            self.change_debounce_ms = delay_ms;
            if self.change_timer.cancel(&*sh.ctx.scheduler) {
                self.fire_on_change(sh);
            }
        }
        self.change_debounce_ms
    }
}
