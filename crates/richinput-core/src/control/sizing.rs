//! Applying sizes to the native input and the editor.

use tracing::{debug, error, trace};

use super::{Core, Message, Shared};
use crate::config::ToolbarPosition;
use crate::platform::{DomPart, Observation, StyleProperty};
use crate::sizing::{HEIGHT_MONITOR_INTERVAL_MS, SIZE_RETRY_INTERVAL_MS};
use crate::types::{Resizing, Size};

impl Core {
    pub(super) fn set_width(&mut self, sh: &Shared, width: Size) -> Size {
        self.sizing.set_width(width);
        sh.dom.set_width(width);
        if self.design_mode {
            sh.dom.set_data("resized", None);
            self.update_editor_size(sh);
        }
        self.sizing.width
    }

    /// Apply a height. `suppress_min_max` keeps the maximize state, which
    /// is used when the height changes because of a maximize toggle.
    pub(super) fn apply_height(&mut self, sh: &Shared, height: Size, suppress_min_max: bool) {
        if self.sizing.is_maximizable() && !suppress_min_max {
            self.set_maximized(sh, false);
        }
        self.sizing.resized = false;
        if self.design_mode {
            sh.dom.set_data("resized", None);
            sh.dom.set_data("autogrow", None);
        }
        self.sizing.auto_grow = false;
        if height.is_unset() && self.lifecycle.is_ready() {
            self.sizing.auto_grow = true;
            sh.dom.set_data("autogrow", Some("true"));
        }

        self.sizing.height = height;
        sh.dom.set_height(height);

        if self.lifecycle.is_ready() {
            if self.sizing.needs_monitor() {
                if !self.sizing.is_monitoring() {
                    self.start_height_monitor(sh);
                }
            } else {
                self.stop_height_monitor(sh);
            }
            let restored = self.restore_toolbar(sh, true);
            self.update_editor_size(sh);
            if restored {
                self.hide_toolbar(sh, true);
            }
        }

        if !suppress_min_max {
            self.sizing.height_changed_while_maximizable();
        }
    }

    pub(super) fn set_maximizable(
        &mut self,
        sh: &Shared,
        maximizable: bool,
        maximized_height: Option<f64>,
    ) -> bool {
        if maximizable {
            if !self.multi_line && !self.design_mode {
                self.set_multi_line(sh, true);
                self.auto_multi_line = true;
            }
            if !self.sizing.enable_maximize(maximized_height)
                && let Some(height) = maximized_height
            {
                self.sizing.update_maximize_height(height);
            }
            sh.dom.set_data("maximizable", Some("true"));
        } else if let Some(restore) = self.sizing.disable_maximize() {
            if !restore.is_unset() || !self.design_mode {
                self.apply_height(sh, restore, true);
            }
            sh.dom.set_data("maximizable", None);
            sh.dom.set_data("maximized", None);
            self.revert_single_line(sh);
        }
        self.sizing.is_maximizable()
    }

    pub(super) fn set_maximized(&mut self, sh: &Shared, maximized: bool) -> bool {
        if self.design_mode && self.sizing.height.is_unset() {
            trace!(control = %sh.id, "auto grow editor cannot be maximized");
            return self.sizing.is_maximized();
        }
        if let Some(target) = self.sizing.maximize_target(maximized) {
            self.apply_height(sh, target, true);
            self.sizing.set_maximized_flag(maximized);
            sh.dom.set_data("maximized", maximized.then_some("true"));
        }
        self.sizing.is_maximized()
    }

    pub(super) fn set_resizable(&mut self, sh: &Shared, resizing: Resizing) -> Resizing {
        if resizing == self.sizing.resizing {
            return resizing;
        }
        self.sizing.resizing = resizing;
        if resizing == Resizing::Disabled {
            self.sizing.resized = false;
            sh.dom.set_data("resizable", None);
            sh.dom.reset_input_size();
            self.revert_single_line(sh);
        } else {
            if !self.multi_line && !self.design_mode {
                self.set_multi_line(sh, true);
                self.auto_multi_line = true;
            }
            sh.dom.set_data("resizable", Some(resizing.as_data()));
        }
        if self.design_mode
            && let Err(e) = self.reload(sh, false, None, true)
        {
            error!(control = %sh.id, error = %e, "reload after resize change failed");
        }
        self.sizing.resizing
    }

    /// Fit the editor to the control. Waits for the control to become
    /// visible before measuring.
    pub(super) fn update_editor_size(&mut self, sh: &Shared) {
        if !self.design_mode || self.sizing.is_monitoring() {
            return;
        }
        let Some(editor) = self.lifecycle.editor() else {
            return;
        };

        if !sh.dom.is_visible() {
            if self.sizing.visibility_observer.is_some() || self.sizing.update_timer.is_some() {
                return;
            }
            let weak = sh.weak.clone();
            let observer = sh.dom.observe(
                Observation::Mutation,
                Box::new(move || {
                    if let Some(shared) = weak.upgrade() {
                        shared.post(Message::VisibilityChanged);
                    }
                }),
            );
            match observer {
                Some(observer) => self.sizing.visibility_observer = Some(observer),
                None => {
                    self.sizing.update_timer =
                        Some(sh.schedule(SIZE_RETRY_INTERVAL_MS, Message::UpdateEditorSize));
                }
            }
            trace!(control = %sh.id, "control hidden, editor size update postponed");
            return;
        }

        let height = if self.sizing.height.is_unset() {
            Size::percent(100.0)
        } else {
            self.sizing.height
        };
        let restored = self.restore_toolbar(sh, true);
        sh.with_resize_suppressed(|| editor.resize(Size::percent(100.0), height));
        if restored {
            self.hide_toolbar(sh, true);
        }
    }

    pub(super) fn visibility_changed(&mut self, sh: &Shared) {
        if !sh.dom.is_visible() {
            return;
        }
        if let Some(observer) = self.sizing.visibility_observer.take() {
            sh.dom.unobserve(observer);
        }
        self.update_editor_size(sh);
    }

    pub(super) fn start_height_monitor(&mut self, sh: &Shared) {
        self.stop_height_monitor(sh);
        let generation = self.sizing.start_monitor();
        self.height_monitor_tick(sh, generation);
    }

    pub(super) fn stop_height_monitor(&mut self, sh: &Shared) {
        if let Some(timer) = self.sizing.stop_monitor() {
            sh.ctx.scheduler.cancel(timer);
        }
    }

    /// Percentage heights follow the parent, so the rendered height is
    /// polled and applied to the editor in pixels.
    pub(super) fn height_monitor_tick(&mut self, sh: &Shared, generation: u64) {
        match &self.sizing.monitor {
            Some(monitor) if monitor.generation == generation => {}
            _ => return,
        }
        let toolbar_visible = !self.toolbar_hidden;
        if let Some(editor) = self.lifecycle.editor()
            && let Some(height) =
                self.sizing
                    .monitor_tick(generation, sh.dom.offset_height(), toolbar_visible)
        {
            debug!(control = %sh.id, height, "percentage height changed");
            sh.with_resize_suppressed(|| editor.resize(Size::percent(100.0), Size::px(height)));
        }
        let timer = sh.schedule(
            HEIGHT_MONITOR_INTERVAL_MS,
            Message::HeightMonitorTick { generation },
        );
        if let Some(monitor) = &mut self.sizing.monitor {
            monitor.timer = Some(timer);
        }
    }

    fn toolbar_part(&self) -> DomPart {
        match self.config.as_ref().map(|c| c.toolbar_position()) {
            Some(ToolbarPosition::Bottom) => DomPart::Bottom,
            _ => DomPart::Top,
        }
    }

    /// Hide the toolbar of an inactive editor when configured to.
    /// `suppress` restores a toolbar shown for measuring without going
    /// through the size update.
    pub(super) fn hide_toolbar(&mut self, sh: &Shared, suppress: bool) {
        if self.toolbar_hidden
            || !self
                .config
                .as_ref()
                .is_some_and(|c| c.hide_toolbar_when_inactive())
        {
            return;
        }
        let Some(editor) = self.lifecycle.editor() else {
            return;
        };
        editor.set_style(self.toolbar_part(), StyleProperty::Display, Some("none"));
        sh.dom.set_data("toolbar", Some("false"));
        self.toolbar_hidden = true;
        if !suppress {
            self.update_editor_size(sh);
        }
    }

    /// Show a hidden toolbar again. Returns whether it was hidden.
    pub(super) fn restore_toolbar(&mut self, sh: &Shared, suppress: bool) -> bool {
        if !self.toolbar_hidden {
            return false;
        }
        let Some(editor) = self.lifecycle.editor() else {
            return false;
        };
        editor.set_style(self.toolbar_part(), StyleProperty::Display, None);
        sh.dom.set_data("toolbar", Some("true"));
        self.toolbar_hidden = false;
        if !suppress {
            self.update_editor_size(sh);
        }
        true
    }
}
