//! Design mode: creating, reloading and destroying the editor instance.

use std::rc::{Rc, Weak};

use tracing::{debug, error, info, warn};

use super::{Core, Message, Shared};
use crate::config::{EditorConfig, ToolbarPosition, language_for_locale};
use crate::engine::{Engine, EngineEventSink, EngineEvents, EngineOptions, MentionOptions};
use crate::error::InputError;
use crate::focus::{FocusHolder, FocusSignal};
use crate::lifecycle::{AttachWait, LifecyclePhase, Pending, ReadyOutcome};
use crate::locale;
use crate::platform::{DomPart, EditorInstance, Observation, StyleProperty};
use crate::tags::TagFeed;
use crate::toolbar::{ToolbarLayout, images_enabled};
use crate::types::{Resizing, Size};

/// Poll interval while waiting for the root element to be attached on
/// platforms without an attach observer.
pub(super) const ATTACH_POLL_INTERVAL_MS: u32 = 100;

/// Editor parts that must exist once the instance reports ready.
const REQUIRED_PARTS: [DomPart; 3] = [DomPart::Inner, DomPart::Content, DomPart::Editable];

fn verify_editor_dom(editor: &dyn EditorInstance) -> Result<(), InputError> {
    if let Some(part) = REQUIRED_PARTS.iter().find(|p| !editor.has_part(**p)) {
        return Err(InputError::MissingEditorElement(*part));
    }
    if !editor.has_part(DomPart::Top) && !editor.has_part(DomPart::Bottom) {
        return Err(InputError::MissingEditorElement(DomPart::Top));
    }
    Ok(())
}

impl Core {
    pub(super) fn set_design_mode(
        &mut self,
        sh: &Shared,
        enabled: bool,
        config: Option<EditorConfig>,
    ) -> Result<bool, InputError> {
        if self.lifecycle.is_destroyed() {
            return Err(InputError::Disposed);
        }
        if let Some(config) = &config {
            config.validate()?;
        }

        // A reload waiting for the editor already carries the newest config.
        let effective = match self.lifecycle.pending() {
            Some(Pending::Reload(Some(pending))) => Some(pending),
            _ => self.config.as_ref(),
        };
        let config_changed = config.as_ref().is_some_and(|c| Some(c) != effective);

        if enabled && self.design_mode && self.disable_postponed {
            self.disable_postponed = false;
            sh.ctx.dialogs.clear_postponed_disable(&sh.id);
            debug!(control = %sh.id, "postponed design mode disable withdrawn");
            if !config_changed {
                return Ok(true);
            }
        }

        if enabled && self.design_mode && config_changed {
            self.reload(sh, false, config, true)?;
        } else if enabled && !self.design_mode {
            self.enable_design_mode(sh, config);
        } else if !enabled && self.design_mode {
            self.disable_design_mode(sh);
        }
        Ok(self.design_mode)
    }

    fn enable_design_mode(&mut self, sh: &Shared, config: Option<EditorConfig>) {
        let was_focused = self.is_focused(sh);
        if let Some(config) = config {
            self.config = Some(config);
        }
        let config = self.config.clone().unwrap_or_default();

        if config.revoke_external_blobs() {
            let value = sh.dom.input_value();
            self.blobs.track_referenced(&value);
        }
        if !self.multi_line {
            self.set_multi_line(sh, true);
            self.auto_multi_line = true;
        }

        self.design_mode = true;
        let position = match config.toolbar_position() {
            ToolbarPosition::Top => "top",
            ToolbarPosition::Bottom => "bottom",
        };
        sh.dom.set_data("designmode", Some("true"));
        sh.dom.set_data(
            "toolbar",
            Some(if config.hide_toolbar_when_inactive() { "false" } else { "true" }),
        );
        sh.dom.set_data("toolbar-position", Some(position));
        sh.dom
            .set_data("toolbar-sticky", Some(if config.toolbar_sticky() { "true" } else { "false" }));
        sh.dom.set_tab_index(self.enabled.then_some(-1));
        if was_focused {
            sh.dom.focus_container();
        }

        if self.sizing.resizing != Resizing::Disabled {
            self.sizing.resized = false;
            sh.dom.reset_input_size();
        }
        let auto_grow = self.sizing.height.is_unset() || config.auto_grow_enabled();
        if auto_grow && self.sizing.is_maximizable() {
            self.set_maximized(sh, false);
        }

        info!(control = %sh.id, "design mode enabled");
        self.request_create(sh);
    }

    /// Returns false if the request could not be carried out now.
    pub(super) fn disable_design_mode(&mut self, sh: &Shared) -> bool {
        match self.lifecycle.phase() {
            LifecyclePhase::Loading | LifecyclePhase::Creating => {
                error!(
                    control = %sh.id,
                    "design mode cannot be disabled while the editor is initializing"
                );
                return false;
            }
            LifecyclePhase::AwaitingAttach => {
                if let Some(wait) = self.lifecycle.cancel_attach_wait() {
                    self.release_attach_wait(sh, wait);
                }
            }
            _ => {}
        }

        let was_focused = self.is_focused(sh);
        if was_focused {
            sh.dom.focus_container();
        }

        let dialogs = &sh.ctx.dialogs;
        if dialogs.owns(&sh.id) {
            if dialogs.is_loading(&sh.id) {
                dialogs.postpone_disable(&sh.id);
                self.disable_postponed = true;
                debug!(control = %sh.id, "dialog loading, design mode disable postponed");
                return false;
            }
            dialogs.hide(&sh.id);
        }

        self.close_panel(sh);
        self.destroy_editor(sh, true);

        self.design_mode = false;
        self.disable_postponed = false;
        self.sizing.resized = false;
        self.sizing.auto_grow = false;
        for name in [
            "designmode",
            "toolbar",
            "toolbar-position",
            "toolbar-sticky",
            "autogrow",
            "resized",
        ] {
            sh.dom.set_data(name, None);
        }
        self.revert_single_line(sh);
        if was_focused {
            sh.dom.focus_input();
        }
        sh.dom.set_tab_index(None);
        info!(control = %sh.id, "design mode disabled");
        true
    }

    pub(super) fn resume_disable_design_mode(&mut self, sh: &Shared) {
        sh.ctx.dialogs.clear_postponed_disable(&sh.id);
        if std::mem::take(&mut self.disable_postponed) && self.design_mode {
            debug!(control = %sh.id, "resuming postponed design mode disable");
            self.disable_design_mode(sh);
        }
    }

    fn request_create(&mut self, sh: &Shared) {
        let weak: Weak<Shared> = sh.weak.clone();
        let engine = sh.ctx.engine.acquire(Box::new(move |engine| {
            if let Some(shared) = weak.upgrade() {
                shared.post(Message::EngineLoaded(engine));
            }
        }));
        self.lifecycle.begin_load();
        if let Some(engine) = engine {
            self.lifecycle.engine_available(engine);
            self.attach_or_wait(sh);
        } else {
            debug!(control = %sh.id, "waiting for editor engine");
        }
    }

    pub(super) fn on_engine_loaded(
        &mut self,
        sh: &Shared,
        engine: Rc<dyn Engine>,
    ) -> Result<(), InputError> {
        if self.lifecycle.engine_available(engine) {
            self.attach_or_wait(sh);
        }
        Ok(())
    }

    fn attach_or_wait(&mut self, sh: &Shared) {
        if sh.dom.is_attached() {
            self.create_editor(sh);
            return;
        }
        let timer = sh.schedule(0, Message::AttachCheck);
        let previous = self.lifecycle.set_attach_wait(AttachWait {
            observer: None,
            timer: Some(timer),
        });
        self.release_attach_wait(sh, previous);
    }

    pub(super) fn attach_check(&mut self, sh: &Shared) -> Result<(), InputError> {
        if self.lifecycle.phase() != LifecyclePhase::AwaitingAttach {
            return Ok(());
        }
        if !self.design_mode {
            if let Some(wait) = self.lifecycle.cancel_attach_wait() {
                self.release_attach_wait(sh, wait);
            }
            return Ok(());
        }
        if sh.dom.is_attached() {
            self.create_editor(sh);
            return Ok(());
        }

        let weak = sh.weak.clone();
        let observer = sh.dom.observe(
            Observation::Attached,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.post(Message::AttachCheck);
                }
            }),
        );
        let wait = match observer {
            Some(observer) => AttachWait {
                observer: Some(observer),
                timer: None,
            },
            None => AttachWait {
                observer: None,
                timer: Some(sh.schedule(ATTACH_POLL_INTERVAL_MS, Message::AttachCheck)),
            },
        };
        debug!(control = %sh.id, "root element not attached, waiting");
        let previous = self.lifecycle.set_attach_wait(wait);
        self.release_attach_wait(sh, previous);
        Ok(())
    }

    fn release_attach_wait(&self, sh: &Shared, wait: AttachWait) {
        if let Some(observer) = wait.observer {
            sh.dom.unobserve(observer);
        }
        if let Some(timer) = wait.timer {
            sh.ctx.scheduler.cancel(timer);
        }
    }

    fn engine_options(&self, seeded: &str) -> EngineOptions {
        let config = self.config.as_ref();
        let strings = locale::strings(&self.locale);
        let images = images_enabled(config, &[seeded]);
        let mentions = config
            .and_then(|c| c.tags.as_ref())
            .map(|tags| {
                tags.triggers
                    .iter()
                    .map(|t| MentionOptions {
                        marker: t.marker.clone(),
                        minimum_characters: t.minimum_characters.unwrap_or(0),
                        pattern: t.pattern.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        EngineOptions {
            language: language_for_locale(&self.locale),
            spellcheck: self.spellcheck,
            read_only: !self.enabled,
            height: self.sizing.height,
            startup_focus: self.focus.reported(),
            initial_value: seeded.to_string(),
            layout: ToolbarLayout::derive(config, images, strings.detach),
            toolbar_position: config.map(|c| c.toolbar_position()).unwrap_or_default(),
            resize_enabled: self.sizing.resizing != Resizing::Disabled,
            resize_dir: self.sizing.resizing.engine_direction(),
            image_storage: config.map(|c| c.embed_type()).unwrap_or_default(),
            mentions,
        }
    }

    fn create_editor(&mut self, sh: &Shared) {
        let Some(engine) = self.lifecycle.awaiting_engine() else {
            return;
        };
        let generation = self.lifecycle.next_generation();
        let seeded = sh.dom.input_value();
        let options = self.engine_options(&seeded);

        let feed = self
            .config
            .as_ref()
            .and_then(|c| c.tags.clone())
            .map(|tags| {
                TagFeed::new(
                    sh.id.clone(),
                    tags,
                    sh.ctx.tags.clone(),
                    sh.ctx.scheduler.clone(),
                )
            });
        if let Some((_, old)) = sh.tag_feed.replace(feed.map(|f| (generation, f))) {
            old.close();
        }

        debug!(control = %sh.id, generation, "creating editor instance");
        let sink: Weak<dyn EngineEventSink> = sh.weak.clone();
        let editor = engine.create(
            &sh.id.editor_element_id(),
            options,
            EngineEvents::new(sink, generation),
        );
        let wait = self.lifecycle.begin_create(editor, generation, seeded);
        self.release_attach_wait(sh, wait);
    }

    pub(super) fn on_instance_ready(
        &mut self,
        sh: &Shared,
        generation: u64,
    ) -> Result<(), InputError> {
        let Some((editor, seeded)) = self
            .lifecycle
            .creating(generation)
            .map(|(editor, seeded)| (editor, seeded.to_string()))
        else {
            if self.lifecycle.ready().is_some_and(|r| r.generation == generation) {
                return Err(InputError::UnexpectedCallback(
                    "editor reported ready twice".into(),
                ));
            }
            return Ok(());
        };
        verify_editor_dom(&*editor)?;

        match self.lifecycle.complete(generation) {
            ReadyOutcome::Stale => return Ok(()),
            ReadyOutcome::Dispose => {
                warn!(
                    control = %sh.id,
                    "control was disposed while the editor initialized, disposing now"
                );
                self.dispose_now(sh);
                return Ok(());
            }
            ReadyOutcome::Reload(config) => {
                debug!(control = %sh.id, "reload requested while initializing, reloading now");
                return self.reload(sh, true, config, true);
            }
            ReadyOutcome::Ready => {}
        }
        info!(control = %sh.id, generation, "editor ready");

        let current = sh.dom.input_value();
        if current != seeded {
            sh.with_change_suppressed(|| editor.set_data(&current));
        }
        self.update_placeholder(sh);
        editor.set_read_only(!self.enabled);
        editor.set_tabbable(self.enabled);

        let config = self.config.clone().unwrap_or_default();
        if config.auto_grow_enabled() && !self.sizing.height.is_unset() {
            self.apply_height(sh, Size::UNSET, false);
        }
        if self.sizing.height.is_unset() {
            self.sizing.auto_grow = true;
            sh.dom.set_data("autogrow", Some("true"));
        }
        if let Some(auto_grow) = &config.auto_grow {
            if let Some(min) = auto_grow.minimum_height {
                editor.set_style(
                    DomPart::Editable,
                    StyleProperty::MinHeight,
                    Some(&min.size().to_css()),
                );
            }
            if let Some(max) = auto_grow.maximum_height {
                let max = max.size().to_css();
                editor.set_style(DomPart::Editable, StyleProperty::MaxHeight, Some(&max));
                if config.prevent_resize_beyond_maximum() {
                    editor.set_style(DomPart::Content, StyleProperty::MaxHeight, Some(&max));
                }
            }
        }
        if self.sizing.needs_monitor() && !self.sizing.is_monitoring() {
            self.start_height_monitor(sh);
        }

        if let Some(info) = &config.info_panel
            && let Some(text) = &info.text
        {
            editor.show_info_panel(
                text,
                info.alignment.unwrap_or_default().as_css(),
                config.toolbar_position() == ToolbarPosition::Bottom,
            );
        }

        self.update_editor_size(sh);
        if !self.focus.reported() {
            self.hide_toolbar(sh, false);
        }
        sh.schedule(0, Message::RevealEditor { generation });
        Ok(())
    }

    pub(super) fn reveal_editor(&mut self, sh: &Shared, generation: u64) {
        let Some(ready) = self.lifecycle.ready() else {
            return;
        };
        if ready.generation != generation {
            return;
        }
        let editor = ready.editor.clone();
        editor.set_style(DomPart::Outer, StyleProperty::Visibility, Some("visible"));
        if self.is_focused(sh) {
            editor.focus();
        }
    }

    /// Recreate the editor, keeping height and the detached window. Before
    /// the editor is ready the request is recorded and coalesced.
    pub(super) fn reload(
        &mut self,
        sh: &Shared,
        force: bool,
        config: Option<EditorConfig>,
        reload_detached: bool,
    ) -> Result<(), InputError> {
        if !force && !self.lifecycle.is_ready() {
            if !self
                .lifecycle
                .defer(Pending::Reload(config.clone()))
                && let Some(config) = config
            {
                self.config = Some(config);
            }
            return Ok(());
        }

        let dialogs = &sh.ctx.dialogs;
        if dialogs.owns(&sh.id) {
            if dialogs.is_loading(&sh.id) {
                let previous = self.postponed_reload.take().flatten();
                self.postponed_reload = Some(config.or(previous));
                debug!(control = %sh.id, "dialog loading, reload postponed");
                return Ok(());
            }
            dialogs.hide(&sh.id);
        }

        debug!(control = %sh.id, "reloading editor");
        let height = self.sizing.height;
        let auto_multi_line = self.auto_multi_line;
        let detached = self.detached.take();

        self.disable_design_mode(sh);
        let result = self.set_design_mode(sh, true, config);

        if let Some(session) = detached {
            if reload_detached {
                session.reload(&self.detached_settings(sh));
            }
            self.detached = Some(session);
        }
        self.apply_height(sh, height, false);
        self.auto_multi_line = auto_multi_line;
        result.map(|_| ())
    }

    /// Tear down the editor instance. The value is carried back into the
    /// native input.
    fn destroy_editor(&mut self, sh: &Shared, dispose_detached: bool) {
        self.stop_height_monitor(sh);
        if let Some(timer) = self.sizing.update_timer.take() {
            sh.ctx.scheduler.cancel(timer);
        }
        if let Some(observer) = self.sizing.visibility_observer.take() {
            sh.dom.unobserve(observer);
        }

        if self.lifecycle.is_ready() {
            let value = self.value(sh);
            if let Some(editor) = self.lifecycle.take_editor() {
                editor.destroy();
            }
            sh.dom.set_input_value(&value);
        }
        self.buttons.forget();
        self.suppress_paste = false;
        self.toolbar_hidden = false;
        self.menu_open = false;
        if let Some((_, feed)) = sh.tag_feed.take() {
            feed.close();
        }

        if dispose_detached && let Some(session) = self.detached.take() {
            let was_active = session.is_active();
            session.dispose();
            if was_active {
                self.unlock_focus(sh, FocusHolder::Detached);
            }
        }
    }

    pub(super) fn dispose(&mut self, sh: &Shared) {
        if self.lifecycle.is_destroyed() {
            return;
        }
        if self.lifecycle.is_initializing() {
            self.lifecycle.defer(Pending::Dispose);
            warn!(
                control = %sh.id,
                "control disposed while the editor is initializing, disposal resumes once it is ready"
            );
            sh.dom.park_offscreen();
            return;
        }

        let dialogs = &sh.ctx.dialogs;
        if dialogs.owns(&sh.id) {
            if dialogs.is_loading(&sh.id) {
                dialogs.mark_owner_disposed(&sh.id);
                sh.dom.remove();
                debug!(control = %sh.id, "dialog loading, disposal resumes once it is shown");
                return;
            }
            dialogs.hide(&sh.id);
        }
        self.dispose_now(sh);
    }

    fn dispose_now(&mut self, sh: &Shared) {
        if let Some(wait) = self.lifecycle.cancel_attach_wait() {
            self.release_attach_wait(sh, wait);
        }
        let value = self.value(sh);
        self.close_panel(sh);
        self.destroy_editor(sh, true);
        self.change_timer.cancel(&*sh.ctx.scheduler);

        let policy = self
            .config
            .as_ref()
            .map(|c| c.revoke_policy())
            .unwrap_or_default();
        self.blobs.release(policy, &value, &*sh.ctx.blobs);

        self.focus.abandon();
        self.lifecycle.destroy();
        sh.dom.remove();
        info!(control = %sh.id, "control disposed");
    }

    pub(super) fn dialog_closed(&mut self, sh: &Shared, canceled: bool) -> Result<(), InputError> {
        if canceled {
            sh.dom.blur();
        }
        self.unlock_focus(sh, FocusHolder::Dialog);
        if self.disable_postponed {
            self.resume_disable_design_mode(sh);
        }
        if let Some(config) = self.postponed_reload.take()
            && self.design_mode
        {
            self.reload(sh, false, config, true)?;
        }
        Ok(())
    }

    pub(super) fn set_multi_line(&mut self, sh: &Shared, multi_line: bool) -> bool {
        if self.design_mode && self.lifecycle.is_initializing() {
            error!(
                control = %sh.id,
                "multi line cannot change while the editor is initializing"
            );
            return false;
        }
        if self.design_mode {
            self.disable_design_mode(sh);
        }
        if multi_line {
            self.auto_multi_line = false;
        }

        if multi_line && !self.multi_line {
            let focused = sh.dom.focus() == crate::platform::DomFocus::Input;
            sh.dom.set_multi_line(true);
            self.multi_line = true;
            sh.dom.set_data("multiline", Some("true"));
            if focused {
                sh.dom.focus_input();
            }
        } else if !multi_line && self.multi_line {
            let focused = sh.dom.focus() == crate::platform::DomFocus::Input;
            sh.dom.set_multi_line(false);
            self.multi_line = false;
            if self.sizing.disable_maximize().is_some() {
                sh.dom.set_data("maximizable", None);
                sh.dom.set_data("maximized", None);
            }
            if self.sizing.resizing != Resizing::Disabled {
                self.sizing.resizing = Resizing::Disabled;
                self.sizing.resized = false;
                sh.dom.set_data("resizable", None);
                sh.dom.reset_input_size();
            }
            self.apply_height(sh, Size::UNSET, true);
            if focused {
                sh.dom.focus_input();
            }
            self.auto_multi_line = false;
            sh.dom.set_data("multiline", None);
        }
        self.multi_line && !self.design_mode
    }

    /// Switch back to a single line input if multi-line was only turned on
    /// implicitly and nothing needs it anymore.
    pub(super) fn revert_single_line(&mut self, sh: &Shared) {
        if self.auto_multi_line
            && !self.sizing.is_maximizable()
            && self.sizing.resizing == Resizing::Disabled
            && !self.design_mode
        {
            self.set_multi_line(sh, false);
        }
    }

    pub(super) fn set_enabled(&mut self, sh: &Shared, enabled: bool) -> bool {
        if enabled == self.enabled {
            return enabled;
        }
        let detached_active = self.detached.as_ref().is_some_and(|s| s.is_active());
        if !enabled && !detached_active {
            self.set_focused(sh, false);
        }
        self.enabled = enabled;
        sh.dom.set_input_enabled(enabled);
        if let Some(editor) = self.lifecycle.editor() {
            editor.set_read_only(!enabled);
            editor.set_tabbable(enabled);
        }
        if self.design_mode {
            sh.dom.set_tab_index(enabled.then_some(-1));
        }
        if let Some(session) = &self.detached {
            session.set_enabled(enabled);
        }
        enabled
    }

    pub(super) fn set_visible(&mut self, sh: &Shared, visible: bool) -> bool {
        self.visible = visible;
        sh.dom.set_visible(visible);
        let signal = self.detached.as_mut().and_then(|s| s.set_visible(visible));
        if let Some(signal) = signal {
            let signal = self.focus.force(signal == FocusSignal::Focus);
            self.emit_focus(sh, signal);
        }
        if visible {
            self.update_editor_size(sh);
        }
        visible
    }

    pub(super) fn set_placeholder(&mut self, sh: &Shared, placeholder: &str) -> String {
        self.placeholder = placeholder.to_string();
        sh.dom.set_placeholder(placeholder);
        self.update_placeholder(sh);
        self.placeholder.clone()
    }

    /// Show the placeholder inside the editor while it is empty.
    pub(super) fn update_placeholder(&self, sh: &Shared) {
        let Some(editor) = self.lifecycle.editor() else {
            return;
        };
        let show = !self.placeholder.is_empty() && self.value(sh).is_empty();
        editor.set_part_data(
            DomPart::Editable,
            "placeholder",
            show.then_some(self.placeholder.as_str()),
        );
    }

    pub(super) fn set_check_spelling(&mut self, sh: &Shared, spellcheck: bool) -> bool {
        if spellcheck != self.spellcheck {
            self.spellcheck = spellcheck;
            sh.dom.set_spellcheck(spellcheck);
            if self.design_mode
                && let Err(e) = self.reload(sh, false, None, true)
            {
                error!(control = %sh.id, error = %e, "reload after spellcheck change failed");
            }
        }
        self.spellcheck
    }

    /// The detached editor follows locale changes by itself.
    pub(super) fn set_locale(&mut self, sh: &Shared, locale: &str) -> smol_str::SmolStr {
        if locale != self.locale {
            self.locale = locale.into();
            if self.design_mode
                && let Err(e) = self.reload(sh, false, None, false)
            {
                error!(control = %sh.id, error = %e, "reload after locale change failed");
            }
            if let Some(session) = &self.detached {
                session.set_locale(locale);
            }
        }
        self.locale.clone()
    }
}
