//! The rich text input control.
//!
//! An [`InputControl`] wraps a native input and, in design mode, an editor
//! instance created by the shared engine. All state lives in one `Core`
//! behind a `RefCell` and changes one transition at a time:
//!
//! - Public commands run immediately. A command issued while a transition is
//!   in progress (from a collaborator callback) is queued and runs right
//!   after it.
//! - Notifications from the engine, the DOM, timers and the dialog subsystem
//!   become [`Message`]s handled the same way.
//! - Events for application code are collected during a transition and
//!   delivered once it completes, so handlers always see a consistent
//!   control and may call back into it.

mod design;
mod detach;
mod events;
mod focus;
mod sizing;

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use smol_str::SmolStr;
use tracing::{error, trace};

use crate::blobs::BlobRegistry;
use crate::config::EditorConfig;
use crate::detached::{DetachedActions, DetachedDialogFactory, DetachedSession};
use crate::dialog::{DialogOwner, DialogSessionManager};
use crate::engine::{Engine, EngineEvent, EngineEventSink, EngineResponse, EngineService};
use crate::error::InputError;
use crate::focus::FocusCoordinator;
use crate::lifecycle::{EditorLifecycle, LifecyclePhase};
use crate::platform::{BlobRevoker, ConfirmPrompt, ControlDom, ToolbarPanel};
use crate::scheduler::{Debounce, Scheduler, Task, TimerId};
use crate::sizing::SizingController;
use crate::tags::{TagFeed, TagItem, TagResolve, TagTransport};
use crate::toolbar::ButtonStateGuard;
use crate::types::{ControlEvent, ControlId, Resizing, Size};
use crate::value::ValueStore;

/// Process-wide collaborators shared by all controls on a page.
#[derive(Clone)]
pub struct ControlContext {
    pub scheduler: Rc<dyn Scheduler>,
    pub engine: Rc<EngineService>,
    pub dialogs: Rc<DialogSessionManager>,
    pub blobs: Rc<dyn BlobRevoker>,
    pub confirm: Rc<dyn ConfirmPrompt>,
    pub detached: Rc<dyn DetachedDialogFactory>,
    pub tags: Rc<dyn TagTransport>,
}

/// Point-in-time view of a control.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ControlState {
    pub phase: LifecyclePhase,
    pub enabled: bool,
    pub visible: bool,
    pub focused: bool,
    pub focus_locked: bool,
    pub design_mode: bool,
    pub multi_line: bool,
    pub detached_open: bool,
}

pub type EventHandler = Rc<dyn Fn(&InputControl, ControlEvent)>;

/// Work queued for the control.
enum Message {
    EngineLoaded(Rc<dyn Engine>),
    AttachCheck,
    Engine { generation: u64, event: EngineEvent },
    RevealEditor { generation: u64 },
    UpdateEditorSize,
    VisibilityChanged,
    HeightMonitorTick { generation: u64 },
    PanelPoll,
    DialogClosed { canceled: bool },
    ResumeDispose,
    ResumeDisableDesignMode,
    FlushChange,
    NativeFocusChanged,
    InputChanged,
    DetachedCommit,
    DetachedCancel,
    DetachedConfirmed(bool),
    UndoPaste { generation: u64 },
    DisableButtons { generation: u64 },
    /// A public command issued while the control was busy.
    Deferred(Box<dyn FnOnce(&InputControl)>),
}

impl Message {
    fn name(&self) -> &'static str {
        match self {
            Message::EngineLoaded(_) => "EngineLoaded",
            Message::AttachCheck => "AttachCheck",
            Message::Engine { .. } => "Engine",
            Message::RevealEditor { .. } => "RevealEditor",
            Message::UpdateEditorSize => "UpdateEditorSize",
            Message::VisibilityChanged => "VisibilityChanged",
            Message::HeightMonitorTick { .. } => "HeightMonitorTick",
            Message::PanelPoll => "PanelPoll",
            Message::DialogClosed { .. } => "DialogClosed",
            Message::ResumeDispose => "ResumeDispose",
            Message::ResumeDisableDesignMode => "ResumeDisableDesignMode",
            Message::FlushChange => "FlushChange",
            Message::NativeFocusChanged => "NativeFocusChanged",
            Message::InputChanged => "InputChanged",
            Message::DetachedCommit => "DetachedCommit",
            Message::DetachedCancel => "DetachedCancel",
            Message::DetachedConfirmed(_) => "DetachedConfirmed",
            Message::UndoPaste { .. } => "UndoPaste",
            Message::DisableButtons { .. } => "DisableButtons",
            Message::Deferred(_) => "Deferred",
        }
    }
}

/// A toolbar panel opened from this control's editor.
struct ActivePanel {
    panel: Rc<dyn ToolbarPanel>,
    timer: Option<TimerId>,
}

struct Core {
    enabled: bool,
    visible: bool,
    design_mode: bool,
    multi_line: bool,
    /// Multi-line was switched on implicitly and may be reverted.
    auto_multi_line: bool,
    placeholder: String,
    spellcheck: bool,
    locale: SmolStr,
    config: Option<EditorConfig>,
    values: ValueStore,
    blobs: BlobRegistry,
    focus: FocusCoordinator,
    lifecycle: EditorLifecycle,
    sizing: SizingController,
    buttons: ButtonStateGuard,
    suppress_paste: bool,
    toolbar_hidden: bool,
    menu_open: bool,
    change_debounce_ms: Option<u32>,
    change_timer: Debounce,
    panel: Option<ActivePanel>,
    detached: Option<DetachedSession>,
    disable_postponed: bool,
    /// Reload requested while this control's dialog was loading.
    postponed_reload: Option<Option<EditorConfig>>,
}

impl Core {
    fn new(initial_value: &str) -> Self {
        let mut values = ValueStore::default();
        values.assign(initial_value, false);
        Core {
            enabled: true,
            visible: true,
            design_mode: false,
            multi_line: false,
            auto_multi_line: false,
            placeholder: String::new(),
            spellcheck: true,
            locale: "en".into(),
            config: None,
            values,
            blobs: BlobRegistry::default(),
            focus: FocusCoordinator::default(),
            lifecycle: EditorLifecycle::default(),
            sizing: SizingController::default(),
            buttons: ButtonStateGuard::default(),
            suppress_paste: false,
            toolbar_hidden: false,
            menu_open: false,
            change_debounce_ms: None,
            change_timer: Debounce::default(),
            panel: None,
            detached: None,
            disable_postponed: false,
            postponed_reload: None,
        }
    }

    fn state(&self, sh: &Shared) -> ControlState {
        ControlState {
            phase: self.lifecycle.phase(),
            enabled: self.enabled,
            visible: self.visible,
            focused: self.is_focused(sh),
            focus_locked: self.focus.is_locked(),
            design_mode: self.design_mode,
            multi_line: self.multi_line && !self.design_mode,
            detached_open: self.detached.as_ref().is_some_and(|s| s.is_active()),
        }
    }

    fn handle(&mut self, sh: &Shared, message: Message) -> Result<(), InputError> {
        trace!(control = %sh.id, message = message.name(), "handling message");
        if self.lifecycle.is_destroyed() {
            return Ok(());
        }
        match message {
            Message::EngineLoaded(engine) => self.on_engine_loaded(sh, engine)?,
            Message::AttachCheck => self.attach_check(sh)?,
            Message::Engine { generation, event } => {
                self.on_engine_event(sh, generation, event)?;
            }
            Message::RevealEditor { generation } => self.reveal_editor(sh, generation),
            Message::UpdateEditorSize => {
                self.sizing.update_timer = None;
                self.update_editor_size(sh);
            }
            Message::VisibilityChanged => self.visibility_changed(sh),
            Message::HeightMonitorTick { generation } => self.height_monitor_tick(sh, generation),
            Message::PanelPoll => self.panel_poll(sh),
            Message::DialogClosed { canceled } => self.dialog_closed(sh, canceled)?,
            Message::ResumeDispose => self.dispose(sh),
            Message::ResumeDisableDesignMode => self.resume_disable_design_mode(sh),
            Message::FlushChange => {
                self.change_timer.fired();
                self.fire_on_change(sh);
            }
            Message::NativeFocusChanged => self.sync_focus(sh),
            Message::InputChanged => self.input_changed(sh),
            Message::DetachedCommit => self.commit_detached(sh),
            Message::DetachedCancel => self.cancel_detached(sh),
            Message::DetachedConfirmed(discard) => self.cancel_confirmed(sh, discard),
            Message::UndoPaste { generation } => {
                if let Some(ready) = self.lifecycle.ready()
                    && ready.generation == generation
                {
                    ready.editor.execute("undo");
                }
            }
            Message::DisableButtons { generation } => {
                if let Some(ready) = self.lifecycle.ready()
                    && ready.generation == generation
                {
                    let editor = ready.editor.clone();
                    self.buttons.disable(&*editor);
                }
            }
            Message::Deferred(_) => {}
        }
        Ok(())
    }
}

struct Snapshot {
    state: ControlState,
    value: String,
}

struct Shared {
    id: ControlId,
    ctx: ControlContext,
    dom: Rc<dyn ControlDom>,
    core: RefCell<Core>,
    mailbox: RefCell<VecDeque<Message>>,
    outbox: RefCell<Vec<ControlEvent>>,
    handlers: RefCell<Vec<EventHandler>>,
    snapshot: RefCell<Snapshot>,
    flushing: Cell<bool>,
    suppress_change: Cell<bool>,
    suppress_resize: Cell<bool>,
    /// Tag feed of the current editor instance, with its generation.
    tag_feed: RefCell<Option<(u64, Rc<TagFeed>)>>,
    weak: Weak<Shared>,
}

impl Shared {
    fn control(&self) -> Option<InputControl> {
        self.weak.upgrade().map(|shared| InputControl { shared })
    }

    fn is_busy(&self) -> bool {
        self.core.try_borrow_mut().is_err()
    }

    /// Run one transition, then deliver events and queued messages.
    /// `None` if a transition is already in progress.
    fn run<R>(&self, f: impl FnOnce(&mut Core, &Shared) -> R) -> Option<R> {
        let result = {
            let mut core = self.core.try_borrow_mut().ok()?;
            let result = f(&mut core, self);
            self.refresh_snapshot(&core);
            result
        };
        self.flush();
        Some(result)
    }

    /// Read current state. `None` while a transition is in progress.
    fn read<R>(&self, f: impl FnOnce(&Core, &Shared) -> R) -> Option<R> {
        let result = {
            let core = self.core.try_borrow().ok()?;
            f(&core, self)
        };
        if !self.mailbox.borrow().is_empty() {
            self.flush();
        }
        Some(result)
    }

    fn refresh_snapshot(&self, core: &Core) {
        let state = core.state(self);
        let mut snapshot = self.snapshot.borrow_mut();
        snapshot.state = state;
        snapshot.value = core.values.notified().to_string();
    }

    fn post(&self, message: Message) {
        self.mailbox.borrow_mut().push_back(message);
        if !self.is_busy() {
            self.flush();
        }
    }

    /// Queue an event for delivery after the current transition.
    fn emit(&self, event: ControlEvent) {
        trace!(control = %self.id, event = ?event, "event queued");
        self.outbox.borrow_mut().push(event);
    }

    fn task(&self, message: Message) -> Task {
        let weak = self.weak.clone();
        Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.post(message);
            }
        })
    }

    fn schedule(&self, delay_ms: u32, message: Message) -> TimerId {
        self.ctx.scheduler.schedule(delay_ms, self.task(message))
    }

    fn with_change_suppressed(&self, f: impl FnOnce()) {
        let previous = self.suppress_change.replace(true);
        f();
        self.suppress_change.set(previous);
    }

    fn with_resize_suppressed(&self, f: impl FnOnce()) {
        let previous = self.suppress_resize.replace(true);
        f();
        self.suppress_resize.set(previous);
    }

    fn flush(&self) {
        if self.flushing.replace(true) {
            return;
        }
        loop {
            let events = std::mem::take(&mut *self.outbox.borrow_mut());
            if !events.is_empty() {
                if let Some(control) = self.control() {
                    let handlers = self.handlers.borrow().clone();
                    for event in events {
                        for handler in &handlers {
                            handler(&control, event);
                        }
                    }
                }
                continue;
            }

            let Some(message) = self.mailbox.borrow_mut().pop_front() else {
                break;
            };
            if let Message::Deferred(command) = message {
                if let Some(control) = self.control() {
                    command(&control);
                }
                continue;
            }
            let Ok(mut core) = self.core.try_borrow_mut() else {
                self.mailbox.borrow_mut().push_front(message);
                break;
            };
            if let Err(e) = core.handle(self, message) {
                error!(control = %self.id, error = %e, "failed to handle queued notification");
            }
            self.refresh_snapshot(&core);
        }
        self.flushing.set(false);
    }
}

impl EngineEventSink for Shared {
    fn handle_engine_event(
        &self,
        generation: u64,
        event: EngineEvent,
    ) -> Result<EngineResponse, InputError> {
        match event {
            EngineEvent::Change if self.suppress_change.get() => {
                return Ok(EngineResponse::Proceed);
            }
            EngineEvent::Resize if self.suppress_resize.get() => {
                return Ok(EngineResponse::Proceed);
            }
            _ => {}
        }
        if self.is_busy() {
            trace!(control = %self.id, event = ?event, "engine event queued");
            self.post(Message::Engine { generation, event });
            return Ok(EngineResponse::Proceed);
        }
        self.run(|core, sh| core.on_engine_event(sh, generation, event))
            .unwrap_or(Ok(EngineResponse::Proceed))
    }

    fn query_tags(&self, generation: u64, marker: &str, query: &str, resolve: TagResolve) {
        let feed = match &*self.tag_feed.borrow() {
            Some((g, feed)) if *g == generation => Some(feed.clone()),
            _ => None,
        };
        match feed {
            Some(feed) => feed.query(marker, query, resolve),
            None => resolve(Vec::new()),
        }
    }

    fn render_tag(&self, generation: u64, marker: &str, item: &TagItem) -> Option<String> {
        match &*self.tag_feed.borrow() {
            Some((g, feed)) if *g == generation => Some(feed.render_tag(marker, item)),
            _ => None,
        }
    }
}

impl DialogOwner for Shared {
    fn dialog_closed(&self, canceled: bool) {
        self.post(Message::DialogClosed { canceled });
    }

    fn resume_dispose(&self) {
        self.post(Message::ResumeDispose);
    }

    fn resume_disable_design_mode(&self) {
        self.post(Message::ResumeDisableDesignMode);
    }
}

impl DetachedActions for Shared {
    fn commit(&self) {
        self.post(Message::DetachedCommit);
    }

    fn cancel(&self) {
        self.post(Message::DetachedCancel);
    }
}

/// A rich text input control. Cloning yields another handle to the same
/// control.
#[derive(Clone)]
pub struct InputControl {
    shared: Rc<Shared>,
}

impl InputControl {
    pub fn new(id: impl Into<ControlId>, ctx: ControlContext, dom: Rc<dyn ControlDom>) -> Self {
        let id = id.into();
        let initial = dom.input_value();
        let core = Core::new(&initial);
        let snapshot = Snapshot {
            state: ControlState {
                phase: LifecyclePhase::Unloaded,
                enabled: core.enabled,
                visible: core.visible,
                focused: false,
                focus_locked: false,
                design_mode: false,
                multi_line: false,
                detached_open: false,
            },
            value: initial,
        };
        let shared = Rc::new_cyclic(|weak| Shared {
            id,
            ctx,
            dom,
            core: RefCell::new(core),
            mailbox: RefCell::new(VecDeque::new()),
            outbox: RefCell::new(Vec::new()),
            handlers: RefCell::new(Vec::new()),
            snapshot: RefCell::new(snapshot),
            flushing: Cell::new(false),
            suppress_change: Cell::new(false),
            suppress_resize: Cell::new(false),
            tag_feed: RefCell::new(None),
            weak: weak.clone(),
        });
        InputControl { shared }
    }

    pub fn id(&self) -> &ControlId {
        &self.shared.id
    }

    /// Subscribe to change, focus and blur events.
    pub fn on_event(&self, handler: impl Fn(&InputControl, ControlEvent) + 'static) {
        self.shared.handlers.borrow_mut().push(Rc::new(handler));
    }

    /// Queue `command` if the control is busy. Returns `requested` when it
    /// was queued.
    fn defer_if_busy<R>(&self, requested: R, command: impl FnOnce(&InputControl) + 'static) -> Option<R> {
        if !self.shared.is_busy() {
            return None;
        }
        trace!(control = %self.shared.id, "control busy, command queued");
        self.shared.post(Message::Deferred(Box::new(command)));
        Some(requested)
    }

    fn snapshot(&self) -> ControlState {
        self.shared.snapshot.borrow().state
    }

    pub fn state(&self) -> ControlState {
        self.shared
            .read(|core, sh| core.state(sh))
            .unwrap_or_else(|| self.snapshot())
    }

    pub fn is_disposed(&self) -> bool {
        self.state().phase == LifecyclePhase::Destroyed
    }

    pub fn value(&self) -> String {
        self.shared
            .read(|core, sh| core.value(sh))
            .unwrap_or_else(|| self.shared.snapshot.borrow().value.clone())
    }

    /// Assign a value from code. The dirty baseline is reset unless
    /// `preserve_dirty` is set. Fires change if the value differs.
    pub fn set_value(&self, value: &str, preserve_dirty: bool) -> String {
        let owned = value.to_string();
        if let Some(requested) = self.defer_if_busy(owned.clone(), move |c| {
            c.set_value(&owned, preserve_dirty);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_value(sh, value, preserve_dirty))
            .unwrap_or_else(|| value.to_string())
    }

    /// Assign a value on behalf of the user: the control becomes dirty.
    pub fn set_user_value(&self, value: &str) -> String {
        let owned = value.to_string();
        if let Some(requested) = self.defer_if_busy(owned.clone(), move |c| {
            c.set_user_value(&owned);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_user_value(sh, value))
            .unwrap_or_else(|| value.to_string())
    }

    pub fn is_dirty(&self) -> bool {
        self.shared.read(|core, sh| core.is_dirty(sh)).unwrap_or(false)
    }

    pub fn focused(&self) -> bool {
        self.shared
            .read(|core, sh| core.is_focused(sh))
            .unwrap_or_else(|| self.snapshot().focused)
    }

    /// Move focus into or out of the control. Returns the resulting
    /// logical focus state.
    pub fn set_focused(&self, focused: bool) -> bool {
        if let Some(requested) = self.defer_if_busy(focused, move |c| {
            c.set_focused(focused);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_focused(sh, focused))
            .unwrap_or(focused)
    }

    pub fn design_mode(&self) -> bool {
        self.shared
            .read(|core, _| core.design_mode)
            .unwrap_or_else(|| self.snapshot().design_mode)
    }

    /// Switch design mode on or off. A configuration supplied while design
    /// mode is on reloads the editor with it.
    ///
    /// The configuration is validated before anything changes.
    pub fn set_design_mode(
        &self,
        enabled: bool,
        config: Option<EditorConfig>,
    ) -> Result<bool, InputError> {
        if let Some(config) = &config {
            config.validate()?;
        }
        if self.shared.is_busy() {
            self.shared.post(Message::Deferred(Box::new(move |c| {
                if let Err(e) = c.set_design_mode(enabled, config) {
                    error!(control = %c.id(), error = %e, "queued design mode change failed");
                }
            })));
            return Ok(enabled);
        }
        self.shared
            .run(|core, sh| core.set_design_mode(sh, enabled, config))
            .unwrap_or(Ok(enabled))
    }

    pub fn config(&self) -> Option<EditorConfig> {
        self.shared.read(|core, _| core.config.clone()).flatten()
    }

    pub fn enabled(&self) -> bool {
        self.shared
            .read(|core, _| core.enabled)
            .unwrap_or_else(|| self.snapshot().enabled)
    }

    pub fn set_enabled(&self, enabled: bool) -> bool {
        if let Some(requested) = self.defer_if_busy(enabled, move |c| {
            c.set_enabled(enabled);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_enabled(sh, enabled))
            .unwrap_or(enabled)
    }

    pub fn visible(&self) -> bool {
        self.shared
            .read(|core, _| core.visible)
            .unwrap_or_else(|| self.snapshot().visible)
    }

    pub fn set_visible(&self, visible: bool) -> bool {
        if let Some(requested) = self.defer_if_busy(visible, move |c| {
            c.set_visible(visible);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_visible(sh, visible))
            .unwrap_or(visible)
    }

    /// Whether the native input is a textarea. Always false in design mode.
    pub fn multi_line(&self) -> bool {
        self.shared
            .read(|core, _| core.multi_line && !core.design_mode)
            .unwrap_or_else(|| self.snapshot().multi_line)
    }

    pub fn set_multi_line(&self, multi_line: bool) -> bool {
        if let Some(requested) = self.defer_if_busy(multi_line, move |c| {
            c.set_multi_line(multi_line);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_multi_line(sh, multi_line))
            .unwrap_or(multi_line)
    }

    pub fn placeholder(&self) -> String {
        self.shared
            .read(|core, _| core.placeholder.clone())
            .unwrap_or_default()
    }

    pub fn set_placeholder(&self, placeholder: &str) -> String {
        let owned = placeholder.to_string();
        if let Some(requested) = self.defer_if_busy(owned.clone(), move |c| {
            c.set_placeholder(&owned);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_placeholder(sh, placeholder))
            .unwrap_or_else(|| placeholder.to_string())
    }

    pub fn check_spelling(&self) -> bool {
        self.shared.read(|core, _| core.spellcheck).unwrap_or(true)
    }

    pub fn set_check_spelling(&self, spellcheck: bool) -> bool {
        if let Some(requested) = self.defer_if_busy(spellcheck, move |c| {
            c.set_check_spelling(spellcheck);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_check_spelling(sh, spellcheck))
            .unwrap_or(spellcheck)
    }

    pub fn locale(&self) -> SmolStr {
        self.shared
            .read(|core, _| core.locale.clone())
            .unwrap_or_else(|| "en".into())
    }

    pub fn set_locale(&self, locale: &str) -> SmolStr {
        let owned = SmolStr::new(locale);
        if let Some(requested) = self.defer_if_busy(owned.clone(), move |c| {
            c.set_locale(&owned);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_locale(sh, locale))
            .unwrap_or_else(|| locale.into())
    }

    pub fn width(&self) -> Size {
        self.shared
            .read(|core, _| core.sizing.width)
            .unwrap_or_default()
    }

    pub fn set_width(&self, width: Size) -> Size {
        if let Some(requested) = self.defer_if_busy(width, move |c| {
            c.set_width(width);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_width(sh, width))
            .unwrap_or(width)
    }

    pub fn height(&self) -> Size {
        self.shared
            .read(|core, _| core.sizing.height)
            .unwrap_or_default()
    }

    /// Set the height. Unset lets a design mode editor grow with its
    /// content.
    pub fn set_height(&self, height: Size) -> Size {
        if let Some(requested) = self.defer_if_busy(height, move |c| {
            c.set_height(height);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| {
                core.apply_height(sh, height, false);
                core.sizing.height
            })
            .unwrap_or(height)
    }

    pub fn maximizable(&self) -> bool {
        self.shared
            .read(|core, _| core.sizing.is_maximizable())
            .unwrap_or(false)
    }

    /// Allow toggling between the current height and `maximized_height`
    /// (pixels in the current height unit). Without one the maximized
    /// height is twice the current height.
    pub fn set_maximizable(&self, maximizable: bool, maximized_height: Option<f64>) -> bool {
        if let Some(requested) = self.defer_if_busy(maximizable, move |c| {
            c.set_maximizable(maximizable, maximized_height);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_maximizable(sh, maximizable, maximized_height))
            .unwrap_or(maximizable)
    }

    pub fn maximized(&self) -> bool {
        self.shared
            .read(|core, _| core.sizing.is_maximized())
            .unwrap_or(false)
    }

    pub fn set_maximized(&self, maximized: bool) -> bool {
        if let Some(requested) = self.defer_if_busy(maximized, move |c| {
            c.set_maximized(maximized);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_maximized(sh, maximized))
            .unwrap_or(maximized)
    }

    pub fn resizable(&self) -> Resizing {
        self.shared
            .read(|core, _| core.sizing.resizing)
            .unwrap_or_default()
    }

    pub fn set_resizable(&self, resizing: Resizing) -> Resizing {
        if let Some(requested) = self.defer_if_busy(resizing, move |c| {
            c.set_resizable(resizing);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_resizable(sh, resizing))
            .unwrap_or(resizing)
    }

    pub fn change_debounce(&self) -> Option<u32> {
        self.shared
            .read(|core, _| core.change_debounce_ms)
            .flatten()
    }

    /// Delay change notification until typing pauses for `delay_ms`.
    /// `None` or `Some(0)` notifies on every edit.
    pub fn set_change_debounce(&self, delay_ms: Option<u32>) -> Option<u32> {
        if let Some(requested) = self.defer_if_busy(delay_ms, move |c| {
            c.set_change_debounce(delay_ms);
        }) {
            return requested;
        }
        self.shared
            .run(|core, sh| core.set_change_debounce(sh, delay_ms))
            .unwrap_or(delay_ms)
    }

    /// Open the detached editor, if design mode is ready.
    pub fn open_detached(&self) {
        if self.defer_if_busy((), |c| c.open_detached()).is_some() {
            return;
        }
        self.shared.run(|core, sh| core.open_detached(sh));
    }

    /// Native focus moved into, within or out of the control.
    pub fn notify_focus_changed(&self) {
        self.shared.post(Message::NativeFocusChanged);
    }

    /// The user typed into the native input.
    pub fn notify_input_changed(&self) {
        self.shared.post(Message::InputChanged);
    }

    /// Release the editor, timers, blobs and the DOM. Deferred until the
    /// editor is ready if it is initializing.
    pub fn dispose(&self) {
        if self.defer_if_busy((), |c| c.dispose()).is_some() {
            return;
        }
        self.shared.run(|core, sh| core.dispose(sh));
    }
}

impl std::fmt::Debug for InputControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InputControl")
            .field("id", &self.shared.id)
            .field("state", &self.snapshot())
            .finish()
    }
}
