//! Per-page wiring shared by every control.

use std::ops::Deref;
use std::rc::Rc;

use gloo_events::EventListener;
use gloo_timers::callback::Timeout;
use richinput_core::{
    ControlContext, DetachedDialogFactory, DialogSessionManager, EngineService, EngineSettings,
    InputControl,
};

use crate::dom::BrowserControlDom;
use crate::loader::{EngineBinder, ScriptTagLoader};
use crate::prompt::{UrlBlobRevoker, WindowConfirm};
use crate::tags::FetchTagTransport;
use crate::timers::TimeoutScheduler;

/// The timer queue, dialog session and engine gateway of one page.
///
/// Create one per page and build controls from it; the engine script is
/// then loaded at most once.
pub struct BrowserPage {
    scheduler: Rc<TimeoutScheduler>,
    dialogs: Rc<DialogSessionManager>,
    engine: Rc<EngineService>,
    tags: Rc<FetchTagTransport>,
}

impl BrowserPage {
    pub fn new(settings: EngineSettings, bind: EngineBinder) -> Self {
        let scheduler = TimeoutScheduler::new();
        let dialogs = DialogSessionManager::new(scheduler.clone());
        let engine = EngineService::new(ScriptTagLoader::new(bind), settings, dialogs.clone());
        Self {
            scheduler,
            dialogs,
            engine,
            tags: FetchTagTransport::new(),
        }
    }

    pub fn engine(&self) -> &Rc<EngineService> {
        &self.engine
    }

    pub fn dialogs(&self) -> &Rc<DialogSessionManager> {
        &self.dialogs
    }

    pub fn scheduler(&self) -> &Rc<TimeoutScheduler> {
        &self.scheduler
    }

    /// Collaborators for a new control.
    pub fn context(&self, detached: Rc<dyn DetachedDialogFactory>) -> ControlContext {
        ControlContext {
            scheduler: self.scheduler.clone(),
            engine: self.engine.clone(),
            dialogs: self.dialogs.clone(),
            blobs: Rc::new(UrlBlobRevoker),
            confirm: Rc::new(WindowConfirm),
            detached,
            tags: self.tags.clone(),
        }
    }

    /// Attach a control to the element with id `root_id`. Returns `None`
    /// when there is no such element or it holds no native input.
    pub fn control(
        &self,
        root_id: &str,
        detached: Rc<dyn DetachedDialogFactory>,
    ) -> Option<MountedControl> {
        let dom = BrowserControlDom::by_id(root_id)?;
        let control = InputControl::new(root_id, self.context(detached), dom.clone());
        Some(MountedControl::new(control, &dom))
    }
}

/// A control listening to native focus and input events on its root.
/// Dropping it stops listening; the control itself lives on in other
/// handles.
pub struct MountedControl {
    control: InputControl,
    _listeners: Vec<EventListener>,
}

impl MountedControl {
    pub fn new(control: InputControl, dom: &BrowserControlDom) -> Self {
        let root = dom.root();

        let focus_in = control.clone();
        let focus_in = EventListener::new(root, "focusin", move |_| {
            focus_in.notify_focus_changed();
        });
        // activeElement is still <body> while focusout runs.
        let focus_out = control.clone();
        let focus_out = EventListener::new(root, "focusout", move |_| {
            let control = focus_out.clone();
            Timeout::new(0, move || control.notify_focus_changed()).forget();
        });
        let typed = control.clone();
        let typed = EventListener::new(root, "input", move |_| {
            typed.notify_input_changed();
        });

        Self {
            control,
            _listeners: vec![focus_in, focus_out, typed],
        }
    }

    pub fn control(&self) -> &InputControl {
        &self.control
    }
}

impl Deref for MountedControl {
    type Target = InputControl;

    fn deref(&self) -> &InputControl {
        &self.control
    }
}
