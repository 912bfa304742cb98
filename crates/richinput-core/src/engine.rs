//! Process-wide editor engine access.
//!
//! The engine script is heavyweight and registers global state, so it is
//! fetched at most once per process. [`EngineService`] owns that load: the
//! first control to ask starts it, later controls queue behind it, and once
//! the script arrives every queued continuation runs in request order.
//!
//! There is no timeout on the load. A script that never arrives leaves the
//! queued continuations pending.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use smol_str::SmolStr;
use tracing::{debug, info, trace};

use crate::config::{EmbedType, EngineSettings, ToolbarPosition};
use crate::dialog::{DialogEvent, DialogSessionManager};
use crate::error::InputError;
use crate::platform::{EditorInstance, ToolbarPanel};
use crate::tags::{TagItem, TagResolve};
use crate::toolbar::ToolbarLayout;
use crate::types::Size;

/// Fetches the engine script. `on_loaded` fires at most once.
pub trait ScriptLoader {
    fn load(&self, url: &str, on_loaded: Box<dyn FnOnce(Rc<dyn Engine>)>);
}

/// The loaded editor engine.
pub trait Engine {
    /// Apply process-wide settings. Called once, right after loading.
    fn configure(&self, settings: &EngineSettings);

    /// Register the handler for the engine's shared dialog subsystem.
    fn on_dialog_event(&self, handler: Box<dyn Fn(DialogEvent)>);

    /// Replace the element with the given id by a new editor instance.
    ///
    /// Creation is asynchronous; the instance reports
    /// [`EngineEvent::InstanceReady`] through `events` once its DOM exists.
    fn create(
        &self,
        element_id: &str,
        options: EngineOptions,
        events: EngineEvents,
    ) -> Rc<dyn EditorInstance>;
}

/// Trigger configuration for the engine's mention plugin.
#[derive(Clone, Debug, PartialEq)]
pub struct MentionOptions {
    pub marker: SmolStr,
    pub minimum_characters: u32,
    pub pattern: Option<String>,
}

/// Options for one editor instance.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    pub language: &'static str,
    pub spellcheck: bool,
    pub read_only: bool,
    /// Content height. Unset lets the editor grow with its content.
    pub height: Size,
    pub startup_focus: bool,
    pub initial_value: String,
    pub layout: ToolbarLayout,
    pub toolbar_position: ToolbarPosition,
    pub resize_enabled: bool,
    pub resize_dir: &'static str,
    pub image_storage: EmbedType,
    pub mentions: Vec<MentionOptions>,
}

/// Notifications from an editor instance.
#[derive(Clone)]
pub enum EngineEvent {
    /// The instance finished creating its DOM.
    InstanceReady,
    Change,
    /// Size changed by something other than auto grow.
    Resize,
    SelectionChange {
        /// The selection starts inside a tag element.
        in_tag: bool,
    },
    /// A command is about to run. Answer [`EngineResponse::Cancel`] to
    /// suppress it.
    BeforeCommand {
        name: SmolStr,
        opens_dialog: bool,
        /// The cursor is inside a tag, or no cursor was placed and the
        /// content starts with one.
        in_tag: bool,
    },
    /// A custom toolbar button was clicked.
    CustomCommand(SmolStr),
    /// Content was pasted. `blob_urls` lists images the paste handler
    /// converted into blob URLs.
    Paste { blob_urls: Vec<SmolStr> },
    ImageAdded { url: SmolStr, blob: bool },
    MenuShow,
    MenuHide {
        /// An item in the context menu holds focus (an item was triggered).
        menu_focused: bool,
    },
    ToolbarPanelOpened(Rc<dyn ToolbarPanel>),
}

impl std::fmt::Debug for EngineEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineEvent::InstanceReady => f.write_str("InstanceReady"),
            EngineEvent::Change => f.write_str("Change"),
            EngineEvent::Resize => f.write_str("Resize"),
            EngineEvent::SelectionChange { in_tag } => {
                f.debug_struct("SelectionChange").field("in_tag", in_tag).finish()
            }
            EngineEvent::BeforeCommand {
                name,
                opens_dialog,
                in_tag,
            } => f
                .debug_struct("BeforeCommand")
                .field("name", name)
                .field("opens_dialog", opens_dialog)
                .field("in_tag", in_tag)
                .finish(),
            EngineEvent::CustomCommand(cmd) => f.debug_tuple("CustomCommand").field(cmd).finish(),
            EngineEvent::Paste { blob_urls } => {
                f.debug_struct("Paste").field("blob_urls", blob_urls).finish()
            }
            EngineEvent::ImageAdded { url, blob } => f
                .debug_struct("ImageAdded")
                .field("url", url)
                .field("blob", blob)
                .finish(),
            EngineEvent::MenuShow => f.write_str("MenuShow"),
            EngineEvent::MenuHide { menu_focused } => f
                .debug_struct("MenuHide")
                .field("menu_focused", menu_focused)
                .finish(),
            EngineEvent::ToolbarPanelOpened(_) => f.write_str("ToolbarPanelOpened(..)"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineResponse {
    Proceed,
    Cancel,
}

/// Receiver of editor instance notifications, implemented by the control.
pub trait EngineEventSink {
    fn handle_engine_event(
        &self,
        generation: u64,
        event: EngineEvent,
    ) -> Result<EngineResponse, InputError>;

    fn query_tags(&self, generation: u64, marker: &str, query: &str, resolve: TagResolve);

    fn render_tag(&self, generation: u64, marker: &str, item: &TagItem) -> Option<String>;
}

/// Per-instance handle the engine glue uses to report back.
///
/// Holds the control weakly; notifications for a dropped control are
/// answered with defaults.
#[derive(Clone)]
pub struct EngineEvents {
    sink: Weak<dyn EngineEventSink>,
    generation: u64,
}

impl EngineEvents {
    pub fn new(sink: Weak<dyn EngineEventSink>, generation: u64) -> Self {
        Self { sink, generation }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn emit(&self, event: EngineEvent) -> Result<EngineResponse, InputError> {
        match self.sink.upgrade() {
            Some(sink) => sink.handle_engine_event(self.generation, event),
            None => Ok(EngineResponse::Proceed),
        }
    }

    pub fn query_tags(&self, marker: &str, query: &str, resolve: TagResolve) {
        match self.sink.upgrade() {
            Some(sink) => sink.query_tags(self.generation, marker, query, resolve),
            None => resolve(Vec::new()),
        }
    }

    pub fn render_tag(&self, marker: &str, item: &TagItem) -> Option<String> {
        self.sink
            .upgrade()
            .and_then(|sink| sink.render_tag(self.generation, marker, item))
    }
}

/// Continuation run once the engine is available.
pub type EngineContinuation = Box<dyn FnOnce(Rc<dyn Engine>)>;

enum LoadState {
    NotLoaded,
    Loading(VecDeque<EngineContinuation>),
    Loaded(Rc<dyn Engine>),
}

/// Observable load state, for diagnostics and tests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EngineLoadState {
    NotLoaded,
    Loading,
    Loaded,
}

/// Shared gateway to the engine, one per process.
pub struct EngineService {
    loader: Rc<dyn ScriptLoader>,
    settings: EngineSettings,
    dialogs: Rc<DialogSessionManager>,
    state: RefCell<LoadState>,
    loads: Cell<u32>,
    weak: Weak<EngineService>,
}

impl EngineService {
    pub fn new(
        loader: Rc<dyn ScriptLoader>,
        settings: EngineSettings,
        dialogs: Rc<DialogSessionManager>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak| EngineService {
            loader,
            settings,
            dialogs,
            state: RefCell::new(LoadState::NotLoaded),
            loads: Cell::new(0),
            weak: weak.clone(),
        })
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn load_state(&self) -> EngineLoadState {
        match &*self.state.borrow() {
            LoadState::NotLoaded => EngineLoadState::NotLoaded,
            LoadState::Loading(_) => EngineLoadState::Loading,
            LoadState::Loaded(_) => EngineLoadState::Loaded,
        }
    }

    /// Number of times the script load was started.
    pub fn load_count(&self) -> u32 {
        self.loads.get()
    }

    /// The engine, if loaded. Otherwise `then` is queued and runs once the
    /// load completes, starting the load if nobody has yet.
    pub fn acquire(&self, then: EngineContinuation) -> Option<Rc<dyn Engine>> {
        let start = {
            let mut state = self.state.borrow_mut();
            match &mut *state {
                LoadState::Loaded(engine) => return Some(engine.clone()),
                LoadState::Loading(queue) => {
                    queue.push_back(then);
                    trace!(queued = queue.len(), "engine loading, continuation queued");
                    false
                }
                LoadState::NotLoaded => {
                    *state = LoadState::Loading(VecDeque::from([then]));
                    true
                }
            }
        };

        if start {
            self.loads.set(self.loads.get() + 1);
            info!(url = %self.settings.script_url, "loading editor engine");
            let weak = self.weak.clone();
            self.loader.load(
                &self.settings.script_url,
                Box::new(move |engine| {
                    if let Some(service) = weak.upgrade() {
                        service.finish_load(engine);
                    }
                }),
            );
        }
        None
    }

    fn finish_load(&self, engine: Rc<dyn Engine>) {
        let queue = {
            let mut state = self.state.borrow_mut();
            match std::mem::replace(&mut *state, LoadState::Loaded(engine.clone())) {
                LoadState::Loading(queue) => queue,
                LoadState::NotLoaded => VecDeque::new(),
                LoadState::Loaded(previous) => {
                    *state = LoadState::Loaded(previous);
                    debug!("engine load callback fired twice, ignoring");
                    return;
                }
            }
        };

        engine.configure(&self.settings);
        let dialogs = Rc::downgrade(&self.dialogs);
        engine.on_dialog_event(Box::new(move |event| {
            if let Some(dialogs) = dialogs.upgrade() {
                dialogs.handle(event);
            }
        }));

        debug!(waiting = queue.len(), "editor engine loaded");
        for then in queue {
            then(engine.clone());
        }
    }
}
