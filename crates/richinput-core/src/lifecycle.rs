//! Editor instance lifecycle.
//!
//! ```text
//! Unloaded -> Loading -> AwaitingAttach -> Creating -> Ready
//!     ^                        |                         |
//!     +------------------------+-------------------------+   (design mode off)
//! any -> Destroyed                                           (dispose)
//! ```
//!
//! Dispose and reload requests that arrive while the engine loads or the
//! instance is being created are recorded as [`Pending`] and resolved when
//! the instance reports ready. Tearing down an instance mid-creation crashes
//! the engine, so there is no other way to honour them.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::config::EditorConfig;
use crate::engine::Engine;
use crate::platform::{EditorInstance, ObserverId};
use crate::scheduler::TimerId;

/// Work deferred until the editor is ready.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Pending {
    #[default]
    None,
    /// Recreate the editor. `Some` replaces the configuration.
    Reload(Option<EditorConfig>),
    Dispose,
}

impl Pending {
    /// Combine with a later request. Dispose absorbs everything; repeated
    /// reloads coalesce, keeping the most recently supplied configuration.
    pub fn merge(self, next: Pending) -> Pending {
        match (self, next) {
            (Pending::Dispose, _) | (_, Pending::Dispose) => Pending::Dispose,
            (Pending::Reload(old), Pending::Reload(new)) => Pending::Reload(new.or(old)),
            (current, Pending::None) => current,
            (Pending::None, next) => next,
        }
    }
}

/// Coarse lifecycle state, for snapshots and logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LifecyclePhase {
    Unloaded,
    Loading,
    AwaitingAttach,
    Creating,
    Ready,
    Destroyed,
}

/// A live editor instance that reported ready.
#[derive(Clone)]
pub struct ReadyEditor {
    pub editor: Rc<dyn EditorInstance>,
    pub generation: u64,
}

enum LifecycleState {
    Unloaded,
    Loading {
        pending: Pending,
    },
    AwaitingAttach {
        engine: Rc<dyn Engine>,
        pending: Pending,
        observer: Option<ObserverId>,
        timer: Option<TimerId>,
    },
    Creating {
        editor: Rc<dyn EditorInstance>,
        generation: u64,
        pending: Pending,
        seeded: String,
    },
    Ready(ReadyEditor),
    Destroyed,
}

/// What to do once an instance reported ready.
#[derive(Clone, Debug, PartialEq)]
pub enum ReadyOutcome {
    /// Report from an instance that is no longer current.
    Stale,
    Ready,
    Dispose,
    Reload(Option<EditorConfig>),
}

/// Observer and timer registered while waiting for the root element to be
/// attached.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AttachWait {
    pub observer: Option<ObserverId>,
    pub timer: Option<TimerId>,
}

pub struct EditorLifecycle {
    state: LifecycleState,
    generation: u64,
}

impl Default for EditorLifecycle {
    fn default() -> Self {
        Self {
            state: LifecycleState::Unloaded,
            generation: 0,
        }
    }
}

impl EditorLifecycle {
    pub fn phase(&self) -> LifecyclePhase {
        match &self.state {
            LifecycleState::Unloaded => LifecyclePhase::Unloaded,
            LifecycleState::Loading { .. } => LifecyclePhase::Loading,
            LifecycleState::AwaitingAttach { .. } => LifecyclePhase::AwaitingAttach,
            LifecycleState::Creating { .. } => LifecyclePhase::Creating,
            LifecycleState::Ready(_) => LifecyclePhase::Ready,
            LifecycleState::Destroyed => LifecyclePhase::Destroyed,
        }
    }

    /// The engine is loading or the instance is being created. Neither can
    /// be interrupted.
    pub fn is_initializing(&self) -> bool {
        matches!(
            self.state,
            LifecycleState::Loading { .. } | LifecycleState::Creating { .. }
        )
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LifecycleState::Ready(_))
    }

    pub fn is_destroyed(&self) -> bool {
        matches!(self.state, LifecycleState::Destroyed)
    }

    pub fn ready(&self) -> Option<&ReadyEditor> {
        match &self.state {
            LifecycleState::Ready(ready) => Some(ready),
            _ => None,
        }
    }

    pub fn editor(&self) -> Option<Rc<dyn EditorInstance>> {
        self.ready().map(|r| r.editor.clone())
    }

    /// Whether `generation` identifies the instance being created or ready.
    pub fn is_current(&self, generation: u64) -> bool {
        match &self.state {
            LifecycleState::Creating { generation: g, .. } => *g == generation,
            LifecycleState::Ready(ready) => ready.generation == generation,
            _ => false,
        }
    }

    /// Waiting for the engine script.
    pub fn begin_load(&mut self) {
        if matches!(self.state, LifecycleState::Unloaded) {
            self.state = LifecycleState::Loading {
                pending: Pending::None,
            };
        }
    }

    /// The engine is available; wait for the root element to be attached.
    /// Returns false if no load was in progress.
    pub fn engine_available(&mut self, engine: Rc<dyn Engine>) -> bool {
        let LifecycleState::Loading { pending } = &mut self.state else {
            return false;
        };
        let pending = std::mem::take(pending);
        self.state = LifecycleState::AwaitingAttach {
            engine,
            pending,
            observer: None,
            timer: None,
        };
        true
    }

    pub fn awaiting_engine(&self) -> Option<Rc<dyn Engine>> {
        match &self.state {
            LifecycleState::AwaitingAttach { engine, .. } => Some(engine.clone()),
            _ => None,
        }
    }

    /// Replace the registered attach observer or poll timer, returning the
    /// previous ones for cleanup.
    pub fn set_attach_wait(&mut self, wait: AttachWait) -> AttachWait {
        match &mut self.state {
            LifecycleState::AwaitingAttach {
                observer, timer, ..
            } => AttachWait {
                observer: std::mem::replace(observer, wait.observer),
                timer: std::mem::replace(timer, wait.timer),
            },
            _ => wait,
        }
    }

    /// Abandon the attach wait and return to `Unloaded`. Returns the
    /// registrations to clean up.
    pub fn cancel_attach_wait(&mut self) -> Option<AttachWait> {
        match std::mem::replace(&mut self.state, LifecycleState::Unloaded) {
            LifecycleState::AwaitingAttach {
                observer, timer, ..
            } => {
                trace!("attach wait canceled");
                Some(AttachWait { observer, timer })
            }
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Generation for the next instance.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// The instance was requested from the engine. `seeded` is the value it
    /// was created with. Returns the attach wait registrations to clean up.
    pub fn begin_create(
        &mut self,
        editor: Rc<dyn EditorInstance>,
        generation: u64,
        seeded: String,
    ) -> AttachWait {
        let (pending, wait) = match std::mem::replace(&mut self.state, LifecycleState::Unloaded) {
            LifecycleState::AwaitingAttach {
                pending,
                observer,
                timer,
                ..
            } => (pending, AttachWait { observer, timer }),
            LifecycleState::Loading { pending } => (pending, AttachWait::default()),
            _ => (Pending::None, AttachWait::default()),
        };
        self.state = LifecycleState::Creating {
            editor,
            generation,
            pending,
            seeded,
        };
        wait
    }

    /// The instance being created for `generation`, with the value it was
    /// seeded with.
    pub fn creating(&self, generation: u64) -> Option<(Rc<dyn EditorInstance>, &str)> {
        match &self.state {
            LifecycleState::Creating {
                editor,
                generation: g,
                seeded,
                ..
            } if *g == generation => Some((editor.clone(), seeded.as_str())),
            _ => None,
        }
    }

    /// The instance reported ready. Moves to `Ready` and hands back the
    /// pending request, which the caller resolves against the ready editor.
    pub fn complete(&mut self, generation: u64) -> ReadyOutcome {
        let LifecycleState::Creating { generation: g, .. } = &self.state else {
            return ReadyOutcome::Stale;
        };
        if *g != generation {
            return ReadyOutcome::Stale;
        }
        let LifecycleState::Creating {
            editor, pending, ..
        } = std::mem::replace(&mut self.state, LifecycleState::Unloaded)
        else {
            return ReadyOutcome::Stale;
        };
        self.state = LifecycleState::Ready(ReadyEditor { editor, generation });
        match pending {
            Pending::None => ReadyOutcome::Ready,
            Pending::Dispose => ReadyOutcome::Dispose,
            Pending::Reload(config) => ReadyOutcome::Reload(config),
        }
    }

    /// Record a request that cannot run before the editor is ready. Returns
    /// false when the lifecycle is not in a deferring state.
    pub fn defer(&mut self, request: Pending) -> bool {
        let pending = match &mut self.state {
            LifecycleState::Loading { pending }
            | LifecycleState::AwaitingAttach { pending, .. }
            | LifecycleState::Creating { pending, .. } => pending,
            _ => return false,
        };
        *pending = std::mem::take(pending).merge(request);
        debug!(pending = ?pending, "request deferred until editor is ready");
        true
    }

    pub fn pending(&self) -> Option<&Pending> {
        match &self.state {
            LifecycleState::Loading { pending }
            | LifecycleState::AwaitingAttach { pending, .. }
            | LifecycleState::Creating { pending, .. } => Some(pending),
            _ => None,
        }
    }

    /// Detach the ready instance and return to `Unloaded`.
    pub fn take_editor(&mut self) -> Option<Rc<dyn EditorInstance>> {
        match std::mem::replace(&mut self.state, LifecycleState::Unloaded) {
            LifecycleState::Ready(ready) => Some(ready.editor),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Terminal state.
    pub fn destroy(&mut self) {
        self.state = LifecycleState::Destroyed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_merge() {
        let cfg = |title: &str| {
            Some(EditorConfig {
                detachable: Some(crate::config::DetachableConfig {
                    title: Some(title.into()),
                    ..Default::default()
                }),
                ..Default::default()
            })
        };

        let merged = Pending::None
            .merge(Pending::Reload(cfg("a")))
            .merge(Pending::Reload(None))
            .merge(Pending::Reload(cfg("c")));
        assert_eq!(merged, Pending::Reload(cfg("c")));

        let merged = Pending::Reload(cfg("a")).merge(Pending::Reload(None));
        assert_eq!(merged, Pending::Reload(cfg("a")));

        assert_eq!(
            Pending::Dispose.merge(Pending::Reload(None)),
            Pending::Dispose
        );
        assert_eq!(
            Pending::Reload(None).merge(Pending::Dispose),
            Pending::Dispose
        );
    }

    #[test]
    fn test_defer_outside_initialization_is_refused() {
        let mut lifecycle = EditorLifecycle::default();
        assert!(!lifecycle.defer(Pending::Dispose));
        lifecycle.begin_load();
        assert!(lifecycle.is_initializing());
        assert!(lifecycle.defer(Pending::Dispose));
        assert_eq!(lifecycle.pending(), Some(&Pending::Dispose));
    }

    #[test]
    fn test_complete_ignores_stale_generation() {
        let mut lifecycle = EditorLifecycle::default();
        assert_eq!(lifecycle.complete(1), ReadyOutcome::Stale);
        assert_eq!(lifecycle.phase(), LifecyclePhase::Unloaded);
    }
}
