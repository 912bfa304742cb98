//! richinput-core: editor lifecycle and focus coordination for rich text
//! input controls, without platform dependencies.
//!
//! This crate provides:
//! - `InputControl` - a text input that can switch into a rich text editor
//!   (design mode), with a single logical focus state and safe teardown
//! - `EngineService` - shared, load-once access to the editor engine
//! - `DialogSessionManager` - the one modal sub-dialog shared by all editors
//! - Collaborator traits in [`platform`] and [`engine`], implemented over
//!   `web-sys` by `richinput-browser` and by fakes in tests
//! - `ManualScheduler` - virtual time for deterministic tests

pub mod blobs;
pub mod config;
pub mod control;
pub mod detached;
pub mod dialog;
pub mod engine;
pub mod error;
pub mod focus;
pub mod lifecycle;
pub mod locale;
pub mod platform;
pub mod scheduler;
pub mod sizing;
pub mod tags;
pub mod toolbar;
pub mod types;
pub mod value;

#[cfg(feature = "telemetry")]
pub mod telemetry;

#[cfg(test)]
mod tests;

pub use config::{EditorConfig, EngineSettings};
pub use control::{ControlContext, ControlState, InputControl};
pub use detached::{DetachedActions, DetachedDialog, DetachedDialogFactory, DetachedSettings};
pub use dialog::{DialogEvent, DialogSessionManager};
pub use engine::{
    Engine, EngineEvent, EngineEvents, EngineOptions, EngineResponse, EngineService,
    ScriptLoader,
};
pub use error::InputError;
pub use lifecycle::LifecyclePhase;
pub use scheduler::{ManualScheduler, Scheduler, TimerId};
pub use smol_str::SmolStr;
pub use tags::{TagFeed, TagItem, TagTransport};
pub use types::{ControlEvent, ControlId, Resizing, Size, SizeUnit};
