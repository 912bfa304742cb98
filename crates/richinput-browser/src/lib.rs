//! Browser bindings for richinput controls.
//!
//! This crate implements the collaborator traits of `richinput-core` over
//! `web-sys`. It assumes a `wasm32-unknown-unknown` target environment.
//!
//! # Architecture
//!
//! - `dom`: the control's root element and its native input
//! - `timers`: `Scheduler` over `setTimeout`
//! - `loader`: loads the editor engine with a `<script>` element
//! - `tags`: tag queries over `fetch` or JSONP
//! - `prompt`: blob revocation and `window.confirm`
//! - `logging`: console tracing subscriber
//!
//! The binding to the rich text engine itself (the `Engine`,
//! `EditorInstance` and `DetachedDialogFactory` implementations) is supplied
//! by the host page.
//!
//! # Re-exports
//!
//! This crate re-exports `richinput-core` for convenience, so consumers
//! only need to depend on `richinput-browser`.

pub use richinput_core;
pub use richinput_core::*;

pub mod dom;
pub mod loader;
pub mod logging;
pub mod page;
pub mod prompt;
pub mod tags;
pub mod timers;

pub use dom::BrowserControlDom;
pub use loader::ScriptTagLoader;
pub use logging::init_browser_logging;
pub use page::{BrowserPage, MountedControl};
pub use prompt::{UrlBlobRevoker, WindowConfirm};
pub use tags::FetchTagTransport;
pub use timers::TimeoutScheduler;
