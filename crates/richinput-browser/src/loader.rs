//! Loading the editor engine with a `<script>` element.

use std::rc::Rc;

use gloo_events::EventListener;
use richinput_core::engine::{Engine, ScriptLoader};
use tracing::{debug, error};
use wasm_bindgen::JsCast;

/// Wraps the engine's global object once its script has run.
pub type EngineBinder = Box<dyn Fn() -> Option<Rc<dyn Engine>>>;

/// Appends the engine script to `<head>` and hands the bound engine to the
/// waiting service when it has loaded.
///
/// A script that fails to load is logged; the service keeps waiting.
pub struct ScriptTagLoader {
    bind: Rc<EngineBinder>,
}

impl ScriptTagLoader {
    /// `bind` is called after the script ran and returns the host's
    /// [`Engine`] implementation for the engine global.
    pub fn new(bind: EngineBinder) -> Rc<Self> {
        Rc::new(Self {
            bind: Rc::new(bind),
        })
    }
}

impl ScriptLoader for ScriptTagLoader {
    fn load(&self, url: &str, on_loaded: Box<dyn FnOnce(Rc<dyn Engine>)>) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            error!(url, "no document to load the editor engine into");
            return;
        };
        let script = match document
            .create_element("script")
            .map(|e| e.unchecked_into::<web_sys::HtmlScriptElement>())
        {
            Ok(script) => script,
            Err(e) => {
                error!(url, error = ?e, "unable to create script element");
                return;
            }
        };
        script.set_src(url);
        script.set_async(true);

        let bind = self.bind.clone();
        let loaded_url = url.to_string();
        EventListener::once(&script, "load", move |_| match bind() {
            Some(engine) => {
                debug!(url = %loaded_url, "editor engine script loaded");
                on_loaded(engine);
            }
            None => error!(url = %loaded_url, "editor engine global missing after load"),
        })
        // One engine load per page.
        .forget();

        let failed_url = url.to_string();
        EventListener::once(&script, "error", move |_| {
            error!(url = %failed_url, "editor engine script failed to load");
        })
        .forget();

        let parent = document
            .head()
            .map(web_sys::Node::from)
            .or_else(|| document.body().map(web_sys::Node::from));
        match parent {
            Some(parent) => {
                if let Err(e) = parent.append_child(&script) {
                    error!(url, error = ?e, "unable to insert engine script");
                }
            }
            None => error!(url, "document has neither head nor body"),
        }
    }
}
