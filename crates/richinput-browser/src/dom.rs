//! The control's root element and native input in the live DOM.
//!
//! The root holds either an `<input>` or a `<textarea>`. Switching between
//! single and multi line replaces that element, carrying its state across.
//! Data attributes written through [`ControlDom::set_data`] land on the root
//! as `data-*` attributes for stylesheets to pick up.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use richinput_core::platform::{ControlDom, DomFocus, Observation, ObserverId};
use richinput_core::types::Size;
use tracing::{trace, warn};
use wasm_bindgen::prelude::*;
use web_sys::{HtmlElement, HtmlInputElement, HtmlTextAreaElement, MutationObserver};

/// Attributes copied onto the replacement element when the input switches
/// between `<input>` and `<textarea>`.
const CARRIED_ATTRIBUTES: [&str; 6] = [
    "id",
    "name",
    "class",
    "placeholder",
    "autocomplete",
    "tabindex",
];

/// Attribute changes anywhere in the document that can show or hide the
/// control.
const VISIBILITY_ATTRIBUTES: [&str; 3] = ["style", "class", "hidden"];

/// Name of the root attribute backing a control data flag.
pub fn data_attribute(name: &str) -> String {
    format!("data-{name}")
}

/// Inline CSS value for a size; `None` removes the property.
pub fn css_size(size: Size) -> Option<String> {
    (!size.is_unset()).then(|| size.to_css())
}

struct Observer {
    observer: MutationObserver,
    _callback: Closure<dyn FnMut(js_sys::Array, MutationObserver)>,
}

/// [`ControlDom`] over a root element in the page.
pub struct BrowserControlDom {
    root: HtmlElement,
    input: RefCell<HtmlElement>,
    observers: RefCell<HashMap<u64, Observer>>,
    next_observer: Cell<u64>,
}

impl BrowserControlDom {
    /// Wrap `root`, which must contain an `<input>` or `<textarea>`.
    pub fn new(root: HtmlElement) -> Option<Rc<Self>> {
        let input = root
            .query_selector("input, textarea")
            .ok()
            .flatten()?
            .dyn_into::<HtmlElement>()
            .ok()?;
        Some(Rc::new(Self {
            root,
            input: RefCell::new(input),
            observers: RefCell::new(HashMap::new()),
            next_observer: Cell::new(0),
        }))
    }

    /// Wrap the element with the given id.
    pub fn by_id(id: &str) -> Option<Rc<Self>> {
        let element = web_sys::window()?.document()?.get_element_by_id(id)?;
        match element.dyn_into::<HtmlElement>() {
            Ok(root) => Self::new(root),
            Err(_) => {
                warn!(id, "control root is not an html element");
                None
            }
        }
    }

    pub fn root(&self) -> &HtmlElement {
        &self.root
    }

    /// The current native input element.
    pub fn input(&self) -> HtmlElement {
        self.input.borrow().clone()
    }

    fn active_element(&self) -> Option<web_sys::Element> {
        self.root.owner_document()?.active_element()
    }

    fn disconnect_all(&self) {
        for (_, entry) in self.observers.borrow_mut().drain() {
            entry.observer.disconnect();
        }
    }
}

fn value_of(input: &HtmlElement) -> String {
    if let Some(input) = input.dyn_ref::<HtmlInputElement>() {
        input.value()
    } else if let Some(textarea) = input.dyn_ref::<HtmlTextAreaElement>() {
        textarea.value()
    } else {
        String::new()
    }
}

fn set_value_of(input: &HtmlElement, value: &str) {
    if let Some(input) = input.dyn_ref::<HtmlInputElement>() {
        input.set_value(value);
    } else if let Some(textarea) = input.dyn_ref::<HtmlTextAreaElement>() {
        textarea.set_value(value);
    }
}

fn is_disabled(input: &HtmlElement) -> bool {
    input.has_attribute("disabled")
}

fn set_disabled_of(input: &HtmlElement, disabled: bool) {
    if let Some(input) = input.dyn_ref::<HtmlInputElement>() {
        input.set_disabled(disabled);
    } else if let Some(textarea) = input.dyn_ref::<HtmlTextAreaElement>() {
        textarea.set_disabled(disabled);
    }
}

fn set_style(element: &HtmlElement, property: &str, value: Option<&str>) {
    let style = element.style();
    let _ = match value {
        Some(value) => style.set_property(property, value),
        None => style.remove_property(property).map(|_| ()),
    };
}

impl ControlDom for BrowserControlDom {
    fn is_attached(&self) -> bool {
        self.root.is_connected()
    }

    fn is_visible(&self) -> bool {
        self.root.is_connected() && (self.root.offset_width() > 0 || self.root.offset_height() > 0)
    }

    fn observe(&self, what: Observation, callback: Box<dyn Fn()>) -> Option<ObserverId> {
        let document = self
            .root
            .owner_document()
            .or_else(|| web_sys::window()?.document())?;
        let closure = Closure::<dyn FnMut(js_sys::Array, MutationObserver)>::new(
            move |_records: js_sys::Array, _observer: MutationObserver| callback(),
        );
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref()).ok()?;

        let init = web_sys::MutationObserverInit::new();
        init.set_child_list(true);
        init.set_subtree(true);
        if what == Observation::Mutation {
            let filter: js_sys::Array = VISIBILITY_ATTRIBUTES
                .iter()
                .map(|name| JsValue::from_str(name))
                .collect();
            init.set_attributes(true);
            init.set_attribute_filter(&filter);
        }
        if let Err(e) = observer.observe_with_options(&document, &init) {
            warn!(error = ?e, "unable to observe document");
            return None;
        }

        let id = self.next_observer.get() + 1;
        self.next_observer.set(id);
        self.observers.borrow_mut().insert(
            id,
            Observer {
                observer,
                _callback: closure,
            },
        );
        trace!(observer = id, what = ?what, "dom observer registered");
        Some(ObserverId(id))
    }

    fn unobserve(&self, id: ObserverId) {
        let entry = self.observers.borrow_mut().remove(&id.0);
        if let Some(entry) = entry {
            entry.observer.disconnect();
        }
    }

    fn focus(&self) -> DomFocus {
        let Some(active) = self.active_element() else {
            return DomFocus::Body;
        };
        let node: &web_sys::Node = active.as_ref();
        let is_body = self
            .root
            .owner_document()
            .and_then(|d| d.body())
            .is_some_and(|body| body.is_same_node(Some(node)));
        if is_body {
            DomFocus::Body
        } else if self.input.borrow().is_same_node(Some(node)) {
            DomFocus::Input
        } else if self.root.is_same_node(Some(node)) {
            DomFocus::Container
        } else if self.root.contains(Some(node)) {
            DomFocus::Within
        } else {
            DomFocus::Outside
        }
    }

    fn focus_input(&self) {
        let _ = self.input.borrow().focus();
    }

    fn focus_container(&self) {
        let _ = self.root.focus();
    }

    fn blur(&self) {
        if !self.focus().within_root() {
            return;
        }
        if let Some(active) = self.active_element()
            && let Ok(active) = active.dyn_into::<HtmlElement>()
        {
            let _ = active.blur();
        }
    }

    fn input_value(&self) -> String {
        value_of(&self.input.borrow())
    }

    fn set_input_value(&self, value: &str) {
        set_value_of(&self.input.borrow(), value);
    }

    fn set_multi_line(&self, multi_line: bool) {
        let current = self.input();
        if current.dyn_ref::<HtmlTextAreaElement>().is_some() == multi_line {
            return;
        }
        let Some(document) = self.root.owner_document() else {
            return;
        };
        let tag = if multi_line { "textarea" } else { "input" };
        let Some(replacement) = document
            .create_element(tag)
            .ok()
            .and_then(|e| e.dyn_into::<HtmlElement>().ok())
        else {
            warn!(tag, "unable to create native input");
            return;
        };

        for name in CARRIED_ATTRIBUTES {
            if let Some(value) = current.get_attribute(name) {
                let _ = replacement.set_attribute(name, &value);
            }
        }
        if !multi_line {
            let _ = replacement.set_attribute("type", "text");
        }
        replacement.set_spellcheck(current.spellcheck());
        set_disabled_of(&replacement, is_disabled(&current));
        set_value_of(&replacement, &value_of(&current));

        if let Err(e) = current.replace_with_with_node_1(&replacement) {
            warn!(error = ?e, "unable to swap native input");
            return;
        }
        *self.input.borrow_mut() = replacement;
    }

    fn set_input_enabled(&self, enabled: bool) {
        set_disabled_of(&self.input.borrow(), !enabled);
    }

    fn set_visible(&self, visible: bool) {
        set_style(&self.root, "display", (!visible).then_some("none"));
    }

    fn set_placeholder(&self, placeholder: &str) {
        let input = self.input.borrow();
        let _ = if placeholder.is_empty() {
            input.remove_attribute("placeholder")
        } else {
            input.set_attribute("placeholder", placeholder)
        };
    }

    fn set_spellcheck(&self, spellcheck: bool) {
        self.input.borrow().set_spellcheck(spellcheck);
    }

    fn set_data(&self, name: &str, value: Option<&str>) {
        let attribute = data_attribute(name);
        let _ = match value {
            Some(value) => self.root.set_attribute(&attribute, value),
            None => self.root.remove_attribute(&attribute),
        };
    }

    fn set_tab_index(&self, index: Option<i32>) {
        match index {
            Some(index) => self.root.set_tab_index(index),
            None => {
                let _ = self.root.remove_attribute("tabindex");
            }
        }
    }

    fn set_width(&self, width: Size) {
        set_style(&self.root, "width", css_size(width).as_deref());
    }

    fn set_height(&self, height: Size) {
        set_style(&self.root, "height", css_size(height).as_deref());
    }

    fn reset_input_size(&self) {
        let input = self.input.borrow();
        set_style(&input, "width", None);
        set_style(&input, "height", None);
    }

    fn offset_height(&self) -> f64 {
        if self.is_visible() {
            f64::from(self.root.offset_height())
        } else {
            0.0
        }
    }

    fn park_offscreen(&self) {
        set_style(&self.root, "position", Some("absolute"));
        set_style(&self.root, "left", Some("-10000px"));
        set_style(&self.root, "top", Some("-10000px"));
        if !self.root.is_connected()
            && let Some(body) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.body())
        {
            let _ = body.append_child(&self.root);
        }
    }

    fn remove(&self) {
        self.disconnect_all();
        self.root.remove();
    }
}

impl Drop for BrowserControlDom {
    fn drop(&mut self) {
        self.disconnect_all();
    }
}
