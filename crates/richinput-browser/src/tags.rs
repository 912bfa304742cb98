//! Tag queries over `fetch`, or JSONP when a callback parameter is
//! configured.
//!
//! JSON requests POST `{ "Marker": .., "Query": .. }` to the query url.
//! JSONP requests pass `Marker`, `Query` and the callback name as url
//! parameters. Either way the endpoint answers with an array of tag items;
//! anything else counts as no suggestions.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use gloo_timers::callback::Timeout;
use gloo_utils::format::JsValueSerdeExt;
use richinput_core::error::InputError;
use richinput_core::tags::{RequestId, TagCompletion, TagItem, TagRequest, TagTransport};
use tracing::{debug, error, trace, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Turn a decoded response body into tag items. Entries that do not
/// describe a tag are skipped.
pub fn parse_tag_items(body: serde_json::Value) -> Vec<TagItem> {
    match body {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// Body of a JSON tag query.
pub fn json_body(request: &TagRequest) -> String {
    serde_json::json!({
        "Marker": request.marker,
        "Query": request.query,
    })
    .to_string()
}

enum Channel {
    Fetch(web_sys::AbortController),
    Jsonp {
        script: web_sys::HtmlScriptElement,
        callback_name: String,
        _callback: Closure<dyn FnMut(JsValue)>,
        _timeout: Option<Timeout>,
    },
    /// The request could not be sent; its failure is reported shortly.
    Unsent,
}

impl Channel {
    fn release(self, aborted: bool) {
        match self {
            Channel::Fetch(controller) => {
                if aborted {
                    controller.abort();
                }
            }
            Channel::Jsonp {
                script,
                callback_name,
                ..
            } => {
                script.remove();
                let Some(window) = web_sys::window() else {
                    return;
                };
                let name = JsValue::from_str(&callback_name);
                // The script may still run; leave it something to call.
                let _ = if aborted {
                    js_sys::Reflect::set(&window, &name, &js_sys::Function::new_no_args(""))
                } else {
                    js_sys::Reflect::delete_property(&window, &name)
                };
            }
            Channel::Unsent => {}
        }
    }
}

struct ActiveRequest {
    channel: Channel,
    done: TagCompletion,
}

type ActiveMap = Rc<RefCell<HashMap<u64, ActiveRequest>>>;

/// Complete request `id`, unless it was aborted meanwhile.
fn finish(active: &ActiveMap, id: u64, result: Result<Vec<TagItem>, InputError>) {
    let Some(request) = active.borrow_mut().remove(&id) else {
        trace!(request = id, "response for aborted tag request dropped");
        return;
    };
    request.channel.release(false);
    if let Err(e) = (request.done)(result) {
        error!(request = id, error = %e, "tag request failed");
    }
}

fn no_window() -> JsValue {
    JsValue::from_str("no window")
}

async fn fetch_items(promise: js_sys::Promise) -> Result<Vec<TagItem>, InputError> {
    let response: web_sys::Response = JsFuture::from(promise)
        .await
        .map_err(|_| InputError::TagRequestFailed { status: 0 })?
        .unchecked_into();
    let status = response.status();
    if !response.ok() {
        return Err(InputError::TagRequestFailed { status });
    }
    let json = response
        .json()
        .map_err(|_| InputError::TagRequestFailed { status })?;
    let body = JsFuture::from(json).await.unwrap_or(JsValue::NULL);
    Ok(body
        .into_serde::<serde_json::Value>()
        .map(parse_tag_items)
        .unwrap_or_default())
}

/// [`TagTransport`] over the browser's network stack.
#[derive(Default)]
pub struct FetchTagTransport {
    active: ActiveMap,
    next_id: Cell<u64>,
}

impl FetchTagTransport {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    fn open_fetch(&self, id: u64, request: &TagRequest) -> Result<Channel, JsValue> {
        let window = web_sys::window().ok_or_else(no_window)?;
        let controller = web_sys::AbortController::new()?;

        let headers = web_sys::Headers::new()?;
        headers.set("Content-Type", "application/json")?;
        headers.set("Accept", "application/json")?;
        let init = web_sys::RequestInit::new();
        init.set_method("POST");
        init.set_headers(&headers);
        init.set_body(&JsValue::from_str(&json_body(request)));
        init.set_signal(Some(&controller.signal()));

        let fetch = web_sys::Request::new_with_str_and_init(&request.url, &init)?;
        let promise = window.fetch_with_request(&fetch);
        let active = self.active.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let result = fetch_items(promise).await;
            finish(&active, id, result);
        });
        Ok(Channel::Fetch(controller))
    }

    fn open_jsonp(&self, id: u64, request: &TagRequest, param: &str) -> Result<Channel, JsValue> {
        let window = web_sys::window().ok_or_else(no_window)?;
        let document = window.document().ok_or_else(no_window)?;
        let callback_name = format!("__richinput_tags_{id}");

        let url = web_sys::Url::new_with_base(&request.url, &window.location().href()?)?;
        let params = url.search_params();
        params.append("Marker", &request.marker);
        params.append("Query", &request.query);
        params.append(param, &callback_name);

        let active = self.active.clone();
        let callback = Closure::<dyn FnMut(JsValue)>::new(move |response: JsValue| {
            let items = response
                .into_serde::<serde_json::Value>()
                .map(parse_tag_items)
                .unwrap_or_default();
            finish(&active, id, Ok(items));
        });
        js_sys::Reflect::set(&window, &JsValue::from_str(&callback_name), callback.as_ref())?;

        let timeout = request.timeout_ms.map(|ms| {
            let active = self.active.clone();
            Timeout::new(ms, move || {
                debug!(request = id, "jsonp tag request timed out");
                finish(&active, id, Err(InputError::TagRequestTimedOut));
            })
        });

        let script = document
            .create_element("script")?
            .unchecked_into::<web_sys::HtmlScriptElement>();
        script.set_src(&url.href());
        document.body().ok_or_else(no_window)?.append_child(&script)?;

        Ok(Channel::Jsonp {
            script,
            callback_name,
            _callback: callback,
            _timeout: timeout,
        })
    }
}

impl TagTransport for FetchTagTransport {
    fn start(&self, request: TagRequest, done: TagCompletion) -> RequestId {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);

        let opened = match &request.jsonp_callback {
            Some(param) => self.open_jsonp(id, &request, param),
            None => self.open_fetch(id, &request),
        };
        let channel = opened.unwrap_or_else(|e| {
            warn!(request = id, url = %request.url, error = ?e, "unable to send tag request");
            let active = self.active.clone();
            wasm_bindgen_futures::spawn_local(async move {
                finish(&active, id, Err(InputError::TagRequestFailed { status: 0 }));
            });
            Channel::Unsent
        });
        trace!(request = id, marker = %request.marker, "tag request sent");
        self.active
            .borrow_mut()
            .insert(id, ActiveRequest { channel, done });
        RequestId(id)
    }

    fn abort(&self, id: RequestId) {
        let request = self.active.borrow_mut().remove(&id.0);
        if let Some(request) = request {
            trace!(request = id.0, "tag request aborted");
            request.channel.release(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tag_items() {
        let body = serde_json::json!([
            { "Value": "1", "Title": "John", "Url": "/people/1" },
            "not a tag",
            { "Value": "2", "Title": "Jane", "Icon": "jane.png" }
        ]);
        let items = parse_tag_items(body);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "John");
        assert_eq!(items[0].url.as_deref(), Some("/people/1"));
        assert_eq!(items[1].icon.as_deref(), Some("jane.png"));
    }

    #[test]
    fn test_non_array_response_has_no_items() {
        assert!(parse_tag_items(serde_json::json!({ "Value": "1" })).is_empty());
        assert!(parse_tag_items(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_json_body() {
        let request = TagRequest {
            url: "/tags".into(),
            jsonp_callback: None,
            timeout_ms: None,
            marker: "@".into(),
            query: "jo".into(),
        };
        let body: serde_json::Value = serde_json::from_str(&json_body(&request)).unwrap();
        assert_eq!(body, serde_json::json!({ "Marker": "@", "Query": "jo" }));
    }
}
