//! Tag (mention) lookup feed.
//!
//! When the user types a trigger marker such as `@`, the engine asks for
//! matching tags. Queries are debounced per trigger, at most one request is
//! in flight per control, and failed requests resolve with an empty list so
//! the engine's suggestion menu never hangs.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use tracing::{debug, trace, warn};

use crate::config::{TagTrigger, TagsConfig};
use crate::error::InputError;
use crate::scheduler::{Scheduler, TimerId};
use crate::types::ControlId;

/// Debounce applied when a trigger does not specify one.
pub const DEFAULT_QUERY_DEBOUNCE_MS: u32 = 300;

/// A tag suggestion as returned by the query endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct TagItem {
    pub value: SmolStr,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// Outgoing tag query. Hooks may rewrite any field.
#[derive(Clone, Debug, PartialEq)]
pub struct TagRequest {
    pub url: String,
    /// Issue a JSONP request with this callback parameter instead of JSON.
    pub jsonp_callback: Option<String>,
    pub timeout_ms: Option<u32>,
    pub marker: SmolStr,
    pub query: String,
}

/// Inspects or replaces a request before it is sent. Returning `false`
/// cancels it; the engine then receives no suggestions.
pub trait TagRequestHook {
    fn on_request(&self, control: &ControlId, request: &mut TagRequest) -> bool;
}

/// Rewrites suggestions before they reach the engine.
pub trait TagResponseHook {
    fn on_response(&self, control: &ControlId, request: &TagRequest, tags: &mut Vec<TagItem>);
}

/// Replacement attributes for the markup inserted for a chosen tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagOverride {
    pub kind: Option<String>,
    pub value: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
    pub data: Option<String>,
    pub context: Option<String>,
}

/// Customizes the markup inserted for a chosen tag.
pub trait TagCreator {
    fn create(&self, control: &ControlId, marker: &str, tag: &TagItem) -> Option<TagOverride>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

/// Completion for a tag request. Whatever error the request failed with is
/// handed back so the transport can report it.
pub type TagCompletion = Box<dyn FnOnce(Result<Vec<TagItem>, InputError>) -> Result<(), InputError>>;

/// Receives suggestions for the engine's menu.
pub type TagResolve = Box<dyn FnOnce(Vec<TagItem>)>;

/// Network access for tag queries.
///
/// An aborted request never invokes its completion.
pub trait TagTransport {
    fn start(&self, request: TagRequest, done: TagCompletion) -> RequestId;

    fn abort(&self, id: RequestId);
}

#[derive(Default)]
struct FeedState {
    next_seq: u64,
    /// Sequence number of the request in flight and, once `start` returned,
    /// its transport id.
    active: Option<(u64, Option<RequestId>)>,
    debounce: Vec<(SmolStr, TimerId)>,
    closed: bool,
}

/// Per-control tag query feed, alive as long as one editor instance.
pub struct TagFeed {
    control: ControlId,
    config: TagsConfig,
    transport: Rc<dyn TagTransport>,
    scheduler: Rc<dyn Scheduler>,
    state: RefCell<FeedState>,
    weak: Weak<TagFeed>,
}

impl TagFeed {
    pub fn new(
        control: ControlId,
        config: TagsConfig,
        transport: Rc<dyn TagTransport>,
        scheduler: Rc<dyn Scheduler>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak| TagFeed {
            control,
            config,
            transport,
            scheduler,
            state: RefCell::new(FeedState::default()),
            weak: weak.clone(),
        })
    }

    pub fn triggers(&self) -> &[TagTrigger] {
        &self.config.triggers
    }

    fn trigger(&self, marker: &str) -> Option<&TagTrigger> {
        self.config.triggers.iter().find(|t| t.marker == marker)
    }

    /// Look up tags for `query` typed after `marker`.
    ///
    /// A debounced query replaces the previous pending one for the same
    /// trigger; the replaced query is never resolved.
    pub fn query(&self, marker: &str, query: &str, resolve: TagResolve) {
        if self.state.borrow().closed {
            resolve(Vec::new());
            return;
        }
        let Some(trigger) = self.trigger(marker) else {
            warn!(control = %self.control, marker, "tag query for unknown trigger");
            resolve(Vec::new());
            return;
        };
        let delay = trigger.debounce_query.unwrap_or(DEFAULT_QUERY_DEBOUNCE_MS);
        if delay == 0 {
            self.send(marker, query, resolve);
            return;
        }

        let marker = SmolStr::new(marker);
        let previous = {
            let mut state = self.state.borrow_mut();
            let index = state.debounce.iter().position(|(m, _)| *m == marker);
            index.map(|i| state.debounce.swap_remove(i).1)
        };
        if let Some(timer) = previous {
            self.scheduler.cancel(timer);
        }

        let weak = self.weak.clone();
        let (task_marker, query) = (marker.clone(), query.to_string());
        let timer = self.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Some(feed) = weak.upgrade() {
                    feed.state
                        .borrow_mut()
                        .debounce
                        .retain(|(m, _)| *m != task_marker);
                    feed.send(&task_marker, &query, resolve);
                }
            }),
        );
        self.state.borrow_mut().debounce.push((marker, timer));
    }

    fn send(&self, marker: &str, query: &str, resolve: TagResolve) {
        let mut request = TagRequest {
            url: self.config.query_url.clone(),
            jsonp_callback: self.config.jsonp_callback.clone(),
            timeout_ms: self.config.jsonp_timeout,
            marker: marker.into(),
            query: query.to_string(),
        };

        if let Some(hook) = &self.config.on_request
            && !hook.on_request(&self.control, &mut request)
        {
            debug!(control = %self.control, marker, "tag request canceled by hook");
            resolve(Vec::new());
            return;
        }

        let (seq, previous) = {
            let mut state = self.state.borrow_mut();
            state.next_seq += 1;
            let seq = state.next_seq;
            (seq, state.active.replace((seq, None)))
        };
        if let Some((_, Some(id))) = previous {
            trace!(control = %self.control, "aborting previous tag request");
            self.transport.abort(id);
        }

        let weak = self.weak.clone();
        let on_response = self.config.on_response.clone();
        let control = self.control.clone();
        let sent = request.clone();
        let done: TagCompletion = Box::new(move |result| {
            if let Some(feed) = weak.upgrade() {
                let mut state = feed.state.borrow_mut();
                if state.active.is_some_and(|(s, _)| s == seq) {
                    state.active = None;
                }
            }
            match result {
                Ok(mut items) => {
                    if let Some(hook) = &on_response {
                        hook.on_response(&control, &sent, &mut items);
                    }
                    resolve(items);
                    Ok(())
                }
                Err(err) => {
                    warn!(control = %control, error = %err, "tag request failed");
                    resolve(Vec::new());
                    Err(err)
                }
            }
        });

        let id = self.transport.start(request, done);
        let mut state = self.state.borrow_mut();
        if let Some((s, None)) = state.active
            && s == seq
        {
            state.active = Some((seq, Some(id)));
        }
    }

    /// Markup inserted into the document for a chosen tag.
    pub fn render_tag(&self, marker: &str, item: &TagItem) -> String {
        let alt = self
            .config
            .tag_creator
            .as_ref()
            .and_then(|creator| creator.create(&self.control, marker, item))
            .unwrap_or_default();

        let kind = alt.kind.as_deref().unwrap_or(marker);
        let id = alt.value.as_deref().unwrap_or(&item.value);
        let data = alt.data.as_deref().or(item.data.as_deref());
        let context = alt.context.as_deref().or(item.context.as_deref());
        let url = alt.url.as_deref().or(item.url.as_deref()).unwrap_or("");
        let title = match alt.title {
            Some(title) => title,
            None => format!("{marker}{}", item.title),
        };

        let mut html = format!(
            r#"<a data-tag-type="{}" data-tag-id="{}""#,
            escape(kind),
            escape(id)
        );
        if let Some(data) = data {
            html.push_str(&format!(r#" data-tag-data="{}""#, escape(data)));
        }
        if let Some(context) = context {
            html.push_str(&format!(r#" data-tag-context="{}""#, escape(context)));
        }
        html.push_str(&format!(r#" href="{}">{}</a>&nbsp;"#, escape(url), escape(&title)));
        html
    }

    /// Markup for one entry in the suggestion menu.
    pub fn render_suggestion(&self, item: &TagItem) -> String {
        match &item.icon {
            Some(icon) => format!(
                r#"<li data-id="{}"><img src="{}" alt=""><span>{}</span></li>"#,
                escape(&item.value),
                escape(icon),
                escape(&item.title)
            ),
            None => format!(
                r#"<li data-id="{}"><span>{}</span></li>"#,
                escape(&item.value),
                escape(&item.title)
            ),
        }
    }

    /// Cancel pending queries and abort the request in flight.
    pub fn close(&self) {
        let (timers, active) = {
            let mut state = self.state.borrow_mut();
            state.closed = true;
            (std::mem::take(&mut state.debounce), state.active.take())
        };
        for (_, timer) in timers {
            self.scheduler.cancel(timer);
        }
        if let Some((_, Some(id))) = active {
            self.transport.abort(id);
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Hook;
    use crate::scheduler::ManualScheduler;
    use std::cell::Cell;

    #[derive(Default)]
    struct FakeTransport {
        started: RefCell<Vec<(RequestId, TagRequest, Option<TagCompletion>)>>,
        aborted: RefCell<Vec<RequestId>>,
        next: Cell<u64>,
    }

    impl FakeTransport {
        fn complete(&self, index: usize, result: Result<Vec<TagItem>, InputError>) -> Result<(), InputError> {
            let done = self.started.borrow_mut()[index].2.take().unwrap();
            done(result)
        }
    }

    impl TagTransport for FakeTransport {
        fn start(&self, request: TagRequest, done: TagCompletion) -> RequestId {
            self.next.set(self.next.get() + 1);
            let id = RequestId(self.next.get());
            self.started.borrow_mut().push((id, request, Some(done)));
            id
        }

        fn abort(&self, id: RequestId) {
            self.aborted.borrow_mut().push(id);
        }
    }

    fn config(debounce: Option<u32>) -> TagsConfig {
        TagsConfig {
            query_url: "/tags".into(),
            triggers: vec![TagTrigger {
                marker: "@".into(),
                debounce_query: debounce,
                ..Default::default()
            }],
            ..Default::default()
        }
    }

    fn collector() -> (Rc<RefCell<Option<Vec<TagItem>>>>, impl Fn() -> TagResolve) {
        let out = Rc::new(RefCell::new(None));
        let o = out.clone();
        (out, move || {
            let o = o.clone();
            Box::new(move |items| *o.borrow_mut() = Some(items)) as TagResolve
        })
    }

    fn item(value: &str, title: &str) -> TagItem {
        TagItem {
            value: value.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_debounce() {
        let sched = ManualScheduler::new();
        let transport = Rc::new(FakeTransport::default());
        let feed = TagFeed::new("c".into(), config(None), transport.clone(), sched.clone());
        let (out, resolve) = collector();

        feed.query("@", "j", resolve());
        sched.advance(100);
        feed.query("@", "jo", resolve());
        sched.advance(299);
        assert!(transport.started.borrow().is_empty());
        sched.advance(1);
        assert_eq!(transport.started.borrow().len(), 1);
        assert_eq!(transport.started.borrow()[0].1.query, "jo");

        transport.complete(0, Ok(vec![item("1", "John")])).unwrap();
        assert_eq!(out.borrow().as_ref().unwrap()[0].title, "John");
    }

    #[test]
    fn test_previous_request_aborted() {
        let sched = ManualScheduler::new();
        let transport = Rc::new(FakeTransport::default());
        let feed = TagFeed::new("c".into(), config(Some(0)), transport.clone(), sched);
        let (_, resolve) = collector();

        feed.query("@", "a", resolve());
        feed.query("@", "ab", resolve());
        assert_eq!(*transport.aborted.borrow(), vec![RequestId(1)]);

        transport.complete(1, Ok(vec![])).unwrap();
        feed.query("@", "abc", resolve());
        assert_eq!(transport.aborted.borrow().len(), 1);
    }

    #[test]
    fn test_failure_resolves_empty_and_reports() {
        let sched = ManualScheduler::new();
        let transport = Rc::new(FakeTransport::default());
        let feed = TagFeed::new("c".into(), config(Some(0)), transport.clone(), sched);
        let (out, resolve) = collector();

        feed.query("@", "x", resolve());
        let err = transport
            .complete(0, Err(InputError::TagRequestFailed { status: 500 }))
            .unwrap_err();
        assert_eq!(err, InputError::TagRequestFailed { status: 500 });
        assert_eq!(out.borrow().as_deref(), Some(&[][..]));
    }

    #[test]
    fn test_hooks() {
        struct Rewrite;
        impl TagRequestHook for Rewrite {
            fn on_request(&self, _: &ControlId, request: &mut TagRequest) -> bool {
                if request.query == "stop" {
                    return false;
                }
                request.url = "/other".into();
                true
            }
        }
        struct Upper;
        impl TagResponseHook for Upper {
            fn on_response(&self, _: &ControlId, _: &TagRequest, tags: &mut Vec<TagItem>) {
                tags.iter_mut().for_each(|t| t.title = t.title.to_uppercase());
            }
        }

        let sched = ManualScheduler::new();
        let transport = Rc::new(FakeTransport::default());
        let mut cfg = config(Some(0));
        cfg.on_request = Some(Hook::new(Rc::new(Rewrite)));
        cfg.on_response = Some(Hook::new(Rc::new(Upper)));
        let feed = TagFeed::new("c".into(), cfg, transport.clone(), sched);
        let (out, resolve) = collector();

        feed.query("@", "stop", resolve());
        assert!(transport.started.borrow().is_empty());
        assert_eq!(out.borrow().as_deref(), Some(&[][..]));

        feed.query("@", "an", resolve());
        assert_eq!(transport.started.borrow()[0].1.url, "/other");
        transport.complete(0, Ok(vec![item("7", "Ann")])).unwrap();
        assert_eq!(out.borrow().as_ref().unwrap()[0].title, "ANN");
    }

    #[test]
    fn test_render_tag() {
        let sched = ManualScheduler::new();
        let transport = Rc::new(FakeTransport::default());
        let feed = TagFeed::new("c".into(), config(None), transport, sched);

        let mut tag = item("42", "Jane");
        tag.url = Some("/users/42".into());
        assert_eq!(
            feed.render_tag("@", &tag),
            r#"<a data-tag-type="@" data-tag-id="42" href="/users/42">@Jane</a>&nbsp;"#
        );

        let mut tag = item("1", "A \"quoted\" name");
        tag.data = Some("x".into());
        assert_eq!(
            feed.render_tag("#", &tag),
            r##"<a data-tag-type="#" data-tag-id="1" data-tag-data="x" href="">#A &quot;quoted&quot; name</a>&nbsp;"##
        );
    }

    #[test]
    fn test_close_cancels_pending() {
        let sched = ManualScheduler::new();
        let transport = Rc::new(FakeTransport::default());
        let feed = TagFeed::new("c".into(), config(None), transport.clone(), sched.clone());
        let (out, resolve) = collector();
        feed.query("@", "a", resolve());
        feed.close();
        sched.run_until_idle();
        assert!(transport.started.borrow().is_empty());
        assert!(out.borrow().is_none());
    }
}
